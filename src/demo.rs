//! Sample application served by `routebind serve`

use axum::{Json, response::IntoResponse};
use serde_json::{Value, json};

use crate::handlers::{ApiError, HandlerFn, HandlerResult, Module, ResolvedArguments, Signature, get, post};

pub const MODULE_NAME: &str = "demo";

async fn index(_args: ResolvedArguments) -> HandlerResult {
    Ok(Json(json!({
        "service": "routebind",
        "version": env!("CARGO_PKG_VERSION"),
    }))
    .into_response())
}

async fn echo(args: ResolvedArguments) -> HandlerResult {
    let x = args.require("x")?.clone();
    let path = args.request().map(|request| request.path().to_string());
    Ok(Json(json!({ "x": x, "path": path })).into_response())
}

async fn item(args: ResolvedArguments) -> HandlerResult {
    let id = args.require_str("id")?;
    let id: u64 = id
        .parse()
        .map_err(|_| ApiError::invalid_value("id", "item id must be numeric"))?;
    if id == 0 {
        return Err(ApiError::not_found("id", "item 0 does not exist"));
    }
    Ok(Json(json!({ "id": id })).into_response())
}

async fn form(args: ResolvedArguments) -> HandlerResult {
    let name = args.str("name").map(str::to_owned);
    let note = args.str("note").unwrap_or("none").to_owned();
    Ok(Json(json!({ "name": name, "note": note })).into_response())
}

async fn search(args: ResolvedArguments) -> HandlerResult {
    let page = args.get_as::<String>("page")?.unwrap_or_else(|| "1".to_string());
    let filters: Value = args
        .values()
        .iter()
        .filter(|(key, _)| key.as_str() != "q" && key.as_str() != "page")
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect::<serde_json::Map<_, _>>()
        .into();
    Ok(Json(json!({ "q": args.get("q"), "page": page, "filters": filters })).into_response())
}

/// The demo routes plus a non-handler export the registrar skips
pub fn module() -> Module {
    Module::new(MODULE_NAME)
        .with_handler(get("/").apply(HandlerFn::from_fn("index", Signature::new(), index)))
        .with_handler(post("/echo").apply(HandlerFn::from_fn(
            "echo",
            Signature::new().request().keyword("x"),
            echo,
        )))
        .with_handler(get("/item/{id}").apply(HandlerFn::from_fn(
            "item",
            Signature::new().request(),
            item,
        )))
        .with_handler(post("/form").apply(HandlerFn::from_fn(
            "form",
            Signature::new().keyword("name").keyword_or_default("note"),
            form,
        )))
        .with_handler(get("/search").apply(HandlerFn::from_fn(
            "search",
            Signature::new()
                .keyword("q")
                .keyword_or_default("page")
                .var_keyword("filters"),
            search,
        )))
        .with_value("VERSION", env!("CARGO_PKG_VERSION"))
}
