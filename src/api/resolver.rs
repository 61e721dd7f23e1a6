//! Request-to-argument binding
//!
//! [`ArgumentResolver::resolve`] turns an [`IncomingRequest`] into the exact
//! [`ResolvedArguments`] a handler is called with:
//!
//! 1. Body and query are only looked at when the handler wants the request,
//!    accepts arbitrary keywords or declares named parameters.
//! 2. POST bodies are decoded by content type (JSON object, urlencoded or
//!    multipart form); anything else is rejected.
//! 3. GET requests decode the query string; repeated keys keep the first value.
//! 4. Without candidates the path parameters are the whole argument set.
//! 5. Otherwise candidates are narrowed to the named parameters (unless the
//!    handler takes `**kw`) and path parameters are laid over them.
//! 6. The request object is injected under `request` when asked for.
//! 7. Required parameters are checked when the handler takes the request,
//!    or always in strict mode.

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, FromRequest, Multipart},
    http::{Method, Request, header},
};
use serde_json::{Map, Value, json};
use tower::{Layer, ServiceExt, service_fn};
use tracing::info;

use super::error::BadRequest;
use super::request::IncomingRequest;
use super::utils::{self, BodyKind};
use crate::handlers::{HandlerDescriptor, RequestInfo, ResolvedArguments};

#[derive(Debug, Clone, Copy, Default)]
pub struct ArgumentResolver {
    strict_required: bool,
}

impl ArgumentResolver {
    /// With `strict_required`, missing required parameters are rejected even
    /// for handlers that do not take the request object
    pub fn new(strict_required: bool) -> Self {
        Self { strict_required }
    }

    pub async fn resolve(
        &self,
        descriptor: &HandlerDescriptor,
        request: &IncomingRequest,
    ) -> Result<ResolvedArguments, BadRequest> {
        let info = request.info();
        let mut candidates = None;

        if descriptor.needs_parsing() {
            if *info.method() == Method::POST {
                candidates = Some(parse_body(info, request.body()).await?);
            } else if *info.method() == Method::GET {
                candidates = Some(utils::parse_query(info.query()));
            }
        }

        let mut args = match candidates {
            None => ResolvedArguments::from_values(path_values(info)),
            Some(candidates) => ResolvedArguments::from_values(merge(descriptor, info, candidates)),
        };

        if descriptor.accepts_request() {
            args.set_request(request.shared_info());
        }

        if descriptor.accepts_request() || self.strict_required {
            if let Some(missing) = descriptor
                .required_parameters()
                .iter()
                .find(|name| !args.contains(name))
            {
                return Err(BadRequest::MissingArgument(missing.clone()));
            }
        }

        Ok(args)
    }
}

fn path_values(info: &RequestInfo) -> Map<String, Value> {
    info.path_params()
        .iter()
        .map(|(name, value)| (name.clone(), Value::String(value.clone())))
        .collect()
}

/// Narrows candidates to named parameters, then lets path parameters win
fn merge(
    descriptor: &HandlerDescriptor,
    info: &RequestInfo,
    candidates: Map<String, Value>,
) -> Map<String, Value> {
    let mut values = if !descriptor.accepts_arbitrary_keywords()
        && !descriptor.named_parameters().is_empty()
    {
        candidates
            .into_iter()
            .filter(|(name, _)| descriptor.is_named(name))
            .collect()
    } else {
        candidates
    };

    for (name, value) in info.path_params() {
        if values.contains_key(name) {
            info!(arg = %name, "Duplicate arg name in named arg and kw args, path value wins");
        }
        values.insert(name.clone(), Value::String(value.clone()));
    }

    values
}

async fn parse_body(info: &RequestInfo, body: &bytes::Bytes) -> Result<Map<String, Value>, BadRequest> {
    let (kind, content_type) = utils::request_body_kind(info)?;

    match kind {
        BodyKind::Json => utils::parse_json_object(body),
        BodyKind::UrlEncoded => Ok(utils::parse_pairs(body)),
        BodyKind::Multipart => parse_multipart(content_type, body).await,
        BodyKind::Unsupported(media) => Err(BadRequest::UnsupportedContentType(media)),
    }
}

/// Text fields become strings; file fields become
/// `{"filename", "content_type", "size"}` descriptions
async fn parse_multipart(
    content_type: &str,
    body: &bytes::Bytes,
) -> Result<Map<String, Value>, BadRequest> {
    let request = Request::builder()
        .method(Method::POST)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body.clone()))
        .map_err(|err| BadRequest::InvalidForm(err.to_string()))?;

    // The body was already read under the configured limit; without this
    // layer the extractor would apply axum's own default cap on top
    let extract = DefaultBodyLimit::disable()
        .layer(service_fn(|request: Request<Body>| Multipart::from_request(request, &())));
    let mut multipart = extract
        .oneshot(request)
        .await
        .map_err(|rejection| BadRequest::InvalidForm(rejection.body_text()))?;

    let mut fields = Map::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| BadRequest::InvalidForm(err.body_text()))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        if fields.contains_key(&name) {
            continue;
        }

        let value = match field.file_name().map(str::to_owned) {
            Some(filename) => {
                let content_type = field.content_type().map(str::to_owned);
                let data = field
                    .bytes()
                    .await
                    .map_err(|err| BadRequest::InvalidForm(err.body_text()))?;
                json!({
                    "filename": filename,
                    "content_type": content_type,
                    "size": data.len(),
                })
            }
            None => Value::String(
                field
                    .text()
                    .await
                    .map_err(|err| BadRequest::InvalidForm(err.body_text()))?,
            ),
        };
        fields.insert(name, value);
    }

    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{HttpMethod, Signature, classify};
    use axum::http::{HeaderMap, HeaderValue, Uri};

    fn descriptor(method: HttpMethod, path: &str, signature: Signature) -> HandlerDescriptor {
        HandlerDescriptor::new(method, path, classify("test", &signature).unwrap())
    }

    fn incoming(
        method: Method,
        uri: &str,
        content_type: Option<&str>,
        path_params: &[(&str, &str)],
        body: &str,
    ) -> IncomingRequest {
        let mut headers = HeaderMap::new();
        if let Some(content_type) = content_type {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
        }
        let params = path_params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let info = RequestInfo::new(method, uri.parse::<Uri>().unwrap(), headers, params);
        IncomingRequest::new(info, body.to_string())
    }

    fn echo() -> HandlerDescriptor {
        descriptor(HttpMethod::Post, "/echo", Signature::new().request().keyword("x"))
    }

    #[tokio::test]
    async fn test_json_body_with_request() {
        let request = incoming(Method::POST, "/echo", Some("application/json"), &[], r#"{"x":"1"}"#);
        let args = ArgumentResolver::default().resolve(&echo(), &request).await.unwrap();

        assert_eq!(args.len(), 2);
        assert_eq!(args.str("x"), Some("1"));
        assert_eq!(args.request().unwrap().path(), "/echo");
    }

    #[tokio::test]
    async fn test_missing_required_with_request() {
        let request = incoming(Method::POST, "/echo", Some("application/json"), &[], r#"{"y":"1"}"#);
        let err = ArgumentResolver::default().resolve(&echo(), &request).await.unwrap_err();

        assert_eq!(err, BadRequest::MissingArgument("x".into()));
        assert_eq!(err.to_string(), "Missing someone argument");
    }

    #[tokio::test]
    async fn test_missing_required_without_request_is_tolerated() {
        let descriptor = descriptor(HttpMethod::Post, "/hello", Signature::new().keyword("name"));
        let request = incoming(Method::POST, "/hello", Some("application/json"), &[], "{}");

        let args = ArgumentResolver::default().resolve(&descriptor, &request).await.unwrap();
        assert!(args.is_empty());

        let err = ArgumentResolver::new(true)
            .resolve(&descriptor, &request)
            .await
            .unwrap_err();
        assert_eq!(err, BadRequest::MissingArgument("name".into()));
    }

    #[tokio::test]
    async fn test_missing_content_type_even_with_body() {
        let request = incoming(Method::POST, "/echo", None, &[], r#"{"x":"1"}"#);
        let err = ArgumentResolver::default().resolve(&echo(), &request).await.unwrap_err();
        assert_eq!(err, BadRequest::MissingContentType);
    }

    #[tokio::test]
    async fn test_json_non_object_rejected() {
        for body in ["[1,2]", "\"x\"", "3"] {
            let request = incoming(Method::POST, "/echo", Some("application/json"), &[], body);
            let err = ArgumentResolver::default().resolve(&echo(), &request).await.unwrap_err();
            assert_eq!(err, BadRequest::JsonNotObject);
        }
    }

    #[tokio::test]
    async fn test_unsupported_content_type() {
        let request = incoming(Method::POST, "/form", Some("text/plain; charset=utf-8"), &[], "x=1");
        let err = ArgumentResolver::default().resolve(&echo(), &request).await.unwrap_err();
        assert_eq!(err.to_string(), "Unsupported Content-Type:text/plain");
    }

    #[tokio::test]
    async fn test_get_query_first_value_wins() {
        let descriptor = descriptor(HttpMethod::Get, "/search", Signature::new().var_keyword("kw"));
        let request = incoming(Method::GET, "/search?a=1&a=2&b=3", None, &[], "");

        let args = ArgumentResolver::default().resolve(&descriptor, &request).await.unwrap();
        assert_eq!(args.len(), 2);
        assert_eq!(args.str("a"), Some("1"));
        assert_eq!(args.str("b"), Some("3"));
    }

    #[tokio::test]
    async fn test_path_overrides_body() {
        let descriptor = descriptor(
            HttpMethod::Post,
            "/item/{id}",
            Signature::new().keyword("id").keyword_or_default("note"),
        );
        let request = incoming(
            Method::POST,
            "/item/7",
            Some("application/json"),
            &[("id", "7")],
            r#"{"id":"5","note":"n","junk":true}"#,
        );

        let args = ArgumentResolver::default().resolve(&descriptor, &request).await.unwrap();
        assert_eq!(args.str("id"), Some("7"));
        assert_eq!(args.str("note"), Some("n"));
        assert!(!args.contains("junk"));
    }

    #[tokio::test]
    async fn test_get_path_only_with_request() {
        let descriptor = descriptor(HttpMethod::Get, "/item/{id}", Signature::new().request());
        let request = incoming(Method::GET, "/item/42", None, &[("id", "42")], "");

        let args = ArgumentResolver::default().resolve(&descriptor, &request).await.unwrap();
        assert_eq!(args.len(), 2);
        assert_eq!(args.str("id"), Some("42"));
        assert!(args.request().is_some());
    }

    #[tokio::test]
    async fn test_simple_handler_skips_parsing() {
        let descriptor = descriptor(HttpMethod::Post, "/item/{id}", Signature::new().positional("id"));
        // Would be rejected if the body were inspected
        let request = incoming(Method::POST, "/item/3", None, &[("id", "3")], "garbage");

        let args = ArgumentResolver::default().resolve(&descriptor, &request).await.unwrap();
        assert_eq!(args.len(), 1);
        assert_eq!(args.str("id"), Some("3"));
    }

    #[tokio::test]
    async fn test_var_keyword_passes_everything_through() {
        let descriptor = descriptor(
            HttpMethod::Post,
            "/any",
            Signature::new().keyword("a").var_keyword("kw"),
        );
        let request = incoming(
            Method::POST,
            "/any",
            Some("application/json"),
            &[],
            r#"{"a":1,"b":[1,2],"request":"spoof"}"#,
        );

        let args = ArgumentResolver::default().resolve(&descriptor, &request).await.unwrap();
        assert_eq!(args.get("a"), Some(&json!(1)));
        assert_eq!(args.get("b"), Some(&json!([1, 2])));
        assert_eq!(args.str("request"), Some("spoof"));
    }

    #[tokio::test]
    async fn test_urlencoded_form() {
        let descriptor = descriptor(
            HttpMethod::Post,
            "/form",
            Signature::new().keyword("name").keyword_or_default("note"),
        );
        let request = incoming(
            Method::POST,
            "/form",
            Some("application/x-www-form-urlencoded"),
            &[],
            "name=first&name=second&other=x",
        );

        let args = ArgumentResolver::default().resolve(&descriptor, &request).await.unwrap();
        assert_eq!(args.len(), 1);
        assert_eq!(args.str("name"), Some("first"));
    }

    #[tokio::test]
    async fn test_multipart_form() {
        let descriptor = descriptor(
            HttpMethod::Post,
            "/upload",
            Signature::new().keyword("title").keyword_or_default("file"),
        );
        let body = "--XyZ\r\n\
            Content-Disposition: form-data; name=\"title\"\r\n\r\n\
            hello\r\n\
            --XyZ\r\n\
            Content-Disposition: form-data; name=\"title\"\r\n\r\n\
            ignored\r\n\
            --XyZ\r\n\
            Content-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n\
            Content-Type: text/plain\r\n\r\n\
            abcd\r\n\
            --XyZ--\r\n";
        let request = incoming(
            Method::POST,
            "/upload",
            Some("multipart/form-data; boundary=XyZ"),
            &[],
            body,
        );

        let args = ArgumentResolver::default().resolve(&descriptor, &request).await.unwrap();
        assert_eq!(args.str("title"), Some("hello"));
        assert_eq!(
            args.get("file"),
            Some(&json!({"filename": "a.txt", "content_type": "text/plain", "size": 4}))
        );
    }

    #[tokio::test]
    async fn test_multipart_larger_than_axum_default_limit() {
        let descriptor = descriptor(HttpMethod::Post, "/upload", Signature::new().keyword("notes"));
        let notes = "n".repeat(3 * 1024 * 1024);
        let body = format!(
            "--XyZ\r\nContent-Disposition: form-data; name=\"notes\"\r\n\r\n{notes}\r\n--XyZ--\r\n"
        );
        let request = incoming(
            Method::POST,
            "/upload",
            Some("multipart/form-data; boundary=XyZ"),
            &[],
            &body,
        );

        let args = ArgumentResolver::default().resolve(&descriptor, &request).await.unwrap();
        assert_eq!(args.str("notes").map(str::len), Some(notes.len()));
    }

    #[tokio::test]
    async fn test_empty_json_body_satisfies_optional_parameters() {
        let descriptor = descriptor(
            HttpMethod::Post,
            "/opt",
            Signature::new().request().keyword_or_default("page"),
        );
        let request = incoming(Method::POST, "/opt", Some("application/json"), &[], "");

        let args = ArgumentResolver::default().resolve(&descriptor, &request).await.unwrap();
        assert_eq!(args.len(), 1);
        assert!(args.request().is_some());
    }

    #[tokio::test]
    async fn test_empty_query_falls_back_to_path_params() {
        let descriptor = descriptor(
            HttpMethod::Get,
            "/user/{id}",
            Signature::new().keyword("id").keyword_or_default("expand"),
        );
        let request = incoming(Method::GET, "/user/9", None, &[("id", "9")], "");

        let args = ArgumentResolver::default().resolve(&descriptor, &request).await.unwrap();
        assert_eq!(args.len(), 1);
        assert_eq!(args.str("id"), Some("9"));
    }
}
