use axum::http::{HeaderMap, Method, Uri, header};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use super::signature::REQUEST_PARAM;
use super::traits::ApiError;

/// HTTP methods a handler can be annotated with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The raw request as seen by handlers that declare a `request` parameter.
///
/// Built once per request from the router-delivered parts; the body is not
/// part of it (it has already been consumed into arguments when needed).
#[derive(Debug, Clone)]
pub struct RequestInfo {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    path_params: Vec<(String, String)>,
}

impl RequestInfo {
    pub fn new(
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        path_params: Vec<(String, String)>,
    ) -> Self {
        Self {
            method,
            uri,
            headers,
            path_params,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Raw query string, empty when the URI has none
    pub fn query(&self) -> &str {
        self.uri.query().unwrap_or("")
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Content-Type header value, `None` when absent, blank or not visible ASCII
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Path parameters in the order the route pattern declares them
    pub fn path_params(&self) -> &[(String, String)] {
        &self.path_params
    }

    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Arguments a handler is invoked with, keyed by parameter name.
///
/// Values coming from path, query string and form bodies are JSON strings;
/// JSON bodies keep their original value types. The request object lives
/// under the reserved `request` key.
#[derive(Clone, Default)]
pub struct ResolvedArguments {
    values: Map<String, Value>,
    request: Option<Arc<RequestInfo>>,
}

impl ResolvedArguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values(values: Map<String, Value>) -> Self {
        Self {
            values,
            request: None,
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(name.into(), value)
    }

    /// Injects the request object, replacing any supplied `request` value
    pub fn set_request(&mut self, request: Arc<RequestInfo>) {
        self.values.remove(REQUEST_PARAM);
        self.request = Some(request);
    }

    pub fn request(&self) -> Option<&RequestInfo> {
        self.request.as_deref()
    }

    pub fn contains(&self, name: &str) -> bool {
        if name == REQUEST_PARAM && self.request.is_some() {
            return true;
        }
        self.values.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    pub fn require(&self, name: &str) -> Result<&Value, ApiError> {
        self.values
            .get(name)
            .ok_or_else(|| ApiError::invalid_value(name, format!("{name} is required")))
    }

    pub fn require_str(&self, name: &str) -> Result<&str, ApiError> {
        self.require(name)?
            .as_str()
            .ok_or_else(|| ApiError::invalid_value(name, format!("{name} must be a string")))
    }

    /// Deserializes a single argument into `T`
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, ApiError> {
        self.values
            .get(name)
            .map(|value| {
                serde_json::from_value(value.clone())
                    .map_err(|err| ApiError::invalid_value(name, err.to_string()))
            })
            .transpose()
    }

    /// Number of arguments, counting an injected request
    pub fn len(&self) -> usize {
        self.values.len() + usize::from(self.request.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }
}

impl fmt::Debug for ResolvedArguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, value) in &self.values {
            map.entry(name, value);
        }
        if let Some(request) = &self.request {
            map.entry(
                &REQUEST_PARAM,
                &format_args!("<{} {}>", request.method(), request.uri()),
            );
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request_info() -> Arc<RequestInfo> {
        Arc::new(RequestInfo::new(
            Method::POST,
            Uri::from_static("/echo?debug=1"),
            HeaderMap::new(),
            vec![("id".to_string(), "7".to_string())],
        ))
    }

    #[test]
    fn test_set_request_replaces_supplied_value() {
        let mut args = ResolvedArguments::new();
        args.insert("request", json!("spoofed"));
        args.insert("x", json!("1"));

        args.set_request(request_info());

        assert!(args.get("request").is_none());
        assert!(args.contains("request"));
        assert_eq!(args.len(), 2);
        assert_eq!(args.request().unwrap().path(), "/echo");
        assert_eq!(args.request().unwrap().query(), "debug=1");
    }

    #[test]
    fn test_typed_accessors() {
        let mut args = ResolvedArguments::new();
        args.insert("page", json!(3));
        args.insert("name", json!("alice"));

        assert_eq!(args.get_as::<u32>("page").unwrap(), Some(3));
        assert_eq!(args.get_as::<u32>("missing").unwrap(), None);
        assert!(args.get_as::<u32>("name").is_err());
        assert_eq!(args.require_str("name").unwrap(), "alice");

        let err = args.require_str("page").unwrap_err();
        assert_eq!(err.error, "value:invalid");
        assert_eq!(err.data, json!("page"));
    }

    #[test]
    fn test_debug_shows_request_placeholder() {
        let mut args = ResolvedArguments::new();
        args.insert("x", json!("1"));
        args.set_request(request_info());

        let rendered = format!("{args:?}");
        assert!(rendered.contains("\"x\": String(\"1\")"));
        assert!(rendered.contains("<POST /echo?debug=1>"));
    }

    #[test]
    fn test_request_info_content_type() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, "  ".parse().unwrap());
        let info = RequestInfo::new(Method::POST, Uri::from_static("/"), headers, vec![]);
        assert_eq!(info.content_type(), None);
        assert_eq!(info.path_param("id"), None);

        assert_eq!(request_info().path_param("id"), Some("7"));
    }
}
