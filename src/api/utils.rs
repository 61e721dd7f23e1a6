//! API utility functions
//!
//! Pure, stateless helpers for turning raw request pieces (content type,
//! query string, body bytes) into candidate argument maps.

use axum::http::header;
use serde_json::{Map, Value};

use crate::api::error::BadRequest;
use crate::handlers::RequestInfo;

/// How a POST body should be decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyKind {
    Json,
    UrlEncoded,
    Multipart,
    Unsupported(String),
}

/// Media type of a Content-Type header without parameters, lowercased
///
/// `application/json; charset=utf-8` becomes `application/json`.
/// Values the `mime` parser rejects fall back to the text before `;`.
pub fn media_type(content_type: &str) -> String {
    match content_type.parse::<mime::Mime>() {
        Ok(media) => media.essence_str().to_ascii_lowercase(),
        Err(_) => content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase(),
    }
}

/// Classifies a Content-Type header value by prefix of its media type
pub fn body_kind(content_type: &str) -> BodyKind {
    let media = media_type(content_type);
    if media.starts_with("application/json") {
        BodyKind::Json
    } else if media.starts_with("application/x-www-form-urlencoded") {
        BodyKind::UrlEncoded
    } else if media.starts_with("multipart/form-data") {
        BodyKind::Multipart
    } else {
        BodyKind::Unsupported(media)
    }
}

/// Decides how a POST body will be decoded, before any of it is read
///
/// Returns the kind together with the trimmed header value. A header that is
/// present but not visible ASCII is unsupported, not missing.
pub fn request_body_kind(info: &RequestInfo) -> Result<(BodyKind, &str), BadRequest> {
    let value = info
        .headers()
        .get(header::CONTENT_TYPE)
        .ok_or(BadRequest::MissingContentType)?;
    if value.to_str().is_err() {
        let raw = String::from_utf8_lossy(value.as_bytes());
        return Err(BadRequest::UnsupportedContentType(media_type(&raw)));
    }

    let content_type = info.content_type().ok_or(BadRequest::MissingContentType)?;
    match body_kind(content_type) {
        BodyKind::Unsupported(media) => Err(BadRequest::UnsupportedContentType(media)),
        kind => Ok((kind, content_type)),
    }
}

/// Decodes `application/x-www-form-urlencoded` pairs; the first value of a
/// repeated key wins and blank values are kept
pub fn parse_pairs(input: &[u8]) -> Map<String, Value> {
    let mut pairs = Map::new();
    for (key, value) in url::form_urlencoded::parse(input) {
        pairs
            .entry(key.into_owned())
            .or_insert_with(|| Value::String(value.into_owned()));
    }
    pairs
}

/// Query strings use the same encoding as urlencoded bodies
pub fn parse_query(query: &str) -> Map<String, Value> {
    parse_pairs(query.as_bytes())
}

/// Parses a JSON body that must be an object; an empty body is an empty object
pub fn parse_json_object(body: &[u8]) -> Result<Map<String, Value>, BadRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    match serde_json::from_slice::<Value>(body)? {
        Value::Object(map) => Ok(map),
        _ => Err(BadRequest::JsonNotObject),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue, Method, Uri};
    use serde_json::json;

    #[test]
    fn test_media_type_strips_parameters() {
        assert_eq!(media_type("application/json"), "application/json");
        assert_eq!(media_type("application/json; charset=utf-8"), "application/json");
        assert_eq!(media_type("Application/JSON"), "application/json");
        assert_eq!(media_type("text/plain;charset=UTF-8"), "text/plain");
        assert_eq!(media_type("garbage ; x"), "garbage");
    }

    #[test]
    fn test_body_kind() {
        assert_eq!(body_kind("application/json; charset=utf-8"), BodyKind::Json);
        assert_eq!(
            body_kind("application/x-www-form-urlencoded"),
            BodyKind::UrlEncoded
        );
        assert_eq!(
            body_kind("multipart/form-data; boundary=XyZ"),
            BodyKind::Multipart
        );
        assert_eq!(
            body_kind("text/plain"),
            BodyKind::Unsupported("text/plain".into())
        );
    }

    fn post_info(content_type: Option<HeaderValue>) -> RequestInfo {
        let mut headers = HeaderMap::new();
        if let Some(content_type) = content_type {
            headers.insert(header::CONTENT_TYPE, content_type);
        }
        RequestInfo::new(Method::POST, Uri::from_static("/form"), headers, Vec::new())
    }

    #[test]
    fn test_request_body_kind() {
        let info = post_info(Some(HeaderValue::from_static(" application/json; charset=utf-8 ")));
        assert_eq!(
            request_body_kind(&info),
            Ok((BodyKind::Json, "application/json; charset=utf-8"))
        );

        assert_eq!(
            request_body_kind(&post_info(Some(HeaderValue::from_static("text/plain")))),
            Err(BadRequest::UnsupportedContentType("text/plain".into()))
        );
        assert_eq!(
            request_body_kind(&post_info(None)),
            Err(BadRequest::MissingContentType)
        );
        assert_eq!(
            request_body_kind(&post_info(Some(HeaderValue::from_static("   ")))),
            Err(BadRequest::MissingContentType)
        );
    }

    #[test]
    fn test_request_body_kind_non_ascii_header_is_unsupported() {
        let value = HeaderValue::from_bytes(b"text/pl\xe4in").unwrap();
        assert!(matches!(
            request_body_kind(&post_info(Some(value))),
            Err(BadRequest::UnsupportedContentType(_))
        ));
    }

    #[test]
    fn test_parse_query_first_value_wins() {
        let parsed = parse_query("a=1&a=2&b=3");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed["a"], json!("1"));
        assert_eq!(parsed["b"], json!("3"));
    }

    #[test]
    fn test_parse_query_decoding_and_blanks() {
        let parsed = parse_query("q=hello+world&tag=%E2%9C%93&empty=");
        assert_eq!(parsed["q"], json!("hello world"));
        assert_eq!(parsed["tag"], json!("\u{2713}"));
        assert_eq!(parsed["empty"], json!(""));
        assert!(parse_query("").is_empty());
    }

    #[test]
    fn test_parse_json_object() {
        let parsed = parse_json_object(br#"{"x": "1", "n": 2}"#).unwrap();
        assert_eq!(parsed["x"], json!("1"));
        assert_eq!(parsed["n"], json!(2));

        assert!(parse_json_object(b"").unwrap().is_empty());
        assert!(parse_json_object(b"  \n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_json_rejects_non_objects() {
        for body in [&b"[1, 2]"[..], b"\"text\"", b"42", b"null", b"true"] {
            assert_eq!(parse_json_object(body), Err(BadRequest::JsonNotObject));
        }
        assert!(matches!(
            parse_json_object(b"{not json"),
            Err(BadRequest::InvalidJson(_))
        ));
    }
}
