//! Projections of framework objects into loggable structured form.
//!
//! Serializers decide what a request, a response, or an error looks like
//! inside a log record — and, just as deliberately, what they do *not* look
//! like. Bodies never appear; only the envelope does. Tests pin the exact
//! field sets so a new field is an explicit decision, not an accident.

use http::{HeaderMap, Method, Uri};
use serde_json::{Map, Value};

use crate::request::Request;
use crate::response::Response;

/// `{method, url, headers}`
pub fn request(request: &Request) -> Value {
    let mut out = Map::new();
    out.insert("method".to_owned(), Value::from(request.method().as_str()));
    out.insert("url".to_owned(), Value::from(request.uri().to_string()));
    out.insert("headers".to_owned(), headers(request.headers()));
    Value::Object(out)
}

/// `{status, method, url, size, responseTime, headers}` — method and url come
/// from the originating request; `responseTime` is omitted until the
/// request-logging middleware has filled it in.
pub fn response(method: &Method, url: &Uri, response: &Response) -> Value {
    let mut out = Map::new();
    out.insert("status".to_owned(), Value::from(response.status_code().as_u16()));
    out.insert("method".to_owned(), Value::from(method.as_str()));
    out.insert("url".to_owned(), Value::from(url.to_string()));
    out.insert("size".to_owned(), Value::from(response.size()));
    if let Some(seconds) = response.response_time() {
        out.insert("responseTime".to_owned(), Value::from(seconds));
    }
    out.insert("headers".to_owned(), headers(response.headers()));
    Value::Object(out)
}

/// `{message, chain}` — the `Display` rendering plus the `source()` chain,
/// outermost cause first. `chain` is omitted for errors with no source.
pub fn error(err: &(dyn std::error::Error + 'static)) -> Value {
    let mut chain = Vec::new();
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push(Value::from(cause.to_string()));
        source = cause.source();
    }

    let mut out = Map::new();
    out.insert("message".to_owned(), Value::from(err.to_string()));
    if !chain.is_empty() {
        out.insert("chain".to_owned(), Value::Array(chain));
    }
    Value::Object(out)
}

/// Header map as a JSON object. Values that are not valid UTF-8 are projected
/// lossily; repeated names collapse to one comma-joined value per RFC 9110.
fn headers(map: &HeaderMap) -> Value {
    let mut out = Map::new();
    for (name, value) in map {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        match out.get_mut(name.as_str()) {
            Some(Value::String(existing)) => {
                existing.push_str(", ");
                existing.push_str(&value);
            }
            _ => {
                out.insert(name.as_str().to_owned(), Value::String(value));
            }
        }
    }
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use super::*;

    fn keys(value: &Value) -> std::collections::BTreeSet<&str> {
        value.as_object().unwrap().keys().map(String::as_str).collect()
    }

    #[test]
    fn request_projection_has_exactly_three_fields() {
        let req = Request::test(
            Method::GET,
            "/users/42?full=1",
            &[("accept", "application/json")],
        );
        let value = request(&req);

        assert_eq!(keys(&value), ["method", "url", "headers"].into());
        assert_eq!(value["method"], "GET");
        assert_eq!(value["url"], "/users/42?full=1");
        assert_eq!(value["headers"]["accept"], "application/json");
    }

    #[test]
    fn response_projection_has_exactly_the_envelope_fields() {
        let mut res = Response::json(br#"{"ok":true}"#.to_vec());
        res.set_response_time(0.042);
        let value = response(&Method::POST, &"/orders".parse().unwrap(), &res);

        assert_eq!(
            keys(&value),
            ["status", "method", "url", "size", "responseTime", "headers"].into()
        );
        assert_eq!(value["status"], 200);
        assert_eq!(value["method"], "POST");
        assert_eq!(value["url"], "/orders");
        assert_eq!(value["size"], 11);
        assert_eq!(value["responseTime"], 0.042);
    }

    #[test]
    fn response_time_is_omitted_until_measured() {
        let res = Response::status(StatusCode::NO_CONTENT);
        let value = response(&Method::DELETE, &"/orders/7".parse().unwrap(), &res);
        assert!(value.get("responseTime").is_none());
        assert_eq!(value["size"], 0);
    }

    #[test]
    fn error_projection_walks_the_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "peer reset");
        let err = crate::Error::from(io);
        let value = error(&err);

        assert_eq!(value["message"], "io: peer reset");
        assert_eq!(value["chain"], serde_json::json!(["peer reset"]));
    }

    #[test]
    fn repeated_headers_collapse_to_one_comma_joined_value() {
        let req = Request::test(
            Method::GET,
            "/",
            &[("accept-encoding", "gzip"), ("accept-encoding", "br")],
        );
        let value = request(&req);
        assert_eq!(value["headers"]["accept-encoding"], "gzip, br");
    }
}
