use reqwest::{RequestBuilder, Response};
use serde_json::Value;

/// Copy the request headers sent by the shim (a JSON object of name to
/// value) onto `req`. Non-string values are sent in their JSON form and
/// unparsable input adds nothing.
pub fn apply_headers_from_json(req: RequestBuilder, headers_json: &str) -> RequestBuilder {
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(headers_json) else {
        return req;
    };
    map.into_iter().fold(req, |req, (name, value)| match value {
        Value::String(text) => req.header(name, text),
        Value::Null => req,
        other => req.header(name, other.to_string()),
    })
}

/// Response headers with names lower-cased and repeated names comma-joined.
pub fn collect_headers(resp: &Response) -> Vec<(String, String)> {
    let mut headers: Vec<(String, String)> = Vec::new();
    for (name, value) in resp.headers() {
        let Ok(text) = value.to_str() else {
            continue;
        };
        let key = name.as_str().to_ascii_lowercase();
        match headers.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, joined)) => {
                joined.push_str(", ");
                joined.push_str(text);
            }
            None => headers.push((key, text.to_string())),
        }
    }
    headers
}

#[inline]
pub fn maybe_attach_body(req: RequestBuilder, body: &str) -> RequestBuilder {
    if body.is_empty() {
        req
    } else {
        req.body(body.to_string())
    }
}
