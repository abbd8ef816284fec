use std::collections::HashMap;

use reqwest::{Client, Method};
use serde::Serialize;
use serde_json::{Map, Value, json};
use url::Url;

use crate::util::{apply_headers_from_json, collect_headers, maybe_attach_body};

/// Success shape of a terminal `fetch.poll` reply.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PollReply<'done> {
    status: u16,
    status_text: &'done str,
    headers: Map<String, Value>,
    body: &'done str,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchDone {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body_text: String,
    pub error: Option<String>,
}

impl FetchDone {
    pub fn failed(error: String) -> Self {
        Self {
            status: 0,
            status_text: String::new(),
            headers: Vec::new(),
            body_text: String::new(),
            error: Some(error),
        }
    }

    /// The terminal `fetch.poll` reply.
    pub fn to_reply(&self) -> Value {
        if let Some(error) = &self.error {
            return json!({ "error": error });
        }
        let headers: Map<String, Value> = self
            .headers
            .iter()
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect();
        let reply = PollReply {
            status: self.status,
            status_text: &self.status_text,
            headers,
            body: &self.body_text,
        };
        serde_json::to_value(reply).unwrap_or_else(|error| json!({ "error": error.to_string() }))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchEntry {
    Pending,
    Done(FetchDone),
}

#[derive(Debug, Default)]
pub struct FetchRegistry {
    pub next_id: u64,
    pub entries: HashMap<u64, FetchEntry>,
}

impl FetchRegistry {
    pub fn allocate_id(&mut self) -> u64 {
        self.next_id = self.next_id.wrapping_add(1).max(1);
        self.next_id
    }

    /// Record a finished task. Unknown ids are ignored.
    pub fn finish(&mut self, id: u64, done: FetchDone) {
        if let Some(entry) = self.entries.get_mut(&id) {
            *entry = FetchEntry::Done(done);
        }
    }

    /// The entry for `id`; terminal entries are handed out once and forgotten.
    pub fn take_done(&mut self, id: u64) -> Option<FetchEntry> {
        match self.entries.get(&id)? {
            FetchEntry::Pending => Some(FetchEntry::Pending),
            FetchEntry::Done(_) => self.entries.remove(&id),
        }
    }

    pub fn in_flight(&self) -> usize {
        self.entries.len()
    }
}

pub async fn fetch_file(parsed: &Url) -> Result<FetchDone, String> {
    let path = parsed
        .to_file_path()
        .map_err(|()| String::from("Invalid file path"))?;
    let data = tokio::fs::read(&path)
        .await
        .map_err(|error| format!("File read error: {error}"))?;
    Ok(FetchDone {
        status: 200,
        status_text: String::from("OK"),
        headers: Vec::new(),
        body_text: String::from_utf8_lossy(&data).into_owned(),
        error: None,
    })
}

pub async fn fetch_http(
    client: &Client,
    method_upper: &str,
    url_final: &str,
    headers_json: &str,
    body: &str,
) -> Result<FetchDone, String> {
    let method = Method::from_bytes(method_upper.as_bytes())
        .map_err(|_| format!("Invalid method: {method_upper}"))?;
    let mut req = client.request(method, url_final);
    req = apply_headers_from_json(req, headers_json);
    req = maybe_attach_body(req, body);

    let resp = req
        .send()
        .await
        .map_err(|error| format!("Network error: {error}"))?;
    let status = resp.status().as_u16();
    let status_text = resp.status().canonical_reason().unwrap_or("").to_string();
    let headers = collect_headers(&resp);
    let bytes = resp
        .bytes()
        .await
        .map_err(|error| format!("Read body error: {error}"))?;
    Ok(FetchDone {
        status,
        status_text,
        headers,
        body_text: String::from_utf8_lossy(&bytes).into_owned(),
        error: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_outcomes_are_handed_out_once() {
        let mut registry = FetchRegistry::default();
        let id = registry.allocate_id();
        registry.entries.insert(id, FetchEntry::Pending);
        assert_eq!(registry.take_done(id), Some(FetchEntry::Pending));
        registry.finish(id, FetchDone::failed(String::from("boom")));
        let Some(FetchEntry::Done(done)) = registry.take_done(id) else {
            panic!("expected a terminal entry");
        };
        assert_eq!(done.to_reply(), json!({"error": "boom"}));
        assert_eq!(registry.take_done(id), None);
        assert_eq!(registry.in_flight(), 0);
    }

    #[test]
    fn success_replies_use_guest_field_names() {
        let done = FetchDone {
            status: 404,
            status_text: String::from("Not Found"),
            headers: vec![(String::from("content-type"), String::from("text/plain"))],
            body_text: String::from("missing"),
            error: None,
        };
        assert_eq!(
            done.to_reply(),
            json!({
                "status": 404,
                "statusText": "Not Found",
                "headers": {"content-type": "text/plain"},
                "body": "missing",
            })
        );
    }

    #[test]
    fn ids_start_at_one() {
        let mut registry = FetchRegistry::default();
        assert_eq!(registry.allocate_id(), 1);
        assert_eq!(registry.allocate_id(), 2);
    }
}
