use serde::Deserialize;
use serde_json::{Map, Value};

use super::headers::Headers;
use crate::bindings::JSError;

/// Terminal success reply of `fetch.poll`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FetchReply {
    pub status: u16,
    #[serde(default)]
    pub status_text: String,
    #[serde(default)]
    pub headers: Map<String, Value>,
    #[serde(default)]
    pub body: String,
}

/// Options for [`Response::new`].
#[derive(Clone, Debug, Default)]
pub struct ResponseInit {
    /// Defaults to 200.
    pub status: Option<u16>,
    pub status_text: String,
    pub headers: Headers,
}

/// A fetched (or guest-constructed) response with a read-once body.
#[derive(Debug, PartialEq)]
pub struct Response {
    status: u16,
    status_text: String,
    headers: Headers,
    body: String,
    body_used: bool,
}

impl Response {
    pub fn new(body: Option<String>, init: ResponseInit) -> Self {
        Self {
            status: init.status.unwrap_or(200),
            status_text: init.status_text,
            headers: init.headers,
            body: body.unwrap_or_default(),
            body_used: false,
        }
    }

    pub(crate) fn from_reply(reply: FetchReply) -> Self {
        Self {
            status: reply.status,
            status_text: reply.status_text,
            headers: Headers::from_json_object(&reply.headers),
            body: reply.body,
            body_used: false,
        }
    }

    pub const fn status(&self) -> u16 {
        self.status
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// True for 2xx statuses.
    pub const fn ok(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    pub const fn body_used(&self) -> bool {
        self.body_used
    }

    /// Read the body as text. Only the first read succeeds.
    ///
    /// # Errors
    /// Returns `BodyUsed` once the body has been read.
    pub fn text(&mut self) -> Result<String, JSError> {
        if self.body_used {
            return Err(JSError::BodyUsed(String::from(
                "Body has already been consumed",
            )));
        }
        self.body_used = true;
        Ok(std::mem::take(&mut self.body))
    }

    /// Read the body as JSON. Consumes the body even when it is not valid JSON.
    ///
    /// # Errors
    /// Returns `BodyUsed` once the body has been read and `SyntaxError` for invalid JSON.
    pub fn json(&mut self) -> Result<Value, JSError> {
        let text = self.text()?;
        serde_json::from_str(&text).map_err(|error| JSError::SyntaxError(error.to_string()))
    }

    /// `clone()`: an independent response over the same body and a copy of the headers.
    ///
    /// # Errors
    /// Returns `BodyUsed` when the body was already read.
    pub fn try_clone(&self) -> Result<Self, JSError> {
        if self.body_used {
            return Err(JSError::BodyUsed(String::from(
                "Cannot clone a response that has been consumed",
            )));
        }
        Ok(Self {
            status: self.status,
            status_text: self.status_text.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
            body_used: false,
        })
    }
}
