//! The guest `URL` value.
//!
//! `href` is the single source of truth. Every getter reads the record the
//! host canonicalizer returned for the last successful parse or mutation, and
//! every setter replaces that whole record, so coupled components (`host`,
//! `hostname`, `port`) never drift apart.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize, Serializer};

use crate::bindings::{JSError, JSValue};
use crate::bridge::HostBridge;

/// Canonical decomposition returned by `url.parse` and `url.setComponent`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct UrlRecord {
    pub href: String,
    pub origin: String,
    pub protocol: String,
    pub username: String,
    pub password: String,
    pub host: String,
    pub hostname: String,
    pub port: String,
    pub pathname: String,
    pub search: String,
    pub hash: String,
}

/// A settable URL component.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UrlComponent {
    Href,
    Protocol,
    Username,
    Password,
    Host,
    Hostname,
    Port,
    Pathname,
    Search,
    Hash,
}

impl UrlComponent {
    pub const ALL: [Self; 10] = [
        Self::Href,
        Self::Protocol,
        Self::Username,
        Self::Password,
        Self::Host,
        Self::Hostname,
        Self::Port,
        Self::Pathname,
        Self::Search,
        Self::Hash,
    ];

    /// The component a guest property name refers to.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|component| component.as_str() == name)
    }

    /// Name passed to `url.setComponent`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Href => "href",
            Self::Protocol => "protocol",
            Self::Username => "username",
            Self::Password => "password",
            Self::Host => "host",
            Self::Hostname => "hostname",
            Self::Port => "port",
            Self::Pathname => "pathname",
            Self::Search => "search",
            Self::Hash => "hash",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Url {
    bridge: HostBridge,
    record: UrlRecord,
}

impl Url {
    /// Parse `input`, resolving it against `base` when given.
    ///
    /// # Errors
    /// Returns `InvalidUrl` carrying `input` when the host rejects it.
    pub fn parse(bridge: &HostBridge, input: &str, base: Option<&str>) -> Result<Self, JSError> {
        let record = bridge
            .call_json::<UrlRecord>(
                "url",
                "parse",
                vec![JSValue::from(input), JSValue::from(base.unwrap_or(""))],
            )
            .map_err(|failure| {
                log::debug!("rejected URL {input:?}: {}", failure.message);
                failure.into_error(|_| JSError::InvalidUrl(input.to_string()))
            })?;
        Ok(Self {
            bridge: bridge.clone(),
            record,
        })
    }

    /// `URL.parse`: like [`Url::parse`] but yields `None` on failure.
    pub fn try_parse(bridge: &HostBridge, input: &str, base: Option<&str>) -> Option<Self> {
        Self::parse(bridge, input, base).ok()
    }

    /// `URL.canParse`.
    pub fn can_parse(bridge: &HostBridge, input: &str, base: Option<&str>) -> bool {
        Self::parse(bridge, input, base).is_ok()
    }

    pub fn href(&self) -> &str {
        &self.record.href
    }

    pub fn origin(&self) -> &str {
        &self.record.origin
    }

    pub fn protocol(&self) -> &str {
        &self.record.protocol
    }

    pub fn username(&self) -> &str {
        &self.record.username
    }

    pub fn password(&self) -> &str {
        &self.record.password
    }

    pub fn host(&self) -> &str {
        &self.record.host
    }

    pub fn hostname(&self) -> &str {
        &self.record.hostname
    }

    pub fn port(&self) -> &str {
        &self.record.port
    }

    pub fn pathname(&self) -> &str {
        &self.record.pathname
    }

    pub fn search(&self) -> &str {
        &self.record.search
    }

    pub fn hash(&self) -> &str {
        &self.record.hash
    }

    /// The full decomposition from the last successful parse or mutation.
    pub fn record(&self) -> &UrlRecord {
        &self.record
    }

    /// Replace one component and adopt the host's recomputed record.
    ///
    /// # Errors
    /// Returns `InvalidUrl` when the host rejects the new value; the URL is
    /// left exactly as it was.
    pub fn set(&mut self, component: UrlComponent, value: &str) -> Result<(), JSError> {
        let record = self
            .bridge
            .call_json::<UrlRecord>(
                "url",
                "setComponent",
                vec![
                    JSValue::from(self.record.href.as_str()),
                    JSValue::from(component.as_str()),
                    JSValue::from(value),
                ],
            )
            .map_err(|failure| {
                log::debug!(
                    "rejected {} = {value:?} on {}: {}",
                    component.as_str(),
                    self.record.href,
                    failure.message
                );
                failure.into_error(|message| JSError::InvalidUrl(format!("{value} ({message})")))
            })?;
        self.record = record;
        Ok(())
    }

    /// # Errors
    /// See [`Url::set`].
    pub fn set_href(&mut self, value: &str) -> Result<(), JSError> {
        self.set(UrlComponent::Href, value)
    }

    /// # Errors
    /// See [`Url::set`].
    pub fn set_protocol(&mut self, value: &str) -> Result<(), JSError> {
        self.set(UrlComponent::Protocol, value)
    }

    /// # Errors
    /// See [`Url::set`].
    pub fn set_username(&mut self, value: &str) -> Result<(), JSError> {
        self.set(UrlComponent::Username, value)
    }

    /// # Errors
    /// See [`Url::set`].
    pub fn set_password(&mut self, value: &str) -> Result<(), JSError> {
        self.set(UrlComponent::Password, value)
    }

    /// # Errors
    /// See [`Url::set`].
    pub fn set_host(&mut self, value: &str) -> Result<(), JSError> {
        self.set(UrlComponent::Host, value)
    }

    /// # Errors
    /// See [`Url::set`].
    pub fn set_hostname(&mut self, value: &str) -> Result<(), JSError> {
        self.set(UrlComponent::Hostname, value)
    }

    /// # Errors
    /// See [`Url::set`].
    pub fn set_port(&mut self, value: &str) -> Result<(), JSError> {
        self.set(UrlComponent::Port, value)
    }

    /// # Errors
    /// See [`Url::set`].
    pub fn set_pathname(&mut self, value: &str) -> Result<(), JSError> {
        self.set(UrlComponent::Pathname, value)
    }

    /// # Errors
    /// See [`Url::set`].
    pub fn set_search(&mut self, value: &str) -> Result<(), JSError> {
        self.set(UrlComponent::Search, value)
    }

    /// # Errors
    /// See [`Url::set`].
    pub fn set_hash(&mut self, value: &str) -> Result<(), JSError> {
        self.set(UrlComponent::Hash, value)
    }

    /// `toJSON()`: the current `href`.
    pub fn to_json(&self) -> String {
        self.record.href.clone()
    }
}

impl Display for Url {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.record.href)
    }
}

impl Serialize for Url {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.record.href)
    }
}

impl PartialEq for Url {
    fn eq(&self, other: &Self) -> bool {
        self.record == other.record
    }
}
