//! Client configuration: credentials, defaults and transport settings.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Environment variable overriding the API base URL.
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";
/// Environment variable overriding the default model.
pub const MODEL_ENV: &str = "OPENAI_MODEL";

/// A secret string type for sensitive data like API keys.
/// Prevents accidental logging or display of secrets.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    /// Create a new secret string.
    pub fn new(s: String) -> Self {
        Self(s)
    }

    /// Get the underlying secret value.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

/// HTTP transport configuration.
///
/// # Example
/// ```rust
/// use aikit::options::TransportOptions;
/// use std::time::Duration;
///
/// let options = TransportOptions::default()
///     .with_timeout(Duration::from_secs(30))
///     .with_header("OpenAI-Organization".to_string(), "org-123".to_string());
/// assert_eq!(options.timeout, Some(Duration::from_secs(30)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TransportOptions {
    /// Transfer timeout for a whole request
    pub timeout: Option<Duration>,

    /// HTTP proxy URL
    pub proxy: Option<String>,

    /// Additional HTTP headers to include in requests
    pub extra_headers: Option<HashMap<String, String>>,
}

impl TransportOptions {
    /// Set the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the proxy URL.
    pub fn with_proxy(mut self, proxy: String) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Set extra headers.
    pub fn with_extra_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.extra_headers = Some(headers);
        self
    }

    /// Add a single extra header.
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.extra_headers
            .get_or_insert_with(HashMap::new)
            .insert(key, value);
        self
    }
}

/// Application-level request defaults for a [`Client`](crate::client::Client).
///
/// Only the fields that are `Some` (or non-empty, for metadata) become
/// explicit client defaults; the rest stay unset.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// API key sent as a bearer token
    pub api_key: Option<SecretString>,

    /// Base URL; the endpoint path is appended
    pub api_url: Option<String>,

    /// Model identifier (e.g., "gpt-4o", "gpt-image-1")
    pub model: Option<String>,

    /// Metadata merged into every request
    pub metadata: BTreeMap<String, String>,

    /// Ask for an event stream instead of a single JSON body
    pub streaming: Option<bool>,

    /// Transport configuration
    #[serde(skip)]
    pub transport: TransportOptions,
}

impl ClientOptions {
    /// Read the API key, base URL and model from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            api_key: non_empty(API_KEY_ENV).map(SecretString::new),
            api_url: non_empty(BASE_URL_ENV),
            model: non_empty(MODEL_ENV),
            ..Self::default()
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, api_key: impl Into<SecretString>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the base URL.
    pub fn with_api_url(mut self, api_url: String) -> Self {
        self.api_url = Some(api_url);
        self
    }

    /// Set the model identifier.
    pub fn with_model(mut self, model: String) -> Self {
        self.model = Some(model);
        self
    }

    /// Add a metadata entry.
    pub fn with_metadata(mut self, key: String, value: String) -> Self {
        self.metadata.insert(key, value);
        self
    }

    /// Set the streaming flag.
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = Some(streaming);
        self
    }

    /// Set the transport options.
    pub fn with_transport(mut self, transport: TransportOptions) -> Self {
        self.transport = transport;
        self
    }
}

/// Redacted view used when options are logged or dumped.
#[derive(Debug, Serialize)]
pub struct ClientOptionsSummary<'a> {
    pub has_api_key: bool,
    pub api_url: Option<&'a str>,
    pub model: Option<&'a str>,
    pub metadata_keys: Vec<&'a str>,
    pub streaming: Option<bool>,
}

impl ClientOptions {
    pub fn summary(&self) -> ClientOptionsSummary<'_> {
        ClientOptionsSummary {
            has_api_key: self.api_key.as_ref().is_some_and(|k| !k.is_empty()),
            api_url: self.api_url.as_deref(),
            model: self.model.as_deref(),
            metadata_keys: self.metadata.keys().map(String::as_str).collect(),
            streaming: self.streaming,
        }
    }
}
