//! Request and response value types seen by the worker
//!
//! These mirror the Fetch-standard shapes the browser hands a service
//! worker, independent of whatever HTTP client backs the network.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Content type used for synthesized HTML documents
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Body of the page rendered when nothing better is available offline
const OFFLINE_BODY: &str = "<h1>Offline</h1>";

/// HTTP request method
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Other(String),
}

impl Method {
    /// Get the canonical upper-case token
    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Other(m) => m,
        }
    }
}

impl FromStr for Method {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_uppercase().as_str() {
            "GET" => Self::Get,
            "HEAD" => Self::Head,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "PATCH" => Self::Patch,
            "DELETE" => Self::Delete,
            "OPTIONS" => Self::Options,
            other => Self::Other(other.to_string()),
        })
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request mode as reported by the browser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    /// Top-level document load
    Navigate,
    SameOrigin,
    NoCors,
    #[default]
    Cors,
}

impl FromStr for RequestMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "navigate" => Ok(Self::Navigate),
            "same-origin" => Ok(Self::SameOrigin),
            "no-cors" => Ok(Self::NoCors),
            "cors" => Ok(Self::Cors),
            other => Err(format!("unknown request mode '{other}'")),
        }
    }
}

/// Request destination (what the fetched resource will be used as)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Destination {
    Document,
    Style,
    Script,
    Image,
    Font,
    #[default]
    Empty,
    Other(String),
}

impl Destination {
    /// Whether this destination is a static page asset
    pub fn is_static_asset(&self) -> bool {
        matches!(self, Self::Style | Self::Script | Self::Image | Self::Font)
    }
}

impl FromStr for Destination {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "document" => Self::Document,
            "style" => Self::Style,
            "script" => Self::Script,
            "image" => Self::Image,
            "font" => Self::Font,
            "" => Self::Empty,
            other => Self::Other(other.to_string()),
        })
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document => write!(f, "document"),
            Self::Style => write!(f, "style"),
            Self::Script => write!(f, "script"),
            Self::Image => write!(f, "image"),
            Self::Font => write!(f, "font"),
            Self::Empty => write!(f, ""),
            Self::Other(d) => write!(f, "{d}"),
        }
    }
}

/// Ordered header list with case-insensitive lookup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the first value for a header name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replace every value of `name` with a single value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.0.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.0.push((name, value.into()));
    }

    /// Append a value, keeping any existing ones
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// An intercepted request
///
/// The URL is kept as the raw string the page supplied; it is only parsed
/// where a decision depends on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub mode: RequestMode,
    pub destination: Destination,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl Request {
    /// Create a plain GET request for a URL
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            mode: RequestMode::default(),
            destination: Destination::default(),
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    /// Create a top-level document navigation
    pub fn navigate(url: impl Into<String>) -> Self {
        Self::get(url)
            .with_mode(RequestMode::Navigate)
            .with_destination(Destination::Document)
            .with_header("Accept", "text/html,application/xhtml+xml")
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.set(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Whether the accept header asks for an HTML document
    pub fn accepts_html(&self) -> bool {
        self.headers
            .get("accept")
            .is_some_and(|accept| accept.contains("text/html"))
    }

    /// Key under which a response for this request is cached
    ///
    /// Fragments never reach the network, so they are not part of the key.
    pub fn cache_key(&self) -> String {
        cache_key(&self.url)
    }
}

/// Normalize a URL into a cache key
///
/// Parsed URLs use their serialized form, so spellings that name the same
/// resource (case of scheme and host, missing root path, dot segments)
/// share one key. Unparseable input only loses its fragment.
pub fn cache_key(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.into()
        }
        Err(_) => match url.split_once('#') {
            Some((base, _)) => base.to_string(),
            None => url.to_string(),
        },
    }
}

/// A response returned by the network, a cache, or synthesized locally
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            status_text: default_status_text(status).to_string(),
            headers: Headers::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Minimal document shown when neither network nor cache can answer
    pub fn offline_page() -> Self {
        Self::new(200, OFFLINE_BODY).with_header("Content-Type", HTML_CONTENT_TYPE)
    }

    /// Response used when a strategy resolved to no response at all
    pub fn gateway_timeout() -> Self {
        Self::new(504, "Offline and not cached")
            .with_header("Content-Type", "text/plain; charset=utf-8")
    }

    /// Status in the 2xx range
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type")
    }

    /// Check whether the browser cache API would accept this response
    pub fn is_cacheable(&self) -> Result<(), String> {
        if self.status == 206 {
            return Err("partial content cannot be cached".to_string());
        }
        if self
            .headers
            .get("vary")
            .is_some_and(|vary| vary.split(',').any(|v| v.trim() == "*"))
        {
            return Err("response varies on every header".to_string());
        }
        Ok(())
    }
}

fn default_status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        206 => "Partial Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "",
    }
}
