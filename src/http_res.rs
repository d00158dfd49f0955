//! Data structures for modeling an HTTP response.
//!
//! A response accumulates a status, headers, a protocol version and a body, and is emitted as a raw
//! HTTP/1.x message: status line, headers, blank line, body.

use indexmap::IndexMap;
use log::{debug, trace};
use std::{error, fmt, io, str};

/// HTTP protocol version of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpVersion {
    #[default]
    Http10,
    Http11,
}

impl fmt::Display for HttpVersion {
    #[cfg_attr(coverage, coverage(off))]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http10 => f.write_str("1.0"),
            Self::Http11 => f.write_str("1.1"),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum VersionParsingError {
    Unsupported(String),
}

impl fmt::Display for VersionParsingError {
    #[cfg_attr(coverage, coverage(off))]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported(v) => write!(f, "unsupported HTTP version {:?}", v),
        }
    }
}

impl error::Error for VersionParsingError {}

impl str::FromStr for HttpVersion {
    type Err = VersionParsingError;

    /// Accepts `1.0` and `1.1`, with or without the `HTTP/` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix("HTTP/").unwrap_or(s) {
            "1.0" => Ok(Self::Http10),
            "1.1" => Ok(Self::Http11),
            _ => Err(VersionParsingError::Unsupported(String::from(s))),
        }
    }
}

/// Canonical reason phrase of a status code, if the code is a known one.
pub fn get_reason_phrase(status_code: u16) -> Option<&'static str> {
    match status_code {
        200 => Some("OK"),
        201 => Some("Created"),
        202 => Some("Accepted"),
        203 => Some("Non-Authoritative"),
        204 => Some("No Content"),
        205 => Some("Reset Content"),
        206 => Some("Partial Content"),
        300 => Some("Multiple Choices"),
        301 => Some("Moved Permanently"),
        302 => Some("Found"),
        303 => Some("See Other"),
        304 => Some("Not Modified"),
        305 => Some("Use Proxy"),
        307 => Some("Temporary Redirect"),
        400 => Some("Bad Request"),
        401 => Some("Unauthorized"),
        402 => Some("Payment Required"),
        403 => Some("Forbidden"),
        404 => Some("Not Found"),
        405 => Some("Method Not Allowed"),
        406 => Some("Not Acceptable"),
        407 => Some("Proxy Authentication Required"),
        408 => Some("Request Time-out"),
        409 => Some("Conflict"),
        410 => Some("Gone"),
        411 => Some("Length Required"),
        412 => Some("Precondition Failed"),
        413 => Some("Request Entity Too Large"),
        414 => Some("Request-URI Too Long"),
        415 => Some("Unsupported Media Type"),
        416 => Some("Requested range unsatisfiable"),
        417 => Some("Expectation failed"),
        500 => Some("Internal Server Error"),
        501 => Some("Not Implemented"),
        502 => Some("Bad Gateway or Proxy Error"),
        503 => Some("Service Unavailable"),
        504 => Some("Gateway Time-out"),
        505 => Some("HTTP Version not supported"),
        _ => None,
    }
}

fn status_line(version: HttpVersion, status_code: u16, status_text: &str) -> String {
    format!("HTTP/{} {} {}", version, status_code, status_text)
}

/// Render a raw HTTP response. Headers are written as given, in map order.
pub fn render(
    version: HttpVersion,
    status_code: u16,
    status_text: &str,
    headers: &IndexMap<String, String>,
    body: &str,
) -> String {
    let mut res_string = String::new();
    res_string.push_str(&status_line(version, status_code, status_text));
    res_string.push_str("\r\n");

    headers
        .iter()
        .for_each(|(name, value)| res_string.push_str(&format!("{}: {}\r\n", name, value)));

    res_string.push_str("\r\n");
    res_string.push_str(body);
    res_string
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// An HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRes {
    version: HttpVersion,
    status_code: u16,
    status_text: String,
    headers: IndexMap<String, String>,
    content: String,
}

impl Default for HttpRes {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpRes {
    /// A `1.0 200 OK` response with no header and an empty body.
    pub fn new() -> Self {
        Self {
            version: HttpVersion::default(),
            status_code: 200,
            status_text: String::from(get_reason_phrase(200).unwrap_or_default()),
            headers: IndexMap::new(),
            content: String::new(),
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Set the status code, with its reason phrase from the status table (empty for unknown codes).
    pub fn set_status_code(&mut self, status_code: u16) -> &mut Self {
        self.set_status(
            status_code,
            get_reason_phrase(status_code).unwrap_or_default(),
        )
    }

    /// Set the status code along with a custom status text.
    pub fn set_status(&mut self, status_code: u16, status_text: &str) -> &mut Self {
        self.status_code = status_code;
        self.status_text = String::from(status_text);
        self
    }

    pub fn version(&self) -> HttpVersion {
        self.version
    }

    pub fn set_version(&mut self, version: HttpVersion) -> &mut Self {
        self.version = version;
        self
    }

    /// Set a header, replacing the value of an existing one in place.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Replace all the headers.
    pub fn set_headers<I, K, V>(&mut self, headers: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers = headers
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Value of a header. A header set to an empty value reads as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn headers(&self) -> &IndexMap<String, String> {
        &self.headers
    }

    pub fn set_content(&mut self, content: impl Into<String>) -> &mut Self {
        self.content = content.into();
        self
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn status_line(&self) -> String {
        status_line(self.version, self.status_code, &self.status_text)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    /// Write the status line, the headers and the blank line ending them.
    pub fn send_headers<W: io::Write>(&self, sink: &mut W) -> io::Result<()> {
        let status_line = self.status_line();
        debug!("Sending response: {}", status_line);
        write!(sink, "{}\r\n", status_line)?;
        for (name, value) in &self.headers {
            trace!("Sending header {}: {}", name, value);
            write!(sink, "{}: {}\r\n", name, value)?;
        }
        sink.write_all(b"\r\n")
    }

    pub fn send_content<W: io::Write>(&self, sink: &mut W) -> io::Result<()> {
        sink.write_all(self.content.as_bytes())
    }

    /// Write the whole response. Flushing the sink is up to the caller.
    pub fn send<W: io::Write>(&self, sink: &mut W) -> io::Result<()> {
        self.send_headers(sink)?;
        self.send_content(sink)
    }
}

impl fmt::Display for HttpRes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(
            self.version,
            self.status_code,
            &self.status_text,
            &self.headers,
            &self.content,
        ))
    }
}
