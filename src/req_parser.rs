//! Request URI parsing.
//!
//! URIs handed to the request builder are split leniently: absolute URIs go through the `url` parser,
//! relative references (a bare path, an empty string, `?query`, `//host/path`) are resolved against a
//! placeholder base and only the components the reference actually carried are kept. Path and query
//! are always the ones written in the URI, never the parser's normalized forms.

mod utils;

pub use utils::{
    CredentialsParsingError, build_cookie_header, build_query, decode_html_entities,
    parse_basic_credentials, parse_cookie_header, parse_html_query, parse_query,
};

use log::warn;

/// Base used to resolve relative references. Its scheme and host never leak into the parsed parts.
const RELATIVE_BASE: &str = "http://relative.invalid/";

/// Components of a URI, each one absent when the URI did not carry it.
#[derive(Debug, Default, PartialEq)]
pub struct UriParts {
    pub scheme: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub path: Option<String>,
    pub query: Option<String>,
}

impl UriParts {
    /// Scheme, userinfo, host and port come from the parsed `url`; the path and query are taken from
    /// `uri` as written, so dot segments, backslashes and spaces reach the request untouched.
    fn from_url(uri: &str, url: &url::Url, with_scheme: bool, with_authority: bool) -> Self {
        let raw = RawParts::split(uri, with_scheme, with_authority && url.has_host());
        let mut parts = match raw.as_ref() {
            Some(raw) => Self {
                path: Some(String::from(raw.path)),
                query: raw.query.map(String::from),
                ..Default::default()
            },
            None => Self {
                path: Some(String::from(url.path())),
                query: url.query().map(String::from),
                ..Default::default()
            },
        };
        if with_scheme {
            parts.scheme = Some(String::from(url.scheme()));
        }
        if with_authority {
            parts.user = Some(url.username())
                .filter(|u| !u.is_empty())
                .map(String::from);
            parts.password = url.password().map(String::from);
            // the parser lowercases the host, keep the case it was written in
            parts.host = url.host_str().map(|host| {
                match raw.as_ref().and_then(|raw| raw.host) {
                    Some(raw_host) if raw_host.eq_ignore_ascii_case(host) => String::from(raw_host),
                    _ => String::from(host),
                }
            });
            parts.port = url.port();
        }
        parts
    }
}

/// Host, path and query of a URI as written.
#[derive(Debug, PartialEq)]
struct RawParts<'a> {
    host: Option<&'a str>,
    path: &'a str,
    query: Option<&'a str>,
}

impl<'a> RawParts<'a> {
    /// `None` when an expected authority is not introduced by two slashes (`http:example.com`), a
    /// shape only the lenient parser makes sense of.
    fn split(uri: &'a str, with_scheme: bool, with_authority: bool) -> Option<Self> {
        let uri = uri.split_once('#').map_or(uri, |(head, _)| head);
        let (head, query) = match uri.split_once('?') {
            Some((head, query)) => (head, Some(query)),
            None => (uri, None),
        };
        let rest = match with_scheme {
            true => head.split_once(':').map_or(head, |(_, rest)| rest),
            false => head,
        };
        if !with_authority {
            return Some(Self {
                host: None,
                path: rest,
                query,
            });
        }

        let rest = rest
            .strip_prefix(['/', '\\'])
            .and_then(|rest| rest.strip_prefix(['/', '\\']))?;
        let (authority, path) = rest.split_at(rest.find(['/', '\\']).unwrap_or(rest.len()));
        let host_port = authority.rsplit_once('@').map_or(authority, |(_, host_port)| host_port);
        let host = match host_port.find(']') {
            Some(end) if host_port.starts_with('[') => &host_port[..=end],
            _ => host_port.split_once(':').map_or(host_port, |(host, _)| host),
        };
        Some(Self {
            host: Some(host),
            path,
            query,
        })
    }
}

/// Split `uri` into its components. Never fails: anything unparseable yields empty parts.
pub fn split_uri(uri: &str) -> UriParts {
    match url::Url::parse(uri) {
        Ok(url) => UriParts::from_url(uri, &url, true, true),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            // a network-path reference (//host/path) still carries an authority
            let network_path = uri.starts_with("//");
            match url::Url::parse(RELATIVE_BASE).and_then(|base| base.join(uri)) {
                Ok(url) => UriParts::from_url(uri, &url, false, network_path),
                Err(e) => {
                    warn!("Cannot resolve relative URI {:?}: {}", uri, e);
                    UriParts::default()
                }
            }
        }
        Err(e) => {
            warn!("Cannot parse URI {:?}: {}", uri, e);
            UriParts::default()
        }
    }
}

/// Reduce a raw request-target to a bare path: the query suffix is dropped, runs of slashes are collapsed,
/// and leading and trailing slashes are stripped.
pub fn normalize_path(raw: &str) -> String {
    let target = raw.split_once('?').map_or(raw, |(path, _)| path);
    target
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// A path with exactly one leading slash and no trailing one.
pub fn canonical_path(path: &str) -> String {
    format!("/{}", path.trim_matches('/'))
}
