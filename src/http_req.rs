//! Data structures for modeling an HTTP request.
//!
//! A request is a bundle of four independent mappings: server parameters, query parameters, post
//! parameters and cookies. It is either ingested from a hosting environment ([`HttpReq::real`],
//! [`HttpReq::from_env_vars`]) or synthesized from a URI ([`HttpReq::custom`], [`ReqBuilder`]).

mod client_ip;
mod params;

pub use client_ip::resolve_client_ip;
pub use params::{ServerParams, vars};

use crate::req_builder::ReqBuilder;
use crate::{req_parser, utils};
use log::debug;
use std::collections;

/// Ordered string map used for query, post and cookie parameters.
pub type Params = indexmap::IndexMap<String, String>;

/// Default port of plain HTTP.
pub const HTTP_PORT: u16 = 80;
/// Default port of HTTPS.
pub const HTTPS_PORT: u16 = 443;

////////////////////////////////////////////////////////////////////////////////////////////////////

/// An HTTP request.
#[derive(Debug, Clone)]
pub struct HttpReq {
    server: ServerParams,
    query: Params,
    post: Params,
    cookies: Params,
    trusted_proxies: collections::HashSet<String>,
}

impl HttpReq {
    pub(crate) fn new(server: ServerParams, query: Params, post: Params, cookies: Params) -> Self {
        Self {
            server,
            query,
            post,
            cookies,
            trusted_proxies: collections::HashSet::new(),
        }
    }

    /// Request made of the mappings supplied by the hosting environment, taken as they are.
    pub fn real(server: Params, query: Params, post: Params, cookies: Params) -> Self {
        debug!("Ingesting request with {} server variables", server.len());
        Self::new(ServerParams::from_vars(server), query, post, cookies)
    }

    /// Request read from CGI-style variables.
    ///
    /// Query parameters are decoded from `QUERY_STRING` and cookies from `HTTP_COOKIE`. The request body
    /// is not read, so post parameters are empty.
    pub fn from_env_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let server = ServerParams::from_vars(vars);
        let query = server
            .query_string()
            .map(req_parser::parse_query)
            .unwrap_or_default();
        let cookies = server
            .cookie()
            .map(req_parser::parse_cookie_header)
            .unwrap_or_default();
        debug!(
            "Ingesting request {:?} {:?}",
            server.method(),
            server.request_uri()
        );
        Self::new(server, query, Params::new(), cookies)
    }

    /// Request read from the variables of the current process. Variables that are not valid UTF-8 are
    /// skipped.
    pub fn from_process_env() -> Self {
        Self::from_env_vars(
            std::env::vars_os()
                .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?))),
        )
    }

    /// Synthesize a request, see [`ReqBuilder`].
    pub fn custom(uri: &str, method: &str, params: Params, cookies: Params) -> Self {
        ReqBuilder::new(uri)
            .method(method)
            .params(params)
            .cookies(cookies)
            .build()
    }

    pub fn server_params(&self) -> &ServerParams {
        &self.server
    }

    pub fn query_params(&self) -> &Params {
        &self.query
    }

    pub fn post_params(&self) -> &Params {
        &self.post
    }

    pub fn cookies(&self) -> &Params {
        &self.cookies
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn post(&self, name: &str) -> Option<&str> {
        self.post.get(name).map(String::as_str)
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Request method, empty if the environment gave none.
    pub fn method(&self) -> &str {
        self.server.method.as_deref().unwrap_or_default()
    }

    pub fn set_method(&mut self, method: &str) -> &mut Self {
        self.server.method = Some(method.to_uppercase());
        self
    }

    /// `"https"` when the `HTTPS` flag is set to a true value, `"http"` otherwise.
    pub fn scheme(&self) -> &'static str {
        if self.server.https.as_deref().is_some_and(utils::is_truthy) {
            "https"
        } else {
            "http"
        }
    }

    /// Set the scheme. The port follows unless it was set to something non standard.
    pub fn set_scheme(&mut self, scheme: &str) -> &mut Self {
        if scheme == "https" {
            self.server.https = Some(String::from("on"));
            if matches!(self.server.port, None | Some(HTTP_PORT)) {
                self.server.port = Some(HTTPS_PORT);
            }
        } else {
            self.server.https = Some(String::from("off"));
            if matches!(self.server.port, None | Some(HTTPS_PORT)) {
                self.server.port = Some(HTTP_PORT);
            }
        }
        self
    }

    pub fn port(&self) -> Option<u16> {
        self.server.port
    }

    pub fn set_port(&mut self, port: u16) -> &mut Self {
        self.server.port = Some(port);
        self
    }

    /// Basic authentication user name.
    pub fn user(&self) -> Option<&str> {
        self.server.auth_user.as_deref()
    }

    pub fn set_user(&mut self, user: Option<&str>) -> &mut Self {
        self.server.auth_user = user.map(String::from);
        self
    }

    /// Basic authentication password.
    pub fn password(&self) -> Option<&str> {
        self.server.auth_password.as_deref()
    }

    pub fn set_password(&mut self, password: Option<&str>) -> &mut Self {
        self.server.auth_password = password.map(String::from);
        self
    }

    pub fn set_user_pass(&mut self, user: Option<&str>, password: Option<&str>) -> &mut Self {
        self.set_user(user).set_password(password)
    }

    /// Raw request-target, taken from the first populated of `REQUEST_URI`, `PATH_INFO`, `PHP_SELF`
    /// and `REDIRECT_URL`.
    fn raw_target(&self) -> &str {
        self.server
            .request_uri
            .as_deref()
            .or(self.server.path_info.as_deref())
            .or(self.server.script_self.as_deref())
            .or(self.server.redirect_url.as_deref())
            .unwrap_or_default()
    }

    /// Request path: always a leading slash, never a trailing one, no query.
    ///
    /// Examples: `/`, `/home`, `/users/login.php`.
    pub fn path(&self) -> String {
        format!("/{}", req_parser::normalize_path(self.raw_target()))
    }

    /// Percent-decoded [`HttpReq::path`].
    pub fn decoded_path(&self) -> String {
        let path = self.path();
        match urlencoding::decode(&path) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => path,
        }
    }

    /// Set the path. The request-target loses its query part.
    pub fn set_path(&mut self, path: &str) -> &mut Self {
        let path = req_parser::canonical_path(path);
        self.server.path_info = Some(path.clone());
        self.server.request_uri = Some(path);
        self
    }

    /// Host name like `subdomain.example.com`, empty if the environment gave none.
    pub fn host(&self) -> &str {
        self.server.host.as_deref().unwrap_or_default()
    }

    pub fn set_host(&mut self, host: &str) -> &mut Self {
        self.server.host = Some(String::from(host));
        self
    }

    /// `scheme://host`
    pub fn base(&self) -> String {
        format!("{}://{}", self.scheme(), self.host())
    }

    /// `scheme://host/path`
    pub fn current(&self) -> String {
        format!("{}{}", self.base(), self.path())
    }

    /// Query parameters encoded back into a query string.
    pub fn query_string(&self) -> String {
        req_parser::build_query(&self.query)
    }

    /// `scheme://host/path?query`
    pub fn address(&self) -> String {
        match self.query_string() {
            query if query.is_empty() => self.current(),
            query => format!("{}?{}", self.current(), query),
        }
    }

    pub fn is_ajax(&self) -> bool {
        self.server
            .requested_with
            .as_deref()
            .is_some_and(|v| v.eq_ignore_ascii_case("xmlhttprequest"))
    }

    /// Whether the request was not handed over by a web server gateway.
    pub fn is_cli(&self) -> bool {
        self.server.gateway_interface.is_none()
    }

    pub fn request_time(&self) -> Option<&chrono::DateTime<chrono::Utc>> {
        self.server.request_time.as_ref()
    }

    /// Replace the list of proxies trusted to forward the client address.
    pub fn set_trusted_proxies<I, S>(&mut self, proxies: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trusted_proxies = proxies.into_iter().map(Into::into).collect();
        self
    }

    pub fn trusted_proxies(&self) -> &collections::HashSet<String> {
        &self.trusted_proxies
    }

    /// Client address, see [`resolve_client_ip`].
    pub fn client_ip(&self) -> String {
        resolve_client_ip(
            self.server.remote_addr.as_deref(),
            self.server.forwarded_for.as_deref(),
            self.server.client_ip.as_deref(),
            &self.trusted_proxies,
        )
    }
}
