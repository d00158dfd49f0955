//! Server parameters of a request.
//!
//! Hosting environments hand server parameters over as flat string maps keyed by CGI-style names
//! (`HTTP_HOST`, `SERVER_PORT`...). They are converted into a typed structure on ingestion, and back
//! into the same vocabulary by [`ServerParams::to_vars`].

use crate::http_req::Params;
use crate::req_parser;
use log::debug;

/// Names of the server variables understood by [`ServerParams`].
pub mod vars {
    pub const HTTP_HOST: &str = "HTTP_HOST";
    pub const SERVER_PORT: &str = "SERVER_PORT";
    pub const REMOTE_ADDR: &str = "REMOTE_ADDR";
    pub const REQUEST_METHOD: &str = "REQUEST_METHOD";
    pub const QUERY_STRING: &str = "QUERY_STRING";
    pub const REQUEST_URI: &str = "REQUEST_URI";
    pub const PATH_INFO: &str = "PATH_INFO";
    pub const PHP_SELF: &str = "PHP_SELF";
    pub const REDIRECT_URL: &str = "REDIRECT_URL";
    pub const HTTPS: &str = "HTTPS";
    pub const PHP_AUTH_USER: &str = "PHP_AUTH_USER";
    pub const PHP_AUTH_PW: &str = "PHP_AUTH_PW";
    pub const HTTP_AUTHORIZATION: &str = "HTTP_AUTHORIZATION";
    pub const HTTP_X_FORWARDED_FOR: &str = "HTTP_X_FORWARDED_FOR";
    pub const HTTP_CLIENT_IP: &str = "HTTP_CLIENT_IP";
    pub const HTTP_COOKIE: &str = "HTTP_COOKIE";
    pub const CONTENT_TYPE: &str = "CONTENT_TYPE";
    pub const HTTP_X_REQUESTED_WITH: &str = "HTTP_X_REQUESTED_WITH";
    pub const GATEWAY_INTERFACE: &str = "GATEWAY_INTERFACE";
    pub const REQUEST_TIME: &str = "REQUEST_TIME";
}

/// Typed server parameters. Every field is absent unless the environment (or the builder) provided it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerParams {
    pub(crate) host: Option<String>,
    pub(crate) port: Option<u16>,
    pub(crate) remote_addr: Option<String>,
    pub(crate) method: Option<String>,
    pub(crate) query_string: Option<String>,
    pub(crate) request_uri: Option<String>,
    pub(crate) path_info: Option<String>,
    pub(crate) script_self: Option<String>,
    pub(crate) redirect_url: Option<String>,
    pub(crate) https: Option<String>,
    pub(crate) auth_user: Option<String>,
    pub(crate) auth_password: Option<String>,
    pub(crate) authorization: Option<String>,
    pub(crate) forwarded_for: Option<String>,
    pub(crate) client_ip: Option<String>,
    pub(crate) cookie: Option<String>,
    pub(crate) content_type: Option<String>,
    pub(crate) requested_with: Option<String>,
    pub(crate) gateway_interface: Option<String>,
    pub(crate) request_time: Option<chrono::DateTime<chrono::Utc>>,
    // any variable outside the known vocabulary, kept verbatim
    pub(crate) other: Params,
}

// read-only accessors for the plain string fields
macro_rules! str_getters {
    ($($(#[$doc:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $name(&self) -> Option<&str> {
                self.$name.as_deref()
            }
        )*
    };
}

impl ServerParams {
    /// Build server parameters from `(name, value)` pairs.
    ///
    /// Unparseable numeric variables are dropped. When no `PHP_AUTH_USER` is given, Basic credentials
    /// found in `HTTP_AUTHORIZATION` fill the auth user and password.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut params = Self::default();
        for (name, value) in vars {
            params.set_var(name.into(), value.into());
        }
        params.apply_authorization();
        params
    }

    fn set_var(&mut self, name: String, value: String) {
        match name.as_str() {
            vars::HTTP_HOST => self.host = Some(value),
            vars::SERVER_PORT => {
                self.port = value
                    .trim()
                    .parse()
                    .inspect_err(|e| debug!("Ignoring {} {:?}: {}", name, value, e))
                    .ok()
            }
            vars::REMOTE_ADDR => self.remote_addr = Some(value),
            vars::REQUEST_METHOD => self.method = Some(value),
            vars::QUERY_STRING => self.query_string = Some(value),
            vars::REQUEST_URI => self.request_uri = Some(value),
            vars::PATH_INFO => self.path_info = Some(value),
            vars::PHP_SELF => self.script_self = Some(value),
            vars::REDIRECT_URL => self.redirect_url = Some(value),
            vars::HTTPS => self.https = Some(value),
            vars::PHP_AUTH_USER => self.auth_user = Some(value),
            vars::PHP_AUTH_PW => self.auth_password = Some(value),
            vars::HTTP_AUTHORIZATION => self.authorization = Some(value),
            vars::HTTP_X_FORWARDED_FOR => self.forwarded_for = Some(value),
            vars::HTTP_CLIENT_IP => self.client_ip = Some(value),
            vars::HTTP_COOKIE => self.cookie = Some(value),
            vars::CONTENT_TYPE => self.content_type = Some(value),
            vars::HTTP_X_REQUESTED_WITH => self.requested_with = Some(value),
            vars::GATEWAY_INTERFACE => self.gateway_interface = Some(value),
            vars::REQUEST_TIME => {
                self.request_time = value
                    .trim()
                    .parse::<i64>()
                    .ok()
                    .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0));
                if self.request_time.is_none() {
                    debug!("Ignoring {} {:?}", name, value);
                }
            }
            _ => {
                self.other.insert(name, value);
            }
        }
    }

    fn apply_authorization(&mut self) {
        if self.auth_user.is_some() {
            return;
        }
        if let Some(authorization) = self.authorization.as_deref() {
            match req_parser::parse_basic_credentials(authorization) {
                Ok((user, password)) => {
                    self.auth_user = Some(user);
                    self.auth_password = Some(password);
                }
                Err(e) => debug!("Ignoring authorization header: {}", e),
            }
        }
    }

    /// Emit the parameters back as server variables.
    pub fn to_vars(&self) -> Params {
        let mut out = Params::new();

        macro_rules! emit {
            ($name: expr, $field: expr) => {
                if let Some(value) = &$field {
                    out.insert(String::from($name), value.to_string());
                }
            };
        }

        emit!(vars::HTTP_HOST, self.host);
        emit!(vars::SERVER_PORT, self.port);
        emit!(vars::REMOTE_ADDR, self.remote_addr);
        emit!(vars::REQUEST_METHOD, self.method);
        emit!(vars::QUERY_STRING, self.query_string);
        emit!(vars::REQUEST_URI, self.request_uri);
        emit!(vars::PATH_INFO, self.path_info);
        emit!(vars::PHP_SELF, self.script_self);
        emit!(vars::REDIRECT_URL, self.redirect_url);
        emit!(vars::HTTPS, self.https);
        emit!(vars::PHP_AUTH_USER, self.auth_user);
        emit!(vars::PHP_AUTH_PW, self.auth_password);
        emit!(vars::HTTP_AUTHORIZATION, self.authorization);
        emit!(vars::HTTP_X_FORWARDED_FOR, self.forwarded_for);
        emit!(vars::HTTP_CLIENT_IP, self.client_ip);
        emit!(vars::HTTP_COOKIE, self.cookie);
        emit!(vars::CONTENT_TYPE, self.content_type);
        emit!(vars::HTTP_X_REQUESTED_WITH, self.requested_with);
        emit!(vars::GATEWAY_INTERFACE, self.gateway_interface);
        emit!(
            vars::REQUEST_TIME,
            self.request_time.map(|t| t.timestamp())
        );
        out.extend(self.other.iter().map(|(k, v)| (k.clone(), v.clone())));

        out
    }

    str_getters!(
        /// `HTTP_HOST`
        host,
        /// `REMOTE_ADDR`
        remote_addr,
        /// `REQUEST_METHOD`
        method,
        /// `QUERY_STRING`
        query_string,
        /// `REQUEST_URI`: path plus optional query
        request_uri,
        /// `PATH_INFO`
        path_info,
        /// `PHP_SELF`
        script_self,
        /// `REDIRECT_URL`
        redirect_url,
        /// `HTTPS` flag, as written by the environment
        https,
        /// `HTTP_AUTHORIZATION`
        authorization,
        /// `HTTP_X_FORWARDED_FOR`
        forwarded_for,
        /// `HTTP_CLIENT_IP`
        client_ip,
        /// `HTTP_COOKIE`
        cookie,
        /// `CONTENT_TYPE`
        content_type,
        /// `HTTP_X_REQUESTED_WITH`
        requested_with,
        /// `GATEWAY_INTERFACE`
        gateway_interface,
    );

    /// `SERVER_PORT`
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// `REQUEST_TIME`
    pub fn request_time(&self) -> Option<&chrono::DateTime<chrono::Utc>> {
        self.request_time.as_ref()
    }

    /// Variable outside the known vocabulary.
    pub fn other(&self, name: &str) -> Option<&str> {
        self.other.get(name).map(String::as_str)
    }
}
