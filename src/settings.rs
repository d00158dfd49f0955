//! Defaults applied when synthesizing requests.

use mime_guess::{Mime, mime};

/// Request builder settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Host used when the URI carries none.
    pub host: String,
    /// Peer address of synthesized requests.
    pub remote_address: String,
    /// Content type announced by requests that are not GET.
    pub form_content_type: Mime,
    /// Proxies trusted to forward the client address.
    pub trusted_proxies: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: String::from("localhost"),
            remote_address: String::from("127.0.0.1"),
            form_content_type: mime::APPLICATION_WWW_FORM_URLENCODED,
            trusted_proxies: Vec::new(),
        }
    }
}
