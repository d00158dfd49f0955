//! Client address resolution behind proxies.

use log::trace;
use std::collections;

/// Resolve the address of the client that issued a request.
///
/// * no peer address (the request did not come from the network): empty string
/// * the peer is a trusted proxy: the forwarded-for hint, else the client-ip hint, else the peer
/// * any other peer: the peer itself, forwarded hints are ignored
///
/// Empty hints count as absent. Addresses are returned as given, without format validation.
pub fn resolve_client_ip(
    remote_addr: Option<&str>,
    forwarded_for: Option<&str>,
    client_ip: Option<&str>,
    trusted_proxies: &collections::HashSet<String>,
) -> String {
    let Some(remote_addr) = remote_addr else {
        return String::new();
    };

    if !trusted_proxies.contains(remote_addr) {
        return String::from(remote_addr);
    }

    let resolved = forwarded_for
        .filter(|v| !v.is_empty())
        .or(client_ip.filter(|v| !v.is_empty()))
        .unwrap_or(remote_addr);
    trace!("Trusted proxy {} forwards for {}", remote_addr, resolved);
    String::from(resolved)
}
