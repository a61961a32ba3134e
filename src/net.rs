//! Host-name resolution through the system resolver.
//!
//! Lookup failures are logged and yield empty results; callers decide
//! whether an unknown host is fatal.

use std::net::{IpAddr, Ipv4Addr, ToSocketAddrs};
use tracing::{debug, error};

/// Every address `host` resolves to, in resolver order without duplicates.
pub fn all_by_name(host: &str) -> Vec<IpAddr> {
    match (host, 0).to_socket_addrs() {
        Ok(addrs) => {
            let mut resolved: Vec<IpAddr> = Vec::new();
            for addr in addrs {
                if !resolved.contains(&addr.ip()) {
                    resolved.push(addr.ip());
                }
            }
            debug!(host = %host, count = resolved.len(), "resolved host");
            resolved
        }
        Err(e) => {
            error!(host = %host, error = %e, "could not resolve host");
            Vec::new()
        }
    }
}

pub fn by_name(host: &str) -> Option<IpAddr> {
    all_by_name(host).into_iter().next()
}

pub fn local_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

pub fn local_host_name() -> Option<String> {
    match hostname::get() {
        Ok(name) => Some(name.to_string_lossy().into_owned()),
        Err(e) => {
            error!(error = %e, "could not determine local host name");
            None
        }
    }
}
