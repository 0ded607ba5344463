//! Caller allow/deny lists for the heartbeat listener.

use std::net::IpAddr;

const WILDCARD: &str = "*";

/// Which peers may read this worker's heartbeat.
///
/// `disallow` always wins. Otherwise a peer passes when `allow` holds `"*"`
/// or the peer's IP. A request with no known peer only passes a wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientFilter {
    allow: Vec<String>,
    disallow: Vec<String>,
}

impl Default for ClientFilter {
    fn default() -> Self {
        Self::allow_all()
    }
}

impl ClientFilter {
    pub fn new(allow: Vec<String>, disallow: Vec<String>) -> Self {
        Self { allow, disallow }
    }

    pub fn allow_all() -> Self {
        Self::new(vec![WILDCARD.to_string()], Vec::new())
    }

    pub fn permits(&self, peer: Option<IpAddr>) -> bool {
        match peer {
            Some(ip) => {
                if self.disallow.iter().any(|entry| matches(entry, ip)) {
                    return false;
                }
                self.allow.iter().any(|entry| entry == WILDCARD || matches(entry, ip))
            }
            None => self.disallow.is_empty() && self.allow.iter().any(|entry| entry == WILDCARD),
        }
    }
}

fn matches(entry: &str, ip: IpAddr) -> bool {
    entry
        .trim()
        .parse::<IpAddr>()
        .is_ok_and(|listed| listed == ip)
}
