//! Outbound request policy for the URL fetch endpoint.
//!
//! A URL is admitted in two stages: [`EgressPolicy::check_url`] validates the
//! scheme, credentials, host and port before any network activity, and
//! [`EgressPolicy::check_addrs`] validates every address the host resolves
//! to. The request is then pinned to the checked addresses so a second DNS
//! answer cannot redirect it.

use crate::error::ShopError;
use reqwest::Url;
use serde::Serialize;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

/// A URL that passed the static checks of an [`EgressPolicy`].
#[derive(Debug, Clone, PartialEq)]
pub struct EgressTarget {
    pub url: Url,
    pub host: String,
    pub port: u16,
    /// Set when the URL host is an IP literal; no resolution is needed.
    pub literal: Option<IpAddr>,
}

/// Status line returned by the upstream server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpstreamStatus {
    pub url: String,
    pub status: u16,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
enum HostRule {
    Exact(String),
    Suffix(String),
}

impl HostRule {
    fn parse(rule: &str) -> Result<Self, ShopError> {
        let rule = normalize_host(rule);
        if rule.is_empty() {
            return Err(ShopError::ConfigError("Empty egress host rule".to_string()));
        }
        let suffix = rule.strip_prefix("*.").map(str::to_string);
        match suffix {
            Some(suffix) if !suffix.is_empty() && !suffix.contains('*') => {
                Ok(HostRule::Suffix(format!(".{suffix}")))
            }
            _ if rule.contains('*') => Err(ShopError::ConfigError(format!(
                "Invalid egress host rule {rule:?}"
            ))),
            _ => Ok(HostRule::Exact(rule)),
        }
    }

    fn matches(&self, host: &str) -> bool {
        match self {
            HostRule::Exact(exact) => host == exact,
            HostRule::Suffix(suffix) => {
                host.len() > suffix.len() && host.ends_with(suffix.as_str())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EgressPolicy {
    schemes: Vec<String>,
    hosts: Vec<HostRule>,
    ports: Vec<u16>,
}

impl EgressPolicy {
    /// Builds a policy. An empty `hosts` list admits any host whose addresses
    /// are all public; an empty `ports` list admits any port.
    pub fn new(schemes: &[String], hosts: &[String], ports: &[u16]) -> Result<Self, ShopError> {
        let schemes = schemes
            .iter()
            .map(|s| s.to_ascii_lowercase())
            .collect::<Vec<_>>();
        if let Some(bad) = schemes.iter().find(|s| !matches!(s.as_str(), "http" | "https")) {
            return Err(ShopError::ConfigError(format!(
                "Unsupported egress scheme {bad:?}"
            )));
        }
        let hosts = hosts
            .iter()
            .map(|h| HostRule::parse(h))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            schemes,
            hosts,
            ports: ports.to_vec(),
        })
    }

    pub fn check_url(&self, raw: &str) -> Result<EgressTarget, ShopError> {
        let mut url = Url::parse(raw.trim())
            .map_err(|e| ShopError::ValidationError(format!("Invalid URL: {e}")))?;

        if !self.schemes.iter().any(|s| s == url.scheme()) {
            return Err(deny(format!("scheme {:?} is not allowed", url.scheme())));
        }
        if !url.username().is_empty() || url.password().is_some() {
            return Err(deny("credentials in URL are not allowed".to_string()));
        }
        let host = url
            .host_str()
            .map(normalize_host)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ShopError::ValidationError("URL has no host".to_string()))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| ShopError::ValidationError("URL has no port".to_string()))?;
        if !self.ports.is_empty() && !self.ports.contains(&port) {
            return Err(deny(format!("port {port} is not allowed")));
        }

        // IPv6 literals keep their brackets in host_str.
        let literal = host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .ok();
        if let Some(ip) = literal {
            check_ip(ip)?;
        }
        if !self.hosts.is_empty() && !self.hosts.iter().any(|rule| rule.matches(&host)) {
            return Err(deny(format!("host {host} is not on the allow-list")));
        }
        // The request URL must name the same host the resolver override is
        // registered under, so "example.com." is rewritten to "example.com".
        if literal.is_none() && url.host_str() != Some(host.as_str()) {
            url.set_host(Some(host.as_str()))
                .map_err(|e| ShopError::ValidationError(format!("Invalid URL host: {e}")))?;
        }

        Ok(EgressTarget {
            url,
            host,
            port,
            literal,
        })
    }

    /// Every resolved address must be public; one bad answer rejects the target.
    pub fn check_addrs(&self, addrs: &[SocketAddr]) -> Result<(), ShopError> {
        if addrs.is_empty() {
            return Err(deny("host did not resolve to any address".to_string()));
        }
        addrs.iter().try_for_each(|addr| check_ip(addr.ip()))
    }
}

fn deny(reason: String) -> ShopError {
    ShopError::EgressDenied(reason)
}

fn normalize_host(host: &str) -> String {
    host.trim().trim_end_matches('.').to_ascii_lowercase()
}

fn check_ip(ip: IpAddr) -> Result<(), ShopError> {
    if is_public(ip) {
        Ok(())
    } else {
        Err(deny(format!("address {ip} is not publicly routable")))
    }
}

/// Whether an address is reachable on the public internet.
pub fn is_public(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_public_v4(v4),
        IpAddr::V6(v6) => is_public_v6(v6),
    }
}

fn is_public_v4(ip: Ipv4Addr) -> bool {
    let [a, b, c, _] = ip.octets();
    !(ip.is_unspecified()
        || ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_broadcast()
        || ip.is_multicast()
        || ip.is_documentation()
        || a == 0
        // shared address space, 100.64.0.0/10
        || (a == 100 && (b & 0xc0) == 64)
        // IETF protocol assignments, 192.0.0.0/24
        || (a == 192 && b == 0 && c == 0)
        // benchmarking, 198.18.0.0/15
        || (a == 198 && (b & 0xfe) == 18)
        // reserved, 240.0.0.0/4
        || a >= 240)
}

fn is_public_v6(ip: Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_public_v4(v4);
    }
    let segments = ip.segments();
    match segments {
        // NAT64, 64:ff9b::/96
        [0x64, 0xff9b, 0, 0, 0, 0, hi, lo] => {
            return is_public_v4(embedded_v4(hi, lo));
        }
        // 6to4, 2002::/16
        [0x2002, hi, lo, ..] => return is_public_v4(embedded_v4(hi, lo)),
        _ => {}
    }
    !(ip.is_unspecified()
        || ip.is_loopback()
        || ip.is_multicast()
        // deprecated IPv4-compatible, ::/96
        || segments[..6].iter().all(|s| *s == 0)
        // unique local, fc00::/7
        || (segments[0] & 0xfe00) == 0xfc00
        // link-local and deprecated site-local, fe80::/10 and fec0::/10
        || (segments[0] & 0xffc0) == 0xfe80
        || (segments[0] & 0xffc0) == 0xfec0
        // documentation, 2001:db8::/32
        || (segments[0] == 0x2001 && segments[1] == 0x0db8))
}

fn embedded_v4(hi: u16, lo: u16) -> Ipv4Addr {
    Ipv4Addr::from(((hi as u32) << 16) | lo as u32)
}
