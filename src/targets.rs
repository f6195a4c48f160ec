//! Crawl targets and the input contract they must satisfy
//!
//! Targets arrive as `(company_name, website_url)` pairs. Before a harvest run
//! starts, the list is checked against the rules below; `crawl_all` itself
//! trusts its caller and does not re-validate.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, Ipv6Addr};
use url::{Host, Url};

/// Maximum number of websites accepted in a single run
pub const MAX_TARGETS: usize = 10;

/// One company website to crawl
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlTarget {
    pub company_name: String,
    pub root_url: String,
}

impl CrawlTarget {
    pub fn new(company_name: impl Into<String>, root_url: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
            root_url: root_url.into(),
        }
    }
}

/// Validates a target list against the input contract
///
/// # Rules
///
/// - between 1 and [`MAX_TARGETS`] targets
/// - every company name is non-empty
/// - every URL is absolute, uses `https`, and does not point at a loopback,
///   private, link-local or unspecified address
pub fn validate_targets(targets: &[CrawlTarget]) -> ConfigResult<()> {
    if targets.is_empty() {
        return Err(ConfigError::Validation(
            "at least one target is required".to_string(),
        ));
    }

    if targets.len() > MAX_TARGETS {
        return Err(ConfigError::Validation(format!(
            "at most {} targets are allowed, got {}",
            MAX_TARGETS,
            targets.len()
        )));
    }

    for target in targets {
        validate_target(target)?;
    }

    Ok(())
}

fn validate_target(target: &CrawlTarget) -> ConfigResult<()> {
    if target.company_name.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "company name for '{}' cannot be empty",
            target.root_url
        )));
    }

    let url = Url::parse(&target.root_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("'{}': {}", target.root_url, e)))?;

    if url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "only HTTPS URLs are allowed: {}",
            target.root_url
        )));
    }

    let host = url
        .host()
        .ok_or_else(|| ConfigError::InvalidUrl(format!("'{}' has no host", target.root_url)))?;

    if is_local_host(&host) {
        return Err(ConfigError::Validation(format!(
            "local URLs are not allowed: {}",
            target.root_url
        )));
    }

    Ok(())
}

/// Returns true for hosts that resolve to the local machine or a private network
fn is_local_host(host: &Host<&str>) -> bool {
    match host {
        Host::Domain(domain) => {
            let domain = domain.to_ascii_lowercase();
            domain == "localhost" || domain.ends_with(".localhost")
        }
        Host::Ipv4(ip) => is_local_ipv4(ip),
        Host::Ipv6(ip) => is_local_ipv6(ip),
    }
}

fn is_local_ipv4(ip: &Ipv4Addr) -> bool {
    ip.is_loopback() || ip.is_private() || ip.is_link_local() || ip.is_unspecified()
}

fn is_local_ipv6(ip: &Ipv6Addr) -> bool {
    if let Some(mapped) = ip.to_ipv4_mapped() {
        return is_local_ipv4(&mapped);
    }

    let first = ip.segments()[0];
    let unique_local = first & 0xfe00 == 0xfc00;
    let link_local = first & 0xffc0 == 0xfe80;
    ip.is_loopback() || ip.is_unspecified() || unique_local || link_local
}
