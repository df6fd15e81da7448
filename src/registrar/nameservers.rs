use log::warn;
use regex::Regex;
use serde_json::{Value, json};

use super::{Registrar, text, types::DomainName};

/// The registrar keeps at most this many nameservers per domain.
pub const MAX_NAMESERVERS: usize = 5;

lazy_static! {
    static ref NAMESERVER: Regex = Regex::new(
        r"^(?:https?://)?(?:[a-zA-Z\d-]{0,62}[a-zA-Z\d]\.){1,126}([a-zA-Z\d]{1,63})$"
    )
    .expect("nameserver pattern is valid");
}

/// Whether `hostname` looks like a nameserver the registrar accepts: dot
/// separated labels, optionally prefixed with a scheme, not starting with a
/// hyphen, and with a top label that does not start with a digit.
pub fn is_valid_nameserver(hostname: &str) -> bool {
    let Some(captures) = NAMESERVER.captures(hostname) else {
        return false;
    };
    let host = hostname
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    let top_label = captures.get(1).map_or("", |label| label.as_str());
    !host.starts_with('-') && !top_label.starts_with(|c: char| c.is_ascii_digit())
}

impl Registrar<'_> {
    /// The hostnames of the domain's nameservers, in order. Empty slots stay
    /// in place as empty strings so the numbering matches the registrar's.
    pub fn get_nameservers(&self, domain: &DomainName) -> anyhow::Result<Vec<String>> {
        let entry = self.find_domain(domain)?;
        Ok(entry["nameServers"]
            .as_array()
            .into_iter()
            .flatten()
            .take(MAX_NAMESERVERS)
            .map(|ns| text(&ns["hostname"]))
            .collect())
    }

    /// Replaces the domain's nameservers. Empty and invalid hostnames are
    /// skipped; the remaining ones are sent in order.
    pub fn save_nameservers(
        &self,
        domain: &DomainName,
        nameservers: &[String],
    ) -> anyhow::Result<()> {
        let mut accepted: Vec<Value> = Vec::new();
        for hostname in nameservers.iter().take(MAX_NAMESERVERS) {
            let hostname = hostname.trim();
            if hostname.is_empty() {
                continue;
            }
            if is_valid_nameserver(hostname) {
                accepted.push(json!({"hostname": hostname}));
            } else {
                warn!("Skipping invalid nameserver {hostname}");
            }
        }
        self.update_domain(domain, &json!({"nameServers": accepted}))
    }
}
