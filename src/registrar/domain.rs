use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::info;
use serde_json::{Value, json};

use super::{
    Registrar, domain_path, text, truthy,
    types::{DomainName, EppCode, LockStatus, SyncStatus},
};
use crate::method::Method;

/// Reads the registrar's expiration timestamp. It is usually RFC 3339, but
/// plain dates occur as well.
fn parse_expiration(value: &Value) -> Option<DateTime<Utc>> {
    let raw = text(value);
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(time) = DateTime::parse_from_rfc3339(raw) {
        return Some(time.with_timezone(&Utc));
    }
    if let Ok(time) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(time.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|time| time.and_utc())
}

pub(crate) fn sync_status(entry: &Value, now: DateTime<Utc>) -> SyncStatus {
    let expiration = parse_expiration(&entry["expiration"]);
    SyncStatus {
        expiry_date: expiration.map(|time| time.date_naive()),
        active: entry["status"] == "active",
        expired: expiration.is_some_and(|time| time < now),
        transferred_away: false,
    }
}

impl Registrar<'_> {
    pub fn get_registrar_lock(&self, domain: &DomainName) -> anyhow::Result<LockStatus> {
        let entry = self.find_domain(domain)?;
        Ok(LockStatus::from(truthy(&entry["transferLock"])))
    }

    pub fn save_registrar_lock(
        &self,
        domain: &DomainName,
        status: LockStatus,
    ) -> anyhow::Result<()> {
        self.update_domain(
            domain,
            &json!({"transferLock": status == LockStatus::Locked}),
        )
    }

    /// Turns WHOIS privacy on or off.
    pub fn id_protect_toggle(&self, domain: &DomainName, enabled: bool) -> anyhow::Result<()> {
        self.update_domain(domain, &json!({"whoIsPrivacyStatus": enabled}))
    }

    /// Requests the transfer code. When the registrar does not return it, the
    /// code has been emailed to the registrant.
    pub fn get_epp_code(&self, domain: &DomainName) -> anyhow::Result<EppCode> {
        let reply = self.query(&format!("{}/transfer", domain_path(domain)), Method::Get)?;
        let code = text(&reply["transferCode"]);
        if code.is_empty() {
            info!("EPP code for {domain} was sent by email");
            Ok(EppCode::SentByEmail)
        } else {
            Ok(EppCode::Code(code))
        }
    }

    pub fn sync(&self, domain: &DomainName) -> anyhow::Result<SyncStatus> {
        let entry = self.find_domain(domain)?;
        Ok(sync_status(&entry, Utc::now()))
    }
}
