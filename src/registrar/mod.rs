//! Domain operations on top of the registrar client. Each operation creates a
//! fresh client, so every operation logs in again, performs exactly one call
//! and maps the reply into a narrow view type.

use log::info;
use serde::Serialize;
use serde_json::Value;

use crate::{
    audit::AuditLog,
    authentication::Credentials,
    client::{ClientSettings, RegistrarApiClient},
    configuration::Configuration,
    envelope::RequestEnvelope,
    error::ApiClientError,
    method::Method,
};

mod availability;
mod contacts;
mod dns;
mod domain;
mod nameservers;
mod pricing;
mod purchase;
mod types;

pub use nameservers::{MAX_NAMESERVERS, is_valid_nameserver};
pub use types::{
    AvailabilityStatus, Contact, ContactSet, ContactsFile, DnsRecord, DomainName, EppCode,
    LockStatus, PremiumPricing, RegistrationRequest, SearchResult, SyncStatus, TldPricing,
};

pub(crate) use types::{text, truthy};

pub const DOMAINS_PATH: &str = "/client/domains";

/// Performs registrar operations for one account.
pub struct Registrar<'a> {
    settings: ClientSettings,
    credentials: Credentials,
    currency: String,
    audit: &'a dyn AuditLog,
}

impl<'a> Registrar<'a> {
    pub fn new(
        settings: ClientSettings,
        credentials: Credentials,
        currency: impl Into<String>,
        audit: &'a dyn AuditLog,
    ) -> Self {
        Self {
            settings,
            credentials,
            currency: currency.into(),
            audit,
        }
    }

    pub fn from_configuration(
        config: &Configuration,
        audit: &'a dyn AuditLog,
    ) -> anyhow::Result<Self> {
        Ok(Self::new(
            config.client_settings()?,
            config.credentials.clone(),
            config.currency.clone(),
            audit,
        ))
    }

    /// The currency reported with prices.
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Logs in and returns the `balance` field of the login response, if any.
    pub fn account_balance(&self) -> anyhow::Result<Option<Value>> {
        let session = self.client()?.login(&self.credentials)?;
        let balance = session.field("balance");
        Ok((!balance.is_null()).then(|| balance.clone()))
    }

    fn client(&self) -> Result<RegistrarApiClient<'a>, ApiClientError> {
        RegistrarApiClient::new(self.settings.clone(), self.audit)
    }

    /// An operation without a body.
    fn query(&self, path: &str, method: Method) -> anyhow::Result<Value> {
        let envelope = RequestEnvelope::new(self.credentials.clone());
        Ok(self.client()?.call(path, &envelope, method)?)
    }

    /// An operation with `payload` serialized as its JSON body.
    fn submit<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        method: Method,
    ) -> anyhow::Result<Value> {
        let envelope = RequestEnvelope::with_payload(self.credentials.clone(), payload)?;
        Ok(self.client()?.call(path, &envelope, method)?)
    }

    /// Fetches the account's domain list and returns the entry for `domain`.
    fn find_domain(&self, domain: &DomainName) -> anyhow::Result<Value> {
        let reply = self.query(DOMAINS_PATH, Method::Get)?;
        let wanted = domain.to_string();
        let found = reply["docs"]
            .as_array()
            .into_iter()
            .flatten()
            .filter(|entry| text(&entry["domain"]).eq_ignore_ascii_case(&wanted))
            .last();
        match found {
            Some(entry) => Ok(entry.clone()),
            None => bail!("Domain {wanted} not found in account"),
        }
    }

    /// A PUT of `payload` to the domain's resource.
    fn update_domain<T: Serialize + ?Sized>(
        &self,
        domain: &DomainName,
        payload: &T,
    ) -> anyhow::Result<()> {
        self.submit(&domain_path(domain), payload, Method::Put)?;
        info!("Updated {domain}");
        Ok(())
    }
}

pub(crate) fn domain_path(domain: &DomainName) -> String {
    format!("{DOMAINS_PATH}/{domain}")
}

#[cfg(test)]
pub(crate) mod tests {
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;

    use super::{DomainName, Registrar};
    use crate::{
        audit::{AuditLog, LogAudit},
        client::tests::{credentials, mock_login, settings},
        error::ApiClientError,
    };

    pub(crate) fn registrar<'a>(server: &ServerGuard, audit: &'a dyn AuditLog) -> Registrar<'a> {
        Registrar::new(settings(&server.url()), credentials(), "AMD", audit)
    }

    pub(crate) fn example() -> DomainName {
        DomainName::new("example", "am")
    }

    /// Serves a domain list containing `entry` (plus an unrelated domain) on
    /// GET /client/domains.
    pub(crate) fn mock_domain_list(
        server: &mut ServerGuard,
        entry: serde_json::Value,
    ) -> mockito::Mock {
        server
            .mock("GET", "/client/domains")
            .match_header("cookie", "sid=s3ss10n")
            .with_body(
                json!({"docs": [{"domain": "other.am", "transferLock": true}, entry]}).to_string(),
            )
            .create()
    }

    #[test]
    fn account_balance_from_login() {
        let mut server = Server::new();
        let login = mock_login(&mut server);
        let registrar = registrar(&server, &LogAudit);
        assert_eq!(registrar.account_balance().unwrap(), Some(json!(25000)));
        login.assert();
    }

    #[test]
    fn account_balance_absent() {
        let mut server = Server::new();
        let _login = server
            .mock("POST", "/auth/login")
            .with_body("{}")
            .create();
        let registrar = registrar(&server, &LogAudit);
        assert_eq!(registrar.account_balance().unwrap(), None);
    }

    #[test]
    fn unknown_domain_is_reported() {
        let mut server = Server::new();
        let _login = mock_login(&mut server);
        let _list = mock_domain_list(&mut server, json!({"domain": "another.am"}));
        let registrar = registrar(&server, &LogAudit);
        let err = registrar.find_domain(&example()).unwrap_err();
        assert_eq!(err.to_string(), "Domain example.am not found in account");
    }

    #[test]
    fn api_errors_stay_downcastable() {
        let mut server = Server::new();
        let _login = mock_login(&mut server);
        let _list = server
            .mock("GET", "/client/domains")
            .match_body(Matcher::Any)
            .with_body(r#"{"message": "Unauthorized"}"#)
            .create();
        let registrar = registrar(&server, &LogAudit);
        let err = registrar.find_domain(&example()).unwrap_err();
        match err.downcast_ref::<ApiClientError>() {
            Some(ApiClientError::Api(message)) => assert_eq!(message, "Unauthorized"),
            other => panic!("expected an API error, got {other:?}"),
        }
    }
}
