use log::{info, warn};
use serde_json::{Value, json};

use super::{
    Registrar, nameservers::MAX_NAMESERVERS, text,
    types::{DomainName, RegistrationRequest},
};
use crate::{error::ApiClientError, method::Method};

pub const PURCHASE_PATH: &str = "/client/carts/purchase";

/// Registration and renewal share the plan identifier scheme.
fn plan_id(years: u32) -> String {
    format!("{years}_year_register")
}

fn registration_item(request: &RegistrationRequest) -> Value {
    let nameservers: Vec<Value> = request
        .nameservers
        .iter()
        .map(|ns| ns.trim())
        .filter(|ns| !ns.is_empty())
        .take(MAX_NAMESERVERS)
        .map(|ns| json!({"hostname": ns}))
        .collect();
    let mut item = json!({
        "name": request.domain.tld,
        "type": "domain_registration",
        "domain": request.domain.to_string(),
        "plan": {"_id": plan_id(request.years)},
        "nameServers": nameservers,
    });
    if let (Some(item), Value::Object(contacts)) = (item.as_object_mut(), request.contacts.to_wire())
    {
        item.extend(contacts);
    }
    item
}

fn renewal_item(domain: &DomainName, years: u32) -> Value {
    json!({
        "name": domain.tld,
        "type": "domain_renew",
        "domain": domain.to_string(),
        "plan": {"_id": plan_id(years)},
    })
}

impl Registrar<'_> {
    /// Orders the registration of a domain. The registrar answers an order it
    /// could not place with `status: "failed"` and the reason in `method`.
    pub fn register_domain(&self, request: &RegistrationRequest) -> anyhow::Result<()> {
        if request.years == 0 {
            bail!("Registration period must be at least one year");
        }
        if request.nameservers.len() > MAX_NAMESERVERS {
            warn!(
                "Only the first {MAX_NAMESERVERS} of {} nameservers are sent",
                request.nameservers.len()
            );
        }
        let reply = self.submit(
            PURCHASE_PATH,
            &[registration_item(request)],
            Method::Post,
        )?;
        if reply["status"] == "failed" {
            return Err(ApiClientError::Api(text(&reply["method"])).into());
        }
        info!(
            "Registered {} for {} year(s)",
            request.domain, request.years
        );
        Ok(())
    }

    pub fn renew_domain(&self, domain: &DomainName, years: u32) -> anyhow::Result<()> {
        if years == 0 {
            bail!("Renewal period must be at least one year");
        }
        self.submit(PURCHASE_PATH, &[renewal_item(domain, years)], Method::Post)?;
        info!("Renewed {domain} for {years} year(s)");
        Ok(())
    }
}
