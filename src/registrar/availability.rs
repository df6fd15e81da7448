use serde_json::{Value, json};

use super::{
    Registrar, text, truthy,
    types::{AvailabilityStatus, PremiumPricing, SearchResult},
};
use crate::method::Method;

pub const CHECK_PATH: &str = "/client/domains/check";

impl Registrar<'_> {
    /// Checks `search_term` under each of `tlds`. TLDs may be given with or
    /// without their leading dot.
    pub fn check_availability(
        &self,
        search_term: &str,
        tlds: &[String],
    ) -> anyhow::Result<Vec<SearchResult>> {
        let search_term = search_term.trim().to_lowercase();
        if search_term.is_empty() {
            bail!("Nothing to search for");
        }
        let queries: Vec<Value> = tlds
            .iter()
            .map(|tld| tld.trim().trim_start_matches('.'))
            .filter(|tld| !tld.is_empty())
            .map(|tld| json!({"tld": tld, "domain": format!("{search_term}.{tld}")}))
            .collect();
        if queries.is_empty() {
            bail!("No TLDs given to check");
        }

        let reply = self.submit(CHECK_PATH, &queries, Method::Post)?;
        let results = match &reply {
            Value::Array(items) => items.iter().map(|item| self.search_result(item)).collect(),
            Value::Object(_) => vec![self.search_result(&reply)],
            _ => Vec::new(),
        };
        Ok(results)
    }

    fn search_result(&self, item: &Value) -> SearchResult {
        let premium = truthy(&item["premium"]).then(|| PremiumPricing {
            register: text(&item["price"]),
            renew: text(&item["priceRenew"]),
            currency: self.currency().to_owned(),
        });
        SearchResult {
            domain: text(&item["domain"]),
            status: AvailabilityStatus::from_available(&item["available"]),
            premium,
        }
    }
}
