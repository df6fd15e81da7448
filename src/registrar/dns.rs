use serde_json::{Value, json};

use super::{
    Registrar, text,
    types::{DnsRecord, DomainName},
};

/// The registrar only takes records to create; the TTL is fixed.
fn create_record(record: &DnsRecord) -> Value {
    json!({
        "type": record.record_type,
        "ttl": 1,
        "name": record.hostname,
        "content": record.address,
        "action": "CREATE",
    })
}

fn record_from_wire(record: &Value) -> DnsRecord {
    let record_type = text(&record["type"]);
    let priority = (record_type == "MX").then(|| text(&record["priority"]));
    DnsRecord {
        hostname: text(&record["name"]),
        record_type,
        address: text(&record["content"]),
        priority,
    }
}

impl Registrar<'_> {
    pub fn get_dns(&self, domain: &DomainName) -> anyhow::Result<Vec<DnsRecord>> {
        let entry = self.find_domain(domain)?;
        Ok(entry["records"]
            .as_array()
            .into_iter()
            .flatten()
            .map(record_from_wire)
            .collect())
    }

    pub fn save_dns(&self, domain: &DomainName, records: &[DnsRecord]) -> anyhow::Result<()> {
        let records: Vec<Value> = records.iter().map(create_record).collect();
        self.update_domain(domain, &json!({"records": records}))
    }
}
