//! Formats operation results for stdout, either as human readable text or as
//! JSON.

use itertools::Itertools;
use serde::Serialize;
use serde_json::{Value, json};

use crate::{
    configuration::OutputFormat,
    registrar::{Contact, ContactSet, DnsRecord, EppCode, SearchResult, SyncStatus, TldPricing},
};

/// Renders `value` as JSON, or with `human` for human readable output.
pub fn render<T: Serialize + ?Sized>(
    format: OutputFormat,
    value: &T,
    human: impl FnOnce(&T) -> String,
) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)
            .unwrap_or_else(|e| json!({"error": e.to_string()}).to_string()),
        OutputFormat::HumanReadable => human(value),
    }
}

/// Outcome of an operation that returns nothing but success.
pub fn success(format: OutputFormat, message: &str) -> String {
    render(format, &json!({"success": true, "message": message}), |_| {
        message.to_owned()
    })
}

pub fn failure(format: OutputFormat, error: &anyhow::Error) -> String {
    let message = format!("{error:#}");
    render(format, &json!({"error": message}), |_| {
        format!("error: {message}")
    })
}

pub fn balance(balance: &Option<Value>) -> String {
    match balance {
        Some(Value::String(amount)) => format!("Balance: {amount}"),
        Some(amount) => format!("Balance: {amount}"),
        None => "The registrar reported no balance".to_owned(),
    }
}

pub fn nameservers(nameservers: &[String]) -> String {
    if nameservers.iter().all(String::is_empty) {
        return "No nameservers set".to_owned();
    }
    nameservers
        .iter()
        .enumerate()
        .map(|(i, ns)| format!("ns{}: {ns}", i + 1))
        .join("\n")
}

fn contact(role: &str, contact: &Contact) -> String {
    let fields = [
        ("Organization", &contact.organization),
        ("First name", &contact.first_name),
        ("Last name", &contact.last_name),
        ("Email", &contact.email),
        ("Phone", &contact.phone),
        ("Address", &contact.address1),
        ("City", &contact.city),
        ("State", &contact.state),
        ("Zip", &contact.zip),
        ("Country", &contact.country),
    ];
    let body = fields
        .iter()
        .map(|(label, value)| format!("  {label:<13}{value}"))
        .join("\n");
    format!("{role}:\n{body}")
}

pub fn contacts(contacts: &ContactSet) -> String {
    [
        contact("Registrant", &contacts.registrant),
        contact("Admin", &contacts.admin),
        contact("Technical", &contacts.technical),
        contact("Billing", &contacts.billing),
    ]
    .join("\n")
}

pub fn search_results(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|result| match &result.premium {
            Some(premium) => format!(
                "{}\t{}\tpremium: register {} {currency}, renew {} {currency}",
                result.domain,
                result.status,
                premium.register,
                premium.renew,
                currency = premium.currency
            ),
            None => format!("{}\t{}", result.domain, result.status),
        })
        .join("\n")
}

pub fn dns_records(records: &[DnsRecord]) -> String {
    if records.is_empty() {
        return "No DNS records".to_owned();
    }
    records
        .iter()
        .map(|record| {
            format!(
                "{}\t{}\t{}\t{}",
                record.hostname,
                record.record_type,
                record.address,
                record.priority.as_deref().unwrap_or("N/A")
            )
        })
        .join("\n")
}

pub fn epp_code(code: &EppCode) -> String {
    match code {
        EppCode::Code(code) => format!("EPP code: {code}"),
        EppCode::SentByEmail => "The EPP code was sent to the registrant by email".to_owned(),
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

pub fn sync_status(status: &SyncStatus) -> String {
    let expiry = status
        .expiry_date
        .map_or_else(|| "unknown".to_owned(), |date| date.to_string());
    format!(
        "Expiry date:      {expiry}\nActive:           {}\nExpired:          {}\nTransferred away: {}",
        yes_no(status.active),
        yes_no(status.expired),
        yes_no(status.transferred_away)
    )
}

pub fn tld_pricing(pricing: &[TldPricing]) -> String {
    pricing
        .iter()
        .map(|tld| {
            format!(
                "{}\t{}-{} years\tregister {} {currency}\trenew {} {currency}\ttransfer {} {currency}",
                tld.extension,
                tld.min_years,
                tld.max_years,
                tld.register_price,
                tld.renew_price,
                tld.transfer_price,
                currency = tld.currency
            )
        })
        .join("\n")
}
