use std::{fmt::Display, str::FromStr};

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};

/// A registrable domain, split into second-level label and TLD. The TLD may
/// itself contain dots, e.g. `example.co.am` has TLD `co.am`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DomainName {
    pub sld: String,
    pub tld: String,
}

impl DomainName {
    pub fn new(sld: impl Into<String>, tld: impl Into<String>) -> Self {
        Self {
            sld: sld.into(),
            tld: tld.into(),
        }
    }
}

impl Display for DomainName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.sld, self.tld)
    }
}

impl FromStr for DomainName {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_end_matches('.').to_lowercase();
        match s.split_once('.') {
            Some((sld, tld)) if !sld.is_empty() && !tld.is_empty() && !tld.starts_with('.') => {
                Ok(DomainName::new(sld, tld))
            }
            _ => bail!("'{s}' is not a domain name of the form <name>.<tld>"),
        }
    }
}

/// WHOIS contact as exchanged with the registrar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    pub organization: String,
    pub first_name: String,
    pub last_name: String,
    pub address1: String,
    /// Two-letter country code, e.g. `AM`.
    pub country: String,
    pub email: String,
    /// Phone number, e.g. `+374.10123456`. Dots are removed on the wire.
    pub phone: String,
    pub state: String,
    pub city: String,
    pub zip: String,
}

impl Contact {
    /// The registrar's representation of this contact.
    pub fn to_wire(&self) -> Value {
        json!({
            "organization": self.organization,
            "firstName": self.first_name,
            "lastName": self.last_name,
            "fullName": format!("{} {}", self.first_name, self.last_name),
            "address1": self.address1,
            "country": self.country,
            "email": self.email,
            "phone": self.phone.replace('.', ""),
            "state": self.state,
            "city": self.city,
            "zip": self.zip,
        })
    }

    /// Reads a contact from the registrar's representation. Missing fields
    /// are left empty.
    pub fn from_wire(value: &Value) -> Self {
        Self {
            organization: text(&value["organization"]),
            first_name: text(&value["firstName"]),
            last_name: text(&value["lastName"]),
            address1: text(&value["address1"]),
            country: text(&value["country"]),
            email: text(&value["email"]),
            phone: text(&value["phone"]),
            state: text(&value["state"]),
            city: text(&value["city"]),
            zip: text(&value["zip"]),
        }
    }
}

/// The four contacts attached to a domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSet {
    pub registrant: Contact,
    pub admin: Contact,
    pub technical: Contact,
    pub billing: Contact,
}

impl ContactSet {
    /// Uses one contact for all four roles.
    pub fn uniform(contact: Contact) -> Self {
        Self {
            registrant: contact.clone(),
            admin: contact.clone(),
            technical: contact.clone(),
            billing: contact,
        }
    }

    pub(crate) fn to_wire(&self) -> Value {
        json!({
            "registrantContacts": self.registrant.to_wire(),
            "administrativeContacts": self.admin.to_wire(),
            "technicalContacts": self.technical.to_wire(),
            "billingContacts": self.billing.to_wire(),
        })
    }

    pub(crate) fn from_wire(domain: &Value) -> Self {
        Self {
            registrant: Contact::from_wire(&domain["registrantContacts"]),
            admin: Contact::from_wire(&domain["administrativeContacts"]),
            technical: Contact::from_wire(&domain["technicalContacts"]),
            billing: Contact::from_wire(&domain["billingContacts"]),
        }
    }
}

/// Contacts file accepted by the command line: either all four roles, or a
/// single contact used for every role.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ContactsFile {
    Set(ContactSet),
    Single(Contact),
}

impl From<ContactsFile> for ContactSet {
    fn from(file: ContactsFile) -> Self {
        match file {
            ContactsFile::Set(set) => set,
            ContactsFile::Single(contact) => ContactSet::uniform(contact),
        }
    }
}

/// One DNS host record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Record name, e.g. `www` or `@`.
    pub hostname: String,
    #[serde(rename = "type")]
    pub record_type: String,
    /// Record content, e.g. an IP address or a mail host.
    pub address: String,
    /// Only present for MX records.
    #[serde(
        default,
        deserialize_with = "priority_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub priority: Option<String>,
}

/// Record files may write the priority as a number or as text.
fn priority_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Priority {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(
        Option::<Priority>::deserialize(deserializer)?.map(|priority| match priority {
            Priority::Text(text) => text,
            Priority::Number(number) => number.to_string(),
        }),
    )
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LockStatus {
    Locked,
    Unlocked,
}

impl From<bool> for LockStatus {
    fn from(locked: bool) -> Self {
        if locked {
            LockStatus::Locked
        } else {
            LockStatus::Unlocked
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AvailabilityStatus {
    NotRegistered,
    Registered,
    TldNotSupported,
}

impl AvailabilityStatus {
    /// Interprets the `available` field of a check result.
    pub fn from_available(available: &Value) -> Self {
        match available {
            Value::Bool(true) => AvailabilityStatus::NotRegistered,
            Value::String(s) if s == "1" => AvailabilityStatus::NotRegistered,
            Value::Null | Value::Bool(false) => AvailabilityStatus::Registered,
            Value::String(s) if s.is_empty() => AvailabilityStatus::Registered,
            Value::Number(n) if n.as_f64() == Some(0.0) => AvailabilityStatus::Registered,
            _ => AvailabilityStatus::TldNotSupported,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PremiumPricing {
    pub register: String,
    pub renew: String,
    pub currency: String,
}

/// Outcome of an availability check for one domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub domain: String,
    pub status: AvailabilityStatus,
    pub premium: Option<PremiumPricing>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EppCode {
    /// The registrar returned the code.
    Code(String),
    /// The registrar sent the code to the registrant instead.
    SentByEmail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    /// None if the registrar returned no parseable expiration date.
    pub expiry_date: Option<NaiveDate>,
    pub active: bool,
    pub expired: bool,
    pub transferred_away: bool,
}

/// Prices of one TLD.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TldPricing {
    /// The TLD with a leading dot, e.g. `.am`.
    pub extension: String,
    pub min_years: u32,
    pub max_years: u32,
    pub register_price: f64,
    pub renew_price: f64,
    pub transfer_price: f64,
    pub currency: String,
    pub epp_required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRequest {
    pub domain: DomainName,
    pub years: u32,
    pub contacts: ContactSet,
    pub nameservers: Vec<String>,
}

/// Text of a loosely typed field: strings as they are, numbers and booleans
/// in their JSON form, null and missing as the empty string.
pub(crate) fn text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Whether a loosely typed field counts as set.
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::{
        AvailabilityStatus, Contact, ContactSet, ContactsFile, DnsRecord, DomainName, LockStatus,
    };

    #[test]
    fn domain_name_splits_at_first_dot() {
        let domain: DomainName = "Example.co.am.".parse().unwrap();
        assert_eq!(domain, DomainName::new("example", "co.am"));
        assert_eq!(domain.to_string(), "example.co.am");
        assert!("localhost".parse::<DomainName>().is_err());
        assert!(".am".parse::<DomainName>().is_err());
    }

    #[test]
    fn contact_wire_shape() {
        let contact = Contact {
            first_name: "Ani".into(),
            last_name: "Petrosyan".into(),
            phone: "+374.10123456".into(),
            country: "AM".into(),
            ..Default::default()
        };
        let wire = contact.to_wire();
        assert_eq!(wire["fullName"], "Ani Petrosyan");
        assert_eq!(wire["phone"], "+37410123456");
        assert_eq!(wire["firstName"], "Ani");
        assert_eq!(wire["organization"], "");
        assert_eq!(wire.as_object().unwrap().len(), 11);
    }

    #[test]
    fn contact_from_wire_tolerates_gaps() {
        let contact = Contact::from_wire(&json!({"firstName": "Ani", "zip": 10, "city": null}));
        assert_eq!(contact.first_name, "Ani");
        assert_eq!(contact.zip, "10");
        assert_eq!(contact.city, "");
        assert_eq!(Contact::from_wire(&Value::Null), Contact::default());
    }

    #[test]
    fn contacts_file_accepts_single_contact() {
        let single: ContactsFile =
            serde_yaml::from_str("first_name: Ani\nlast_name: Petrosyan\nemail: ani@example.am")
                .unwrap();
        let set = ContactSet::from(single);
        assert_eq!(set.billing.email, "ani@example.am");
        assert_eq!(set.registrant, set.admin);

        let full: ContactsFile = serde_yaml::from_str(
            "registrant: {first_name: A}\nadmin: {first_name: B}\ntechnical: {}\nbilling: {}",
        )
        .unwrap();
        let set = ContactSet::from(full);
        assert_eq!(set.registrant.first_name, "A");
        assert_eq!(set.admin.first_name, "B");
    }

    #[test]
    fn record_priority_as_number_or_text() {
        let records: Vec<DnsRecord> = serde_yaml::from_str(
            "- {hostname: '@', type: MX, address: mail.example.am, priority: 10}\n\
             - {hostname: mx2, type: MX, address: mx2.example.am, priority: '20'}\n\
             - {hostname: www, type: A, address: 10.0.0.1}",
        )
        .unwrap();
        assert_eq!(records[0].priority.as_deref(), Some("10"));
        assert_eq!(records[1].priority.as_deref(), Some("20"));
        assert_eq!(records[2].priority, None);
    }

    #[test]
    fn availability_mapping() {
        use AvailabilityStatus::*;
        assert_eq!(AvailabilityStatus::from_available(&json!(true)), NotRegistered);
        assert_eq!(AvailabilityStatus::from_available(&json!("1")), NotRegistered);
        assert_eq!(AvailabilityStatus::from_available(&json!(false)), Registered);
        assert_eq!(AvailabilityStatus::from_available(&json!("")), Registered);
        assert_eq!(AvailabilityStatus::from_available(&json!(0)), Registered);
        assert_eq!(AvailabilityStatus::from_available(&Value::Null), Registered);
        assert_eq!(AvailabilityStatus::from_available(&json!("reserved")), TldNotSupported);
        assert_eq!(NotRegistered.to_string(), "not-registered");
    }

    #[test]
    fn lock_status_text() {
        assert_eq!(LockStatus::from(true).to_string(), "locked");
        assert_eq!("unlocked".parse::<LockStatus>().unwrap(), LockStatus::Unlocked);
    }
}
