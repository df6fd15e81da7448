use super::{
    Registrar,
    types::{ContactSet, DomainName},
};

impl Registrar<'_> {
    pub fn get_contact_details(&self, domain: &DomainName) -> anyhow::Result<ContactSet> {
        let entry = self.find_domain(domain)?;
        Ok(ContactSet::from_wire(&entry))
    }

    /// Replaces all four contacts of the domain.
    pub fn save_contact_details(
        &self,
        domain: &DomainName,
        contacts: &ContactSet,
    ) -> anyhow::Result<()> {
        self.update_domain(domain, &contacts.to_wire())
    }
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, Server};
    use serde_json::json;

    use crate::{
        audit::LogAudit,
        client::tests::mock_login,
        registrar::{
            Contact, ContactSet,
            tests::{example, mock_domain_list, registrar},
        },
    };

    #[test]
    fn contacts_are_read_per_role() {
        let mut server = Server::new();
        let _login = mock_login(&mut server);
        let _list = mock_domain_list(
            &mut server,
            json!({
                "domain": "example.am",
                "registrantContacts": {"firstName": "Ani", "organization": "Acme", "phone": "+37410123456"},
                "administrativeContacts": {"firstName": "Aram"},
                "technicalContacts": {"firstName": "Tigran"},
            }),
        );

        let contacts = registrar(&server, &LogAudit)
            .get_contact_details(&example())
            .unwrap();
        assert_eq!(contacts.registrant.first_name, "Ani");
        assert_eq!(contacts.registrant.organization, "Acme");
        assert_eq!(contacts.registrant.phone, "+37410123456");
        assert_eq!(contacts.admin.first_name, "Aram");
        assert_eq!(contacts.technical.first_name, "Tigran");
        assert_eq!(contacts.billing, Contact::default());
    }

    #[test]
    fn save_contacts_sends_all_roles() {
        let mut server = Server::new();
        let _login = mock_login(&mut server);
        let contact = Contact {
            first_name: "Ani".into(),
            last_name: "Petrosyan".into(),
            city: "Yerevan".into(),
            ..Default::default()
        };
        let wire = contact.to_wire();
        let update = server
            .mock("PUT", "/client/domains/example.am")
            .match_body(Matcher::Json(json!({
                "registrantContacts": wire,
                "administrativeContacts": wire,
                "technicalContacts": wire,
                "billingContacts": wire,
            })))
            .with_body("{}")
            .create();

        registrar(&server, &LogAudit)
            .save_contact_details(&example(), &ContactSet::uniform(contact))
            .unwrap();
        update.assert();
    }
}
