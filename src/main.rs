use std::{fs::File, path::Path, process::ExitCode};

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use serde::de::DeserializeOwned;

use nameam::{
    audit::{AuditLog, LogAudit, sqlite::SqliteAudit},
    configuration::{Cli, Commands, Configuration, OutputFormat},
    output,
    registrar::{ContactSet, ContactsFile, DnsRecord, DomainName, Registrar, RegistrationRequest},
};

fn main() -> ExitCode {
    let Cli {
        config,
        options,
        command,
    } = Cli::parse();

    if let Commands::Version = command {
        println!("{}", version());
        return ExitCode::SUCCESS;
    }

    let cli_log_level = options.log_level;
    let configuration = Configuration::load(config.as_deref(), options);
    let (log_level, output_format) = match &configuration {
        Ok(configuration) => (configuration.log_level, configuration.output_format),
        Err(_) => (
            cli_log_level.unwrap_or(log::LevelFilter::Info),
            OutputFormat::HumanReadable,
        ),
    };
    env_logger::Builder::new().filter_level(log_level).init();

    match configuration.and_then(|configuration| run(&configuration, command)) {
        Ok(text) => {
            println!("{text}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            match output_format {
                OutputFormat::Json => println!("{}", output::failure(output_format, &err)),
                OutputFormat::HumanReadable => {
                    eprintln!("{}", output::failure(output_format, &err))
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn version() -> String {
    format!("nameam version: {}", clap::crate_version!())
}

fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    serde_yaml::from_reader(file).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Runs one subcommand and returns what should be printed.
fn run(configuration: &Configuration, command: Commands) -> Result<String> {
    let audit: Box<dyn AuditLog> = match &configuration.audit_db {
        Some(path) => Box::new(SqliteAudit::open(path)?),
        None => Box::new(LogAudit),
    };
    let registrar = Registrar::from_configuration(configuration, audit.as_ref())?;
    let format = configuration.output_format;
    debug!("Using registrar API at {}", configuration.base_url);

    let text = match command {
        Commands::Version => version(),
        Commands::Balance => {
            let balance = registrar.account_balance()?;
            output::render(format, &balance, output::balance)
        }
        Commands::Register {
            domain,
            years,
            contacts,
            nameservers,
        } => {
            let contacts: ContactSet = read_yaml::<ContactsFile>(&contacts)?.into();
            let request = RegistrationRequest {
                domain: domain.parse()?,
                years,
                contacts,
                nameservers,
            };
            registrar.register_domain(&request)?;
            output::success(
                format,
                &format!("Registered {} for {years} year(s)", request.domain),
            )
        }
        Commands::Renew { domain, years } => {
            let domain: DomainName = domain.parse()?;
            registrar.renew_domain(&domain, years)?;
            output::success(format, &format!("Renewed {domain} for {years} year(s)"))
        }
        Commands::Nameservers { domain } => {
            let nameservers = registrar.get_nameservers(&domain.parse()?)?;
            output::render(format, &nameservers, |ns| output::nameservers(ns))
        }
        Commands::SaveNameservers {
            domain,
            nameservers,
        } => {
            let domain: DomainName = domain.parse()?;
            registrar.save_nameservers(&domain, &nameservers)?;
            output::success(format, &format!("Nameservers of {domain} saved"))
        }
        Commands::Contacts { domain } => {
            let contacts = registrar.get_contact_details(&domain.parse()?)?;
            output::render(format, &contacts, output::contacts)
        }
        Commands::SaveContacts { domain, contacts } => {
            let domain: DomainName = domain.parse()?;
            let contacts: ContactSet = read_yaml::<ContactsFile>(&contacts)?.into();
            registrar.save_contact_details(&domain, &contacts)?;
            output::success(format, &format!("Contacts of {domain} saved"))
        }
        Commands::Check { search_term, tlds } => {
            let results = registrar.check_availability(&search_term, &tlds)?;
            output::render(format, &results, |results| output::search_results(results))
        }
        Commands::Lock { domain } => {
            let status = registrar.get_registrar_lock(&domain.parse()?)?;
            output::render(format, &status, |status| status.to_string())
        }
        Commands::SaveLock { domain, status } => {
            let domain: DomainName = domain.parse()?;
            registrar.save_registrar_lock(&domain, status)?;
            output::success(format, &format!("{domain} is now {status}"))
        }
        Commands::Dns { domain } => {
            let records = registrar.get_dns(&domain.parse()?)?;
            output::render(format, &records, |records| output::dns_records(records))
        }
        Commands::SaveDns { domain, records } => {
            let domain: DomainName = domain.parse()?;
            let records: Vec<DnsRecord> = read_yaml(&records)?;
            registrar.save_dns(&domain, &records)?;
            output::success(
                format,
                &format!("{} DNS record(s) added to {domain}", records.len()),
            )
        }
        Commands::IdProtect { domain, enabled } => {
            let domain: DomainName = domain.parse()?;
            registrar.id_protect_toggle(&domain, enabled)?;
            let state = if enabled { "enabled" } else { "disabled" };
            output::success(format, &format!("ID protection {state} for {domain}"))
        }
        Commands::EppCode { domain } => {
            let code = registrar.get_epp_code(&domain.parse()?)?;
            output::render(format, &code, output::epp_code)
        }
        Commands::Sync { domain } => {
            let status = registrar.sync(&domain.parse()?)?;
            output::render(format, &status, output::sync_status)
        }
        Commands::Pricing => {
            let pricing = registrar.get_tld_pricing()?;
            info!("Received prices for {} TLD(s)", pricing.len());
            output::render(format, &pricing, |pricing| output::tld_pricing(pricing))
        }
    };
    Ok(text)
}
