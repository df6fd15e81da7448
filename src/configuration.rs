use std::{
    convert::TryFrom,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use url::Url;

use crate::{
    authentication::Credentials,
    client::{ClientSettings, DEFAULT_BASE_URL},
    header::get_default_headers,
    registrar::LockStatus,
};

const DEFAULT_AUTH_TIMEOUT: u64 = 30000;
const DEFAULT_REQUEST_TIMEOUT: u64 = 100000;
pub const DEFAULT_CURRENCY: &str = "AMD";
const DEFAULT_LOG_LEVEL: log::LevelFilter = log::LevelFilter::Info;

/// Command-line client for the Name.am domain registrar.
#[derive(Parser)]
#[command(about, long_about = None)]
pub struct Cli {
    /// The path to a configuration file. If present, the configuration file is used
    /// to configure the client. Arguments given on the command line take precedence
    /// over the configuration file.
    #[arg(long, value_parser, value_name = "CONFIG_FILE.YAML", global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub options: PartialConfiguration,

    #[command(subcommand)]
    pub command: Commands,
}

/// The list of supported subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Print the version and exit
    Version,
    /// Log in and print the account balance
    Balance,
    /// Register a domain
    Register {
        /// The domain to register, e.g. example.am
        domain: String,
        /// Registration period in years
        #[arg(long, default_value_t = 1)]
        years: u32,
        /// YAML file with the registrant, admin, technical and billing contacts
        #[arg(long, value_name = "CONTACTS.YAML")]
        contacts: PathBuf,
        /// Nameserver hostname. Can be given up to five times.
        #[arg(long = "ns", value_name = "HOSTNAME")]
        nameservers: Vec<String>,
    },
    /// Renew a domain
    Renew {
        domain: String,
        /// Renewal period in years
        #[arg(long, default_value_t = 1)]
        years: u32,
    },
    /// Print the nameservers of a domain
    Nameservers { domain: String },
    /// Replace the nameservers of a domain
    SaveNameservers {
        domain: String,
        /// Nameserver hostnames. Invalid hostnames are skipped.
        #[arg(required = true, num_args = 1..=5)]
        nameservers: Vec<String>,
    },
    /// Print the contacts of a domain
    Contacts { domain: String },
    /// Replace the contacts of a domain
    SaveContacts {
        domain: String,
        /// YAML file with the registrant, admin, technical and billing contacts
        #[arg(value_name = "CONTACTS.YAML")]
        contacts: PathBuf,
    },
    /// Check whether a name is available under one or more TLDs
    Check {
        /// The name to search for, without TLD
        search_term: String,
        /// TLDs to check, with or without the leading dot
        #[arg(required = true)]
        tlds: Vec<String>,
    },
    /// Print the registrar lock status of a domain
    Lock { domain: String },
    /// Set the registrar lock status of a domain
    SaveLock {
        domain: String,
        #[arg(value_enum, ignore_case = true)]
        status: LockStatus,
    },
    /// Print the DNS records of a domain
    Dns { domain: String },
    /// Add DNS records to a domain
    SaveDns {
        domain: String,
        /// YAML file with a list of records (hostname, type, address)
        #[arg(value_name = "RECORDS.YAML")]
        records: PathBuf,
    },
    /// Enable or disable WHOIS privacy for a domain
    IdProtect {
        domain: String,
        #[arg(value_parser = clap::value_parser!(bool), action = clap::ArgAction::Set)]
        enabled: bool,
    },
    /// Request the EPP (transfer) code of a domain
    EppCode { domain: String },
    /// Print expiry and status information of a domain
    Sync { domain: String },
    /// Print the price list of all TLDs
    Pricing,
}

/// PartialConfiguration is a representation of a client configuration, obtained from
/// the CLI or from a configuration file.
///
/// Partial configurations are only one source, e.g. config file or command line.
/// No field can be mandatory here, since then it would need to be specified in both
/// places. The Configuration is combined from the partials and does have mandatory
/// fields, so creating a Configuration from a PartialConfiguration using TryFrom can
/// fail.
#[derive(Debug, Default, PartialEq, Eq, Deserialize, Args)]
pub struct PartialConfiguration {
    /// The base URL of the registrar API. Defaults to https://api.name.am.
    #[arg(value_parser = verify_url, long, global = true)]
    pub base_url: Option<Url>,

    /// The email address of the registrar account
    #[arg(long, env = "NAMEAM_EMAIL", global = true)]
    pub email: Option<String>,

    /// The password of the registrar account
    #[arg(long, env = "NAMEAM_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// Time-out of the login request in milliseconds. Defaults to 30000.
    #[arg(value_parser, long, global = true)]
    pub auth_timeout: Option<u64>,

    /// Time-out of the operation request in milliseconds. Defaults to 100000.
    #[arg(value_parser, long, global = true)]
    pub request_timeout: Option<u64>,

    /// Custom (static) headers that should be added to each request, as a YAML map
    /// of header name to value.
    #[arg(long, value_parser, value_name = "STATIC_HEADERS.YAML", global = true)]
    pub header: Option<PathBuf>,

    /// If given, every registrar call is recorded in this SQLite database.
    /// Otherwise calls are only written to the log.
    #[arg(long, value_parser, value_name = "AUDIT.DB", global = true)]
    pub audit_db: Option<PathBuf>,

    /// Output to stdout can be formatted in human readable format or json.
    #[arg(value_parser, long, value_enum, ignore_case = true, global = true)]
    pub output_format: Option<OutputFormat>,

    /// Currency code reported with prices. Defaults to AMD.
    #[arg(long, global = true)]
    pub currency: Option<String>,

    // Manually added possible values below, since automatically showing possible values of an external (remote) enum
    // such as log::LevelFilter is not well supported.
    /// Log level to output. This flag takes precedence over the environment variable. [possible values: off, error, warn, debug, info, trace]
    #[arg(value_parser = clap::value_parser!(log::LevelFilter), long, env = "LOG_LEVEL", ignore_case = true, global = true)]
    pub log_level: Option<log::LevelFilter>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, Deserialize)]
pub enum OutputFormat {
    #[serde(alias = "json")]
    Json,
    #[serde(
        alias = "human-readable",
        alias = "human_readable",
        alias = "humanreadable"
    )]
    HumanReadable,
}

/// The main configuration object.
#[derive(Debug, PartialEq, Eq)]
pub struct Configuration {
    /// The base URL of the registrar API.
    pub base_url: Url,

    /// The account used for every call.
    pub credentials: Credentials,

    /// Time-out of the login request.
    pub auth_timeout: Duration,

    /// Time-out of the operation request.
    pub request_timeout: Duration,

    /// Custom (static) headers file.
    pub header: Option<PathBuf>,

    /// SQLite audit database, if any.
    pub audit_db: Option<PathBuf>,

    /// Output to stdout can be formatted in human readable format or json.
    pub output_format: OutputFormat,

    /// Currency code reported with prices.
    pub currency: String,

    /// Log level to output.
    pub log_level: log::LevelFilter,
}

impl Configuration {
    /// Gathers configuration from the configuration file, if any, and the options
    /// given on the command line. The values from the command line are preferred.
    pub fn load(
        config_file: Option<&Path>,
        cli_options: PartialConfiguration,
    ) -> anyhow::Result<Self> {
        let partial = match config_file {
            Some(filename) => {
                let mut file_config = PartialConfiguration::from_yaml_file(filename)?;
                file_config.overwrite_from(cli_options);
                file_config
            }
            None => cli_options,
        };
        Configuration::try_from(partial)
    }

    /// Connection settings for the registrar client, including the default headers.
    pub fn client_settings(&self) -> anyhow::Result<ClientSettings> {
        Ok(ClientSettings {
            base_url: self.base_url.clone(),
            auth_timeout: self.auth_timeout,
            request_timeout: self.request_timeout,
            default_headers: get_default_headers(self.header.as_deref())?,
        })
    }
}

impl TryFrom<PartialConfiguration> for Configuration {
    type Error = anyhow::Error;

    fn try_from(value: PartialConfiguration) -> Result<Self, Self::Error> {
        let email = value.email.filter(|email| !email.trim().is_empty());
        let Some(email) = email else {
            bail!("No account email given (use --email or NAMEAM_EMAIL)");
        };
        let password = value.password.filter(|password| !password.is_empty());
        let Some(password) = password else {
            bail!("No account password given (use --password or NAMEAM_PASSWORD)");
        };

        let auth_timeout = value.auth_timeout.unwrap_or(DEFAULT_AUTH_TIMEOUT);
        let request_timeout = value.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        if auth_timeout == 0 || request_timeout == 0 {
            bail!("Time-outs must be at least 1 millisecond");
        }

        let base_url = match value.base_url {
            Some(url) => url,
            None => Url::parse(DEFAULT_BASE_URL)?,
        };

        Ok(Self {
            base_url,
            credentials: Credentials::new(email.trim(), password),
            auth_timeout: Duration::from_millis(auth_timeout),
            request_timeout: Duration::from_millis(request_timeout),
            header: value.header,
            audit_db: value.audit_db,
            output_format: value.output_format.unwrap_or(OutputFormat::HumanReadable),
            currency: value
                .currency
                .filter(|currency| !currency.is_empty())
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_owned()),
            log_level: value.log_level.unwrap_or(DEFAULT_LOG_LEVEL),
        })
    }
}

impl PartialConfiguration {
    /// Loads a PartialConfiguration from a yaml file
    fn from_yaml_file(filename: &Path) -> Result<Self, anyhow::Error> {
        let file = std::fs::File::open(filename).with_context(|| {
            format!("Failed to open configuration file {}", filename.display())
        })?;
        serde_yaml::from_reader(file).with_context(|| {
            format!("Failed to parse configuration file {}", filename.display())
        })
    }

    /// Overwrites `self` with the options given in other. If `other` contains
    /// None for a certain field, leaves the value from `self` in place.
    fn overwrite_from(&mut self, other: PartialConfiguration) {
        *self = PartialConfiguration {
            base_url: other.base_url.or(self.base_url.take()),
            email: other.email.or(self.email.take()),
            password: other.password.or(self.password.take()),
            auth_timeout: other.auth_timeout.or(self.auth_timeout.take()),
            request_timeout: other.request_timeout.or(self.request_timeout.take()),
            header: other.header.or(self.header.take()),
            audit_db: other.audit_db.or(self.audit_db.take()),
            output_format: other.output_format.or(self.output_format.take()),
            currency: other.currency.or(self.currency.take()),
            log_level: other.log_level.or_else(|| self.log_level.take()),
        };
    }
}

fn verify_url(arg: &str) -> anyhow::Result<Url> {
    let url = url::Url::parse(arg)?;
    if !url.scheme().starts_with("http") {
        bail!("The given URL does not start with a scheme (http(s)://)")
    }
    if url.host().is_none() {
        bail!("The given URL does not seem to contain a hostname")
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use std::{convert::TryInto, io::Write, time::Duration};

    use clap::Parser;

    use super::{
        Cli, Commands, Configuration, DEFAULT_CURRENCY, OutputFormat, PartialConfiguration,
        verify_url,
    };
    use crate::registrar::LockStatus;

    fn with_account() -> PartialConfiguration {
        PartialConfiguration {
            email: Some("reseller@example.am".into()),
            password: Some("hunter2".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_try_from_empty() {
        let tried_config: Result<Configuration, _> = PartialConfiguration::default().try_into();
        match tried_config {
            Ok(_) => panic!("Configuration without account was accepted"),
            Err(e) => assert_eq!(
                e.to_string(),
                "No account email given (use --email or NAMEAM_EMAIL)"
            ),
        }
    }

    #[test]
    fn test_try_from_missing_password() {
        let stored_config = PartialConfiguration {
            email: Some("reseller@example.am".into()),
            password: Some(String::new()),
            ..Default::default()
        };
        let err = Configuration::try_from(stored_config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "No account password given (use --password or NAMEAM_PASSWORD)"
        );
    }

    #[test]
    fn test_try_from_defaults() {
        let config: Configuration = with_account().try_into().unwrap();
        assert_eq!(config.base_url.as_str(), "https://api.name.am/");
        assert_eq!(config.auth_timeout, Duration::from_secs(30));
        assert_eq!(config.request_timeout, Duration::from_secs(100));
        assert_eq!(config.output_format, OutputFormat::HumanReadable);
        assert_eq!(config.currency, DEFAULT_CURRENCY);
        assert_eq!(config.log_level, log::LevelFilter::Info);
        assert_eq!(config.credentials.email(), "reseller@example.am");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let stored_config = PartialConfiguration {
            auth_timeout: Some(0),
            ..with_account()
        };
        assert!(Configuration::try_from(stored_config).is_err());
    }

    #[test]
    fn test_overwrite() {
        let mut file_config = PartialConfiguration {
            email: Some("file@example.am".into()),
            password: Some("from-file".into()),
            request_timeout: Some(10000),
            output_format: Some(OutputFormat::HumanReadable),
            ..Default::default()
        };
        let cli_config = PartialConfiguration {
            email: Some("cli@example.am".into()),
            output_format: Some(OutputFormat::Json),
            ..Default::default()
        };
        let result_config = PartialConfiguration {
            email: Some("cli@example.am".into()),
            password: Some("from-file".into()),
            request_timeout: Some(10000),
            output_format: Some(OutputFormat::Json),
            ..Default::default()
        };

        file_config.overwrite_from(cli_config);
        assert_eq!(file_config, result_config);
    }

    #[test]
    fn test_load_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "base_url: http://localhost:8080\nemail: file@example.am\npassword: from-file\noutput_format: json\ncurrency: USD\nauth_timeout: 500"
        )
        .unwrap();

        let cli_options = PartialConfiguration {
            password: Some("from-cli".into()),
            ..Default::default()
        };
        let config = Configuration::load(Some(file.path()), cli_options).unwrap();
        assert_eq!(config.base_url.as_str(), "http://localhost:8080/");
        assert_eq!(config.credentials.password(), "from-cli");
        assert_eq!(config.output_format, OutputFormat::Json);
        assert_eq!(config.currency, "USD");
        assert_eq!(config.auth_timeout, Duration::from_millis(500));
    }

    #[test]
    fn test_missing_config_file() {
        let err = Configuration::load(
            Some(std::path::Path::new("/nonexistent/nameam.yaml")),
            with_account(),
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("Failed to open configuration file"));
    }

    #[test]
    fn test_verify_url() {
        assert!(verify_url("https://api.name.am").is_ok());
        assert!(verify_url("ftp://api.name.am").is_err());
        assert!(verify_url("not a url").is_err());
    }

    #[test]
    fn test_cli_parses_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "nameam",
            "save-lock",
            "example.am",
            "locked",
            "--email",
            "cli@example.am",
            "--output-format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.options.email.as_deref(), Some("cli@example.am"));
        assert_eq!(cli.options.output_format, Some(OutputFormat::Json));
        match cli.command {
            Commands::SaveLock { domain, status } => {
                assert_eq!(domain, "example.am");
                assert_eq!(status, LockStatus::Locked);
            }
            _ => panic!("wrong subcommand"),
        }
    }
}
