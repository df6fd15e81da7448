//! Client for the Name.am registrar REST API.
//!
//! Every registrar call follows the same two steps: log in with the account
//! credentials, then perform the operation request using the session obtained
//! from the login. The [`client::RegistrarApiClient`] implements this flow and
//! decodes the JSON reply; the [`registrar`] module builds the payloads for the
//! individual domain operations on top of it.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate lazy_static;

pub mod audit;
pub mod authentication;
pub mod client;
pub mod configuration;
pub mod envelope;
pub mod error;
pub mod header;
pub mod method;
pub mod output;
pub mod registrar;

pub use client::RegistrarApiClient;
pub use envelope::RequestEnvelope;
pub use error::ApiClientError;
pub use method::Method;
