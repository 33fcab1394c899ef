/// Public data access layer
///
/// Everything a static site can reach with a site UUID and API secret:
/// - Credential validation (single combined lookup)
/// - Variable and database readers
/// - Fire-and-forget access logging

pub mod credentials;
pub mod logger;
pub mod readers;

pub use credentials::CredentialValidator;
pub use logger::AccessLogger;
pub use readers::{DatabaseReader, VariableReader};
