/// Build hook integration
///
/// Notifies an external static-site host when project data changes:
/// - Deployment records (pending / success / failed)
/// - Detached HTTP delivery with reqwest
/// - Manual triggers and hook URL testing

pub mod hook;
pub mod storage;
pub mod types;

pub use hook::BuildHookService;
pub use storage::DeploymentStorage;
pub use types::{BuildDeployment, TriggerReason};
