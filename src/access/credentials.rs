/// Credential validation for the public read API
///
/// The first gate of every public read. Both halves of the credential pair
/// are matched in one lookup so a valid `site_uuid` with a wrong secret fails
/// exactly like an unknown `site_uuid`.

use crate::error::ApiError;
use crate::project::{types::ProjectCredentials, ProjectStorage};

#[derive(Debug, Clone)]
pub struct CredentialValidator {
    projects: ProjectStorage,
}

impl CredentialValidator {
    pub fn new(projects: ProjectStorage) -> Self {
        Self { projects }
    }

    /// Resolve `(site_uuid, api_secret)` to the owning project
    pub async fn validate(&self, site_uuid: &str, api_secret: &str) -> Result<ProjectCredentials, ApiError> {
        if site_uuid.is_empty() || api_secret.is_empty() {
            return Err(ApiError::InvalidCredentials);
        }

        match self.projects.find_by_credentials(site_uuid, api_secret).await? {
            Some(credentials) => {
                tracing::debug!("🔑 Credentials accepted for project {}", credentials.project_id);
                Ok(credentials)
            }
            None => {
                tracing::debug!("🚫 Credentials rejected for site {}", site_uuid);
                Err(ApiError::InvalidCredentials)
            }
        }
    }
}
