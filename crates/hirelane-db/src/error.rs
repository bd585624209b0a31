use hirelane_gateway::GatewayError;
use thiserror::Error;

/// Repository failures, split into validation results the caller displays
/// and gateway failures the caller reports generically.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Invalid requirement ID")]
    InvalidRequirementId,

    #[error("Invalid user ID")]
    InvalidUserId,

    #[error("Requirement not found")]
    RequirementNotFound,

    #[error("Job title already exists in the database. Please provide a unique job title.")]
    DuplicateName,

    #[error("Campaign already exists for this requirement")]
    CampaignAlreadyExists,

    #[error("Campaign not found for this requirement")]
    CampaignNotFound,

    #[error("Please select at least one posting option")]
    NoOptionsSelected,

    #[error("Failed to create campaign")]
    CampaignIdMissing,

    #[error("User not found")]
    UserNotFound,

    #[error("database query failed")]
    Gateway(#[from] GatewayError),

    #[error("database insert failed")]
    InsertFailed(#[source] GatewayError),

    #[error("could not fetch the inserted id")]
    FetchIdFailed(#[source] GatewayError),
}

impl RepoError {
    /// True for failures the form should display to the user, as opposed to
    /// gateway faults reported as generic database errors.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            RepoError::Gateway(_) | RepoError::InsertFailed(_) | RepoError::FetchIdFailed(_)
        )
    }
}
