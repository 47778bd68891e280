use async_trait::async_trait;

use crate::error::ApiError;
use crate::types::{IssueQuery, IssueRecord, RepositoryIdentifier, RepositoryMetadata};

/// Read-only access to the remote repository API.
#[async_trait]
pub trait IssueSource: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    /// `GET /repos/{id}`
    async fn get_repository(
        &self,
        id: &RepositoryIdentifier,
    ) -> Result<RepositoryMetadata, ApiError>;

    /// `GET /repos/{id}/issues?state=..&per_page=5&page=..`
    async fn list_issues(
        &self,
        id: &RepositoryIdentifier,
        query: IssueQuery,
    ) -> Result<Vec<IssueRecord>, ApiError>;
}
