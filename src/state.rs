//! The view's shared state record.
//!
//! Fields are private and every change goes through a transition that
//! consumes the old record and returns a whole new one, so a page/filter pair
//! is never observed next to an issue list fetched for a different pair.

use crate::error::FetchFailure;
use crate::types::{IssueFilter, IssuePage, IssueQuery, IssueRecord, RepositoryMetadata};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    repository: Option<RepositoryMetadata>,
    page: IssuePage,
    loading: bool,
    failure: Option<FetchFailure>,
}

impl ViewState {
    /// Fresh state for a newly resolved identifier. Starts out loading.
    pub fn new(query: IssueQuery) -> Self {
        Self {
            repository: None,
            page: IssuePage::new(query, Vec::new()),
            loading: true,
            failure: None,
        }
    }

    pub fn repository(&self) -> Option<&RepositoryMetadata> {
        self.repository.as_ref()
    }

    pub fn issues(&self) -> &[IssueRecord] {
        &self.page.issues
    }

    pub fn filter(&self) -> IssueFilter {
        self.page.query.filter
    }

    pub fn page(&self) -> u32 {
        self.page.query.page
    }

    pub fn query(&self) -> IssueQuery {
        self.page.query
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn failure(&self) -> Option<&FetchFailure> {
        self.failure.as_ref()
    }

    /// Metadata has been loaded at least once.
    pub fn is_ready(&self) -> bool {
        self.repository.is_some()
    }

    pub fn has_prev_page(&self) -> bool {
        self.page() >= 2
    }

    pub fn has_next_page(&self) -> bool {
        self.page.is_full()
    }

    pub fn begin_loading(self) -> Self {
        Self {
            loading: true,
            failure: None,
            ..self
        }
    }

    pub fn view_loaded(self, repository: RepositoryMetadata, page: IssuePage) -> Self {
        Self {
            repository: Some(repository),
            page,
            loading: false,
            failure: None,
        }
    }

    pub fn issues_loaded(self, page: IssuePage) -> Self {
        Self {
            page,
            loading: false,
            failure: None,
            ..self
        }
    }

    /// Keeps the last good content and stops the loading indicator.
    pub fn fetch_failed(self, failure: FetchFailure) -> Self {
        Self {
            loading: false,
            failure: Some(failure),
            ..self
        }
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(IssueQuery::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, Resource};
    use crate::types::{Account, Label};

    fn repository() -> RepositoryMetadata {
        RepositoryMetadata {
            name: "react".to_string(),
            description: Some("UI library".to_string()),
            owner: Account {
                login: "facebook".to_string(),
                avatar_url: "https://avatars.example/facebook".to_string(),
            },
        }
    }

    fn issues(n: u64) -> Vec<IssueRecord> {
        (1..=n)
            .map(|i| IssueRecord {
                id: i,
                number: i,
                title: format!("Issue {}", i),
                html_url: format!("https://github.com/facebook/react/issues/{}", i),
                author: Account {
                    login: "someone".to_string(),
                    avatar_url: String::new(),
                },
                labels: vec![Label {
                    id: 1,
                    name: "bug".to_string(),
                }],
                pull_request: false,
                updated_at: None,
            })
            .collect()
    }

    #[test]
    fn starts_loading_with_defaults() {
        let state = ViewState::default();
        assert!(state.is_loading());
        assert!(!state.is_ready());
        assert_eq!(state.filter(), IssueFilter::All);
        assert_eq!(state.page(), 1);
        assert!(state.issues().is_empty());
    }

    #[test]
    fn view_loaded_sets_everything_together() {
        let query = IssueQuery::first_page(IssueFilter::Open).with_page(2);
        let state = ViewState::default().view_loaded(repository(), IssuePage::new(query, issues(5)));

        assert!(!state.is_loading());
        assert_eq!(state.repository(), Some(&repository()));
        assert_eq!(state.query(), query);
        assert_eq!(state.issues().len(), 5);
    }

    #[test]
    fn issues_loaded_replaces_rather_than_merges() {
        let state = ViewState::default()
            .view_loaded(repository(), IssuePage::new(IssueQuery::default(), issues(5)))
            .begin_loading()
            .issues_loaded(IssuePage::new(IssueQuery::default().with_page(2), issues(2)));

        assert_eq!(state.page(), 2);
        assert_eq!(state.issues().len(), 2);
        assert!(state.is_ready());
    }

    #[test]
    fn failure_keeps_content_and_clears_loading() {
        let loaded = ViewState::default()
            .view_loaded(repository(), IssuePage::new(IssueQuery::default(), issues(5)));
        let failure = FetchFailure::new(
            Resource::Issues,
            ApiError::Http {
                status: 404,
                message: "Not Found".to_string(),
            },
        );
        let state = loaded.clone().begin_loading().fetch_failed(failure.clone());

        assert!(!state.is_loading());
        assert_eq!(state.failure(), Some(&failure));
        assert_eq!(state.repository(), loaded.repository());
        assert_eq!(state.issues(), loaded.issues());
        assert_eq!(state.query(), loaded.query());
    }

    #[test]
    fn next_page_follows_page_size() {
        let short = ViewState::default()
            .view_loaded(repository(), IssuePage::new(IssueQuery::default(), issues(3)));
        assert!(!short.has_next_page());

        let full = ViewState::default()
            .view_loaded(repository(), IssuePage::new(IssueQuery::default(), issues(5)));
        assert!(full.has_next_page());
    }

    #[test]
    fn prev_page_needs_page_two() {
        let first = ViewState::default();
        assert!(!first.has_prev_page());

        let second = ViewState::new(IssueQuery::default().with_page(2));
        assert!(second.has_prev_page());
    }
}
