//! Fetch coordination and pagination/filter handling for the repository view.
//!
//! Every request that affects visible content gets a fresh `load_id` and
//! cancels the one before it. Results travel back over the action channel
//! and are applied only if their `load_id` is still the latest, so the view
//! always reflects the last issued request, whatever order responses arrive in.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::action::Action;
use crate::error::{FetchFailure, Resource, Result};
use crate::source::IssueSource;
use crate::state::ViewState;
use crate::types::{IssueFilter, IssuePage, IssueQuery, RepositoryIdentifier};

pub struct Controller {
    state: ViewState,
    identifier: Option<RepositoryIdentifier>,
    initial_query: IssueQuery,
    source: Arc<dyn IssueSource>,
    action_tx: mpsc::UnboundedSender<Action>,
    load_id: u64,
    in_flight: Option<CancellationToken>,
}

impl Controller {
    pub fn new(source: Arc<dyn IssueSource>, action_tx: mpsc::UnboundedSender<Action>) -> Self {
        Self {
            state: ViewState::default(),
            identifier: None,
            initial_query: IssueQuery::default(),
            source,
            action_tx,
            load_id: 0,
            in_flight: None,
        }
    }

    /// Filter and page used whenever a new identifier is opened.
    pub fn with_initial_query(mut self, query: IssueQuery) -> Self {
        self.initial_query = query;
        self.state = ViewState::new(query);
        self
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn identifier(&self) -> Option<&RepositoryIdentifier> {
        self.identifier.as_ref()
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Resolve an encoded identifier and load the view for it. A different
    /// identifier resets all derived state; the same one is a no-op.
    pub fn open_repository(&mut self, encoded: &str) -> Result<()> {
        let id = RepositoryIdentifier::from_encoded(encoded)?;
        if self.identifier.as_ref() == Some(&id) {
            return Ok(());
        }

        info!(repository = %id, "opening repository");
        self.state = ViewState::new(self.initial_query);
        self.identifier = Some(id);
        self.load_view();
        Ok(())
    }

    /// Reload metadata and the current issue page.
    pub fn refresh(&mut self) {
        if self.identifier.is_some() {
            self.load_view();
        }
    }

    pub fn change_filter(&mut self, filter: IssueFilter) {
        if !self.state.is_ready() {
            debug!(%filter, "ignoring filter change before repository is loaded");
            return;
        }
        self.load_issues(IssueQuery::first_page(filter));
    }

    pub fn change_page(&mut self, target: u32) {
        if target < 1 || !self.state.is_ready() {
            debug!(target, "ignoring page change");
            return;
        }
        self.load_issues(self.state.query().with_page(target));
    }

    pub fn prev_page(&mut self) {
        if self.state.has_prev_page() {
            self.change_page(self.state.page() - 1);
        }
    }

    pub fn next_page(&mut self) {
        if self.state.has_next_page() {
            self.change_page(self.state.page().saturating_add(1));
        }
    }

    /// Apply a fetch result. Returns false if the result was stale or the
    /// action is not a fetch result.
    pub fn apply(&mut self, action: Action) -> bool {
        match action {
            Action::ViewLoaded {
                repository,
                page,
                load_id,
            } => {
                if !self.is_current(load_id) {
                    return false;
                }
                self.in_flight = None;
                self.state = std::mem::take(&mut self.state).view_loaded(*repository, page);
                true
            }
            Action::IssuesLoaded { page, load_id } => {
                if !self.is_current(load_id) {
                    return false;
                }
                self.in_flight = None;
                self.state = std::mem::take(&mut self.state).issues_loaded(page);
                true
            }
            Action::FetchFailed { failure, load_id } => {
                if !self.is_current(load_id) {
                    return false;
                }
                // The status bar shows it; stderr belongs to the terminal UI.
                debug!(%failure, "fetch failed");
                self.in_flight = None;
                self.state = std::mem::take(&mut self.state).fetch_failed(failure);
                true
            }
            _ => false,
        }
    }

    fn is_current(&self, load_id: u64) -> bool {
        if load_id != self.load_id {
            debug!(load_id, current = self.load_id, "discarding stale result");
            return false;
        }
        true
    }

    /// Supersede whatever is in flight and mark the view loading.
    fn begin_request(&mut self) -> (u64, CancellationToken) {
        if let Some(previous) = self.in_flight.take() {
            previous.cancel();
        }
        self.load_id += 1;
        let cancel = CancellationToken::new();
        self.in_flight = Some(cancel.clone());
        self.state = std::mem::take(&mut self.state).begin_loading();
        (self.load_id, cancel)
    }

    /// Fetch metadata and issues concurrently and publish them together.
    fn load_view(&mut self) {
        let Some(id) = self.identifier.clone() else {
            return;
        };
        let query = self.state.query();
        let (load_id, cancel) = self.begin_request();
        debug!(load_id, repository = %id, %query, "loading view");

        let tx = self.action_tx.clone();
        let source = Arc::clone(&self.source);
        tokio::spawn(async move {
            let fetch = async {
                tokio::join!(source.get_repository(&id), source.list_issues(&id, query))
            };
            let results = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(load_id, "view load cancelled");
                    return;
                }
                results = fetch => results,
            };

            let action = match results {
                (Ok(repository), Ok(issues)) => Action::ViewLoaded {
                    repository: Box::new(repository),
                    page: IssuePage::new(query, issues),
                    load_id,
                },
                (Err(e), _) => Action::FetchFailed {
                    failure: FetchFailure::new(Resource::Repository, e),
                    load_id,
                },
                (_, Err(e)) => Action::FetchFailed {
                    failure: FetchFailure::new(Resource::Issues, e),
                    load_id,
                },
            };
            tx.send(action).ok();
        });
    }

    fn load_issues(&mut self, query: IssueQuery) {
        let Some(id) = self.identifier.clone() else {
            return;
        };
        let (load_id, cancel) = self.begin_request();
        debug!(load_id, repository = %id, %query, "loading issues");

        let tx = self.action_tx.clone();
        let source = Arc::clone(&self.source);
        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(load_id, "issue load cancelled");
                    return;
                }
                result = source.list_issues(&id, query) => result,
            };

            let action = match result {
                Ok(issues) => Action::IssuesLoaded {
                    page: IssuePage::new(query, issues),
                    load_id,
                },
                Err(e) => Action::FetchFailed {
                    failure: FetchFailure::new(Resource::Issues, e),
                    load_id,
                },
            };
            tx.send(action).ok();
        });
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        if let Some(cancel) = self.in_flight.take() {
            cancel.cancel();
        }
    }
}
