use crate::error::FetchFailure;
use crate::types::{IssueFilter, IssuePage, RepositoryMetadata};

#[derive(Debug, Clone)]
pub enum Action {
    Quit,
    Tick,
    ScrollUp,
    ScrollDown,

    // Pagination / filter
    SetFilter(IssueFilter),
    PrevPage,
    NextPage,
    Refresh,

    // Selected issue
    OpenInBrowser,
    YankUrl,

    // Fetch results, tagged with the load that produced them
    ViewLoaded {
        repository: Box<RepositoryMetadata>,
        page: IssuePage,
        load_id: u64,
    },
    IssuesLoaded {
        page: IssuePage,
        load_id: u64,
    },
    FetchFailed {
        failure: FetchFailure,
        load_id: u64,
    },

    None,
}
