use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{RepoLensError, Result};

/// Fixed page size for every issue list request.
pub const PER_PAGE: u8 = 5;

/// The API returns no total count, so a full page is the only hint that
/// another one may follow.
pub fn page_is_full(len: usize) -> bool {
    len >= usize::from(PER_PAGE)
}

/// Repository address on the remote API, e.g. `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryIdentifier(String);

impl RepositoryIdentifier {
    /// Decode a URL-encoded path segment (`facebook%2Freact`).
    pub fn from_encoded(raw: &str) -> Result<Self> {
        let decoded = urlencoding::decode(raw)
            .map_err(|e| RepoLensError::InvalidIdentifier(format!("{}: {}", raw, e)))?;
        Self::new(decoded.trim())
    }

    pub fn new(id: &str) -> Result<Self> {
        if id.is_empty() {
            return Err(RepoLensError::InvalidIdentifier(
                "repository identifier is empty".to_string(),
            ));
        }
        // Dot segments would be normalized away by the URL parser.
        if id
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return Err(RepoLensError::InvalidIdentifier(format!(
                "{}: empty or relative path segment",
                id
            )));
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path form with each `/`-separated segment percent-encoded.
    pub fn api_path(&self) -> String {
        self.0
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl fmt::Display for RepositoryIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Issue lifecycle filter, sent as the `state` query parameter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum IssueFilter {
    #[default]
    All,
    Open,
    Closed,
}

impl IssueFilter {
    pub const ALL: [IssueFilter; 3] = [IssueFilter::All, IssueFilter::Open, IssueFilter::Closed];

    pub fn as_api_str(&self) -> &'static str {
        match self {
            IssueFilter::All => "all",
            IssueFilter::Open => "open",
            IssueFilter::Closed => "closed",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            IssueFilter::All => IssueFilter::Open,
            IssueFilter::Open => IssueFilter::Closed,
            IssueFilter::Closed => IssueFilter::All,
        }
    }
}

impl fmt::Display for IssueFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueFilter::All => write!(f, "All"),
            IssueFilter::Open => write!(f, "Open"),
            IssueFilter::Closed => write!(f, "Closed"),
        }
    }
}

/// Parameters of one issue list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IssueQuery {
    pub filter: IssueFilter,
    /// 1-based.
    pub page: u32,
}

impl IssueQuery {
    pub fn first_page(filter: IssueFilter) -> Self {
        Self { filter, page: 1 }
    }

    pub fn with_page(self, page: u32) -> Self {
        Self { page, ..self }
    }

    pub fn query_pairs(&self) -> [(&'static str, String); 3] {
        [
            ("state", self.filter.as_api_str().to_string()),
            ("per_page", PER_PAGE.to_string()),
            ("page", self.page.to_string()),
        ]
    }
}

impl Default for IssueQuery {
    fn default() -> Self {
        Self::first_page(IssueFilter::default())
    }
}

impl fmt::Display for IssueQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "state={}&per_page={}&page={}",
            self.filter.as_api_str(),
            PER_PAGE,
            self.page
        )
    }
}

/// Login and avatar of a repository owner or issue author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub login: String,
    pub avatar_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryMetadata {
    pub name: String,
    pub description: Option<String>,
    pub owner: Account,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: u64,
    pub name: String,
}

/// One entry of an issue list page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub id: u64,
    pub number: u64,
    pub title: String,
    pub html_url: String,
    pub author: Account,
    pub labels: Vec<Label>,
    /// The issues endpoint also lists pull requests.
    pub pull_request: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A fetched issue list together with the query that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssuePage {
    pub query: IssueQuery,
    pub issues: Vec<IssueRecord>,
}

impl IssuePage {
    pub fn new(query: IssueQuery, issues: Vec<IssueRecord>) -> Self {
        Self { query, issues }
    }

    pub fn is_full(&self) -> bool {
        page_is_full(self.issues.len())
    }
}
