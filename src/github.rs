use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ApiError, RepoLensError, Result};
use crate::source::IssueSource;
use crate::types::{
    Account, IssueQuery, IssueRecord, Label, RepositoryIdentifier, RepositoryMetadata,
};

pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

pub struct GitHub {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for GitHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHub")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GitHub {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("repolens/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| RepoLensError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> std::result::Result<T, ApiError> {
        let url = self.api_url(path);
        debug!(%url, ?query, "GET");

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ApiError::Http {
                status: status.as_u16(),
                message: error_message(&text, status.canonical_reason()),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Prefer the `message` field of a GitHub error body.
fn error_message(body: &str, reason: Option<&str>) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()))
        .or_else(|| reason.map(str::to_string))
        .unwrap_or_else(|| "unknown error".to_string())
}

// GitHub API response types

#[derive(Deserialize)]
struct GhRepo {
    name: String,
    description: Option<String>,
    owner: GhUser,
}

#[derive(Deserialize)]
struct GhUser {
    login: String,
    #[serde(default)]
    avatar_url: String,
}

#[derive(Deserialize)]
struct GhIssue {
    id: u64,
    #[serde(default)]
    number: u64,
    title: String,
    html_url: String,
    user: Option<GhUser>,
    #[serde(default)]
    labels: Vec<GhLabel>,
    pull_request: Option<serde_json::Value>,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct GhLabel {
    id: u64,
    name: String,
}

impl From<GhUser> for Account {
    fn from(user: GhUser) -> Self {
        Account {
            login: user.login,
            avatar_url: user.avatar_url,
        }
    }
}

impl From<GhIssue> for IssueRecord {
    fn from(issue: GhIssue) -> Self {
        IssueRecord {
            id: issue.id,
            number: issue.number,
            title: issue.title,
            html_url: issue.html_url,
            author: issue.user.map(Account::from).unwrap_or_else(|| Account {
                login: "ghost".to_string(),
                avatar_url: String::new(),
            }),
            labels: issue
                .labels
                .into_iter()
                .map(|l| Label {
                    id: l.id,
                    name: l.name,
                })
                .collect(),
            pull_request: issue.pull_request.is_some_and(|v| !v.is_null()),
            updated_at: issue.updated_at,
        }
    }
}

#[async_trait]
impl IssueSource for GitHub {
    fn name(&self) -> &str {
        "GitHub"
    }

    async fn get_repository(
        &self,
        id: &RepositoryIdentifier,
    ) -> std::result::Result<RepositoryMetadata, ApiError> {
        let repo: GhRepo = self
            .get_json(&format!("/repos/{}", id.api_path()), &[])
            .await?;

        Ok(RepositoryMetadata {
            name: repo.name,
            description: repo.description,
            owner: repo.owner.into(),
        })
    }

    async fn list_issues(
        &self,
        id: &RepositoryIdentifier,
        query: IssueQuery,
    ) -> std::result::Result<Vec<IssueRecord>, ApiError> {
        let issues: Vec<GhIssue> = self
            .get_json(
                &format!("/repos/{}/issues", id.api_path()),
                &query.query_pairs(),
            )
            .await?;

        Ok(issues.into_iter().map(IssueRecord::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IssueFilter;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, token: Option<&str>) -> GitHub {
        GitHub::new(
            &server.uri(),
            token.map(str::to_string),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn repo_id(id: &str) -> RepositoryIdentifier {
        RepositoryIdentifier::new(id).unwrap()
    }

    fn mock_issue(id: u64, title: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "number": id - 1000,
            "title": title,
            "html_url": format!("https://github.com/facebook/react/issues/{}", id - 1000),
            "state": "open",
            "user": {"login": "gaearon", "avatar_url": "https://avatars.example/gaearon"},
            "labels": [
                {"id": 1, "name": "Type: Bug", "color": "b60205"},
                {"id": 2, "name": "Status: Unconfirmed", "color": "d4c5f9"}
            ],
            "updated_at": "2024-01-15T12:00:00Z"
        })
    }

    #[tokio::test]
    async fn get_repository_maps_metadata() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/facebook/react"))
            .and(header("Authorization", "Bearer test-token"))
            .and(header("Accept", "application/vnd.github+json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 10270250,
                "name": "react",
                "full_name": "facebook/react",
                "description": "The library for web and native user interfaces.",
                "owner": {"login": "facebook", "avatar_url": "https://avatars.example/facebook"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let github = client(&server, Some("test-token"));
        let repo = github.get_repository(&repo_id("facebook/react")).await.unwrap();

        assert_eq!(repo.name, "react");
        assert_eq!(
            repo.description.as_deref(),
            Some("The library for web and native user interfaces.")
        );
        assert_eq!(repo.owner.login, "facebook");
        assert_eq!(repo.owner.avatar_url, "https://avatars.example/facebook");
    }

    #[tokio::test]
    async fn list_issues_sends_state_page_size_and_page() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/facebook/react/issues"))
            .and(query_param("state", "closed"))
            .and(query_param("per_page", "5"))
            .and(query_param("page", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                mock_issue(1001, "Crash on mount"),
                mock_issue(1002, "Docs typo"),
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let github = client(&server, None);
        let query = IssueQuery::first_page(IssueFilter::Closed).with_page(3);
        let issues = github
            .list_issues(&repo_id("facebook/react"), query)
            .await
            .unwrap();

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].id, 1001);
        assert_eq!(issues[0].number, 1);
        assert_eq!(issues[0].title, "Crash on mount");
        assert_eq!(issues[0].author.login, "gaearon");
        let labels: Vec<_> = issues[0].labels.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(labels, ["Type: Bug", "Status: Unconfirmed"]);
        assert!(!issues[0].pull_request);
        assert!(issues[0].updated_at.is_some());
    }

    #[tokio::test]
    async fn pull_requests_are_flagged_not_dropped() {
        let server = MockServer::start().await;

        let mut pr = mock_issue(1003, "Add feature");
        pr["pull_request"] = serde_json::json!({"url": "https://api.github.com/repos/facebook/react/pulls/3"});

        Mock::given(method("GET"))
            .and(path("/repos/facebook/react/issues"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([mock_issue(1001, "Bug"), pr])),
            )
            .mount(&server)
            .await;

        let github = client(&server, None);
        let issues = github
            .list_issues(&repo_id("facebook/react"), IssueQuery::default())
            .await
            .unwrap();

        assert_eq!(issues.len(), 2);
        assert!(!issues[0].pull_request);
        assert!(issues[1].pull_request);
    }

    #[tokio::test]
    async fn reserved_characters_are_reencoded_in_path() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/owner/my%20repo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "my repo",
                "description": null,
                "owner": {"login": "owner", "avatar_url": ""}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let github = client(&server, None);
        let id = RepositoryIdentifier::from_encoded("owner%2Fmy%20repo").unwrap();
        let repo = github.get_repository(&id).await.unwrap();

        assert_eq!(repo.name, "my repo");
        assert!(repo.description.is_none());
    }

    #[tokio::test]
    async fn non_success_status_is_http_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/nobody/nothing/issues"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "message": "Not Found",
                "documentation_url": "https://docs.github.com/rest"
            })))
            .mount(&server)
            .await;

        let github = client(&server, None);
        let err = github
            .list_issues(&repo_id("nobody/nothing"), IssueQuery::default())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ApiError::Http {
                status: 404,
                message: "Not Found".to_string()
            }
        );
    }

    #[tokio::test]
    async fn malformed_body_is_decode_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/facebook/react"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let github = client(&server, None);
        let err = github
            .get_repository(&repo_id("facebook/react"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        let github = GitHub::new("http://127.0.0.1:1", None, Duration::from_secs(2)).unwrap();
        let err = github
            .get_repository(&repo_id("facebook/react"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Network(_)));
    }

    #[test]
    fn error_message_falls_back_to_reason() {
        assert_eq!(error_message("", Some("Forbidden")), "Forbidden");
        assert_eq!(error_message("rate limited", None), "rate limited");
        assert_eq!(
            error_message(r#"{"message":"Bad credentials"}"#, None),
            "Bad credentials"
        );
    }
}
