//! Live adapter for the `IssueSource` port using the GitHub REST API.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::model::{ItemType, RemoteItem};
use crate::ports::tracker::IssueSource;
use crate::ports::{PortError, PortFuture};

const GITHUB_API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("issue-mirror/", env!("CARGO_PKG_VERSION"));

/// Items requested per page (the API maximum).
pub const PER_PAGE: usize = 100;

/// Upper bound on pages fetched per call.
pub const MAX_PAGES: u32 = 50;

/// Lists open issues and pull requests of one GitHub repository.
pub struct GitHubIssueSource {
    client: Client,
    api_base: String,
    owner: String,
    repo: String,
    token: Option<String>,
}

impl GitHubIssueSource {
    /// Creates a source for `owner/repo` against the API at `api_base`.
    #[must_use]
    pub fn new(
        api_base: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            owner: owner.into(),
            repo: repo.into(),
            token,
        }
    }

    fn endpoint(&self, item_type: ItemType) -> String {
        let path = match item_type {
            ItemType::Issue => "issues",
            ItemType::PullRequest => "pulls",
        };
        format!("{}/repos/{}/{}/{path}", self.api_base, self.owner, self.repo)
    }

    async fn fetch_page(&self, url: &str, page: u32) -> Result<Vec<GitHubItem>, PortError> {
        let per_page = PER_PAGE.to_string();
        let page = page.to_string();
        let mut request = self
            .client
            .get(url)
            .query(&[("state", "open"), ("per_page", per_page.as_str()), ("page", page.as_str())])
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .header("User-Agent", USER_AGENT);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| -> PortError { format!("GitHub request failed: {e}").into() })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let msg = serde_json::from_str::<GitHubError>(&body).map(|e| e.message).unwrap_or(body);
            return Err(format!("GitHub API error ({}): {msg}", status.as_u16()).into());
        }

        response
            .json::<Vec<GitHubItem>>()
            .await
            .map_err(|e| -> PortError { format!("Failed to parse GitHub response: {e}").into() })
    }
}

/// An issue or pull request as returned by the list endpoints.
#[derive(Deserialize)]
struct GitHubItem {
    number: u64,
    title: String,
    html_url: String,
    #[serde(default)]
    body: Option<String>,
    user: GitHubUser,
    created_at: DateTime<Utc>,
    #[serde(default)]
    labels: Vec<GitHubLabel>,
    /// Present only on pull requests listed through `/issues`.
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct GitHubUser {
    login: String,
}

#[derive(Deserialize)]
struct GitHubLabel {
    name: String,
}

#[derive(Deserialize)]
struct GitHubError {
    message: String,
}

impl From<GitHubItem> for RemoteItem {
    fn from(item: GitHubItem) -> Self {
        Self {
            number: item.number,
            title: item.title,
            url: item.html_url,
            body: item.body,
            author: item.user.login,
            created_at: item.created_at,
            labels: item.labels.into_iter().map(|l| l.name).collect(),
        }
    }
}

impl IssueSource for GitHubIssueSource {
    fn fetch_open(&self, item_type: ItemType) -> PortFuture<'_, Vec<RemoteItem>> {
        Box::pin(async move {
            let url = self.endpoint(item_type);
            let mut items = Vec::new();

            for page in 1..=MAX_PAGES {
                let batch = self.fetch_page(&url, page).await?;
                let last_page = batch.len() < PER_PAGE;
                items.extend(
                    batch
                        .into_iter()
                        .filter(|item| item_type != ItemType::Issue || item.pull_request.is_none())
                        .map(RemoteItem::from),
                );
                if last_page {
                    tracing::debug!(%item_type, count = items.len(), "fetched open items");
                    return Ok(items);
                }
            }

            // A truncated listing would make every item past the cap look closed.
            Err(format!("open {item_type} listing exceeds {MAX_PAGES} pages").into())
        })
    }
}
