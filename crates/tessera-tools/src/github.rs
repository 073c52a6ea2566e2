use anyhow::{bail, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://api.github.com";
const NOTES_EXCERPT_LIMIT: usize = 600;

/// Client for the GitHub REST releases endpoint.
pub struct GithubClient {
    http_client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
    name: Option<String>,
    published_at: Option<String>,
    body: Option<String>,
}

impl GithubClient {
    pub fn new() -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        // GitHub rejects requests without a User-Agent.
        headers.insert(USER_AGENT, HeaderValue::from_static("tessera"));

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http_client,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetches the latest release of a repository as a plain-text summary.
    pub async fn latest_release(&self, owner: &str, repo: &str) -> Result<String> {
        let url = format!(
            "{}/repos/{}/{}/releases/latest",
            self.base_url, owner, repo
        );
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Release lookup failed for {}/{}", owner, repo))?;

        if !response.status().is_success() {
            let status = response.status();
            bail!("GitHub API error ({}) for {}/{}", status, owner, repo);
        }

        let release: Release = response
            .json()
            .await
            .context("Failed to parse GitHub release response")?;

        Ok(format_release(owner, repo, &release))
    }
}

fn format_release(owner: &str, repo: &str, release: &Release) -> String {
    let mut out = format!("Latest release of {}/{}: {}", owner, repo, release.tag_name);
    if let Some(name) = &release.name {
        if !name.is_empty() && name != &release.tag_name {
            out.push_str(&format!(" ({})", name));
        }
    }
    if let Some(published_at) = &release.published_at {
        out.push_str(&format!("\nPublished: {}", published_at));
    }
    if let Some(body) = &release.body {
        let trimmed = body.trim();
        if !trimmed.is_empty() {
            out.push_str("\nNotes:\n");
            out.push_str(&excerpt(trimmed, NOTES_EXCERPT_LIMIT));
        }
    }
    out
}

fn excerpt(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let cut: String = text.chars().take(limit).collect();
    format!("{}...", cut.trim_end())
}
