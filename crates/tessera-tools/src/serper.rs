use anyhow::{bail, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;

const DEFAULT_BASE_URL: &str = "https://google.serper.dev";

/// Client for the Serper Google-search API.
pub struct SerperClient {
    http_client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    organic: Option<Vec<OrganicResult>>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    title: String,
    link: String,
    snippet: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    images: Option<Vec<ImageResult>>,
}

#[derive(Debug, Deserialize)]
struct ImageResult {
    #[serde(rename = "imageUrl")]
    image_url: String,
}

impl SerperClient {
    pub fn new(api_key: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "X-API-KEY",
            HeaderValue::from_str(api_key).context("Invalid Serper API key format")?,
        );

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

    /// Web search, formatted as a plain-text result list.
    pub async fn search(&self, query: &str) -> Result<String> {
        let url = format!("{}/search", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .json(&json!({"q": query}))
            .send()
            .await
            .with_context(|| format!("Web search failed for {:?}", query))?;

        if !response.status().is_success() {
            let status = response.status();
            bail!("Serper API error ({}) for query {:?}", status, query);
        }

        let body: SearchResponse = response
            .json()
            .await
            .context("Failed to parse Serper search response")?;

        let results = body.organic.unwrap_or_default();
        if results.is_empty() {
            return Ok("No results found.".to_string());
        }

        Ok(format_organic_results(&results))
    }

    /// Image search, returning the first hit's URL if any.
    pub async fn search_image(&self, query: &str) -> Result<Option<String>> {
        let url = format!("{}/images", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .json(&json!({"q": query}))
            .send()
            .await
            .with_context(|| format!("Image search failed for {:?}", query))?;

        if !response.status().is_success() {
            let status = response.status();
            bail!("Serper API error ({}) for image query {:?}", status, query);
        }

        let body: ImagesResponse = response
            .json()
            .await
            .context("Failed to parse Serper image response")?;

        Ok(body
            .images
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(|image| image.image_url))
    }
}

fn format_organic_results(results: &[OrganicResult]) -> String {
    let mut out = String::new();
    for (i, result) in results.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&format!("{}. {}\n   {}\n", i + 1, result.title, result.link));
        if let Some(snippet) = &result.snippet {
            out.push_str(&format!("   {}\n", snippet));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_numbered_results_with_snippets() {
        let results = vec![
            OrganicResult {
                title: "Rust".to_string(),
                link: "https://rust-lang.org".to_string(),
                snippet: Some("A systems language.".to_string()),
            },
            OrganicResult {
                title: "Crates".to_string(),
                link: "https://crates.io".to_string(),
                snippet: None,
            },
        ];
        let text = format_organic_results(&results);
        assert!(text.starts_with("1. Rust\n   https://rust-lang.org\n   A systems language.\n"));
        assert!(text.contains("2. Crates\n   https://crates.io\n"));
    }

    #[test]
    fn parses_image_response_shape() {
        let body: ImagesResponse = serde_json::from_str(
            r#"{"images":[{"imageUrl":"https://example.com/a.png","title":"A"}]}"#,
        )
        .unwrap();
        assert_eq!(
            body.images.unwrap()[0].image_url,
            "https://example.com/a.png"
        );
    }
}
