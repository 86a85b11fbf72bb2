use crate::config::Config;
use crate::stats::{Contributor, Repository};
use anyhow::{Context, Result};
use async_trait::async_trait;
use indexmap::IndexMap;
use reqwest::{Client, RequestBuilder, StatusCode};
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Page size for both the repository listing and the contributor lookup.
pub const PER_PAGE: usize = 100;

const API_VERSION: &str = "2022-11-28";

/// Why a single REST call failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Read-only view of an organization on the hosting API.
#[async_trait]
pub trait OrgApi {
    /// One page of the organization's repositories (1-based page index).
    async fn repos_page(&self, org: &str, page: u32) -> Result<Vec<Repository>, FetchError>;

    /// Bytes per language for one repository.
    async fn repo_languages(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<IndexMap<String, u64>, FetchError>;

    /// First page of contributors for one repository.
    async fn repo_contributors(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<Contributor>, FetchError>;
}

#[derive(Clone)]
pub struct GithubClient {
    token: Arc<String>,
    base_url: Arc<String>,
    http: Arc<Client>,
}

impl GithubClient {
    /// Create a REST client from the run configuration.
    pub fn new(config: &Config) -> Result<Self> {
        if config.token.trim().is_empty() {
            anyhow::bail!("GITHUB_TOKEN is not set");
        }
        Ok(Self {
            token: Arc::new(config.token.clone()),
            base_url: Arc::new(config.api_url.clone()),
            http: Arc::new(Client::new()),
        })
    }

    /// Authenticated GET for `path` relative to the API root.
    fn request(&self, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "GET");

        self.http
            .get(url)
            .bearer_auth(&*self.token)
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .header(USER_AGENT, "org-stats")
    }

    async fn get_raw(&self, path: &str) -> Result<(StatusCode, String), FetchError> {
        let resp = self.request(path).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        Ok((status, body))
    }

    /// GET `path` and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let (status, body) = self.get_raw(path).await?;
        decode_response(status, &body)
    }
}

/// Map a finished response to data or a failure reason.
fn decode_response<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, FetchError> {
    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
            message: body.to_string(),
        });
    }

    Ok(serde_json::from_str(body)?)
}

/// Contributors answer 204 with no body for an empty repository.
fn decode_contributors(status: StatusCode, body: &str) -> Result<Vec<Contributor>, FetchError> {
    if status.is_success() && body.trim().is_empty() {
        return Ok(Vec::new());
    }
    decode_response(status, body)
}

#[async_trait]
impl OrgApi for GithubClient {
    async fn repos_page(&self, org: &str, page: u32) -> Result<Vec<Repository>, FetchError> {
        self.get_json(&format!("/orgs/{org}/repos?per_page={PER_PAGE}&page={page}"))
            .await
    }

    async fn repo_languages(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<IndexMap<String, u64>, FetchError> {
        self.get_json(&format!("/repos/{owner}/{repo}/languages"))
            .await
    }

    async fn repo_contributors(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<Contributor>, FetchError> {
        let (status, body) = self
            .get_raw(&format!(
                "/repos/{owner}/{repo}/contributors?per_page={PER_PAGE}"
            ))
            .await?;
        decode_contributors(status, &body)
    }
}

/// Follow numbered pages until one comes back empty or short.
pub async fn collect_pages<T, F, Fut>(per_page: usize, mut fetch_page: F) -> Result<Vec<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Vec<T>, FetchError>>,
{
    let mut out = Vec::new();
    let mut page = 1u32;

    loop {
        let items = fetch_page(page)
            .await
            .with_context(|| format!("Failed to fetch page {page}"))?;
        let len = items.len();
        tracing::debug!(page, len, "fetched page");

        out.extend(items);
        if len < per_page {
            break;
        }
        page += 1;
    }

    Ok(out)
}

/// Every repository of `org`. Any page failure aborts the listing.
pub async fn list_org_repos<A: OrgApi + Sync>(api: &A, org: &str) -> Result<Vec<Repository>> {
    collect_pages(PER_PAGE, |page| api.repos_page(org, page))
        .await
        .with_context(|| format!("Failed to list repositories for org {org}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeOrg;
    use std::cell::Cell;

    fn status(code: u16) -> FetchError {
        FetchError::Status {
            status: code,
            message: String::new(),
        }
    }

    #[tokio::test]
    async fn stops_after_short_page() {
        let calls = Cell::new(0u32);
        let out = collect_pages(3, |page| {
            calls.set(calls.get() + 1);
            async move {
                Ok(match page {
                    1 => vec![1, 2, 3],
                    2 => vec![4],
                    _ => panic!("should not request page {page}"),
                })
            }
        })
        .await
        .unwrap();

        assert_eq!(out, vec![1, 2, 3, 4]);
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test]
    async fn stops_on_empty_page_after_full_ones() {
        let out = collect_pages(2, |page| async move {
            Ok(if page <= 2 { vec![page, page] } else { vec![] })
        })
        .await
        .unwrap();

        assert_eq!(out, vec![1, 1, 2, 2]);
    }

    #[tokio::test]
    async fn page_error_aborts_listing() {
        let err = collect_pages(2, |page| async move {
            if page == 2 { Err(status(502)) } else { Ok(vec![0u8, 0]) }
        })
        .await
        .unwrap_err();

        assert!(format!("{err:#}").contains("page 2"));
        assert!(format!("{err:#}").contains("HTTP 502"));
    }

    #[tokio::test]
    async fn lists_repos_through_org_api() {
        let api = FakeOrg::default().with_page(&["ymg-obc", "sakura-gs", "website"]);

        let repos = list_org_repos(&api, "gardens").await.unwrap();

        let names: Vec<&str> = repos.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["ymg-obc", "sakura-gs", "website"]);
    }

    #[test]
    fn repository_decodes_from_api_json() {
        let repos: Vec<Repository> = serde_json::from_str(
            r#"[{
                "id": 1, "name": "ymg-obc", "html_url": "https://github.com/gardens/ymg-obc",
                "pushed_at": "2024-03-01T17:45:12Z", "stargazers_count": 4, "language": "Rust"
            }, {
                "id": 2, "name": "empty", "html_url": "https://github.com/gardens/empty",
                "pushed_at": null, "stargazers_count": 0, "language": null
            }]"#,
        )
        .unwrap();

        assert_eq!(repos[0].language.as_deref(), Some("Rust"));
        assert!(repos[0].pushed_at.is_some());
        assert!(repos[1].pushed_at.is_none());
    }

    fn test_config(token: &str) -> Config {
        Config {
            org: "gardens".into(),
            token: token.into(),
            api_url: "https://ghe.example.com/api/v3".into(),
            readme_path: "README.md".into(),
            chart_path: "assets/langs.svg".into(),
            colors_path: None,
        }
    }

    #[test]
    fn requests_carry_auth_and_version_headers() {
        let client = GithubClient::new(&test_config("secret")).unwrap();
        let req = client.request("/repos/gardens/ymg-obc/languages").build().unwrap();

        assert_eq!(
            req.url().as_str(),
            "https://ghe.example.com/api/v3/repos/gardens/ymg-obc/languages"
        );
        let header = |name: &str| req.headers().get(name).and_then(|v| v.to_str().ok());
        assert_eq!(header("authorization"), Some("Bearer secret"));
        assert_eq!(header("x-github-api-version"), Some(API_VERSION));
        assert_eq!(header("accept"), Some("application/vnd.github+json"));
        assert_eq!(header("user-agent"), Some("org-stats"));
    }

    #[test]
    fn success_body_decodes_languages_in_host_order() {
        let langs: IndexMap<String, u64> =
            decode_response(StatusCode::OK, r#"{"Rust": 1200, "C#": 300, "Shell": 12}"#).unwrap();

        let keys: Vec<&str> = langs.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Rust", "C#", "Shell"]);
        assert_eq!(langs["C#"], 300);
    }

    #[test]
    fn error_status_keeps_code_and_body() {
        let err = decode_response::<IndexMap<String, u64>>(
            StatusCode::NOT_FOUND,
            r#"{"message": "Not Found"}"#,
        )
        .unwrap_err();

        match err {
            FetchError::Status { status, message } => {
                assert_eq!(status, 404);
                assert!(message.contains("Not Found"));
            }
            other => panic!("expected status error, got {other}"),
        }
    }

    #[test]
    fn garbage_body_is_a_decode_error() {
        let err = decode_response::<Vec<Repository>>(StatusCode::OK, "<html>oops</html>")
            .unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn empty_contributor_response_means_no_contributors() {
        assert!(decode_contributors(StatusCode::NO_CONTENT, "").unwrap().is_empty());

        let list = decode_contributors(
            StatusCode::OK,
            r#"[{"login": "alice", "contributions": 7}, {"type": "Anonymous", "contributions": 2}]"#,
        )
        .unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].login.as_deref(), Some("alice"));
        assert!(list[1].login.is_none());
    }

    #[test]
    fn contributor_errors_other_than_empty_body_propagate() {
        assert!(matches!(
            decode_contributors(StatusCode::FORBIDDEN, ""),
            Err(FetchError::Status { status: 403, .. })
        ));
        assert!(matches!(
            decode_contributors(StatusCode::OK, "[{\"login\": "),
            Err(FetchError::Decode(_))
        ));
    }

    #[test]
    fn client_requires_token() {
        let cfg = Config {
            org: "gardens".into(),
            token: " ".into(),
            api_url: crate::config::DEFAULT_API_URL.into(),
            readme_path: "README.md".into(),
            chart_path: "assets/langs.svg".into(),
            colors_path: None,
        };
        assert!(GithubClient::new(&cfg).is_err());
    }
}
