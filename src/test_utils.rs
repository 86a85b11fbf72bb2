//! In-memory `OrgApi` for tests.

use crate::github::{FetchError, OrgApi};
use crate::stats::{Contributor, Repository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A repository with only a name set; everything else blank.
pub fn repo(name: &str) -> Repository {
    Repository {
        name: name.to_string(),
        html_url: format!("https://github.com/gardens/{name}"),
        pushed_at: None,
        stargazers_count: 0,
        language: None,
    }
}

pub fn pushed_repo(name: &str, pushed_at: Option<&str>) -> Repository {
    Repository {
        pushed_at: pushed_at.map(|s| {
            DateTime::parse_from_rfc3339(s)
                .unwrap()
                .with_timezone(&Utc)
        }),
        ..repo(name)
    }
}

#[derive(Default)]
pub struct FakeOrg {
    pages: Vec<Vec<Repository>>,
    languages: HashMap<String, IndexMap<String, u64>>,
    contributors: HashMap<String, Vec<Contributor>>,
    failing: HashSet<String>,
    contributor_calls: AtomicUsize,
}

impl FakeOrg {
    pub fn with_page(mut self, names: &[&str]) -> Self {
        self.pages.push(names.iter().map(|n| repo(n)).collect());
        self
    }

    pub fn with_languages(mut self, repo: &str, langs: &[(&str, u64)]) -> Self {
        self.languages.insert(
            repo.to_string(),
            langs.iter().map(|(l, b)| (l.to_string(), *b)).collect(),
        );
        self
    }

    pub fn with_contributors(mut self, repo: &str, people: &[(Option<&str>, u64)]) -> Self {
        self.contributors.insert(
            repo.to_string(),
            people
                .iter()
                .map(|(login, n)| Contributor {
                    login: login.map(str::to_string),
                    contributions: *n,
                })
                .collect(),
        );
        self
    }

    /// Every per-repo lookup for `repo` answers 404.
    pub fn failing(mut self, repo: &str) -> Self {
        self.failing.insert(repo.to_string());
        self
    }

    /// How many contributor lookups were made.
    pub fn contributor_calls(&self) -> usize {
        self.contributor_calls.load(Ordering::SeqCst)
    }

    fn check(&self, repo: &str) -> Result<(), FetchError> {
        if self.failing.contains(repo) {
            return Err(FetchError::Status {
                status: 404,
                message: "Not Found".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl OrgApi for FakeOrg {
    async fn repos_page(&self, _org: &str, page: u32) -> Result<Vec<Repository>, FetchError> {
        Ok(self
            .pages
            .get(page as usize - 1)
            .cloned()
            .unwrap_or_default())
    }

    async fn repo_languages(
        &self,
        _owner: &str,
        repo: &str,
    ) -> Result<IndexMap<String, u64>, FetchError> {
        self.check(repo)?;
        Ok(self.languages.get(repo).cloned().unwrap_or_default())
    }

    async fn repo_contributors(
        &self,
        _owner: &str,
        repo: &str,
    ) -> Result<Vec<Contributor>, FetchError> {
        self.contributor_calls.fetch_add(1, Ordering::SeqCst);
        self.check(repo)?;
        Ok(self.contributors.get(repo).cloned().unwrap_or_default())
    }
}
