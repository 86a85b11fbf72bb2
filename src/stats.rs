use crate::github::{OrgApi, PER_PAGE};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Deserialize;

/// Repository metadata as returned by the org listing.
#[derive(Clone, Debug, Deserialize)]
pub struct Repository {
    pub name: String,
    pub html_url: String,
    pub pushed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub stargazers_count: u64,
    pub language: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Contributor {
    /// Anonymous contributors come back without a login.
    pub login: Option<String>,
    #[serde(default)]
    pub contributions: u64,
}

/// Running sum keyed by category. Keys keep first-seen order so that a
/// stable sort by count breaks ties the way the host returned them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tally(IndexMap<String, u64>);

pub type LanguageTally = Tally;
pub type ContributorTally = Tally;

impl Tally {
    pub fn add(&mut self, key: &str, amount: u64) {
        let slot = self.0.entry(key.to_string()).or_insert(0);
        *slot = slot.saturating_add(amount);
    }

    pub fn total(&self) -> u64 {
        self.0.values().fold(0u64, |acc, v| acc.saturating_add(*v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The `n` largest entries, count descending, ties in first-seen order.
    pub fn most_common(&self, n: usize) -> Vec<(&str, u64)> {
        let mut entries: Vec<(&str, u64)> =
            self.0.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.truncate(n);
        entries
    }
}

#[cfg(test)]
impl Tally {
    pub fn get(&self, key: &str) -> u64 {
        self.0.get(key).copied().unwrap_or(0)
    }
}

impl<K: Into<String>> FromIterator<(K, u64)> for Tally {
    fn from_iter<I: IntoIterator<Item = (K, u64)>>(iter: I) -> Self {
        let mut tally = Tally::default();
        for (k, v) in iter {
            tally.add(&k.into(), v);
        }
        tally
    }
}

/// Sum language bytes across all repos. A repo whose lookup fails counts as empty.
pub async fn aggregate_languages<A: OrgApi + Sync>(
    api: &A,
    owner: &str,
    repos: &[Repository],
) -> LanguageTally {
    let mut tally = LanguageTally::default();

    for repo in repos {
        match api.repo_languages(owner, &repo.name).await {
            Ok(langs) => {
                for (lang, bytes) in &langs {
                    tally.add(lang, *bytes);
                }
            }
            Err(e) => {
                tracing::warn!(repo = %repo.name, "languages unavailable, counting as empty: {e}");
            }
        }
    }

    tally
}

/// A full first page means the repo may have more contributors than were counted.
fn page_is_full(len: usize) -> bool {
    len >= PER_PAGE
}

/// Sum contributions per login across all repos (first contributor page only).
pub async fn aggregate_contributors<A: OrgApi + Sync>(
    api: &A,
    owner: &str,
    repos: &[Repository],
) -> ContributorTally {
    let mut tally = ContributorTally::default();

    for repo in repos {
        let contributors = match api.repo_contributors(owner, &repo.name).await {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(repo = %repo.name, "contributors unavailable, counting as empty: {e}");
                continue;
            }
        };

        if page_is_full(contributors.len()) {
            tracing::warn!(
                repo = %repo.name,
                "contributor page is full, contributors beyond {PER_PAGE} are not counted"
            );
        }

        for c in contributors {
            if let Some(login) = c.login.as_deref().filter(|l| !l.is_empty()) {
                tally.add(login, c.contributions);
            }
        }
    }

    tally
}
