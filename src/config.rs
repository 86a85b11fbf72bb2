use anyhow::{Result, bail};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_README_PATH: &str = "README.md";
pub const DEFAULT_LANG_SVG_PATH: &str = "assets/langs.svg";

/// Run configuration, read once at startup and handed to every stage.
#[derive(Clone, Debug)]
pub struct Config {
    pub org: String,
    pub token: String,
    pub api_url: String,
    pub readme_path: PathBuf,
    pub chart_path: PathBuf,
    /// External color table; the bundled one is used when unset.
    pub colors_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let Some(org) = get("ORG_NAME") else {
            bail!("ORG_NAME is not set");
        };
        let Some(token) = get("GITHUB_TOKEN") else {
            bail!("GITHUB_TOKEN is not set");
        };

        Ok(Self {
            org,
            token,
            api_url: get("GITHUB_API_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            readme_path: get("README_PATH")
                .unwrap_or_else(|| DEFAULT_README_PATH.to_string())
                .into(),
            chart_path: get("LANG_SVG_PATH")
                .unwrap_or_else(|| DEFAULT_LANG_SVG_PATH.to_string())
                .into(),
            colors_path: get("LANG_COLORS_PATH").map(PathBuf::from),
        })
    }
}
