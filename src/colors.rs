use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const BUNDLED: &str = include_str!("../assets/lang_colors.json");

/// Accepts both `{"Rust": "#dea584"}` and the github-colors layout
/// `{"Rust": {"color": "#dea584", "url": "..."}}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ColorEntry {
    Plain(String),
    Detailed { color: Option<String> },
}

/// Language name to display color.
#[derive(Clone, Debug, Default)]
pub struct ColorTable {
    colors: HashMap<String, String>,
}

impl ColorTable {
    pub fn bundled() -> Result<Self> {
        Self::parse(BUNDLED).context("Bundled color table is invalid")
    }

    /// Load from `path`, or the bundled table when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => {
                let raw = fs::read_to_string(p)
                    .with_context(|| format!("Failed to read color table {}", p.display()))?;
                Self::parse(&raw)
                    .with_context(|| format!("Failed to parse color table {}", p.display()))
            }
            None => Self::bundled(),
        }
    }

    pub fn parse(json: &str) -> Result<Self> {
        let raw: HashMap<String, ColorEntry> = serde_json::from_str(json)?;
        let colors = raw
            .into_iter()
            .filter_map(|(lang, entry)| match entry {
                ColorEntry::Plain(c) => Some((lang, c)),
                ColorEntry::Detailed { color } => color.map(|c| (lang, c)),
            })
            .filter(|(_, c)| !c.trim().is_empty())
            .collect();
        Ok(Self { colors })
    }

    pub fn get(&self, language: &str) -> Option<&str> {
        self.colors.get(language).map(String::as_str)
    }
}
