//! Markdown report and README block patching.

use crate::age;
use crate::satellite::SatelliteGroup;
use crate::stats::{ContributorTally, LanguageTally, Repository};
use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

pub const BLOCK_START: &str = "<!-- ORG-STATS:START -->";
pub const BLOCK_END: &str = "<!-- ORG-STATS:END -->";

pub const RECENT_LIMIT: usize = 10;
pub const LANGUAGE_LIMIT: usize = 10;
pub const CONTRIBUTOR_LIMIT: usize = 10;

/// Everything the report block is built from.
pub struct ReportInput<'a> {
    pub repos: &'a [Repository],
    pub languages: &'a LanguageTally,
    pub contributors: &'a ContributorTally,
    pub groups: &'a [SatelliteGroup<'a>],
    /// Chart location as it should appear in the README.
    pub chart_path: &'a str,
    pub now: DateTime<Utc>,
}

/// Most recently pushed first; repos that were never pushed go last.
pub fn recent_repos(repos: &[Repository], limit: usize) -> Vec<&Repository> {
    let mut sorted: Vec<&Repository> = repos.iter().collect();
    sorted.sort_by(|a, b| b.pushed_at.cmp(&a.pushed_at));
    sorted.truncate(limit);
    sorted
}

pub fn recent_repos_table(repos: &[Repository], limit: usize) -> String {
    let mut out = String::new();
    out.push_str("### 📦 Recently Active Repositories\n");
    out.push_str("| Repo | Pushed | Stars | Lang |\n");
    out.push_str("|------|--------|-------|------|\n");
    for r in recent_repos(repos, limit) {
        let pushed = r
            .pushed_at
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        let lang = r.language.as_deref().unwrap_or("-");
        let _ = writeln!(
            out,
            "| [{}]({}) | {} | ⭐ {} | {} |",
            r.name, r.html_url, pushed, r.stargazers_count, lang
        );
    }
    out.push('\n');
    out
}

pub fn language_section(tally: &LanguageTally, chart_path: &str) -> String {
    let mut out = String::new();
    out.push_str("### 🗣️ Language Summary (org-wide)\n");
    if tally.is_empty() {
        out.push_str("Language data could not be retrieved.\n\n");
        return out;
    }

    let total = tally.total();
    out.push_str("| Language | Bytes | Ratio |\n");
    out.push_str("|----------|-------|-------|\n");
    for (lang, bytes) in tally.most_common(LANGUAGE_LIMIT) {
        let ratio = if total > 0 {
            bytes as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        let _ = writeln!(out, "| {lang} | {bytes} | {ratio:.1}% |");
    }
    out.push('\n');
    let _ = writeln!(out, "See `{chart_path}` for the chart version.\n");
    out
}

pub fn contributors_section(tally: &ContributorTally) -> String {
    let mut out = String::new();
    out.push_str("### 🧑‍💻 Top Contributors (all repos)\n");
    let ranking = tally.most_common(CONTRIBUTOR_LIMIT);
    if ranking.is_empty() {
        out.push_str("No data available.\n\n");
        return out;
    }

    out.push_str("| User | Contributions |\n");
    out.push_str("|------|----------------|\n");
    for (login, count) in ranking {
        let _ = writeln!(out, "| @{login} | {count} |");
    }
    out.push('\n');
    out
}

pub fn satellite_section(groups: &[SatelliteGroup<'_>]) -> String {
    let mut out = String::new();
    out.push_str("### 🛰️ Satellite Projects\n");
    for group in groups.iter().filter(|g| !g.repos.is_empty()) {
        let _ = writeln!(out, "#### {}", group.name);
        let mut repos = group.repos.clone();
        repos.sort_by_cached_key(|r| r.name.to_lowercase());
        for r in repos {
            let _ = writeln!(out, "- [{}]({})", r.name, r.html_url);
        }
        out.push('\n');
    }
    out
}

/// Full body placed between the markers.
pub fn compose_block(input: &ReportInput<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "_Last updated: {} UTC_\n",
        input.now.format("%Y-%m-%d %H:%M")
    );
    let _ = writeln!(out, "- Total repositories: **{}**", input.repos.len());
    let _ = writeln!(
        out,
        "- Active in the last {} days: **{}**\n",
        age::ACTIVE_WINDOW_DAYS,
        age::count_active(input.repos, input.now)
    );
    out.push_str(&recent_repos_table(input.repos, RECENT_LIMIT));
    out.push_str(&language_section(input.languages, input.chart_path));
    out.push_str(&contributors_section(input.contributors));
    out.push_str(&satellite_section(input.groups));
    out
}

/// Replace whatever sits between the markers with `body`. Text outside the
/// markers, and the markers themselves, are kept byte for byte.
pub fn splice_block(original: &str, body: &str) -> Result<String> {
    let Some(start) = original.find(BLOCK_START) else {
        bail!("start marker {BLOCK_START} not found");
    };
    let head_end = start + BLOCK_START.len();
    let Some(rel_end) = original[head_end..].find(BLOCK_END) else {
        if original.contains(BLOCK_END) {
            bail!("end marker {BLOCK_END} appears before start marker {BLOCK_START}");
        }
        bail!("end marker {BLOCK_END} not found");
    };
    let tail_start = head_end + rel_end;

    let mut body = body.to_string();
    if !body.ends_with('\n') {
        body.push('\n');
    }

    Ok(format!(
        "{}\n{}{}",
        &original[..head_end],
        body,
        &original[tail_start..]
    ))
}

/// Patch the marker block in `path`. Returns whether the file was rewritten;
/// identical content is left alone so the mtime does not move.
pub fn update_file(path: &Path, body: &str) -> Result<bool> {
    let original = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let patched = splice_block(&original, body)
        .with_context(|| format!("Cannot update {}", path.display()))?;

    if patched == original {
        return Ok(false);
    }

    fs::write(path, patched).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}
