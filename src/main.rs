mod age;
mod colors;
mod config;
mod github;
mod report;
mod satellite;
mod stats;
mod svg;

#[cfg(test)]
mod test_utils;

use anyhow::Result;
use chrono::Utc;
use colors::ColorTable;
use config::Config;
use github::GithubClient;
use report::ReportInput;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

async fn run() -> Result<()> {
    let config = Config::from_env()?;
    let client = GithubClient::new(&config)?;
    let colors = ColorTable::load(config.colors_path.as_deref())?;

    tracing::info!(org = %config.org, "Fetching repos");
    let repos = github::list_org_repos(&client, &config.org).await?;
    if repos.is_empty() {
        tracing::warn!(org = %config.org, "No repos found, nothing to update");
        return Ok(());
    }
    tracing::info!(count = repos.len(), "Fetched repos");

    tracing::info!("Aggregating languages");
    let languages = stats::aggregate_languages(&client, &config.org, &repos).await;
    tracing::info!(languages = languages.len(), bytes = languages.total(), "Languages aggregated");
    svg::save_language_chart(&languages, &colors, &config.chart_path)?;
    tracing::info!(path = %config.chart_path.display(), "Saved language chart");

    tracing::info!("Aggregating contributors");
    let contributors = stats::aggregate_contributors(&client, &config.org, &repos).await;
    tracing::info!(contributors = contributors.len(), "Contributors aggregated");

    let groups = satellite::group_by_satellite(&repos);

    let chart_path = config.chart_path.to_string_lossy().replace('\\', "/");
    let body = report::compose_block(&ReportInput {
        repos: &repos,
        languages: &languages,
        contributors: &contributors,
        groups: &groups,
        chart_path: &chart_path,
        now: Utc::now(),
    });

    if report::update_file(&config.readme_path, &body)? {
        tracing::info!(path = %config.readme_path.display(), "README updated");
    } else {
        tracing::info!(path = %config.readme_path.display(), "README unchanged");
    }

    Ok(())
}
