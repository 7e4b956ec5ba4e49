// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Sequential list, README, summarize and write pipeline.
///
/// Each repository is fully processed before the next one starts. README and
/// summary failures degrade the record instead of dropping it, so the output
/// always holds one record per listed repository.
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use crate::{
    config::RepositorySelection,
    error::Error,
    github::{RepositoryHost, list_repositories},
    output::{OutputSettings, WriteReport, write_records},
    record::{RepositoryRecord, SummaryOutcome, SummaryRecord},
    summarizer::{CompletionBackend, SummaryInput, Summarizer}
};

const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] {bar:30.cyan/blue} {pos}/{len} {msg}";

/// Totals for a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// Repositories returned by the listing stage.
    pub listed:            usize,
    /// READMEs whose lookup or download failed.
    pub readme_failures:   usize,
    /// Summaries that fell back to the template.
    pub summary_fallbacks: usize,
    /// Output write totals.
    pub output:            WriteReport
}

/// Fetches the README and summary for every repository, in listing order.
///
/// Pass `None` as the summarizer to leave every summary
/// [`SummaryOutcome::Skipped`].
pub async fn collect_summaries<H, B>(
    host: &H,
    summarizer: Option<&Summarizer<B>>,
    repositories: Vec<RepositoryRecord>,
    progress: &ProgressBar
) -> Vec<SummaryRecord>
where
    H: RepositoryHost,
    B: CompletionBackend
{
    progress.set_length(repositories.len() as u64);
    let mut records = Vec::with_capacity(repositories.len());

    for repository in repositories {
        progress.set_message(repository.full_name.clone());

        let readme = host.fetch_readme(repository.owner(), &repository.name).await;
        if readme.is_failure() {
            warn!("README for {} unavailable: {}", repository.full_name, readme.column_text());
        }

        let summary = match summarizer {
            Some(summarizer) => {
                let input = SummaryInput {
                    name:        &repository.name,
                    language:    &repository.language,
                    description: &repository.description,
                    topics:      &repository.topics,
                    readme:      readme.content()
                };
                summarizer.summarize(&input).await
            }
            None => SummaryOutcome::Skipped
        };
        debug!("Summary for {}: {}", repository.name, summary.kind());

        records.push(SummaryRecord {
            repository,
            readme,
            summary
        });
        progress.inc(1);
    }

    progress.finish_and_clear();
    records
}

/// Runs the whole pipeline and writes the output file.
///
/// # Errors
///
/// Returns an error when listing yields nothing or the output cannot be
/// written. README and summary failures never abort the run.
pub async fn run<H, B>(
    host: &H,
    summarizer: Option<&Summarizer<B>>,
    selection: &RepositorySelection,
    output: &OutputSettings,
    progress: ProgressBar
) -> Result<RunReport, Error>
where
    H: RepositoryHost,
    B: CompletionBackend
{
    info!("Fetching {selection}");
    let repositories = list_repositories(host, selection).await?;
    let listed = repositories.len();

    info!("Building summaries for {listed} repositories");
    let records = collect_summaries(host, summarizer, repositories, &progress).await;

    let readme_failures = records.iter().filter(|record| record.readme.is_failure()).count();
    let summary_fallbacks = records.iter().filter(|record| record.summary.is_fallback()).count();

    let output = write_records(&records, output)?;

    Ok(RunReport {
        listed,
        readme_failures,
        summary_fallbacks,
        output
    })
}

/// Progress bar drawn on stderr, or a hidden one when `quiet` is set.
pub fn progress_bar(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new(0);
    match ProgressStyle::with_template(PROGRESS_TEMPLATE) {
        Ok(style) => bar.set_style(style),
        Err(error) => debug!("Falling back to default progress style: {error}")
    }
    bar
}
