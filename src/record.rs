// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Record shapes flowing through the pipeline.
//!
//! [`RepositoryRecord`] is deserialized straight from the hosting API. A
//! [`SummaryRecord`] pairs it with the README and summary outcomes, and
//! [`PortfolioRecord`] is the JSON row written for portfolio output.

use serde::{Deserialize, Deserializer, Serialize};

/// Stars strictly above this value mark a repository as featured.
pub const FEATURED_MIN_STARS: u64 = 5;
/// Forks strictly above this value mark a repository as featured.
pub const FEATURED_MIN_FORKS: u64 = 2;

/// Repository metadata as returned by the hosting API.
///
/// Null or absent optional fields degrade to empty strings, zero counts and
/// an empty topic list.
///
/// # Examples
///
/// ```
/// use repo_summaries::RepositoryRecord;
///
/// let json = r#"{
///     "name": "widgets",
///     "full_name": "acme/widgets",
///     "description": null,
///     "stargazers_count": 10
/// }"#;
/// let record: RepositoryRecord = serde_json::from_str(json).expect("valid record");
/// assert_eq!(record.stars, 10);
/// assert!(record.description.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct RepositoryRecord {
    /// Short repository name.
    pub name:        String,
    /// `owner/name` identifier.
    #[serde(default, deserialize_with = "null_as_default")]
    pub full_name:   String,
    /// Browser URL of the repository.
    #[serde(default, rename = "html_url", deserialize_with = "null_as_default")]
    pub url:         String,
    /// Free-text description.
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Primary language label.
    #[serde(default, deserialize_with = "null_as_default")]
    pub language:    String,
    /// Star count.
    #[serde(default, rename = "stargazers_count", deserialize_with = "null_as_default")]
    pub stars:       u64,
    /// Fork count.
    #[serde(default, rename = "forks_count", deserialize_with = "null_as_default")]
    pub forks:       u64,
    /// Open issue count.
    #[serde(default, rename = "open_issues_count", deserialize_with = "null_as_default")]
    pub open_issues: u64,
    /// Topic tags.
    #[serde(default, deserialize_with = "null_as_default")]
    pub topics:      Vec<String>
}

impl RepositoryRecord {
    /// Fills `full_name` from the listing owner when the API omitted it.
    pub fn ensure_full_name(&mut self, owner: &str) {
        if !self.full_name.contains('/') {
            self.full_name = format!("{owner}/{}", self.name);
        }
    }

    /// Returns the owner half of `full_name`.
    pub fn owner(&self) -> &str {
        self.full_name
            .split_once('/')
            .map_or("", |(owner, _)| owner)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Result of the README stage for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadmeOutcome {
    /// README downloaded; the text may be empty.
    Fetched(String),
    /// Repository has no README or no download link.
    Missing,
    /// Either request failed.
    Failed(String)
}

impl ReadmeOutcome {
    /// Text handed to the summarizer. Missing and failed READMEs are empty.
    pub fn content(&self) -> &str {
        match self {
            Self::Fetched(text) => text,
            Self::Missing | Self::Failed(_) => ""
        }
    }

    /// Text written to the CSV `README` column.
    pub fn column_text(&self) -> String {
        match self {
            Self::Fetched(text) => text.clone(),
            Self::Missing => String::new(),
            Self::Failed(reason) => format!("Error fetching README: {reason}")
        }
    }

    /// Returns `true` when either request failed.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Result of the summarization stage for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    /// Text returned by the completion endpoint.
    Generated(String),
    /// Nothing to summarize or summaries disabled; no request was made.
    Skipped,
    /// The request failed and a substitute text was produced.
    Fallback {
        /// Substitute summary.
        text:   String,
        /// Failure that triggered the fallback.
        reason: String
    }
}

impl SummaryOutcome {
    /// Summary text written to output files.
    pub fn text(&self) -> &str {
        match self {
            Self::Generated(text)
            | Self::Fallback {
                text, ..
            } => text,
            Self::Skipped => ""
        }
    }

    /// Returns `true` when the fallback path was taken.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    /// Lowercase name of the outcome, used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Generated(_) => "generated",
            Self::Skipped => "skipped",
            Self::Fallback { .. } => "fallback"
        }
    }
}

/// One repository after the README and summary stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRecord {
    /// Metadata from the listing stage.
    pub repository: RepositoryRecord,
    /// README stage outcome.
    pub readme:     ReadmeOutcome,
    /// Summary stage outcome.
    pub summary:    SummaryOutcome
}

impl SummaryRecord {
    /// Whether the repository qualifies as featured.
    pub fn is_featured(&self) -> bool {
        is_featured(self.repository.stars, self.repository.forks)
    }
}

/// Featured rule: more than five stars or more than two forks.
///
/// ```
/// use repo_summaries::is_featured;
///
/// assert!(!is_featured(5, 2));
/// assert!(is_featured(6, 0));
/// assert!(is_featured(0, 3));
/// ```
pub fn is_featured(stars: u64, forks: u64) -> bool {
    stars > FEATURED_MIN_STARS || forks > FEATURED_MIN_FORKS
}

/// JSON row written for portfolio output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioRecord {
    /// Short repository name.
    pub name:        String,
    /// `owner/name` identifier.
    pub full_name:   String,
    /// Browser URL.
    pub url:         String,
    /// Free-text description.
    pub description: String,
    /// Primary language.
    pub language:    String,
    /// Star count.
    pub stars:       u64,
    /// Fork count.
    pub forks:       u64,
    /// Open issue count.
    pub open_issues: u64,
    /// Topic tags.
    pub topics:      Vec<String>,
    /// Generated or fallback summary.
    pub summary:     String,
    /// Derived popularity flag.
    pub featured:    bool
}

impl From<&SummaryRecord> for PortfolioRecord {
    fn from(record: &SummaryRecord) -> Self {
        let repository = &record.repository;
        Self {
            name:        repository.name.clone(),
            full_name:   repository.full_name.clone(),
            url:         repository.url.clone(),
            description: repository.description.clone(),
            language:    repository.language.clone(),
            stars:       repository.stars,
            forks:       repository.forks,
            open_issues: repository.open_issues,
            topics:      repository.topics.clone(),
            summary:     record.summary.text().to_owned(),
            featured:    record.is_featured()
        }
    }
}

/// Builds portfolio rows sorted by stars, most starred first.
///
/// The sort is stable, so repositories with equal star counts keep their
/// listing order.
pub fn portfolio_records(records: &[SummaryRecord]) -> Vec<PortfolioRecord> {
    let mut rows: Vec<PortfolioRecord> = records.iter().map(PortfolioRecord::from).collect();
    rows.sort_by(|left, right| right.stars.cmp(&left.stars));
    rows
}
