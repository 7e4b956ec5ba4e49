// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Serialization of summary records into CSV, JSON or YAML files.
///
/// The whole document is rendered in memory first and written with a single
/// call, so a run produces exactly one complete file or an error.
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf}
};

use clap::ValueEnum;
use serde::Serialize;
use tracing::info;

use crate::{
    error::{Error, io_error},
    record::{SummaryRecord, portfolio_records}
};

/// Output path used when none is given.
pub const DEFAULT_OUTPUT_FILE: &str = "portfolio_summaries.json";

const CSV_HEADER: [&str; 10] = [
    "Name",
    "FullName",
    "URL",
    "Description",
    "Language",
    "Stars",
    "Forks",
    "OpenIssues",
    "Topics",
    "Summary"
];
const CSV_README_HEADER: &str = "README";

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One row per repository with a header line.
    Csv,
    /// Portfolio array sorted by stars, with the featured flag.
    Json,
    /// Sequence of mappings in listing order.
    Yaml
}

impl OutputFormat {
    /// Infers the format from the file extension.
    ///
    /// ```
    /// use std::path::Path;
    ///
    /// use repo_summaries::OutputFormat;
    ///
    /// assert_eq!(OutputFormat::from_path(Path::new("out.YML")), Some(OutputFormat::Yaml));
    /// assert_eq!(OutputFormat::from_path(Path::new("out.txt")), None);
    /// ```
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None
        }
    }
}

/// Where and how the records are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSettings {
    /// Destination file.
    pub path:           PathBuf,
    /// Explicit format; inferred from the extension when `None`.
    pub format:         Option<OutputFormat>,
    /// Adds the README text as a CSV column.
    pub include_readme: bool
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            path:           PathBuf::from(DEFAULT_OUTPUT_FILE),
            format:         None,
            include_readme: false
        }
    }
}

impl OutputSettings {
    /// Format to write: the explicit one, else the extension, else JSON.
    pub fn resolved_format(&self) -> OutputFormat {
        self.format
            .or_else(|| OutputFormat::from_path(&self.path))
            .unwrap_or(OutputFormat::Json)
    }
}

/// Counts reported after a successful write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteReport {
    /// Format that was written.
    pub format:   OutputFormat,
    /// Number of records in the file.
    pub written:  usize,
    /// Number of featured records; only computed for JSON.
    pub featured: Option<usize>
}

/// Renders the records and writes them to the configured file.
///
/// # Errors
///
/// Returns [`Error::Io`] when the file cannot be written and a serialization
/// error when rendering fails.
pub fn write_records(
    records: &[SummaryRecord],
    settings: &OutputSettings
) -> Result<WriteReport, Error> {
    let format = settings.resolved_format();
    let mut buffer = Vec::new();
    let featured = render_records(&mut buffer, records, format, settings.include_readme)?;

    fs::write(&settings.path, &buffer).map_err(|e| io_error(&settings.path, e))?;
    info!("Saved {} records to {}", records.len(), settings.path.display());

    Ok(WriteReport {
        format,
        written: records.len(),
        featured
    })
}

/// Renders the records in the given format.
///
/// Returns the featured count for JSON output.
///
/// # Errors
///
/// Propagates serialization errors from the format encoder.
pub fn render_records<W>(
    writer: W,
    records: &[SummaryRecord],
    format: OutputFormat,
    include_readme: bool
) -> Result<Option<usize>, Error>
where
    W: Write
{
    match format {
        OutputFormat::Csv => render_csv(writer, records, include_readme).map(|()| None),
        OutputFormat::Json => render_json(writer, records).map(Some),
        OutputFormat::Yaml => render_yaml(writer, records).map(|()| None)
    }
}

fn render_csv<W: Write>(
    writer: W,
    records: &[SummaryRecord],
    include_readme: bool
) -> Result<(), Error> {
    let mut csv = csv::Writer::from_writer(writer);

    let mut header: Vec<&str> = CSV_HEADER.to_vec();
    if include_readme {
        header.push(CSV_README_HEADER);
    }
    csv.write_record(&header)?;

    for record in records {
        let repository = &record.repository;
        let mut row = vec![
            repository.name.clone(),
            repository.full_name.clone(),
            repository.url.clone(),
            repository.description.clone(),
            repository.language.clone(),
            repository.stars.to_string(),
            repository.forks.to_string(),
            repository.open_issues.to_string(),
            repository.topics.join(", "),
            record.summary.text().to_owned()
        ];
        if include_readme {
            row.push(record.readme.column_text());
        }
        csv.write_record(&row)?;
    }

    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}

fn render_json<W: Write>(writer: W, records: &[SummaryRecord]) -> Result<usize, Error> {
    let rows = portfolio_records(records);
    serde_json::to_writer_pretty(writer, &rows)?;
    Ok(rows.iter().filter(|row| row.featured).count())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct YamlRow<'a> {
    name:        &'a str,
    full_name:   &'a str,
    url:         &'a str,
    description: &'a str,
    language:    &'a str,
    stars:       u64,
    forks:       u64,
    open_issues: u64,
    topics:      &'a [String],
    summary:     &'a str
}

impl<'a> From<&'a SummaryRecord> for YamlRow<'a> {
    fn from(record: &'a SummaryRecord) -> Self {
        let repository = &record.repository;
        Self {
            name:        &repository.name,
            full_name:   &repository.full_name,
            url:         &repository.url,
            description: &repository.description,
            language:    &repository.language,
            stars:       repository.stars,
            forks:       repository.forks,
            open_issues: repository.open_issues,
            topics:      &repository.topics,
            summary:     record.summary.text()
        }
    }
}

fn render_yaml<W: Write>(writer: W, records: &[SummaryRecord]) -> Result<(), Error> {
    let rows: Vec<YamlRow<'_>> = records.iter().map(YamlRow::from).collect();
    serde_yaml::to_writer(writer, &rows)?;
    Ok(())
}
