//! Repository summaries for portfolios.
//!
//! The library lists repositories from GitHub, downloads each README,
//! optionally asks a chat completion endpoint for a short summary, and writes
//! the collected records to a CSV, JSON or YAML file. The stages run strictly
//! one after another; per-repository failures degrade the record instead of
//! aborting the run.

mod config;
mod error;
mod github;
#[cfg(test)]
mod loopback;
mod output;
mod pipeline;
mod record;
mod summarizer;

pub use config::{
    AuthScheme, CompletionSettings, Credentials, DEFAULT_GITHUB_API_URL, DEFAULT_MODEL,
    DEFAULT_OPENAI_API_URL, GithubSettings, OwnerKind, RepositorySelection, RunConfig, RunInputs,
    parse_repository_list, split_full_name
};
pub use error::{Error, io_error};
pub use github::{GitHubClient, RepositoryHost, list_repositories};
pub use output::{
    DEFAULT_OUTPUT_FILE, OutputFormat, OutputSettings, WriteReport, render_records, write_records
};
pub use pipeline::{RunReport, collect_summaries, progress_bar, run};
pub use record::{
    PortfolioRecord, ReadmeOutcome, RepositoryRecord, SummaryOutcome, SummaryRecord, is_featured,
    portfolio_records
};
pub use summarizer::{
    ChatMessage, CompletionBackend, CompletionRequest, OpenAiClient, PromptStyle, SummaryInput,
    Summarizer, excerpt, fallback_summary
};
