//! Command-line interface for the repo-summaries binary.
//!
//! The CLI resolves credentials and the repository selection, then runs the
//! list, README, summarize and write pipeline once.

use std::{path::PathBuf, process};

use clap::{ArgAction, ArgGroup, Parser};
use repo_summaries::{
    AuthScheme, DEFAULT_OUTPUT_FILE, Error, GitHubClient, OpenAiClient, OutputFormat,
    OutputSettings, OwnerKind, PromptStyle, RunConfig, RunInputs, RunReport, Summarizer,
    progress_bar
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Generate repository summaries for a portfolio.
#[derive(Debug, Parser)]
#[command(
    name = "repo-summaries",
    version,
    about = "Generate GitHub repository summaries for a portfolio"
)]
#[command(group(ArgGroup::new("source").required(true).args(["org_name", "repos"])))]
struct Cli {
    /// Organization or user whose repositories are listed.
    #[arg(long = "org-name", alias = "org_name", alias = "name", value_name = "NAME")]
    org_name: Option<String>,

    /// Comma-separated list of full repository names (owner/repo).
    #[arg(long = "repos", value_name = "LIST")]
    repos: Option<String>,

    /// Account type of --org-name.
    #[arg(long = "owner-type", alias = "type", value_enum, default_value_t = OwnerKind::Org)]
    owner_type: OwnerKind,

    /// Output file; the format follows the extension unless --format is set.
    #[arg(
        short = 'o',
        long = "output-file",
        value_name = "PATH",
        default_value = DEFAULT_OUTPUT_FILE
    )]
    output_file: PathBuf,

    /// Output format override.
    #[arg(long = "format", value_enum)]
    format: Option<OutputFormat>,

    /// Include README contents as a CSV column.
    #[arg(long = "include-readme", action = ArgAction::SetTrue)]
    include_readme: bool,

    /// Chat model used for summaries.
    #[arg(long = "model", value_name = "MODEL")]
    model: Option<String>,

    /// Prompt template used for summaries.
    #[arg(long = "prompt-style", value_enum, default_value_t = PromptStyle::Portfolio)]
    prompt_style: PromptStyle,

    /// GitHub personal access token.
    #[arg(
        long = "github-token",
        alias = "github_token",
        env = "GITHUB_TOKEN",
        hide_env_values = true
    )]
    github_token: Option<String>,

    /// OpenAI API key.
    #[arg(
        long = "openai-api-key",
        alias = "openai_api_key",
        env = "OPENAI_API_KEY",
        hide_env_values = true
    )]
    openai_api_key: Option<String>,

    /// Authorization header scheme for the GitHub token.
    #[arg(long = "auth-scheme", value_enum, default_value_t = AuthScheme::Bearer)]
    auth_scheme: AuthScheme,

    /// GitHub API base URL.
    #[arg(long = "api-url", env = "GITHUB_API_URL", value_name = "URL")]
    api_url: Option<String>,

    /// OpenAI API base URL.
    #[arg(long = "openai-url", env = "OPENAI_BASE_URL", value_name = "URL")]
    openai_url: Option<String>,

    /// Write records without calling the summarization endpoint.
    #[arg(long = "skip-summaries", action = ArgAction::SetTrue)]
    skip_summaries: bool,

    /// Hide the progress bar.
    #[arg(short = 'q', long = "quiet", action = ArgAction::SetTrue)]
    quiet: bool
}

impl Cli {
    fn into_inputs(self) -> RunInputs {
        RunInputs {
            org_name:       self.org_name,
            repos:          self.repos,
            owner_kind:     self.owner_type,
            github_token:   self.github_token,
            openai_api_key: self.openai_api_key,
            auth_scheme:    self.auth_scheme,
            api_url:        self.api_url,
            openai_url:     self.openai_url,
            model:          self.model,
            prompt_style:   self.prompt_style,
            skip_summaries: self.skip_summaries,
            output:         OutputSettings {
                path:           self.output_file,
                format:         self.format,
                include_readme: self.include_readme
            }
        }
    }
}

/// Entry point that reports errors and sets the appropriate exit status.
#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(error) = run().await {
        eprintln!("Error: {}", error.to_display_string());
        process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Parses arguments, validates configuration and runs the pipeline.
///
/// # Errors
///
/// Returns configuration errors before any request is made, and pipeline
/// errors for failed listings or output writes.
async fn run() -> Result<(), Error> {
    let cli = Cli::parse();
    let quiet = cli.quiet;
    let config = cli.into_inputs().resolve()?;

    let report = execute(config, quiet).await?;
    log_report(&report);

    Ok(())
}

async fn execute(config: RunConfig, quiet: bool) -> Result<RunReport, Error> {
    let host = GitHubClient::new(&config.github)?;
    let summarizer = config
        .completion
        .as_ref()
        .map(|settings| {
            let client = OpenAiClient::new(settings)?;
            Ok::<_, Error>(Summarizer::new(client, settings.model.clone(), settings.prompt_style))
        })
        .transpose()?;

    repo_summaries::run(
        &host,
        summarizer.as_ref(),
        &config.selection,
        &config.output,
        progress_bar(quiet)
    )
    .await
}

fn log_report(report: &RunReport) {
    info!("Generated summaries for {} repositories", report.output.written);
    if report.readme_failures > 0 {
        info!("{} READMEs could not be fetched", report.readme_failures);
    }
    if report.summary_fallbacks > 0 {
        info!("{} summaries fell back to the description", report.summary_fallbacks);
    }
    if let Some(featured) = report.output.featured {
        info!("{featured} repositories marked as featured");
    }
}
