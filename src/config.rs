// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Run configuration resolved from command-line flags and the environment.
//!
//! Everything a pipeline run needs is captured in [`RunConfig`] and handed to
//! each stage explicitly. Resolution never touches the network, so a missing
//! credential is reported before any request is issued.

use std::fmt;

use clap::ValueEnum;

use crate::{error::Error, output::OutputSettings, summarizer::PromptStyle};

/// Default base URL of the repository hosting API.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
/// Default base URL of the completion API.
pub const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com";
/// Default chat model used for summaries.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

const MISSING_CREDENTIALS: &str = "GITHUB_TOKEN and OPENAI_API_KEY must be set";
const MISSING_GITHUB_TOKEN: &str = "GITHUB_TOKEN must be set";

/// Account namespace type that decides which listing endpoint is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OwnerKind {
    /// Organization account, listed through `/orgs/{owner}/repos`.
    #[default]
    Org,
    /// Personal account, listed through `/users/{owner}/repos`.
    User
}

impl OwnerKind {
    /// Returns the listing route for the owner.
    ///
    /// ```
    /// use repo_summaries::OwnerKind;
    ///
    /// assert_eq!(OwnerKind::User.repositories_route("octocat"), "/users/octocat/repos");
    /// ```
    pub fn repositories_route(self, owner: &str) -> String {
        match self {
            Self::Org => format!("/orgs/{owner}/repos"),
            Self::User => format!("/users/{owner}/repos")
        }
    }
}

/// Authorization header scheme sent with the hosting API token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum AuthScheme {
    /// `Authorization: Bearer <token>`.
    #[default]
    Bearer,
    /// Legacy `Authorization: token <token>`.
    Token
}

impl AuthScheme {
    /// Formats the `Authorization` header value for the token.
    pub fn header_value(self, token: &str) -> String {
        match self {
            Self::Bearer => format!("Bearer {token}"),
            Self::Token => format!("token {token}")
        }
    }
}

/// Repositories selected for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositorySelection {
    /// Every repository returned by a single listing call for the owner.
    Owner {
        /// Organization or user name.
        name: String,
        /// Account type of the owner.
        kind: OwnerKind
    },
    /// Explicit `owner/repo` entries, fetched one by one.
    Explicit(Vec<String>)
}

impl RepositorySelection {
    /// Builds the selection from the mutually exclusive CLI inputs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when neither or both inputs are provided, or
    /// when the explicit list contains no entries after trimming.
    pub fn from_inputs(
        owner: Option<&str>,
        repos: Option<&str>,
        kind: OwnerKind
    ) -> Result<Self, Error> {
        let owner = owner.map(str::trim).filter(|value| !value.is_empty());
        let repos = repos.map(str::trim).filter(|value| !value.is_empty());

        match (owner, repos) {
            (Some(name), None) => Ok(Self::Owner {
                name: name.to_owned(),
                kind
            }),
            (None, Some(list)) => {
                let entries = parse_repository_list(list);
                if entries.is_empty() {
                    return Err(Error::config("--repos must name at least one owner/repo entry"));
                }
                Ok(Self::Explicit(entries))
            }
            (Some(_), Some(_)) => Err(Error::config(
                "--org-name and --repos are mutually exclusive"
            )),
            (None, None) => Err(Error::config("either --org-name or --repos is required"))
        }
    }
}

impl fmt::Display for RepositorySelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Owner {
                name,
                kind
            } => {
                let label = match kind {
                    OwnerKind::Org => "org",
                    OwnerKind::User => "user"
                };
                write!(f, "all repos for {label}: {name}")
            }
            Self::Explicit(entries) => write!(f, "specific repos: {}", entries.join(", "))
        }
    }
}

/// Splits a comma-separated repository list, trimming and dropping blanks.
///
/// ```
/// use repo_summaries::parse_repository_list;
///
/// let entries = parse_repository_list(" acme/widgets, ,acme/gizmos ");
/// assert_eq!(entries, vec!["acme/widgets", "acme/gizmos"]);
/// ```
pub fn parse_repository_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Splits an `owner/repo` entry into its two non-empty halves.
pub fn split_full_name(entry: &str) -> Option<(&str, &str)> {
    let (owner, name) = entry.split_once('/')?;
    let owner = owner.trim();
    let name = name.trim();
    if owner.is_empty() || name.is_empty() {
        return None;
    }
    Some((owner, name))
}

/// Credentials for both upstream services.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Hosting API token.
    pub github_token:   String,
    /// Completion API key, absent when summaries are disabled.
    pub openai_api_key: Option<String>
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("github_token", &"<redacted>")
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "<redacted>")
            )
            .finish()
    }
}

impl Credentials {
    /// Validates that the required credentials are present.
    ///
    /// Blank values count as missing. The completion key is only required
    /// when `summaries_enabled` is set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the missing variables.
    pub fn resolve(
        github_token: Option<String>,
        openai_api_key: Option<String>,
        summaries_enabled: bool
    ) -> Result<Self, Error> {
        let github_token = non_blank(github_token);
        let openai_api_key = non_blank(openai_api_key);

        match (github_token, openai_api_key) {
            (Some(github_token), Some(key)) => Ok(Self {
                github_token,
                openai_api_key: summaries_enabled.then_some(key)
            }),
            (Some(github_token), None) if !summaries_enabled => Ok(Self {
                github_token,
                openai_api_key: None
            }),
            (None, _) if !summaries_enabled => Err(Error::config(MISSING_GITHUB_TOKEN)),
            _ => Err(Error::config(MISSING_CREDENTIALS))
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_owned())
        .filter(|trimmed| !trimmed.is_empty())
}

/// Connection settings for the hosting API.
#[derive(Clone)]
pub struct GithubSettings {
    /// Base URL of the API.
    pub api_url:     String,
    /// Access token.
    pub token:       String,
    /// Header scheme used for the token.
    pub auth_scheme: AuthScheme
}

impl fmt::Debug for GithubSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubSettings")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .field("auth_scheme", &self.auth_scheme)
            .finish()
    }
}

/// Connection and prompt settings for the completion API.
#[derive(Clone)]
pub struct CompletionSettings {
    /// Base URL of the API, without the `/v1` suffix.
    pub base_url:     String,
    /// API key sent as a bearer token.
    pub api_key:      String,
    /// Chat model name.
    pub model:        String,
    /// Prompt template used for each repository.
    pub prompt_style: PromptStyle
}

impl fmt::Debug for CompletionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("prompt_style", &self.prompt_style)
            .finish()
    }
}

/// Fully resolved configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Repositories to process.
    pub selection:  RepositorySelection,
    /// Hosting API connection.
    pub github:     GithubSettings,
    /// Completion API connection, `None` when summaries are skipped.
    pub completion: Option<CompletionSettings>,
    /// Output file settings.
    pub output:     OutputSettings
}

/// Raw inputs collected by the CLI before validation.
#[derive(Debug, Clone, Default)]
pub struct RunInputs {
    /// Owner name for the all-repositories mode.
    pub org_name:       Option<String>,
    /// Comma-separated explicit repository list.
    pub repos:          Option<String>,
    /// Owner account type.
    pub owner_kind:     OwnerKind,
    /// Hosting API token.
    pub github_token:   Option<String>,
    /// Completion API key.
    pub openai_api_key: Option<String>,
    /// Header scheme for the hosting token.
    pub auth_scheme:    AuthScheme,
    /// Hosting API base URL override.
    pub api_url:        Option<String>,
    /// Completion API base URL override.
    pub openai_url:     Option<String>,
    /// Chat model name override.
    pub model:          Option<String>,
    /// Prompt template.
    pub prompt_style:   PromptStyle,
    /// Disables the summarization stage.
    pub skip_summaries: bool,
    /// Output file settings.
    pub output:         OutputSettings
}

impl RunInputs {
    /// Validates the inputs and produces a [`RunConfig`].
    ///
    /// Credentials are checked before the repository selection so that a run
    /// without tokens fails the same way regardless of other flags.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for missing credentials or an invalid
    /// repository selection.
    pub fn resolve(self) -> Result<RunConfig, Error> {
        let summaries_enabled = !self.skip_summaries;
        let credentials =
            Credentials::resolve(self.github_token, self.openai_api_key, summaries_enabled)?;
        let selection = RepositorySelection::from_inputs(
            self.org_name.as_deref(),
            self.repos.as_deref(),
            self.owner_kind
        )?;

        let github = GithubSettings {
            api_url:     base_url_or(self.api_url, DEFAULT_GITHUB_API_URL),
            token:       credentials.github_token,
            auth_scheme: self.auth_scheme
        };

        let completion = credentials.openai_api_key.map(|api_key| CompletionSettings {
            base_url: base_url_or(self.openai_url.clone(), DEFAULT_OPENAI_API_URL),
            api_key,
            model: self
                .model
                .clone()
                .map(|model| model.trim().to_owned())
                .filter(|model| !model.is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
            prompt_style: self.prompt_style
        });

        Ok(RunConfig {
            selection,
            github,
            completion,
            output: self.output
        })
    }
}

fn base_url_or(value: Option<String>, default: &str) -> String {
    value
        .map(|url| url.trim().trim_end_matches('/').to_owned())
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| default.to_owned())
}
