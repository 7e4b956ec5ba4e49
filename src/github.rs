// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Repository listing and README retrieval against the GitHub REST API.
///
/// [`RepositoryHost`] is the seam the pipeline talks to; [`GitHubClient`]
/// implements it with octocrab for API routes and a plain reqwest client for
/// the unauthenticated raw README download.
use octocrab::{Octocrab, service::middleware::retry::RetryConfig};
use reqwest::{
    StatusCode,
    header::{ACCEPT, AUTHORIZATION}
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    config::{AuthScheme, GithubSettings, OwnerKind, RepositorySelection, split_full_name},
    error::Error,
    record::{ReadmeOutcome, RepositoryRecord}
};

/// Media type that makes the API include repository topics.
pub const TOPICS_MEDIA_TYPE: &str = "application/vnd.github.mercy-preview+json";
/// Page size of the single listing request.
pub const LISTING_PAGE_SIZE: u8 = 100;

/// Read-only view of a repository host.
#[allow(async_fn_in_trait)]
pub trait RepositoryHost {
    /// Lists the repositories of an owner with a single page request.
    async fn list_owner_repositories(
        &self,
        owner: &str,
        kind: OwnerKind
    ) -> Result<Vec<RepositoryRecord>, Error>;

    /// Fetches one repository by owner and name.
    async fn get_repository(&self, owner: &str, name: &str) -> Result<RepositoryRecord, Error>;

    /// Fetches README text. Never fails; problems are reported in the outcome.
    async fn fetch_readme(&self, owner: &str, name: &str) -> ReadmeOutcome;
}

/// Resolves the selection into repository records.
///
/// Owner mode fails as a whole when the listing fails. Explicit mode skips
/// malformed entries and entries that cannot be fetched, logging a warning
/// for each.
///
/// # Errors
///
/// Returns [`Error::Github`] when the owner listing fails or when no
/// repository was resolved at all.
pub async fn list_repositories<H>(
    host: &H,
    selection: &RepositorySelection
) -> Result<Vec<RepositoryRecord>, Error>
where
    H: RepositoryHost
{
    let repositories = match selection {
        RepositorySelection::Owner {
            name,
            kind
        } => {
            let mut repositories = host.list_owner_repositories(name, *kind).await?;
            for repository in &mut repositories {
                repository.ensure_full_name(name);
            }
            repositories
        }
        RepositorySelection::Explicit(entries) => fetch_explicit(host, entries).await
    };

    if repositories.is_empty() {
        return Err(Error::github("no repositories found or fetched"));
    }

    info!("Found {} repositories:", repositories.len());
    for repository in &repositories {
        info!("- {} ({})", repository.name, repository.url);
    }

    Ok(repositories)
}

async fn fetch_explicit<H>(host: &H, entries: &[String]) -> Vec<RepositoryRecord>
where
    H: RepositoryHost
{
    let mut repositories = Vec::with_capacity(entries.len());

    for entry in entries {
        let Some((owner, name)) = split_full_name(entry) else {
            warn!("Invalid repository format: '{entry}', skipping.");
            continue;
        };

        match host.get_repository(owner, name).await {
            Ok(mut repository) => {
                repository.ensure_full_name(owner);
                repositories.push(repository);
            }
            Err(error) => warn!("Could not fetch '{entry}' ({error}), skipping.")
        }
    }

    repositories
}

#[derive(Debug, Serialize)]
struct PageParameters {
    per_page: u8
}

#[derive(Debug, Deserialize)]
struct ReadmeMetadata {
    #[serde(default)]
    download_url: Option<String>
}

/// GitHub implementation of [`RepositoryHost`].
///
/// Holds one client without credentials and one with the token so the
/// listing can try both header sets in turn.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    anonymous:     Octocrab,
    authenticated: Octocrab,
    raw:           reqwest::Client
}

impl GitHubClient {
    /// Builds the clients from the settings. No request is sent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the base URL is invalid or a client
    /// cannot be initialized.
    pub fn new(settings: &GithubSettings) -> Result<Self, Error> {
        let anonymous = build_octocrab(&settings.api_url, None)?;
        let authenticated =
            build_octocrab(&settings.api_url, Some((&settings.token, settings.auth_scheme)))?;
        let raw = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::config(format!("failed to initialize HTTP client: {e}")))?;

        Ok(Self {
            anonymous,
            authenticated,
            raw
        })
    }

    async fn readme_download_url(
        &self,
        owner: &str,
        name: &str
    ) -> Result<Option<String>, octocrab::Error> {
        let metadata: ReadmeMetadata = self
            .authenticated
            .get(format!("/repos/{owner}/{name}/readme"), None::<&()>)
            .await?;
        Ok(metadata.download_url.filter(|url| !url.is_empty()))
    }

    async fn download(&self, url: &str) -> Result<String, reqwest::Error> {
        self.raw.get(url).send().await?.error_for_status()?.text().await
    }
}

// Octocrab retries 5xx, 429 and transport errors three times unless told
// otherwise. Every request here is a single attempt.
fn build_octocrab(
    api_url: &str,
    credentials: Option<(&str, AuthScheme)>
) -> Result<Octocrab, Error> {
    let mut builder = Octocrab::builder()
        .base_uri(api_url)
        .map_err(|e| Error::config(format!("invalid GitHub API URL '{api_url}': {e}")))?
        .add_retry_config(RetryConfig::None)
        .add_header(ACCEPT, TOPICS_MEDIA_TYPE.to_owned());

    match credentials {
        Some((token, AuthScheme::Bearer)) => builder = builder.personal_token(token),
        Some((token, scheme @ AuthScheme::Token)) => {
            builder = builder.add_header(AUTHORIZATION, scheme.header_value(token));
        }
        None => {}
    }

    builder
        .build()
        .map_err(|e| Error::config(format!("failed to initialize GitHub client: {e}")))
}

/// Renders an octocrab error with the HTTP status and API message.
///
/// The `Display` impl of [`octocrab::Error::GitHub`] prints only the variant
/// name, which hides why a request failed.
fn describe(error: &octocrab::Error) -> String {
    match error {
        octocrab::Error::GitHub {
            source, ..
        } => format!("{}: {}", source.status_code, source.message),
        other => other.to_string()
    }
}

fn is_not_found(error: &octocrab::Error) -> bool {
    matches!(
        error,
        octocrab::Error::GitHub { source, .. } if source.status_code == StatusCode::NOT_FOUND
    )
}

impl RepositoryHost for GitHubClient {
    async fn list_owner_repositories(
        &self,
        owner: &str,
        kind: OwnerKind
    ) -> Result<Vec<RepositoryRecord>, Error> {
        let route = kind.repositories_route(owner);
        let parameters = PageParameters {
            per_page: LISTING_PAGE_SIZE
        };

        debug!("Listing {route} without authentication");
        match self.anonymous.get(&route, Some(&parameters)).await {
            Ok(repositories) => return Ok(repositories),
            Err(error) => {
                warn!("Public access to {route} failed ({}), trying with token", describe(&error));
            }
        }

        debug!("Listing {route} with token authentication");
        self.authenticated
            .get(&route, Some(&parameters))
            .await
            .map_err(|e| {
                Error::github(format!("failed to list repositories for {owner}: {}", describe(&e)))
            })
    }

    async fn get_repository(&self, owner: &str, name: &str) -> Result<RepositoryRecord, Error> {
        debug!("Fetching repository {owner}/{name}");
        self.authenticated
            .get(format!("/repos/{owner}/{name}"), None::<&()>)
            .await
            .map_err(|e| Error::github(format!("failed to fetch {owner}/{name}: {}", describe(&e))))
    }

    async fn fetch_readme(&self, owner: &str, name: &str) -> ReadmeOutcome {
        let download_url = match self.readme_download_url(owner, name).await {
            Ok(Some(url)) => url,
            Ok(None) => return ReadmeOutcome::Missing,
            Err(error) if is_not_found(&error) => return ReadmeOutcome::Missing,
            Err(error) => {
                return ReadmeOutcome::Failed(format!("README lookup failed: {}", describe(&error)));
            }
        };

        debug!("Downloading README for {owner}/{name} from {download_url}");
        match self.download(&download_url).await {
            Ok(text) => ReadmeOutcome::Fetched(text),
            Err(error) => ReadmeOutcome::Failed(format!("README download failed: {error}"))
        }
    }
}
