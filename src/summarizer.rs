// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// README summarization through a chat completion endpoint.
///
/// The [`Summarizer`] builds the prompt, makes a single attempt against its
/// [`CompletionBackend`], and degrades to a templated fallback when the call
/// fails.
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{config::CompletionSettings, error::Error, record::SummaryOutcome};

/// Number of README characters embedded in the prompt.
pub const README_EXCERPT_CHARS: usize = 3000;

const PORTFOLIO_SYSTEM_PROMPT: &str = "You are a technical writer specializing in creating \
                                       compelling project descriptions for developer portfolios.";
const MISSING_README: &str = "No README available";
const ERROR_BODY_CHARS: usize = 500;

/// Prompt template used for each repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PromptStyle {
    /// Three to four sentence portfolio summary built from all metadata.
    #[default]
    Portfolio,
    /// Two marketable sentences built from the README alone.
    Brief
}

impl PromptStyle {
    fn max_tokens(self) -> u32 {
        match self {
            Self::Portfolio => 200,
            Self::Brief => 100
        }
    }
}

/// Repository fields available to the prompt.
#[derive(Debug, Clone, Copy)]
pub struct SummaryInput<'a> {
    /// Short repository name.
    pub name:        &'a str,
    /// Primary language, possibly empty.
    pub language:    &'a str,
    /// Description, possibly empty.
    pub description: &'a str,
    /// Topic tags.
    pub topics:      &'a [String],
    /// README text, possibly empty.
    pub readme:      &'a str
}

/// One chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    /// `system` or `user`.
    pub role:    String,
    /// Message text.
    pub content: String
}

impl ChatMessage {
    fn new(role: &str, content: String) -> Self {
        Self {
            role: role.to_owned(),
            content
        }
    }
}

/// Body of a chat completion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    /// Model name.
    pub model:       String,
    /// Conversation sent to the model.
    pub messages:    Vec<ChatMessage>,
    /// Response length cap.
    pub max_tokens:  u32,
    /// Sampling temperature.
    pub temperature: f32
}

/// Endpoint that turns a completion request into text.
#[allow(async_fn_in_trait)]
pub trait CompletionBackend {
    /// Sends the request once and returns the trimmed response text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, Error>;
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>
}

/// OpenAI chat completions client.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client:   reqwest::Client,
    endpoint: String,
    api_key:  String
}

impl OpenAiClient {
    /// Builds the client. No request is sent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the HTTP client cannot be initialized.
    pub fn new(settings: &CompletionSettings) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::config(format!("failed to initialize HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/v1/chat/completions", settings.base_url),
            api_key: settings.api_key.clone()
        })
    }
}

impl CompletionBackend for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, Error> {
        debug!("Requesting completion from {} with model {}", self.endpoint, request.model);
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::completion(format!(
                "API error ({status}): {}",
                excerpt(&body, ERROR_BODY_CHARS)
            )));
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_owned())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| Error::completion("response contained no completion text"))
    }
}

/// Prompt builder plus fallback policy around a [`CompletionBackend`].
#[derive(Debug, Clone)]
pub struct Summarizer<B> {
    backend: B,
    model:   String,
    style:   PromptStyle
}

impl<B> Summarizer<B>
where
    B: CompletionBackend
{
    /// Wraps the backend with the model and prompt style to use.
    pub fn new(backend: B, model: impl Into<String>, style: PromptStyle) -> Self {
        Self {
            backend,
            model: model.into(),
            style
        }
    }

    /// Returns the wrapped backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Summarizes one repository.
    ///
    /// Returns [`SummaryOutcome::Skipped`] without calling the backend when
    /// both the README and the description are blank.
    pub async fn summarize(&self, input: &SummaryInput<'_>) -> SummaryOutcome {
        if input.readme.trim().is_empty() && input.description.trim().is_empty() {
            debug!("Nothing to summarize for {}", input.name);
            return SummaryOutcome::Skipped;
        }

        let request = self.build_request(input);
        match self.backend.complete(&request).await {
            Ok(text) => SummaryOutcome::Generated(text),
            Err(error) => {
                let reason = error.to_string();
                warn!("Summary for {} failed: {reason}", input.name);
                SummaryOutcome::Fallback {
                    text: fallback_summary(input.description, input.language, &reason),
                    reason
                }
            }
        }
    }

    /// Builds the completion request for the configured prompt style.
    pub fn build_request(&self, input: &SummaryInput<'_>) -> CompletionRequest {
        let messages = match self.style {
            PromptStyle::Portfolio => vec![
                ChatMessage::new("system", PORTFOLIO_SYSTEM_PROMPT.to_owned()),
                ChatMessage::new("user", portfolio_prompt(input))
            ],
            PromptStyle::Brief => vec![ChatMessage::new("user", brief_prompt(input))]
        };

        CompletionRequest {
            model: self.model.clone(),
            messages,
            max_tokens: self.style.max_tokens(),
            temperature: 0.7
        }
    }
}

fn context_block(input: &SummaryInput<'_>) -> String {
    let mut context = format!("Repository: {}", input.name);
    if !input.language.is_empty() {
        context.push_str(&format!(" (Built with {})", input.language));
    }
    if !input.description.is_empty() {
        context.push_str(&format!("\nGitHub Description: {}", input.description));
    }
    if !input.topics.is_empty() {
        context.push_str(&format!("\nTopics/Tags: {}", input.topics.join(", ")));
    }
    context
}

fn portfolio_prompt(input: &SummaryInput<'_>) -> String {
    let readme = if input.readme.is_empty() {
        MISSING_README
    } else {
        excerpt(input.readme, README_EXCERPT_CHARS)
    };

    format!(
        "Create an engaging portfolio summary for this software project. Focus on:\n\
         - What the project does and its main purpose\n\
         - Key features and capabilities\n\
         - Technical implementation highlights\n\
         - Why it's impressive or noteworthy\n\n\
         {context}\n\n\
         README Content:\n\
         {readme}\n\n\
         Write a compelling 3-4 sentence summary that would showcase this project well in a \
         developer portfolio. Make it sound professional but engaging, highlighting the \
         technical skills and problem-solving involved.",
        context = context_block(input)
    )
}

fn brief_prompt(input: &SummaryInput<'_>) -> String {
    let content = if input.readme.is_empty() {
        input.description
    } else {
        excerpt(input.readme, README_EXCERPT_CHARS)
    };
    format!("Summarize the following repository README in two marketable sentences:\n\n{content}")
}

/// Returns at most `limit` characters of `text`, cut on a character boundary.
///
/// ```
/// use repo_summaries::excerpt;
///
/// assert_eq!(excerpt("héllo", 2), "hé");
/// assert_eq!(excerpt("abc", 10), "abc");
/// ```
pub fn excerpt(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((index, _)) => &text[..index],
        None => text
    }
}

/// Substitute summary used when the completion call fails.
///
/// ```
/// use repo_summaries::fallback_summary;
///
/// assert_eq!(
///     fallback_summary("", "Rust", "timeout"),
///     "[Error generating summary: timeout]"
/// );
/// ```
pub fn fallback_summary(description: &str, language: &str, reason: &str) -> String {
    if description.is_empty() {
        return format!("[Error generating summary: {reason}]");
    }
    let language = if language.is_empty() { "software" } else { language };
    format!(
        "{description} This {language} project demonstrates practical development skills and \
         problem-solving capabilities."
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::{Cell, RefCell};

    use proptest::prelude::*;

    use super::*;
    use crate::loopback::{LoopbackServer, Reply};

    /// Backend that records requests and replays a fixed answer.
    pub(crate) struct RecordingBackend {
        pub(crate) calls:    Cell<usize>,
        pub(crate) requests: RefCell<Vec<CompletionRequest>>,
        answer:              Option<String>
    }

    impl RecordingBackend {
        pub(crate) fn answering(text: &str) -> Self {
            Self {
                calls:    Cell::new(0),
                requests: RefCell::new(Vec::new()),
                answer:   Some(text.to_owned())
            }
        }

        pub(crate) fn failing() -> Self {
            Self {
                calls:    Cell::new(0),
                requests: RefCell::new(Vec::new()),
                answer:   None
            }
        }
    }

    impl CompletionBackend for RecordingBackend {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, Error> {
            self.calls.set(self.calls.get() + 1);
            self.requests.borrow_mut().push(request.clone());
            self.answer
                .clone()
                .ok_or_else(|| Error::completion("service unavailable"))
        }
    }

    fn input<'a>(
        readme: &'a str,
        description: &'a str,
        topics: &'a [String]
    ) -> SummaryInput<'a> {
        SummaryInput {
            name: "widgets",
            language: "Rust",
            description,
            topics,
            readme
        }
    }

    #[tokio::test]
    async fn blank_readme_and_description_skip_the_backend() {
        let summarizer =
            Summarizer::new(RecordingBackend::answering("x"), "m", PromptStyle::Portfolio);
        let outcome = summarizer.summarize(&input("  ", "", &[])).await;

        assert_eq!(outcome, SummaryOutcome::Skipped);
        assert_eq!(summarizer.backend().calls.get(), 0);
    }

    #[tokio::test]
    async fn successful_completion_is_generated() {
        let backend = RecordingBackend::answering("A fine crate.");
        let summarizer = Summarizer::new(backend, "m", PromptStyle::Portfolio);
        let outcome = summarizer.summarize(&input("# Widgets", "", &[])).await;

        assert_eq!(outcome, SummaryOutcome::Generated("A fine crate.".to_owned()));
        assert_eq!(summarizer.backend().calls.get(), 1);
    }

    #[tokio::test]
    async fn failure_with_description_uses_template() {
        let summarizer = Summarizer::new(RecordingBackend::failing(), "m", PromptStyle::Portfolio);
        let outcome = summarizer.summarize(&input("", "Widget toolkit.", &[])).await;

        match outcome {
            SummaryOutcome::Fallback {
                text,
                reason
            } => {
                assert_eq!(
                    text,
                    "Widget toolkit. This Rust project demonstrates practical development skills \
                     and problem-solving capabilities."
                );
                assert!(reason.contains("service unavailable"));
            }
            other => panic!("expected fallback, got {other:?}")
        }
        assert_eq!(summarizer.backend().calls.get(), 1);
    }

    #[tokio::test]
    async fn failure_without_description_uses_error_marker() {
        let summarizer = Summarizer::new(RecordingBackend::failing(), "m", PromptStyle::Brief);
        let outcome = summarizer.summarize(&input("# Widgets", "", &[])).await;
        assert_eq!(
            outcome.text(),
            "[Error generating summary: completion error: service unavailable]"
        );
    }

    #[test]
    fn portfolio_request_embeds_metadata() {
        let topics = vec!["cli".to_owned(), "parser".to_owned()];
        let summarizer =
            Summarizer::new(RecordingBackend::failing(), "gpt-4o-mini", PromptStyle::Portfolio);
        let request = summarizer.build_request(&input("", "Widget toolkit.", &topics));

        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.max_tokens, 200);
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "system");
        let prompt = &request.messages[1].content;
        assert!(prompt.contains("Repository: widgets (Built with Rust)"));
        assert!(prompt.contains("GitHub Description: Widget toolkit."));
        assert!(prompt.contains("Topics/Tags: cli, parser"));
        assert!(prompt.contains("No README available"));
    }

    #[test]
    fn brief_request_is_single_user_message() {
        let summarizer = Summarizer::new(RecordingBackend::failing(), "m", PromptStyle::Brief);
        let request = summarizer.build_request(&input("# Widgets", "", &[]));

        assert_eq!(request.max_tokens, 100);
        assert_eq!(request.messages.len(), 1);
        assert!(request.messages[0].content.ends_with("# Widgets"));
    }

    #[test]
    fn long_readme_is_truncated_in_prompt() {
        let readme = "a".repeat(README_EXCERPT_CHARS + 500);
        let summarizer = Summarizer::new(RecordingBackend::failing(), "m", PromptStyle::Portfolio);
        let request = summarizer.build_request(&input(&readme, "", &[]));

        let prompt = &request.messages[1].content;
        assert!(prompt.contains(&"a".repeat(README_EXCERPT_CHARS)));
        assert!(!prompt.contains(&"a".repeat(README_EXCERPT_CHARS + 1)));
    }

    #[test]
    fn request_serializes_openai_shape() {
        let summarizer = Summarizer::new(RecordingBackend::failing(), "m", PromptStyle::Brief);
        let request = summarizer.build_request(&input("text", "", &[]));
        let json = serde_json::to_value(&request).expect("serializable request");

        assert_eq!(json["model"], "m");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 100);
    }

    #[test]
    fn chat_response_parses_first_choice() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"  Hello.  "}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).expect("valid response");
        let content = parsed.choices[0].message.content.as_deref().map(str::trim);
        assert_eq!(content, Some("Hello."));
    }

    #[test]
    fn fallback_defaults_language_to_software() {
        assert_eq!(
            fallback_summary("Tool.", "", "x"),
            "Tool. This software project demonstrates practical development skills and \
             problem-solving capabilities."
        );
    }

    fn openai_client(server: &LoopbackServer) -> OpenAiClient {
        OpenAiClient::new(&CompletionSettings {
            base_url:     server.url().to_owned(),
            api_key:      "sk-test".to_owned(),
            model:        "gpt-4o-mini".to_owned(),
            prompt_style: PromptStyle::Portfolio
        })
        .expect("client")
    }

    #[tokio::test]
    async fn openai_client_posts_chat_request_with_bearer_key() {
        let server = LoopbackServer::start(|_, _| {
            Reply::new(200, r#"{"choices":[{"message":{"role":"assistant","content":" Done. "}}]}"#)
        });
        let summarizer =
            Summarizer::new(openai_client(&server), "gpt-4o-mini", PromptStyle::Brief);

        let outcome = summarizer.summarize(&input("# Widgets", "", &[])).await;

        assert_eq!(outcome, SummaryOutcome::Generated("Done.".to_owned()));
        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].path(), "/v1/chat/completions");
        assert_eq!(requests[0].header("authorization"), Some("Bearer sk-test"));
        let body: serde_json::Value = serde_json::from_str(&requests[0].body).expect("json body");
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_tokens"], 100);
    }

    #[tokio::test]
    async fn openai_error_status_becomes_fallback_after_one_attempt() {
        let server = LoopbackServer::start(|_, _| {
            Reply::new(502, r#"{"error":{"message":"upstream unavailable"}}"#)
        });
        let summarizer =
            Summarizer::new(openai_client(&server), "gpt-4o-mini", PromptStyle::Portfolio);

        let outcome = summarizer.summarize(&input("", "Widget toolkit.", &[])).await;

        match outcome {
            SummaryOutcome::Fallback {
                text,
                reason
            } => {
                assert!(text.starts_with("Widget toolkit. This Rust project"));
                assert!(reason.contains("502"));
                assert!(reason.contains("upstream unavailable"));
            }
            other => panic!("expected fallback, got {other:?}")
        }
        assert_eq!(server.requests().len(), 1);
    }

    #[tokio::test]
    async fn openai_empty_choices_are_an_error() {
        let server = LoopbackServer::start(|_, _| Reply::new(200, r#"{"choices":[]}"#));
        let client = openai_client(&server);
        let request = Summarizer::new(RecordingBackend::failing(), "m", PromptStyle::Brief)
            .build_request(&input("text", "", &[]));

        let error = client.complete(&request).await.unwrap_err();

        assert!(matches!(error, Error::Completion { .. }));
        assert_eq!(error.to_string(), "completion error: response contained no completion text");
    }

    proptest! {
        #[test]
        fn excerpt_is_bounded_prefix(text in "\\PC{0,64}", limit in 0usize..80) {
            let cut = excerpt(&text, limit);
            prop_assert!(text.starts_with(cut));
            prop_assert!(cut.chars().count() <= limit);
            prop_assert_eq!(cut.chars().count(), text.chars().count().min(limit));
        }
    }
}
