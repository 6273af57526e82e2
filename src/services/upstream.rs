// src/services/upstream.rs
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use crate::config::Config;

// DashScope streams by default unless this header says otherwise.
const SSE_HEADER: &str = "X-DashScope-SSE";

#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The API answered with a non-2xx status. The response body is logged
    /// where the error is raised, never sent back to the caller.
    #[error("upstream returned {status} {reason}")]
    Status { status: u16, reason: String },
    #[error("no generated text in upstream response")]
    Shape,
    #[error("could not reach upstream: {0}")]
    Transport(#[from] reqwest::Error),
}

/// The one outbound-call abstraction: a single bearer-authorized,
/// non-streaming POST to the generation endpoint.
#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    config: Config,
}

impl UpstreamClient {
    pub fn new(config: Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Ask the model for a reply to `message`, optionally attaching an image
    /// (data URI or plain URL).
    pub async fn generate(
        &self,
        message: &str,
        image_data: Option<&str>,
    ) -> Result<String, UpstreamError> {
        let payload = build_request(&self.config.model, message, image_data);

        debug!(model = %self.config.model, "calling generation API");
        let response = self
            .http
            .post(&self.config.api_base_url)
            .bearer_auth(&self.config.api_key)
            .header(SSE_HEADER, "disable")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("unknown").to_string();
            // Best-effort capture for diagnostics only.
            let body = response.text().await.unwrap_or_default();
            error!(%status, "upstream API error: {body}");
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                reason,
            });
        }

        let parsed: GenerationResponse = response.json().await.map_err(|err| {
            error!("undecodable upstream response: {err}");
            UpstreamError::Shape
        })?;

        extract_text(parsed).ok_or(UpstreamError::Shape)
    }
}

#[derive(Serialize)]
struct GenerationRequest {
    model: String,
    input: GenerationInput,
}

#[derive(Serialize)]
struct GenerationInput {
    messages: Vec<UserMessage>,
}

#[derive(Serialize)]
struct UserMessage {
    role: &'static str,
    content: MessageContent,
}

/// Text-only requests send the prompt as a bare string; requests with an
/// image send a text part plus an image part.
#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent {
    Plain(String),
    Parts(Vec<ContentPart>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageRef },
}

#[derive(Serialize)]
struct ImageRef {
    url: String,
}

fn build_request(model: &str, message: &str, image_data: Option<&str>) -> GenerationRequest {
    let content = match image_data {
        Some(image) => MessageContent::Parts(vec![
            ContentPart::Text {
                text: message.to_string(),
            },
            ContentPart::ImageUrl {
                image_url: ImageRef {
                    url: image.to_string(),
                },
            },
        ]),
        None => MessageContent::Plain(message.to_string()),
    };

    GenerationRequest {
        model: model.to_string(),
        input: GenerationInput {
            messages: vec![UserMessage {
                role: "user",
                content,
            }],
        },
    }
}

// The API answers in one of two shapes: a flat `output.text`, or
// `output.choices[0].message.content` where content is a string or a list
// of text fragments.
#[derive(Deserialize)]
struct GenerationResponse {
    output: Option<GenerationOutput>,
}

#[derive(Deserialize)]
struct GenerationOutput {
    text: Option<String>,
    choices: Option<Vec<Choice>>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<ChoiceContent>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ChoiceContent {
    Plain(String),
    Fragments(Vec<ContentFragment>),
}

#[derive(Deserialize)]
struct ContentFragment {
    text: Option<String>,
    content: Option<String>,
}

impl ChoiceContent {
    fn into_text(self) -> String {
        match self {
            ChoiceContent::Plain(text) => text,
            ChoiceContent::Fragments(fragments) => fragments
                .into_iter()
                .filter_map(|f| f.text.or(f.content))
                .collect(),
        }
    }
}

/// Pull the generated text out of whichever recognized shape is present,
/// preferring the flat one.
fn extract_text(response: GenerationResponse) -> Option<String> {
    let output = response.output?;
    if let Some(text) = output.text {
        return Some(text);
    }
    output
        .choices?
        .into_iter()
        .next()?
        .message
        .content
        .map(ChoiceContent::into_text)
}
