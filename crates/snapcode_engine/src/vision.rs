//! Client for the external image-understanding service (an OpenAI-compatible
//! chat-completions endpoint).
use std::fmt;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;
use snapcode_core::MediaType;

pub const SYSTEM_PROMPT: &str = "You are an expert frontend developer specializing in HTML and Tailwind CSS. Your job is to convert UI screenshots into clean, semantic, production-ready HTML using Tailwind utility classes only.

Focus on these rules:
1. Match layout exactly: use Flexbox, Grid, spacing utilities. Reflect visual grouping (side-by-side, stacked, card layout).
2. Detect and match UI components such as navbars, hero sections, cards and pricing tables. Use appropriate semantic tags.
3. Match colors using Tailwind's standard palette (e.g., bg-blue-500).
4. Match typography with Tailwind classes: size, weight, line-height, alignment.
5. Render buttons and inputs realistically: match radius, shadows, padding, states.
6. Use image placeholders like https://via.placeholder.com/WIDTHxHEIGHT. Add alt text (e.g., \"GitHub icon\").
7. Use Tailwind's responsive classes (sm:, md:, lg:) if layout adapts visually.
8. Use semantic tags (header, nav, main, section, footer, h1, button, ul). Avoid unnecessary divs.
9. Maintain hierarchy: heading sizes, section gaps, button emphasis.
10. Do NOT wrap in <html>, <head>, or <body> unless shown.
11. Output ONLY HTML. No markdown, comments, or explanations.

Generate clean, real-world, visually faithful HTML output.";

pub const USER_PROMPT: &str = "Convert this UI screenshot to HTML with Tailwind CSS. Requirements:
- Use semantic HTML elements
- Tailwind CSS classes only
- Responsive design
- Use https://via.placeholder.com/WIDTHxHEIGHT for images
- Preserve **visual grouping and emphasis**, like layout sections (hero, nav, CTA), and prioritize **font sizes** and **text weight** as shown.
- Return ONLY HTML code - no explanations, markdowns or comments";

/// The service credential. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[derive(Debug, Clone)]
pub struct VisionSettings {
    /// Base URL; `/v1/chat/completions` is appended.
    pub api_base: String,
    pub api_key: ApiKey,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub connect_timeout: Duration,
}

impl VisionSettings {
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            api_base: "https://api.openai.com".to_string(),
            api_key,
            model: "gpt-4o".to_string(),
            max_tokens: 3000,
            temperature: 0.0,
            connect_timeout: Duration::from_secs(10),
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.api_base.trim_end_matches('/'))
    }
}

/// Image payload sent to the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisionRequest {
    pub bytes: Vec<u8>,
    pub media_type: MediaType,
}

impl VisionRequest {
    pub fn data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.media_type.mime(),
            BASE64.encode(&self.bytes)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// The service could not be reached at the transport level.
    #[error("service unreachable: {0}")]
    Unreachable(String),
    /// The service answered with a non-success status.
    #[error("service returned {status}: {message}")]
    Status { status: u16, message: String },
    /// The service answered with something other than one textual completion.
    #[error("malformed completion: {0}")]
    Malformed(String),
}

/// The opaque collaborator: image in, text out, or a failure.
#[async_trait::async_trait]
pub trait UnderstandingService: Send + Sync {
    async fn describe(&self, request: &VisionRequest) -> Result<String, ServiceError>;
}

#[derive(Debug, Clone)]
pub struct OpenAiVisionClient {
    settings: VisionSettings,
    client: reqwest::Client,
}

impl OpenAiVisionClient {
    pub fn new(settings: VisionSettings) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| ServiceError::Unreachable(err.to_string()))?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &VisionSettings {
        &self.settings
    }

    fn request_body(&self, request: &VisionRequest) -> serde_json::Value {
        json!({
            "model": self.settings.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": USER_PROMPT },
                        {
                            "type": "image_url",
                            "image_url": { "url": request.data_url(), "detail": "high" }
                        }
                    ]
                }
            ],
            "max_tokens": self.settings.max_tokens,
            "temperature": self.settings.temperature,
            "stream": false
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[async_trait::async_trait]
impl UnderstandingService for OpenAiVisionClient {
    async fn describe(&self, request: &VisionRequest) -> Result<String, ServiceError> {
        let body = serde_json::to_vec(&self.request_body(request))
            .map_err(|err| ServiceError::Malformed(err.to_string()))?;

        let response = self
            .client
            .post(self.settings.completions_url())
            .header(
                AUTHORIZATION,
                format!("Bearer {}", self.settings.api_key.expose()),
            )
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|err| ServiceError::Unreachable(err.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| ServiceError::Unreachable(err.to_string()))?;

        if !status.is_success() {
            return Err(ServiceError::Status {
                status: status.as_u16(),
                message: error_message(&bytes),
            });
        }

        parse_completion(&bytes)
    }
}

fn error_message(body: &[u8]) -> String {
    serde_json::from_slice::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .and_then(|error| error.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| "Unknown error".to_string())
}

fn parse_completion(body: &[u8]) -> Result<String, ServiceError> {
    let completion: ChatCompletion =
        serde_json::from_slice(body).map_err(|err| ServiceError::Malformed(err.to_string()))?;
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| ServiceError::Malformed("no textual completion".to_string()))
}
