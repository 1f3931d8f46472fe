//! Anthropic Messages API narrative generator.
//!
//! Each generator call is one non-streaming completion. Structured proposals
//! ask the model for a bare JSON object and pull the first `{...}` span out of
//! the reply, since models sometimes wrap JSON in prose.

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;
use wayfarer_core::vocabulary::EventType;

use crate::context::{FeaturedItem, NarrativeContext, Scene};
use crate::error::NarrativeError;
use crate::generator::{NarrativeGenerator, RawItemDrop, RawStatBoost};

/// API base URL.
const API_BASE: &str = "https://api.anthropic.com/v1";

/// API version header value.
const API_VERSION: &str = "2023-06-01";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

const SYSTEM_PROMPT: &str = "You are the narrator of a dark-fantasy text adventure. \
Write in second person, present tense, at most three sentences. Never mention dice, \
numbers or game mechanics unless asked for JSON.";

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'static str,
    messages: Vec<ApiMessage<'a>>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiContent {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ApiContent>,
}

/// Generator backed by Anthropic's Messages API.
#[derive(Debug, Clone)]
pub struct AnthropicNarrator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl AnthropicNarrator {
    /// Creates a generator with the default model.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_owned(),
            base_url: API_BASE.to_owned(),
        }
    }

    /// Overrides the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Overrides the API base URL (for proxies).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn headers(&self) -> Result<HeaderMap, NarrativeError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| NarrativeError::Configuration(format!("invalid API key: {e}")))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));
        Ok(headers)
    }

    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, NarrativeError> {
        let request = ApiRequest {
            model: &self.model,
            max_tokens,
            system: SYSTEM_PROMPT,
            messages: vec![ApiMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await
            .map_err(|e| NarrativeError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NarrativeError::Unavailable(format!("{status}: {body}")));
        }

        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| NarrativeError::InvalidResponse(e.to_string()))?;

        let text: String = body
            .content
            .into_iter()
            .filter_map(|block| match block {
                ApiContent::Text { text } => Some(text),
                ApiContent::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n");
        debug!(chars = text.len(), "narrative completion received");
        Ok(text)
    }
}

fn context_json(context: &NarrativeContext) -> Result<String, NarrativeError> {
    serde_json::to_string_pretty(context)
        .map_err(|e| NarrativeError::InvalidResponse(format!("context serialization: {e}")))
}

/// Extracts the outermost `{...}` span of `text` and parses it.
fn parse_embedded_json<T: for<'de> Deserialize<'de>>(text: &str) -> Result<T, NarrativeError> {
    let start = text.find('{');
    let end = text.rfind('}');
    let (Some(start), Some(end)) = (start, end) else {
        return Err(NarrativeError::InvalidResponse(format!(
            "no JSON object in reply: {text}"
        )));
    };
    if end < start {
        return Err(NarrativeError::InvalidResponse(format!(
            "malformed JSON object in reply: {text}"
        )));
    }
    serde_json::from_str(&text[start..=end])
        .map_err(|e| NarrativeError::InvalidResponse(format!("{e}: {text}")))
}

fn scene_instruction(scene: Scene) -> String {
    match scene {
        Scene::Introduction => "Introduce the campaign and the character's first steps.".to_owned(),
        Scene::Descriptive => "Describe the next stretch of the journey. Nothing happens.".to_owned(),
        Scene::InvestigationHook { event_type } => format!(
            "In one short sentence, hint that something ({event_type}) is nearby without \
             revealing what. The player will choose whether to investigate."
        ),
        Scene::Declined { event_type } => format!(
            "The player ignored a hint of something ({event_type}) and moves on. One sentence."
        ),
        Scene::Environmental { stat, delta } => format!(
            "The surroundings change the character's {stat} by {delta}. Describe why."
        ),
        Scene::CombatEncounter { boss } => {
            if boss {
                "The final boss appears. Describe the confrontation's opening.".to_owned()
            } else {
                "The enemy in the context attacks. Describe its appearance.".to_owned()
            }
        }
        Scene::CombatConclusion { ending } => {
            format!("The combat ends ({ending:?}). Describe the aftermath.")
        }
        Scene::ItemDrop { left_behind } => {
            if left_behind {
                "The character finds the featured item but cannot carry it.".to_owned()
            } else {
                "The character finds the featured item.".to_owned()
            }
        }
    }
}

#[async_trait]
impl NarrativeGenerator for AnthropicNarrator {
    async fn propose_event_type(
        &self,
        context: &NarrativeContext,
    ) -> Result<String, NarrativeError> {
        let prompt = format!(
            "Game state:\n{}\n\nChoose the next event category. Answer with exactly one of: \
             Descriptive, Environmental, Combat, Item_Drop.",
            context_json(context)?
        );
        self.complete(&prompt, 16).await
    }

    async fn generate_description(
        &self,
        scene: Scene,
        context: &NarrativeContext,
        featured: Option<&FeaturedItem>,
    ) -> Result<String, NarrativeError> {
        let featured = match featured {
            Some(item) => format!(
                "\nFeatured item: {} ({} {:+})",
                item.name, item.stat, item.value
            ),
            None => String::new(),
        };
        let prompt = format!(
            "Game state:\n{}{featured}\n\n{}",
            context_json(context)?,
            scene_instruction(scene)
        );
        self.complete(&prompt, 300).await
    }

    async fn propose_stat_boost(
        &self,
        context: &NarrativeContext,
        category: EventType,
    ) -> Result<RawStatBoost, NarrativeError> {
        let prompt = format!(
            "Game state:\n{}\n\nA {category} event affects one stat. Reply with only JSON: \
             {{\"stat_type\": \"health\"|\"attack\"|\"defense\", \"base_value\": integer \
             between -5 and 8, never 0}}",
            context_json(context)?
        );
        let reply = self.complete(&prompt, 60).await?;
        parse_embedded_json(&reply)
    }

    async fn propose_item_drop(
        &self,
        context: &NarrativeContext,
    ) -> Result<RawItemDrop, NarrativeError> {
        let prompt = format!(
            "Game state:\n{}\n\nThe character finds an item. Reply with only JSON: \
             {{\"stat_type\": \"health\"|\"attack\"|\"defense\", \"flavor\": short phrase for \
             where it lies}}",
            context_json(context)?
        );
        let reply = self.complete(&prompt, 80).await?;
        parse_embedded_json(&reply)
    }
}
