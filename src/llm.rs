use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use std::env;

use calendar_sim::generator::{clean_comment, company_name, parse_post_draft};
use calendar_sim::{CommentPrompt, ContentGenerator, GenerationError, PostDraft, PostPrompt};

#[derive(Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
}

impl LlmClient {
    pub fn from_env(model_override: Option<String>) -> Option<Self> {
        let api_key = env::var("OPENAI_API_KEY").ok()?;
        let api_base =
            env::var("OPENAI_API_BASE").unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let model = model_override
            .or_else(|| env::var("OPENAI_MODEL").ok())
            .unwrap_or_else(|| "gpt-4o-mini".to_string());
        let client = reqwest::Client::new();
        Some(Self {
            client,
            api_key,
            api_base,
            model,
        })
    }

    async fn complete(&self, system: &str, user: String) -> Result<String, GenerationError> {
        let url = format!("{}/chat/completions", self.api_base.trim_end_matches('/'));
        let request = ChatRequest {
            model: self.model.clone(),
            temperature: 0.9,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user,
                },
            ],
        };

        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|err| GenerationError::Request(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let detail = error_body.trim();
            if detail.is_empty() {
                return Err(GenerationError::Api(status.to_string()));
            }
            return Err(GenerationError::Api(format!("{} {}", status, detail)));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|err| GenerationError::Unparseable(err.to_string()))?;

        let content = body
            .choices
            .first()
            .ok_or_else(|| GenerationError::Unparseable("response missing choices".to_string()))?
            .message
            .content
            .trim()
            .to_string();
        if content.is_empty() {
            return Err(GenerationError::Empty);
        }
        Ok(content)
    }
}

#[async_trait]
impl ContentGenerator for LlmClient {
    async fn generate_post(&self, prompt: &PostPrompt<'_>) -> Result<PostDraft, GenerationError> {
        let content = self
            .complete(
                "You are a forum regular who writes authentic, natural posts.",
                post_prompt(prompt),
            )
            .await?;
        parse_post_draft(&content)
    }

    async fn generate_comment(&self, prompt: &CommentPrompt<'_>) -> Result<String, GenerationError> {
        let content = self
            .complete(
                "You are a forum regular writing natural, helpful comments.",
                comment_prompt(prompt),
            )
            .await?;
        clean_comment(&content)
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

fn post_prompt(prompt: &PostPrompt<'_>) -> String {
    let product = company_name(prompt.company_context);
    format!(
        r#"You are {username}, a real member of {forum} with this background:

{profile}

Write a post for {forum} related to: {topics}.

Rules:
- Ask a genuine question or start a discussion, the way a regular would.
- Casual and conversational; match your background and voice.
- Do not mention {product}. You are asking, not promoting.
- 2-4 sentences. Mention what you have tried or your situation.

Return only a JSON object: {{"title": "short title", "body": "2-4 sentences"}}"#,
        username = prompt.persona.username,
        profile = prompt.persona.profile,
        forum = prompt.forum,
        topics = prompt.topics.join(", "),
        product = product,
    )
}

fn comment_prompt(prompt: &CommentPrompt<'_>) -> String {
    let product = company_name(prompt.company_context);
    let product_rule = if prompt.is_first && prompt.should_mention_product {
        format!(
            "Mention {product} casually as something you have used (\"I've been using {product}...\", never \"Try {product}!\"). \
Acknowledge a limitation. Be helpful first, product second."
        )
    } else {
        format!("Do not mention {product}. Just be helpful and conversational.")
    };

    let mut context = format!("Original post: {}", prompt.post_body);
    if let Some(previous) = prompt.previous_comment {
        context.push_str(&format!("\n\nYou're replying to: {}", previous));
    }

    format!(
        r#"You are {username}, a real forum user with this background:

{profile}

{context}

Write a comment.

Rules:
- Casual, helpful, conversational.
- 1-3 sentences, occasionally 4.
- {product_rule}
- Show personality from your background.
- If replying to a comment, acknowledge what they said.

Return only the comment text, no JSON, no markdown."#,
        username = prompt.persona.username,
        profile = prompt.persona.profile,
        context = context,
        product_rule = product_rule,
    )
}
