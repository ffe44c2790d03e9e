//! Contract with the external text generator.
//!
//! The engine never writes prose itself: every title, body and comment comes
//! from a [`ContentGenerator`]. This module also holds the helpers shared by
//! generator implementations for interpreting raw model output.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;
use crate::Persona;

#[derive(Debug, Clone)]
pub struct PostPrompt<'a> {
    pub forum: &'a str,
    pub topics: &'a [String],
    pub persona: &'a Persona,
    pub company_context: &'a str,
}

#[derive(Debug, Clone)]
pub struct CommentPrompt<'a> {
    pub post_body: &'a str,
    pub persona: &'a Persona,
    pub company_context: &'a str,
    pub is_first: bool,
    pub should_mention_product: bool,
    /// Text of the comment being replied to, if this is a reply.
    pub previous_comment: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDraft {
    pub title: String,
    pub body: String,
}

#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate_post(&self, prompt: &PostPrompt<'_>) -> Result<PostDraft, GenerationError>;

    async fn generate_comment(&self, prompt: &CommentPrompt<'_>) -> Result<String, GenerationError>;
}

/// Post used when the generator cannot produce a usable title/body pair.
pub fn fallback_post(topic: &str) -> PostDraft {
    PostDraft {
        title: format!("Looking for advice on {}", topic),
        body: "Has anyone had experience with this? Would love to hear your thoughts.".to_string(),
    }
}

/// Best-effort product name from a free-text company description.
pub fn company_name(context: &str) -> String {
    let context = context.trim();
    if let Some((head, _)) = context.split_once('-') {
        return head.trim().to_string();
    }
    if let Some((head, _)) = context.split_once(',') {
        return head.trim().to_string();
    }
    context
        .split_whitespace()
        .take(2)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Interprets raw model output as a `{title, body}` JSON object.
pub fn parse_post_draft(raw: &str) -> Result<PostDraft, GenerationError> {
    let cleaned = strip_code_fence(raw.trim());
    let json = extract_json(cleaned)
        .ok_or_else(|| GenerationError::Unparseable("missing JSON object".to_string()))?;
    let draft: PostDraft = serde_json::from_str(json)
        .map_err(|err| GenerationError::Unparseable(err.to_string()))?;

    let title = draft.title.trim();
    let body = draft.body.trim();
    if title.is_empty() || body.is_empty() {
        return Err(GenerationError::Unparseable(
            "title or body is empty".to_string(),
        ));
    }

    Ok(PostDraft {
        title: title.to_string(),
        body: body.to_string(),
    })
}

/// Trims whitespace and wrapping quotes from a generated comment.
pub fn clean_comment(raw: &str) -> Result<String, GenerationError> {
    let comment = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim();
    if comment.is_empty() {
        return Err(GenerationError::Empty);
    }
    Ok(comment.to_string())
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.rsplit_once("```").map(|(inner, _)| inner).unwrap_or(rest).trim()
}

fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if start >= end {
        return None;
    }
    Some(&text[start..=end])
}
