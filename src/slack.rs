use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::fetch::Page;

const API_BASE: &str = "https://slack.com/api";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_archived: bool,
}

/// A message or thread reply as returned by `conversations.history` and
/// `conversations.replies`. Only the fields the survey needs are modeled;
/// everything else in the payload is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Message {
    pub ts: String,
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub elements: Vec<BlockElement>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockElement {
    #[serde(default)]
    pub elements: Vec<RichTextElement>,
}

/// Leaf element of a rich-text block; `kind == "emoji"` carries the emoji
/// name, other kinds (text, link, user, ...) are irrelevant here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RichTextElement {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
    pub name: String,
    /// Number of distinct users who reacted with this emoji.
    pub count: u64,
}

impl Message {
    /// Emoji references in the message body, one entry per occurrence.
    pub fn text_emoji(&self) -> impl Iterator<Item = &str> {
        self.blocks
            .iter()
            .flat_map(|block| block.elements.iter())
            .flat_map(|element| element.elements.iter())
            .filter(|leaf| leaf.kind == "emoji")
            .filter_map(|leaf| leaf.name.as_deref())
    }

    /// Thread timestamp when this message is the root of a thread with
    /// replies. Slack guarantees `thread_ts == ts` for such roots.
    pub fn thread_root(&self) -> Option<&str> {
        if self.reply_count.unwrap_or(0) > 0 {
            self.thread_ts.as_deref()
        } else {
            None
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConversationsListResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    channels: Option<Vec<Channel>>,
    #[serde(default)]
    has_more: Option<bool>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct ConversationsMessagesResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    messages: Option<Vec<Message>>,
    #[serde(default)]
    has_more: Option<bool>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct EmojiListResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    emoji: Option<HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Maps a Slack `error` code to the retry taxonomy.
fn api_error(error: Option<String>) -> AppError {
    let code = error.unwrap_or_else(|| "unknown_error".to_string());
    match code.as_str() {
        "ratelimited" => AppError::SlackRateLimit {
            retry_after_secs: 1,
        },
        "internal_error" | "service_unavailable" | "fatal_error" | "request_timeout" => {
            AppError::SlackTransient(code)
        }
        _ => AppError::SlackApi(code),
    }
}

/// Non-empty continuation cursor, if the response carried one.
fn next_cursor(metadata: Option<ResponseMetadata>) -> Option<String> {
    metadata
        .and_then(|m| m.next_cursor)
        .filter(|c| !c.is_empty())
}

/// Continuation cursor gated on the `has_more` flag; a missing flag falls
/// back to cursor presence.
fn continuation(has_more: Option<bool>, metadata: Option<ResponseMetadata>) -> Option<String> {
    if has_more.unwrap_or(true) {
        next_cursor(metadata)
    } else {
        None
    }
}

fn messages_page(response: ConversationsMessagesResponse) -> Result<Page<Message>> {
    if !response.ok {
        return Err(api_error(response.error));
    }

    Ok(Page {
        items: response.messages.unwrap_or_default(),
        next_cursor: continuation(response.has_more, response.response_metadata),
    })
}

/// Blocking Slack Web API client bound to a single bearer token.
pub struct SlackClient {
    http: reqwest::blocking::Client,
    token: String,
}

impl SlackClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            token: token.into(),
        }
    }

    fn get<T: DeserializeOwned>(&self, method: &str, params: &[(&str, String)]) -> Result<T> {
        let url = format!("{API_BASE}/{method}");
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .query(params)
            .send()
            .map_err(|e| AppError::Transport(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(1);
            return Err(AppError::SlackRateLimit { retry_after_secs });
        }

        // A failed body read (truncated response) lands here and is
        // classified transient, same as a rate limit.
        response
            .json::<T>()
            .map_err(|e| AppError::Transport(e.to_string()))
    }

    fn post<T: DeserializeOwned>(&self, method: &str, form: &[(&str, String)]) -> Result<T> {
        let url = format!("{API_BASE}/{method}");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .form(form)
            .send()
            .map_err(|e| AppError::Transport(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::SlackRateLimit {
                retry_after_secs: 1,
            });
        }

        response
            .json::<T>()
            .map_err(|e| AppError::Transport(e.to_string()))
    }

    /// One page of non-archived public channels.
    pub fn channels_page(&self, limit: u32, cursor: Option<&str>) -> Result<Page<Channel>> {
        let mut params = vec![
            ("exclude_archived", "true".to_string()),
            ("types", "public_channel".to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(c) = cursor {
            params.push(("cursor", c.to_string()));
        }

        let response: ConversationsListResponse = self.get("conversations.list", &params)?;
        if !response.ok {
            return Err(api_error(response.error));
        }

        Ok(Page {
            items: response.channels.unwrap_or_default(),
            next_cursor: continuation(response.has_more, response.response_metadata),
        })
    }

    /// One page of a channel's top-level history within `[oldest, latest]`.
    pub fn history_page(
        &self,
        channel_id: &str,
        oldest: &str,
        latest: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<Message>> {
        let mut params = vec![
            ("channel", channel_id.to_string()),
            ("oldest", oldest.to_string()),
            ("latest", latest.to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(c) = cursor {
            params.push(("cursor", c.to_string()));
        }

        let response: ConversationsMessagesResponse =
            self.get("conversations.history", &params)?;
        messages_page(response)
    }

    /// One page of a thread's replies (including the root message) within
    /// `[oldest, latest]`.
    pub fn replies_page(
        &self,
        channel_id: &str,
        thread_ts: &str,
        oldest: &str,
        latest: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<Message>> {
        let mut params = vec![
            ("channel", channel_id.to_string()),
            ("ts", thread_ts.to_string()),
            ("oldest", oldest.to_string()),
            ("latest", latest.to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(c) = cursor {
            params.push(("cursor", c.to_string()));
        }

        let response: ConversationsMessagesResponse =
            self.get("conversations.replies", &params)?;
        messages_page(response)
    }

    /// All workspace-defined custom emoji names. Not paginated.
    pub fn emoji_names(&self) -> Result<Vec<String>> {
        let response: EmojiListResponse = self.get("emoji.list", &[])?;
        if !response.ok {
            return Err(api_error(response.error));
        }

        Ok(response.emoji.unwrap_or_default().into_keys().collect())
    }

    /// Posts `text` to a channel given by name or `#name` reference.
    pub fn post_message(&self, channel: &str, text: &str) -> Result<()> {
        let channel = if channel.starts_with('#') {
            channel.to_string()
        } else {
            format!("#{channel}")
        };

        let response: PostMessageResponse = self.post(
            "chat.postMessage",
            &[("channel", channel), ("text", text.to_string())],
        )?;
        if !response.ok {
            return Err(api_error(response.error));
        }

        Ok(())
    }
}
