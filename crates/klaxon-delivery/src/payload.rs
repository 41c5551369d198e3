//! Outbound message payload and its wire representation.
//!
//! The webhook endpoint accepts a JSON object with optional `content` and
//! `embeds` keys. Both carry hard service limits: content is capped at 2000
//! characters and at most 10 embeds are accepted per message. The client
//! clamps oversized input instead of rejecting it.

use serde::{Deserialize, Serialize};

/// Maximum number of characters the endpoint accepts in `content`.
pub const MAX_CONTENT_CHARS: usize = 2000;

/// Maximum number of embeds the endpoint accepts per message.
pub const MAX_EMBEDS: usize = 10;

/// A message to be posted to the webhook endpoint.
///
/// Keys are omitted from the wire JSON when the corresponding field is
/// empty, so an all-empty payload serializes to `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutboundPayload {
    /// Plain text message content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Rich display blocks attached to the message, in display order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

impl OutboundPayload {
    /// Creates a text-only payload.
    pub fn text(content: impl Into<String>) -> Self {
        Self { content: Some(content.into()), embeds: Vec::new() }
    }

    /// Creates a payload carrying a single embed.
    pub fn embed(embed: Embed) -> Self {
        Self { content: None, embeds: vec![embed] }
    }

    /// Returns true when the payload has nothing to transmit.
    ///
    /// Empty-string content counts as nothing, matching the wire rule that
    /// the `content` key is only sent when non-empty.
    pub fn is_empty(&self) -> bool {
        self.content.as_deref().map_or(true, str::is_empty) && self.embeds.is_empty()
    }

    /// Clamps the payload to the endpoint's limits.
    ///
    /// Content is truncated to the first [`MAX_CONTENT_CHARS`] characters
    /// and empty content is normalized to absent; embeds beyond
    /// [`MAX_EMBEDS`] are dropped, preserving order.
    pub fn clamped(mut self) -> Self {
        self.content = self
            .content
            .filter(|content| !content.is_empty())
            .map(|content| match content.char_indices().nth(MAX_CONTENT_CHARS) {
                Some((boundary, _)) => content[..boundary].to_string(),
                None => content,
            });
        self.embeds.truncate(MAX_EMBEDS);
        self
    }
}

/// A rich display block attached to a message.
///
/// The delivery client treats embeds as opaque values subject only to the
/// per-message count cap; their contents are produced by formatters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    /// Embed heading.
    pub title: String,

    /// Body text below the heading.
    pub description: String,

    /// Accent color as a packed 0xRRGGBB integer.
    pub color: u32,

    /// Link target for the title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// ISO-8601 timestamp rendered in the embed footer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    /// Labeled name/value pairs rendered below the description.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
}

impl Embed {
    /// Creates an embed with the given heading, body, and accent color.
    pub fn new(title: impl Into<String>, description: impl Into<String>, color: u32) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            color,
            url: None,
            timestamp: None,
            fields: Vec::new(),
        }
    }

    /// Sets the title link target.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the footer timestamp.
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Appends a name/value field.
    pub fn with_field(mut self, field: EmbedField) -> Self {
        self.fields.push(field);
        self
    }
}

/// A labeled name/value pair inside an embed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedField {
    /// Field label.
    pub name: String,
    /// Field content.
    pub value: String,
    /// Whether the field renders side by side with its neighbors.
    pub inline: bool,
}

impl EmbedField {
    /// Creates a field that renders side by side with its neighbors.
    pub fn inline(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into(), inline: true }
    }

    /// Creates a field that takes a full row.
    pub fn block(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into(), inline: false }
    }
}

/// Truncates a string slice to at most `max_chars` characters, respecting
/// character boundaries.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((boundary, _)) => &text[..boundary],
        None => text,
    }
}
