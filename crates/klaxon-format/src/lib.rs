//! Alarm state-change payloads rendered as webhook messages.
//!
//! Raw trigger messages are either JSON-encoded alarm documents or plain
//! text. JSON objects become a single rich embed; anything else falls back
//! to a text-only payload. The delivery client enforces the endpoint's
//! size limits, but the fallback clamps eagerly so callers can log what
//! will actually be transmitted.

pub mod alarm;

use klaxon_delivery::OutboundPayload;

pub use alarm::AlarmEvent;

/// Converts one raw message string into an outbound payload.
///
/// A message that parses as a JSON object is treated as an alarm
/// state-change document and rendered as an embed. Non-object JSON and
/// unparseable input become plain text content.
pub fn format_message(raw: &str) -> OutboundPayload {
    match serde_json::from_str::<AlarmEvent>(raw) {
        Ok(alarm) => OutboundPayload::embed(alarm.to_embed()),
        Err(_) => OutboundPayload::text(raw).clamped(),
    }
}
