//! Trigger-document handling: message extraction and the delivery pipeline.
//!
//! The relay is invoked with one JSON document describing what to send.
//! Two shapes are recognized: a notification-service envelope carrying
//! `Records[].Sns.Message` entries, and a direct `{"message": "..."}`
//! invocation. Anything else contains no messages and delivers nothing.

use klaxon_delivery::{DeliveryClient, DeliveryError};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

/// Outcome summary printed after a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeliverySummary {
    /// Number of messages delivered to the webhook.
    pub delivered: u64,
}

/// Extracts the raw message strings contained in a trigger document.
///
/// Envelope records without a string `Sns.Message` are skipped. An empty
/// or missing `Records` array falls through to the direct-message shape.
pub fn extract_messages(event: &Value) -> Vec<String> {
    let Some(object) = event.as_object() else {
        return Vec::new();
    };

    match object.get("Records").and_then(Value::as_array) {
        Some(records) if !records.is_empty() => records
            .iter()
            .filter_map(|record| record.get("Sns")?.get("Message")?.as_str().map(str::to_owned))
            .collect(),
        _ => object
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .into_iter()
            .collect(),
    }
}

/// Formats and delivers every message in the trigger document.
///
/// Messages are processed in order; the first delivery failure aborts the
/// remaining batch and propagates unchanged.
///
/// # Errors
///
/// Returns the [`DeliveryError`] of the first failed send.
pub async fn run(event: &Value, client: &DeliveryClient) -> Result<DeliverySummary, DeliveryError> {
    let messages = extract_messages(event);
    debug!(count = messages.len(), "extracted trigger messages");

    let mut delivered = 0;
    for message in &messages {
        let payload = klaxon_format::format_message(message);
        client.send(payload).await?;
        delivered += 1;
        info!(delivered, total = messages.len(), "message delivered");
    }

    Ok(DeliverySummary { delivered })
}
