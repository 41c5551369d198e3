//! Alarm state-change documents and their embed rendering.

use klaxon_delivery::{Embed, EmbedField};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// Accent color for alarms back in the OK state.
pub const COLOR_OK: u32 = 0x2ECC71;
/// Accent color for firing alarms.
pub const COLOR_ALARM: u32 = 0xE74C3C;
/// Accent color for alarms without enough data to evaluate.
pub const COLOR_INSUFFICIENT_DATA: u32 = 0xF1C40F;
/// Accent color for unrecognized states.
pub const COLOR_UNKNOWN: u32 = 0x95A5A6;

/// A CloudWatch alarm state-change document.
///
/// Every field is optional; monitoring payloads in the wild omit most of
/// them depending on alarm type. Unknown keys are ignored, so any JSON
/// object deserializes into this shape.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct AlarmEvent {
    /// Alarm name as configured in the monitoring service.
    pub alarm_name: Option<String>,
    /// State the alarm transitioned into.
    pub new_state_value: Option<String>,
    /// Human-readable explanation for the transition.
    pub new_state_reason: Option<String>,
    /// Region the alarm lives in.
    pub region: Option<String>,
    /// ISO-8601 timestamp of the state change.
    pub state_change_time: Option<String>,
    /// Trigger block describing the metric; kept opaque because its shape
    /// varies between metric, composite, and anomaly-detection alarms.
    pub trigger: Option<Value>,
}

impl AlarmEvent {
    /// Renders the alarm as a single embed.
    pub fn to_embed(&self) -> Embed {
        let alarm_name = self.alarm_name.as_deref().unwrap_or("unknown");
        let (namespace, metric_name) =
            self.trigger.as_ref().map_or((None, None), extract_metric);
        let dimensions = self.trigger.as_ref().map_or_else(Vec::new, extract_dimensions);

        let mut embed = Embed::new(
            format!("CloudWatch Alarm: {alarm_name}"),
            self.new_state_reason.clone().unwrap_or_default(),
            state_color(self.new_state_value.as_deref()),
        );

        if let Some(url) = console_alarm_url(self.region.as_deref(), self.alarm_name.as_deref()) {
            embed = embed.with_url(url);
        }
        if let Some(timestamp) = self.state_change_time.as_deref() {
            if is_valid_timestamp(timestamp) {
                embed = embed.with_timestamp(timestamp);
            } else {
                warn!(timestamp, "dropping unparseable state change time");
            }
        }

        if let Some(state) = &self.new_state_value {
            embed = embed.with_field(EmbedField::inline("State", state));
        }
        if let Some(region) = &self.region {
            embed = embed.with_field(EmbedField::inline("Region", region));
        }
        if let Some(metric) = &metric_name {
            embed = embed.with_field(EmbedField::inline("Metric", metric));
        }
        if let Some(namespace) = &namespace {
            embed = embed.with_field(EmbedField::inline("Namespace", namespace));
        }
        if !dimensions.is_empty() {
            embed = embed.with_field(EmbedField::block("Dimensions", dimensions.join(", ")));
        }

        embed
    }
}

/// Maps an alarm state to its accent color. Matching is case-insensitive.
pub fn state_color(state: Option<&str>) -> u32 {
    match state.map(str::to_uppercase).as_deref() {
        Some("OK") => COLOR_OK,
        Some("ALARM") => COLOR_ALARM,
        Some("INSUFFICIENT_DATA") => COLOR_INSUFFICIENT_DATA,
        _ => COLOR_UNKNOWN,
    }
}

/// Builds the console deep-link for an alarm, when both parts are known.
///
/// Alarm names may contain spaces and reserved characters, so the name is
/// fully percent-encoded into the URL fragment.
pub fn console_alarm_url(region: Option<&str>, alarm_name: Option<&str>) -> Option<String> {
    let (region, alarm_name) = region.zip(alarm_name)?;
    let encoded = urlencoding::encode(alarm_name);
    Some(format!(
        "https://console.aws.amazon.com/cloudwatch/home?region={region}#alarmsV2:alarm/{encoded}"
    ))
}

/// Extracts `(namespace, metric name)` from a trigger block.
///
/// Composite and anomaly-detection alarms nest the metric under
/// `Metrics[0].MetricStat.Metric` instead of carrying a top-level
/// `Namespace`, so when the metric name is present without a namespace both
/// values are re-read from the nested shape.
fn extract_metric(trigger: &Value) -> (Option<String>, Option<String>) {
    let mut namespace = string_at(trigger, &["Namespace"]);
    let mut metric_name = string_at(trigger, &["MetricName"]);

    if metric_name.is_some() && namespace.is_none() {
        namespace = string_at(trigger, &["Metrics", "0", "MetricStat", "Metric", "Namespace"]);
        metric_name = string_at(trigger, &["Metrics", "0", "MetricStat", "Metric", "MetricName"]);
    }

    (namespace, metric_name)
}

/// Formats trigger dimensions as `name=value` pairs.
///
/// Both `name`/`value` and `Name`/`Value` key casings occur in monitoring
/// payloads; entries that are not objects or lack either part are skipped.
fn extract_dimensions(trigger: &Value) -> Vec<String> {
    let Some(dimensions) = trigger.get("Dimensions").and_then(Value::as_array) else {
        return Vec::new();
    };

    dimensions
        .iter()
        .filter_map(|dimension| {
            let object = dimension.as_object()?;
            let name = object.get("name").or_else(|| object.get("Name"))?.as_str()?;
            let value = object.get("value").or_else(|| object.get("Value"))?.as_str()?;
            Some(format!("{name}={value}"))
        })
        .collect()
}

/// Checks that a state-change time is valid ISO-8601.
///
/// Accepts both strict RFC 3339 offsets (`+00:00`, `Z`) and the compact
/// `+0000` form that CloudWatch emits.
fn is_valid_timestamp(value: &str) -> bool {
    chrono::DateTime::parse_from_rfc3339(value).is_ok()
        || chrono::DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z").is_ok()
}

/// Walks a JSON path of object keys and array indices to a string value.
fn string_at(value: &Value, path: &[&str]) -> Option<String> {
    let mut current = value;
    for step in path {
        current = match current {
            Value::Array(items) => items.get(step.parse::<usize>().ok()?)?,
            _ => current.get(step)?,
        };
    }
    current.as_str().map(str::to_owned)
}
