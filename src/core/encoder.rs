//! Record encoders
//!
//! Two closed encodings:
//! - Text: `[time] [LEVEL] [name] caller - message k=v ...`, optionally colored
//! - Json: one object per line with `time`, `level`, `logger`, `caller`, `msg`,
//!   flattened fields and, for high-priority records, `stacktrace`

use super::error::{LoggerError, Result};
use super::field::FieldValue;
use super::log_record::LogRecord;
use super::timestamp::TimestampFormat;
use colored::Colorize;

pub const TIME_KEY: &str = "time";
pub const LEVEL_KEY: &str = "level";
pub const NAME_KEY: &str = "logger";
pub const CALLER_KEY: &str = "caller";
pub const MESSAGE_KEY: &str = "msg";
pub const STACKTRACE_KEY: &str = "stacktrace";

const RESERVED_KEYS: [&str; 6] = [
    TIME_KEY,
    LEVEL_KEY,
    NAME_KEY,
    CALLER_KEY,
    MESSAGE_KEY,
    STACKTRACE_KEY,
];

/// Encoding attached to a destination for its whole lifetime
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoder {
    Text(TextEncoder),
    Json(JsonEncoder),
}

impl Encoder {
    pub fn text(timestamp_format: TimestampFormat, use_colors: bool) -> Self {
        Encoder::Text(TextEncoder {
            timestamp_format,
            use_colors,
        })
    }

    pub fn json(timestamp_format: TimestampFormat) -> Self {
        Encoder::Json(JsonEncoder { timestamp_format })
    }

    /// Encode one record as a single newline-terminated line
    pub fn encode(&self, record: &LogRecord) -> Result<Vec<u8>> {
        match self {
            Encoder::Text(text) => Ok(text.encode(record)?.into_bytes()),
            Encoder::Json(json) => json.encode(record),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Encoder::Text(_) => "text",
            Encoder::Json(_) => "json",
        }
    }
}

/// Human-oriented single-line layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEncoder {
    timestamp_format: TimestampFormat,
    use_colors: bool,
}

impl TextEncoder {
    fn encode(&self, record: &LogRecord) -> Result<String> {
        let level = format!("{:5}", record.level.to_str());
        let level = if self.use_colors {
            level.color(record.level.color_code()).to_string()
        } else {
            level
        };

        let time = self
            .timestamp_format
            .format(&record.timestamp)
            .map_err(|_| time_error("text", &self.timestamp_format))?;
        let mut line = format!("[{}] [{}]", time, level);

        if let Some(ref name) = record.logger_name {
            line.push_str(&format!(" [{}]", name));
        }
        if let Some(ref caller) = record.caller {
            line.push(' ');
            line.push_str(&caller.short());
        }
        line.push_str(" - ");
        line.push_str(&escape_control(&record.message));

        for (key, value) in record.fields.iter() {
            line.push(' ');
            line.push_str(&escape_key(key));
            line.push('=');
            line.push_str(&text_value(value));
        }

        line.push('\n');
        Ok(line)
    }
}

fn time_error(encoder: &'static str, format: &TimestampFormat) -> LoggerError {
    LoggerError::encode(encoder, format!("cannot render time layout '{}'", format))
}

/// Keep every record on one line
fn escape_control(text: &str) -> String {
    text.replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

fn escape_key(key: &str) -> String {
    key.chars()
        .filter(|c| !c.is_whitespace() && *c != '=' && *c != '"')
        .collect()
}

fn text_value(value: &FieldValue) -> String {
    let raw = value.to_string();
    let needs_quotes = match value {
        FieldValue::String(_) => {
            raw.is_empty() || raw.contains(' ') || raw.contains('"') || raw.contains('=')
        }
        _ => false,
    };
    if needs_quotes {
        let quoted = raw.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{}\"", escape_control(&quoted))
    } else {
        escape_control(&raw)
    }
}

/// Line-delimited JSON
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonEncoder {
    timestamp_format: TimestampFormat,
}

impl JsonEncoder {
    fn encode(&self, record: &LogRecord) -> Result<Vec<u8>> {
        let mut object = serde_json::Map::with_capacity(record.fields.len() + 6);

        object.insert(
            TIME_KEY.to_string(),
            self.timestamp_format
                .to_json(&record.timestamp)
                .map_err(|_| time_error("json", &self.timestamp_format))?,
        );
        object.insert(
            LEVEL_KEY.to_string(),
            serde_json::Value::String(record.level.as_lowercase().to_string()),
        );
        if let Some(ref name) = record.logger_name {
            object.insert(
                NAME_KEY.to_string(),
                serde_json::Value::String(name.to_string()),
            );
        }
        if let Some(ref caller) = record.caller {
            object.insert(
                CALLER_KEY.to_string(),
                serde_json::Value::String(caller.short()),
            );
        }
        object.insert(
            MESSAGE_KEY.to_string(),
            serde_json::Value::String(record.message.clone()),
        );

        for (key, value) in record.fields.iter() {
            let mut key = if RESERVED_KEYS.contains(&key) {
                format!("fields.{}", key)
            } else {
                key.to_string()
            };
            // A renamed reserved key can meet a literal field of the same name
            while object.contains_key(&key) {
                key = format!("fields.{}", key);
            }
            object.insert(key, value.to_json_value());
        }

        if record.level.is_high_priority() {
            if let Some(ref stacktrace) = record.stacktrace {
                object.insert(
                    STACKTRACE_KEY.to_string(),
                    serde_json::Value::String(stacktrace.clone()),
                );
            }
        }

        let mut bytes = serde_json::to_vec(&serde_json::Value::Object(object))?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::Fields;
    use crate::core::log_level::LogLevel;
    use std::sync::Arc;
    use std::time::Duration;

    fn text_line(record: &LogRecord) -> String {
        let bytes = Encoder::text(TimestampFormat::Human, false)
            .encode(record)
            .unwrap();
        String::from_utf8(bytes).unwrap()
    }

    fn json_object(record: &LogRecord) -> serde_json::Value {
        let bytes = Encoder::json(TimestampFormat::Human).encode(record).unwrap();
        assert_eq!(bytes.last(), Some(&b'\n'));
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_text_layout_order() {
        let record = LogRecord::new(LogLevel::Info, "start")
            .with_caller(std::panic::Location::caller())
            .with_fields(Fields::new().with_field("port", 8081));

        let line = text_line(&record);
        let level_at = line.find("[INFO ]").unwrap();
        let caller_at = line.find("encoder.rs:").unwrap();
        let msg_at = line.find("- start").unwrap();
        let field_at = line.find("port=8081").unwrap();

        assert!(line.starts_with('['));
        assert!(level_at < caller_at && caller_at < msg_at && msg_at < field_at);
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);
    }

    #[test]
    fn test_text_escapes_and_quotes() {
        let record = LogRecord::new(LogLevel::Warn, "two\nlines").with_fields(
            Fields::new()
                .with_field("query", "SELECT * FROM t WHERE id=1")
                .with_field("elapsed", Duration::from_millis(15)),
        );

        let line = text_line(&record);
        assert!(line.contains("two\\nlines"));
        assert!(line.contains("query=\"SELECT * FROM t WHERE id=1\""));
        assert!(line.contains("elapsed=15ms"));
        assert_eq!(line.matches('\n').count(), 1);
    }

    #[test]
    fn test_text_colors_only_when_enabled() {
        colored::control::set_override(true);
        let record = LogRecord::new(LogLevel::Error, "boom");
        let colored_line = String::from_utf8(
            Encoder::text(TimestampFormat::Human, true)
                .encode(&record)
                .unwrap(),
        )
        .unwrap();
        colored::control::unset_override();

        assert!(colored_line.contains("\u{1b}["));
        assert!(!text_line(&record).contains("\u{1b}["));
    }

    #[test]
    fn test_json_fixed_keys_in_order() {
        let record = LogRecord::new(LogLevel::Info, "ready")
            .with_caller(std::panic::Location::caller())
            .with_logger_name(Some(Arc::from("api")))
            .with_fields(Fields::new().with_field("port", 8081));

        let bytes = Encoder::json(TimestampFormat::Human).encode(&record).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let positions: Vec<usize> = ["\"time\"", "\"level\"", "\"logger\"", "\"caller\"", "\"msg\"", "\"port\""]
            .iter()
            .map(|key| text.find(key).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{}", text);

        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["level"], "info");
        assert_eq!(parsed["logger"], "api");
        assert_eq!(parsed["msg"], "ready");
        assert_eq!(parsed["port"], 8081);
        assert!(parsed.get("stacktrace").is_none());
    }

    #[test]
    fn test_json_stacktrace_for_errors() {
        let record = LogRecord::new(LogLevel::Error, "failed").capture_stacktrace();
        let parsed = json_object(&record);
        assert!(parsed["stacktrace"].is_string());
        assert!(parsed.get("logger").is_none());
    }

    #[test]
    fn test_json_reserved_key_collision() {
        let record = LogRecord::new(LogLevel::Info, "real message")
            .with_fields(Fields::new().with_field("msg", "shadow"));
        let parsed = json_object(&record);

        assert_eq!(parsed["msg"], "real message");
        assert_eq!(parsed["fields.msg"], "shadow");
    }

    #[test]
    fn test_json_renamed_key_keeps_literal_field() {
        let renamed_first = LogRecord::new(LogLevel::Info, "m").with_fields(
            Fields::new()
                .with_field("msg", "reserved")
                .with_field("fields.msg", "literal"),
        );
        let parsed = json_object(&renamed_first);
        assert_eq!(parsed["fields.msg"], "reserved");
        assert_eq!(parsed["fields.fields.msg"], "literal");

        let literal_first = LogRecord::new(LogLevel::Info, "m").with_fields(
            Fields::new()
                .with_field("fields.msg", "literal")
                .with_field("msg", "reserved"),
        );
        let parsed = json_object(&literal_first);
        assert_eq!(parsed["fields.msg"], "literal");
        assert_eq!(parsed["fields.fields.msg"], "reserved");
        assert_eq!(parsed["msg"], "m");
    }

    #[test]
    fn test_unrenderable_time_layout_is_an_error() {
        let record = LogRecord::new(LogLevel::Info, "hi");
        let layout = TimestampFormat::Custom("%Y-%Q".to_string());

        let text = Encoder::text(layout.clone(), false).encode(&record);
        assert!(matches!(text, Err(LoggerError::EncodeError { encoder: "text", .. })));

        let json = Encoder::json(layout).encode(&record);
        assert!(matches!(json, Err(LoggerError::EncodeError { encoder: "json", .. })));
    }

    #[test]
    fn test_json_duration_in_millis() {
        let record = LogRecord::new(LogLevel::Debug, "timed")
            .with_fields(Fields::new().with_field("latency", Duration::from_micros(2500)));
        let parsed = json_object(&record);
        assert_eq!(parsed["latency"], serde_json::json!(2.5));
    }

    #[test]
    fn test_json_numeric_time() {
        let record = LogRecord::new(LogLevel::Info, "t");
        let bytes = Encoder::json(TimestampFormat::UnixMillis)
            .encode(&record)
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed["time"], serde_json::json!(record.timestamp.timestamp_millis()));
    }
}
