// Logging utilities
// Structured logging with JSON and human-readable formats

use log::Level;
use serde_json::json;

/// Mask sensitive data in logs
pub fn mask_sensitive(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    if chars.len() <= 8 {
        return "***".to_string();
    }

    let visible = 4;
    let start: String = chars[..visible].iter().collect();
    let end: String = chars[chars.len() - visible..].iter().collect();

    format!("{}...{}", start, end)
}

/// Extract a bracketed `[TAG: value]` marker, returning its value and the message without it.
fn take_marker(message: &str, tag: &str) -> (Option<String>, String) {
    let open = format!("[{}:", tag);
    let Some(start) = message.find(&open) else {
        return (None, message.to_string());
    };
    let Some(end) = message[start..].find(']') else {
        return (None, message.to_string());
    };
    let value = message[start + open.len()..start + end].trim().to_string();
    let cleaned = format!("{} {}", &message[..start], &message[start + end + 1..])
        .trim()
        .to_string();
    (Some(value), cleaned)
}

/// Parse phase and step from log message
/// Extracts [PHASE: ...] and [STEP: ...] patterns
pub fn parse_log_metadata(message: &str) -> (Option<String>, Option<String>, String) {
    let (phase, rest) = take_marker(message, "PHASE");
    let (step, cleaned) = take_marker(&rest, "STEP");
    (phase, step, cleaned)
}

/// Pull `correlation_id=<uuid>` out of a message so it can be indexed as its own field.
pub fn parse_correlation_id(message: &str) -> Option<String> {
    let start = message.find("correlation_id=")? + "correlation_id=".len();
    let id: String = message[start..]
        .chars()
        .take_while(|c| c.is_ascii_hexdigit() || *c == '-')
        .collect();
    (!id.is_empty()).then_some(id)
}

/// Format log entry as JSON for structured logging
pub fn format_json_log(
    timestamp: &str,
    level: Level,
    target: &str,
    message: &str,
    phase: Option<&str>,
    step: Option<&str>,
) -> String {
    let mut log_entry = json!({
        "timestamp": timestamp,
        "level": level.as_str(),
        "target": target,
        "message": message,
    });

    if let Some(phase) = phase {
        log_entry["phase"] = json!(phase);
    }

    if let Some(step) = step {
        log_entry["step"] = json!(step);
    }

    if let Some(id) = parse_correlation_id(message) {
        log_entry["correlation_id"] = json!(id);
    }

    serde_json::to_string(&log_entry).unwrap_or_else(|_| "{}".to_string())
}

/// Format log entry as human-readable text
pub fn format_human_readable_log(
    timestamp: &str,
    level: Level,
    target: &str,
    message: &str,
    phase: Option<&str>,
    step: Option<&str>,
) -> String {
    let mut log_line = format!("[{}] [{}]", timestamp, level.as_str());

    if let Some(phase) = phase {
        log_line.push_str(&format!(" [PHASE: {}]", phase));
    }

    if let Some(step) = step {
        log_line.push_str(&format!(" [STEP: {}]", step));
    }

    log_line.push_str(&format!(" [{}] {}", target, message));
    log_line
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // A) Secret masking
    // -------------------------------------------------------------------------

    #[test]
    fn mask_sensitive_short_values_fully_masked() {
        assert_eq!(mask_sensitive("abc"), "***");
        assert_eq!(mask_sensitive("12345678"), "***");
    }

    #[test]
    fn mask_sensitive_long_values_partially_masked() {
        let masked = mask_sensitive("abcdefghijklmnop");
        assert_eq!(masked, "abcd...mnop");
    }

    #[test]
    fn mask_sensitive_does_not_split_multibyte_chars() {
        let masked = mask_sensitive("ééééééééééé");
        assert_eq!(masked, "éééé...éééé");
    }

    // -------------------------------------------------------------------------
    // B) Metadata extraction
    // -------------------------------------------------------------------------

    #[test]
    fn parse_log_metadata_extracts_phase_and_step() {
        let (phase, step, msg) =
            parse_log_metadata("[PHASE: submit] [STEP: begin] Payload assembled");
        assert_eq!(phase.as_deref(), Some("submit"));
        assert_eq!(step.as_deref(), Some("begin"));
        assert_eq!(msg, "Payload assembled");
    }

    #[test]
    fn parse_log_metadata_leaves_plain_messages_alone() {
        let (phase, step, msg) = parse_log_metadata("plain message");
        assert!(phase.is_none() && step.is_none());
        assert_eq!(msg, "plain message");
    }

    #[test]
    fn json_log_carries_correlation_id_field() {
        let line = format_json_log(
            "2026-01-01T00:00:00Z",
            Level::Info,
            "screen_wizard",
            "Sent (correlation_id=0b4d9a52-1c1e-4c43-9a55-3f1c2b7d8e90)",
            Some("submit"),
            Some("dispatch"),
        );
        let v: serde_json::Value = serde_json::from_str(&line).expect("valid json");
        assert_eq!(v["phase"], "submit");
        assert_eq!(v["step"], "dispatch");
        assert_eq!(v["correlation_id"], "0b4d9a52-1c1e-4c43-9a55-3f1c2b7d8e90");
    }

    #[test]
    fn human_readable_log_includes_markers() {
        let line = format_human_readable_log(
            "ts",
            Level::Warn,
            "screen_wizard::wizard",
            "Ignored edit",
            Some("wizard"),
            None,
        );
        assert_eq!(line, "[ts] [WARN] [PHASE: wizard] [screen_wizard::wizard] Ignored edit");
    }
}
