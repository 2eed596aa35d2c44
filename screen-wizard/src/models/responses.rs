// API response models
// Envelope returned by the console back end, plus the screen record it carries.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// =========================
// Generic wrapper (matches the back end's ApiResponse<T>)
// =========================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn default_success() -> bool {
    true
}

impl<T> ApiResponse<T> {
    /// Best human-readable explanation carried by the envelope, if any.
    pub fn failure_message(&self) -> Option<&str> {
        let non_blank = |m: &&str| !m.trim().is_empty();
        self.error
            .as_deref()
            .filter(non_blank)
            .or_else(|| self.message.as_deref().filter(non_blank))
    }
}

// =========================
// Screens
// =========================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenRecord {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub solution_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// RFC 3339, or a zone-less `YYYY-MM-DDTHH:MM:SS[.fff]` read as UTC. Anything else is dropped
/// so an odd timestamp never turns a created screen into a failed registration.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let Some(serde_json::Value::String(text)) = raw else {
        return Ok(None);
    };
    let text = text.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    Ok(["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|naive| naive.and_utc()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_decodes_screen_record() {
        let body = r#"{"success":true,"data":{"id":42,"name":"Lobby wall","createdAt":"2026-03-01T10:00:00Z"}}"#;
        let parsed: ApiResponse<ScreenRecord> = serde_json::from_str(body).expect("decode");
        let record = parsed.data.expect("data");
        assert_eq!(record.id, 42);
        assert_eq!(record.name, "Lobby wall");
        assert!(record.created_at.is_some());
        assert!(record.solution_type.is_none());
    }

    #[test]
    fn created_at_without_zone_or_unparseable_still_decodes() {
        let naive: ScreenRecord =
            serde_json::from_str(r#"{"id":1,"name":"A","createdAt":"2026-03-01T10:00:00"}"#)
                .expect("zone-less timestamp");
        assert_eq!(
            naive.created_at.map(|t| t.to_rfc3339()),
            Some("2026-03-01T10:00:00+00:00".to_string())
        );

        for body in [
            r#"{"id":2,"name":"B","createdAt":"yesterday"}"#,
            r#"{"id":3,"name":"C","createdAt":null}"#,
            r#"{"id":4,"name":"D","createdAt":[2026,3,1]}"#,
        ] {
            let record: ScreenRecord = serde_json::from_str(body).expect("lenient decode");
            assert!(record.created_at.is_none(), "body: {}", body);
        }
    }

    #[test]
    fn failure_message_prefers_error_then_message() {
        let both: ApiResponse<ScreenRecord> = ApiResponse {
            success: false,
            data: None,
            error: Some("Duplicate screen name".to_string()),
            message: Some("Bad request".to_string()),
        };
        assert_eq!(both.failure_message(), Some("Duplicate screen name"));

        let blank: ApiResponse<ScreenRecord> = ApiResponse {
            success: false,
            data: None,
            error: Some("  ".to_string()),
            message: None,
        };
        assert_eq!(blank.failure_message(), None);

        let fallback: ApiResponse<ScreenRecord> =
            serde_json::from_str(r#"{"success":false,"message":"nope"}"#).expect("decode");
        assert_eq!(fallback.failure_message(), Some("nope"));
    }
}
