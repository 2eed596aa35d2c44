// Screen registration boundary
//
// The wizard talks to the back end through the ScreenRegistrationService trait.
// Production code uses HttpRegistrationService (multipart POST); tests use stubs.

use crate::models::payload::SubmissionPayload;
use crate::models::responses::{ApiResponse, ScreenRecord};
use crate::utils::logging::mask_sensitive;
use crate::utils::settings::ApiSettings;

use anyhow::Context;
use async_trait::async_trait;
use log::{info, warn};
use reqwest::multipart::{Form, Part};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Failure reported by the registration boundary. Every variant renders a message that can be
/// shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("Could not reach the registration service: {0}")]
    Transport(String),
    #[error("The server rejected the screen ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Unexpected response from the registration service: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait ScreenRegistrationService: Send + Sync {
    async fn create_screen(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<ScreenRecord, RegistrationError>;
}

/// Production service: multipart POST to `{base_url}{screens_path}`.
pub struct HttpRegistrationService {
    client: reqwest::Client,
    endpoint: url::Url,
    bearer_token: Option<String>,
}

impl HttpRegistrationService {
    pub fn from_settings(api: &ApiSettings) -> anyhow::Result<Self> {
        let endpoint = api.screens_endpoint()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(api.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        info!(
            "[PHASE: registration] [STEP: init] Registration endpoint {} (timeout_secs={}, token={})",
            endpoint,
            api.timeout_secs,
            api.bearer_token
                .as_deref()
                .map(mask_sensitive)
                .unwrap_or_else(|| "none".to_string())
        );

        Ok(Self {
            client,
            endpoint,
            bearer_token: api.bearer_token.clone().filter(|t| !t.trim().is_empty()),
        })
    }
}

fn build_form(payload: &SubmissionPayload) -> Result<Form, RegistrationError> {
    let mut form = Form::new();
    for (name, value) in payload.text_parts() {
        form = form.text(name, value);
    }

    for (slot, file) in payload.files.iter() {
        let part = Part::bytes(file.bytes.to_vec())
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| {
                RegistrationError::Transport(format!(
                    "invalid content type for {}: {}",
                    slot.wire_name(),
                    e
                ))
            })?;
        form = form.part(slot.wire_name(), part);
    }

    let (name, body, mime) = payload.layout_part().map_err(|e| {
        RegistrationError::Transport(format!("failed to encode {}: {}", payload.solution_type.as_wire(), e))
    })?;
    let part = Part::text(body)
        .mime_str(mime)
        .map_err(|e| RegistrationError::Transport(format!("invalid content type: {}", e)))?;
    Ok(form.part(name, part))
}

/// Turn a raw HTTP status + body into the boundary result.
pub(crate) fn interpret_response(
    status: u16,
    body: &str,
) -> Result<ScreenRecord, RegistrationError> {
    let parsed = serde_json::from_str::<ApiResponse<ScreenRecord>>(body);
    let ok_status = (200..300).contains(&status);

    if !ok_status {
        let message = parsed
            .as_ref()
            .ok()
            .and_then(|p| p.failure_message().map(str::to_string))
            .unwrap_or_else(|| format!("HTTP {}", status));
        return Err(RegistrationError::Rejected { status, message });
    }

    match parsed {
        Ok(resp) if !resp.success => Err(RegistrationError::Rejected {
            status,
            message: resp
                .failure_message()
                .unwrap_or("Screen registration failed")
                .to_string(),
        }),
        Ok(ApiResponse {
            data: Some(record), ..
        }) => Ok(record),
        Ok(_) => Err(RegistrationError::InvalidResponse(
            "response carried no screen record".to_string(),
        )),
        Err(e) => Err(RegistrationError::InvalidResponse(e.to_string())),
    }
}

#[async_trait]
impl ScreenRegistrationService for HttpRegistrationService {
    async fn create_screen(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<ScreenRecord, RegistrationError> {
        let started = Instant::now();
        let form = build_form(payload)?;

        let mut request = self.client.post(self.endpoint.clone()).multipart(form);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await.map_err(|e| {
            warn!(
                "[PHASE: registration] [STEP: submit] Transport failure: {} (timeout={})",
                e,
                e.is_timeout()
            );
            RegistrationError::Transport(e.to_string())
        })?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| RegistrationError::Transport(e.to_string()))?;

        info!(
            "[PHASE: registration] [STEP: submit] POST {} -> {} (duration_ms={})",
            self.endpoint,
            status,
            started.elapsed().as_millis()
        );

        interpret_response(status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::draft::{Attachment, ComponentKind, FileSlot, ScreenType, SolutionType};
    use crate::models::payload::{ComponentLine, LayoutPayload, ModuleDto, PayloadFiles};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn sample_payload() -> SubmissionPayload {
        SubmissionPayload {
            name: "Lobby".to_string(),
            screen_type: ScreenType::Indoor,
            solution_type: SolutionType::ModuleSolution,
            location: "https://maps.app.goo.gl/lobby".to_string(),
            pixel_screen: "P2.5".to_string(),
            description: None,
            components: vec![ComponentLine {
                kind: ComponentKind::PowerSupply,
                type_name: Some("Meanwell 200W".to_string()),
                quantity: Some(12),
                spare_quantity: None,
            }],
            files: PayloadFiles {
                connection_file: Attachment::new("connection.json", b"{\"ip\":\"10.0.0.5\"}".to_vec()),
                config_file: Attachment::new("screen.cfg", b"brightness=80".to_vec()),
                version_file: Attachment::new("firmware.bin", vec![0u8, 1, 2]),
            },
            layout: LayoutPayload::Modules(vec![ModuleDto {
                width_quantity: 8,
                height_quantity: 4,
                height: 160.0,
                width: 320.0,
                module_batch_number: "B-12".to_string(),
                is_width: true,
                is_height: true,
            }]),
        }
    }

    /// Whole multipart request seen: headers plus the closing boundary.
    fn request_complete(raw: &str) -> bool {
        let boundary = raw.lines().find_map(|line| {
            let lower = line.to_ascii_lowercase();
            if lower.starts_with("content-type: multipart/form-data") {
                line.split("boundary=").nth(1).map(|b| b.trim().to_string())
            } else {
                None
            }
        });
        match boundary {
            Some(b) => raw.contains(&format!("--{}--", b)),
            None => false,
        }
    }

    /// Accept one connection, answer 201 with `reply`, and hand back the raw request text.
    async fn capture_one_request(listener: TcpListener, reply: &'static str) -> String {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut buf = Vec::new();
        let mut chunk = [0u8; 8192];
        loop {
            let n = socket.read(&mut chunk).await.expect("read");
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if request_complete(&String::from_utf8_lossy(&buf)) {
                break;
            }
        }
        let response = format!(
            "HTTP/1.1 201 Created\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            reply.len(),
            reply
        );
        socket.write_all(response.as_bytes()).await.expect("write");
        let _ = socket.shutdown().await;
        String::from_utf8_lossy(&buf).into_owned()
    }

    // -------------------------------------------------------------------------
    // A) Wire shape
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn http_service_posts_named_parts_and_decodes_record() {
        // INTENT: the back end binds parts by name, so file parts must carry the slot name,
        // the original file name and its content type.
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let server = tokio::spawn(capture_one_request(
            listener,
            r#"{"success":true,"data":{"id":9,"name":"Lobby","createdAt":"2026-03-01T10:00:00"}}"#,
        ));

        let settings = ApiSettings {
            base_url: format!("http://{}", addr),
            bearer_token: Some("secret-token-123".to_string()),
            ..ApiSettings::default()
        };
        let service = HttpRegistrationService::from_settings(&settings).expect("service");
        let record = service
            .create_screen(&sample_payload())
            .await
            .expect("201 with a record is a success");
        assert_eq!(record.id, 9);

        let raw = server.await.expect("server task");
        let lower = raw.to_ascii_lowercase();
        assert!(raw.starts_with("POST /api/screens "), "request line: {}", raw);
        assert!(lower.contains("authorization: bearer secret-token-123"));

        for (name, file_name, mime) in [
            ("connectionFile", "connection.json", "application/json"),
            ("configFile", "screen.cfg", "text/plain"),
            ("versionFile", "firmware.bin", "application/octet-stream"),
        ] {
            let disposition = format!("name=\"{}\"; filename=\"{}\"", name, file_name);
            let at = raw
                .find(&disposition)
                .unwrap_or_else(|| panic!("missing file part {}: {}", disposition, raw));
            let part_headers = raw[at..].split("\r\n\r\n").next().unwrap_or_default();
            assert!(
                part_headers.to_ascii_lowercase().contains(&format!("content-type: {}", mime)),
                "part {} headers: {}",
                name,
                part_headers
            );
        }

        assert!(raw.contains("name=\"moduleDtoListJson\""), "module list part: {}", raw);
        assert!(raw.contains("\"moduleBatchNumber\":\"B-12\""));
        assert!(raw.contains("name=\"powerSupplyQuantity\"\r\n\r\n12\r\n"));
        assert!(!raw.contains("name=\"cabinets\""), "inactive branch must not be sent");
        assert!(!raw.contains("name=\"description\""), "absent optional value has no part");
    }

    #[test]
    fn bad_attachment_content_type_is_a_transport_error() {
        let mut payload = sample_payload();
        payload.files.config_file.content_type = "not a mime type".to_string();
        match build_form(&payload) {
            Err(RegistrationError::Transport(msg)) => {
                assert!(msg.contains(FileSlot::Config.wire_name()), "message: {}", msg)
            }
            Err(other) => panic!("expected transport error, got {:?}", other),
            Ok(_) => panic!("invalid content type must be refused"),
        }
        assert!(build_form(&sample_payload()).is_ok());
    }

    // -------------------------------------------------------------------------
    // B) Response interpretation
    // -------------------------------------------------------------------------

    #[test]
    fn created_record_with_zone_less_timestamp_is_a_success() {
        // INTENT: a screen the server created must never be reported as a failure (the user
        // would resubmit and register it twice).
        let body = r#"{"success":true,"data":{"id":7,"name":"Lobby","createdAt":"2026-03-01T10:00:00"}}"#;
        let record = interpret_response(201, body).expect("record");
        assert_eq!(record.id, 7);
        assert!(record.created_at.is_some());

        let odd = r#"{"success":true,"data":{"id":8,"name":"Lobby","createdAt":"01/03/2026"}}"#;
        let record = interpret_response(201, odd).expect("unknown timestamp format is ignored");
        assert_eq!(record.id, 8);
        assert!(record.created_at.is_none());
    }

    #[test]
    fn success_envelope_yields_record() {
        let body = r#"{"success":true,"data":{"id":7,"name":"Lobby"}}"#;
        let record = interpret_response(201, body).expect("record");
        assert_eq!(record.id, 7);
        assert_eq!(record.name, "Lobby");
    }

    #[test]
    fn error_status_uses_server_message() {
        let body = r#"{"success":false,"error":"Screen name already exists"}"#;
        let err = interpret_response(409, body).unwrap_err();
        assert_eq!(
            err,
            RegistrationError::Rejected {
                status: 409,
                message: "Screen name already exists".to_string()
            }
        );
        assert!(
            err.to_string().contains("Screen name already exists"),
            "message should be user-facing: {}",
            err
        );
    }

    #[test]
    fn error_status_without_body_falls_back_to_status() {
        let err = interpret_response(502, "<html>Bad gateway</html>").unwrap_err();
        assert_eq!(
            err,
            RegistrationError::Rejected {
                status: 502,
                message: "HTTP 502".to_string()
            }
        );
    }

    #[test]
    fn success_flag_false_is_a_rejection_even_on_200() {
        let body = r#"{"success":false,"message":"Location is invalid"}"#;
        match interpret_response(200, body) {
            Err(RegistrationError::Rejected { status, message }) => {
                assert_eq!(status, 200);
                assert_eq!(message, "Location is invalid");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn garbage_body_on_success_is_invalid_response() {
        assert!(matches!(
            interpret_response(200, "not json"),
            Err(RegistrationError::InvalidResponse(_))
        ));
        assert!(matches!(
            interpret_response(200, r#"{"success":true}"#),
            Err(RegistrationError::InvalidResponse(_))
        ));
    }
}
