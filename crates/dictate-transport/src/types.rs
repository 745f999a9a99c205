use serde::Serialize;

/// Context sent as the first client message once a connection is opened
/// (the auth message, spec §4.3/§6). `app_context`/`app_name`/`window_title`
/// come from C4; capture may not have finished yet, in which case the
/// caller passes `SessionContext::default()` and the real capture result is
/// simply discarded.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionContext {
    pub app_context: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clipboard_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub(crate) struct AuthMessage<'a> {
    pub token: &'a str,
    #[serde(flatten)]
    pub context: &'a SessionContext,
}

/// Events forwarded to the State Machine after parsing a server text frame
/// (spec §4.3 Receive). `confirmed` is the stable prefix of the
/// transcription that will not change; `partial` is the unstable tail.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptionEvent {
    Partial { partial: String, confirmed: String },
    Final { text: String },
    Error { message: String },
}

/// Parses one server text frame per spec §4.3's recognized shapes, including
/// the legacy `{raw}` fallback for the final text field. Returns `None` for
/// anything unrecognized rather than surfacing a protocol error — a
/// forward-compatible server addition should not abort the session.
pub(crate) fn parse_server_message(text: &str) -> Option<TranscriptionEvent> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;

    if let Some(error) = value.get("error").and_then(|v| v.as_str()) {
        return Some(TranscriptionEvent::Error {
            message: error.to_string(),
        });
    }

    match value.get("type").and_then(|v| v.as_str()) {
        Some("partial") => {
            let partial = value.get("partial")?.as_str()?.to_string();
            let confirmed = value
                .get("confirmed")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            Some(TranscriptionEvent::Partial { partial, confirmed })
        }
        Some("final") => {
            let text = value
                .get("text")
                .and_then(|v| v.as_str())
                .or_else(|| value.get("raw").and_then(|v| v.as_str()))?
                .to_string();
            Some(TranscriptionEvent::Final { text })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_message() {
        let event = parse_server_message(
            r#"{"type":"partial","partial":"world","confirmed":"hello "}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            TranscriptionEvent::Partial {
                partial: "world".into(),
                confirmed: "hello ".into()
            }
        );
    }

    #[test]
    fn parses_final_message() {
        let event = parse_server_message(r#"{"type":"final","text":"hello world"}"#).unwrap();
        assert_eq!(
            event,
            TranscriptionEvent::Final {
                text: "hello world".into()
            }
        );
    }

    #[test]
    fn parses_legacy_raw_final() {
        let event = parse_server_message(r#"{"type":"final","raw":"legacy text"}"#).unwrap();
        assert_eq!(
            event,
            TranscriptionEvent::Final {
                text: "legacy text".into()
            }
        );
    }

    #[test]
    fn parses_untagged_error_message() {
        let event = parse_server_message(r#"{"error":"model unavailable"}"#).unwrap();
        assert_eq!(
            event,
            TranscriptionEvent::Error {
                message: "model unavailable".into()
            }
        );
    }

    #[test]
    fn unrecognized_shape_yields_none() {
        assert!(parse_server_message(r#"{"type":"ping"}"#).is_none());
    }
}
