//! JSON encoding and decoding of protocol messages.
//!
//! Decoding happens in two stages. The raw text must first parse as a JSON
//! object, otherwise the client gets `bad_json`. The `type` tag then picks the
//! variant, and the variant's fields are read leniently:
//!
//! * string fields accept strings or numbers and are trimmed; anything else
//!   (absent, `null`, booleans, objects) becomes the empty string
//! * `dx`/`dy` accept integers, finite floats (truncated toward zero) and
//!   numeric strings; anything else becomes `0`
//!
//! An object whose tag is missing or unknown decodes to `Ok(None)` so newer
//! clients can send kinds this server does not know about.

use super::types::{ClientMessage, ServerMessage};
use crate::error::ProtocolError;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Decodes one client message.
///
/// # Returns
///
/// * `Ok(Some(message))` for a known kind
/// * `Ok(None)` for a JSON object with a missing or unrecognized `type`
/// * `Err(ProtocolError::BadJson)` if the text is not a JSON object
pub fn decode_client_message(text: &str) -> Result<Option<ClientMessage>, ProtocolError> {
    let value: Value = serde_json::from_str(text).map_err(|_| ProtocolError::BadJson)?;
    if !value.is_object() {
        return Err(ProtocolError::BadJson);
    }

    let kind = value.get("type").and_then(Value::as_str).unwrap_or_default();
    let message = match kind {
        "hello" => {
            let fields: JoinFields = from_fields(value)?;
            ClientMessage::Join { fid: fields.fid }
        }
        "move" => {
            let fields: MoveFields = from_fields(value)?;
            ClientMessage::Move {
                dx: fields.dx,
                dy: fields.dy,
            }
        }
        "mail_send" => {
            let fields: MailSendFields = from_fields(value)?;
            ClientMessage::MailSend {
                to: fields.to,
                subject: fields.subject,
                body: fields.body,
            }
        }
        "mail_list" => ClientMessage::MailList,
        _ => return Ok(None),
    };

    Ok(Some(message))
}

/// Encodes one server message as JSON text.
pub fn encode_server_message(message: &ServerMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(message)
}

fn from_fields<T: for<'de> Deserialize<'de>>(value: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(value).map_err(|_| ProtocolError::BadJson)
}

#[derive(Deserialize)]
struct JoinFields {
    #[serde(default, deserialize_with = "lenient_string")]
    fid: String,
}

#[derive(Deserialize)]
struct MoveFields {
    #[serde(default, deserialize_with = "lenient_delta")]
    dx: i64,
    #[serde(default, deserialize_with = "lenient_delta")]
    dy: i64,
}

#[derive(Deserialize)]
struct MailSendFields {
    #[serde(default, deserialize_with = "lenient_string")]
    to: String,
    #[serde(default, deserialize_with = "lenient_string")]
    subject: String,
    #[serde(default, deserialize_with = "lenient_string")]
    body: String,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

fn lenient_delta<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let delta = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(truncate)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(truncate))
        }
        _ => None,
    };
    Ok(delta.unwrap_or(0))
}

// `as` saturates at the i64 bounds
fn truncate(value: f64) -> Option<i64> {
    value.is_finite().then(|| value.trunc() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_join() {
        let message = decode_client_message(r#"{"type":"hello","fid":"  alice "}"#).unwrap();
        assert_eq!(message, Some(ClientMessage::Join { fid: "alice".into() }));
    }

    #[test]
    fn test_numeric_fid_becomes_string() {
        let message = decode_client_message(r#"{"type":"hello","fid":4242}"#).unwrap();
        assert_eq!(message, Some(ClientMessage::Join { fid: "4242".into() }));
    }

    #[test]
    fn test_join_without_fid_decodes_to_empty() {
        for text in [
            r#"{"type":"hello"}"#,
            r#"{"type":"hello","fid":null}"#,
            r#"{"type":"hello","fid":{"nested":true}}"#,
            r#"{"type":"hello","fid":"   "}"#,
        ] {
            let message = decode_client_message(text).unwrap();
            assert_eq!(message, Some(ClientMessage::Join { fid: String::new() }), "{text}");
        }
    }

    #[test]
    fn test_move_deltas_default_to_zero() {
        let message = decode_client_message(r#"{"type":"move"}"#).unwrap();
        assert_eq!(message, Some(ClientMessage::Move { dx: 0, dy: 0 }));

        let message = decode_client_message(r#"{"type":"move","dx":"left","dy":null}"#).unwrap();
        assert_eq!(message, Some(ClientMessage::Move { dx: 0, dy: 0 }));
    }

    #[test]
    fn test_move_deltas_coerce_numbers_and_numeric_strings() {
        let message = decode_client_message(r#"{"type":"move","dx":-3,"dy":" 7 "}"#).unwrap();
        assert_eq!(message, Some(ClientMessage::Move { dx: -3, dy: 7 }));

        let message = decode_client_message(r#"{"type":"move","dx":1.9,"dy":"-2.5"}"#).unwrap();
        assert_eq!(message, Some(ClientMessage::Move { dx: 1, dy: -2 }));
    }

    #[test]
    fn test_decode_mail_send_trims_fields() {
        let message =
            decode_client_message(r#"{"type":"mail_send","to":" bob ","subject":" hi ","body":" hello "}"#)
                .unwrap();
        assert_eq!(
            message,
            Some(ClientMessage::MailSend {
                to: "bob".into(),
                subject: "hi".into(),
                body: "hello".into(),
            })
        );
    }

    #[test]
    fn test_mail_send_subject_is_optional() {
        let message = decode_client_message(r#"{"type":"mail_send","to":"bob","body":"x"}"#).unwrap();
        assert_eq!(
            message,
            Some(ClientMessage::MailSend {
                to: "bob".into(),
                subject: String::new(),
                body: "x".into(),
            })
        );
    }

    #[test]
    fn test_decode_mail_list_ignores_extra_fields() {
        let message = decode_client_message(r#"{"type":"mail_list","page":3}"#).unwrap();
        assert_eq!(message, Some(ClientMessage::MailList));
    }

    #[test]
    fn test_unknown_or_missing_type_is_not_an_error() {
        assert_eq!(decode_client_message(r#"{"type":"build","x":1}"#), Ok(None));
        assert_eq!(decode_client_message(r#"{"fid":"alice"}"#), Ok(None));
        assert_eq!(decode_client_message(r#"{"type":7}"#), Ok(None));
    }

    #[test]
    fn test_malformed_text_is_bad_json() {
        for text in ["", "{", "not json", "null", "42", r#""hello""#, "[1,2]"] {
            assert_eq!(decode_client_message(text), Err(ProtocolError::BadJson), "{text}");
        }
    }

    #[test]
    fn test_client_message_serializes_with_wire_tags() {
        let join = serde_json::to_value(ClientMessage::Join { fid: "alice".into() }).unwrap();
        assert_eq!(join, serde_json::json!({"type": "hello", "fid": "alice"}));

        let list = serde_json::to_value(ClientMessage::MailList).unwrap();
        assert_eq!(list, serde_json::json!({"type": "mail_list"}));
    }

    #[test]
    fn test_error_reply_encoding() {
        let text = encode_server_message(&ServerMessage::error(ProtocolError::NotJoined)).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, serde_json::json!({"type": "error", "message": "not_joined"}));
    }

    #[test]
    fn test_notify_encoding_uses_created_at() {
        let message = ServerMessage::Notify {
            items: vec![pilar_world::Notification {
                text: "Mail from alice".into(),
                created_at: 17,
            }],
        };
        let value: Value = serde_json::from_str(&encode_server_message(&message).unwrap()).unwrap();
        assert_eq!(value["type"], "notify");
        assert_eq!(value["items"][0]["text"], "Mail from alice");
        assert_eq!(value["items"][0]["createdAt"], 17);
    }
}
