//! Persisted forms of event records and summary lines.
//!
//! The structured log is one JSON array holding every [`EventRecord`] in
//! append order. The flat log is plain text with one summary line per
//! `\n`-terminated line.

use thiserror::Error;

use crate::error::ValidationError;
use crate::event::EventRecord;

/// Why a structured log failed to decode.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed event log: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("record {index} has an empty sessionId")]
    EmptySessionId { index: usize },

    #[error("record {index} has an empty event name")]
    EmptyEvent { index: usize },
}

/// Encode a single record as a JSON object.
pub fn encode_event(record: &EventRecord) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(record)
}

/// Encode the full structured log container.
pub fn encode_event_log(records: &[EventRecord]) -> serde_json::Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(records)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Decode a structured log. Empty input is the "no history yet" state.
pub fn decode_event_log(bytes: &[u8]) -> Result<Vec<EventRecord>, CodecError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let records: Vec<EventRecord> = serde_json::from_slice(bytes).map_err(CodecError::Malformed)?;
    for (index, record) in records.iter().enumerate() {
        if record.session_id.is_empty() {
            return Err(CodecError::EmptySessionId { index });
        }
        if record.event.is_empty() {
            return Err(CodecError::EmptyEvent { index });
        }
    }
    Ok(records)
}

/// Validate and encode a summary line, without its terminator.
pub fn encode_summary_line(text: &str) -> Result<&[u8], ValidationError> {
    if text.is_empty() {
        return Err(ValidationError::EmptySummaryLine);
    }
    if text.contains(['\n', '\r']) {
        return Err(ValidationError::MultilineSummaryLine);
    }
    Ok(text.as_bytes())
}

/// Split the flat log into its lines. Never fails; the flat log has no
/// structure beyond line boundaries.
pub fn decode_summary_log(bytes: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(bytes);
    let mut lines: Vec<String> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect();
    if lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::RecordType;
    use serde_json::json;

    fn sample() -> Vec<EventRecord> {
        vec![
            EventRecord::new("s1", "login", Some(json!({"method": "wallet", "n": 1}))),
            EventRecord::new("s2", "chat", Some(json!(["a", true, null, 2.5]))),
            EventRecord::new("s1", "logout", None),
        ]
    }

    #[test]
    fn event_log_round_trips_in_order() {
        let records = sample();
        let bytes = encode_event_log(&records).unwrap();
        assert_eq!(decode_event_log(&bytes).unwrap(), records);
    }

    #[test]
    fn single_record_is_a_json_object() {
        let record = EventRecord::new("s1", "login", None);
        let value: serde_json::Value = serde_json::from_slice(&encode_event(&record).unwrap()).unwrap();
        assert_eq!(value["type"], "event");
        assert_eq!(value["sessionId"], "s1");
    }

    #[test]
    fn empty_input_is_empty_log() {
        assert!(decode_event_log(b"").unwrap().is_empty());
        assert!(decode_event_log(b"  \n").unwrap().is_empty());
        assert!(decode_event_log(b"[]").unwrap().is_empty());
    }

    #[test]
    fn truncated_log_is_malformed() {
        let bytes = encode_event_log(&sample()).unwrap();
        let truncated = &bytes[..bytes.len() / 2];
        assert!(matches!(
            decode_event_log(truncated),
            Err(CodecError::Malformed(_))
        ));
    }

    #[test]
    fn wrong_container_is_malformed() {
        assert!(matches!(
            decode_event_log(br#"{"type":"event"}"#),
            Err(CodecError::Malformed(_))
        ));
        assert!(matches!(
            decode_event_log(br#"[{"type":"other","sessionId":"s","event":"e","data":null,"timestamp":"2026-01-01T00:00:00Z"}]"#),
            Err(CodecError::Malformed(_))
        ));
    }

    #[test]
    fn empty_identifiers_are_rejected() {
        let bytes = br#"[
            {"type":"event","sessionId":"s1","event":"ok","data":null,"timestamp":"2026-01-01T00:00:00Z"},
            {"type":"event","sessionId":"","event":"bad","data":null,"timestamp":"2026-01-01T00:00:00Z"}
        ]"#;
        assert!(matches!(
            decode_event_log(bytes),
            Err(CodecError::EmptySessionId { index: 1 })
        ));

        let bytes = br#"[{"type":"event","sessionId":"s1","event":"","timestamp":"2026-01-01T00:00:00Z"}]"#;
        assert!(matches!(
            decode_event_log(bytes),
            Err(CodecError::EmptyEvent { index: 0 })
        ));
    }

    #[test]
    fn missing_data_field_decodes_as_none() {
        let bytes = br#"[{"type":"event","sessionId":"s1","event":"ping","timestamp":"2026-01-01T00:00:00Z"}]"#;
        let records = decode_event_log(bytes).unwrap();
        assert_eq!(records[0].record_type, RecordType::Event);
        assert_eq!(records[0].data, None);
    }

    #[test]
    fn summary_line_validation() {
        assert_eq!(encode_summary_line("ok").unwrap(), b"ok");
        assert_eq!(
            encode_summary_line(""),
            Err(ValidationError::EmptySummaryLine)
        );
        assert_eq!(
            encode_summary_line("line1\nline2"),
            Err(ValidationError::MultilineSummaryLine)
        );
        assert_eq!(
            encode_summary_line("line1\r"),
            Err(ValidationError::MultilineSummaryLine)
        );
    }

    #[test]
    fn summary_log_splits_lines() {
        assert_eq!(decode_summary_log(b"a\nb\n"), vec!["a", "b"]);
        assert_eq!(decode_summary_log(b"a\r\nb"), vec!["a", "b"]);
        assert_eq!(decode_summary_log(b"a\n\n"), vec!["a", ""]);
        assert!(decode_summary_log(b"").is_empty());
    }
}
