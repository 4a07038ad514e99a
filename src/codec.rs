//! One-line JSON encoding of provenance records.

use crate::errors::CoreError;
use crate::models::TrashedFile;

/// Serializes a record into a single line without the trailing newline.
pub fn encode(record: &TrashedFile) -> crate::Result<String> {
    serde_json::to_string(record).map_err(|err| CoreError::invalid_input(format!("unencodable record: {err}")))
}

/// Parses one log line. `stream` names the source in the error.
pub fn decode(stream: &str, line: &str) -> crate::Result<TrashedFile> {
    serde_json::from_str(line.trim()).map_err(|err| CoreError::corrupt(stream, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordState;

    const LEGACY_LINE: &str = r#"{"file_name":"a.txt","origin_path":"/tmp/a.txt","target_path":"/t/fileInfos/a.txt.20250829173530","operator":{"username":"me"},"file_size":3,"deletion_date":"2025-08-29 17:35:30"}"#;

    #[test]
    fn line_without_state_decodes_as_held() {
        let record = decode("a.txt.20250829173530.backup", LEGACY_LINE).expect("decode");
        assert_eq!(record.state, RecordState::Held);
        assert_eq!(record.operator.username, "me");
        assert_eq!(record.operator.uid, "");
        assert_eq!(record.file_size, 3);
    }

    #[test]
    fn encoded_record_uses_stable_field_names() {
        let record = decode("s", LEGACY_LINE).expect("decode");
        let line = encode(&record).expect("encode");
        assert!(!line.contains('\n'));
        for field in ["file_name", "origin_path", "target_path", "operator", "file_size", "deletion_date", "state"] {
            assert!(line.contains(&format!("\"{field}\"")), "missing {field} in {line}");
        }
        assert!(line.contains("\"deletion_date\":\"2025-08-29 17:35:30\""));
        assert!(line.contains("\"state\":\"held\""));
    }

    #[test]
    fn garbage_is_corrupt() {
        let err = decode("broken.backup", "{not json").unwrap_err();
        assert!(matches!(err, CoreError::Corrupt { ref stream, .. } if stream == "broken.backup"));
    }

    #[test]
    fn malformed_date_is_corrupt() {
        let line = LEGACY_LINE.replace("2025-08-29 17:35:30", "yesterday");
        assert!(matches!(decode("s", &line), Err(CoreError::Corrupt { .. })));
    }
}
