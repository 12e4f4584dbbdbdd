use serde::{Deserialize, Serialize};

/// Scan-lifecycle event, delivered to subscribers in emission order.
///
/// The wire contract is one JSON object per event with a `type` tag; the
/// tag strings (`folders`, `scanning`, ...) are what existing transports
/// consume, so they are kept even where the prose name differs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProgressEvent {
    Connecting {
        message: String,
    },
    #[serde(rename = "folders")]
    FoldersFound {
        message: String,
        total: usize,
    },
    #[serde(rename = "scanning")]
    ScanningFolder {
        message: String,
        current: usize,
        total: usize,
        folder: String,
        percentage: u8,
    },
    Processing {
        message: String,
        current: usize,
        total: usize,
        percentage: u8,
    },
    Saving {
        message: String,
    },
    Complete {
        message: String,
        total: usize,
    },
    Error {
        message: String,
    },
}

impl ProgressEvent {
    /// Terminal events close the channel for the scan that emitted them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressEvent::Complete { .. } | ProgressEvent::Error { .. })
    }

    /// One JSON object per event; transports frame this however they push
    /// text (the reference transport wrapped each one as an SSE data line).
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| r#"{"type":"error","message":"unserializable event"}"#.to_string())
    }

    pub fn message(&self) -> &str {
        match self {
            ProgressEvent::Connecting { message }
            | ProgressEvent::FoldersFound { message, .. }
            | ProgressEvent::ScanningFolder { message, .. }
            | ProgressEvent::Processing { message, .. }
            | ProgressEvent::Saving { message }
            | ProgressEvent::Complete { message, .. }
            | ProgressEvent::Error { message } => message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_tags() {
        let event = ProgressEvent::FoldersFound {
            message: "Found 3 folders to scan".into(),
            total: 3,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "folders");
        assert_eq!(json["total"], 3);

        let event = ProgressEvent::ScanningFolder {
            message: "Scanning folder: INBOX".into(),
            current: 1,
            total: 4,
            folder: "INBOX".into(),
            percentage: 25,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "scanning");
        assert_eq!(json["folder"], "INBOX");
        assert_eq!(json["percentage"], 25);
    }

    #[test]
    fn test_to_json_is_one_object() {
        let event = ProgressEvent::Connecting {
            message: "Connecting to imap.example.com...".into(),
        };
        let json = event.to_json();
        assert!(json.starts_with('{') && json.ends_with('}'));
        assert!(json.contains(r#""type":"connecting""#));
    }

    #[test]
    fn test_terminal_events() {
        assert!(ProgressEvent::Complete { message: "done".into(), total: 0 }.is_terminal());
        assert!(ProgressEvent::Error { message: "boom".into() }.is_terminal());
        assert!(!ProgressEvent::Connecting { message: "hi".into() }.is_terminal());
    }
}
