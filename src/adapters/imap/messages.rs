use async_imap::Session;
use chrono::Utc;
use futures::StreamExt;
use mailparse::{MailHeaderMap, ParsedMail};
use tracing::warn;

use super::connection::ImapStream;
use crate::error::SweepError;

/// Fields extracted from one raw message.
///
/// `message_id` is `None` when the header is missing; the scan layer
/// synthesizes a fallback identifier in that case.
#[derive(Debug, Clone)]
pub struct ParsedEmail {
    pub message_id: Option<String>,
    pub subject: String,
    pub from: String,
    pub to: String,
    /// Date header as unix epoch milliseconds; scan time when missing or
    /// unparseable.
    pub date: i64,
    pub body_text: String,
    pub uid: u32,
    pub size: u32,
}

const FETCH_QUERY: &str = "(UID RFC822.SIZE BODY.PEEK[])";

/// Fetch every message of the selected folder in a single `1:*` pass.
///
/// The FETCH stream is consumed one entry at a time and each raw body is
/// dropped as soon as it has been parsed, so a large folder never sits in
/// memory whole. Entries the server fails to serialize and messages
/// mailparse rejects are logged and skipped; the pass continues.
pub(super) async fn fetch_folder<T: ImapStream>(
    session: &mut Session<T>,
    folder: &str,
    on_message: &mut dyn FnMut(ParsedEmail),
) -> Result<usize, SweepError> {
    let stream = session
        .fetch("1:*", FETCH_QUERY)
        .await
        .map_err(|e| SweepError::FolderAccess(format!("FETCH in {} failed: {}", folder, e)))?;
    futures::pin_mut!(stream);

    let mut delivered = 0;
    while let Some(result) = stream.next().await {
        let fetch = match result {
            Ok(fetch) => fetch,
            Err(e) => {
                warn!(folder = %folder, error = %e, "Skipping unparseable FETCH response");
                continue;
            }
        };

        let uid = fetch.uid.unwrap_or(0);
        let size = fetch.size.unwrap_or(0);
        let Some(raw) = fetch.body() else {
            warn!(folder = %folder, uid = uid, "FETCH item carried no body, skipping");
            continue;
        };

        match parse_message(raw, uid, size) {
            Ok(parsed) => {
                on_message(parsed);
                delivered += 1;
            }
            Err(e) => {
                warn!(folder = %folder, uid = uid, error = %e, "Skipping unparseable message");
            }
        }
    }

    Ok(delivered)
}

/// Parse one raw RFC822 message into the fields the fingerprint and the
/// record store need. Missing headers degrade to empty strings rather than
/// erroring; only a message mailparse cannot structure at all is a
/// [`SweepError::Parse`].
pub(crate) fn parse_message(raw: &[u8], uid: u32, size: u32) -> Result<ParsedEmail, SweepError> {
    let parsed = mailparse::parse_mail(raw)
        .map_err(|e| SweepError::Parse(format!("uid {}: {}", uid, e)))?;

    let headers = &parsed.headers;
    let message_id = headers
        .get_first_value("Message-ID")
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty());
    let subject = headers.get_first_value("Subject").unwrap_or_default();
    let from = headers.get_first_value("From").unwrap_or_default();
    let to = headers.get_first_value("To").unwrap_or_default();

    let date = headers
        .get_first_value("Date")
        .and_then(|d| mailparse::dateparse(&d).ok())
        .map(|secs| secs * 1000)
        .unwrap_or_else(|| Utc::now().timestamp_millis());

    let body_text = extract_text_plain(&parsed).unwrap_or_default();

    Ok(ParsedEmail {
        message_id,
        subject,
        from,
        to,
        date,
        body_text,
        uid,
        size,
    })
}

/// First text/plain part, depth-first. HTML-only messages yield nothing;
/// the fingerprint then hashes an empty body, same as the recorded
/// behavior.
fn extract_text_plain(mail: &ParsedMail) -> Option<String> {
    if mail.subparts.is_empty() {
        if mail.ctype.mimetype.eq_ignore_ascii_case("text/plain") {
            return mail.get_body().ok();
        }
        return None;
    }

    mail.subparts.iter().find_map(extract_text_plain)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &[u8] = b"Message-ID: <abc@example.com>\r\n\
Subject: Quarterly report\r\n\
From: Alice <alice@example.com>\r\n\
To: Bob <bob@example.com>\r\n\
Date: Sat, 1 Feb 2025 10:30:00 +0000\r\n\
Content-Type: text/plain\r\n\
\r\n\
Numbers attached.\r\n";

    #[test]
    fn test_parse_simple_message() {
        let parsed = parse_message(SIMPLE, 7, 240).unwrap();
        assert_eq!(parsed.message_id.as_deref(), Some("<abc@example.com>"));
        assert_eq!(parsed.subject, "Quarterly report");
        assert_eq!(parsed.from, "Alice <alice@example.com>");
        assert_eq!(parsed.to, "Bob <bob@example.com>");
        assert_eq!(parsed.body_text.trim(), "Numbers attached.");
        assert_eq!(parsed.uid, 7);
        assert_eq!(parsed.size, 240);
        // 2025-02-01T10:30:00Z
        assert_eq!(parsed.date, 1_738_405_800_000);
    }

    #[test]
    fn test_missing_headers_degrade_to_empty() {
        let raw = b"Content-Type: text/plain\r\n\r\nbare body\r\n";
        let parsed = parse_message(raw, 1, 10).unwrap();
        assert_eq!(parsed.message_id, None);
        assert_eq!(parsed.subject, "");
        assert_eq!(parsed.from, "");
        assert_eq!(parsed.to, "");
        assert_eq!(parsed.body_text.trim(), "bare body");
    }

    #[test]
    fn test_missing_date_falls_back_to_now() {
        let raw = b"Subject: undated\r\n\r\nx\r\n";
        let before = Utc::now().timestamp_millis();
        let parsed = parse_message(raw, 1, 5).unwrap();
        assert!(parsed.date >= before);
    }

    #[test]
    fn test_multipart_prefers_text_plain() {
        let raw = b"Subject: multi\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/alternative; boundary=\"sep\"\r\n\
\r\n\
--sep\r\n\
Content-Type: text/html\r\n\
\r\n\
<p>hello</p>\r\n\
--sep\r\n\
Content-Type: text/plain\r\n\
\r\n\
hello\r\n\
--sep--\r\n";
        let parsed = parse_message(raw, 2, 100).unwrap();
        assert_eq!(parsed.body_text.trim(), "hello");
    }

    #[test]
    fn test_html_only_body_is_empty() {
        let raw = b"Subject: html\r\nContent-Type: text/html\r\n\r\n<p>hi</p>\r\n";
        let parsed = parse_message(raw, 3, 50).unwrap();
        assert_eq!(parsed.body_text, "");
    }
}
