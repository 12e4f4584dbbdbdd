use md5::{Digest, Md5};

/// Content fingerprint used as the duplicate-grouping key.
///
/// MD5 hex digest of `subject + from + to + body`, with empty strings
/// standing in for missing fields. This is a deliberately weak, exact-match
/// key: byte-identical content groups together regardless of folder, date
/// or delivery path, while near-duplicates (whitespace, forwarded quoting,
/// re-encoded bodies) do not. Collision resistance is irrelevant here;
/// the digest groups messages, it authenticates nothing.
pub fn fingerprint(subject: &str, from: &str, to: &str, body: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(subject.as_bytes());
    hasher.update(from.as_bytes());
    hasher.update(to.as_bytes());
    hasher.update(body.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let a = fingerprint("Hello", "a@x.com", "b@y.com", "body text");
        let b = fingerprint("Hello", "a@x.com", "b@y.com", "body text");
        assert_eq!(a, b);
    }

    #[test]
    fn test_all_empty_inputs() {
        let a = fingerprint("", "", "", "");
        assert_eq!(a, fingerprint("", "", "", ""));
        // MD5 of the empty string.
        assert_eq!(a, "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn test_each_field_changes_digest() {
        let base = fingerprint("A", "x", "y", "z");
        assert_ne!(base, fingerprint("B", "x", "y", "z"));
        assert_ne!(base, fingerprint("A", "q", "y", "z"));
        assert_ne!(base, fingerprint("A", "x", "q", "z"));
        assert_ne!(base, fingerprint("A", "x", "y", "q"));
    }

    #[test]
    fn test_fixed_length_hex() {
        let digest = fingerprint("subject", "from", "to", "a longer body than usual");
        assert_eq!(digest.len(), 32);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
