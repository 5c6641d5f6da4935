//! Static substitution dictionaries for Gravitas-Pack.
//!
//! Two dictionaries: well-known metadata field names that collapse to a
//! single glyph byte, and common path/URL/extension fragments that
//! collapse inside string values. Indices are part of the wire format:
//! append new entries, never reorder or remove existing ones.

/// Well-known metadata field names. A key's glyph is its index here.
pub(super) const FIELD_GLYPHS: &[&str] = &[
    "file_path",
    "file_name",
    "file_type",
    "size_bytes",
    "created_at",
    "modified_at",
    "accessed_at",
    "content_type",
    "encoding",
    "lines_of_code",
    "is_binary",
    "source",
    "title",
    "author",
    "language",
    "checksum",
    "store",
    "chunk_index",
];

/// Common string fragments: path prefixes, URL schemes, file-extension
/// suffixes. A segment's glyph is its index here.
pub(super) const SEGMENT_GLYPHS: &[&str] = &[
    "/home/",
    "/usr/",
    "/var/",
    "/tmp/",
    "/opt/",
    "C:\\Users\\",
    "D:\\",
    "https://",
    "http://",
    "file://",
    "local://",
    "s3://",
    "://www.",
    ".pdf",
    ".docx",
    ".txt",
    ".md",
    ".py",
    ".rs",
    ".json",
    ".csv",
    ".html",
    ".log",
    ".tar.gz",
    "application/",
    "text/",
    "utf-8",
];

/// Longest dictionary fragment matching at the start of `input`,
/// returned as `(glyph_index, fragment_length)`.
pub(super) fn longest_segment_match(input: &[u8]) -> Option<(u8, usize)> {
    let mut best: Option<(u8, usize)> = None;
    for (idx, fragment) in SEGMENT_GLYPHS.iter().enumerate() {
        let bytes = fragment.as_bytes();
        if input.starts_with(bytes) && best.map_or(true, |(_, len)| bytes.len() > len) {
            best = Some((idx as u8, bytes.len()));
        }
    }
    best
}

/// Glyph index for a well-known field name.
pub(super) fn field_glyph(key: &str) -> Option<u8> {
    FIELD_GLYPHS.iter().position(|k| *k == key).map(|i| i as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dictionaries_fit_seven_bit_indices() {
        assert!(FIELD_GLYPHS.len() <= 0x7F);
        // Segment index 0x7F would collide with the end-of-stream byte.
        assert!(SEGMENT_GLYPHS.len() < 0x7F);
    }

    #[test]
    fn longest_match_wins() {
        // ".tar.gz" should beat any shorter candidate at the same position.
        let (idx, len) = longest_segment_match(b".tar.gz backup").unwrap();
        assert_eq!(SEGMENT_GLYPHS[idx as usize], ".tar.gz");
        assert_eq!(len, 7);
    }

    #[test]
    fn no_match_on_plain_text() {
        assert!(longest_segment_match(b"plain words here").is_none());
    }

    #[test]
    fn known_field_resolves() {
        assert_eq!(field_glyph("file_path"), Some(0));
        assert_eq!(field_glyph("no_such_field"), None);
    }
}
