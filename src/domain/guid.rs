// src/domain/guid.rs
use crate::constants::BASE91_TABLE;
use sha2::{Digest, Sha256};
use std::fmt::Write;

/// Derive a stable note guid from its field values.
///
/// The values are rendered as a Python list literal (`['Q', 'A']`), hashed
/// with SHA-256, and the first eight digest bytes (big-endian) are rendered
/// in Anki's base91 alphabet. This matches `genanki.guid_for(fields)`, so
/// notes keep their identity across packages built by either tool.
/// Identical values always yield the same guid; order matters.
pub fn guid_for<S: AsRef<str>>(values: &[S]) -> String {
    let mut literal = String::from("[");
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            literal.push_str(", ");
        }
        push_quoted(&mut literal, value.as_ref());
    }
    literal.push(']');

    let digest = Sha256::digest(literal.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    let mut value = u64::from_be_bytes(prefix);

    let base = BASE91_TABLE.len() as u64;
    let mut reversed = Vec::new();
    while value > 0 {
        reversed.push(BASE91_TABLE[(value % base) as usize]);
        value /= base;
    }
    reversed.reverse();

    // table is ASCII
    String::from_utf8(reversed).unwrap_or_default()
}

/// Append `value` as a Python string literal.
///
/// Single quotes unless the value contains `'` and no `"`.
fn push_quoted(out: &mut String, value: &str) {
    let quote = if value.contains('\'') && !value.contains('"') {
        '"'
    } else {
        '\''
    };

    out.push(quote);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if is_printable(c) => out.push(c),
            c => {
                let code = c as u32;
                // writing into a String cannot fail
                let _ = match code {
                    0..=0xff => write!(out, "\\x{code:02x}"),
                    0x100..=0xffff => write!(out, "\\u{code:04x}"),
                    _ => write!(out, "\\U{code:08x}"),
                };
            }
        }
    }
    out.push(quote);
}

/// Python's `str.isprintable` for one character: everything except control,
/// format, separator (other than ASCII space) and private-use characters.
fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    if c.is_control() {
        return false;
    }
    !matches!(
        c as u32,
        // space separators, line and paragraph separators
        0xa0 | 0x1680 | 0x2000..=0x200a | 0x2028 | 0x2029 | 0x202f | 0x205f | 0x3000
        // format characters
        | 0xad | 0x600..=0x605 | 0x61c | 0x6dd | 0x70f | 0x890..=0x891 | 0x8e2
        | 0x180e | 0x200b..=0x200f | 0x202a..=0x202e | 0x2060..=0x2064
        | 0x2066..=0x206f | 0xfeff | 0xfff9..=0xfffb | 0x110bd | 0x110cd
        | 0x13430..=0x1343f | 0x1bca0..=0x1bca3 | 0x1d173..=0x1d17a
        | 0xe0001 | 0xe0020..=0xe007f
        // private use
        | 0xe000..=0xf8ff | 0xf0000..=0xffffd | 0x100000..=0x10fffd
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(values: &[&str]) -> String {
        let mut out = String::new();
        for v in values {
            push_quoted(&mut out, v);
        }
        out
    }

    #[test]
    fn given_same_values_when_hashing_then_returns_same_guid() {
        let first = guid_for(&["Q", "A"]);
        let second = guid_for(&["Q".to_string(), "A".to_string()]);

        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn given_plain_values_when_hashing_then_matches_genanki() {
        assert_eq!(guid_for(&["Q", "A"]), "PY3-G4>K}8");
        assert_eq!(guid_for(&["it's", "x"]), "FA>HX5/.Dz");
        assert_eq!(guid_for(&["say \"hi\"", "both ' \""]), "Ue0s/&H!W");
    }

    #[test]
    fn given_escaped_characters_when_hashing_then_matches_genanki() {
        let values = ["tab\tnew\nline\\", "\u{0}\u{7f}\u{a0}\u{200b}\u{1F600}é"];

        assert_eq!(guid_for(&values), "iPTnA(A$1,");
    }

    #[test]
    fn given_separator_inside_values_when_hashing_then_guids_differ() {
        assert_eq!(guid_for(&["a__b", "c"]), "Av!P}#rb~_");
        assert_eq!(guid_for(&["a", "b__c"]), "D]4EN{VR$_");
        assert_ne!(guid_for(&["a__b", "c"]), guid_for(&["a", "b__c"]));
    }

    #[test]
    fn given_quotes_when_rendering_literal_then_picks_python_quoting() {
        assert_eq!(literal(&["Q"]), "'Q'");
        assert_eq!(literal(&["it's"]), "\"it's\"");
        assert_eq!(literal(&["both ' \""]), "'both \\' \"'");
        assert_eq!(literal(&["\u{1}\u{200b}\u{F0000}"]), "'\\x01\\u200b\\U000f0000'");
    }

    #[test]
    fn given_one_changed_value_when_hashing_then_guid_changes() {
        assert_ne!(guid_for(&["Q", "A"]), guid_for(&["Q", "B"]));
        assert_ne!(guid_for(&["Q", "A"]), guid_for(&["q", "A"]));
    }

    #[test]
    fn given_swapped_values_when_hashing_then_guid_changes() {
        assert_ne!(guid_for(&["Q", "A"]), guid_for(&["A", "Q"]));
    }

    #[test]
    fn given_any_values_when_hashing_then_uses_base91_alphabet_only() {
        let guid = guid_for(&["Some <b>html</b>", "with unicode: ä ö ü"]);

        // 64 bits need at most ten base91 digits
        assert!(guid.len() <= 10);
        assert!(guid.bytes().all(|b| BASE91_TABLE.contains(&b)));
    }
}
