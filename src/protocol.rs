//! Inbound line protocol.
//!
//! The host sends newline-terminated text:
//!
//! ```text
//! CFG:Red=L,Green=R,Blue=L,...
//! Start
//! Stop
//! ```
//!
//! Matching is byte-exact and case sensitive. Nothing is trimmed, so
//! `" Red=L"` has the key `" Red"`.

/// Prefix of a configuration message.
pub const CONFIG_MARKER: &[u8] = b"CFG:";
pub const START_TOKEN: &[u8] = b"Start";
pub const STOP_TOKEN: &[u8] = b"Stop";

/// Marker for the left side in a configuration value.
pub const LEFT_MARKER: u8 = b'L';

fn find(text: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    text.windows(needle.len()).position(|w| w == needle)
}

/// Returns the text following the first `CFG:` marker.
pub fn find_config(text: &[u8]) -> Option<&[u8]> {
    find(text, CONFIG_MARKER).map(|at| &text[at + CONFIG_MARKER.len()..])
}

/// `true` if `token` occurs anywhere in `text`.
pub fn contains_token(text: &[u8], token: &[u8]) -> bool {
    find(text, token).is_some()
}

/// Splits `Key=Value,Key=Value` into `(key, first byte of value)` pairs.
///
/// Tokens without `=` or with nothing after it are skipped. Keys are not
/// checked here.
pub fn parse_assignments(text: &[u8]) -> impl Iterator<Item = (&[u8], u8)> {
    text.split(|&b| b == b',').filter_map(|token| {
        let eq = token.iter().position(|&b| b == b'=')?;
        let key = &token[..eq];
        let value = *token.get(eq + 1)?;
        Some((key, value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(text: &[u8]) -> Vec<(&[u8], u8)> {
        parse_assignments(text).collect()
    }

    #[test]
    fn config_remainder() {
        assert_eq!(find_config(b"CFG:Red=L"), Some(&b"Red=L"[..]));
        assert_eq!(find_config(b"xxCFG:Blue=R\n"), Some(&b"Blue=R\n"[..]));
        assert_eq!(find_config(b"CFG:"), Some(&b""[..]));
        assert_eq!(find_config(b"cfg:Red=L"), None);
        assert_eq!(find_config(b"Start\n"), None);
    }

    #[test]
    fn assignments_in_order() {
        assert_eq!(
            pairs(b"Red=L,Blue=R"),
            vec![(&b"Red"[..], b'L'), (&b"Blue"[..], b'R')]
        );
    }

    #[test]
    fn malformed_tokens_skipped() {
        assert_eq!(
            pairs(b"Red,Green=,=L,,Blue=Left"),
            vec![(&b""[..], b'L'), (&b"Blue"[..], b'L')]
        );
    }

    #[test]
    fn value_split_on_first_equals() {
        assert_eq!(pairs(b"Red==L"), vec![(&b"Red"[..], b'=')]);
    }

    #[test]
    fn no_trimming() {
        assert_eq!(
            pairs(b" Red=L,Brown=R\r\n"),
            vec![(&b" Red"[..], b'L'), (&b"Brown"[..], b'R')]
        );
    }

    #[test]
    fn duplicate_keys_kept_in_order() {
        assert_eq!(
            pairs(b"Red=L,Red=R"),
            vec![(&b"Red"[..], b'L'), (&b"Red"[..], b'R')]
        );
    }

    #[test]
    fn tokens_match_anywhere() {
        assert!(contains_token(b"Start\n", START_TOKEN));
        assert!(contains_token(b"xxStart_ACK", START_TOKEN));
        assert!(contains_token(b"CFG:Red=L\nStop\n", STOP_TOKEN));
        assert!(!contains_token(b"start\n", START_TOKEN));
        assert!(!contains_token(b"Sto", STOP_TOKEN));
    }
}
