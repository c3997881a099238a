//! Location and query-string handling for history sync.
//!
//! Locations are `path` or `path?query` strings. Query strings are
//! form-urlencoded: `&`-separated pairs, `+` for space, `%XX` for reserved
//! bytes. Setting a parameter re-serializes the whole query, so values that
//! arrived encoded leave encoded.

use crate::config::HistoryMode;

/// Split a location into path and query (without the `?`).
pub fn split_location(location: &str) -> (&str, &str) {
    match location.split_once('?') {
        Some((path, query)) => (path, query),
        None => (location, ""),
    }
}

/// Parse a query string into decoded name/value pairs, in order.
/// A piece without `=` becomes a pair with an empty value.
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for piece in query.split('&') {
        if piece.is_empty() {
            continue;
        }
        let (name, value) = match piece.split_once('=') {
            Some((n, v)) => (n, v),
            None => (piece, ""),
        };
        pairs.push((decode_component(name), decode_component(value)));
    }
    pairs
}

/// Serialize decoded pairs back into a query string.
pub fn encode_query(pairs: &[(String, String)]) -> String {
    let mut out = String::new();
    for (name, value) in pairs {
        if !out.is_empty() {
            out.push('&');
        }
        out.push_str(&encode_component(name));
        out.push('=');
        out.push_str(&encode_component(value));
    }
    out
}

/// First value of `name` in `query`, decoded.
pub fn get_param(query: &str, name: &str) -> Option<String> {
    parse_query(query)
        .into_iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v)
}

/// Set `name` to `value` in `query`.
///
/// The first occurrence is replaced in place and later duplicates are
/// dropped; a missing parameter is appended. Other parameters keep their
/// order.
pub fn set_param(query: &str, name: &str, value: &str) -> String {
    let mut pairs = parse_query(query);
    let mut replaced = false;
    pairs.retain_mut(|(n, v)| {
        if n == name {
            if replaced {
                return false;
            }
            replaced = true;
            *v = value.to_string();
        }
        true
    });
    if !replaced {
        pairs.push((name.to_string(), value.to_string()));
    }
    encode_query(&pairs)
}

/// The URL a navigation to `path` pushes, given the current location.
/// `None` when the mode leaves history untouched.
pub fn push_url(
    location: &str,
    mode: HistoryMode,
    param_name: &str,
    path: &str,
) -> Option<String> {
    match mode {
        HistoryMode::Param => {
            let (pathname, query) = split_location(location);
            let query = set_param(query, param_name, path);
            Some(format!("{pathname}?{query}"))
        },
        HistoryMode::Path => Some(path.to_string()),
        HistoryMode::None => None,
    }
}

/// The content path carried in a location's query, if any.
/// An empty value counts as absent.
pub fn param_path(location: &str, param_name: &str) -> Option<String> {
    let (_, query) = split_location(location);
    get_param(query, param_name).filter(|path| !path.is_empty())
}

fn encode_component(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for &b in text.as_bytes() {
        match b {
            b' ' => out.push('+'),
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'*' | b'-' | b'.' | b'_' => {
                out.push(b as char)
            },
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

fn decode_component(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            },
            // A '%' not followed by two hex digits stays literal.
            b'%' => {
                if i + 2 < bytes.len()
                    && let (Some(hi), Some(lo)) = (hex_val(bytes[i + 1]), hex_val(bytes[i + 2]))
                {
                    out.push(hi * 16 + lo);
                    i += 3;
                } else {
                    out.push(b'%');
                    i += 1;
                }
            },
            other => {
                out.push(other);
                i += 1;
            },
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_location_with_query() {
        assert_eq!(split_location("/docs?path=a.md"), ("/docs", "path=a.md"));
    }

    #[test]
    fn split_location_without_query() {
        assert_eq!(split_location("/docs"), ("/docs", ""));
    }

    #[test]
    fn split_location_at_first_question_mark() {
        assert_eq!(split_location("/d?a=1?b=2"), ("/d", "a=1?b=2"));
    }

    #[test]
    fn get_param_first_occurrence_wins() {
        assert_eq!(get_param("a=1&a=2", "a"), Some("1".into()));
    }

    #[test]
    fn get_param_missing() {
        assert_eq!(get_param("a=1", "b"), None);
    }

    #[test]
    fn get_param_decodes_plus_and_percent() {
        assert_eq!(get_param("path=a+b%21", "path"), Some("a b!".into()));
    }

    #[test]
    fn set_param_replaces_in_place() {
        assert_eq!(
            set_param("a=1&path=old&b=2", "path", "new"),
            "a=1&path=new&b=2"
        );
    }

    #[test]
    fn set_param_drops_later_duplicates() {
        assert_eq!(set_param("path=1&b=2&path=3", "path", "new"), "path=new&b=2");
    }

    #[test]
    fn set_param_appends_when_absent() {
        assert_eq!(set_param("foo=1", "path", "guide.md"), "foo=1&path=guide.md");
    }

    #[test]
    fn set_param_on_empty_query() {
        assert_eq!(set_param("", "path", "a.md"), "path=a.md");
    }

    #[test]
    fn set_param_encodes_value() {
        assert_eq!(
            set_param("", "path", "docs/a b.md"),
            "path=docs%2Fa+b.md"
        );
    }

    #[test]
    fn malformed_percent_stays_literal() {
        assert_eq!(get_param("p=100%&q=%zz", "p"), Some("100%".into()));
        assert_eq!(get_param("p=100%&q=%zz", "q"), Some("%zz".into()));
    }

    #[test]
    fn push_url_param_mode_preserves_other_params() {
        let url = push_url("/docs?foo=1", HistoryMode::Param, "path", "guide.md");
        assert_eq!(url.as_deref(), Some("/docs?foo=1&path=guide.md"));
    }

    #[test]
    fn push_url_param_mode_replaces_existing_path() {
        let url = push_url(
            "/docs?path=old.md&foo=1",
            HistoryMode::Param,
            "path",
            "new.md",
        );
        assert_eq!(url.as_deref(), Some("/docs?path=new.md&foo=1"));
    }

    #[test]
    fn push_url_path_mode_is_the_path() {
        let url = push_url("/docs?foo=1", HistoryMode::Path, "path", "guide.md");
        assert_eq!(url.as_deref(), Some("guide.md"));
    }

    #[test]
    fn push_url_none_mode_pushes_nothing() {
        assert_eq!(push_url("/docs", HistoryMode::None, "path", "a.md"), None);
    }

    #[test]
    fn param_path_recovers_path() {
        assert_eq!(
            param_path("/docs?path=guide.md", "path"),
            Some("guide.md".into())
        );
    }

    #[test]
    fn param_path_empty_value_is_absent() {
        assert_eq!(param_path("/docs?path=", "path"), None);
        assert_eq!(param_path("/docs", "path"), None);
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn encode_decode_round_trip(s in ".*") {
                prop_assert_eq!(decode_component(&encode_component(&s)), s);
            }

            #[test]
            fn set_then_get_returns_value(
                query in "[a-z0-9=&%+]{0,30}",
                name in "[a-z]{1,8}",
                value in ".*",
            ) {
                let q = set_param(&query, &name, &value);
                prop_assert_eq!(get_param(&q, &name), Some(value));
            }

            #[test]
            fn set_param_is_idempotent(
                query in "[a-z0-9=&%+]{0,30}",
                name in "[a-z]{1,8}",
                value in "[a-z./ ]{0,20}",
            ) {
                let once = set_param(&query, &name, &value);
                let twice = set_param(&once, &name, &value);
                prop_assert_eq!(once, twice);
            }

            #[test]
            fn pushed_url_recovers_path(
                pathname in "/[a-z/]{0,10}",
                query in "[a-z0-9=&]{0,20}",
                path in ".+",
            ) {
                let location = if query.is_empty() {
                    pathname.clone()
                } else {
                    format!("{pathname}?{query}")
                };
                let url = push_url(&location, HistoryMode::Param, "path", &path)
                    .unwrap();
                prop_assert_eq!(param_path(&url, "path"), Some(path));
            }
        }
    }
}
