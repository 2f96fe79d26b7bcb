//! Extended M3U parser producing flat playlist entries

use crate::error::Result;
use crate::models::{MediaKind, PlaylistEntry};
use log::debug;
use std::collections::HashMap;
use url::Url;

/// Title used when a directive has no trailing name
pub const UNKNOWN_TITLE: &str = "Unknown";

/// Schemes accepted on a URL line
const URL_SCHEMES: &[&str] = &["http", "https", "rtmp", "rtmps", "rtsp", "rtp", "udp", "mms"];

/// Directive waiting for its URL line
struct PendingEntry {
    title: String,
    logo: Option<String>,
    group: Option<String>,
}

/// Parse playlist text into entries, dropping directives that have no usable URL
pub fn parse_flat(content: &str) -> Vec<PlaylistEntry> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut entries = Vec::new();
    let mut pending: Option<PendingEntry> = None;
    let mut directives = 0usize;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(info) = extinf_info(line) {
            directives += 1;
            pending = Some(parse_directive(info));
        } else if line.starts_with('#') {
            // Other directives and comments keep the pending entry
            continue;
        } else if let Some(entry) = pending.take() {
            match parse_media_url(line) {
                Some(url) => entries.push(PlaylistEntry {
                    title: entry.title,
                    url: line.to_string(),
                    kind: MediaKind::from_url(&url),
                    logo: entry.logo,
                    group: entry.group,
                }),
                None => debug!("Dropping '{}': not a media URL: {}", entry.title, line),
            }
        }
    }

    if entries.len() < directives {
        debug!(
            "Parsed {} entries from {} directives ({} dropped)",
            entries.len(),
            directives,
            directives - entries.len()
        );
    }

    entries
}

/// Parse raw playlist bytes. Fails with `InvalidInput` when the bytes are not UTF-8 text.
pub fn parse_flat_bytes(bytes: &[u8]) -> Result<Vec<PlaylistEntry>> {
    Ok(parse_flat(decode_text(bytes)?))
}

/// Decode playlist bytes as UTF-8, stripping a byte order mark
pub fn decode_text(bytes: &[u8]) -> Result<&str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    Ok(std::str::from_utf8(bytes)?)
}

/// Return the text after `#EXTINF:` when the line is an EXTINF directive.
/// A missing leading `#` is tolerated.
fn extinf_info(line: &str) -> Option<&str> {
    let rest = line.strip_prefix('#').unwrap_or(line);
    if !rest.get(..6)?.eq_ignore_ascii_case("EXTINF") {
        return None;
    }
    let rest = &rest[6..];
    if rest.is_empty() {
        Some("")
    } else {
        rest.strip_prefix(':')
    }
}

fn parse_directive(info: &str) -> PendingEntry {
    let (attr_part, title) = match last_unquoted_comma(info) {
        Some(pos) => (&info[..pos], info[pos + 1..].trim()),
        None => (info, ""),
    };

    let mut attrs = HashMap::new();
    extract_attrs(attr_part, &mut attrs);

    let title = if title.is_empty() {
        UNKNOWN_TITLE.to_string()
    } else {
        title.to_string()
    };

    PendingEntry {
        title,
        logo: attrs.remove("tvg-logo").filter(|s| !s.is_empty()),
        group: attrs.remove("group-title").filter(|s| !s.is_empty()),
    }
}

/// Position of the last comma that is not inside a quoted attribute value
fn last_unquoted_comma(info: &str) -> Option<usize> {
    let mut in_quotes = false;
    let mut last = None;
    for (i, c) in info.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => last = Some(i),
            _ => {}
        }
    }
    // Unbalanced quotes: fall back to the plain last comma
    if in_quotes {
        return info.rfind(',');
    }
    last
}

/// Accept a line as a URL only when it has a known scheme and parses as absolute
fn parse_media_url(line: &str) -> Option<Url> {
    let (scheme, _) = line.split_once("://")?;
    if !URL_SCHEMES.contains(&scheme.to_ascii_lowercase().as_str()) {
        return None;
    }
    let url = Url::parse(line).ok()?;
    if url.cannot_be_a_base() {
        return None;
    }
    Some(url)
}

/// Extract attributes from the EXTINF info part (everything before the title).
/// Handles quoted and unquoted values, a leading duration, and stray quotes.
fn extract_attrs(info: &str, attrs: &mut HashMap<String, String>) {
    let mut chars = info.chars().peekable();

    // Skip the duration number at the start (e.g., "-1" or "10.000000")
    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() || c == '-' || c == '.' || c.is_whitespace() {
            chars.next();
        } else {
            break;
        }
    }

    while chars.peek().is_some() {
        // Skip separators
        while let Some(&c) = chars.peek() {
            if c.is_whitespace() || c == ',' {
                chars.next();
            } else {
                break;
            }
        }

        // Collect key until '='
        let mut key = String::new();
        while let Some(c) = chars.next_if(|&c| c != '=') {
            key.push(c);
        }
        if chars.next().is_none() {
            // Trailing text without '=' carries no attribute
            return;
        }

        let key = key.trim().trim_start_matches('"').to_lowercase();

        // Get value - check if quoted
        let mut value = String::new();
        if chars.next_if_eq(&'"').is_some() {
            while let Some(c) = chars.next() {
                if c == '"' {
                    break;
                }
                // Handle escaped quotes
                if c == '\\' {
                    if let Some(q) = chars.next_if_eq(&'"') {
                        value.push(q);
                        continue;
                    }
                }
                value.push(c);
            }
        } else {
            // Unquoted value - read until space or comma
            while let Some(c) = chars.next_if(|&c| !c.is_whitespace() && c != ',') {
                value.push(c);
            }
        }

        if !key.is_empty() {
            attrs.insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs_of(info: &str) -> HashMap<String, String> {
        let mut attrs = HashMap::new();
        extract_attrs(info, &mut attrs);
        attrs
    }

    #[test]
    fn test_extract_attrs_quoted_and_unquoted() {
        let attrs = attrs_of(r#"-1 tvg-id=unquoted group-title="Quoted Group""#);
        assert_eq!(attrs.get("tvg-id").map(String::as_str), Some("unquoted"));
        assert_eq!(attrs.get("group-title").map(String::as_str), Some("Quoted Group"));
    }

    #[test]
    fn test_extract_attrs_after_duration_comma() {
        let attrs = attrs_of(r#"10.000000,TVG-ID="Channel1" tvg-logo="http://example.com/c1.png""#);
        assert_eq!(attrs.get("tvg-id").map(String::as_str), Some("Channel1"));
        assert_eq!(attrs.get("tvg-logo").map(String::as_str), Some("http://example.com/c1.png"));
    }

    #[test]
    fn test_extract_attrs_stray_quote() {
        let attrs = attrs_of(r#"0 tvg-logo="https://example.com/logo.png" "tvg-name="SRF1.ch""#);
        assert_eq!(attrs.get("tvg-logo").map(String::as_str), Some("https://example.com/logo.png"));
        assert_eq!(attrs.get("tvg-name").map(String::as_str), Some("SRF1.ch"));
    }

    #[test]
    fn test_extract_attrs_duration_only() {
        assert!(attrs_of("0").is_empty());
        assert!(attrs_of("").is_empty());
    }

    #[test]
    fn test_last_unquoted_comma() {
        let info = r#"-1 group-title="News, Sports",CNN"#;
        let pos = last_unquoted_comma(info).unwrap();
        assert_eq!(&info[pos + 1..], "CNN");

        let info = r#"-1 tvg-logo="http://x/a,b.png""#;
        assert_eq!(last_unquoted_comma(info), None);
    }

    #[test]
    fn test_extinf_info() {
        assert_eq!(extinf_info("#EXTINF:0,Test"), Some("0,Test"));
        assert_eq!(extinf_info("EXTINF:-1,Test"), Some("-1,Test"));
        assert_eq!(extinf_info("#extinf:-1,Test"), Some("-1,Test"));
        assert_eq!(extinf_info("#EXTINF"), Some(""));
        assert_eq!(extinf_info("#EXTM3U"), None);
        assert_eq!(extinf_info("#EXTINFO:1"), None);
    }

    #[test]
    fn test_parse_media_url() {
        assert!(parse_media_url("http://example.com/one.m3u8").is_some());
        assert!(parse_media_url("rtmp://example.com/live/stream").is_some());
        assert!(parse_media_url("segment0.ts").is_none());
        assert!(parse_media_url("ftp://example.com/file.mp4").is_none());
        assert!(parse_media_url("http://").is_none());
    }
}
