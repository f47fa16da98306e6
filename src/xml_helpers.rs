//! Shared XML helpers for reading and writing SpreadsheetML parts.
//!
//! Attribute lookups handle UTF-8 conversion safely and return `None`
//! instead of failing on odd input.

use quick_xml::events::BytesStart;

/// Extract a string attribute value by key.
///
/// Returns `None` if the attribute is missing or not valid UTF-8.
pub fn attr_string(e: &BytesStart, key: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            return std::str::from_utf8(&attr.value).ok().map(ToString::to_string);
        }
    }
    None
}

/// Extract a string attribute by local name (ignoring namespace prefix).
pub fn attr_string_local(e: &BytesStart, key: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == key {
            return std::str::from_utf8(&attr.value).ok().map(ToString::to_string);
        }
    }
    None
}

/// Extract a `u32` attribute value by key.
pub fn attr_u32(e: &BytesStart, key: &[u8]) -> Option<u32> {
    attr_string(e, key).and_then(|s| s.trim().parse().ok())
}

/// Extract a boolean attribute value by key.
///
/// Recognizes `"1"` and `"true"` as true; anything else present is false.
pub fn attr_bool(e: &BytesStart, key: &[u8]) -> Option<bool> {
    attr_string(e, key).map(|s| matches!(s.as_str(), "1" | "true"))
}

/// Minimal XML escaping for attribute/text content.
pub fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Code point of an `_xHHHH_` escape at the start of `s`, if any.
fn xstring_escape_at(s: &str) -> Option<u32> {
    let rest = s.strip_prefix("_x")?;
    let hex = rest.get(..4)?;
    if rest.get(4..5)? != "_" || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

/// Escape cell text for SpreadsheetML (`ST_Xstring`) and then for XML.
///
/// Control characters other than tab and newline become `_xHHHH_`; this
/// includes `\r`, which XML parsers would fold into `\n`. A literal `_xHHHH_`
/// already in the text gets its underscore escaped as `_x005F_` so readers
/// do not decode it.
pub fn escape_xstring(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len());
    for (idx, c) in s.char_indices() {
        if c.is_control() && !matches!(c, '\t' | '\n') {
            encoded.push_str(&format!("_x{:04X}_", u32::from(c)));
        } else if c == '_' && s.get(idx..).and_then(xstring_escape_at).is_some() {
            encoded.push_str("_x005F_");
        } else {
            encoded.push(c);
        }
    }
    xml_escape(&encoded)
}

/// Decode `_xHHHH_` escapes in already XML-unescaped cell text.
pub fn unescape_xstring(s: &str) -> String {
    if !s.contains("_x") {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut idx = 0;
    while let Some(rest) = s.get(idx..) {
        let Some(c) = rest.chars().next() else {
            break;
        };
        if c == '_' {
            if let Some(ch) = xstring_escape_at(rest).and_then(char::from_u32) {
                out.push(ch);
                idx += 7;
                continue;
            }
        }
        out.push(c);
        idx += c.len_utf8();
    }
    out
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;

    fn make_start(xml: &str) -> BytesStart<'_> {
        // Strip < and > / /> to get just the tag content
        let content = xml
            .trim_start_matches('<')
            .trim_end_matches('>')
            .trim_end_matches('/')
            .trim_end();
        BytesStart::from_content(content, content.find(' ').unwrap_or(content.len()))
    }

    #[test]
    fn test_attr_string() {
        let e = make_start(r#"<sheet name="Data" />"#);
        assert_eq!(attr_string(&e, b"name"), Some("Data".to_string()));
        assert_eq!(attr_string(&e, b"missing"), None);
    }

    #[test]
    fn test_attr_string_local_ignores_prefix() {
        let e = make_start(r#"<sheet name="Data" r:id="rId3" />"#);
        assert_eq!(attr_string_local(&e, b"id"), Some("rId3".to_string()));
        assert_eq!(attr_string(&e, b"id"), None);
    }

    #[test]
    fn test_attr_u32_and_bool() {
        let e = make_start(r#"<xf numFmtId="14" applyNumberFormat="1" />"#);
        assert_eq!(attr_u32(&e, b"numFmtId"), Some(14));
        assert_eq!(attr_bool(&e, b"applyNumberFormat"), Some(true));
        assert_eq!(attr_bool(&e, b"missing"), None);
    }

    #[test]
    fn test_xml_escape() {
        assert_eq!(xml_escape("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
        assert_eq!(xml_escape("it's"), "it&apos;s");
    }

    #[test]
    fn test_escape_xstring_control_chars() {
        assert_eq!(escape_xstring("tab\tok"), "tab\tok");
        assert_eq!(escape_xstring("bell\u{7}"), "bell_x0007_");
        assert_eq!(escape_xstring("line\r\n"), "line_x000D_\n");
        assert_eq!(escape_xstring("a&b"), "a&amp;b");
    }

    #[test]
    fn test_xstring_roundtrip() {
        for s in ["plain", "bell\u{7}ring", "_x0041_ literal", "snake_case_x", "é_x00e9_"] {
            let escaped = escape_xstring(s);
            let unescaped_xml = escaped
                .replace("&amp;", "&")
                .replace("&lt;", "<")
                .replace("&gt;", ">")
                .replace("&quot;", "\"")
                .replace("&apos;", "'");
            assert_eq!(unescape_xstring(&unescaped_xml), s, "roundtrip of {s:?}");
        }
    }

    #[test]
    fn test_unescape_xstring() {
        assert_eq!(unescape_xstring("_x000D_"), "\r");
        assert_eq!(unescape_xstring("no escapes"), "no escapes");
        assert_eq!(unescape_xstring("_x12_"), "_x12_");
    }
}
