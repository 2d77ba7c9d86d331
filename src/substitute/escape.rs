use std::fmt::Write as _;

/// Escape a value for a Java `.properties` file: backslash sequences for
/// control and separator characters, `\uXXXX` for anything outside Latin-1.
pub(crate) fn java_properties(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{0C}' => out.push_str("\\f"),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            c if u32::from(c) < 0x20 || u32::from(c) > 0xFF => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    // Writing to a String cannot fail.
                    let _ = write!(out, "\\u{unit:04X}");
                }
            }
            c => out.push(c),
        }
    }
    out
}

pub(crate) fn xml(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn properties_separators_and_backslash() {
        assert_eq!(java_properties(r"C:\Program Files"), r"C:\\Program Files");
        assert_eq!(java_properties("a=b:c#d!e"), r"a\=b\:c\#d\!e");
        assert_eq!(java_properties("line1\nline2\t"), r"line1\nline2\t");
    }

    #[test]
    fn properties_unicode_escapes() {
        assert_eq!(java_properties("café"), "café");
        assert_eq!(java_properties("नम"), r"\u0928\u092E");
        assert_eq!(java_properties("😀"), r"\uD83D\uDE00");
        assert_eq!(java_properties("\u{1}"), r"\u0001");
    }

    #[test]
    fn xml_entities() {
        assert_eq!(
            xml(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &apos;Jerry&apos;&lt;/a&gt;"
        );
        assert_eq!(xml("plain"), "plain");
    }
}
