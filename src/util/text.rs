/// Returns `true` if `c` may appear in an XML 1.0 document.
///
/// XML 1.0 §2.2: `#x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]`.
/// Surrogates cannot occur in a Rust `char`, so only the C0 controls and the
/// two noncharacters `U+FFFE`/`U+FFFF` are excluded in practice.
pub fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\u{9}' | '\u{A}' | '\u{D}'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

/// Finds the first character that cannot be represented in XML 1.0.
///
/// Escaping only covers the five markup characters; control characters such
/// as `\u{0}` or `\u{1b}` have no legal spelling at all (not even as
/// character references), so text containing them must be rejected before
/// it reaches the writer.
///
/// # Returns
///
/// The byte offset and the offending character, or `None` if the text is
/// clean.
///
/// # Examples
///
/// ```
/// use feedwriter::util::find_invalid_xml_char;
///
/// assert_eq!(find_invalid_xml_char("<>&'\"áéíóú"), None);
/// assert_eq!(find_invalid_xml_char("bell\u{7}"), Some((4, '\u{7}')));
/// ```
pub fn find_invalid_xml_char(s: &str) -> Option<(usize, char)> {
    // Fast path: everything at or above 0x20 in ASCII is legal
    if s.bytes().all(|b| b >= 0x20 || b == 0x09 || b == 0x0a || b == 0x0d) && s.is_ascii() {
        return None;
    }
    s.char_indices().find(|&(_, c)| !is_xml_char(c))
}
