use std::borrow::Cow;

/// Neutralizes PHP open sequences in literal template text.
///
/// Every `<?` occurrence, and a bare `?` at the very start of the text, is
/// replaced with a PHP echo of that literal sequence so template text can
/// never accidentally open a code section in the generated output.
pub(crate) fn escape_language(text: &str) -> Cow<'_, str> {
    if !text.contains("<?") && !text.starts_with('?') {
        return Cow::Borrowed(text);
    }

    let mut result = String::with_capacity(text.len() + 24);
    let mut rest = text;

    if let Some(stripped) = rest.strip_prefix('?') {
        result.push_str("<?php echo '?'; ?>");
        rest = stripped;
    }

    while let Some(pos) = rest.find("<?") {
        let (before, after) = rest.split_at(pos);
        result.push_str(before);
        result.push_str("<?php echo '<?'; ?>");
        rest = after.get(2..).unwrap_or("");
    }
    result.push_str(rest);

    Cow::Owned(result)
}

/// Encodes text as a single-quoted PHP string literal.
pub(crate) fn string_literal(text: &str) -> String {
    let mut literal = String::with_capacity(text.len() + 2);
    literal.push('\'');
    for c in text.chars() {
        if c == '\\' || c == '\'' {
            literal.push('\\');
        }
        literal.push(c);
    }
    literal.push('\'');
    literal
}

/// HTML-escapes text with `htmlspecialchars(ENT_QUOTES)` semantics.
///
/// With `double_encode` false, an existing entity reference (`&amp;`,
/// `&#39;`, `&#x27;`) is left intact rather than having its `&` re-encoded.
pub fn escape_html(text: &str, double_encode: bool) -> Cow<'_, str> {
    let needs_escape = |c: char| matches!(c, '&' | '<' | '>' | '"' | '\'');
    if !text.contains(needs_escape) {
        return Cow::Borrowed(text);
    }

    let mut result = String::with_capacity(text.len() + 8);
    let mut chars = text.char_indices();
    while let Some((pos, c)) = chars.next() {
        match c {
            '&' => {
                let entity = if double_encode {
                    None
                } else {
                    entity_len(text.get(pos..).unwrap_or(""))
                };
                if let Some(len) = entity {
                    result.push_str(text.get(pos..pos + len).unwrap_or(""));
                    // Skip the rest of the entity.
                    for _ in 0..len.saturating_sub(1) {
                        chars.next();
                    }
                } else {
                    result.push_str("&amp;");
                }
            }
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#039;"),
            other => result.push(other),
        }
    }

    Cow::Owned(result)
}

/// Length in bytes of the entity reference starting at `text` (which begins
/// with `&`), or None if what follows is not a well-formed entity.
fn entity_len(text: &str) -> Option<usize> {
    let body = text.strip_prefix('&')?;

    let payload_len = if let Some(numeric) = body.strip_prefix('#') {
        let digits_len = if let Some(hex) = numeric.strip_prefix(['x', 'X']) {
            let len = hex.chars().take_while(char::is_ascii_hexdigit).count();
            if len == 0 {
                return None;
            }
            len + 1
        } else {
            let len = numeric
                .chars()
                .take_while(char::is_ascii_digit)
                .count();
            if len == 0 {
                return None;
            }
            len
        };
        digits_len + 1
    } else {
        if !body.chars().next()?.is_ascii_alphabetic() {
            return None;
        }
        body.chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .count()
    };

    // `&` + payload + `;`
    if body.get(payload_len..)?.starts_with(';') {
        Some(payload_len + 2)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_language_borrows_clean_text() {
        let result = escape_language("plain <b>text</b>");
        assert!(matches!(result, Cow::Borrowed(_)), "no allocation expected");
        assert_eq!(result, "plain <b>text</b>");
    }

    #[test]
    fn escape_language_neutralizes_php_open() {
        assert_eq!(
            escape_language("a <? b <?php c"),
            "a <?php echo '<?'; ?> b <?php echo '<?'; ?>php c"
        );
    }

    #[test]
    fn escape_language_neutralizes_leading_question_mark() {
        assert_eq!(escape_language("?> tail"), "<?php echo '?'; ?>> tail");
        // A question mark elsewhere is harmless.
        assert_eq!(escape_language("a ? b"), "a ? b");
    }

    #[test]
    fn string_literal_quotes_and_escapes() {
        assert_eq!(string_literal("html5"), "'html5'");
        assert_eq!(string_literal("it's"), r"'it\'s'");
        assert_eq!(string_literal(r"a\b"), r"'a\\b'");
    }

    #[test]
    fn escape_html_quotes_everything() {
        assert_eq!(
            escape_html(r#"<a href="x">&'"#, true),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#039;"
        );
    }

    #[test]
    fn escape_html_once_preserves_entities() {
        assert_eq!(escape_html("a &amp; b", false), "a &amp; b");
        assert_eq!(escape_html("a &#039; b", false), "a &#039; b");
        assert_eq!(escape_html("a &#x27; b", false), "a &#x27; b");
        // A bare ampersand is still encoded.
        assert_eq!(escape_html("a & b", false), "a &amp; b");
        assert_eq!(escape_html("a &notanentity b", false), "a &amp;notanentity b");
    }

    #[test]
    fn escape_html_once_is_idempotent() {
        let raw = r#"say "hi" & <bye>"#;
        let once = escape_html(raw, true).into_owned();
        assert_eq!(escape_html(&once, false), once);
    }
}
