/// Token shape recognized in text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Syntax {
    /// `$NAME` and `${NAME}`.
    Dollar { braces_required: bool },
    /// `@NAME@`.
    At,
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_braced_name_char(c: char) -> bool {
    !c.is_whitespace() && c != '{' && c != '}' && c != '$'
}

fn is_at_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '-')
}

/// Rewrite every resolvable token in `text`. Tokens `resolve` returns `None`
/// for, and malformed tokens, are copied through verbatim.
pub(crate) fn replace_tokens(
    text: &str,
    syntax: Syntax,
    resolve: &mut dyn FnMut(&str) -> Option<String>,
) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let sigil = match syntax {
        Syntax::Dollar { .. } => '$',
        Syntax::At => '@',
    };

    while let Some(start) = rest.find(sigil) {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let scanned = match syntax {
            Syntax::Dollar { braces_required } => scan_dollar(after, braces_required),
            Syntax::At => scan_at(after),
        };
        match scanned {
            Some((name, consumed)) => {
                let token = &rest[start..start + 1 + consumed];
                match resolve(name) {
                    Some(value) => out.push_str(&value),
                    None => out.push_str(token),
                }
                rest = &after[consumed..];
            }
            None => {
                out.push(sigil);
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// `(name, bytes consumed after the '$')` for a well-formed token.
fn scan_dollar(after: &str, braces_required: bool) -> Option<(&str, usize)> {
    if let Some(inner) = after.strip_prefix('{') {
        let end = inner.find('}')?;
        let name = &inner[..end];
        if name.is_empty() || !name.chars().all(is_braced_name_char) {
            return None;
        }
        return Some((name, end + 2));
    }
    if braces_required {
        return None;
    }
    let len = unbraced_name_len(after);
    (len > 0).then(|| (&after[..len], len))
}

/// Letters, digits and `_`; a `.` counts only between name characters so
/// "$HOME." stops before the period.
fn unbraced_name_len(s: &str) -> usize {
    let mut len = 0;
    let mut chars = s.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if is_name_char(c) {
            len = i + c.len_utf8();
        } else if c == '.' && len == i && len > 0 {
            match chars.peek() {
                Some(&(_, next)) if is_name_char(next) => {}
                _ => break,
            }
        } else {
            break;
        }
    }
    len
}

fn scan_at(after: &str) -> Option<(&str, usize)> {
    let end = after.find('@')?;
    let name = &after[..end];
    if name.is_empty() || !name.chars().all(is_at_name_char) {
        return None;
    }
    Some((name, end + 1))
}
