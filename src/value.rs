//! Canonical serialized form of row values.

const ESCAPED_CHARS: [char; 6] = ['\\', '\n', '\r', '"', '$', '`'];

/// Render a raw value the way it is written back to a file.
///
/// Booleans and integers are emitted bare (integers re-printed, so leading
/// zeros go away); everything else is escaped and double-quoted. A value
/// that still carries outer quotes is treated as an explicit string: the
/// quotes are stripped and the content is never coerced to a number.
pub fn normalize_value(raw: &str) -> String {
    let value = raw.trim();
    if value.is_empty() {
        return String::new();
    }

    let body = match strip_outer_quotes(value) {
        Some(inner) => inner,
        None => {
            if value == "true" || value == "false" {
                return value.to_owned();
            }
            if let Ok(number) = value.parse::<i64>() {
                return number.to_string();
            }
            value
        }
    };

    format!("\"{}\"", escape_double_quoted(body))
}

/// Strip one matching pair of single or double quotes.
pub(crate) fn strip_outer_quotes(value: &str) -> Option<&str> {
    let bytes = value.as_bytes();
    if bytes.len() < 2 {
        return None;
    }

    let first = bytes[0];
    let last = bytes[bytes.len() - 1];
    if first == last && (first == b'"' || first == b'\'') {
        Some(&value[1..value.len() - 1])
    } else {
        None
    }
}

fn escape_double_quoted(value: &str) -> String {
    if !value.contains(ESCAPED_CHARS) {
        return value.to_owned();
    }

    let mut out = String::with_capacity(value.len() + 8);
    for ch in value.chars() {
        match ch {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\\' | '"' | '$' | '`' => {
                out.push('\\');
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }

    out
}
