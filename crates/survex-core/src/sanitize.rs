//! Text hygiene for exported values, headers and column names.
//!
//! Every textual value that lands inside a quoted field goes through
//! [`sanitize`] exactly once at plan time (headers, names) or write time
//! (data values). The function is idempotent, so re-sanitizing an already
//! clean string is harmless.

/// Collapse line breaks to single spaces and balance embedded quotes.
///
/// `\r\n`, `\r` and `\n` each become one space. Every maximal run of `"`
/// is made even-length (odd runs get one `"` appended), which reads as an
/// escaped quote inside an encapsulated field and is stable under
/// re-application.
pub fn sanitize(value: &str) -> String {
    let mut collapsed = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                collapsed.push(' ');
            }
            '\n' => collapsed.push(' '),
            other => collapsed.push(other),
        }
    }
    balance_quotes(&collapsed)
}

fn balance_quotes(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut run = 0usize;
    for ch in value.chars() {
        if ch == '"' {
            run += 1;
            out.push('"');
        } else {
            if run % 2 == 1 {
                out.push('"');
            }
            run = 0;
            out.push(ch);
        }
    }
    if run % 2 == 1 {
        out.push('"');
    }
    out
}

/// Sanitize a question name into a valid column name.
///
/// Column names must start with a letter or underscore; anything else is
/// prefixed with `_`.
pub fn column_name(value: &str) -> String {
    let sanitized = sanitize(value);
    let valid_start = sanitized
        .chars()
        .next()
        .map(|ch| ch.is_ascii_alphabetic() || ch == '_')
        .unwrap_or(false);
    if valid_start {
        sanitized
    } else {
        format!("_{sanitized}")
    }
}

/// Clean a question label for a schema declaration: labels sit inside a
/// `{...}` group, so `}` is stripped along with line breaks.
pub fn schema_label(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !matches!(ch, '\r' | '\n' | '}'))
        .collect()
}

/// True when the value matches `^\d+$`.
pub fn is_all_digits(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|ch| ch.is_ascii_digit())
}
