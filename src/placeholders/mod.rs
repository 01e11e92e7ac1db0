//! Lightweight scanning of `?`-style SQL templates.
//!
//! Placeholders and keywords are only recognised outside string literals, quoted
//! identifiers and comments. The scanner is a small state machine and does not parse SQL.

mod parsers;
mod scanner;

use parsers::{is_block_comment_end, is_block_comment_start, is_keyword_at, is_line_comment_start};
use scanner::State;

use crate::error::ClickhouseMiddlewareError;

/// Where a byte of the statement sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    /// Plain SQL text.
    Code,
    /// Either byte of a `??` pair in plain text, which the client sends as a literal `?`.
    EscapedMark,
    /// Inside a string literal, quoted identifier or comment, delimiters included.
    Literal,
}

/// Walk `sql`, calling `visit` once for every byte with the region it belongs to.
fn scan(
    sql: &str,
    mut visit: impl FnMut(&[u8], usize, Region),
) -> Result<(), ClickhouseMiddlewareError> {
    let bytes = sql.as_bytes();
    let mut state = State::Normal;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        let mut width = 1;
        let mut region = Region::Literal;
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                b'`' => state = State::BackQuoted,
                b'?' if bytes.get(idx + 1) == Some(&b'?') => {
                    region = Region::EscapedMark;
                    width = 2;
                }
                _ if is_line_comment_start(bytes, idx) => {
                    state = State::LineComment;
                    width = 2;
                }
                _ if is_block_comment_start(bytes, idx) => {
                    state = State::BlockComment(1);
                    width = 2;
                }
                _ => region = Region::Code,
            },
            State::SingleQuoted | State::DoubleQuoted | State::BackQuoted => {
                let quote = state.quote_byte();
                if b == b'\\' {
                    width = 2; // backslash escape
                } else if Some(b) == quote {
                    if bytes.get(idx + 1) == quote.as_ref() {
                        width = 2; // doubled quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                    width = 2;
                } else if is_block_comment_end(bytes, idx) {
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    width = 2;
                }
            }
        }

        let end = (idx + width).min(bytes.len());
        for at in idx..end {
            visit(bytes, at, region);
        }
        idx = end;
    }

    match state {
        State::Normal | State::LineComment => Ok(()),
        other => Err(ClickhouseMiddlewareError::Parameter(format!(
            "{} in statement",
            other.describe()
        ))),
    }
}

/// What the scanner learned about a statement template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatementShape {
    /// Number of positional `?` placeholders.
    pub placeholders: usize,
    /// Byte offset just past the first top-level `VALUES` keyword.
    pub values_end: Option<usize>,
}

/// Scan a statement template.
///
/// # Errors
/// Returns `ClickhouseMiddlewareError::Parameter` for an unterminated literal,
/// quoted identifier or block comment.
pub fn analyze(sql: &str) -> Result<StatementShape, ClickhouseMiddlewareError> {
    let mut placeholders = 0;
    let mut values_end = None;
    scan(sql, |bytes, idx, region| {
        if region != Region::Code {
            return;
        }
        match bytes[idx] {
            b'?' => placeholders += 1,
            b'v' | b'V' if values_end.is_none() && is_keyword_at(bytes, idx, b"VALUES") => {
                values_end = Some(idx + "VALUES".len());
            }
            _ => {}
        }
    })?;

    Ok(StatementShape {
        placeholders,
        values_end,
    })
}

/// Count positional placeholders outside literals and comments.
///
/// # Errors
/// Same as [`analyze`].
pub fn count_placeholders(sql: &str) -> Result<usize, ClickhouseMiddlewareError> {
    analyze(sql).map(|shape| shape.placeholders)
}

/// Double every `?` inside literals, quoted identifiers and comments.
///
/// `clickhouse::Client` binds each `?` of a query regardless of quoting and reads `??` as
/// a literal question mark. After this rewrite the client binds exactly the placeholders
/// [`count_placeholders`] reports. Apply it once: the result is meant for the client.
///
/// # Errors
/// Same as [`analyze`].
pub fn escape_quoted_marks(sql: &str) -> Result<String, ClickhouseMiddlewareError> {
    let mut marks = Vec::new();
    scan(sql, |bytes, idx, region| {
        if region == Region::Literal && bytes[idx] == b'?' {
            marks.push(idx);
        }
    })?;

    let mut escaped = String::with_capacity(sql.len() + marks.len());
    let mut copied = 0;
    for idx in marks {
        escaped.push_str(&sql[copied..idx]);
        escaped.push('?');
        copied = idx;
    }
    escaped.push_str(&sql[copied..]);
    Ok(escaped)
}

/// An `INSERT ... VALUES (...)` template whose single tuple can be repeated for many rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertTemplate {
    head: String,
    tuple: String,
}

impl InsertTemplate {
    /// Split `sql` at its `VALUES` tuple.
    ///
    /// Returns `None` unless the statement ends in exactly one parenthesised tuple holding
    /// every placeholder of the statement.
    #[must_use]
    pub fn parse(sql: &str, shape: &StatementShape) -> Option<Self> {
        let values_end = shape.values_end?;
        let tail = sql[values_end..]
            .trim_start()
            .trim_end_matches(|c: char| c.is_whitespace() || c == ';');
        if !tail.starts_with('(') {
            return None;
        }

        let mut depth = 0usize;
        let mut closed_at = None;
        scan(tail, |bytes, idx, region| {
            if closed_at.is_some() || region != Region::Code {
                return;
            }
            match bytes[idx] {
                b'(' => depth += 1,
                b')' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        closed_at = Some(idx);
                    }
                }
                _ => {}
            }
        })
        .ok()?;

        if closed_at != Some(tail.len() - 1) || count_placeholders(tail).ok()? != shape.placeholders
        {
            return None;
        }

        Some(Self {
            head: sql[..values_end].to_string(),
            tuple: tail.to_string(),
        })
    }

    /// Render the statement with `rows` copies of the tuple.
    #[must_use]
    pub fn render(&self, rows: usize) -> String {
        let tuples = vec![self.tuple.as_str(); rows.max(1)];
        format!("{} {}", self.head, tuples.join(", "))
    }
}
