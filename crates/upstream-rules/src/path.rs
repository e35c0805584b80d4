//! Dotted body-field path grammar.
//!
//! A path is one or more non-empty segments separated by `.`; a literal dot
//! inside a segment is written `\.`. Everything from the first `[` onwards is
//! an array-index suffix that the grammar keeps opaque. [`check_index_suffix`]
//! validates it separately.

use std::fmt;

use crate::error::PathError;

/// A parsed body-field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<String>,
    index_suffix: Option<String>,
}

impl FieldPath {
    /// Segments of the dotted prefix, with `\.` unescaped.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// First segment (the top-level body field the path targets).
    pub fn first_segment(&self) -> &str {
        // parse_path never yields an empty segment list
        self.segments.first().map(String::as_str).unwrap_or_default()
    }

    /// The raw `[N]...` suffix, if the path has one.
    pub fn index_suffix(&self) -> Option<&str> {
        self.index_suffix.as_deref()
    }
}

impl fmt::Display for FieldPath {
    /// Writes the normalized path: segments re-escaped and joined by `.`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(&segment.replace('.', "\\."))?;
        }
        if let Some(suffix) = &self.index_suffix {
            f.write_str(suffix)?;
        }
        Ok(())
    }
}

/// Parse a raw path string.
///
/// Returns `Ok(None)` for an empty string: an unfilled field is "no path",
/// not an error.
pub fn parse_path(raw: &str) -> Result<Option<FieldPath>, PathError> {
    if raw.is_empty() {
        return Ok(None);
    }

    let (prefix, index_suffix) = match raw.find('[') {
        Some(pos) => (&raw[..pos], Some(raw[pos..].to_string())),
        None => (raw, None),
    };

    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = prefix.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'.') => {
                chars.next();
                current.push('.');
            }
            '.' => {
                if current.is_empty() {
                    return Err(PathError::InvalidFormat);
                }
                segments.push(std::mem::take(&mut current));
            }
            other => current.push(other),
        }
    }

    if current.is_empty() {
        return Err(PathError::InvalidFormat);
    }
    segments.push(current);

    Ok(Some(FieldPath {
        segments,
        index_suffix,
    }))
}

/// Validate an array-index suffix such as `[0]`, `[2].content` or `[0][1]`.
///
/// Each bracket group must hold a non-negative integer and every dotted
/// segment after a bracket must be non-empty.
pub fn check_index_suffix(suffix: &str) -> Result<(), PathError> {
    let mut chars = suffix.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '[' => {
                let mut digits = 0;
                loop {
                    match chars.next() {
                        Some(']') => break,
                        Some(d) if d.is_ascii_digit() => digits += 1,
                        _ => return Err(PathError::InvalidFormat),
                    }
                }
                if digits == 0 {
                    return Err(PathError::InvalidFormat);
                }
            }
            '.' => {
                let mut len = 0;
                while let Some(&next) = chars.peek() {
                    if next == '.' || next == '[' {
                        break;
                    }
                    chars.next();
                    if next == '\\' && chars.peek() == Some(&'.') {
                        chars.next();
                    }
                    len += 1;
                }
                if len == 0 {
                    return Err(PathError::InvalidFormat);
                }
            }
            _ => return Err(PathError::InvalidFormat),
        }
    }

    Ok(())
}

/// Parse a path and validate its index suffix in one step.
pub(crate) fn parse_full(raw: &str) -> Result<Option<FieldPath>, PathError> {
    let parsed = parse_path(raw)?;
    if let Some(suffix) = parsed.as_ref().and_then(FieldPath::index_suffix) {
        check_index_suffix(suffix)?;
    }
    Ok(parsed)
}
