// Backslash escaping shared by the record and entity-list layers

const ESCAPE: char = '\\';

/// What `split_unescaped` does with escape sequences inside a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Segment {
    /// Drop the backslash and keep the escaped character
    Resolve,
    /// Keep the sequence as-is for a later, inner split
    Keep,
}

/// Append `value` to `out`, escaping the escape character and every char in `specials`
pub(super) fn escape_into(out: &mut String, value: &str, specials: &[char]) {
    for c in value.chars() {
        if c == ESCAPE || specials.contains(&c) {
            out.push(ESCAPE);
        }
        out.push(c);
    }
}

/// Split on every `separator` that is not preceded by an escape
///
/// Returns `None` when the input ends in the middle of an escape sequence.
pub(super) fn split_unescaped(input: &str, separator: char, mode: Segment) -> Option<Vec<String>> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        if c == ESCAPE {
            let escaped = chars.next()?;
            if mode == Segment::Keep {
                current.push(ESCAPE);
            }
            current.push(escaped);
        } else if c == separator {
            segments.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    segments.push(current);

    Some(segments)
}
