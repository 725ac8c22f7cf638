//! Template string segmentation.
//!
//! A raw control value may embed any number of `{{expr}}` spans. This
//! module splits such a string into alternating literal and dynamic
//! segments without allocating: segments borrow from the input, and
//! concatenating them in order reproduces the input exactly. A `{{` with
//! no matching `}}` is plain literal text.

/// One piece of a template string.
///
/// Dynamic segments keep their delimiters so the split stays lossless;
/// [`Segment::code`] strips them when the inner expression is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Literal text outside any `{{...}}` span.
    Literal(&'a str),
    /// A full `{{...}}` span including both delimiters.
    Dynamic(&'a str),
}

impl<'a> Segment<'a> {
    /// The raw text of the segment as it appears in the input.
    pub fn as_str(&self) -> &'a str {
        match self {
            Segment::Literal(s) | Segment::Dynamic(s) => s,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, Segment::Dynamic(_))
    }

    /// The expression body of a dynamic segment, trimmed of the
    /// delimiters and surrounding whitespace. Empty for literals.
    pub fn code(&self) -> &'a str {
        match self {
            Segment::Literal(_) => "",
            Segment::Dynamic(s) => s[2..s.len() - 2].trim(),
        }
    }
}

/// Iterator over the segments of a template string.
///
/// The iterator is lazy and restartable: cloning it restarts the scan
/// from its current position without re-walking consumed input.
///
/// # Examples
///
/// ```
/// use propsheet::domain::{dynamic_segments, Segment};
///
/// let segments: Vec<Segment> = dynamic_segments("id:{{1+2}}!").collect();
/// assert_eq!(segments.len(), 3);
/// assert_eq!(segments[0].as_str(), "id:");
/// assert_eq!(segments[1].code(), "1+2");
/// assert_eq!(segments[2].as_str(), "!");
/// ```
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    rest: &'a str,
}

/// Splits a template string into literal and `{{...}}` segments.
pub fn dynamic_segments(input: &str) -> Segments<'_> {
    Segments { rest: input }
}

/// Locates the next well-formed `{{...}}` span in `input`.
///
/// Returns the byte range of the full span. Single braces inside the span
/// may nest (object literals, for example); the span closes at the first
/// `}}` found at nesting depth zero.
fn find_dynamic_span(input: &str) -> Option<(usize, usize)> {
    let bytes = input.as_bytes();
    let mut search_from = 0;

    while let Some(open) = input[search_from..].find("{{").map(|i| i + search_from) {
        let mut depth = 0usize;
        let mut i = open + 2;

        while i < bytes.len() {
            match bytes[i] {
                b'{' => depth += 1,
                b'}' => {
                    if depth == 0 && bytes.get(i + 1) == Some(&b'}') {
                        return Some((open, i + 2));
                    }
                    depth = depth.saturating_sub(1);
                }
                _ => {}
            }
            i += 1;
        }

        // No closing delimiter for this opener, keep looking after it.
        search_from = open + 2;
    }

    None
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Segment<'a>> {
        if self.rest.is_empty() {
            return None;
        }

        match find_dynamic_span(self.rest) {
            Some((0, end)) => {
                let (span, rest) = self.rest.split_at(end);
                self.rest = rest;
                Some(Segment::Dynamic(span))
            }
            Some((start, _)) => {
                let (literal, rest) = self.rest.split_at(start);
                self.rest = rest;
                Some(Segment::Literal(literal))
            }
            None => {
                let literal = self.rest;
                self.rest = "";
                Some(Segment::Literal(literal))
            }
        }
    }
}
