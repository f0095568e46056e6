use regex::Regex;

use super::PatternError;

// one or more dots, emitters sometimes produce `a..b`
const SEGMENT_SEPARATOR: &str = r"\.+";
const CAPTURE: &str = r"([^.]+)";
const WILDCARD: &str = r".+?";

enum Segment<'a> {
    Literal(&'a str),
    Capture(&'a str),
    Wildcard,
}

/// A compiled rule pattern.
///
/// Matching is a leftmost-first search over the metric name: the pattern is
/// not anchored at either end, so `fabio.http.status.{code}` also matches
/// `fabio.http.status.200.count`.
#[derive(Debug, Clone)]
pub struct Matcher {
    template: String,
    regex: Regex,
    captures: Vec<String>,
}

impl Matcher {
    /// The template this matcher was compiled from.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Capture names in order of appearance in the template.
    #[must_use]
    pub fn capture_names(&self) -> &[String] {
        &self.captures
    }

    /// Returns whether `name` matches, without extracting captures.
    #[must_use]
    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    /// Matches `name` and returns the captured values in capture order.
    #[must_use]
    pub fn captures<'n>(&self, name: &'n str) -> Option<Vec<&'n str>> {
        let caps = self.regex.captures(name)?;
        let values = (1..=self.captures.len())
            .map(|group| caps.get(group).map_or("", |m| m.as_str()))
            .collect();
        Some(values)
    }
}

/// Compiles a dot-separated rule template into a [`Matcher`].
///
/// Segments are literals, `{name}` captures (one or more non-dot characters)
/// or `*` wildcards (one or more characters, non-greedy).
///
/// # Errors
/// Returns [`PatternError`] when the template is empty, has an empty segment,
/// a malformed or duplicate capture, or cannot be compiled.
pub fn compile(template: &str) -> Result<Matcher, PatternError> {
    if template.is_empty() {
        return Err(PatternError::Empty);
    }

    let mut source = String::with_capacity(template.len() * 2);
    let mut captures: Vec<String> = Vec::new();

    for (position, segment) in template.split('.').enumerate() {
        if position > 0 {
            source.push_str(SEGMENT_SEPARATOR);
        }

        match classify(template, segment, position)? {
            Segment::Literal(text) => source.push_str(&regex::escape(text)),
            Segment::Wildcard => source.push_str(WILDCARD),
            Segment::Capture(name) => {
                if captures.iter().any(|c| c == name) {
                    return Err(PatternError::DuplicateCapture(name.to_owned()));
                }
                source.push_str(CAPTURE);
                captures.push(name.to_owned());
            }
        }
    }

    Ok(Matcher {
        template: template.to_owned(),
        regex: Regex::new(&source)?,
        captures,
    })
}

fn classify<'a>(
    template: &str,
    segment: &'a str,
    position: usize,
) -> Result<Segment<'a>, PatternError> {
    if segment.is_empty() {
        return Err(PatternError::EmptySegment {
            template: template.to_owned(),
            position,
        });
    }

    if segment == "*" {
        return Ok(Segment::Wildcard);
    }

    if let Some(name) = segment
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
    {
        if !is_capture_name(name) {
            return Err(PatternError::InvalidCaptureName(name.to_owned()));
        }
        return Ok(Segment::Capture(name));
    }

    if segment.contains(['{', '}']) {
        return Err(PatternError::MalformedCapture {
            template: template.to_owned(),
            segment: segment.to_owned(),
        });
    }

    Ok(Segment::Literal(segment))
}

pub(crate) fn is_capture_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
