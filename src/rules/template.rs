use super::PatternError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    // index into the matcher's capture list
    Capture(usize),
}

/// Target name of a `match` rule with `{name}` placeholders resolved against
/// the pattern's captures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTemplate {
    source: String,
    parts: Vec<Part>,
}

impl NameTemplate {
    /// Compiles `target`, resolving each placeholder to a capture index.
    ///
    /// # Errors
    /// Returns [`PatternError`] for an empty target, an unterminated `{`, a
    /// stray `}`, or a placeholder naming no capture in `captures`.
    pub fn compile(target: &str, captures: &[String]) -> Result<Self, PatternError> {
        if target.is_empty() {
            return Err(PatternError::EmptyTarget);
        }

        let mut parts = Vec::new();
        let mut rest = target;

        while let Some(open) = rest.find(['{', '}']) {
            let (literal, tail) = rest.split_at(open);
            if tail.starts_with('}') {
                return Err(PatternError::StrayBrace(target.to_owned()));
            }
            if !literal.is_empty() {
                parts.push(Part::Literal(literal.to_owned()));
            }

            let close = tail
                .find('}')
                .ok_or_else(|| PatternError::UnterminatedPlaceholder(target.to_owned()))?;
            let name = &tail[1..close];
            if name.contains('{') {
                return Err(PatternError::UnterminatedPlaceholder(target.to_owned()));
            }

            let index = captures.iter().position(|c| c == name).ok_or_else(|| {
                PatternError::UnknownPlaceholder {
                    target: target.to_owned(),
                    name: name.to_owned(),
                }
            })?;
            parts.push(Part::Capture(index));
            rest = &tail[close + 1..];
        }

        if !rest.is_empty() {
            parts.push(Part::Literal(rest.to_owned()));
        }

        Ok(Self {
            source: target.to_owned(),
            parts,
        })
    }

    /// The template text as configured.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Substitutes captured `values` (in capture order) into the template.
    #[must_use]
    pub fn render(&self, values: &[&str]) -> String {
        let mut name = String::with_capacity(self.source.len());
        for part in &self.parts {
            match part {
                Part::Literal(text) => name.push_str(text),
                Part::Capture(index) => {
                    name.push_str(values.get(*index).copied().unwrap_or_default());
                }
            }
        }
        name
    }
}
