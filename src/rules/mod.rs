use thiserror::Error;

use self::pattern::{compile, Matcher};
use self::template::NameTemplate;

pub mod loader;
pub mod pattern;
pub mod template;

pub use loader::RulesError;

/// Errors raised while compiling a rule pattern or target template.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PatternError {
    /// The pattern has no segments.
    #[error("empty pattern")]
    Empty,

    /// A segment between two dots (or at either end) is empty.
    #[error("empty segment {position} in pattern `{template}`")]
    EmptySegment {
        /// The offending pattern.
        template: String,
        /// Zero-based segment index.
        position: usize,
    },

    /// A segment uses braces but is not exactly `{name}`.
    #[error("malformed capture `{segment}` in pattern `{template}`")]
    MalformedCapture {
        /// The offending pattern.
        template: String,
        /// The offending segment.
        segment: String,
    },

    /// A capture name is not an identifier.
    #[error("invalid capture name `{0}`")]
    InvalidCaptureName(String),

    /// The same capture name appears twice in one pattern.
    #[error("duplicate capture name `{0}`")]
    DuplicateCapture(String),

    /// A `match` rule has an empty target.
    #[error("empty target template")]
    EmptyTarget,

    /// A `{` in a target template is never closed.
    #[error("unterminated placeholder in target `{0}`")]
    UnterminatedPlaceholder(String),

    /// A `}` in a target template has no opening brace.
    #[error("stray `}}` in target `{0}`")]
    StrayBrace(String),

    /// A target placeholder names no capture of the pattern.
    #[error("target `{target}` references unknown capture `{name}`")]
    UnknownPlaceholder {
        /// The offending target template.
        target: String,
        /// The placeholder name.
        name: String,
    },

    /// The generated regular expression was rejected.
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

/// What a rule does with a metric whose name matches its pattern.
#[derive(Debug, Clone)]
pub enum RuleAction {
    /// Rewrite the name from the template and emit captures as tags.
    Match(NameTemplate),
    /// Discard the metric.
    Drop,
    /// Forward the metric unmodified.
    Relay,
}

/// Outcome of evaluating a metric name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleResult {
    /// A `match` rule fired.
    Match {
        /// The rewritten metric name.
        name: String,
        /// One `capture:value` tag per capture, in template order.
        tags: Vec<String>,
    },
    /// A `drop` rule fired.
    Drop,
    /// A `relay` rule fired.
    Relay,
    /// No rule fired.
    Miss,
}

impl RuleResult {
    /// Returns `true` for [`RuleResult::Miss`].
    #[must_use]
    pub const fn is_miss(&self) -> bool {
        matches!(self, Self::Miss)
    }
}

/// A compiled pattern paired with its action.
#[derive(Debug, Clone)]
pub struct Rule {
    matcher: Matcher,
    action: RuleAction,
}

impl Rule {
    /// Creates a rule that rewrites matching names into `target`.
    ///
    /// # Errors
    /// Returns [`PatternError`] if the pattern or target is ill-formed.
    pub fn matching(pattern: &str, target: &str) -> Result<Self, PatternError> {
        let matcher = compile(pattern)?;
        let target = NameTemplate::compile(target, matcher.capture_names())?;
        Ok(Self {
            matcher,
            action: RuleAction::Match(target),
        })
    }

    /// Creates a rule that discards matching metrics.
    ///
    /// # Errors
    /// Returns [`PatternError`] if the pattern is ill-formed.
    pub fn dropping(pattern: &str) -> Result<Self, PatternError> {
        Ok(Self {
            matcher: compile(pattern)?,
            action: RuleAction::Drop,
        })
    }

    /// Creates a rule that forwards matching metrics unmodified.
    ///
    /// # Errors
    /// Returns [`PatternError`] if the pattern is ill-formed.
    pub fn relaying(pattern: &str) -> Result<Self, PatternError> {
        Ok(Self {
            matcher: compile(pattern)?,
            action: RuleAction::Relay,
        })
    }

    /// The pattern this rule was built from.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.matcher.template()
    }

    /// The action taken on a match.
    #[must_use]
    pub const fn action(&self) -> &RuleAction {
        &self.action
    }

    /// Evaluates this single rule against `name`.
    #[must_use]
    pub fn evaluate(&self, name: &str) -> RuleResult {
        match &self.action {
            RuleAction::Drop if self.matcher.is_match(name) => RuleResult::Drop,
            RuleAction::Relay if self.matcher.is_match(name) => RuleResult::Relay,
            RuleAction::Drop | RuleAction::Relay => RuleResult::Miss,
            RuleAction::Match(target) => {
                let Some(values) = self.matcher.captures(name) else {
                    return RuleResult::Miss;
                };
                let tags = self
                    .matcher
                    .capture_names()
                    .iter()
                    .zip(&values)
                    .map(|(key, value)| format!("{key}:{value}"))
                    .collect();
                RuleResult::Match {
                    name: target.render(&values),
                    tags,
                }
            }
        }
    }
}

/// An ordered, immutable list of rules evaluated first-match-wins.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Creates a rule set evaluated in the given order.
    #[must_use]
    pub const fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Starts a [`RuleSetBuilder`].
    #[must_use]
    pub const fn builder() -> RuleSetBuilder {
        RuleSetBuilder { rules: Vec::new() }
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if there are no rules; every metric then misses.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterates over the rules in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Evaluates `name` against each rule in order and returns the first
    /// outcome that is not a miss.
    #[must_use]
    pub fn evaluate(&self, name: &str) -> RuleResult {
        self.rules
            .iter()
            .map(|rule| rule.evaluate(name))
            .find(|result| !result.is_miss())
            .unwrap_or(RuleResult::Miss)
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Registers rules in evaluation order.
#[derive(Debug, Default)]
pub struct RuleSetBuilder {
    rules: Vec<Rule>,
}

impl RuleSetBuilder {
    /// Appends a `match` rule.
    ///
    /// # Errors
    /// Returns [`PatternError`] if the pattern or target is ill-formed.
    pub fn match_rule(self, pattern: &str, target: &str) -> Result<Self, PatternError> {
        Ok(self.rule(Rule::matching(pattern, target)?))
    }

    /// Appends a `drop` rule.
    ///
    /// # Errors
    /// Returns [`PatternError`] if the pattern is ill-formed.
    pub fn drop(self, pattern: &str) -> Result<Self, PatternError> {
        Ok(self.rule(Rule::dropping(pattern)?))
    }

    /// Appends a `relay` rule.
    ///
    /// # Errors
    /// Returns [`PatternError`] if the pattern is ill-formed.
    pub fn relay(self, pattern: &str) -> Result<Self, PatternError> {
        Ok(self.rule(Rule::relaying(pattern)?))
    }

    /// Appends an already compiled rule.
    #[must_use]
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Finishes the rule set.
    #[must_use]
    pub fn build(self) -> RuleSet {
        RuleSet::new(self.rules)
    }
}
