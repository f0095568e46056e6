//! Rule file format.
//!
//! One directive per line, fields separated by whitespace:
//!
//! ```text
//! # fabio rewrites
//! match fabio.http.status.{code}  fabio.http.response_code
//! relay fabio.*
//! drop  vault.*
//! ```
//!
//! Lines starting with `#` and blank lines are ignored. Rules are evaluated
//! in file order.

use std::fs;
use std::path::Path;

use thiserror::Error;

use super::{PatternError, Rule, RuleSet};

/// Errors raised while loading a rule file.
#[derive(Error, Debug)]
pub enum RulesError {
    /// The file could not be read.
    #[error("cannot read rule file {path}: {source}")]
    Io {
        /// Path of the rule file.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The first field is not `match`, `drop` or `relay`.
    #[error("line {line}: unknown directive `{directive}`")]
    UnknownDirective {
        /// 1-based line number.
        line: usize,
        /// The directive as written.
        directive: String,
    },

    /// The directive has the wrong number of fields.
    #[error("line {line}: `{directive}` expects {expected} argument(s), found {found}")]
    WrongArity {
        /// 1-based line number.
        line: usize,
        /// The directive as written.
        directive: String,
        /// Expected argument count.
        expected: usize,
        /// Argument count found.
        found: usize,
    },

    /// The pattern or target is ill-formed.
    #[error("line {line}: {source}")]
    Pattern {
        /// 1-based line number.
        line: usize,
        /// Underlying pattern error.
        source: PatternError,
    },
}

/// Reads and parses a rule file.
///
/// # Errors
/// Returns [`RulesError`] if the file cannot be read or any line is invalid.
pub fn load_rules(path: impl AsRef<Path>) -> Result<RuleSet, RulesError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| RulesError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_rules(&text)
}

/// Parses rule file contents.
///
/// # Errors
/// Returns [`RulesError`] naming the first invalid line.
pub fn parse_rules(text: &str) -> Result<RuleSet, RulesError> {
    let mut rules = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut fields = trimmed.split_whitespace();
        let directive = fields.next().unwrap_or_default();
        let args: Vec<&str> = fields.collect();

        let expected = match directive {
            "match" => 2,
            "drop" | "relay" => 1,
            _ => {
                return Err(RulesError::UnknownDirective {
                    line,
                    directive: directive.to_owned(),
                })
            }
        };
        if args.len() != expected {
            return Err(RulesError::WrongArity {
                line,
                directive: directive.to_owned(),
                expected,
                found: args.len(),
            });
        }

        let rule = match directive {
            "match" => Rule::matching(args[0], args[1]),
            "drop" => Rule::dropping(args[0]),
            _ => Rule::relaying(args[0]),
        }
        .map_err(|source| RulesError::Pattern { line, source })?;

        rules.push(rule);
    }

    Ok(RuleSet::new(rules))
}
