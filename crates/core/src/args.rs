//! Lenient argument model.
//!
//! Layout: `<program> <action> [<target>] [options...] [unparsed...]`.
//! Options are `-name value` (two tokens) or `--name[=value]` (one token).
//! Parsing never fails: the first token that is neither form ends option
//! parsing and it, plus everything after it, lands in `unparsed`.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Result of parsing one argument vector. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedArguments {
    pub action: String,
    /// Empty when no target was given.
    pub target: String,
    pub options: BTreeMap<String, String>,
    pub unparsed: Vec<String>,
    pub raw_argv: Vec<String>,
}

impl ParsedArguments {
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(String::as_str)
    }
}

impl fmt::Display for ParsedArguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Action: {}", self.action)?;
        if !self.target.is_empty() {
            write!(f, ", target: {}", self.target)?;
        }
        write!(f, ", options: {{")?;
        for (i, (name, value)) in self.options.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {:?}", name, value)?;
        }
        write!(f, "}}, unparsed: {:?}", self.unparsed)
    }
}

/// Parse an argument vector whose first element is the program name.
pub fn parse<I, S>(argv: I) -> ParsedArguments
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let raw_argv: Vec<String> = argv.into_iter().map(Into::into).collect();
    let mut parsed = ParsedArguments {
        raw_argv,
        ..ParsedArguments::default()
    };
    let argv = &parsed.raw_argv;
    if argv.len() < 2 {
        return parsed;
    }

    let action = argv[1].clone();
    let mut i = 2;

    let mut target = String::new();
    if let Some(next) = argv.get(i) {
        if !next.starts_with('-') {
            target = next.clone();
            i += 1;
        }
    }

    let mut options = BTreeMap::new();
    while i < argv.len() {
        let cur = argv[i].as_str();
        if let Some((name, value)) = long_option(cur) {
            options.insert(name, value);
            i += 1;
            continue;
        }
        if let Some(name) = short_option_name(cur) {
            if let Some(value) = argv.get(i + 1) {
                options.insert(name.to_string(), value.clone());
                i += 2;
                continue;
            }
        }
        break;
    }

    let unparsed = argv[i..].to_vec();
    parsed.action = action;
    parsed.target = target;
    parsed.options = options;
    parsed.unparsed = unparsed;
    parsed
}

/// `-name` with a non-empty name that does not itself start with `-`.
fn short_option_name(token: &str) -> Option<&str> {
    let name = token.strip_prefix('-')?;
    if name.is_empty() || name.starts_with('-') {
        return None;
    }
    Some(name)
}

/// `--name` or `--name=value`. A bare `--` has no name and does not match.
fn long_option(token: &str) -> Option<(String, String)> {
    let body = token.strip_prefix("--")?;
    let (name, value) = match body.find('=') {
        Some(eq) => (&body[..eq], &body[eq + 1..]),
        None => (body, ""),
    };
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.to_string()))
}
