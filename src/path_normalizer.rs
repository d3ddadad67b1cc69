//! Path Normalization Module
//!
//! Every path the checker compares goes through [`PathNormalizer::normalize`]
//! first. Backend routes, frontend API calls and navigation targets are written
//! in different styles, so they only become comparable after normalization.
//!
//! ## Rules, in order
//!
//! 1. Anything that does not start with `/` after trimming is not a path.
//! 2. Template interpolations: `/users/${user.id}` → `/users/:param`
//! 3. Query strings and fragments: `/users?page=1#top` → `/users`
//! 4. Named parameters: `/users/:userId` → `/users/:param`
//! 5. Repeated slashes: `/users//list` → `/users/list`
//! 6. Numeric segments: `/users/123` → `/users/:param`
//! 7. Configured prefixes (default `/api`): `/api/users` → `/users`, `/api` → `/`
//! 8. Trailing slash: `/users/` → `/users`
//!
//! Interpolations are rewritten before named parameters so both syntaxes end up
//! on the same placeholder.

use crate::config::Config;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Placeholder every path parameter is rewritten to.
pub const PARAM_PLACEHOLDER: &str = ":param";

/// A normalized, comparison-ready HTTP path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalPath(String);

impl CanonicalPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Non-empty segments, in order. The root path has none.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|segment| !segment.is_empty())
    }

    /// Last segment that is not a parameter placeholder.
    pub fn last_literal_segment(&self) -> Option<&str> {
        self.segments()
            .filter(|segment| !segment.contains(PARAM_PLACEHOLDER))
            .last()
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn named_param_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r":[A-Za-z_$][A-Za-z0-9_$]*").unwrap())
}

fn repeated_slash_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/{2,}").unwrap())
}

fn numeric_segment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/[0-9]+(?:/|$)").unwrap())
}

/// Normalizes raw path literals into [`CanonicalPath`]s.
///
/// Holds only the configured prefix list, so a single instance can be shared
/// by every stage of a run.
#[derive(Debug, Clone)]
pub struct PathNormalizer {
    strip_prefixes: Vec<String>,
}

impl PathNormalizer {
    pub fn new<I, S>(strip_prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let strip_prefixes = strip_prefixes
            .into_iter()
            .filter_map(|prefix| {
                let prefix = prefix.as_ref().trim().trim_end_matches('/');
                if prefix.is_empty() {
                    return None;
                }
                Some(if prefix.starts_with('/') {
                    prefix.to_string()
                } else {
                    format!("/{}", prefix)
                })
            })
            .collect();

        Self { strip_prefixes }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.strip_prefixes)
    }

    /// Normalizer that strips nothing.
    pub fn without_prefixes() -> Self {
        Self {
            strip_prefixes: Vec::new(),
        }
    }

    /// Normalize a raw path literal. Returns `None` for strings that are not
    /// paths, which callers discard.
    pub fn normalize(&self, raw: &str) -> Option<CanonicalPath> {
        let trimmed = raw.trim();
        if !trimmed.starts_with('/') {
            return None;
        }

        let interpolated = replace_interpolations(trimmed);
        let without_query = strip_query_and_fragment(&interpolated);
        let parameterised = named_param_regex().replace_all(without_query, PARAM_PLACEHOLDER);
        let collapsed = repeated_slash_regex().replace_all(&parameterised, "/");
        let literal_ids = replace_numeric_segments(&collapsed);

        let mut path = self.strip_configured_prefixes(&literal_ids);
        if path.len() > 1 && path.ends_with('/') {
            path.pop();
        }

        Some(CanonicalPath(path))
    }

    /// Normalize `raw` as seen from under a mount `prefix`.
    pub fn join(&self, prefix: &str, raw: &str) -> Option<CanonicalPath> {
        if !raw.trim().starts_with('/') {
            return None;
        }
        self.normalize(&format!("{}{}", prefix, raw.trim()))
    }

    fn strip_configured_prefixes(&self, path: &str) -> String {
        let mut current = path.to_string();
        loop {
            let stripped = self.strip_prefixes.iter().find_map(|prefix| {
                if current == *prefix {
                    Some("/".to_string())
                } else {
                    current
                        .strip_prefix(prefix.as_str())
                        .filter(|rest| rest.starts_with('/'))
                        .map(str::to_string)
                }
            });

            match stripped {
                Some(next) if next != current => current = next,
                _ => return current,
            }
        }
    }
}

impl Default for PathNormalizer {
    fn default() -> Self {
        Self::new(["/api"])
    }
}

/// Replace every `${...}` with the placeholder, honouring nested braces.
/// An unterminated interpolation swallows the rest of the string.
fn replace_interpolations(path: &str) -> String {
    let mut result = String::with_capacity(path.len());
    let mut chars = path.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next();
            let mut depth = 1usize;
            for inner in chars.by_ref() {
                match inner {
                    '{' => depth += 1,
                    '}' => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    _ => {}
                }
            }
            result.push_str(PARAM_PLACEHOLDER);
        } else {
            result.push(c);
        }
    }

    result
}

/// Numeric segments are ids written out literally, e.g. `/users/42`.
fn replace_numeric_segments(path: &str) -> String {
    let mut current = path.to_string();
    // Adjacent numeric segments share a slash, so one pass can miss every
    // other one.
    while numeric_segment_regex().is_match(&current) {
        current = numeric_segment_regex()
            .replace_all(&current, |caps: &regex::Captures| {
                let tail = if caps[0].ends_with('/') { "/" } else { "" };
                format!("/{}{}", PARAM_PLACEHOLDER, tail)
            })
            .into_owned();
    }
    current
}

fn strip_query_and_fragment(path: &str) -> &str {
    match path.find(['?', '#']) {
        Some(idx) => &path[..idx],
        None => path,
    }
}
