//! Lexical endpoint extraction.
//!
//! Nothing here parses JavaScript. Each extractor is a set of regular
//! expressions over raw file text, so it works on fragments that would not
//! parse in isolation and it will both over- and under-match: any
//! `x.get('/path')` counts as a route, while routes built from variables or
//! registered through helpers are missed.

use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::file_finder::SourceFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    All,
}

impl HttpMethod {
    pub fn parse(method: &str) -> Option<Self> {
        match method.to_ascii_lowercase().as_str() {
            "get" => Some(HttpMethod::Get),
            "post" => Some(HttpMethod::Post),
            "put" => Some(HttpMethod::Put),
            "delete" => Some(HttpMethod::Delete),
            "patch" => Some(HttpMethod::Patch),
            "all" => Some(HttpMethod::All),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::All => "ALL",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One matched registration, call or navigation site.
///
/// `http_method` is `None` where the site carries no method (navigation,
/// `fetch`, `url:` fields).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEndpoint {
    pub http_method: Option<HttpMethod>,
    pub raw_path: String,
    pub source_file: PathBuf,
    pub line: usize,
}

/// Maps byte offsets to 1-based line numbers.
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(idx, _)| idx + 1))
            .collect();
        Self { starts }
    }

    pub fn line_of(&self, offset: usize) -> usize {
        self.starts.partition_point(|&start| start <= offset)
    }
}

// A quoted string literal of any kind, content captured.
macro_rules! literal {
    () => {
        r#"(?:'([^'\n]*)'|"([^"\n]*)"|`([^`]*)`)"#
    };
}

// A quoted string literal whose content starts with `/`.
macro_rules! slash_literal {
    () => {
        r#"(?:'(/[^'\n]*)'|"(/[^"\n]*)"|`(/[^`]*)`)"#
    };
}

fn backend_route_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"[A-Za-z_$][A-Za-z0-9_$]*\s*\.\s*(?P<method>get|post|put|delete|patch|all)\s*\(\s*",
            literal!()
        ))
        .unwrap()
    })
}

fn frontend_call_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"[A-Za-z_$][A-Za-z0-9_$]*\s*\.\s*(?P<method>get|post|put|delete|patch)\s*(?:<[^()\n]*>)?\s*\(\s*",
            slash_literal!()
        ))
        .unwrap()
    })
}

fn fetch_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(concat!(r"\bfetch\s*\(\s*", slash_literal!())).unwrap())
}

fn url_field_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(r#"(?:\burl|["']url["'])\s*:\s*"#, slash_literal!())).unwrap()
    })
}

fn router_push_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"(?:\$router|\brouter|\bRouter|\bhistory)\s*\.\s*(?:push|replace)\s*\(\s*(?:",
            slash_literal!(),
            r"|\{[^}]*?\bpath\s*:\s*",
            slash_literal!(),
            ")"
        ))
        .unwrap()
    })
}

fn navigate_call_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"\b(?:navigateTo|navigate|location\s*\.\s*assign)\s*\(\s*",
            slash_literal!()
        ))
        .unwrap()
    })
}

fn location_href_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(r"\blocation\s*\.\s*href\s*=\s*", slash_literal!())).unwrap()
    })
}

fn link_attribute_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?:^|[\s<])(?::to|v-bind:to)\s*=\s*"'(/[^'"]*)'"|(?:^|[\s<])to\s*=\s*(?:"(/[^"]*)"|'(/[^']*)'|\{\s*(?:'(/[^'\n]*)'|"(/[^"\n]*)"|`(/[^`]*)`)\s*\})"#,
        )
        .unwrap()
    })
}

fn route_definition_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(concat!(r"\bpath\s*:\s*", literal!())).unwrap())
}

/// First participating capture group other than `method`.
fn first_literal<'t>(re: &Regex, caps: &Captures<'t>) -> Option<&'t str> {
    re.capture_names()
        .zip(caps.iter())
        .skip(1)
        .filter(|(name, _)| *name != Some("method"))
        .find_map(|(_, m)| m.map(|m| m.as_str()))
}

fn collect_matches(
    file: &SourceFile,
    lines: &LineIndex,
    re: &Regex,
    out: &mut Vec<RawEndpoint>,
) {
    for caps in re.captures_iter(&file.content) {
        let Some(raw_path) = first_literal(re, &caps) else {
            continue;
        };
        if !raw_path.trim_start().starts_with('/') {
            continue;
        }
        let http_method = caps
            .name("method")
            .and_then(|m| HttpMethod::parse(m.as_str()));
        let offset = caps.get(0).map_or(0, |m| m.start());

        out.push(RawEndpoint {
            http_method,
            raw_path: raw_path.to_string(),
            source_file: file.path.clone(),
            line: lines.line_of(offset),
        });
    }
}

fn extract_with(file: &SourceFile, patterns: &[&Regex]) -> Vec<RawEndpoint> {
    let lines = LineIndex::new(&file.content);
    let mut endpoints = Vec::new();
    for re in patterns {
        collect_matches(file, &lines, re, &mut endpoints);
    }
    endpoints.sort_by_key(|endpoint| endpoint.line);
    endpoints
}

/// Route registrations shaped like `<ident>.<verb>('<path>', ...)`.
pub fn extract_backend(file: &SourceFile) -> Vec<RawEndpoint> {
    extract_with(file, &[backend_route_regex()])
}

/// HTTP calls made by frontend code: verb-style client calls, `fetch`, and
/// `url:` fields of request config objects. The shapes are matched
/// independently and their results combined.
pub fn extract_frontend_calls(file: &SourceFile) -> Vec<RawEndpoint> {
    extract_with(
        file,
        &[frontend_call_regex(), fetch_regex(), url_field_regex()],
    )
}

/// In-app navigation targets: router pushes, navigate helpers, link `to`
/// attributes and `location.href` assignments.
pub fn extract_frontend_nav(file: &SourceFile) -> Vec<RawEndpoint> {
    extract_with(
        file,
        &[
            router_push_regex(),
            navigate_call_regex(),
            location_href_regex(),
            link_attribute_regex(),
        ],
    )
}

/// A `{ ... }` object literal met while walking a route table, with the first
/// `path:` key found directly inside it.
struct RouteObject<'a> {
    parent: Option<usize>,
    path: Option<(usize, &'a str)>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Lexeme {
    Code,
    Quoted(char),
    LineComment,
    BlockComment,
}

/// Assign each `path:` key (byte offset, literal) to its innermost enclosing
/// object. Keys that fall inside strings or comments are dropped.
fn route_objects<'a>(content: &str, keys: &[(usize, &'a str)]) -> Vec<RouteObject<'a>> {
    let mut objects: Vec<RouteObject<'a>> = Vec::new();
    let mut open: Vec<usize> = Vec::new();
    let mut keys = keys.iter().peekable();
    let mut state = Lexeme::Code;
    let mut escaped = false;
    let mut prev = '\0';

    for (idx, c) in content.char_indices() {
        while let Some(&&(offset, raw)) = keys.peek() {
            if offset > idx {
                break;
            }
            keys.next();
            if offset < idx || state != Lexeme::Code {
                continue;
            }
            match open.last() {
                Some(&top) => {
                    if objects[top].path.is_none() {
                        objects[top].path = Some((offset, raw));
                    }
                }
                None => objects.push(RouteObject {
                    parent: None,
                    path: Some((offset, raw)),
                }),
            }
        }

        let next = match state {
            Lexeme::Code => match c {
                '\'' | '"' | '`' => Lexeme::Quoted(c),
                '/' if prev == '/' => Lexeme::LineComment,
                '*' if prev == '/' => Lexeme::BlockComment,
                '{' => {
                    objects.push(RouteObject {
                        parent: open.last().copied(),
                        path: None,
                    });
                    open.push(objects.len() - 1);
                    Lexeme::Code
                }
                '}' => {
                    open.pop();
                    Lexeme::Code
                }
                _ => Lexeme::Code,
            },
            Lexeme::Quoted(quote) => {
                if escaped {
                    escaped = false;
                    state
                } else if c == '\\' {
                    escaped = true;
                    state
                } else if c == quote || (c == '\n' && quote != '`') {
                    Lexeme::Code
                } else {
                    state
                }
            }
            Lexeme::LineComment if c == '\n' => Lexeme::Code,
            Lexeme::BlockComment if c == '/' && prev == '*' => Lexeme::Code,
            _ => state,
        };

        prev = if next == state { c } else { '\0' };
        state = next;
    }

    objects
}

/// Full path of a route object: its own path if absolute, otherwise joined
/// onto the nearest enclosing object that has a path. `None` for relative
/// paths with no such ancestor.
fn resolve_route_path(objects: &[RouteObject<'_>], id: usize) -> Option<String> {
    let (_, raw) = objects[id].path?;
    let raw = raw.trim();
    if raw.starts_with('/') {
        return Some(raw.to_string());
    }

    let mut ancestor = objects[id].parent;
    while let Some(parent) = ancestor {
        if objects[parent].path.is_some() {
            let base = resolve_route_path(objects, parent)?;
            return Some(if raw.is_empty() {
                base
            } else {
                format!("{}/{}", base.trim_end_matches('/'), raw)
            });
        }
        ancestor = objects[parent].parent;
    }
    None
}

/// `path:` entries of the frontend route table. Relative child routes are
/// joined onto their parent, so `{ path: '/a', children: [{ path: 'b' }] }`
/// yields `/a` and `/a/b`.
pub fn extract_frontend_routes(file: &SourceFile) -> Vec<RawEndpoint> {
    let re = route_definition_regex();
    let keys: Vec<(usize, &str)> = re
        .captures_iter(&file.content)
        .filter_map(|caps| Some((caps.get(0)?.start(), first_literal(re, &caps)?)))
        .collect();
    let objects = route_objects(&file.content, &keys);
    let lines = LineIndex::new(&file.content);

    let mut endpoints: Vec<RawEndpoint> = (0..objects.len())
        .filter_map(|id| {
            let (offset, _) = objects[id].path?;
            Some(RawEndpoint {
                http_method: None,
                raw_path: resolve_route_path(&objects, id)?,
                source_file: file.path.clone(),
                line: lines.line_of(offset),
            })
        })
        .collect();
    endpoints.sort_by_key(|endpoint| endpoint.line);
    endpoints
}
