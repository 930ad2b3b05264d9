//! Path pattern compilation and matching.
//!
//! # Responsibilities
//! - Split a pattern such as `/privatedata/getattribute/{app}/{key}.{format}`
//!   into literal text and placeholders
//! - Compile it into one anchored regex with a named group per placeholder
//! - Extract placeholder values from a matching path
//!
//! # Design Decisions
//! - A placeholder owns the `/` or `.` directly in front of it, so an
//!   optional placeholder takes its separator with it
//! - Without an explicit requirement a placeholder matches `[^/]+`, minus
//!   the separator that follows it in the pattern
//! - Trailing placeholders that have defaults are optional, nested so that
//!   a later one can only appear after an earlier one

use regex::Regex;
use std::collections::HashMap;
use thiserror::Error;

const SEPARATORS: [char; 2] = ['/', '.'];

/// Route-table invariant violations, detected at startup.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("route {route}: placeholder {name} appears twice")]
    DuplicatePlaceholder { route: String, name: String },

    #[error("route {route}: placeholder {{{name}}} is never closed")]
    UnclosedPlaceholder { route: String, name: String },

    #[error("route {route}: {name} has a default or requirement but no placeholder")]
    UnknownPlaceholder { route: String, name: String },

    #[error("route {route}: pattern must end in a constrained {{format}} placeholder")]
    MissingFormat { route: String },

    #[error("route {route}: invalid pattern: {source}")]
    Regex {
        route: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Text(String),
    Variable { separator: Option<char>, name: String },
}

/// A compiled URL pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    regex: Regex,
    variables: Vec<String>,
}

impl PathPattern {
    /// Compile `pattern`.
    ///
    /// `optional` names the placeholders that have defaults; `requirements`
    /// overrides the regex of individual placeholders.
    pub fn compile(
        route: &str,
        pattern: &str,
        optional: &[&str],
        requirements: &HashMap<String, String>,
    ) -> Result<Self, RouteError> {
        let tokens = tokenize(route, pattern)?;

        let mut variables: Vec<String> = Vec::new();
        for token in &tokens {
            if let Token::Variable { name, .. } = token {
                if variables.contains(name) {
                    return Err(RouteError::DuplicatePlaceholder {
                        route: route.to_string(),
                        name: name.clone(),
                    });
                }
                variables.push(name.clone());
            }
        }
        for name in requirements.keys() {
            if !variables.contains(name) {
                return Err(RouteError::UnknownPlaceholder {
                    route: route.to_string(),
                    name: name.clone(),
                });
            }
        }

        // Index of the first token of the optional tail, if any.
        let mut first_optional = tokens.len();
        for (i, token) in tokens.iter().enumerate().rev() {
            match token {
                Token::Variable { name, .. } if optional.contains(&name.as_str()) => {
                    first_optional = i;
                }
                _ => break,
            }
        }

        let mut regex = String::from("^");
        let mut open_groups = 0;
        for (i, token) in tokens.iter().enumerate() {
            match token {
                Token::Text(text) => regex.push_str(&regex::escape(text)),
                Token::Variable { separator, name } => {
                    let requirement = requirements
                        .get(name)
                        .cloned()
                        .unwrap_or_else(|| default_requirement(pattern, name));
                    if i >= first_optional {
                        regex.push_str("(?:");
                        open_groups += 1;
                    }
                    if let Some(sep) = separator {
                        regex.push_str(&regex::escape(&sep.to_string()));
                    }
                    regex.push_str(&format!("(?P<{name}>{requirement})"));
                }
            }
        }
        for _ in 0..open_groups {
            regex.push_str(")?");
        }
        regex.push('$');

        let regex = Regex::new(&regex).map_err(|source| RouteError::Regex {
            route: route.to_string(),
            source,
        })?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
            variables,
        })
    }

    /// The pattern this was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Placeholder names in pattern order.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.iter().any(|v| v == name)
    }

    /// Match `path` and return each placeholder with its captured text.
    /// Optional placeholders missing from the path map to `None`.
    pub fn captures<'p>(&self, path: &'p str) -> Option<Vec<(&str, Option<&'p str>)>> {
        let caps = self.regex.captures(path)?;
        Some(
            self.variables
                .iter()
                .map(|name| (name.as_str(), caps.name(name).map(|m| m.as_str())))
                .collect(),
        )
    }
}

fn tokenize(route: &str, pattern: &str) -> Result<Vec<Token>, RouteError> {
    let mut tokens = Vec::new();
    let mut rest = pattern;

    while let Some(open) = rest.find('{') {
        let mut text = &rest[..open];
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            return Err(RouteError::UnclosedPlaceholder {
                route: route.to_string(),
                name: after.to_string(),
            });
        };
        let name = &after[..close];

        let separator = text.chars().last().filter(|c| SEPARATORS.contains(c));
        if let Some(sep) = separator {
            text = &text[..text.len() - sep.len_utf8()];
        }
        if !text.is_empty() {
            tokens.push(Token::Text(text.to_string()));
        }
        tokens.push(Token::Variable {
            separator,
            name: name.to_string(),
        });
        rest = &after[close + 1..];
    }
    if !rest.is_empty() {
        tokens.push(Token::Text(rest.to_string()));
    }
    Ok(tokens)
}

/// `[^/]+`, also excluding the separator right after the placeholder.
fn default_requirement(pattern: &str, name: &str) -> String {
    let placeholder = format!("{{{name}}}");
    let next = pattern
        .find(&placeholder)
        .and_then(|at| pattern[at + placeholder.len()..].chars().next())
        .filter(|c| SEPARATORS.contains(c) && *c != '/');

    match next {
        Some(sep) => format!("[^/{}]+", regex::escape(&sep.to_string())),
        None => "[^/]+".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format_only() -> HashMap<String, String> {
        HashMap::from([("format".to_string(), "xml|json".to_string())])
    }

    fn compile(pattern: &str, optional: &[&str]) -> PathPattern {
        PathPattern::compile("test", pattern, optional, &format_only()).unwrap()
    }

    #[test]
    fn test_literal_with_format() {
        let p = compile("/config.{format}", &["format"]);
        assert_eq!(p.captures("/config.xml").unwrap(), vec![("format", Some("xml"))]);
        assert_eq!(p.captures("/config").unwrap(), vec![("format", None)]);
        assert!(p.captures("/config.yaml").is_none());
        assert!(p.captures("/config.xml/extra").is_none());
        assert!(p.captures("/configs.xml").is_none());
    }

    #[test]
    fn test_required_placeholders() {
        let p = compile("/cloud/user/{user}.{format}", &["format"]);
        assert_eq!(
            p.captures("/cloud/user/alice.json").unwrap(),
            vec![("user", Some("alice")), ("format", Some("json"))]
        );
        assert_eq!(
            p.captures("/cloud/user/alice").unwrap(),
            vec![("user", Some("alice")), ("format", None)]
        );
        assert!(p.captures("/cloud/user/").is_none());
        assert!(p.captures("/cloud/user/a/b.xml").is_none());
    }

    #[test]
    fn test_dot_is_excluded_before_format() {
        let p = compile("/cloud/user/{user}.{format}", &["format"]);
        assert!(p.captures("/cloud/user/first.last.xml").is_none());
    }

    #[test]
    fn test_nested_optional_tail() {
        let p = compile(
            "/privatedata/getattribute/{app}/{key}.{format}",
            &["app", "key", "format"],
        );
        assert_eq!(
            p.captures("/privatedata/getattribute").unwrap(),
            vec![("app", None), ("key", None), ("format", None)]
        );
        assert_eq!(
            p.captures("/privatedata/getattribute/notes").unwrap(),
            vec![("app", Some("notes")), ("key", None), ("format", None)]
        );
        assert_eq!(
            p.captures("/privatedata/getattribute/notes/color.json").unwrap(),
            vec![("app", Some("notes")), ("key", Some("color")), ("format", Some("json"))]
        );
    }

    #[test]
    fn test_required_stops_optional_tail() {
        let p = compile("/privatedata/setattribute/{app}/{key}.{format}", &["format"]);
        assert!(p.captures("/privatedata/setattribute/notes").is_none());
        assert!(p.captures("/privatedata/setattribute/notes/color").is_some());
    }

    #[test]
    fn test_invalid_patterns() {
        let dup = PathPattern::compile("dup", "/{a}/{a}", &[], &HashMap::new());
        assert!(matches!(dup, Err(RouteError::DuplicatePlaceholder { .. })));

        let open = PathPattern::compile("open", "/{a", &[], &HashMap::new());
        assert!(matches!(open, Err(RouteError::UnclosedPlaceholder { .. })));

        let unknown = PathPattern::compile("unknown", "/config", &[], &format_only());
        assert!(matches!(unknown, Err(RouteError::UnknownPlaceholder { .. })));
    }
}
