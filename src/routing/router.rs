//! Route table and lookup.
//!
//! # Responsibilities
//! - Hold the ordered OCS route table
//! - Match a method and path against it, first match wins
//! - Resolve placeholder values, falling back to route defaults
//!
//! # Design Decisions
//! - Immutable after construction (shared without locks)
//! - A method mismatch is not an error: matching moves on to the next route
//! - Every route defaults `format` to the request's `format` parameter
//! - Explicit `None` on no match; the dispatcher owns the fallback

use std::collections::HashMap;

use crate::ocs::handlers::Operation;
use crate::routing::matcher::{PathPattern, RouteError};

/// Requirement applied to every `format` placeholder.
pub const FORMAT_REQUIREMENT: &str = "xml|json";

/// HTTP method a route answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteMethod {
    /// GET, and HEAD.
    Get,
    Post,
}

impl RouteMethod {
    pub fn accepts(self, method: &str) -> bool {
        match self {
            RouteMethod::Get => method == "GET" || method == "HEAD",
            RouteMethod::Post => method == "POST",
        }
    }
}

/// Declaration of one route, compiled by [`Router::new`].
#[derive(Debug, Clone)]
pub struct RouteSpec {
    operation: Operation,
    method: RouteMethod,
    pattern: &'static str,
    defaults: Vec<(&'static str, &'static str)>,
}

impl RouteSpec {
    pub fn get(operation: Operation, pattern: &'static str) -> Self {
        Self {
            operation,
            method: RouteMethod::Get,
            pattern,
            defaults: Vec::new(),
        }
    }

    pub fn post(operation: Operation, pattern: &'static str) -> Self {
        Self {
            method: RouteMethod::Post,
            ..Self::get(operation, pattern)
        }
    }

    /// Default for a placeholder, which also makes it optional when it
    /// sits in the pattern's tail.
    pub fn with_default(mut self, name: &'static str, value: &'static str) -> Self {
        self.defaults.push((name, value));
        self
    }
}

#[derive(Debug, Clone)]
struct Route {
    operation: Operation,
    method: RouteMethod,
    pattern: PathPattern,
    defaults: HashMap<&'static str, &'static str>,
}

/// A resolved route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub operation: Operation,
    /// Placeholder values, percent-decoded, in pattern order.
    pub params: Vec<(String, String)>,
}

impl RouteMatch {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// The resolved `format` value, empty when absent.
    pub fn format(&self) -> &str {
        self.param("format").unwrap_or_default()
    }
}

/// The ordered route table.
#[derive(Debug, Clone)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Compile `specs`, keeping their order.
    pub fn new(specs: Vec<RouteSpec>) -> Result<Self, RouteError> {
        let requirements =
            HashMap::from([("format".to_string(), FORMAT_REQUIREMENT.to_string())]);

        let mut routes = Vec::with_capacity(specs.len());
        for spec in specs {
            let name = spec.operation.name();
            if !spec.pattern.contains("{format}") {
                return Err(RouteError::MissingFormat {
                    route: name.to_string(),
                });
            }
            let mut optional: Vec<&str> = spec.defaults.iter().map(|(k, _)| *k).collect();
            optional.push("format");

            let pattern = PathPattern::compile(name, spec.pattern, &optional, &requirements)?;
            if pattern.variables().last().map(String::as_str) != Some("format") {
                return Err(RouteError::MissingFormat {
                    route: name.to_string(),
                });
            }
            for (default, _) in &spec.defaults {
                if !pattern.has_variable(default) {
                    return Err(RouteError::UnknownPlaceholder {
                        route: name.to_string(),
                        name: default.to_string(),
                    });
                }
            }

            routes.push(Route {
                operation: spec.operation,
                method: spec.method,
                pattern,
                defaults: spec.defaults.into_iter().collect(),
            });
        }
        Ok(Self { routes })
    }

    /// The OCS route table.
    pub fn ocs() -> Result<Self, RouteError> {
        Self::new(vec![
            RouteSpec::get(Operation::Config, "/config.{format}"),
            RouteSpec::post(Operation::PersonCheck, "/person/check.{format}"),
            RouteSpec::get(Operation::ActivityGet, "/activity.{format}"),
            RouteSpec::post(Operation::ActivityPut, "/activity.{format}"),
            RouteSpec::get(
                Operation::PrivateDataGet,
                "/privatedata/getattribute/{app}/{key}.{format}",
            )
            .with_default("app", "")
            .with_default("key", ""),
            RouteSpec::post(
                Operation::PrivateDataSet,
                "/privatedata/setattribute/{app}/{key}.{format}",
            ),
            RouteSpec::post(
                Operation::PrivateDataDelete,
                "/privatedata/deleteattribute/{app}/{key}.{format}",
            ),
            RouteSpec::get(Operation::QuotaGet, "/cloud/user/{user}.{format}"),
            RouteSpec::post(Operation::QuotaSet, "/cloud/user/{user}.{format}"),
        ])
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Find the first route matching `method` and `path`.
    ///
    /// `requested_format` is the request's `format` parameter, used when
    /// the path carries no format suffix.
    pub fn match_request(
        &self,
        method: &str,
        path: &str,
        requested_format: &str,
    ) -> Option<RouteMatch> {
        for route in &self.routes {
            let Some(captures) = route.pattern.captures(path) else {
                continue;
            };
            if !route.method.accepts(method) {
                continue;
            }

            let params = captures
                .into_iter()
                .map(|(name, value)| {
                    let value = match value {
                        Some(raw) => decode(raw),
                        None if name == "format" => requested_format.to_string(),
                        None => route
                            .defaults
                            .get(name)
                            .copied()
                            .unwrap_or_default()
                            .to_string(),
                    };
                    (name.to_string(), value)
                })
                .collect();

            return Some(RouteMatch {
                operation: route.operation,
                params,
            });
        }
        None
    }
}

fn decode(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}
