//! HTTP route table and path templates
//!
//! The routes served by the API surface are a static table. Each entry is
//! turned into exactly one endpoint binding backed by its own compute unit.

use crate::error::{Result, TopologyError};
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One `/`-separated piece of a path template
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathSegment {
    Literal(String),
    Param(String),
}

impl PathSegment {
    pub fn is_param(&self) -> bool {
        matches!(self, PathSegment::Param(_))
    }

    pub fn name(&self) -> &str {
        match self {
            PathSegment::Literal(name) | PathSegment::Param(name) => name,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Literal(name) => f.write_str(name),
            PathSegment::Param(name) => write!(f, "{{{}}}", name),
        }
    }
}

/// A parsed path such as `/v1/users/{user_id}`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathTemplate {
    segments: Vec<PathSegment>,
}

impl PathTemplate {
    pub fn parse(path: &str) -> Result<Self> {
        let rest = path
            .strip_prefix('/')
            .ok_or_else(|| TopologyError::path(path, "must start with '/'"))?;

        if rest.is_empty() {
            return Ok(Self { segments: vec![] });
        }

        let mut segments = Vec::new();
        for raw in rest.split('/') {
            let segment = parse_segment(path, raw)?;
            if let PathSegment::Param(name) = &segment {
                if segments
                    .iter()
                    .any(|s: &PathSegment| s.is_param() && s.name() == name)
                {
                    return Err(TopologyError::path(
                        path,
                        format!("parameter '{}' appears more than once", name),
                    ));
                }
            }
            segments.push(segment);
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Names of the placeholders, in path order
    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.segments
            .iter()
            .filter(|s| s.is_param())
            .map(PathSegment::name)
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Every proper and improper prefix, shortest first, excluding the root.
    ///
    /// `/v1/users/{user_id}` yields `/v1`, `/v1/users`, `/v1/users/{user_id}`.
    pub fn prefixes(&self) -> Vec<PathTemplate> {
        (1..=self.segments.len())
            .map(|len| PathTemplate {
                segments: self.segments[..len].to_vec(),
            })
            .collect()
    }

    /// The enclosing path, `None` for the root
    pub fn parent(&self) -> Option<PathTemplate> {
        let (_, parent) = self.segments.split_last()?;
        Some(PathTemplate {
            segments: parent.to_vec(),
        })
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Path with every placeholder replaced by `*`, as used in invoke ARNs
    pub fn wildcard(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            out.push('/');
            match segment {
                PathSegment::Literal(name) => out.push_str(name),
                PathSegment::Param(_) => out.push('*'),
            }
        }
        if out.is_empty() {
            out.push('/');
        }
        out
    }
}

fn parse_segment(path: &str, raw: &str) -> Result<PathSegment> {
    if raw.is_empty() {
        return Err(TopologyError::path(path, "empty path segment"));
    }

    if let Some(inner) = raw.strip_prefix('{') {
        let name = inner
            .strip_suffix('}')
            .ok_or_else(|| TopologyError::path(path, format!("unclosed parameter '{}'", raw)))?;
        if name.is_empty() {
            return Err(TopologyError::path(path, "empty parameter name"));
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(TopologyError::path(
                path,
                format!("parameter name '{}' must be alphanumeric or '_'", name),
            ));
        }
        return Ok(PathSegment::Param(name.to_string()));
    }

    if raw.contains(['{', '}']) {
        return Err(TopologyError::path(
            path,
            format!("braces must enclose a whole segment, found '{}'", raw),
        ));
    }

    if !raw
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "-_.".contains(c))
    {
        return Err(TopologyError::path(
            path,
            format!("segment '{}' contains unsupported characters", raw),
        ));
    }

    Ok(PathSegment::Literal(raw.to_string()))
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

impl Serialize for PathTemplate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A `(logicalName, httpMethod, pathTemplate)` row of the route table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteDescriptor {
    pub name: &'static str,
    pub method: HttpMethod,
    pub path: &'static str,
}

const fn route(name: &'static str, method: HttpMethod, path: &'static str) -> RouteDescriptor {
    RouteDescriptor { name, method, path }
}

pub const ROUTES: [RouteDescriptor; 11] = [
    route(
        "deleteMicropost",
        HttpMethod::Delete,
        "/v1/users/{user_id}/microposts/{micropost_id}",
    ),
    route("deleteUser", HttpMethod::Delete, "/v1/users/{user_id}"),
    route(
        "getMicropost",
        HttpMethod::Get,
        "/v1/users/{user_id}/microposts/{micropost_id}",
    ),
    route(
        "getMicroposts",
        HttpMethod::Get,
        "/v1/users/{user_id}/microposts",
    ),
    route("getUser", HttpMethod::Get, "/v1/users/{user_id}"),
    route("getUsers", HttpMethod::Get, "/v1/users"),
    route(
        "postMicroposts",
        HttpMethod::Post,
        "/v1/users/{user_id}/microposts",
    ),
    route("postUsers", HttpMethod::Post, "/v1/users"),
    route(
        "putMicropost",
        HttpMethod::Put,
        "/v1/users/{user_id}/microposts/{micropost_id}",
    ),
    route("putUser", HttpMethod::Put, "/v1/users/{user_id}"),
    route("hello", HttpMethod::Post, "/v1/hello"),
];
