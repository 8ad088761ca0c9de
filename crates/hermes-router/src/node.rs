//! Radix tree for literal routes.

use http::Method;

use crate::method_router::MethodRouter;
use crate::params::Params;
use crate::route::RouteError;
use crate::RouteId;

/// Kind of path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Static segment (`questions`).
    Static,
    /// Named parameter (`:id` or `{id}`).
    Param(String),
    /// Catch-all (`*path` or bare `*`).
    Wildcard(String),
}

/// A node in the literal-route tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// Segment text as written in the route.
    pub segment: String,
    /// Segment kind.
    pub kind: SegmentKind,
    /// Routes ending at this node.
    pub methods: Option<MethodRouter>,
    /// Static children sorted by segment.
    pub static_children: Vec<Node>,
    /// Param children in insertion order.
    pub param_children: Vec<Node>,
    /// Catch-all child.
    pub wildcard_child: Option<Box<Node>>,
}

impl Node {
    fn new(segment: &str, kind: SegmentKind) -> Self {
        Self {
            segment: segment.to_string(),
            kind,
            methods: None,
            static_children: Vec::new(),
            param_children: Vec::new(),
            wildcard_child: None,
        }
    }

    /// Creates the root node.
    #[must_use]
    pub fn root() -> Self {
        Self::new("", SegmentKind::Static)
    }

    /// Inserts a literal path.
    pub fn insert(&mut self, path: &str, methods: MethodRouter) -> Result<(), RouteError> {
        let segments = Self::parse_path(path);
        if let Some(pos) = segments
            .iter()
            .position(|(_, kind)| matches!(kind, SegmentKind::Wildcard(_)))
        {
            if pos + 1 != segments.len() {
                return Err(RouteError::WildcardNotLast(path.to_string()));
            }
        }
        self.insert_segments(&segments, methods);
        Ok(())
    }

    fn parse_path(path: &str) -> Vec<(String, SegmentKind)> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                let kind = if let Some(name) = s.strip_prefix(':') {
                    SegmentKind::Param(name.to_string())
                } else if let Some(name) = s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                    SegmentKind::Param(name.to_string())
                } else if let Some(name) = s.strip_prefix('*') {
                    SegmentKind::Wildcard(name.to_string())
                } else {
                    SegmentKind::Static
                };
                (s.to_string(), kind)
            })
            .collect()
    }

    fn insert_segments(&mut self, segments: &[(String, SegmentKind)], methods: MethodRouter) {
        let Some(((segment, kind), remaining)) = segments.split_first() else {
            match &mut self.methods {
                Some(existing) => existing.merge(methods),
                None => self.methods = Some(methods),
            }
            return;
        };

        match kind {
            SegmentKind::Static => {
                match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(segment))
                {
                    Ok(i) => self.static_children[i].insert_segments(remaining, methods),
                    Err(i) => {
                        let mut child = Node::new(segment, SegmentKind::Static);
                        child.insert_segments(remaining, methods);
                        self.static_children.insert(i, child);
                    }
                }
            }
            SegmentKind::Param(name) => {
                let existing = self
                    .param_children
                    .iter_mut()
                    .find(|c| matches!(&c.kind, SegmentKind::Param(n) if n == name));
                match existing {
                    Some(child) => child.insert_segments(remaining, methods),
                    None => {
                        let mut child = Node::new(segment, kind.clone());
                        child.insert_segments(remaining, methods);
                        self.param_children.push(child);
                    }
                }
            }
            SegmentKind::Wildcard(_) => {
                let child = self
                    .wildcard_child
                    .get_or_insert_with(|| Box::new(Node::new(segment, kind.clone())));
                child.insert_segments(&[], methods);
            }
        }
    }

    /// Finds the route answering `method` on `path`.
    ///
    /// Static segments are tried before params, params before the catch-all.
    /// A branch whose leaf has no route for the method is abandoned and the
    /// next candidate is tried.
    #[must_use]
    pub fn match_path(&self, method: &Method, path: &str) -> Option<(RouteId, Params)> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::new();
        let route = self.match_segments(&segments, &mut |m| m.route_for(method), &mut params)?;
        Some((route, params))
    }

    /// Returns the method table for `path`, ignoring the request method.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<&MethodRouter> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        self.find_methods(&segments)
    }

    fn find_methods(&self, segments: &[&str]) -> Option<&MethodRouter> {
        let Some((segment, remaining)) = segments.split_first() else {
            return self.methods.as_ref();
        };
        if let Some(found) = self
            .find_static_child(segment)
            .and_then(|child| child.find_methods(remaining))
        {
            return Some(found);
        }
        if let Some(found) = self
            .param_children
            .iter()
            .find_map(|child| child.find_methods(remaining))
        {
            return Some(found);
        }
        self.wildcard_child.as_ref().and_then(|c| c.methods.as_ref())
    }

    fn match_segments(
        &self,
        segments: &[&str],
        accept: &mut dyn FnMut(&MethodRouter) -> Option<RouteId>,
        params: &mut Params,
    ) -> Option<RouteId> {
        let Some((segment, remaining)) = segments.split_first() else {
            return self.methods.as_ref().and_then(|m| accept(m));
        };

        if let Some(child) = self.find_static_child(segment) {
            if let Some(route) = child.match_segments(remaining, accept, params) {
                return Some(route);
            }
        }

        for child in &self.param_children {
            if let SegmentKind::Param(name) = &child.kind {
                let mark = params.len();
                params.push(name.clone(), *segment);
                if let Some(route) = child.match_segments(remaining, accept, params) {
                    return Some(route);
                }
                params.truncate(mark);
            }
        }

        if let Some(child) = &self.wildcard_child {
            if let SegmentKind::Wildcard(name) = &child.kind {
                let route = child.methods.as_ref().and_then(|m| accept(m))?;
                let name = if name.is_empty() { "0" } else { name.as_str() };
                params.push(name, segments.join("/"));
                return Some(route);
            }
        }

        None
    }

    fn find_static_child(&self, segment: &str) -> Option<&Node> {
        self.static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
            .ok()
            .map(|i| &self.static_children[i])
    }
}
