//! # Hermes Router
//!
//! Route paths and route matching for Hermes drivers.
//!
//! Routes come in two flavours:
//!
//! - **Literal** express-style paths: `/questions/:id`, `/files/*path`
//! - **Pattern** routes compiled from a regex source plus flags
//!
//! [`RoutePath::join`] builds the full route of an action from its
//! controller's route and its own route, splicing literals into patterns
//! without losing the pattern flags. [`Router`] matches request paths
//! against registered routes: literal routes through a radix tree, pattern
//! routes in registration order.
//!
//! # Example
//!
//! ```rust
//! use hermes_router::{RouteId, RoutePath, Router};
//! use http::Method;
//!
//! let controller = RoutePath::literal("/questions");
//! let action = RoutePath::literal("/:id");
//! let full = RoutePath::join(Some(&controller), Some(&action)).unwrap();
//! assert_eq!(full.to_string(), "/questions/:id");
//!
//! let mut router = Router::new();
//! router.insert(&full, Some(&Method::GET), RouteId(0)).unwrap();
//!
//! let found = router.match_route(&Method::GET, "/questions/1").unwrap();
//! assert_eq!(found.params.get("id"), Some("1"));
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod method_router;
mod node;
mod params;
mod route;
mod router;

pub use method_router::MethodRouter;
pub use node::{Node, SegmentKind};
pub use params::Params;
pub use route::{RouteError, RoutePath, RoutePattern};
pub use router::Router;

/// Identifier of a registered route, assigned in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RouteId(pub usize);

/// A matched route with its captured params.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// The route that answered.
    pub route: RouteId,
    /// Captured path params.
    pub params: Params,
}

impl RouteMatch {
    /// Creates a route match.
    #[must_use]
    pub fn new(route: RouteId, params: Params) -> Self {
        Self { route, params }
    }
}
