//! In-process request router for edge workers.
//!
//! Routes are tried in registration order; the first one whose method
//! filter and pattern accept the request gets it.
//!
//! ```
//! use edge_router::{HandlerContext, Router};
//!
//! async fn user(cx: HandlerContext) -> anyhow::Result<String> {
//!     Ok(format!("user {}", cx.param("id").unwrap_or_default()))
//! }
//!
//! let mut router = Router::new();
//! router.get("/user/:id", user).unwrap();
//!
//! let matched = router.match_route("/user/bob", "GET").unwrap().unwrap();
//! assert_eq!(matched.params.get("id"), Some("bob"));
//! assert!(router.match_route("/user/bob", "POST").unwrap().is_none());
//! ```

mod config;
mod dispatch;
mod engine;
mod error;
mod params;
mod pattern;
mod router;
mod service;

pub use config::{ProjectConfig, ProjectRoute, ProjectRoutes};
pub use dispatch::{
    ChannelEvent, Dispatched, EventResponse, FetchEvent, Handler, HandlerContext, Pending, Source,
};
pub use engine::{JsHandler, JsWorker, Req, Res};
pub use error::{PatternError, RouterError};
pub use params::{Params, WILDCARD};
pub use pattern::{IntoPattern, Pattern};
pub use router::{IntoRouteUrl, Route, RouteMatch, RouteOptions, Router, method_label};
pub use service::RouterService;

pub use axum::http::Method;
pub use url::Url;
