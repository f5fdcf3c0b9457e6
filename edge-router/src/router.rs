use std::{fmt, sync::Arc};

use axum::http::Method;
use tracing::{debug, trace};
use typed_builder::TypedBuilder;
use url::Url;

use crate::{
    Req,
    dispatch::Handler,
    error::RouterError,
    params::Params,
    pattern::{IntoPattern, Pattern},
};

/// Host used to turn a bare path into an absolute url before parsing.
const PLACEHOLDER_ORIGIN: &str = "http://domain";

#[derive(Debug, Default, Clone, PartialEq, Eq, TypedBuilder)]
pub struct RouteOptions {
    /// `None` matches any method.
    #[builder(default, setter(strip_option))]
    pub method: Option<Method>,
    /// Match the pattern against the whole url instead of the path only.
    #[builder(default)]
    pub match_url: bool,
}

pub struct Route<T, S = ()> {
    pattern: Pattern,
    handler: Arc<dyn Handler<T, S>>,
    options: RouteOptions,
}

/// A successful lookup. Borrows the route it matched.
pub struct RouteMatch<'r, T, S = ()> {
    pub route: &'r Route<T, S>,
    pub params: Params,
    pub url: Url,
    pub method: String,
}

/// Ordered route table. Routes are tried in registration order and the
/// first one whose method filter and pattern both accept the request wins.
///
/// `S` is auxiliary state handed to every handler.
pub struct Router<T, S = ()> {
    routes: Vec<Route<T, S>>,
    state: S,
}

/// Anything the router can resolve to an absolute url.
///
/// Strings starting with `/` are treated as paths on a placeholder host.
pub trait IntoRouteUrl {
    fn into_route_url(self) -> Result<Url, RouterError>;
}

macro_rules! verbs {
    ($($name:ident, $with:ident => $method:expr;)*) => {
        $(
            pub fn $name<P, H>(&mut self, pattern: P, handler: H) -> Result<&mut Self, RouterError>
            where
                P: IntoPattern,
                H: Handler<T, S>,
            {
                self.$with(pattern, handler, RouteOptions::default())
            }

            pub fn $with<P, H>(
                &mut self,
                pattern: P,
                handler: H,
                options: RouteOptions,
            ) -> Result<&mut Self, RouterError>
            where
                P: IntoPattern,
                H: Handler<T, S>,
            {
                self.route(pattern, handler, RouteOptions { method: $method, ..options })
            }
        )*
    };
}

impl<T: 'static> Router<T, ()> {
    pub fn new() -> Self {
        Self::with_state(())
    }
}

impl<T: 'static> Default for Router<T, ()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static, S: 'static> Router<T, S> {
    pub fn with_state(state: S) -> Self {
        Self {
            routes: Vec::new(),
            state,
        }
    }

    verbs! {
        all, all_with => None;
        get, get_with => Some(Method::GET);
        post, post_with => Some(Method::POST);
        put, put_with => Some(Method::PUT);
        patch, patch_with => Some(Method::PATCH);
        delete, delete_with => Some(Method::DELETE);
        head, head_with => Some(Method::HEAD);
        options, options_with => Some(Method::OPTIONS);
    }

    /// Appends a route with `options` taken as given.
    ///
    /// A pattern string is compiled here, so syntax errors surface at
    /// registration rather than on first match.
    pub fn route<P, H>(
        &mut self,
        pattern: P,
        handler: H,
        options: RouteOptions,
    ) -> Result<&mut Self, RouterError>
    where
        P: IntoPattern,
        H: Handler<T, S>,
    {
        let pattern = pattern.into_pattern()?;
        debug!(
            "register route #{}: {} {} (match_url: {})",
            self.routes.len(),
            method_label(options.method.as_ref()),
            pattern,
            options.match_url
        );
        self.routes.push(Route {
            pattern,
            handler: Arc::new(handler),
            options,
        });
        Ok(self)
    }

    /// Finds the first route accepting `method` whose pattern matches `url`.
    ///
    /// `Ok(None)` means no route matched; an error is only returned when
    /// `url` cannot be parsed.
    pub fn match_route<U>(&self, url: U, method: &str) -> Result<Option<RouteMatch<'_, T, S>>, RouterError>
    where
        U: IntoRouteUrl,
    {
        let url = url.into_route_url()?;
        Ok(self.find(url, method))
    }

    pub fn match_request(&self, req: &Req) -> Result<Option<RouteMatch<'_, T, S>>, RouterError> {
        self.match_route(req.url.as_str(), &req.method)
    }

    fn find(&self, url: Url, method: &str) -> Option<RouteMatch<'_, T, S>> {
        for (i, route) in self.routes.iter().enumerate() {
            if !route.accepts(method) {
                continue;
            }
            let subject = if route.options.match_url {
                url.as_str()
            } else {
                url.path()
            };
            if let Some(params) = route.pattern.matches(subject) {
                debug!("{} {} matched route #{}: {}", method, url, i, route.pattern);
                return Some(RouteMatch {
                    route,
                    params,
                    url,
                    method: method.to_string(),
                });
            }
        }
        trace!("{} {} matched none of {} routes", method, url, self.routes.len());
        None
    }

    /// Removes every route.
    pub fn clear(&mut self) {
        debug!("clear {} routes", self.routes.len());
        self.routes.clear();
    }

    pub fn routes(&self) -> &[Route<T, S>] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn state(&self) -> &S {
        &self.state
    }
}

impl<T, S> Route<T, S> {
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn options(&self) -> &RouteOptions {
        &self.options
    }

    pub fn method(&self) -> Option<&Method> {
        self.options.method.as_ref()
    }

    pub fn handler(&self) -> &Arc<dyn Handler<T, S>> {
        &self.handler
    }

    /// Method filter; comparison is exact and case-sensitive.
    fn accepts(&self, method: &str) -> bool {
        match &self.options.method {
            Some(m) => m.as_str() == method,
            None => true,
        }
    }
}

impl<T, S> fmt::Debug for Route<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern.as_str())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<T, S> fmt::Debug for RouteMatch<'_, T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMatch")
            .field("route", self.route)
            .field("params", &self.params)
            .field("url", &self.url.as_str())
            .field("method", &self.method)
            .finish()
    }
}

impl<T, S> fmt::Debug for Router<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.routes).finish()
    }
}

/// Display name of a route's method filter, `ALL` for any method.
pub fn method_label(method: Option<&Method>) -> &str {
    method.map(Method::as_str).unwrap_or("ALL")
}

fn parse_url(s: &str) -> Result<Url, RouterError> {
    let parsed = if s.starts_with('/') {
        Url::parse(&format!("{PLACEHOLDER_ORIGIN}{s}"))
    } else {
        Url::parse(s)
    };
    parsed.map_err(|source| RouterError::InvalidUrl {
        url: s.to_string(),
        source,
    })
}

impl IntoRouteUrl for Url {
    fn into_route_url(self) -> Result<Url, RouterError> {
        Ok(self)
    }
}

impl IntoRouteUrl for &Url {
    fn into_route_url(self) -> Result<Url, RouterError> {
        Ok(self.clone())
    }
}

impl IntoRouteUrl for &str {
    fn into_route_url(self) -> Result<Url, RouterError> {
        parse_url(self)
    }
}

impl IntoRouteUrl for String {
    fn into_route_url(self) -> Result<Url, RouterError> {
        parse_url(&self)
    }
}

impl IntoRouteUrl for &String {
    fn into_route_url(self) -> Result<Url, RouterError> {
        parse_url(self)
    }
}
