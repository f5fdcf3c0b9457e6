use std::{fs, path::Path, sync::Arc};

use axum::http::Method;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use tracing::info;

use crate::{JsHandler, Res, RouteOptions, Router, error::RouterError};

/// pattern -> handlers, in registration order
pub type ProjectRoutes = IndexMap<String, Vec<ProjectRoute>>;

#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    pub routes: ProjectRoutes,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectRoute {
    /// `None` for `ALL`, `*` or a missing field.
    #[serde(default, deserialize_with = "deserialize_method")]
    pub method: Option<Method>,
    /// Name of the function in the worker module.
    pub handler: String,
    #[serde(default)]
    pub match_url: bool,
}

fn deserialize_method<'de, D>(deserializer: D) -> Result<Option<Method>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    match s.to_uppercase().as_str() {
        "ALL" | "*" => Ok(None),
        "GET" => Ok(Some(Method::GET)),
        "POST" => Ok(Some(Method::POST)),
        "PUT" => Ok(Some(Method::PUT)),
        "DELETE" => Ok(Some(Method::DELETE)),
        "PATCH" => Ok(Some(Method::PATCH)),
        "HEAD" => Ok(Some(Method::HEAD)),
        "OPTIONS" => Ok(Some(Method::OPTIONS)),
        "CONNECT" => Ok(Some(Method::CONNECT)),
        "TRACE" => Ok(Some(Method::TRACE)),
        _ => Err(serde::de::Error::custom(format!("invalid method: {s}"))),
    }
}

impl ProjectConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RouterError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config = Self::from_yaml(&content)?;
        info!("loaded project {} from {}", config.name, path.display());
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self, RouterError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Registers one [`JsHandler`] per configured route, running against
    /// the worker module `code`.
    pub fn build_router(&self, code: impl Into<Arc<str>>) -> Result<Router<Res>, RouterError> {
        let code = code.into();
        let mut router = Router::new();
        for (pattern, routes) in &self.routes {
            for route in routes {
                let options = RouteOptions {
                    method: route.method.clone(),
                    match_url: route.match_url,
                };
                router.route(
                    pattern.as_str(),
                    JsHandler::new(code.clone(), &route.handler),
                    options,
                )?;
            }
        }
        Ok(router)
    }
}
