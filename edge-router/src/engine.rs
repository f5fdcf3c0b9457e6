use std::{collections::HashMap, sync::Arc};

use anyhow::{Result, anyhow};
use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header::HOST, request::Parts},
    response::{IntoResponse, Response},
};
use edge_macro::{FromJs, IntoJs};
use futures::FutureExt;
use rquickjs::{CatchResultExt, Context, Function, Object, Promise, Runtime};
use serde::Serialize;
use tokio::runtime::Handle;
use tracing::{debug, info};
use typed_builder::TypedBuilder;

use crate::dispatch::{Handler, HandlerContext, Pending, Source};

/// A QuickJS runtime holding one evaluated worker module.
///
/// The module must evaluate to an object whose properties are the async
/// handler functions, e.g.
/// `(function(){async function hello(req){...}return{hello:hello};})();`
#[allow(unused)]
pub struct JsWorker {
    rt: Runtime,
    ctx: Context,
}

#[derive(Debug, Clone, TypedBuilder, IntoJs)]
pub struct Req {
    #[builder(setter(into))]
    pub method: String,
    #[builder(setter(into))]
    pub url: String,
    #[builder(default)]
    pub query: HashMap<String, String>,
    #[builder(default)]
    pub params: HashMap<String, String>,
    #[builder(default)]
    pub headers: HashMap<String, String>,
    #[builder(default, setter(strip_option, into))]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, FromJs)]
pub struct Res {
    #[js(default)]
    pub body: Option<String>,
    #[js(default)]
    pub headers: HashMap<String, String>,
    #[js(default = "default_status")]
    pub status: u16,
}

fn default_status() -> u16 {
    200
}

/// Route handler calling the function `name` of a worker module.
///
/// Each call runs in a fresh [`JsWorker`] on tokio's blocking pool when a
/// runtime is available, otherwise when the pending result is first polled.
#[derive(Debug, Clone)]
pub struct JsHandler {
    code: Arc<str>,
    name: String,
}

const CONSOLE: &str = r#"
globalThis.console = {
  log(...v) {
    globalThis.print(v.join(" "));
  },
};
"#;

fn print(msg: String) {
    info!(target: "edge_router::js", "{}", msg);
}

impl JsWorker {
    pub fn try_new(module: &str) -> Result<Self> {
        let rt = Runtime::new()?;
        let ctx = Context::full(&rt)?;

        ctx.with(|ctx| {
            let global = ctx.globals();

            let ret: Object = ctx
                .eval(module)
                .catch(&ctx)
                .map_err(|e| anyhow!("failed to load worker module: {e}"))?;
            global.set("handlers", ret)?;
            global.set(
                "print",
                Function::new(ctx.clone(), print)?.with_name("print")?,
            )?;
            ctx.eval::<(), _>(CONSOLE)?;

            Ok::<_, anyhow::Error>(())
        })?;

        Ok(Self { rt, ctx })
    }

    /// Calls handler `name` with `req` and waits for its promise.
    ///
    /// A thrown error or a rejected promise is returned as `Err`.
    pub fn run(&self, name: &str, req: Req) -> Result<Res> {
        self.ctx.with(|ctx| {
            let global = ctx.globals();
            let handlers: Object = global.get("handlers")?;
            let fun: Function = handlers
                .get(name)
                .map_err(|_| anyhow!("worker has no handler `{name}`"))?;
            let v: Promise = fun
                .call((req,))
                .catch(&ctx)
                .map_err(|e| anyhow!("handler `{name}` failed: {e}"))?;
            let res: Res = v
                .finish()
                .catch(&ctx)
                .map_err(|e| anyhow!("handler `{name}` failed: {e}"))?;

            Ok::<_, anyhow::Error>(res)
        })
    }
}

impl JsHandler {
    pub fn new(code: impl Into<Arc<str>>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<S: Send + Sync + 'static> Handler<Res, S> for JsHandler {
    fn call(&self, cx: HandlerContext<S>) -> Pending<Res> {
        let req = Req::from(cx);
        debug!("run js handler {} for {} {}", self.name, req.method, req.url);
        let (code, name) = (self.code.clone(), self.name.clone());
        let run = move || JsWorker::try_new(&code)?.run(&name, req);
        match Handle::try_current() {
            Ok(rt) => {
                let task = rt.spawn_blocking(run);
                async move { task.await? }.boxed()
            }
            Err(_) => async move { run() }.boxed(),
        }
    }
}

impl<S> From<HandlerContext<S>> for Req {
    /// The originating request with its params filled in, or a request
    /// synthesized from the matched url and method.
    fn from(cx: HandlerContext<S>) -> Self {
        let params = cx.params.to_map();
        match cx.source {
            Source::Request(req) | Source::Event(req) => Req { params, ..req },
            Source::Direct => Req::builder()
                .method(cx.method)
                .url(cx.url.to_string())
                .query(cx.url.query_pairs().into_owned().collect())
                .params(params)
                .build(),
        }
    }
}

impl Req {
    /// Reads an axum request, body included.
    ///
    /// The url is made absolute from the `Host` header when the request
    /// target is a bare path.
    pub async fn from_request(request: Request) -> Result<Self> {
        let (parts, body) = request.into_parts();
        let body = axum::body::to_bytes(body, usize::MAX).await?;
        let body = (!body.is_empty()).then(|| String::from_utf8_lossy(&body).into_owned());

        let headers: HashMap<String, String> = parts
            .headers
            .iter()
            .filter_map(|(k, v)| Some((k.to_string(), v.to_str().ok()?.to_string())))
            .collect();
        let query: HashMap<String, String> = parts
            .uri
            .query()
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        Ok(Self {
            method: parts.method.to_string(),
            url: request_url(&parts),
            query,
            params: HashMap::new(),
            headers,
            body,
        })
    }
}

fn request_url(parts: &Parts) -> String {
    let uri = &parts.uri;
    if uri.scheme().is_some() {
        return uri.to_string();
    }
    let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
    match parts.headers.get(HOST).and_then(|h| h.to_str().ok()) {
        Some(host) => format!("http://{host}{path}"),
        None => path.to_string(),
    }
}

impl IntoResponse for Res {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut headers = HeaderMap::new();
        for (k, v) in self.headers {
            match (HeaderName::try_from(k), HeaderValue::try_from(v)) {
                (Ok(k), Ok(v)) => {
                    headers.insert(k, v);
                }
                _ => debug!("skip invalid response header"),
            }
        }
        let body = self.body.map(Body::from).unwrap_or_else(Body::empty);
        (status, headers, body).into_response()
    }
}

impl From<Res> for Response {
    fn from(res: Res) -> Self {
        res.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    use crate::Router;
    use axum::body::to_bytes;

    const WORKER: &str = include_str!("../fixtures/worker.js");

    #[test]
    fn js_worker_should_run() -> Result<()> {
        let code = r#"
           (function(){async function hello(req){print(`request: ${req.method} ${req.url}`);return{headers:{"content-type":"text/plain"},status:200,body:"hello world"};}return{hello:hello};})();
        "#;
        let worker = JsWorker::try_new(code)?;
        let req = Req::builder()
            .method("GET")
            .url("https://www.example.com")
            .headers(HashMap::from([(
                "content-type".to_string(),
                "text/plain".to_string(),
            )]))
            .build();
        let res = worker.run("hello", req)?;
        assert_eq!(res.status, 200);
        assert_eq!(res.body.as_deref(), Some("hello world"));
        assert_eq!(res.headers.get("content-type").map(String::as_str), Some("text/plain"));
        Ok(())
    }

    #[test]
    fn js_worker_should_report_thrown_error() -> Result<()> {
        let worker = JsWorker::try_new(WORKER)?;
        let req = Req::builder().method("GET").url("/throw").build();
        let err = worker.run("fail", req).unwrap_err();
        assert!(err.to_string().contains("Nope!"), "{err}");

        let req = Req::builder().method("GET").url("/").build();
        let err = worker.run("missing", req).unwrap_err();
        assert!(err.to_string().contains("missing"), "{err}");
        Ok(())
    }

    #[test]
    fn res_status_should_default_to_ok() -> Result<()> {
        let code = r#"
           (function(){async function bare(req){return{body:"bare"};}return{bare:bare};})();
        "#;
        let worker = JsWorker::try_new(code)?;
        let res = worker.run("bare", Req::builder().method("GET").url("/").build())?;
        assert_eq!(res.status, 200);
        assert_eq!(res.body.as_deref(), Some("bare"));
        assert!(res.headers.is_empty());
        Ok(())
    }

    #[test]
    fn bad_module_should_fail_to_load() {
        assert!(JsWorker::try_new("(function(){ return {").is_err());
    }

    #[tokio::test]
    async fn js_handler_should_receive_params() -> Result<()> {
        let mut router = Router::new();
        router
            .get("/user/:id", JsHandler::new(WORKER, "user"))?
            .all("/throw", JsHandler::new(WORKER, "fail"))?;

        let req = Req::builder().method("GET").url("/user/bob").build();
        let res = router.dispatch_request(req)?.unwrap().response.await?;
        assert_eq!(res.status, 200);
        assert_eq!(res.body.as_deref(), Some("Hello user with id bob."));
        assert_eq!(res.headers.get("x-user-id").map(String::as_str), Some("bob"));

        let err = router
            .dispatch("http://example.com/throw", "DELETE")?
            .unwrap()
            .response
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Nope!"), "{err}");
        Ok(())
    }

    #[tokio::test]
    async fn js_handler_should_not_block_dispatch() -> Result<()> {
        let code = r#"
           (function(){async function slow(req){const end=Date.now()+500;while(Date.now()<end){}return{status:200,body:"done"};}return{slow:slow};})();
        "#;
        let mut router = Router::new();
        router.get("/slow", JsHandler::new(code, "slow"))?;

        let start = Instant::now();
        let dispatched = router.dispatch("/slow", "GET")?.unwrap();
        assert!(start.elapsed() < Duration::from_millis(200), "{:?}", start.elapsed());

        let res = dispatched.response.await?;
        assert!(start.elapsed() >= Duration::from_millis(500));
        assert_eq!(res.body.as_deref(), Some("done"));
        Ok(())
    }

    #[test]
    fn js_handler_should_run_without_runtime() -> Result<()> {
        let mut router = Router::new();
        router.get("/user/:id", JsHandler::new(WORKER, "user"))?;
        let dispatched = router.dispatch("/user/ann", "GET")?.unwrap();
        let res = futures::executor::block_on(dispatched.response)?;
        assert_eq!(res.body.as_deref(), Some("Hello user with id ann."));
        Ok(())
    }

    #[test]
    fn direct_context_should_become_request() -> Result<()> {
        let mut router: Router<Res> = Router::new();
        router.get("/search/:term", JsHandler::new(WORKER, "user"))?;
        let matched = router.match_route("https://example.com/search/rust?page=2", "GET")?.unwrap();
        let cx = HandlerContext {
            params: matched.params,
            url: matched.url,
            method: matched.method,
            pattern: "/search/:term".to_string(),
            source: Source::Direct,
            state: (),
        };

        let req = Req::from(cx);
        assert_eq!(req.method, "GET");
        assert_eq!(req.url, "https://example.com/search/rust?page=2");
        assert_eq!(req.query.get("page").map(String::as_str), Some("2"));
        assert_eq!(req.params.get("term").map(String::as_str), Some("rust"));
        assert_eq!(req.body, None);
        Ok(())
    }

    #[tokio::test]
    async fn req_should_read_axum_request() -> Result<()> {
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/user/bob?lang=en")
            .header(HOST, "api.example.com")
            .header("x-token", "t1")
            .body(Body::from("hi"))?;

        let req = Req::from_request(request).await?;
        assert_eq!(req.method, "POST");
        assert_eq!(req.url, "http://api.example.com/user/bob?lang=en");
        assert_eq!(req.query.get("lang").map(String::as_str), Some("en"));
        assert_eq!(req.headers.get("x-token").map(String::as_str), Some("t1"));
        assert_eq!(req.body.as_deref(), Some("hi"));
        Ok(())
    }

    #[tokio::test]
    async fn res_should_convert_to_response() -> Result<()> {
        let res = Res {
            body: Some("foobar".to_string()),
            headers: HashMap::from([("content-type".to_string(), "text/plain".to_string())]),
            status: 201,
        };
        let resp: Response = res.into();
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(resp.headers().get("content-type").unwrap(), "text/plain");

        let (_parts, body) = resp.into_parts();
        let body_bytes = to_bytes(body, usize::MAX).await?;
        assert_eq!(String::from_utf8(body_bytes.to_vec())?, "foobar");
        Ok(())
    }
}
