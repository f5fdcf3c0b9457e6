use std::future::Future;

use futures::future::BoxFuture;
use tokio::sync::oneshot;
use tracing::{debug, warn};
use url::Url;

use crate::{
    Req,
    error::RouterError,
    params::Params,
    router::{IntoRouteUrl, RouteMatch, Router},
};

/// The handler's not yet settled result. Handler errors are carried as is.
pub type Pending<T> = BoxFuture<'static, anyhow::Result<T>>;

/// An asynchronous route handler.
///
/// Implemented for every `Fn(HandlerContext<S>) -> impl Future<Output = anyhow::Result<T>>`.
pub trait Handler<T, S = ()>: Send + Sync + 'static {
    fn call(&self, cx: HandlerContext<S>) -> Pending<T>;
}

impl<F, Fut, T, S> Handler<T, S> for F
where
    F: Fn(HandlerContext<S>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
{
    fn call(&self, cx: HandlerContext<S>) -> Pending<T> {
        Box::pin(self(cx))
    }
}

/// What triggered a dispatch.
#[derive(Debug, Clone)]
pub enum Source {
    /// A bare url and method.
    Direct,
    /// A host request.
    Request(Req),
    /// A fetch event; the pending result went to the event's responder.
    Event(Req),
}

/// Everything a handler gets for one dispatch.
#[derive(Debug, Clone)]
pub struct HandlerContext<S = ()> {
    pub params: Params,
    pub url: Url,
    pub method: String,
    /// Source text of the matched pattern.
    pub pattern: String,
    pub source: Source,
    pub state: S,
}

pub struct Dispatched<'r, T, S = ()> {
    pub matched: RouteMatch<'r, T, S>,
    pub response: Pending<T>,
}

/// A host event carrying a request and a one-shot "respond with" hook.
pub trait FetchEvent<T> {
    fn request(&self) -> &Req;

    fn respond_with(&mut self, response: Pending<T>);
}

/// [`FetchEvent`] whose response is delivered over a oneshot channel.
pub struct ChannelEvent<T> {
    request: Req,
    tx: Option<oneshot::Sender<Pending<T>>>,
}

/// Receiving half of a [`ChannelEvent`].
pub struct EventResponse<T> {
    rx: oneshot::Receiver<Pending<T>>,
}

impl<S> HandlerContext<S> {
    pub fn request(&self) -> Option<&Req> {
        match &self.source {
            Source::Direct => None,
            Source::Request(req) | Source::Event(req) => Some(req),
        }
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }
}

impl<T, S> Router<T, S>
where
    T: 'static,
    S: Clone + 'static,
{
    /// Matches `url` and `method` and, on a match, calls the handler once.
    pub fn dispatch<U>(&self, url: U, method: &str) -> Result<Option<Dispatched<'_, T, S>>, RouterError>
    where
        U: IntoRouteUrl,
    {
        let matched = self.match_route(url, method)?;
        Ok(matched.map(|m| self.invoke(m, Source::Direct)))
    }

    /// Matches the event's request without dispatching it.
    pub fn match_event<E>(&self, event: &E) -> Result<Option<RouteMatch<'_, T, S>>, RouterError>
    where
        E: FetchEvent<T>,
    {
        self.match_request(event.request())
    }

    pub fn dispatch_request(&self, req: Req) -> Result<Option<Dispatched<'_, T, S>>, RouterError> {
        let matched = self.match_request(&req)?;
        Ok(matched.map(|m| self.invoke(m, Source::Request(req))))
    }

    /// Dispatches the event's request and hands the pending result to
    /// [`FetchEvent::respond_with`]. Returns `false`, without touching the
    /// event, when no route matches.
    pub fn handle_event<E>(&self, event: &mut E) -> Result<bool, RouterError>
    where
        E: FetchEvent<T>,
    {
        let req = event.request().clone();
        let Some(matched) = self.match_request(&req)? else {
            return Ok(false);
        };
        let Dispatched { response, .. } = self.invoke(matched, Source::Event(req));
        event.respond_with(response);
        Ok(true)
    }

    fn invoke<'r>(&'r self, matched: RouteMatch<'r, T, S>, source: Source) -> Dispatched<'r, T, S> {
        let cx = HandlerContext {
            params: matched.params.clone(),
            url: matched.url.clone(),
            method: matched.method.clone(),
            pattern: matched.route.pattern().to_string(),
            source,
            state: self.state().clone(),
        };
        debug!("dispatch {} {} to {}", cx.method, cx.url, cx.pattern);
        let response = matched.route.handler().call(cx);
        Dispatched { matched, response }
    }
}

impl<T> ChannelEvent<T> {
    pub fn new(request: Req) -> (Self, EventResponse<T>) {
        let (tx, rx) = oneshot::channel();
        let event = Self {
            request,
            tx: Some(tx),
        };
        (event, EventResponse { rx })
    }
}

impl<T> FetchEvent<T> for ChannelEvent<T> {
    fn request(&self) -> &Req {
        &self.request
    }

    fn respond_with(&mut self, response: Pending<T>) {
        match self.tx.take() {
            Some(tx) => {
                if tx.send(response).is_err() {
                    debug!("event response dropped: receiver is gone");
                }
            }
            None => warn!("respond_with called twice for {}", self.request.url),
        }
    }
}

impl<T> EventResponse<T> {
    /// Waits for the event to be answered and for the handler to settle.
    ///
    /// Resolves to `Ok(None)` once the event is dropped without a response,
    /// so the event must not outlive this call's caller.
    pub async fn settle(self) -> anyhow::Result<Option<T>> {
        match self.rx.await {
            Ok(pending) => pending.await.map(Some),
            Err(_) => Ok(None),
        }
    }
}
