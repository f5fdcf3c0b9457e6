use std::{
    sync::Arc,
    task::{Context, Poll},
};

use futures::future::{self, BoxFuture};
use tower::Service;

use crate::{Req, Router};

/// Exposes a built [`Router`] as a [`tower::Service`] over [`Req`].
///
/// Resolves to `None` when no route matches.
pub struct RouterService<T, S = ()> {
    router: Arc<Router<T, S>>,
}

impl<T, S> RouterService<T, S> {
    pub fn new(router: Router<T, S>) -> Self {
        Self::from_shared(Arc::new(router))
    }

    pub fn from_shared(router: Arc<Router<T, S>>) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &Router<T, S> {
        &self.router
    }
}

impl<T, S> Clone for RouterService<T, S> {
    fn clone(&self) -> Self {
        Self {
            router: self.router.clone(),
        }
    }
}

impl<T, S> Service<Req> for RouterService<T, S>
where
    T: Send + 'static,
    S: Clone + 'static,
{
    type Response = Option<T>;
    type Error = anyhow::Error;
    type Future = BoxFuture<'static, Result<Option<T>, anyhow::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Req) -> Self::Future {
        match self.router.dispatch_request(req) {
            Ok(Some(dispatched)) => {
                let response = dispatched.response;
                Box::pin(async move { response.await.map(Some) })
            }
            Ok(None) => Box::pin(future::ready(Ok(None))),
            Err(e) => Box::pin(future::ready(Err(e.into()))),
        }
    }
}
