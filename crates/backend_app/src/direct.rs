//! The direct caller strategy.
//!
//! Sends requests straight to an in-process [`Application`] instead of over
//! the network. Calls stay asynchronous and go through the same session
//! resolution and dispatcher as served calls, so the observable results
//! match the network strategy.

use std::sync::Arc;

use async_trait::async_trait;

use backend_facet::{CallHandler, CallRequest, CallResponse, FacetCaller, FacetFault};

use crate::application::Application;

/// In-process [`FacetCaller`].
#[derive(Debug, Clone)]
pub struct DirectCaller {
    app: Arc<Application>,
}

impl DirectCaller {
    /// Call into `app`.
    #[must_use]
    pub fn new(app: Arc<Application>) -> Self {
        Self { app }
    }

    /// The application calls go to.
    #[must_use]
    pub fn application(&self) -> &Arc<Application> {
        &self.app
    }
}

#[async_trait]
impl FacetCaller for DirectCaller {
    async fn send(&self, request: CallRequest) -> Result<CallResponse, FacetFault> {
        Ok(self.app.handle(request).await)
    }
}
