use std::future::Future;
use std::sync::Arc;

use axum::Router;
use media_blob::MediaAdapter;
use tokio::net::{TcpListener, ToSocketAddrs};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::rpc::{self, SERVICE_PATH};
use crate::MediaAxumState;

#[derive(Clone)]
pub struct MediaAxumApp {
    pub adapter: Arc<MediaAdapter>,
    pub router: Router<()>,
}

impl MediaAxumApp {
    pub fn new(adapter: MediaAdapter) -> Self {
        Self::with_state(MediaAxumState::new(adapter))
    }

    pub fn with_state(state: MediaAxumState) -> Self {
        let adapter = Arc::clone(&state.adapter);
        let router = Router::new()
            .nest(SERVICE_PATH, rpc::service_router(state))
            .merge(rpc::health_router())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

        Self { adapter, router }
    }

    /// Serve until `shutdown` resolves, then drain in-flight calls
    pub async fn listen<A, F>(self, addr: A, shutdown: F) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "Media RPC server listening");
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}

pub fn axum(adapter: MediaAdapter) -> MediaAxumApp {
    MediaAxumApp::new(adapter)
}
