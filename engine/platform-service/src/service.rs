//! Service state and component wiring

use crate::config::{ServiceConfig, StoreBackend, StoreConfig};
use analytics_engine::AnalyticsEngine;
use anyhow::{Context, Result};
use content_gateway::{create_routes, GatewayContext, IdentityVerifier};
use content_store::{ContentStore, EventStore, MemoryStore, PgStore, UserStore};
use std::sync::Arc;
use suggestion_engine::SuggestionEngine;
use tokio::sync::{oneshot, Mutex};
use tracing::info;
use view_tracker::ViewTracker;

/// Storage collaborator handles, one backend behind all three
struct Stores {
    content: Arc<dyn ContentStore>,
    users: Arc<dyn UserStore>,
    events: Arc<dyn EventStore>,
}

async fn build_stores(config: &StoreConfig) -> Result<Stores> {
    match config.backend {
        StoreBackend::Memory => {
            info!("Using in-memory storage backend");
            let store = Arc::new(MemoryStore::new());
            Ok(Stores { content: store.clone(), users: store.clone(), events: store })
        }
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("postgres backend requires DATABASE_URL")?;
            info!("Connecting to Postgres storage backend");
            let store = Arc::new(PgStore::connect(url).await?);
            Ok(Stores { content: store.clone(), users: store.clone(), events: store })
        }
    }
}

/// Shared service state
pub struct ServiceState {
    pub config: ServiceConfig,
    gateway_ctx: GatewayContext,
    gateway_shutdown: Mutex<Option<oneshot::Sender<()>>>,
}

impl ServiceState {
    /// Build all components from configuration
    pub async fn new(config: ServiceConfig) -> Result<Self> {
        let stores = build_stores(&config.store).await?;

        let tracker = Arc::new(ViewTracker::new(
            stores.events.clone(),
            stores.users.clone(),
            stores.content.clone(),
        ));
        let analytics = Arc::new(AnalyticsEngine::new(
            stores.events,
            stores.users.clone(),
            stores.content.clone(),
        ));
        let suggestions = Arc::new(SuggestionEngine::new(stores.users, stores.content));
        let verifier = Arc::new(IdentityVerifier::new(&config.gateway.jwt_secret));

        let gateway_ctx = GatewayContext { tracker, analytics, suggestions, verifier };

        Ok(Self { config, gateway_ctx, gateway_shutdown: Mutex::new(None) })
    }

    /// Run the gateway until shutdown is requested
    pub async fn start_gateway(&self) -> Result<()> {
        let addr = self.config.gateway.bind_addr()?;
        let routes = create_routes(self.gateway_ctx.clone());

        let (tx, rx) = oneshot::channel();
        {
            let mut shutdown = self.gateway_shutdown.lock().await;
            *shutdown = Some(tx);
        }

        let (bound, server) = warp::serve(routes).bind_with_graceful_shutdown(addr, async {
            let _ = rx.await;
        });
        info!("ContentGateway listening on {}", bound);
        server.await;

        Ok(())
    }

    /// Ask the gateway to stop accepting requests
    pub async fn stop_gateway(&self) {
        if let Some(tx) = self.gateway_shutdown.lock().await.take() {
            let _ = tx.send(());
        }
    }
}
