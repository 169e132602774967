use std::{net::SocketAddr, sync::Arc};

use handlers::AppState;
use routes::create_router;
use tokio::net::TcpListener;
use tracing::info;

use crate::services::conversation::ConversationService;

pub mod errors;
pub mod handlers;
pub mod routes;

pub async fn api(service: Arc<ConversationService>, port: u16) -> anyhow::Result<()> {
    let router = create_router(AppState { service });
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(&addr).await?;
    info!("Conversation API listening on {}", addr);
    Ok(axum::serve(listener, router.into_make_service()).await?)
}
