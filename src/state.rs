use std::sync::Arc;

use deadpool_postgres::Pool;

use crate::{
    config::Config,
    services::{ChatDirectory, IdentityService},
    storage::DurabilityGateway,
    websocket::{broadcaster::GroupBroadcaster, registry::ConnectionRegistry},
};

#[derive(Clone)]
pub struct AppState {
    pub db: Pool,
    pub registry: ConnectionRegistry,
    pub broadcaster: GroupBroadcaster,
    /// Write path for durable messages; trait object so tests inject fakes.
    pub gateway: Arc<dyn DurabilityGateway>,
    pub identity: Arc<dyn IdentityService>,
    pub directory: Arc<dyn ChatDirectory>,
    pub config: Arc<Config>,
}
