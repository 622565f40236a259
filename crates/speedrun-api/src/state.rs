use speedrun_storage::PersistenceGateway;
use speedrun_supervisor::Supervisor;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn PersistenceGateway>,
    pub supervisor: Arc<Supervisor>,
    pub db_timeout: Duration,
}
