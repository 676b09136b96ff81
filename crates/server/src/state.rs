use std::sync::Arc;

use lazyhire_ingest::{IngestionRun, Scheduler};
use lazyhire_ledger::Ledger;

pub struct AppState {
    pub ledger: Ledger,
    pub run: Arc<IngestionRun>,
    pub scheduler: Arc<Scheduler>,
}
