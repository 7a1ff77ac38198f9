use crate::config::AppConfig;
use crate::db::DbPool;
use portable_atomic::AtomicU64;
use std::sync::Arc;

// ── Operation Counters (lock-free) ──

pub struct OpCounters {
    pub registrations: AtomicU64,
    pub logins: AtomicU64,
    pub trades_created: AtomicU64,
    pub trades_updated: AtomicU64,
    pub trades_deleted: AtomicU64,
    pub stats_served: AtomicU64,
}

impl OpCounters {
    pub fn new() -> Self {
        Self {
            registrations: AtomicU64::new(0),
            logins: AtomicU64::new(0),
            trades_created: AtomicU64::new(0),
            trades_updated: AtomicU64::new(0),
            trades_deleted: AtomicU64::new(0),
            stats_served: AtomicU64::new(0),
        }
    }
}

// ── Application shared state ──

pub struct AppState {
    pub config: AppConfig,
    pub db: DbPool,
    pub counters: OpCounters,
}

impl AppState {
    pub fn new(config: AppConfig, db: DbPool) -> Arc<Self> {
        Arc::new(Self {
            config,
            db,
            counters: OpCounters::new(),
        })
    }
}
