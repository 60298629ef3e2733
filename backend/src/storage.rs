use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use crate::models::UserProfile;

/// Persistence capability handed to the plan resolver.
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Cheap round trip proving the store is reachable.
    async fn ping(&self) -> Result<()>;

    /// Creates the `users` and `fitness_plans` tables if absent. Each
    /// statement is applied independently; failures are logged.
    async fn ensure_schema(&self);

    async fn upsert_user(&self, profile: &UserProfile) -> Result<()>;

    /// Appends one plan-history row holding the raw plan payload.
    async fn insert_plan(&self, user_id: &str, plan_json: &str) -> Result<()>;

    /// Upsert and insert inside a single transaction.
    async fn save_plan(&self, profile: &UserProfile, plan_json: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageStatus {
    Unconfigured,
    Unreachable,
    Ready,
}

/// Storage availability for the lifetime of the process.
///
/// An unreachable store keeps its handle and is re-checked whenever a
/// request wants to persist; the first successful check re-applies the
/// schema and promotes the handle to `Ready`.
pub struct Storage {
    store: Option<Arc<dyn PlanStore>>,
    ready: AtomicBool,
}

impl Storage {
    pub fn unconfigured() -> Self {
        Self {
            store: None,
            ready: AtomicBool::new(false),
        }
    }

    pub fn ready(store: Arc<dyn PlanStore>) -> Self {
        Self {
            store: Some(store),
            ready: AtomicBool::new(true),
        }
    }

    pub fn unreachable(store: Arc<dyn PlanStore>) -> Self {
        Self {
            store: Some(store),
            ready: AtomicBool::new(false),
        }
    }

    /// Pings a configured store once and applies the schema when it answers.
    pub async fn connect(store: Arc<dyn PlanStore>) -> Self {
        match store.ping().await {
            Ok(()) => {
                info!("Connected to database");
                store.ensure_schema().await;
                Self::ready(store)
            }
            Err(e) => {
                warn!("Could not reach database, persistence paused: {}", e);
                Self::unreachable(store)
            }
        }
    }

    pub fn status(&self) -> StorageStatus {
        match (&self.store, self.ready.load(Ordering::Acquire)) {
            (None, _) => StorageStatus::Unconfigured,
            (Some(_), false) => StorageStatus::Unreachable,
            (Some(_), true) => StorageStatus::Ready,
        }
    }

    /// Returns the store if it can take writes right now.
    pub async fn acquire(&self) -> Option<Arc<dyn PlanStore>> {
        let store = self.store.as_ref()?;

        if self.ready.load(Ordering::Acquire) {
            return Some(Arc::clone(store));
        }

        match store.ping().await {
            Ok(()) => {
                store.ensure_schema().await;
                if !self.ready.swap(true, Ordering::AcqRel) {
                    info!("Database reachable again, persistence resumed");
                }
                Some(Arc::clone(store))
            }
            Err(e) => {
                warn!("Database still unreachable, skipping persistence: {}", e);
                None
            }
        }
    }
}
