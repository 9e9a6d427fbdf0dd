//! Warm-Up Task
//!
//! Pre-populates known-hot keys by running their fetchers through the
//! cache-aside path, all in parallel. One failing fetcher does not stop the
//! others.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{join_all, BoxFuture, FutureExt};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::cache::Cache;

type WarmupFetch = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<Value>> + Send + Sync>;

// == Warm-Up Task ==
/// One key to pre-populate: where it lives, how long it lives, how to fetch it.
#[derive(Clone)]
pub struct WarmupTask {
    name: String,
    key: String,
    ttl: Option<u64>,
    fetch: WarmupFetch,
}

impl WarmupTask {
    /// Creates a task from any fetcher producing a serializable value.
    ///
    /// # Arguments
    /// * `name` - Label used in logs and reports
    /// * `key` - Cache key, usually from [`crate::cache::keys`]
    /// * `ttl` - TTL in seconds, `None` for the cache default
    /// * `fetch` - Loads the value from the backing store
    pub fn new<T, F, Fut>(
        name: impl Into<String>,
        key: impl Into<String>,
        ttl: Option<u64>,
        fetch: F,
    ) -> Self
    where
        T: Serialize + Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let fetch: WarmupFetch = Arc::new(move || {
            let pending = fetch();
            async move {
                let value = pending.await?;
                Ok::<_, anyhow::Error>(serde_json::to_value(value)?)
            }
            .boxed()
        });

        Self {
            name: name.into(),
            key: key.into(),
            ttl,
            fetch,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Debug for WarmupTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WarmupTask")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

// == Warm-Up Plan ==
/// The fixed set of keys warmed at startup and on demand.
#[derive(Debug, Clone, Default)]
pub struct WarmupPlan {
    tasks: Vec<WarmupTask>,
}

impl WarmupPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_task(mut self, task: WarmupTask) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn push(&mut self, task: WarmupTask) {
        self.tasks.push(task);
    }

    pub fn tasks(&self) -> &[WarmupTask] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

// == Warm-Up Report ==
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WarmupReport {
    /// Keys fetched and stored by this run
    pub warmed: usize,
    /// Keys that were already live, so nothing was fetched
    pub already_cached: usize,
    pub failed: Vec<WarmupFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarmupFailure {
    pub name: String,
    pub key: String,
    pub error: String,
}

enum Outcome {
    Warmed,
    AlreadyCached,
    Failed(WarmupFailure),
}

/// Runs every task in `plan` through [`Cache::cached`] concurrently.
pub async fn warm_up(cache: &Cache, plan: &WarmupPlan) -> WarmupReport {
    if plan.is_empty() {
        info!("Cache warm-up: no tasks registered");
        return WarmupReport::default();
    }

    let outcomes = join_all(plan.tasks().iter().map(|task| warm_one(cache, task))).await;

    let mut report = WarmupReport::default();
    for outcome in outcomes {
        match outcome {
            Outcome::Warmed => report.warmed += 1,
            Outcome::AlreadyCached => report.already_cached += 1,
            Outcome::Failed(failure) => report.failed.push(failure),
        }
    }

    info!(
        "Cache warm-up: {} warmed, {} already cached, {} failed",
        report.warmed,
        report.already_cached,
        report.failed.len()
    );
    report
}

async fn warm_one(cache: &Cache, task: &WarmupTask) -> Outcome {
    let mut fetched = false;
    let result = cache
        .cached(&task.key, task.ttl, || {
            fetched = true;
            (task.fetch)()
        })
        .await;

    match result {
        Ok(_) if fetched => Outcome::Warmed,
        Ok(_) => Outcome::AlreadyCached,
        Err(err) => {
            warn!(task = %task.name, key = %task.key, error = %err, "Cache warm-up task failed");
            Outcome::Failed(WarmupFailure {
                name: task.name.clone(),
                key: task.key.clone(),
                error: err.to_string(),
            })
        }
    }
}
