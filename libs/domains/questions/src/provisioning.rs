//! Startup index provisioning.

use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::error::{QuestionError, QuestionResult};
use crate::models::{CreateIndex, DistanceMetric, ServerlessSpec};
use crate::repository::VectorStore;

/// How the index should look and how long to wait for it.
#[derive(Debug, Clone)]
pub struct ProvisionConfig {
    pub index_name: String,
    pub dimension: u32,
    pub metric: DistanceMetric,
    pub spec: ServerlessSpec,
    pub poll_interval: Duration,
    pub ready_timeout: Duration,
}

impl ProvisionConfig {
    pub fn new(index_name: String, dimension: u32, spec: ServerlessSpec) -> Self {
        Self {
            index_name,
            dimension,
            metric: DistanceMetric::Cosine,
            spec,
            poll_interval: Duration::from_millis(1000),
            ready_timeout: Duration::from_secs(120),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    AlreadyExists,
    Created,
}

/// Make sure the configured index exists.
///
/// An existing index is used as is. A missing one is created and then polled
/// until it reports ready, failing with `ProvisioningTimeout` once
/// `ready_timeout` has elapsed.
pub async fn ensure_index<S>(
    store: &S,
    config: &ProvisionConfig,
) -> QuestionResult<ProvisionOutcome>
where
    S: VectorStore + ?Sized,
{
    let existing = store.list_indexes().await?;
    if existing.iter().any(|name| name == &config.index_name) {
        return Ok(ProvisionOutcome::AlreadyExists);
    }

    info!(
        index = %config.index_name,
        dimension = config.dimension,
        cloud = %config.spec.cloud,
        region = %config.spec.region,
        "Creating vector index"
    );
    store
        .create_index(CreateIndex {
            name: config.index_name.clone(),
            dimension: config.dimension,
            metric: config.metric,
            spec: config.spec.clone(),
        })
        .await?;

    wait_until_ready(store, config).await?;
    Ok(ProvisionOutcome::Created)
}

async fn wait_until_ready<S>(store: &S, config: &ProvisionConfig) -> QuestionResult<()>
where
    S: VectorStore + ?Sized,
{
    let started = Instant::now();

    loop {
        let description = store.describe_index(&config.index_name).await?;
        debug!(
            index = %config.index_name,
            state = ?description.state,
            ready = description.ready,
            "Polled vector index"
        );
        if description.ready {
            info!(
                index = %config.index_name,
                waited_ms = started.elapsed().as_millis() as u64,
                "Vector index is ready"
            );
            return Ok(());
        }

        if started.elapsed() >= config.ready_timeout {
            warn!(index = %config.index_name, "Vector index not ready in time");
            return Err(QuestionError::ProvisioningTimeout {
                name: config.index_name.clone(),
                waited: started.elapsed(),
            });
        }

        sleep(config.poll_interval).await;
    }
}
