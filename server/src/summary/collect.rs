use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};

use super::fetch::fetch_exchange;
use super::{CollectorConfig, MetricsRecord};
use crate::data_sources::output_data_format::TradingPair;
use crate::data_sources::ExchangeClient;
use crate::error::CollectError;

type Job = (usize, Arc<dyn ExchangeClient>);

/// Runs one fetcher per exchange on a bounded pool of workers.
pub struct Collector {
    clients: Vec<Arc<dyn ExchangeClient>>,
    config: Arc<CollectorConfig>,
}

impl Collector {
    pub fn new(clients: Vec<Arc<dyn ExchangeClient>>, config: CollectorConfig) -> Self {
        Self {
            clients,
            config: Arc::new(config),
        }
    }

    pub fn pairs(&self) -> &[TradingPair] {
        &self.config.pairs
    }

    /// One full collection cycle. Returns once every exchange has finished,
    /// with records grouped by exchange in the order the clients were given.
    pub async fn collect(&self) -> Result<Vec<MetricsRecord>, CollectError> {
        let started = Instant::now();
        let worker_count = self.config.max_workers.clamp(1, self.clients.len().max(1));

        let (job_tx, job_rx) = flume::unbounded::<Job>();
        let (result_tx, result_rx) = flume::unbounded::<(usize, Vec<MetricsRecord>)>();

        // unbounded and `job_rx` is alive, so every job is queued
        for job in self.clients.iter().cloned().enumerate() {
            let _ = job_tx.send(job);
        }
        drop(job_tx);

        let workers: Vec<_> = (0..worker_count)
            .map(|_| {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                let config = self.config.clone();

                tokio::spawn(async move {
                    while let Ok((index, client)) = job_rx.recv_async().await {
                        let records = fetch_exchange(client.as_ref(), &config).await;
                        if result_tx.send_async((index, records)).await.is_err() {
                            break;
                        }
                    }
                })
            })
            .collect();
        drop(result_tx);

        let mut failure = None;
        for worker in workers {
            if let Err(join_error) = worker.await {
                error!(error = %join_error, "collector worker failed");
                failure.get_or_insert(join_error);
            }
        }
        if let Some(join_error) = failure {
            return Err(CollectError::WorkerFailed(join_error));
        }

        // completion order -> submission order
        let mut results: Vec<_> = result_rx.drain().collect();
        results.sort_by_key(|(index, _)| *index);
        let records: Vec<MetricsRecord> = results
            .into_iter()
            .flat_map(|(_, records)| records)
            .collect();

        info!(
            exchanges = self.clients.len(),
            workers = worker_count,
            records = records.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "collection cycle finished"
        );

        Ok(records)
    }
}
