use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::Instrument as _;

use super::{AggregatedRate, Error, RateSource};

/// Combines the rates of two sources into a single [`AggregatedRate`].
#[derive(Clone)]
pub struct RateAggregator {
    sources: [Arc<dyn RateSource>; 2],
}

impl RateAggregator {
    pub fn new(first: Arc<dyn RateSource>, second: Arc<dyn RateSource>) -> Self {
        Self {
            sources: [first, second],
        }
    }

    /// Fetches both rates concurrently and multiplies them.
    ///
    /// Returns as soon as either fetch reports an error, without waiting for the other one.
    #[tracing::instrument(skip(self))]
    pub async fn aggregated_rate(&self) -> Result<AggregatedRate, Error> {
        let (results, mut rx) = mpsc::channel(self.sources.len());

        for source in &self.sources {
            let source = Arc::clone(source);
            let results = results.clone();
            tokio::spawn(
                async move {
                    let result = source.fetch().await;
                    if let Err(error) = &result {
                        tracing::warn!(
                            provider = source.name(),
                            error = ?error,
                            "rate fetch failed"
                        );
                    }
                    // the receiver is gone once the other fetch has failed
                    let _ = results.send(result).await;
                }
                .in_current_span(),
            );
        }
        drop(results);

        let first = rx.recv().await.ok_or(Error::Interrupted)??;
        let second = rx.recv().await.ok_or(Error::Interrupted)??;

        Ok(AggregatedRate::combine(first, second))
    }
}
