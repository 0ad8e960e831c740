// src/service/strategy.rs
use crate::api::models::extract_records;
use crate::api::{ApiError, EndpointStrategy};
use crate::cache::CacheKey;
use crate::sequence::Ticket;
use crate::service::PropertyService;
use serde_json::Value;

impl PropertyService {
    /// Try each strategy in order and return the records of the first one that answers.
    ///
    /// Recoverable failures move on to the next strategy. Auth failures and timeouts stop
    /// the walk. `Ok(None)` means every strategy failed.
    pub(crate) fn retrieve(
        &self,
        strategies: &[EndpointStrategy],
    ) -> Result<Option<Vec<Value>>, ApiError> {
        for strategy in strategies {
            let ticket = matches!(strategy, EndpointStrategy::GetAll)
                .then(|| self.sequencer.issue(&CacheKey::AllListings.as_string()));

            let outcome = self
                .backend
                .fetch_listings(strategy)
                .and_then(|body| extract_records(&body));

            match outcome {
                Ok(records) => {
                    tracing::info!(
                        tier = strategy.label(),
                        count = records.len(),
                        "Listings retrieved"
                    );
                    if let Some(ticket) = ticket {
                        self.store_if_latest(&ticket, &records);
                    }
                    return Ok(Some(records));
                }
                Err(e) if e.is_recoverable() => {
                    tracing::warn!(tier = strategy.label(), error = %e, "Listing endpoint failed, falling back");
                }
                Err(e) => {
                    tracing::warn!(tier = strategy.label(), error = %e, "Listing request aborted");
                    return Err(e);
                }
            }
        }

        tracing::error!(
            tiers = strategies.len(),
            "All listing endpoints failed, serving an empty result"
        );
        Ok(None)
    }

    /// Cache the full listing set unless a newer get-all request has been issued since.
    pub(crate) fn store_if_latest(&self, ticket: &Ticket, records: &[Value]) -> bool {
        if records.is_empty() {
            return false;
        }
        self.sequencer.apply_if_latest(ticket, || {
            self.cache.set(
                &CacheKey::AllListings,
                Value::Array(records.to_vec()),
                self.cache_ttl,
            )
        })
    }
}
