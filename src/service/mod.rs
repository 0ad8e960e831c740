mod properties;
mod strategy;

use crate::api::ListingBackend;
use crate::cache::PropertyCache;
use crate::sequence::Sequencer;
use std::time::Duration;

pub const FEATURED_LIMIT: usize = 4;
pub const RECENT_LIMIT: usize = 8;

/// Listing queries and mutations over an unreliable backend.
///
/// Owns the cache: nothing else reads or writes it.
pub struct PropertyService {
    backend: Box<dyn ListingBackend>,
    cache: Box<dyn PropertyCache>,
    sequencer: Sequencer,
    cache_ttl: Duration,
}

impl PropertyService {
    pub fn new(
        backend: Box<dyn ListingBackend>,
        cache: Box<dyn PropertyCache>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            backend,
            cache,
            sequencer: Sequencer::new(),
            cache_ttl,
        }
    }
}
