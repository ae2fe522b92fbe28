//! Stand-in metadata lookup: every link resolves to a random playtime

use async_trait::async_trait;
use fairqueue_core::domain::Playtime;
use fairqueue_core::port::{MetadataResolver, ResolutionError, ResolvedMedia};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::Rng;
use std::ops::RangeInclusive;

pub struct RandomResolver {
    rng: Mutex<StdRng>,
    durations: RangeInclusive<u64>,
}

impl RandomResolver {
    pub fn new(rng: StdRng, durations: RangeInclusive<u64>) -> Self {
        Self {
            rng: Mutex::new(rng),
            durations,
        }
    }
}

#[async_trait]
impl MetadataResolver for RandomResolver {
    async fn resolve(&self, source_ref: &str) -> Result<ResolvedMedia, ResolutionError> {
        if !source_ref.starts_with("https://") {
            return Err(ResolutionError::Unsupported(source_ref.to_string()));
        }

        let secs = self.rng.lock().gen_range(self.durations.clone());
        let title = source_ref
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .map(|track| format!("Track {}", track));

        Ok(ResolvedMedia {
            title,
            duration: Playtime::seconds(secs),
        })
    }
}
