//! Injectable time and identifier sources.
//!
//! The query pipeline reads the clock once per request and draws every
//! message ID from an [`IdGenerator`], so both can be fixed in tests.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use rand::distr::{Alphanumeric, SampleString};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stopped at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Source of message identifiers.
///
/// Identifiers must be valid XML IDs (`NCName`): they must not start with a
/// digit.
pub trait IdGenerator: Send + Sync {
    /// Returns a fresh identifier.
    fn next_id(&self) -> String;
}

/// Length of the random part of generated IDs.
///
/// 40 alphanumeric characters carry about 238 bits of entropy.
const RANDOM_ID_LEN: usize = 40;

/// Unpredictable identifiers from the thread-local CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn next_id(&self) -> String {
        let mut rng = rand::rng();
        format!("_{}", Alphanumeric.sample_string(&mut rng, RANDOM_ID_LEN))
    }
}

/// Predictable identifiers `<prefix>1`, `<prefix>2`, ...
///
/// Only suitable for tests.
#[doc(hidden)]
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialIdGenerator {
    /// Creates a generator producing IDs with the given prefix.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}{n}", self.prefix)
    }
}
