//! Reachable / unreachable partitions shared by all probe workers

use crate::proxy::models::{Endpoint, Outcome};
use parking_lot::Mutex;

#[derive(Debug, Default)]
struct Partitions {
    good: Vec<Endpoint>,
    bad: Vec<Endpoint>,
}

/// Two disjoint, append-only sequences of endpoints behind a single lock.
///
/// The sequences are only reachable through [`ResultSet::record`] and
/// [`ResultSet::snapshot`]. Order follows the order workers finished in, not
/// input order.
#[derive(Debug, Default)]
pub struct ResultSet {
    inner: Mutex<Partitions>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the outcome's endpoint to `good` or `bad`
    pub fn record(&self, outcome: Outcome) {
        let mut partitions = self.inner.lock();
        if outcome.is_reachable() {
            partitions.good.push(outcome.endpoint);
        } else {
            partitions.bad.push(outcome.endpoint);
        }
    }

    /// Copy of `(good, bad)`. Meant to be read once the work queue has
    /// drained; earlier reads see a consistent but partial picture.
    pub fn snapshot(&self) -> (Vec<Endpoint>, Vec<Endpoint>) {
        let partitions = self.inner.lock();
        (partitions.good.clone(), partitions.bad.clone())
    }
}
