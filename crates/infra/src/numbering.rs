//! Order-number suffix sources.

use std::sync::Mutex;

use rand::Rng;

use storefront_orders::{OrderNumber, OrderNumberGenerator};

/// Uniform random suffix in `0..=9999`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSuffix;

impl OrderNumberGenerator for RandomSuffix {
    fn next_suffix(&self) -> u16 {
        rand::thread_rng().gen_range(0..=OrderNumber::MAX_SUFFIX)
    }
}

/// Replays a fixed list of suffixes, repeating the last one once exhausted.
///
/// Used to force order-number collisions in tests and benchmarks.
#[derive(Debug)]
pub struct SequenceSuffix {
    remaining: Mutex<Vec<u16>>,
    last: Mutex<u16>,
}

impl SequenceSuffix {
    pub fn new(suffixes: impl IntoIterator<Item = u16>) -> Self {
        let mut remaining: Vec<u16> = suffixes.into_iter().collect();
        remaining.reverse();
        Self {
            remaining: Mutex::new(remaining),
            last: Mutex::new(0),
        }
    }
}

impl OrderNumberGenerator for SequenceSuffix {
    fn next_suffix(&self) -> u16 {
        let next = match self.remaining.lock() {
            Ok(mut remaining) => remaining.pop(),
            Err(_) => None,
        };
        match self.last.lock() {
            Ok(mut last) => {
                if let Some(n) = next {
                    *last = n;
                }
                *last
            }
            Err(_) => next.unwrap_or_default(),
        }
    }
}
