use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::rngs::OsRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub trait OrderIdGenerator: Send + Sync {
    fn next_order_id(&self, session_id: &str) -> OrderId;
}

/// 26 base-32 characters drawn from the operating system CSPRNG (130 bits).
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomOrderIds;

impl RandomOrderIds {
    const CHARSET: &'static [u8] = b"0123456789abcdefghijklmnopqrstuv";
    const ID_LEN: usize = 26;
}

impl OrderIdGenerator for RandomOrderIds {
    fn next_order_id(&self, _session_id: &str) -> OrderId {
        let mut rng = OsRng;
        let id = (0..Self::ID_LEN)
            .map(|_| {
                let idx = rng.gen_range(0..Self::CHARSET.len());
                Self::CHARSET[idx] as char
            })
            .collect();
        OrderId(id)
    }
}

/// Monotonic counter scoped by the trailing segment of the session id.
#[derive(Debug, Default)]
pub struct SequentialOrderIds {
    next: AtomicU64,
}

impl SequentialOrderIds {
    pub fn starting_at(first: u64) -> Self {
        Self { next: AtomicU64::new(first) }
    }
}

impl OrderIdGenerator for SequentialOrderIds {
    fn next_order_id(&self, session_id: &str) -> OrderId {
        let sequence = self.next.fetch_add(1, Ordering::Relaxed);
        let scope = session_id.rsplit('/').next().filter(|segment| !segment.is_empty());
        OrderId(format!("{}-{sequence:06}", scope.unwrap_or("session")))
    }
}
