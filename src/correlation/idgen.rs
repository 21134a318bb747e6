//! Snowflake correlation-id allocation
//!
//! Layout: 41 bits milliseconds since [`EPOCH_MS`] | 10 bits node | 12 bits sequence.
//! The sign bit stays clear so every id is a positive `i64`.

use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use super::CorrelationId;

/// 2020-01-01T00:00:00Z
pub const EPOCH_MS: u64 = 1_577_836_800_000;

const NODE_BITS: u32 = 10;
const SEQUENCE_BITS: u32 = 12;
pub const MAX_NODE_ID: u16 = (1 << NODE_BITS) - 1;
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;

/// "Allocate next correlation id" capability, injected into the edge.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> CorrelationId;
}

struct SnowflakeState {
    last_timestamp: u64,
    sequence: u64,
}

pub struct SnowflakeGenerator {
    node_id: u64,
    state: Mutex<SnowflakeState>,
}

impl SnowflakeGenerator {
    /// Returns `None` when `node_id` does not fit in 10 bits.
    pub fn new(node_id: u16) -> Option<Self> {
        if node_id > MAX_NODE_ID {
            return None;
        }
        Some(Self {
            node_id: node_id as u64,
            state: Mutex::new(SnowflakeState {
                last_timestamp: 0,
                sequence: 0,
            }),
        })
    }

    fn now_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(EPOCH_MS)
            .saturating_sub(EPOCH_MS)
    }

    fn compose(&self, timestamp: u64, sequence: u64) -> i64 {
        ((timestamp << (NODE_BITS + SEQUENCE_BITS)) | (self.node_id << SEQUENCE_BITS) | sequence)
            as i64
    }
}

impl IdGenerator for SnowflakeGenerator {
    fn next_id(&self) -> CorrelationId {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        // Clock going backwards: keep issuing from the last seen millisecond
        let mut now = Self::now_ms().max(state.last_timestamp);

        if now == state.last_timestamp {
            state.sequence = (state.sequence + 1) & SEQUENCE_MASK;
            if state.sequence == 0 {
                // Sequence exhausted for this millisecond
                while now <= state.last_timestamp {
                    std::hint::spin_loop();
                    now = Self::now_ms().max(state.last_timestamp);
                    if now == state.last_timestamp {
                        std::thread::yield_now();
                    }
                }
            }
        } else {
            state.sequence = 0;
        }
        state.last_timestamp = now;

        let raw = self.compose(now, state.sequence);
        // Only a pre-epoch clock on node 0 can compose 0
        CorrelationId::new(raw).unwrap_or(CorrelationId(1))
    }
}
