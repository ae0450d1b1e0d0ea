//! Snowflake identifiers.
//!
//! Layout, from the most significant bit: milliseconds since a custom
//! epoch, a 10-bit worker id, a 12-bit per-millisecond sequence.

use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use tabula_common::{
    StoreConfig, TabulaError, TabulaResult, SNOWFLAKE_EPOCH_MS, SNOWFLAKE_SEQUENCE_BITS,
    SNOWFLAKE_WORKER_BITS,
};
use tracing::warn;

use super::{unix_millis, IdGenerator};

const SEQUENCE_MASK: u64 = (1 << SNOWFLAKE_SEQUENCE_BITS) - 1;

#[derive(Debug)]
struct State {
    last_ms: u64,
    sequence: u64,
}

/// Generates time-ordered numeric keys for one worker.
#[derive(Debug)]
pub struct SnowflakeGenerator {
    worker_id: u64,
    state: Mutex<State>,
}

impl SnowflakeGenerator {
    /// Creates a generator for `worker_id`, which must fit in 10 bits.
    pub fn new(worker_id: u16) -> TabulaResult<Self> {
        if u32::from(worker_id) >= 1 << SNOWFLAKE_WORKER_BITS {
            return Err(TabulaError::configuration(format!(
                "snowflake worker id {worker_id} must be below {}",
                1 << SNOWFLAKE_WORKER_BITS
            )));
        }
        Ok(Self {
            worker_id: u64::from(worker_id),
            state: Mutex::new(State {
                last_ms: 0,
                sequence: 0,
            }),
        })
    }

    /// Creates a generator for the configured worker.
    pub fn from_config(config: &StoreConfig) -> TabulaResult<Self> {
        Self::new(config.snowflake_worker_id)
    }

    /// Returns the worker id.
    pub fn worker_id(&self) -> u64 {
        self.worker_id
    }

    fn next_id(&self, now_ms: impl Fn() -> TabulaResult<u64>) -> TabulaResult<u64> {
        let mut state = self.state.lock();
        let mut now = now_ms()?;

        if now < state.last_ms {
            warn!(last_ms = state.last_ms, now_ms = now, "clock moved backwards");
            return Err(TabulaError::ClockMovedBackwards {
                last_ms: state.last_ms,
                now_ms: now,
            });
        }

        if now == state.last_ms {
            state.sequence = (state.sequence + 1) & SEQUENCE_MASK;
            if state.sequence == 0 {
                // Sequence exhausted for this millisecond.
                while now <= state.last_ms {
                    thread::sleep(Duration::from_millis(1));
                    now = now_ms()?;
                }
            }
        } else {
            state.sequence = 0;
        }
        state.last_ms = now;

        Ok((now << (SNOWFLAKE_WORKER_BITS + SNOWFLAKE_SEQUENCE_BITS))
            | (self.worker_id << SNOWFLAKE_SEQUENCE_BITS)
            | state.sequence)
    }
}

impl IdGenerator for SnowflakeGenerator {
    fn generate(&self) -> TabulaResult<String> {
        let id = self.next_id(|| Ok(unix_millis()?.saturating_sub(SNOWFLAKE_EPOCH_MS)))?;
        Ok(id.to_string())
    }
}
