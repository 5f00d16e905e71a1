//! Cache module for memoizing remote query results in memory
//!
//! This module provides a cache manager that stores fetch results under string
//! keys with a configurable TTL (time-to-live). It supports graceful degradation
//! by keeping expired entries around, so a failed refresh can still be answered
//! with the last good payload.

mod clock;
mod manager;

pub use clock::{Clock, ManualClock, SystemClock};
pub use manager::{CacheManager, CachedData, DEFAULT_TTL_MS};
