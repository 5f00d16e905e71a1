//! Soft-play venue directory library
//!
//! This module exposes the cache, fetch, filter and directory layers used by
//! the `softplay` binary, so they can be reused and tested independently.

pub mod cache;
pub mod cli;
pub mod data;
pub mod directory;
pub mod fetch;
pub mod filter;
pub mod logging;
pub mod render;
