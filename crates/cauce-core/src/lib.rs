//! Core types and engines for the Cauce claims tracker.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]
// This toolchain's std gates `div_ceil` behind `int_roundings`.
#![feature(int_roundings)]

pub mod claim;
pub mod engine;
pub mod error;
pub mod filter;
pub mod risk;
pub mod store;
pub mod workflow;

pub use error::{Error, Result};
