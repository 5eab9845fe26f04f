// The binary entry point is main.rs; everything it drives lives in the
// library so integration tests and benchmarks can reach it.

pub mod app;
pub mod config;
pub mod engine;
pub mod error;
pub mod generator;
pub mod session;
pub mod store;
