// src/dev/mod.rs
// Helpers shared by the fuzz/demo binaries and the integration tests.
pub mod generator;
