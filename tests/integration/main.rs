//! Integration tests for the jsonapi-graph engine.
//!
//! Every test drives a [`JsonApi`](jsonapi_graph::JsonApi) through
//! `handle()` with the in-memory store; nothing touches the network.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test --test integration
//!
//! # With engine logs
//! RUST_LOG=jsonapi_graph=debug cargo test --test integration -- --nocapture
//!
//! # Run a specific test
//! cargo test --test integration test_polymorphic_rebind -- --nocapture
//! ```

mod capability_tests;
mod common;
mod concurrency_tests;
mod pagination_tests;
mod permission_tests;
mod polymorphism_tests;
mod route_tests;
