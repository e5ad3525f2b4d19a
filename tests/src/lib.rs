//! # FerroDFS Test Suite
//!
//! Unified test crate for cross-operation scenarios that don't belong to a
//! single module:
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── recovery_flows.rs   # Linearization, snapshot consistency, isolation
//!     └── copy_flows.rs       # Copy + recovery end-to-end
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p dfs-tests
//! cargo test -p dfs-tests integration::recovery_flows
//! ```

pub mod integration;
