//! # BESS-PAS Test Suite
//!
//! Cross-crate tests that need the whole service stack.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/
//! │   ├── fixtures.rs      # Stack builder shared by tests and benches
//! │   └── integration/     # End-to-end, concurrency, atomicity, HTTP
//! └── benches/             # Criterion benchmarks
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p pas-tests
//!
//! # By category
//! cargo test -p pas-tests integration::concurrency::
//!
//! # Benchmarks
//! cargo bench -p pas-tests
//! ```

pub mod fixtures;
pub mod integration;
