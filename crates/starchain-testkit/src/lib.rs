//! # Starchain Testkit
//!
//! Testing utilities for Starchain.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a registry over an in-memory archive, driven by a manual clock
//! - **Generators**: Proptest strategies for addresses and star payloads
//!
//! ## Test Fixtures
//!
//! ```rust
//! use starchain_testkit::fixtures::TestFixture;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let fixture = TestFixture::new().await;
//! let block = fixture.submit("alice", serde_json::json!({"story": "hi"})).await.unwrap();
//! assert_eq!(block.height, 1);
//! # });
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use starchain_testkit::generators::{address, star};
//!
//! proptest! {
//!     #[test]
//!     fn challenge_names_its_address(addr in address(), _s in star()) {
//!         prop_assert!(!addr.contains(':'));
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{StubVerifier, TestFixture};
pub use generators::{address, star, submissions};
