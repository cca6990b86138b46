//! Test utilities for tagheap development.
//!
//! Provides a [`LayoutBuilder`] for constructing arenas with a known block
//! layout, a drop-recording element type ([`DropLog`] / [`Tracked`]), and
//! [`init_tracing`] for seeing arena events in test output.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{DropLog, Fixture, LayoutBuilder, Tracked, GUARD, GUARD_SIZE};

use tracing_subscriber::EnvFilter;

/// Install a test-friendly tracing subscriber.
///
/// Reads the filter from `TAGHEAP_LOG`, defaulting to `warn`. Safe to call
/// from every test; only the first call installs anything.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("TAGHEAP_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
