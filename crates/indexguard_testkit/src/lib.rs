//! # IndexGuard Testkit
//!
//! Test utilities for IndexGuard.
//!
//! This crate provides:
//! - [`DoubleLatch`], a two-phase start/finish handshake for holding an
//!   operation in flight while another thread races it
//! - Scripted index handles: [`BlockingProxy`], [`FailingProxy`],
//!   [`RecordingProxy`]
//! - A reference [`LifecycleModel`] and proptest generators
//! - Stress testing utilities
//!
//! ## Usage
//!
//! ```rust
//! use indexguard_core::{ContractCheckingProxy, IndexProxy, Operation};
//! use indexguard_testkit::prelude::*;
//! use std::sync::Arc;
//!
//! let latch = Arc::new(DoubleLatch::new());
//! let index = Arc::new(ContractCheckingProxy::new(BlockingProxy::noop(
//!     Operation::Create,
//!     Arc::clone(&latch),
//! )));
//!
//! let creator = {
//!     let index = Arc::clone(&index);
//!     run_in_separate_thread(move || index.create())
//! };
//!
//! latch.await_start();
//! assert!(index.close().unwrap_err().is_contract_violation());
//! latch.finish();
//!
//! creator.join().unwrap().unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod generators;
pub mod latch;
pub mod logging;
pub mod model;
pub mod proxies;
pub mod stress;
pub mod threads;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::generators::*;
    pub use crate::latch::*;
    pub use crate::logging::*;
    pub use crate::model::*;
    pub use crate::proxies::*;
    pub use crate::stress::*;
    pub use crate::threads::*;
}

pub use generators::*;
pub use latch::*;
pub use logging::*;
pub use model::*;
pub use proxies::*;
pub use stress::*;
pub use threads::*;
