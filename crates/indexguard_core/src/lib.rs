//! # IndexGuard Core
//!
//! Lifecycle contract checking for index handles.
//!
//! An index handle exposes five operations (`create`, `update`, `force`,
//! `close`, `drop_index`) and trusts its callers to use them in order and
//! one at a time. This crate provides:
//! - The [`IndexProxy`] trait describing that surface
//! - [`ContractCheckingProxy`], a guard that rejects out-of-order calls and
//!   calls that race another in-flight operation
//! - [`InMemoryIndex`], a working in-memory index handle
//!
//! ## Key Invariants
//!
//! - State only moves forward: uninitialized → creating → online, then
//!   online → closing → closed or online → dropping → dropped
//! - At most one forwarded call runs inside the index at any time
//! - The guard never blocks: a racing call fails immediately
//! - Index errors are returned unchanged
//!
//! ## Example
//!
//! ```rust
//! use indexguard_core::{
//!     ContractCheckingProxy, GuardConfig, IndexProxy, IndexUpdate, InMemoryIndex,
//! };
//!
//! let index = ContractCheckingProxy::with_config(
//!     InMemoryIndex::new(),
//!     GuardConfig::new().with_name("users_by_email"),
//! );
//!
//! index.create().unwrap();
//! index.update(&[IndexUpdate::added(1, "ada@example.com")]).unwrap();
//! index.force().unwrap();
//! index.close().unwrap();
//!
//! let err = index.update(&[]).unwrap_err();
//! assert!(err.is_contract_violation());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod gate;
mod guard;
mod memory;
mod proxy;
mod state;
mod stats;
mod update;

pub use config::{FailurePolicy, GuardConfig};
pub use error::{ContractViolation, GuardError, GuardResult, IndexError, IndexResult};
pub use gate::{Gate, GatePass};
pub use guard::ContractCheckingProxy;
pub use memory::InMemoryIndex;
pub use proxy::{IndexProxy, NoopIndexProxy};
pub use state::{AtomicLifecycleState, LifecycleState, Operation};
pub use stats::{GuardStats, GuardStatsSnapshot};
pub use update::{EntityId, IndexUpdate, UpdateKind};
