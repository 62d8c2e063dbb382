//! # CLAW Registry
//!
//! Append-only transfer record storage for the CLAW protocol.
//!
//! This crate provides two storage backends:
//!
//! - **Memory**: Fast in-memory storage for development, testing and scanning
//! - **File**: JSON file persistence for single-node deployments
//!
//! Both keep records in insertion order and treat a repeated record id as a
//! no-op, so the first record registered under an id is the one scanners see.
//!
//! ## Example
//!
//! ```rust,ignore
//! use claw_registry::{MemoryRegistry, Registry};
//!
//! let registry = MemoryRegistry::new();
//! let outcome = registry.register(record).await?;
//! let records = registry.since(1_700_000_000).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod file;
mod memory;

pub use file::FileRegistry;
pub use memory::MemoryRegistry;

// Re-export the trait from core
pub use claw_core::traits::TransferRegistry as Registry;
