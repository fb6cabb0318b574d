//! gdsync Core - Domain types and port definitions
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `FileSnapshot`, `Change`, `ConflictRecord`, `BaselineEntry`
//! - **Port definitions** - Traits for adapters: `IRemoteOracle`, `IRemoteWriter`,
//!   `ILocalScanner`, `IConflictStore`, `IBaselineStore`, `IIdentityAllocator`,
//!   `IPendingIdentityStore`
//! - **Configuration** - YAML-backed settings shared by the CLI and adapters
//!
//! # Architecture
//!
//! The domain module contains plain data with validation and no I/O.
//! Ports define trait interfaces that adapter crates implement
//! (`gdsync-cache` for persistence, `gdsync-drive` for Google Drive,
//! `gdsync-sync` for the local tree).

pub mod config;
pub mod domain;
pub mod ports;
