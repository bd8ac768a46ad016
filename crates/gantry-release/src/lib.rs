//! Gantry Release - Release-host integration for Gantry
//!
//! This crate provides the release-facing layer of the pipeline:
//! - Domain types for releases, lifecycle states, and uploaded assets
//! - An HTTP client for the release-hosting API (resolve upload endpoint,
//!   upload asset)
//! - In-memory fakes for testing pipelines without a live host

pub mod client;
pub mod error;
pub mod fakes;
pub mod release;

// Re-export key types
pub use client::{HostConfig, ReleaseClient, ReleaseHost};
pub use error::{PublishError, Result};
pub use release::{AssetRef, Release, ReleaseState};
