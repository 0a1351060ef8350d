//! # sslmgmt-core: Foundational Types
//!
//! This crate is the leaf of the sslmgmt workspace. It defines the value
//! types that flow between lookup, resolution, and materialization, and
//! the error taxonomy every resolution failure is reported through.
//! Every other crate in the workspace depends on `sslmgmt-core`; it depends
//! on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Content is opaque.** Certificate and key material is carried as
//!    [`Blob`] bytes. Nothing here parses PEM; the only operation on
//!    content is the fixed-order concatenation in [`Blob::concat`].
//!
//! 2. **Request-scoped values.** [`ArtifactPlan`], [`CaEntry`] and
//!    [`CertEntry`] are plain owned data with no shared mutable state, so
//!    independent resolutions never coordinate.
//!
//! 3. **Actionable errors.** Every [`ResolveError`] names the offending
//!    parameter or entry and, where applicable, the accepted values.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `sslmgmt-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod blob;
pub mod ensure;
pub mod entry;
pub mod error;
pub mod mode;
pub mod plan;

// Re-export primary types for ergonomic imports.
pub use blob::Blob;
pub use ensure::EnsureState;
pub use entry::{CaEntry, CertEntry, EntryKind};
pub use error::{ExpectedType, LookupError, ResolveError};
pub use mode::{FileMode, ParseModeError};
pub use plan::{ArtifactPlan, FileSpec, PlannedArtifact};
