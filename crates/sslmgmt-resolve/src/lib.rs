//! # sslmgmt-resolve: Resolution Engine
//!
//! Resolves a CA or certificate identifier plus a parameter set into an
//! [`ArtifactPlan`]: the exact files, contents, ownership and modes a host
//! should carry.
//!
//! ## Pipeline
//!
//! ```text
//! params ─▶ validate ─▶ store layout ─▶ lookup entry ─▶ chain ─▶ plan
//! ```
//!
//! - [`validate`]: rejects malformed parameter sets before any lookup.
//! - [`store`]: maps `default`, named presets and `custom` onto paths,
//!   ownership and modes.
//! - [`chain`]: decodes store entries and follows chain references.
//! - [`plan`]: the decision tables producing the ordered artifact list.
//!
//! ## Guarantees
//!
//! - Either a complete plan or an error; never a partial plan.
//! - At most one lookup for the identifier and one for the chain.
//! - No state is shared between resolutions: a [`Resolver`] can serve
//!   any number of threads concurrently.

pub mod chain;
pub mod plan;
pub mod request;
pub mod store;
pub mod validate;

use sslmgmt_core::{ArtifactPlan, EntryKind, ResolveError};
use sslmgmt_lookup::ConfigLookup;

pub use request::{CaRequest, CertRequest, CustomStore, Params, StoreSelection};
pub use store::{CertLayout, PkiStore, PkiStores, StoreConfigError};

/// Entry points binding a configuration store to a set of presets.
#[derive(Debug, Clone)]
pub struct Resolver<L> {
    lookup: L,
    stores: PkiStores,
}

impl<L: ConfigLookup> Resolver<L> {
    /// Create a resolver over `lookup` with the given presets.
    pub fn new(lookup: L, stores: PkiStores) -> Self {
        Self { lookup, stores }
    }

    /// The presets requests may select.
    pub fn stores(&self) -> &PkiStores {
        &self.stores
    }

    /// The underlying configuration store.
    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Resolve a certificate authority.
    pub fn resolve_ca(
        &self,
        identifier: &str,
        params: &Params,
    ) -> Result<ArtifactPlan, ResolveError> {
        let request = validate::validate_ca(identifier, params, &self.stores)
            .map_err(|e| log_failure(EntryKind::Ca, identifier, e))?;
        plan::plan_ca(&self.lookup, &self.stores, &request)
            .map_err(|e| log_failure(EntryKind::Ca, identifier, e))
    }

    /// Resolve a leaf certificate and its key.
    pub fn resolve_cert(
        &self,
        identifier: &str,
        params: &Params,
    ) -> Result<ArtifactPlan, ResolveError> {
        let request = validate::validate_cert(identifier, params, &self.stores)
            .map_err(|e| log_failure(EntryKind::Cert, identifier, e))?;
        plan::plan_cert(&self.lookup, &self.stores, &request)
            .map_err(|e| log_failure(EntryKind::Cert, identifier, e))
    }

    /// Resolve an entry of either kind.
    pub fn resolve(
        &self,
        kind: EntryKind,
        identifier: &str,
        params: &Params,
    ) -> Result<ArtifactPlan, ResolveError> {
        match kind {
            EntryKind::Ca => self.resolve_ca(identifier, params),
            EntryKind::Cert => self.resolve_cert(identifier, params),
        }
    }
}

fn log_failure(kind: EntryKind, identifier: &str, error: ResolveError) -> ResolveError {
    tracing::debug!(
        kind = %kind,
        identifier,
        category = error.category(),
        "resolution failed: {error}"
    );
    error
}
