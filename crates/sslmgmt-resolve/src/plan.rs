//! # Artifact Planning
//!
//! Combines a validated request, its resolved layout and the looked-up
//! content into an [`ArtifactPlan`].
//!
//! ## CA Decision Table
//!
//! | ensure  | artifacts |
//! |---------|-----------|
//! | absent  | CA file absent (no lookup) |
//! | present | CA file = CA cert |
//!
//! ## Certificate Decision Table
//!
//! | ensure  | onefile | installkey | artifacts |
//! |---------|---------|------------|-----------|
//! | present | true    | any        | key path = key ++ (cert ++ chain?) |
//! | present | false   | true       | cert path = cert ++ chain?; key path = key |
//! | present | false   | false      | cert path = cert ++ chain? |
//! | absent  | same path set as present, every file absent, no lookups |
//!
//! Composition order is fixed: certificate before chain, key before
//! certificate. Swapping either produces a bundle TLS servers reject.

use sslmgmt_core::{ArtifactPlan, Blob, EntryKind, PlannedArtifact, ResolveError};
use sslmgmt_lookup::ConfigLookup;

use crate::chain::{fetch_ca, fetch_cert, resolve_chain};
use crate::request::{CaRequest, CertRequest};
use crate::store::{ca_layout, cert_layout, PkiStores};

/// Plan the single file of a CA request.
pub fn plan_ca(
    lookup: &dyn ConfigLookup,
    stores: &PkiStores,
    request: &CaRequest,
) -> Result<ArtifactPlan, ResolveError> {
    let spec = ca_layout(stores, &request.identifier, &request.store);
    let mut plan = ArtifactPlan::new(EntryKind::Ca, &request.identifier);

    if !request.ensure.is_present() {
        plan.push(PlannedArtifact::absent(spec))?;
        log_plan(&plan);
        return Ok(plan);
    }

    let ca = fetch_ca(lookup, "ca", &request.identifier)?;
    plan.push(PlannedArtifact::present(spec, ca.cert))?;
    log_plan(&plan);
    Ok(plan)
}

/// Plan the files of a certificate request.
pub fn plan_cert(
    lookup: &dyn ConfigLookup,
    stores: &PkiStores,
    request: &CertRequest,
) -> Result<ArtifactPlan, ResolveError> {
    let layout = cert_layout(
        stores,
        &request.identifier,
        request.chain.as_deref(),
        &request.store,
    );
    let mut plan = ArtifactPlan::new(EntryKind::Cert, &request.identifier);

    if !request.ensure.is_present() {
        if request.onefile {
            plan.push(PlannedArtifact::absent(layout.key))?;
        } else {
            plan.push(PlannedArtifact::absent(layout.cert))?;
            if request.installkey {
                plan.push(PlannedArtifact::absent(layout.key))?;
            }
        }
        log_plan(&plan);
        return Ok(plan);
    }

    let entry = fetch_cert(lookup, &request.identifier, request.requires_key())?;
    let chain = resolve_chain(lookup, request.chain.as_deref())?;

    let cert_content = match &chain {
        Some(ca) => Blob::concat(&entry.cert, &ca.cert),
        None => entry.cert,
    };

    if request.onefile {
        let key = entry
            .key
            .ok_or_else(|| missing_key(&request.identifier))?;
        plan.push(PlannedArtifact::present(
            layout.key,
            Blob::concat(&key, &cert_content),
        ))?;
    } else {
        plan.push(PlannedArtifact::present(layout.cert, cert_content))?;
        if request.installkey {
            let key = entry
                .key
                .ok_or_else(|| missing_key(&request.identifier))?;
            plan.push(PlannedArtifact::present(layout.key, key))?;
        }
    }

    log_plan(&plan);
    Ok(plan)
}

/// Unreachable when `fetch_cert` was told the key is required; kept as an
/// error rather than a panic.
fn missing_key(identifier: &str) -> ResolveError {
    ResolveError::MissingField {
        entry: identifier.to_string(),
        field: "key".to_string(),
        namespace: EntryKind::Cert.namespace(),
    }
}

fn log_plan(plan: &ArtifactPlan) {
    for artifact in plan.artifacts() {
        tracing::debug!(
            kind = %plan.kind,
            identifier = %plan.identifier,
            path = %artifact.path.display(),
            ensure = %artifact.ensure,
            owner = %artifact.owner,
            group = %artifact.group,
            mode = %artifact.mode,
            "planned artifact"
        );
    }
}
