//! Caller identity resolution
//!
//! The engine never reads ambient identity state. The resolver runs once
//! at the operation boundary and the resolved org is threaded through the
//! module functions as an explicit parameter, which keeps the core
//! testable without a transport in the loop.

use crate::{error::Result, types::OrgId};

/// Resolves the calling organization for one invocation
pub trait IdentityResolver: Send + Sync {
    /// Resolve the caller's org; deterministic per invocation
    fn resolve_caller_org(&self) -> Result<OrgId>;
}

/// Fixed identity, for wiring and tests
///
/// Real caller authentication lives in the transport collaborator; this
/// stands in for it wherever the engine is driven directly.
pub struct StaticIdentity {
    org: OrgId,
}

impl StaticIdentity {
    /// Resolver that always answers with `org`
    pub fn new(org: OrgId) -> Self {
        Self { org }
    }
}

impl IdentityResolver for StaticIdentity {
    fn resolve_caller_org(&self) -> Result<OrgId> {
        Ok(self.org.clone())
    }
}
