//! Permission checks applied to every component request

use crate::error::{DiError, DiResult};
use crate::specification::Specification;
use rustc_hash::FxHashSet;

/// A request as seen by the security chain
#[derive(Debug, Clone, Copy)]
pub struct PermissionRequest<'a> {
    /// Specification of the requesting component (`container` for direct requests)
    pub requester: &'a Specification,
    pub target: &'a Specification,
    pub scope_id: &'a str,
}

impl PermissionRequest<'_> {
    /// Build the error a policy returns to veto this request
    pub fn deny(&self, reason: impl Into<String>) -> DiError {
        DiError::PermissionDenied {
            requester: self.requester.clone(),
            target: self.target.clone(),
            scope_id: self.scope_id.to_string(),
            reason: reason.into(),
        }
    }
}

/// Decides whether one component may request another
pub trait SecurityPolicy: Send + Sync {
    fn check_permission(&self, request: &PermissionRequest<'_>) -> DiResult<()>;
}

impl<F> SecurityPolicy for F
where
    F: Fn(&PermissionRequest<'_>) -> DiResult<()> + Send + Sync,
{
    fn check_permission(&self, request: &PermissionRequest<'_>) -> DiResult<()> {
        self(request)
    }
}

/// Policy that permits everything
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl SecurityPolicy for AllowAll {
    fn check_permission(&self, _request: &PermissionRequest<'_>) -> DiResult<()> {
        Ok(())
    }
}

/// Policy rejecting listed targets, either for every requester or for one
#[derive(Debug, Default, Clone)]
pub struct DenyList {
    targets: FxHashSet<Specification>,
    pairs: FxHashSet<(Specification, Specification)>,
}

impl DenyList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nobody may request `target`
    pub fn deny(mut self, target: impl Into<Specification>) -> Self {
        self.targets.insert(target.into());
        self
    }

    /// `requester` may not request `target`
    pub fn deny_from(
        mut self,
        requester: impl Into<Specification>,
        target: impl Into<Specification>,
    ) -> Self {
        self.pairs.insert((requester.into(), target.into()));
        self
    }
}

impl SecurityPolicy for DenyList {
    fn check_permission(&self, request: &PermissionRequest<'_>) -> DiResult<()> {
        if self.targets.contains(request.target) {
            return Err(request.deny("target is denied"));
        }
        if self
            .pairs
            .contains(&(request.requester.clone(), request.target.clone()))
        {
            return Err(request.deny("requester may not access target"));
        }
        Ok(())
    }
}
