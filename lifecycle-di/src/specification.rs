//! Capability identifiers and dependency trace entries

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Specification under which the container exposes itself
pub const CONTAINER_SPECIFICATION: &str = "container";

/// Scope used when a request does not name one
pub const DEFAULT_SCOPE: &str = "default";

/// Capability identifier a component is requested by
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Specification(Arc<str>);

impl Specification {
    pub fn new(name: impl AsRef<str>) -> Self {
        Specification(Arc::from(name.as_ref()))
    }

    /// The specification of the container's own bootstrap component
    pub fn container() -> Self {
        Specification::new(CONTAINER_SPECIFICATION)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Specification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Specification {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Specification {
    fn from(name: &str) -> Self {
        Specification::new(name)
    }
}

impl From<String> for Specification {
    fn from(name: String) -> Self {
        Specification(Arc::from(name))
    }
}

impl From<&Specification> for Specification {
    fn from(specification: &Specification) -> Self {
        specification.clone()
    }
}

/// One hop of a requester chain, as reported by cycle errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    pub specification: Specification,
    pub scope_id: String,
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.specification, self.scope_id)
    }
}

/// Render a chain as `a[default] -> b[default] -> a[default]`
pub(crate) fn format_chain(chain: &[TraceEntry]) -> String {
    chain
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}
