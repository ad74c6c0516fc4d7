//! Depth resolution.
//!
//! Maps a step's `DepthSpec` onto a `DepthScope`: which ancestry field the
//! step's working set is matched against, and how the executor has to
//! expand the working set before binding it.

use archivum_config::AncestryFields;
use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};
use crate::ir::DepthSpec;

/// Graph scope of one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum DepthScope {
    /// Direct children of the working set
    Children,
    /// Descendants of the working set, between 1 and `hops` levels down
    Descendants { hops: u32 },
    /// Ancestors of the working set, between 1 and `hops` levels up
    Ancestors { hops: u32 },
    /// Descendants of the working set whose distance from the top lies
    /// within `[_min, _max]`
    Exact { depth: u32 },
}

/// What the executor does to the working set before binding a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "expansion", rename_all = "snake_case")]
pub enum WorkingSetExpansion {
    /// Bind the ids as they are
    None,
    /// Keep the ids and add their descendants up to `hops` levels down
    Descendants { hops: u32 },
    /// Replace the ids by their ancestors up to `hops` levels up
    Ancestors { hops: u32 },
}

impl DepthScope {
    /// Ancestry field the expanded working set is matched against.
    ///
    /// Downward scopes match the parents field: once the working set holds
    /// every node up to `hops - 1` levels down, their children are exactly
    /// the nodes 1 to `hops` levels down.
    pub fn target_field<'a>(&self, fields: &'a AncestryFields) -> &'a str {
        match self {
            DepthScope::Children | DepthScope::Descendants { .. } => &fields.parents,
            DepthScope::Exact { .. } => &fields.ancestors,
            DepthScope::Ancestors { .. } => &fields.id,
        }
    }

    pub fn expansion(&self) -> WorkingSetExpansion {
        match *self {
            DepthScope::Descendants { hops } if hops > 1 => {
                WorkingSetExpansion::Descendants { hops: hops - 1 }
            }
            DepthScope::Ancestors { hops } => WorkingSetExpansion::Ancestors { hops },
            _ => WorkingSetExpansion::None,
        }
    }
}

/// Resolve a depth annotation.
///
/// `$depth: 0` and negative `$exactdepth` values have no meaning and are
/// rejected as malformed. The parser already refuses them; steps built by
/// hand go through the same check here.
pub fn resolve(spec: DepthSpec) -> QueryResult<DepthScope> {
    validate(spec)?;
    Ok(match spec {
        DepthSpec::Relative(1) => DepthScope::Children,
        DepthSpec::Relative(n) if n > 0 => DepthScope::Descendants {
            hops: n.unsigned_abs(),
        },
        DepthSpec::Relative(n) => DepthScope::Ancestors {
            hops: n.unsigned_abs(),
        },
        DepthSpec::Exact(n) => DepthScope::Exact {
            depth: n.unsigned_abs(),
        },
    })
}

/// Reject depth values that name no scope
pub fn validate(spec: DepthSpec) -> QueryResult<()> {
    match spec {
        DepthSpec::Relative(0) => Err(QueryError::malformed("$depth cannot be 0")),
        DepthSpec::Exact(n) if n < 0 => Err(QueryError::malformed(format!(
            "$exactdepth cannot be negative, got {}",
            n
        ))),
        _ => Ok(()),
    }
}
