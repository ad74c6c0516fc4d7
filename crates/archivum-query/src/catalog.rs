//! Operator catalog.
//!
//! Static tables mapping wire tokens to typed values: query operators,
//! request keys, step modifiers, filter and projection keys, hint tokens and
//! reserved `#` field names. The catalog is read-only and shared by every
//! parser and compiler instance.

use serde::{Deserialize, Serialize};

/// Query operator tokens recognized by the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Exists,
    Missing,
    IsNull,
    And,
    Or,
    Not,
    In,
    Nin,
    Size,
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
    Ne,
    Wildcard,
    Range,
    Term,
    Regex,
    Path,
    Match,
    Mlt,
    Prefix,
    Search,
}

impl Operator {
    /// Every operator, in catalog order
    pub const ALL: [Operator; 24] = [
        Operator::Exists,
        Operator::Missing,
        Operator::IsNull,
        Operator::And,
        Operator::Or,
        Operator::Not,
        Operator::In,
        Operator::Nin,
        Operator::Size,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::Eq,
        Operator::Ne,
        Operator::Wildcard,
        Operator::Range,
        Operator::Term,
        Operator::Regex,
        Operator::Path,
        Operator::Match,
        Operator::Mlt,
        Operator::Prefix,
        Operator::Search,
    ];

    /// Wire token, including the leading `$`
    pub fn token(self) -> &'static str {
        match self {
            Operator::Exists => "$exists",
            Operator::Missing => "$missing",
            Operator::IsNull => "$isNull",
            Operator::And => "$and",
            Operator::Or => "$or",
            Operator::Not => "$not",
            Operator::In => "$in",
            Operator::Nin => "$nin",
            Operator::Size => "$size",
            Operator::Gt => "$gt",
            Operator::Gte => "$gte",
            Operator::Lt => "$lt",
            Operator::Lte => "$lte",
            Operator::Eq => "$eq",
            Operator::Ne => "$ne",
            Operator::Wildcard => "$wildcard",
            Operator::Range => "$range",
            Operator::Term => "$term",
            Operator::Regex => "$regex",
            Operator::Path => "$path",
            Operator::Match => "$match",
            Operator::Mlt => "$mlt",
            Operator::Prefix => "$prefix",
            Operator::Search => "$search",
        }
    }

    /// Look up an operator by wire token
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.token() == token)
    }
}

/// Top-level request keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKey {
    Roots,
    Query,
    Filter,
    Projection,
    Data,
}

impl RequestKey {
    pub const ALL: [RequestKey; 5] = [
        RequestKey::Roots,
        RequestKey::Query,
        RequestKey::Filter,
        RequestKey::Projection,
        RequestKey::Data,
    ];

    pub fn token(self) -> &'static str {
        match self {
            RequestKey::Roots => "$roots",
            RequestKey::Query => "$query",
            RequestKey::Filter => "$filter",
            RequestKey::Projection => "$projection",
            RequestKey::Data => "$data",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.token() == token)
    }
}

/// Step-level depth modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepModifier {
    Depth,
    ExactDepth,
}

impl StepModifier {
    pub fn token(self) -> &'static str {
        match self {
            StepModifier::Depth => "$depth",
            StepModifier::ExactDepth => "$exactdepth",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        [StepModifier::Depth, StepModifier::ExactDepth]
            .into_iter()
            .find(|m| m.token() == token)
    }
}

/// Keys of the `$filter` object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKey {
    Offset,
    Limit,
    Hint,
    OrderBy,
}

impl FilterKey {
    pub fn token(self) -> &'static str {
        match self {
            FilterKey::Offset => "$offset",
            FilterKey::Limit => "$limit",
            FilterKey::Hint => "$hint",
            FilterKey::OrderBy => "$orderby",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        [
            FilterKey::Offset,
            FilterKey::Limit,
            FilterKey::Hint,
            FilterKey::OrderBy,
        ]
        .into_iter()
        .find(|k| k.token() == token)
    }
}

/// Keys of the `$projection` object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectionKey {
    Fields,
    Usage,
}

impl ProjectionKey {
    pub fn token(self) -> &'static str {
        match self {
            ProjectionKey::Fields => "$fields",
            ProjectionKey::Usage => "$usage",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        [ProjectionKey::Fields, ProjectionKey::Usage]
            .into_iter()
            .find(|k| k.token() == token)
    }
}

/// Backend hints carried by `$filter.$hint`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hint {
    Cache,
    NoCache,
    Units,
    ObjectGroups,
}

impl Hint {
    pub fn token(self) -> &'static str {
        match self {
            Hint::Cache => "cache",
            Hint::NoCache => "nocache",
            Hint::Units => "units",
            Hint::ObjectGroups => "objectgroups",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        [Hint::Cache, Hint::NoCache, Hint::Units, Hint::ObjectGroups]
            .into_iter()
            .find(|h| h.token() == token)
    }
}

/// Reserved `#` field names.
///
/// These name system-maintained fields and are translated to backend field
/// names at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReservedField {
    Id,
    All,
    Dua,
    UnitUps,
    AllUnitUps,
    Min,
    Max,
    NbUnits,
    Type,
    ObjectGroup,
    Management,
}

impl ReservedField {
    pub const ALL: [ReservedField; 11] = [
        ReservedField::Id,
        ReservedField::All,
        ReservedField::Dua,
        ReservedField::UnitUps,
        ReservedField::AllUnitUps,
        ReservedField::Min,
        ReservedField::Max,
        ReservedField::NbUnits,
        ReservedField::Type,
        ReservedField::ObjectGroup,
        ReservedField::Management,
    ];

    pub fn token(self) -> &'static str {
        match self {
            ReservedField::Id => "#id",
            ReservedField::All => "#all",
            ReservedField::Dua => "#dua",
            ReservedField::UnitUps => "#unitups",
            ReservedField::AllUnitUps => "#allunitups",
            ReservedField::Min => "#min",
            ReservedField::Max => "#max",
            ReservedField::NbUnits => "#nbunits",
            ReservedField::Type => "#type",
            ReservedField::ObjectGroup => "#object",
            ReservedField::Management => "#management",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.token() == token)
    }

    /// Whether the name may appear in query expressions (`#all` is projection-only)
    pub fn queryable(self) -> bool {
        !matches!(self, ReservedField::All)
    }
}
