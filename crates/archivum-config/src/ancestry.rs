//! Ancestry field names
//!
//! Every stored unit carries precomputed ancestry-closure fields maintained
//! by the write path. The compiler targets these fields instead of walking
//! the graph at query time.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, ConfigResult};

/// Document field names holding identity and ancestry closure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AncestryFields {
    /// Entity identifier
    #[serde(default = "default_id")]
    pub id: String,

    /// Direct parents
    #[serde(default = "default_parents")]
    pub parents: String,

    /// All transitive ancestors
    #[serde(default = "default_ancestors")]
    pub ancestors: String,

    /// Minimum hop distance from a top-level root
    #[serde(default = "default_min_depth")]
    pub min_depth: String,

    /// Maximum hop distance from a top-level root
    #[serde(default = "default_max_depth")]
    pub max_depth: String,
}

fn default_id() -> String {
    "_id".to_string()
}

fn default_parents() -> String {
    "_up".to_string()
}

fn default_ancestors() -> String {
    "_us".to_string()
}

fn default_min_depth() -> String {
    "_min".to_string()
}

fn default_max_depth() -> String {
    "_max".to_string()
}

impl Default for AncestryFields {
    fn default() -> Self {
        Self {
            id: default_id(),
            parents: default_parents(),
            ancestors: default_ancestors(),
            min_depth: default_min_depth(),
            max_depth: default_max_depth(),
        }
    }
}

impl AncestryFields {
    fn roles(&self) -> [(&'static str, &str); 5] {
        [
            ("id", &self.id),
            ("parents", &self.parents),
            ("ancestors", &self.ancestors),
            ("min_depth", &self.min_depth),
            ("max_depth", &self.max_depth),
        ]
    }

    /// Reject empty or shared field names
    pub fn validate(&self) -> ConfigResult<()> {
        let roles = self.roles();
        for (role, field) in roles {
            if field.trim().is_empty() {
                return Err(ConfigError::EmptyField(role));
            }
        }
        for (i, &(first, field)) in roles.iter().enumerate() {
            if let Some(&(second, _)) = roles[i + 1..].iter().find(|&&(_, other)| other == field) {
                return Err(ConfigError::DuplicateField {
                    first,
                    second,
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }
}
