//! Reserved field translation.

use archivum_config::AncestryFields;

use crate::catalog::ReservedField;

/// Maps query field names to stored document field names.
///
/// Plain names pass through unchanged. Reserved `#` names resolve to system
/// fields; the ancestry ones follow the configured `AncestryFields`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMapper {
    ancestry: AncestryFields,
}

impl FieldMapper {
    pub fn new(ancestry: AncestryFields) -> Self {
        Self { ancestry }
    }

    pub fn ancestry(&self) -> &AncestryFields {
        &self.ancestry
    }

    /// Stored name for `name`.
    ///
    /// Returns `None` for `#all`, which names no single field.
    pub fn map<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        let Some(reserved) = ReservedField::from_token(name) else {
            return Some(name);
        };
        let mapped = match reserved {
            ReservedField::All => return None,
            ReservedField::Id => self.ancestry.id.as_str(),
            ReservedField::UnitUps => self.ancestry.parents.as_str(),
            ReservedField::AllUnitUps => self.ancestry.ancestors.as_str(),
            ReservedField::Min => self.ancestry.min_depth.as_str(),
            ReservedField::Max => self.ancestry.max_depth.as_str(),
            ReservedField::Dua => "_dua",
            ReservedField::NbUnits => "_nbc",
            ReservedField::Type => "_type",
            ReservedField::ObjectGroup => "_og",
            ReservedField::Management => "_mgt",
        };
        Some(mapped)
    }

    /// Stored name for a field used in a query expression or a sort key
    pub(crate) fn query_field(&self, name: &str) -> String {
        self.map(name).unwrap_or(name).to_string()
    }
}
