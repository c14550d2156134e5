//! Category model and its stored document shape.

use serde::{Deserialize, Serialize};

/// Placeholder written to `sarga_id` when a category has no external reference.
pub const EXTERNAL_REF_SENTINEL: &str = "NULL";

/// A category as returned to API callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    /// Store-issued revision token, required for updates and deletes
    pub revision: String,
    pub name: String,
    pub slug: String,
    pub order: String,
    pub weight: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_ref: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Caller-supplied descriptive fields of a category.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryFields {
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub order: String,
    #[serde(default)]
    pub weight: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub external_ref: Option<String>,
}

impl CategoryFields {
    /// Trim values and fold empty or sentinel references into `None`.
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            slug: self.slug.trim().to_string(),
            order: self.order.trim().to_string(),
            weight: self.weight.trim().to_string(),
            parent_id: optional(self.parent_id),
            external_ref: optional(self.external_ref)
                .filter(|r| r != EXTERNAL_REF_SENTINEL),
        }
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Request body for creating a new category.
pub type CreateCategoryRequest = CategoryFields;

/// Request body for updating an existing category.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    /// Revision the caller last read
    #[serde(default)]
    pub revision: String,
    /// Creation timestamp carried over from the caller's copy
    #[serde(default)]
    pub created_at: String,
    #[serde(flatten)]
    pub fields: CategoryFields,
}

/// Query parameters for deleting a category.
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteCategoryQuery {
    #[serde(default)]
    pub rev: String,
}

/// Category body as persisted in the document store.
///
/// Field names follow the documents already present in the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryDocument {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub order: String,
    #[serde(default)]
    pub weight: String,
    #[serde(default, with = "empty_as_none")]
    pub parent_id: Option<String>,
    #[serde(rename = "sarga_id", default, with = "sentinel_as_none")]
    pub external_ref: Option<String>,
    #[serde(rename = "createdAt", default)]
    pub created_at: String,
    #[serde(rename = "updatedAt", default)]
    pub updated_at: String,
}

impl CategoryDocument {
    pub fn new(id: &str, fields: CategoryFields, created_at: String, updated_at: String) -> Self {
        Self {
            id: id.to_string(),
            name: fields.name,
            slug: fields.slug,
            order: fields.order,
            weight: fields.weight,
            parent_id: fields.parent_id,
            external_ref: fields.external_ref,
            created_at,
            updated_at,
        }
    }

    pub fn into_category(self, revision: String) -> Category {
        Category {
            id: self.id,
            revision,
            name: self.name,
            slug: self.slug,
            order: self.order,
            weight: self.weight,
            parent_id: self.parent_id,
            external_ref: self.external_ref,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

mod empty_as_none {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(value.as_deref().unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let value = Option::<String>::deserialize(d)?;
        Ok(value.filter(|v| !v.is_empty()))
    }
}

mod sentinel_as_none {
    use super::EXTERNAL_REF_SENTINEL;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(value.as_deref().unwrap_or(EXTERNAL_REF_SENTINEL))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let value = Option::<String>::deserialize(d)?;
        Ok(value.filter(|v| !v.is_empty() && v != EXTERNAL_REF_SENTINEL))
    }
}
