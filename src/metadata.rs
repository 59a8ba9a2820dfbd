use serde::{Deserialize, Deserializer, Serialize};

use crate::models::lenient_text;
use crate::utils::non_empty;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    City,
    Style,
    Type,
    Venue,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogEntry {
    #[serde(deserialize_with = "lenient_text")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub label: Option<String>,
    pub emoji: Option<String>,
    pub address: Option<String>,
}

impl CatalogEntry {
    /// `name` wins over `label`; cities and venues use the former, types the latter.
    pub fn display_name(&self) -> Option<&str> {
        non_empty(self.name.as_deref()).or_else(|| non_empty(self.label.as_deref()))
    }

    pub fn emoji(&self) -> Option<&str> {
        non_empty(self.emoji.as_deref())
    }

    pub fn address(&self) -> Option<&str> {
        non_empty(self.address.as_deref())
    }
}

/// Lookup tables from the metadata feed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    #[serde(deserialize_with = "nullable_table")]
    pub cities: Vec<CatalogEntry>,
    #[serde(deserialize_with = "nullable_table")]
    pub styles: Vec<CatalogEntry>,
    #[serde(deserialize_with = "nullable_table")]
    pub types: Vec<CatalogEntry>,
    #[serde(deserialize_with = "nullable_table")]
    pub venues: Vec<CatalogEntry>,
}

/// A `null` table reads as an empty one.
fn nullable_table<'de, D>(deserializer: D) -> Result<Vec<CatalogEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<CatalogEntry>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Catalog {
    pub fn entries(&self, category: Category) -> &[CatalogEntry] {
        match category {
            Category::City => &self.cities,
            Category::Style => &self.styles,
            Category::Type => &self.types,
            Category::Venue => &self.venues,
        }
    }

    /// First entry whose id matches exactly.
    pub fn resolve(&self, category: Category, id: &str) -> Option<&CatalogEntry> {
        self.entries(category)
            .iter()
            .find(|entry| entry.id.as_deref() == Some(id))
    }
}

/// Resolution against an optional catalog; a miss is `None`, never an error.
pub fn resolve<'a>(
    catalog: Option<&'a Catalog>,
    category: Category,
    id: Option<&str>,
) -> Option<&'a CatalogEntry> {
    let id = id?;
    catalog?.resolve(category, id)
}
