use serde::{Deserialize, Serialize};

/// A catalog card joined with the name of the set it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    pub number: String,
    pub set_id: String,
    pub set_name: String,
}

impl CatalogItem {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        number: impl Into<String>,
        set_id: impl Into<String>,
        set_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            number: number.into(),
            set_id: set_id.into(),
            set_name: set_name.into(),
        }
    }
}
