//! Category model

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A named tag applicable to multiple notes.
///
/// Ids are assigned by the server; names are unique among categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// Raw category shape as received on the wire.
///
/// Every field is optional so that shape mismatches are caught here and
/// reported as `Error::Protocol` instead of leaking into the view-model.
#[derive(Debug, Deserialize)]
pub struct CategoryPayload {
    id: Option<i64>,
    name: Option<String>,
}

impl TryFrom<CategoryPayload> for Category {
    type Error = Error;

    fn try_from(value: CategoryPayload) -> Result<Self, Error> {
        let id = value
            .id
            .ok_or_else(|| Error::Protocol("category missing id".to_string()))?;
        let name = value
            .name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| Error::Protocol(format!("category {id} missing name")))?;

        Ok(Self { id, name })
    }
}
