use super::types::SortKey;
use crate::database::collection::Collection;

pub struct FilterOrder;

impl FilterOrder {
    /// Render an ORDER BY clause, dropping keys that do not name a visible column.
    /// When nothing survives, newest first by the collection's creation column.
    pub fn generate(keys: &[SortKey], collection: Collection) -> String {
        let mut parts: Vec<String> = keys
            .iter()
            .filter(|key| collection.visible_column(&key.field).is_some())
            .map(|key| format!("\"{}\" {}", key.field, key.direction.to_sql()))
            .collect();

        if parts.is_empty() {
            parts.push(format!("\"{}\" DESC", collection.created_column()));
        }
        // id as the final tiebreaker keeps page windows stable
        format!("ORDER BY {}, \"id\" ASC", parts.join(", "))
    }
}
