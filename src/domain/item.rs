use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A work item on a stage: a stable identity plus a caller-owned payload.
///
/// The engine only ever compares ids; it never looks inside `data`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StageItem<T> {
    pub id: Uuid,
    pub data: T,
}

impl<T> StageItem<T> {
    pub fn new(data: T) -> Self {
        Self {
            id: Uuid::new_v4(),
            data,
        }
    }

    pub fn with_id(id: Uuid, data: T) -> Self {
        Self { id, data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_item_gets_unique_id() {
        let a = StageItem::new("a");
        let b = StageItem::new("b");
        assert_ne!(a.id, b.id);
        assert_eq!(a.data, "a");
    }

    #[test]
    fn test_with_id_keeps_id() {
        let id = Uuid::new_v4();
        let item = StageItem::with_id(id, 7);
        assert_eq!(item.id, id);
        assert_eq!(item.data, 7);
    }
}
