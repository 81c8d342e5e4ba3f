use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier for a dynamic actor.
///
/// Ids are allocated monotonically by the entity registry, so they are
/// reproducible for a given seed and serialize as plain integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl EntityId {
    /// The id following this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_ordering_follows_allocation() {
        let a = EntityId(1);
        let b = a.next();
        assert!(a < b);
        assert_eq!(b, EntityId(2));
    }
}
