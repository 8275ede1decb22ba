use super::Right;

/// Outcome of reconciling a desired right-set against the persisted one.
///
/// The three lists are disjoint; an unchanged right appears in none of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortedRights {
    pub rights_to_create: Vec<Right>,
    pub rights_to_update: Vec<Right>,
    pub rights_to_delete: Vec<Right>,
}

impl SortedRights {
    /// Every desired right is new.
    pub fn create_all(rights: Vec<Right>) -> Self {
        Self {
            rights_to_create: rights,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rights_to_create.is_empty()
            && self.rights_to_update.is_empty()
            && self.rights_to_delete.is_empty()
    }
}
