use super::raster::{BACKGROUND, LabelId};
use crate::utils::color::{Rgb, default_label_color};

/// Highest assignable label id; ids live in `1..=MAX_LABELS`.
pub const MAX_LABELS: usize = 20;

/// Name and display color of one label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelMeta {
    pub name: String,
    pub color: Rgb,
}

/// Fixed-capacity slot table mapping label ids to their metadata.
///
/// Slot `i` holds label id `i + 1`. New labels always take the smallest free
/// id, so deleting a label makes its id available again.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelRegistry {
    slots: [Option<LabelMeta>; MAX_LABELS],
    active: Option<LabelId>,
}

impl LabelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(id: LabelId) -> Option<usize> {
        let idx = id as usize;
        (idx >= 1 && idx <= MAX_LABELS).then(|| idx - 1)
    }

    /// Smallest unused id, if any slot is free.
    pub fn next_free_id(&self) -> Option<LabelId> {
        self.slots
            .iter()
            .position(Option::is_none)
            .map(|idx| (idx + 1) as LabelId)
    }

    /// Register a new label with the default palette color for its id.
    pub fn create(&mut self, name: impl Into<String>) -> Option<LabelId> {
        let id = self.next_free_id()?;
        self.insert(id, name, default_label_color(id));
        Some(id)
    }

    /// Register a new label with an explicit color.
    pub fn create_with_color(&mut self, name: impl Into<String>, color: Rgb) -> Option<LabelId> {
        let id = self.next_free_id()?;
        self.insert(id, name, color);
        Some(id)
    }

    /// Place a label at a specific id, replacing whatever was there.
    /// Returns `false` for ids outside `1..=MAX_LABELS`.
    pub fn insert(&mut self, id: LabelId, name: impl Into<String>, color: Rgb) -> bool {
        match Self::slot(id) {
            Some(idx) => {
                self.slots[idx] = Some(LabelMeta {
                    name: name.into(),
                    color,
                });
                true
            }
            None => false,
        }
    }

    /// Free an id. Clears the active label if it was the one removed.
    pub fn remove(&mut self, id: LabelId) -> Option<LabelMeta> {
        let idx = Self::slot(id)?;
        let removed = self.slots[idx].take();
        if removed.is_some() && self.active == Some(id) {
            self.active = None;
        }
        removed
    }

    pub fn get(&self, id: LabelId) -> Option<&LabelMeta> {
        Self::slot(id).and_then(|idx| self.slots[idx].as_ref())
    }

    pub fn contains(&self, id: LabelId) -> bool {
        self.get(id).is_some()
    }

    pub fn color(&self, id: LabelId) -> Option<Rgb> {
        self.get(id).map(|m| m.color)
    }

    pub fn name(&self, id: LabelId) -> Option<&str> {
        self.get(id).map(|m| m.name.as_str())
    }

    pub fn active(&self) -> Option<LabelId> {
        self.active
    }

    /// Make `id` the target of paint and region tools. Unknown ids are rejected.
    pub fn set_active(&mut self, id: Option<LabelId>) -> bool {
        match id {
            Some(id) if !self.contains(id) => false,
            _ => {
                self.active = id;
                true
            }
        }
    }

    /// Registered labels in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (LabelId, &LabelMeta)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|m| ((idx + 1) as LabelId, m)))
    }

    pub fn ids(&self) -> Vec<LabelId> {
        self.iter().map(|(id, _)| id).collect()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.next_free_id().is_none()
    }

    pub fn clear(&mut self) {
        self.slots = Default::default();
        self.active = None;
    }

    /// 256-entry RGB palette indexed by label id; unused entries and id 0 are black.
    pub fn palette(&self) -> [Rgb; 256] {
        let mut palette = [[0u8; 3]; 256];
        for (id, meta) in self.iter() {
            if id != BACKGROUND {
                palette[id as usize] = meta.color;
            }
        }
        palette
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deleted_ids_are_reused_smallest_first() {
        let mut reg = LabelRegistry::new();
        assert_eq!(reg.create("a"), Some(1));
        assert_eq!(reg.create("b"), Some(2));
        assert_eq!(reg.create("c"), Some(3));
        assert!(reg.remove(2).is_some());
        assert_eq!(reg.create("d"), Some(2));
        assert_eq!(reg.create("e"), Some(4));
    }

    #[test]
    fn capacity_is_structural() {
        let mut reg = LabelRegistry::new();
        for i in 0..MAX_LABELS {
            assert_eq!(reg.create(format!("l{i}")), Some((i + 1) as LabelId));
        }
        assert!(reg.is_full());
        assert_eq!(reg.create("overflow"), None);
        assert_eq!(reg.len(), MAX_LABELS);
    }

    #[test]
    fn background_and_out_of_range_ids_are_rejected() {
        let mut reg = LabelRegistry::new();
        assert!(!reg.insert(0, "bg", [0, 0, 0]));
        assert!(!reg.insert(21, "too big", [0, 0, 0]));
        assert!(reg.insert(20, "last", [1, 2, 3]));
        assert_eq!(reg.color(20), Some([1, 2, 3]));
    }

    #[test]
    fn removing_active_label_clears_selection() {
        let mut reg = LabelRegistry::new();
        let id = reg.create("cell").unwrap();
        assert!(reg.set_active(Some(id)));
        reg.remove(id);
        assert_eq!(reg.active(), None);
        assert!(!reg.set_active(Some(id)));
    }

    #[test]
    fn new_labels_use_the_palette() {
        let mut reg = LabelRegistry::new();
        let id = reg.create("x").unwrap();
        assert_eq!(reg.color(id), Some([255, 0, 0]));
        assert_eq!(reg.palette()[id as usize], [255, 0, 0]);
        assert_eq!(reg.palette()[0], [0, 0, 0]);
    }
}
