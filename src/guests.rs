// Guest List Controller
// Owns the positional guest slots of one session

use crate::form::{YesNo, MAX_GUEST_AGE};

/// One rendered guest row. Slots are positional, not stable identities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuestSlot {
    pub name: String,
    pub age: u8,
}

/// Guest rows of the current session.
///
/// `count()` is always the number of contiguous slots; there is no separate
/// counter that could drift away from the stored values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuestList {
    slots: Vec<GuestSlot>,
}

impl GuestList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[GuestSlot] {
        &self.slots
    }

    pub fn get(&self, index: usize) -> Option<&GuestSlot> {
        self.slots.get(index)
    }

    /// Append an empty slot. No upper bound.
    pub fn add(&mut self) {
        self.slots.push(GuestSlot::default());
    }

    /// Drop the highest slot together with its values.
    /// Returns the discarded slot, `None` when there was nothing to remove.
    pub fn remove(&mut self) -> Option<GuestSlot> {
        self.slots.pop()
    }

    /// Purge every slot when the has-guests answer goes from yes to no.
    /// Returns true if a purge happened.
    pub fn reset_on_flag_change(&mut self, previous: YesNo, current: YesNo) -> bool {
        if previous == YesNo::Yes && current == YesNo::No {
            self.slots.clear();
            true
        } else {
            false
        }
    }

    /// Returns false for indices outside the current rows (stale input).
    pub fn set_name(&mut self, index: usize, name: impl Into<String>) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) => {
                slot.name = name.into();
                true
            }
            None => false,
        }
    }

    pub fn set_age(&mut self, index: usize, age: u8) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) => {
                slot.age = age.min(MAX_GUEST_AGE);
                true
            }
            None => false,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_then_remove_counts() {
        for (adds, removes) in [(0, 0), (1, 1), (3, 1), (5, 5), (4, 2)] {
            let mut guests = GuestList::new();
            for _ in 0..adds {
                guests.add();
            }
            for _ in 0..removes {
                guests.remove();
            }
            assert_eq!(guests.count(), adds - removes, "{adds} adds, {removes} removes");
        }
    }

    #[test]
    fn test_remove_on_empty_is_noop() {
        let mut guests = GuestList::new();

        assert!(guests.remove().is_none());
        assert!(guests.remove().is_none());
        assert_eq!(guests.count(), 0);
    }

    #[test]
    fn test_remove_discards_only_last_slot_values() {
        let mut guests = GuestList::new();
        guests.add();
        guests.add();
        guests.set_name(0, "Ayşe");
        guests.set_name(1, "Mehmet");
        guests.set_age(1, 9);

        let removed = guests.remove().unwrap();
        assert_eq!(removed.name, "Mehmet");
        assert_eq!(guests.get(0).unwrap().name, "Ayşe");

        // Re-adding reuses the position with fresh values
        guests.add();
        assert_eq!(guests.get(1), Some(&GuestSlot::default()));
    }

    #[test]
    fn test_yes_to_no_purges_all_slots() {
        let mut guests = GuestList::new();
        for i in 0..4 {
            guests.add();
            guests.set_name(i, format!("misafir {i}"));
        }

        assert!(guests.reset_on_flag_change(YesNo::Yes, YesNo::No));
        assert_eq!(guests.count(), 0);
        assert!(guests.get(0).is_none());
    }

    #[test]
    fn test_other_transitions_keep_slots() {
        let mut guests = GuestList::new();
        guests.add();
        guests.set_name(0, "Ali");

        assert!(!guests.reset_on_flag_change(YesNo::Yes, YesNo::Yes));
        assert!(!guests.reset_on_flag_change(YesNo::No, YesNo::Yes));
        assert!(!guests.reset_on_flag_change(YesNo::No, YesNo::No));
        assert_eq!(guests.count(), 1);
    }

    #[test]
    fn test_stale_indices_are_ignored() {
        let mut guests = GuestList::new();
        guests.add();

        assert!(!guests.set_name(3, "Kimse"));
        assert!(!guests.set_age(1, 4));
        assert_eq!(guests.count(), 1);
    }

    #[test]
    fn test_guest_age_is_capped() {
        let mut guests = GuestList::new();
        guests.add();
        guests.set_age(0, 200);

        assert_eq!(guests.get(0).unwrap().age, 120);
    }
}
