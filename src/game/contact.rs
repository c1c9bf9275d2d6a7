//! Contact tracking.
//!
//! Physics reports the fixtures overlapping *now*. Gameplay wants edges:
//! an item is collected when the contact begins, damage is retried every
//! step the contact continues, water splashes when it ends.

use std::collections::BTreeMap;
use super::physics::{Contact, FixtureRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactPhase {
    Begin,
    Continue,
    End,
}

#[derive(Debug, Default)]
pub struct ContactTracker {
    active: BTreeMap<(FixtureRef, FixtureRef), Contact>,
}

impl ContactTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diff this step's contacts against the previous step's.
    /// Ended contacts are reported last.
    pub fn update(&mut self, contacts: Vec<Contact>) -> Vec<(ContactPhase, Contact)> {
        let mut next = BTreeMap::new();
        let mut out = Vec::with_capacity(contacts.len());

        for contact in contacts {
            let key = contact.key();
            let phase = if self.active.remove(&key).is_some() {
                ContactPhase::Continue
            } else {
                ContactPhase::Begin
            };
            out.push((phase, contact));
            next.insert(key, contact);
        }

        for (_, stale) in std::mem::replace(&mut self.active, next) {
            out.push((ContactPhase::End, stale));
        }
        out
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entity::Entity;
    use crate::game::physics::FixtureType;

    fn contact(a: u32, b: u32) -> Contact {
        Contact {
            a: FixtureRef { entity: Entity::new(a, 0), index: 0 },
            a_kind: FixtureType::Body,
            b: FixtureRef { entity: Entity::new(b, 0), index: 0 },
            b_kind: FixtureType::Item,
        }
    }

    #[test]
    fn test_begin_continue_end() {
        let mut tracker = ContactTracker::new();

        let phases: Vec<_> = tracker.update(vec![contact(0, 1)]).into_iter().map(|(p, _)| p).collect();
        assert_eq!(phases, vec![ContactPhase::Begin]);

        let phases: Vec<_> = tracker.update(vec![contact(0, 1), contact(0, 2)]).into_iter().map(|(p, _)| p).collect();
        assert_eq!(phases, vec![ContactPhase::Continue, ContactPhase::Begin]);

        let out = tracker.update(vec![contact(0, 2)]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].0, ContactPhase::End);
        assert_eq!(out[1].1.b.entity, Entity::new(1, 0));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_order_of_fixtures_does_not_matter() {
        let mut tracker = ContactTracker::new();
        tracker.update(vec![contact(3, 4)]);
        let mut flipped = contact(3, 4);
        std::mem::swap(&mut flipped.a, &mut flipped.b);
        std::mem::swap(&mut flipped.a_kind, &mut flipped.b_kind);
        let out = tracker.update(vec![flipped]);
        assert_eq!(out, vec![(ContactPhase::Continue, flipped)]);
    }
}
