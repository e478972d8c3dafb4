//! Deduplicated, first-seen ordered participant roster.
//!
//! Rosters hold conference participants, so they stay small; every operation is a
//! linear scan. Missing ids are never an error: presence checks guard every
//! mutation.

use common::types::Participant;
use tracing::debug;

/// Which branch `Roster::upsert` took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The participant was unknown and has been appended.
    Inserted,
    /// An entry with the same id already exists; nothing changed.
    AlreadyPresent,
    /// The participant has no usable identity and was ignored.
    Rejected,
}

/// Ordered participant collection with unique ids.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    entries: Vec<Participant>,
}

impl Roster {
    /// Create an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of participants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Participants in first-seen order.
    #[must_use]
    pub fn participants(&self) -> &[Participant] {
        &self.entries
    }

    /// Owned copy of the participants, for snapshot pushes.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Participant> {
        self.entries.clone()
    }

    /// Back-fill from a late list: append unknown ids, never overwrite known ones.
    pub fn merge<I>(&mut self, incoming: I)
    where
        I: IntoIterator<Item = Participant>,
    {
        for participant in incoming {
            let _ = self.upsert(participant);
        }
    }

    /// Append the participant unless its id is already known.
    ///
    /// An existing entry is left untouched; callers that hold newer data apply it
    /// with [`Roster::update`].
    pub fn upsert(&mut self, participant: Participant) -> UpsertOutcome {
        if !participant.has_identity() {
            debug!(target: "oc.roster", "Ignoring participant without identity");
            return UpsertOutcome::Rejected;
        }

        if self.contains(&participant.id) {
            return UpsertOutcome::AlreadyPresent;
        }

        self.entries.push(participant);
        UpsertOutcome::Inserted
    }

    /// Apply a newer description of a known participant in place.
    ///
    /// Returns `false` if the id is unknown.
    pub fn update(&mut self, participant: &Participant) -> bool {
        match self.find_by_id_mut(&participant.id) {
            Some(existing) => {
                existing.apply_update(participant);
                true
            }
            None => false,
        }
    }

    /// Remove every entry carrying `id`. Returns how many were removed.
    pub fn remove(&mut self, id: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|p| p.id != id);
        let removed = before - self.entries.len();

        if removed > 1 {
            debug!(
                target: "oc.roster",
                participant_id = %id,
                removed,
                "Removed duplicate roster entries"
            );
        }

        removed
    }

    /// Look a participant up by id.
    #[must_use]
    pub fn find_by_id(&self, id: &str) -> Option<&Participant> {
        self.entries.iter().find(|p| p.id == id)
    }

    /// Mutable lookup by id.
    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut Participant> {
        self.entries.iter_mut().find(|p| p.id == id)
    }

    /// Whether an entry with `id` exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.find_by_id(id).is_some()
    }

    /// Whether anyone other than `local_id` is on air.
    #[must_use]
    pub fn has_remote_on_air(&self, local_id: Option<&str>) -> bool {
        self.entries
            .iter()
            .any(|p| p.is_on_air() && Some(p.id.as_str()) != local_id)
    }

    /// Drop every participant.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use common::types::ConferenceStatus;

    fn ids(roster: &Roster) -> Vec<&str> {
        roster.participants().iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut roster = Roster::new();
        let alice = Participant::new("alice");

        roster.merge(vec![alice.clone()]);
        roster.merge(vec![alice]);

        assert_eq!(ids(&roster), vec!["alice"]);
    }

    #[test]
    fn test_merge_preserves_first_seen_order() {
        let mut roster = Roster::new();

        roster.merge(vec![Participant::new("p1"), Participant::new("p2")]);
        roster.merge(vec![Participant::new("p2"), Participant::new("p3")]);

        assert_eq!(ids(&roster), vec!["p1", "p2", "p3"]);
    }

    #[test]
    fn test_merge_never_overwrites_existing_fields() {
        let mut roster = Roster::new();
        roster.merge(vec![Participant::new("alice")
            .with_name("Alice")
            .with_status(ConferenceStatus::OnAir)]);

        roster.merge(vec![Participant::new("alice")
            .with_name("Someone else")
            .with_status(ConferenceStatus::Invited)]);

        let alice = roster.find_by_id("alice").unwrap();
        assert_eq!(alice.name.as_deref(), Some("Alice"));
        assert_eq!(alice.status, ConferenceStatus::OnAir);
    }

    #[test]
    fn test_upsert_reports_branch() {
        let mut roster = Roster::new();

        assert_eq!(
            roster.upsert(Participant::new("alice")),
            UpsertOutcome::Inserted
        );
        assert_eq!(
            roster.upsert(Participant::new("alice").with_status(ConferenceStatus::OnAir)),
            UpsertOutcome::AlreadyPresent
        );
        assert_eq!(roster.upsert(Participant::new("")), UpsertOutcome::Rejected);

        assert_eq!(roster.len(), 1);
        // Upsert alone never rewrites the stored entry
        assert_eq!(
            roster.find_by_id("alice").unwrap().status,
            ConferenceStatus::Invited
        );
    }

    #[test]
    fn test_update_applies_in_place() {
        let mut roster = Roster::new();
        roster.merge(vec![Participant::new("alice"), Participant::new("bob")]);

        assert!(roster.update(&Participant::new("bob").with_status(ConferenceStatus::OnAir)));
        assert!(!roster.update(&Participant::new("carol")));

        assert_eq!(ids(&roster), vec!["alice", "bob"]);
        assert_eq!(roster.participants()[1].status, ConferenceStatus::OnAir);
    }

    #[test]
    fn test_remove_absent_id_is_noop() {
        let mut roster = Roster::new();
        roster.merge(vec![Participant::new("alice")]);

        assert_eq!(roster.remove("nobody"), 0);
        assert_eq!(ids(&roster), vec!["alice"]);
    }

    #[test]
    fn test_remove_drops_all_matching_entries() {
        // Duplicates should never exist; inject them directly to check tolerance
        let mut roster = Roster {
            entries: vec![
                Participant::new("alice"),
                Participant::new("bob"),
                Participant::new("alice"),
            ],
        };

        assert_eq!(roster.remove("alice"), 2);
        assert_eq!(ids(&roster), vec!["bob"]);
    }

    #[test]
    fn test_has_remote_on_air_ignores_local_user() {
        let mut roster = Roster::new();
        roster.merge(vec![
            Participant::new("me").with_status(ConferenceStatus::OnAir),
            Participant::new("bob").with_status(ConferenceStatus::Invited),
        ]);

        assert!(!roster.has_remote_on_air(Some("me")));
        assert!(roster.has_remote_on_air(None));

        roster.update(&Participant::new("bob").with_status(ConferenceStatus::OnAir));
        assert!(roster.has_remote_on_air(Some("me")));
    }
}
