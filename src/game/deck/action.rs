//! Queued structural deck edits.
//!
//! While a round is in progress teammates may edit the shared deck
//! concurrently; edits are queued as actions and merged once per
//! synchronization point instead of being applied immediately.

use super::card::Card;

/// One editable card attribute, in fixed priority order. When two changes
/// target the same card in one batch, higher-priority attributes apply first
/// so the final card reflects every distinct intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CardField {
    Suit,
    Rank,
    Enhancement,
    Edition,
    Seal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeckActionKind {
    Add,
    Remove,
    Change { field: CardField, value: String },
}

/// A pending edit, stamped with its queue position.
#[derive(Debug, Clone)]
pub struct DeckAction {
    pub kind: DeckActionKind,
    /// The card this action targets; removals and changes match
    /// structurally against the current deck.
    pub card: Card,
    /// Insertion timestamp: later actions win same-priority ties.
    pub seq: u64,
}

impl DeckAction {
    /// Two actions are duplicates when they express the same edit,
    /// regardless of when they were issued.
    pub fn same_intent(&self, other: &Self) -> bool {
        self.kind == other.kind && self.card == other.card
    }

    /// Sort key for the merge pass. Changes apply first (by field
    /// priority), then additions, then removals — so an add-then-remove
    /// batch ends without the card, and a remove always beats a change.
    /// The sort is stable, which keeps queue order within equal keys.
    pub fn apply_order(&self) -> (u8, u8) {
        match &self.kind {
            DeckActionKind::Change { field, .. } => (0, *field as u8),
            DeckActionKind::Add => (1, 0),
            DeckActionKind::Remove => (2, 0),
        }
    }
}
