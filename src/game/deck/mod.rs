//! Shared team deck with merge semantics for concurrent edits.
//!
//! The deck is an ordered card collection plus a queue of pending
//! [`DeckAction`]s. The merge is a deliberate "last consistent intent wins"
//! policy, not operational transform or a CRDT — edits normally originate
//! from one active session at a time, so best-effort resolution is enough.

pub mod action;
pub mod card;

pub use action::{CardField, DeckAction, DeckActionKind};
pub use card::{Card, ParseCardError};

use card::normalize_rank;

#[derive(Debug, Clone, Default)]
pub struct Deck {
    cards: Vec<Card>,
    pending: Vec<DeckAction>,
    next_seq: u64,
}

impl Deck {
    /// Parse a `|`-joined card list.
    pub fn from_wire(s: &str) -> Result<Self, ParseCardError> {
        let cards = s
            .split('|')
            .filter(|part| !part.is_empty())
            .map(Card::from_wire)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            cards,
            pending: Vec::new(),
            next_seq: 0,
        })
    }

    pub fn to_wire(&self) -> String {
        let parts: Vec<String> = self.cards.iter().map(Card::to_string).collect();
        parts.join("|")
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn queue_add(&mut self, card: Card) {
        self.queue(DeckActionKind::Add, card);
    }

    pub fn queue_remove(&mut self, card: Card) {
        self.queue(DeckActionKind::Remove, card);
    }

    pub fn queue_change(&mut self, card: Card, field: CardField, value: String) {
        self.queue(DeckActionKind::Change { field, value }, card);
    }

    fn queue(&mut self, kind: DeckActionKind, card: Card) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(DeckAction { kind, card, seq });
    }

    /// Merge the pending queue into the card list.
    ///
    /// 1. Drop exact duplicate actions (first occurrence kept).
    /// 2. Stable-sort by apply order: attribute changes (field priority),
    ///    then additions, then removals; ties keep queue order so the most
    ///    recently issued edit lands last.
    /// 3. Apply sequentially; an action whose target no longer exists is
    ///    silently skipped.
    /// 4. Clear the queue.
    pub fn merge_pending(&mut self) {
        let actions = std::mem::take(&mut self.pending);

        let mut unique: Vec<DeckAction> = Vec::with_capacity(actions.len());
        for action in actions {
            if !unique.iter().any(|kept| kept.same_intent(&action)) {
                unique.push(action);
            }
        }
        unique.sort_by_key(DeckAction::apply_order);

        for action in unique {
            self.apply(action);
        }
    }

    fn apply(&mut self, action: DeckAction) {
        match action.kind {
            DeckActionKind::Add => self.cards.push(action.card),
            DeckActionKind::Remove => {
                if let Some(index) = self.find(&action.card) {
                    self.cards.remove(index);
                }
            }
            DeckActionKind::Change { field, value } => {
                let Some(index) = self.find(&action.card) else {
                    return;
                };
                let card = &mut self.cards[index];
                match field {
                    CardField::Suit => {
                        if let Some(suit) = value.chars().next() {
                            card.suit = suit;
                        }
                    }
                    CardField::Rank => {
                        if let Some(rank) = normalize_rank(&value) {
                            card.rank = rank;
                        }
                    }
                    CardField::Enhancement => card.enhancement = value,
                    CardField::Edition => card.edition = value,
                    CardField::Seal => card.seal = value,
                }
            }
        }
    }

    fn find(&self, card: &Card) -> Option<usize> {
        self.cards.iter().position(|c| c == card)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn card(s: &str) -> Card {
        Card::from_wire(s).unwrap()
    }

    fn deck() -> Deck {
        Deck::from_wire("S-A-none-none-none|H-T-none-foil-none").unwrap()
    }

    #[test]
    fn wire_form_round_trips() {
        let deck = deck();
        assert_eq!(deck.to_wire(), "S-A-none-none-none|H-T-none-foil-none");
        let reparsed = Deck::from_wire(&deck.to_wire()).unwrap();
        assert_eq!(reparsed.cards(), deck.cards());
    }

    #[test]
    fn add_then_remove_excludes_the_card_in_either_submission_order() {
        let extra = card("D-7-none-none-none");

        let mut first = deck();
        first.queue_add(extra.clone());
        first.queue_remove(extra.clone());
        first.merge_pending();
        assert!(!first.cards().contains(&extra));

        let mut second = deck();
        second.queue_remove(extra.clone());
        second.queue_add(extra.clone());
        second.merge_pending();
        assert!(!second.cards().contains(&extra));
    }

    #[test]
    fn later_change_to_the_same_attribute_wins() {
        let target = card("S-A-none-none-none");
        let mut deck = deck();
        deck.queue_change(target.clone(), CardField::Seal, "gold".into());
        deck.queue_change(target.clone(), CardField::Seal, "red".into());
        deck.merge_pending();
        assert_eq!(deck.cards()[0].seal, "red");
    }

    #[test]
    fn remove_beats_change_regardless_of_submission_order() {
        let target = card("S-A-none-none-none");

        let mut first = deck();
        first.queue_change(target.clone(), CardField::Edition, "holo".into());
        first.queue_remove(target.clone());
        first.merge_pending();
        assert_eq!(first.cards().len(), 1);

        let mut second = deck();
        second.queue_remove(target.clone());
        second.queue_change(target.clone(), CardField::Edition, "holo".into());
        second.merge_pending();
        assert_eq!(second.cards().len(), 1);
    }

    #[test]
    fn exact_duplicates_collapse_to_one_application() {
        let extra = card("C-2-none-none-none");
        let mut deck = deck();
        deck.queue_add(extra.clone());
        deck.queue_add(extra.clone());
        deck.merge_pending();
        let copies = deck.cards().iter().filter(|c| **c == extra).count();
        assert_eq!(copies, 1);
    }

    #[test]
    fn changes_to_missing_cards_are_silently_skipped() {
        let ghost = card("D-3-none-none-none");
        let mut deck = deck();
        deck.queue_change(ghost, CardField::Suit, "Hearts".into());
        deck.merge_pending();
        assert_eq!(deck.cards().len(), 2);
    }

    #[test]
    fn rank_change_to_ten_normalizes() {
        let target = card("S-A-none-none-none");
        let mut deck = deck();
        deck.queue_change(target, CardField::Rank, "10".into());
        deck.merge_pending();
        assert_eq!(deck.cards()[0].rank, 'T');
    }

    #[test]
    fn attribute_change_rewrites_the_tuple_later_changes_match_against() {
        let target = card("S-A-none-none-none");
        let mut deck = deck();
        deck.queue_change(target.clone(), CardField::Seal, "blue".into());
        deck.queue_change(target.clone(), CardField::Suit, "D".into());
        deck.merge_pending();
        // The suit change applies first (higher field priority) and rewrites
        // the card, so the seal change no longer finds its target and is
        // skipped as stale.
        assert_eq!(deck.cards()[0].suit, 'D');
        assert_eq!(deck.cards()[0].seal, "none");
    }

    #[test]
    fn merge_clears_the_queue() {
        let mut deck = deck();
        deck.queue_add(card("C-9-none-none-none"));
        deck.merge_pending();
        assert!(!deck.has_pending());
    }
}
