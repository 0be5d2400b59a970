//! Playing cards as they travel on the wire.
//!
//! A card serializes as `suit-rank-enhancement-edition-seal`. Suits and ranks
//! are single characters (rank 10 is `T`); there is no separate card id —
//! cards match structurally on the full tuple.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("malformed card `{0}`")]
pub struct ParseCardError(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub suit: char,
    pub rank: char,
    pub enhancement: String,
    pub edition: String,
    pub seal: String,
}

impl Card {
    /// Parse the `suit-rank-enhancement-edition-seal` wire form.
    pub fn from_wire(s: &str) -> Result<Self, ParseCardError> {
        let parts: Vec<&str> = s.split('-').collect();
        let [suit, rank, enhancement, edition, seal] = parts[..] else {
            return Err(ParseCardError(s.to_string()));
        };
        let suit = suit.chars().next().ok_or_else(|| ParseCardError(s.to_string()))?;
        let rank = normalize_rank(rank).ok_or_else(|| ParseCardError(s.to_string()))?;
        Ok(Self {
            suit,
            rank,
            enhancement: enhancement.to_string(),
            edition: edition.to_string(),
            seal: seal.to_string(),
        })
    }
}

/// Rank 10 is the only multi-character rank; it normalizes to `T`.
pub fn normalize_rank(raw: &str) -> Option<char> {
    if raw == "10" {
        Some('T')
    } else {
        raw.chars().next()
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}-{}",
            self.suit, self.rank, self.enhancement, self.edition, self.seal
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_and_prints_the_wire_form() {
        let card = Card::from_wire("Hearts-King-none-foil-none").unwrap();
        assert_eq!(card.suit, 'H');
        assert_eq!(card.rank, 'K');
        assert_eq!(card.to_string(), "H-K-none-foil-none");
    }

    #[test]
    fn rank_ten_normalizes_to_t() {
        let card = Card::from_wire("S-10-none-none-gold").unwrap();
        assert_eq!(card.rank, 'T');
    }

    #[test]
    fn rejects_wrong_arity() {
        assert!(Card::from_wire("S-A-none-none").is_err());
        assert!(Card::from_wire("S-A-none-none-gold-extra").is_err());
        assert!(Card::from_wire("").is_err());
    }
}
