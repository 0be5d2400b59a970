//! Flat `key:value` records.
//!
//! A [`Fields`] is an ordered list of string entries — the decoded form of
//! one wire message (or one sub-list element). Parsing keeps raw values;
//! typed accessors coerce on demand. A field literally named `score` always
//! parses through [`ExtendedScore`], never numeric coercion.

use std::fmt::Display;

use crate::game::score::ExtendedScore;
use crate::protocol::escape::unescape;
use crate::protocol::ProtocolError;

/// Separator between `key:value` entries in a top-level message.
pub const ENTRY_SEPARATOR: char = ',';
/// Separator between key and value in a top-level message.
pub const KEY_VALUE_SEPARATOR: char = ':';
/// Separator joining sub-list elements.
pub const LIST_SEPARATOR: char = '|';
/// Separator between entries of one sub-list element.
pub const LIST_ENTRY_SEPARATOR: char = '-';
/// Separator between key and value within a sub-list element.
pub const LIST_KEY_VALUE_SEPARATOR: char = '>';

/// An ordered flat record of string fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Fields {
    entries: Vec<(String, String)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// A record carrying only the kind discriminator.
    pub fn action(name: &str) -> Self {
        let mut fields = Self::new();
        fields.push("action", name);
        fields
    }

    /// Append a field. Values are written with their `Display` form.
    pub fn push(&mut self, key: &str, value: impl Display) -> &mut Self {
        self.entries.push((key.to_string(), value.to_string()));
        self
    }

    /// Append a field only when the value is present; absent fields are
    /// omitted on serialize.
    pub fn push_opt(&mut self, key: &str, value: Option<impl Display>) -> &mut Self {
        if let Some(value) = value {
            self.push(key, value);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Serialize with the top-level separators.
    pub fn serialize(&self) -> String {
        self.serialize_with(ENTRY_SEPARATOR, KEY_VALUE_SEPARATOR)
    }

    /// Serialize one sub-list element with the alternate separators.
    pub fn serialize_list_element(&self) -> String {
        self.serialize_with(LIST_ENTRY_SEPARATOR, LIST_KEY_VALUE_SEPARATOR)
    }

    fn serialize_with(&self, entry_sep: char, kv_sep: char) -> String {
        let parts: Vec<String> = self
            .entries
            .iter()
            .map(|(key, value)| format!("{key}{kv_sep}{value}"))
            .collect();
        parts.join(&entry_sep.to_string())
    }

    /// Parse one line with the top-level separators.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        Self::parse_with(line, ENTRY_SEPARATOR, KEY_VALUE_SEPARATOR)
    }

    /// Parse one sub-list element with the alternate separators.
    pub fn parse_list_element(element: &str) -> Result<Self, ProtocolError> {
        Self::parse_with(element, LIST_ENTRY_SEPARATOR, LIST_KEY_VALUE_SEPARATOR)
    }

    fn parse_with(line: &str, entry_sep: char, kv_sep: char) -> Result<Self, ProtocolError> {
        if line.is_empty() {
            return Err(ProtocolError::Empty);
        }
        let mut fields = Self::new();
        for part in line.split(entry_sep) {
            // Values are escaped, so the first separator is the split point.
            let (key, value) = part.split_once(kv_sep).unwrap_or((part, ""));
            fields.push(key, value);
        }
        Ok(fields)
    }

    /// The kind discriminator, if present.
    pub fn kind(&self) -> Option<&str> {
        self.get("action")
    }

    /// Raw value of a field.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Required raw string field.
    pub fn str(&self, key: &'static str) -> Result<&str, ProtocolError> {
        self.get(key).ok_or(ProtocolError::MissingField(key))
    }

    /// Required untrusted text field, unescaped after parsing.
    pub fn text(&self, key: &'static str) -> Result<String, ProtocolError> {
        Ok(unescape(self.str(key)?))
    }

    pub fn u32(&self, key: &'static str) -> Result<u32, ProtocolError> {
        self.parse_field(key)
    }

    pub fn i64(&self, key: &'static str) -> Result<i64, ProtocolError> {
        self.parse_field(key)
    }

    pub fn bool(&self, key: &'static str) -> Result<bool, ProtocolError> {
        match self.str(key)? {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(ProtocolError::InvalidField {
                field: key,
                value: other.to_string(),
            }),
        }
    }

    /// Score-typed field: always the extended parser, never numeric coercion.
    pub fn score(&self, key: &'static str) -> Result<ExtendedScore, ProtocolError> {
        let raw = self.str(key)?;
        raw.parse()
            .map_err(|_| ProtocolError::InvalidScore(raw.to_string()))
    }

    fn parse_field<T: std::str::FromStr>(&self, key: &'static str) -> Result<T, ProtocolError> {
        let raw = self.str(key)?;
        raw.parse().map_err(|_| ProtocolError::InvalidField {
            field: key,
            value: raw.to_string(),
        })
    }
}

/// Join serialized sub-list elements into one list-valued field.
pub fn join_list(elements: &[String]) -> String {
    elements.join(&LIST_SEPARATOR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn serializes_in_insertion_order() {
        let mut fields = Fields::action("enemyInfo");
        fields.push("playerId", "abc").push("lives", 3u32);
        assert_eq!(fields.serialize(), "action:enemyInfo,playerId:abc,lives:3");
    }

    #[test]
    fn omits_absent_fields() {
        let mut fields = Fields::action("startGame");
        fields.push("deck", "d_standard");
        fields.push_opt("seed", None::<&str>);
        assert_eq!(fields.serialize(), "action:startGame,deck:d_standard");
    }

    #[test]
    fn round_trips_records_without_reserved_characters() {
        let mut fields = Fields::action("playHand");
        fields
            .push("score", "e1.5e308")
            .push("handsLeft", 2u32)
            .push("ready", true);
        let parsed = Fields::parse(&fields.serialize()).unwrap();
        assert_eq!(parsed, fields);
    }

    #[test]
    fn round_trips_list_elements_with_alternate_separators() {
        let mut element = Fields::new();
        element
            .push("id", "p1")
            .push("username", "Guest")
            .push("isHost", true);
        let wire = element.serialize_list_element();
        assert_eq!(wire, "id>p1-username>Guest-isHost>true");
        assert_eq!(Fields::parse_list_element(&wire).unwrap(), element);
    }

    #[test]
    fn score_fields_use_the_extended_parser() {
        let fields = Fields::parse("action:playHand,score:ee2.5e12").unwrap();
        let score = fields.score("score").unwrap();
        assert_eq!(score, ExtendedScore::new(2, 2.5, 12));
        // Numeric coercion would have failed on the tier markers.
        assert!(fields.u32("score").is_err());
    }

    #[test]
    fn rejects_empty_lines() {
        assert_eq!(Fields::parse(""), Err(ProtocolError::Empty));
    }

    #[test]
    fn value_truncation_is_impossible_for_escaped_text() {
        // An unescaped colon in a value would split wrong; the escape layer
        // guarantees it never reaches serialization.
        let fields = Fields::parse("action:username,username:a{b}b").unwrap();
        assert_eq!(fields.text("username").unwrap(), "a:b");
    }
}
