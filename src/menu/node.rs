//! Menu tree building blocks.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum MenuLevel {
    Root,
    Branch,
    Leaf,
}

impl MenuLevel {
    /// The level a direct child of this level must have.
    pub fn child_level(&self) -> Option<MenuLevel> {
        match self {
            MenuLevel::Root => Some(MenuLevel::Branch),
            MenuLevel::Branch => Some(MenuLevel::Leaf),
            MenuLevel::Leaf => None,
        }
    }
}

/// A single DTMF key the menus understand.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Digit {
    #[serde(rename = "1")]
    One,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "4")]
    Four,
}

impl Digit {
    /// Reserved platform-wide for "go back" unless a node overrides it.
    pub const BACK: Digit = Digit::Four;

    /// Accepts exactly one of "1".."4"; anything else (including padded or
    /// multi-key input) is rejected.
    pub fn parse(raw: &str) -> Option<Digit> {
        match raw {
            "1" => Some(Digit::One),
            "2" => Some(Digit::Two),
            "3" => Some(Digit::Three),
            "4" => Some(Digit::Four),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Digit::One => "1",
            Digit::Two => "2",
            Digit::Three => "3",
            Digit::Four => "4",
        }
    }

    pub fn is_back(&self) -> bool {
        *self == Digit::BACK
    }
}

impl fmt::Display for Digit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One point in the navigation tree.
///
/// Two nodes are the same node when their `id` and `level` agree; the prompt
/// text does not take part in equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuNode {
    pub id: String,
    pub level: MenuLevel,
    pub prompt: String,
    pub parent_id: Option<String>,
}

impl MenuNode {
    pub fn root(id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            level: MenuLevel::Root,
            prompt: prompt.into(),
            parent_id: None,
        }
    }

    pub fn child(
        id: impl Into<String>,
        level: MenuLevel,
        prompt: impl Into<String>,
        parent_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            level,
            prompt: prompt.into(),
            parent_id: Some(parent_id.into()),
        }
    }

    pub fn is_root(&self) -> bool {
        self.level == MenuLevel::Root
    }

    pub fn is_leaf(&self) -> bool {
        self.level == MenuLevel::Leaf
    }
}

impl PartialEq for MenuNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.level == other.level
    }
}

impl Eq for MenuNode {}

impl Hash for MenuNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.level.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_parse_accepts_only_single_menu_keys() {
        assert_eq!(Digit::parse("1"), Some(Digit::One));
        assert_eq!(Digit::parse("4"), Some(Digit::Four));
        for raw in ["", "0", "5", "9", "*", "#", "12", " 1", "1 ", "one"] {
            assert_eq!(Digit::parse(raw), None, "{raw:?} should be rejected");
        }
    }

    #[test]
    fn back_key_is_four() {
        assert!(Digit::Four.is_back());
        assert!(!Digit::One.is_back());
    }

    #[test]
    fn node_equality_ignores_prompt() {
        let a = MenuNode::child("SALES", MenuLevel::Branch, "one prompt", "MAIN");
        let b = MenuNode::child("SALES", MenuLevel::Branch, "another prompt", "MAIN");
        let c = MenuNode::child("SALES", MenuLevel::Leaf, "one prompt", "MAIN");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn level_predicates() {
        assert!(MenuNode::root("MAIN", "main").is_root());
        assert!(MenuNode::child("A1", MenuLevel::Leaf, "a1", "A").is_leaf());
        assert!(!MenuNode::child("A", MenuLevel::Branch, "a", "MAIN").is_leaf());
        assert_eq!(MenuLevel::Leaf.child_level(), None);
    }

    #[test]
    fn node_serializes_with_camel_case_fields() {
        let node = MenuNode::child("SALES", MenuLevel::Branch, "Sales", "MAIN");
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["parentId"], "MAIN");
        assert_eq!(json["level"], "branch");
    }
}
