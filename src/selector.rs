//! Addressing nodes by class, field or root.
//!
//! Syntax: `<root>`, `Person` (any node of that class), `Person.name` (field
//! `name` declared by `Person`), `.name` (field `name` of any class), and
//! `a | b` for a set of alternatives.
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::error::FixtureError;
use crate::node::{Node, NodeTree};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Selector {
    Root,
    Type(String),
    Field { declaring: Option<String>, name: String },
    Any(Vec<Selector>),
}

static SELECTOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<class>[A-Za-z_][A-Za-z0-9_]*)?(?:\.(?P<field>[A-Za-z_][A-Za-z0-9_]*))?$")
        .expect("selector regex")
});

impl Selector {
    pub fn parse(src: &str) -> Result<Self, FixtureError> {
        let parts: Vec<&str> = src.split('|').map(str::trim).collect();
        if parts.len() > 1 {
            let alternatives = parts
                .into_iter()
                .map(Self::parse_one)
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Selector::Any(alternatives));
        }
        Self::parse_one(src.trim())
    }

    fn parse_one(src: &str) -> Result<Self, FixtureError> {
        if src == "<root>" {
            return Ok(Selector::Root);
        }
        let caps = SELECTOR_RE
            .captures(src)
            .filter(|_| !src.is_empty())
            .ok_or_else(|| FixtureError::config(format!("invalid selector '{src}'")))?;
        let class = caps.name("class").map(|m| m.as_str().to_string());
        match caps.name("field") {
            Some(field) => Ok(Selector::Field { declaring: class, name: field.as_str().to_string() }),
            None => match class {
                Some(class) => Ok(Selector::Type(class)),
                None => Err(FixtureError::config(format!("invalid selector '{src}'"))),
            },
        }
    }

    pub fn field(declaring: &str, name: &str) -> Self {
        Selector::Field { declaring: Some(declaring.to_string()), name: name.to_string() }
    }

    pub fn any_field(name: &str) -> Self {
        Selector::Field { declaring: None, name: name.to_string() }
    }

    pub fn of_type(name: &str) -> Self {
        Selector::Type(name.to_string())
    }

    pub fn matches(&self, tree: &NodeTree, node: &Node) -> bool {
        match self {
            Selector::Root => node.id == tree.root(),
            Selector::Type(name) => node.target.name() == *name,
            Selector::Field { declaring, name } => {
                node.field.as_deref() == Some(name.as_str())
                    && declaring
                        .as_ref()
                        .is_none_or(|d| node.declaring_class.as_deref() == Some(d.as_str()))
            }
            Selector::Any(alternatives) => alternatives.iter().any(|s| s.matches(tree, node)),
        }
    }
}

impl TryFrom<String> for Selector {
    type Error = FixtureError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Selector::parse(&value)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Root => write!(f, "<root>"),
            Selector::Type(name) => write!(f, "{name}"),
            Selector::Field { declaring: Some(class), name } => write!(f, "{class}.{name}"),
            Selector::Field { declaring: None, name } => write!(f, ".{name}"),
            Selector::Any(alternatives) => {
                for (i, s) in alternatives.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{s}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::tests::{class, parent_child_classes};

    #[test]
    fn parses_all_forms() {
        assert_eq!(Selector::parse("<root>").unwrap(), Selector::Root);
        assert_eq!(Selector::parse("Person").unwrap(), Selector::of_type("Person"));
        assert_eq!(Selector::parse("Person.name").unwrap(), Selector::field("Person", "name"));
        assert_eq!(Selector::parse(".name").unwrap(), Selector::any_field("name"));
        assert_eq!(
            Selector::parse("A.x | .y").unwrap(),
            Selector::Any(vec![Selector::field("A", "x"), Selector::any_field("y")])
        );
        assert!(Selector::parse("").is_err());
        assert!(Selector::parse("a.b.c").is_err());
    }

    #[test]
    fn display_round_trips_syntax() {
        let s = Selector::parse("A.x | .y | B | <root>").unwrap();
        assert_eq!(s.to_string(), "A.x | .y | B | <root>");
    }

    #[test]
    fn matches_fields_by_declaring_class() {
        let tree = NodeTree::build(&class("Parent"), &parent_child_classes(), 10).unwrap();
        let child = tree.node(tree.root()).children[0];
        let name = tree.node(tree.node(child).children[1]);
        assert!(Selector::field("Child", "name").matches(&tree, name));
        assert!(Selector::any_field("name").matches(&tree, name));
        assert!(!Selector::field("Parent", "name").matches(&tree, name));
        assert!(Selector::of_type("String").matches(&tree, name));
        assert!(Selector::Root.matches(&tree, tree.node(tree.root())));
        assert!(!Selector::Root.matches(&tree, name));
    }
}
