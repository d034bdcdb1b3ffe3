//! Declared field constraints and the providers that turn them into generators.
//!
//! At most one provider may claim a node's primary constraint. It supplies the
//! base generator; every provider may then refine it.
use serde::Deserialize;

use crate::generator::{
    Alphabet, GeneratorBody, GeneratorSpec, IntGenerator, StringGenerator, TemporalGenerator, TemporalKind,
    TemporalRange,
};
use crate::node::{Node, TargetClass};
use crate::settings::Settings;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    NotNull,
    NotBlank,
    Size { min: Option<usize>, max: Option<usize> },
    Length { min: Option<usize>, max: Option<usize> },
    Min(f64),
    Max(f64),
    Positive,
    Negative,
    Email,
    Past,
    Future,
    Digits { integer: usize },
}

pub trait ConstraintProvider {
    fn name(&self) -> &'static str;

    /// Whether this provider owns one of the node's constraints as its
    /// primary constraint.
    fn is_primary(&self, node: &Node) -> bool;

    /// Base generator for a node this provider claimed.
    fn resolve_generator(&self, node: &Node, settings: &Settings) -> Option<GeneratorSpec>;

    /// Adjust an already-selected generator to the node's constraints.
    fn refine(&self, node: &Node, spec: &mut GeneratorSpec);
}

/// Email, digit strings and past/future temporals.
#[derive(Debug, Default)]
pub struct FormatConstraints;

/// Sizes, lengths, numeric bounds and nullability.
#[derive(Debug, Default)]
pub struct BoundsConstraints;

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Constraint {
    fn is_format(&self) -> bool {
        matches!(self, Constraint::Email | Constraint::Past | Constraint::Future | Constraint::Digits { .. })
    }
}

pub fn has_not_null(node: &Node) -> bool {
    node.constraints.iter().any(|c| matches!(c, Constraint::NotNull))
}

impl ConstraintProvider for FormatConstraints {
    fn name(&self) -> &'static str {
        "format"
    }

    fn is_primary(&self, node: &Node) -> bool {
        node.constraints.iter().any(Constraint::is_format)
    }

    fn resolve_generator(&self, node: &Node, settings: &Settings) -> Option<GeneratorSpec> {
        let primary = node.constraints.iter().find(|c| c.is_format())?;
        let spec: GeneratorSpec = match (primary, &node.target) {
            (Constraint::Email, _) => StringGenerator::new(settings.string_min_length, settings.string_max_length)
                .alphabet(Alphabet::Email)
                .into(),
            (Constraint::Digits { integer }, TargetClass::Int(_)) => {
                let digits = (*integer).clamp(1, 18) as u32;
                let low = if digits == 1 { 0 } else { 10i64.pow(digits - 1) };
                IntGenerator::new(low, 10i64.pow(digits) - 1).into()
            }
            (Constraint::Digits { integer }, _) => StringGenerator::new(*integer, *integer)
                .alphabet(Alphabet::Digits)
                .into(),
            (Constraint::Past | Constraint::Future, target) => {
                let kind = match target {
                    TargetClass::DateTime => TemporalKind::DateTime,
                    _ => TemporalKind::Date,
                };
                let range = match primary {
                    Constraint::Past => TemporalRange::Past,
                    _ => TemporalRange::Future,
                };
                TemporalGenerator::new(kind, settings.temporal_range_days).range(range).into()
            }
            _ => return None,
        };
        Some(spec)
    }

    fn refine(&self, _node: &Node, _spec: &mut GeneratorSpec) {}
}

impl ConstraintProvider for BoundsConstraints {
    fn name(&self) -> &'static str {
        "bounds"
    }

    fn is_primary(&self, _node: &Node) -> bool {
        false
    }

    fn resolve_generator(&self, _node: &Node, _settings: &Settings) -> Option<GeneratorSpec> {
        None
    }

    fn refine(&self, node: &Node, spec: &mut GeneratorSpec) {
        for constraint in &node.constraints {
            match constraint {
                Constraint::NotNull => spec.set_nullable(false),
                Constraint::NotBlank => {
                    if let GeneratorBody::String(s) = spec.body_mut() {
                        s.set_length(Some(s.min_length.max(1)), None);
                    }
                }
                Constraint::Size { min, max } | Constraint::Length { min, max } => match spec.body_mut() {
                    GeneratorBody::String(s) => s.set_length(*min, *max),
                    GeneratorBody::Collection(c) => c.set_size(*min, *max),
                    GeneratorBody::Map(m) => m.set_size(*min, *max),
                    GeneratorBody::Array(a) => a.set_length(*min, *max),
                    _ => {}
                },
                Constraint::Min(min) => match spec.body_mut() {
                    GeneratorBody::Int(g) => g.set_min(min.ceil() as i64),
                    GeneratorBody::Float(g) => g.set_min(*min),
                    _ => {}
                },
                Constraint::Max(max) => match spec.body_mut() {
                    GeneratorBody::Int(g) => g.set_max(max.floor() as i64),
                    GeneratorBody::Float(g) => g.set_max(*max),
                    _ => {}
                },
                Constraint::Positive => match spec.body_mut() {
                    GeneratorBody::Int(g) => g.set_min(g.min.max(1)),
                    GeneratorBody::Float(g) => g.set_min(g.min.max(f64::EPSILON)),
                    _ => {}
                },
                Constraint::Negative => match spec.body_mut() {
                    GeneratorBody::Int(g) => g.set_max(g.max.min(-1)),
                    GeneratorBody::Float(g) => g.set_max(g.max.min(-f64::EPSILON)),
                    _ => {}
                },
                Constraint::Email | Constraint::Past | Constraint::Future | Constraint::Digits { .. } => {}
            }
        }
    }
}

/// The default, ordered provider list.
pub fn default_providers() -> Vec<Box<dyn ConstraintProvider>> {
    vec![Box::new(FormatConstraints), Box::new(BoundsConstraints)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{CollectionGenerator, FloatGenerator};
    use crate::node::tests::{class, field};
    use crate::node::{ClassDecls, IntKind, NodeTree, TypeExpr};

    fn node_with(target: TypeExpr, constraints: Vec<Constraint>) -> NodeTree {
        let mut classes = ClassDecls::new();
        let mut f = field("x", target);
        f.constraints = constraints;
        classes.insert("Pojo".into(), vec![f]);
        NodeTree::build(&class("Pojo"), &classes, 5).unwrap()
    }

    fn field_node(tree: &NodeTree) -> &Node {
        tree.node(tree.node(tree.root()).children[0])
    }

    #[test]
    fn constraints_deserialize_from_json() {
        let cs: Vec<Constraint> =
            serde_json::from_str(r#"["not_null", {"size": {"min": 1, "max": 2}}, {"min": 5}, {"digits": {"integer": 4}}]"#)
                .unwrap();
        assert_eq!(cs[0], Constraint::NotNull);
        assert_eq!(cs[1], Constraint::Size { min: Some(1), max: Some(2) });
        assert_eq!(cs[2], Constraint::Min(5.0));
        assert_eq!(cs[3], Constraint::Digits { integer: 4 });
    }

    #[test]
    fn digits_on_int_field_bounds_the_range() {
        let tree = node_with(TypeExpr::Scalar(TargetClass::Int(IntKind::I64)), vec![Constraint::Digits { integer: 3 }]);
        let node = field_node(&tree);
        assert!(FormatConstraints.is_primary(node));
        let spec = FormatConstraints.resolve_generator(node, &Settings::default()).unwrap();
        let GeneratorBody::Int(g) = spec.body() else { panic!("int generator") };
        assert_eq!((g.min, g.max), (100, 999));
    }

    #[test]
    fn bounds_refine_numbers_and_sizes() {
        let tree = node_with(
            TypeExpr::Scalar(TargetClass::Float(crate::node::FloatKind::F64)),
            vec![Constraint::Min(2.0), Constraint::Max(3.0), Constraint::NotNull],
        );
        let node = field_node(&tree);
        let mut spec = GeneratorSpec::from(FloatGenerator::new(0.0, 100.0)).nullable(true);
        BoundsConstraints.refine(node, &mut spec);
        let GeneratorBody::Float(g) = spec.body() else { panic!("float generator") };
        assert_eq!((g.min, g.max), (2.0, 3.0));
        assert!(!spec.is_nullable());

        let tree = node_with(
            TypeExpr::List(Box::new(TypeExpr::Scalar(TargetClass::Bool))),
            vec![Constraint::Size { min: Some(7), max: None }],
        );
        let mut spec = GeneratorSpec::from(CollectionGenerator::new(Some(TargetClass::List), 2, 6));
        BoundsConstraints.refine(field_node(&tree), &mut spec);
        let GeneratorBody::Collection(c) = spec.body() else { panic!("collection generator") };
        assert_eq!((c.min_size, c.max_size), (7, 7));
    }
}
