//! Bounded sequences of values.
//!
//! An [`EmitGenerator`] hands out its items in order. Its cursor lives in the
//! engine's [`EmitHelper`] (one per population call), keyed by generator id,
//! so every node the generator is selected for draws from the same sequence.
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::debug;

use crate::error::{BoxError, FixtureError};
use crate::hints::Hints;
use crate::node::{Node, NodeId};
use crate::random::Random;
use crate::result::GeneratorResult;
use crate::value::Value;

use super::{Generator, GeneratorKind};

/// What to do once every item has been emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhenEmpty {
    EmitNull,
    /// Defer to ordinary generation.
    EmitRandom,
    /// Start over from the first item.
    Recycle,
    #[default]
    Throw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EmitId(u64);

#[derive(Debug, Clone, PartialEq)]
pub struct EmitGenerator {
    id: EmitId,
    items: Vec<Value>,
    when_empty: WhenEmpty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    HasMore,
    Producing,
    Exhausted,
}

#[derive(Debug)]
struct Cursor {
    next: usize,
    phase: Phase,
}

#[derive(Debug, Default)]
pub struct EmitHelper {
    cursors: HashMap<EmitId, Cursor>,
    history: IndexMap<EmitId, IndexMap<NodeId, (String, Vec<Value>)>>,
}

static NEXT_EMIT_ID: AtomicU64 = AtomicU64::new(1);

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl EmitGenerator {
    pub fn new(items: Vec<Value>, when_empty: WhenEmpty) -> Self {
        Self { id: EmitId(NEXT_EMIT_ID.fetch_add(1, Ordering::Relaxed)), items, when_empty }
    }

    pub fn id(&self) -> EmitId {
        self.id
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn when_empty(&self) -> WhenEmpty {
        self.when_empty
    }
}

impl Generator for EmitGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Emit
    }

    fn generate(&self, _random: &mut Random) -> Result<Value, BoxError> {
        Err(Box::new(FixtureError::internal(
            "emit generators are stateful and must be driven through the engine",
        )))
    }
}

impl EmitHelper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next item for `node`. `hints` are attached to a produced value.
    pub fn next(
        &mut self,
        generator: &EmitGenerator,
        node: &Node,
        hints: Hints,
    ) -> Result<GeneratorResult, FixtureError> {
        let items = generator.items();
        if items.is_empty() && generator.when_empty == WhenEmpty::Recycle {
            return Err(FixtureError::usage(format!(
                "emit() generator for {} is set to recycle but has no items",
                node.display()
            )));
        }

        let cursor = self
            .cursors
            .entry(generator.id)
            .or_insert(Cursor { next: 0, phase: Phase::HasMore });

        if cursor.next >= items.len() {
            if generator.when_empty == WhenEmpty::Recycle {
                cursor.next = 0;
            } else {
                cursor.phase = Phase::Exhausted;
            }
        }

        if cursor.phase == Phase::Exhausted {
            debug!(node = %node.display(), policy = ?generator.when_empty, "emit sequence exhausted");
            return match generator.when_empty {
                WhenEmpty::EmitNull => Ok(GeneratorResult::Null),
                WhenEmpty::EmitRandom => Ok(GeneratorResult::Empty),
                WhenEmpty::Throw | WhenEmpty::Recycle => Err(self.exhausted_error(generator, node)),
            };
        }

        let item = items[cursor.next].clone();
        cursor.next += 1;
        cursor.phase = Phase::Producing;

        self.history
            .entry(generator.id)
            .or_default()
            .entry(node.id)
            .or_insert_with(|| (node.display(), Vec::new()))
            .1
            .push(item.clone());

        Ok(match item {
            Value::Null => GeneratorResult::Null,
            value => GeneratorResult::normal(value, hints),
        })
    }

    fn exhausted_error(&self, generator: &EmitGenerator, node: &Node) -> FixtureError {
        let mut report = format!(
            "no item is available to emit for {} ({} item(s) were provided)\n\n\
             The values emitted so far:\n",
            node.display(),
            generator.items().len()
        );
        if let Some(per_node) = self.history.get(&generator.id) {
            for (display, values) in per_node.values() {
                let values: Vec<String> = values.iter().map(Value::to_string).collect();
                report.push_str(&format!("\n -> Node: {display}\n    Values: [{}]\n", values.join(", ")));
            }
        }
        report.push_str(
            "\nTo resolve this, provide more items, or set `when_empty` to \
             `emit_null`, `emit_random` or `recycle`.",
        );
        FixtureError::SequenceExhausted { report }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::tests::{class, field, string};
    use crate::node::{ClassDecls, NodeTree};

    fn tree() -> NodeTree {
        let mut classes = ClassDecls::new();
        classes.insert("Pojo".into(), vec![field("a", string()), field("b", string())]);
        NodeTree::build(&class("Pojo"), &classes, 5).unwrap()
    }

    fn items() -> Vec<Value> {
        vec![Value::str("x"), Value::str("y"), Value::str("z")]
    }

    #[test]
    fn emits_in_order_then_null() {
        let tree = tree();
        let node = tree.node(tree.node(tree.root()).children[0]);
        let g = EmitGenerator::new(items(), WhenEmpty::EmitNull);
        let mut helper = EmitHelper::new();
        for expected in ["x", "y", "z"] {
            let r = helper.next(&g, node, Hints::new()).unwrap();
            assert_eq!(r.value(), Some(&Value::str(expected)));
        }
        for _ in 0..3 {
            assert!(helper.next(&g, node, Hints::new()).unwrap().is_null());
        }
    }

    #[test]
    fn throw_policy_reports_history() {
        let tree = tree();
        let a = tree.node(tree.node(tree.root()).children[0]);
        let b = tree.node(tree.node(tree.root()).children[1]);
        let g = EmitGenerator::new(items(), WhenEmpty::Throw);
        let mut helper = EmitHelper::new();
        helper.next(&g, a, Hints::new()).unwrap();
        helper.next(&g, b, Hints::new()).unwrap();
        helper.next(&g, a, Hints::new()).unwrap();
        let err = helper.next(&g, b, Hints::new()).unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, FixtureError::SequenceExhausted { .. }));
        assert!(msg.contains("Values: [x, z]"));
        assert!(msg.contains("Values: [y]"));
        assert!(msg.contains("<1:Pojo: String a>"));
        assert!(msg.contains("<1:Pojo: String b>"));
    }

    #[test]
    fn recycle_never_exhausts() {
        let tree = tree();
        let node = tree.node(tree.root());
        let g = EmitGenerator::new(vec![Value::Int(1), Value::Int(2)], WhenEmpty::Recycle);
        let mut helper = EmitHelper::new();
        let got: Vec<Value> = (0..5)
            .map(|_| helper.next(&g, node, Hints::new()).unwrap().value().cloned().unwrap())
            .collect();
        assert_eq!(got, [1, 2, 1, 2, 1].map(Value::Int).to_vec());
    }

    #[test]
    fn emit_random_defers_and_recycle_needs_items() {
        let tree = tree();
        let node = tree.node(tree.root());
        let mut helper = EmitHelper::new();
        let g = EmitGenerator::new(vec![], WhenEmpty::EmitRandom);
        assert!(helper.next(&g, node, Hints::new()).unwrap().is_empty());
        let g = EmitGenerator::new(vec![], WhenEmpty::Recycle);
        assert!(helper.next(&g, node, Hints::new()).unwrap_err().is_recoverable_usage());
    }

    #[test]
    fn null_items_produce_null_results() {
        let tree = tree();
        let node = tree.node(tree.root());
        let mut helper = EmitHelper::new();
        let g = EmitGenerator::new(vec![Value::Null, Value::Int(1)], WhenEmpty::Throw);
        assert!(helper.next(&g, node, Hints::new()).unwrap().is_null());
        assert!(helper.next(&g, node, Hints::new()).unwrap().is_normal());
    }
}
