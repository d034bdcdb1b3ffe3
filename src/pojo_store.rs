//! Back-references for cyclic nodes.
//!
//! Records the object instance materialized for each node, so that a cyclic
//! node can be resolved to its nearest ancestor of the same class instead of
//! a fresh instance. Lives for one population call.
use indexmap::IndexMap;
use tracing::debug;

use crate::hints::Hints;
use crate::node::{Node, NodeId, NodeTree};
use crate::result::GeneratorResult;
use crate::value::{InstanceId, ObjectRef, Value};

/// Instances in production order, keyed by identity. An instance stays
/// attributed to the node that first produced it, even when a cyclic node
/// reuses it later.
#[derive(Debug)]
pub struct GeneratedPojoStore {
    enabled: bool,
    instances: IndexMap<InstanceId, (ObjectRef, NodeId)>,
}

impl GeneratedPojoStore {
    pub fn new(enabled: bool) -> Self {
        Self { enabled, instances: IndexMap::new() }
    }

    pub fn record(&mut self, node: NodeId, object: &ObjectRef) {
        if !self.enabled {
            return;
        }
        self.instances.entry(object.id()).or_insert_with(|| (object.clone(), node));
    }

    fn latest_for(&self, node: NodeId) -> Option<&ObjectRef> {
        self.instances
            .values()
            .rev()
            .find(|(_, producer)| *producer == node)
            .map(|(object, _)| object)
    }

    /// The nearest same-class ancestor's instance, tagged so it is never
    /// re-populated. `Empty` when disabled or nothing was recorded.
    pub fn resolve_cyclic(&self, tree: &NodeTree, node: &Node) -> GeneratorResult {
        if !self.enabled {
            return GeneratorResult::Empty;
        }
        let hit = tree
            .ancestors(node.id)
            .filter(|a| a.target == node.target)
            .find_map(|a| self.latest_for(a.id).map(|o| (a, o)));
        match hit {
            Some((ancestor, object)) => {
                debug!(node = %node.display(), ancestor = %ancestor.display(), "reusing back-reference");
                GeneratorResult::normal(Value::Object(object.clone()), Hints::do_not_modify())
            }
            None => GeneratorResult::Empty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hints::AfterGenerate;
    use crate::node::tests::{class, parent_child_classes};

    #[test]
    fn resolves_to_nearest_recorded_ancestor() {
        let tree = NodeTree::build(&class("Parent"), &parent_child_classes(), 10).unwrap();
        let root = tree.root();
        let child = tree.node(root).children[0];
        let back = tree.node(tree.node(child).children[0]);

        let mut store = GeneratedPojoStore::new(true);
        assert!(store.resolve_cyclic(&tree, back).is_empty());

        let parent = ObjectRef::new("Parent");
        store.record(root, &parent);
        let result = store.resolve_cyclic(&tree, back);
        let Some(Value::Object(found)) = result.value() else { panic!("object") };
        assert!(found.ptr_eq(&parent));
        assert_eq!(result.hints().and_then(Hints::after_generate), Some(AfterGenerate::DoNotModify));
    }

    #[test]
    fn reused_instance_keeps_its_producer() {
        let tree = NodeTree::build(&class("Parent"), &parent_child_classes(), 10).unwrap();
        let root = tree.root();
        let child = tree.node(root).children[0];
        let back = tree.node(tree.node(child).children[0]);

        let mut store = GeneratedPojoStore::new(true);
        let first = ObjectRef::new("Parent");
        let second = ObjectRef::new("Parent");
        store.record(root, &first);
        store.record(root, &second);
        // the cyclic leaf re-records the instance it was handed
        store.record(back.id, &second);

        let result = store.resolve_cyclic(&tree, back);
        let Some(Value::Object(found)) = result.value() else { panic!("object") };
        assert!(found.ptr_eq(&second));
    }

    #[test]
    fn disabled_store_never_resolves() {
        let tree = NodeTree::build(&class("Parent"), &parent_child_classes(), 10).unwrap();
        let mut store = GeneratedPojoStore::new(false);
        store.record(tree.root(), &ObjectRef::new("Parent"));
        let child = tree.node(tree.root()).children[0];
        let back = tree.node(tree.node(child).children[0]);
        assert!(store.resolve_cyclic(&tree, back).is_empty());
    }
}
