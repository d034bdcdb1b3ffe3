//! Per-node resolution: the handler chain.
//!
//! For every node the engine asks, in order, the assignment handler, the
//! user-supplied generator, plugins, constraint providers, builtin generators
//! and default instantiation. The first result that is not `Empty` wins;
//! `Delayed` also stops the chain. Cyclic nodes only consult assignments,
//! user-supplied generators and the back-reference store.
//!
//! One engine serves one population call: it owns the assignment store, the
//! unresolved set, the back-reference store and the emit cursors.
use tracing::{debug, trace};

use crate::assignment::{Assignment, AssignmentObjectStore, AssignmentResolver, Decision, ScopeHandle};
use crate::context::ModelContext;
use crate::error::{BoxError, FixtureError};
use crate::generator::{EmitHelper, GeneratorSpec, InstantiateGenerator};
use crate::hints::Hints;
use crate::node::{Node, NodeId, NodeTree, TargetClass};
use crate::pojo_store::GeneratedPojoStore;
use crate::random::Random;
use crate::result::GeneratorResult;
use crate::value::{ObjectRef, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandlerKind {
    Assignment,
    UserSupplied,
    Plugin,
    Constraint,
    Builtin,
    Instantiating,
    BackReference,
}

const FULL_CHAIN: [HandlerKind; 6] = [
    HandlerKind::Assignment,
    HandlerKind::UserSupplied,
    HandlerKind::Plugin,
    HandlerKind::Constraint,
    HandlerKind::Builtin,
    HandlerKind::Instantiating,
];

const CYCLIC_CHAIN: [HandlerKind; 3] = [HandlerKind::Assignment, HandlerKind::UserSupplied, HandlerKind::BackReference];

pub struct Engine<'m> {
    context: &'m ModelContext,
    tree: &'m NodeTree,
    random: Random,
    assignments: AssignmentResolver,
    store: AssignmentObjectStore,
    pojos: GeneratedPojoStore,
    emit: EmitHelper,
}

// ————————————————————————————————————————————————————————————————————————————
// PUBLIC API
// ————————————————————————————————————————————————————————————————————————————

impl<'m> Engine<'m> {
    pub fn new(context: &'m ModelContext, tree: &'m NodeTree, random: Random) -> Self {
        Self {
            context,
            tree,
            random,
            assignments: AssignmentResolver::new(),
            store: AssignmentObjectStore::new(),
            pojos: GeneratedPojoStore::new(context.settings.set_back_references),
            emit: EmitHelper::new(),
        }
    }

    pub fn context(&self) -> &'m ModelContext {
        self.context
    }

    pub fn tree(&self) -> &'m NodeTree {
        self.tree
    }

    pub fn random(&mut self) -> &mut Random {
        &mut self.random
    }

    pub fn enter_scope(&mut self) -> ScopeHandle {
        self.store.enter_scope()
    }

    pub fn exit_scope(&mut self, handle: ScopeHandle) -> Result<(), FixtureError> {
        self.store.exit_scope(handle)
    }

    /// Rules that were blocked the last time they were consulted.
    pub fn unresolved_assignments(&self) -> Vec<&'m Assignment> {
        self.assignments
            .unresolved()
            .into_iter()
            .filter_map(|id| self.context.assignment(id))
            .collect()
    }

    /// Decide the value of one node.
    pub fn resolve(&mut self, id: NodeId) -> Result<GeneratorResult, FixtureError> {
        let node = self.tree.node(id);
        if node.ignored {
            trace!(node = %node.display(), "ignored");
            return Ok(GeneratorResult::Ignored);
        }

        // a node retried after a delay already had its coin flipped
        let retry = self.assignments.is_blocked(id);
        if !retry && self.random.chance(self.context.null_probability(self.tree, node)) {
            trace!(node = %node.display(), "null by probability");
            self.record_produced(id, &GeneratorResult::Null)?;
            return Ok(GeneratorResult::Null);
        }

        let result = self.run_chain(node);
        match &result {
            Ok(GeneratorResult::Delayed) => {}
            _ => self.assignments.settle(id),
        }
        let result = result?;
        if result.is_normal() || result.is_null() {
            self.record_produced(id, &result)?;
        }
        Ok(result)
    }

    /// `aggregate` cannot complete until `element` is decided, so it takes
    /// over the rule blocking the element.
    pub fn delay_behind(&mut self, aggregate: NodeId, element: NodeId) {
        self.assignments.transfer(element, aggregate);
    }

    /// Stop tracking `id` as blocked; its slot was discarded.
    pub fn settle(&mut self, id: NodeId) {
        self.assignments.settle(id);
    }

    /// Make a node's value visible to assignment origins and back-reference
    /// lookups. Called by `resolve` and by the walker for values produced
    /// outside the engine, or re-recorded after an aggregate is populated.
    pub fn record_produced(&mut self, id: NodeId, result: &GeneratorResult) -> Result<(), FixtureError> {
        let node = self.tree.node(id);
        if node.target.is_pojo() {
            if let Some(Value::Object(object)) = result.value() {
                self.pojos.record(id, object);
            }
        }
        for origin in self.context.origins_matching(self.tree, node) {
            self.store.put(origin.clone(), result.clone())?;
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// HANDLERS
// ————————————————————————————————————————————————————————————————————————————

impl<'m> Engine<'m> {
    fn run_chain(&mut self, node: &'m Node) -> Result<GeneratorResult, FixtureError> {
        let chain: &[HandlerKind] = if node.cyclic { &CYCLIC_CHAIN } else { &FULL_CHAIN };
        for &handler in chain {
            let result = self.run_handler(handler, node)?;
            if result.is_decided() {
                trace!(node = %node.display(), handler = ?handler, result = result.kind_name(), "resolved");
                return Ok(result);
            }
        }
        Ok(GeneratorResult::Empty)
    }

    fn run_handler(&mut self, handler: HandlerKind, node: &'m Node) -> Result<GeneratorResult, FixtureError> {
        match handler {
            HandlerKind::Assignment => self.assignment_handler(node),
            HandlerKind::UserSupplied => match self.context.generator_for(self.tree, node) {
                Some(spec) => self.generate_with(node, spec),
                None => Ok(GeneratorResult::Empty),
            },
            HandlerKind::Plugin => match self.context.plugin_generator(&node.target) {
                Some(spec) => self.generate_with(node, &spec),
                None => Ok(GeneratorResult::Empty),
            },
            HandlerKind::Constraint => self.constraint_handler(node),
            HandlerKind::Builtin => match self.context.builtin_generator(&node.target) {
                Some(spec) => {
                    let result = self.generate_with(node, &spec)?;
                    self.post_process(node, result)
                }
                None => Ok(GeneratorResult::Empty),
            },
            HandlerKind::Instantiating => Ok(match &node.target {
                TargetClass::Object(class) => GeneratorResult::normal(
                    Value::Object(ObjectRef::new(class.clone())),
                    Hints::after(self.context.settings.after_generate),
                ),
                _ => GeneratorResult::Empty,
            }),
            HandlerKind::BackReference => Ok(self.pojos.resolve_cyclic(self.tree, node)),
        }
    }

    fn assignment_handler(&mut self, node: &'m Node) -> Result<GeneratorResult, FixtureError> {
        let rules = self.context.assignments_for(self.tree, node);
        if rules.is_empty() {
            return Ok(GeneratorResult::Empty);
        }
        let store = &self.store;
        let decision = self.assignments.decide(&rules, self.tree, node, |s| store.get(s).cloned())?;
        match decision {
            Decision::Generate(spec) => self.generate_with(node, spec),
            Decision::Copy { value, mapper } => {
                let value = match mapper {
                    Some(mapper) => mapper
                        .apply(&value, &mut self.random)
                        .map_err(|e| self.user_error(node, e))?,
                    None => value,
                };
                Ok(match value {
                    Value::Null => GeneratorResult::Null,
                    value => GeneratorResult::normal(value, Hints::do_not_modify()),
                })
            }
            Decision::Null => Ok(GeneratorResult::Null),
            Decision::Delayed => {
                trace!(node = %node.display(), "assignment delayed");
                Ok(GeneratorResult::Delayed)
            }
            Decision::Empty => Ok(GeneratorResult::Empty),
        }
    }

    fn constraint_handler(&mut self, node: &'m Node) -> Result<GeneratorResult, FixtureError> {
        if node.constraints.is_empty() {
            return Ok(GeneratorResult::Empty);
        }
        let settings = &self.context.settings;
        let providers = self.context.constraint_providers();
        let primaries: Vec<_> = providers.iter().filter(|p| p.is_primary(node)).collect();
        if primaries.len() > 1 {
            let names: Vec<&str> = primaries.iter().map(|p| p.name()).collect();
            return Err(FixtureError::usage(format!(
                "more than one constraint provider claims the primary constraint of {}: {}\n\n  path to root:\n{}",
                node.display(),
                names.join(", "),
                self.tree.format_path_to_root(node.id, "    "),
            )));
        }
        let base = match primaries.first() {
            Some(primary) => {
                debug!(node = %node.display(), provider = primary.name(), "primary constraint");
                primary.resolve_generator(node, settings)
            }
            None => self.context.builtin_generator(&node.target),
        };
        let Some(mut spec) = base else {
            return Ok(GeneratorResult::Empty);
        };
        for provider in providers {
            provider.refine(node, &mut spec);
        }
        let result = self.generate_with(node, &spec)?;
        let result = match result {
            GeneratorResult::Normal { value, hints } => {
                GeneratorResult::normal(self.conform(node, value)?, hints)
            }
            other => other,
        };
        self.post_process(node, result)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// GENERATION
// ————————————————————————————————————————————————————————————————————————————

impl<'m> Engine<'m> {
    /// Run a generator selected for `node`. The `GeneratorSpec` is cloned so the
    /// registered one is never modified.
    fn generate_with(&mut self, node: &'m Node, spec: &GeneratorSpec) -> Result<GeneratorResult, FixtureError> {
        let mut spec = spec.clone();
        spec.push_subtype(&node.target);

        if spec.is_nullable() && self.random.chance(self.context.settings.null_probability) {
            return Ok(GeneratorResult::Null);
        }

        let hints = spec.hints(&mut self.random);
        if let Some(emit) = spec.as_emit() {
            return self.emit.next(emit, node, hints);
        }

        let producer = if spec.is_delegating() {
            self.delegate_for(node, &spec, &hints)?
        } else {
            spec
        };
        let value = producer
            .generate(&mut self.random)
            .map_err(|e| self.user_error(node, e))?;
        Ok(GeneratorResult::normal(value, hints))
    }

    /// Concrete generator for a delegating one: the class comes from the
    /// delegating generator's internal hint (or the node), and the delegate
    /// inherits its nullability. Delegates are never cached.
    pub fn delegate_for(
        &self,
        node: &Node,
        spec: &GeneratorSpec,
        hints: &Hints,
    ) -> Result<GeneratorSpec, FixtureError> {
        let internal = hints.internal().ok_or_else(|| {
            FixtureError::internal(format!(
                "{:?} generator for {} is delegating but did not provide a type hint",
                spec.kind(),
                node.display()
            ))
        })?;
        let target = internal.target.clone().unwrap_or_else(|| node.target.clone());
        let mut delegate = self
            .context
            .plugin_generator(&target)
            .or_else(|| self.context.builtin_generator(&target))
            .or_else(|| match &target {
                TargetClass::Object(class) => Some(InstantiateGenerator::new(class.clone()).into()),
                _ => None,
            })
            .ok_or_else(|| {
                FixtureError::internal(format!("no generator can build '{target}' for {}", node.display()))
            })?;
        if delegate.is_delegating() {
            return Err(FixtureError::internal(format!(
                "delegate resolved for {} ('{target}') is itself delegating",
                node.display()
            )));
        }
        delegate.set_nullable(spec.is_nullable());
        debug!(node = %node.display(), target = %target, delegate = ?delegate.kind(), "delegated");
        Ok(delegate)
    }

    fn post_process(&mut self, node: &'m Node, result: GeneratorResult) -> Result<GeneratorResult, FixtureError> {
        let GeneratorResult::Normal { mut value, hints } = result else {
            return Ok(result);
        };
        for processor in self.context.post_processors() {
            value = processor
                .process(self.tree, node, value, &self.context.settings, &mut self.random)
                .map_err(|e| self.user_error(node, e))?;
        }
        Ok(GeneratorResult::normal(value, hints))
    }

    /// Fit a constraint-generated value to the node's class: string nodes
    /// get the string rendering, integer nodes parse digit strings, anything
    /// else that does not fit is regenerated with the builtin generator.
    fn conform(&mut self, node: &'m Node, value: Value) -> Result<Value, FixtureError> {
        match (&node.target, value) {
            (_, Value::Null) => Ok(Value::Null),
            (TargetClass::String, Value::Str(s)) => Ok(Value::Str(s)),
            (TargetClass::String, other) => Ok(Value::Str(other.to_string())),
            (TargetClass::Int(_), Value::Str(s)) if s.parse::<i64>().is_ok() => {
                Ok(s.parse::<i64>().map(Value::Int).unwrap_or(Value::Null))
            }
            (target, value) if fits(target, &value) => Ok(value),
            (target, value) => match self.context.builtin_generator(target) {
                Some(builtin) => {
                    debug!(node = %node.display(), got = value.type_name(), "regenerating ill-fitting value");
                    builtin.generate(&mut self.random).map_err(|e| self.user_error(node, e))
                }
                None => Ok(value),
            },
        }
    }

    /// Wrap a callback failure with the node's location. Errors that already
    /// are fixture errors pass through unchanged.
    fn user_error(&self, node: &Node, error: BoxError) -> FixtureError {
        match FixtureError::from_boxed(error) {
            Ok(fixture) => fixture,
            Err(cause) => {
                let message = format!(
                    "error generating a value for {}\n\n  depth: {}\n\n  path to root:\n{}\n\n  cause: {cause}",
                    node.display(),
                    node.depth,
                    self.tree.format_path_to_root(node.id, "    "),
                );
                FixtureError::usage_with_cause(message, cause)
            }
        }
    }
}

fn fits(target: &TargetClass, value: &Value) -> bool {
    matches!(
        (target, value),
        (TargetClass::Bool, Value::Bool(_))
            | (TargetClass::Char, Value::Char(_))
            | (TargetClass::Int(_), Value::Int(_))
            | (TargetClass::Float(_), Value::Float(_) | Value::Int(_))
            | (TargetClass::Date, Value::Date(_))
            | (TargetClass::DateTime, Value::DateTime(_))
            | (TargetClass::Enum { .. }, Value::Enum(_))
            | (TargetClass::List, Value::List(_))
            | (TargetClass::Set, Value::Set(_))
            | (TargetClass::Map, Value::Map(_))
            | (TargetClass::Array { .. }, Value::List(_))
            | (TargetClass::Optional, _)
            | (TargetClass::Object(_), Value::Object(_))
    )
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::{Assign, Predicate};
    use crate::constraint::{Constraint, ConstraintProvider};
    use crate::generator::{
        CollectionGenerator, ConstantGenerator, CustomGenerator, EmitGenerator, IntGenerator, WhenEmpty,
    };
    use crate::hints::{CollectionHint, Hint, InternalHint};
    use crate::node::tests::{class, field, parent_child_classes, string};
    use crate::node::{ClassDecls, TypeExpr};
    use crate::selector::Selector;
    use crate::settings::Settings;

    fn pojo_tree() -> NodeTree {
        let mut classes = ClassDecls::new();
        classes.insert(
            "Pojo".into(),
            vec![
                field("x", string()),
                field("y", string()),
                field("tags", TypeExpr::List(Box::new(string()))),
            ],
        );
        NodeTree::build(&class("Pojo"), &classes, 5).unwrap()
    }

    fn child(tree: &NodeTree, i: usize) -> NodeId {
        tree.node(tree.root()).children[i]
    }

    #[test]
    fn ignored_node_is_a_no_op() {
        let mut tree = pojo_tree();
        let ctx = ModelContext::new(Settings::default())
            .generator(Selector::any_field("x"), ConstantGenerator::new(Value::str("g")).into())
            .assign(Assign::destination(Selector::any_field("x")).generate(ConstantGenerator::new(Value::str("a")).into()))
            .assign(Assign::value_of(Selector::any_field("x")).to(Selector::any_field("y")))
            .ignore(Selector::any_field("x"));
        ctx.apply_ignores(&mut tree);
        let mut engine = Engine::new(&ctx, &tree, Random::new(1));
        engine.enter_scope();
        for _ in 0..3 {
            assert!(engine.resolve(child(&tree, 0)).unwrap().is_ignored());
        }
        // nothing was recorded for the origin, so y stays blocked
        assert!(engine.resolve(child(&tree, 1)).unwrap().is_delayed());
    }

    #[test]
    fn delayed_assignment_resolves_after_origin_is_recorded() {
        let tree = pojo_tree();
        let ctx = ModelContext::new(Settings::default())
            .assign(Assign::value_of(Selector::field("Pojo", "x")).to(Selector::field("Pojo", "y")));
        let mut engine = Engine::new(&ctx, &tree, Random::new(1));
        let scope = engine.enter_scope();

        assert!(engine.resolve(child(&tree, 1)).unwrap().is_delayed());
        assert_eq!(engine.unresolved_assignments().len(), 1);

        let x = engine.resolve(child(&tree, 0)).unwrap();
        let y = engine.resolve(child(&tree, 1)).unwrap();
        assert!(y.is_normal());
        assert_eq!(x.value(), y.value());
        assert!(engine.unresolved_assignments().is_empty());
        assert_eq!(
            y.hints().and_then(Hints::after_generate),
            Some(crate::hints::AfterGenerate::DoNotModify)
        );
        engine.exit_scope(scope).unwrap();
    }

    #[test]
    fn record_produced_unblocks_assignment() {
        let tree = pojo_tree();
        let ctx = ModelContext::new(Settings::default()).assign(
            Assign::given(Selector::field("Pojo", "x"), Predicate::equals(Value::str("a")))
                .set(Selector::field("Pojo", "y"), Value::str("from-a")),
        );
        let mut engine = Engine::new(&ctx, &tree, Random::new(1));
        engine.enter_scope();
        assert!(engine.resolve(child(&tree, 1)).unwrap().is_delayed());
        engine
            .record_produced(child(&tree, 0), &GeneratorResult::normal(Value::str("a"), Hints::new()))
            .unwrap();
        let y = engine.resolve(child(&tree, 1)).unwrap();
        assert_eq!(y.value(), Some(&Value::str("from-a")));
    }

    #[test]
    fn mutual_assignments_stay_unresolved() {
        let tree = pojo_tree();
        let x = Selector::field("Pojo", "x");
        let y = Selector::field("Pojo", "y");
        let ctx = ModelContext::new(Settings::default())
            .assign(Assign::value_of(x.clone()).to(y.clone()))
            .assign(Assign::value_of(y).to(x));
        let mut engine = Engine::new(&ctx, &tree, Random::new(1));
        engine.enter_scope();
        for _ in 0..3 {
            assert!(engine.resolve(child(&tree, 0)).unwrap().is_delayed());
            assert!(engine.resolve(child(&tree, 1)).unwrap().is_delayed());
        }
        assert_eq!(engine.unresolved_assignments().len(), 2);
    }

    #[test]
    fn values_recorded_in_a_scope_vanish_on_exit() {
        let tree = pojo_tree();
        let ctx = ModelContext::new(Settings::default())
            .assign(Assign::value_of(Selector::field("Pojo", "x")).to(Selector::field("Pojo", "y")));
        let mut engine = Engine::new(&ctx, &tree, Random::new(1));
        let outer = engine.enter_scope();
        let inner = engine.enter_scope();
        engine.resolve(child(&tree, 0)).unwrap();
        engine.exit_scope(inner).unwrap();
        assert!(engine.resolve(child(&tree, 1)).unwrap().is_delayed());
        engine.exit_scope(outer).unwrap();
    }

    #[test]
    fn delegate_inherits_nullability() {
        let tree = pojo_tree();
        let ctx = ModelContext::new(Settings::default());
        let engine = Engine::new(&ctx, &tree, Random::new(1));
        let tags = tree.node(child(&tree, 2));

        for nullable in [true, false] {
            let spec = GeneratorSpec::from(CollectionGenerator::new(None, 1, 1)).nullable(nullable);
            let hints = spec.hints(&mut Random::new(2));
            let delegate = engine.delegate_for(tags, &spec, &hints).unwrap();
            assert_eq!(delegate.is_nullable(), nullable);
            assert!(!delegate.is_delegating());
        }
    }

    #[test]
    fn delegated_result_keeps_the_delegating_hints() {
        let tree = pojo_tree();
        let mut abstract_list = CollectionGenerator::new(None, 9, 9);
        abstract_list.unique = true;
        let ctx = ModelContext::new(Settings::default())
            .generator(Selector::any_field("tags"), abstract_list.into());
        let mut engine = Engine::new(&ctx, &tree, Random::new(1));
        engine.enter_scope();
        let result = engine.resolve(child(&tree, 2)).unwrap();
        assert_eq!(result.value(), Some(&Value::List(vec![])));
        let hint = result.hints().and_then(Hints::collection).cloned().unwrap();
        assert_eq!(hint.generate_elements, 9);
        assert!(hint.unique);
        assert!(result.hints().and_then(Hints::internal).is_some_and(|h| h.delegating));
        // the builtin cache only holds the delegate's class
        assert_eq!(ctx.builtins().cached(), 1);
    }

    #[test]
    fn delegating_generator_without_type_hint_is_internal_error() {
        let tree = pojo_tree();
        let custom = CustomGenerator::new(|_| Ok(Value::Null)).delegating();
        let ctx = ModelContext::new(Settings::default()).generator(Selector::any_field("x"), custom.into());
        let mut engine = Engine::new(&ctx, &tree, Random::new(1));
        engine.enter_scope();
        let err = engine.resolve(child(&tree, 0)).unwrap_err();
        assert!(matches!(err, FixtureError::Internal(_)));
    }

    #[test]
    fn delegating_custom_generator_uses_hinted_target() {
        let tree = pojo_tree();
        let hints = Hints::new()
            .with(Hint::Internal(InternalHint { target: Some(TargetClass::Set), ..Default::default() }))
            .with(Hint::Collection(CollectionHint { generate_elements: 1, ..Default::default() }));
        let custom = CustomGenerator::new(|_| Ok(Value::Null)).delegating().with_hints(hints);
        let ctx = ModelContext::new(Settings::default()).generator(Selector::any_field("tags"), custom.into());
        let mut engine = Engine::new(&ctx, &tree, Random::new(1));
        engine.enter_scope();
        let result = engine.resolve(child(&tree, 2)).unwrap();
        assert_eq!(result.value(), Some(&Value::Set(vec![])));
        assert_eq!(result.hints().and_then(Hints::collection).map(|c| c.generate_elements), Some(1));
    }

    #[test]
    fn user_errors_carry_node_path() {
        let tree = pojo_tree();
        let custom = CustomGenerator::new(|_| Err("kaboom".into()));
        let ctx = ModelContext::new(Settings::default()).generator(Selector::any_field("y"), custom.into());
        let mut engine = Engine::new(&ctx, &tree, Random::new(1));
        engine.enter_scope();
        let err = engine.resolve(child(&tree, 1)).unwrap_err();
        let msg = err.to_string();
        assert!(err.is_recoverable_usage());
        assert!(msg.contains("<1:Pojo: String y>"));
        assert!(msg.contains("depth: 1"));
        assert!(msg.contains("kaboom"));
    }

    #[test]
    fn fixture_errors_from_callbacks_pass_through() {
        let tree = pojo_tree();
        let custom = CustomGenerator::new(|_| Err(FixtureError::internal("inner").into()));
        let ctx = ModelContext::new(Settings::default()).generator(Selector::any_field("y"), custom.into());
        let mut engine = Engine::new(&ctx, &tree, Random::new(1));
        engine.enter_scope();
        let err = engine.resolve(child(&tree, 1)).unwrap_err();
        assert!(matches!(err, FixtureError::Internal(ref m) if m == "inner"));
    }

    #[test]
    fn cyclic_node_reuses_ancestor_instance() {
        let tree = NodeTree::build(&class("Parent"), &parent_child_classes(), 10).unwrap();
        let settings = Settings { set_back_references: true, ..Settings::default() };
        let ctx = ModelContext::new(settings);
        let mut engine = Engine::new(&ctx, &tree, Random::new(1));
        engine.enter_scope();
        let root = engine.resolve(tree.root()).unwrap();
        let Some(Value::Object(parent)) = root.value().cloned() else { panic!("object") };
        let child_id = tree.node(tree.root()).children[0];
        engine.resolve(child_id).unwrap();
        let back = tree.node(child_id).children[0];
        let result = engine.resolve(back).unwrap();
        let Some(Value::Object(found)) = result.value() else { panic!("object") };
        assert!(found.ptr_eq(&parent));
    }

    #[test]
    fn cyclic_node_without_back_references_is_left_empty() {
        let tree = NodeTree::build(&class("Parent"), &parent_child_classes(), 10).unwrap();
        let ctx = ModelContext::new(Settings::default());
        let mut engine = Engine::new(&ctx, &tree, Random::new(1));
        engine.enter_scope();
        engine.resolve(tree.root()).unwrap();
        let child_id = tree.node(tree.root()).children[0];
        let back = tree.node(child_id).children[0];
        assert!(engine.resolve(back).unwrap().is_empty());
    }

    #[test]
    fn emit_exhaustion_through_engine() {
        let tree = pojo_tree();
        let items = vec![Value::str("a"), Value::str("b"), Value::str("c")];
        let ctx = ModelContext::new(Settings::default())
            .generator(Selector::of_type("String"), EmitGenerator::new(items, WhenEmpty::Throw).into());
        let mut engine = Engine::new(&ctx, &tree, Random::new(1));
        engine.enter_scope();
        engine.resolve(child(&tree, 0)).unwrap();
        engine.resolve(child(&tree, 1)).unwrap();
        engine.resolve(child(&tree, 0)).unwrap();
        let err = engine.resolve(child(&tree, 1)).unwrap_err();
        let msg = err.to_string();
        for v in ["a", "b", "c"] {
            assert!(msg.contains(v));
        }
        assert!(msg.contains("<1:Pojo: String x>") && msg.contains("<1:Pojo: String y>"));
    }

    #[test]
    fn constraints_shape_generated_values() {
        let mut classes = ClassDecls::new();
        let mut code = field("code", string());
        code.constraints = vec![Constraint::Digits { integer: 5 }];
        let mut age = field("age", TypeExpr::Scalar(TargetClass::Int(crate::node::IntKind::I32)));
        age.constraints = vec![Constraint::Min(18.0), Constraint::Max(20.0)];
        classes.insert("Pojo".into(), vec![code, age]);
        let tree = NodeTree::build(&class("Pojo"), &classes, 5).unwrap();
        let ctx = ModelContext::new(Settings::default());
        let mut engine = Engine::new(&ctx, &tree, Random::new(1));
        engine.enter_scope();
        let code = engine.resolve(child(&tree, 0)).unwrap();
        let s = code.value().and_then(Value::as_str).unwrap().to_string();
        assert_eq!(s.len(), 5);
        assert!(s.chars().all(|c| c.is_ascii_digit()));
        for _ in 0..10 {
            let age = engine.resolve(child(&tree, 1)).unwrap();
            let n = age.value().and_then(Value::as_i64).unwrap();
            assert!((18..=20).contains(&n));
        }
    }

    struct ClaimsEverything(&'static str);

    impl ConstraintProvider for ClaimsEverything {
        fn name(&self) -> &'static str {
            self.0
        }

        fn is_primary(&self, _node: &Node) -> bool {
            true
        }

        fn resolve_generator(&self, _node: &Node, _settings: &Settings) -> Option<GeneratorSpec> {
            Some(ConstantGenerator::new(Value::str(self.0)).into())
        }

        fn refine(&self, _node: &Node, _spec: &mut GeneratorSpec) {}
    }

    fn digits_tree() -> NodeTree {
        let mut classes = ClassDecls::new();
        let mut code = field("code", string());
        code.constraints = vec![Constraint::Digits { integer: 5 }];
        classes.insert("Pojo".into(), vec![code]);
        NodeTree::build(&class("Pojo"), &classes, 5).unwrap()
    }

    #[test]
    fn only_one_provider_may_claim_the_primary_constraint() {
        let tree = digits_tree();
        let ctx = ModelContext::new(Settings::default()).constraint_provider(Box::new(ClaimsEverything("zip-codes")));
        let mut engine = Engine::new(&ctx, &tree, Random::new(1));
        engine.enter_scope();
        let err = engine.resolve(child(&tree, 0)).unwrap_err();
        let msg = err.to_string();
        assert!(err.is_recoverable_usage());
        assert!(msg.contains("format") && msg.contains("zip-codes"));
        assert!(msg.contains("<1:Pojo: String code>"));
    }

    #[test]
    fn single_primary_provider_supplies_the_base_generator() {
        let mut classes = ClassDecls::new();
        let mut name = field("name", string());
        name.constraints = vec![Constraint::NotBlank];
        classes.insert("Pojo".into(), vec![name]);
        let tree = NodeTree::build(&class("Pojo"), &classes, 5).unwrap();
        let ctx = ModelContext::new(Settings::default()).constraint_provider(Box::new(ClaimsEverything("names")));
        let mut engine = Engine::new(&ctx, &tree, Random::new(1));
        engine.enter_scope();
        let result = engine.resolve(child(&tree, 0)).unwrap();
        assert_eq!(result.value(), Some(&Value::str("names")));
    }

    #[test]
    fn user_generator_beats_builtin() {
        let tree = pojo_tree();
        let ctx = ModelContext::new(Settings::default())
            .generator(Selector::field("Pojo", "x"), IntGenerator::new(7, 7).into());
        let mut engine = Engine::new(&ctx, &tree, Random::new(1));
        engine.enter_scope();
        assert_eq!(engine.resolve(child(&tree, 0)).unwrap().value(), Some(&Value::Int(7)));
    }
}
