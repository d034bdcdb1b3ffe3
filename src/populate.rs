//! Reference tree walker.
//!
//! Drives an [`Engine`] over a [`NodeTree`], top-down. The root and every
//! collection element, map entry and container argument are populated in
//! their own scope. Object fields whose resolution is delayed are queued on
//! the current scope and retried in passes until a pass makes no progress;
//! what is left moves to the enclosing scope. An aggregate with a delayed
//! element is delayed as a whole and rebuilt on retry. Anything still blocked
//! when the root scope closes is reported as an unresolved assignment.
use tracing::{debug, warn};

use crate::context::ModelContext;
use crate::engine::Engine;
use crate::error::{BoxError, FixtureError};
use crate::hints::{AfterGenerate, Hints};
use crate::node::{Node, NodeId, NodeKind, NodeTree};
use crate::random::Random;
use crate::result::GeneratorResult;
use crate::value::{ObjectRef, Value};

/// A slot waiting for a delayed value.
#[derive(Debug, Clone)]
enum Slot {
    Field { node: NodeId, owner: ObjectRef },
    Root { node: NodeId },
}

#[derive(Debug)]
enum Outcome {
    Value(Value),
    Null,
    Skip,
    Delayed,
}

/// An aggregate is either complete or waiting on one of its element nodes.
#[derive(Debug)]
enum Filled {
    Done(Value),
    Waiting(NodeId),
}

pub struct Populator<'m> {
    engine: Engine<'m>,
    pending: Vec<Vec<Slot>>,
    leftovers: Vec<Slot>,
    root: Option<Value>,
}

/// Populate one root value.
pub fn populate(context: &ModelContext, tree: &NodeTree, random: Random) -> Result<Value, FixtureError> {
    Populator::new(Engine::new(context, tree, random)).run()
}

// ————————————————————————————————————————————————————————————————————————————
// DRIVER
// ————————————————————————————————————————————————————————————————————————————

impl Slot {
    fn node(&self) -> NodeId {
        match self {
            Slot::Field { node, .. } | Slot::Root { node } => *node,
        }
    }
}

impl<'m> Populator<'m> {
    pub fn new(engine: Engine<'m>) -> Self {
        Self { engine, pending: Vec::new(), leftovers: Vec::new(), root: None }
    }

    pub fn run(mut self) -> Result<Value, FixtureError> {
        let root = self.engine.tree().root();
        self.scoped(|p| {
            match p.populate_node(root)? {
                Outcome::Value(v) => p.root = Some(v),
                Outcome::Null | Outcome::Skip => p.root = Some(Value::Null),
                Outcome::Delayed => p.defer(Slot::Root { node: root }),
            }
            Ok(())
        })?;

        if !self.leftovers.is_empty() || !self.engine.unresolved_assignments().is_empty() {
            return Err(self.unresolved_error());
        }
        Ok(self.root.unwrap_or(Value::Null))
    }

    /// Run `f` inside a fresh scope. The scope is exited on every path;
    /// slots still delayed after draining move to the enclosing scope.
    fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, FixtureError>) -> Result<T, FixtureError> {
        let handle = self.engine.enter_scope();
        self.pending.push(Vec::new());

        let result = f(self).and_then(|value| self.drain_pending().map(|()| value));

        let leftovers = self.pending.pop().unwrap_or_default();
        match self.pending.last_mut() {
            Some(parent) => parent.extend(leftovers),
            None => self.leftovers.extend(leftovers),
        }
        let exited = self.engine.exit_scope(handle);
        let value = result?;
        exited?;
        Ok(value)
    }

    fn defer(&mut self, slot: Slot) {
        match self.pending.last_mut() {
            Some(queue) => queue.push(slot),
            None => self.leftovers.push(slot),
        }
    }

    /// Retry the current scope's delayed slots until a pass resolves nothing.
    fn drain_pending(&mut self) -> Result<(), FixtureError> {
        let mut pass = 0;
        loop {
            let slots = match self.pending.last_mut() {
                Some(queue) if !queue.is_empty() => std::mem::take(queue),
                _ => return Ok(()),
            };
            pass += 1;
            let before = slots.len();
            let mut blocked = Vec::new();
            for slot in slots {
                match self.populate_node(slot.node())? {
                    Outcome::Delayed => blocked.push(slot),
                    outcome => self.apply(slot, outcome),
                }
            }
            let progressed = blocked.len() < before;
            debug!(pass, before, blocked = blocked.len(), "retry pass");
            if let Some(queue) = self.pending.last_mut() {
                queue.extend(blocked);
            }
            if !progressed {
                return Ok(());
            }
        }
    }

    fn apply(&mut self, slot: Slot, outcome: Outcome) {
        let value = match outcome {
            Outcome::Value(v) => v,
            Outcome::Null => Value::Null,
            Outcome::Skip | Outcome::Delayed => return,
        };
        match slot {
            Slot::Field { node, owner } => {
                if let Some(field) = &self.engine.tree().node(node).field {
                    owner.set(field.clone(), value);
                }
            }
            Slot::Root { .. } => self.root = Some(value),
        }
    }

    fn unresolved_error(&self) -> FixtureError {
        let tree = self.engine.tree();
        let mut report = String::from("Unable to resolve values for the following assignment rules:\n");
        for assignment in self.engine.unresolved_assignments() {
            report.push_str(&format!("\n -> {assignment}"));
        }
        if !self.leftovers.is_empty() {
            report.push_str("\n\nThe following nodes could not be assigned a value:\n");
            for slot in &self.leftovers {
                report.push_str(&format!("\n -> {}", tree.node(slot.node()).display()));
            }
        }
        report.push_str(
            "\n\nCheck for assignments that depend on each other (for example `value_of(a).to(b)` \
             together with `value_of(b).to(a)`) and for origins that are never generated \
             (ignored, or outside the destination's scope).",
        );
        FixtureError::UnresolvedAssignment { report }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// NODES
// ————————————————————————————————————————————————————————————————————————————

impl<'m> Populator<'m> {
    fn populate_node(&mut self, id: NodeId) -> Result<Outcome, FixtureError> {
        let result = match self.engine.resolve(id) {
            Ok(result) => result,
            Err(error) if error.is_recoverable_usage() && !self.engine.context().settings.fail_on_error => {
                warn!(node = %self.engine.tree().node(id).display(), %error, "continuing with null");
                return Ok(Outcome::Null);
            }
            Err(error) => return Err(error),
        };
        Ok(match result {
            GeneratorResult::Ignored => Outcome::Skip,
            GeneratorResult::Delayed => Outcome::Delayed,
            GeneratorResult::Null | GeneratorResult::Empty => Outcome::Null,
            GeneratorResult::Normal { value, hints } => {
                let after = hints
                    .after_generate()
                    .unwrap_or(self.engine.context().settings.after_generate);
                if after == AfterGenerate::DoNotModify {
                    Outcome::Value(value)
                } else {
                    self.fill(id, value, &hints, after)?
                }
            }
        })
    }

    fn fill(&mut self, id: NodeId, value: Value, hints: &Hints, after: AfterGenerate) -> Result<Outcome, FixtureError> {
        let tree = self.engine.tree();
        let node = tree.node(id);
        let mark = self.pending.last().map_or(0, Vec::len);
        let filled = match (node.kind, value) {
            (NodeKind::Object, Value::Object(object)) => {
                self.populate_object(node, &object, after)?;
                return Ok(Outcome::Value(Value::Object(object)));
            }
            (NodeKind::Collection, value @ (Value::List(_) | Value::Set(_))) => {
                self.populate_collection(node, value, hints)?
            }
            (NodeKind::Array, value @ Value::List(_)) => self.populate_array(node, value, hints)?,
            (NodeKind::Map, value @ Value::Map(_)) => self.populate_map(node, value, hints)?,
            (NodeKind::Container, value) => self.populate_container(node, value, hints)?,
            (_, value) => return Ok(Outcome::Value(value)),
        };
        let filled = match filled {
            Filled::Done(filled) => filled,
            Filled::Waiting(element) => {
                debug!(node = %node.display(), element = %tree.node(element).display(), "waiting on a delayed element");
                self.engine.delay_behind(id, element);
                self.abandon_since(mark);
                return Ok(Outcome::Delayed);
            }
        };
        self.engine
            .record_produced(id, &GeneratorResult::normal(filled.clone(), hints.clone()))?;
        Ok(Outcome::Value(filled))
    }

    /// Drop the slots queued by elements of an aggregate that is being
    /// rebuilt later; their nodes are no longer waiting.
    fn abandon_since(&mut self, mark: usize) {
        let Some(queue) = self.pending.last_mut() else { return };
        if queue.len() <= mark {
            return;
        }
        let dropped: Vec<Slot> = queue.drain(mark..).collect();
        for slot in dropped {
            self.engine.settle(slot.node());
        }
    }

    fn populate_object(&mut self, node: &Node, object: &ObjectRef, after: AfterGenerate) -> Result<(), FixtureError> {
        let tree = self.engine.tree();
        for &child_id in &node.children {
            let child = tree.node(child_id);
            let Some(field) = &child.field else { continue };
            let existing = object.get(field);
            if !self.should_populate(child, existing.as_ref(), after) {
                if let Some(v) = existing {
                    self.engine
                        .record_produced(child_id, &GeneratorResult::normal(v, Hints::do_not_modify()))?;
                }
                continue;
            }
            match self.populate_node(child_id)? {
                Outcome::Value(v) => object.set(field.clone(), v),
                Outcome::Null => object.set(field.clone(), Value::Null),
                Outcome::Skip => {}
                Outcome::Delayed => self.defer(Slot::Field { node: child_id, owner: object.clone() }),
            }
        }
        Ok(())
    }

    fn should_populate(&self, child: &Node, existing: Option<&Value>, after: AfterGenerate) -> bool {
        let context = self.engine.context();
        let selected = || context.has_selector_for(self.engine.tree(), child);
        let overwrite = context.settings.overwrite_existing_values;
        match (existing, after) {
            (_, AfterGenerate::DoNotModify) => false,
            (None, AfterGenerate::ApplySelectors) => selected(),
            (None, _) => true,
            (Some(_), AfterGenerate::ApplySelectors) => overwrite && selected(),
            (Some(v), AfterGenerate::PopulateNulls) => v.is_null(),
            (Some(v), AfterGenerate::PopulateNullsAndDefaultPrimitives) => v.is_null() || v.is_default_primitive(),
            (Some(v), AfterGenerate::PopulateAll) => overwrite || v.is_null(),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// CONTAINERS
// ————————————————————————————————————————————————————————————————————————————

impl<'m> Populator<'m> {
    fn element(&mut self, id: NodeId) -> Result<Outcome, FixtureError> {
        self.scoped(|p| p.populate_node(id))
    }

    fn populate_collection(&mut self, node: &Node, mut value: Value, hints: &Hints) -> Result<Filled, FixtureError> {
        let Some(hint) = hints.collection() else { return Ok(Filled::Done(value)) };
        for item in &hint.with_elements {
            value.push(item.clone());
        }
        let Some(&element) = node.children.first() else { return Ok(Filled::Done(value)) };

        let unique = hint.unique || matches!(value, Value::Set(_));
        let max_attempts = hint.generate_elements + self.engine.context().settings.max_unique_retries;
        let (mut added, mut attempts) = (0, 0);
        while added < hint.generate_elements && attempts < max_attempts {
            attempts += 1;
            let item = match self.element(element)? {
                Outcome::Value(v) => v,
                Outcome::Null if hint.nullable_elements => Value::Null,
                Outcome::Null => continue,
                Outcome::Skip => break,
                Outcome::Delayed => return Ok(Filled::Waiting(element)),
            };
            if unique && value.contains(&item) {
                continue;
            }
            value.push(item);
            added += 1;
        }
        if added < hint.generate_elements {
            debug!(node = %node.display(), wanted = hint.generate_elements, added, "collection came up short");
        }
        if hint.shuffle {
            if let Value::List(items) | Value::Set(items) = &mut value {
                self.engine.random().shuffle(items);
            }
        }
        Ok(Filled::Done(value))
    }

    fn populate_array(&mut self, node: &Node, mut value: Value, hints: &Hints) -> Result<Filled, FixtureError> {
        let Some(hint) = hints.array() else { return Ok(Filled::Done(value)) };
        let mut items: Vec<Value> = hint.with_elements.iter().take(hint.length).cloned().collect();
        if let Some(&element) = node.children.first() {
            while items.len() < hint.length {
                // arrays have a fixed length; unfilled slots stay null
                items.push(match self.element(element)? {
                    Outcome::Value(v) => v,
                    Outcome::Null | Outcome::Skip => Value::Null,
                    Outcome::Delayed => return Ok(Filled::Waiting(element)),
                });
            }
        }
        if hint.shuffle {
            self.engine.random().shuffle(&mut items);
        }
        if let Value::List(existing) = &mut value {
            existing.extend(items);
        }
        Ok(Filled::Done(value))
    }

    fn populate_map(&mut self, node: &Node, mut value: Value, hints: &Hints) -> Result<Filled, FixtureError> {
        let Some(hint) = hints.map() else { return Ok(Filled::Done(value)) };
        for (k, v) in &hint.with_entries {
            value.insert(k.clone(), v.clone());
        }
        let (Some(&key_id), Some(&value_id)) = (node.children.first(), node.children.get(1)) else {
            return Ok(Filled::Done(value));
        };

        let mut fixed_keys = hint.with_keys.iter().cloned();
        let max_attempts = hint.generate_entries + self.engine.context().settings.max_unique_retries;
        let (mut added, mut attempts) = (0, 0);
        while added < hint.generate_entries && attempts < max_attempts {
            attempts += 1;
            let (key, entry) = self.scoped(|p| {
                let key = match fixed_keys.next() {
                    Some(k) => Outcome::Value(k),
                    None => p.populate_node(key_id)?,
                };
                Ok((key, p.populate_node(value_id)?))
            })?;
            let key = match key {
                Outcome::Value(k) => k,
                Outcome::Null if hint.nullable_keys => Value::Null,
                Outcome::Skip => break,
                Outcome::Null => continue,
                Outcome::Delayed => return Ok(Filled::Waiting(key_id)),
            };
            let entry = match entry {
                Outcome::Value(v) => v,
                Outcome::Null if hint.nullable_values => Value::Null,
                Outcome::Skip => Value::Null,
                Outcome::Null => continue,
                Outcome::Delayed => return Ok(Filled::Waiting(value_id)),
            };
            if value.contains(&key) {
                continue;
            }
            value.insert(key, entry);
            added += 1;
        }
        Ok(Filled::Done(value))
    }

    fn populate_container(&mut self, node: &Node, value: Value, hints: &Hints) -> Result<Filled, FixtureError> {
        let Some(hint) = hints.container() else { return Ok(Filled::Done(value)) };
        let Some(create) = &hint.create else { return Ok(Filled::Done(value)) };

        let args = match self.container_args(node)? {
            Ok(args) => args,
            Err(waiting) => return Ok(Filled::Waiting(waiting)),
        };
        let mut built = create(&args[..]).map_err(|e| self.callback_error(node, "create", e))?;
        if let Some(add) = &hint.add {
            for _ in 0..hint.generate_entries {
                let args = match self.container_args(node)? {
                    Ok(args) => args,
                    Err(waiting) => return Ok(Filled::Waiting(waiting)),
                };
                add(&mut built, &args[..]).map_err(|e| self.callback_error(node, "add", e))?;
            }
        }
        if let Some(build) = &hint.build {
            built = build(built).map_err(|e| self.callback_error(node, "build", e))?;
        }
        Ok(Filled::Done(built))
    }

    /// One value per argument node, or the first argument node that is delayed.
    fn container_args(&mut self, node: &Node) -> Result<Result<Vec<Value>, NodeId>, FixtureError> {
        let mut args = Vec::with_capacity(node.children.len());
        for &child in &node.children {
            args.push(match self.element(child)? {
                Outcome::Value(v) => v,
                Outcome::Null | Outcome::Skip => Value::Null,
                Outcome::Delayed => return Ok(Err(child)),
            });
        }
        Ok(Ok(args))
    }

    fn callback_error(&self, node: &Node, step: &str, error: BoxError) -> FixtureError {
        match FixtureError::from_boxed(error) {
            Ok(fixture) => fixture,
            Err(cause) => {
                let message = format!(
                    "container {step} function failed for {}\n\n  path to root:\n{}\n\n  cause: {cause}",
                    node.display(),
                    self.engine.tree().format_path_to_root(node.id, "    "),
                );
                FixtureError::usage_with_cause(message, cause)
            }
        }
    }
}

// ------------------------------- Tests ------------------------------------ //
