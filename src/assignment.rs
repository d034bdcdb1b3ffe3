//! Cross-field assignment rules.
//!
//! A rule copies (or conditionally generates) a destination's value from an
//! origin's value. Rules are scanned last-to-first; the first one that is
//! unconditional or whose predicate holds decides. A rule whose origin has no
//! recorded value yet blocks the node (`Delayed`); the node stays blocked
//! until it is decided some other way.
pub mod store;

use std::fmt;
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};
use regex::Regex;

use crate::error::{BoxError, FixtureError};
use crate::generator::GeneratorSpec;
use crate::node::{Node, NodeId, NodeTree};
use crate::random::Random;
use crate::result::GeneratorResult;
use crate::selector::Selector;
use crate::value::Value;

pub use store::{AssignmentObjectStore, ScopeHandle};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

pub type PredicateFn = Rc<dyn Fn(&Value) -> Result<bool, BoxError>>;
pub type MapperFn = Rc<dyn Fn(&Value, &mut Random) -> Result<Value, BoxError>>;

/// A named test over an origin value.
#[derive(Clone)]
pub struct Predicate {
    description: String,
    test: PredicateFn,
}

/// Transformation applied to a copied value.
#[derive(Clone)]
pub struct ValueMapper {
    description: String,
    map: MapperFn,
}

#[derive(Debug, Clone)]
pub enum AssignAction {
    /// Produce the destination from a generator.
    Generate(GeneratorSpec),
    /// Copy the origin's value, optionally mapped.
    Copy { mapper: Option<ValueMapper> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssignmentId(usize);

/// A rule before it is registered with a model context.
#[derive(Debug, Clone)]
pub struct AssignmentRule {
    pub origin: Option<Selector>,
    pub predicate: Option<Predicate>,
    pub destination: Selector,
    pub action: AssignAction,
}

#[derive(Debug, Clone)]
pub struct Assignment {
    pub id: AssignmentId,
    pub rule: AssignmentRule,
}

/// Entry points for building rules:
///
/// - `Assign::given(origin, predicate).set(dest, value)`
/// - `Assign::given(origin, predicate).generate(dest, spec)`
/// - `Assign::value_of(origin).to(dest)`
/// - `Assign::destination(dest).generate(spec)`
pub struct Assign;

pub struct GivenBuilder {
    origin: Selector,
    predicate: Predicate,
}

pub struct ValueOfBuilder {
    origin: Selector,
    predicate: Option<Predicate>,
}

pub struct DestinationBuilder {
    destination: Selector,
}

/// What the assignment handler decided for a node.
#[derive(Debug)]
pub enum Decision<'a> {
    Generate(&'a GeneratorSpec),
    Copy { value: Value, mapper: Option<&'a ValueMapper> },
    Null,
    Delayed,
    Empty,
}

/// Stateful half of assignment resolution: every blocked node and the rule
/// that blocked it.
#[derive(Debug, Default)]
pub struct AssignmentResolver {
    blocked: IndexMap<NodeId, AssignmentId>,
}

// ————————————————————————————————————————————————————————————————————————————
// PREDICATES & MAPPERS
// ————————————————————————————————————————————————————————————————————————————

impl Predicate {
    pub fn custom<F>(description: impl Into<String>, test: F) -> Self
    where
        F: Fn(&Value) -> Result<bool, BoxError> + 'static,
    {
        Self { description: description.into(), test: Rc::new(test) }
    }

    pub fn equals(expected: Value) -> Self {
        let description = format!("is({expected})");
        Self::custom(description, move |v| Ok(*v == expected))
    }

    pub fn is_in(candidates: Vec<Value>) -> Self {
        let shown: Vec<String> = candidates.iter().map(Value::to_string).collect();
        let description = format!("is_in({})", shown.join(", "));
        Self::custom(description, move |v| Ok(candidates.contains(v)))
    }

    pub fn is_null() -> Self {
        Self::custom("is_null()", |v| Ok(v.is_null()))
    }

    pub fn not_null() -> Self {
        Self::custom("not_null()", |v| Ok(!v.is_null()))
    }

    /// Regex match over string values. Any other value shape is an error.
    pub fn matches(pattern: &str) -> Result<Self, FixtureError> {
        let re = Regex::new(pattern)
            .map_err(|e| FixtureError::config(format!("invalid predicate pattern '{pattern}': {e}")))?;
        let description = format!("matches({pattern})");
        Ok(Self::custom(description, move |v| match v.as_str() {
            Some(s) => Ok(re.is_match(s)),
            None => Err(format!("expected a string value but got {} '{v}'", v.type_name()).into()),
        }))
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn test(&self, value: &Value) -> Result<bool, BoxError> {
        (self.test)(value)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Predicate({})", self.description)
    }
}

impl ValueMapper {
    pub fn new<F>(description: impl Into<String>, map: F) -> Self
    where
        F: Fn(&Value, &mut Random) -> Result<Value, BoxError> + 'static,
    {
        Self { description: description.into(), map: Rc::new(map) }
    }

    /// Replace the value with a constant.
    pub fn constant(value: Value) -> Self {
        let description = format!("set({value})");
        Self::new(description, move |_, _| Ok(value.clone()))
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn apply(&self, value: &Value, random: &mut Random) -> Result<Value, BoxError> {
        (self.map)(value, random)
    }
}

impl fmt::Debug for ValueMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueMapper({})", self.description)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// BUILDERS
// ————————————————————————————————————————————————————————————————————————————

impl Assign {
    pub fn given(origin: Selector, predicate: Predicate) -> GivenBuilder {
        GivenBuilder { origin, predicate }
    }

    pub fn value_of(origin: Selector) -> ValueOfBuilder {
        ValueOfBuilder { origin, predicate: None }
    }

    pub fn destination(destination: Selector) -> DestinationBuilder {
        DestinationBuilder { destination }
    }
}

impl GivenBuilder {
    /// Set `destination` to `value` when the predicate holds.
    pub fn set(self, destination: Selector, value: Value) -> AssignmentRule {
        AssignmentRule {
            origin: Some(self.origin),
            predicate: Some(self.predicate),
            destination,
            action: AssignAction::Copy { mapper: Some(ValueMapper::constant(value)) },
        }
    }

    pub fn generate(self, destination: Selector, spec: GeneratorSpec) -> AssignmentRule {
        AssignmentRule {
            origin: Some(self.origin),
            predicate: Some(self.predicate),
            destination,
            action: AssignAction::Generate(spec),
        }
    }

    /// Copy the origin's value into `destination` when the predicate holds.
    pub fn copy_to(self, destination: Selector) -> AssignmentRule {
        AssignmentRule {
            origin: Some(self.origin),
            predicate: Some(self.predicate),
            destination,
            action: AssignAction::Copy { mapper: None },
        }
    }
}

impl ValueOfBuilder {
    pub fn when(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn to(self, destination: Selector) -> AssignmentRule {
        AssignmentRule {
            origin: Some(self.origin),
            predicate: self.predicate,
            destination,
            action: AssignAction::Copy { mapper: None },
        }
    }
}

impl DestinationBuilder {
    pub fn generate(self, spec: GeneratorSpec) -> AssignmentRule {
        AssignmentRule { origin: None, predicate: None, destination: self.destination, action: AssignAction::Generate(spec) }
    }
}

impl AssignmentRule {
    /// Map the copied value before it is assigned.
    pub fn map(mut self, mapper: ValueMapper) -> Self {
        if let AssignAction::Copy { mapper: slot } = &mut self.action {
            *slot = Some(mapper);
        }
        self
    }
}

// ————————————————————————————————————————————————————————————————————————————
// RESOLUTION
// ————————————————————————————————————————————————————————————————————————————

impl AssignmentId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }
}

impl Assignment {
    fn is_unconditional_generator(&self) -> bool {
        self.rule.predicate.is_none() && matches!(self.rule.action, AssignAction::Generate(_))
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.rule.origin {
            Some(origin) => write!(f, "from [{origin}] to [{}]", self.rule.destination)?,
            None => write!(f, "to [{}]", self.rule.destination)?,
        }
        if let Some(predicate) = &self.rule.predicate {
            write!(f, " when {}", predicate.description())?;
        }
        Ok(())
    }
}

impl AssignmentResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide `node` from the rules targeting it (in declaration order).
    /// `lookup` returns the recorded result for an origin selector.
    pub fn decide<'a>(
        &mut self,
        rules: &[&'a Assignment],
        tree: &NodeTree,
        node: &Node,
        lookup: impl Fn(&Selector) -> Option<GeneratorResult>,
    ) -> Result<Decision<'a>, FixtureError> {
        let decision = self.scan(rules, tree, node, lookup);
        match &decision {
            Ok(Decision::Delayed) => {}
            _ => self.settle(node.id),
        }
        decision
    }

    /// Forget that `node` was blocked. Called once the node has been decided
    /// by any means, including a null coin or a degraded error.
    pub fn settle(&mut self, node: NodeId) {
        self.blocked.shift_remove(&node);
    }

    /// Move the blocking rule of `from` onto `to`.
    pub fn transfer(&mut self, from: NodeId, to: NodeId) {
        if let Some(rule) = self.blocked.shift_remove(&from) {
            self.blocked.insert(to, rule);
        }
    }

    pub fn is_blocked(&self, node: NodeId) -> bool {
        self.blocked.contains_key(&node)
    }

    /// Rules currently blocking at least one node.
    pub fn unresolved(&self) -> IndexSet<AssignmentId> {
        self.blocked.values().copied().collect()
    }

    fn scan<'a>(
        &mut self,
        rules: &[&'a Assignment],
        tree: &NodeTree,
        node: &Node,
        lookup: impl Fn(&Selector) -> Option<GeneratorResult>,
    ) -> Result<Decision<'a>, FixtureError> {
        for assignment in rules.iter().rev() {
            if assignment.is_unconditional_generator() {
                if let AssignAction::Generate(spec) = &assignment.rule.action {
                    return Ok(Decision::Generate(spec));
                }
            }

            let Some(origin) = &assignment.rule.origin else {
                continue;
            };
            let origin_value = match lookup(origin) {
                None => {
                    self.blocked.insert(node.id, assignment.id);
                    return Ok(Decision::Delayed);
                }
                Some(GeneratorResult::Normal { value, .. }) => value,
                Some(_) => Value::Null,
            };

            if let Some(predicate) = &assignment.rule.predicate {
                let satisfied = predicate.test(&origin_value).map_err(|cause| {
                    FixtureError::usage_with_cause(
                        format!(
                            "assignment predicate {} failed for {} ({})\n\n  path to root:\n{}",
                            predicate.description(),
                            node.display(),
                            assignment,
                            tree.format_path_to_root(node.id, "    "),
                        ),
                        cause,
                    )
                })?;
                if !satisfied {
                    continue;
                }
            }

            return Ok(match &assignment.rule.action {
                AssignAction::Generate(spec) => Decision::Generate(spec),
                AssignAction::Copy { mapper } if origin_value.is_null() && mapper.is_none() => {
                    Decision::Null
                }
                AssignAction::Copy { mapper } => Decision::Copy { value: origin_value, mapper: mapper.as_ref() },
            });
        }
        Ok(Decision::Empty)
    }
}
