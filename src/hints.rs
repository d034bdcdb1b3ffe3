//! Generation metadata attached to a produced value.
//!
//! Known hint kinds are variants of [`Hint`]; engine extensions travel in
//! [`Hint::Other`] keyed by name.
use std::any::Any;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::BoxError;
use crate::node::TargetClass;
use crate::value::Value;

/// What the engine may still do to a value after its generator produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AfterGenerate {
    /// The value is final; nothing downstream touches it.
    DoNotModify,
    /// Only children with an explicit selector (generator, assignment) are set.
    ApplySelectors,
    /// Null children are populated.
    PopulateNulls,
    /// Null children and zero-valued primitives are populated.
    #[default]
    PopulateNullsAndDefaultPrimitives,
    /// Every child is populated, overwriting what the generator set.
    PopulateAll,
}

/// Resolution metadata used by the engine itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InternalHint {
    /// Concrete class the generator wants to build, if it knows it.
    pub target: Option<TargetClass>,
    /// The generator cannot build the value itself; resolve a delegate.
    pub delegating: bool,
    pub nullable_result: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionHint {
    pub generate_elements: usize,
    pub nullable_elements: bool,
    pub unique: bool,
    pub with_elements: Vec<Value>,
    pub shuffle: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapHint {
    pub generate_entries: usize,
    pub nullable_keys: bool,
    pub nullable_values: bool,
    pub with_keys: Vec<Value>,
    pub with_entries: Vec<(Value, Value)>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayHint {
    pub length: usize,
    pub nullable_elements: bool,
    pub with_elements: Vec<Value>,
    pub shuffle: bool,
}

pub type CreateFn = Rc<dyn Fn(&[Value]) -> Result<Value, BoxError>>;
pub type AddFn = Rc<dyn Fn(&mut Value, &[Value]) -> Result<(), BoxError>>;
pub type BuildFn = Rc<dyn Fn(Value) -> Result<Value, BoxError>>;

/// How to build an arbitrary container generically: create it from the
/// children's values, add `generate_entries` more entries, then build.
#[derive(Clone, Default)]
pub struct ContainerHint {
    pub create: Option<CreateFn>,
    pub add: Option<AddFn>,
    pub build: Option<BuildFn>,
    pub generate_entries: usize,
}

#[derive(Debug, Clone)]
pub enum Hint {
    Internal(InternalHint),
    Collection(CollectionHint),
    Map(MapHint),
    Array(ArrayHint),
    Container(ContainerHint),
    Other { key: String, value: Arc<dyn Any + Send + Sync> },
}

#[derive(Debug, Clone, Default)]
pub struct Hints {
    after_generate: Option<AfterGenerate>,
    entries: Vec<Hint>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl fmt::Debug for ContainerHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerHint")
            .field("create", &self.create.is_some())
            .field("add", &self.add.is_some())
            .field("build", &self.build.is_some())
            .field("generate_entries", &self.generate_entries)
            .finish()
    }
}

impl Hint {
    fn same_kind(&self, other: &Hint) -> bool {
        match (self, other) {
            (Hint::Other { key: a, .. }, Hint::Other { key: b, .. }) => a == b,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

impl Hints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn after(after_generate: AfterGenerate) -> Self {
        Self { after_generate: Some(after_generate), entries: Vec::new() }
    }

    /// Hint used for values that must not be re-populated downstream
    /// (copied assignment values, back-references).
    pub fn do_not_modify() -> Self {
        Self::after(AfterGenerate::DoNotModify)
    }

    pub fn with_after_generate(mut self, after_generate: AfterGenerate) -> Self {
        self.after_generate = Some(after_generate);
        self
    }

    /// Adds a hint, replacing an existing hint of the same kind.
    pub fn with(mut self, hint: Hint) -> Self {
        self.entries.retain(|h| !h.same_kind(&hint));
        self.entries.push(hint);
        self
    }

    pub fn after_generate(&self) -> Option<AfterGenerate> {
        self.after_generate
    }

    pub fn internal(&self) -> Option<&InternalHint> {
        self.entries.iter().find_map(|h| match h {
            Hint::Internal(x) => Some(x),
            _ => None,
        })
    }

    pub fn collection(&self) -> Option<&CollectionHint> {
        self.entries.iter().find_map(|h| match h {
            Hint::Collection(x) => Some(x),
            _ => None,
        })
    }

    pub fn map(&self) -> Option<&MapHint> {
        self.entries.iter().find_map(|h| match h {
            Hint::Map(x) => Some(x),
            _ => None,
        })
    }

    pub fn array(&self) -> Option<&ArrayHint> {
        self.entries.iter().find_map(|h| match h {
            Hint::Array(x) => Some(x),
            _ => None,
        })
    }

    pub fn container(&self) -> Option<&ContainerHint> {
        self.entries.iter().find_map(|h| match h {
            Hint::Container(x) => Some(x),
            _ => None,
        })
    }

    pub fn other<T: Any + Send + Sync>(&self, key: &str) -> Option<&T> {
        self.entries.iter().find_map(|h| match h {
            Hint::Other { key: k, value } if k == key => value.downcast_ref::<T>(),
            _ => None,
        })
    }

    pub fn is_nullable_result(&self) -> bool {
        self.internal().is_some_and(|h| h.nullable_result)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.after_generate.is_none() && self.entries.is_empty()
    }
}

// Hints compare by their known payloads; `Other` entries compare by key.
impl PartialEq for Hints {
    fn eq(&self, other: &Self) -> bool {
        self.after_generate == other.after_generate
            && self.collection() == other.collection()
            && self.map() == other.map()
            && self.array() == other.array()
            && self.internal() == other.internal()
            && self.container().map(|c| c.generate_entries)
                == other.container().map(|c| c.generate_entries)
            && self.entries.len() == other.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adding_same_kind_replaces() {
        let hints = Hints::new()
            .with(Hint::Collection(CollectionHint { generate_elements: 2, ..Default::default() }))
            .with(Hint::Collection(CollectionHint { generate_elements: 5, ..Default::default() }));
        assert_eq!(hints.len(), 1);
        assert_eq!(hints.collection().map(|c| c.generate_elements), Some(5));
    }

    #[test]
    fn other_hints_are_keyed_and_typed() {
        let hints = Hints::new()
            .with(Hint::Other { key: "weight".into(), value: Arc::new(3u32) })
            .with(Hint::Other { key: "label".into(), value: Arc::new("x".to_string()) });
        assert_eq!(hints.other::<u32>("weight"), Some(&3));
        assert_eq!(hints.other::<String>("weight"), None);
        assert_eq!(hints.other::<String>("label").map(String::as_str), Some("x"));
    }

    #[test]
    fn nullable_result_reads_internal_hint() {
        let hints = Hints::new().with(Hint::Internal(InternalHint {
            nullable_result: true,
            ..Default::default()
        }));
        assert!(hints.is_nullable_result());
        assert!(!Hints::do_not_modify().is_nullable_result());
    }
}
