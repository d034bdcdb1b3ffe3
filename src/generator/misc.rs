use std::fmt;
use std::rc::Rc;

use crate::error::BoxError;
use crate::hints::Hints;
use crate::node::TargetClass;
use crate::random::Random;
use crate::value::{ObjectRef, Value};

use super::{Generator, GeneratorKind};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolGenerator;

#[derive(Debug, Clone, PartialEq)]
pub struct EnumGenerator {
    pub name: String,
    pub variants: Vec<String>,
}

/// Always the same value.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantGenerator {
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OneOfGenerator {
    pub items: Vec<Value>,
}

pub type CustomFn = Rc<dyn Fn(&mut Random) -> Result<Value, BoxError>>;

/// Caller-supplied closure, with optional hints and delegation flag.
#[derive(Clone)]
pub struct CustomGenerator {
    func: CustomFn,
    hints: Hints,
    delegating: bool,
}

/// Default instantiation of an object class, with every field unset.
#[derive(Debug, Clone, PartialEq)]
pub struct InstantiateGenerator {
    pub class: String,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Generator for BoolGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Bool
    }

    fn generate(&self, random: &mut Random) -> Result<Value, BoxError> {
        Ok(Value::Bool(random.boolean()))
    }

    fn target(&self) -> Option<TargetClass> {
        Some(TargetClass::Bool)
    }
}

impl EnumGenerator {
    pub fn new(name: impl Into<String>, variants: Vec<String>) -> Self {
        Self { name: name.into(), variants }
    }
}

impl Generator for EnumGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Enum
    }

    fn generate(&self, random: &mut Random) -> Result<Value, BoxError> {
        random
            .one_of(&self.variants)
            .map(|v| Value::Enum(v.clone()))
            .ok_or_else(|| format!("enum '{}' has no variants", self.name).into())
    }

    fn target(&self) -> Option<TargetClass> {
        Some(TargetClass::Enum { name: self.name.clone(), variants: self.variants.clone() })
    }
}

impl ConstantGenerator {
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}

impl Generator for ConstantGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Constant
    }

    fn generate(&self, _random: &mut Random) -> Result<Value, BoxError> {
        Ok(self.value.clone())
    }
}

impl OneOfGenerator {
    pub fn new(items: Vec<Value>) -> Self {
        Self { items }
    }
}

impl Generator for OneOfGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::OneOf
    }

    fn generate(&self, random: &mut Random) -> Result<Value, BoxError> {
        random
            .one_of(&self.items)
            .cloned()
            .ok_or_else(|| "one_of() requires at least one item".into())
    }
}

impl CustomGenerator {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&mut Random) -> Result<Value, BoxError> + 'static,
    {
        Self { func: Rc::new(func), hints: Hints::new(), delegating: false }
    }

    pub fn with_hints(mut self, hints: Hints) -> Self {
        self.hints = hints;
        self
    }

    /// Mark as unable to build the value itself. The internal hint (if any)
    /// names the class the delegate should build.
    pub fn delegating(mut self) -> Self {
        self.delegating = true;
        self
    }
}

impl fmt::Debug for CustomGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomGenerator")
            .field("hints", &self.hints)
            .field("delegating", &self.delegating)
            .finish_non_exhaustive()
    }
}

impl Generator for CustomGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Custom
    }

    fn generate(&self, random: &mut Random) -> Result<Value, BoxError> {
        (self.func)(random)
    }

    fn hints(&self, _random: &mut Random) -> Hints {
        self.hints.clone()
    }

    fn is_delegating(&self) -> bool {
        self.delegating
    }
}

impl InstantiateGenerator {
    pub fn new(class: impl Into<String>) -> Self {
        Self { class: class.into() }
    }
}

impl Generator for InstantiateGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Instantiate
    }

    fn generate(&self, _random: &mut Random) -> Result<Value, BoxError> {
        Ok(Value::Object(ObjectRef::new(self.class.clone())))
    }

    fn target(&self) -> Option<TargetClass> {
        Some(TargetClass::Object(self.class.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_of_picks_from_items() {
        let mut r = Random::new(3);
        let g = OneOfGenerator::new(vec![Value::str("a"), Value::str("b")]);
        for _ in 0..10 {
            let v = g.generate(&mut r).unwrap();
            assert!(v == Value::str("a") || v == Value::str("b"));
        }
        assert!(OneOfGenerator::new(vec![]).generate(&mut r).is_err());
    }

    #[test]
    fn instantiate_creates_fresh_objects() {
        let mut r = Random::new(3);
        let g = InstantiateGenerator::new("Person");
        let a = g.generate(&mut r).unwrap();
        let b = g.generate(&mut r).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.as_object().map(ObjectRef::class).as_deref(), Some("Person"));
    }

    #[test]
    fn custom_generator_errors_surface() {
        let mut r = Random::new(3);
        let g = CustomGenerator::new(|_| Err("nope".into()));
        assert_eq!(g.generate(&mut r).unwrap_err().to_string(), "nope");
    }
}
