//! Generic containers built from their children's values.
//!
//! The generator itself produces a placeholder; the walker populates the
//! node's children, then calls the hint's `create`, `add` and `build` steps.
use std::rc::Rc;

use crate::error::BoxError;
use crate::hints::{AddFn, BuildFn, ContainerHint, CreateFn, Hint, Hints};
use crate::node::TargetClass;
use crate::random::Random;
use crate::value::Value;

use super::{Generator, GeneratorKind};

#[derive(Debug, Clone)]
pub struct ContainerGenerator {
    pub target: TargetClass,
    pub hint: ContainerHint,
}

impl ContainerGenerator {
    /// `Optional<T>`: the container is its single argument (or null).
    pub fn optional() -> Self {
        let create: CreateFn = Rc::new(|args: &[Value]| Ok(args.first().cloned().unwrap_or(Value::Null)));
        Self {
            target: TargetClass::Optional,
            hint: ContainerHint { create: Some(create), add: None, build: None, generate_entries: 0 },
        }
    }

    pub fn builder(target: TargetClass, create: CreateFn) -> Self {
        Self {
            target,
            hint: ContainerHint { create: Some(create), add: None, build: None, generate_entries: 0 },
        }
    }

    /// Add `entries` more rounds of child values through `add`.
    pub fn with_entries(mut self, entries: usize, add: AddFn) -> Self {
        self.hint.generate_entries = entries;
        self.hint.add = Some(add);
        self
    }

    pub fn with_build(mut self, build: BuildFn) -> Self {
        self.hint.build = Some(build);
        self
    }
}

impl Generator for ContainerGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Container
    }

    fn generate(&self, _random: &mut Random) -> Result<Value, BoxError> {
        Ok(Value::Null)
    }

    fn hints(&self, _random: &mut Random) -> Hints {
        Hints::new().with(Hint::Container(self.hint.clone()))
    }

    fn target(&self) -> Option<TargetClass> {
        Some(self.target.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_takes_first_argument() {
        let g = ContainerGenerator::optional();
        let mut r = Random::new(1);
        let hints = g.hints(&mut r);
        let create = hints.container().and_then(|c| c.create.clone()).unwrap();
        assert_eq!(create(&[Value::Int(3)]).unwrap(), Value::Int(3));
        assert_eq!(create(&[]).unwrap(), Value::Null);
    }
}
