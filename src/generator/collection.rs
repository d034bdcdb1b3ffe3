//! Lists, sets and arrays.
//!
//! These generators only produce the empty container; the number of elements
//! to add travels in a collection or array hint and the walker fills them in.
use crate::error::BoxError;
use crate::hints::{ArrayHint, CollectionHint, Hint, Hints};
use crate::node::TargetClass;
use crate::random::Random;
use crate::value::Value;

use super::{Generator, GeneratorKind};

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionGenerator {
    /// `List` or `Set`; unknown until resolved through delegation.
    pub subtype: Option<TargetClass>,
    pub min_size: usize,
    pub max_size: usize,
    pub nullable_elements: bool,
    pub unique: bool,
    pub with_elements: Vec<Value>,
    pub shuffle: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayGenerator {
    /// Concrete array class, pushed down from the node being generated.
    pub subtype: Option<TargetClass>,
    pub min_length: usize,
    pub max_length: usize,
    pub nullable_elements: bool,
    pub with_elements: Vec<Value>,
    pub shuffle: bool,
}

impl CollectionGenerator {
    pub fn new(subtype: Option<TargetClass>, min_size: usize, max_size: usize) -> Self {
        Self {
            subtype,
            min_size,
            max_size,
            nullable_elements: false,
            unique: false,
            with_elements: Vec::new(),
            shuffle: false,
        }
    }

    pub fn set_size(&mut self, min: Option<usize>, max: Option<usize>) {
        if let Some(min) = min {
            self.min_size = min;
        }
        if let Some(max) = max {
            self.max_size = max;
        }
        if self.max_size < self.min_size {
            self.max_size = self.min_size;
        }
    }
}

impl Generator for CollectionGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Collection
    }

    fn generate(&self, _random: &mut Random) -> Result<Value, BoxError> {
        match &self.subtype {
            Some(TargetClass::List) => Ok(Value::List(Vec::new())),
            Some(TargetClass::Set) => Ok(Value::Set(Vec::new())),
            Some(other) => Err(format!("collection generator cannot build '{other}'").into()),
            None => Err("collection generator has no concrete subtype".into()),
        }
    }

    fn hints(&self, random: &mut Random) -> Hints {
        Hints::new().with(Hint::Collection(CollectionHint {
            generate_elements: random.usize_range(self.min_size, self.max_size),
            nullable_elements: self.nullable_elements,
            unique: self.unique,
            with_elements: self.with_elements.clone(),
            shuffle: self.shuffle,
        }))
    }

    fn target(&self) -> Option<TargetClass> {
        self.subtype.clone()
    }

    fn is_delegating(&self) -> bool {
        self.subtype.is_none()
    }
}

impl ArrayGenerator {
    pub fn new(min_length: usize, max_length: usize) -> Self {
        Self {
            subtype: None,
            min_length,
            max_length,
            nullable_elements: false,
            with_elements: Vec::new(),
            shuffle: false,
        }
    }

    pub fn set_length(&mut self, min: Option<usize>, max: Option<usize>) {
        if let Some(min) = min {
            self.min_length = min;
        }
        if let Some(max) = max {
            self.max_length = max;
        }
        if self.max_length < self.min_length {
            self.max_length = self.min_length;
        }
    }
}

impl Generator for ArrayGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Array
    }

    fn generate(&self, _random: &mut Random) -> Result<Value, BoxError> {
        Ok(Value::List(Vec::new()))
    }

    fn hints(&self, random: &mut Random) -> Hints {
        let length = match &self.subtype {
            Some(TargetClass::Array { len: Some(n) }) => *n,
            _ => random.usize_range(self.min_length, self.max_length),
        };
        Hints::new().with(Hint::Array(ArrayHint {
            length,
            nullable_elements: self.nullable_elements,
            with_elements: self.with_elements.clone(),
            shuffle: self.shuffle,
        }))
    }

    fn target(&self) -> Option<TargetClass> {
        self.subtype.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtype_decides_container_shape() {
        let mut r = Random::new(1);
        let set = CollectionGenerator::new(Some(TargetClass::Set), 1, 1);
        assert_eq!(set.generate(&mut r).unwrap(), Value::Set(vec![]));
        let abstract_ = CollectionGenerator::new(None, 1, 1);
        assert!(abstract_.generate(&mut r).is_err());
    }

    #[test]
    fn size_hint_within_bounds() {
        let mut r = Random::new(8);
        let g = CollectionGenerator::new(Some(TargetClass::List), 2, 4);
        for _ in 0..20 {
            let n = g.hints(&mut r).collection().map(|c| c.generate_elements).unwrap();
            assert!((2..=4).contains(&n));
        }
    }
}
