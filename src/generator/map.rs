use crate::error::BoxError;
use crate::hints::{Hint, Hints, MapHint};
use crate::node::TargetClass;
use crate::random::Random;
use crate::value::Value;

use super::{Generator, GeneratorKind};

#[derive(Debug, Clone, PartialEq)]
pub struct MapGenerator {
    pub min_size: usize,
    pub max_size: usize,
    pub nullable_keys: bool,
    pub nullable_values: bool,
    pub with_keys: Vec<Value>,
    pub with_entries: Vec<(Value, Value)>,
}

impl MapGenerator {
    pub fn new(min_size: usize, max_size: usize) -> Self {
        Self {
            min_size,
            max_size,
            nullable_keys: false,
            nullable_values: false,
            with_keys: Vec::new(),
            with_entries: Vec::new(),
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

impl Generator for MapGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Map
    }

    fn generate(&self, _random: &mut Random) -> Result<Value, BoxError> {
        Ok(Value::Map(Vec::new()))
    }

    fn hints(&self, random: &mut Random) -> Hints {
        Hints::new().with(Hint::Map(MapHint {
            generate_entries: random.usize_range(self.min_size, self.max_size),
            nullable_keys: self.nullable_keys,
            nullable_values: self.nullable_values,
            with_keys: self.with_keys.clone(),
            with_entries: self.with_entries.clone(),
        }))
    }

    fn target(&self) -> Option<TargetClass> {
        Some(TargetClass::Map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hint_carries_fixed_entries() {
        let mut g = MapGenerator::new(0, 0);
        g.with_entries.push((Value::str("a"), Value::Int(1)));
        let mut r = Random::new(1);
        let hints = g.hints(&mut r);
        let hint = hints.map().unwrap();
        assert_eq!(hint.generate_entries, 0);
        assert_eq!(hint.with_entries.len(), 1);
    }
}
