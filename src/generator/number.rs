use crate::error::BoxError;
use crate::node::IntKind;
use crate::random::Random;
use crate::value::Value;

use super::{Generator, GeneratorKind};

#[derive(Debug, Clone, PartialEq)]
pub struct IntGenerator {
    pub min: i64,
    pub max: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FloatGenerator {
    pub min: f64,
    pub max: f64,
}

impl IntGenerator {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Settings bounds clamped to what `kind` can represent.
    pub fn for_kind(kind: IntKind, min: i64, max: i64) -> Self {
        let (lo, hi) = kind.bounds();
        let min = min.clamp(lo, hi);
        let max = max.clamp(lo, hi);
        Self { min, max }
    }

    pub fn set_min(&mut self, min: i64) {
        self.min = min;
        if self.max < min {
            self.max = min;
        }
    }

    pub fn set_max(&mut self, max: i64) {
        self.max = max;
        if self.min > max {
            self.min = max;
        }
    }
}

impl Generator for IntGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Number
    }

    fn generate(&self, random: &mut Random) -> Result<Value, BoxError> {
        Ok(Value::Int(random.int_range(self.min, self.max)))
    }
}

impl FloatGenerator {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn set_min(&mut self, min: f64) {
        self.min = min;
        if self.max < min {
            self.max = min;
        }
    }

    pub fn set_max(&mut self, max: f64) {
        self.max = max;
        if self.min > max {
            self.min = max;
        }
    }
}

impl Generator for FloatGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Number
    }

    fn generate(&self, random: &mut Random) -> Result<Value, BoxError> {
        Ok(Value::float(random.float_range(self.min, self.max)))
    }
}
