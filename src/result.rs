//! Outcome of resolving one node.
use crate::hints::Hints;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum GeneratorResult {
    /// A produced value plus merge metadata.
    Normal { value: Value, hints: Hints },
    /// Set the slot to null, overwriting whatever is there.
    Null,
    /// No decision; the next strategy should try.
    Empty,
    /// The node is excluded from population.
    Ignored,
    /// A decision depends on a value that does not exist yet.
    Delayed,
}

impl GeneratorResult {
    pub fn normal(value: Value, hints: Hints) -> Self {
        Self::Normal { value, hints }
    }

    pub fn is_normal(&self) -> bool {
        matches!(self, Self::Normal { .. })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignored)
    }

    pub fn is_delayed(&self) -> bool {
        matches!(self, Self::Delayed)
    }

    /// Whether this result ends the handler chain.
    pub fn is_decided(&self) -> bool {
        !self.is_empty()
    }

    /// The value to store in a slot: `Some(Null)` for `Null`,
    /// `None` when there is nothing to store.
    pub fn value(&self) -> Option<&Value> {
        const NULL: &Value = &Value::Null;
        match self {
            Self::Normal { value, .. } => Some(value),
            Self::Null => Some(NULL),
            _ => None,
        }
    }

    pub fn hints(&self) -> Option<&Hints> {
        match self {
            Self::Normal { hints, .. } => Some(hints),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Normal { .. } => "normal",
            Self::Null => "null",
            Self::Empty => "empty",
            Self::Ignored => "ignored",
            Self::Delayed => "delayed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_delayed_are_distinct() {
        assert!(GeneratorResult::Empty.is_empty());
        assert!(!GeneratorResult::Delayed.is_empty());
        assert!(GeneratorResult::Delayed.is_decided());
        assert!(!GeneratorResult::Empty.is_decided());
    }

    #[test]
    fn only_normal_and_null_carry_values() {
        let r = GeneratorResult::normal(Value::Int(3), Hints::new());
        assert_eq!(r.value(), Some(&Value::Int(3)));
        assert_eq!(GeneratorResult::Null.value(), Some(&Value::Null));
        assert_eq!(GeneratorResult::Ignored.value(), None);
        assert!(GeneratorResult::Null.hints().is_none());
    }
}
