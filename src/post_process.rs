//! Value rewriting after generation.
use crate::assignment::{Predicate, ValueMapper};
use crate::error::BoxError;
use crate::node::{Node, NodeTree};
use crate::random::Random;
use crate::selector::Selector;
use crate::settings::Settings;
use crate::value::Value;

pub trait PostProcessor {
    fn name(&self) -> &str;

    fn process(
        &self,
        tree: &NodeTree,
        node: &Node,
        value: Value,
        settings: &Settings,
        random: &mut Random,
    ) -> Result<Value, BoxError>;
}

/// `name_XYZ` for string fields when `string_field_prefix` is on.
#[derive(Debug, Default)]
pub struct StringPrefixPostProcessor;

/// Replace values of matching nodes for which the predicate holds.
#[derive(Debug)]
pub struct ConditionalRewrite {
    pub selector: Selector,
    pub predicate: Predicate,
    pub mapper: ValueMapper,
}

impl PostProcessor for StringPrefixPostProcessor {
    fn name(&self) -> &str {
        "string-field-prefix"
    }

    fn process(
        &self,
        _tree: &NodeTree,
        node: &Node,
        value: Value,
        settings: &Settings,
        _random: &mut Random,
    ) -> Result<Value, BoxError> {
        match (&value, &node.field) {
            (Value::Str(s), Some(field)) if settings.string_field_prefix => Ok(Value::Str(format!("{field}_{s}"))),
            _ => Ok(value),
        }
    }
}

impl ConditionalRewrite {
    pub fn new(selector: Selector, predicate: Predicate, mapper: ValueMapper) -> Self {
        Self { selector, predicate, mapper }
    }
}

impl PostProcessor for ConditionalRewrite {
    fn name(&self) -> &str {
        self.predicate.description()
    }

    fn process(
        &self,
        tree: &NodeTree,
        node: &Node,
        value: Value,
        _settings: &Settings,
        random: &mut Random,
    ) -> Result<Value, BoxError> {
        if self.selector.matches(tree, node) && self.predicate.test(&value)? {
            return self.mapper.apply(&value, random);
        }
        Ok(value)
    }
}
