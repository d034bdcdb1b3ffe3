//! Generator lookup by target class: plugins and builtins.
use std::cell::RefCell;
use std::collections::HashMap;

use tracing::debug;

use crate::generator::{
    ArrayGenerator, BoolGenerator, CharGenerator, CollectionGenerator, ContainerGenerator, EnumGenerator,
    FloatGenerator, GeneratorSpec, IntGenerator, MapGenerator, StringGenerator, TemporalGenerator, TemporalKind,
};
use crate::node::TargetClass;
use crate::settings::Settings;

/// A plugin that can supply generators for target classes.
pub trait GeneratorProvider {
    fn name(&self) -> &str;

    fn generator_for(&self, target: &TargetClass, settings: &Settings) -> Option<GeneratorSpec>;
}

/// Builtin generators, cached per target class. The cache is shared by every
/// population call made with the same context; callers receive clones.
#[derive(Debug, Default)]
pub struct GeneratorResolver {
    cache: RefCell<HashMap<TargetClass, Option<GeneratorSpec>>>,
}

impl GeneratorResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin(&self, target: &TargetClass, settings: &Settings) -> Option<GeneratorSpec> {
        if let Some(hit) = self.cache.borrow().get(target) {
            return hit.clone();
        }
        let spec = builtin_for(target, settings);
        debug!(target = %target, found = spec.is_some(), "caching builtin generator");
        self.cache.borrow_mut().insert(target.clone(), spec.clone());
        spec
    }

    pub fn cached(&self) -> usize {
        self.cache.borrow().len()
    }
}

fn builtin_for(target: &TargetClass, s: &Settings) -> Option<GeneratorSpec> {
    let spec: GeneratorSpec = match target {
        TargetClass::Bool => BoolGenerator.into(),
        TargetClass::Char => CharGenerator.into(),
        TargetClass::Int(kind) => IntGenerator::for_kind(*kind, s.int_min, s.int_max).into(),
        TargetClass::Float(_) => FloatGenerator::new(s.float_min, s.float_max).into(),
        TargetClass::String => StringGenerator::new(s.string_min_length, s.string_max_length).into(),
        TargetClass::Date => TemporalGenerator::new(TemporalKind::Date, s.temporal_range_days).into(),
        TargetClass::DateTime => TemporalGenerator::new(TemporalKind::DateTime, s.temporal_range_days).into(),
        TargetClass::Enum { name, variants } => EnumGenerator::new(name.clone(), variants.clone()).into(),
        TargetClass::List | TargetClass::Set => {
            let mut g = CollectionGenerator::new(Some(target.clone()), s.collection_min_size, s.collection_max_size);
            g.nullable_elements = s.nullable_elements;
            g.into()
        }
        TargetClass::Map => {
            let mut g = MapGenerator::new(s.collection_min_size, s.collection_max_size);
            g.nullable_values = s.nullable_elements;
            g.into()
        }
        TargetClass::Array { .. } => {
            let mut g = ArrayGenerator::new(s.collection_min_size, s.collection_max_size);
            g.subtype = Some(target.clone());
            g.nullable_elements = s.nullable_elements;
            g.into()
        }
        TargetClass::Optional => ContainerGenerator::optional().into(),
        TargetClass::Object(_) => return None,
    };
    Some(spec)
}

/// First plugin that offers a generator for `target`.
pub fn plugin_generator(
    providers: &[Box<dyn GeneratorProvider>],
    target: &TargetClass,
    settings: &Settings,
) -> Option<GeneratorSpec> {
    providers.iter().find_map(|p| {
        let spec = p.generator_for(target, settings)?;
        debug!(plugin = p.name(), target = %target, "plugin supplied generator");
        Some(spec)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{ConstantGenerator, GeneratorBody};
    use crate::node::IntKind;
    use crate::value::Value;

    struct Answer;

    impl GeneratorProvider for Answer {
        fn name(&self) -> &str {
            "answer"
        }

        fn generator_for(&self, target: &TargetClass, _settings: &Settings) -> Option<GeneratorSpec> {
            matches!(target, TargetClass::Int(_)).then(|| ConstantGenerator::new(Value::Int(42)).into())
        }
    }

    #[test]
    fn builtins_are_cached_per_target() {
        let resolver = GeneratorResolver::new();
        let s = Settings::default();
        assert!(resolver.builtin(&TargetClass::String, &s).is_some());
        assert!(resolver.builtin(&TargetClass::String, &s).is_some());
        assert!(resolver.builtin(&TargetClass::Object("X".into()), &s).is_none());
        assert_eq!(resolver.cached(), 2);
    }

    #[test]
    fn int_builtin_respects_kind() {
        let resolver = GeneratorResolver::new();
        let spec = resolver.builtin(&TargetClass::Int(IntKind::I8), &Settings::default()).unwrap();
        let GeneratorBody::Int(g) = spec.body() else { panic!("int") };
        assert_eq!((g.min, g.max), (1, 127));
    }

    #[test]
    fn first_plugin_with_a_generator_wins() {
        let providers: Vec<Box<dyn GeneratorProvider>> = vec![Box::new(Answer)];
        let s = Settings::default();
        assert!(plugin_generator(&providers, &TargetClass::Int(IntKind::I32), &s).is_some());
        assert!(plugin_generator(&providers, &TargetClass::String, &s).is_none());
    }
}
