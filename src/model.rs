//! Model files: the JSON description of what to generate.
//!
//! ```json
//! {
//!   "root": "Person",
//!   "classes": {
//!     "Person": {
//!       "name": "string",
//!       "age": { "type": "i32", "constraints": [{ "min": 18 }] },
//!       "tags": "set<string>"
//!     }
//!   },
//!   "generators": [{ "select": "Person.name", "string": { "alphabet": "lower" } }],
//!   "assign": [{ "origin": "Person.name", "destination": "Person.nickname" }]
//! }
//! ```
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::assignment::{AssignAction, AssignmentRule, Predicate, ValueMapper};
use crate::constraint::Constraint;
use crate::context::ModelContext;
use crate::error::FixtureError;
use crate::generator::{
    Alphabet, ArrayGenerator, BoolGenerator, CollectionGenerator, ConstantGenerator, EmitGenerator,
    FloatGenerator, GeneratorSpec, IntGenerator, MapGenerator, OneOfGenerator, StringGenerator,
    TemporalGenerator, TemporalKind, TemporalRange, WhenEmpty,
};
use crate::node::{ClassDecls, FieldDecl, FloatKind, IntKind, NodeTree, TargetClass, TypeExpr};
use crate::populate;
use crate::post_process::ConditionalRewrite;
use crate::random::Random;
use crate::selector::Selector;
use crate::settings::Settings;
use crate::value::Value;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelSpec {
    /// Type expression of the value to generate.
    pub root: String,
    #[serde(default)]
    pub classes: IndexMap<String, IndexMap<String, FieldSpec>>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub generators: Vec<GeneratorRule>,
    #[serde(default)]
    pub ignore: Vec<Selector>,
    #[serde(default)]
    pub nullable: Vec<Selector>,
    #[serde(default)]
    pub assign: Vec<AssignDecl>,
    #[serde(default)]
    pub post_process: Vec<RewriteDecl>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FieldSpec {
    Type(String),
    Detailed {
        #[serde(rename = "type")]
        ty: String,
        #[serde(default)]
        constraints: Vec<Constraint>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorRule {
    pub select: Selector,
    #[serde(default)]
    pub nullable: bool,
    #[serde(flatten)]
    pub generator: GeneratorDecl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    List,
    Set,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorDecl {
    Bool {},
    Int {
        min: Option<i64>,
        max: Option<i64>,
    },
    Float {
        min: Option<f64>,
        max: Option<f64>,
    },
    String {
        min_length: Option<usize>,
        max_length: Option<usize>,
        #[serde(default)]
        alphabet: Alphabet,
        prefix: Option<String>,
    },
    Date {
        #[serde(default)]
        range: TemporalRange,
        days: Option<i64>,
    },
    Datetime {
        #[serde(default)]
        range: TemporalRange,
        days: Option<i64>,
    },
    /// Without `kind` the collection delegates to the node's own class.
    Collection {
        kind: Option<CollectionKind>,
        min_size: Option<usize>,
        max_size: Option<usize>,
        #[serde(default)]
        unique: bool,
        #[serde(default)]
        nullable_elements: bool,
        #[serde(default)]
        with_elements: Vec<JsonValue>,
        #[serde(default)]
        shuffle: bool,
    },
    Map {
        min_size: Option<usize>,
        max_size: Option<usize>,
        #[serde(default)]
        nullable_keys: bool,
        #[serde(default)]
        nullable_values: bool,
        #[serde(default)]
        with_keys: Vec<JsonValue>,
        #[serde(default)]
        with_entries: Vec<(JsonValue, JsonValue)>,
    },
    Array {
        min_length: Option<usize>,
        max_length: Option<usize>,
        #[serde(default)]
        nullable_elements: bool,
        #[serde(default)]
        with_elements: Vec<JsonValue>,
        #[serde(default)]
        shuffle: bool,
    },
    Emit {
        items: Vec<JsonValue>,
        #[serde(default)]
        when_empty: WhenEmpty,
    },
    Value(JsonValue),
    OneOf(Vec<JsonValue>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateDecl {
    Equals(JsonValue),
    IsIn(Vec<JsonValue>),
    IsNull,
    NotNull,
    Matches(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapperDecl {
    Constant(JsonValue),
    Prefix(String),
    Suffix(String),
    Uppercase,
    Lowercase,
}

/// One assignment rule. Exactly one of `value`, `generate` or a plain copy
/// (optionally with `map`) is given; copies and conditions need an origin.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssignDecl {
    pub origin: Option<Selector>,
    pub when: Option<PredicateDecl>,
    pub destination: Selector,
    pub value: Option<JsonValue>,
    pub generate: Option<GeneratorDecl>,
    pub map: Option<MapperDecl>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RewriteDecl {
    pub select: Selector,
    pub when: Option<PredicateDecl>,
    pub value: Option<JsonValue>,
    pub map: Option<MapperDecl>,
}

/// A compiled model: the context and the node tree of its root.
pub struct Fixture {
    pub context: ModelContext,
    pub tree: NodeTree,
}

// ————————————————————————————————————————————————————————————————————————————
// LOADING
// ————————————————————————————————————————————————————————————————————————————

impl ModelSpec {
    pub fn from_json_str(src: &str) -> Result<Self, FixtureError> {
        crate::path_de::from_str_with_path(src)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| FixtureError::config(format!("failed to read {}: {e}", path.display())))?;
        crate::path_de::from_slice_with_path(&bytes)
            .map_err(|e| FixtureError::config(format!("{}: {e}", path.display())))
    }

    pub fn class_decls(&self) -> Result<ClassDecls, FixtureError> {
        let mut classes = ClassDecls::new();
        for (class, fields) in &self.classes {
            let mut decls = Vec::with_capacity(fields.len());
            for (name, spec) in fields {
                let (ty, constraints) = match spec {
                    FieldSpec::Type(ty) => (ty, Vec::new()),
                    FieldSpec::Detailed { ty, constraints } => (ty, constraints.clone()),
                };
                let ty = parse_type(ty)
                    .map_err(|e| FixtureError::config(format!("field {class}.{name}: {e}")))?;
                decls.push(FieldDecl { name: name.clone(), ty, constraints });
            }
            classes.insert(class.clone(), decls);
        }
        Ok(classes)
    }

    /// Node tree of the root type, without ignores applied.
    pub fn tree(&self) -> Result<NodeTree, FixtureError> {
        let root = parse_type(&self.root)?;
        NodeTree::build(&root, &self.class_decls()?, self.settings.max_depth)
    }

    pub fn context(&self) -> Result<ModelContext, FixtureError> {
        self.settings.validate()?;
        let s = &self.settings;
        let mut context = ModelContext::new(s.clone());
        for rule in &self.generators {
            let spec = rule.generator.spec(s)?.nullable(rule.nullable);
            context = context.generator(rule.select.clone(), spec);
        }
        for selector in &self.ignore {
            context = context.ignore(selector.clone());
        }
        for selector in &self.nullable {
            context = context.with_nullable(selector.clone());
        }
        for decl in &self.assign {
            context = context.assign(decl.rule(s)?);
        }
        for decl in &self.post_process {
            context = context.post_processor(Box::new(decl.rewrite()?));
        }
        Ok(context)
    }

    pub fn compile(&self) -> Result<Fixture, FixtureError> {
        let context = self.context()?;
        let mut tree = self.tree()?;
        context.apply_ignores(&mut tree);
        debug!(root = %self.root, nodes = tree.len(), rules = context.assignments().len(), "compiled model");
        Ok(Fixture { context, tree })
    }
}

impl Fixture {
    pub fn generate(&self, random: Random) -> Result<Value, FixtureError> {
        populate::populate(&self.context, &self.tree, random)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// DECLARATIONS → RUNTIME
// ————————————————————————————————————————————————————————————————————————————

fn values(items: &[JsonValue]) -> Vec<Value> {
    items.iter().map(Value::from_json).collect()
}

impl CollectionKind {
    fn target(self) -> TargetClass {
        match self {
            CollectionKind::List => TargetClass::List,
            CollectionKind::Set => TargetClass::Set,
        }
    }
}

impl GeneratorDecl {
    pub fn spec(&self, s: &Settings) -> Result<GeneratorSpec, FixtureError> {
        let spec: GeneratorSpec = match self {
            GeneratorDecl::Bool {} => BoolGenerator.into(),
            GeneratorDecl::Int { min, max } => {
                IntGenerator::new(min.unwrap_or(s.int_min), max.unwrap_or(s.int_max)).into()
            }
            GeneratorDecl::Float { min, max } => {
                FloatGenerator::new(min.unwrap_or(s.float_min), max.unwrap_or(s.float_max)).into()
            }
            GeneratorDecl::String { min_length, max_length, alphabet, prefix } => {
                let mut g = StringGenerator::new(
                    min_length.unwrap_or(s.string_min_length),
                    max_length.unwrap_or(s.string_max_length),
                )
                .alphabet(*alphabet);
                if let Some(prefix) = prefix {
                    g = g.prefix(prefix.clone());
                }
                g.into()
            }
            GeneratorDecl::Date { range, days } => {
                TemporalGenerator::new(TemporalKind::Date, days.unwrap_or(s.temporal_range_days))
                    .range(*range)
                    .into()
            }
            GeneratorDecl::Datetime { range, days } => {
                TemporalGenerator::new(TemporalKind::DateTime, days.unwrap_or(s.temporal_range_days))
                    .range(*range)
                    .into()
            }
            GeneratorDecl::Collection { kind, min_size, max_size, unique, nullable_elements, with_elements, shuffle } => {
                let mut g = CollectionGenerator::new(kind.map(CollectionKind::target), s.collection_min_size, s.collection_max_size);
                g.set_size(*min_size, *max_size);
                g.unique = *unique;
                g.nullable_elements = *nullable_elements;
                g.with_elements = values(with_elements);
                g.shuffle = *shuffle;
                g.into()
            }
            GeneratorDecl::Map { min_size, max_size, nullable_keys, nullable_values, with_keys, with_entries } => {
                let mut g = MapGenerator::new(s.collection_min_size, s.collection_max_size);
                g.set_size(*min_size, *max_size);
                g.nullable_keys = *nullable_keys;
                g.nullable_values = *nullable_values;
                g.with_keys = values(with_keys);
                g.with_entries = with_entries
                    .iter()
                    .map(|(k, v)| (Value::from_json(k), Value::from_json(v)))
                    .collect();
                g.into()
            }
            GeneratorDecl::Array { min_length, max_length, nullable_elements, with_elements, shuffle } => {
                let mut g = ArrayGenerator::new(s.collection_min_size, s.collection_max_size);
                g.set_length(*min_length, *max_length);
                g.nullable_elements = *nullable_elements;
                g.with_elements = values(with_elements);
                g.shuffle = *shuffle;
                g.into()
            }
            GeneratorDecl::Emit { items, when_empty } => EmitGenerator::new(values(items), *when_empty).into(),
            GeneratorDecl::Value(v) => ConstantGenerator::new(Value::from_json(v)).into(),
            GeneratorDecl::OneOf(items) => {
                if items.is_empty() {
                    return Err(FixtureError::config("one_of requires at least one item"));
                }
                OneOfGenerator::new(values(items)).into()
            }
        };
        Ok(spec)
    }
}

impl PredicateDecl {
    pub fn predicate(&self) -> Result<Predicate, FixtureError> {
        Ok(match self {
            PredicateDecl::Equals(v) => Predicate::equals(Value::from_json(v)),
            PredicateDecl::IsIn(vs) => Predicate::is_in(values(vs)),
            PredicateDecl::IsNull => Predicate::is_null(),
            PredicateDecl::NotNull => Predicate::not_null(),
            PredicateDecl::Matches(pattern) => Predicate::matches(pattern)?,
        })
    }
}

fn rendered(value: &Value) -> String {
    match value {
        Value::Str(s) => s.clone(),
        other => other.to_string(),
    }
}

impl MapperDecl {
    pub fn mapper(&self) -> ValueMapper {
        match self {
            MapperDecl::Constant(v) => ValueMapper::constant(Value::from_json(v)),
            MapperDecl::Prefix(prefix) => {
                let prefix = prefix.clone();
                ValueMapper::new(format!("prefix({prefix})"), move |v, _| Ok(Value::Str(format!("{prefix}{}", rendered(v)))))
            }
            MapperDecl::Suffix(suffix) => {
                let suffix = suffix.clone();
                ValueMapper::new(format!("suffix({suffix})"), move |v, _| Ok(Value::Str(format!("{}{suffix}", rendered(v)))))
            }
            MapperDecl::Uppercase => ValueMapper::new("uppercase", |v, _| Ok(Value::Str(rendered(v).to_uppercase()))),
            MapperDecl::Lowercase => ValueMapper::new("lowercase", |v, _| Ok(Value::Str(rendered(v).to_lowercase()))),
        }
    }
}

impl AssignDecl {
    pub fn rule(&self, s: &Settings) -> Result<AssignmentRule, FixtureError> {
        let invalid = |msg: &str| FixtureError::config(format!("assignment to [{}]: {msg}", self.destination));
        let action = match (&self.value, &self.generate, &self.map) {
            (Some(v), None, None) => match self.origin {
                Some(_) => AssignAction::Copy { mapper: Some(ValueMapper::constant(Value::from_json(v))) },
                None => AssignAction::Generate(ConstantGenerator::new(Value::from_json(v)).into()),
            },
            (None, Some(g), None) => AssignAction::Generate(g.spec(s)?),
            (None, None, mapper) => {
                if self.origin.is_none() {
                    return Err(invalid("copying requires an origin"));
                }
                AssignAction::Copy { mapper: mapper.as_ref().map(MapperDecl::mapper) }
            }
            _ => return Err(invalid("give only one of `value`, `generate` or `map`")),
        };
        if self.origin.is_none() && self.when.is_some() {
            return Err(invalid("a `when` condition requires an origin"));
        }
        Ok(AssignmentRule {
            origin: self.origin.clone(),
            predicate: self.when.as_ref().map(PredicateDecl::predicate).transpose()?,
            destination: self.destination.clone(),
            action,
        })
    }
}

impl RewriteDecl {
    pub fn rewrite(&self) -> Result<ConditionalRewrite, FixtureError> {
        let mapper = match (&self.value, &self.map) {
            (Some(v), None) => ValueMapper::constant(Value::from_json(v)),
            (None, Some(m)) => m.mapper(),
            _ => {
                return Err(FixtureError::config(format!(
                    "post_process for [{}]: give exactly one of `value` or `map`",
                    self.select
                )));
            }
        };
        let predicate = match &self.when {
            Some(p) => p.predicate()?,
            None => Predicate::custom("always", |_| Ok(true)),
        };
        Ok(ConditionalRewrite::new(self.select.clone(), predicate, mapper))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TYPE EXPRESSIONS
// ————————————————————————————————————————————————————————————————————————————

/// Parse a field type: scalars (`string`, `i32`, `date`, ...), generics
/// (`list<T>`, `set<T>`, `map<K, V>`, `array<T>`, `array<T; 4>`, `option<T>`),
/// enums (`Status(ACTIVE|CLOSED)`) and class names.
pub fn parse_type(src: &str) -> Result<TypeExpr, FixtureError> {
    let mut parser = TypeParser { src, pos: 0 };
    let ty = parser.parse()?;
    parser.skip_ws();
    if parser.pos != src.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(ty)
}

struct TypeParser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> TypeParser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.rest().starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), FixtureError> {
        if self.eat(c) { Ok(()) } else { Err(self.error(&format!("expected '{c}'"))) }
    }

    fn take_while(&mut self, accept: impl Fn(char) -> bool) -> &'a str {
        self.skip_ws();
        let rest = self.rest();
        let len = rest.find(|c: char| !accept(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn ident(&mut self) -> Result<&'a str, FixtureError> {
        match self.take_while(|c| c.is_ascii_alphanumeric() || c == '_') {
            "" => Err(self.error("expected a name")),
            ident => Ok(ident),
        }
    }

    fn number(&mut self) -> Result<usize, FixtureError> {
        self.take_while(|c| c.is_ascii_digit())
            .parse()
            .map_err(|_| self.error("expected an array length"))
    }

    fn error(&self, message: &str) -> FixtureError {
        FixtureError::config(format!("invalid type '{}': {message} at offset {}", self.src, self.pos))
    }

    fn inner(&mut self) -> Result<Box<TypeExpr>, FixtureError> {
        self.expect('<')?;
        let inner = self.parse()?;
        self.expect('>')?;
        Ok(Box::new(inner))
    }

    fn parse(&mut self) -> Result<TypeExpr, FixtureError> {
        let name = self.ident()?;
        if self.eat('(') {
            let mut variants = vec![self.ident()?.to_string()];
            while self.eat('|') {
                variants.push(self.ident()?.to_string());
            }
            self.expect(')')?;
            return Ok(TypeExpr::Scalar(TargetClass::Enum { name: name.to_string(), variants }));
        }
        Ok(match name {
            "list" => TypeExpr::List(self.inner()?),
            "set" => TypeExpr::Set(self.inner()?),
            "option" => TypeExpr::Optional(self.inner()?),
            "map" => {
                self.expect('<')?;
                let key = self.parse()?;
                self.expect(',')?;
                let value = self.parse()?;
                self.expect('>')?;
                TypeExpr::Map(Box::new(key), Box::new(value))
            }
            "array" => {
                self.expect('<')?;
                let element = self.parse()?;
                let len = if self.eat(';') { Some(self.number()?) } else { None };
                self.expect('>')?;
                TypeExpr::Array(Box::new(element), len)
            }
            other => match scalar(other) {
                Some(target) => TypeExpr::Scalar(target),
                None => TypeExpr::Class(other.to_string()),
            },
        })
    }
}

fn scalar(name: &str) -> Option<TargetClass> {
    Some(match name {
        "bool" => TargetClass::Bool,
        "char" => TargetClass::Char,
        "string" | "String" => TargetClass::String,
        "i8" => TargetClass::Int(IntKind::I8),
        "i16" => TargetClass::Int(IntKind::I16),
        "i32" => TargetClass::Int(IntKind::I32),
        "i64" => TargetClass::Int(IntKind::I64),
        "u8" => TargetClass::Int(IntKind::U8),
        "u16" => TargetClass::Int(IntKind::U16),
        "u32" => TargetClass::Int(IntKind::U32),
        "u64" => TargetClass::Int(IntKind::U64),
        "f32" => TargetClass::Float(FloatKind::F32),
        "f64" => TargetClass::Float(FloatKind::F64),
        "date" => TargetClass::Date,
        "datetime" => TargetClass::DateTime,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERSON: &str = r#"{
        "root": "Person",
        "classes": {
            "Person": {
                "name": "string",
                "age": { "type": "i32", "constraints": [{ "min": 18 }, { "max": 20 }] },
                "country": "string",
                "currency": "string",
                "tags": "set<string>",
                "status": "Status(ACTIVE|CLOSED)"
            }
        },
        "settings": { "seed": 4 },
        "generators": [
            { "select": "Person.country", "one_of": ["US", "DE"] },
            { "select": ".tags", "collection": { "min_size": 1, "max_size": 1 } }
        ],
        "assign": [
            { "origin": "Person.country", "when": { "equals": "US" }, "destination": "Person.currency", "value": "USD" },
            { "origin": "Person.country", "when": { "equals": "DE" }, "destination": "Person.currency", "value": "EUR" }
        ]
    }"#;

    #[test]
    fn parses_type_expressions() {
        assert_eq!(parse_type("string").unwrap(), TypeExpr::Scalar(TargetClass::String));
        assert_eq!(
            parse_type("map<string, list<Item>>").unwrap(),
            TypeExpr::Map(
                Box::new(TypeExpr::Scalar(TargetClass::String)),
                Box::new(TypeExpr::List(Box::new(TypeExpr::Class("Item".into())))),
            )
        );
        assert_eq!(
            parse_type("array<u8; 4>").unwrap(),
            TypeExpr::Array(Box::new(TypeExpr::Scalar(TargetClass::Int(IntKind::U8))), Some(4))
        );
        assert_eq!(
            parse_type("Status(A|B)").unwrap(),
            TypeExpr::Scalar(TargetClass::Enum { name: "Status".into(), variants: vec!["A".into(), "B".into()] })
        );
    }

    #[test]
    fn malformed_types_are_config_errors() {
        for bad in ["list<string", "map<string>", "array<i8; x>", "", "list<string>>"] {
            let err = parse_type(bad).unwrap_err();
            assert!(matches!(err, FixtureError::Config(_)), "{bad}: {err}");
        }
    }

    #[test]
    fn compiles_and_generates_a_person() {
        let model = ModelSpec::from_json_str(PERSON).unwrap();
        let fixture = model.compile().unwrap();
        for seed in 0..10 {
            let v = fixture.generate(Random::new(seed)).unwrap();
            let person = v.as_object().unwrap();
            let age = person.get("age").and_then(|v| v.as_i64()).unwrap();
            assert!((18..=20).contains(&age));
            let currency = match person.get("country").and_then(|c| c.as_str().map(str::to_string)).as_deref() {
                Some("US") => "USD",
                Some("DE") => "EUR",
                other => panic!("unexpected country {other:?}"),
            };
            assert_eq!(person.get("currency"), Some(Value::str(currency)));
            assert_eq!(person.get("tags").and_then(|t| t.len()), Some(1));
            assert!(matches!(person.get("status"), Some(Value::Enum(_))));
        }
    }

    #[test]
    fn bad_model_reports_json_path() {
        let err = ModelSpec::from_json_str(r#"{"root": "X", "generators": [{"select": "X.a", "int": {"min": "low"}}]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("generators[0]"), "{err}");
    }

    #[test]
    fn assignment_declarations_are_checked() {
        let copy_without_origin: AssignDecl =
            serde_json::from_str(r#"{"destination": "A.b"}"#).unwrap();
        assert!(copy_without_origin.rule(&Settings::default()).is_err());

        let both: AssignDecl =
            serde_json::from_str(r#"{"origin": "A.a", "destination": "A.b", "value": 1, "map": "uppercase"}"#).unwrap();
        assert!(both.rule(&Settings::default()).is_err());

        let mapped: AssignDecl =
            serde_json::from_str(r#"{"origin": "A.a", "destination": "A.b", "map": {"prefix": "id-"}}"#).unwrap();
        let rule = mapped.rule(&Settings::default()).unwrap();
        let AssignAction::Copy { mapper: Some(mapper) } = rule.action else { panic!("copy with mapper") };
        let out = mapper.apply(&Value::str("7"), &mut Random::new(1)).unwrap();
        assert_eq!(out, Value::str("id-7"));
    }

    #[test]
    fn undeclared_class_fails_to_compile() {
        let model = ModelSpec::from_json_str(r#"{"root": "list<Ghost>"}"#).unwrap();
        assert!(matches!(model.compile(), Err(FixtureError::Config(_))));
    }
}
