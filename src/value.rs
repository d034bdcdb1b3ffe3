//! Dynamic value model produced by generators.
//!
//! Objects are shared, mutable and identity-keyed: two `ObjectRef`s are equal
//! only if they point at the same instance. Everything else compares by value.
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use ordered_float::OrderedFloat;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    Char(char),
    Str(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Enum(String),
    List(Vec<Value>),
    Set(Vec<Value>),         // insertion ordered, no duplicates
    Map(Vec<(Value, Value)>), // insertion ordered, unique keys
    Object(ObjectRef),
}

/// Opaque identity of an object instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

#[derive(Debug)]
pub struct Object {
    id: InstanceId,
    class: String,
    fields: IndexMap<String, Value>,
}

#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<Object>>);

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

// ————————————————————————————————————————————————————————————————————————————
// OBJECTS
// ————————————————————————————————————————————————————————————————————————————

impl InstanceId {
    fn next() -> Self {
        Self(NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ObjectRef {
    pub fn new(class: impl Into<String>) -> Self {
        Self(Rc::new(RefCell::new(Object {
            id: InstanceId::next(),
            class: class.into(),
            fields: IndexMap::new(),
        })))
    }

    pub fn id(&self) -> InstanceId {
        self.0.borrow().id
    }

    pub fn class(&self) -> String {
        self.0.borrow().class.clone()
    }

    pub fn get(&self, field: &str) -> Option<Value> {
        self.0.borrow().fields.get(field).cloned()
    }

    pub fn set(&self, field: impl Into<String>, value: Value) {
        self.0.borrow_mut().fields.insert(field.into(), value);
    }

    pub fn field_names(&self) -> Vec<String> {
        self.0.borrow().fields.keys().cloned().collect()
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ObjectRef {}

impl std::hash::Hash for ObjectRef {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

// Objects may reference their ancestors; never recurse into fields here.
impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = self.0.borrow();
        write!(f, "{}#{}", o.class, o.id)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// VALUES
// ————————————————————————————————————————————————————————————————————————————

impl Value {
    pub fn float(f: f64) -> Self {
        Value::Float(OrderedFloat(f))
    }

    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) | Value::Enum(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Short name of the value's shape, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Char(_) => "char",
            Value::Str(_) => "string",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::Enum(_) => "enum",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
        }
    }

    /// Zero-ish values that "populate nulls and default primitives" may overwrite.
    pub fn is_default_primitive(&self) -> bool {
        match self {
            Value::Bool(b) => !*b,
            Value::Int(i) => *i == 0,
            Value::Float(f) => f.0 == 0.0,
            Value::Char(c) => *c == '\0',
            _ => false,
        }
    }

    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Str(s) => Some(s.chars().count()),
            Value::List(xs) | Value::Set(xs) => Some(xs.len()),
            Value::Map(es) => Some(es.len()),
            _ => None,
        }
    }

    /// Append to a list/set (sets reject duplicates). Returns whether the value was added.
    pub fn push(&mut self, item: Value) -> bool {
        match self {
            Value::List(xs) => {
                xs.push(item);
                true
            }
            Value::Set(xs) => {
                if xs.contains(&item) {
                    false
                } else {
                    xs.push(item);
                    true
                }
            }
            _ => false,
        }
    }

    /// Insert into a map, replacing the value of an existing key.
    pub fn insert(&mut self, key: Value, value: Value) -> bool {
        match self {
            Value::Map(entries) => {
                match entries.iter_mut().find(|(k, _)| *k == key) {
                    Some(slot) => slot.1 = value,
                    None => entries.push((key, value)),
                }
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, item: &Value) -> bool {
        match self {
            Value::List(xs) | Value::Set(xs) => xs.contains(item),
            Value::Map(entries) => entries.iter().any(|(k, _)| k == item),
            _ => false,
        }
    }

    /// Convert a JSON literal (from a model file) into a value.
    /// JSON objects become string-keyed maps.
    pub fn from_json(json: &serde_json::Value) -> Self {
        use serde_json::Value as J;
        match json {
            J::Null => Value::Null,
            J::Bool(b) => Value::Bool(*b),
            J::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::float(n.as_f64().unwrap_or(f64::NAN)),
            },
            J::String(s) => Value::Str(s.clone()),
            J::Array(xs) => Value::List(xs.iter().map(Value::from_json).collect()),
            J::Object(m) => Value::Map(
                m.iter()
                    .map(|(k, v)| (Value::Str(k.clone()), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Render as JSON. An object reached again on the current path is
    /// emitted as `{"$ref": "Class#id"}`.
    pub fn to_json(&self) -> serde_json::Value {
        let mut on_path = HashSet::new();
        self.to_json_inner(&mut on_path)
    }

    fn to_json_inner(&self, on_path: &mut HashSet<InstanceId>) -> serde_json::Value {
        use serde_json::{json, Map, Value as J};
        match self {
            Value::Null => J::Null,
            Value::Bool(b) => J::Bool(*b),
            Value::Int(i) => json!(i),
            Value::Float(f) => json!(f.0),
            Value::Char(c) => J::String(c.to_string()),
            Value::Str(s) | Value::Enum(s) => J::String(s.clone()),
            Value::Date(d) => J::String(d.to_string()),
            Value::DateTime(dt) => J::String(dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
            Value::List(xs) | Value::Set(xs) => {
                J::Array(xs.iter().map(|x| x.to_json_inner(on_path)).collect())
            }
            Value::Map(entries) => {
                if entries.iter().all(|(k, _)| k.as_str().is_some()) {
                    let mut m = Map::new();
                    for (k, v) in entries {
                        let key = k.as_str().unwrap_or_default().to_string();
                        m.insert(key, v.to_json_inner(on_path));
                    }
                    J::Object(m)
                } else {
                    J::Array(
                        entries
                            .iter()
                            .map(|(k, v)| json!([k.to_json_inner(on_path), v.to_json_inner(on_path)]))
                            .collect(),
                    )
                }
            }
            Value::Object(o) => {
                let id = o.id();
                if !on_path.insert(id) {
                    return json!({ "$ref": format!("{o:?}") });
                }
                let mut m = Map::new();
                for name in o.field_names() {
                    let v = o.get(&name).unwrap_or(Value::Null);
                    m.insert(name, v.to_json_inner(on_path));
                }
                on_path.remove(&id);
                J::Object(m)
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{}", x.0),
            Value::Char(c) => write!(f, "{c}"),
            Value::Str(s) | Value::Enum(s) => write!(f, "{s}"),
            Value::Date(d) => write!(f, "{d}"),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            Value::List(xs) | Value::Set(xs) => {
                write!(f, "[")?;
                for (i, x) in xs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{x}")?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}={v}")?;
                }
                write!(f, "}}")
            }
            Value::Object(o) => write!(f, "{o:?}"),
        }
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn objects_compare_by_identity() {
        let a = ObjectRef::new("Person");
        let b = ObjectRef::new("Person");
        assert_ne!(Value::Object(a.clone()), Value::Object(b));
        assert_eq!(Value::Object(a.clone()), Value::Object(a));
    }

    #[test]
    fn set_rejects_duplicates_and_map_replaces() {
        let mut s = Value::Set(vec![]);
        assert!(s.push(Value::Int(1)));
        assert!(!s.push(Value::Int(1)));
        assert_eq!(s.len(), Some(1));

        let mut m = Value::Map(vec![]);
        m.insert(Value::str("k"), Value::Int(1));
        m.insert(Value::str("k"), Value::Int(2));
        assert_eq!(m, Value::Map(vec![(Value::str("k"), Value::Int(2))]));
    }

    #[test]
    fn cyclic_objects_render_as_refs() {
        let parent = ObjectRef::new("Parent");
        let child = ObjectRef::new("Child");
        child.set("parent", Value::Object(parent.clone()));
        parent.set("child", Value::Object(child));
        let out = Value::Object(parent.clone()).to_json();
        let reference = &out["child"]["parent"]["$ref"];
        assert_eq!(reference, &json!(format!("Parent#{}", parent.id())));
    }

    #[test]
    fn json_literals_round_into_values() {
        let v = Value::from_json(&json!({"a": [1, 2.5, "x", null]}));
        let Value::Map(entries) = v else { panic!("expected map") };
        assert_eq!(entries[0].0, Value::str("a"));
        assert_eq!(
            entries[0].1,
            Value::List(vec![Value::Int(1), Value::float(2.5), Value::str("x"), Value::Null])
        );
    }

    #[test]
    fn default_primitives_are_detected() {
        assert!(Value::Int(0).is_default_primitive());
        assert!(Value::Bool(false).is_default_primitive());
        assert!(!Value::str("").is_default_primitive());
    }
}
