//! Structural model of the type being populated.
//!
//! A [`NodeTree`] is an arena of [`Node`]s addressed by [`NodeId`]. Object nodes
//! have one child per declared field; lists, sets and arrays have a single
//! element child; maps have a key and a value child; optionals have one child.
//! A node whose object class already occurs among its ancestors is marked
//! `cyclic` and is not expanded further.
use std::fmt;

use indexmap::IndexMap;

use crate::constraint::Constraint;
use crate::error::FixtureError;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntKind { I8, I16, I32, I64, U8, U16, U32, U64 }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatKind { F32, F64 }

/// The concrete class a node resolves to (generic parameters already applied
/// through the node's children).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TargetClass {
    Bool,
    Char,
    Int(IntKind),
    Float(FloatKind),
    String,
    Date,
    DateTime,
    Enum { name: String, variants: Vec<String> },
    List,
    Set,
    Map,
    Array { len: Option<usize> },
    Optional,
    Object(String),
}

/// A type expression as declared on a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Scalar(TargetClass),
    List(Box<TypeExpr>),
    Set(Box<TypeExpr>),
    Map(Box<TypeExpr>, Box<TypeExpr>),
    Array(Box<TypeExpr>, Option<usize>),
    Optional(Box<TypeExpr>),
    Class(String),
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeExpr,
    pub constraints: Vec<Constraint>,
}

/// Class name -> ordered field declarations.
pub type ClassDecls = IndexMap<String, Vec<FieldDecl>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Scalar,
    Object,
    Collection,
    Map,
    Array,
    Container,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub target: TargetClass,
    pub field: Option<String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub kind: NodeKind,
    pub cyclic: bool,
    pub ignored: bool,
    pub constraints: Vec<Constraint>,
    pub depth: usize,
    /// Class declaring `field`, if this node is a field of an object.
    pub declaring_class: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NodeTree {
    nodes: Vec<Node>,
}

// ————————————————————————————————————————————————————————————————————————————
// TARGET CLASSES
// ————————————————————————————————————————————————————————————————————————————

impl IntKind {
    pub fn bounds(self) -> (i64, i64) {
        match self {
            IntKind::I8 => (i8::MIN as i64, i8::MAX as i64),
            IntKind::I16 => (i16::MIN as i64, i16::MAX as i64),
            IntKind::I32 => (i32::MIN as i64, i32::MAX as i64),
            IntKind::I64 => (i64::MIN, i64::MAX),
            IntKind::U8 => (0, u8::MAX as i64),
            IntKind::U16 => (0, u16::MAX as i64),
            IntKind::U32 => (0, u32::MAX as i64),
            IntKind::U64 => (0, i64::MAX),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            IntKind::I8 => "i8",
            IntKind::I16 => "i16",
            IntKind::I32 => "i32",
            IntKind::I64 => "i64",
            IntKind::U8 => "u8",
            IntKind::U16 => "u16",
            IntKind::U32 => "u32",
            IntKind::U64 => "u64",
        }
    }
}

impl TargetClass {
    pub fn name(&self) -> String {
        match self {
            TargetClass::Bool => "bool".into(),
            TargetClass::Char => "char".into(),
            TargetClass::Int(k) => k.name().into(),
            TargetClass::Float(FloatKind::F32) => "f32".into(),
            TargetClass::Float(FloatKind::F64) => "f64".into(),
            TargetClass::String => "String".into(),
            TargetClass::Date => "Date".into(),
            TargetClass::DateTime => "DateTime".into(),
            TargetClass::Enum { name, .. } => name.clone(),
            TargetClass::List => "List".into(),
            TargetClass::Set => "Set".into(),
            TargetClass::Map => "Map".into(),
            TargetClass::Array { len: Some(n) } => format!("Array[{n}]"),
            TargetClass::Array { len: None } => "Array".into(),
            TargetClass::Optional => "Optional".into(),
            TargetClass::Object(name) => name.clone(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            TargetClass::Object(_) => NodeKind::Object,
            TargetClass::List | TargetClass::Set => NodeKind::Collection,
            TargetClass::Map => NodeKind::Map,
            TargetClass::Array { .. } => NodeKind::Array,
            TargetClass::Optional => NodeKind::Container,
            _ => NodeKind::Scalar,
        }
    }

    /// Instances that the back-reference store may record.
    pub fn is_pojo(&self) -> bool {
        matches!(self, TargetClass::Object(_))
    }
}

impl fmt::Display for TargetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl TypeExpr {
    pub fn target(&self) -> TargetClass {
        match self {
            TypeExpr::Scalar(t) => t.clone(),
            TypeExpr::List(_) => TargetClass::List,
            TypeExpr::Set(_) => TargetClass::Set,
            TypeExpr::Map(_, _) => TargetClass::Map,
            TypeExpr::Array(_, len) => TargetClass::Array { len: *len },
            TypeExpr::Optional(_) => TargetClass::Optional,
            TypeExpr::Class(name) => TargetClass::Object(name.clone()),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// NODES
// ————————————————————————————————————————————————————————————————————————————

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl Node {
    /// `<depth:Declaring: Target field>` for fields, `<depth:Target>` otherwise.
    pub fn display(&self) -> String {
        match (&self.declaring_class, &self.field) {
            (Some(owner), Some(field)) => {
                format!("<{}:{}: {} {}>", self.depth, owner, self.target.name(), field)
            }
            _ => format!("<{}:{}>", self.depth, self.target.name()),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl NodeTree {
    /// Build the tree for `root`, expanding class declarations up to `max_depth`.
    pub fn build(root: &TypeExpr, classes: &ClassDecls, max_depth: usize) -> Result<Self, FixtureError> {
        let mut tree = NodeTree::default();
        tree.add(root, None, None, Vec::new(), classes, max_depth)?;
        Ok(tree)
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn parent(&self, id: NodeId) -> Option<&Node> {
        self.node(id).parent.map(|p| self.node(p))
    }

    /// Ancestors from the direct parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = &Node> {
        std::iter::successors(self.parent(id), |n| n.parent.map(|p| self.node(p)))
    }

    /// Marks every node for which `ignored` holds; population never descends into it.
    pub fn mark_ignored(&mut self, mut ignored: impl FnMut(&NodeTree, &Node) -> bool) {
        let hits: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|n| ignored(self, n))
            .map(|n| n.id)
            .collect();
        for id in hits {
            self.nodes[id.0].ignored = true;
        }
    }

    /// Multi-line block listing the path from the root down to `id`.
    pub fn format_path_to_root(&self, id: NodeId, indent: &str) -> String {
        let mut chain: Vec<&Node> = self.ancestors(id).collect();
        chain.reverse();
        chain.push(self.node(id));
        let mut out = String::new();
        for (i, n) in chain.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(indent);
            out.push_str(&"  ".repeat(i));
            if i > 0 {
                out.push_str("└──");
            }
            out.push_str(&n.display());
        }
        out
    }

    /// Indented listing of the whole tree (the `nodes` CLI command).
    pub fn format_tree(&self) -> String {
        let mut out = String::new();
        if !self.nodes.is_empty() {
            self.format_subtree(self.root(), 0, &mut out);
        }
        out
    }

    fn format_subtree(&self, id: NodeId, level: usize, out: &mut String) {
        let n = self.node(id);
        out.push_str(&"  ".repeat(level));
        out.push_str(&n.display());
        if n.cyclic {
            out.push_str(" (cyclic)");
        }
        if n.ignored {
            out.push_str(" (ignored)");
        }
        out.push('\n');
        for &child in &n.children {
            self.format_subtree(child, level + 1, out);
        }
    }

    fn add(
        &mut self,
        ty: &TypeExpr,
        field: Option<&FieldDecl>,
        parent: Option<NodeId>,
        element_constraints: Vec<Constraint>,
        classes: &ClassDecls,
        max_depth: usize,
    ) -> Result<NodeId, FixtureError> {
        let id = NodeId(self.nodes.len());
        let depth = parent.map(|p| self.node(p).depth + 1).unwrap_or(0);
        let target = ty.target();
        let declaring_class = match (field, parent) {
            (Some(_), Some(p)) => match &self.node(p).target {
                TargetClass::Object(owner) => Some(owner.clone()),
                _ => None,
            },
            _ => None,
        };
        let cyclic = match (&target, parent) {
            (TargetClass::Object(_), Some(p)) => {
                self.node(p).target == target || self.ancestors(p).any(|a| a.target == target)
            }
            _ => false,
        };
        let constraints = match field {
            Some(f) => f.constraints.clone(),
            None => element_constraints,
        };

        self.nodes.push(Node {
            id,
            kind: target.kind(),
            target: target.clone(),
            field: field.map(|f| f.name.clone()),
            parent,
            children: Vec::new(),
            cyclic,
            ignored: false,
            constraints,
            depth,
            declaring_class,
        });

        if cyclic || depth >= max_depth {
            return Ok(id);
        }

        let children = match ty {
            TypeExpr::Scalar(_) => Vec::new(),
            TypeExpr::List(item) | TypeExpr::Set(item) | TypeExpr::Array(item, _) | TypeExpr::Optional(item) => {
                vec![self.add(item, None, Some(id), Vec::new(), classes, max_depth)?]
            }
            TypeExpr::Map(key, value) => vec![
                self.add(key, None, Some(id), Vec::new(), classes, max_depth)?,
                self.add(value, None, Some(id), Vec::new(), classes, max_depth)?,
            ],
            TypeExpr::Class(name) => {
                let fields = classes.get(name).ok_or_else(|| {
                    FixtureError::config(format!("class '{name}' is referenced but not declared"))
                })?;
                let mut ids = Vec::with_capacity(fields.len());
                for f in fields {
                    ids.push(self.add(&f.ty, Some(f), Some(id), Vec::new(), classes, max_depth)?);
                }
                ids
            }
        };
        self.nodes[id.0].children = children;
        Ok(id)
    }
}

// ------------------------------- Tests ------------------------------------ //
