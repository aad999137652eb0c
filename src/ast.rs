//! Variable tree built from a DDS and annotated from a DAS.

use serde::Serialize;
use std::collections::BTreeMap;

/// Attribute name → value, populated by the DAS pass.
pub type Attributes = BTreeMap<String, AttrValue>;

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Int(i64),
    Float(f64),
    Text(String),
    /// Two or more comma-separated values of one declaration.
    List(Vec<AttrValue>),
    /// Nested attribute group.
    Map(Attributes),
    /// Alias that resolved to a variable: holds the variable's id.
    Variable(String),
}

impl AttrValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Int(i) => Some(*i as f64),
            AttrValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttrValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[AttrValue]> {
        match self {
            AttrValue::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Attributes> {
        match self {
            AttrValue::Map(m) => Some(m),
            _ => None,
        }
    }
}

/// Atomic DAP types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Byte,
    Int,
    UInt,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Float32,
    Float64,
    String,
    Url,
    Alias,
}

impl DataType {
    pub const ALL: [DataType; 12] = [
        DataType::Byte,
        DataType::Int,
        DataType::UInt,
        DataType::Int16,
        DataType::UInt16,
        DataType::Int32,
        DataType::UInt32,
        DataType::Float32,
        DataType::Float64,
        DataType::String,
        DataType::Url,
        DataType::Alias,
    ];

    /// Case-insensitive lookup of a type keyword.
    pub fn from_name(name: &str) -> Option<DataType> {
        DataType::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(name))
    }

    pub fn name(self) -> &'static str {
        match self {
            DataType::Byte => "byte",
            DataType::Int => "int",
            DataType::UInt => "uint",
            DataType::Int16 => "int16",
            DataType::UInt16 => "uint16",
            DataType::Int32 => "int32",
            DataType::UInt32 => "uint32",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
            DataType::String => "string",
            DataType::Url => "url",
            DataType::Alias => "alias",
        }
    }

    /// Text-valued on the wire (length-prefixed, no repeated array count).
    pub fn is_text(self) -> bool {
        matches!(self, DataType::String | DataType::Url)
    }
}

/// Atomic leaf: type plus array shape. Empty shape means scalar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseVar {
    pub data_type: DataType,
    /// One entry per bracketed clause; `None` for `[n]` without a name.
    pub dimensions: Vec<Option<String>>,
    pub shape: Vec<usize>,
}

impl BaseVar {
    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty()
    }

    /// Number of elements a decoded value holds (saturating).
    pub fn size(&self) -> usize {
        self.shape.iter().fold(1usize, |acc, &d| acc.saturating_mul(d))
    }
}

/// Children of a container in declaration order; names are unique.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Children(Vec<DapVar>);

impl Children {
    pub fn new() -> Self {
        Children(Vec::new())
    }

    /// Add a child. A later declaration with the same name replaces the earlier one in place.
    pub fn insert(&mut self, var: DapVar) {
        match self.0.iter_mut().find(|c| c.name == var.name) {
            Some(slot) => *slot = var,
            None => self.0.push(var),
        }
    }

    pub fn get(&self, name: &str) -> Option<&DapVar> {
        self.0.iter().find(|c| c.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut DapVar> {
        self.0.iter_mut().find(|c| c.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DapVar> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, DapVar> {
        self.0.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Children {
    type Item = &'a DapVar;
    type IntoIter = std::slice::Iter<'a, DapVar>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Dependent array plus its coordinate maps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grid {
    /// Always a [`VarKind::Base`] node.
    pub array: Box<DapVar>,
    /// Base nodes only.
    pub maps: Children,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum VarKind {
    Dataset { children: Children },
    Structure { children: Children },
    Sequence { children: Children },
    Grid(Grid),
    Base(BaseVar),
}

/// A node of the variable tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DapVar {
    pub name: String,
    /// Dotted path from the dataset root; the root's id is its name.
    pub id: String,
    pub attributes: Attributes,
    #[serde(flatten)]
    pub kind: VarKind,
}

impl DapVar {
    pub fn new(name: impl Into<String>, kind: VarKind) -> Self {
        DapVar {
            name: name.into(),
            id: String::new(),
            attributes: Attributes::new(),
            kind,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            VarKind::Dataset { .. } => "Dataset",
            VarKind::Structure { .. } => "Structure",
            VarKind::Sequence { .. } => "Sequence",
            VarKind::Grid(_) => "Grid",
            VarKind::Base(_) => "Base",
        }
    }

    /// Children of Dataset/Structure/Sequence nodes.
    pub fn children(&self) -> Option<&Children> {
        match &self.kind {
            VarKind::Dataset { children }
            | VarKind::Structure { children }
            | VarKind::Sequence { children } => Some(children),
            _ => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Children> {
        match &mut self.kind {
            VarKind::Dataset { children }
            | VarKind::Structure { children }
            | VarKind::Sequence { children } => Some(children),
            _ => None,
        }
    }

    pub fn child(&self, name: &str) -> Option<&DapVar> {
        self.children().and_then(|c| c.get(name))
    }

    pub fn as_base(&self) -> Option<&BaseVar> {
        match &self.kind {
            VarKind::Base(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_grid(&self) -> Option<&Grid> {
        match &self.kind {
            VarKind::Grid(g) => Some(g),
            _ => None,
        }
    }

    /// Every structural node below this one, in declaration order.
    /// Grids yield their array first, then their maps.
    pub fn components(&self) -> Vec<&DapVar> {
        match &self.kind {
            VarKind::Grid(g) => std::iter::once(g.array.as_ref()).chain(g.maps.iter()).collect(),
            VarKind::Base(_) => Vec::new(),
            _ => self.children().map(|c| c.iter().collect()).unwrap_or_default(),
        }
    }

    fn components_mut(&mut self) -> Vec<&mut DapVar> {
        match &mut self.kind {
            VarKind::Grid(g) => std::iter::once(g.array.as_mut()).chain(g.maps.iter_mut()).collect(),
            VarKind::Base(_) => Vec::new(),
            VarKind::Dataset { children }
            | VarKind::Structure { children }
            | VarKind::Sequence { children } => children.iter_mut().collect(),
        }
    }

    /// Structural node named `name` directly below this one: a container child,
    /// the Grid array, or a Grid map.
    pub fn component(&self, name: &str) -> Option<&DapVar> {
        match &self.kind {
            VarKind::Grid(g) if g.array.name == name => Some(g.array.as_ref()),
            VarKind::Grid(g) => g.maps.get(name),
            VarKind::Base(_) => None,
            _ => self.child(name),
        }
    }

    pub fn component_mut(&mut self, name: &str) -> Option<&mut DapVar> {
        match &mut self.kind {
            VarKind::Grid(g) => {
                if g.array.name == name {
                    Some(g.array.as_mut())
                } else {
                    g.maps.get_mut(name)
                }
            }
            VarKind::Base(_) => None,
            VarKind::Dataset { children }
            | VarKind::Structure { children }
            | VarKind::Sequence { children } => children.get_mut(name),
        }
    }

    /// Follow a path of component names.
    pub fn descend<S: AsRef<str>>(&self, path: &[S]) -> Option<&DapVar> {
        path.iter()
            .try_fold(self, |var, name| var.component(name.as_ref()))
    }

    pub fn descend_mut<S: AsRef<str>>(&mut self, path: &[S]) -> Option<&mut DapVar> {
        let mut var = self;
        for name in path {
            var = var.component_mut(name.as_ref())?;
        }
        Some(var)
    }

    /// Assign ids below this node: `parent.id + "." + name`.
    pub fn assign_ids(&mut self) {
        let parent = self.id.clone();
        for child in self.components_mut() {
            child.id = format!("{}.{}", parent, child.name);
            child.assign_ids();
        }
    }

    /// Depth-first visit of this node and every node below it.
    pub fn walk<'a>(&'a self, f: &mut dyn FnMut(&'a DapVar)) {
        f(self);
        for c in self.components() {
            c.walk(f);
        }
    }

    /// Node whose id is `id`, searching this node and everything below it.
    pub fn find_by_id(&self, id: &str) -> Option<&DapVar> {
        if self.id == id {
            return Some(self);
        }
        self.components().into_iter().find_map(|c| c.find_by_id(id))
    }
}
