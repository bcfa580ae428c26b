//! Definition model: entities (one per header line) and their fields (one per body line).

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Sentinel used in `ParentCMTCODE:` for entities without a parent.
pub const ROOT_SENTINEL: &str = "NULL";

/// One record/message definition: its header and the bodies that followed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub header: Header,
    /// Fields in input order (the on-wire order of the record).
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub code: String,
    /// Second header token. Kept verbatim, never interpreted.
    pub label: String,
    pub path: String,
    pub parent: ParentCode,
}

/// Parent reference declared by `ParentCMTCODE:`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParentCode {
    Root,
    Code(String),
}

impl ParentCode {
    pub fn from_token(token: &str) -> Self {
        if token == ROOT_SENTINEL {
            ParentCode::Root
        } else {
            ParentCode::Code(token.to_string())
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, ParentCode::Root)
    }

    pub fn as_code(&self) -> Option<&str> {
        match self {
            ParentCode::Root => None,
            ParentCode::Code(c) => Some(c),
        }
    }
}

impl fmt::Display for ParentCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParentCode::Root => f.write_str(ROOT_SENTINEL),
            ParentCode::Code(c) => f.write_str(c),
        }
    }
}

/// One attribute of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub tag: String,
    pub description: String,
    pub path: String,
    /// `M` in the definition file.
    pub required: bool,
    /// `y` in the definition file.
    pub signed: bool,
    pub type_name: String,
    /// Nested definition spliced in by the tree builder when an entity's header path
    /// equals this field's path. The field then stands for repeated instances of it.
    /// Fields of one parent that share a path share the same node.
    pub embedded: Option<Arc<Entity>>,
}

impl Field {
    pub fn is_embedded_set(&self) -> bool {
        self.embedded.is_some()
    }

    pub fn embedded_set(&self) -> Option<&Entity> {
        self.embedded.as_deref()
    }
}

impl Entity {
    pub fn new(header: Header) -> Self {
        Entity {
            header,
            fields: Vec::new(),
        }
    }

    pub fn code(&self) -> &str {
        &self.header.code
    }

    pub fn is_root(&self) -> bool {
        self.header.parent.is_root()
    }

    pub fn field(&self, tag: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.tag == tag)
    }

    /// Fields carrying an embedded set, in field order.
    pub fn embedded_fields(&self) -> impl DoubleEndedIterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_embedded_set())
    }

    /// All entities reachable through embedded sets, depth first, excluding `self`.
    /// A node shared by several fields is listed once.
    pub fn descendants(&self) -> Vec<&Entity> {
        let mut out = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&Entity> = self
            .embedded_fields()
            .filter_map(Field::embedded_set)
            .rev()
            .collect();
        while let Some(e) = stack.pop() {
            if !seen.insert(e.code()) {
                continue;
            }
            out.push(e);
            stack.extend(e.embedded_fields().filter_map(Field::embedded_set).rev());
        }
        out
    }
}

/// Root entities of a definition file, in input order, indexed by code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefForest {
    roots: Vec<Entity>,
    roots_by_code: HashMap<String, usize>,
}

impl DefForest {
    /// Caller guarantees unique codes (the tree builder checks this).
    pub(crate) fn from_roots(roots: Vec<Entity>) -> Self {
        let roots_by_code = roots
            .iter()
            .enumerate()
            .map(|(i, e)| (e.header.code.clone(), i))
            .collect();
        DefForest {
            roots,
            roots_by_code,
        }
    }

    pub fn get(&self, code: &str) -> Option<&Entity> {
        self.roots_by_code.get(code).map(|&i| &self.roots[i])
    }

    pub fn contains(&self, code: &str) -> bool {
        self.roots_by_code.contains_key(code)
    }

    pub fn roots(&self) -> &[Entity] {
        &self.roots
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.roots.iter().map(|e| e.header.code.as_str())
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Find an entity by code anywhere in the forest, embedded ones included.
    pub fn find(&self, code: &str) -> Option<&Entity> {
        if let Some(root) = self.get(code) {
            return Some(root);
        }
        self.roots
            .iter()
            .flat_map(Entity::descendants)
            .find(|e| e.header.code == code)
    }

    pub fn into_map(self) -> HashMap<String, Entity> {
        self.roots
            .into_iter()
            .map(|e| (e.header.code.clone(), e))
            .collect()
    }
}
