//! Parameter Set - validated, queryable collection of declarations
//!
//! Declarations live in a flat arena in declaration order. Grouping is an id
//! reference (`parent`) resolved to arena indices at build time, so lookups by
//! id are O(1) both at the top level and while recursing through records.

use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use smallvec::SmallVec;
use tracing::debug;

use crate::ast::ParameterDeclaration;
use crate::error::WftError;

/// Child indices of one declaration (records rarely have many children)
type ChildVec = SmallVec<[usize; 4]>;

/// Immutable set of parameter declarations
#[derive(Debug, Clone, Default)]
pub struct ParameterSet {
    declarations: Vec<ParameterDeclaration>,
    by_id: FxHashMap<String, usize>,
    parents: Vec<Option<usize>>,
    children: Vec<ChildVec>,
    roots: Vec<usize>,
}

impl ParameterSet {
    /// Build a set from declarations, checking ids, grouping and defaults
    pub fn build(declarations: Vec<ParameterDeclaration>) -> Result<Self, WftError> {
        let mut by_id: FxHashMap<String, usize> = FxHashMap::default();
        by_id.reserve(declarations.len());

        for (idx, decl) in declarations.iter().enumerate() {
            decl.check()?;
            if by_id.insert(decl.id.clone(), idx).is_some() {
                return Err(WftError::DuplicateParameter {
                    id: decl.id.clone(),
                });
            }
        }

        let mut parents = Vec::with_capacity(declarations.len());
        let mut children = vec![ChildVec::new(); declarations.len()];
        let mut roots = Vec::new();

        for (idx, decl) in declarations.iter().enumerate() {
            match &decl.parent {
                None => {
                    parents.push(None);
                    roots.push(idx);
                }
                Some(parent) => {
                    let parent_idx =
                        *by_id.get(parent).ok_or_else(|| WftError::UnknownParent {
                            id: decl.id.clone(),
                            parent: parent.clone(),
                        })?;
                    if !declarations[parent_idx].is_record() {
                        return Err(WftError::ParentNotRecord {
                            id: decl.id.clone(),
                            parent: parent.clone(),
                        });
                    }
                    parents.push(Some(parent_idx));
                    children[parent_idx].push(idx);
                }
            }
        }

        let set = Self {
            declarations,
            by_id,
            parents,
            children,
            roots,
        };
        set.detect_cycles()?;
        set.check_record_defaults()?;

        debug!(
            parameters = set.declarations.len(),
            roots = set.roots.len(),
            "Built parameter set"
        );
        Ok(set)
    }

    /// Parse raw declaration records, then build
    pub fn from_values(records: &[Value]) -> Result<Self, WftError> {
        let declarations = records
            .iter()
            .map(ParameterDeclaration::from_value)
            .collect::<Result<Vec<_>, _>>()?;
        Self::build(declarations)
    }

    /// Detect cycles in the parent relation using three-color DFS.
    ///
    /// Each declaration has at most one parent, so the walk follows a single
    /// chain; a gray node reached again closes a cycle.
    fn detect_cycles(&self) -> Result<(), WftError> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Color {
            White,
            Gray,
            Black,
        }

        let mut colors = vec![Color::White; self.declarations.len()];

        for start in 0..self.declarations.len() {
            if colors[start] != Color::White {
                continue;
            }

            let mut stack: Vec<usize> = Vec::new();
            let mut node = Some(start);
            while let Some(idx) = node {
                match colors[idx] {
                    Color::Gray => {
                        let cycle_start = stack.iter().position(|&x| x == idx).unwrap_or(0);
                        let cycle: Vec<&str> = stack[cycle_start..]
                            .iter()
                            .map(|&i| self.declarations[i].id.as_str())
                            .collect();
                        return Err(WftError::GroupingCycle {
                            cycle: format!("{} → {}", cycle.join(" → "), self.declarations[idx].id),
                        });
                    }
                    Color::Black => break,
                    Color::White => {
                        colors[idx] = Color::Gray;
                        stack.push(idx);
                        node = self.parents[idx];
                    }
                }
            }

            for idx in stack {
                colors[idx] = Color::Black;
            }
        }

        Ok(())
    }

    /// Record defaults must be mappings of child id to a matching literal
    fn check_record_defaults(&self) -> Result<(), WftError> {
        for (idx, decl) in self.declarations.iter().enumerate() {
            if let Some(Value::Object(map)) = decl.default_value.as_ref().filter(|_| decl.is_record())
            {
                self.check_record_literal(idx, map)?;
            }
        }
        Ok(())
    }

    fn check_record_literal(&self, record: usize, map: &Map<String, Value>) -> Result<(), WftError> {
        let record_id = &self.declarations[record].id;
        for (key, value) in map {
            let child = self.children[record]
                .iter()
                .map(|&i| (i, &self.declarations[i]))
                .find(|(_, d)| &d.id == key);

            let Some((child_idx, child)) = child else {
                return Err(WftError::InvalidDeclaration {
                    id: record_id.clone(),
                    reason: format!("defaultValue names '{}', which is not a child", key),
                });
            };

            if !child.datatype.accepts_literal(value) {
                return Err(WftError::DefaultTypeMismatch {
                    id: child.id.clone(),
                    what: "record default entry",
                    expected: child.datatype.to_string(),
                    value: value.to_string(),
                });
            }
            if let Value::Object(inner) = value {
                self.check_record_literal(child_idx, inner)?;
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// All declarations in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &ParameterDeclaration> {
        self.declarations.iter()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn lookup(&self, id: &str) -> Option<&ParameterDeclaration> {
        self.by_id.get(id).map(|&idx| &self.declarations[idx])
    }

    pub fn get(&self, id: &str) -> Result<&ParameterDeclaration, WftError> {
        self.lookup(id)
            .ok_or_else(|| WftError::ParameterNotFound { id: id.to_string() })
    }

    /// Direct children in declaration order; empty for non-record or unknown ids
    pub fn children(&self, id: &str) -> impl Iterator<Item = &ParameterDeclaration> {
        let indices: &[usize] = match self.by_id.get(id) {
            Some(&idx) => &self.children[idx],
            None => &[],
        };
        indices.iter().map(|&i| &self.declarations[i])
    }

    /// Top-level declarations in declaration order
    pub fn roots(&self) -> impl Iterator<Item = &ParameterDeclaration> {
        self.roots.iter().map(|&i| &self.declarations[i])
    }

    /// Ids from the outermost enclosing record down to `id` itself
    pub fn lineage(&self, id: &str) -> Vec<&str> {
        let mut chain = Vec::new();
        let mut node = self.by_id.get(id).copied();
        while let Some(idx) = node {
            chain.push(self.declarations[idx].id.as_str());
            node = self.parents[idx];
        }
        chain.reverse();
        chain
    }

    /// All declarations in presentation order: `(index, id)`
    pub fn list_sorted(&self) -> Vec<&ParameterDeclaration> {
        let mut all: Vec<&ParameterDeclaration> = self.declarations.iter().collect();
        all.sort_by(|a, b| (a.index, &a.id).cmp(&(b.index, &b.id)));
        all
    }

    /// Children of `id` in presentation order
    pub fn sorted_children(&self, id: &str) -> Vec<&ParameterDeclaration> {
        let mut children: Vec<&ParameterDeclaration> = self.children(id).collect();
        children.sort_by(|a, b| (a.index, &a.id).cmp(&(b.index, &b.id)));
        children
    }

    /// Serialize the declarations back to records, in declaration order
    pub fn to_values(&self) -> Vec<Value> {
        self.declarations.iter().map(|d| d.to_value()).collect()
    }
}
