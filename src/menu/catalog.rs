use std::collections::HashMap;

use thiserror::Error;

use super::node::{Digit, MenuLevel, MenuNode};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("menu node '{0}' does not exist")]
    NotFound(String),

    #[error("menu node id must not be empty")]
    EmptyId,

    #[error("menu node '{0}' has an empty prompt")]
    EmptyPrompt(String),

    #[error("menu node '{0}' is defined more than once")]
    DuplicateNode(String),

    #[error("menu tree has no root node")]
    MissingRoot,

    #[error("menu tree has more than one root: '{0}' and '{1}'")]
    DuplicateRoot(String, String),

    #[error("menu node '{node}' references missing parent '{parent}'")]
    MissingParent { node: String, parent: String },

    #[error("menu node '{0}' must name a parent")]
    Orphan(String),

    #[error("root menu node '{0}' must not name a parent")]
    RootWithParent(String),

    #[error("menu node '{node}' at level {level:?} cannot sit under '{parent}'")]
    LevelMismatch {
        node: String,
        level: MenuLevel,
        parent: String,
    },

    #[error("transition '{from}':{digit} is registered twice")]
    DuplicateTransition { from: String, digit: Digit },

    #[error("transition '{from}':{digit} targets '{to}', which is not a child of '{from}'")]
    NotAChild {
        from: String,
        digit: Digit,
        to: String,
    },
}

/// The fixed menu tree: every node plus the explicit forward transitions.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct MenuCatalog {
    root_id: String,
    nodes: HashMap<String, MenuNode>,
    transitions: HashMap<(String, Digit), String>,
}

impl MenuCatalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    pub fn root(&self) -> &MenuNode {
        // The builder refuses to produce a catalog without its root.
        &self.nodes[&self.root_id]
    }

    pub fn lookup(&self, id: &str) -> Result<&MenuNode, CatalogError> {
        self.nodes
            .get(id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    /// The explicit forward transition for `(current_id, digit)`, if one was
    /// registered. `None` means "no transition", including for the back key
    /// on nodes that do not override it.
    pub fn next_for(&self, current_id: &str, digit: Digit) -> Option<&MenuNode> {
        self.transitions
            .get(&(current_id.to_string(), digit))
            .and_then(|target| self.nodes.get(target))
    }

    pub fn is_terminal(&self, id: &str) -> bool {
        self.nodes
            .get(id)
            .map(MenuNode::is_leaf)
            .unwrap_or(false)
    }

    /// Direct children of `id`, ordered by id.
    pub fn children(&self, id: &str) -> Vec<&MenuNode> {
        let mut children: Vec<&MenuNode> = self
            .nodes
            .values()
            .filter(|node| node.parent_id.as_deref() == Some(id))
            .collect();
        children.sort_by(|a, b| a.id.cmp(&b.id));
        children
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct CatalogBuilder {
    nodes: Vec<MenuNode>,
    transitions: Vec<(String, Digit, String)>,
}

impl CatalogBuilder {
    pub fn node(mut self, node: MenuNode) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn transition(mut self, from: &str, digit: Digit, to: &str) -> Self {
        self.transitions
            .push((from.to_string(), digit, to.to_string()));
        self
    }

    pub fn build(self) -> Result<MenuCatalog, CatalogError> {
        let mut nodes: HashMap<String, MenuNode> = HashMap::with_capacity(self.nodes.len());
        let mut root_id: Option<String> = None;

        for node in self.nodes {
            if node.id.trim().is_empty() {
                return Err(CatalogError::EmptyId);
            }
            if node.prompt.trim().is_empty() {
                return Err(CatalogError::EmptyPrompt(node.id));
            }
            if node.is_root() {
                if node.parent_id.is_some() {
                    return Err(CatalogError::RootWithParent(node.id));
                }
                if let Some(existing) = &root_id {
                    return Err(CatalogError::DuplicateRoot(existing.clone(), node.id));
                }
                root_id = Some(node.id.clone());
            }
            if nodes.contains_key(&node.id) {
                return Err(CatalogError::DuplicateNode(node.id));
            }
            nodes.insert(node.id.clone(), node);
        }

        let root_id = root_id.ok_or(CatalogError::MissingRoot)?;

        // Each child sits exactly one level below its parent, so the tree can
        // neither loop nor grow past three levels.
        for node in nodes.values() {
            if node.is_root() {
                continue;
            }
            let parent_id = node
                .parent_id
                .as_ref()
                .ok_or_else(|| CatalogError::Orphan(node.id.clone()))?;
            let parent = nodes
                .get(parent_id)
                .ok_or_else(|| CatalogError::MissingParent {
                    node: node.id.clone(),
                    parent: parent_id.clone(),
                })?;
            if parent.level.child_level() != Some(node.level) {
                return Err(CatalogError::LevelMismatch {
                    node: node.id.clone(),
                    level: node.level,
                    parent: parent.id.clone(),
                });
            }
        }

        let mut transitions = HashMap::with_capacity(self.transitions.len());
        for (from, digit, to) in self.transitions {
            if !nodes.contains_key(&from) {
                return Err(CatalogError::NotFound(from));
            }
            let target = nodes
                .get(&to)
                .ok_or_else(|| CatalogError::NotFound(to.clone()))?;
            if target.parent_id.as_deref() != Some(from.as_str()) {
                return Err(CatalogError::NotAChild { from, digit, to });
            }
            if transitions.insert((from.clone(), digit), to).is_some() {
                return Err(CatalogError::DuplicateTransition { from, digit });
            }
        }

        Ok(MenuCatalog {
            root_id,
            nodes,
            transitions,
        })
    }
}
