//
// Copyright (c) The yangc Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Parse-layer representation of YANG modules.
//!
//! The external YANG parser populates an [`Arena`] with statement nodes and
//! hands the compiler one [`NodeId`] per module/submodule root. Nodes are
//! referenced by stable indices; parent/child links are index pairs, so the
//! heavy mutation performed by grouping expansion, augment splicing and
//! deviations never invalidates outstanding ids.

use bitflags::bitflags;
use indexmap::IndexMap;

use crate::error::{Error, Location, Result};
use crate::stmt::Stmt;

/// Mapping of module name to parse-tree root.
pub type ModuleMap = IndexMap<String, NodeId>;

/// Stable index of a node inside an [`Arena`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NodeId(u32);

bitflags! {
    /// Markers attached to parse nodes during compilation.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct NodeFlags: u8 {
        /// Synthetic node fabricated under skip-unknown mode; everything
        /// derived from it is filtered out of the schema.
        const FAKE = 0x01;
        /// Marked by a `deviate not-supported`; dropped by the schema
        /// builder.
        const NOT_SUPPORTED = 0x02;
        /// `when` clone originating from an augment; its runtime evaluation
        /// context is shifted one step up the data tree.
        const FROM_AUGMENT = 0x04;
    }
}

#[derive(Clone, Debug)]
struct Node {
    stmt: Stmt,
    /// Raw keyword for unknown/extension statements ("prefix:name").
    keyword: Option<String>,
    arg: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Owning module (or submodule, before submodule merge).
    root: NodeId,
    /// Submodule of origin, preserved across clones.
    submodule: Option<String>,
    /// Lexical scope override for cloned grouping content: typedef and
    /// grouping lookups continue from here rather than from the physical
    /// parent.
    scope: Option<NodeId>,
    location: Location,
    flags: NodeFlags,
    /// Original source text; only meaningful on module roots.
    text: Option<String>,
}

/// Arena holding every parse node of the compilation unit.
#[derive(Debug, Default)]
pub struct Arena {
    nodes: Vec<Node>,
    fake_module: Option<NodeId>,
}

// ===== impl Arena =====

impl Arena {
    pub fn new() -> Arena {
        Arena::default()
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    /// Create a detached root node (module or submodule).
    pub fn push_root(
        &mut self,
        stmt: Stmt,
        arg: impl Into<String>,
        location: Location,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            stmt,
            keyword: None,
            arg: arg.into(),
            parent: None,
            children: Vec::new(),
            root: id,
            submodule: None,
            scope: None,
            location,
            flags: NodeFlags::empty(),
            text: None,
        });
        id
    }

    /// Create a node and append it to `parent`.
    pub fn push_child(
        &mut self,
        parent: NodeId,
        stmt: Stmt,
        arg: impl Into<String>,
        location: Location,
    ) -> NodeId {
        let root = self.node(parent).root;
        let submodule = self.node(parent).submodule.clone();
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            stmt,
            keyword: None,
            arg: arg.into(),
            parent: Some(parent),
            children: Vec::new(),
            root,
            submodule,
            scope: None,
            location,
            flags: NodeFlags::empty(),
            text: None,
        });
        self.node_mut(parent).children.push(id);
        id
    }

    /// Record the raw keyword of an unknown/extension statement.
    pub fn set_keyword(&mut self, id: NodeId, keyword: impl Into<String>) {
        self.node_mut(id).keyword = Some(keyword.into());
    }

    /// Attach the original source text to a module root.
    pub fn set_module_text(&mut self, id: NodeId, text: impl Into<String>) {
        self.node_mut(id).text = Some(text.into());
    }

    // ----- accessors -----

    pub fn stmt(&self, id: NodeId) -> Stmt {
        self.node(id).stmt
    }

    pub fn arg(&self, id: NodeId) -> &str {
        &self.node(id).arg
    }

    pub fn keyword(&self, id: NodeId) -> Option<&str> {
        self.node(id).keyword.as_deref()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Owning module of the node (a submodule only before submodule merge).
    pub fn root(&self, id: NodeId) -> NodeId {
        self.node(id).root
    }

    pub fn submodule(&self, id: NodeId) -> Option<&str> {
        self.node(id).submodule.as_deref()
    }

    pub fn location(&self, id: NodeId) -> &Location {
        &self.node(id).location
    }

    pub fn flags(&self, id: NodeId) -> NodeFlags {
        self.node(id).flags
    }

    pub fn module_text(&self, id: NodeId) -> Option<&str> {
        self.node(id).text.as_deref()
    }

    pub(crate) fn set_root(&mut self, id: NodeId, root: NodeId) {
        self.node_mut(id).root = root;
    }

    pub(crate) fn set_submodule(
        &mut self,
        id: NodeId,
        submodule: Option<String>,
    ) {
        self.node_mut(id).submodule = submodule;
    }

    pub(crate) fn set_scope(&mut self, id: NodeId, scope: NodeId) {
        self.node_mut(id).scope = Some(scope);
    }

    pub(crate) fn insert_flags(&mut self, id: NodeId, flags: NodeFlags) {
        self.node_mut(id).flags |= flags;
    }

    /// Mark a node (and therefore its subtree) as not supported; the schema
    /// builder drops it.
    pub fn mark_not_supported(&mut self, id: NodeId) {
        self.insert_flags(id, NodeFlags::NOT_SUPPORTED);
    }

    pub fn is_not_supported(&self, id: NodeId) -> bool {
        self.flags(id).contains(NodeFlags::NOT_SUPPORTED)
    }

    /// Whether the node descends from a synthetic skip-unknown module.
    pub fn is_fake(&self, id: NodeId) -> bool {
        self.flags(id).contains(NodeFlags::FAKE)
            || self.flags(self.root(id)).contains(NodeFlags::FAKE)
    }

    // ----- child lookup -----

    /// First child of the given statement kind.
    pub fn child_by_stmt(&self, id: NodeId, stmt: Stmt) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&c| self.stmt(c) == stmt)
    }

    /// All children of the given statement kind, in document order.
    pub fn children_by_stmt(
        &self,
        id: NodeId,
        stmt: Stmt,
    ) -> impl Iterator<Item = NodeId> + '_ {
        self.node(id)
            .children
            .iter()
            .copied()
            .filter(move |&c| self.stmt(c) == stmt)
    }

    /// Child of the given kind whose argument equals `name`.
    pub fn lookup_child(
        &self,
        id: NodeId,
        stmt: Stmt,
        name: &str,
    ) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&c| self.stmt(c) == stmt && self.arg(c) == name)
    }

    /// Argument of the first child of the given kind.
    pub fn child_arg(&self, id: NodeId, stmt: Stmt) -> Option<&str> {
        self.child_by_stmt(id, stmt).map(|c| self.arg(c))
    }

    // ----- tree mutation -----

    /// Append an existing node (and its subtree) under a new parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
    }

    /// Append several nodes under `parent`, preserving order.
    pub fn add_children(&mut self, parent: NodeId, children: Vec<NodeId>) {
        for child in children {
            self.append_child(parent, child);
        }
    }

    /// Remove `child` from its parent's child list. The node itself stays in
    /// the arena (the whole arena is dropped when compilation ends).
    pub fn detach(&mut self, child: NodeId) {
        if let Some(parent) = self.node(child).parent {
            self.node_mut(parent).children.retain(|&c| c != child);
            self.node_mut(child).parent = None;
        }
    }

    /// Splice `replacements` into `parent`'s child list at the position of
    /// `old`, which is removed.
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        old: NodeId,
        replacements: Vec<NodeId>,
    ) {
        let pos = self
            .node(parent)
            .children
            .iter()
            .position(|&c| c == old)
            .expect("replace_child: node is not a child of parent");
        self.node_mut(parent).children.remove(pos);
        self.node_mut(old).parent = None;
        for (i, id) in replacements.into_iter().enumerate() {
            self.node_mut(id).parent = Some(parent);
            self.node_mut(parent).children.insert(pos + i, id);
        }
    }

    /// Replace any existing children of `stmt`'s kind with the single node
    /// `new` (append if none existed).
    pub fn replace_child_by_stmt(
        &mut self,
        parent: NodeId,
        stmt: Stmt,
        new: NodeId,
    ) {
        let existing: Vec<_> = self.children_by_stmt(parent, stmt).collect();
        match existing.first() {
            Some(&first) => {
                let mut rest = existing;
                rest.remove(0);
                for old in rest {
                    self.detach(old);
                }
                self.replace_child(parent, first, vec![new]);
            }
            None => self.append_child(parent, new),
        }
    }

    /// Deep-copy a subtree. Every copy is rooted at `new_root`; the copy of
    /// `id` itself keeps `scope` as its lexical environment so that typedef
    /// and grouping lookups continue to resolve at the definition site.
    /// Submodule identity is preserved.
    pub fn deep_clone(
        &mut self,
        id: NodeId,
        new_root: NodeId,
        scope: Option<NodeId>,
    ) -> NodeId {
        let copy = self.clone_rec(id, new_root);
        if let Some(scope) = scope {
            self.set_scope(copy, scope);
        }
        copy
    }

    fn clone_rec(&mut self, id: NodeId, new_root: NodeId) -> NodeId {
        let src = self.node(id).clone();
        let copy = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            root: new_root,
            ..src
        });
        for child in self.node(id).children.clone() {
            let child_copy = self.clone_rec(child, new_root);
            self.append_child(copy, child_copy);
        }
        copy
    }

    // ----- lexical environments -----

    fn enclosing(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).scope.or(self.node(id).parent)
    }

    /// Resolve an unprefixed typedef name in the lexical scope of `id`.
    pub fn lookup_typedef(&self, id: NodeId, name: &str) -> Option<NodeId> {
        let mut cursor = Some(id);
        while let Some(cur) = cursor {
            if let Some(td) = self.lookup_child(cur, Stmt::Typedef, name) {
                return Some(td);
            }
            cursor = self.enclosing(cur);
        }
        None
    }

    /// Resolve an unprefixed grouping name in the lexical scope of `id`.
    pub fn lookup_grouping(&self, id: NodeId, name: &str) -> Option<NodeId> {
        let mut cursor = Some(id);
        while let Some(cur) = cursor {
            if let Some(g) = self.lookup_child(cur, Stmt::Grouping, name) {
                return Some(g);
            }
            cursor = self.enclosing(cur);
        }
        None
    }

    // ----- prefix and namespace resolution -----

    /// Split an optionally prefixed identifier.
    pub fn split_prefix(name: &str) -> (Option<&str>, &str) {
        match name.split_once(':') {
            Some((prefix, local)) => (Some(prefix), local),
            None => (None, name),
        }
    }

    /// Prefix a module uses to refer to itself. For submodules this is the
    /// prefix declared under `belongs-to`.
    pub fn module_prefix(&self, module: NodeId) -> &str {
        let prefix = match self.stmt(module) {
            Stmt::Submodule => self
                .child_by_stmt(module, Stmt::BelongsTo)
                .and_then(|b| self.child_arg(b, Stmt::Prefix)),
            _ => self.child_arg(module, Stmt::Prefix),
        };
        prefix.unwrap_or("")
    }

    /// Namespace URI declared by a module.
    pub fn module_namespace(&self, module: NodeId) -> &str {
        self.child_arg(module, Stmt::Namespace).unwrap_or("")
    }

    /// Resolve a prefix in the context of `id`'s owning module. The empty
    /// prefix and the module's own prefix both name the module itself;
    /// anything else must match one of the module's imports.
    pub fn module_by_prefix(
        &self,
        id: NodeId,
        prefix: &str,
        modules: &ModuleMap,
    ) -> Result<NodeId> {
        let root = self.root(id);
        if prefix.is_empty() || prefix == self.module_prefix(root) {
            return Ok(root);
        }
        let import = self
            .children_by_stmt(root, Stmt::Import)
            .find(|&imp| self.child_arg(imp, Stmt::Prefix) == Some(prefix));
        match import {
            Some(import) => {
                let name = self.arg(import);
                modules.get(name).copied().ok_or_else(|| {
                    self.error(id, format!("unknown import {}", name))
                })
            }
            None => {
                Err(self.error(id, format!("unknown import {}", prefix)))
            }
        }
    }

    /// Namespace bound to a prefix in the context of `id`'s owning module.
    pub fn prefix_to_namespace(
        &self,
        id: NodeId,
        prefix: &str,
        modules: &ModuleMap,
    ) -> Result<String> {
        let module = self.module_by_prefix(id, prefix, modules)?;
        Ok(self.module_namespace(module).to_string())
    }

    /// Synthetic module used by skip-unknown mode when a prefix cannot be
    /// resolved. Everything parented under it is filtered from the schema.
    pub fn fake_module(&mut self) -> NodeId {
        if let Some(fake) = self.fake_module {
            return fake;
        }
        let fake =
            self.push_root(Stmt::Module, "fake", Location::default());
        self.insert_flags(fake, NodeFlags::FAKE);
        self.push_child(fake, Stmt::Namespace, "urn:fake", Location::default());
        self.push_child(fake, Stmt::Prefix, "fake", Location::default());
        self.fake_module = Some(fake);
        fake
    }

    // ----- diagnostics -----

    /// Human-readable statement context for diagnostics.
    pub fn context_string(&self, id: NodeId) -> String {
        let node = self.node(id);
        let keyword = match &node.keyword {
            Some(keyword) => keyword.clone(),
            None => node.stmt.to_string(),
        };
        if node.arg.is_empty() {
            keyword
        } else {
            format!("{} {}", keyword, node.arg)
        }
    }

    /// Build a fatal error anchored at `id`'s source location.
    pub fn error(&self, id: NodeId, msg: impl Into<String>) -> Error {
        Error::at(self.location(id).clone(), msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> Location {
        Location::default()
    }

    #[test]
    fn child_lookup_and_replace() {
        let mut arena = Arena::new();
        let module = arena.push_root(Stmt::Module, "m", loc());
        let cont = arena.push_child(module, Stmt::Container, "c", loc());
        let l1 = arena.push_child(cont, Stmt::Leaf, "one", loc());
        let l2 = arena.push_child(cont, Stmt::Leaf, "two", loc());

        assert_eq!(arena.lookup_child(cont, Stmt::Leaf, "two"), Some(l2));
        assert_eq!(arena.children_by_stmt(cont, Stmt::Leaf).count(), 2);
        assert_eq!(arena.root(l1), module);

        let l3 = arena.push_root(Stmt::Leaf, "three", loc());
        arena.replace_child(cont, l1, vec![l3]);
        assert_eq!(arena.children(cont), &[l3, l2]);
        assert_eq!(arena.parent(l3), Some(cont));
    }

    #[test]
    fn clone_keeps_scope_and_submodule() {
        let mut arena = Arena::new();
        let m1 = arena.push_root(Stmt::Module, "a", loc());
        let grouping = arena.push_child(m1, Stmt::Grouping, "g", loc());
        let leaf = arena.push_child(grouping, Stmt::Leaf, "l", loc());
        arena.set_submodule(leaf, Some("a-sub".to_string()));

        let m2 = arena.push_root(Stmt::Module, "b", loc());
        let copy = arena.deep_clone(leaf, m2, Some(grouping));
        assert_eq!(arena.root(copy), m2);
        assert_eq!(arena.submodule(copy), Some("a-sub"));

        // Typedef lookups from the clone resolve at the definition site.
        let td = arena.push_child(m1, Stmt::Typedef, "t", loc());
        assert_eq!(arena.lookup_typedef(copy, "t"), Some(td));
    }

    #[test]
    fn prefix_resolution() {
        let mut arena = Arena::new();
        let mut modules = ModuleMap::default();

        let a = arena.push_root(Stmt::Module, "a", loc());
        arena.push_child(a, Stmt::Prefix, "a", loc());
        arena.push_child(a, Stmt::Namespace, "urn:a", loc());
        let b = arena.push_root(Stmt::Module, "b", loc());
        arena.push_child(b, Stmt::Prefix, "b", loc());
        arena.push_child(b, Stmt::Namespace, "urn:b", loc());
        let import = arena.push_child(b, Stmt::Import, "a", loc());
        arena.push_child(import, Stmt::Prefix, "apfx", loc());
        modules.insert("a".to_string(), a);
        modules.insert("b".to_string(), b);

        let leaf = arena.push_child(b, Stmt::Leaf, "l", loc());
        assert_eq!(arena.module_by_prefix(leaf, "", &modules).unwrap(), b);
        assert_eq!(arena.module_by_prefix(leaf, "b", &modules).unwrap(), b);
        assert_eq!(
            arena.module_by_prefix(leaf, "apfx", &modules).unwrap(),
            a
        );
        assert_eq!(
            arena.prefix_to_namespace(leaf, "apfx", &modules).unwrap(),
            "urn:a"
        );
        assert_eq!(
            arena
                .module_by_prefix(leaf, "nope", &modules)
                .unwrap_err()
                .msg,
            "unknown import nope"
        );
    }

    #[test]
    fn fake_module_is_cached_and_marked() {
        let mut arena = Arena::new();
        let fake = arena.fake_module();
        assert_eq!(arena.fake_module(), fake);
        assert!(arena.is_fake(fake));

        let child =
            arena.push_child(fake, Stmt::Container, "synthetic", loc());
        assert!(arena.is_fake(child));
    }
}
