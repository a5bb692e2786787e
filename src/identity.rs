//
// Copyright (c) The yangc Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Identity registry and derivation graph.
//!
//! Identities form a DAG via `base`; the compiler materializes the reverse
//! edge (base → derived) as an adjacency list keyed by canonical
//! `module:name`, never as ownership. The graph outlives compilation because
//! `identityref` types in the schema carry closures computed from it.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::error::Result;
use crate::parse::{Arena, ModuleMap, NodeId};
use crate::stmt::Stmt;

/// A single identity value, as carried by `identityref` types.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Identity {
    pub module: String,
    pub name: String,
    pub namespace: String,
}

#[derive(Clone, Debug)]
struct IdentityEntry {
    identity: Identity,
    node: NodeId,
    derived: Vec<String>,
}

/// Registry of every identity in the compilation unit.
#[derive(Clone, Debug, Default)]
pub struct IdentityGraph {
    entries: IndexMap<String, IdentityEntry>,
}

/// Canonical `module:name` identifier.
pub fn identity_key(module: &str, name: &str) -> String {
    format!("{}:{}", module, name)
}

// ===== impl Identity =====

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.module, self.name)
    }
}

// ===== impl IdentityGraph =====

impl IdentityGraph {
    /// Build the graph over every module, in the supplied order: register
    /// all identities, then resolve `base` references into derivation
    /// edges, then check for cycles.
    pub(crate) fn build(
        arena: &Arena,
        modules: &ModuleMap,
        order: &[String],
        skip_unknown: bool,
    ) -> Result<IdentityGraph> {
        let mut graph = IdentityGraph::default();

        for name in order {
            let module = modules[name.as_str()];
            let modname = arena.arg(module);
            let namespace = arena.module_namespace(module);
            for identity in arena.children_by_stmt(module, Stmt::Identity) {
                let iname = arena.arg(identity);
                let key = identity_key(modname, iname);
                let entry = IdentityEntry {
                    identity: Identity {
                        module: modname.to_string(),
                        name: iname.to_string(),
                        namespace: namespace.to_string(),
                    },
                    node: identity,
                    derived: Vec::new(),
                };
                if graph.entries.insert(key, entry).is_some() {
                    return Err(arena.error(
                        identity,
                        format!("Duplicate identity {}", iname),
                    ));
                }
            }
        }

        for name in order {
            let module = modules[name.as_str()];
            for identity in arena.children_by_stmt(module, Stmt::Identity) {
                graph.link_bases(arena, modules, identity, skip_unknown)?;
            }
        }

        graph.check_cycles(arena)?;
        Ok(graph)
    }

    /// Append `identity` to the derived list of each of its bases.
    fn link_bases(
        &mut self,
        arena: &Arena,
        modules: &ModuleMap,
        identity: NodeId,
        skip_unknown: bool,
    ) -> Result<()> {
        let modname = arena.arg(arena.root(identity)).to_string();
        let key = identity_key(&modname, arena.arg(identity));

        for base in arena.children_by_stmt(identity, Stmt::Base) {
            let (prefix, name) = Arena::split_prefix(arena.arg(base));
            let base_module = match arena.module_by_prefix(
                base,
                prefix.unwrap_or(""),
                modules,
            ) {
                Ok(module) => module,
                Err(_) if skip_unknown => continue,
                Err(e) => return Err(e),
            };
            let base_key = identity_key(arena.arg(base_module), name);
            match self.entries.get_mut(&base_key) {
                Some(entry) => entry.derived.push(key.clone()),
                None if skip_unknown => (),
                None => {
                    return Err(arena.error(
                        base,
                        format!(
                            "Can't find base identity {}",
                            arena.arg(base)
                        ),
                    ));
                }
            }
        }
        Ok(())
    }

    /// DFS from every identity over the derivation edges, keeping the
    /// recursion chain; revisiting an in-progress identity is a cycle.
    fn check_cycles(&self, arena: &Arena) -> Result<()> {
        let mut done = HashSet::new();
        for key in self.entries.keys() {
            let mut chain = HashSet::new();
            self.visit(arena, key, &mut chain, &mut done)?;
        }
        Ok(())
    }

    fn visit(
        &self,
        arena: &Arena,
        key: &str,
        chain: &mut HashSet<String>,
        done: &mut HashSet<String>,
    ) -> Result<()> {
        if done.contains(key) {
            return Ok(());
        }
        if !chain.insert(key.to_string()) {
            let entry = &self.entries[key];
            return Err(arena.error(
                entry.node,
                format!("Identity cyclic reference: {}", entry.identity),
            ));
        }
        for derived in &self.entries[key].derived {
            self.visit(arena, derived, chain, done)?;
        }
        chain.remove(key);
        done.insert(key.to_string());
        Ok(())
    }

    /// Look up an identity by canonical key.
    pub fn get(&self, key: &str) -> Option<&Identity> {
        self.entries.get(key).map(|e| &e.identity)
    }

    /// The transitive closure of identities derived from `key`, in
    /// registration order. The base itself is not included.
    pub fn derived_closure(&self, key: &str) -> Vec<Identity> {
        let mut closure = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = match self.entries.get(key) {
            Some(entry) => entry.derived.clone(),
            None => return closure,
        };
        while let Some(next) = stack.pop() {
            if !seen.insert(next.clone()) {
                continue;
            }
            if let Some(entry) = self.entries.get(&next) {
                closure.push(entry.identity.clone());
                stack.extend(entry.derived.iter().cloned());
            }
        }
        closure.sort_by(|a, b| (&a.module, &a.name).cmp(&(&b.module, &b.name)));
        closure
    }

    pub fn iter(&self) -> impl Iterator<Item = &Identity> {
        self.entries.values().map(|e| &e.identity)
    }
}
