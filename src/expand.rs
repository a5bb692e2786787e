//
// Copyright (c) The yangc Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Grouping expansion: `uses` resolution, cloning, `refine` application and
//! inner augments.
//!
//! After this pass no `uses` statement remains anywhere in the parse forest;
//! every use site carries an independent clone of the grouping content.

use std::collections::HashSet;

use log::{debug, warn};

use crate::augment;
use crate::error::Result;
use crate::parse::{Arena, ModuleMap, NodeFlags, NodeId};
use crate::schema::{check_status_reference, effective_parse_status};
use crate::stmt::Stmt;

pub(crate) struct GroupingExpander<'a> {
    arena: &'a mut Arena,
    modules: &'a ModuleMap,
    skip_unknown: bool,
}

impl<'a> GroupingExpander<'a> {
    pub(crate) fn new(
        arena: &'a mut Arena,
        modules: &'a ModuleMap,
        skip_unknown: bool,
    ) -> GroupingExpander<'a> {
        GroupingExpander {
            arena,
            modules,
            skip_unknown,
        }
    }

    /// Verify that no grouping of `module` uses itself, directly or through
    /// other local groupings. Cross-module cycles cannot occur because
    /// import cycles are rejected beforehand.
    pub(crate) fn check_grouping_cycles(
        &self,
        module: NodeId,
    ) -> Result<()> {
        let mut groupings = Vec::new();
        collect_groupings(self.arena, module, &mut groupings);
        for &grouping in &groupings {
            let mut chain = HashSet::new();
            self.visit_grouping(grouping, &mut chain)?;
        }
        Ok(())
    }

    fn visit_grouping(
        &self,
        grouping: NodeId,
        chain: &mut HashSet<NodeId>,
    ) -> Result<()> {
        if !chain.insert(grouping) {
            return Err(self.arena.error(
                grouping,
                format!(
                    "Grouping cyclic reference: {}",
                    self.arena.arg(grouping)
                ),
            ));
        }
        let mut uses = Vec::new();
        collect_uses(self.arena, grouping, &mut uses);
        for u in uses {
            let (prefix, name) = Arena::split_prefix(self.arena.arg(u));
            // Only local references can participate in a cycle.
            if let Some(prefix) = prefix {
                let root = self.arena.root(u);
                if prefix != self.arena.module_prefix(root) {
                    continue;
                }
            }
            if let Some(target) = self.arena.lookup_grouping(u, name) {
                self.visit_grouping(target, chain)?;
            }
        }
        chain.remove(&grouping);
        Ok(())
    }

    /// Expand every `uses` in the subtree of `node`, depth-first.
    pub(crate) fn expand(&mut self, node: NodeId) -> Result<()> {
        let uses: Vec<_> = self
            .arena
            .children_by_stmt(node, Stmt::Uses)
            .collect();
        for u in uses {
            let replacements = self.expand_uses(u)?;
            self.arena.replace_child(node, u, replacements);
        }
        for child in self.arena.children(node).to_vec() {
            self.expand(child)?;
        }
        Ok(())
    }

    /// Expand a single `uses` statement into the clone of its grouping's
    /// content with refinements and inner augments applied.
    fn expand_uses(&mut self, uses: NodeId) -> Result<Vec<NodeId>> {
        let grouping = match self.resolve_grouping(uses)? {
            Some(grouping) => grouping,
            None => {
                warn!(
                    "skipping unresolved {}",
                    self.arena.context_string(uses)
                );
                return Ok(Vec::new());
            }
        };
        let target_module = self.arena.root(uses);
        debug!(
            "expanding {} in module {}",
            self.arena.context_string(uses),
            self.arena.arg(target_module)
        );

        // Clone the grouping's data definitions into the target module;
        // typedefs and groupings stay behind and remain reachable through
        // the clone's lexical scope.
        let mut direct = Vec::new();
        for child in self.arena.children(grouping).to_vec() {
            if !self.arena.stmt(child).is_data_def() {
                continue;
            }
            let clone =
                self.arena.deep_clone(child, target_module, Some(grouping));
            propagate_conditionals(self.arena, uses, clone, false);
            direct.push(clone);
        }

        // All inner `uses` expand before refinements and augments apply; a
        // clone that is itself a `uses` is replaced by its expansion.
        let mut clones = Vec::new();
        for clone in direct {
            if self.arena.stmt(clone) == Stmt::Uses {
                clones.extend(self.expand_uses(clone)?);
            } else {
                self.expand(clone)?;
                clones.push(clone);
            }
        }

        for refine in self
            .arena
            .children_by_stmt(uses, Stmt::Refine)
            .collect::<Vec<_>>()
        {
            self.apply_refine(uses, refine, &clones)?;
        }

        for aug in self
            .arena
            .children_by_stmt(uses, Stmt::Augment)
            .collect::<Vec<_>>()
        {
            let path = self.arena.arg(aug).to_string();
            let target = match self.resolve_descendant(uses, &clones, &path)?
            {
                Some(target) => target,
                None => continue,
            };
            augment::splice_augment(
                self.arena,
                self.modules,
                aug,
                target,
                self.skip_unknown,
            )?;
        }

        Ok(clones)
    }

    /// Resolve the grouping a `uses` refers to: local names search the
    /// enclosing lexical scopes, imported names are module globals.
    fn resolve_grouping(&mut self, uses: NodeId) -> Result<Option<NodeId>> {
        let (prefix, name) = {
            let (p, n) = Arena::split_prefix(self.arena.arg(uses));
            (p.map(str::to_string), n.to_string())
        };
        let root = self.arena.root(uses);
        let local = match &prefix {
            None => true,
            Some(p) => p == self.arena.module_prefix(root),
        };

        let grouping = if local {
            self.arena.lookup_grouping(uses, &name)
        } else {
            match self.arena.module_by_prefix(
                uses,
                prefix.as_deref().unwrap(),
                self.modules,
            ) {
                Ok(module) => {
                    self.arena.lookup_child(module, Stmt::Grouping, &name)
                }
                Err(_) if self.skip_unknown => return Ok(None),
                Err(e) => return Err(e),
            }
        };
        match grouping {
            Some(grouping) => {
                if self.arena.root(grouping) == root {
                    check_status_reference(
                        self.arena,
                        uses,
                        effective_parse_status(self.arena, uses),
                        grouping,
                        "grouping",
                    )?;
                }
                Ok(Some(grouping))
            }
            None if self.skip_unknown => Ok(None),
            None => Err(self.arena.error(
                uses,
                format!("Can't find grouping {}", self.arena.arg(uses)),
            )),
        }
    }

    /// Resolve a descendant schema path rooted at the expanded clones.
    fn resolve_descendant(
        &self,
        uses: NodeId,
        clones: &[NodeId],
        path: &str,
    ) -> Result<Option<NodeId>> {
        let local_prefix = self.arena.module_prefix(self.arena.root(uses));
        let mut steps = path.split('/').filter(|s| !s.is_empty());
        let first = match steps.next() {
            Some(first) => first,
            None => {
                return Err(self
                    .arena
                    .error(uses, format!("Invalid path: {}", path)));
            }
        };

        let mut current = None;
        let name = self.check_local_step(uses, path, first, local_prefix)?;
        for &clone in clones {
            if augment::node_name_matches(self.arena, clone, name) {
                current = Some(clone);
                break;
            }
        }

        for step in steps {
            let name =
                self.check_local_step(uses, path, step, local_prefix)?;
            current = match current {
                Some(node) => {
                    augment::find_data_child(self.arena, node, name)
                }
                None => None,
            };
        }
        match current {
            Some(node) => Ok(Some(node)),
            None if self.skip_unknown => Ok(None),
            None => Err(self
                .arena
                .error(uses, format!("Invalid path: {}", path))),
        }
    }

    // A refine/uses-augment path never leaves the local namespace.
    fn check_local_step<'s>(
        &self,
        uses: NodeId,
        path: &str,
        step: &'s str,
        local_prefix: &str,
    ) -> Result<&'s str> {
        let (prefix, name) = Arena::split_prefix(step);
        match prefix {
            None => Ok(name),
            Some(p) if p == local_prefix => Ok(name),
            Some(_) => {
                Err(self.arena.error(uses, format!("Invalid path: {}", path)))
            }
        }
    }

    /// Apply one `refine` to its target inside the clones.
    fn apply_refine(
        &mut self,
        uses: NodeId,
        refine: NodeId,
        clones: &[NodeId],
    ) -> Result<()> {
        let path = self.arena.arg(refine).to_string();
        let target = match self.resolve_descendant(uses, clones, &path)? {
            Some(target) => target,
            None => return Ok(()),
        };
        let target_kind = self.arena.stmt(target);
        let target_module = self.arena.root(target);

        for prop in self.arena.children(refine).to_vec() {
            let kind = self.arena.stmt(prop);
            let legal = match kind {
                Stmt::Description | Stmt::Reference | Stmt::Unknown => true,
                Stmt::Config | Stmt::Must => target_kind.is_data_def(),
                Stmt::Default => matches!(
                    target_kind,
                    Stmt::Leaf
                        | Stmt::LeafList
                        | Stmt::Choice
                        | Stmt::OpdOption
                        | Stmt::OpdArgument
                ),
                Stmt::Mandatory => {
                    matches!(target_kind, Stmt::Leaf | Stmt::Choice)
                }
                Stmt::Presence => target_kind == Stmt::Container,
                Stmt::MinElements | Stmt::MaxElements => {
                    matches!(target_kind, Stmt::List | Stmt::LeafList)
                }
                _ => false,
            };
            if !legal {
                return Err(self.arena.error(
                    refine,
                    format!(
                        "invalid refinement {} for statement {}",
                        self.arena.context_string(prop),
                        self.arena.context_string(target)
                    ),
                ));
            }
            let copy = self.arena.deep_clone(prop, target_module, None);
            match kind {
                Stmt::Must | Stmt::Unknown => {
                    self.arena.append_child(target, copy)
                }
                _ => self.arena.replace_child_by_stmt(target, kind, copy),
            }
        }
        Ok(())
    }
}

/// Clone `src`'s `if-feature`, `when` and `status` substatements onto a node
/// spliced from it. `when` clones coming from an augment are tagged so their
/// runtime evaluation context shifts one step up the data tree.
pub(crate) fn propagate_conditionals(
    arena: &mut Arena,
    src: NodeId,
    dst: NodeId,
    from_augment: bool,
) {
    let dst_module = arena.root(dst);
    for iff in
        arena.children_by_stmt(src, Stmt::IfFeature).collect::<Vec<_>>()
    {
        let copy = arena.deep_clone(iff, dst_module, None);
        arena.append_child(dst, copy);
    }
    for when in
        arena.children_by_stmt(src, Stmt::When).collect::<Vec<_>>()
    {
        let copy = arena.deep_clone(when, dst_module, None);
        if from_augment {
            arena.insert_flags(copy, NodeFlags::FROM_AUGMENT);
        }
        arena.append_child(dst, copy);
    }
    if arena.child_by_stmt(dst, Stmt::Status).is_none() {
        if let Some(status) = arena.child_by_stmt(src, Stmt::Status) {
            let copy = arena.deep_clone(status, dst_module, None);
            arena.append_child(dst, copy);
        }
    }
}

fn collect_groupings(arena: &Arena, node: NodeId, out: &mut Vec<NodeId>) {
    for child in arena.children(node) {
        if arena.stmt(*child) == Stmt::Grouping {
            out.push(*child);
        }
        collect_groupings(arena, *child, out);
    }
}

fn collect_uses(arena: &Arena, node: NodeId, out: &mut Vec<NodeId>) {
    for child in arena.children(node) {
        if arena.stmt(*child) == Stmt::Uses {
            out.push(*child);
        }
        collect_uses(arena, *child, out);
    }
}
