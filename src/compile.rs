//
// Copyright (c) The yangc Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Compiler orchestration.
//!
//! [`Compiler::build_models`] runs the full pipeline: submodule attachment
//! and include merging, import ordering, cardinality verification, feature
//! and identity resolution, grouping expansion, augment and deviation
//! application, schema building, and the post-compilation path walk.

use std::collections::{HashMap, HashSet};

use bitflags::bitflags;
use indexmap::IndexMap;
use log::debug;
use petgraph::graph::DiGraph;

use crate::augment;
use crate::builder::SchemaBuilder;
use crate::deviation::{self, DeviationMap};
use crate::error::{Error, Result, Warning};
use crate::expand::GroupingExpander;
use crate::extensions::{Extensions, NoExtensions, UserFunctionChecker};
use crate::features::{FeatureMap, FeatureResolver, FeatureSet};
use crate::identity::IdentityGraph;
use crate::model::{Model, ModelSet, Submodule};
use crate::parse::{Arena, ModuleMap, NodeId};
use crate::stmt::{cardinality, mandatory_children, Cardinality, Stmt};
use crate::walker;
use crate::xpath::{NullCompiler, XpathAssembler, XpathCompiler};

bitflags! {
    /// Options to change compiler behavior.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct CompilerFlags: u8 {
        /// Missing imports do not fail; unresolvable nodes are dropped so
        /// the remaining schema still compiles.
        const SKIP_UNKNOWN = 0x01;
        /// Build path-eval machines and run the post-compilation path walk.
        const WARNINGS = 0x02;
    }
}

bitflags! {
    /// Predicate deciding which schema nodes survive.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct SchemaFilter: u8 {
        /// Keep configuration nodes.
        const CONFIG = 0x01;
        /// Keep state nodes.
        const STATE = 0x02;
        /// Keep operational definition nodes.
        const OPD = 0x04;
    }
}

static NULL_XPATH: NullCompiler = NullCompiler;
static NO_EXTENSIONS: NoExtensions = NoExtensions;

/// The YANG schema compiler.
///
/// The external parser populates an [`Arena`] and hands over one root per
/// module and submodule; `build_models` turns them into a [`ModelSet`].
pub struct Compiler<'a> {
    arena: Arena,
    modules: ModuleMap,
    submodules: ModuleMap,
    features: FeatureSet,
    filter: SchemaFilter,
    flags: CompilerFlags,
    xpath: &'a dyn XpathCompiler,
    extensions: &'a dyn Extensions,
    user_fns: Option<&'a dyn UserFunctionChecker>,
}

// ===== impl Compiler =====

impl<'a> Compiler<'a> {
    pub fn new(
        arena: Arena,
        modules: ModuleMap,
        submodules: ModuleMap,
    ) -> Compiler<'a> {
        Compiler {
            arena,
            modules,
            submodules,
            features: FeatureSet::new(),
            filter: SchemaFilter::all(),
            flags: CompilerFlags::empty(),
            xpath: &NULL_XPATH,
            extensions: &NO_EXTENSIONS,
            user_fns: None,
        }
    }

    /// Set the feature sources consulted during `if-feature` resolution.
    pub fn features(mut self, features: FeatureSet) -> Self {
        self.features = features;
        self
    }

    /// Set the schema node filter.
    pub fn filter(mut self, filter: SchemaFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Set the compiler flags.
    pub fn flags(mut self, flags: CompilerFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the external XPath compiler.
    pub fn xpath(mut self, xpath: &'a dyn XpathCompiler) -> Self {
        self.xpath = xpath;
        self
    }

    /// Set the extension hooks.
    pub fn extensions(mut self, extensions: &'a dyn Extensions) -> Self {
        self.extensions = extensions;
        self
    }

    /// Set the custom XPath function checker used by extended-must path
    /// evaluation.
    pub fn user_functions(
        mut self,
        user_fns: &'a dyn UserFunctionChecker,
    ) -> Self {
        self.user_fns = Some(user_fns);
        self
    }

    /// Run the whole pipeline. Returns the model set and the collected
    /// warnings, or the first fatal diagnostic.
    pub fn build_models(mut self) -> Result<(ModelSet, Vec<Warning>)> {
        let skip_unknown =
            self.flags.contains(CompilerFlags::SKIP_UNKNOWN);
        let warnings_requested =
            self.flags.contains(CompilerFlags::WARNINGS);
        let mut warnings = Vec::new();

        let submodule_records = self.attach_submodules(skip_unknown)?;
        let order = self.module_order(skip_unknown)?;
        debug!("module compilation order: {:?}", order);

        for name in &order {
            self.verify_cardinality(self.modules[name.as_str()])?;
        }

        let features = FeatureResolver::new(
            &self.arena,
            &self.modules,
            &self.features,
            skip_unknown,
        )
        .resolve(&order)?;
        let identities = IdentityGraph::build(
            &self.arena,
            &self.modules,
            &order,
            skip_unknown,
        )?;

        for name in &order {
            let module = self.modules[name.as_str()];
            GroupingExpander::new(
                &mut self.arena,
                &self.modules,
                skip_unknown,
            )
            .check_grouping_cycles(module)?;
        }
        for name in &order {
            let module = self.modules[name.as_str()];
            GroupingExpander::new(
                &mut self.arena,
                &self.modules,
                skip_unknown,
            )
            .expand(module)?;
            augment::apply_augments(
                &mut self.arena,
                &self.modules,
                module,
                skip_unknown,
            )?;
        }
        debug_assert!(self.no_uses_remain());

        let mut deviations = DeviationMap::default();
        for name in &order {
            let module = self.modules[name.as_str()];
            deviation::apply_deviations(
                &mut self.arena,
                &self.modules,
                module,
                skip_unknown,
                &mut deviations,
            )?;
        }

        let mut set = ModelSet {
            submodules: submodule_records,
            identities,
            ..Default::default()
        };
        let assembler = XpathAssembler::new(
            &self.arena,
            &self.modules,
            self.xpath,
            self.extensions,
            self.user_fns,
            warnings_requested,
        );
        for name in &order {
            let module = self.modules[name.as_str()];
            let (tree, rpcs, notifications) = SchemaBuilder::new(
                &self.arena,
                &self.modules,
                &features,
                &set.identities,
                &assembler,
                self.extensions,
                self.filter,
                skip_unknown,
                &mut set.schema,
                &mut warnings,
            )
            .build_module(module)?;

            let mut model = Model {
                name: name.clone(),
                revision: self.latest_revision(module),
                namespace: self
                    .arena
                    .module_namespace(module)
                    .to_string(),
                text: self
                    .arena
                    .module_text(module)
                    .map(str::to_string),
                enabled_features: enabled_features(&features, name),
                deviation_sources: deviations
                    .get(name)
                    .cloned()
                    .unwrap_or_default(),
                tree,
                rpcs,
                notifications,
            };
            self.extensions.extend_model(&mut model);
            set.models.insert(name.clone(), model);
        }
        self.extensions.extend_model_set(&mut set);

        if warnings_requested {
            walker::walk(&mut set, &mut warnings);
        }

        Ok((set, warnings))
    }

    // ----- submodule handling -----

    /// Attach submodules to their modules, check include cycles, and merge
    /// submodule content into the module scope. After this, every merged
    /// node's root is its module.
    fn attach_submodules(
        &mut self,
        skip_unknown: bool,
    ) -> Result<IndexMap<String, Submodule>> {
        let mut records = IndexMap::new();
        let submodules = self.submodules.clone();

        for (name, &sub) in &submodules {
            let belongs_to = self
                .arena
                .child_by_stmt(sub, Stmt::BelongsTo)
                .ok_or_else(|| {
                    self.arena
                        .error(sub, "submodule is missing belongs-to")
                })?;
            let module_name = self.arena.arg(belongs_to).to_string();
            if !self.modules.contains_key(&module_name) {
                if skip_unknown {
                    continue;
                }
                return Err(self.arena.error(
                    belongs_to,
                    format!(
                        "Can't find module {} of submodule {}",
                        module_name, name
                    ),
                ));
            }
            records.insert(
                name.clone(),
                Submodule {
                    name: name.clone(),
                    belongs_to: module_name,
                    revision: self.latest_revision(sub),
                },
            );
        }

        // Cycles among submodule includes are fatal.
        for &sub in submodules.values() {
            let mut chain = HashSet::new();
            self.check_include_cycle(sub, &mut chain)?;
        }

        let modules = self.modules.clone();
        for &module in modules.values() {
            let mut merged = HashSet::new();
            self.merge_includes(module, module, &mut merged)?;
        }
        Ok(records)
    }

    fn check_include_cycle(
        &self,
        sub: NodeId,
        chain: &mut HashSet<String>,
    ) -> Result<()> {
        let name = self.arena.arg(sub).to_string();
        if !chain.insert(name.clone()) {
            return Err(self.arena.error(
                sub,
                format!("Include cyclic reference: {}", name),
            ));
        }
        for include in self.arena.children_by_stmt(sub, Stmt::Include) {
            if let Some(&inner) =
                self.submodules.get(self.arena.arg(include))
            {
                self.check_include_cycle(inner, chain)?;
            }
        }
        chain.remove(&name);
        Ok(())
    }

    /// Merge the content of every (transitively) included submodule into
    /// `module`. Typedefs, groupings and imports always merge; data
    /// definitions, augments and the other module-body statements merge for
    /// the containing module.
    fn merge_includes(
        &mut self,
        module: NodeId,
        from: NodeId,
        merged: &mut HashSet<String>,
    ) -> Result<()> {
        for include in self
            .arena
            .children_by_stmt(from, Stmt::Include)
            .collect::<Vec<_>>()
        {
            let sub_name = self.arena.arg(include).to_string();
            if !merged.insert(sub_name.clone()) {
                continue;
            }
            let sub = match self.submodules.get(&sub_name) {
                Some(&sub) => sub,
                None => continue,
            };
            self.merge_includes(module, sub, merged)?;
            debug!(
                "merging submodule {} into module {}",
                sub_name,
                self.arena.arg(module)
            );
            for child in self.arena.children(sub).to_vec() {
                let adopt = match self.arena.stmt(child) {
                    Stmt::Typedef | Stmt::Grouping | Stmt::Import => true,
                    kind if kind.is_data_def() => true,
                    Stmt::Augment
                    | Stmt::OpdAugment
                    | Stmt::Rpc
                    | Stmt::Notification
                    | Stmt::Identity
                    | Stmt::Feature
                    | Stmt::Extension
                    | Stmt::Deviation => true,
                    _ => false,
                };
                if adopt {
                    self.arena.detach(child);
                    self.arena.append_child(module, child);
                    self.rebase(child, module, &sub_name);
                }
            }
        }
        Ok(())
    }

    // Re-root a merged subtree onto the module, keeping submodule identity.
    fn rebase(&mut self, node: NodeId, root: NodeId, submodule: &str) {
        self.arena.set_root(node, root);
        self.arena
            .set_submodule(node, Some(submodule.to_string()));
        for child in self.arena.children(node).to_vec() {
            self.rebase(child, root, submodule);
        }
    }

    // ----- import ordering -----

    /// Topological order of the modules by import. Dependencies always
    /// precede their dependents; ties resolve by module name, so the order
    /// (and therefore every diagnostic) is deterministic.
    fn module_order(&self, skip_unknown: bool) -> Result<Vec<String>> {
        let mut names: Vec<String> =
            self.modules.keys().cloned().collect();
        names.sort();

        let mut graph = DiGraph::<String, ()>::new();
        let mut index = HashMap::new();
        for name in &names {
            index.insert(name.clone(), graph.add_node(name.clone()));
        }
        for name in &names {
            let module = self.modules[name.as_str()];
            for import in
                self.arena.children_by_stmt(module, Stmt::Import)
            {
                let dep = self.arena.arg(import);
                match index.get(dep) {
                    Some(&dep_ix) => {
                        graph.add_edge(index[name.as_str()], dep_ix, ());
                    }
                    None if skip_unknown => (),
                    None => {
                        return Err(self.arena.error(
                            import,
                            format!("unknown import {}", dep),
                        ));
                    }
                }
            }
        }

        // The graph is dependent -> dependency; topologically sorting the
        // reversed graph yields dependencies first.
        let reversed = petgraph::visit::Reversed(&graph);
        match petgraph::algo::toposort(reversed, None) {
            Ok(order) => Ok(order
                .into_iter()
                .map(|ix| graph[ix].clone())
                .collect()),
            Err(_) => {
                // Name one strongly connected component on the cycle.
                let scc = petgraph::algo::kosaraju_scc(&graph);
                let mut path = String::new();
                for cycle in scc.iter().filter(|c| c.len() > 1) {
                    for ix in cycle {
                        path.push_str(&graph[*ix]);
                        path.push_str(" -> ");
                    }
                    path.push_str(&graph[cycle[0]]);
                    break;
                }
                Err(Error::new(format!(
                    "Import cycle detected: {}",
                    path
                )))
            }
        }
    }

    // ----- cardinality verification -----

    fn verify_cardinality(&self, node: NodeId) -> Result<()> {
        let parent_kind = self.arena.stmt(node);
        let parent_keyword = match self.arena.keyword(node) {
            Some(keyword) => keyword.to_string(),
            None => parent_kind.to_string(),
        };

        let mut counts: HashMap<Stmt, u32> = HashMap::new();
        let mut unknown_counts: HashMap<String, (NodeId, u32)> =
            HashMap::new();
        for &child in self.arena.children(node) {
            match self.arena.stmt(child) {
                Stmt::Unknown => {
                    let keyword = self
                        .arena
                        .keyword(child)
                        .unwrap_or_default()
                        .to_string();
                    unknown_counts.entry(keyword).or_insert((child, 0)).1 +=
                        1;
                }
                kind => *counts.entry(kind).or_insert(0) += 1,
            }
        }

        for (&kind, &count) in &counts {
            let child = self.arena.child_by_stmt(node, kind).unwrap();
            match cardinality(parent_kind, kind) {
                Cardinality::NotAllowed => {
                    return Err(self.arena.error(
                        child,
                        format!(
                            "statement '{}' not allowed under '{}'",
                            kind, parent_keyword
                        ),
                    ));
                }
                Cardinality::ZeroOrOne | Cardinality::One if count > 1 => {
                    return Err(self.arena.error(
                        child,
                        format!(
                            "only one '{}' statement is allowed",
                            kind
                        ),
                    ));
                }
                _ => (),
            }
        }
        for &required in mandatory_children(parent_kind) {
            if !counts.contains_key(&required) {
                return Err(self.arena.error(
                    node,
                    format!(
                        "missing mandatory statement '{}'",
                        required
                    ),
                ));
            }
        }
        if parent_kind == Stmt::Deviation
            && !counts.keys().any(|k| k.is_deviate())
        {
            return Err(self.arena.error(
                node,
                "deviation must have at least one deviate",
            ));
        }
        for (keyword, &(child, count)) in &unknown_counts {
            match self.extensions.cardinality(&parent_keyword, keyword) {
                Some(Cardinality::NotAllowed) => {
                    return Err(self.arena.error(
                        child,
                        format!(
                            "statement '{}' not allowed under '{}'",
                            keyword, parent_keyword
                        ),
                    ));
                }
                Some(Cardinality::ZeroOrOne) | Some(Cardinality::One)
                    if count > 1 =>
                {
                    return Err(self.arena.error(
                        child,
                        format!(
                            "only one '{}' statement is allowed",
                            keyword
                        ),
                    ));
                }
                _ => (),
            }
        }

        for &child in self.arena.children(node) {
            self.verify_cardinality(child)?;
        }
        Ok(())
    }

    // ----- misc helpers -----

    fn latest_revision(&self, module: NodeId) -> Option<String> {
        self.arena
            .children_by_stmt(module, Stmt::Revision)
            .map(|r| self.arena.arg(r).to_string())
            .max()
    }

    fn no_uses_remain(&self) -> bool {
        fn check(arena: &Arena, node: NodeId) -> bool {
            arena.stmt(node) != Stmt::Uses
                && arena
                    .children(node)
                    .iter()
                    .all(|&c| check(arena, c))
        }
        self.modules
            .values()
            .all(|&module| check(&self.arena, module))
    }
}

fn enabled_features(features: &FeatureMap, module: &str) -> Vec<String> {
    features
        .iter()
        .filter(|(_, &enabled)| enabled)
        .filter_map(|(key, _)| {
            key.strip_prefix(module)
                .and_then(|rest| rest.strip_prefix(':'))
                .map(str::to_string)
        })
        .collect()
}
