//
// Copyright (c) The yangc Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Feature flag sources and `if-feature` resolution.

use std::collections::HashSet;
use std::path::PathBuf;

use indexmap::IndexMap;
use log::debug;

use crate::error::Result;
use crate::parse::{Arena, ModuleMap, NodeId};
use crate::stmt::Stmt;

/// Resolved feature enablement, keyed by canonical `module:feature`.
pub type FeatureMap = IndexMap<String, bool>;

/// Tri-state answer from a single feature source.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FeatureStatus {
    Enabled,
    Disabled,
    NotPresent,
}

/// A source of feature enablement answers.
///
/// Feature identifiers are canonical `module:feature` pairs.
pub trait FeatureChecker {
    fn status(&self, module: &str, feature: &str) -> FeatureStatus;
}

/// In-memory feature name list.
#[derive(Debug, Default)]
pub struct FeatureList {
    enabled: HashSet<String>,
    disabled: HashSet<String>,
}

/// Feature directory scan: the file `<root>/<module>/<feature>` existing
/// means the feature is enabled.
#[derive(Debug)]
pub struct FeatureDir {
    root: PathBuf,
}

/// A stack of feature sources, queried in order. The last source returning a
/// decisive answer wins; with no decisive answer a feature is disabled.
#[derive(Default)]
pub struct FeatureSet {
    sources: Vec<Box<dyn FeatureChecker>>,
}

/// Canonical `module:feature` identifier.
pub fn feature_key(module: &str, feature: &str) -> String {
    format!("{}:{}", module, feature)
}

// ===== impl FeatureList =====

impl FeatureList {
    /// A source enabling exactly the given `module:feature` names.
    pub fn enabled<I, S>(names: I) -> FeatureList
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FeatureList {
            enabled: names.into_iter().map(Into::into).collect(),
            disabled: HashSet::new(),
        }
    }

    /// A source disabling exactly the given `module:feature` names.
    pub fn disabled<I, S>(names: I) -> FeatureList
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FeatureList {
            enabled: HashSet::new(),
            disabled: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl FeatureChecker for FeatureList {
    fn status(&self, module: &str, feature: &str) -> FeatureStatus {
        let key = feature_key(module, feature);
        if self.enabled.contains(&key) {
            FeatureStatus::Enabled
        } else if self.disabled.contains(&key) {
            FeatureStatus::Disabled
        } else {
            FeatureStatus::NotPresent
        }
    }
}

// ===== impl FeatureDir =====

impl FeatureDir {
    pub fn new(root: impl Into<PathBuf>) -> FeatureDir {
        FeatureDir { root: root.into() }
    }
}

impl FeatureChecker for FeatureDir {
    fn status(&self, module: &str, feature: &str) -> FeatureStatus {
        if self.root.join(module).join(feature).is_file() {
            FeatureStatus::Enabled
        } else {
            FeatureStatus::NotPresent
        }
    }
}

// ===== impl FeatureSet =====

impl FeatureSet {
    pub fn new() -> FeatureSet {
        FeatureSet::default()
    }

    /// Push a source onto the stack. Later sources override earlier ones.
    pub fn add(&mut self, source: impl FeatureChecker + 'static) {
        self.sources.push(Box::new(source));
    }

    /// Whether the external sources enable `module:feature`.
    pub fn is_enabled(&self, module: &str, feature: &str) -> bool {
        let mut enabled = false;
        for source in &self.sources {
            match source.status(module, feature) {
                FeatureStatus::Enabled => enabled = true,
                FeatureStatus::Disabled => enabled = false,
                FeatureStatus::NotPresent => (),
            }
        }
        enabled
    }
}

impl FeatureChecker for FeatureSet {
    fn status(&self, module: &str, feature: &str) -> FeatureStatus {
        let mut status = FeatureStatus::NotPresent;
        for source in &self.sources {
            match source.status(module, feature) {
                FeatureStatus::NotPresent => (),
                decisive => status = decisive,
            }
        }
        status
    }
}

// ===== if-feature resolution =====

pub(crate) struct FeatureResolver<'a> {
    arena: &'a Arena,
    modules: &'a ModuleMap,
    checker: &'a FeatureSet,
    skip_unknown: bool,
    resolved: FeatureMap,
    // Features on the current recursion chain.
    in_progress: HashSet<String>,
}

impl<'a> FeatureResolver<'a> {
    pub(crate) fn new(
        arena: &'a Arena,
        modules: &'a ModuleMap,
        checker: &'a FeatureSet,
        skip_unknown: bool,
    ) -> FeatureResolver<'a> {
        FeatureResolver {
            arena,
            modules,
            checker,
            skip_unknown,
            resolved: FeatureMap::default(),
            in_progress: HashSet::new(),
        }
    }

    /// Resolve every feature of every module, in the supplied module order.
    pub(crate) fn resolve(mut self, order: &[String]) -> Result<FeatureMap> {
        for name in order {
            let module = self.modules[name.as_str()];
            let mut seen = HashSet::new();
            let features: Vec<_> = self
                .arena
                .children_by_stmt(module, Stmt::Feature)
                .collect();
            for feature in features {
                let fname = self.arena.arg(feature).to_string();
                if !seen.insert(fname.clone()) {
                    return Err(self.arena.error(
                        feature,
                        format!("Duplicate feature {}", fname),
                    ));
                }
                self.verify(module, feature)?;
            }
        }
        debug!("resolved {} features", self.resolved.len());
        Ok(self.resolved)
    }

    /// A feature is enabled iff the external sources enable it and every one
    /// of its `if-feature` references resolves to an enabled feature.
    fn verify(&mut self, module: NodeId, feature: NodeId) -> Result<bool> {
        let modname = self.arena.arg(module).to_string();
        let name = self.arena.arg(feature).to_string();
        let key = feature_key(&modname, &name);

        if let Some(&enabled) = self.resolved.get(&key) {
            return Ok(enabled);
        }
        if !self.in_progress.insert(key.clone()) {
            return Err(self.arena.error(
                feature,
                format!("Feature cyclic reference: {}", name),
            ));
        }

        let mut enabled = self.checker.is_enabled(&modname, &name);
        if enabled {
            let if_features: Vec<_> = self
                .arena
                .children_by_stmt(feature, Stmt::IfFeature)
                .collect();
            for if_feature in if_features {
                if !self.reference_enabled(if_feature)? {
                    enabled = false;
                    break;
                }
            }
        }

        self.in_progress.remove(&key);
        self.resolved.insert(key, enabled);
        Ok(enabled)
    }

    /// Resolve the feature named by an `if-feature` statement.
    fn reference_enabled(&mut self, if_feature: NodeId) -> Result<bool> {
        let (prefix, name) =
            Arena::split_prefix(self.arena.arg(if_feature));
        let target_module = match self.arena.module_by_prefix(
            if_feature,
            prefix.unwrap_or(""),
            self.modules,
        ) {
            Ok(module) => module,
            Err(_) if self.skip_unknown => return Ok(false),
            Err(e) => return Err(e),
        };
        match self
            .arena
            .lookup_child(target_module, Stmt::Feature, name)
        {
            Some(target) => self.verify(target_module, target),
            None if self.skip_unknown => Ok(false),
            None => Err(self.arena.error(
                if_feature,
                format!("Can't find feature {}", self.arena.arg(if_feature)),
            )),
        }
    }
}

/// Whether every `if-feature` on `node` references an enabled feature.
/// Nodes failing this check are filtered out of the schema.
pub(crate) fn if_features_satisfied(
    arena: &Arena,
    node: NodeId,
    modules: &ModuleMap,
    features: &FeatureMap,
) -> bool {
    arena.children_by_stmt(node, Stmt::IfFeature).all(|iff| {
        let (prefix, name) = Arena::split_prefix(arena.arg(iff));
        match arena.module_by_prefix(iff, prefix.unwrap_or(""), modules) {
            Ok(module) => {
                let key = feature_key(arena.arg(module), name);
                features.get(&key).copied().unwrap_or(false)
            }
            Err(_) => false,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_decisive_source_wins() {
        let mut set = FeatureSet::new();
        set.add(FeatureList::enabled(vec!["m:a", "m:b"]));
        set.add(FeatureList::disabled(vec!["m:b"]));

        assert!(set.is_enabled("m", "a"));
        assert!(!set.is_enabled("m", "b"));
        // Default is disabled.
        assert!(!set.is_enabled("m", "c"));
    }

    #[test]
    fn later_enable_overrides_earlier_disable() {
        let mut set = FeatureSet::new();
        set.add(FeatureList::disabled(vec!["m:a"]));
        set.add(FeatureList::enabled(vec!["m:a"]));
        assert!(set.is_enabled("m", "a"));
    }
}
