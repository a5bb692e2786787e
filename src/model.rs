//
// Copyright (c) The yangc Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! The compiled schema model.

use indexmap::IndexMap;

use crate::identity::IdentityGraph;
use crate::schema::{SchemaArena, SchemaId, SchemaNode};

/// A compiled YANG module.
#[derive(Debug)]
pub struct Model {
    pub name: String,
    pub revision: Option<String>,
    pub namespace: String,
    /// Original source text, when the parser provided it.
    pub text: Option<String>,
    /// Locally enabled feature names.
    pub enabled_features: Vec<String>,
    /// Modules that deviated this one.
    pub deviation_sources: Vec<String>,
    pub(crate) tree: SchemaId,
    pub(crate) rpcs: Vec<SchemaId>,
    pub(crate) notifications: Vec<SchemaId>,
}

/// A lightweight submodule record.
#[derive(Clone, Debug)]
pub struct Submodule {
    pub name: String,
    pub belongs_to: String,
    pub revision: Option<String>,
}

/// The compiled model set: one [`Model`] per module plus the submodule
/// records and the identity graph. Immutable once compilation finishes.
#[derive(Debug, Default)]
pub struct ModelSet {
    pub(crate) schema: SchemaArena,
    pub(crate) models: IndexMap<String, Model>,
    pub(crate) submodules: IndexMap<String, Submodule>,
    pub(crate) identities: IdentityGraph,
}

// ===== impl ModelSet =====

impl ModelSet {
    pub(crate) fn arena(&self) -> &SchemaArena {
        &self.schema
    }

    /// Get a model by module name.
    pub fn model(&self, name: &str) -> Option<&Model> {
        self.models.get(name)
    }

    /// Iterator over all models, in compilation order.
    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.models.values()
    }

    /// Get a submodule record by name.
    pub fn submodule(&self, name: &str) -> Option<&Submodule> {
        self.submodules.get(name)
    }

    /// Iterator over all submodule records.
    pub fn submodules(&self) -> impl Iterator<Item = &Submodule> {
        self.submodules.values()
    }

    /// The identity graph referenced by `identityref` types.
    pub fn identities(&self) -> &IdentityGraph {
        &self.identities
    }

    /// Root of the model's data tree.
    pub fn data_tree(&self, model: &Model) -> SchemaNode<'_> {
        SchemaNode::new(self, model.tree)
    }

    /// Iterator over the model's RPCs.
    pub fn rpcs<'a>(
        &'a self,
        model: &'a Model,
    ) -> impl Iterator<Item = SchemaNode<'a>> {
        model.rpcs.iter().map(move |&id| SchemaNode::new(self, id))
    }

    /// Iterator over the model's notifications.
    pub fn notifications<'a>(
        &'a self,
        model: &'a Model,
    ) -> impl Iterator<Item = SchemaNode<'a>> {
        model
            .notifications
            .iter()
            .map(move |&id| SchemaNode::new(self, id))
    }

    /// Returns an iterator over all schema nodes of all models (depth-first
    /// search algorithm).
    pub fn traverse(&self) -> impl Iterator<Item = SchemaNode<'_>> {
        self.models.values().flat_map(move |model| {
            let data = self
                .data_tree(model)
                .children()
                .flat_map(|snode| snode.traverse());
            let rpcs = self.rpcs(model).flat_map(|snode| snode.traverse());
            let notifications = self
                .notifications(model)
                .flat_map(|snode| snode.traverse());
            data.chain(rpcs).chain(notifications)
        })
    }

    /// Find a schema node by absolute path, as produced by
    /// [`SchemaNode::path`].
    pub fn find_path(&self, path: &str) -> Option<SchemaNode<'_>> {
        let mut steps = path.split('/').filter(|s| !s.is_empty());
        let first = steps.next()?;
        let (module, name) = first.split_once(':')?;
        let model = self.model(module)?;
        let mut node = self
            .data_tree(model)
            .children()
            .chain(self.rpcs(model))
            .chain(self.notifications(model))
            .find(|snode| snode.name() == name)?;
        for step in steps {
            let name = match step.split_once(':') {
                Some((_, name)) => name,
                None => step,
            };
            node = node.child(name)?;
        }
        Some(node)
    }
}
