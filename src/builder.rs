//
// Copyright (c) The yangc Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Schema tree construction.
//!
//! The schema builder walks the fully expanded parse tree of a module in
//! document order and produces the typed, immutable schema nodes, applying
//! config and status inheritance, key handling, list/choice validation and
//! node filtering.

use log::{debug, warn};

use crate::compile::SchemaFilter;
use crate::error::{Result, Warning};
use crate::extensions::Extensions;
use crate::features::{if_features_satisfied, FeatureMap};
use crate::identity::IdentityGraph;
use crate::parse::{Arena, ModuleMap, NodeId};
use crate::schema::{
    check_status_reference, unknown_stmts, Case, Choice, Common, Container,
    Data, Leaf, LeafList, List, OpdArgument, OpdCommand, OpdOption,
    SchemaArena, SchemaId, Status,
};
use crate::stmt::Stmt;
use crate::types::{Type, TypeBuilder};
use crate::xpath::XpathAssembler;

pub(crate) struct SchemaBuilder<'a> {
    arena: &'a Arena,
    modules: &'a ModuleMap,
    features: &'a FeatureMap,
    identities: &'a IdentityGraph,
    assembler: &'a XpathAssembler<'a>,
    extensions: &'a dyn Extensions,
    filter: SchemaFilter,
    skip_unknown: bool,
    schema: &'a mut SchemaArena,
    warnings: &'a mut Vec<Warning>,
}

// Inherited build context of the node being converted.
#[derive(Clone, Copy)]
struct Inherited<'s> {
    parent: SchemaId,
    parent_path: &'s str,
    parent_module: &'s str,
    config: bool,
    status: Status,
    /// Inside an rpc or notification subtree, where `config` is ignored.
    operation: bool,
    /// Key names of the immediately enclosing list.
    keys: &'s [String],
}

impl<'a> SchemaBuilder<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        arena: &'a Arena,
        modules: &'a ModuleMap,
        features: &'a FeatureMap,
        identities: &'a IdentityGraph,
        assembler: &'a XpathAssembler<'a>,
        extensions: &'a dyn Extensions,
        filter: SchemaFilter,
        skip_unknown: bool,
        schema: &'a mut SchemaArena,
        warnings: &'a mut Vec<Warning>,
    ) -> SchemaBuilder<'a> {
        SchemaBuilder {
            arena,
            modules,
            features,
            identities,
            assembler,
            extensions,
            filter,
            skip_unknown,
            schema,
            warnings,
        }
    }

    /// Convert one expanded module into its schema tree, RPC list and
    /// notification list.
    pub(crate) fn build_module(
        &mut self,
        module: NodeId,
    ) -> Result<(SchemaId, Vec<SchemaId>, Vec<SchemaId>)> {
        let modname = self.arena.arg(module).to_string();
        debug!("building schema tree of module {}", modname);

        let mut common = Common {
            name: modname.clone(),
            namespace: self.arena.module_namespace(module).to_string(),
            module: modname.clone(),
            config: true,
            ..Default::default()
        };
        self.extensions.extend_tree(&mut common);
        let tree = self.schema.push(common, Data::Tree);

        let mut rpcs = Vec::new();
        let mut notifications = Vec::new();
        let inherited = Inherited {
            parent: tree,
            parent_path: "",
            parent_module: &modname,
            config: true,
            status: Status::Current,
            operation: false,
            keys: &[],
        };
        for child in self.arena.children(module).to_vec() {
            match self.arena.stmt(child) {
                Stmt::Rpc => {
                    if let Some(id) = self.build_node(child, inherited)? {
                        rpcs.push(id);
                    }
                }
                Stmt::Notification => {
                    if let Some(id) = self.build_node(child, inherited)? {
                        notifications.push(id);
                    }
                }
                kind if kind.is_data_def() || kind == Stmt::Choice => {
                    if let Some(id) = self.build_node(child, inherited)? {
                        self.schema.append_child(tree, id);
                    }
                }
                _ => (),
            }
        }
        Ok((tree, rpcs, notifications))
    }

    fn build_node(
        &mut self,
        node: NodeId,
        inherited: Inherited<'_>,
    ) -> Result<Option<SchemaId>> {
        if self.arena.is_not_supported(node) || self.arena.is_fake(node) {
            return Ok(None);
        }
        if !if_features_satisfied(
            self.arena,
            node,
            self.modules,
            self.features,
        ) {
            debug!(
                "dropping {}: disabled feature",
                self.arena.context_string(node)
            );
            return Ok(None);
        }

        let kind = self.arena.stmt(node);
        let config = self.effective_config(node, &inherited)?;
        let status = self.effective_status(node, inherited.status)?;
        self.check_feature_references(node, status)?;

        let survives = if kind.is_opd_def() {
            self.filter.contains(SchemaFilter::OPD)
        } else if config {
            self.filter.contains(SchemaFilter::CONFIG)
        } else {
            self.filter.contains(SchemaFilter::STATE)
        };
        if !survives {
            return Ok(None);
        }

        let name = self.arena.arg(node).to_string();
        let module = self.arena.root(node);
        let modname = self.arena.arg(module);
        let path = match kind {
            Stmt::Input => format!("{}/input", inherited.parent_path),
            Stmt::Output => format!("{}/output", inherited.parent_path),
            _ if inherited.parent_path.is_empty()
                || modname != inherited.parent_module =>
            {
                format!(
                    "{}/{}:{}",
                    inherited.parent_path, modname, name
                )
            }
            _ => format!("{}/{}", inherited.parent_path, name),
        };

        let mut common = Common {
            name: match kind {
                Stmt::Input => "input".to_string(),
                Stmt::Output => "output".to_string(),
                _ => name,
            },
            namespace: self.arena.module_namespace(module).to_string(),
            module: modname.to_string(),
            submodule: self.arena.submodule(node).map(str::to_string),
            description: self
                .arena
                .child_arg(node, Stmt::Description)
                .map(str::to_string),
            reference: self
                .arena
                .child_arg(node, Stmt::Reference)
                .map(str::to_string),
            config,
            status,
            whens: Vec::new(),
            musts: Vec::new(),
            extensions: self.enabled_extensions(node),
        };
        let whens: Vec<_> =
            self.arena.children_by_stmt(node, Stmt::When).collect();
        for when in whens {
            common.whens.push(self.assembler.assemble_when(
                when,
                &path,
                self.warnings,
            )?);
        }
        let musts: Vec<_> =
            self.arena.children_by_stmt(node, Stmt::Must).collect();
        for must in musts {
            common.musts.push(self.assembler.assemble_must(
                must,
                &path,
                self.warnings,
            )?);
        }

        let id = match kind {
            Stmt::Container => self.build_container(node, common, &path)?,
            Stmt::List => self.build_list(node, common, &path)?,
            Stmt::Leaf => match self.build_leaf(node, common, inherited)? {
                Some(id) => id,
                None => return Ok(None),
            },
            Stmt::LeafList => {
                match self.build_leaf_list(node, common)? {
                    Some(id) => id,
                    None => return Ok(None),
                }
            }
            Stmt::Choice => self.build_choice(node, common, &path)?,
            Stmt::Case => self.build_case(node, common, &path)?,
            Stmt::Rpc => self.build_rpc(node, common, &path)?,
            Stmt::Input | Stmt::Output => {
                self.build_operation_body(node, common, &path, kind)?
            }
            Stmt::Notification => {
                self.build_notification(node, common, &path)?
            }
            Stmt::OpdCommand
            | Stmt::OpdOption
            | Stmt::OpdArgument => {
                match self.build_opd(node, common, &path, kind)? {
                    Some(id) => id,
                    None => return Ok(None),
                }
            }
            _ => return Ok(None),
        };
        Ok(Some(id))
    }

    // ----- per-kind builders -----

    fn build_container(
        &mut self,
        node: NodeId,
        mut common: Common,
        path: &str,
    ) -> Result<SchemaId> {
        let mut data = Container {
            presence: self
                .arena
                .child_by_stmt(node, Stmt::Presence)
                .is_some(),
        };
        self.extensions.extend_container(&mut common, &mut data);
        let id = self.schema.push(common, Data::Container(data));
        self.build_children(node, id, path, &[])?;
        Ok(id)
    }

    fn build_list(
        &mut self,
        node: NodeId,
        mut common: Common,
        path: &str,
    ) -> Result<SchemaId> {
        let min_elements = self.parse_min_elements(node)?;
        let max_elements = self.parse_max_elements(node)?;
        if let Some(max) = max_elements {
            if max == 0 {
                return Err(self.arena.error(
                    node,
                    "max-elements must be greater than zero",
                ));
            }
            if let Some(min) = min_elements {
                if min > max {
                    return Err(self.arena.error(
                        node,
                        format!(
                            "min-elements {} is greater than \
                             max-elements {}",
                            min, max
                        ),
                    ));
                }
            }
        }

        let keys: Vec<String> = self
            .arena
            .child_arg(node, Stmt::Key)
            .map(|arg| arg.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        let uniques: Vec<String> = self
            .arena
            .children_by_stmt(node, Stmt::Unique)
            .map(|u| self.arena.arg(u).to_string())
            .collect();

        let mut data = List {
            keys: keys.clone(),
            uniques,
            min_elements,
            max_elements,
            user_ordered: self.parse_ordered_by(node)?,
        };
        self.extensions.extend_list(&mut common, &mut data);
        let id = self.schema.push(common, Data::List(data));
        self.build_children(node, id, path, &keys)?;

        for key in &keys {
            match self.schema.find_child(id, key) {
                Some(child) => {
                    if !matches!(self.schema.node(child).data, Data::Leaf(_))
                    {
                        return Err(self.arena.error(
                            node,
                            format!("list key {} is not a leaf", key),
                        ));
                    }
                }
                None => {
                    return Err(self.arena.error(
                        node,
                        format!("list key {} not found", key),
                    ));
                }
            }
        }
        self.check_uniques(node, id)?;
        Ok(id)
    }

    fn build_leaf(
        &mut self,
        node: NodeId,
        mut common: Common,
        inherited: Inherited<'_>,
    ) -> Result<Option<SchemaId>> {
        let type_node = self
            .arena
            .child_by_stmt(node, Stmt::Type)
            .ok_or_else(|| {
                self.arena.error(node, "leaf is missing its type")
            })?;
        let builder = TypeBuilder::new(
            self.arena,
            self.modules,
            self.identities,
            self.assembler,
        );
        let (ltype, inherited_units) =
            match builder.build(type_node, common.status) {
                Ok(built) => built,
                Err(e) if self.skip_unknown => {
                    warn!("dropping leaf {}: {}", common.name, e.msg);
                    return Ok(None);
                }
                Err(e) => return Err(e),
            };

        let own_default = self.arena.child_arg(node, Stmt::Default);
        if let Some(default) = own_default {
            ltype.validate(default).map_err(|e| {
                self.arena.error(
                    node,
                    format!(
                        "Invalid default '{}' for {}: {}",
                        default,
                        ltype.name(),
                        e
                    ),
                )
            })?;
        }
        let mandatory = self.arena.child_arg(node, Stmt::Mandatory)
            == Some("true");
        if mandatory && own_default.is_some() {
            return Err(self.arena.error(
                node,
                "Leaf cannot have default and be mandatory",
            ));
        }

        let mut default = own_default
            .map(str::to_string)
            .or_else(|| ltype.default_value().map(str::to_string));
        let mut mandatory = mandatory;
        let is_key = inherited.keys.contains(&common.name);
        if is_key {
            // Key leaves are implicitly instantiated with the list entry.
            mandatory = false;
            default = None;
        }

        let path_eval = match &ltype {
            Type::Leafref(_) => {
                let path_node =
                    self.arena.child_by_stmt(type_node, Stmt::Path);
                path_node.and_then(|p| {
                    self.assembler.assemble_leafref_path_eval(
                        p,
                        &format!(
                            "{}/{}",
                            inherited.parent_path, common.name
                        ),
                        self.warnings,
                    )
                })
            }
            _ => None,
        };

        let mut data = Leaf {
            ltype,
            units: self
                .arena
                .child_arg(node, Stmt::Units)
                .map(str::to_string)
                .or(inherited_units),
            mandatory,
            default,
            is_key,
            path_eval,
        };
        self.extensions.extend_leaf(&mut common, &mut data);
        Ok(Some(self.schema.push(common, Data::Leaf(data))))
    }

    fn build_leaf_list(
        &mut self,
        node: NodeId,
        mut common: Common,
    ) -> Result<Option<SchemaId>> {
        let type_node = self
            .arena
            .child_by_stmt(node, Stmt::Type)
            .ok_or_else(|| {
                self.arena.error(node, "leaf-list is missing its type")
            })?;
        let builder = TypeBuilder::new(
            self.arena,
            self.modules,
            self.identities,
            self.assembler,
        );
        let (ltype, inherited_units) =
            match builder.build(type_node, common.status) {
                Ok(built) => built,
                Err(e) if self.skip_unknown => {
                    warn!(
                        "dropping leaf-list {}: {}",
                        common.name, e.msg
                    );
                    return Ok(None);
                }
                Err(e) => return Err(e),
            };

        let min_elements = self.parse_min_elements(node)?;
        let max_elements = self.parse_max_elements(node)?;
        let own_default = self.arena.child_arg(node, Stmt::Default);
        if let Some(default) = own_default {
            ltype.validate(default).map_err(|e| {
                self.arena.error(
                    node,
                    format!(
                        "Invalid default '{}' for {}: {}",
                        default,
                        ltype.name(),
                        e
                    ),
                )
            })?;
        }

        let path_eval = match &ltype {
            Type::Leafref(_) => {
                let path_node =
                    self.arena.child_by_stmt(type_node, Stmt::Path);
                path_node.and_then(|p| {
                    self.assembler.assemble_leafref_path_eval(
                        p,
                        &common.name.clone(),
                        self.warnings,
                    )
                })
            }
            _ => None,
        };

        let mut data = LeafList {
            default: own_default
                .map(str::to_string)
                .or_else(|| ltype.default_value().map(str::to_string)),
            ltype,
            units: self
                .arena
                .child_arg(node, Stmt::Units)
                .map(str::to_string)
                .or(inherited_units),
            min_elements,
            max_elements,
            user_ordered: self.parse_ordered_by(node)?,
            path_eval,
        };
        self.extensions.extend_leaf_list(&mut common, &mut data);
        Ok(Some(self.schema.push(common, Data::LeafList(data))))
    }

    fn build_choice(
        &mut self,
        node: NodeId,
        mut common: Common,
        path: &str,
    ) -> Result<SchemaId> {
        let mandatory = self.arena.child_arg(node, Stmt::Mandatory)
            == Some("true");
        let default_case = self
            .arena
            .child_arg(node, Stmt::Default)
            .map(str::to_string);
        if mandatory && default_case.is_some() {
            return Err(self.arena.error(
                node,
                "choice cannot have both default and mandatory",
            ));
        }

        let config = common.config;
        let status = common.status;
        let module = common.module.clone();
        let mut data = Choice {
            default_case: default_case.clone(),
            mandatory,
        };
        self.extensions.extend_choice(&mut common, &mut data);
        let id = self.schema.push(common, Data::Choice(data));

        for child in self.arena.children(node).to_vec() {
            let kind = self.arena.stmt(child);
            let inherited = Inherited {
                parent: id,
                parent_path: path,
                parent_module: &module,
                config,
                status,
                operation: false,
                keys: &[],
            };
            if kind == Stmt::Case {
                if let Some(case) = self.build_node(child, inherited)? {
                    self.schema.append_child(id, case);
                }
            } else if kind.is_data_def() {
                // Shorthand case: wrap the lone child in an implicit case
                // of the same name.
                if let Some(built) = self.build_node(child, inherited)? {
                    let case_common = Common {
                        name: self.arena.arg(child).to_string(),
                        namespace: self
                            .schema
                            .node(built)
                            .common
                            .namespace
                            .clone(),
                        module: self
                            .schema
                            .node(built)
                            .common
                            .module
                            .clone(),
                        config,
                        status,
                        ..Default::default()
                    };
                    let case = self
                        .schema
                        .push(case_common, Data::Case(Case));
                    self.schema.append_child(id, case);
                    self.schema.append_child(case, built);
                }
            }
        }

        if let Some(default_case) = &default_case {
            if self.schema.find_child(id, default_case).is_none() {
                return Err(self.arena.error(
                    node,
                    format!("default case {} not found", default_case),
                ));
            }
        }
        Ok(id)
    }

    fn build_case(
        &mut self,
        node: NodeId,
        mut common: Common,
        path: &str,
    ) -> Result<SchemaId> {
        let mut data = Case;
        self.extensions.extend_case(&mut common, &mut data);
        let id = self.schema.push(common, Data::Case(data));
        self.build_children(node, id, path, &[])?;
        Ok(id)
    }

    fn build_rpc(
        &mut self,
        node: NodeId,
        mut common: Common,
        path: &str,
    ) -> Result<SchemaId> {
        common.config = false;
        let module = common.module.clone();
        let status = common.status;
        self.extensions.extend_rpc(&mut common);
        let id = self.schema.push(common, Data::Rpc);

        for kind in [Stmt::Input, Stmt::Output] {
            let inherited = Inherited {
                parent: id,
                parent_path: path,
                parent_module: &module,
                config: false,
                status,
                operation: true,
                keys: &[],
            };
            let body = match self.arena.child_by_stmt(node, kind) {
                Some(child) => self.build_node(child, inherited)?,
                // Absent input/output still produces an empty tree.
                None => Some(self.empty_operation_body(&module, kind)),
            };
            if let Some(body) = body {
                self.schema.append_child(id, body);
            }
        }
        Ok(id)
    }

    fn build_operation_body(
        &mut self,
        node: NodeId,
        common: Common,
        path: &str,
        kind: Stmt,
    ) -> Result<SchemaId> {
        let data = match kind {
            Stmt::Input => Data::Input,
            _ => Data::Output,
        };
        let id = self.schema.push(common, data);
        self.build_children_op(node, id, path)?;
        Ok(id)
    }

    fn empty_operation_body(&mut self, module: &str, kind: Stmt) -> SchemaId {
        let common = Common {
            name: if kind == Stmt::Input {
                "input".to_string()
            } else {
                "output".to_string()
            },
            module: module.to_string(),
            ..Default::default()
        };
        let data = match kind {
            Stmt::Input => Data::Input,
            _ => Data::Output,
        };
        self.schema.push(common, data)
    }

    fn build_notification(
        &mut self,
        node: NodeId,
        mut common: Common,
        path: &str,
    ) -> Result<SchemaId> {
        common.config = false;
        self.extensions.extend_notification(&mut common);
        let id = self.schema.push(common, Data::Notification);
        self.build_children_op(node, id, path)?;
        Ok(id)
    }

    fn build_opd(
        &mut self,
        node: NodeId,
        mut common: Common,
        path: &str,
        kind: Stmt,
    ) -> Result<Option<SchemaId>> {
        let ltype = match self.arena.child_by_stmt(node, Stmt::Type) {
            Some(type_node) => {
                let builder = TypeBuilder::new(
                    self.arena,
                    self.modules,
                    self.identities,
                    self.assembler,
                );
                match builder.build(type_node, common.status) {
                    Ok((ltype, _)) => Some(ltype),
                    Err(e) if self.skip_unknown => {
                        warn!(
                            "dropping {}: {}",
                            self.arena.context_string(node),
                            e.msg
                        );
                        return Ok(None);
                    }
                    Err(e) => return Err(e),
                }
            }
            None => None,
        };
        let units = self
            .arena
            .child_arg(node, Stmt::Units)
            .map(str::to_string);
        let default = self
            .arena
            .child_arg(node, Stmt::Default)
            .map(str::to_string);

        let id = match kind {
            Stmt::OpdCommand => {
                let mut data = OpdCommand;
                self.extensions.extend_opd_command(&mut common, &mut data);
                self.schema.push(common, Data::OpdCommand(data))
            }
            Stmt::OpdOption => {
                let mut data = OpdOption {
                    ltype,
                    units,
                    default,
                };
                self.extensions.extend_opd_option(&mut common, &mut data);
                self.schema.push(common, Data::OpdOption(data))
            }
            _ => {
                let mut data = OpdArgument {
                    ltype,
                    units,
                    default,
                };
                self.extensions
                    .extend_opd_argument(&mut common, &mut data);
                self.schema.push(common, Data::OpdArgument(data))
            }
        };
        self.build_children(node, id, path, &[])?;
        Ok(Some(id))
    }

    // ----- shared helpers -----

    fn build_children(
        &mut self,
        node: NodeId,
        parent: SchemaId,
        path: &str,
        keys: &[String],
    ) -> Result<()> {
        let config = self.schema.node(parent).common.config;
        let status = self.schema.node(parent).common.status;
        let module = self.schema.node(parent).common.module.clone();
        for child in self.arena.children(node).to_vec() {
            let kind = self.arena.stmt(child);
            if !(kind.is_data_def() || kind == Stmt::Choice) {
                continue;
            }
            let inherited = Inherited {
                parent,
                parent_path: path,
                parent_module: &module,
                config,
                status,
                operation: false,
                keys,
            };
            if let Some(id) = self.build_node(child, inherited)? {
                self.schema.append_child(parent, id);
            }
        }
        Ok(())
    }

    // Children of rpc input/output and notifications: config is ignored
    // there.
    fn build_children_op(
        &mut self,
        node: NodeId,
        parent: SchemaId,
        path: &str,
    ) -> Result<()> {
        let status = self.schema.node(parent).common.status;
        let module = self.schema.node(parent).common.module.clone();
        for child in self.arena.children(node).to_vec() {
            let kind = self.arena.stmt(child);
            if !(kind.is_data_def() || kind == Stmt::Choice) {
                continue;
            }
            let inherited = Inherited {
                parent,
                parent_path: path,
                parent_module: &module,
                config: false,
                status,
                operation: true,
                keys: &[],
            };
            if let Some(id) = self.build_node(child, inherited)? {
                self.schema.append_child(parent, id);
            }
        }
        Ok(())
    }

    fn effective_config(
        &self,
        node: NodeId,
        inherited: &Inherited<'_>,
    ) -> Result<bool> {
        if inherited.operation {
            return Ok(false);
        }
        match self.arena.child_arg(node, Stmt::Config) {
            Some("true") => {
                if !inherited.config {
                    return Err(self.arena.error(
                        node,
                        "config true node can't have a config false \
                         parent",
                    ));
                }
                Ok(true)
            }
            Some("false") => Ok(false),
            Some(other) => Err(self
                .arena
                .error(node, format!("invalid config value {}", other))),
            None => Ok(inherited.config),
        }
    }

    fn effective_status(
        &self,
        node: NodeId,
        parent: Status,
    ) -> Result<Status> {
        match self.arena.child_arg(node, Stmt::Status) {
            Some(arg) => match Status::from_literal(arg) {
                Some(own) => Ok(parent.max(own)),
                None => Err(self
                    .arena
                    .error(node, format!("invalid status {}", arg))),
            },
            None => Ok(parent),
        }
    }

    // Same-module feature references must not point at stricter statuses.
    fn check_feature_references(
        &self,
        node: NodeId,
        status: Status,
    ) -> Result<()> {
        for iff in self.arena.children_by_stmt(node, Stmt::IfFeature) {
            let (prefix, name) =
                Arena::split_prefix(self.arena.arg(iff));
            let module = match self.arena.module_by_prefix(
                iff,
                prefix.unwrap_or(""),
                self.modules,
            ) {
                Ok(module) => module,
                Err(_) => continue,
            };
            if module != self.arena.root(node) {
                continue;
            }
            if let Some(feature) =
                self.arena.lookup_child(module, Stmt::Feature, name)
            {
                check_status_reference(
                    self.arena,
                    iff,
                    status,
                    feature,
                    "feature",
                )?;
            }
        }
        Ok(())
    }

    fn enabled_extensions(
        &self,
        node: NodeId,
    ) -> Vec<crate::schema::UnknownStmt> {
        let mut stmts = unknown_stmts(self.arena, node);
        let enabled: Vec<bool> = self
            .arena
            .children_by_stmt(node, Stmt::Unknown)
            .map(|u| {
                if_features_satisfied(
                    self.arena,
                    u,
                    self.modules,
                    self.features,
                )
            })
            .collect();
        let mut keep = enabled.iter();
        stmts.retain(|_| *keep.next().unwrap_or(&true));
        stmts
    }

    fn parse_min_elements(&self, node: NodeId) -> Result<Option<u32>> {
        match self.arena.child_arg(node, Stmt::MinElements) {
            Some(arg) => arg
                .parse::<u32>()
                .map(Some)
                .map_err(|_| {
                    self.arena.error(
                        node,
                        format!("invalid min-elements {}", arg),
                    )
                }),
            None => Ok(None),
        }
    }

    fn parse_max_elements(&self, node: NodeId) -> Result<Option<u32>> {
        match self.arena.child_arg(node, Stmt::MaxElements) {
            Some("unbounded") | None => Ok(None),
            Some(arg) => arg
                .parse::<u32>()
                .map(Some)
                .map_err(|_| {
                    self.arena.error(
                        node,
                        format!("invalid max-elements {}", arg),
                    )
                }),
        }
    }

    fn parse_ordered_by(&self, node: NodeId) -> Result<bool> {
        match self.arena.child_arg(node, Stmt::OrderedBy) {
            Some("user") => Ok(true),
            Some("system") | None => Ok(false),
            Some(other) => Err(self
                .arena
                .error(node, format!("invalid ordered-by {}", other))),
        }
    }

    /// Every unique path must be a valid descendant that never traverses a
    /// list and terminates at a non-empty leaf.
    fn check_uniques(&self, node: NodeId, list: SchemaId) -> Result<()> {
        let uniques = match &self.schema.node(list).data {
            Data::List(data) => data.uniques.clone(),
            _ => return Ok(()),
        };
        for unique in &uniques {
            for path in unique.split_whitespace() {
                let mut current = list;
                let steps: Vec<&str> = path
                    .split('/')
                    .filter(|s| !s.is_empty())
                    .collect();
                for (i, step) in steps.iter().enumerate() {
                    let (_, name) = Arena::split_prefix(step);
                    let child = self
                        .schema
                        .find_child(current, name)
                        .ok_or_else(|| {
                            self.arena.error(
                                node,
                                format!(
                                    "unique path {} does not exist",
                                    path
                                ),
                            )
                        })?;
                    let last = i + 1 == steps.len();
                    match &self.schema.node(child).data {
                        Data::Leaf(leaf) if last => {
                            if matches!(leaf.ltype, Type::Empty) {
                                return Err(self.arena.error(
                                    node,
                                    format!(
                                        "unique path must not refer to \
                                         a leaf of type empty: {}",
                                        path
                                    ),
                                ));
                            }
                        }
                        _ if last => {
                            return Err(self.arena.error(
                                node,
                                format!(
                                    "unique path must refer to a \
                                     leaf: {}",
                                    path
                                ),
                            ));
                        }
                        Data::List(_) => {
                            return Err(self.arena.error(
                                node,
                                format!(
                                    "unique path must not traverse \
                                     a list: {}",
                                    path
                                ),
                            ));
                        }
                        _ => (),
                    }
                    current = child;
                }
            }
        }
        Ok(())
    }
}
