//
// Copyright (c) The yangc Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Extension hooks.
//!
//! Callers may register an [`Extensions`] implementation to teach the
//! compiler about extension statements (cardinality of unknown statements,
//! alternative `must` expressions) and to decorate schema nodes as they are
//! built. Every method has a no-op default.

use crate::model::{Model, ModelSet};
use crate::schema::{
    Case, Choice, Common, Container, Leaf, LeafList, List, OpdArgument,
    OpdCommand, OpdOption, UnknownStmt,
};
use crate::stmt::Cardinality;
use crate::types::Type;

/// Validates custom XPath function names during extended-must path
/// evaluation.
pub trait UserFunctionChecker {
    fn is_valid(&self, name: &str) -> bool;
}

/// Compiler extension hooks. All methods default to doing nothing.
pub trait Extensions {
    /// Cardinality of an unknown statement `keyword` under `parent_keyword`.
    /// Returning `None` leaves unknown statements unconstrained.
    fn cardinality(
        &self,
        _parent_keyword: &str,
        _keyword: &str,
    ) -> Option<Cardinality> {
        None
    }

    /// An alternative expression for a `must`, typically expanding custom
    /// functions. `stmts` are the unknown substatements of the `must`.
    fn extend_must(
        &self,
        _stmts: &[UnknownStmt],
        _expr: &str,
    ) -> Option<String> {
        None
    }

    fn extend_container(&self, _common: &mut Common, _data: &mut Container) {}

    fn extend_list(&self, _common: &mut Common, _data: &mut List) {}

    fn extend_leaf(&self, _common: &mut Common, _data: &mut Leaf) {}

    fn extend_leaf_list(&self, _common: &mut Common, _data: &mut LeafList) {}

    fn extend_choice(&self, _common: &mut Common, _data: &mut Choice) {}

    fn extend_case(&self, _common: &mut Common, _data: &mut Case) {}

    fn extend_type(&self, _stmts: &[UnknownStmt], _data: &mut Type) {}

    fn extend_rpc(&self, _common: &mut Common) {}

    fn extend_notification(&self, _common: &mut Common) {}

    fn extend_tree(&self, _common: &mut Common) {}

    fn extend_opd_command(
        &self,
        _common: &mut Common,
        _data: &mut OpdCommand,
    ) {
    }

    fn extend_opd_option(&self, _common: &mut Common, _data: &mut OpdOption) {}

    fn extend_opd_argument(
        &self,
        _common: &mut Common,
        _data: &mut OpdArgument,
    ) {
    }

    fn extend_model(&self, _model: &mut Model) {}

    fn extend_model_set(&self, _set: &mut ModelSet) {}
}

/// The default hook set: no extensions.
#[derive(Debug, Default)]
pub struct NoExtensions;

impl Extensions for NoExtensions {}
