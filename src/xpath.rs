//
// Copyright (c) The yangc Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! XPath integration.
//!
//! The XPath lexer/parser/VM is an external collaborator. The compiler only
//! builds machines from `when`/`must`/`leafref path` expressions through the
//! [`XpathCompiler`] service trait, and the post-compilation path walk runs
//! [`PathEvalMachine`]s against the built schema tree. A [`NullCompiler`] is
//! provided for callers without an XPath engine.

use std::fmt::Debug;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{Result, Warning, WarningKind};
use crate::extensions::{Extensions, UserFunctionChecker};
use crate::model::ModelSet;
use crate::parse::{Arena, ModuleMap, NodeFlags, NodeId};
use crate::schema::SchemaNode;
use crate::stmt::Stmt;

/// Prefix to namespace bindings of the compiling module.
pub type PrefixMap = IndexMap<String, String>;

/// A compiled runtime machine, owned by the schema nodes referencing it.
pub trait XpathMachine: Debug + Send + Sync {
    /// Source text of the expression.
    fn expression(&self) -> &str;
}

/// Shared handle to a runtime machine.
pub type MachineRef = Arc<dyn XpathMachine>;

/// Grammar used when compiling a path-eval machine.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PathGrammar {
    Expression,
    Leafref,
}

/// Outcome of one path referenced by an expression.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PathOutcome {
    /// The path resolved; records whether the final node is a non-presence
    /// container.
    Resolved { np_container: bool },
    DoesntExist,
    MissingOrWrongPrefix,
}

/// A path referenced by an expression, with its resolution outcome.
#[derive(Clone, Debug)]
pub struct PathRef {
    pub path: String,
    pub outcome: PathOutcome,
}

/// Everything a path-eval machine reports for one evaluation.
#[derive(Clone, Debug, Default)]
pub struct PathEvalResult {
    pub refs: Vec<PathRef>,
}

/// Evaluation context handed to path-eval machines.
pub struct PathEvalContext<'a> {
    /// The schema node bearing the expression.
    pub node: SchemaNode<'a>,
    pub model_set: &'a ModelSet,
    /// Evaluation starts one step above the node (augment-origin `when`).
    pub shifted: bool,
}

/// A machine executed by the post-compilation path walk.
pub trait PathEvalMachine: Debug + Send + Sync {
    fn expression(&self) -> &str;
    fn run(&self, ctx: &PathEvalContext<'_>) -> PathEvalResult;
}

/// The external XPath compilation services.
pub trait XpathCompiler {
    /// Compile a `when`/`must` expression.
    fn compile_expr(
        &self,
        text: &str,
        prefixes: &PrefixMap,
    ) -> std::result::Result<MachineRef, String>;

    /// Compile a `leafref` path.
    fn compile_leafref(
        &self,
        text: &str,
        prefixes: &PrefixMap,
    ) -> std::result::Result<MachineRef, String>;

    /// Compile a machine for the post-compilation path walk. `checker`
    /// validates custom function names in extended `must` expressions so
    /// standalone compilation does not report false positives.
    fn compile_path_eval(
        &self,
        grammar: PathGrammar,
        text: &str,
        prefixes: &PrefixMap,
        checker: Option<&dyn UserFunctionChecker>,
    ) -> std::result::Result<Box<dyn PathEvalMachine>, String>;
}

/// `when` statement attached to a schema node.
#[derive(Debug)]
pub struct WhenContext {
    pub machine: MachineRef,
    /// Namespace of the compiling module.
    pub namespace: String,
    /// The `when` originated in an augment: runtime evaluation shifts one
    /// step up the data tree.
    pub from_augment: bool,
    pub(crate) path_eval: Option<Box<dyn PathEvalMachine>>,
}

/// `must` statement attached to a schema node.
#[derive(Debug)]
pub struct MustContext {
    pub machine: MachineRef,
    /// Extension-provided alternative machine, preferred at runtime with a
    /// silent fallback to the standard form.
    pub extended: Option<MachineRef>,
    pub error_message: String,
    pub app_tag: Option<String>,
    /// Namespace of the compiling module.
    pub namespace: String,
    pub(crate) path_eval: Option<Box<dyn PathEvalMachine>>,
    pub(crate) path_eval_ext: Option<Box<dyn PathEvalMachine>>,
}

// ===== impl WhenContext / MustContext =====

impl WhenContext {
    pub fn expression(&self) -> &str {
        self.machine.expression()
    }
}

impl MustContext {
    pub fn expression(&self) -> &str {
        self.machine.expression()
    }
}

/// Prefix bindings visible from `module`: its own prefix plus one binding
/// per import. Unresolvable imports are skipped; the schema builder drops
/// anything that depends on them.
pub(crate) fn prefix_map(
    arena: &Arena,
    module: NodeId,
    modules: &ModuleMap,
) -> PrefixMap {
    let mut map = PrefixMap::default();
    map.insert(
        arena.module_prefix(module).to_string(),
        arena.module_namespace(module).to_string(),
    );
    for import in arena.children_by_stmt(module, Stmt::Import) {
        let prefix = match arena.child_arg(import, Stmt::Prefix) {
            Some(prefix) => prefix.to_string(),
            None => continue,
        };
        if let Some(&imported) = modules.get(arena.arg(import)) {
            map.insert(
                prefix,
                arena.module_namespace(imported).to_string(),
            );
        }
    }
    map
}

// ===== XPath machine assembly =====

pub(crate) struct XpathAssembler<'a> {
    arena: &'a Arena,
    modules: &'a ModuleMap,
    compiler: &'a dyn XpathCompiler,
    extensions: &'a dyn Extensions,
    user_fns: Option<&'a dyn UserFunctionChecker>,
    warnings_requested: bool,
}

impl<'a> XpathAssembler<'a> {
    pub(crate) fn new(
        arena: &'a Arena,
        modules: &'a ModuleMap,
        compiler: &'a dyn XpathCompiler,
        extensions: &'a dyn Extensions,
        user_fns: Option<&'a dyn UserFunctionChecker>,
        warnings_requested: bool,
    ) -> XpathAssembler<'a> {
        XpathAssembler {
            arena,
            modules,
            compiler,
            extensions,
            user_fns,
            warnings_requested,
        }
    }

    fn prefixes(&self, node: NodeId) -> PrefixMap {
        prefix_map(self.arena, self.arena.root(node), self.modules)
    }

    /// Build the machine for one `when` statement.
    pub(crate) fn assemble_when(
        &self,
        when: NodeId,
        node_path: &str,
        warnings: &mut Vec<Warning>,
    ) -> Result<WhenContext> {
        let expr = self.arena.arg(when);
        let prefixes = self.prefixes(when);
        let machine = self
            .compiler
            .compile_expr(expr, &prefixes)
            .map_err(|e| self.arena.error(when, e))?;
        let path_eval = self.path_eval(
            PathGrammar::Expression,
            expr,
            &prefixes,
            None,
            WarningKind::CompilerError,
            node_path,
            warnings,
        );
        Ok(WhenContext {
            machine,
            namespace: self
                .arena
                .module_namespace(self.arena.root(when))
                .to_string(),
            from_augment: self
                .arena
                .flags(when)
                .contains(NodeFlags::FROM_AUGMENT),
            path_eval,
        })
    }

    /// Build the machines for one `must` statement: the standard form plus
    /// an extension-provided alternative, if any.
    pub(crate) fn assemble_must(
        &self,
        must: NodeId,
        node_path: &str,
        warnings: &mut Vec<Warning>,
    ) -> Result<MustContext> {
        let expr = self.arena.arg(must).to_string();
        let prefixes = self.prefixes(must);
        let machine = self
            .compiler
            .compile_expr(&expr, &prefixes)
            .map_err(|e| self.arena.error(must, e))?;

        let unknowns = crate::schema::unknown_stmts(self.arena, must);
        let alt = self.extensions.extend_must(&unknowns, &expr);
        // Prefer the extended form at runtime; fall back silently when it
        // does not compile.
        let extended = alt
            .as_deref()
            .and_then(|alt| self.compiler.compile_expr(alt, &prefixes).ok());

        let error_message = self
            .arena
            .child_arg(must, Stmt::ErrorMessage)
            .map(str::to_string)
            .unwrap_or_else(|| {
                format!("'must' condition is false: '{}'", expr)
            });
        let app_tag = self
            .arena
            .child_arg(must, Stmt::ErrorAppTag)
            .map(str::to_string);

        let path_eval = self.path_eval(
            PathGrammar::Expression,
            &expr,
            &prefixes,
            None,
            WarningKind::CompilerError,
            node_path,
            warnings,
        );
        let path_eval_ext = match &alt {
            Some(alt) => self.path_eval(
                PathGrammar::Expression,
                alt,
                &prefixes,
                self.user_fns,
                WarningKind::ConfigdMustCompilerError,
                node_path,
                warnings,
            ),
            None => None,
        };

        Ok(MustContext {
            machine,
            extended,
            error_message,
            app_tag,
            namespace: self
                .arena
                .module_namespace(self.arena.root(must))
                .to_string(),
            path_eval,
            path_eval_ext,
        })
    }

    /// Compile a leafref path machine.
    pub(crate) fn assemble_leafref(
        &self,
        path_node: NodeId,
    ) -> Result<MachineRef> {
        let prefixes = self.prefixes(path_node);
        self.compiler
            .compile_leafref(self.arena.arg(path_node), &prefixes)
            .map_err(|e| self.arena.error(path_node, e))
    }

    /// Compile a path-eval machine for the leafref path of a leaf node.
    pub(crate) fn assemble_leafref_path_eval(
        &self,
        path_node: NodeId,
        node_path: &str,
        warnings: &mut Vec<Warning>,
    ) -> Option<Box<dyn PathEvalMachine>> {
        let prefixes = self.prefixes(path_node);
        self.path_eval(
            PathGrammar::Leafref,
            self.arena.arg(path_node),
            &prefixes,
            None,
            WarningKind::CompilerError,
            node_path,
            warnings,
        )
    }

    // Path-eval machines are only built when warnings are requested; their
    // compile failures are reported as warnings, never as fatal errors.
    #[allow(clippy::too_many_arguments)]
    fn path_eval(
        &self,
        grammar: PathGrammar,
        text: &str,
        prefixes: &PrefixMap,
        checker: Option<&dyn UserFunctionChecker>,
        error_kind: WarningKind,
        node_path: &str,
        warnings: &mut Vec<Warning>,
    ) -> Option<Box<dyn PathEvalMachine>> {
        if !self.warnings_requested {
            return None;
        }
        match self
            .compiler
            .compile_path_eval(grammar, text, prefixes, checker)
        {
            Ok(machine) => Some(machine),
            Err(msg) => {
                warnings.push(Warning::new(error_kind, node_path, msg));
                None
            }
        }
    }
}

// ===== NullCompiler =====

/// An [`XpathCompiler`] that accepts every expression and resolves nothing.
/// Useful for callers that do not evaluate XPath at runtime.
#[derive(Debug, Default)]
pub struct NullCompiler;

#[derive(Debug)]
struct NullMachine {
    text: String,
}

impl XpathMachine for NullMachine {
    fn expression(&self) -> &str {
        &self.text
    }
}

impl PathEvalMachine for NullMachine {
    fn expression(&self) -> &str {
        &self.text
    }

    fn run(&self, _ctx: &PathEvalContext<'_>) -> PathEvalResult {
        PathEvalResult::default()
    }
}

impl XpathCompiler for NullCompiler {
    fn compile_expr(
        &self,
        text: &str,
        _prefixes: &PrefixMap,
    ) -> std::result::Result<MachineRef, String> {
        Ok(Arc::new(NullMachine {
            text: text.to_string(),
        }))
    }

    fn compile_leafref(
        &self,
        text: &str,
        _prefixes: &PrefixMap,
    ) -> std::result::Result<MachineRef, String> {
        Ok(Arc::new(NullMachine {
            text: text.to_string(),
        }))
    }

    fn compile_path_eval(
        &self,
        _grammar: PathGrammar,
        text: &str,
        _prefixes: &PrefixMap,
        _checker: Option<&dyn UserFunctionChecker>,
    ) -> std::result::Result<Box<dyn PathEvalMachine>, String> {
        Ok(Box::new(NullMachine {
            text: text.to_string(),
        }))
    }
}
