//
// Copyright (c) The yangc Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Shared test support.
//!
//! The compiler consumes parse trees produced by an external YANG parser;
//! for the tests, a minimal statement reader feeds the arena directly from
//! inline YANG text, and a stub XPath engine implements the service traits
//! with simple location-path navigation over the built schema tree.

#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use yangc::compile::{Compiler, CompilerFlags, SchemaFilter};
use yangc::features::FeatureSet;
use yangc::model::ModelSet;
use yangc::parse::{Arena, ModuleMap, NodeId};
use yangc::schema::SchemaNode;
use yangc::stmt::Stmt;
use yangc::xpath::{
    MachineRef, PathEvalContext, PathEvalMachine, PathEvalResult,
    PathGrammar, PathOutcome, PathRef, PrefixMap, XpathCompiler,
    XpathMachine,
};
use yangc::{Location, Result, Warning};

// ===== statement reader =====

struct Reader<'s> {
    text: &'s str,
    pos: usize,
    line: u32,
}

#[derive(Debug, PartialEq)]
enum Token {
    Str(String),
    LBrace,
    RBrace,
    Semi,
}

impl<'s> Reader<'s> {
    fn new(text: &'s str) -> Reader<'s> {
        Reader {
            text,
            pos: 0,
            line: 1,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.text[self.pos..].chars().next()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.text[self.pos..].starts_with("//") => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                Some('/') if self.text[self.pos..].starts_with("/*") => {
                    self.bump();
                    self.bump();
                    while !self.text[self.pos..].starts_with("*/") {
                        if self.bump().is_none() {
                            return;
                        }
                    }
                    self.bump();
                    self.bump();
                }
                _ => return,
            }
        }
    }

    fn next_token(&mut self) -> Option<Token> {
        self.skip_trivia();
        match self.peek()? {
            '{' => {
                self.bump();
                Some(Token::LBrace)
            }
            '}' => {
                self.bump();
                Some(Token::RBrace)
            }
            ';' => {
                self.bump();
                Some(Token::Semi)
            }
            '"' | '\'' => {
                let quote = self.bump().unwrap();
                let mut s = String::new();
                while let Some(c) = self.bump() {
                    if c == '\\' && quote == '"' {
                        if let Some(escaped) = self.bump() {
                            s.push(match escaped {
                                'n' => '\n',
                                't' => '\t',
                                other => other,
                            });
                        }
                    } else if c == quote {
                        break;
                    } else {
                        s.push(c);
                    }
                }
                Some(Token::Str(s))
            }
            _ => {
                let mut s = String::new();
                while let Some(c) = self.peek() {
                    if c.is_whitespace() || "{};".contains(c) {
                        break;
                    }
                    s.push(c);
                    self.bump();
                }
                Some(Token::Str(s))
            }
        }
    }
}

fn location(file: &str, line: u32) -> Location {
    Location {
        file: file.to_string(),
        line,
        col: 1,
    }
}

fn parse_stmt(
    reader: &mut Reader<'_>,
    arena: &mut Arena,
    parent: Option<NodeId>,
    file: &str,
    keyword: String,
) -> NodeId {
    let line = reader.line;
    let mut arg = String::new();
    let mut next = reader.next_token();
    if let Some(Token::Str(s)) = &next {
        arg = s.clone();
        next = reader.next_token();
    }

    let (stmt, arg, unknown_keyword) = if keyword == "deviate" {
        let kind = match arg.as_str() {
            "not-supported" => Stmt::DeviateNotSupported,
            "add" => Stmt::DeviateAdd,
            "delete" => Stmt::DeviateDelete,
            "replace" => Stmt::DeviateReplace,
            other => panic!("unknown deviate argument: {}", other),
        };
        (kind, String::new(), None)
    } else {
        match Stmt::from_str(&keyword) {
            Ok(kind) => (kind, arg, None),
            Err(_) if keyword.contains(':') => {
                (Stmt::Unknown, arg, Some(keyword))
            }
            Err(_) => panic!("unknown keyword: {}", keyword),
        }
    };

    let node = match parent {
        Some(parent) => {
            arena.push_child(parent, stmt, arg, location(file, line))
        }
        None => arena.push_root(stmt, arg, location(file, line)),
    };
    if let Some(keyword) = unknown_keyword {
        arena.set_keyword(node, keyword);
    }

    match next {
        Some(Token::Semi) => node,
        Some(Token::LBrace) => {
            loop {
                match reader.next_token() {
                    Some(Token::RBrace) | None => break,
                    Some(Token::Str(keyword)) => {
                        parse_stmt(
                            reader,
                            arena,
                            Some(node),
                            file,
                            keyword,
                        );
                    }
                    Some(other) => {
                        panic!("unexpected token: {:?}", other)
                    }
                }
            }
            node
        }
        other => panic!("unexpected token after statement: {:?}", other),
    }
}

/// Parse one module/submodule source into the arena.
pub fn parse_source(arena: &mut Arena, text: &str) -> NodeId {
    let mut reader = Reader::new(text);
    let keyword = match reader.next_token() {
        Some(Token::Str(keyword)) => keyword,
        other => panic!("expected module keyword, got {:?}", other),
    };
    // Peek the argument to name the synthetic file.
    let save = reader.pos;
    let save_line = reader.line;
    let name = match reader.next_token() {
        Some(Token::Str(name)) => name,
        other => panic!("expected module name, got {:?}", other),
    };
    reader.pos = save;
    reader.line = save_line;

    let file = format!("{}.yang", name);
    let root = parse_stmt(&mut reader, arena, None, &file, keyword);
    arena.set_module_text(root, text);
    root
}

// ===== compilation helpers =====

pub struct Setup {
    pub flags: CompilerFlags,
    pub filter: SchemaFilter,
    pub features: FeatureSet,
}

impl Default for Setup {
    fn default() -> Setup {
        Setup {
            flags: CompilerFlags::empty(),
            filter: SchemaFilter::all(),
            features: FeatureSet::new(),
        }
    }
}

static STUB_XPATH: StubXpath = StubXpath;

/// Compile the given module sources with the stub XPath engine.
pub fn compile(sources: &[&str]) -> Result<(ModelSet, Vec<Warning>)> {
    compile_setup(sources, Setup::default())
}

/// Compile with the path walk enabled.
pub fn compile_with_warnings(
    sources: &[&str],
) -> Result<(ModelSet, Vec<Warning>)> {
    compile_setup(
        sources,
        Setup {
            flags: CompilerFlags::WARNINGS,
            ..Default::default()
        },
    )
}

pub fn compile_setup(
    sources: &[&str],
    setup: Setup,
) -> Result<(ModelSet, Vec<Warning>)> {
    // Surface the compiler's pass tracing when RUST_LOG is set.
    let _ = env_logger::builder().is_test(true).try_init();

    let mut arena = Arena::new();
    let mut modules = ModuleMap::default();
    let mut submodules = ModuleMap::default();
    for source in sources {
        let root = parse_source(&mut arena, source);
        let name = arena.arg(root).to_string();
        match arena.stmt(root) {
            Stmt::Module => {
                modules.insert(name, root);
            }
            Stmt::Submodule => {
                submodules.insert(name, root);
            }
            other => panic!("expected module or submodule, got {}", other),
        }
    }
    Compiler::new(arena, modules, submodules)
        .flags(setup.flags)
        .filter(setup.filter)
        .features(setup.features)
        .xpath(&STUB_XPATH)
        .build_models()
}

/// Shorthand: compile and expect failure, returning the error message.
pub fn compile_err(sources: &[&str]) -> String {
    match compile(sources) {
        Ok(_) => panic!("compilation unexpectedly succeeded"),
        Err(e) => e.msg,
    }
}

// ===== stub XPath engine =====

/// Accepts every expression; path-eval machines navigate simple relative
/// and absolute location paths over the built schema tree.
#[derive(Debug, Default)]
pub struct StubXpath;

#[derive(Debug)]
struct StubMachine {
    text: String,
}

impl XpathMachine for StubMachine {
    fn expression(&self) -> &str {
        &self.text
    }
}

#[derive(Debug)]
struct StubEval {
    text: String,
    grammar: PathGrammar,
    prefixes: PrefixMap,
}

impl XpathCompiler for StubXpath {
    fn compile_expr(
        &self,
        text: &str,
        _prefixes: &PrefixMap,
    ) -> std::result::Result<MachineRef, String> {
        Ok(Arc::new(StubMachine {
            text: text.to_string(),
        }))
    }

    fn compile_leafref(
        &self,
        text: &str,
        prefixes: &PrefixMap,
    ) -> std::result::Result<MachineRef, String> {
        for step in text.split('/') {
            if let Some((prefix, _)) = step.split_once(':') {
                if !prefixes.contains_key(prefix) {
                    return Err(format!("unknown import {}", prefix));
                }
            }
        }
        Ok(Arc::new(StubMachine {
            text: text.to_string(),
        }))
    }

    fn compile_path_eval(
        &self,
        grammar: PathGrammar,
        text: &str,
        prefixes: &PrefixMap,
        _checker: Option<&dyn yangc::extensions::UserFunctionChecker>,
    ) -> std::result::Result<Box<dyn PathEvalMachine>, String> {
        Ok(Box::new(StubEval {
            text: text.to_string(),
            grammar,
            prefixes: prefixes.clone(),
        }))
    }
}

impl StubEval {
    fn is_path(&self) -> bool {
        self.grammar == PathGrammar::Leafref
            || (!self.text.contains('(')
                && self
                    .text
                    .chars()
                    .all(|c| c.is_alphanumeric() || "_./:-".contains(c)))
    }
}

impl PathEvalMachine for StubEval {
    fn expression(&self) -> &str {
        &self.text
    }

    fn run(&self, ctx: &PathEvalContext<'_>) -> PathEvalResult {
        if !self.is_path() {
            return PathEvalResult::default();
        }

        let mut current: Option<SchemaNode<'_>> = Some(ctx.node);
        if ctx.shifted {
            current = current.and_then(|n| n.parent());
        }
        let absolute = self.text.starts_with('/');
        let mut steps = self.text.split('/').filter(|s| !s.is_empty());
        let mut outcome = None;

        if absolute {
            current = match steps.next() {
                Some(first) => {
                    let (module, name) = match first.split_once(':') {
                        Some((module, name)) => (module.to_string(), name),
                        None => {
                            (ctx.node.module_name().to_string(), first)
                        }
                    };
                    match ctx.model_set.model(&module) {
                        Some(model) => ctx
                            .model_set
                            .data_tree(model)
                            .children()
                            .find(|c| c.name() == name),
                        None => {
                            outcome =
                                Some(PathOutcome::MissingOrWrongPrefix);
                            None
                        }
                    }
                }
                None => None,
            };
        }

        for step in steps {
            if outcome.is_some() {
                break;
            }
            current = match step {
                ".." => current.and_then(|n| n.parent()),
                step => {
                    let name = match step.split_once(':') {
                        Some((prefix, name)) => {
                            if !self.prefixes.contains_key(prefix) {
                                outcome = Some(
                                    PathOutcome::MissingOrWrongPrefix,
                                );
                            }
                            name
                        }
                        None => step,
                    };
                    current.and_then(|n| n.child(name))
                }
            };
        }

        let outcome = outcome.unwrap_or(match current {
            Some(node) => PathOutcome::Resolved {
                np_container: node.is_np_container(),
            },
            None => PathOutcome::DoesntExist,
        });
        PathEvalResult {
            refs: vec![PathRef {
                path: self.text.clone(),
                outcome,
            }],
        }
    }
}
