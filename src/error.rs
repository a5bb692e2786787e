//
// Copyright (c) The yangc Core Contributors
//
// SPDX-License-Identifier: MIT
//

/// A convenience wrapper around `Result` for `yangc::Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// Source location of a parse node, as reported by the external parser.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub col: u32,
}

/// A fatal compilation diagnostic.
///
/// Compilation never partially succeeds: the first fatal diagnostic unwinds
/// through every pass and is returned as the overall result.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Error {
    pub msg: String,
    pub location: Option<Location>,
}

/// Non-fatal diagnostics collected during the post-compilation XPath walk.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WarningKind {
    /// A referenced path does not resolve anywhere in the schema.
    DoesntExist,
    /// A path step carries a prefix that resolves to no known module.
    MissingOrWrongPrefix,
    /// An XPath expression failed to compile.
    CompilerError,
    /// The extended form of a `must` expression failed to compile.
    ConfigdMustCompilerError,
    /// A `must`/`when` references a non-presence container.
    RefNPContainer,
    /// A `must`/`when` sits on a non-presence container with no default or
    /// mandatory descendant.
    MustOnNPContainer,
    /// As `MustOnNPContainer`, but the container has a non-presence container
    /// child, guaranteeing instantiation.
    MustOnNPContWithNPChild,
    /// A path that resolved from at least one instantiation site.
    ValidPath,
}

/// A single warning, anchored at the schema node that carries the expression.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Warning {
    pub kind: WarningKind,
    /// Path of the schema node the warning is anchored at.
    pub node_path: String,
    pub msg: String,
}

// ===== impl Location =====

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.col)
    }
}

// ===== impl Error =====

impl Error {
    /// An error with no source context.
    pub fn new(msg: impl Into<String>) -> Error {
        Error {
            msg: msg.into(),
            location: None,
        }
    }

    /// An error anchored at a source location.
    pub fn at(location: Location, msg: impl Into<String>) -> Error {
        Error {
            msg: msg.into(),
            location: Some(location),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{}: {}", location, self.msg),
            None => write!(f, "{}", self.msg),
        }
    }
}

impl std::error::Error for Error {}

// ===== impl Warning =====

impl Warning {
    pub fn new(
        kind: WarningKind,
        node_path: impl Into<String>,
        msg: impl Into<String>,
    ) -> Warning {
        Warning {
            kind,
            node_path: node_path.into(),
            msg: msg.into(),
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}: {}", self.kind, self.node_path, self.msg)
    }
}
