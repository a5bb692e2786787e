//
// Copyright (c) The yangc Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Derived-type construction.
//!
//! The type builder walks `typedef`/`type` chains down to the built-in base
//! and re-applies restrictions on the way up. Every refinement produces a
//! fresh immutable type value, and every constructed type validates its own
//! default against its own constraints with the same routine that validates
//! data at runtime.

use std::convert::TryFrom;

use regex::Regex;

use crate::error::Result;
use crate::identity::{identity_key, Identity, IdentityGraph};
use crate::parse::{Arena, ModuleMap, NodeId};
use crate::range::{Dec64, RangeSet};
use crate::schema::{check_status_reference, Status};
use crate::stmt::Stmt;
use crate::xpath::{MachineRef, XpathAssembler};

/// Width of an integer type.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
}

impl IntWidth {
    pub fn bits(self) -> u32 {
        match self {
            IntWidth::W8 => 8,
            IntWidth::W16 => 16,
            IntWidth::W32 => 32,
            IntWidth::W64 => 64,
        }
    }

    fn signed_bounds(self) -> (i64, i64) {
        match self {
            IntWidth::W8 => (i8::MIN as i64, i8::MAX as i64),
            IntWidth::W16 => (i16::MIN as i64, i16::MAX as i64),
            IntWidth::W32 => (i32::MIN as i64, i32::MAX as i64),
            IntWidth::W64 => (i64::MIN, i64::MAX),
        }
    }

    fn unsigned_bounds(self) -> (u64, u64) {
        match self {
            IntWidth::W8 => (0, u8::MAX as u64),
            IntWidth::W16 => (0, u16::MAX as u64),
            IntWidth::W32 => (0, u32::MAX as u64),
            IntWidth::W64 => (0, u64::MAX),
        }
    }
}

/// A compiled `pattern` restriction.
#[derive(Clone, Debug)]
pub struct Pattern {
    pub raw: String,
    pub regex: Regex,
    /// Help text shown on mismatch (the pattern's `error-message`).
    pub help: Option<String>,
    pub app_tag: Option<String>,
}

#[derive(Clone, Debug)]
pub struct BooleanType {
    pub default: Option<String>,
}

#[derive(Clone, Debug)]
pub struct IntegerType {
    pub width: IntWidth,
    pub ranges: RangeSet<i64>,
    pub range_error: Option<String>,
    pub range_app_tag: Option<String>,
    pub default: Option<String>,
}

#[derive(Clone, Debug)]
pub struct UintegerType {
    pub width: IntWidth,
    pub ranges: RangeSet<u64>,
    pub range_error: Option<String>,
    pub range_app_tag: Option<String>,
    pub default: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Decimal64Type {
    pub fraction_digits: u8,
    pub ranges: RangeSet<Dec64>,
    pub range_error: Option<String>,
    pub range_app_tag: Option<String>,
    pub default: Option<String>,
}

#[derive(Clone, Debug)]
pub struct StringType {
    pub length: RangeSet<u64>,
    pub length_error: Option<String>,
    pub length_app_tag: Option<String>,
    pub patterns: Vec<Pattern>,
    pub default: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EnumItem {
    pub name: String,
    pub value: i64,
}

#[derive(Clone, Debug)]
pub struct EnumerationType {
    pub enums: Vec<EnumItem>,
    pub default: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BitItem {
    pub name: String,
    pub position: u32,
}

#[derive(Clone, Debug)]
pub struct BitsType {
    pub bits: Vec<BitItem>,
    pub default: Option<String>,
}

#[derive(Clone, Debug)]
pub struct IdentityrefType {
    /// Canonical `module:name` of the base identity.
    pub base: String,
    /// Transitive closure of identities derived from the base.
    pub identities: Vec<Identity>,
    pub default: Option<String>,
}

#[derive(Clone, Debug)]
pub struct InstanceIdType {
    pub require_instance: bool,
    pub default: Option<String>,
}

#[derive(Clone, Debug)]
pub struct UnionType {
    pub members: Vec<Type>,
    pub default: Option<String>,
}

#[derive(Clone, Debug)]
pub struct LeafrefType {
    pub path: String,
    pub machine: MachineRef,
    pub default: Option<String>,
}

/// A fully constructed leaf(-list) type.
#[derive(Clone, Debug)]
pub enum Type {
    Boolean(BooleanType),
    Empty,
    Enumeration(EnumerationType),
    Identityref(IdentityrefType),
    InstanceId(InstanceIdType),
    Integer(IntegerType),
    Uinteger(UintegerType),
    Decimal64(Decimal64Type),
    String(StringType),
    Union(UnionType),
    Leafref(LeafrefType),
    Bits(BitsType),
}

// ===== impl Type =====

impl Type {
    /// The built-in base name of the type.
    pub fn name(&self) -> &'static str {
        match self {
            Type::Boolean(_) => "boolean",
            Type::Empty => "empty",
            Type::Enumeration(_) => "enumeration",
            Type::Identityref(_) => "identityref",
            Type::InstanceId(_) => "instance-identifier",
            Type::Integer(t) => match t.width {
                IntWidth::W8 => "int8",
                IntWidth::W16 => "int16",
                IntWidth::W32 => "int32",
                IntWidth::W64 => "int64",
            },
            Type::Uinteger(t) => match t.width {
                IntWidth::W8 => "uint8",
                IntWidth::W16 => "uint16",
                IntWidth::W32 => "uint32",
                IntWidth::W64 => "uint64",
            },
            Type::Decimal64(_) => "decimal64",
            Type::String(_) => "string",
            Type::Union(_) => "union",
            Type::Leafref(_) => "leafref",
            Type::Bits(_) => "bits",
        }
    }

    /// The type's default value, if any.
    pub fn default_value(&self) -> Option<&str> {
        match self {
            Type::Boolean(t) => t.default.as_deref(),
            Type::Empty => None,
            Type::Enumeration(t) => t.default.as_deref(),
            Type::Identityref(t) => t.default.as_deref(),
            Type::InstanceId(t) => t.default.as_deref(),
            Type::Integer(t) => t.default.as_deref(),
            Type::Uinteger(t) => t.default.as_deref(),
            Type::Decimal64(t) => t.default.as_deref(),
            Type::String(t) => t.default.as_deref(),
            Type::Union(t) => t.default.as_deref(),
            Type::Leafref(t) => t.default.as_deref(),
            Type::Bits(t) => t.default.as_deref(),
        }
    }

    pub(crate) fn set_default(&mut self, default: Option<String>) {
        match self {
            Type::Boolean(t) => t.default = default,
            Type::Empty => (),
            Type::Enumeration(t) => t.default = default,
            Type::Identityref(t) => t.default = default,
            Type::InstanceId(t) => t.default = default,
            Type::Integer(t) => t.default = default,
            Type::Uinteger(t) => t.default = default,
            Type::Decimal64(t) => t.default = default,
            Type::String(t) => t.default = default,
            Type::Union(t) => t.default = default,
            Type::Leafref(t) => t.default = default,
            Type::Bits(t) => t.default = default,
        }
    }

    /// Validate a data value against the type's constraints. This is the
    /// same routine used to validate defaults at compile time.
    pub fn validate(&self, value: &str) -> std::result::Result<(), String> {
        match self {
            Type::Boolean(_) => match value {
                "true" | "false" => Ok(()),
                _ => Err(format!("'{}' is not a boolean", value)),
            },
            Type::Empty => {
                if value.is_empty() {
                    Ok(())
                } else {
                    Err("empty type does not take a value".to_string())
                }
            }
            Type::Enumeration(t) => {
                if t.enums.iter().any(|e| e.name == value) {
                    Ok(())
                } else {
                    Err(format!("unknown enum '{}'", value))
                }
            }
            Type::Identityref(t) => {
                let matches = t.identities.iter().any(|identity| {
                    identity.name == value
                        || identity_key(&identity.module, &identity.name)
                            == value
                });
                if matches {
                    Ok(())
                } else {
                    Err(format!(
                        "'{}' is not derived from {}",
                        value, t.base
                    ))
                }
            }
            // Instance identifiers and leafrefs are checked against live
            // data at runtime.
            Type::InstanceId(_) | Type::Leafref(_) => Ok(()),
            Type::Integer(t) => {
                let parsed = value
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| format!("'{}' is not an integer", value))?;
                if t.ranges.contains(parsed) {
                    Ok(())
                } else {
                    Err(format!(
                        "'{}' is out of range {}",
                        value, t.ranges
                    ))
                }
            }
            Type::Uinteger(t) => {
                let parsed = value.trim().parse::<u64>().map_err(|_| {
                    format!("'{}' is not an unsigned integer", value)
                })?;
                if t.ranges.contains(parsed) {
                    Ok(())
                } else {
                    Err(format!(
                        "'{}' is out of range {}",
                        value, t.ranges
                    ))
                }
            }
            Type::Decimal64(t) => {
                let parsed = parse_decimal64(value, t.fraction_digits)
                    .ok_or_else(|| {
                        format!("'{}' is not a decimal64 value", value)
                    })?;
                if t.ranges.contains(Dec64::new(parsed, t.fraction_digits)) {
                    Ok(())
                } else {
                    Err(format!(
                        "'{}' is out of range {}",
                        value, t.ranges
                    ))
                }
            }
            Type::String(t) => {
                let len = value.chars().count() as u64;
                if !t.length.contains(len) {
                    return Err(format!(
                        "length {} is outside {}",
                        len, t.length
                    ));
                }
                for pattern in &t.patterns {
                    if !pattern.regex.is_match(value) {
                        return Err(match &pattern.help {
                            Some(help) => help.clone(),
                            None => format!(
                                "'{}' does not match pattern '{}'",
                                value, pattern.raw
                            ),
                        });
                    }
                }
                Ok(())
            }
            Type::Union(t) => {
                if t.members.iter().any(|m| m.validate(value).is_ok()) {
                    Ok(())
                } else {
                    Err(format!(
                        "'{}' does not match any member type",
                        value
                    ))
                }
            }
            Type::Bits(t) => {
                for name in value.split_whitespace() {
                    if !t.bits.iter().any(|b| b.name == name) {
                        return Err(format!("unknown bit '{}'", name));
                    }
                }
                Ok(())
            }
        }
    }
}

/// Parse a decimal64 literal into fraction-digit units.
pub(crate) fn parse_decimal64(text: &str, fraction_digits: u8) -> Option<i64> {
    let text = text.trim();
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let (int_part, frac_part) = match rest.split_once('.') {
        Some((i, f)) => (i, f),
        None => (rest, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if frac_part.len() > fraction_digits as usize {
        return None;
    }
    let mut units: i128 = if int_part.is_empty() {
        0
    } else {
        int_part.parse::<i128>().ok()?
    };
    let scale = 10i128.pow(fraction_digits as u32);
    units = units.checked_mul(scale)?;
    if !frac_part.is_empty() {
        let mut frac: i128 = frac_part.parse().ok()?;
        frac *= 10i128
            .pow((fraction_digits as usize - frac_part.len()) as u32);
        units = units.checked_add(frac)?;
    }
    if negative {
        units = -units;
    }
    i64::try_from(units).ok()
}

// ===== TypeBuilder =====

pub(crate) struct TypeBuilder<'a> {
    arena: &'a Arena,
    modules: &'a ModuleMap,
    identities: &'a IdentityGraph,
    assembler: &'a XpathAssembler<'a>,
}

impl<'a> TypeBuilder<'a> {
    pub(crate) fn new(
        arena: &'a Arena,
        modules: &'a ModuleMap,
        identities: &'a IdentityGraph,
        assembler: &'a XpathAssembler<'a>,
    ) -> TypeBuilder<'a> {
        TypeBuilder {
            arena,
            modules,
            identities,
            assembler,
        }
    }

    /// Build the type referenced by a `type` statement. `ref_status` is the
    /// effective status of the node bearing the type, used to enforce
    /// same-module status reference rules. Returns the type and the units
    /// inherited from the typedef chain, if any.
    pub(crate) fn build(
        &self,
        type_node: NodeId,
        ref_status: Status,
    ) -> Result<(Type, Option<String>)> {
        let mut units = None;
        let built = self.resolve(type_node, ref_status, &mut units)?;
        Ok((built, units))
    }

    fn resolve(
        &self,
        type_node: NodeId,
        ref_status: Status,
        units: &mut Option<String>,
    ) -> Result<Type> {
        let (prefix, name) = Arena::split_prefix(self.arena.arg(type_node));
        if prefix.is_none() && is_builtin(name) {
            return self.builtin(type_node, name, ref_status);
        }
        self.derived(type_node, prefix, name, ref_status, units)
    }

    fn derived(
        &self,
        type_node: NodeId,
        prefix: Option<&str>,
        name: &str,
        ref_status: Status,
        units: &mut Option<String>,
    ) -> Result<Type> {
        let root = self.arena.root(type_node);
        let local = match prefix {
            None => true,
            Some(p) => p == self.arena.module_prefix(root),
        };
        let typedef = if local {
            self.arena.lookup_typedef(type_node, name)
        } else {
            let module = self.arena.module_by_prefix(
                type_node,
                prefix.unwrap(),
                self.modules,
            )?;
            self.arena.lookup_child(module, Stmt::Typedef, name)
        };
        let typedef = typedef.ok_or_else(|| {
            self.arena.error(
                type_node,
                format!("unknown type {}", self.arena.arg(type_node)),
            )
        })?;

        if self.arena.root(typedef) == root {
            check_status_reference(
                self.arena,
                type_node,
                ref_status,
                typedef,
                "typedef",
            )?;
        }

        let inner = self
            .arena
            .child_by_stmt(typedef, Stmt::Type)
            .ok_or_else(|| {
                self.arena.error(typedef, "typedef is missing its type")
            })?;
        let mut base = self.resolve(inner, ref_status, units)?;

        // Outer typedefs win over inner ones; the leaf's own units override
        // both in the schema builder.
        if units.is_none() {
            if let Some(u) = self.arena.child_arg(typedef, Stmt::Units) {
                *units = Some(u.to_string());
            }
        }

        // A derived type keeps its base's default unless it supplies its
        // own.
        if let Some(default) = self.arena.child_arg(typedef, Stmt::Default) {
            base.set_default(Some(default.to_string()));
        }

        self.refine(base, type_node, false)
    }

    fn builtin(
        &self,
        node: NodeId,
        name: &str,
        ref_status: Status,
    ) -> Result<Type> {
        let base = match name {
            // Deliberate restriction, admitted by the statement grammar.
            "binary" => {
                return Err(self
                    .arena
                    .error(node, "unsupported builtin type binary"));
            }
            "boolean" => Type::Boolean(BooleanType { default: None }),
            "empty" => Type::Empty,
            "int8" | "int16" | "int32" | "int64" => {
                let width = width_of(name);
                let (min, max) = width.signed_bounds();
                Type::Integer(IntegerType {
                    width,
                    ranges: RangeSet::span(min, max),
                    range_error: None,
                    range_app_tag: None,
                    default: None,
                })
            }
            "uint8" | "uint16" | "uint32" | "uint64" => {
                let width = width_of(name);
                let (min, max) = width.unsigned_bounds();
                Type::Uinteger(UintegerType {
                    width,
                    ranges: RangeSet::span(min, max),
                    range_error: None,
                    range_app_tag: None,
                    default: None,
                })
            }
            "decimal64" => {
                let fd = self
                    .arena
                    .child_arg(node, Stmt::FractionDigits)
                    .ok_or_else(|| {
                        self.arena.error(
                            node,
                            "fraction-digits statement is mandatory \
                             for decimal64",
                        )
                    })?;
                let fd = fd
                    .parse::<u8>()
                    .ok()
                    .filter(|fd| (1..=18).contains(fd))
                    .ok_or_else(|| {
                        self.arena.error(
                            node,
                            format!("invalid fraction-digits {}", fd),
                        )
                    })?;
                Type::Decimal64(Decimal64Type {
                    fraction_digits: fd,
                    ranges: RangeSet::span(
                        Dec64::new(i64::MIN, fd),
                        Dec64::new(i64::MAX, fd),
                    ),
                    range_error: None,
                    range_app_tag: None,
                    default: None,
                })
            }
            "string" => Type::String(StringType {
                length: RangeSet::span(0, u64::MAX),
                length_error: None,
                length_app_tag: None,
                patterns: Vec::new(),
                default: None,
            }),
            "enumeration" => Type::Enumeration(EnumerationType {
                enums: Vec::new(),
                default: None,
            }),
            "bits" => Type::Bits(BitsType {
                bits: Vec::new(),
                default: None,
            }),
            "identityref" => self.identityref(node, ref_status)?,
            "instance-identifier" => Type::InstanceId(InstanceIdType {
                require_instance: self
                    .arena
                    .child_arg(node, Stmt::RequireInstance)
                    != Some("false"),
                default: None,
            }),
            "leafref" => {
                let path = self
                    .arena
                    .child_by_stmt(node, Stmt::Path)
                    .ok_or_else(|| {
                        self.arena.error(
                            node,
                            "path statement is mandatory for leafref",
                        )
                    })?;
                let machine = self.assembler.assemble_leafref(path)?;
                Type::Leafref(LeafrefType {
                    path: self.arena.arg(path).to_string(),
                    machine,
                    default: None,
                })
            }
            "union" => {
                let mut members = Vec::new();
                for member in
                    self.arena.children_by_stmt(node, Stmt::Type)
                {
                    members.push(self.resolve(
                        member,
                        ref_status,
                        &mut None,
                    )?);
                }
                if members.is_empty() {
                    return Err(self.arena.error(
                        node,
                        "union must have at least one member type",
                    ));
                }
                Type::Union(UnionType {
                    members,
                    default: None,
                })
            }
            _ => unreachable!("not a builtin: {}", name),
        };
        self.refine(base, node, true)
    }

    fn identityref(
        &self,
        node: NodeId,
        ref_status: Status,
    ) -> Result<Type> {
        let base = self
            .arena
            .child_by_stmt(node, Stmt::Base)
            .ok_or_else(|| {
                self.arena.error(
                    node,
                    "base statement is mandatory for identityref",
                )
            })?;
        let (prefix, name) = Arena::split_prefix(self.arena.arg(base));
        let module = self.arena.module_by_prefix(
            base,
            prefix.unwrap_or(""),
            self.modules,
        )?;
        let key = identity_key(self.arena.arg(module), name);
        if self.identities.get(&key).is_none() {
            return Err(self.arena.error(
                base,
                format!("Can't find base identity {}", self.arena.arg(base)),
            ));
        }
        if module == self.arena.root(node) {
            if let Some(identity) =
                self.arena.lookup_child(module, Stmt::Identity, name)
            {
                check_status_reference(
                    self.arena,
                    node,
                    ref_status,
                    identity,
                    "identity",
                )?;
            }
        }
        Ok(Type::Identityref(IdentityrefType {
            identities: self.identities.derived_closure(&key),
            base: key,
            default: None,
        }))
    }

    /// Apply the restrictions present on `node` to `base`, enforcing the
    /// per-type legality table. `innermost` marks the statement that named
    /// the built-in type, whose defining substatements (`base`, `path`,
    /// `fraction-digits`, union members) were already consumed.
    fn refine(
        &self,
        mut base: Type,
        node: NodeId,
        innermost: bool,
    ) -> Result<Type> {
        let mut next_enum_value: i64 = 0;
        let mut next_bit_position: u32 = 0;

        for child in self.arena.children(node) {
            let child = *child;
            let kind = self.arena.stmt(child);
            if kind == Stmt::Unknown {
                continue;
            }
            if innermost {
                let consumed = match (&base, kind) {
                    (Type::Identityref(_), Stmt::Base) => true,
                    (Type::Leafref(_), Stmt::Path) => true,
                    (Type::Decimal64(_), Stmt::FractionDigits) => true,
                    (Type::Union(_), Stmt::Type) => true,
                    (Type::InstanceId(_), Stmt::RequireInstance) => true,
                    _ => false,
                };
                if consumed {
                    continue;
                }
            }

            match (&mut base, kind) {
                (Type::Integer(t), Stmt::Range) => {
                    t.ranges = self.parse_ranges(child, &t.ranges, |s| {
                        s.parse().ok()
                    })?;
                    t.range_error = self.restriction_error(child);
                    t.range_app_tag = self.restriction_app_tag(child);
                }
                (Type::Uinteger(t), Stmt::Range) => {
                    t.ranges = self.parse_ranges(child, &t.ranges, |s| {
                        s.parse().ok()
                    })?;
                    t.range_error = self.restriction_error(child);
                    t.range_app_tag = self.restriction_app_tag(child);
                }
                (Type::Decimal64(t), Stmt::Range) => {
                    let fd = t.fraction_digits;
                    t.ranges =
                        self.parse_ranges(child, &t.ranges, |s| {
                            parse_decimal64(s, fd)
                                .map(|units| Dec64::new(units, fd))
                        })?;
                    t.range_error = self.restriction_error(child);
                    t.range_app_tag = self.restriction_app_tag(child);
                }
                (Type::String(t), Stmt::Length) => {
                    t.length = self.parse_ranges(child, &t.length, |s| {
                        s.parse().ok()
                    })?;
                    t.length_error = self.restriction_error(child);
                    t.length_app_tag = self.restriction_app_tag(child);
                }
                (Type::String(t), Stmt::Pattern) => {
                    let raw = self.arena.arg(child);
                    let regex = Regex::new(&format!("^(?:{})$", raw))
                        .map_err(|e| {
                            self.arena.error(
                                child,
                                format!("invalid pattern: {}", e),
                            )
                        })?;
                    t.patterns.push(Pattern {
                        raw: raw.to_string(),
                        regex,
                        help: self.restriction_error(child),
                        app_tag: self.restriction_app_tag(child),
                    });
                }
                (Type::Enumeration(t), Stmt::Enum) => {
                    if !innermost {
                        return Err(self.arena.error(
                            child,
                            "cannot restrict predefined enumeration",
                        ));
                    }
                    let value = match self
                        .arena
                        .child_arg(child, Stmt::Value)
                    {
                        Some(v) => v.parse::<i64>().map_err(|_| {
                            self.arena.error(
                                child,
                                format!("invalid enum value {}", v),
                            )
                        })?,
                        None => next_enum_value,
                    };
                    next_enum_value = value.saturating_add(1);
                    t.enums.push(EnumItem {
                        name: self.arena.arg(child).to_string(),
                        value,
                    });
                }
                (Type::Bits(t), Stmt::Bit) => {
                    if !innermost {
                        return Err(self.arena.error(
                            child,
                            "cannot restrict predefined bits",
                        ));
                    }
                    let position = match self
                        .arena
                        .child_arg(child, Stmt::Position)
                    {
                        Some(p) => p.parse::<u32>().map_err(|_| {
                            self.arena.error(
                                child,
                                format!("invalid bit position {}", p),
                            )
                        })?,
                        None => next_bit_position,
                    };
                    next_bit_position = position.saturating_add(1);
                    t.bits.push(BitItem {
                        name: self.arena.arg(child).to_string(),
                        position,
                    });
                }
                (Type::InstanceId(t), Stmt::RequireInstance) => {
                    t.require_instance = self.arena.arg(child) != "false";
                }
                (Type::Leafref(_), Stmt::Path) => {
                    return Err(
                        self.arena.error(child, "cannot refine path")
                    );
                }
                (Type::Union(_), _) => {
                    return Err(self.arena.error(
                        child,
                        "restrictions must be applied to members instead",
                    ));
                }
                _ => {
                    return Err(self.arena.error(
                        child,
                        "restriction not valid for this type",
                    ));
                }
            }
        }

        if let Type::Enumeration(t) = &base {
            if innermost && t.enums.is_empty() {
                return Err(self.arena.error(
                    node,
                    "enumeration must have at least one enum",
                ));
            }
        }

        // Inherited or fresh, the default must satisfy the refined type.
        if let Some(default) = base.default_value().map(str::to_string) {
            base.validate(&default).map_err(|e| {
                self.arena.error(
                    node,
                    format!(
                        "Invalid default '{}' for {}: {}",
                        default,
                        base.name(),
                        e
                    ),
                )
            })?;
        }

        Ok(base)
    }

    fn parse_ranges<T: crate::range::RangeNum>(
        &self,
        restriction: NodeId,
        base: &RangeSet<T>,
        parse_value: impl Fn(&str) -> Option<T>,
    ) -> Result<RangeSet<T>> {
        RangeSet::parse(self.arena.arg(restriction), base, parse_value)
            .map_err(|e| self.arena.error(restriction, e))
    }

    fn restriction_error(&self, restriction: NodeId) -> Option<String> {
        self.arena
            .child_arg(restriction, Stmt::ErrorMessage)
            .map(str::to_string)
    }

    fn restriction_app_tag(&self, restriction: NodeId) -> Option<String> {
        self.arena
            .child_arg(restriction, Stmt::ErrorAppTag)
            .map(str::to_string)
    }
}

fn is_builtin(name: &str) -> bool {
    matches!(
        name,
        "binary"
            | "bits"
            | "boolean"
            | "decimal64"
            | "empty"
            | "enumeration"
            | "identityref"
            | "instance-identifier"
            | "int8"
            | "int16"
            | "int32"
            | "int64"
            | "leafref"
            | "string"
            | "uint8"
            | "uint16"
            | "uint32"
            | "uint64"
            | "union"
    )
}

fn width_of(name: &str) -> IntWidth {
    match name {
        "int8" | "uint8" => IntWidth::W8,
        "int16" | "uint16" => IntWidth::W16,
        "int32" | "uint32" => IntWidth::W32,
        "int64" | "uint64" => IntWidth::W64,
        _ => unreachable!("not an integer type: {}", name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal64_parsing() {
        assert_eq!(parse_decimal64("2.5", 1), Some(25));
        assert_eq!(parse_decimal64("-2.5", 1), Some(-25));
        assert_eq!(parse_decimal64("2", 2), Some(200));
        assert_eq!(parse_decimal64("1.05", 2), Some(105));
        // More fraction digits than the type allows.
        assert_eq!(parse_decimal64("1.005", 2), None);
        assert_eq!(parse_decimal64("abc", 2), None);
    }

    #[test]
    fn validate_against_ranges() {
        let t = Type::Uinteger(UintegerType {
            width: IntWidth::W8,
            ranges: RangeSet::span(0u64, 99),
            range_error: None,
            range_app_tag: None,
            default: None,
        });
        assert!(t.validate("42").is_ok());
        assert!(t.validate("100").is_err());
        assert!(t.validate("-1").is_err());
    }

    #[test]
    fn validate_string_pattern_and_length() {
        let t = Type::String(StringType {
            length: RangeSet::span(2, 4),
            length_error: None,
            length_app_tag: None,
            patterns: vec![Pattern {
                raw: "[a-z]+".to_string(),
                regex: Regex::new("^(?:[a-z]+)$").unwrap(),
                help: None,
                app_tag: None,
            }],
            default: None,
        });
        assert!(t.validate("abc").is_ok());
        assert!(t.validate("a").is_err());
        assert!(t.validate("ABC").is_err());
    }

    #[test]
    fn validate_union_members() {
        let t = Type::Union(UnionType {
            members: vec![
                Type::Boolean(BooleanType { default: None }),
                Type::Uinteger(UintegerType {
                    width: IntWidth::W8,
                    ranges: RangeSet::span(0u64, 255),
                    range_error: None,
                    range_app_tag: None,
                    default: None,
                }),
            ],
            default: None,
        });
        assert!(t.validate("true").is_ok());
        assert!(t.validate("7").is_ok());
        assert!(t.validate("maybe").is_err());
    }
}
