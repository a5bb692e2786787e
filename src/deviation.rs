//
// Copyright (c) The yangc Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Deviation application: `not-supported`, `add`, `delete` and `replace`
//! with their legality rules, plus reverse provenance tracking.

use indexmap::IndexMap;
use log::debug;

use crate::augment::resolve_absolute;
use crate::error::Result;
use crate::parse::{Arena, ModuleMap, NodeId};
use crate::stmt::{cardinality, Cardinality, Stmt};

/// Reverse provenance: target module → modules that deviated it.
pub type DeviationMap = IndexMap<String, Vec<String>>;

/// Apply every deviation of `module`, in document order.
pub(crate) fn apply_deviations(
    arena: &mut Arena,
    modules: &ModuleMap,
    module: NodeId,
    skip_unknown: bool,
    provenance: &mut DeviationMap,
) -> Result<()> {
    for deviation in arena
        .children_by_stmt(module, Stmt::Deviation)
        .collect::<Vec<_>>()
    {
        let path = arena.arg(deviation).to_string();
        let target = match resolve_absolute(
            arena,
            modules,
            deviation,
            &path,
            skip_unknown,
        )? {
            Some(target) => target,
            None => continue,
        };
        debug!("deviating {} from module {}", path, arena.arg(module));

        let deviates: Vec<_> = arena
            .children(deviation)
            .iter()
            .copied()
            .filter(|&c| arena.stmt(c).is_deviate())
            .collect();
        for &deviate in &deviates {
            match arena.stmt(deviate) {
                Stmt::DeviateNotSupported => {
                    if deviates.len() > 1 {
                        return Err(arena.error(
                            deviate,
                            "deviate not-supported must be the only \
                             deviate of its deviation",
                        ));
                    }
                    arena.mark_not_supported(target);
                }
                Stmt::DeviateAdd => {
                    deviate_add(arena, deviate, target)?;
                }
                Stmt::DeviateDelete => {
                    deviate_delete(arena, deviate, target)?;
                }
                Stmt::DeviateReplace => {
                    deviate_replace(arena, deviate, target)?;
                }
                _ => unreachable!(),
            }
        }

        let target_module = arena.arg(arena.root(target)).to_string();
        let source_module = arena.arg(module).to_string();
        let sources = provenance.entry(target_module).or_default();
        if !sources.contains(&source_module) {
            sources.push(source_module);
        }
    }
    Ok(())
}

// The property must be one the target's kind accepts at all.
fn check_property_allowed(
    arena: &Arena,
    deviate: NodeId,
    target: NodeId,
    property: Stmt,
) -> Result<()> {
    if cardinality(arena.stmt(target), property) == Cardinality::NotAllowed {
        return Err(arena.error(
            deviate,
            format!(
                "Property '{}' not allowed on node of type {}",
                property,
                arena.stmt(target)
            ),
        ));
    }
    Ok(())
}

fn deviate_add(
    arena: &mut Arena,
    deviate: NodeId,
    target: NodeId,
) -> Result<()> {
    let target_module = arena.root(target);
    for prop in arena.children(deviate).to_vec() {
        let kind = arena.stmt(prop);
        match kind {
            Stmt::Must | Stmt::Unique | Stmt::Unknown => (),
            Stmt::Units
            | Stmt::Default
            | Stmt::Config
            | Stmt::Mandatory
            | Stmt::MinElements
            | Stmt::MaxElements => {
                if arena.child_by_stmt(target, kind).is_some() {
                    return Err(arena.error(
                        deviate,
                        "Property being added to node already exists",
                    ));
                }
            }
            _ => {
                return Err(arena.error(
                    deviate,
                    format!(
                        "Property '{}' cannot be added by deviation",
                        kind
                    ),
                ));
            }
        }
        if kind != Stmt::Unknown {
            check_property_allowed(arena, deviate, target, kind)?;
        }
        let copy = arena.deep_clone(prop, target_module, None);
        arena.append_child(target, copy);
    }
    Ok(())
}

fn deviate_delete(
    arena: &mut Arena,
    deviate: NodeId,
    target: NodeId,
) -> Result<()> {
    for prop in arena.children(deviate).to_vec() {
        let kind = arena.stmt(prop);
        match kind {
            Stmt::Units
            | Stmt::Default
            | Stmt::Must
            | Stmt::Unique
            | Stmt::Unknown => (),
            _ => {
                return Err(arena.error(
                    deviate,
                    format!(
                        "Property '{}' cannot be deleted by deviation",
                        kind
                    ),
                ));
            }
        }
        // The property must exist exactly as specified.
        let existing = arena.lookup_child(target, kind, arena.arg(prop));
        match existing {
            Some(existing) => arena.detach(existing),
            None => {
                return Err(arena.error(
                    deviate,
                    "Property being deleted by deviation must exist",
                ));
            }
        }
    }
    Ok(())
}

fn deviate_replace(
    arena: &mut Arena,
    deviate: NodeId,
    target: NodeId,
) -> Result<()> {
    let target_module = arena.root(target);
    for prop in arena.children(deviate).to_vec() {
        let kind = arena.stmt(prop);
        match kind {
            Stmt::Type
            | Stmt::Units
            | Stmt::Default
            | Stmt::Config
            | Stmt::Mandatory
            | Stmt::MinElements
            | Stmt::MaxElements => {
                check_property_allowed(arena, deviate, target, kind)?;
                if arena.child_by_stmt(target, kind).is_none() {
                    return Err(arena.error(
                        deviate,
                        "Property being replaced by deviation must exist",
                    ));
                }
                let copy = arena.deep_clone(prop, target_module, None);
                arena.replace_child_by_stmt(target, kind, copy);
            }
            Stmt::Unknown => {
                // Cardinality-1 extensions replace an existing instance of
                // the same extension keyword.
                let keyword = arena.keyword(prop).map(str::to_string);
                let existing: Vec<_> = arena
                    .children_by_stmt(target, Stmt::Unknown)
                    .filter(|&c| {
                        arena.keyword(c).map(str::to_string) == keyword
                    })
                    .collect();
                match existing.first() {
                    Some(&first) => {
                        let copy =
                            arena.deep_clone(prop, target_module, None);
                        arena.replace_child(target, first, vec![copy]);
                    }
                    None => {
                        return Err(arena.error(
                            deviate,
                            "Property being replaced by deviation \
                             must exist",
                        ));
                    }
                }
            }
            _ => {
                return Err(arena.error(
                    deviate,
                    format!(
                        "Property '{}' cannot be replaced by deviation",
                        kind
                    ),
                ));
            }
        }
    }
    Ok(())
}
