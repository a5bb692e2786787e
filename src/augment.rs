//
// Copyright (c) The yangc Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Augment application: local and cross-module target resolution and child
//! splicing.

use log::{debug, warn};

use crate::error::Result;
use crate::expand::propagate_conditionals;
use crate::parse::{Arena, ModuleMap, NodeId};
use crate::schema::{check_status_reference, effective_parse_status};
use crate::stmt::Stmt;

/// Apply every top-level augment of `module`. Imported modules are already
/// expanded when this runs, so absolute targets resolve against their final
/// trees.
pub(crate) fn apply_augments(
    arena: &mut Arena,
    modules: &ModuleMap,
    module: NodeId,
    skip_unknown: bool,
) -> Result<()> {
    let mut augments: Vec<_> =
        arena.children_by_stmt(module, Stmt::Augment).collect();
    augments.extend(arena.children_by_stmt(module, Stmt::OpdAugment));

    for aug in augments {
        let path = arena.arg(aug).to_string();
        let target =
            match resolve_absolute(arena, modules, aug, &path, skip_unknown)?
            {
                Some(target) => target,
                None => {
                    warn!("skipping augment of unknown target {}", path);
                    continue;
                }
            };
        debug!(
            "augmenting {} from module {}",
            path,
            arena.arg(module)
        );
        if arena.root(target) == module {
            check_status_reference(
                arena,
                aug,
                effective_parse_status(arena, aug),
                target,
                "node",
            )?;
        }
        splice_augment(arena, modules, aug, target, skip_unknown)?;
        arena.detach(aug);
    }
    Ok(())
}

/// Splice the children of `aug` into `target`, propagating the augment's
/// `when`/`if-feature`/`status` and enforcing the cross-module mandatory
/// rule. Nested augments resolve relative to `target`.
pub(crate) fn splice_augment(
    arena: &mut Arena,
    modules: &ModuleMap,
    aug: NodeId,
    target: NodeId,
    skip_unknown: bool,
) -> Result<()> {
    if !arena.stmt(target).is_augment_target() {
        return Err(arena.error(
            aug,
            format!(
                "Augment not permitted for target {}",
                arena.context_string(target)
            ),
        ));
    }

    let src_module = arena.root(aug);
    let dst_module = arena.root(target);
    let cross_module = src_module != dst_module;

    for child in arena.children(aug).to_vec() {
        let kind = arena.stmt(child);
        match kind {
            Stmt::Augment | Stmt::OpdAugment => {
                let path = arena.arg(child).to_string();
                let inner = match resolve_descendant(
                    arena,
                    modules,
                    child,
                    target,
                    &path,
                    skip_unknown,
                )? {
                    Some(inner) => inner,
                    None => continue,
                };
                splice_augment(arena, modules, child, inner, skip_unknown)?;
            }
            k if k.is_data_def() || k == Stmt::Case || k == Stmt::Unknown => {
                if cross_module
                    && k != Stmt::Unknown
                    && is_mandatory_subtree(arena, child)
                {
                    return Err(arena.error(
                        aug,
                        format!(
                            "Cannot add mandatory nodes to another module: {}",
                            arena.arg(dst_module)
                        ),
                    ));
                }
                if k != Stmt::Unknown {
                    propagate_conditionals(arena, aug, child, true);
                }
                arena.detach(child);
                arena.append_child(target, child);
            }
            // when/if-feature/status propagate with the children; the
            // remaining substatements are descriptive only.
            _ => (),
        }
    }
    Ok(())
}

/// A child is mandatory if it is a leaf/choice with `mandatory true`, a
/// list/leaf-list with `min-elements > 0`, or a non-presence container whose
/// subtree transitively contains a mandatory node.
pub(crate) fn is_mandatory_subtree(arena: &Arena, node: NodeId) -> bool {
    match arena.stmt(node) {
        Stmt::Leaf | Stmt::Choice => {
            arena.child_arg(node, Stmt::Mandatory) == Some("true")
        }
        Stmt::List | Stmt::LeafList => arena
            .child_arg(node, Stmt::MinElements)
            .and_then(|min| min.parse::<u64>().ok())
            .map(|min| min > 0)
            .unwrap_or(false),
        Stmt::Container => {
            arena.child_by_stmt(node, Stmt::Presence).is_none()
                && arena
                    .children(node)
                    .iter()
                    .any(|&c| is_mandatory_subtree(arena, c))
        }
        _ => false,
    }
}

/// Whether a path step names this node. `input` and `output` carry no
/// argument and match by kind.
pub(crate) fn node_name_matches(
    arena: &Arena,
    node: NodeId,
    name: &str,
) -> bool {
    match arena.stmt(node) {
        Stmt::Input => name == "input",
        Stmt::Output => name == "output",
        _ => arena.arg(node) == name,
    }
}

/// Find a schema child of `node` by step name.
pub(crate) fn find_data_child(
    arena: &Arena,
    node: NodeId,
    name: &str,
) -> Option<NodeId> {
    arena.children(node).iter().copied().find(|&c| {
        let kind = arena.stmt(c);
        (kind.is_data_def()
            || matches!(
                kind,
                Stmt::Case
                    | Stmt::Input
                    | Stmt::Output
                    | Stmt::Rpc
                    | Stmt::Notification
            ))
            && node_name_matches(arena, c, name)
    })
}

/// Resolve an absolute schema path (`/pfx:a/b/pfx2:c`) in the context of
/// `node`'s module. The first component resolves via its prefix (empty means
/// the local module); each subsequent component's prefix defaults to the
/// prefix of the immediately preceding step, so an implicit prefix never
/// crosses into a different module.
pub(crate) fn resolve_absolute(
    arena: &mut Arena,
    modules: &ModuleMap,
    node: NodeId,
    path: &str,
    skip_unknown: bool,
) -> Result<Option<NodeId>> {
    if !path.starts_with('/') {
        return Err(arena.error(node, format!("Invalid path: {}", path)));
    }
    let mut steps = path.split('/').filter(|s| !s.is_empty()).peekable();
    if steps.peek().is_none() {
        return Err(arena.error(node, format!("Invalid path: {}", path)));
    }

    let mut prev_prefix = String::new();
    let mut current: Option<NodeId> = None;
    for step in steps {
        let (prefix, name) = Arena::split_prefix(step);
        let prefix = prefix.unwrap_or(prev_prefix.as_str()).to_string();
        let step_module =
            match arena.module_by_prefix(node, &prefix, modules) {
                Ok(module) => module,
                Err(_) if skip_unknown => return Ok(None),
                Err(e) => return Err(e),
            };
        let next = match current {
            None => find_top_level(arena, step_module, name),
            Some(cur) => find_data_child(arena, cur, name)
                .filter(|&c| arena.root(c) == step_module),
        };
        current = match next {
            Some(next) => Some(next),
            None if skip_unknown => return Ok(None),
            None => {
                return Err(
                    arena.error(node, format!("Invalid path: {}", path))
                );
            }
        };
        prev_prefix = prefix;
    }
    Ok(current)
}

/// Resolve a descendant path relative to `start` (used by augments nested
/// inside augments). Prefixes follow the same implicit-prefix rule, seeded
/// with the context module's own prefix.
pub(crate) fn resolve_descendant(
    arena: &mut Arena,
    modules: &ModuleMap,
    node: NodeId,
    start: NodeId,
    path: &str,
    skip_unknown: bool,
) -> Result<Option<NodeId>> {
    if path.starts_with('/') {
        return resolve_absolute(arena, modules, node, path, skip_unknown);
    }
    let mut prev_prefix =
        arena.module_prefix(arena.root(node)).to_string();
    let mut current = start;
    for step in path.split('/').filter(|s| !s.is_empty()) {
        let (prefix, name) = Arena::split_prefix(step);
        let prefix = prefix.unwrap_or(prev_prefix.as_str()).to_string();
        let step_module =
            match arena.module_by_prefix(node, &prefix, modules) {
                Ok(module) => module,
                Err(_) if skip_unknown => return Ok(None),
                Err(e) => return Err(e),
            };
        let next = find_data_child(arena, current, name)
            .filter(|&c| arena.root(c) == step_module);
        current = match next {
            Some(next) => next,
            None if skip_unknown => return Ok(None),
            None => {
                return Err(
                    arena.error(node, format!("Invalid path: {}", path))
                );
            }
        };
        prev_prefix = prefix;
    }
    Ok(Some(current))
}

fn find_top_level(
    arena: &Arena,
    module: NodeId,
    name: &str,
) -> Option<NodeId> {
    find_data_child(arena, module, name)
}
