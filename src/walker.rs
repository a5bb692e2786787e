//
// Copyright (c) The yangc Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Post-compilation XPath walk.
//!
//! Runs every path-eval machine against the built schema tree, reports
//! broken paths and weak `must`/`when` placements, then clears the machine
//! references to release their memory.

use std::collections::HashSet;

use log::debug;

use crate::error::{Warning, WarningKind};
use crate::model::ModelSet;
use crate::schema::Data;
use crate::xpath::{PathEvalContext, PathOutcome};

struct RawRef {
    node_path: String,
    path: String,
    outcome: PathOutcome,
}

/// Walk the model set, emit warnings, and drop the path-eval machines.
pub(crate) fn walk(set: &mut ModelSet, warnings: &mut Vec<Warning>) {
    let mut refs: Vec<RawRef> = Vec::new();
    // Paths that resolved from at least one instantiation of a shared
    // grouping; failures of the same path elsewhere are not reported.
    let mut sometimes_valid: HashSet<String> = HashSet::new();

    for snode in set.traverse() {
        let node_path = snode.path();
        let has_conditions =
            !snode.whens().is_empty() || !snode.musts().is_empty();

        if has_conditions && snode.is_np_container() {
            let anchored = snode
                .traverse()
                .skip(1)
                .any(|d| d.has_default() || d.is_mandatory());
            if !anchored {
                let np_child =
                    snode.children().any(|c| c.is_np_container());
                let (kind, msg) = if np_child {
                    (
                        WarningKind::MustOnNPContWithNPChild,
                        "must/when on a non-presence container whose \
                         non-presence container child guarantees \
                         instantiation",
                    )
                } else {
                    (
                        WarningKind::MustOnNPContainer,
                        "must/when on a non-presence container without \
                         default or mandatory descendant",
                    )
                };
                warnings.push(Warning::new(kind, node_path.as_str(), msg));
            }
        }

        for when in snode.whens() {
            if let Some(machine) = &when.path_eval {
                let ctx = PathEvalContext {
                    node: snode,
                    model_set: set,
                    shifted: when.from_augment,
                };
                collect(
                    machine.run(&ctx),
                    node_path.as_str(),
                    &mut refs,
                    &mut sometimes_valid,
                );
            }
        }
        for must in snode.musts() {
            for machine in
                must.path_eval.iter().chain(must.path_eval_ext.iter())
            {
                let ctx = PathEvalContext {
                    node: snode,
                    model_set: set,
                    shifted: false,
                };
                collect(
                    machine.run(&ctx),
                    node_path.as_str(),
                    &mut refs,
                    &mut sometimes_valid,
                );
            }
        }
        let leafref_eval = match &set.arena().node(snode.id()).data {
            Data::Leaf(leaf) => leaf.path_eval.as_ref(),
            Data::LeafList(ll) => ll.path_eval.as_ref(),
            _ => None,
        };
        if let Some(machine) = leafref_eval {
            let ctx = PathEvalContext {
                node: snode,
                model_set: set,
                shifted: false,
            };
            collect(
                machine.run(&ctx),
                node_path.as_str(),
                &mut refs,
                &mut sometimes_valid,
            );
        }
    }

    for raw in refs {
        match raw.outcome {
            PathOutcome::Resolved { np_container } => {
                if np_container {
                    warnings.push(Warning::new(
                        WarningKind::RefNPContainer,
                        raw.node_path.as_str(),
                        format!(
                            "'{}' references a non-presence container",
                            raw.path
                        ),
                    ));
                }
            }
            PathOutcome::DoesntExist => {
                if !sometimes_valid.contains(&raw.path) {
                    warnings.push(Warning::new(
                        WarningKind::DoesntExist,
                        raw.node_path.as_str(),
                        format!("'{}' does not exist", raw.path),
                    ));
                }
            }
            PathOutcome::MissingOrWrongPrefix => {
                warnings.push(Warning::new(
                    WarningKind::MissingOrWrongPrefix,
                    raw.node_path.as_str(),
                    format!("'{}': missing or wrong prefix", raw.path),
                ));
            }
        }
    }

    // Release the machines now that the walk is over.
    let mut cleared = 0usize;
    for id in set.schema.ids().collect::<Vec<_>>() {
        let node = set.schema.node_mut(id);
        for when in &mut node.common.whens {
            cleared += when.path_eval.take().is_some() as usize;
        }
        for must in &mut node.common.musts {
            cleared += must.path_eval.take().is_some() as usize;
            cleared += must.path_eval_ext.take().is_some() as usize;
        }
        match &mut node.data {
            Data::Leaf(leaf) => {
                cleared += leaf.path_eval.take().is_some() as usize;
            }
            Data::LeafList(ll) => {
                cleared += ll.path_eval.take().is_some() as usize;
            }
            _ => (),
        }
    }
    debug!("path walk released {} machines", cleared);
}

fn collect(
    result: crate::xpath::PathEvalResult,
    node_path: &str,
    refs: &mut Vec<RawRef>,
    sometimes_valid: &mut HashSet<String>,
) {
    for r in result.refs {
        if matches!(r.outcome, PathOutcome::Resolved { .. }) {
            sometimes_valid.insert(r.path.clone());
        }
        refs.push(RawRef {
            node_path: node_path.to_string(),
            path: r.path,
            outcome: r.outcome,
        });
    }
}
