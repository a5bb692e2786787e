//
// Copyright (c) The yangc Core Contributors
//
// SPDX-License-Identifier: MIT
//

mod common;

use common::{compile, compile_setup, compile_with_warnings, Setup};
use yangc::compile::CompilerFlags;
use yangc::features::{FeatureList, FeatureSet};
use yangc::WarningKind;

fn kinds(warnings: &[yangc::Warning]) -> Vec<WarningKind> {
    warnings.iter().map(|w| w.kind).collect()
}

#[test]
fn must_on_np_container() {
    let (_, warnings) = compile_with_warnings(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            container c {
                must 'true()';
                leaf l { type string; }
            }
        }",
    ])
    .expect("Failed to compile module");
    assert_eq!(kinds(&warnings), vec![WarningKind::MustOnNPContainer]);

    // A default on any descendant anchors the container.
    let (_, warnings) = compile_with_warnings(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            container c {
                must 'true()';
                leaf l { type string; default x; }
            }
        }",
    ])
    .expect("Failed to compile module");
    assert_eq!(warnings, vec![]);

    // A presence container is its own anchor.
    let (_, warnings) = compile_with_warnings(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            container c {
                presence 'c exists';
                must 'true()';
                leaf l { type string; }
            }
        }",
    ])
    .expect("Failed to compile module");
    assert_eq!(warnings, vec![]);

    // A non-presence container child guarantees instantiation, which makes
    // the stronger warning fire.
    let (_, warnings) = compile_with_warnings(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            container c {
                must 'true()';
                container inner {
                    leaf l { type string; }
                }
            }
        }",
    ])
    .expect("Failed to compile module");
    assert_eq!(
        kinds(&warnings),
        vec![WarningKind::MustOnNPContWithNPChild]
    );
}

#[test]
fn when_path_that_does_not_exist() {
    let (_, warnings) = compile_with_warnings(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            leaf anchor { type string; default a; }
            leaf x { type string; when '../nope'; }
        }",
    ])
    .expect("Failed to compile module");
    assert_eq!(kinds(&warnings), vec![WarningKind::DoesntExist]);
    assert!(warnings[0].msg.contains("'../nope' does not exist"));

    let (_, warnings) = compile_with_warnings(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            leaf anchor { type string; default a; }
            leaf x { type string; when '../anchor'; }
        }",
    ])
    .expect("Failed to compile module");
    assert_eq!(warnings, vec![]);
}

#[test]
fn leafref_target_checked_by_walk() {
    let (_, warnings) = compile_with_warnings(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            leaf r { type leafref { path '../gone'; } }
        }",
    ])
    .expect("Failed to compile module");
    assert_eq!(kinds(&warnings), vec![WarningKind::DoesntExist]);
}

#[test]
fn reference_to_np_container_warns() {
    let (_, warnings) = compile_with_warnings(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            container npc {
                leaf i { type string; default x; }
            }
            leaf x { type string; when '../npc'; }
        }",
    ])
    .expect("Failed to compile module");
    assert_eq!(kinds(&warnings), vec![WarningKind::RefNPContainer]);
}

#[test]
fn grouping_reuse_suppresses_false_positives() {
    // The same when expression resolves from one uses site but not the
    // other; a path valid somewhere is not reported.
    let (_, warnings) = compile_with_warnings(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            grouping g {
                leaf l { type string; when '../anchor'; }
            }
            container c1 {
                uses g;
                leaf anchor { type string; default x; }
            }
            container c2 {
                presence yes;
                uses g;
            }
        }",
    ])
    .expect("Failed to compile module");
    assert_eq!(warnings, vec![]);
}

#[test]
fn wrong_prefix_reported() {
    let (_, warnings) = compile_with_warnings(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            leaf anchor { type string; default a; }
            leaf x { type string; when '../bad:anchor'; }
        }",
    ])
    .expect("Failed to compile module");
    assert_eq!(
        kinds(&warnings),
        vec![WarningKind::MissingOrWrongPrefix]
    );
}

#[test]
fn no_walk_without_warnings_flag() {
    let (_, warnings) = compile(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            leaf x { type string; when '../nope'; }
        }",
    ])
    .expect("Failed to compile module");
    assert_eq!(warnings, vec![]);
}

// ===== features =====

#[test]
fn disabled_feature_filters_nodes() {
    let sources = [
        "module m {
            namespace 'urn:m';
            prefix m;
            feature fancy;
            leaf plain { type string; }
            leaf special { type string; if-feature fancy; }
        }",
    ];

    let (set, _) = compile(&sources).unwrap();
    let model = set.model("m").unwrap();
    assert!(set.data_tree(model).child("special").is_none());
    assert!(model.enabled_features.is_empty());

    let mut features = FeatureSet::new();
    features.add(FeatureList::enabled(vec!["m:fancy"]));
    let (set, _) = compile_setup(
        &sources,
        Setup {
            features,
            ..Default::default()
        },
    )
    .unwrap();
    let model = set.model("m").unwrap();
    assert!(set.data_tree(model).child("special").is_some());
    assert_eq!(model.enabled_features, vec!["fancy".to_string()]);
}

#[test]
fn feature_requires_its_own_if_features() {
    let sources = [
        "module m {
            namespace 'urn:m';
            prefix m;
            feature base;
            feature extra { if-feature base; }
            leaf l { type string; if-feature extra; }
        }",
    ];

    // `extra` is enabled externally but depends on the disabled `base`.
    let mut features = FeatureSet::new();
    features.add(FeatureList::enabled(vec!["m:extra"]));
    let (set, _) = compile_setup(
        &sources,
        Setup {
            features,
            ..Default::default()
        },
    )
    .unwrap();
    let model = set.model("m").unwrap();
    assert!(set.data_tree(model).child("l").is_none());

    let mut features = FeatureSet::new();
    features.add(FeatureList::enabled(vec!["m:extra", "m:base"]));
    let (set, _) = compile_setup(
        &sources,
        Setup {
            features,
            ..Default::default()
        },
    )
    .unwrap();
    let model = set.model("m").unwrap();
    assert!(set.data_tree(model).child("l").is_some());
}

#[test]
fn feature_cycle_detected() {
    let mut features = FeatureSet::new();
    features.add(FeatureList::enabled(vec!["m:f1", "m:f2"]));
    let err = compile_setup(
        &[
            "module m {
                namespace 'urn:m';
                prefix m;
                feature f1 { if-feature f2; }
                feature f2 { if-feature f1; }
            }",
        ],
        Setup {
            features,
            ..Default::default()
        },
    )
    .unwrap_err();
    assert!(
        err.msg.starts_with("Feature cyclic reference:"),
        "got: {}",
        err.msg
    );
}

#[test]
fn duplicate_feature_rejected() {
    let err = compile(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            feature f;
            feature f;
        }",
    ])
    .unwrap_err();
    assert_eq!(err.msg, "Duplicate feature f");
}

// ===== skip-unknown mode =====

#[test]
fn skip_unknown_drops_unresolvable_nodes() {
    let sources = [
        "module m {
            namespace 'urn:m';
            prefix m;
            import missing { prefix mis; }
            leaf good { type string; }
            leaf bad { type mis:sometype; }
            container c { uses mis:somegrouping; }
            augment '/mis:somewhere' {
                leaf x { type string; }
            }
        }",
    ];

    let err = compile(&sources).unwrap_err();
    assert_eq!(err.msg, "unknown import missing");

    let (set, _) = compile_setup(
        &sources,
        Setup {
            flags: CompilerFlags::SKIP_UNKNOWN,
            ..Default::default()
        },
    )
    .expect("skip-unknown compilation failed");
    let model = set.model("m").unwrap();
    let tree = set.data_tree(model);
    assert!(tree.child("good").is_some());
    assert!(tree.child("bad").is_none());
    // The container survives with the unresolvable uses dropped.
    assert_eq!(tree.child("c").unwrap().children().count(), 0);
}

#[test]
fn cardinality_violations_are_fatal() {
    let err = compile(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            leaf l { type string; type string; }
        }",
    ])
    .unwrap_err();
    assert_eq!(err.msg, "only one 'type' statement is allowed");

    let err = compile(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            leaf l { type string; key nope; }
        }",
    ])
    .unwrap_err();
    assert_eq!(err.msg, "statement 'key' not allowed under 'leaf'");

    let err = compile(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            typedef t { default 5; }
        }",
    ])
    .unwrap_err();
    assert_eq!(err.msg, "missing mandatory statement 'type'");
}

#[test]
fn error_location_prefix() {
    let err = compile(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            leaf l { type nonesuch; }
        }",
    ])
    .unwrap_err();
    let rendered = err.to_string();
    assert!(
        rendered.starts_with("m.yang:"),
        "missing location prefix: {}",
        rendered
    );
    assert!(rendered.ends_with("unknown type nonesuch"));
}
