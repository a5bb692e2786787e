//
// Copyright (c) The yangc Core Contributors
//
// SPDX-License-Identifier: MIT
//

mod common;

use common::{compile, compile_err};
use yangc::types::Type;

fn leaf_type(
    set: &yangc::model::ModelSet,
    module: &str,
    path: &str,
) -> Type {
    let model = set.model(module).unwrap();
    set.data_tree(model)
        .find_path(path)
        .unwrap_or_else(|| panic!("no such node: {}", path))
        .leaf_type()
        .unwrap()
        .clone()
}

#[test]
fn typedef_chain_resolves_to_builtin() {
    let (set, _) = compile(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            typedef percent { type uint8 { range '0..100'; } }
            typedef ratio { type percent; }
            leaf l { type ratio; }
        }",
    ])
    .expect("Failed to compile module");

    match leaf_type(&set, "m", "l") {
        Type::Uinteger(t) => {
            assert_eq!(t.ranges.min(), 0);
            assert_eq!(t.ranges.max(), 100);
        }
        other => panic!("expected uint8, got {}", other.name()),
    }
}

#[test]
fn unknown_type_rejected() {
    let msg = compile_err(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            leaf l { type nonesuch; }
        }",
    ]);
    assert_eq!(msg, "unknown type nonesuch");
}

#[test]
fn binary_is_rejected_at_type_construction() {
    let msg = compile_err(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            leaf l { type binary; }
        }",
    ]);
    assert_eq!(msg, "unsupported builtin type binary");
}

#[test]
fn range_refinement_with_integer_contiguity() {
    // 1..5 and 7..12 merge across the single absent value 6, so 4..7 may
    // span them.
    let ok = compile(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            typedef t { type uint32 { range '1..5 | 7..12'; } }
            leaf l { type t { range '1..3 | 4..7 | 8..12'; } }
        }",
    ]);
    assert!(ok.is_ok());

    // After that refinement no interval pair merges, so 1..4 fits nowhere.
    let msg = compile_err(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            typedef t { type uint32 { range '1..5 | 7..12'; } }
            typedef t1 { type t { range '1..3 | 4..7 | 8..12'; } }
            leaf l { type t1 { range '1..4 | 5..5 | 8..12'; } }
        }",
    ]);
    assert_eq!(msg, "derived range must be restrictive");
}

#[test]
fn range_ordering_violations() {
    let msg = compile_err(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            leaf l { type uint8 { range '9..12 | 1..5'; } }
        }",
    ]);
    assert_eq!(msg, "ranges must be in ascending order");

    let msg = compile_err(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            leaf l { type uint8 { range '1..5 | 4..9'; } }
        }",
    ]);
    assert_eq!(msg, "ranges must be disjoint");
}

#[test]
fn string_length_and_pattern() {
    let (set, _) = compile(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            leaf l {
                type string {
                    length '1..8';
                    pattern '[a-z]+';
                }
                default abc;
            }
        }",
    ])
    .expect("Failed to compile module");

    match leaf_type(&set, "m", "l") {
        Type::String(t) => {
            assert_eq!(t.length.min(), 1);
            assert_eq!(t.length.max(), 8);
            assert_eq!(t.patterns.len(), 1);
            assert!(t.patterns[0].regex.is_match("abc"));
            assert!(!t.patterns[0].regex.is_match("ABC"));
        }
        other => panic!("expected string, got {}", other.name()),
    }

    let msg = compile_err(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            leaf l {
                type string { pattern '[a-z]+'; }
                default ABC;
            }
        }",
    ]);
    assert!(
        msg.starts_with("Invalid default 'ABC' for string"),
        "got: {}",
        msg
    );
}

#[test]
fn default_inherits_through_typedef_chain() {
    let (set, _) = compile(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            typedef base { type uint8; default 10; }
            typedef derived { type base; }
            typedef overridden { type base; default 20; }
            leaf a { type derived; }
            leaf b { type overridden; }
            leaf c { type overridden; default 30; }
        }",
    ])
    .expect("Failed to compile module");

    let model = set.model("m").unwrap();
    let tree = set.data_tree(model);
    assert_eq!(tree.child("a").unwrap().default_value(), Some("10"));
    assert_eq!(tree.child("b").unwrap().default_value(), Some("20"));
    assert_eq!(tree.child("c").unwrap().default_value(), Some("30"));
}

#[test]
fn default_outside_refined_range_rejected() {
    let msg = compile_err(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            typedef t { type uint8; default 99; }
            leaf l { type t { range '1..10'; } }
        }",
    ]);
    assert!(
        msg.starts_with("Invalid default '99' for uint8"),
        "got: {}",
        msg
    );
}

#[test]
fn decimal64_requires_fraction_digits() {
    let msg = compile_err(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            leaf l { type decimal64; }
        }",
    ]);
    assert!(
        msg.contains("fraction-digits statement is mandatory"),
        "got: {}",
        msg
    );

    let ok = compile(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            leaf l {
                type decimal64 {
                    fraction-digits 2;
                    range '0.0 .. 99.99';
                }
                default 2.5;
            }
        }",
    ]);
    assert!(ok.is_ok(), "{:?}", ok.err());
}

#[test]
fn decimal64_intervals_never_merge() {
    let msg = compile_err(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            typedef t {
                type decimal64 {
                    fraction-digits 1;
                    range '1.0..2.0 | 2.2..3.0';
                }
            }
            leaf l { type t { range '1.5..2.5'; } }
        }",
    ]);
    assert_eq!(msg, "derived range must be restrictive");
}

#[test]
fn enumeration_values() {
    let (set, _) = compile(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            leaf l {
                type enumeration {
                    enum idle;
                    enum active { value 5; }
                    enum standby;
                }
                default standby;
            }
        }",
    ])
    .expect("Failed to compile module");

    match leaf_type(&set, "m", "l") {
        Type::Enumeration(t) => {
            let pairs: Vec<(&str, i64)> = t
                .enums
                .iter()
                .map(|e| (e.name.as_str(), e.value))
                .collect();
            assert_eq!(
                pairs,
                vec![("idle", 0), ("active", 5), ("standby", 6)]
            );
        }
        other => panic!("expected enumeration, got {}", other.name()),
    }
}

#[test]
fn predefined_enumeration_cannot_be_restricted() {
    let msg = compile_err(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            typedef state { type enumeration { enum up; enum down; } }
            leaf l { type state { enum up; } }
        }",
    ]);
    assert_eq!(msg, "cannot restrict predefined enumeration");
}

#[test]
fn unknown_enum_default_rejected() {
    let msg = compile_err(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            leaf l {
                type enumeration { enum up; enum down; }
                default sideways;
            }
        }",
    ]);
    assert!(
        msg.contains("unknown enum 'sideways'"),
        "got: {}",
        msg
    );
}

#[test]
fn union_members() {
    let (set, _) = compile(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            leaf l {
                type union {
                    type uint8;
                    type enumeration { enum auto; }
                }
                default auto;
            }
        }",
    ])
    .expect("Failed to compile module");

    match leaf_type(&set, "m", "l") {
        Type::Union(t) => assert_eq!(t.members.len(), 2),
        other => panic!("expected union, got {}", other.name()),
    }

    let msg = compile_err(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            typedef u { type union { type uint8; type string; } }
            leaf l { type u { range '1..5'; } }
        }",
    ]);
    assert_eq!(msg, "restrictions must be applied to members instead");
}

#[test]
fn bits_positions() {
    let (set, _) = compile(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            leaf l {
                type bits {
                    bit a;
                    bit b { position 4; }
                    bit c;
                }
            }
        }",
    ])
    .expect("Failed to compile module");

    match leaf_type(&set, "m", "l") {
        Type::Bits(t) => {
            let pairs: Vec<(&str, u32)> = t
                .bits
                .iter()
                .map(|b| (b.name.as_str(), b.position))
                .collect();
            assert_eq!(pairs, vec![("a", 0), ("b", 4), ("c", 5)]);
        }
        other => panic!("expected bits, got {}", other.name()),
    }
}

#[test]
fn identityref_closure() {
    let (set, _) = compile(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            identity crypto;
            identity aes { base crypto; }
            identity aes-256 { base aes; }
            leaf cipher {
                type identityref { base crypto; }
                default aes;
            }
        }",
    ])
    .expect("Failed to compile module");

    match leaf_type(&set, "m", "cipher") {
        Type::Identityref(t) => {
            assert_eq!(t.base, "m:crypto");
            let names: Vec<&str> =
                t.identities.iter().map(|i| i.name.as_str()).collect();
            assert_eq!(names, vec!["aes", "aes-256"]);
        }
        other => panic!("expected identityref, got {}", other.name()),
    }
}

#[test]
fn identityref_requires_known_base() {
    let msg = compile_err(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            leaf l { type identityref { base nonesuch; } }
        }",
    ]);
    assert!(
        msg.starts_with("Can't find base identity"),
        "got: {}",
        msg
    );
}

#[test]
fn identity_cycle_detected() {
    let msg = compile_err(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            identity i1 { base i2; }
            identity i2 { base i1; }
        }",
    ]);
    assert!(
        msg.starts_with("Identity cyclic reference:"),
        "got: {}",
        msg
    );
}

#[test]
fn duplicate_identity_rejected() {
    let msg = compile_err(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            identity dup;
            identity dup;
        }",
    ]);
    assert_eq!(msg, "Duplicate identity dup");
}

#[test]
fn leafref_path_handling() {
    let ok = compile(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            leaf refLeaf { type string; }
            leaf r { type leafref { path '../refLeaf'; } }
        }",
    ]);
    assert!(ok.is_ok(), "{:?}", ok.err());

    let msg = compile_err(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            leaf r { type leafref; }
        }",
    ]);
    assert_eq!(msg, "path statement is mandatory for leafref");

    // Repeating `path` is a cardinality error.
    let msg = compile_err(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            leaf r {
                type leafref {
                    path '../a';
                    path '../b';
                }
            }
        }",
    ]);
    assert_eq!(msg, "only one 'path' statement is allowed");

    let msg = compile_err(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            leaf refLeaf { type string; }
            leaf r { type leafref { path '../unknown:refLeaf'; } }
        }",
    ]);
    assert_eq!(msg, "unknown import unknown");
}

#[test]
fn leafref_path_cannot_be_refined() {
    let msg = compile_err(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            leaf refLeaf { type string; }
            typedef r { type leafref { path '../refLeaf'; } }
            leaf l { type r { path '../other'; } }
        }",
    ]);
    assert_eq!(msg, "cannot refine path");
}

#[test]
fn units_inherit_from_typedefs() {
    let (set, _) = compile(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            typedef seconds { type uint32; units seconds; }
            leaf a { type seconds; }
            leaf b { type seconds; units ms; }
        }",
    ])
    .expect("Failed to compile module");

    let model = set.model("m").unwrap();
    let tree = set.data_tree(model);
    assert_eq!(tree.child("a").unwrap().units(), Some("seconds"));
    assert_eq!(tree.child("b").unwrap().units(), Some("ms"));
}

#[test]
fn restriction_legality_table() {
    let msg = compile_err(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            leaf l { type boolean { length '1..2'; } }
        }",
    ]);
    assert_eq!(msg, "restriction not valid for this type");

    let msg = compile_err(&[
        "module m {
            namespace 'urn:m';
            prefix m;
            leaf l { type uint8 { length '1..2'; } }
        }",
    ]);
    assert_eq!(msg, "restriction not valid for this type");
}
