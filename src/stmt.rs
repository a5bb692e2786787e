//
// Copyright (c) The yangc Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! YANG statement kinds and substatement cardinality.

use strum::{Display, EnumString};

/// Closed enumeration of the YANG statement kinds understood by the
/// compiler.
///
/// `deviate` is split into one kind per argument, and the operational
/// definition extensions (`opd:*`) are first-class kinds. Statements outside
/// this enumeration are represented as [`Stmt::Unknown`] with the raw
/// keyword preserved on the parse node.
#[derive(Clone, Copy, Debug, Display, EnumString, Eq, Hash, PartialEq)]
#[strum(serialize_all = "kebab-case")]
pub enum Stmt {
    Module,
    Submodule,
    Container,
    List,
    Leaf,
    LeafList,
    Choice,
    Case,
    Grouping,
    Uses,
    Augment,
    Refine,
    Typedef,
    Type,
    Import,
    Include,
    BelongsTo,
    Feature,
    IfFeature,
    Identity,
    Base,
    Rpc,
    Input,
    Output,
    Notification,
    Deviation,
    #[strum(serialize = "deviate not-supported")]
    DeviateNotSupported,
    #[strum(serialize = "deviate add")]
    DeviateAdd,
    #[strum(serialize = "deviate delete")]
    DeviateDelete,
    #[strum(serialize = "deviate replace")]
    DeviateReplace,
    When,
    Must,
    Range,
    Length,
    Pattern,
    FractionDigits,
    Default,
    Mandatory,
    Config,
    Status,
    Presence,
    Key,
    Unique,
    MinElements,
    MaxElements,
    RequireInstance,
    Path,
    Bit,
    Enum,
    OrderedBy,
    Units,
    Description,
    Reference,
    Extension,
    Argument,
    Namespace,
    Prefix,
    Revision,
    RevisionDate,
    YangVersion,
    Organization,
    Contact,
    ErrorMessage,
    ErrorAppTag,
    Value,
    Position,
    #[strum(serialize = "opd:command")]
    OpdCommand,
    #[strum(serialize = "opd:option")]
    OpdOption,
    #[strum(serialize = "opd:argument")]
    OpdArgument,
    #[strum(serialize = "opd:augment")]
    OpdAugment,
    Unknown,
}

/// How many instances of a substatement its parent accepts.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Cardinality {
    NotAllowed,
    ZeroOrOne,
    One,
    Any,
}

impl Stmt {
    /// Whether the statement defines a data node (or an operational
    /// definition node).
    pub fn is_data_def(self) -> bool {
        matches!(
            self,
            Stmt::Container
                | Stmt::List
                | Stmt::Leaf
                | Stmt::LeafList
                | Stmt::Choice
                | Stmt::Uses
        ) || self.is_opd_def()
    }

    /// Whether the statement defines an operational definition node.
    pub fn is_opd_def(self) -> bool {
        matches!(
            self,
            Stmt::OpdCommand | Stmt::OpdOption | Stmt::OpdArgument
        )
    }

    /// Statement kinds a top-level or inner augment may target.
    pub fn is_augment_target(self) -> bool {
        matches!(
            self,
            Stmt::Container
                | Stmt::List
                | Stmt::Choice
                | Stmt::Case
                | Stmt::Input
                | Stmt::Output
                | Stmt::Notification
        ) || self.is_opd_def()
    }

    /// Whether the statement kind is one of the `deviate` blocks.
    pub fn is_deviate(self) -> bool {
        matches!(
            self,
            Stmt::DeviateNotSupported
                | Stmt::DeviateAdd
                | Stmt::DeviateDelete
                | Stmt::DeviateReplace
        )
    }
}

/// Substatements a parent cannot do without.
pub fn mandatory_children(parent: Stmt) -> &'static [Stmt] {
    match parent {
        Stmt::Module => &[Stmt::Namespace, Stmt::Prefix],
        Stmt::Submodule => &[Stmt::BelongsTo],
        Stmt::Import | Stmt::BelongsTo => &[Stmt::Prefix],
        Stmt::Typedef | Stmt::Leaf | Stmt::LeafList => &[Stmt::Type],
        _ => &[],
    }
}

// Cardinality of the description/reference/status triple common to most
// definition statements.
fn meta(child: Stmt) -> Option<Cardinality> {
    match child {
        Stmt::Description | Stmt::Reference | Stmt::Status => {
            Some(Cardinality::ZeroOrOne)
        }
        _ => None,
    }
}

// Body statements shared by module, submodule, grouping, augment and the
// various tree-bearing statements.
fn data_def(child: Stmt) -> Option<Cardinality> {
    if child.is_data_def() {
        Some(Cardinality::Any)
    } else {
        None
    }
}

/// Cardinality of `child` as a substatement of `parent`.
///
/// Unknown statements are accepted anywhere with any multiplicity; tighter
/// tables for extension statements come from the `Extensions` hook.
pub fn cardinality(parent: Stmt, child: Stmt) -> Cardinality {
    use Cardinality::*;

    if child == Stmt::Unknown || parent == Stmt::Unknown {
        return Any;
    }

    match parent {
        Stmt::Module => match child {
            Stmt::Namespace | Stmt::Prefix => One,
            Stmt::YangVersion
            | Stmt::Organization
            | Stmt::Contact
            | Stmt::Description
            | Stmt::Reference => ZeroOrOne,
            Stmt::Import
            | Stmt::Include
            | Stmt::Revision
            | Stmt::Typedef
            | Stmt::Grouping
            | Stmt::Augment
            | Stmt::OpdAugment
            | Stmt::Rpc
            | Stmt::Notification
            | Stmt::Deviation
            | Stmt::Extension
            | Stmt::Feature
            | Stmt::Identity => Any,
            c => data_def(c).unwrap_or(NotAllowed),
        },
        Stmt::Submodule => match child {
            Stmt::BelongsTo => One,
            Stmt::YangVersion
            | Stmt::Organization
            | Stmt::Contact
            | Stmt::Description
            | Stmt::Reference => ZeroOrOne,
            Stmt::Import
            | Stmt::Include
            | Stmt::Revision
            | Stmt::Typedef
            | Stmt::Grouping
            | Stmt::Augment
            | Stmt::OpdAugment
            | Stmt::Rpc
            | Stmt::Notification
            | Stmt::Deviation
            | Stmt::Extension
            | Stmt::Feature
            | Stmt::Identity => Any,
            c => data_def(c).unwrap_or(NotAllowed),
        },
        Stmt::Import => match child {
            Stmt::Prefix => One,
            Stmt::RevisionDate => ZeroOrOne,
            _ => NotAllowed,
        },
        Stmt::Include => match child {
            Stmt::RevisionDate => ZeroOrOne,
            _ => NotAllowed,
        },
        Stmt::BelongsTo => match child {
            Stmt::Prefix => One,
            _ => NotAllowed,
        },
        Stmt::Revision => match child {
            Stmt::Description | Stmt::Reference => ZeroOrOne,
            _ => NotAllowed,
        },
        Stmt::Extension => match child {
            Stmt::Argument => ZeroOrOne,
            c => meta(c).unwrap_or(NotAllowed),
        },
        Stmt::Argument => NotAllowed,
        Stmt::Feature => match child {
            Stmt::IfFeature => Any,
            c => meta(c).unwrap_or(NotAllowed),
        },
        Stmt::Identity => match child {
            Stmt::Base | Stmt::IfFeature => Any,
            c => meta(c).unwrap_or(NotAllowed),
        },
        Stmt::Typedef => match child {
            Stmt::Type => One,
            Stmt::Units | Stmt::Default => ZeroOrOne,
            c => meta(c).unwrap_or(NotAllowed),
        },
        Stmt::Type => match child {
            Stmt::FractionDigits
            | Stmt::Range
            | Stmt::Length
            | Stmt::Path
            | Stmt::RequireInstance
            | Stmt::Base => ZeroOrOne,
            Stmt::Pattern | Stmt::Enum | Stmt::Bit | Stmt::Type => Any,
            _ => NotAllowed,
        },
        Stmt::Range | Stmt::Length | Stmt::Pattern => match child {
            Stmt::ErrorMessage
            | Stmt::ErrorAppTag
            | Stmt::Description
            | Stmt::Reference => ZeroOrOne,
            _ => NotAllowed,
        },
        Stmt::Enum => match child {
            Stmt::Value => ZeroOrOne,
            Stmt::IfFeature => Any,
            c => meta(c).unwrap_or(NotAllowed),
        },
        Stmt::Bit => match child {
            Stmt::Position => ZeroOrOne,
            Stmt::IfFeature => Any,
            c => meta(c).unwrap_or(NotAllowed),
        },
        Stmt::Grouping => match child {
            Stmt::Typedef | Stmt::Grouping => Any,
            c => meta(c).or_else(|| data_def(c)).unwrap_or(NotAllowed),
        },
        Stmt::Container => match child {
            Stmt::When | Stmt::Presence | Stmt::Config => ZeroOrOne,
            Stmt::IfFeature | Stmt::Must | Stmt::Typedef | Stmt::Grouping => {
                Any
            }
            c => meta(c).or_else(|| data_def(c)).unwrap_or(NotAllowed),
        },
        Stmt::Leaf => match child {
            Stmt::Type => One,
            Stmt::When
            | Stmt::Units
            | Stmt::Default
            | Stmt::Config
            | Stmt::Mandatory => ZeroOrOne,
            Stmt::IfFeature | Stmt::Must => Any,
            c => meta(c).unwrap_or(NotAllowed),
        },
        Stmt::LeafList => match child {
            Stmt::Type => One,
            Stmt::When
            | Stmt::Units
            | Stmt::Default
            | Stmt::Config
            | Stmt::MinElements
            | Stmt::MaxElements
            | Stmt::OrderedBy => ZeroOrOne,
            Stmt::IfFeature | Stmt::Must => Any,
            c => meta(c).unwrap_or(NotAllowed),
        },
        Stmt::List => match child {
            Stmt::When
            | Stmt::Key
            | Stmt::Config
            | Stmt::MinElements
            | Stmt::MaxElements
            | Stmt::OrderedBy => ZeroOrOne,
            Stmt::IfFeature
            | Stmt::Must
            | Stmt::Unique
            | Stmt::Typedef
            | Stmt::Grouping => Any,
            c => meta(c).or_else(|| data_def(c)).unwrap_or(NotAllowed),
        },
        Stmt::Choice => match child {
            Stmt::When | Stmt::Default | Stmt::Config | Stmt::Mandatory => {
                ZeroOrOne
            }
            Stmt::IfFeature | Stmt::Case => Any,
            // Shorthand cases.
            Stmt::Container | Stmt::List | Stmt::Leaf | Stmt::LeafList => Any,
            c => meta(c).unwrap_or(NotAllowed),
        },
        Stmt::Case => match child {
            Stmt::When => ZeroOrOne,
            Stmt::IfFeature => Any,
            c => meta(c).or_else(|| data_def(c)).unwrap_or(NotAllowed),
        },
        Stmt::Uses => match child {
            Stmt::When => ZeroOrOne,
            Stmt::IfFeature | Stmt::Refine | Stmt::Augment => Any,
            c => meta(c).unwrap_or(NotAllowed),
        },
        // The refine pass itself rejects illegal refinements (notably
        // `unique`), with a more precise diagnostic than this table could
        // give.
        Stmt::Refine => match child {
            Stmt::Config
            | Stmt::Default
            | Stmt::Mandatory
            | Stmt::Presence
            | Stmt::MinElements
            | Stmt::MaxElements
            | Stmt::Description
            | Stmt::Reference => ZeroOrOne,
            Stmt::Must | Stmt::Unique => Any,
            _ => NotAllowed,
        },
        Stmt::Augment | Stmt::OpdAugment => match child {
            Stmt::When => ZeroOrOne,
            Stmt::IfFeature | Stmt::Case => Any,
            c => meta(c).or_else(|| data_def(c)).unwrap_or(NotAllowed),
        },
        Stmt::Rpc => match child {
            Stmt::Input | Stmt::Output => ZeroOrOne,
            Stmt::IfFeature | Stmt::Typedef | Stmt::Grouping => Any,
            c => meta(c).unwrap_or(NotAllowed),
        },
        Stmt::Input | Stmt::Output => match child {
            Stmt::Typedef | Stmt::Grouping | Stmt::Must => Any,
            c => data_def(c).unwrap_or(NotAllowed),
        },
        Stmt::Notification => match child {
            Stmt::IfFeature | Stmt::Typedef | Stmt::Grouping => Any,
            c => meta(c).or_else(|| data_def(c)).unwrap_or(NotAllowed),
        },
        Stmt::Deviation => match child {
            Stmt::Description | Stmt::Reference => ZeroOrOne,
            c if c.is_deviate() => Any,
            _ => NotAllowed,
        },
        Stmt::DeviateNotSupported => NotAllowed,
        Stmt::DeviateAdd => match child {
            Stmt::Units
            | Stmt::Default
            | Stmt::Config
            | Stmt::Mandatory
            | Stmt::MinElements
            | Stmt::MaxElements => ZeroOrOne,
            Stmt::Must | Stmt::Unique => Any,
            _ => NotAllowed,
        },
        Stmt::DeviateDelete => match child {
            Stmt::Units | Stmt::Default => ZeroOrOne,
            Stmt::Must | Stmt::Unique => Any,
            _ => NotAllowed,
        },
        Stmt::DeviateReplace => match child {
            Stmt::Type
            | Stmt::Units
            | Stmt::Default
            | Stmt::Config
            | Stmt::Mandatory
            | Stmt::MinElements
            | Stmt::MaxElements => ZeroOrOne,
            _ => NotAllowed,
        },
        Stmt::When => match child {
            Stmt::Description | Stmt::Reference => ZeroOrOne,
            _ => NotAllowed,
        },
        Stmt::Must => match child {
            Stmt::ErrorMessage
            | Stmt::ErrorAppTag
            | Stmt::Description
            | Stmt::Reference => ZeroOrOne,
            _ => NotAllowed,
        },
        Stmt::OpdCommand => match child {
            Stmt::When => ZeroOrOne,
            Stmt::IfFeature => Any,
            c if c.is_opd_def() => Any,
            c => meta(c).unwrap_or(NotAllowed),
        },
        Stmt::OpdOption | Stmt::OpdArgument => match child {
            Stmt::Type | Stmt::When | Stmt::Units | Stmt::Default => {
                ZeroOrOne
            }
            Stmt::IfFeature | Stmt::Must => Any,
            c if c.is_opd_def() => Any,
            c => meta(c).unwrap_or(NotAllowed),
        },
        // Leaf statements accept no substatements of their own.
        _ => NotAllowed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn keyword_round_trip() {
        assert_eq!(Stmt::from_str("leaf-list").unwrap(), Stmt::LeafList);
        assert_eq!(Stmt::from_str("belongs-to").unwrap(), Stmt::BelongsTo);
        assert_eq!(Stmt::from_str("opd:command").unwrap(), Stmt::OpdCommand);
        assert_eq!(Stmt::LeafList.to_string(), "leaf-list");
        assert_eq!(Stmt::FractionDigits.to_string(), "fraction-digits");
        assert!(Stmt::from_str("no-such-keyword").is_err());
    }

    #[test]
    fn cardinality_basics() {
        assert_eq!(cardinality(Stmt::Leaf, Stmt::Type), Cardinality::One);
        assert_eq!(
            cardinality(Stmt::Type, Stmt::Path),
            Cardinality::ZeroOrOne
        );
        assert_eq!(cardinality(Stmt::Leaf, Stmt::Must), Cardinality::Any);
        assert_eq!(
            cardinality(Stmt::Leaf, Stmt::Key),
            Cardinality::NotAllowed
        );
        assert_eq!(
            cardinality(Stmt::DeviateNotSupported, Stmt::Default),
            Cardinality::NotAllowed
        );
    }
}
