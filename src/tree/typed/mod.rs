//! Typed views over [`SyntaxNode`].
//!
//! Each view wraps a node of one production and exposes one accessor per
//! slot: `<kind>()` for required and optional slots, `<kind>_list()` for
//! repeated ones. Views are declared with the macros below; the declarations
//! for the built-in schema live in [`kotlin`]. A view may splice one operand
//! group, whose member list is written once and shared by every view that
//! splices it.
//!
//! A view's required children are resolved when it is cast, so a required
//! accessor returns its child directly.

use crate::schema::Cardinality;
use crate::tree::SyntaxNode;

/// A typed wrapper around a node of one production.
pub trait TypedNode<'a>: Sized + Copy {
    const KIND: &'static str;

    fn cast(node: &'a SyntaxNode) -> Option<Self>;

    fn syntax(&self) -> &'a SyntaxNode;
}

/// The slot table a view was declared with.
#[derive(Debug, Clone, Copy)]
pub struct ViewInfo {
    pub kind: &'static str,
    pub slots: fn() -> Vec<(&'static str, Cardinality)>,
}

// =====================
// Declaration macros
// =====================

macro_rules! typed_tokens {
    ($($name:ident = $kind:literal),* $(,)?) => {
        $(
            #[derive(Debug, Clone, Copy)]
            pub struct $name<'a> {
                node: &'a SyntaxNode,
            }

            impl<'a> TypedNode<'a> for $name<'a> {
                const KIND: &'static str = $kind;

                fn cast(node: &'a SyntaxNode) -> Option<Self> {
                    (node.kind().as_str() == $kind).then_some(Self { node })
                }

                fn syntax(&self) -> &'a SyntaxNode {
                    self.node
                }
            }

            impl<'a> $name<'a> {
                pub fn text(&self) -> &'a str {
                    let node = self.node;
                    node.text().unwrap_or_default()
                }
            }
        )*

        /// Every token view, by kind.
        pub const TOKEN_VIEWS: &[&str] = &[$($kind),*];
    };
}

macro_rules! typed_nodes {
    ($(
        $name:ident = $kind:literal {
            $(required { $($racc:ident : $rty:ident),* $(,)? })?
            $(optional { $($oacc:ident : $oty:ident),* $(,)? })?
            $(repeated { $($macc:ident : $mty:ident),* $(,)? })?
            $(splice { $card:ident $group:ident })?
        }
    )*) => {
        $(
            #[derive(Debug, Clone, Copy)]
            pub struct $name<'a> {
                node: &'a SyntaxNode,
                $($($racc: $rty<'a>,)*)?
            }

            impl<'a> TypedNode<'a> for $name<'a> {
                const KIND: &'static str = $kind;

                fn cast(node: &'a SyntaxNode) -> Option<Self> {
                    if node.kind().as_str() != $kind {
                        return None;
                    }
                    Some(Self {
                        node,
                        $($($racc: node
                            .required(<$rty<'a> as TypedNode<'a>>::KIND)
                            .and_then(<$rty<'a> as TypedNode<'a>>::cast)?,)*)?
                    })
                }

                fn syntax(&self) -> &'a SyntaxNode {
                    self.node
                }
            }

            impl<'a> $name<'a> {
                /// Declared slots, with any spliced group expanded.
                pub fn slots() -> Vec<(&'static str, Cardinality)> {
                    let mut slots = Vec::new();
                    $($(slots.push((<$rty<'static> as TypedNode<'static>>::KIND, Cardinality::Required));)*)?
                    $($(slots.push((<$oty<'static> as TypedNode<'static>>::KIND, Cardinality::Optional));)*)?
                    $($(slots.push((<$mty<'static> as TypedNode<'static>>::KIND, Cardinality::Repeated));)*)?
                    $(group! { $group, splice_slots! { slots $card; } })?
                    slots
                }

                $($(
                    pub fn $racc(&self) -> $rty<'a> {
                        self.$racc
                    }
                )*)?

                $($(
                    pub fn $oacc(&self) -> Option<$oty<'a>> {
                        let node = self.node;
                        node.optional(<$oty<'a> as TypedNode<'a>>::KIND)
                            .and_then(<$oty<'a> as TypedNode<'a>>::cast)
                    }
                )*)?

                $($(
                    pub fn $macc(&self) -> impl Iterator<Item = $mty<'a>> + 'a {
                        let node = self.node;
                        node.repeated(<$mty<'a> as TypedNode<'a>>::KIND)
                            .filter_map(<$mty<'a> as TypedNode<'a>>::cast)
                    }
                )*)?

                $(group! { $group, splice_accessors! { 'a $card; } })?
            }
        )*

        /// Every node view with its declared slots.
        pub const NODE_VIEWS: &[ViewInfo] = &[
            $(ViewInfo { kind: $kind, slots: <$name<'static>>::slots },)*
        ];
    };
}

// Callbacks for a group macro, which appends the group's members to the
// arguments as `accessor list_accessor View,` triples.

macro_rules! splice_accessors {
    ($lt:lifetime optional; $($acc:ident $list:ident $ty:ident,)*) => {
        $(
            pub fn $acc(&self) -> Option<$ty<$lt>> {
                let node = self.node;
                node.optional(<$ty<$lt> as TypedNode<$lt>>::KIND)
                    .and_then(<$ty<$lt> as TypedNode<$lt>>::cast)
            }
        )*
    };
    ($lt:lifetime repeated; $($acc:ident $list:ident $ty:ident,)*) => {
        $(
            pub fn $list(&self) -> impl Iterator<Item = $ty<$lt>> + $lt {
                let node = self.node;
                node.repeated(<$ty<$lt> as TypedNode<$lt>>::KIND)
                    .filter_map(<$ty<$lt> as TypedNode<$lt>>::cast)
            }
        )*
    };
}

macro_rules! splice_slots {
    ($slots:ident optional; $($acc:ident $list:ident $ty:ident,)*) => {
        $($slots.push((<$ty<'static> as TypedNode<'static>>::KIND, Cardinality::Optional));)*
    };
    ($slots:ident repeated; $($acc:ident $list:ident $ty:ident,)*) => {
        $($slots.push((<$ty<'static> as TypedNode<'static>>::KIND, Cardinality::Repeated));)*
    };
}

macro_rules! typed_union {
    ($(#[$meta:meta])* $union:ident; $($acc:ident $list:ident $variant:ident,)*) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub enum $union<'a> {
            $($variant($variant<'a>),)*
        }

        impl<'a> $union<'a> {
            pub const KINDS: &'static [&'static str] = &[
                $(<$variant<'static> as TypedNode<'static>>::KIND,)*
            ];

            pub fn cast(node: &'a SyntaxNode) -> Option<Self> {
                $(
                    if let Some(view) = <$variant<'a> as TypedNode<'a>>::cast(node) {
                        return Some(Self::$variant(view));
                    }
                )*
                None
            }

            pub fn syntax(&self) -> &'a SyntaxNode {
                match self {
                    $(Self::$variant(view) => view.syntax(),)*
                }
            }

            /// Children of `node` that are members of this union, in source order.
            pub fn children_of(node: &'a SyntaxNode) -> impl Iterator<Item = Self> + 'a {
                node.children().iter().filter_map(|child| Self::cast(child))
            }
        }
    };
}

pub mod kotlin;

pub use kotlin::*;

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use super::*;
    use crate::schema::builtin;

    #[test]
    fn test_views_agree_with_registry() {
        let schema = builtin::kotlin().unwrap();
        let mut seen = HashSet::new();

        for view in NODE_VIEWS {
            let production = schema.production(view.kind).unwrap();
            assert!(!production.is_token(), "{} is a token", view.kind);

            let declared: HashMap<&str, Cardinality> = production
                .slots()
                .iter()
                .map(|s| (s.kind.as_str(), s.cardinality))
                .collect();
            let slots = (view.slots)();
            let viewed: HashMap<&str, Cardinality> = slots.iter().copied().collect();
            assert_eq!(declared, viewed, "slots of {}", view.kind);
            assert_eq!(slots.len(), production.slots().len(), "{}", view.kind);
            seen.insert(view.kind);
        }

        for kind in TOKEN_VIEWS {
            assert!(schema.production(kind).unwrap().is_token(), "{kind}");
            seen.insert(*kind);
        }

        let all: HashSet<&str> = schema.productions().map(|p| p.name().as_str()).collect();
        assert_eq!(seen, all);
    }

    #[test]
    fn test_expression_union_matches_group() {
        let schema = builtin::kotlin().unwrap();
        let file: HashSet<&str> = schema
            .slots("file")
            .unwrap()
            .iter()
            .map(|s| s.kind.as_str())
            .collect();
        let union: HashSet<&str> = Expression::KINDS.iter().copied().collect();
        assert_eq!(file, union);
    }
}
