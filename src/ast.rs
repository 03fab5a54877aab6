//! Reference AST produced by the parser.
//!
//! Nodes are built once and never mutated. Every node except the root of a
//! name chain owns exactly one parent or inner edge, so the tree is acyclic.

use std::fmt;

use serde::Serialize;

use crate::types::SymbolKind;

/// Arity marker split off the end of a name segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArityMarker {
    /// ``` ``n ```: a generic method with `n` type parameters.
    Method(usize),
    /// No marker.
    None,
    /// `` `n ``: a generic type declaring `n` type parameters of its own.
    Type(usize),
}

/// One node of the reference tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Node {
    /// `inner[]` or `inner[0:,0:]`.
    ArrayOf {
        /// Element type.
        inner: Box<Node>,
        /// Dimension count, at least 1.
        rank: u32,
    },
    /// `inner@`
    ByRefOf {
        /// Referenced type.
        inner: Box<Node>,
    },
    /// `parent{arguments}` where `parent` is an open generic name chain.
    GenericInstantiation {
        /// Type arguments, in order.
        arguments: Vec<Node>,
        /// The open generic name.
        parent: Box<Node>,
    },
    /// ``` ``n ```: the enclosing method's n-th type parameter.
    MethodGenericParam {
        /// Zero-based position.
        position: u32,
    },
    /// `member(parameters)~return_type`. The member's parent chain names the declaring type.
    MethodReference {
        /// Name chain ending in the member name.
        member: Box<Node>,
        /// Parameter types; empty for `f()`.
        parameters: Vec<Node>,
        /// Conversion operator return type after `~`.
        return_type: Option<Box<Node>>,
    },
    /// One segment of a dotted chain; `text` may end in an arity marker.
    Name {
        /// Preceding segment, if any.
        parent: Option<Box<Node>>,
        /// Segment text as written.
        text: String,
    },
    /// `inner*`
    PointerOf {
        /// Pointee type.
        inner: Box<Node>,
    },
    /// `` `n ``: the enclosing type's n-th type parameter.
    TypeGenericParam {
        /// Zero-based position.
        position: u32,
    },
}

impl Node {
    /// Root name segment with no parent.
    pub fn name(text: &str) -> Self {
        return Node::Name { parent: None, text: text.to_string() };
    }

    /// Append a segment to this chain.
    #[must_use]
    pub fn child(self, text: &str) -> Self {
        return Node::Name { parent: Some(Box::new(self)), text: text.to_string() };
    }
}

impl fmt::Display for Node {
    /// Render the node back to reference syntax, using the canonical `[]`,
    /// `[0:,0:]` array forms.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return match self {
            Node::ArrayOf { inner, rank } => {
                write!(f, "{inner}")?;
                if *rank <= 1 {
                    return f.write_str("[]");
                }
                let dims = vec!["0:"; usize::try_from(*rank).unwrap_or(1)];
                write!(f, "[{}]", dims.join(","))
            },
            Node::ByRefOf { inner } => write!(f, "{inner}@"),
            Node::GenericInstantiation { arguments, parent } => {
                write!(f, "{parent}{{")?;
                write_joined(f, arguments)?;
                f.write_str("}")
            },
            Node::MethodGenericParam { position } => write!(f, "``{position}"),
            Node::MethodReference { member, parameters, return_type } => {
                write!(f, "{member}(")?;
                write_joined(f, parameters)?;
                f.write_str(")")?;
                if let Some(ret) = return_type {
                    write!(f, "~{ret}")?;
                }
                Ok(())
            },
            Node::Name { parent: Some(parent), text } => write!(f, "{parent}.{text}"),
            Node::Name { parent: None, text } => f.write_str(text),
            Node::PointerOf { inner } => write!(f, "{inner}*"),
            Node::TypeGenericParam { position } => write!(f, "`{position}"),
        };
    }
}

/// A parsed reference: the tree plus the optional `X:` kind prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    /// Kind letter written before the colon, if any.
    pub kind: Option<SymbolKind>,
    /// The reference tree.
    pub node: Node,
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(kind) = self.kind {
            write!(f, "{}:", kind.prefix())?;
        }
        return write!(f, "{}", self.node);
    }
}

/// Split a trailing arity marker off a name segment: `Box`1` becomes
/// (`Box`, `Type(1)`), `Map``2` becomes (`Map`, `Method(2)`).
pub fn split_arity_marker(text: &str) -> (&str, ArityMarker) {
    let Some(tick) = text.rfind(|c: char| return !c.is_ascii_digit()) else {
        return (text, ArityMarker::None);
    };
    let digits = text.get(tick.saturating_add(1)..).unwrap_or("");
    if digits.is_empty() || text.get(tick..=tick) != Some("`") {
        return (text, ArityMarker::None);
    }
    let Ok(count) = digits.parse::<usize>() else {
        return (text, ArityMarker::None);
    };

    let before = text.get(..tick).unwrap_or("");
    if let Some(stem) = before.strip_suffix('`') {
        return (stem, ArityMarker::Method(count));
    }
    return (before, ArityMarker::Type(count));
}

/// Write nodes separated by commas.
fn write_joined(f: &mut fmt::Formatter<'_>, nodes: &[Node]) -> fmt::Result {
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{node}")?;
    }
    return Ok(());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_type_and_method_markers() {
        assert_eq!(split_arity_marker("Box`1"), ("Box", ArityMarker::Type(1)));
        assert_eq!(split_arity_marker("Map``12"), ("Map", ArityMarker::Method(12)));
        assert_eq!(split_arity_marker("Resize"), ("Resize", ArityMarker::None));
        assert_eq!(split_arity_marker("Vector3"), ("Vector3", ArityMarker::None));
        assert_eq!(split_arity_marker("#ctor"), ("#ctor", ArityMarker::None));
    }

    #[test]
    fn renders_nested_structure() {
        let list = Node::GenericInstantiation {
            arguments: vec![Node::name("System").child("Int32")],
            parent: Box::new(Node::name("List")),
        };
        let node = Node::MethodReference {
            member: Box::new(Node::name("Widget").child("Fill")),
            parameters: vec![
                Node::ByRefOf { inner: Box::new(Node::ArrayOf { inner: Box::new(list), rank: 2 }) },
                Node::MethodGenericParam { position: 0 },
            ],
            return_type: None,
        };
        assert_eq!(node.to_string(), "Widget.Fill(List{System.Int32}[0:,0:]@,``0)");
    }

    #[test]
    fn reference_display_includes_prefix() {
        let reference = Reference { kind: Some(SymbolKind::Type), node: Node::name("Box`1") };
        assert_eq!(reference.to_string(), "T:Box`1");
    }
}
