/// Core domain types shared by the parser, resolver, and encoder.
use std::fmt;

use serde::{Deserialize, Serialize};

/// A canonical documentation ID such as `M:Demo.Widget.Resize(System.Int32,System.Int32)`.
/// Newtype prevents mixing with arbitrary reference text: only the encoder builds one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CanonicalId(
    /// The encoded identifier string.
    pub String,
);

impl fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(&self.0);
    }
}

/// Which declaration owns a generic parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GenericOwner {
    /// A method's own type parameter, written ``` ``n ```.
    Method(MemberId),
    /// A type's parameter, written `` `n ``. Nested types carry their outer parameters first.
    Type(TypeId),
}

/// A positional reference into the generic parameter list of its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GenericParam {
    /// The declaring type or method.
    pub owner: GenericOwner,
    /// Zero-based index into the owner's parameter list.
    pub position: u32,
}

/// Index of a member in a symbol catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberId(
    /// Position in the catalog's member table.
    pub u32,
);

/// The metadata kind of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    /// Instance (`.ctor`) or static (`.cctor`) constructor.
    Constructor,
    /// Event accessor pair.
    Event,
    /// Field or constant.
    Field,
    /// Method, including operators and conversions.
    Method,
    /// Property or indexer.
    Property,
}

impl MemberKind {
    /// The reference kind this member is addressed by. Constructors are methods.
    pub const fn symbol_kind(self) -> SymbolKind {
        return match self {
            MemberKind::Constructor | MemberKind::Method => SymbolKind::Method,
            MemberKind::Event => SymbolKind::Event,
            MemberKind::Field => SymbolKind::Field,
            MemberKind::Property => SymbolKind::Property,
        };
    }
}

/// Outcome of resolving a reference against a catalog.
/// `Unresolved` is an expected result, never an error: the caller renders a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSymbol {
    /// A single member of a catalog type.
    Member(MemberId),
    /// A type, possibly constructed (array, by-ref, pointer, closed generic).
    Type(TypeRef),
    /// Missing or ambiguous referent.
    Unresolved,
}

/// The one-letter kind prefix of a canonical ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SymbolKind {
    /// `E:`
    Event,
    /// `F:`
    Field,
    /// `M:` (methods, operators, constructors)
    Method,
    /// `P:`
    Property,
    /// `T:`
    Type,
}

impl SymbolKind {
    /// Parse a prefix letter. Returns `None` for letters that are not ID kinds.
    pub const fn from_prefix(letter: char) -> Option<Self> {
        return match letter {
            'E' => Some(SymbolKind::Event),
            'F' => Some(SymbolKind::Field),
            'M' => Some(SymbolKind::Method),
            'P' => Some(SymbolKind::Property),
            'T' => Some(SymbolKind::Type),
            _ => None,
        };
    }

    /// The prefix letter written before the colon.
    pub const fn prefix(self) -> char {
        return match self {
            SymbolKind::Event => 'E',
            SymbolKind::Field => 'F',
            SymbolKind::Method => 'M',
            SymbolKind::Property => 'P',
            SymbolKind::Type => 'T',
        };
    }
}

/// Index of a type definition in a symbol catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(
    /// Position in the catalog's type table.
    pub u32,
);

/// A structural type expression. Equality is the overload-selection criterion,
/// so two references to the same shape always compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// Array of `element`; `rank` is the number of dimensions.
    Array {
        /// Element type.
        element: Box<TypeRef>,
        /// Dimension count, at least 1.
        rank: u32,
    },
    /// Managed reference (`ref`/`out`), written `@`.
    ByRef(Box<TypeRef>),
    /// A generic definition closed over `arguments`, outer-type arguments first.
    Generic {
        /// Arguments bound positionally to the definition's parameter list.
        arguments: Vec<TypeRef>,
        /// The open generic definition.
        definition: TypeId,
    },
    /// A catalog type used as-is; for generic definitions this is the open type.
    Named(TypeId),
    /// A generic parameter of a type or method.
    Param(GenericParam),
    /// Unmanaged pointer, written `*`.
    Pointer(Box<TypeRef>),
}

impl TypeRef {
    /// The catalog definition underneath a named or generic type.
    pub const fn definition(&self) -> Option<TypeId> {
        return match self {
            TypeRef::Generic { definition, .. } => Some(*definition),
            TypeRef::Named(id) => Some(*id),
            TypeRef::Array { .. } | TypeRef::ByRef(_) | TypeRef::Param(_) | TypeRef::Pointer(_) => None,
        };
    }
}
