/// Crate-level error types for docid diagnostics.
use std::fmt;
use std::path::PathBuf;

/// All errors in docid carry enough context to produce a useful diagnostic
/// without a debugger. A reference that parses but names nothing is not an
/// error inside the library; see `ResolvedSymbol::Unresolved`.
#[allow(clippy::error_impl_error, reason = "crate-level error type re-exported as docid::error::Error")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The catalog file parsed as TOML but describes an invalid catalog.
    #[error("catalog corrupt: {reason}")]
    CatalogCorrupt {
        /// Which type, member, or signature is invalid, and why.
        reason: String,
    },

    /// A generic parameter in a signature belongs to neither the declaring type
    /// nor the method. The catalog is inconsistent; the ID cannot be encoded.
    #[error("catalog inconsistency while encoding `{member}`: {reason}")]
    CatalogInconsistency {
        /// Metadata name of the member being encoded.
        member: String,
        /// Description of the violated invariant.
        reason: String,
    },

    /// The configured catalog file does not exist on disk.
    #[error("catalog not found: {}", path.display())]
    CatalogNotFound {
        /// Path to the missing catalog file.
        path: PathBuf,
    },

    /// Two catalog types share a metadata name.
    #[error("duplicate type in catalog: `{name}`")]
    DuplicateType {
        /// The repeated metadata name.
        name: String,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON serialization of command output failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped serde_json error.
        #[from]
        serde_json::Error,
    ),

    /// The reference text violates the reference grammar.
    #[error("malformed reference `{input}` at offset {position}: {reason}")]
    MalformedReference {
        /// The full reference text as written.
        input: String,
        /// Byte offset of the offending character or token.
        position: usize,
        /// Which grammar rule was violated.
        reason: Malformed,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// A type name given on the command line is not in the catalog.
    #[error("unknown type: `{name}`")]
    UnknownType {
        /// The type name as given.
        name: String,
    },

    /// A well-formed reference names nothing, or more than one thing, in the catalog.
    #[error("unresolved reference: `{reference}`")]
    Unresolved {
        /// The reference text as given.
        reference: String,
    },
}

/// The grammar violation behind a `MalformedReference`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Malformed {
    /// A digit run does not fit in 32 bits.
    NumberOutOfRange,
    /// Tokens remain after a complete reference.
    TrailingInput {
        /// Rendering of the first extra token.
        found: String,
    },
    /// A character that starts no token.
    UnexpectedCharacter(
        /// The offending character.
        char,
    ),
    /// A token the grammar does not allow here.
    UnexpectedToken {
        /// What the grammar allows at this point.
        expected: &'static str,
        /// Rendering of the token actually found.
        found: String,
    },
    /// Input ended inside `(...)` or `{...}`.
    UnterminatedGroup {
        /// The opening character.
        opener: char,
    },
}

impl fmt::Display for Malformed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return match self {
            Malformed::NumberOutOfRange => write!(f, "number out of range"),
            Malformed::TrailingInput { found } => write!(f, "trailing input starting at {found}"),
            Malformed::UnexpectedCharacter(c) => write!(f, "unexpected character `{c}`"),
            Malformed::UnexpectedToken { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            },
            Malformed::UnterminatedGroup { opener } => write!(f, "unterminated `{opener}`"),
        };
    }
}
