//! Canonical ID encoding, the inverse of resolution.
//!
//! Every member maps to exactly one ID string: `M:Demo.Box`1.Map``1(``0)`.
//! Generic parameters render positionally, closed generics render their
//! arguments in braces, and array ranks collapse to `[]`.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::ast::{ArityMarker, split_arity_marker};
use crate::catalog::{MemberDef, SymbolCatalog};
use crate::error::Error;
use crate::types::{CanonicalId, GenericOwner, GenericParam, MemberId, ResolvedSymbol, SymbolKind, TypeId, TypeRef};

/// Member names whose IDs end in `~ReturnType`.
const CONVERSION_OPERATORS: [&str; 2] = ["op_Explicit", "op_Implicit"];

/// Builds canonical IDs from catalog entries.
#[derive(Debug)]
pub struct Encoder<'cat, C: SymbolCatalog + ?Sized> {
    /// Source of type names, member definitions, and generic parameter lists.
    catalog: &'cat C,
}

impl<C: SymbolCatalog + ?Sized> Clone for Encoder<'_, C> {
    fn clone(&self) -> Self {
        return *self;
    }
}

impl<C: SymbolCatalog + ?Sized> Copy for Encoder<'_, C> {}

impl<'cat, C: SymbolCatalog + ?Sized> Encoder<'cat, C> {
    /// Encode a member's full ID, declaring type included.
    ///
    /// # Errors
    ///
    /// Returns `Error::CatalogInconsistency` if the member is unknown or its
    /// signature uses a generic parameter owned by neither it nor its type.
    pub fn encode_member(&self, member: MemberId) -> Result<CanonicalId, Error> {
        return self.encode_member_with(member, None);
    }

    /// Encode a member's signature as seen from `substitution.target()`: the
    /// declaring type is omitted and inherited generic parameters are replaced
    /// by their bindings, so members declared at different levels of a
    /// hierarchy compare equal exactly when one hides the other.
    ///
    /// # Errors
    ///
    /// Returns `Error::CatalogInconsistency` as for [`Encoder::encode_member`],
    /// or when a parameter of an ancestor type has no binding.
    pub fn encode_member_signature(&self, member: MemberId, substitution: &Substitution) -> Result<CanonicalId, Error> {
        return self.encode_member_with(member, Some(substitution));
    }

    /// Shared body of the two member encodings.
    ///
    /// # Errors
    ///
    /// Returns `Error::CatalogInconsistency`.
    fn encode_member_with(&self, member: MemberId, substitution: Option<&Substitution>) -> Result<CanonicalId, Error> {
        let def = self.member_def(member)?;
        let scope = Scope { declaring: Some(def.declaring_type), member: Some(member), subject: &def.name, substitution };

        let mut id = format!("{}:", def.kind.symbol_kind().prefix());
        if substitution.is_none() {
            id.push_str(self.type_name(def.declaring_type, &scope)?);
            id.push('.');
        }
        id.push_str(&def.name.replace('.', "#"));

        if self.catalog.is_generic_method_definition(member) {
            let _ = write!(id, "``{}", def.generic_params.len());
        }

        let parameters = self.catalog.formal_parameters(member);
        if !parameters.is_empty() {
            let rendered = parameters
                .iter()
                .map(|param| return self.type_text(param, &scope))
                .collect::<Result<Vec<_>, _>>()?;
            let _ = write!(id, "({})", rendered.join(","));
        }

        if CONVERSION_OPERATORS.contains(&def.name.as_str())
            && let Some(ret) = &def.return_type
        {
            let _ = write!(id, "~{}", self.type_text(ret, &scope)?);
        }

        return Ok(CanonicalId(id));
    }

    /// Encode whatever a reference resolved to. Constructed types (arrays,
    /// closed generics) get a `T:` ID in reference syntax.
    ///
    /// # Errors
    ///
    /// Returns `Error::CatalogInconsistency` if encoding fails.
    pub fn encode_symbol(&self, symbol: &ResolvedSymbol) -> Result<Option<CanonicalId>, Error> {
        return match symbol {
            ResolvedSymbol::Member(member) => self.encode_member(*member).map(Some),
            ResolvedSymbol::Type(ty) => {
                let scope = Scope { declaring: None, member: None, subject: "type reference", substitution: None };
                let text = self.type_text(ty, &scope)?;
                Ok(Some(CanonicalId(format!("{}:{text}", SymbolKind::Type.prefix()))))
            },
            ResolvedSymbol::Unresolved => Ok(None),
        };
    }

    /// Encode a type definition's ID. Generic definitions keep their arity marker.
    ///
    /// # Errors
    ///
    /// Returns `Error::CatalogInconsistency` if the type is unknown.
    pub fn encode_type(&self, ty: TypeId) -> Result<CanonicalId, Error> {
        let scope = Scope { declaring: Some(ty), member: None, subject: "type", substitution: None };
        let name = self.type_name(ty, &scope)?;
        return Ok(CanonicalId(format!("{}:{name}", SymbolKind::Type.prefix())));
    }

    /// Render a closed generic: each arity marker in the definition's name is
    /// replaced by the next run of arguments, so
    /// `Dictionary`2.KeyCollection` over two arguments becomes
    /// `Dictionary{A,B}.KeyCollection`.
    ///
    /// # Errors
    ///
    /// Returns `Error::CatalogInconsistency` if the argument count differs
    /// from the markers' total.
    fn generic_text(&self, definition: TypeId, arguments: &[TypeRef], scope: &Scope<'_>) -> Result<String, Error> {
        let name = self.type_name(definition, scope)?;
        let mut remaining = arguments.iter();
        let mut segments = Vec::new();

        for segment in name.split('.') {
            let (stem, marker) = split_arity_marker(segment);
            let ArityMarker::Type(count) = marker else {
                segments.push(segment.to_string());
                continue;
            };
            let rendered = remaining
                .by_ref()
                .take(count)
                .map(|argument| return self.type_text(argument, scope))
                .collect::<Result<Vec<_>, _>>()?;
            if rendered.len() != count {
                return Err(scope.inconsistency(format!("`{name}` is closed over only {} arguments", arguments.len())));
            }
            segments.push(format!("{stem}{{{}}}", rendered.join(",")));
        }

        if remaining.next().is_some() {
            return Err(scope.inconsistency(format!("`{name}` is closed over {} arguments, too many", arguments.len())));
        }
        return Ok(segments.join("."));
    }

    /// Look up a member definition.
    ///
    /// # Errors
    ///
    /// Returns `Error::CatalogInconsistency` for an id the catalog doesn't know.
    fn member_def(&self, member: MemberId) -> Result<&'cat MemberDef, Error> {
        return self.catalog.member_def(member).ok_or_else(|| {
            return Error::CatalogInconsistency { member: format!("#{}", member.0), reason: "no such member".to_string() };
        });
    }

    /// Create an encoder over `catalog`.
    pub const fn new(catalog: &'cat C) -> Self {
        return Self { catalog };
    }

    /// Render a generic parameter: through the substitution first, then
    /// positionally against its owner.
    ///
    /// # Errors
    ///
    /// Returns `Error::CatalogInconsistency` if the owner is out of scope.
    fn param_text(&self, param: GenericParam, scope: &Scope<'_>) -> Result<String, Error> {
        if let Some(bound) = scope.substitution.and_then(|sub| return sub.map.get(&param)) {
            return self.type_text(bound, scope);
        }
        let owned_by_type = |ty: TypeId| {
            return scope.substitution.map_or(scope.declaring == Some(ty), |sub| return sub.target == ty);
        };
        return match param.owner {
            GenericOwner::Method(m) if scope.member == Some(m) => Ok(format!("``{}", param.position)),
            GenericOwner::Type(ty) if owned_by_type(ty) => Ok(format!("`{}", param.position)),
            GenericOwner::Method(_) | GenericOwner::Type(_) => {
                Err(scope.inconsistency(format!("generic parameter {} belongs to neither the member nor its type", param.position)))
            },
        };
    }

    /// The metadata name of a type definition.
    ///
    /// # Errors
    ///
    /// Returns `Error::CatalogInconsistency` for an unknown type id.
    fn type_name(&self, ty: TypeId, scope: &Scope<'_>) -> Result<&'cat str, Error> {
        return self
            .catalog
            .type_def(ty)
            .map(|def| return def.name.as_str())
            .ok_or_else(|| return scope.inconsistency(format!("no such type #{}", ty.0)));
    }

    /// Render a type expression in ID syntax.
    ///
    /// # Errors
    ///
    /// Returns `Error::CatalogInconsistency` from parameter or generic rendering.
    fn type_text(&self, ty: &TypeRef, scope: &Scope<'_>) -> Result<String, Error> {
        return match ty {
            TypeRef::Array { element, .. } => Ok(format!("{}[]", self.type_text(element, scope)?)),
            TypeRef::ByRef(inner) => Ok(format!("{}@", self.type_text(inner, scope)?)),
            TypeRef::Generic { arguments, definition } => self.generic_text(*definition, arguments, scope),
            TypeRef::Named(id) => self.type_name(*id, scope).map(str::to_string),
            TypeRef::Param(param) => self.param_text(*param, scope),
            TypeRef::Pointer(inner) => Ok(format!("{}*", self.type_text(inner, scope)?)),
        };
    }
}

/// What is being encoded, and which generic parameters are in scope.
struct Scope<'s> {
    /// Declaring type whose parameters render as `` `n ``, when not substituting.
    declaring: Option<TypeId>,
    /// Member whose own parameters render as ``` ``n ```.
    member: Option<MemberId>,
    /// Name used in error messages.
    subject: &'s str,
    /// Active inherited-parameter bindings.
    substitution: Option<&'s Substitution>,
}

impl Scope<'_> {
    /// An inconsistency error about the subject being encoded.
    fn inconsistency(&self, reason: String) -> Error {
        return Error::CatalogInconsistency { member: self.subject.to_string(), reason };
    }
}

/// Bindings from an ancestor's generic parameters to types expressed in the
/// terms of one most-derived `target` type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    /// Parameter to its binding.
    map: HashMap<GenericParam, TypeRef>,
    /// The type whose own parameters stay positional.
    target: TypeId,
}

impl Substitution {
    /// Apply the bindings throughout `ty`.
    pub fn apply(&self, ty: &TypeRef) -> TypeRef {
        return match ty {
            TypeRef::Array { element, rank } => TypeRef::Array { element: Box::new(self.apply(element)), rank: *rank },
            TypeRef::ByRef(inner) => TypeRef::ByRef(Box::new(self.apply(inner))),
            TypeRef::Generic { arguments, definition } => TypeRef::Generic {
                arguments: arguments.iter().map(|argument| return self.apply(argument)).collect(),
                definition: *definition,
            },
            TypeRef::Named(_) => ty.clone(),
            TypeRef::Param(param) => self.map.get(param).cloned().unwrap_or_else(|| return ty.clone()),
            TypeRef::Pointer(inner) => TypeRef::Pointer(Box::new(self.apply(inner))),
        };
    }

    /// Bind `param` to `ty`.
    pub fn bind(&mut self, param: GenericParam, ty: TypeRef) {
        self.map.insert(param, ty);
    }

    /// No bindings: `target`'s own members encode unchanged apart from the
    /// omitted declaring type.
    pub fn identity(target: TypeId) -> Self {
        return Self { map: HashMap::new(), target };
    }

    /// The most-derived type the bindings are expressed in.
    pub const fn target(&self) -> TypeId {
        return self.target;
    }
}
