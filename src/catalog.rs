//! Symbol catalog: the read-only index of types and members that references
//! are resolved against and IDs are encoded from.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::ast::{ArityMarker, split_arity_marker};
use crate::error::Error;
use crate::parser;
use crate::resolver::Resolver;
use crate::types::{GenericOwner, GenericParam, MemberId, MemberKind, TypeId, TypeRef};

/// In-memory catalog backed by flat tables. Immutable once loaded, so it can be
/// shared across threads by reference.
#[derive(Debug, Default)]
pub struct Catalog {
    /// Metadata full name to type.
    by_name: HashMap<String, TypeId>,
    /// Member table, indexed by `MemberId`.
    members: Vec<MemberDef>,
    /// Type table, indexed by `TypeId`.
    types: Vec<TypeDef>,
}

impl Catalog {
    /// Build a catalog from the text of a catalog file.
    ///
    /// Types are registered first; signatures are then parsed as type
    /// expressions and resolved against the registered types, bound to the
    /// declaring type's and the member's own generic parameters.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` for invalid TOML, `Error::DuplicateType` for a
    /// repeated type name, or `Error::CatalogCorrupt` for an arity mismatch or
    /// a signature that is malformed or names an unknown type.
    pub fn from_toml(content: &str) -> Result<Self, Error> {
        let file: CatalogFile = toml::from_str(content)?;

        let mut catalog = Self::default();
        for (index, raw) in file.types.iter().enumerate() {
            catalog.register_type(index, raw)?;
        }

        let (bases, members) = resolve_signatures(&catalog, &file.types)?;
        for (def, base) in catalog.types.iter_mut().zip(bases) {
            def.base = base;
        }
        for (index, member) in members.iter().enumerate() {
            let id = MemberId(u32::try_from(index).map_err(|_err| return too_many("members"))?);
            if let Some(owner) = usize::try_from(member.declaring_type.0).ok().and_then(|i| return catalog.types.get_mut(i)) {
                owner.members.push(id);
            }
        }
        catalog.members = members;

        tracing::info!(types = catalog.types.len(), members = catalog.members.len(), "catalog loaded");
        return Ok(catalog);
    }

    /// Read and load a catalog file from disk.
    ///
    /// # Errors
    ///
    /// Returns `Error::CatalogNotFound` if the file doesn't exist, `Error::Io`
    /// for other read failures, or any error from [`Catalog::from_toml`].
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = match std::fs::read_to_string(path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::CatalogNotFound { path: path.to_path_buf() });
            },
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };
        return Self::from_toml(&content);
    }

    /// Every member id, in catalog order.
    pub fn member_ids(&self) -> impl Iterator<Item = MemberId> + '_ {
        return (0..self.members.len()).filter_map(|i| return u32::try_from(i).ok().map(MemberId));
    }

    /// Add a type definition under `index`, checking its name against its parameter list.
    ///
    /// # Errors
    ///
    /// Returns `Error::DuplicateType` or `Error::CatalogCorrupt`.
    fn register_type(&mut self, index: usize, raw: &RawType) -> Result<(), Error> {
        let name = raw.name.replace('+', ".");
        if self.by_name.contains_key(&name) {
            return Err(Error::DuplicateType { name });
        }

        let declared = declared_arity(&name);
        if declared != raw.generic_params.len() {
            return Err(Error::CatalogCorrupt {
                reason: format!(
                    "type `{name}` declares {declared} generic parameters in its name but lists {}",
                    raw.generic_params.len()
                ),
            });
        }

        let id = TypeId(u32::try_from(index).map_err(|_err| return too_many("types"))?);
        self.by_name.insert(name.clone(), id);
        self.types.push(TypeDef { base: None, generic_params: raw.generic_params.clone(), members: Vec::new(), name });
        return Ok(());
    }

    /// Every type id, in catalog order.
    pub fn type_ids(&self) -> impl Iterator<Item = TypeId> + '_ {
        return (0..self.types.len()).filter_map(|i| return u32::try_from(i).ok().map(TypeId));
    }
}

impl SymbolCatalog for Catalog {
    fn lookup_type_by_name(&self, dotted_name: &str, arity: usize) -> Option<TypeId> {
        if arity == 0 {
            return self.by_name.get(dotted_name).copied();
        }
        return self.by_name.get(&format!("{dotted_name}`{arity}")).copied();
    }

    fn member_def(&self, id: MemberId) -> Option<&MemberDef> {
        return usize::try_from(id.0).ok().and_then(|i| return self.members.get(i));
    }

    fn type_def(&self, id: TypeId) -> Option<&TypeDef> {
        return usize::try_from(id.0).ok().and_then(|i| return self.types.get(i));
    }
}

/// Raw TOML structure of a catalog file.
#[derive(Deserialize)]
struct CatalogFile {
    /// Every type in the catalog, including referenced framework types.
    #[serde(default)]
    types: Vec<RawType>,
}

/// A member of a catalog type. Signatures are expressed in terms of the
/// declaring type's and the member's own generic parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDef {
    /// The type that declares this member.
    pub declaring_type: TypeId,
    /// Names of the member's own type parameters (generic methods only).
    pub generic_params: Vec<String>,
    /// Metadata kind.
    pub kind: MemberKind,
    /// Metadata name: `.ctor`, `op_Implicit`, `System.IDisposable.Dispose`, ...
    pub name: String,
    /// Formal parameter types in declaration order.
    pub parameters: Vec<TypeRef>,
    /// Return, field, property, or event type.
    pub return_type: Option<TypeRef>,
}

/// Raw TOML structure for one member.
#[derive(Deserialize)]
struct RawMember {
    /// Own type parameter names.
    #[serde(default)]
    generic_params: Vec<String>,
    /// Metadata kind.
    kind: MemberKind,
    /// Metadata name.
    name: String,
    /// Parameter types in canonical type syntax.
    #[serde(default)]
    parameters: Vec<String>,
    /// Return type in canonical type syntax.
    returns: Option<String>,
}

/// Raw TOML structure for one type.
#[derive(Deserialize)]
struct RawType {
    /// Base type in canonical type syntax.
    base: Option<String>,
    /// Full generic parameter list, inherited outer parameters first.
    #[serde(default)]
    generic_params: Vec<String>,
    /// Declared members.
    #[serde(default)]
    members: Vec<RawMember>,
    /// Metadata full name, e.g. `Demo.Box`1` or `Demo.Outer`1.Inner`.
    name: String,
}

/// Read-only queries the resolver and encoder need. Implementations must allow
/// concurrent reads if references are resolved from several threads.
pub trait SymbolCatalog {
    /// The base type of `ty`, in terms of `ty`'s own generic parameters.
    fn base_type(&self, ty: TypeId) -> Option<&TypeRef> {
        return self.type_def(ty).and_then(|def| return def.base.as_ref());
    }

    /// Formal parameter types of a method or indexer, in declaration order.
    fn formal_parameters(&self, member: MemberId) -> &[TypeRef] {
        return self.member_def(member).map_or(&[], |def| return def.parameters.as_slice());
    }

    /// Whether `member` is a generic method definition with its own type parameters.
    fn is_generic_method_definition(&self, member: MemberId) -> bool {
        return self
            .member_def(member)
            .is_some_and(|def| return def.kind == MemberKind::Method && !def.generic_params.is_empty());
    }

    /// Find a type by dotted name and the arity of its last segment. `dotted_name`
    /// carries no trailing arity marker; outer segments keep theirs (`Outer`1.Inner`).
    fn lookup_type_by_name(&self, dotted_name: &str, arity: usize) -> Option<TypeId>;

    /// Look up a member by id.
    fn member_def(&self, id: MemberId) -> Option<&MemberDef>;

    /// Members of `ty` whose metadata name is exactly `simple_name`.
    fn members_by_name(&self, ty: TypeId, simple_name: &str) -> Vec<MemberId> {
        return self
            .members_of(ty)
            .iter()
            .copied()
            .filter(|&m| return self.member_def(m).is_some_and(|def| return def.name == simple_name))
            .collect();
    }

    /// All members declared directly on `ty`.
    fn members_of(&self, ty: TypeId) -> &[MemberId] {
        return self.type_def(ty).map_or(&[], |def| return def.members.as_slice());
    }

    /// The method's own generic parameters as positional references; empty if not generic.
    fn method_generic_parameters(&self, member: MemberId) -> Vec<TypeRef> {
        let count = self.member_def(member).map_or(0, |def| return def.generic_params.len());
        return params_for(GenericOwner::Method(member), count);
    }

    /// The open generic parameters of `ty`, inherited outer parameters first.
    fn open_generic_parameters(&self, ty: TypeId) -> Vec<TypeRef> {
        let count = self.type_def(ty).map_or(0, |def| return def.generic_params.len());
        return params_for(GenericOwner::Type(ty), count);
    }

    /// Look up a type by id.
    fn type_def(&self, id: TypeId) -> Option<&TypeDef>;
}

/// A type definition. Generic definitions are stored open; closed forms exist
/// only as `TypeRef::Generic`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDef {
    /// Base type, if any.
    pub base: Option<TypeRef>,
    /// Full generic parameter list, inherited outer parameters first.
    pub generic_params: Vec<String>,
    /// Members declared directly on this type.
    pub members: Vec<MemberId>,
    /// Metadata full name with `.` as the nested-type separator.
    pub name: String,
}

/// Sum of all arity markers in a full type name: `Outer`1.Inner`2` declares 3 parameters.
fn declared_arity(name: &str) -> usize {
    return name
        .split('.')
        .map(|segment| {
            return match split_arity_marker(segment).1 {
                ArityMarker::Type(n) => n,
                ArityMarker::Method(_) | ArityMarker::None => 0,
            };
        })
        .fold(0_usize, usize::saturating_add);
}

/// Positional parameter references `0..count` owned by `owner`.
fn params_for(owner: GenericOwner, count: usize) -> Vec<TypeRef> {
    return (0..count)
        .filter_map(|i| return u32::try_from(i).ok())
        .map(|position| return TypeRef::Param(GenericParam { owner, position }))
        .collect();
}

/// Resolve a base type. A base named without `{...}` must not leave
/// generic parameters open, as a nested type of a generic outer type would.
///
/// # Errors
///
/// Returns `Error::CatalogCorrupt` if the base does not resolve or is left open.
fn resolve_base(
    catalog: &Catalog,
    resolver: &Resolver<'_, Catalog>,
    name: &str,
    text: &str,
    type_args: &[TypeRef],
) -> Result<TypeRef, Error> {
    let context = format!("base of `{name}`");
    let base = resolve_signature(resolver, &context, text, type_args, &[])?;
    if let TypeRef::Named(definition) = base {
        let open = catalog.open_generic_parameters(definition).len();
        if open > 0 {
            return Err(Error::CatalogCorrupt {
                reason: format!("{context}: `{text}` leaves {open} generic parameters unbound; close it with `{{...}}`"),
            });
        }
    }
    return Ok(base);
}

/// Parse and resolve one signature string in the given generic context.
///
/// # Errors
///
/// Returns `Error::CatalogCorrupt` naming `context` and the offending text.
fn resolve_signature(
    resolver: &Resolver<'_, Catalog>,
    context: &str,
    text: &str,
    type_args: &[TypeRef],
    method_args: &[TypeRef],
) -> Result<TypeRef, Error> {
    let node = parser::parse_type(text).map_err(|e| {
        return Error::CatalogCorrupt { reason: format!("{context}: {e}") };
    })?;
    return resolver.resolve_type(&node, type_args, method_args).ok_or_else(|| {
        return Error::CatalogCorrupt { reason: format!("{context}: cannot resolve `{text}`") };
    });
}

/// Second loading pass: resolve every base type and member signature against
/// the registered types. Member ids are assigned in file order.
///
/// # Errors
///
/// Returns `Error::CatalogCorrupt` for the first signature that fails.
fn resolve_signatures(catalog: &Catalog, raw_types: &[RawType]) -> Result<(Vec<Option<TypeRef>>, Vec<MemberDef>), Error> {
    let resolver = Resolver::new(catalog);
    let mut bases = Vec::with_capacity(raw_types.len());
    let mut members = Vec::new();

    for (ty, raw) in catalog.type_ids().zip(raw_types) {
        let type_args = catalog.open_generic_parameters(ty);
        let base = match &raw.base {
            None => None,
            Some(text) => Some(resolve_base(catalog, &resolver, &raw.name, text, &type_args)?),
        };
        bases.push(base);

        for member in &raw.members {
            let id = MemberId(u32::try_from(members.len()).map_err(|_err| return too_many("members"))?);
            let method_args = params_for(GenericOwner::Method(id), member.generic_params.len());
            let context = format!("`{}.{}`", raw.name, member.name);

            let parameters = member
                .parameters
                .iter()
                .map(|text| return resolve_signature(&resolver, &context, text, &type_args, &method_args))
                .collect::<Result<Vec<_>, _>>()?;
            let return_type = match &member.returns {
                None => None,
                Some(text) => Some(resolve_signature(&resolver, &context, text, &type_args, &method_args)?),
            };

            members.push(MemberDef {
                declaring_type: ty,
                generic_params: member.generic_params.clone(),
                kind: member.kind,
                name: member.name.clone(),
                parameters,
                return_type,
            });
        }
    }

    return Ok((bases, members));
}

/// Error for a table that outgrew 32-bit ids.
fn too_many(what: &str) -> Error {
    return Error::CatalogCorrupt { reason: format!("too many {what} for 32-bit ids") };
}
