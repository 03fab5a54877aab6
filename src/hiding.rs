//! Inherited member sets with hiding detection.
//!
//! A member declared on a derived type hides an inherited member with the
//! same signature. Signatures are compared as canonical IDs encoded from the
//! queried type's point of view, so `BaseList{`0}.Add(`0)` seen from
//! `NamedList`1` and `NamedList`1.Add(`0)` produce the same text.

use std::collections::{HashMap, HashSet};

use crate::catalog::SymbolCatalog;
use crate::encoder::{Encoder, Substitution};
use crate::error::Error;
use crate::types::{CanonicalId, GenericOwner, GenericParam, MemberId, MemberKind, TypeId, TypeRef};

/// An inherited member shadowed by one declared closer to the queried type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HiddenMember {
    /// The member that is no longer visible.
    pub hidden: MemberId,
    /// The member that hides it.
    pub hidden_by: MemberId,
}

/// Every member a type exposes, declared or inherited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberSet {
    /// Inherited members shadowed by a same-signature member nearer the type.
    pub hidden: Vec<HiddenMember>,
    /// Visible members, the type's own first, then each ancestor's in turn.
    pub visible: Vec<MemberId>,
}

/// Bindings for `definition`'s parameters from the arguments of a base type
/// reference, rewritten through the bindings already in effect.
fn bindings_for_base(current: &Substitution, definition: TypeId, arguments: &[TypeRef]) -> Substitution {
    let mut next = Substitution::identity(current.target());
    for (position, argument) in (0_u32..).zip(arguments) {
        let param = GenericParam { owner: GenericOwner::Type(definition), position };
        next.bind(param, current.apply(argument));
    }
    return next;
}

/// Collect the members visible on `ty`, walking its base chain from nearest
/// to farthest. An inherited member whose signature, seen from `ty`, matches
/// one collected from a nearer level is recorded as hidden by that member.
/// Members declared on the same level never hide each other. Ancestor
/// constructors are not inherited.
///
/// # Errors
///
/// Returns `Error::UnknownType` if `ty` is not in the catalog, or
/// `Error::CatalogInconsistency` if a signature cannot be encoded.
pub fn merge_inherited_members<C: SymbolCatalog + ?Sized>(catalog: &C, ty: TypeId) -> Result<MemberSet, Error> {
    if catalog.type_def(ty).is_none() {
        return Err(Error::UnknownType { name: format!("#{}", ty.0) });
    }

    let encoder = Encoder::new(catalog);
    let mut set = MemberSet::default();
    let mut nearest: HashMap<CanonicalId, MemberId> = HashMap::new();
    let mut visited = HashSet::new();
    let mut level = Some((ty, Substitution::identity(ty)));

    while let Some((current, substitution)) = level.take() {
        if !visited.insert(current) {
            tracing::warn!(ty = current.0, "base type cycle");
            break;
        }

        let mut declared_here: HashMap<CanonicalId, MemberId> = HashMap::new();
        for &member in catalog.members_of(current) {
            let inherited = current != ty;
            if inherited && catalog.member_def(member).is_some_and(|def| return def.kind == MemberKind::Constructor) {
                continue;
            }
            let signature = encoder.encode_member_signature(member, &substitution)?;
            if let Some(&hidden_by) = nearest.get(&signature) {
                tracing::debug!(%signature, "inherited member is hidden");
                set.hidden.push(HiddenMember { hidden: member, hidden_by });
                continue;
            }
            declared_here.entry(signature).or_insert(member);
            set.visible.push(member);
        }
        nearest.extend(declared_here);

        level = match catalog.base_type(current) {
            Some(TypeRef::Generic { arguments, definition }) => {
                Some((*definition, bindings_for_base(&substitution, *definition, arguments)))
            },
            Some(TypeRef::Named(definition)) => Some((*definition, Substitution::identity(ty))),
            Some(TypeRef::Array { .. } | TypeRef::ByRef(_) | TypeRef::Param(_) | TypeRef::Pointer(_)) | None => None,
        };
    }

    return Ok(set);
}
