//! Resolve reference trees against a symbol catalog.
//!
//! Resolution never fails hard: a missing or ambiguous referent is
//! `ResolvedSymbol::Unresolved`. Generic backreferences are bound through two
//! explicit argument arrays, one for the enclosing type and one for the
//! enclosing method; there is no ambient state.

use crate::ast::{ArityMarker, Node, Reference, split_arity_marker};
use crate::catalog::SymbolCatalog;
use crate::types::{MemberId, ResolvedSymbol, SymbolKind, TypeId, TypeRef};

/// Resolves references against a borrowed catalog. Cheap to construct and
/// `Copy`, so one can be made per call site or shared across threads.
#[derive(Debug)]
pub struct Resolver<'cat, C: SymbolCatalog + ?Sized> {
    /// The catalog every lookup goes through.
    catalog: &'cat C,
}

impl<C: SymbolCatalog + ?Sized> Clone for Resolver<'_, C> {
    fn clone(&self) -> Self {
        return *self;
    }
}

impl<C: SymbolCatalog + ?Sized> Copy for Resolver<'_, C> {}

impl<'cat, C: SymbolCatalog + ?Sized> Resolver<'cat, C> {
    /// Walk a scope chain (the part of a type name before its last segment),
    /// returning its dotted text and the generic arguments bound so far.
    /// Instantiated segments gain their arity marker: `Outer{int}` becomes `Outer`1`.
    fn accumulate_scope(&self, node: &Node, type_args: &[TypeRef], method_args: &[TypeRef]) -> Option<(String, Vec<TypeRef>)> {
        return match node {
            Node::GenericInstantiation { arguments, parent } => {
                let (text, mut bound) = self.accumulate_scope(parent, type_args, method_args)?;
                let own = self.resolve_arguments(arguments, type_args, method_args)?;
                let text = match split_arity_marker(&text).1 {
                    ArityMarker::Type(n) if n == arguments.len() => text,
                    ArityMarker::None => format!("{text}`{}", arguments.len()),
                    ArityMarker::Method(_) | ArityMarker::Type(_) => return None,
                };
                bound.extend(own);
                Some((text, bound))
            },
            Node::Name { parent: None, text } => Some((text.clone(), Vec::new())),
            Node::Name { parent: Some(parent), text } => {
                let (prefix, bound) = self.accumulate_scope(parent, type_args, method_args)?;
                Some((format!("{prefix}.{text}"), bound))
            },
            Node::ArrayOf { .. }
            | Node::ByRefOf { .. }
            | Node::MethodGenericParam { .. }
            | Node::MethodReference { .. }
            | Node::PointerOf { .. }
            | Node::TypeGenericParam { .. } => None,
        };
    }

    /// Members of `declaring` named `text` whose kind and method arity fit.
    /// `#ctor` and `System#IDisposable#Dispose` map back to metadata names.
    fn candidates(&self, declaring: TypeId, text: &str, kind: Option<SymbolKind>) -> Option<Vec<MemberId>> {
        let (simple, marker) = split_arity_marker(text);
        let method_arity = match marker {
            ArityMarker::Method(n) => Some(n),
            ArityMarker::None => None,
            ArityMarker::Type(_) => return None,
        };

        let metadata_name = simple.replace('#', ".");
        let members = self
            .catalog
            .members_by_name(declaring, &metadata_name)
            .into_iter()
            .filter(|&m| {
                return self.catalog.member_def(m).is_some_and(|def| {
                    let kind_fits = kind.is_none_or(|k| return def.kind.symbol_kind() == k);
                    let arity_fits = method_arity.is_none_or(|n| return def.generic_params.len() == n);
                    return kind_fits && arity_fits;
                });
            })
            .collect();
        return Some(members);
    }

    /// Close `definition` over `arguments` if the counts agree.
    fn close_over(&self, definition: TypeId, arguments: Vec<TypeRef>) -> Option<TypeRef> {
        if arguments.is_empty() {
            return Some(TypeRef::Named(definition));
        }
        let expected = self.catalog.open_generic_parameters(definition).len();
        if expected != arguments.len() {
            tracing::debug!(expected, given = arguments.len(), "generic argument count mismatch");
            return None;
        }
        return Some(TypeRef::Generic { arguments, definition });
    }

    /// The catalog definition a declaring-type node resolves to.
    fn declaring_type(&self, node: &Node, type_args: &[TypeRef], method_args: &[TypeRef]) -> Option<TypeRef> {
        let ty = self.resolve_type(node, type_args, method_args)?;
        if ty.definition().is_none() {
            tracing::debug!(%node, "declaring scope is not a named type");
            return None;
        }
        return Some(ty);
    }

    /// Create a resolver over `catalog`.
    pub const fn new(catalog: &'cat C) -> Self {
        return Self { catalog };
    }

    /// Resolve any node. `type_args` and `method_args` bind `` `n `` and
    /// ``` ``n ``` backreferences; both are empty at the top level.
    ///
    /// A dotted name is tried as a type first and then as a member of the
    /// type named by its parent chain.
    pub fn resolve(&self, node: &Node, type_args: &[TypeRef], method_args: &[TypeRef]) -> ResolvedSymbol {
        if let Node::MethodReference { member, parameters, return_type } = node {
            return self.resolve_method_reference(member, parameters, return_type.as_deref(), None, type_args, method_args);
        }
        if let Some(ty) = self.resolve_type(node, type_args, method_args) {
            return ResolvedSymbol::Type(ty);
        }
        if let Node::Name { parent: Some(parent), text } = node {
            return self.resolve_member(parent, text, None, type_args, method_args);
        }
        return ResolvedSymbol::Unresolved;
    }

    /// Resolve every argument of an instantiation; all must be types.
    fn resolve_arguments(&self, arguments: &[Node], type_args: &[TypeRef], method_args: &[TypeRef]) -> Option<Vec<TypeRef>> {
        return arguments
            .iter()
            .map(|argument| return self.resolve_type(argument, type_args, method_args))
            .collect();
    }

    /// Resolve `parent.text` as a single member. Zero or several matches are unresolved.
    fn resolve_member(
        &self,
        parent: &Node,
        text: &str,
        kind: Option<SymbolKind>,
        type_args: &[TypeRef],
        method_args: &[TypeRef],
    ) -> ResolvedSymbol {
        let Some(declaring) = self.declaring_type(parent, type_args, method_args).and_then(|t| return t.definition()) else {
            return ResolvedSymbol::Unresolved;
        };
        let Some(candidates) = self.candidates(declaring, text, kind) else {
            return ResolvedSymbol::Unresolved;
        };

        if let [only] = candidates.as_slice() {
            return ResolvedSymbol::Member(*only);
        }
        tracing::debug!(member = text, matches = candidates.len(), "member name is missing or ambiguous");
        return ResolvedSymbol::Unresolved;
    }

    /// Pick the single overload whose formal parameters (and conversion return
    /// type, if given) equal the resolved parameter nodes exactly, in order.
    fn resolve_method_reference(
        &self,
        member: &Node,
        parameters: &[Node],
        return_type: Option<&Node>,
        kind: Option<SymbolKind>,
        type_args: &[TypeRef],
        method_args: &[TypeRef],
    ) -> ResolvedSymbol {
        let Node::Name { parent: Some(parent), text } = member else {
            return ResolvedSymbol::Unresolved;
        };
        let Some(declaring) = self.declaring_type(parent, type_args, method_args) else {
            return ResolvedSymbol::Unresolved;
        };
        let Some(definition) = declaring.definition() else {
            return ResolvedSymbol::Unresolved;
        };
        let Some(candidates) = self.candidates(definition, text, kind) else {
            return ResolvedSymbol::Unresolved;
        };

        // Backreferences in the parameter list bind to the open declaring type only.
        let declaring_params = match declaring {
            TypeRef::Named(id) => self.catalog.open_generic_parameters(id),
            TypeRef::Array { .. }
            | TypeRef::ByRef(_)
            | TypeRef::Generic { .. }
            | TypeRef::Param(_)
            | TypeRef::Pointer(_) => Vec::new(),
        };

        // A generic method is only named with its ``n marker in this form.
        let own_arity = match split_arity_marker(text).1 {
            ArityMarker::Method(n) => n,
            ArityMarker::None | ArityMarker::Type(_) => 0,
        };
        let matches: Vec<MemberId> = candidates
            .into_iter()
            .filter(|&candidate| return self.catalog.method_generic_parameters(candidate).len() == own_arity)
            .filter(|&candidate| return self.signature_matches(candidate, parameters, return_type, &declaring_params))
            .collect();

        if let [only] = matches.as_slice() {
            return ResolvedSymbol::Member(*only);
        }
        tracing::debug!(member = text, matches = matches.len(), "no unique overload");
        return ResolvedSymbol::Unresolved;
    }

    /// Resolve a parsed reference from the top level. A kind prefix restricts
    /// the result: `T:` accepts only types, the others only members of that kind.
    pub fn resolve_reference(&self, reference: &Reference) -> ResolvedSymbol {
        let node = &reference.node;
        return match (reference.kind, node) {
            (None, _) => self.resolve(node, &[], &[]),
            (Some(SymbolKind::Type), _) => self.resolve_type(node, &[], &[]).map_or(ResolvedSymbol::Unresolved, ResolvedSymbol::Type),
            (Some(kind), Node::MethodReference { member, parameters, return_type }) => {
                self.resolve_method_reference(member, parameters, return_type.as_deref(), Some(kind), &[], &[])
            },
            (Some(kind), Node::Name { parent: Some(parent), text }) => self.resolve_member(parent, text, Some(kind), &[], &[]),
            (Some(_), _) => ResolvedSymbol::Unresolved,
        };
    }

    /// Resolve a node that must denote a type.
    pub fn resolve_type(&self, node: &Node, type_args: &[TypeRef], method_args: &[TypeRef]) -> Option<TypeRef> {
        return match node {
            Node::ArrayOf { inner, rank } => Some(TypeRef::Array {
                element: Box::new(self.resolve_type(inner, type_args, method_args)?),
                rank: *rank,
            }),
            Node::ByRefOf { inner } => Some(TypeRef::ByRef(Box::new(self.resolve_type(inner, type_args, method_args)?))),
            Node::GenericInstantiation { arguments, parent } => {
                let own = self.resolve_arguments(arguments, type_args, method_args)?;
                let (definition, mut bound) = self.resolve_type_path(parent, arguments.len(), type_args, method_args)?;
                bound.extend(own);
                self.close_over(definition, bound)
            },
            Node::MethodGenericParam { position } => bind(method_args, *position),
            Node::MethodReference { .. } => None,
            Node::Name { .. } => {
                let (definition, bound) = self.resolve_type_path(node, 0, type_args, method_args)?;
                self.close_over(definition, bound)
            },
            Node::PointerOf { inner } => Some(TypeRef::Pointer(Box::new(self.resolve_type(inner, type_args, method_args)?))),
            Node::TypeGenericParam { position } => bind(type_args, *position),
        };
    }

    /// Find the open definition named by a `Name` node, plus any arguments
    /// bound by instantiated outer segments. `instantiation_arity` is the
    /// argument count of an enclosing `{...}`, or 0.
    fn resolve_type_path(
        &self,
        node: &Node,
        instantiation_arity: usize,
        type_args: &[TypeRef],
        method_args: &[TypeRef],
    ) -> Option<(TypeId, Vec<TypeRef>)> {
        let Node::Name { parent, text } = node else {
            return None;
        };
        let (simple, marker) = split_arity_marker(text);
        let arity = match marker {
            ArityMarker::None => instantiation_arity,
            ArityMarker::Type(n) if instantiation_arity == 0 || n == instantiation_arity => n,
            ArityMarker::Method(_) | ArityMarker::Type(_) => return None,
        };

        let (dotted, bound) = match parent {
            None => (simple.to_string(), Vec::new()),
            Some(scope) => {
                let (prefix, bound) = self.accumulate_scope(scope, type_args, method_args)?;
                (format!("{prefix}.{simple}"), bound)
            },
        };

        let Some(definition) = self.catalog.lookup_type_by_name(&dotted, arity) else {
            tracing::debug!(name = %dotted, arity, "no such type");
            return None;
        };
        return Some((definition, bound));
    }

    /// Whether `candidate` has exactly the given parameter list (and return type).
    fn signature_matches(&self, candidate: MemberId, parameters: &[Node], return_type: Option<&Node>, declaring_params: &[TypeRef]) -> bool {
        let method_params = self.catalog.method_generic_parameters(candidate);
        let formals = self.catalog.formal_parameters(candidate);
        if formals.len() != parameters.len() {
            return false;
        }

        let params_match = parameters.iter().zip(formals).all(|(node, formal)| {
            return self.resolve_type(node, declaring_params, &method_params).as_ref() == Some(formal);
        });
        if !params_match {
            return false;
        }

        let Some(expected) = return_type else {
            return true;
        };
        let declared = self.catalog.member_def(candidate).and_then(|def| return def.return_type.as_ref());
        return self.resolve_type(expected, declaring_params, &method_params).as_ref() == declared;
    }
}

/// Bind a positional backreference; out of range is unresolved.
fn bind(args: &[TypeRef], position: u32) -> Option<TypeRef> {
    let bound = usize::try_from(position).ok().and_then(|i| return args.get(i)).cloned();
    if bound.is_none() {
        tracing::debug!(position, available = args.len(), "generic backreference out of range");
    }
    return bound;
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "tests")]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::parser::{parse, parse_type};
    use crate::testing::{fixture, member, named};

    fn resolve_text(catalog: &Catalog, text: &str) -> ResolvedSymbol {
        return Resolver::new(catalog).resolve_reference(&parse(text).unwrap());
    }

    #[test]
    fn widget_resize_resolves_by_parameter_list() {
        let catalog = fixture();
        assert_eq!(
            resolve_text(&catalog, "Demo.Widget.Resize(System.Int32,System.Int32)"),
            ResolvedSymbol::Member(member(&catalog, "Demo.Widget", "Resize", 0))
        );
    }

    #[test]
    fn bare_dotted_name_resolves_to_type() {
        let catalog = fixture();
        assert_eq!(resolve_text(&catalog, "Demo.Widget"), ResolvedSymbol::Type(named(&catalog, "Demo.Widget")));
        assert_eq!(resolve_text(&catalog, "T:Demo.Box`1"), ResolvedSymbol::Type(named(&catalog, "Demo.Box`1")));
    }

    #[test]
    fn missing_type_is_unresolved() {
        let catalog = fixture();
        assert_eq!(resolve_text(&catalog, "Acme.Gadget"), ResolvedSymbol::Unresolved);
        assert_eq!(resolve_text(&catalog, "Acme.Gadget.Spin(System.Int32)"), ResolvedSymbol::Unresolved);
    }

    #[test]
    fn overloads_are_selected_by_exact_parameter_types() {
        let catalog = fixture();
        let by_int = member(&catalog, "Demo.Widget", "Parse", 0);
        let by_string = member(&catalog, "Demo.Widget", "Parse", 1);
        assert_ne!(by_int, by_string);

        assert_eq!(resolve_text(&catalog, "Demo.Widget.Parse(System.Int32)"), ResolvedSymbol::Member(by_int));
        assert_eq!(resolve_text(&catalog, "Demo.Widget.Parse(System.String)"), ResolvedSymbol::Member(by_string));
        assert_eq!(resolve_text(&catalog, "Demo.Widget.Parse"), ResolvedSymbol::Unresolved);
        assert_eq!(resolve_text(&catalog, "Demo.Widget.Parse(System.Boolean)"), ResolvedSymbol::Unresolved);
        assert_eq!(resolve_text(&catalog, "Demo.Widget.Parse()"), ResolvedSymbol::Unresolved);
    }

    #[test]
    fn generic_arity_must_match_argument_count() {
        let catalog = fixture();
        let pair = catalog.lookup_type_by_name("Demo.Pair", 2).unwrap();
        let int32 = named(&catalog, "System.Int32");
        let string = named(&catalog, "System.String");

        let resolver = Resolver::new(&catalog);
        let closed = parse_type("Demo.Pair{System.Int32,System.String}").unwrap();
        assert_eq!(
            resolver.resolve(&closed, &[], &[]),
            ResolvedSymbol::Type(TypeRef::Generic { arguments: vec![int32, string], definition: pair })
        );
        for text in ["Demo.Pair{System.Int32}", "Demo.Pair{System.Int32,System.String,System.Int32}"] {
            assert_eq!(resolver.resolve(&parse_type(text).unwrap(), &[], &[]), ResolvedSymbol::Unresolved, "{text}");
        }
    }

    #[test]
    fn backreferences_bind_within_bounds() {
        let catalog = fixture();
        let resolver = Resolver::new(&catalog);
        let int32 = named(&catalog, "System.Int32");
        let string = named(&catalog, "System.String");
        let type_args = [int32.clone()];
        let method_args = [string.clone(), int32.clone()];

        let resolve = |text: &str| return resolver.resolve(&parse_type(text).unwrap(), &type_args, &method_args);
        assert_eq!(resolve("`0"), ResolvedSymbol::Type(int32.clone()));
        assert_eq!(resolve("`1"), ResolvedSymbol::Unresolved);
        assert_eq!(resolve("``1"), ResolvedSymbol::Type(int32));
        assert_eq!(resolve("``2"), ResolvedSymbol::Unresolved);
        assert_eq!(resolver.resolve(&parse_type("``0").unwrap(), &[], &[]), ResolvedSymbol::Unresolved);
        assert_eq!(
            resolve("``0[]@"),
            ResolvedSymbol::Type(TypeRef::ByRef(Box::new(TypeRef::Array { element: Box::new(string), rank: 1 })))
        );
    }

    #[test]
    fn array_ranks_and_by_ref_compose() {
        let catalog = fixture();
        let resolver = Resolver::new(&catalog);
        let int32 = named(&catalog, "System.Int32");
        let grid = TypeRef::Array { element: Box::new(int32), rank: 2 };

        assert_eq!(resolver.resolve(&parse_type("System.Int32[0:,0:]").unwrap(), &[], &[]), ResolvedSymbol::Type(grid.clone()));
        assert_eq!(
            resolver.resolve(&parse_type("System.Int32[0:,0:]@").unwrap(), &[], &[]),
            ResolvedSymbol::Type(TypeRef::ByRef(Box::new(grid)))
        );
        assert_eq!(
            resolve_text(&catalog, "Demo.Widget.Fill(System.Int32[0:,0:])"),
            ResolvedSymbol::Member(member(&catalog, "Demo.Widget", "Fill", 0))
        );
        assert_eq!(resolve_text(&catalog, "Demo.Widget.Fill(System.Int32[])"), ResolvedSymbol::Unresolved);
    }

    #[test]
    fn generic_method_parameters_bind_to_method_arity() {
        let catalog = fixture();
        let convert = member(&catalog, "Demo.Widget", "Convert", 0);
        assert_eq!(resolve_text(&catalog, "M:Demo.Widget.Convert``1(``0)"), ResolvedSymbol::Member(convert));
        assert_eq!(resolve_text(&catalog, "Demo.Widget.Convert``1"), ResolvedSymbol::Member(convert));
        assert_eq!(resolve_text(&catalog, "Demo.Widget.Convert``2(``0)"), ResolvedSymbol::Unresolved);
        assert_eq!(resolve_text(&catalog, "Demo.Widget.Convert(``0)"), ResolvedSymbol::Unresolved);
    }

    #[test]
    fn open_declaring_type_binds_type_backreferences() {
        let catalog = fixture();
        let set = member(&catalog, "Demo.Box`1", "Set", 0);
        assert_eq!(resolve_text(&catalog, "Demo.Box`1.Set(`0)"), ResolvedSymbol::Member(set));
        assert_eq!(resolve_text(&catalog, "Demo.Box`1.Set(`1)"), ResolvedSymbol::Unresolved);
    }

    #[test]
    fn nested_generic_container_closes_over_outer_arguments() {
        let catalog = fixture();
        let resolver = Resolver::new(&catalog);
        let keys = catalog.lookup_type_by_name("System.Collections.Generic.Dictionary`2.KeyCollection", 0).unwrap();
        let node = parse_type("System.Collections.Generic.Dictionary{System.String,System.Int32}.KeyCollection").unwrap();
        assert_eq!(
            resolver.resolve_type(&node, &[], &[]),
            Some(TypeRef::Generic {
                arguments: vec![named(&catalog, "System.String"), named(&catalog, "System.Int32")],
                definition: keys,
            })
        );
    }

    #[test]
    fn nested_generic_with_markers_on_both_segments() {
        let catalog = fixture();
        let resolver = Resolver::new(&catalog);
        let inner = catalog.lookup_type_by_name("Demo.Outer`1.Inner`1", 0).unwrap();
        let node = parse_type("Demo.Outer{System.Int32}.Inner{System.String}").unwrap();
        assert_eq!(
            resolver.resolve_type(&node, &[], &[]),
            Some(TypeRef::Generic {
                arguments: vec![named(&catalog, "System.Int32"), named(&catalog, "System.String")],
                definition: inner,
            })
        );
        for missing in ["Demo.Outer{System.Int32}.Inner", "Demo.Outer.Inner{System.String}"] {
            assert_eq!(resolver.resolve_type(&parse_type(missing).unwrap(), &[], &[]), None, "{missing}");
        }

        let take = member(&catalog, "Demo.Widget", "Take", 0);
        let put = member(&catalog, "Demo.Outer`1.Inner`1", "Put", 0);
        assert_eq!(
            resolve_text(&catalog, "Demo.Widget.Take(Demo.Outer{System.Int32}.Inner{System.String})"),
            ResolvedSymbol::Member(take)
        );
        assert_eq!(resolve_text(&catalog, "M:Demo.Outer`1.Inner`1.Put(`0,`1)"), ResolvedSymbol::Member(put));
    }

    #[test]
    fn conversion_operators_disambiguate_by_return_type() {
        let catalog = fixture();
        let to_int = member(&catalog, "Demo.Widget", "op_Implicit", 0);
        let to_string = member(&catalog, "Demo.Widget", "op_Implicit", 1);
        assert_eq!(resolve_text(&catalog, "Demo.Widget.op_Implicit(Demo.Widget)"), ResolvedSymbol::Unresolved);
        assert_eq!(resolve_text(&catalog, "Demo.Widget.op_Implicit(Demo.Widget)~System.Int32"), ResolvedSymbol::Member(to_int));
        assert_eq!(resolve_text(&catalog, "Demo.Widget.op_Implicit(Demo.Widget)~System.String"), ResolvedSymbol::Member(to_string));
    }

    #[test]
    fn kind_prefix_filters_members() {
        let catalog = fixture();
        let name = member(&catalog, "Demo.Widget", "Name", 0);
        assert_eq!(resolve_text(&catalog, "P:Demo.Widget.Name"), ResolvedSymbol::Member(name));
        assert_eq!(resolve_text(&catalog, "F:Demo.Widget.Name"), ResolvedSymbol::Unresolved);
        assert_eq!(resolve_text(&catalog, "T:Demo.Widget.Name"), ResolvedSymbol::Unresolved);
        assert_eq!(resolve_text(&catalog, "M:Demo.Widget"), ResolvedSymbol::Unresolved);
    }

    #[test]
    fn constructor_names_map_to_metadata() {
        let catalog = fixture();
        let ctor = member(&catalog, "Demo.Widget", ".ctor", 0);
        assert_eq!(resolve_text(&catalog, "M:Demo.Widget.#ctor"), ResolvedSymbol::Member(ctor));
        assert_eq!(resolve_text(&catalog, "Demo.Widget.#ctor()"), ResolvedSymbol::Member(ctor));
    }
}
