//! Shared fixture catalog for unit tests.
#![allow(clippy::missing_panics_doc, reason = "test helpers")]

use crate::catalog::{Catalog, SymbolCatalog as _};
use crate::types::{MemberId, TypeRef};

/// A small framework slice plus demo types covering overloads, generics,
/// nested generic containers, conversions, and an inheritance chain.
pub const FIXTURE: &str = r#"
[[types]]
name = "System.Object"

  [[types.members]]
  kind = "method"
  name = "ToString"
  returns = "System.String"

  [[types.members]]
  kind = "method"
  name = "GetHashCode"
  returns = "System.Int32"

[[types]]
name = "System.Int32"
base = "System.Object"

[[types]]
name = "System.String"
base = "System.Object"

[[types]]
name = "System.Boolean"
base = "System.Object"

[[types]]
name = "System.Byte"
base = "System.Object"

[[types]]
name = "System.Collections.Generic.List`1"
generic_params = ["T"]
base = "System.Object"

  [[types.members]]
  kind = "constructor"
  name = ".ctor"

  [[types.members]]
  kind = "method"
  name = "Add"
  parameters = ["`0"]

  [[types.members]]
  kind = "property"
  name = "Item"
  parameters = ["System.Int32"]
  returns = "`0"

  [[types.members]]
  kind = "property"
  name = "Count"
  returns = "System.Int32"

[[types]]
name = "System.Collections.Generic.Dictionary`2"
generic_params = ["TKey", "TValue"]
base = "System.Object"

  [[types.members]]
  kind = "property"
  name = "Keys"
  returns = "System.Collections.Generic.Dictionary{`0,`1}.KeyCollection"

[[types]]
name = "System.Collections.Generic.Dictionary`2.KeyCollection"
generic_params = ["TKey", "TValue"]
base = "System.Object"

  [[types.members]]
  kind = "method"
  name = "CopyTo"
  parameters = ["`0[]", "System.Int32"]

[[types]]
name = "Demo.Widget"
base = "System.Object"

  [[types.members]]
  kind = "constructor"
  name = ".ctor"

  [[types.members]]
  kind = "method"
  name = "Resize"
  parameters = ["System.Int32", "System.Int32"]

  [[types.members]]
  kind = "method"
  name = "Parse"
  parameters = ["System.Int32"]
  returns = "Demo.Widget"

  [[types.members]]
  kind = "method"
  name = "Parse"
  parameters = ["System.String"]
  returns = "Demo.Widget"

  [[types.members]]
  kind = "method"
  name = "Convert"
  generic_params = ["U"]
  parameters = ["``0"]
  returns = "``0"

  [[types.members]]
  kind = "method"
  name = "Fill"
  parameters = ["System.Int32[0:,0:]"]

  [[types.members]]
  kind = "method"
  name = "Swap"
  parameters = ["System.Int32@", "System.Int32@"]

  [[types.members]]
  kind = "method"
  name = "Read"
  parameters = ["System.Byte*", "System.Int32"]

  [[types.members]]
  kind = "method"
  name = "Consume"
  parameters = ["System.Collections.Generic.List{System.Int32}"]

  [[types.members]]
  kind = "method"
  name = "Index"
  parameters = ["System.Collections.Generic.Dictionary{System.String,System.Int32}.KeyCollection"]

  [[types.members]]
  kind = "method"
  name = "Take"
  parameters = ["Demo.Outer{System.Int32}.Inner{System.String}"]

  [[types.members]]
  kind = "method"
  name = "op_Implicit"
  parameters = ["Demo.Widget"]
  returns = "System.Int32"

  [[types.members]]
  kind = "method"
  name = "op_Implicit"
  parameters = ["Demo.Widget"]
  returns = "System.String"

  [[types.members]]
  kind = "method"
  name = "System.IDisposable.Dispose"

  [[types.members]]
  kind = "property"
  name = "Name"
  returns = "System.String"

  [[types.members]]
  kind = "field"
  name = "count"
  returns = "System.Int32"

  [[types.members]]
  kind = "event"
  name = "Changed"

[[types]]
name = "Demo.Box`1"
generic_params = ["T"]
base = "System.Object"

  [[types.members]]
  kind = "method"
  name = "Get"
  returns = "`0"

  [[types.members]]
  kind = "method"
  name = "Set"
  parameters = ["`0"]

  [[types.members]]
  kind = "method"
  name = "Map"
  generic_params = ["U"]
  parameters = ["``0"]
  returns = "Demo.Box{``0}"

[[types]]
name = "Demo.Box`1.Slot"
generic_params = ["T"]

  [[types.members]]
  kind = "field"
  name = "Value"
  returns = "`0"

[[types]]
name = "Demo.Outer`1"
generic_params = ["T"]
base = "System.Object"

[[types]]
name = "Demo.Outer`1.Inner`1"
generic_params = ["T", "U"]
base = "System.Object"

  [[types.members]]
  kind = "method"
  name = "Put"
  parameters = ["`0", "`1"]

[[types]]
name = "Demo.Pair`2"
generic_params = ["A", "B"]

[[types]]
name = "Demo.BaseList`1"
generic_params = ["T"]
base = "System.Object"

  [[types.members]]
  kind = "constructor"
  name = ".ctor"

  [[types.members]]
  kind = "method"
  name = "Add"
  parameters = ["`0"]

  [[types.members]]
  kind = "method"
  name = "Clear"

[[types]]
name = "Demo.NamedList`1"
generic_params = ["TItem"]
base = "Demo.BaseList{`0}"

  [[types.members]]
  kind = "method"
  name = "Add"
  parameters = ["`0"]

  [[types.members]]
  kind = "method"
  name = "Remove"
  parameters = ["`0"]

[[types]]
name = "Demo.IntList"
base = "Demo.BaseList{System.Int32}"

  [[types.members]]
  kind = "method"
  name = "Add"
  parameters = ["System.Int32"]

  [[types.members]]
  kind = "method"
  name = "Add"
  parameters = ["System.String"]

[[types]]
name = "Demo.Sealed"
base = "Demo.NamedList{System.String}"

  [[types.members]]
  kind = "method"
  name = "Clear"
"#;

/// Load the fixture catalog.
pub fn fixture() -> Catalog {
    return Catalog::from_toml(FIXTURE).unwrap();
}

/// The `nth` member of `type_name` whose metadata name is `member_name`.
pub fn member(catalog: &Catalog, type_name: &str, member_name: &str, nth: usize) -> MemberId {
    let ty = catalog.lookup_type_by_name(type_name, 0).unwrap();
    return *catalog.members_by_name(ty, member_name).get(nth).unwrap();
}

/// `TypeRef::Named` for a type's full metadata name.
pub fn named(catalog: &Catalog, type_name: &str) -> TypeRef {
    return TypeRef::Named(catalog.lookup_type_by_name(type_name, 0).unwrap());
}
