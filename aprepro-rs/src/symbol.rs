//! The symbol table.
//!
//! One flat, case-sensitive namespace holds variables and functions alike.
//! A name maps to at most one live [`Symbol`].
//!
//! | Operation | Non-function kinds | Function kinds |
//! |-----------|--------------------|----------------|
//! | [`SymbolTable::put`] on a new name | creates | creates |
//! | [`SymbolTable::put`] on an existing name | `DuplicateDefinition` | same return kind: returns existing, else `OverloadTypeMismatch` |
//! | [`SymbolTable::erase`] | removes, releases an array payload | removes |

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::array::{ArrayHandle, ArrayRegistry};
use crate::error::{Category, EvalError, SymbolError};
use crate::script::interp::Engine;
use crate::script::value::Value;

/// Native implementation of a function symbol.  Receives the name it was
/// called under, so one body can serve several names.
pub type Builtin = fn(&mut Engine, &str, &[Value]) -> Result<Value, EvalError>;

// ── SymbolKind ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Variable,
    StringVariable,
    ArrayVariable,
    ImmutableVariable,
    ImmutableStringVariable,
    UndefinedVariable,
    Function,
    StringFunction,
    ArrayFunction,
}

impl SymbolKind {
    pub fn is_function(self) -> bool {
        matches!(
            self,
            SymbolKind::Function | SymbolKind::StringFunction | SymbolKind::ArrayFunction
        )
    }

    pub fn is_immutable(self) -> bool {
        matches!(
            self,
            SymbolKind::ImmutableVariable | SymbolKind::ImmutableStringVariable
        )
    }

    /// Scalar, string and array variables, mutable or not.  Undefined
    /// placeholders are not listed.
    pub fn is_listed_variable(self) -> bool {
        matches!(
            self,
            SymbolKind::Variable
                | SymbolKind::StringVariable
                | SymbolKind::ArrayVariable
                | SymbolKind::ImmutableVariable
                | SymbolKind::ImmutableStringVariable
        )
    }

    /// Kinds a user may delete with `remove_variable`.
    pub fn is_removable(self) -> bool {
        self.is_listed_variable() || self == SymbolKind::UndefinedVariable
    }

    /// Category of the value this symbol yields (or returns, for functions).
    pub fn category(self) -> Category {
        match self {
            SymbolKind::Variable
            | SymbolKind::ImmutableVariable
            | SymbolKind::UndefinedVariable
            | SymbolKind::Function => Category::Scalar,
            SymbolKind::StringVariable
            | SymbolKind::ImmutableStringVariable
            | SymbolKind::StringFunction => Category::Text,
            SymbolKind::ArrayVariable | SymbolKind::ArrayFunction => Category::Array,
        }
    }

    /// Variable kind holding `category`, mutable or not.
    pub fn variable_for(category: Category, immutable: bool) -> SymbolKind {
        match (category, immutable) {
            (Category::Scalar, false) => SymbolKind::Variable,
            (Category::Scalar, true) => SymbolKind::ImmutableVariable,
            (Category::Text, false) => SymbolKind::StringVariable,
            (Category::Text, true) => SymbolKind::ImmutableStringVariable,
            // Arrays have no immutable flavour.
            (Category::Array, _) => SymbolKind::ArrayVariable,
        }
    }

    /// Function kind returning `category`.
    pub fn function_for(category: Category) -> SymbolKind {
        match category {
            Category::Scalar => SymbolKind::Function,
            Category::Text => SymbolKind::StringFunction,
            Category::Array => SymbolKind::ArrayFunction,
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SymbolKind::Variable => "variable",
            SymbolKind::StringVariable => "string variable",
            SymbolKind::ArrayVariable => "array variable",
            SymbolKind::ImmutableVariable => "immutable variable",
            SymbolKind::ImmutableStringVariable => "immutable string variable",
            SymbolKind::UndefinedVariable => "undefined variable",
            SymbolKind::Function => "function",
            SymbolKind::StringFunction => "string function",
            SymbolKind::ArrayFunction => "array function",
        })
    }
}

// ── Symbol ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub value: Value,
    /// Body of a function symbol; `None` for variables.
    pub func: Option<Builtin>,
    /// Predefined by the engine rather than the user.
    pub is_internal: bool,
    /// Call syntax shown by `DUMP_FUNC()`, e.g. `atan2(y,x)`.
    pub syntax: String,
    pub info: String,
}

impl Symbol {
    fn new(name: &str, kind: SymbolKind, is_internal: bool) -> Self {
        Symbol {
            name: name.to_owned(),
            kind,
            value: Value::default(),
            func: None,
            is_internal,
            syntax: name.to_owned(),
            info: "UNDEFINED".to_owned(),
        }
    }
}

// ── SymbolTable ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: HashMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a symbol, or return the existing one for a compatible function
    /// overload.
    pub fn put(
        &mut self,
        name: &str,
        kind: SymbolKind,
        is_internal: bool,
    ) -> Result<&mut Symbol, SymbolError> {
        match self.symbols.entry(name.to_owned()) {
            Entry::Occupied(entry) => {
                if !kind.is_function() {
                    return Err(SymbolError::DuplicateDefinition(name.to_owned()));
                }
                if entry.get().kind != kind {
                    return Err(SymbolError::OverloadTypeMismatch(name.to_owned()));
                }
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => {
                tracing::trace!(name, %kind, "symbol created");
                Ok(entry.insert(Symbol::new(name, kind, is_internal)))
            }
        }
    }

    /// Register (or overload) a function.  A later registration under the same
    /// name and return kind replaces the body and documentation.
    pub fn define_function(
        &mut self,
        name: &str,
        kind: SymbolKind,
        func: Builtin,
        syntax: &str,
        info: &str,
    ) -> Result<&mut Symbol, SymbolError> {
        debug_assert!(kind.is_function());
        let sym = self.put(name, kind, true)?;
        sym.func = Some(func);
        sym.syntax = syntax.to_owned();
        sym.info = info.to_owned();
        Ok(sym)
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        self.symbols.get_mut(name)
    }

    /// Remove `name`, releasing an array payload from `arrays` first.
    pub fn erase(&mut self, name: &str, arrays: &mut ArrayRegistry) -> Result<(), SymbolError> {
        let sym = self
            .symbols
            .remove(name)
            .ok_or_else(|| SymbolError::NotFound(name.to_owned()))?;
        if let Value::Array(h) = sym.value {
            arrays.redefine_array(h);
        }
        tracing::trace!(name, "symbol erased");
        Ok(())
    }

    /// Change the kind of an existing symbol in place.
    pub fn rename_type(&mut self, name: &str, kind: SymbolKind) -> Result<(), SymbolError> {
        let sym = self
            .symbols
            .get_mut(name)
            .ok_or_else(|| SymbolError::NotFound(name.to_owned()))?;
        if sym.kind != kind {
            tracing::trace!(name, from = %sym.kind, to = %kind, "symbol kind changed");
            sym.kind = kind;
        }
        Ok(())
    }

    /// Names of scalar, string and array variables.  Internal symbols are
    /// skipped unless `include_internal` is set.  Order is unspecified.
    pub fn enumerate(&self, include_internal: bool) -> impl Iterator<Item = &str> + '_ {
        self.symbols
            .values()
            .filter(move |s| s.kind.is_listed_variable() && (include_internal || !s.is_internal))
            .map(|s| s.name.as_str())
    }

    /// Iterate over every symbol.
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }

    /// Array handles currently owned by a symbol.
    pub fn owned_arrays(&self) -> HashSet<ArrayHandle> {
        self.symbols
            .values()
            .filter_map(|s| match s.value {
                Value::Array(h) => Some(h),
                _ => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.symbols.clear();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn one(_: &mut Engine, _: &str, _: &[Value]) -> Result<Value, EvalError> {
        Ok(Value::Scalar(1.0))
    }

    fn two(_: &mut Engine, _: &str, _: &[Value]) -> Result<Value, EvalError> {
        Ok(Value::Scalar(2.0))
    }

    #[test]
    fn put_and_get() {
        let mut t = SymbolTable::new();
        t.put("x", SymbolKind::Variable, false).unwrap().value = Value::Scalar(3.0);
        let s = t.get("x").unwrap();
        assert_eq!(s.value, Value::Scalar(3.0));
        assert_eq!(s.syntax, "x");
        assert_eq!(s.info, "UNDEFINED");
        assert!(t.get("X").is_none());
    }

    #[test]
    fn duplicate_variable_is_error() {
        let mut t = SymbolTable::new();
        t.put("x", SymbolKind::Variable, false).unwrap();
        assert_eq!(
            t.put("x", SymbolKind::StringVariable, false).unwrap_err(),
            SymbolError::DuplicateDefinition("x".into())
        );
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn overload_same_kind_keeps_one_entry_with_latest_docs() {
        let mut t = SymbolTable::new();
        t.define_function("f", SymbolKind::Function, one, "f(x)", "first")
            .unwrap();
        t.define_function("f", SymbolKind::Function, two, "f(x,y)", "second")
            .unwrap();
        assert_eq!(t.len(), 1);
        let s = t.get("f").unwrap();
        assert_eq!(s.syntax, "f(x,y)");
        assert_eq!(s.info, "second");
        assert!(s.func.is_some());
    }

    #[test]
    fn overload_other_kind_is_error_and_keeps_first() {
        let mut t = SymbolTable::new();
        t.define_function("f", SymbolKind::Function, one, "f(x)", "first")
            .unwrap();
        let err = t
            .define_function("f", SymbolKind::StringFunction, two, "f(s)", "second")
            .unwrap_err();
        assert_eq!(err, SymbolError::OverloadTypeMismatch("f".into()));
        let s = t.get("f").unwrap();
        assert_eq!(s.kind, SymbolKind::Function);
        assert_eq!(s.info, "first");
    }

    #[test]
    fn function_over_variable_is_mismatch() {
        let mut t = SymbolTable::new();
        t.put("g", SymbolKind::Variable, false).unwrap();
        assert!(matches!(
            t.put("g", SymbolKind::Function, true),
            Err(SymbolError::OverloadTypeMismatch(_))
        ));
    }

    #[test]
    fn erase_releases_array() {
        let mut t = SymbolTable::new();
        let mut arrays = ArrayRegistry::new();
        let h = arrays.make_array(2, 2);
        t.put("a", SymbolKind::ArrayVariable, false).unwrap().value = Value::Array(h);
        t.erase("a", &mut arrays).unwrap();
        assert!(t.get("a").is_none());
        assert!(arrays.is_empty());
        assert_eq!(arrays.release_count(), 1);
    }

    #[test]
    fn erase_unknown_is_not_found() {
        let mut t = SymbolTable::new();
        let mut arrays = ArrayRegistry::new();
        assert_eq!(
            t.erase("nope", &mut arrays),
            Err(SymbolError::NotFound("nope".into()))
        );
    }

    #[test]
    fn rename_type_in_place() {
        let mut t = SymbolTable::new();
        t.put("s", SymbolKind::StringVariable, false).unwrap().value = Value::from("v");
        t.rename_type("s", SymbolKind::ImmutableStringVariable).unwrap();
        let s = t.get("s").unwrap();
        assert_eq!(s.kind, SymbolKind::ImmutableStringVariable);
        assert_eq!(s.value, Value::from("v"));
    }

    #[test]
    fn enumerate_skips_functions_and_internal() {
        let mut t = SymbolTable::new();
        t.put("a", SymbolKind::Variable, false).unwrap();
        t.put("b", SymbolKind::ImmutableStringVariable, false).unwrap();
        t.put("PI", SymbolKind::ImmutableVariable, true).unwrap();
        t.put("u", SymbolKind::UndefinedVariable, false).unwrap();
        t.define_function("f", SymbolKind::Function, one, "f()", "").unwrap();

        let mut names: Vec<&str> = t.enumerate(false).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["a", "b"]);

        let mut names: Vec<&str> = t.enumerate(true).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["PI", "a", "b"]);
    }

    #[test]
    fn kind_categories() {
        assert_eq!(SymbolKind::ArrayFunction.category(), Category::Array);
        assert_eq!(SymbolKind::UndefinedVariable.category(), Category::Scalar);
        assert_eq!(
            SymbolKind::variable_for(Category::Text, true),
            SymbolKind::ImmutableStringVariable
        );
        assert!(SymbolKind::UndefinedVariable.is_removable());
        assert!(!SymbolKind::Function.is_removable());
    }
}
