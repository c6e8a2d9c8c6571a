//! Constant pool for one compilation unit.
//!
//! Scalars are deduplicated by value (to shrink the pack), callables by name
//! (same name = same callable slot). Every collection keeps insertion order,
//! which is the order the encoder writes and indexes them in.

use core::fmt;

use indexmap::{IndexMap, IndexSet};
use tracing::trace;

use crate::constant::{Constant, ExternalFunction, Function, FunctionDeclaration, TypeRef};
use crate::error::{DeclarationKind, PackError, PackResult};

/// Accumulates the constants and functions of one compilation unit.
#[derive(Debug, Clone, Default)]
pub struct ConstantRepo {
    strings: IndexSet<String>,
    resource_names: IndexSet<String>,
    integers: IndexSet<i32>,
    booleans: IndexSet<bool>,
    external_functions: IndexMap<String, ExternalFunction>,
    function_declarations: IndexMap<String, FunctionDeclaration>,
    functions: Vec<Function>,
}

impl ConstantRepo {
    /// Empty pool.
    pub fn new() -> Self { Self::default() }

    /* ───────────── scalars ───────────── */

    /// Pools a string literal.
    pub fn add_string(&mut self, value: impl Into<String>) -> Constant {
        let value = value.into();
        if !self.strings.contains(&value) {
            self.strings.insert(value.clone());
        }
        Constant::String(value)
    }

    /// Pools a resource name.
    pub fn add_resource_name(&mut self, value: impl Into<String>) -> Constant {
        let value = value.into();
        if !self.resource_names.contains(&value) {
            self.resource_names.insert(value.clone());
        }
        Constant::ResourceName(value)
    }

    /// Pools an integer.
    pub fn add_integer(&mut self, value: i32) -> Constant {
        self.integers.insert(value);
        Constant::Integer(value)
    }

    /// Pools a boolean.
    pub fn add_boolean(&mut self, value: bool) -> Constant {
        self.booleans.insert(value);
        Constant::Boolean(value)
    }

    /* ───────────── callables ───────────── */

    /// Registers an external function. First registration of a name wins: a
    /// later call with the same name returns the original, whatever its
    /// parameter count.
    pub fn add_external_function(&mut self, name: impl Into<String>, parameter_count: u8) -> Constant {
        let name = name.into();
        if !self.external_functions.contains_key(&name) {
            trace!(%name, parameter_count, "register external function");
            self.external_functions.insert(name.clone(), ExternalFunction::new(name.clone(), parameter_count));
        }
        Constant::ExternalFunction(name)
    }

    /// Registers a function declaration. Same first-wins policy as
    /// [`Self::add_external_function`].
    pub fn add_function_declaration(
        &mut self,
        name: impl Into<String>,
        signature: TypeRef,
        parameter_count: u8,
    ) -> Constant {
        let name = name.into();
        if !self.function_declarations.contains_key(&name) {
            trace!(%name, %signature, parameter_count, "register function declaration");
            self.function_declarations
                .insert(name.clone(), FunctionDeclaration::new(name.clone(), signature, parameter_count));
        }
        Constant::FunctionDeclaration(name)
    }

    /// Resolves a call site to a declared function. The declaration must come first.
    pub fn add_function_reference(&self, name: &str) -> PackResult<Constant> {
        self.find_function_declaration(name).ok_or_else(|| PackError::DeclarationNotFound {
            kind: DeclarationKind::Function,
            name: name.to_owned(),
        })
    }

    /// Resolves a call site to a registered external function.
    pub fn add_external_function_reference(&self, name: &str) -> PackResult<Constant> {
        self.find_external_function(name).ok_or_else(|| PackError::DeclarationNotFound {
            kind: DeclarationKind::ExternalFunction,
            name: name.to_owned(),
        })
    }

    /// Appends a compiled function.
    ///
    /// `constants` is the function's local constant table. Each entry should
    /// come from this pool; one that does not has no file index and makes the
    /// encode fail with [`crate::InvariantViolation::UnresolvedConstant`].
    pub fn add_function(
        &mut self,
        name: impl Into<String>,
        signature: TypeRef,
        parameter_count: u8,
        variable_count: u8,
        constants: Vec<Constant>,
        opcodes: Vec<u8>,
    ) -> &Function {
        let function = Function { name: name.into(), signature, parameter_count, variable_count, constants, opcodes };
        trace!(%function, "add function");
        self.functions.push(function);
        &self.functions[self.functions.len() - 1]
    }

    /* ───────────── lookups ───────────── */

    /// External function constant registered under `name`.
    pub fn find_external_function(&self, name: &str) -> Option<Constant> {
        self.external_functions.get_key_value(name).map(|(k, _)| Constant::ExternalFunction(k.clone()))
    }

    /// Declaration constant registered under `name`.
    pub fn find_function_declaration(&self, name: &str) -> Option<Constant> {
        self.function_declarations.get_key_value(name).map(|(k, _)| Constant::FunctionDeclaration(k.clone()))
    }

    /// Declaration constant at `index` in the declaration pool.
    pub fn find_function_declaration_by_index(&self, index: usize) -> Option<Constant> {
        self.function_declarations.get_index(index).map(|(k, _)| Constant::FunctionDeclaration(k.clone()))
    }

    /// Whether `constant` is an entry of this pool.
    pub fn contains(&self, constant: &Constant) -> bool {
        match constant {
            Constant::String(s) => self.strings.contains(s),
            Constant::ResourceName(s) => self.resource_names.contains(s),
            Constant::Integer(v) => self.integers.contains(v),
            Constant::Boolean(b) => self.booleans.contains(b),
            Constant::ExternalFunction(name) => self.external_functions.contains_key(name),
            Constant::FunctionDeclaration(name) => self.function_declarations.contains_key(name),
        }
    }

    /* ───────────── read access (encoder side) ───────────── */

    /// Strings, in pool order.
    pub fn strings(&self) -> impl ExactSizeIterator<Item = &String> + '_ { self.strings.iter() }
    /// Resource names, in pool order.
    pub fn resource_names(&self) -> impl ExactSizeIterator<Item = &String> + '_ { self.resource_names.iter() }
    /// Integers, in pool order.
    pub fn integers(&self) -> impl ExactSizeIterator<Item = &i32> + '_ { self.integers.iter() }
    /// Booleans, in pool order.
    pub fn booleans(&self) -> impl ExactSizeIterator<Item = &bool> + '_ { self.booleans.iter() }
    /// External functions, in pool order.
    pub fn external_functions(&self) -> impl ExactSizeIterator<Item = &ExternalFunction> + '_ {
        self.external_functions.values()
    }
    /// Function declarations, in pool order.
    pub fn function_declarations(&self) -> impl ExactSizeIterator<Item = &FunctionDeclaration> + '_ {
        self.function_declarations.values()
    }
    /// Functions, in insertion order.
    pub fn functions(&self) -> &[Function] { &self.functions }

    /// Number of pooled constants over all six kinds (functions excluded).
    pub fn constant_count(&self) -> usize {
        self.strings.len()
            + self.resource_names.len()
            + self.integers.len()
            + self.booleans.len()
            + self.external_functions.len()
            + self.function_declarations.len()
    }

    /// No constants and no functions.
    pub fn is_empty(&self) -> bool { self.constant_count() == 0 && self.functions.is_empty() }
}

impl fmt::Display for ConstantRepo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for e in self.external_functions() {
            writeln!(f, "{e}")?;
        }
        for d in self.function_declarations() {
            writeln!(f, "{d}")?;
        }
        writeln!(f, "booleans: {:?}", self.booleans)?;
        writeln!(f, "integers: {:?}", self.integers)?;
        writeln!(f, "strings: {:?}", self.strings)?;
        writeln!(f, "resource names: {:?}", self.resource_names)?;
        for func in &self.functions {
            writeln!(f, "{func}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn integers_are_deduplicated_by_value() {
        let mut repo = ConstantRepo::new();
        let a = repo.add_integer(5);
        repo.add_integer(7);
        let b = repo.add_integer(5);
        assert_eq!(a, b);
        assert_eq!(repo.integers().copied().collect::<Vec<_>>(), vec![5, 7]);
    }

    #[test]
    fn strings_and_resource_names_are_separate_pools() {
        let mut repo = ConstantRepo::new();
        let s = repo.add_string("player.png");
        let r = repo.add_resource_name("player.png");
        assert_ne!(s, r);
        repo.add_string("player.png");
        assert_eq!(repo.strings().len(), 1);
        assert_eq!(repo.resource_names().len(), 1);
    }

    #[test]
    fn booleans_hold_at_most_two_entries() {
        let mut repo = ConstantRepo::new();
        for b in [true, false, true, false, false] {
            repo.add_boolean(b);
        }
        assert_eq!(repo.booleans().copied().collect::<Vec<_>>(), vec![true, false]);
    }

    #[test]
    fn external_function_first_registration_wins() {
        let mut repo = ConstantRepo::new();
        let first = repo.add_external_function("coreListMap", 4);
        let second = repo.add_external_function("coreListMap", 2);
        assert_eq!(first, second);
        let only: Vec<_> = repo.external_functions().collect();
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].parameter_count, 4);
    }

    #[test]
    fn declaration_first_registration_wins() {
        let mut repo = ConstantRepo::new();
        repo.add_function_declaration("f", TypeRef(1), 1);
        repo.add_function_declaration("f", TypeRef(9), 3);
        let decl = repo.function_declarations().next().cloned();
        assert_eq!(decl, Some(FunctionDeclaration::new("f", TypeRef(1), 1)));
    }

    #[test]
    fn reference_requires_prior_declaration() {
        let mut repo = ConstantRepo::new();
        let err = repo.add_function_reference("f").unwrap_err();
        assert!(matches!(err, PackError::DeclarationNotFound { kind: DeclarationKind::Function, ref name } if name == "f"));
        assert!(!err.is_fatal());

        let declared = repo.add_function_declaration("f", TypeRef(0), 0);
        assert_eq!(repo.add_function_reference("f").unwrap(), declared);
    }

    #[test]
    fn external_reference_requires_prior_registration() {
        let mut repo = ConstantRepo::new();
        assert!(repo.add_external_function_reference("print").is_err());
        // a declaration of the same name does not count
        repo.add_function_declaration("print", TypeRef(0), 1);
        assert!(repo.add_external_function_reference("print").is_err());
        let ext = repo.add_external_function("print", 1);
        assert_eq!(repo.add_external_function_reference("print").unwrap(), ext);
    }

    #[test]
    fn declaration_by_index_is_positional() {
        let mut repo = ConstantRepo::new();
        repo.add_function_declaration("a", TypeRef(0), 0);
        repo.add_function_declaration("b", TypeRef(0), 0);
        assert_eq!(repo.find_function_declaration_by_index(1), Some(Constant::FunctionDeclaration("b".into())));
        assert_eq!(repo.find_function_declaration_by_index(2), None);
    }

    #[test]
    fn contains_and_counts() {
        let mut repo = ConstantRepo::new();
        assert!(repo.is_empty());
        repo.add_string("x");
        repo.add_integer(1);
        repo.add_external_function("e", 0);
        assert_eq!(repo.constant_count(), 3);
        assert!(repo.contains(&Constant::Integer(1)));
        assert!(!repo.contains(&Constant::Integer(2)));
        assert!(!repo.contains(&Constant::FunctionDeclaration("e".into())));
        assert!(!repo.is_empty());
    }

    #[test]
    fn add_function_keeps_order_and_table() {
        let mut repo = ConstantRepo::new();
        let one = repo.add_integer(1);
        let f = repo.add_function("main", TypeRef(3), 0, 1, vec![one.clone(), one], vec![0x01]);
        assert_eq!(f.constants.len(), 2);
        repo.add_function("other", TypeRef(3), 0, 0, Vec::new(), Vec::new());
        let names: Vec<_> = repo.functions().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["main", "other"]);
    }
}
