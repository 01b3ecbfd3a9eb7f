//! Lexical scopes.
//!
//! A scope holds its own bindings and a link to its parent. Parents never
//! hold their children; whoever creates a child scope owns it.

use crate::error::SandboxResult;
use crate::native::{NativeFunction, NativeValue};
use crate::synthetic::Synthetic;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, error, info, warn};

struct Scope {
    parent: Option<SymbolTable>,
    bindings: RefCell<BTreeMap<String, Synthetic>>,
}

/// Shared handle to a scope
#[derive(Clone)]
pub struct SymbolTable(Rc<Scope>);

impl SymbolTable {
    pub fn new() -> Self {
        Self::with_parent(None)
    }

    fn with_parent(parent: Option<SymbolTable>) -> Self {
        SymbolTable(Rc::new(Scope {
            parent,
            bindings: RefCell::new(BTreeMap::new()),
        }))
    }

    /// Root scope with the host globals defined
    pub fn with_globals() -> Self {
        let table = Self::new();
        table.define_constant("NaN", NativeValue::Number(f64::NAN));
        table.define_constant("Infinity", NativeValue::Number(f64::INFINITY));
        table.define_constant("undefined", NativeValue::Undefined);
        table.define_constant("console", console());
        table
    }

    pub fn create_child(&self) -> SymbolTable {
        Self::with_parent(Some(self.clone()))
    }

    pub fn parent(&self) -> Option<&SymbolTable> {
        self.0.parent.as_ref()
    }

    pub(crate) fn addr(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }

    pub fn ptr_eq(&self, other: &SymbolTable) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn has_own(&self, name: &str) -> bool {
        self.0.bindings.borrow().contains_key(name)
    }

    /// Nearest enclosing binding, or `undefined`
    pub fn get(&self, name: &str) -> Synthetic {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(value) = current.0.bindings.borrow().get(name) {
                return value.clone();
            }
            scope = current.parent();
        }
        Synthetic::undefined()
    }

    /// Nearest scope that declares `name`, or this scope when none does
    pub fn get_owner(&self, name: &str) -> SymbolTable {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if current.has_own(name) {
                return current.clone();
            }
            scope = current.parent();
        }
        self.clone()
    }

    /// Assign to the binding in the owning scope
    pub fn set(&self, name: &str, value: impl Into<Synthetic>) -> SandboxResult<()> {
        let owner = self.get_owner(name);
        let mut bindings = owner.0.bindings.borrow_mut();
        if !bindings.contains_key(name) {
            warn!(name, "assignment to undeclared name, defining locally");
        }
        bindings.insert(name.to_string(), value.into());
        Ok(())
    }

    /// Bind in this scope, shadowing any parent binding
    pub fn define_variable(&self, name: &str, value: Option<Synthetic>) {
        self.define(name, value.unwrap_or_else(Synthetic::undefined), "variable");
    }

    /// Bind in this scope. Assignment treats it like any other binding.
    pub fn define_constant(&self, name: &str, value: impl Into<Synthetic>) {
        self.define(name, value.into(), "constant");
    }

    fn define(&self, name: &str, value: Synthetic, declaration: &str) {
        debug!(name, declaration, "define");
        self.0.bindings.borrow_mut().insert(name.to_string(), value);
    }

    pub(crate) fn own_binding(&self, name: &str) -> Option<Synthetic> {
        self.0.bindings.borrow().get(name).cloned()
    }

    /// Snapshot of this scope's own bindings
    pub fn own_bindings(&self) -> Vec<(String, Synthetic)> {
        self.0
            .bindings
            .borrow()
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// Overwrite or add an own binding
    pub(crate) fn replace_binding(&self, name: &str, value: Synthetic) {
        self.0.bindings.borrow_mut().insert(name.to_string(), value);
    }

    /// Own bindings lowered to a host object
    pub fn to_native(&self) -> NativeValue {
        Synthetic::SymbolTable(self.clone()).to_native()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymbolTable")
            .field("bindings", &self.0.bindings.borrow().keys().collect::<Vec<_>>())
            .field("has_parent", &self.0.parent.is_some())
            .finish()
    }
}

fn console() -> NativeValue {
    fn join(args: &[NativeValue]) -> String {
        args.iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }

    NativeValue::object([
        (
            "log",
            NativeValue::Function(NativeFunction::new("log", |_, args| {
                info!(target: "tandem::console", "{}", join(&args));
                Ok(NativeValue::Undefined)
            })),
        ),
        (
            "warn",
            NativeValue::Function(NativeFunction::new("warn", |_, args| {
                warn!(target: "tandem::console", "{}", join(&args));
                Ok(NativeValue::Undefined)
            })),
        ),
        (
            "error",
            NativeValue::Function(NativeFunction::new("error", |_, args| {
                error!(target: "tandem::console", "{}", join(&args));
                Ok(NativeValue::Undefined)
            })),
        ),
    ])
}
