//! Synthetic values: shared, patchable wrappers around host values.
//!
//! Cloning a [`Synthetic`] clones the handle, not the value. Mutations through
//! `set` and `patch` are visible to every holder of the same handle.

use crate::error::{SandboxError, SandboxResult};
use crate::native::{NativeFunction, NativeValue};
use crate::symbol_table::SymbolTable;
use serde::{Serialize, Serializer};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::rc::Rc;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SyntheticKind {
    Native,
    Array,
    Object,
    Function,
    SymbolTable,
}

impl fmt::Display for SyntheticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyntheticKind::Native => "native value",
            SyntheticKind::Array => "array",
            SyntheticKind::Object => "object",
            SyntheticKind::Function => "function",
            SyntheticKind::SymbolTable => "symbol table",
        };
        f.write_str(name)
    }
}

#[derive(Clone)]
pub enum Synthetic {
    /// Scalar host value
    Native(Rc<RefCell<NativeValue>>),
    Array(Rc<RefCell<Vec<Synthetic>>>),
    Object(Rc<RefCell<BTreeMap<String, Synthetic>>>),
    Function(Rc<RefCell<NativeFunction>>),
    SymbolTable(SymbolTable),
}

impl Synthetic {
    /// Lift a host value. Lifting a `Synthetic` returns it unchanged.
    pub fn from_native(value: impl Into<Synthetic>) -> Self {
        value.into()
    }

    pub fn undefined() -> Self {
        Synthetic::native(NativeValue::Undefined)
    }

    pub fn native(value: NativeValue) -> Self {
        Synthetic::Native(Rc::new(RefCell::new(value)))
    }

    pub fn array(items: Vec<Synthetic>) -> Self {
        Synthetic::Array(Rc::new(RefCell::new(items)))
    }

    pub fn object(entries: BTreeMap<String, Synthetic>) -> Self {
        Synthetic::Object(Rc::new(RefCell::new(entries)))
    }

    pub fn function(function: NativeFunction) -> Self {
        Synthetic::Function(Rc::new(RefCell::new(function)))
    }

    pub fn kind(&self) -> SyntheticKind {
        match self {
            Synthetic::Native(_) => SyntheticKind::Native,
            Synthetic::Array(_) => SyntheticKind::Array,
            Synthetic::Object(_) => SyntheticKind::Object,
            Synthetic::Function(_) => SyntheticKind::Function,
            Synthetic::SymbolTable(_) => SyntheticKind::SymbolTable,
        }
    }

    /// Same kind, so `patch` can merge in place
    pub fn is_compatible(&self, other: &Synthetic) -> bool {
        self.kind() == other.kind()
    }

    fn addr(&self) -> *const () {
        match self {
            Synthetic::Native(value) => Rc::as_ptr(value) as *const (),
            Synthetic::Array(items) => Rc::as_ptr(items) as *const (),
            Synthetic::Object(entries) => Rc::as_ptr(entries) as *const (),
            Synthetic::Function(function) => Rc::as_ptr(function) as *const (),
            Synthetic::SymbolTable(table) => table.addr(),
        }
    }

    /// Same underlying value
    pub fn ptr_eq(&self, other: &Synthetic) -> bool {
        std::ptr::eq(self.addr(), other.addr())
    }

    /// Property lookup. Missing properties are `undefined`, never an error.
    pub fn get(&self, name: &str) -> Synthetic {
        match self {
            Synthetic::Native(value) => match (&*value.borrow(), name) {
                (NativeValue::String(text), "length") => {
                    Synthetic::native(NativeValue::Number(text.chars().count() as f64))
                }
                (NativeValue::Object(entries), _) => entries
                    .get(name)
                    .cloned()
                    .map(Synthetic::from)
                    .unwrap_or_else(Synthetic::undefined),
                _ => Synthetic::undefined(),
            },
            Synthetic::Array(items) => {
                let items = items.borrow();
                if name == "length" {
                    return Synthetic::native(NativeValue::Number(items.len() as f64));
                }
                name.parse::<usize>()
                    .ok()
                    .and_then(|index| items.get(index).cloned())
                    .unwrap_or_else(Synthetic::undefined)
            }
            Synthetic::Object(entries) => entries
                .borrow()
                .get(name)
                .cloned()
                .unwrap_or_else(Synthetic::undefined),
            Synthetic::Function(function) => match name {
                "name" => Synthetic::native(NativeValue::String(function.borrow().name().to_string())),
                _ => Synthetic::undefined(),
            },
            Synthetic::SymbolTable(table) => table.get(name),
        }
    }

    pub fn set(&self, name: &str, value: impl Into<Synthetic>) -> SandboxResult<()> {
        let value = value.into();
        match self {
            Synthetic::Object(entries) => {
                entries.borrow_mut().insert(name.to_string(), value);
                Ok(())
            }
            Synthetic::Array(items) => {
                let index = name.parse::<usize>().map_err(|_| SandboxError::NotAnObject {
                    kind: SyntheticKind::Array,
                    name: name.to_string(),
                })?;
                let mut items = items.borrow_mut();
                if index >= items.len() {
                    items.resize_with(index + 1, Synthetic::undefined);
                }
                items[index] = value;
                Ok(())
            }
            Synthetic::Native(native) => {
                let lowered = value.to_native();
                let mut native = native.borrow_mut();
                match &mut *native {
                    NativeValue::Object(entries) => {
                        entries.insert(name.to_string(), lowered);
                        Ok(())
                    }
                    _ => Err(SandboxError::NotAnObject {
                        kind: SyntheticKind::Native,
                        name: name.to_string(),
                    }),
                }
            }
            Synthetic::Function(_) => Err(SandboxError::NotAnObject {
                kind: SyntheticKind::Function,
                name: name.to_string(),
            }),
            Synthetic::SymbolTable(table) => table.set(name, value),
        }
    }

    /// Merge `other` into this value in place.
    ///
    /// Scalars and functions take `other`'s value. Arrays are patched by
    /// position and take `other`'s length. Objects and symbol tables patch
    /// compatible keys recursively, replace incompatible ones, adopt new ones,
    /// and keep keys that `other` lacks.
    #[instrument(level = "trace", skip_all, fields(kind = %self.kind()))]
    pub fn patch(&self, other: &Synthetic) -> SandboxResult<()> {
        self.patch_with(other, &mut HashSet::new())
    }

    fn patch_with(
        &self,
        other: &Synthetic,
        visited: &mut HashSet<(*const (), *const ())>,
    ) -> SandboxResult<()> {
        if self.ptr_eq(other) || !visited.insert((self.addr(), other.addr())) {
            return Ok(());
        }

        match (self, other) {
            (Synthetic::Native(target), Synthetic::Native(source)) => {
                let value = source.borrow().clone();
                *target.borrow_mut() = value;
            }
            (Synthetic::Function(target), Synthetic::Function(source)) => {
                let function = source.borrow().clone();
                *target.borrow_mut() = function;
            }
            (Synthetic::Array(target), Synthetic::Array(source)) => {
                let incoming = source.borrow().clone();
                let existing = target.borrow().clone();
                let mut merged = Vec::with_capacity(incoming.len());
                for (index, item) in incoming.into_iter().enumerate() {
                    match existing.get(index) {
                        Some(current) if current.is_compatible(&item) => {
                            current.patch_with(&item, visited)?;
                            merged.push(current.clone());
                        }
                        _ => merged.push(item),
                    }
                }
                *target.borrow_mut() = merged;
            }
            (Synthetic::Object(target), Synthetic::Object(source)) => {
                let incoming = source.borrow().clone();
                for (key, value) in incoming {
                    let existing = target.borrow().get(&key).cloned();
                    match existing {
                        Some(current) if current.is_compatible(&value) => {
                            current.patch_with(&value, visited)?;
                        }
                        _ => {
                            target.borrow_mut().insert(key, value);
                        }
                    }
                }
            }
            (Synthetic::SymbolTable(target), Synthetic::SymbolTable(source)) => {
                for (key, value) in source.own_bindings() {
                    match target.own_binding(&key) {
                        Some(current) if current.is_compatible(&value) => {
                            current.patch_with(&value, visited)?;
                        }
                        _ => target.replace_binding(&key, value),
                    }
                }
            }
            _ => {
                return Err(SandboxError::IncompatiblePatch {
                    expected: self.kind(),
                    found: other.kind(),
                })
            }
        }
        Ok(())
    }

    /// Lower to a host value. Functions lower to callables that route back
    /// through [`Synthetic::apply`]; cycles lower to `undefined`.
    pub fn to_native(&self) -> NativeValue {
        self.lower(&mut Vec::new())
    }

    fn lower(&self, stack: &mut Vec<*const ()>) -> NativeValue {
        let addr = self.addr();
        if stack.contains(&addr) {
            debug!(kind = %self.kind(), "cycle while lowering");
            return NativeValue::Undefined;
        }
        stack.push(addr);

        let value = match self {
            Synthetic::Native(value) => value.borrow().clone(),
            Synthetic::Array(items) => {
                let items = items.borrow().clone();
                NativeValue::Array(items.iter().map(|item| item.lower(stack)).collect())
            }
            Synthetic::Object(entries) => {
                let entries = entries.borrow().clone();
                NativeValue::Object(
                    entries
                        .iter()
                        .map(|(key, value)| (key.clone(), value.lower(stack)))
                        .collect(),
                )
            }
            Synthetic::SymbolTable(table) => NativeValue::Object(
                table
                    .own_bindings()
                    .iter()
                    .map(|(key, value)| (key.clone(), value.lower(stack)))
                    .collect(),
            ),
            Synthetic::Function(function) => {
                let name = function.borrow().name().to_string();
                let target = self.clone();
                NativeValue::Function(NativeFunction::new_async(name, move |this, args| {
                    let target = target.clone();
                    async move {
                        let this = Synthetic::from(this);
                        let args = args.into_iter().map(Synthetic::from).collect();
                        let result = target.apply(&this, args).await?;
                        Ok(result.to_native())
                    }
                }))
            }
        };

        stack.pop();
        value
    }

    pub fn to_json(&self) -> serde_json::Value {
        self.to_native().to_json()
    }

    /// Call a function value. `this` and `args` are lowered before the call and
    /// the result is lifted after it settles.
    pub async fn apply(&self, this: &Synthetic, args: Vec<Synthetic>) -> SandboxResult<Synthetic> {
        let Synthetic::Function(function) = self else {
            return Err(SandboxError::NotCallable(self.kind()));
        };

        let function = function.borrow().clone();
        let this = this.to_native();
        let args = args.iter().map(Synthetic::to_native).collect();
        let result = function.call(this, args).resolve().await?;
        Ok(Synthetic::from(result))
    }

    /// Call a function value as a constructor.
    ///
    /// The function receives a fresh object as `this`; an object it returns is
    /// merged into that instance.
    pub async fn construct(&self, args: Vec<Synthetic>) -> SandboxResult<Synthetic> {
        let instance = Synthetic::object(BTreeMap::new());
        let result = self.apply(&instance, args).await?;
        if result.kind() == SyntheticKind::Object {
            instance.patch(&result)?;
        }
        Ok(instance)
    }
}

impl From<NativeValue> for Synthetic {
    fn from(value: NativeValue) -> Self {
        match value {
            NativeValue::Function(function) => Synthetic::function(function),
            NativeValue::Array(items) => {
                Synthetic::array(items.into_iter().map(Synthetic::from).collect())
            }
            NativeValue::Object(entries) => Synthetic::object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, Synthetic::from(value)))
                    .collect(),
            ),
            scalar => Synthetic::native(scalar),
        }
    }
}

impl From<SymbolTable> for Synthetic {
    fn from(table: SymbolTable) -> Self {
        Synthetic::SymbolTable(table)
    }
}

impl From<serde_json::Value> for Synthetic {
    fn from(value: serde_json::Value) -> Self {
        Synthetic::from(NativeValue::from(value))
    }
}

impl fmt::Debug for Synthetic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Synthetic::Native(value) => write!(f, "Synthetic({:?})", value.borrow()),
            Synthetic::Array(items) => write!(f, "Synthetic[{} items]", items.borrow().len()),
            Synthetic::Object(entries) => {
                f.debug_set().entries(entries.borrow().keys()).finish()
            }
            Synthetic::Function(function) => write!(f, "{:?}", function.borrow()),
            Synthetic::SymbolTable(table) => write!(f, "{table:?}"),
        }
    }
}

impl Serialize for Synthetic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_native().serialize(serializer)
    }
}
