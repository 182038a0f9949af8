use rustc_hash::FxHashMap;

use crate::ast::Type;

use super::Value;

/// Name→value mapping, with a parallel name→type table kept for external
/// introspection only; evaluation never consults it.
///
/// There is no parent chain: a function call works on a full `snapshot`
/// of the caller's environment, so a callee can never observe or mutate the
/// caller's live bindings.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    values: FxHashMap<String, Value>,
    types: FxHashMap<String, Type>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn define(&mut self, name: String, value: Value, ty: Type) {
        self.types.insert(name.clone(), ty);
        self.values.insert(name, value);
    }

    /// Last-known type of a variable, as resolved at its assignment.
    pub fn type_of(&self, name: &str) -> Option<Type> {
        self.types.get(name).copied()
    }

    /// Full copy of every entry, taken at each call boundary.
    pub fn snapshot(&self) -> Environment {
        self.clone()
    }
}
