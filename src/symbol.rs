use crate::error::RuntimeError;
use std::{collections::HashMap, fmt::Display};

/// Declared type of a variable. The tag is fixed at declaration; only the
/// payload of the value changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ty {
    Int,
    Float,
    Bool,
    Char,
}

impl Ty {
    pub fn zero(self) -> Value {
        match self {
            Ty::Int => Value::Int(0),
            Ty::Float => Value::Float(0.0),
            Ty::Bool => Value::Bool(false),
            Ty::Char => Value::Char(' '),
        }
    }
}

impl Display for Ty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ty::Int => write!(f, "INT"),
            Ty::Float => write!(f, "FLOAT"),
            Ty::Bool => write!(f, "BOOL"),
            Ty::Char => write!(f, "CHAR"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Char(char),
}

impl Value {
    pub fn ty(&self) -> Ty {
        match self {
            Value::Int(_) => Ty::Int,
            Value::Float(_) => Ty::Float,
            Value::Bool(_) => Ty::Bool,
            Value::Char(_) => Ty::Char,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Bool(true) => write!(f, "TRUE"),
            Value::Bool(false) => write!(f, "FALSE"),
            Value::Char(c) => write!(f, "{}", c),
        }
    }
}

/// Typed variable storage, shared by the top-level program and every
/// nested block. Insertion order is kept for diagnostic dumps.
#[derive(Debug, Default)]
pub struct SymbolTable {
    vars: HashMap<String, Value>,
    order: Vec<String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `name` with the zero value of `ty`. Declaring a name that
    /// already exists removes the old entry and fails, so no state
    /// survives a bad declaration.
    pub fn declare(&mut self, name: &str, ty: Ty) -> Result<(), RuntimeError> {
        if self.vars.contains_key(name) {
            self.remove(name);
            return Err(RuntimeError::Redeclared(name.into()));
        }
        self.vars.insert(name.into(), ty.zero());
        self.order.push(name.into());
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&Value, RuntimeError> {
        self.vars
            .get(name)
            .ok_or_else(|| RuntimeError::NotDeclared(name.into()))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Value, RuntimeError> {
        self.vars
            .get_mut(name)
            .ok_or_else(|| RuntimeError::NotDeclared(name.into()))
    }

    pub fn set(&mut self, name: &str, value: Value) -> Result<(), RuntimeError> {
        let slot = self.get_mut(name)?;
        debug_assert_eq!(slot.ty(), value.ty());
        *slot = value;
        Ok(())
    }

    pub fn remove(&mut self, name: &str) {
        self.vars.remove(name);
        self.order.retain(|n| n != name);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Display for SymbolTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for name in &self.order {
            writeln!(f, "{} = {}", name, self.vars[name])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declare_starts_from_zero_value() {
        let mut vars = SymbolTable::new();
        vars.declare("n", Ty::Int).unwrap();
        vars.declare("x", Ty::Float).unwrap();
        vars.declare("f", Ty::Bool).unwrap();
        vars.declare("c", Ty::Char).unwrap();
        assert_eq!(*vars.get("n").unwrap(), Value::Int(0));
        assert_eq!(*vars.get("x").unwrap(), Value::Float(0.0));
        assert_eq!(*vars.get("f").unwrap(), Value::Bool(false));
        assert_eq!(*vars.get("c").unwrap(), Value::Char(' '));
    }

    #[test]
    fn redeclaration_discards_the_entry() {
        let mut vars = SymbolTable::new();
        vars.declare("n", Ty::Int).unwrap();
        assert!(matches!(
            vars.declare("n", Ty::Float),
            Err(RuntimeError::Redeclared(_))
        ));
        assert!(!vars.contains("n"));
    }

    #[test]
    fn dump_follows_insertion_order() {
        let mut vars = SymbolTable::new();
        vars.declare("b", Ty::Int).unwrap();
        vars.declare("a", Ty::Bool).unwrap();
        vars.set("b", Value::Int(7)).unwrap();
        assert_eq!(vars.to_string(), "b = 7\na = FALSE\n");
    }
}
