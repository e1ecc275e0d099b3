//! Update expressions: `SET`, `REMOVE`, `ADD` and `DELETE` clauses.
//!
//! All clauses of one [`Update`] are compiled with the same collector, so a
//! placeholder is never issued twice for different operands.

use tracing::trace;

use crate::builder::Builder;
use crate::dynamo::alias::{Collector, Resolved};
use crate::dynamo::condition::{Operand, Path};
use crate::error::Result;
use crate::value::{Expr, Value, Var};

/// Right-hand side of a `SET` action.
#[derive(Debug)]
pub enum SetValue {
    Value(Operand),
    /// `a+b`
    Add(Operand, Operand),
    /// `a-b`
    Sub(Operand, Operand),
    /// `if_not_exists(path,value)`. Without a path the attribute being set
    /// is used.
    IfNotExists { path: Option<Path>, value: Value },
    /// `list_append(a,b)`
    ListAppend(Operand, Operand),
}

impl SetValue {
    pub fn add(lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> Self {
        SetValue::Add(lhs.into(), rhs.into())
    }

    pub fn sub(lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> Self {
        SetValue::Sub(lhs.into(), rhs.into())
    }

    pub fn if_not_exists(value: impl Into<Value>) -> Self {
        SetValue::IfNotExists {
            path: None,
            value: value.into(),
        }
    }

    pub fn if_not_exists_at(path: impl Into<Path>, value: impl Into<Value>) -> Self {
        SetValue::IfNotExists {
            path: Some(path.into()),
            value: value.into(),
        }
    }

    pub fn list_append(list: impl Into<Operand>, items: impl Into<Operand>) -> Self {
        SetValue::ListAppend(list.into(), items.into())
    }

    fn compile(self, target: &Path, b: &mut Builder, c: &mut Collector) -> Result<String> {
        Ok(match self {
            SetValue::Value(operand) => operand.resolve(b, c)?,
            SetValue::Add(lhs, rhs) => {
                let lhs = lhs.resolve(b, c)?;
                format!("{lhs}+{}", rhs.resolve(b, c)?)
            }
            SetValue::Sub(lhs, rhs) => {
                let lhs = lhs.resolve(b, c)?;
                format!("{lhs}-{}", rhs.resolve(b, c)?)
            }
            SetValue::IfNotExists { path, value } => {
                let path = path.as_ref().unwrap_or(target).resolve(c);
                let value = c.values.alias_for(b, value)?;
                format!("if_not_exists({path},{value})")
            }
            SetValue::ListAppend(list, items) => {
                let list = list.resolve(b, c)?;
                format!("list_append({list},{})", items.resolve(b, c)?)
            }
        })
    }
}

macro_rules! set_value_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for SetValue {
                fn from(operand: $t) -> Self {
                    SetValue::Value(operand.into())
                }
            }
        )*
    };
}

set_value_from!(Operand, Path, Value, Var, &Var, Expr);

#[derive(Debug, Default)]
pub struct Update {
    set: Vec<(Path, SetValue)>,
    remove: Vec<Path>,
    add: Vec<(Path, Operand)>,
    delete: Vec<(Path, Operand)>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, path: impl Into<Path>, value: impl Into<SetValue>) -> Self {
        self.set.push((path.into(), value.into()));
        self
    }

    pub fn remove(mut self, path: impl Into<Path>) -> Self {
        self.remove.push(path.into());
        self
    }

    /// Add to a number or a set.
    pub fn add(mut self, path: impl Into<Path>, value: impl Into<Operand>) -> Self {
        self.add.push((path.into(), value.into()));
        self
    }

    /// Remove elements from a set.
    pub fn delete(mut self, path: impl Into<Path>, value: impl Into<Operand>) -> Self {
        self.delete.push((path.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
            && self.remove.is_empty()
            && self.add.is_empty()
            && self.delete.is_empty()
    }

    pub fn resolve(self, b: &mut Builder) -> Result<Resolved> {
        let mut c = Collector::new();
        let mut clauses = Vec::new();

        if !self.set.is_empty() {
            let mut actions = Vec::with_capacity(self.set.len());
            for (path, value) in self.set {
                let target = path.resolve(&mut c);
                let value = value.compile(&path, b, &mut c)?;
                actions.push(format!("{target}={value}"));
            }
            clauses.push(format!("SET {}", actions.join(", ")));
        }

        if !self.remove.is_empty() {
            let paths: Vec<String> = self.remove.iter().map(|p| p.resolve(&mut c)).collect();
            clauses.push(format!("REMOVE {}", paths.join(", ")));
        }

        for (keyword, actions) in [("ADD", self.add), ("DELETE", self.delete)] {
            if actions.is_empty() {
                continue;
            }
            let mut rendered = Vec::with_capacity(actions.len());
            for (path, value) in actions {
                let path = path.resolve(&mut c);
                rendered.push(format!("{path} {}", value.resolve(b, &mut c)?));
            }
            clauses.push(format!("{keyword} {}", rendered.join(", ")));
        }

        let expression = clauses.join(" ");
        trace!(
            %expression,
            names = c.names.len(),
            values = c.values.len(),
            "compiled update expression"
        );
        Ok(c.finish(expression))
    }
}
