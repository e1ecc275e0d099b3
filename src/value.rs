//! Host-side inputs to the builder.
//!
//! [`Value`] is what every factory operation accepts. Plain Rust values are
//! turned into literals on the way in; [`Var`]s become fresh references; an
//! [`Expr`] is moved into its new parent and stops being a statement of its
//! own.

use std::fmt;
use std::ops::Deref;

use serde_json::Number;

use crate::ast::NodeId;

/// Handle to an expression node owned by a [`Builder`](crate::Builder).
///
/// An `Expr` is deliberately neither `Clone` nor `Copy`: handing it to a
/// parent (an operator, an invocation argument, an assignment) moves it,
/// which is what keeps a node from being emitted both inline and on its own.
/// Dropping an `Expr` leaves the node where it is, as a standalone statement.
///
/// Each handle is stamped with the builder that created it. Any other
/// builder rejects it.
#[derive(Debug, PartialEq, Eq)]
pub struct Expr {
    pub(crate) owner: usize,
    pub(crate) node: NodeId,
}

impl Expr {
    pub(crate) fn new(owner: usize, node: NodeId) -> Self {
        Expr { owner, node }
    }

    pub fn id(&self) -> NodeId {
        self.node
    }
}

/// A named reference such as `var0`, `ctx.args.id` or `var3.items`.
///
/// Variables carry no node of their own; every use creates a new reference
/// node, so a `Var` can be used any number of times.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Var {
    path: String,
    quiet: bool,
}

impl Var {
    pub fn named(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            quiet: false,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Same variable, rendered with the silent `$!{...}` form.
    pub fn quiet(&self) -> Var {
        Var {
            path: self.path.clone(),
            quiet: true,
        }
    }

    pub fn access(&self, key: &str) -> Var {
        Var {
            path: format!("{}.{}", self.path, key),
            quiet: self.quiet,
        }
    }

    pub fn access_map(&self, key: &str) -> MapVar {
        MapVar(self.access(key))
    }

    pub fn index(&self, position: usize) -> Var {
        Var {
            path: format!("{}[{}]", self.path, position),
            quiet: self.quiet,
        }
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quiet {
            write!(f, "$!{{{}}}", self.path)
        } else {
            write!(f, "${{{}}}", self.path)
        }
    }
}

/// A variable known to hold a map; map-only operations (`get`, `put`, ...)
/// live on this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MapVar(pub(crate) Var);

impl MapVar {
    pub fn named(path: impl Into<String>) -> Self {
        MapVar(Var::named(path))
    }

    pub fn quiet(&self) -> MapVar {
        MapVar(self.0.quiet())
    }

    pub fn var(&self) -> &Var {
        &self.0
    }
}

impl Deref for MapVar {
    type Target = Var;

    fn deref(&self) -> &Var {
        &self.0
    }
}

impl fmt::Display for MapVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<MapVar> for Var {
    fn from(m: MapVar) -> Self {
        m.0
    }
}

/// Anything that can stand where the template expects an expression.
#[derive(Debug)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    /// Checked when lowered: NaN and infinities have no literal form.
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(Vec<(String, Value)>),
    /// Request payload map. Nested maps inside it are documents too.
    Document(Vec<(String, Value)>),
    Var(Var),
    Expr(Expr),
}

impl Value {
    pub fn list<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    pub fn map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn document<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Document(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn empty_map() -> Self {
        Value::Map(Vec::new())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Str(s.clone())
    }
}

macro_rules! number_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Number(Number::from(n))
                }
            }
        )*
    };
}

number_from!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Float(f64::from(f))
    }
}

impl From<Var> for Value {
    fn from(v: Var) -> Self {
        Value::Var(v)
    }
}

impl From<&Var> for Value {
    fn from(v: &Var) -> Self {
        Value::Var(v.clone())
    }
}

impl From<MapVar> for Value {
    fn from(m: MapVar) -> Self {
        Value::Var(m.0)
    }
}

impl From<&MapVar> for Value {
    fn from(m: &MapVar) -> Self {
        Value::Var(m.0.clone())
    }
}

impl From<Expr> for Value {
    fn from(e: Expr) -> Self {
        Value::Expr(e)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::list(items)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => Value::list(items),
            serde_json::Value::Object(entries) => Value::map(entries),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var_paths_compose() {
        let ctx = Var::named("ctx");
        assert_eq!(ctx.access("args").access("id").to_string(), "${ctx.args.id}");
        assert_eq!(ctx.quiet().access("stash").to_string(), "$!{ctx.stash}");
        assert_eq!(Var::named("items").index(2).path(), "items[2]");
    }

    #[test]
    fn json_objects_keep_key_order() {
        let json = serde_json::json!({ "b": 1, "a": [true, null] });
        let Value::Map(entries) = Value::from(json) else {
            panic!("expected a map");
        };
        let keys: Vec<_> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["b", "a"]);
    }
}
