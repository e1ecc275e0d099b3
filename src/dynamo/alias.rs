//! Placeholder tables for condition and update expressions.
//!
//! Attribute names are replaced by `#name` placeholders so reserved words
//! can be used as attribute names; operand values are replaced by `:argN`
//! placeholders and shipped in a side map. Both tables are built while one
//! expression is compiled and are never shared with another.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::trace;

use crate::builder::Builder;
use crate::error::Result;
use crate::value::{Expr, Value};

/// Maps `#name` placeholders to the raw attribute names they stand for.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NameAliases {
    entries: IndexMap<String, String>,
}

impl NameAliases {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alias_for(&mut self, name: &str) -> String {
        let alias = format!("#{name}");
        self.entries
            .entry(alias.clone())
            .or_insert_with(|| name.to_owned());
        alias
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, alias: &str) -> Option<&str> {
        self.entries.get(alias).map(String::as_str)
    }

    pub fn into_map(self) -> IndexMap<String, String> {
        self.entries
    }
}

/// Maps `:argN` placeholders to encoded operand expressions.
///
/// The dedup key is the rendered text of the encoded operand, so two
/// operands that render the same share one placeholder even when they were
/// built separately.
#[derive(Debug, Default)]
pub struct ValueAliases {
    by_text: HashMap<String, String>,
    entries: IndexMap<String, Expr>,
}

impl ValueAliases {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alias_for(&mut self, b: &mut Builder, value: impl Into<Value>) -> Result<String> {
        let encoded = b.encode(value.into())?;
        let text = b.render_expr(&encoded);
        if let Some(alias) = self.by_text.get(&text) {
            // the duplicate encoding was never registered anywhere; drop it
            return Ok(alias.clone());
        }
        let alias = format!(":arg{}", self.entries.len());
        trace!(%alias, operand = %text, "registered value alias");
        self.by_text.insert(text, alias.clone());
        self.entries.insert(alias.clone(), encoded);
        Ok(alias)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_map(self) -> IndexMap<String, Expr> {
        self.entries
    }
}

/// Both tables for one expression compilation.
#[derive(Debug, Default)]
pub struct Collector {
    pub names: NameAliases,
    pub values: ValueAliases,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self, expression: String) -> Resolved {
        Resolved {
            expression,
            names: self.names.into_map(),
            values: self.values.into_map(),
        }
    }
}

/// A compiled condition or update expression with its placeholder maps.
#[derive(Debug)]
#[must_use = "placeholder values render only where the resolved expression is embedded"]
pub struct Resolved {
    pub expression: String,
    pub names: IndexMap<String, String>,
    pub values: IndexMap<String, Expr>,
}

impl Resolved {
    /// The request-payload form: `expression`, then `expressionNames` and
    /// `expressionValues` when they are not empty.
    pub fn into_value(self) -> Value {
        let mut entries = vec![("expression".to_owned(), Value::from(self.expression))];
        if !self.names.is_empty() {
            entries.push(("expressionNames".to_owned(), Value::document(self.names)));
        }
        if !self.values.is_empty() {
            entries.push(("expressionValues".to_owned(), Value::document(self.values)));
        }
        Value::Document(entries)
    }
}

impl From<Resolved> for Value {
    fn from(r: Resolved) -> Self {
        r.into_value()
    }
}
