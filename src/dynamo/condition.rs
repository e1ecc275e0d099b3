//! Condition expressions for the storage backend.
//!
//! A [`Condition`] is a small tree. Compiling it walks the tree once with a
//! single [`Collector`], so an attribute or value that appears in several
//! places gets one placeholder no matter how deep the tree is.

use crate::builder::Builder;
use crate::dynamo::alias::{Collector, Resolved};
use crate::error::{Error, Result};
use crate::value::{Expr, Value, Var};

/// Most alternatives an `IN` condition accepts.
pub const MAX_IN_ALTERNATIVES: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Attr(String),
    Item(usize),
}

/// An attribute path such as `address.city` or `tags[2]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path(Vec<Segment>);

impl Path {
    pub fn attr(name: impl Into<String>) -> Self {
        Path(vec![Segment::Attr(name.into())])
    }

    /// `a.b.c` from its parts.
    pub fn nested<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Path(names.into_iter().map(|n| Segment::Attr(n.into())).collect())
    }

    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.0.push(Segment::Attr(name.into()));
        self
    }

    /// Element of a list attribute.
    pub fn item(mut self, position: usize) -> Self {
        self.0.push(Segment::Item(position));
        self
    }

    pub(crate) fn resolve(&self, collector: &mut Collector) -> String {
        let mut out = String::new();
        for segment in &self.0 {
            match segment {
                Segment::Attr(name) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(&collector.names.alias_for(name));
                }
                Segment::Item(position) => {
                    out.push_str(&format!("[{position}]"));
                }
            }
        }
        out
    }
}

impl From<&str> for Path {
    fn from(name: &str) -> Self {
        Path::attr(name)
    }
}

/// Something a comparator or function can take as an argument.
#[derive(Debug)]
pub enum Operand {
    Path(Path),
    Value(Value),
    Size(Path),
}

impl Operand {
    pub fn attribute(name: impl Into<String>) -> Self {
        Operand::Path(Path::attr(name))
    }

    pub fn value(value: impl Into<Value>) -> Self {
        Operand::Value(value.into())
    }

    /// `size(path)`
    pub fn size(path: impl Into<Path>) -> Self {
        Operand::Size(path.into())
    }

    pub(crate) fn resolve(self, b: &mut Builder, collector: &mut Collector) -> Result<String> {
        match self {
            Operand::Path(path) => Ok(path.resolve(collector)),
            Operand::Size(path) => Ok(format!("size({})", path.resolve(collector))),
            Operand::Value(value) => collector.values.alias_for(b, value),
        }
    }
}

impl From<Path> for Operand {
    fn from(p: Path) -> Self {
        Operand::Path(p)
    }
}

impl From<Value> for Operand {
    fn from(v: Value) -> Self {
        Operand::Value(v)
    }
}

impl From<Var> for Operand {
    fn from(v: Var) -> Self {
        Operand::Value(v.into())
    }
}

impl From<&Var> for Operand {
    fn from(v: &Var) -> Self {
        Operand::Value(v.into())
    }
}

impl From<Expr> for Operand {
    fn from(e: Expr) -> Self {
        Operand::Value(e.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparator {
    pub fn symbol(self) -> &'static str {
        match self {
            Comparator::Eq => "=",
            Comparator::Ne => "<>",
            Comparator::Lt => "<",
            Comparator::Le => "<=",
            Comparator::Gt => ">",
            Comparator::Ge => ">=",
        }
    }
}

#[derive(Debug)]
pub enum Function {
    AttributeExists(Path),
    AttributeNotExists(Path),
    AttributeType(Path, Operand),
    BeginsWith(Path, Operand),
    Contains(Path, Operand),
}

#[derive(Debug)]
pub enum Condition {
    Compare {
        lhs: Operand,
        op: Comparator,
        rhs: Operand,
    },
    Between {
        path: Path,
        low: Operand,
        high: Operand,
    },
    In {
        path: Path,
        choices: Vec<Operand>,
    },
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
    Not(Box<Condition>),
    Function(Function),
}

impl Condition {
    pub fn compare(lhs: impl Into<Operand>, op: Comparator, rhs: impl Into<Operand>) -> Self {
        Condition::Compare {
            lhs: lhs.into(),
            op,
            rhs: rhs.into(),
        }
    }

    pub fn eq(lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> Self {
        Self::compare(lhs, Comparator::Eq, rhs)
    }

    pub fn ne(lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> Self {
        Self::compare(lhs, Comparator::Ne, rhs)
    }

    pub fn lt(lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> Self {
        Self::compare(lhs, Comparator::Lt, rhs)
    }

    pub fn le(lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> Self {
        Self::compare(lhs, Comparator::Le, rhs)
    }

    pub fn gt(lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> Self {
        Self::compare(lhs, Comparator::Gt, rhs)
    }

    pub fn ge(lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> Self {
        Self::compare(lhs, Comparator::Ge, rhs)
    }

    pub fn between(
        path: impl Into<Path>,
        low: impl Into<Operand>,
        high: impl Into<Operand>,
    ) -> Self {
        Condition::Between {
            path: path.into(),
            low: low.into(),
            high: high.into(),
        }
    }

    /// `path IN (a, b, ...)`, with at most [`MAX_IN_ALTERNATIVES`] choices.
    pub fn is_in<I, O>(path: impl Into<Path>, choices: I) -> Result<Self>
    where
        I: IntoIterator<Item = O>,
        O: Into<Operand>,
    {
        let choices: Vec<Operand> = choices.into_iter().map(Into::into).collect();
        if choices.len() > MAX_IN_ALTERNATIVES {
            return Err(Error::TooManyAlternatives {
                count: choices.len(),
                max: MAX_IN_ALTERNATIVES,
            });
        }
        Ok(Condition::In {
            path: path.into(),
            choices,
        })
    }

    pub fn attribute_exists(path: impl Into<Path>) -> Self {
        Condition::Function(Function::AttributeExists(path.into()))
    }

    pub fn attribute_not_exists(path: impl Into<Path>) -> Self {
        Condition::Function(Function::AttributeNotExists(path.into()))
    }

    /// True when the attribute has the given type tag (`S`, `N`, `L`, ...).
    pub fn attribute_type(path: impl Into<Path>, type_tag: impl Into<Operand>) -> Self {
        Condition::Function(Function::AttributeType(path.into(), type_tag.into()))
    }

    pub fn begins_with(path: impl Into<Path>, prefix: impl Into<Operand>) -> Self {
        Condition::Function(Function::BeginsWith(path.into(), prefix.into()))
    }

    /// String containment, or set membership for set attributes.
    pub fn contains(path: impl Into<Path>, operand: impl Into<Operand>) -> Self {
        Condition::Function(Function::Contains(path.into(), operand.into()))
    }

    pub fn and(self, other: Condition) -> Self {
        Condition::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Condition) -> Self {
        Condition::Or(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> Self {
        Condition::Not(Box::new(self))
    }

    pub fn resolve(self, b: &mut Builder) -> Result<Resolved> {
        let mut collector = Collector::new();
        let expression = self.compile(b, &mut collector)?;
        Ok(collector.finish(expression))
    }

    pub(crate) fn compile(self, b: &mut Builder, c: &mut Collector) -> Result<String> {
        Ok(match self {
            Condition::Compare { lhs, op, rhs } => {
                let lhs = lhs.resolve(b, c)?;
                let rhs = rhs.resolve(b, c)?;
                format!("{lhs} {} {rhs}", op.symbol())
            }
            Condition::Between { path, low, high } => {
                let path = path.resolve(c);
                let low = low.resolve(b, c)?;
                let high = high.resolve(b, c)?;
                format!("{path} BETWEEN {low} AND {high}")
            }
            Condition::In { path, choices } => {
                let path = path.resolve(c);
                let choices = choices
                    .into_iter()
                    .map(|choice| choice.resolve(b, c))
                    .collect::<Result<Vec<_>>>()?;
                format!("{path} IN ({})", choices.join(", "))
            }
            Condition::And(lhs, rhs) => {
                let lhs = lhs.compile(b, c)?;
                let rhs = rhs.compile(b, c)?;
                format!("({lhs}) AND ({rhs})")
            }
            Condition::Or(lhs, rhs) => {
                let lhs = lhs.compile(b, c)?;
                let rhs = rhs.compile(b, c)?;
                format!("({lhs}) OR ({rhs})")
            }
            Condition::Not(inner) => format!("NOT ({})", inner.compile(b, c)?),
            Condition::Function(function) => match function {
                Function::AttributeExists(path) => {
                    format!("attribute_exists({})", path.resolve(c))
                }
                Function::AttributeNotExists(path) => {
                    format!("attribute_not_exists({})", path.resolve(c))
                }
                Function::AttributeType(path, arg) => call2("attribute_type", path, arg, b, c)?,
                Function::BeginsWith(path, arg) => call2("begins_with", path, arg, b, c)?,
                Function::Contains(path, arg) => call2("contains", path, arg, b, c)?,
            },
        })
    }
}

fn call2(
    name: &str,
    path: Path,
    arg: Operand,
    b: &mut Builder,
    c: &mut Collector,
) -> Result<String> {
    let path = path.resolve(c);
    let arg = arg.resolve(b, c)?;
    Ok(format!("{name}({path}, {arg})"))
}

/// Key conditions for queries: a restricted condition over key attributes,
/// combined only by conjunction.
#[derive(Debug)]
pub struct KeyCondition(Condition);

impl KeyCondition {
    pub fn eq(key: &str, value: impl Into<Value>) -> Self {
        KeyCondition(Condition::eq(Path::attr(key), Operand::value(value)))
    }

    pub fn lt(key: &str, value: impl Into<Value>) -> Self {
        KeyCondition(Condition::lt(Path::attr(key), Operand::value(value)))
    }

    pub fn le(key: &str, value: impl Into<Value>) -> Self {
        KeyCondition(Condition::le(Path::attr(key), Operand::value(value)))
    }

    pub fn gt(key: &str, value: impl Into<Value>) -> Self {
        KeyCondition(Condition::gt(Path::attr(key), Operand::value(value)))
    }

    pub fn ge(key: &str, value: impl Into<Value>) -> Self {
        KeyCondition(Condition::ge(Path::attr(key), Operand::value(value)))
    }

    pub fn begins_with(key: &str, prefix: impl Into<Value>) -> Self {
        KeyCondition(Condition::begins_with(key, Operand::value(prefix)))
    }

    pub fn between(key: &str, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        KeyCondition(Condition::between(
            key,
            Operand::value(low),
            Operand::value(high),
        ))
    }

    pub fn and(self, other: KeyCondition) -> Self {
        KeyCondition(self.0.and(other.0))
    }

    pub fn resolve(self, b: &mut Builder) -> Result<Resolved> {
        self.0.resolve(b)
    }
}
