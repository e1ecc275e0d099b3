use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;
use serde_json::Number;
use tracing::trace;

use crate::ast::*;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::profile::{Encoding, Profile};
use crate::render::Renderer;
use crate::value::{Expr, MapVar, Value, Var};

static NEXT_BRAND: AtomicUsize = AtomicUsize::new(0);

/// The compilation context.
///
/// Owns every node created during one compilation, the stack of open
/// statement blocks (the bottom one is the top level of the template), and
/// the temporary-name counter. Nothing here is shared between compilations.
pub struct Builder {
    // Stamped on every handle this builder gives out.
    brand: usize,
    config: Config,
    nodes: Vec<Node>,
    // One block per open scope; statements are appended to the last one.
    scopes: Vec<Vec<NodeId>>,
    next_temp: usize,
}

impl Builder {
    pub fn new(config: impl Into<Config>) -> Self {
        Self {
            brand: NEXT_BRAND.fetch_add(1, Ordering::Relaxed),
            config: config.into(),
            nodes: Vec::new(),
            scopes: vec![Vec::new()],
            next_temp: 0,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn profile(&self) -> Profile {
        self.config.profile
    }

    /// Issue the next temporary name: `var0`, `var1`, ... Never reused,
    /// whatever scope is open.
    pub fn temp_name(&mut self) -> String {
        let name = format!("var{}", self.next_temp);
        self.next_temp += 1;
        trace!(%name, depth = self.depth(), "issued temporary name");
        name
    }

    // ---- arena ---------------------------------------------------------

    pub(crate) fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Create a node that belongs to no block.
    pub(crate) fn alloc(&mut self, kind: NodeKind, quiet: bool) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            quiet,
            consumed: true,
        });
        id
    }

    /// Create a node and append it to the innermost open block.
    pub(crate) fn append(&mut self, kind: NodeKind, quiet: bool) -> NodeId {
        let id = self.alloc(kind, quiet);
        self.register(id);
        id
    }

    fn register(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.consumed = false;
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.push(id);
        }
    }

    pub(crate) fn brand(&self) -> usize {
        self.brand
    }

    fn handle(&self, id: NodeId) -> Expr {
        Expr::new(self.brand, id)
    }

    pub(crate) fn owns(&self, expr: &Expr) -> bool {
        expr.owner == self.brand
    }

    fn check_owner(&self, expr: &Expr) -> Result<()> {
        if self.owns(expr) {
            Ok(())
        } else {
            Err(Error::invalid_argument(
                "expression was created by a different builder",
            ))
        }
    }

    /// Move an expression into a parent. The node stays in whatever block
    /// it was appended to but is skipped there from now on.
    pub(crate) fn consume(&mut self, expr: Expr) -> Result<NodeId> {
        self.check_owner(&expr)?;
        if let Some(node) = self.nodes.get_mut(expr.node.0) {
            node.consumed = true;
        }
        Ok(expr.node)
    }

    pub(crate) fn push_scope(&mut self) {
        self.scopes.push(Vec::new());
        trace!(depth = self.depth(), "opened scope");
    }

    pub(crate) fn pop_scope(&mut self) -> Vec<NodeId> {
        // The top-level block is never popped.
        if self.scopes.len() > 1 {
            trace!(depth = self.depth(), "sealed scope");
            self.scopes.pop().unwrap_or_default()
        } else {
            Vec::new()
        }
    }

    /// The most recent statement of the innermost block that will still be
    /// rendered.
    pub(crate) fn last_statement(&self) -> Option<NodeId> {
        let scope = self.scopes.last()?;
        scope
            .iter()
            .rev()
            .copied()
            .find(|id| self.node(*id).is_some_and(|n| !n.consumed))
    }

    /// Number of open construct bodies; 0 at the top level.
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    /// Turn a host value into a node tree. Expressions are consumed; the
    /// returned node itself is not registered in any block.
    pub(crate) fn lower(&mut self, value: Value) -> Result<NodeId> {
        let kind = match value {
            Value::Expr(expr) => return self.consume(expr),
            Value::Var(var) => {
                let quiet = var.is_quiet();
                return Ok(self.alloc(NodeKind::Reference(var.path().to_owned()), quiet));
            }
            Value::Null => Literal::Null,
            Value::Bool(b) => Literal::Bool(b),
            Value::Number(n) => Literal::Number(n),
            Value::Float(f) => match Number::from_f64(f) {
                Some(n) => Literal::Number(n),
                None => return Err(Error::unsupported(format!("non-finite float {f}"))),
            },
            Value::Str(s) => Literal::Str(s),
            Value::List(items) => {
                let ids = items
                    .into_iter()
                    .map(|item| self.lower(item))
                    .collect::<Result<Vec<_>>>()?;
                Literal::List(ids)
            }
            Value::Map(entries) => {
                let mut lowered = Vec::with_capacity(entries.len());
                for (key, item) in entries {
                    lowered.push((key, self.lower(item)?));
                }
                Literal::Map(lowered)
            }
            Value::Document(entries) => self.lower_document(entries)?,
        };
        Ok(self.alloc(NodeKind::Literal(kind), false))
    }

    fn lower_document(&mut self, entries: Vec<(String, Value)>) -> Result<Literal> {
        let mut lowered = Vec::with_capacity(entries.len());
        for (key, item) in entries {
            lowered.push((key, self.lower_in_document(item)?));
        }
        Ok(Literal::Document(lowered))
    }

    // Every map below a document is a document, including maps held in lists.
    fn lower_in_document(&mut self, value: Value) -> Result<NodeId> {
        let kind = match value {
            Value::Map(inner) | Value::Document(inner) => self.lower_document(inner)?,
            Value::List(items) => {
                let ids = items
                    .into_iter()
                    .map(|item| self.lower_in_document(item))
                    .collect::<Result<Vec<_>>>()?;
                Literal::List(ids)
            }
            other => return self.lower(other),
        };
        Ok(self.alloc(NodeKind::Literal(kind), false))
    }

    fn lower_reference(&mut self, value: Value, what: &str) -> Result<NodeId> {
        let id = self.lower(value)?;
        match self.node(id) {
            Some(node) if node.kind.is_reference() => Ok(id),
            _ => Err(Error::invalid_argument(format!("{what} must be a reference"))),
        }
    }

    fn is_quiet(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|n| n.quiet)
    }

    // ---- factories -----------------------------------------------------

    /// Normalize a host value into an expression. An existing expression is
    /// returned unchanged.
    pub fn literal(&mut self, value: impl Into<Value>) -> Result<Expr> {
        match value.into() {
            Value::Expr(expr) => {
                self.check_owner(&expr)?;
                Ok(expr)
            }
            other => {
                let id = self.lower(other)?;
                self.register(id);
                Ok(self.handle(id))
            }
        }
    }

    /// Literal from any serializable value.
    pub fn serialize<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<Expr> {
        let json = serde_json::to_value(value).map_err(|e| Error::unsupported(e.to_string()))?;
        self.literal(json)
    }

    pub fn reference(&mut self, var: &Var) -> Expr {
        let id = self.append(NodeKind::Reference(var.path().to_owned()), var.is_quiet());
        self.handle(id)
    }

    /// A fresh name with no statement attached.
    pub fn declare(&mut self) -> Var {
        Var::named(self.temp_name())
    }

    pub fn declare_map(&mut self) -> MapVar {
        MapVar(self.declare())
    }

    /// `#set($varN = init)` with a fresh name.
    pub fn variable(&mut self, init: impl Into<Value>) -> Result<Var> {
        let var = self.declare();
        self.assign(&var, init)?;
        Ok(var)
    }

    pub fn map(&mut self, init: impl Into<Value>) -> Result<MapVar> {
        Ok(MapVar(self.variable(init)?))
    }

    pub fn assign(&mut self, target: &Var, value: impl Into<Value>) -> Result<()> {
        let value = self.lower(value.into())?;
        self.append(
            NodeKind::Statement(Statement::Set {
                target: target.path().to_owned(),
                value,
            }),
            false,
        );
        Ok(())
    }

    /// Render with the silent `$!{...}` form when used on its own. A handle
    /// from another builder is returned untouched.
    pub fn quiet(&mut self, expr: Expr) -> Expr {
        if !self.owns(&expr) {
            return expr;
        }
        if let Some(node) = self.node_mut(expr.node) {
            node.quiet = true;
        }
        expr
    }

    /// Consume a value and return its text, for splicing into strings.
    pub fn inline(&mut self, value: impl Into<Value>) -> Result<String> {
        let id = self.lower(value.into())?;
        Ok(self.renderer().expr(id, 0))
    }

    /// Text of an expression without consuming it. Empty for a handle from
    /// another builder.
    pub fn render_expr(&self, expr: &Expr) -> String {
        if !self.owns(expr) {
            return String::new();
        }
        self.renderer().expr(expr.node, 0)
    }

    // ---- access and invocation ------------------------------------------

    pub fn access(&mut self, base: impl Into<Value>, key: &str) -> Result<Expr> {
        let base = self.lower_reference(base.into(), "property access base")?;
        let quiet = self.is_quiet(base);
        let id = self.append(
            NodeKind::Access {
                base,
                key: key.to_owned(),
            },
            quiet,
        );
        Ok(self.handle(id))
    }

    pub fn index(&mut self, base: impl Into<Value>, index: impl Into<Value>) -> Result<Expr> {
        let base = self.lower_reference(base.into(), "index base")?;
        let index = self.lower(index.into())?;
        let quiet = self.is_quiet(base);
        let id = self.append(NodeKind::Index { base, index }, quiet);
        Ok(self.handle(id))
    }

    pub fn invoke(
        &mut self,
        target: impl Into<Value>,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Expr> {
        let id = self.build_invoke(target.into(), method, args)?;
        self.register(id);
        Ok(self.handle(id))
    }

    /// Invoke a helper by its namespace path, e.g. `util.time`.
    pub fn helper(&mut self, namespace: &str, method: &str, args: Vec<Value>) -> Result<Expr> {
        self.invoke(Var::named(namespace), method, args)
    }

    fn build_invoke(&mut self, target: Value, method: &str, args: Vec<Value>) -> Result<NodeId> {
        let target = self.lower_reference(target, "invocation target")?;
        let mut lowered = Vec::with_capacity(args.len());
        for arg in args {
            let id = self.lower(arg)?;
            if self.profile().references_only_in_arguments()
                && self.node(id).is_some_and(|n| n.kind.is_operator())
            {
                return Err(Error::invalid_argument(format!(
                    "argument to {method}() must be a reference or literal under profile {}",
                    self.profile().version()
                )));
            }
            lowered.push(id);
        }
        let quiet = self.is_quiet(target);
        Ok(self.alloc(
            NodeKind::Invoke {
                target,
                method: method.to_owned(),
                args: lowered,
            },
            quiet,
        ))
    }

    /// Wrap a value in the backend's typed-value encoding. The result is
    /// not registered in any block; it only shows up where it is embedded.
    #[must_use = "an encoded value renders only where it is embedded"]
    pub fn encode(&mut self, value: impl Into<Value>) -> Result<Expr> {
        let value = value.into();
        let id = match self.profile().encoding() {
            Encoding::DynamoDbJson => self.build_invoke(
                Value::Var(Var::named("util.dynamodb")),
                "toDynamoDBJson",
                vec![value],
            )?,
            Encoding::JsonOfDynamoDb => {
                let inner = self.build_invoke(
                    Value::Var(Var::named("util.dynamodb")),
                    "toDynamoDB",
                    vec![value],
                )?;
                let inner = self.handle(inner);
                self.build_invoke(
                    Value::Var(Var::named("util")),
                    "toJson",
                    vec![Value::Expr(inner)],
                )?
            }
        };
        Ok(self.handle(id))
    }

    /// `$util.qr(...)`: evaluate for side effects, print nothing.
    pub fn discard(&mut self, value: impl Into<Value>) -> Result<Expr> {
        let expr = self.helper("util", "qr", vec![value.into()])?;
        Ok(self.quiet(expr))
    }

    // ---- operators -----------------------------------------------------

    pub fn unary(&mut self, op: UnaryOp, operand: impl Into<Value>) -> Result<Expr> {
        let operand = self.lower(operand.into())?;
        let id = self.append(NodeKind::Unary { op, operand }, false);
        Ok(self.handle(id))
    }

    pub fn binary(
        &mut self,
        op: BinaryOp,
        lhs: impl Into<Value>,
        rhs: impl Into<Value>,
    ) -> Result<Expr> {
        let lhs = self.lower(lhs.into())?;
        let rhs = self.lower(rhs.into())?;
        let id = self.append(NodeKind::Binary { op, lhs, rhs }, false);
        Ok(self.handle(id))
    }

    pub fn not(&mut self, operand: impl Into<Value>) -> Result<Expr> {
        self.unary(UnaryOp::Not, operand)
    }

    pub fn eq(&mut self, lhs: impl Into<Value>, rhs: impl Into<Value>) -> Result<Expr> {
        self.binary(BinaryOp::Eq, lhs, rhs)
    }

    pub fn ne(&mut self, lhs: impl Into<Value>, rhs: impl Into<Value>) -> Result<Expr> {
        self.binary(BinaryOp::Ne, lhs, rhs)
    }

    pub fn and(&mut self, lhs: impl Into<Value>, rhs: impl Into<Value>) -> Result<Expr> {
        self.binary(BinaryOp::And, lhs, rhs)
    }

    pub fn or(&mut self, lhs: impl Into<Value>, rhs: impl Into<Value>) -> Result<Expr> {
        self.binary(BinaryOp::Or, lhs, rhs)
    }

    pub fn gt(&mut self, lhs: impl Into<Value>, rhs: impl Into<Value>) -> Result<Expr> {
        self.binary(BinaryOp::Gt, lhs, rhs)
    }

    pub fn ge(&mut self, lhs: impl Into<Value>, rhs: impl Into<Value>) -> Result<Expr> {
        self.binary(BinaryOp::Ge, lhs, rhs)
    }

    pub fn lt(&mut self, lhs: impl Into<Value>, rhs: impl Into<Value>) -> Result<Expr> {
        self.binary(BinaryOp::Lt, lhs, rhs)
    }

    pub fn le(&mut self, lhs: impl Into<Value>, rhs: impl Into<Value>) -> Result<Expr> {
        self.binary(BinaryOp::Le, lhs, rhs)
    }

    pub fn add(&mut self, lhs: impl Into<Value>, rhs: impl Into<Value>) -> Result<Expr> {
        self.binary(BinaryOp::Add, lhs, rhs)
    }

    pub fn sub(&mut self, lhs: impl Into<Value>, rhs: impl Into<Value>) -> Result<Expr> {
        self.binary(BinaryOp::Sub, lhs, rhs)
    }

    pub fn mul(&mut self, lhs: impl Into<Value>, rhs: impl Into<Value>) -> Result<Expr> {
        self.binary(BinaryOp::Mul, lhs, rhs)
    }

    pub fn div(&mut self, lhs: impl Into<Value>, rhs: impl Into<Value>) -> Result<Expr> {
        self.binary(BinaryOp::Div, lhs, rhs)
    }

    pub fn rem(&mut self, lhs: impl Into<Value>, rhs: impl Into<Value>) -> Result<Expr> {
        self.binary(BinaryOp::Rem, lhs, rhs)
    }

    /// `start .. end`, for use inside a list literal.
    pub fn range(&mut self, start: impl Into<Value>, end: impl Into<Value>) -> Result<Expr> {
        self.binary(BinaryOp::Range, start, end)
    }

    // ---- rendering -----------------------------------------------------

    pub(crate) fn renderer(&self) -> Renderer<'_> {
        Renderer::new(&self.nodes, &self.config)
    }

    /// Number of live statements in the top-level block.
    pub fn statement_count(&self) -> usize {
        self.scopes
            .first()
            .map_or(0, |top| top.iter().filter(|id| !self.nodes[id.0].consumed).count())
    }

    /// Render the whole template. Consumes the builder, so nothing can be
    /// added once text has been produced.
    pub fn finish(self) -> String {
        let top = self.scopes.first().map(Vec::as_slice).unwrap_or_default();
        self.renderer().block(top, 0).join("\n")
    }
}

impl MapVar {
    pub fn get(&self, b: &mut Builder, key: impl Into<Value>) -> Result<Expr> {
        b.invoke(self, "get", vec![key.into()])
    }

    pub fn put(
        &self,
        b: &mut Builder,
        key: impl Into<Value>,
        value: impl Into<Value>,
    ) -> Result<Expr> {
        b.invoke(self, "put", vec![key.into(), value.into()])
    }

    pub fn put_all(&self, b: &mut Builder, other: impl Into<Value>) -> Result<Expr> {
        b.invoke(self, "putAll", vec![other.into()])
    }

    pub fn contains_key(&self, b: &mut Builder, key: impl Into<Value>) -> Result<Expr> {
        b.invoke(self, "containsKey", vec![key.into()])
    }

    pub fn entry_set(&self, b: &mut Builder) -> Result<Expr> {
        b.invoke(self, "entrySet", Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> Builder {
        Builder::new(Profile::V2018_05_29)
    }

    #[test]
    fn temp_names_increase() {
        let mut b = builder();
        assert_eq!(b.temp_name(), "var0");
        assert_eq!(b.temp_name(), "var1");
        assert_eq!(b.declare().path(), "var2");
    }

    #[test]
    fn consumed_operands_are_not_statements() {
        let mut b = builder();
        let lhs = b.literal(1).unwrap();
        let sum = b.add(lhs, 2).unwrap();
        assert_eq!(b.statement_count(), 1);
        assert_eq!(b.render_expr(&sum), "(1 + 2)");
    }

    #[test]
    fn literal_returns_existing_expression_unchanged() {
        let mut b = builder();
        let e = b.literal("x").unwrap();
        let id = e.id();
        assert_eq!(b.literal(e).unwrap().id(), id);
    }

    #[test]
    fn expressions_stay_with_their_builder() {
        let mut own = builder();
        let mut other = builder();
        other.literal("kept").unwrap();
        let foreign = own.literal("from elsewhere").unwrap();
        assert_eq!(other.render_expr(&foreign), "");
        let foreign = other.quiet(foreign);
        let err = other.variable(foreign).unwrap_err();
        assert!(matches!(err, Error::InvalidArgumentExpression { .. }));
        let foreign = own.literal("again").unwrap();
        let err = other.literal(foreign).unwrap_err();
        assert!(matches!(err, Error::InvalidArgumentExpression { .. }));
        assert_eq!(other.finish(), "\"kept\"");
        assert_eq!(own.finish(), "\"from elsewhere\"\n\"again\"");
    }

    #[test]
    fn encoded_values_render_only_where_embedded() {
        let mut b = builder();
        let _dropped = b.encode("unused").unwrap();
        let kept = b.encode(1).unwrap();
        b.variable(kept).unwrap();
        assert_eq!(
            b.finish(),
            "#set($var0 = ${util.toJson(${util.dynamodb.toDynamoDB(1)})})"
        );
    }

    #[test]
    fn non_finite_float_is_unsupported() {
        let mut b = builder();
        let err = b.literal(f64::NAN).unwrap_err();
        assert!(matches!(err, Error::UnsupportedLiteralType { .. }));
    }

    #[test]
    fn non_string_map_keys_are_unsupported() {
        use std::collections::BTreeMap;
        let mut b = builder();
        let mut m = BTreeMap::new();
        m.insert((1, 2), "pair key");
        let err = b.serialize(&m).unwrap_err();
        assert!(matches!(err, Error::UnsupportedLiteralType { .. }));
    }

    #[test]
    fn operator_argument_rejected_under_older_profile() {
        let mut b = Builder::new(Profile::V2017_02_28);
        let sum = b.add(1, 2).unwrap();
        let err = b.helper("util", "toJson", vec![sum.into()]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgumentExpression { .. }));
    }

    #[test]
    fn operator_argument_accepted_under_newer_profile() {
        let mut b = builder();
        let sum = b.add(1, 2).unwrap();
        let call = b.helper("util", "toJson", vec![sum.into()]).unwrap();
        assert_eq!(b.render_expr(&call), "${util.toJson((1 + 2))}");
    }

    #[test]
    fn literal_cannot_be_invoked() {
        let mut b = builder();
        let err = b.invoke("text", "length", vec![]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgumentExpression { .. }));
    }

    #[test]
    fn quiet_propagates_through_invocation() {
        let mut b = builder();
        let m = b.map(Value::empty_map()).unwrap();
        let put = m.quiet().put(&mut b, "id", "first value").unwrap();
        assert_eq!(b.render_expr(&put), "$!{var0.put(\"id\", \"first value\")}");
    }
}
