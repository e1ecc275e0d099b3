//! Conditionals, loops and `#return`.
//!
//! Bodies run once, immediately, against the same builder. Whatever they
//! append lands in a freshly pushed block which becomes the construct's
//! nested body when the block is sealed.

use tracing::trace;

use crate::ast::*;
use crate::builder::Builder;
use crate::error::{Error, Result};
use crate::value::{Value, Var};

/// Handle to an emitted `if` chain, used to attach `elseif` / `else`
/// branches. `else_` takes the handle by value, so a chain can't grow after
/// its final branch.
///
/// A chain can only be continued while its `#if` is still the last
/// statement of the block it was created in.
#[derive(Debug, PartialEq, Eq)]
pub struct Conditional {
    owner: usize,
    id: NodeId,
}

impl Builder {
    /// Run `body` with a fresh block on top of the scope stack and return
    /// what it appended. The block is popped whether or not `body` fails.
    pub(crate) fn capture<F>(&mut self, body: F) -> Result<Vec<NodeId>>
    where
        F: FnOnce(&mut Builder) -> Result<()>,
    {
        self.push_scope();
        let outcome = body(self);
        let captured = self.pop_scope();
        outcome.map(|()| captured)
    }

    pub fn if_<F>(&mut self, condition: impl Into<Value>, body: F) -> Result<Conditional>
    where
        F: FnOnce(&mut Builder) -> Result<()>,
    {
        let condition = self.lower(condition.into())?;
        let body = self.capture(body)?;
        let id = self.append(
            NodeKind::Statement(Statement::If {
                branches: vec![Branch { condition, body }],
                otherwise: None,
            }),
            false,
        );
        Ok(Conditional {
            owner: self.brand(),
            id,
        })
    }

    /// `#if(!cond)`.
    pub fn unless_<F>(&mut self, condition: impl Into<Value>, body: F) -> Result<Conditional>
    where
        F: FnOnce(&mut Builder) -> Result<()>,
    {
        let negated = self.not(condition)?;
        self.if_(negated, body)
    }

    /// `#foreach($varN in collection)`; `body` receives the loop variable.
    pub fn foreach<F>(&mut self, collection: impl Into<Value>, body: F) -> Result<()>
    where
        F: FnOnce(&mut Builder, Var) -> Result<()>,
    {
        let collection = self.lower(collection.into())?;
        let var = self.declare();
        let item = var.clone();
        let body = self.capture(|b| body(b, item))?;
        trace!(var = var.path(), statements = body.len(), "captured loop body");
        self.append(
            NodeKind::Statement(Statement::Foreach {
                var: var.path().to_owned(),
                collection,
                body,
            }),
            false,
        );
        Ok(())
    }

    /// `#return` or `#return(value)`.
    pub fn return_(&mut self, value: Option<Value>) -> Result<()> {
        let value = value.map(|v| self.lower(v)).transpose()?;
        self.append(NodeKind::Statement(Statement::Return(value)), false);
        Ok(())
    }

    fn check_chain(&self, conditional: &Conditional) -> Result<()> {
        if conditional.owner != self.brand() {
            return Err(Error::invalid_argument(
                "conditional handle does not belong to this builder",
            ));
        }
        if self.last_statement() != Some(conditional.id) {
            return Err(Error::invalid_argument(
                "if chain is no longer the last statement of its block",
            ));
        }
        Ok(())
    }

    fn if_chain(
        &mut self,
        conditional: &Conditional,
    ) -> Result<(&mut Vec<Branch>, &mut Option<Vec<NodeId>>)> {
        match self.node_mut(conditional.id).map(|n| &mut n.kind) {
            Some(NodeKind::Statement(Statement::If {
                branches,
                otherwise,
            })) => Ok((branches, otherwise)),
            _ => Err(Error::invalid_argument(
                "conditional handle does not belong to this builder",
            )),
        }
    }
}

impl Conditional {
    pub fn else_if<F>(
        self,
        b: &mut Builder,
        condition: impl Into<Value>,
        body: F,
    ) -> Result<Conditional>
    where
        F: FnOnce(&mut Builder) -> Result<()>,
    {
        // the condition may be the only thing built since the chain
        let condition = b.lower(condition.into())?;
        b.check_chain(&self)?;
        let body = b.capture(body)?;
        let (branches, _) = b.if_chain(&self)?;
        branches.push(Branch { condition, body });
        Ok(self)
    }

    pub fn else_<F>(self, b: &mut Builder, body: F) -> Result<()>
    where
        F: FnOnce(&mut Builder) -> Result<()>,
    {
        b.check_chain(&self)?;
        let body = b.capture(body)?;
        let (_, otherwise) = b.if_chain(&self)?;
        *otherwise = Some(body);
        Ok(())
    }
}
