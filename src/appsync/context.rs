//! Paths into `$ctx` and the identity helpers built on them.

use crate::builder::Builder;
use crate::error::Result;
use crate::value::{Expr, MapVar, Value, Var};

/// Claim holding the caller's user-pool groups.
pub const GROUPS_CLAIM: &str = "cognito:groups";

/// `$ctx`
pub fn ctx() -> Context {
    Context::default()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    root: Var,
}

impl Default for Context {
    fn default() -> Self {
        Context {
            root: Var::named("ctx"),
        }
    }
}

impl Context {
    pub fn var(&self) -> &Var {
        &self.root
    }

    pub fn args(&self) -> MapVar {
        self.root.access_map("args")
    }

    /// `ctx.args.<name>`
    pub fn arg(&self, name: &str) -> Var {
        self.root.access("args").access(name)
    }

    pub fn stash(&self) -> MapVar {
        self.root.access_map("stash")
    }

    pub fn source(&self, name: &str) -> Var {
        self.root.access("source").access(name)
    }

    /// Result of the previous function in a pipeline.
    pub fn prev_result(&self, name: &str) -> Var {
        self.root.access("prev").access("result").access(name)
    }

    /// Data source result; only meaningful in response templates.
    pub fn result(&self) -> Var {
        self.root.access("result")
    }

    pub fn result_field(&self, name: &str) -> Var {
        self.result().access(name)
    }

    /// Data source error; only meaningful in response templates.
    pub fn error(&self) -> ErrorContext {
        ErrorContext {
            root: self.root.access("error"),
        }
    }

    pub fn identity(&self) -> Identity {
        Identity {
            root: self.root.access("identity"),
        }
    }
}

/// `ctx.error`, set when the data source call failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    root: Var,
}

impl ErrorContext {
    pub fn var(&self) -> &Var {
        &self.root
    }

    pub fn message(&self) -> Var {
        self.root.access("message")
    }

    pub fn error_type(&self) -> Var {
        self.root.access("type")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    root: Var,
}

impl Identity {
    pub fn username(&self) -> Var {
        self.root.access("username")
    }

    pub fn sub(&self) -> Var {
        self.root.access("sub")
    }

    pub fn account_id(&self) -> Var {
        self.root.access("accountId")
    }

    pub fn claims(&self) -> MapVar {
        self.root.access_map("claims")
    }

    /// `claims.get(name)`
    pub fn claim(&self, b: &mut Builder, name: impl Into<Value>) -> Result<Expr> {
        self.claims().get(b, name)
    }

    pub fn groups(&self) -> Groups {
        Groups {
            claims: self.claims(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Groups {
    claims: MapVar,
}

impl Groups {
    /// Membership test compiled as a loop over the groups claim that flips
    /// a fresh boolean variable. Returns that variable.
    pub fn contains(&self, b: &mut Builder, group: impl Into<Value>) -> Result<Var> {
        let found = b.variable(false)?;
        let groups = self.claims.get(b, GROUPS_CLAIM)?;
        b.foreach(groups, |b, it| {
            let matched = b.eq(&it, group)?;
            b.if_(matched, |b| b.assign(&found, true))?;
            Ok(())
        })?;
        Ok(found)
    }
}
