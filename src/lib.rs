//! vtlbuilder: a typed builder for VTL resolver mapping templates.
//!
//! Instead of writing Velocity text by hand, callers describe what the
//! template should do (declare a variable, branch, loop, call a helper,
//! assemble a request) through a [`Builder`], and the builder emits the
//! equivalent template source.
//!
//! ```
//! use vtlbuilder::{appsync::ctx, request_template, Config, Profile};
//!
//! let text = request_template(Config::new(Profile::V2018_05_29), |b| {
//!     let id = b.variable(ctx().arg("id"))?;
//!     let missing = b.util().is_null_or_empty(&id)?;
//!     b.if_(missing, |b| {
//!         b.util().error("id is required", None, None, None)?;
//!         Ok(())
//!     })?;
//!     Ok(())
//! })
//! .unwrap();
//!
//! assert_eq!(
//!     text,
//!     "#set($var0 = ${ctx.args.id})\n\
//!      #if(${util.isNullOrEmpty(${var0})})\n  \
//!        ${util.error(\"id is required\")}\n\
//!      #end"
//! );
//! ```
//!
//! Model:
//! - Every expression lives in an arena owned by the builder; callers hold
//!   [`Expr`] handles. Handing an `Expr` to a parent moves it, and a moved
//!   expression is never emitted on its own. An `Expr` nobody consumes is
//!   emitted as a statement where it was created.
//! - [`Var`] is a named path (`var0`, `ctx.args.id`) and can be used any
//!   number of times.
//! - Plain Rust values (strings, numbers, bools, lists, maps, anything
//!   `serde::Serialize`) become literals wherever a [`Value`] is accepted.
//! - Conditional and loop bodies run immediately; what they append ends up
//!   in the construct's nested block.
//! - Temporary names are `var0`, `var1`, ... in creation order, unique for
//!   the whole template.
//!
//! Dialect differences are selected with [`Profile`]. Errors are reported
//! when the offending expression is built, and a failed compilation yields
//! no text at all.
//!
//! Storage expressions (conditions, updates, request envelopes) live in
//! [`dynamo`]; `$ctx` paths and the `$util` catalog in [`appsync`].

pub mod appsync;
pub mod ast;
pub mod builder;
pub mod config;
pub mod control;
pub mod dynamo;
pub mod error;
pub mod profile;
mod render;
pub mod value;

use tracing::debug;

pub use builder::Builder;
pub use config::Config;
pub use control::Conditional;
pub use error::{Error, Result};
pub use profile::Profile;
pub use value::{Expr, MapVar, Value, Var};

/// Which side of a data source call a template runs on.
///
/// Only recorded in logs. Paths such as `ctx().result()` are accepted in
/// either kind; the runtime leaves them empty in request templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Request,
    Response,
}

/// Compile one template: a fresh builder, `f` run once against it, then the
/// rendered text.
pub fn compile<F>(kind: TemplateKind, config: impl Into<Config>, f: F) -> Result<String>
where
    F: FnOnce(&mut Builder) -> Result<()>,
{
    let config = config.into();
    debug!(
        ?kind,
        profile = config.profile.version(),
        indent = config.indent,
        "compiling template"
    );
    let mut b = Builder::new(config);
    f(&mut b)?;
    let statements = b.statement_count();
    let text = b.finish();
    debug!(?kind, statements, bytes = text.len(), "compiled template");
    Ok(text)
}

/// Compile a request mapping template.
pub fn request_template<F>(config: impl Into<Config>, f: F) -> Result<String>
where
    F: FnOnce(&mut Builder) -> Result<()>,
{
    compile(TemplateKind::Request, config, f)
}

/// Compile a response mapping template. `ctx().result()` is available here.
pub fn response_template<F>(config: impl Into<Config>, f: F) -> Result<String>
where
    F: FnOnce(&mut Builder) -> Result<()>,
{
    compile(TemplateKind::Response, config, f)
}
