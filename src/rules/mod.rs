//! Access rules: boolean filter expressions evaluated per request.
//!
//! A rule is stored as an optional string on the collection:
//! `None` locks the operation to admins, `""` opens it to everyone and
//! anything else is parsed into an [`Expr`] and evaluated against the
//! caller, the record and the request data.

use thiserror::Error;

pub mod context;
pub mod eval;
pub mod parser;

pub use context::{AuthContext, AuthUser, RuleContext};
pub use parser::{Expr, Op, Operand, Rule};

/// Record fields that exist on every collection without being declared.
pub const SYSTEM_FIELDS: [&str; 5] = ["id", "created", "updated", "collectionId", "collectionName"];

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("unexpected character {ch:?} at {pos}")]
    UnexpectedChar { pos: usize, ch: char },

    #[error("unterminated string starting at {0}")]
    UnterminatedString(usize),

    #[error("unexpected {found} at {pos}")]
    UnexpectedToken { pos: usize, found: String },

    #[error("unexpected end of rule")]
    UnexpectedEnd,

    #[error("unknown macro {0}")]
    UnknownMacro(String),

    #[error("unsupported field path {0}")]
    UnsupportedPath(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Access {
    /// Admins only.
    Locked,
    /// Everyone, guests included.
    Public,
    Expr(Rule),
}

impl Access {
    pub fn from_rule(rule: Option<&str>) -> Result<Self, RuleError> {
        match rule {
            None => Ok(Access::Locked),
            Some(rule) if rule.trim().is_empty() => Ok(Access::Public),
            Some(rule) => Rule::parse(rule).map(Access::Expr),
        }
    }

    pub fn allows(&self, ctx: &RuleContext<'_>) -> bool {
        if ctx.auth.is_admin() {
            return true;
        }
        match self {
            Access::Locked => false,
            Access::Public => true,
            Access::Expr(rule) => eval::evaluate(rule.expr(), ctx),
        }
    }
}
