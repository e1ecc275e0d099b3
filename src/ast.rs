use serde_json::Number;

/// Index of a node inside its builder's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
    And,
    Or,
    Gt,
    Ge,
    Lt,
    Le,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Range, // a .. b
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Range => "..",
        }
    }

    /// The range operator only appears inside list brackets and must not be
    /// wrapped in parentheses.
    pub fn parenthesized(self) -> bool {
        !matches!(self, BinaryOp::Range)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(Number),
    Str(String),
    List(Vec<NodeId>),
    Map(Vec<(String, NodeId)>),
    /// A map that must stay valid JSON: entries are comma separated under
    /// every profile.
    Document(Vec<(String, NodeId)>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub condition: NodeId,
    pub body: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Set {
        target: String,
        value: NodeId,
    },
    If {
        branches: Vec<Branch>, // if, then each elseif in order
        otherwise: Option<Vec<NodeId>>,
    },
    Foreach {
        var: String,
        collection: NodeId,
        body: Vec<NodeId>,
    },
    Return(Option<NodeId>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Literal(Literal),
    Reference(String),
    Access { base: NodeId, key: String },
    Index { base: NodeId, index: NodeId },
    Invoke {
        target: NodeId,
        method: String,
        args: Vec<NodeId>,
    },
    Unary { op: UnaryOp, operand: NodeId },
    Binary { op: BinaryOp, lhs: NodeId, rhs: NodeId },
    Statement(Statement),
}

impl NodeKind {
    /// References, property/element access and invocations all render as a
    /// single `${...}` token and may be chained further.
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            NodeKind::Reference(_)
                | NodeKind::Access { .. }
                | NodeKind::Index { .. }
                | NodeKind::Invoke { .. }
        )
    }

    pub fn is_operator(&self) -> bool {
        matches!(self, NodeKind::Unary { .. } | NodeKind::Binary { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub quiet: bool,
    /// Absorbed by a parent (or never registered); skipped when the
    /// enclosing block is rendered.
    pub consumed: bool,
}
