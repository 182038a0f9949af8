use std::{fmt::Display, rc::Rc};

/// The language's static types. `Any` is both the default annotation and the
/// type of everything the parser cannot pin down (function calls in
/// particular).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Number,
    Text,
    Boolean,
    Any,
}

impl Type {
    /// `Any` is compatible with everything, in both directions.
    pub fn compatible(self, other: Type) -> bool {
        self == Type::Any || other == Type::Any || self == other
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Number => write!(f, "Number"),
            Type::Text => write!(f, "Text"),
            Type::Boolean => write!(f, "Boolean"),
            Type::Any => write!(f, "Any"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// ASCII `+`, numeric addition.
    Plus,
    /// `➕`, numeric addition.
    NumPlus,
    /// `✖️` or `*`, numeric multiplication.
    Mult,
    /// `.`, concatenation; stringifies both sides.
    Concat,
}

impl Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operator::Plus => write!(f, "+"),
            Operator::NumPlus => write!(f, "➕"),
            Operator::Mult => write!(f, "✖️"),
            Operator::Concat => write!(f, "."),
        }
    }
}

/// A function definition. Held behind `Rc` so that the Function *value*
/// stored in an environment is a reference to the definition node.
#[derive(Debug)]
pub struct Function {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Type,
    pub body: Vec<Node>,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: Type,
}

/// The right-hand side of an assignment: either a raw number literal or a
/// sub-node. There is no NumberLiteral node variant; numeric literals ride
/// inside Assign nodes, including the anonymous (empty-name) form the parser
/// produces for a number used as an expression term.
#[derive(Debug)]
pub enum AssignValue {
    Number(u64),
    Node(Box<Node>),
}

/// The literal an equality test compares against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestLiteral {
    Number(u64),
    Text(String),
}

/// The closed set of AST nodes. Built once by the parser, immutable
/// afterwards; a node may be evaluated any number of times (function bodies
/// re-run on every call).
#[derive(Debug)]
pub enum Node {
    Print {
        /// Literal text with `💱{name}` placeholders reassembled in place.
        text: String,
        /// Distinct placeholder names, in order of first appearance.
        names: Vec<String>,
    },
    Assign {
        name: String,
        declared: Type,
        value: AssignValue,
    },
    EqualityTest {
        name: String,
        value: TestLiteral,
    },
    BinaryOp {
        left: Box<Node>,
        op: Operator,
        right: Box<Node>,
    },
    VariableRef {
        name: String,
        /// Parse-time annotation from the type side-table; `Any` if the name
        /// was never assigned before this reference.
        ty: Type,
    },
    FunctionDef(Rc<Function>),
    Return(Box<Node>),
    FunctionCall {
        name: String,
        args: Vec<Node>,
    },
    Main(Vec<Node>),
    TryCatch {
        try_body: Vec<Node>,
        catch_body: Vec<Node>,
    },
    StringLiteral(String),
    BooleanLiteral(bool),
}

impl Node {
    /// Parse-time type approximation. Function calls always report `Any`:
    /// the callee's return type is only knowable once the callee value is
    /// looked up in an environment, which does not exist at parse time.
    pub fn static_type(&self) -> Type {
        match self {
            Node::Print { .. } => Type::Text,
            Node::Assign { value, .. } => match value {
                AssignValue::Number(_) => Type::Number,
                AssignValue::Node(node) => node.static_type(),
            },
            Node::EqualityTest { .. } => Type::Boolean,
            Node::BinaryOp { op, .. } => match op {
                Operator::Concat => Type::Text,
                Operator::Plus | Operator::NumPlus | Operator::Mult => Type::Number,
            },
            Node::VariableRef { ty, .. } => *ty,
            Node::FunctionDef(_) => Type::Any,
            Node::Return(value) => value.static_type(),
            Node::FunctionCall { .. } => Type::Any,
            Node::Main(_) => Type::Any,
            Node::TryCatch { .. } => Type::Any,
            Node::StringLiteral(_) => Type::Text,
            Node::BooleanLiteral(_) => Type::Boolean,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn any_is_compatible_both_ways() {
        assert!(Type::Any.compatible(Type::Number));
        assert!(Type::Text.compatible(Type::Any));
        assert!(Type::Number.compatible(Type::Number));
        assert!(!Type::Number.compatible(Type::Text));
        assert!(!Type::Boolean.compatible(Type::Number));
    }

    #[test]
    fn static_types() {
        let num_term = Node::Assign {
            name: String::new(),
            declared: Type::Any,
            value: AssignValue::Number(3),
        };
        assert_eq!(num_term.static_type(), Type::Number);

        let concat = Node::BinaryOp {
            left: Box::new(Node::StringLiteral("a".to_string())),
            op: Operator::Concat,
            right: Box::new(Node::BooleanLiteral(true)),
        };
        assert_eq!(concat.static_type(), Type::Text);

        let call = Node::FunctionCall {
            name: "f".to_string(),
            args: vec![],
        };
        assert_eq!(call.static_type(), Type::Any);
    }
}
