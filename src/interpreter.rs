mod environment;

use std::{cell::RefCell, fmt::Display, io::Write, rc::Rc};

use crate::ast::{AssignValue, Function, Node, Operator, TestLiteral, Type};

pub use self::environment::Environment;

/// Runtime values. Produced only by evaluation; the tokenizer and parser
/// construct nodes that *yield* values.
#[derive(Debug, Clone)]
pub enum Value {
    Number(u64),
    Text(String),
    Boolean(bool),
    Function(Rc<Function>),
    Unit,
}

impl Value {
    /// The runtime tag seen by declared-type checks. Functions and Unit
    /// report `Any` and therefore never fail one.
    pub fn runtime_type(&self) -> Type {
        match self {
            Value::Number(_) => Type::Number,
            Value::Text(_) => Type::Text,
            Value::Boolean(_) => Type::Boolean,
            Value::Function(_) | Value::Unit => Type::Any,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Unit, Value::Unit) => true,
            _ => false,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Function(function) => write!(f, "<function {}>", function.name),
            Value::Unit => write!(f, "unit"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("type mismatch assigning {name}: expected {expected}, got {actual}")]
    AssignType {
        name: String,
        expected: Type,
        actual: Type,
    },
    #[error("invalid operands for {op}: {left} and {right}")]
    OperandType {
        op: Operator,
        left: Type,
        right: Type,
    },
    #[error("argument {param} of {function} expects {expected}, got {actual}")]
    ArgumentType {
        function: String,
        param: String,
        expected: Type,
        actual: Type,
    },
    #[error("return value of {function} expects {expected}, got {actual}")]
    ReturnType {
        function: String,
        expected: Type,
        actual: Type,
    },
    #[error("{function} called with {found} arguments, expected {expected}")]
    Arity {
        function: String,
        expected: usize,
        found: usize,
    },
}

/// Tree-walking evaluator. Drives the top-level statement sequence against
/// one root environment; function calls run against ephemeral snapshot
/// copies of the caller's environment.
pub struct Interpreter {
    env: Environment,
    stdout: Rc<RefCell<dyn Write>>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(Rc::new(RefCell::new(std::io::stdout())))
    }
}

impl Interpreter {
    pub fn new(stdout: Rc<RefCell<dyn Write>>) -> Self {
        Self {
            env: Environment::new(),
            stdout,
        }
    }

    /// Executes the top-level statements in order and returns the value of
    /// the last one (Unit for an empty program). Print output is written as
    /// it happens, not buffered.
    pub fn interpret(&mut self, program: &[Node]) -> Result<Value, RuntimeError> {
        let mut env = std::mem::take(&mut self.env);
        let mut result = Ok(Value::Unit);
        for node in program {
            result = self.evaluate(node, &mut env);
            if result.is_err() {
                break;
            }
        }
        self.env = env;
        result
    }

    /// The root environment, including the name→type table mirrored from
    /// assignments.
    pub fn environment(&self) -> &Environment {
        &self.env
    }

    fn evaluate(&mut self, node: &Node, env: &mut Environment) -> Result<Value, RuntimeError> {
        match node {
            Node::Print { text, names } => {
                let mut rendered = text.clone();
                for name in names {
                    if let Some(value) = env.get(name) {
                        rendered = rendered.replace(&format!("💱{{{name}}}"), &value.to_string());
                    }
                }
                writeln!(self.stdout.borrow_mut(), "{rendered}")?;
                Ok(Value::Text(rendered))
            }
            Node::Assign {
                name,
                declared,
                value,
            } => {
                let rhs_type = match value {
                    AssignValue::Number(_) => Type::Number,
                    AssignValue::Node(node) => node.static_type(),
                };
                if *declared != Type::Any && !declared.compatible(rhs_type) {
                    return Err(RuntimeError::AssignType {
                        name: name.clone(),
                        expected: *declared,
                        actual: rhs_type,
                    });
                }

                // The anonymous form is a numeric literal used as an
                // expression term; it binds nothing.
                if name.is_empty() {
                    if let AssignValue::Number(n) = value {
                        return Ok(Value::Number(*n));
                    }
                }

                let val = match value {
                    AssignValue::Number(n) => Value::Number(*n),
                    AssignValue::Node(node) => self.evaluate(node, env)?,
                };
                let resolved = if *declared != Type::Any {
                    *declared
                } else {
                    rhs_type
                };
                env.define(name.clone(), val, resolved);
                Ok(Value::Unit)
            }
            Node::EqualityTest { name, value } => {
                let equal = match (env.get(name), value) {
                    (Some(Value::Number(n)), TestLiteral::Number(m)) => n == m,
                    (Some(Value::Text(s)), TestLiteral::Text(t)) => s == t,
                    _ => false,
                };
                Ok(Value::Boolean(equal))
            }
            Node::BinaryOp { left, op, right } => {
                let (left_type, right_type) = (left.static_type(), right.static_type());
                if matches!(op, Operator::Plus | Operator::NumPlus | Operator::Mult)
                    && (!left_type.compatible(Type::Number)
                        || !right_type.compatible(Type::Number))
                {
                    return Err(RuntimeError::OperandType {
                        op: *op,
                        left: left_type,
                        right: right_type,
                    });
                }

                let left = self.evaluate(left, env)?;
                let right = self.evaluate(right, env)?;
                Ok(match op {
                    Operator::Plus | Operator::NumPlus => match (left, right) {
                        (Value::Number(a), Value::Number(b)) => Value::Number(a.wrapping_add(b)),
                        _ => Value::Unit,
                    },
                    Operator::Mult => match (left, right) {
                        (Value::Number(a), Value::Number(b)) => Value::Number(a.wrapping_mul(b)),
                        _ => Value::Unit,
                    },
                    Operator::Concat => Value::Text(format!("{left}{right}")),
                })
            }
            Node::VariableRef { name, .. } => Ok(env.get(name).cloned().unwrap_or(Value::Unit)),
            Node::FunctionDef(function) => {
                env.define(
                    function.name.clone(),
                    Value::Function(function.clone()),
                    Type::Any,
                );
                Ok(Value::Unit)
            }
            Node::Return(value) => self.evaluate(value, env),
            Node::FunctionCall { name, args } => {
                // A missing name or a non-function value makes the call a
                // no-op, not an error.
                let function = match env.get(name) {
                    Some(Value::Function(function)) => function.clone(),
                    _ => return Ok(Value::Unit),
                };
                self.call(&function, args, env)
            }
            Node::Main(body) => {
                for node in body {
                    self.evaluate(node, env)?;
                }
                Ok(Value::Unit)
            }
            Node::TryCatch {
                try_body,
                catch_body,
            } => {
                // The catch body only ever fires when a try-body statement
                // is itself a TryCatch node; the try body is inspected, not
                // evaluated. Kept exactly as the construct behaves.
                for node in try_body {
                    if matches!(node, Node::TryCatch { .. }) {
                        if let Some(first) = catch_body.first() {
                            return self.evaluate(first, env);
                        }
                    }
                }
                Ok(Value::Unit)
            }
            Node::StringLiteral(s) => Ok(Value::Text(s.clone())),
            Node::BooleanLiteral(b) => Ok(Value::Boolean(*b)),
        }
    }

    fn call(
        &mut self,
        function: &Rc<Function>,
        args: &[Node],
        env: &mut Environment,
    ) -> Result<Value, RuntimeError> {
        if args.len() != function.params.len() {
            return Err(RuntimeError::Arity {
                function: function.name.clone(),
                expected: function.params.len(),
                found: args.len(),
            });
        }

        // Arguments evaluate against the caller's environment; the body runs
        // against a full snapshot of it. No closure capture: whatever the
        // caller can see at call time, the callee sees, and nothing else.
        let mut local = env.snapshot();
        for (param, arg) in function.params.iter().zip(args) {
            let value = self.evaluate(arg, env)?;
            if param.ty != Type::Any && !param.ty.compatible(value.runtime_type()) {
                return Err(RuntimeError::ArgumentType {
                    function: function.name.clone(),
                    param: param.name.clone(),
                    expected: param.ty,
                    actual: value.runtime_type(),
                });
            }
            local.define(param.name.clone(), value, param.ty);
        }

        let mut result = Value::Unit;
        for node in &function.body {
            // Only a Return at the top level of the body short-circuits.
            if let Node::Return(value) = node {
                let value = self.evaluate(value, &mut local)?;
                if function.return_type != Type::Any
                    && !function.return_type.compatible(value.runtime_type())
                {
                    return Err(RuntimeError::ReturnType {
                        function: function.name.clone(),
                        expected: function.return_type,
                        actual: value.runtime_type(),
                    });
                }
                return Ok(value);
            }
            result = self.evaluate(node, &mut local)?;
        }
        Ok(result)
    }
}
