use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashMap;

use crate::{
    ast::{AssignValue, Function, Node, Operator, Param, TestLiteral, Type},
    tokenizer::{Token, TokenKind},
};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected {expected}, found {found}")]
    Expected {
        expected: TokenKind,
        found: TokenKind,
    },
    #[error("unexpected {0} in expression")]
    UnexpectedTerm(TokenKind),
    #[error("expected a type annotation, found {0}")]
    ExpectedType(TokenKind),
    #[error("invalid number literal \"{0}\"")]
    InvalidNumber(String),
}

/// The placeholder shape the tokenizer produces inside string literals.
static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"💱\{([A-Za-z0-9_]+)\}").expect("placeholder pattern is valid"));

/// Parses a token sequence into the ordered top-level statement list.
pub fn program(tokens: &[Token]) -> Result<Vec<Node>, ParseError> {
    Parser::new(tokens).program()
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    /// Side-table of variable name to declared/inferred type, recorded at
    /// each assignment and parameter and used to annotate later references.
    types: FxHashMap<String, Type>,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            types: FxHashMap::default(),
        }
    }

    fn program(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut nodes = Vec::new();
        while self.current() != TokenKind::Eof {
            match self.statement()? {
                Some(node) => nodes.push(node),
                // Unrecognized leading token: advance exactly one token so
                // the loop cannot get stuck. This can silently desynchronize
                // from the intended grammar; kept as-is.
                None => self.pos += 1,
            }
        }
        Ok(nodes)
    }

    fn current(&self) -> TokenKind {
        self.peek(0)
    }

    fn peek(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn consume(&mut self, expected: TokenKind) -> Result<&'a Token, ParseError> {
        let tokens = self.tokens;
        match tokens.get(self.pos) {
            Some(token) if token.kind == expected => {
                self.pos += 1;
                Ok(token)
            }
            found => Err(ParseError::Expected {
                expected,
                found: found.map(|t| t.kind).unwrap_or(TokenKind::Eof),
            }),
        }
    }

    /// Dispatches on the current token; `Ok(None)` means the token opens no
    /// statement and the caller should skip it.
    fn statement(&mut self) -> Result<Option<Node>, ParseError> {
        match self.current() {
            TokenKind::Print => self.print_statement().map(Some),
            TokenKind::Assign => self.assign_statement().map(Some),
            TokenKind::Main => self.main_block().map(Some),
            TokenKind::TryStart => self.try_catch().map(Some),
            TokenKind::Function => self.function_def().map(Some),
            TokenKind::Return => self.return_statement().map(Some),
            TokenKind::Identifier => {
                // Two tokens of lookahead to tell an equality test and a
                // call apart from a plain expression.
                if self.peek(1) == TokenKind::Equal {
                    self.equality_test().map(Some)
                } else if self.peek(1) == TokenKind::LParen {
                    self.call().map(Some)
                } else {
                    self.expression().map(Some)
                }
            }
            _ => Ok(None),
        }
    }

    /// `🖨️ STRING`. The tokenizer splits interpolated strings into
    /// `STR 💱 { IDENT } STR` groups; those are stitched back into one
    /// literal text carrying the `💱{name}` placeholder shape, which is then
    /// scanned for substitution keys.
    fn print_statement(&mut self) -> Result<Node, ParseError> {
        self.consume(TokenKind::Print)?;
        let mut text = self.consume(TokenKind::Str)?.text.clone();

        while self.current() == TokenKind::Interpolate {
            self.consume(TokenKind::Interpolate)?;
            self.consume(TokenKind::LBrace)?;
            let name = &self.consume(TokenKind::Identifier)?.text;
            self.consume(TokenKind::RBrace)?;
            text.push_str(&format!("💱{{{name}}}"));
            text.push_str(&self.consume(TokenKind::Str)?.text);
        }

        let names = placeholder_names(&text);
        Ok(Node::Print { text, names })
    }

    /// `✍️ IDENT (: type)? = (call | STRING | NUMBER | BOOLEAN | expr)`,
    /// alternatives tried in that order; the literal branches take a single
    /// literal token.
    fn assign_statement(&mut self) -> Result<Node, ParseError> {
        self.consume(TokenKind::Assign)?;
        let name = self.consume(TokenKind::Identifier)?.text.clone();

        let declared = if self.current() == TokenKind::Colon {
            self.consume(TokenKind::Colon)?;
            self.type_annotation()?
        } else {
            Type::Any
        };

        self.consume(TokenKind::EqualSign)?;

        let value = if self.current() == TokenKind::Identifier
            && self.peek(1) == TokenKind::LParen
        {
            AssignValue::Node(Box::new(self.call()?))
        } else if self.current() == TokenKind::Str {
            let text = self.consume(TokenKind::Str)?.text.clone();
            AssignValue::Node(Box::new(Node::StringLiteral(text)))
        } else if self.current() == TokenKind::Number {
            AssignValue::Number(self.number()?)
        } else if self.current() == TokenKind::Boolean {
            let token = self.consume(TokenKind::Boolean)?;
            AssignValue::Node(Box::new(Node::BooleanLiteral(token.text == "true")))
        } else {
            AssignValue::Node(Box::new(self.expression()?))
        };

        let inferred = match &value {
            AssignValue::Number(_) => Type::Number,
            AssignValue::Node(node) => node.static_type(),
        };
        let resolved = if declared != Type::Any { declared } else { inferred };
        self.types.insert(name.clone(), resolved);

        Ok(Node::Assign {
            name,
            declared,
            value,
        })
    }

    /// `IDENT 🟰 (STRING | NUMBER)`.
    fn equality_test(&mut self) -> Result<Node, ParseError> {
        let name = self.consume(TokenKind::Identifier)?.text.clone();
        self.consume(TokenKind::Equal)?;
        let value = if self.current() == TokenKind::Str {
            TestLiteral::Text(self.consume(TokenKind::Str)?.text.clone())
        } else {
            TestLiteral::Number(self.number()?)
        };
        Ok(Node::EqualityTest { name, value })
    }

    /// `main ✍️ ✍️ { statement* }`.
    fn main_block(&mut self) -> Result<Node, ParseError> {
        self.consume(TokenKind::Main)?;
        self.consume(TokenKind::Assign)?;
        self.consume(TokenKind::Assign)?;
        self.consume(TokenKind::LBrace)?;
        let body = self.block_body()?;
        self.consume(TokenKind::RBrace)?;
        Ok(Node::Main(body))
    }

    /// `🚀 IDENT , NUMBER 👨🏿‍💻 { statement* } 🤦🏿‍♂️ { statement* }`. The
    /// identifier and number are consumed and discarded.
    fn try_catch(&mut self) -> Result<Node, ParseError> {
        self.consume(TokenKind::TryStart)?;
        self.consume(TokenKind::Identifier)?;
        self.consume(TokenKind::Comma)?;
        self.consume(TokenKind::Number)?;
        self.consume(TokenKind::Try)?;
        self.consume(TokenKind::LBrace)?;
        let try_body = self.block_body()?;
        self.consume(TokenKind::RBrace)?;
        self.consume(TokenKind::Catch)?;
        self.consume(TokenKind::LBrace)?;
        let catch_body = self.block_body()?;
        self.consume(TokenKind::RBrace)?;
        Ok(Node::TryCatch {
            try_body,
            catch_body,
        })
    }

    /// `▶️ IDENT ( params? ) (: type)? { statement* }`.
    fn function_def(&mut self) -> Result<Node, ParseError> {
        self.consume(TokenKind::Function)?;
        let name = self.consume(TokenKind::Identifier)?.text.clone();
        self.consume(TokenKind::LParen)?;

        let mut params = Vec::new();
        if self.current() != TokenKind::RParen {
            params.push(self.param()?);
            while self.current() == TokenKind::Comma {
                self.consume(TokenKind::Comma)?;
                params.push(self.param()?);
            }
        }
        self.consume(TokenKind::RParen)?;

        let return_type = if self.current() == TokenKind::Colon {
            self.consume(TokenKind::Colon)?;
            self.type_annotation()?
        } else {
            Type::Any
        };

        self.consume(TokenKind::LBrace)?;
        let body = self.block_body()?;
        self.consume(TokenKind::RBrace)?;

        Ok(Node::FunctionDef(std::rc::Rc::new(Function {
            name,
            params,
            return_type,
            body,
        })))
    }

    fn param(&mut self) -> Result<Param, ParseError> {
        let name = self.consume(TokenKind::Identifier)?.text.clone();
        let ty = if self.current() == TokenKind::Colon {
            self.consume(TokenKind::Colon)?;
            self.type_annotation()?
        } else {
            Type::Any
        };
        // Parameter names get annotated like assigned variables so the body
        // can static-type-check operations on them.
        self.types.insert(name.clone(), ty);
        Ok(Param { name, ty })
    }

    fn return_statement(&mut self) -> Result<Node, ParseError> {
        self.consume(TokenKind::Return)?;
        Ok(Node::Return(Box::new(self.expression()?)))
    }

    /// `IDENT ( (expr (, expr)*)? )`.
    fn call(&mut self) -> Result<Node, ParseError> {
        let name = self.consume(TokenKind::Identifier)?.text.clone();
        self.consume(TokenKind::LParen)?;
        let mut args = Vec::new();
        if self.current() != TokenKind::RParen {
            args.push(self.expression()?);
            while self.current() == TokenKind::Comma {
                self.consume(TokenKind::Comma)?;
                args.push(self.expression()?);
            }
        }
        self.consume(TokenKind::RParen)?;
        Ok(Node::FunctionCall { name, args })
    }

    /// Strictly left-associative chain; all four operators share one
    /// precedence level.
    fn expression(&mut self) -> Result<Node, ParseError> {
        let mut left = self.term()?;
        loop {
            let op = match self.current() {
                TokenKind::Plus => Operator::Plus,
                TokenKind::NumPlus => Operator::NumPlus,
                TokenKind::Mult => Operator::Mult,
                TokenKind::Concat => Operator::Concat,
                _ => break,
            };
            self.pos += 1;
            let right = self.term()?;
            left = Node::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn term(&mut self) -> Result<Node, ParseError> {
        match self.current() {
            TokenKind::Identifier => {
                if self.peek(1) == TokenKind::LParen {
                    return self.call();
                }
                let name = self.consume(TokenKind::Identifier)?.text.clone();
                let ty = self.types.get(&name).copied().unwrap_or(Type::Any);
                Ok(Node::VariableRef { name, ty })
            }
            // A numeric literal term is an anonymous Assign node carrying the
            // raw number; the node set has no NumberLiteral variant.
            TokenKind::Number => Ok(Node::Assign {
                name: String::new(),
                declared: Type::Any,
                value: AssignValue::Number(self.number()?),
            }),
            TokenKind::Str => {
                let text = self.consume(TokenKind::Str)?.text.clone();
                Ok(Node::StringLiteral(text))
            }
            TokenKind::Boolean => {
                let token = self.consume(TokenKind::Boolean)?;
                Ok(Node::BooleanLiteral(token.text == "true"))
            }
            kind => Err(ParseError::UnexpectedTerm(kind)),
        }
    }

    fn type_annotation(&mut self) -> Result<Type, ParseError> {
        let ty = match self.current() {
            TokenKind::TypeNumber => Type::Number,
            TokenKind::TypeText => Type::Text,
            TokenKind::TypeBool => Type::Boolean,
            TokenKind::TypeAny => Type::Any,
            kind => return Err(ParseError::ExpectedType(kind)),
        };
        self.pos += 1;
        Ok(ty)
    }

    fn number(&mut self) -> Result<u64, ParseError> {
        let token = self.consume(TokenKind::Number)?;
        token
            .text
            .parse()
            .map_err(|_| ParseError::InvalidNumber(token.text.clone()))
    }

    /// Statement loop shared by `{ … }` bodies. Unknown tokens advance one
    /// position, same as the top-level loop.
    fn block_body(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut body = Vec::new();
        while self.current() != TokenKind::RBrace && self.current() != TokenKind::Eof {
            match self.statement()? {
                Some(node) => body.push(node),
                None => self.pos += 1,
            }
        }
        Ok(body)
    }
}

/// Distinct placeholder names in a reassembled print text, in order of first
/// appearance.
fn placeholder_names(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for captures in PLACEHOLDER.captures_iter(text) {
        let name = &captures[1];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tokenizer::tokens;

    fn parse(source: &str) -> Vec<Node> {
        program(&tokens(source).expect("lexing should succeed")).expect("parsing should succeed")
    }

    #[test]
    fn test_assign_records_inferred_type() {
        let nodes = parse("✍️x = 10 x");
        assert_eq!(nodes.len(), 2);
        assert!(matches!(
            &nodes[0],
            Node::Assign {
                name,
                declared: Type::Any,
                value: AssignValue::Number(10),
            } if name == "x"
        ));
        // The later reference picks up the inferred type.
        assert!(matches!(
            &nodes[1],
            Node::VariableRef { name, ty: Type::Number } if name == "x"
        ));
    }

    #[test]
    fn test_assign_with_declared_type() {
        let nodes = parse("✍️x:📝 = 10");
        assert!(matches!(
            &nodes[0],
            Node::Assign {
                declared: Type::Text,
                value: AssignValue::Number(10),
                ..
            }
        ));
    }

    #[test]
    fn test_print_reassembles_interpolation() {
        let nodes = parse("🖨️\"Oi 💱{name}!\"");
        let Node::Print { text, names } = &nodes[0] else {
            panic!("expected a print node");
        };
        assert_eq!(text, "Oi 💱{name}!");
        assert_eq!(names, &["name".to_string()]);
    }

    #[test]
    fn test_print_deduplicates_placeholder_names() {
        let nodes = parse("🖨️\"💱{a} 💱{b} 💱{a}\"");
        let Node::Print { names, .. } = &nodes[0] else {
            panic!("expected a print node");
        };
        assert_eq!(names, &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_function_def() {
        let nodes = parse("▶️double(n:🔢):🔢 { ↩️ n✖️n }");
        let Node::FunctionDef(function) = &nodes[0] else {
            panic!("expected a function definition");
        };
        assert_eq!(function.name, "double");
        assert_eq!(function.params.len(), 1);
        assert_eq!(function.params[0].name, "n");
        assert_eq!(function.params[0].ty, Type::Number);
        assert_eq!(function.return_type, Type::Number);
        let Node::Return(value) = &function.body[0] else {
            panic!("expected a return statement");
        };
        // Parameter annotations flow into the body's expression types.
        assert_eq!(value.static_type(), Type::Number);
    }

    #[test]
    fn test_expression_chain_is_left_associative() {
        let nodes = parse("✍️a = 1 ✍️b = 2 ✍️c = 3 a➕b✖️c");
        let Node::BinaryOp { left, op, .. } = &nodes[3] else {
            panic!("expected a binary chain");
        };
        assert_eq!(*op, Operator::Mult);
        assert!(matches!(**left, Node::BinaryOp { op: Operator::NumPlus, .. }));
    }

    #[test]
    fn test_equality_test_lookahead() {
        let nodes = parse("x🟰10");
        assert!(matches!(
            &nodes[0],
            Node::EqualityTest { name, value: TestLiteral::Number(10) } if name == "x"
        ));
    }

    #[test]
    fn test_call_statement() {
        let nodes = parse("foo(1, 2)");
        let Node::FunctionCall { name, args } = &nodes[0] else {
            panic!("expected a call");
        };
        assert_eq!(name, "foo");
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_main_block_and_try_catch() {
        let nodes = parse("main ✍️✍️ { 🖨️\"oi\" } 🚀verifyUser,2👨🏿‍💻 { 🖨️\"a\" } 🤦🏿‍♂️ { 🖨️\"b\" }");
        assert!(matches!(&nodes[0], Node::Main(body) if body.len() == 1));
        assert!(matches!(
            &nodes[1],
            Node::TryCatch { try_body, catch_body }
                if try_body.len() == 1 && catch_body.len() == 1
        ));
    }

    #[test]
    fn test_mismatch_is_fatal_with_kinds() {
        let toks = tokens("✍️x 10").unwrap();
        let err = program(&toks).unwrap_err();
        assert_eq!(
            err,
            ParseError::Expected {
                expected: TokenKind::EqualSign,
                found: TokenKind::Number,
            }
        );
    }

    #[test]
    fn test_unknown_leading_token_skipped() {
        // A stray operator opens no statement; the loop steps over it.
        let nodes = parse("➕ ✍️x = 1");
        assert_eq!(nodes.len(), 1);
        assert!(matches!(&nodes[0], Node::Assign { .. }));
    }
}
