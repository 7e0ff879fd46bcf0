//! Recursive-descent parser building a syntax tree for Puppetfiles
//!
//! Only the structure of the code is recovered; nothing is evaluated.

use super::lexer::{is_keyword, Lexeme, Lexer, Token};
use crate::error::PuppetfileError;

/// A node of the syntax tree
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Node {
    Str(String),
    Symbol(String),
    Number(String),
    Bool(bool),
    Nil,
    SelfRef,
    /// Local variable, instance variable or argument-less method call
    Ident(String),
    /// Constant, possibly scoped (`Foo::Bar`)
    Const(String),
    Array(Vec<Node>),
    Hash(Vec<(Node, Node)>),
    Call {
        receiver: Option<Box<Node>>,
        name: String,
        args: Vec<Node>,
        block: Option<Vec<Node>>,
        line: usize,
    },
    Index {
        target: Box<Node>,
        args: Vec<Node>,
    },
    Unary {
        op: &'static str,
        operand: Box<Node>,
    },
    Binary {
        op: &'static str,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    Assign {
        op: &'static str,
        target: Box<Node>,
        value: Box<Node>,
    },
    If {
        condition: Box<Node>,
        then_branch: Vec<Node>,
        else_branch: Vec<Node>,
    },
    While {
        condition: Box<Node>,
        body: Vec<Node>,
    },
    Case {
        subject: Option<Box<Node>>,
        whens: Vec<(Vec<Node>, Vec<Node>)>,
        else_branch: Vec<Node>,
    },
    /// `begin ... end`, parenthesized statements and `for` loops
    Block(Vec<Node>),
    Def {
        name: String,
        body: Vec<Node>,
    },
}

impl Node {
    /// Direct children, in source order
    pub(super) fn children(&self) -> Vec<&Node> {
        match self {
            Node::Str(_)
            | Node::Symbol(_)
            | Node::Number(_)
            | Node::Bool(_)
            | Node::Nil
            | Node::SelfRef
            | Node::Ident(_)
            | Node::Const(_) => Vec::new(),
            Node::Array(items) | Node::Block(items) => items.iter().collect(),
            Node::Def { body, .. } => body.iter().collect(),
            Node::Hash(pairs) => pairs.iter().flat_map(|(k, v)| [k, v]).collect(),
            Node::Call {
                receiver,
                args,
                block,
                ..
            } => receiver
                .iter()
                .map(Box::as_ref)
                .chain(args.iter())
                .chain(block.iter().flatten())
                .collect(),
            Node::Index { target, args } => std::iter::once(target.as_ref()).chain(args).collect(),
            Node::Unary { operand, .. } => vec![operand.as_ref()],
            Node::Binary { lhs, rhs, .. } => vec![lhs.as_ref(), rhs.as_ref()],
            Node::Assign { target, value, .. } => vec![target.as_ref(), value.as_ref()],
            Node::If {
                condition,
                then_branch,
                else_branch,
            } => std::iter::once(condition.as_ref())
                .chain(then_branch)
                .chain(else_branch)
                .collect(),
            Node::While { condition, body } => {
                std::iter::once(condition.as_ref()).chain(body).collect()
            }
            Node::Case {
                subject,
                whens,
                else_branch,
            } => subject
                .iter()
                .map(Box::as_ref)
                .chain(whens.iter().flat_map(|(values, body)| values.iter().chain(body)))
                .chain(else_branch)
                .collect(),
        }
    }
}

/// Parses Puppetfile source into top-level statements
pub(super) fn parse(source: &str) -> Result<Vec<Node>, PuppetfileError> {
    let tokens = Lexer::new(source).tokenize()?;
    Parser::new(tokens).parse_program()
}

/// Words that close a body
const BODY_END: &[&str] = &["end", "else", "elsif", "when", "in", "rescue", "ensure"];

/// Words that never start a command argument
const NOT_ARGUMENT: &[&str] = &[
    "and", "do", "else", "elsif", "end", "ensure", "if", "in", "or", "rescue", "then", "unless",
    "until", "when", "while",
];

const ASSIGN_OPS: &[&str] = &[
    "=", "+=", "-=", "*=", "/=", "%=", "**=", "||=", "&&=", "|=", "&=", "^=", "<<=", ">>=",
];

/// Binding power of a binary operator (higher binds tighter)
fn binding_power(op: &str) -> Option<(u8, u8)> {
    let bp = match op {
        ".." | "..." => (1, 2),
        "||" => (3, 4),
        "&&" => (5, 6),
        "==" | "!=" | "=~" | "!~" | "===" | "<=>" => (7, 8),
        "<" | "<=" | ">" | ">=" => (9, 10),
        "|" | "^" => (11, 12),
        "&" => (13, 14),
        "<<" | ">>" => (15, 16),
        "+" | "-" => (17, 18),
        "*" | "/" | "%" => (19, 20),
        "**" => (22, 21),
        _ => return None,
    };
    Some(bp)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    // --- Token helpers ---

    fn current(&self) -> &Token {
        // tokenize always ends with Eof
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &Lexeme {
        &self.current().lexeme
    }

    fn peek_nth(&self, n: usize) -> &Lexeme {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + n).min(last)].lexeme
    }

    fn line(&self) -> usize {
        self.current().line
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn at_punct(&self, punct: &str) -> bool {
        matches!(self.peek(), Lexeme::Punct(p) if *p == punct)
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Lexeme::Ident(w) if w == keyword)
    }

    fn at_eof(&self) -> bool {
        *self.peek() == Lexeme::Eof
    }

    fn at_term(&self) -> bool {
        *self.peek() == Lexeme::Newline || self.at_punct(";")
    }

    fn eat_punct(&mut self, punct: &str) -> bool {
        if self.at_punct(punct) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.at_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn skip_newlines(&mut self) {
        while *self.peek() == Lexeme::Newline {
            self.advance();
        }
    }

    fn skip_terms(&mut self) {
        while self.at_term() {
            self.advance();
        }
    }

    fn unexpected(&self) -> PuppetfileError {
        PuppetfileError::syntax(self.line(), format!("unexpected {}", self.peek().describe()))
    }

    fn expect_punct(&mut self, punct: &str, opened_on: usize) -> Result<(), PuppetfileError> {
        if self.eat_punct(punct) {
            return Ok(());
        }
        let message = format!(
            "expected `{}` to close the delimiter opened on line {}, found {}",
            punct,
            opened_on,
            self.peek().describe()
        );
        Err(PuppetfileError::syntax(self.line(), message))
    }

    fn expect_end(&mut self, construct: &str, opened_on: usize) -> Result<(), PuppetfileError> {
        if self.eat_keyword("end") {
            return Ok(());
        }
        let message = if self.at_eof() {
            format!("missing `end` for `{}` opened on line {}", construct, opened_on)
        } else {
            format!(
                "expected `end` for `{}` opened on line {}, found {}",
                construct,
                opened_on,
                self.peek().describe()
            )
        };
        Err(PuppetfileError::syntax(self.line(), message))
    }

    // --- Statements ---

    fn parse_program(mut self) -> Result<Vec<Node>, PuppetfileError> {
        let body = self.parse_statements()?;
        if !self.at_eof() {
            return Err(self.unexpected());
        }
        Ok(body)
    }

    /// Statements up to the end of a body, a closing delimiter or the end of input
    fn parse_statements(&mut self) -> Result<Vec<Node>, PuppetfileError> {
        let mut body = Vec::new();
        loop {
            self.skip_terms();
            if self.at_body_end() {
                return Ok(body);
            }
            body.push(self.parse_statement()?);
            if !self.at_term() && !self.at_body_end() {
                return Err(self.unexpected());
            }
        }
    }

    fn at_body_end(&self) -> bool {
        match self.peek() {
            Lexeme::Eof => true,
            Lexeme::Punct(p) => *p == "}" || *p == ")",
            Lexeme::Ident(w) => BODY_END.contains(&w.as_str()),
            _ => false,
        }
    }

    fn parse_statement(&mut self) -> Result<Node, PuppetfileError> {
        let mut node = self.parse_not()?;

        // Modifiers
        loop {
            if self.eat_keyword("if") {
                let condition = self.parse_not()?;
                node = Node::If {
                    condition: Box::new(condition),
                    then_branch: vec![node],
                    else_branch: Vec::new(),
                };
            } else if self.eat_keyword("unless") {
                let condition = self.parse_not()?;
                node = Node::If {
                    condition: Box::new(condition),
                    then_branch: Vec::new(),
                    else_branch: vec![node],
                };
            } else if self.at_keyword("while") || self.at_keyword("until") {
                self.advance();
                let condition = self.parse_not()?;
                node = Node::While {
                    condition: Box::new(condition),
                    body: vec![node],
                };
            } else if self.eat_keyword("rescue") {
                let fallback = self.parse_not()?;
                node = Node::Block(vec![node, fallback]);
            } else {
                return Ok(node);
            }
        }
    }

    /// `not`, `and`, `or`
    fn parse_not(&mut self) -> Result<Node, PuppetfileError> {
        let mut lhs = if self.eat_keyword("not") {
            Node::Unary {
                op: "!",
                operand: Box::new(self.parse_not()?),
            }
        } else {
            self.parse_expr()?
        };

        loop {
            let op = if self.eat_keyword("and") {
                "&&"
            } else if self.eat_keyword("or") {
                "||"
            } else {
                return Ok(lhs);
            };
            self.skip_newlines();
            let rhs = if self.eat_keyword("not") {
                Node::Unary {
                    op: "!",
                    operand: Box::new(self.parse_expr()?),
                }
            } else {
                self.parse_expr()?
            };
            lhs = Node::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    // --- Expressions ---

    fn parse_expr(&mut self) -> Result<Node, PuppetfileError> {
        let target = self.parse_ternary()?;

        let op = match self.peek() {
            Lexeme::Punct(p) if ASSIGN_OPS.contains(p) => *p,
            _ => return Ok(target),
        };
        self.advance();
        self.skip_newlines();
        let value = self.parse_expr()?;
        Ok(Node::Assign {
            op,
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    fn parse_ternary(&mut self) -> Result<Node, PuppetfileError> {
        let condition = self.parse_binary(0)?;
        if !self.eat_punct("?") {
            return Ok(condition);
        }
        self.skip_newlines();
        let then_value = self.parse_ternary()?;
        self.skip_newlines();
        let line = self.line();
        if !self.eat_punct(":") {
            return Err(PuppetfileError::syntax(
                line,
                format!("expected `:` in conditional expression, found {}", self.peek().describe()),
            ));
        }
        self.skip_newlines();
        let else_value = self.parse_ternary()?;
        Ok(Node::If {
            condition: Box::new(condition),
            then_branch: vec![then_value],
            else_branch: vec![else_value],
        })
    }

    fn parse_binary(&mut self, min_bp: u8) -> Result<Node, PuppetfileError> {
        let mut lhs = self.parse_unary()?;

        loop {
            let op = match self.peek() {
                Lexeme::Punct(p) => *p,
                _ => break,
            };
            let Some((l_bp, r_bp)) = binding_power(op) else {
                break;
            };
            if l_bp < min_bp {
                break;
            }

            self.advance();
            self.skip_newlines();
            let rhs = self.parse_binary(r_bp)?;
            lhs = Node::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }

        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Node, PuppetfileError> {
        for op in ["!", "-", "+", "~"] {
            if self.eat_punct(op) {
                let operand = self.parse_unary()?;
                return Ok(Node::Unary {
                    op,
                    operand: Box::new(operand),
                });
            }
        }
        let primary = self.parse_primary()?;
        self.parse_postfix(primary)
    }

    fn parse_postfix(&mut self, mut node: Node) -> Result<Node, PuppetfileError> {
        loop {
            // Method chains may continue on the next line with a leading dot
            if *self.peek() == Lexeme::Newline && self.next_line_continues_chain() {
                self.skip_newlines();
            }

            if self.at_punct(".") || self.at_punct("&.") {
                self.advance();
                self.skip_newlines();
                let line = self.line();
                let name = match self.advance().lexeme {
                    Lexeme::Ident(name) | Lexeme::Const(name) => name,
                    Lexeme::Label(name) => {
                        // `foo.bar:` cannot be a method name
                        return Err(PuppetfileError::syntax(
                            line,
                            format!("unexpected label `{}:`", name),
                        ));
                    }
                    other => {
                        return Err(PuppetfileError::syntax(
                            line,
                            format!("unexpected {} after `.`", other.describe()),
                        ))
                    }
                };
                node = self.parse_call(Some(node), name, line)?;
            } else if self.at_punct("::") {
                self.advance();
                let line = self.line();
                match (self.advance().lexeme, node) {
                    (Lexeme::Const(name), Node::Const(scope)) => {
                        node = Node::Const(format!("{}::{}", scope, name));
                    }
                    (Lexeme::Ident(name) | Lexeme::Const(name), receiver) => {
                        node = self.parse_call(Some(receiver), name, line)?;
                    }
                    (other, _) => {
                        return Err(PuppetfileError::syntax(
                            line,
                            format!("unexpected {} after `::`", other.describe()),
                        ))
                    }
                }
            } else if self.at_punct("[") && !self.current().spaced {
                let opened_on = self.line();
                self.advance();
                let args = self.parse_list("]", opened_on)?;
                node = Node::Index {
                    target: Box::new(node),
                    args,
                };
            } else {
                return Ok(node);
            }
        }
    }

    fn next_line_continues_chain(&self) -> bool {
        let mut n = 0;
        while *self.peek_nth(n) == Lexeme::Newline {
            n += 1;
        }
        matches!(self.peek_nth(n), Lexeme::Punct(".") | Lexeme::Punct("&."))
    }

    fn parse_primary(&mut self) -> Result<Node, PuppetfileError> {
        let line = self.line();

        match self.peek().clone() {
            Lexeme::Str(value) => {
                self.advance();
                Ok(Node::Str(value))
            }
            Lexeme::Symbol(value) => {
                self.advance();
                Ok(Node::Symbol(value))
            }
            Lexeme::Number(value) => {
                self.advance();
                Ok(Node::Number(value))
            }
            Lexeme::Const(name) => {
                self.advance();
                if self.at_punct("(") && !self.current().spaced {
                    return self.parse_call(None, name, line);
                }
                Ok(Node::Const(name))
            }
            Lexeme::Ident(word) => self.parse_word(word, line),
            Lexeme::Punct("(") => {
                self.advance();
                let body = self.parse_statements()?;
                self.expect_punct(")", line)?;
                Ok(Node::Block(body))
            }
            Lexeme::Punct("[") => {
                self.advance();
                Ok(Node::Array(self.parse_list("]", line)?))
            }
            Lexeme::Punct("{") => {
                self.advance();
                self.parse_hash(line)
            }
            Lexeme::Punct("::") => {
                self.advance();
                match self.advance().lexeme {
                    Lexeme::Const(name) => Ok(Node::Const(name)),
                    other => Err(PuppetfileError::syntax(
                        line,
                        format!("unexpected {} after `::`", other.describe()),
                    )),
                }
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_word(&mut self, word: String, line: usize) -> Result<Node, PuppetfileError> {
        match word.as_str() {
            "true" => {
                self.advance();
                Ok(Node::Bool(true))
            }
            "false" => {
                self.advance();
                Ok(Node::Bool(false))
            }
            "nil" => {
                self.advance();
                Ok(Node::Nil)
            }
            "self" => {
                self.advance();
                Ok(Node::SelfRef)
            }
            "if" | "unless" => {
                self.advance();
                self.parse_if(&word, line)
            }
            "while" | "until" => {
                self.advance();
                self.parse_while(&word, line)
            }
            "case" => {
                self.advance();
                self.parse_case(line)
            }
            "begin" => {
                self.advance();
                self.parse_begin(line)
            }
            "def" => {
                self.advance();
                self.parse_def(line)
            }
            "for" => {
                self.advance();
                self.parse_for(line)
            }
            _ if is_keyword(&word) => Err(self.unexpected()),
            _ => {
                self.advance();
                self.parse_call(None, word, line)
            }
        }
    }

    // --- Calls ---

    /// Arguments and block following a method name, if any
    fn parse_call(
        &mut self,
        receiver: Option<Node>,
        name: String,
        line: usize,
    ) -> Result<Node, PuppetfileError> {
        let (args, parenthesized) = if self.at_punct("(") && !self.current().spaced {
            let opened_on = self.line();
            self.advance();
            (self.parse_arguments(Some(opened_on))?, true)
        } else if self.at_command_argument() {
            (self.parse_arguments(None)?, false)
        } else {
            (Vec::new(), false)
        };

        let block = if self.at_keyword("do") {
            let opened_on = self.line();
            self.advance();
            self.skip_block_params()?;
            let body = self.parse_statements()?;
            self.expect_end("do", opened_on)?;
            Some(body)
        } else if self.at_punct("{") && (args.is_empty() || parenthesized) {
            let opened_on = self.line();
            self.advance();
            self.skip_block_params()?;
            let body = self.parse_statements()?;
            self.expect_punct("}", opened_on)?;
            Some(body)
        } else {
            None
        };

        if receiver.is_none() && args.is_empty() && block.is_none() && !parenthesized {
            return Ok(Node::Ident(name));
        }
        Ok(Node::Call {
            receiver: receiver.map(Box::new),
            name,
            args,
            block,
            line,
        })
    }

    /// Whether the current token starts an argument of a call without parentheses
    fn at_command_argument(&self) -> bool {
        let token = self.current();
        if !token.spaced {
            return false;
        }
        match &token.lexeme {
            Lexeme::Str(_)
            | Lexeme::Symbol(_)
            | Lexeme::Number(_)
            | Lexeme::Const(_)
            | Lexeme::Label(_) => true,
            Lexeme::Ident(word) => !NOT_ARGUMENT.contains(&word.as_str()),
            Lexeme::Punct(p) => *p == "[" || *p == "::",
            Lexeme::Newline | Lexeme::Eof => false,
        }
    }

    /// Comma separated arguments; trailing `key => value` pairs become one hash
    fn parse_arguments(&mut self, opened_on: Option<usize>) -> Result<Vec<Node>, PuppetfileError> {
        let mut args = Vec::new();
        let mut pairs = Vec::new();

        loop {
            if opened_on.is_some() {
                self.skip_newlines();
                if self.at_punct(")") {
                    break;
                }
            }

            if let Lexeme::Label(key) = self.peek().clone() {
                self.advance();
                self.skip_newlines();
                pairs.push((Node::Symbol(key), self.parse_argument()?));
            } else {
                let arg = self.parse_argument()?;
                if self.eat_punct("=>") {
                    self.skip_newlines();
                    pairs.push((arg, self.parse_argument()?));
                } else {
                    args.push(arg);
                }
            }

            if !self.eat_punct(",") {
                break;
            }
            self.skip_newlines();
        }

        if !pairs.is_empty() {
            args.push(Node::Hash(pairs));
        }
        if let Some(opened_on) = opened_on {
            self.skip_newlines();
            self.expect_punct(")", opened_on)?;
        }
        Ok(args)
    }

    fn parse_argument(&mut self) -> Result<Node, PuppetfileError> {
        for op in ["*", "**", "&"] {
            if self.eat_punct(op) {
                let operand = self.parse_ternary()?;
                return Ok(Node::Unary {
                    op,
                    operand: Box::new(operand),
                });
            }
        }
        self.parse_expr()
    }

    fn skip_block_params(&mut self) -> Result<(), PuppetfileError> {
        if self.eat_punct("||") {
            return Ok(());
        }
        if !self.at_punct("|") {
            return Ok(());
        }
        let opened_on = self.line();
        self.advance();
        while !self.at_punct("|") {
            if self.at_eof() {
                return Err(PuppetfileError::syntax(
                    opened_on,
                    "unterminated block parameters",
                ));
            }
            self.advance();
        }
        self.advance();
        Ok(())
    }

    // --- Literals ---

    /// Elements up to `close`, separated by commas
    fn parse_list(&mut self, close: &str, opened_on: usize) -> Result<Vec<Node>, PuppetfileError> {
        let mut items = Vec::new();
        let mut pairs = Vec::new();
        loop {
            self.skip_newlines();
            if self.at_punct(close) {
                break;
            }
            if let Lexeme::Label(key) = self.peek().clone() {
                self.advance();
                self.skip_newlines();
                pairs.push((Node::Symbol(key), self.parse_argument()?));
            } else {
                let item = self.parse_argument()?;
                if self.eat_punct("=>") {
                    self.skip_newlines();
                    pairs.push((item, self.parse_argument()?));
                } else {
                    items.push(item);
                }
            }
            self.skip_newlines();
            if !self.eat_punct(",") {
                break;
            }
        }
        if !pairs.is_empty() {
            items.push(Node::Hash(pairs));
        }
        self.skip_newlines();
        self.expect_punct(close, opened_on)?;
        Ok(items)
    }

    fn parse_hash(&mut self, opened_on: usize) -> Result<Node, PuppetfileError> {
        let mut pairs = Vec::new();
        loop {
            self.skip_newlines();
            if self.at_punct("}") {
                break;
            }
            if let Lexeme::Label(key) = self.peek().clone() {
                self.advance();
                self.skip_newlines();
                pairs.push((Node::Symbol(key), self.parse_argument()?));
            } else {
                let key = self.parse_argument()?;
                self.skip_newlines();
                let line = self.line();
                if !self.eat_punct("=>") {
                    return Err(PuppetfileError::syntax(
                        line,
                        format!("expected `=>` in hash literal, found {}", self.peek().describe()),
                    ));
                }
                self.skip_newlines();
                pairs.push((key, self.parse_argument()?));
            }
            self.skip_newlines();
            if !self.eat_punct(",") {
                break;
            }
        }
        self.skip_newlines();
        self.expect_punct("}", opened_on)?;
        Ok(Node::Hash(pairs))
    }

    // --- Compound statements ---

    /// `if`/`unless` after the keyword; `elsif` chains nest in the else branch
    fn parse_if(&mut self, keyword: &str, opened_on: usize) -> Result<Node, PuppetfileError> {
        let condition = self.parse_not()?;
        self.eat_keyword("then");
        let body = self.parse_statements()?;

        let else_branch = if keyword == "if" && self.at_keyword("elsif") {
            let line = self.line();
            self.advance();
            // The nested `if` consumes the shared `end`
            return Ok(Node::If {
                condition: Box::new(condition),
                then_branch: body,
                else_branch: vec![self.parse_if("if", line)?],
            });
        } else if self.eat_keyword("else") {
            self.parse_statements()?
        } else {
            Vec::new()
        };
        self.expect_end(keyword, opened_on)?;

        let (then_branch, else_branch) = if keyword == "unless" {
            (else_branch, body)
        } else {
            (body, else_branch)
        };
        Ok(Node::If {
            condition: Box::new(condition),
            then_branch,
            else_branch,
        })
    }

    fn parse_while(&mut self, keyword: &str, opened_on: usize) -> Result<Node, PuppetfileError> {
        let condition = self.parse_not()?;
        self.eat_keyword("do");
        let body = self.parse_statements()?;
        self.expect_end(keyword, opened_on)?;
        Ok(Node::While {
            condition: Box::new(condition),
            body,
        })
    }

    fn parse_case(&mut self, opened_on: usize) -> Result<Node, PuppetfileError> {
        let subject = if self.at_term() {
            None
        } else {
            Some(Box::new(self.parse_not()?))
        };
        self.skip_terms();

        let mut whens = Vec::new();
        while self.eat_keyword("when") {
            let mut values = vec![self.parse_argument()?];
            while self.eat_punct(",") {
                self.skip_newlines();
                values.push(self.parse_argument()?);
            }
            self.eat_keyword("then");
            let body = self.parse_statements()?;
            whens.push((values, body));
        }
        if whens.is_empty() {
            return Err(PuppetfileError::syntax(
                self.line(),
                format!("expected `when`, found {}", self.peek().describe()),
            ));
        }

        let else_branch = if self.eat_keyword("else") {
            self.parse_statements()?
        } else {
            Vec::new()
        };
        self.expect_end("case", opened_on)?;

        Ok(Node::Case {
            subject,
            whens,
            else_branch,
        })
    }

    /// Body with optional `rescue`/`else`/`ensure` clauses, up to `end`
    fn parse_body_with_rescue(&mut self) -> Result<Vec<Node>, PuppetfileError> {
        let mut body = self.parse_statements()?;
        while self.eat_keyword("rescue") {
            // Exception classes and the `=> e` binding
            while !self.at_term() && !self.at_keyword("then") && !self.at_body_end() {
                if self.eat_punct("=>") || self.eat_punct(",") {
                    continue;
                }
                body.push(self.parse_ternary()?);
            }
            self.eat_keyword("then");
            body.extend(self.parse_statements()?);
        }
        if self.eat_keyword("else") {
            body.extend(self.parse_statements()?);
        }
        if self.eat_keyword("ensure") {
            body.extend(self.parse_statements()?);
        }
        Ok(body)
    }

    fn parse_begin(&mut self, opened_on: usize) -> Result<Node, PuppetfileError> {
        let body = self.parse_body_with_rescue()?;
        self.expect_end("begin", opened_on)?;
        Ok(Node::Block(body))
    }

    fn parse_def(&mut self, opened_on: usize) -> Result<Node, PuppetfileError> {
        let mut name = match self.advance().lexeme {
            Lexeme::Ident(name) | Lexeme::Const(name) => name,
            other => {
                return Err(PuppetfileError::syntax(
                    opened_on,
                    format!("unexpected {} after `def`", other.describe()),
                ))
            }
        };
        // def self.name
        if self.eat_punct(".") {
            if let Lexeme::Ident(method) = self.advance().lexeme {
                name = format!("{}.{}", name, method);
            }
        }

        // Parameters are not needed by the walk
        if self.at_punct("(") {
            let params_line = self.line();
            self.advance();
            let mut depth = 1usize;
            while depth > 0 {
                if self.at_eof() {
                    return Err(PuppetfileError::syntax(
                        params_line,
                        "expected `)` to close method parameters",
                    ));
                }
                if self.at_punct("(") {
                    depth += 1;
                } else if self.at_punct(")") {
                    depth -= 1;
                }
                self.advance();
            }
        } else {
            while !self.at_term() && !self.at_eof() {
                self.advance();
            }
        }

        let body = self.parse_body_with_rescue()?;
        self.expect_end("def", opened_on)?;
        Ok(Node::Def { name, body })
    }

    fn parse_for(&mut self, opened_on: usize) -> Result<Node, PuppetfileError> {
        while !self.at_keyword("in") {
            if self.at_eof() || self.at_term() {
                return Err(PuppetfileError::syntax(
                    self.line(),
                    format!("expected `in` in `for` loop, found {}", self.peek().describe()),
                ));
            }
            self.advance();
        }
        self.advance();
        let iterable = self.parse_not()?;
        self.eat_keyword("do");
        let mut body = vec![iterable];
        body.extend(self.parse_statements()?);
        self.expect_end("for", opened_on)?;
        Ok(Node::Block(body))
    }
}
