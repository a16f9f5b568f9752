// this_file: crates/glyphrules-extract/src/parser.rs

//! Statement splitting, block lookup and a recursive-descent expression parser.

use crate::ast::{Arg, BinOp, BoolOp, CmpOp, DictItem, Expr, Target, UnaryOp};
use crate::lexer::{LogicalLine, Token, TokenKind};
use glyphrules_core::{Error, Result};

const STATEMENT_KEYWORDS: &[&str] = &[
    "assert", "async", "break", "class", "continue", "def", "del", "elif", "else", "except",
    "finally", "for", "from", "global", "if", "import", "nonlocal", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

const RESERVED: &[&str] = &[
    "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del", "elif",
    "else", "except", "finally", "for", "from", "global", "if", "import", "in", "is", "lambda",
    "nonlocal", "not", "or", "pass", "raise", "return", "try", "while", "with", "yield",
];

/// A simple `target = ... = value` statement.
#[derive(Debug)]
pub struct Assignment<'a> {
    pub targets: Vec<Target>,
    pub value: &'a [Token],
    pub line: usize,
}

/// Split a logical line into assignment targets and the value tokens.
///
/// Returns `None` for anything that is not a plain assignment, including
/// augmented and annotated assignments.
pub fn split_assignment(line: &LogicalLine) -> Option<Assignment<'_>> {
    let first = line.tokens.first()?;
    if let TokenKind::Name(name) = &first.kind {
        if STATEMENT_KEYWORDS.contains(&name.as_str()) {
            return None;
        }
    }

    let mut depth = 0usize;
    let mut splits = Vec::new();
    for (i, token) in line.tokens.iter().enumerate() {
        match token.kind {
            TokenKind::Op("(" | "[" | "{") => depth += 1,
            TokenKind::Op(")" | "]" | "}") => depth = depth.saturating_sub(1),
            TokenKind::Op("=") if depth == 0 => splits.push(i),
            _ => {}
        }
    }
    let last = *splits.last()?;

    let mut targets = Vec::with_capacity(splits.len());
    let mut start = 0;
    for split in &splits {
        targets.push(classify_target(&line.tokens[start..*split]));
        start = split + 1;
    }
    Some(Assignment {
        targets,
        value: &line.tokens[last + 1..],
        line: line.line,
    })
}

fn classify_target(tokens: &[Token]) -> Target {
    match tokens {
        [Token {
            kind: TokenKind::Name(name),
            ..
        }] if !RESERVED.contains(&name.as_str()) => Target::Name(name.clone()),
        [first, rest @ ..] if !rest.is_empty() => {
            let mut path = match &first.kind {
                TokenKind::Name(name) => name.clone(),
                _ => return Target::Other,
            };
            for pair in rest.chunks(2) {
                match pair {
                    [dot, Token {
                        kind: TokenKind::Name(attr),
                        ..
                    }] if dot.is_op(".") => {
                        path.push('.');
                        path.push_str(attr);
                    }
                    _ => return Target::Other,
                }
            }
            Target::Attribute(path)
        }
        _ => Target::Other,
    }
}

/// Body statements of the indented block opened by `header`, at the body's
/// own indentation only.
pub fn block_body(lines: &[LogicalLine], header: usize) -> Vec<&LogicalLine> {
    let Some(head) = lines.get(header) else {
        return Vec::new();
    };
    let block: Vec<&LogicalLine> = lines[header + 1..]
        .iter()
        .take_while(|l| l.indent > head.indent)
        .collect();
    let Some(body_indent) = block.first().map(|l| l.indent) else {
        return Vec::new();
    };
    block
        .into_iter()
        .filter(|l| l.indent == body_indent)
        .collect()
}

/// Index of the first line opening `keyword name` (e.g. `class font_patcher`).
pub fn find_definition<'a>(
    lines: impl IntoIterator<Item = (usize, &'a LogicalLine)>,
    keyword: &str,
    name: &str,
) -> Option<usize> {
    lines.into_iter().find_map(|(i, line)| {
        let opens = matches!(
            line.tokens.as_slice(),
            [kw, n, ..] if kw.is_name(keyword) && n.is_name(name)
        );
        opens.then_some(i)
    })
}

/// Parse a complete expression (a bare tuple is allowed) from `tokens`.
pub fn parse_expression(tokens: &[Token]) -> Result<Expr> {
    let mut parser = ExprParser { tokens, pos: 0 };
    if tokens.is_empty() {
        return Err(Error::parse(0, "empty expression"));
    }
    let expr = parser.expr_list()?;
    if parser.pos < tokens.len() {
        return Err(parser.unexpected());
    }
    Ok(expr)
}

struct ExprParser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> ExprParser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&'a Token> {
        self.tokens.get(self.pos + offset)
    }

    fn line(&self) -> usize {
        self.peek()
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
            .unwrap_or(0)
    }

    fn error(&self, reason: impl Into<String>) -> Error {
        Error::parse(self.line(), reason)
    }

    fn unexpected(&self) -> Error {
        match self.peek() {
            Some(token) => self.error(format!("unexpected token {:?}", token.kind)),
            None => self.error("unexpected end of expression"),
        }
    }

    fn at_op(&self, op: &str) -> bool {
        self.peek().is_some_and(|t| t.is_op(op))
    }

    fn at_name(&self, name: &str) -> bool {
        self.peek().is_some_and(|t| t.is_name(name))
    }

    fn eat_op(&mut self, op: &str) -> bool {
        if self.at_op(op) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_name(&mut self, name: &str) -> bool {
        if self.at_name(name) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_op(&mut self, op: &str) -> Result<()> {
        if self.eat_op(op) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{op}'")))
        }
    }

    /// True when the next token can close an expression list.
    fn at_list_end(&self) -> bool {
        match self.peek() {
            None => true,
            Some(t) => matches!(t.kind, TokenKind::Op(")" | "]" | "}" | ":" | "=")),
        }
    }

    fn expr_list(&mut self) -> Result<Expr> {
        let first = self.expr()?;
        if !self.at_op(",") {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat_op(",") {
            if self.at_list_end() {
                break;
            }
            items.push(self.expr()?);
        }
        Ok(Expr::Tuple(items))
    }

    fn expr(&mut self) -> Result<Expr> {
        if self.at_name("lambda") {
            return Err(self.error("lambda expressions are not supported"));
        }
        let body = self.or_expr()?;
        if !self.eat_name("if") {
            return Ok(body);
        }
        let test = self.or_expr()?;
        if !self.eat_name("else") {
            return Err(self.error("expected 'else' in conditional expression"));
        }
        let orelse = self.expr()?;
        Ok(Expr::IfElse {
            body: Box::new(body),
            test: Box::new(test),
            orelse: Box::new(orelse),
        })
    }

    fn or_expr(&mut self) -> Result<Expr> {
        self.bool_chain(BoolOp::Or)
    }

    fn bool_chain(&mut self, op: BoolOp) -> Result<Expr> {
        let keyword = match op {
            BoolOp::Or => "or",
            BoolOp::And => "and",
        };
        let operand = |p: &mut Self| match op {
            BoolOp::Or => p.bool_chain(BoolOp::And),
            BoolOp::And => p.not_expr(),
        };
        let first = operand(self)?;
        if !self.at_name(keyword) {
            return Ok(first);
        }
        let mut values = vec![first];
        while self.eat_name(keyword) {
            values.push(operand(self)?);
        }
        Ok(Expr::BoolOp(op, values))
    }

    fn not_expr(&mut self) -> Result<Expr> {
        if self.eat_name("not") {
            let operand = self.not_expr()?;
            return Ok(Expr::Unary(UnaryOp::Not, Box::new(operand)));
        }
        self.comparison()
    }

    fn comparison_op(&mut self) -> Option<CmpOp> {
        let token = self.peek()?;
        let op = match &token.kind {
            TokenKind::Op("==") => CmpOp::Eq,
            TokenKind::Op("!=") => CmpOp::NotEq,
            TokenKind::Op("<") => CmpOp::Lt,
            TokenKind::Op("<=") => CmpOp::LtE,
            TokenKind::Op(">") => CmpOp::Gt,
            TokenKind::Op(">=") => CmpOp::GtE,
            TokenKind::Name(n) if n == "in" => CmpOp::In,
            TokenKind::Name(n) if n == "not" => {
                if !self.peek_at(1).is_some_and(|t| t.is_name("in")) {
                    return None;
                }
                self.pos += 1;
                CmpOp::NotIn
            }
            TokenKind::Name(n) if n == "is" => {
                if self.peek_at(1).is_some_and(|t| t.is_name("not")) {
                    self.pos += 1;
                    CmpOp::IsNot
                } else {
                    CmpOp::Is
                }
            }
            _ => return None,
        };
        self.pos += 1;
        Some(op)
    }

    fn comparison(&mut self) -> Result<Expr> {
        let left = self.bit_or()?;
        let mut rest = Vec::new();
        while let Some(op) = self.comparison_op() {
            rest.push((op, self.bit_or()?));
        }
        if rest.is_empty() {
            Ok(left)
        } else {
            Ok(Expr::Compare(Box::new(left), rest))
        }
    }

    /// Left-associative binary level over `ops`, descending into `next`.
    fn binary_level(
        &mut self,
        ops: &[(&str, BinOp)],
        next: fn(&mut Self) -> Result<Expr>,
    ) -> Result<Expr> {
        let mut left = next(self)?;
        'outer: loop {
            for (symbol, op) in ops {
                if self.eat_op(symbol) {
                    let right = next(self)?;
                    left = Expr::Binary(*op, Box::new(left), Box::new(right));
                    continue 'outer;
                }
            }
            return Ok(left);
        }
    }

    fn bit_or(&mut self) -> Result<Expr> {
        self.binary_level(&[("|", BinOp::BitOr)], Self::bit_xor)
    }

    fn bit_xor(&mut self) -> Result<Expr> {
        self.binary_level(&[("^", BinOp::BitXor)], Self::bit_and)
    }

    fn bit_and(&mut self) -> Result<Expr> {
        self.binary_level(&[("&", BinOp::BitAnd)], Self::shift)
    }

    fn shift(&mut self) -> Result<Expr> {
        self.binary_level(&[("<<", BinOp::Shl), (">>", BinOp::Shr)], Self::arith)
    }

    fn arith(&mut self) -> Result<Expr> {
        self.binary_level(&[("+", BinOp::Add), ("-", BinOp::Sub)], Self::term)
    }

    fn term(&mut self) -> Result<Expr> {
        self.binary_level(
            &[
                ("*", BinOp::Mul),
                ("//", BinOp::FloorDiv),
                ("/", BinOp::Div),
                ("%", BinOp::Mod),
            ],
            Self::factor,
        )
    }

    fn factor(&mut self) -> Result<Expr> {
        let op = if self.eat_op("-") {
            Some(UnaryOp::Neg)
        } else if self.eat_op("+") {
            Some(UnaryOp::Pos)
        } else if self.eat_op("~") {
            Some(UnaryOp::Invert)
        } else {
            None
        };
        match op {
            Some(op) => Ok(Expr::Unary(op, Box::new(self.factor()?))),
            None => self.power(),
        }
    }

    fn power(&mut self) -> Result<Expr> {
        let base = self.primary()?;
        if self.eat_op("**") {
            let exponent = self.factor()?;
            return Ok(Expr::Binary(BinOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr> {
        let mut expr = self.atom()?;
        loop {
            if self.eat_op(".") {
                match self.peek().map(|t| &t.kind) {
                    Some(TokenKind::Name(attr)) => {
                        self.pos += 1;
                        expr = Expr::Attribute(Box::new(expr), attr.clone());
                    }
                    _ => return Err(self.error("expected attribute name after '.'")),
                }
            } else if self.eat_op("(") {
                let args = self.call_args()?;
                expr = Expr::Call(Box::new(expr), args);
            } else if self.eat_op("[") {
                let index = self.expr_list()?;
                if self.at_op(":") {
                    return Err(self.error("slices are not supported"));
                }
                self.expect_op("]")?;
                expr = Expr::Subscript(Box::new(expr), Box::new(index));
            } else {
                return Ok(expr);
            }
        }
    }

    fn call_args(&mut self) -> Result<Vec<Arg>> {
        let mut args = Vec::new();
        while !self.eat_op(")") {
            if self.at_op("*") || self.at_op("**") {
                return Err(self.error("argument unpacking is not supported"));
            }
            let keyword = match (self.peek(), self.peek_at(1)) {
                (
                    Some(Token {
                        kind: TokenKind::Name(name),
                        ..
                    }),
                    Some(eq),
                ) if eq.is_op("=") => Some(name.clone()),
                _ => None,
            };
            match keyword {
                Some(name) => {
                    self.pos += 2;
                    args.push(Arg::Keyword(name, self.expr()?));
                }
                None => args.push(Arg::Positional(self.expr()?)),
            }
            self.reject_comprehension()?;
            if !self.eat_op(",") {
                self.expect_op(")")?;
                break;
            }
        }
        Ok(args)
    }

    fn reject_comprehension(&self) -> Result<()> {
        if self.at_name("for") || self.at_name("async") {
            return Err(self.error("comprehensions are not supported"));
        }
        Ok(())
    }

    /// Comma-separated items up to `close`; returns the items and whether a
    /// comma was seen.
    fn sequence(&mut self, close: &str) -> Result<(Vec<Expr>, bool)> {
        let mut items = Vec::new();
        let mut comma = false;
        while !self.eat_op(close) {
            if self.at_op("*") {
                return Err(self.error("starred items are not supported"));
            }
            items.push(self.expr()?);
            self.reject_comprehension()?;
            if self.eat_op(",") {
                comma = true;
            } else {
                self.expect_op(close)?;
                break;
            }
        }
        Ok((items, comma))
    }

    fn atom(&mut self) -> Result<Expr> {
        let Some(token) = self.peek() else {
            return Err(self.error("unexpected end of expression"));
        };
        self.pos += 1;
        match &token.kind {
            TokenKind::Int(n) => Ok(Expr::Int(*n)),
            TokenKind::Float(f) => Ok(Expr::Float(*f)),
            TokenKind::Str(s) => {
                let mut joined = s.clone();
                while let Some(Token {
                    kind: TokenKind::Str(next),
                    ..
                }) = self.peek()
                {
                    joined.push_str(next);
                    self.pos += 1;
                }
                Ok(Expr::Str(joined))
            }
            TokenKind::Name(name) => match name.as_str() {
                "True" => Ok(Expr::Bool(true)),
                "False" => Ok(Expr::Bool(false)),
                "None" => Ok(Expr::None),
                reserved if RESERVED.contains(&reserved) => {
                    self.pos -= 1;
                    Err(self.unexpected())
                }
                _ => Ok(Expr::Name(name.clone())),
            },
            TokenKind::Op("...") => Ok(Expr::Ellipsis),
            TokenKind::Op("(") => {
                if self.eat_op(")") {
                    return Ok(Expr::Tuple(Vec::new()));
                }
                let (items, comma) = self.sequence(")")?;
                match (items.len(), comma) {
                    (1, false) => Ok(items.into_iter().next().unwrap_or(Expr::None)),
                    _ => Ok(Expr::Tuple(items)),
                }
            }
            TokenKind::Op("[") => Ok(Expr::List(self.sequence("]")?.0)),
            TokenKind::Op("{") => self.brace(),
            _ => {
                self.pos -= 1;
                Err(self.unexpected())
            }
        }
    }

    /// Dict or set display after the opening brace.
    fn brace(&mut self) -> Result<Expr> {
        if self.eat_op("}") {
            return Ok(Expr::Dict(Vec::new()));
        }
        let mut items = Vec::new();
        let mut set_items = Vec::new();
        let mut is_dict = None;
        loop {
            if self.eat_op("**") {
                if is_dict == Some(false) {
                    return Err(self.error("mapping unpack inside a set"));
                }
                is_dict = Some(true);
                items.push(DictItem::Unpack(self.bit_or()?));
            } else {
                let key = self.expr()?;
                self.reject_comprehension()?;
                if self.eat_op(":") {
                    if is_dict == Some(false) {
                        return Err(self.error("mixed set and dict display"));
                    }
                    is_dict = Some(true);
                    let value = self.expr()?;
                    self.reject_comprehension()?;
                    items.push(DictItem::Pair(key, value));
                } else {
                    if is_dict == Some(true) {
                        return Err(self.error("expected ':' in dict display"));
                    }
                    is_dict = Some(false);
                    set_items.push(key);
                }
            }
            if self.eat_op(",") {
                if self.eat_op("}") {
                    break;
                }
            } else {
                self.expect_op("}")?;
                break;
            }
        }
        if is_dict == Some(false) {
            Ok(Expr::Set(set_items))
        } else {
            Ok(Expr::Dict(items))
        }
    }
}
