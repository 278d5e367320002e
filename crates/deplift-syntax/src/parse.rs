//! Lexer and recursive-descent parser for the C# subset.

use thiserror::Error;

use crate::ast::{
    BinaryExpr, BinaryOp, Block, CallExpr, ClassDecl, CompilationUnit, ConstructorDecl, Expr,
    ExprStmt, FieldDecl, LambdaExpr, LiteralExpr, LocalVarStmt, MemberAccessExpr, MemberDecl,
    MethodBody, MethodDecl, NameExpr, NodeId, ObjectCreationExpr, ParamDecl, ReturnStmt, Span,
    Stmt, TypeRef, UsingDirective,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected end of input (expected {expected})")]
    UnexpectedEof { expected: &'static str },
    #[error("unexpected token `{found}` at offset {offset} (expected {expected})")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
        offset: usize,
    },
}

/// Parse a full document.
pub fn parse(text: &str) -> Result<CompilationUnit, ParseError> {
    let tokens = Lexer::new(text).collect();
    let mut parser = Parser::new(tokens, text.len());
    parser.parse_compilation_unit()
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    kind: TokenKind,
    text: String,
    range: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Ident,
    IntLiteral,
    StringLiteral,
    LBrace,
    RBrace,
    LParen,
    RParen,
    Semi,
    Comma,
    Dot,
    Lt,
    Gt,
    Eq,
    Arrow,
    Plus,
    Minus,
    Star,
    Slash,
    Unknown,
}

struct Lexer<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Lexer { text, pos: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn bump_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while matches!(self.peek_char(), Some(c) if c.is_whitespace()) {
                self.bump_char();
            }

            let rem = self.remaining();
            if rem.starts_with("//") {
                while let Some(c) = self.bump_char() {
                    if c == '\n' {
                        break;
                    }
                }
                continue;
            }

            if rem.starts_with("/*") {
                self.bump_char();
                self.bump_char();
                while !self.remaining().is_empty() && !self.remaining().starts_with("*/") {
                    self.bump_char();
                }
                if self.remaining().starts_with("*/") {
                    self.bump_char();
                    self.bump_char();
                }
                continue;
            }

            break;
        }
    }

    fn lex_identifier(&mut self) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek_char() {
            if unicode_ident::is_xid_continue(c) || c == '_' || c == '$' {
                out.push(c);
                self.bump_char();
            } else {
                break;
            }
        }
        out
    }

    fn lex_number(&mut self) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                out.push(c);
                self.bump_char();
            } else {
                break;
            }
        }
        out
    }

    fn lex_string(&mut self) -> String {
        // Opening quote already consumed by the caller.
        let mut out = String::new();
        while let Some(c) = self.bump_char() {
            match c {
                '"' => break,
                '\\' => {
                    out.push(c);
                    if let Some(escaped) = self.bump_char() {
                        out.push(escaped);
                    }
                }
                _ => out.push(c),
            }
        }
        out
    }

    fn collect(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace_and_comments();
            let start = self.pos;
            let Some(c) = self.peek_char() else { break };

            if unicode_ident::is_xid_start(c) || c == '_' || c == '$' {
                let text = self.lex_identifier();
                tokens.push(Token {
                    kind: TokenKind::Ident,
                    text,
                    range: Span::new(start, self.pos),
                });
                continue;
            }

            if c.is_ascii_digit() {
                let text = self.lex_number();
                tokens.push(Token {
                    kind: TokenKind::IntLiteral,
                    text,
                    range: Span::new(start, self.pos),
                });
                continue;
            }

            if c == '"' {
                self.bump_char();
                let text = self.lex_string();
                tokens.push(Token {
                    kind: TokenKind::StringLiteral,
                    text,
                    range: Span::new(start, self.pos),
                });
                continue;
            }

            if c == '=' && self.remaining().starts_with("=>") {
                self.bump_char();
                self.bump_char();
                tokens.push(Token {
                    kind: TokenKind::Arrow,
                    text: "=>".to_string(),
                    range: Span::new(start, self.pos),
                });
                continue;
            }

            self.bump_char();
            let kind = match c {
                '{' => TokenKind::LBrace,
                '}' => TokenKind::RBrace,
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                ';' => TokenKind::Semi,
                ',' => TokenKind::Comma,
                '.' => TokenKind::Dot,
                '<' => TokenKind::Lt,
                '>' => TokenKind::Gt,
                '=' => TokenKind::Eq,
                '+' => TokenKind::Plus,
                '-' => TokenKind::Minus,
                '*' => TokenKind::Star,
                '/' => TokenKind::Slash,
                _ => TokenKind::Unknown,
            };
            tokens.push(Token {
                kind,
                text: c.to_string(),
                range: Span::new(start, self.pos),
            });
        }
        tokens
    }
}

const MODIFIERS: &[&str] = &[
    "public", "private", "protected", "internal", "static", "sealed", "abstract", "readonly",
    "partial",
];

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    text_len: usize,
    next_id: u32,
}

impl Parser {
    fn new(tokens: Vec<Token>, text_len: usize) -> Self {
        Parser {
            tokens,
            pos: 0,
            text_len,
            next_id: 0,
        }
    }

    fn fresh_id(&mut self) -> NodeId {
        let id = NodeId::from_raw(self.next_id);
        self.next_id += 1;
        id
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek().map(|t| t.kind == kind).unwrap_or(false)
    }

    fn at_ident(&self, text: &str) -> bool {
        self.peek()
            .map(|t| t.kind == TokenKind::Ident && t.text == text)
            .unwrap_or(false)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned()?;
        self.pos += 1;
        Some(token)
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<Token, ParseError> {
        match self.peek() {
            Some(token) if token.kind == kind => Ok(self.bump().unwrap()),
            Some(token) => Err(ParseError::UnexpectedToken {
                expected,
                found: token.text.clone(),
                offset: token.range.start,
            }),
            None => Err(ParseError::UnexpectedEof { expected }),
        }
    }

    fn expect_ident(&mut self, expected: &'static str) -> Result<Token, ParseError> {
        self.expect(TokenKind::Ident, expected)
    }

    fn parse_compilation_unit(&mut self) -> Result<CompilationUnit, ParseError> {
        let mut usings = Vec::new();
        while self.at_ident("using") {
            usings.push(self.parse_using()?);
        }

        let mut types = Vec::new();
        while self.peek().is_some() {
            types.push(self.parse_class()?);
        }

        Ok(CompilationUnit {
            usings,
            types,
            range: Span::new(0, self.text_len),
        })
    }

    fn parse_using(&mut self) -> Result<UsingDirective, ParseError> {
        let start = self.expect_ident("`using`")?.range.start;
        let mut path = self.expect_ident("namespace name")?.text;
        while self.at(TokenKind::Dot) {
            self.bump();
            path.push('.');
            path.push_str(&self.expect_ident("namespace segment")?.text);
        }
        let end = self.expect(TokenKind::Semi, "`;`")?.range.end;
        Ok(UsingDirective {
            path,
            range: Span::new(start, end),
        })
    }

    fn parse_modifiers(&mut self) -> Vec<String> {
        let mut modifiers = Vec::new();
        while let Some(token) = self.peek() {
            if token.kind == TokenKind::Ident && MODIFIERS.contains(&token.text.as_str()) {
                modifiers.push(self.bump().unwrap().text);
            } else {
                break;
            }
        }
        modifiers
    }

    fn parse_class(&mut self) -> Result<ClassDecl, ParseError> {
        let start = self.peek().map(|t| t.range.start).unwrap_or(self.text_len);
        let modifiers = self.parse_modifiers();
        let class_kw = self.expect_ident("`class`")?;
        if class_kw.text != "class" {
            return Err(ParseError::UnexpectedToken {
                expected: "`class`",
                found: class_kw.text,
                offset: class_kw.range.start,
            });
        }
        let name_tok = self.expect_ident("class name")?;
        self.expect(TokenKind::LBrace, "`{`")?;

        let mut members = Vec::new();
        while !self.at(TokenKind::RBrace) {
            if self.peek().is_none() {
                return Err(ParseError::UnexpectedEof { expected: "`}`" });
            }
            members.push(self.parse_member(&name_tok.text)?);
        }
        let end = self.expect(TokenKind::RBrace, "`}`")?.range.end;

        Ok(ClassDecl {
            id: self.fresh_id(),
            modifiers,
            name: name_tok.text,
            name_range: name_tok.range,
            members,
            range: Span::new(start, end),
        })
    }

    fn parse_member(&mut self, class_name: &str) -> Result<MemberDecl, ParseError> {
        let start = self.peek().map(|t| t.range.start).unwrap_or(self.text_len);
        let modifiers = self.parse_modifiers();

        // Constructor: `Name (` where Name matches the enclosing class.
        if self.at_ident(class_name)
            && self
                .peek_nth(1)
                .map(|t| t.kind == TokenKind::LParen)
                .unwrap_or(false)
        {
            let name_tok = self.bump().unwrap();
            let params = self.parse_param_list()?;
            let body = self.parse_block()?;
            let end = body.range.end;
            return Ok(MemberDecl::Constructor(ConstructorDecl {
                id: self.fresh_id(),
                modifiers,
                name: name_tok.text,
                name_range: name_tok.range,
                params,
                body,
                range: Span::new(start, end),
            }));
        }

        let ty = self.parse_type()?;
        let name_tok = self.expect_ident("member name")?;

        if self.at(TokenKind::LParen) {
            let params = self.parse_param_list()?;
            let (body, end) = if self.at(TokenKind::Arrow) {
                self.bump();
                let expr = self.parse_expr()?;
                let end = self.expect(TokenKind::Semi, "`;`")?.range.end;
                (Some(MethodBody::Expr(expr)), end)
            } else if self.at(TokenKind::Semi) {
                let end = self.bump().unwrap().range.end;
                (None, end)
            } else {
                let block = self.parse_block()?;
                let end = block.range.end;
                (Some(MethodBody::Block(block)), end)
            };
            return Ok(MemberDecl::Method(MethodDecl {
                id: self.fresh_id(),
                modifiers,
                return_ty: ty,
                name: name_tok.text,
                name_range: name_tok.range,
                params,
                body,
                range: Span::new(start, end),
            }));
        }

        let initializer = if self.at(TokenKind::Eq) {
            self.bump();
            Some(self.parse_expr()?)
        } else {
            None
        };
        let end = self.expect(TokenKind::Semi, "`;`")?.range.end;
        Ok(MemberDecl::Field(FieldDecl {
            id: self.fresh_id(),
            modifiers,
            ty,
            name: name_tok.text,
            name_range: name_tok.range,
            initializer,
            range: Span::new(start, end),
        }))
    }

    fn parse_param_list(&mut self) -> Result<Vec<ParamDecl>, ParseError> {
        self.expect(TokenKind::LParen, "`(`")?;
        let mut params = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                let start = self.peek().map(|t| t.range.start).unwrap_or(self.text_len);
                let ty = self.parse_type()?;
                let name_tok = self.expect_ident("parameter name")?;
                params.push(ParamDecl {
                    id: self.fresh_id(),
                    ty,
                    name: name_tok.text,
                    name_range: name_tok.range,
                    range: Span::new(start, name_tok.range.end),
                });
                if self.at(TokenKind::Comma) {
                    self.bump();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "`)`")?;
        Ok(params)
    }

    /// `Name` with optional generic arguments, rendered to canonical text.
    fn parse_type(&mut self) -> Result<TypeRef, ParseError> {
        let name_tok = self.expect_ident("type name")?;
        let start = name_tok.range.start;
        let mut text = name_tok.text;
        let mut end = name_tok.range.end;
        if self.at(TokenKind::Lt) {
            self.bump();
            text.push('<');
            loop {
                let arg = self.parse_type()?;
                text.push_str(&arg.text);
                if self.at(TokenKind::Comma) {
                    self.bump();
                    text.push_str(", ");
                } else {
                    break;
                }
            }
            end = self.expect(TokenKind::Gt, "`>`")?.range.end;
            text.push('>');
        }
        Ok(TypeRef {
            text,
            range: Span::new(start, end),
        })
    }

    fn parse_block(&mut self) -> Result<Block, ParseError> {
        let start = self.expect(TokenKind::LBrace, "`{`")?.range.start;
        let mut statements = Vec::new();
        while !self.at(TokenKind::RBrace) {
            if self.peek().is_none() {
                return Err(ParseError::UnexpectedEof { expected: "`}`" });
            }
            statements.push(self.parse_stmt()?);
        }
        let end = self.expect(TokenKind::RBrace, "`}`")?.range.end;
        Ok(Block {
            id: self.fresh_id(),
            statements,
            range: Span::new(start, end),
        })
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        if self.at(TokenKind::Semi) {
            let token = self.bump().unwrap();
            return Ok(Stmt::Empty {
                id: self.fresh_id(),
                range: token.range,
            });
        }

        if self.at(TokenKind::LBrace) {
            return Ok(Stmt::Block(self.parse_block()?));
        }

        if self.at_ident("return") {
            let start = self.bump().unwrap().range.start;
            let expr = if self.at(TokenKind::Semi) {
                None
            } else {
                Some(self.parse_expr()?)
            };
            let end = self.expect(TokenKind::Semi, "`;`")?.range.end;
            return Ok(Stmt::Return(ReturnStmt {
                id: self.fresh_id(),
                expr,
                range: Span::new(start, end),
            }));
        }

        // Local variable declaration needs `Type name`, which is ambiguous
        // with an expression statement until the second identifier; try the
        // declaration parse and roll back on failure.
        if self.at(TokenKind::Ident) && !self.at_ident("new") {
            let checkpoint = (self.pos, self.next_id);
            if let Ok(local) = self.try_parse_local_var() {
                return Ok(Stmt::LocalVar(local));
            }
            self.pos = checkpoint.0;
            self.next_id = checkpoint.1;
        }

        let start = self.peek().map(|t| t.range.start).unwrap_or(self.text_len);
        let expr = self.parse_expr()?;
        let end = self.expect(TokenKind::Semi, "`;`")?.range.end;
        Ok(Stmt::Expr(ExprStmt {
            id: self.fresh_id(),
            expr,
            range: Span::new(start, end),
        }))
    }

    fn try_parse_local_var(&mut self) -> Result<LocalVarStmt, ParseError> {
        let start = self.peek().map(|t| t.range.start).unwrap_or(self.text_len);
        let ty = self.parse_type()?;
        let name_tok = self.expect_ident("variable name")?;
        let initializer = if self.at(TokenKind::Eq) {
            self.bump();
            Some(self.parse_expr()?)
        } else {
            None
        };
        let end = self.expect(TokenKind::Semi, "`;`")?.range.end;
        Ok(LocalVarStmt {
            id: self.fresh_id(),
            ty,
            name: name_tok.text,
            name_range: name_tok.range,
            initializer,
            range: Span::new(start, end),
        })
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_additive()
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().map(|t| t.kind) {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_multiplicative()?;
            let range = Span::new(lhs.range().start, rhs.range().end);
            lhs = Expr::Binary(BinaryExpr {
                id: self.fresh_id(),
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                range,
            });
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_postfix()?;
        loop {
            let op = match self.peek().map(|t| t.kind) {
                Some(TokenKind::Star) => BinaryOp::Mul,
                Some(TokenKind::Slash) => BinaryOp::Div,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_postfix()?;
            let range = Span::new(lhs.range().start, rhs.range().end);
            lhs = Expr::Binary(BinaryExpr {
                id: self.fresh_id(),
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                range,
            });
        }
        Ok(lhs)
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.at(TokenKind::Dot) {
                self.bump();
                let name_tok = self.expect_ident("member name")?;
                let range = Span::new(expr.range().start, name_tok.range.end);
                expr = Expr::MemberAccess(MemberAccessExpr {
                    id: self.fresh_id(),
                    receiver: Box::new(expr),
                    name: name_tok.text,
                    name_range: name_tok.range,
                    range,
                });
            } else if self.at(TokenKind::LParen) {
                let (args, end) = self.parse_arg_list()?;
                let range = Span::new(expr.range().start, end);
                expr = Expr::Call(CallExpr {
                    id: self.fresh_id(),
                    callee: Box::new(expr),
                    args,
                    range,
                });
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_arg_list(&mut self) -> Result<(Vec<Expr>, usize), ParseError> {
        self.expect(TokenKind::LParen, "`(`")?;
        let mut args = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if self.at(TokenKind::Comma) {
                    self.bump();
                } else {
                    break;
                }
            }
        }
        let end = self.expect(TokenKind::RParen, "`)`")?.range.end;
        Ok((args, end))
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let Some(token) = self.peek().cloned() else {
            return Err(ParseError::UnexpectedEof {
                expected: "expression",
            });
        };

        match token.kind {
            TokenKind::IntLiteral => {
                self.bump();
                Ok(Expr::IntLiteral(LiteralExpr {
                    id: self.fresh_id(),
                    value: token.text,
                    range: token.range,
                }))
            }
            TokenKind::StringLiteral => {
                self.bump();
                Ok(Expr::StringLiteral(LiteralExpr {
                    id: self.fresh_id(),
                    value: token.text,
                    range: token.range,
                }))
            }
            TokenKind::Ident if token.text == "new" => self.parse_object_creation(),
            TokenKind::Ident => {
                // `x => body` simple lambda.
                if self
                    .peek_nth(1)
                    .map(|t| t.kind == TokenKind::Arrow)
                    .unwrap_or(false)
                {
                    return self.parse_lambda();
                }
                self.bump();
                Ok(Expr::Name(NameExpr {
                    id: self.fresh_id(),
                    name: token.text,
                    range: token.range,
                }))
            }
            TokenKind::LParen => {
                if self.paren_starts_lambda() {
                    return self.parse_lambda();
                }
                self.bump();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen, "`)`")?;
                Ok(expr)
            }
            _ => Err(ParseError::UnexpectedToken {
                expected: "expression",
                found: token.text,
                offset: token.range.start,
            }),
        }
    }

    /// Lookahead: `(` ident? (`,` ident)* `)` `=>` begins a lambda.
    fn paren_starts_lambda(&self) -> bool {
        debug_assert!(self.at(TokenKind::LParen));
        let mut n = 1;
        loop {
            match self.peek_nth(n).map(|t| t.kind) {
                Some(TokenKind::RParen) => break,
                Some(TokenKind::Ident) | Some(TokenKind::Comma) => n += 1,
                _ => return false,
            }
        }
        self.peek_nth(n + 1)
            .map(|t| t.kind == TokenKind::Arrow)
            .unwrap_or(false)
    }

    fn parse_lambda(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek().map(|t| t.range.start).unwrap_or(self.text_len);
        let mut params = Vec::new();
        if self.at(TokenKind::LParen) {
            self.bump();
            while !self.at(TokenKind::RParen) {
                params.push(self.expect_ident("lambda parameter")?.text);
                if self.at(TokenKind::Comma) {
                    self.bump();
                }
            }
            self.expect(TokenKind::RParen, "`)`")?;
        } else {
            params.push(self.expect_ident("lambda parameter")?.text);
        }
        self.expect(TokenKind::Arrow, "`=>`")?;
        let body = self.parse_expr()?;
        let range = Span::new(start, body.range().end);
        Ok(Expr::Lambda(LambdaExpr {
            id: self.fresh_id(),
            params,
            body: Box::new(body),
            range,
        }))
    }

    fn parse_object_creation(&mut self) -> Result<Expr, ParseError> {
        let new_kw = self.expect_ident("`new`")?;
        let ty = self.parse_type()?;
        let (args, end) = self.parse_arg_list()?;
        Ok(Expr::ObjectCreation(ObjectCreationExpr {
            id: self.fresh_id(),
            type_name: ty.text,
            type_name_range: ty.range,
            args,
            range: Span::new(new_kw.range.start, end),
        }))
    }
}
