/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */
use crate::ast::*;
use crate::parse::lexer::{Token, TokenKind, TokenTag, tokenize_file};
use crate::statics::{AnalysisContext, Error};
pub(crate) use lexer::Span;
use std::rc::Rc;
mod lexer;

pub(crate) fn parse_file(ctx: &mut AnalysisContext, file_id: FileId) -> Rc<FileAst> {
    let mut items: Vec<Rc<Item>> = vec![];

    let tokens = tokenize_file(ctx, file_id);

    let file_len = {
        let file_data = ctx.file_db.get(file_id).unwrap();
        file_data.source.len()
    };
    let mut parser = Parser::new(tokens, file_id, file_len);
    while !parser.done() {
        match parser.parse_item() {
            Ok(item) => {
                items.push(item);
            }
            Err(e) => {
                if !parser.error_found {
                    // only report errors for this file once.
                    parser.error_found = true;
                    ctx.errors.push(*e);
                }
                parser.index += 1;
            }
        }
    }

    Rc::new(FileAst {
        items,
        loc: Location {
            file_id,
            lo: 0,
            hi: file_len.saturating_sub(1),
        },
        id: NodeId::new(),
    })
}

struct Parser {
    index: usize,
    error_found: bool,

    tokens: Vec<Token>,
    file_id: FileId,
    file_len: usize, // used for EOF tokens
}

impl Parser {
    fn new(tokens: Vec<Token>, file_id: FileId, file_len: usize) -> Self {
        Parser {
            index: 0,
            error_found: false,
            tokens,
            file_id,
            file_len,
        }
    }

    fn done(&self) -> bool {
        self.current_token().tag() == TokenTag::Eof
    }

    fn current_token(&self) -> Token {
        match self.tokens.get(self.index) {
            Some(t) => t.clone(),
            None => self.eof(),
        }
    }

    fn prev_token(&self) -> Token {
        match self.tokens.get(self.index.wrapping_sub(1)) {
            Some(t) => t.clone(),
            None => self.eof(),
        }
    }

    fn current_token_location(&self) -> Location {
        let current = self.current_token();
        Location {
            file_id: self.file_id,
            lo: current.span.lo,
            hi: current.span.hi,
        }
    }

    fn peek_token(&self, diff: usize) -> Token {
        match self.tokens.get(self.index + diff) {
            Some(t) => t.clone(),
            None => self.eof(),
        }
    }

    fn eof(&self) -> Token {
        Token {
            kind: TokenKind::Eof,
            span: Span {
                lo: self.file_len.saturating_sub(1),
                hi: self.file_len.saturating_sub(1),
            },
        }
    }

    fn consume_token(&mut self) {
        self.index += 1;
    }

    fn expect_token(&mut self, kind: TokenTag) -> Result<(), Box<Error>> {
        let current = self.current_token();
        if current.tag() == kind {
            self.index += 1;
            Ok(())
        } else {
            Err(Error::UnexpectedToken(
                kind.to_string(),
                current.tag().to_string(),
                self.current_token_location(),
            )
            .into())
        }
    }

    fn expect_ident(&mut self) -> Result<Rc<Identifier>, Box<Error>> {
        let current = self.current_token();
        if let TokenKind::Ident(v) = current.kind {
            self.index += 1;
            Ok(Rc::new(Identifier {
                v,
                loc: Location {
                    file_id: self.file_id,
                    lo: current.span.lo,
                    hi: current.span.hi,
                },
                id: NodeId::new(),
            }))
        } else {
            Err(Error::UnexpectedToken(
                "identifier".into(),
                current.tag().to_string(),
                self.current_token_location(),
            )
            .into())
        }
    }

    fn location(&self, begin: usize) -> Location {
        Location {
            file_id: self.file_id,
            lo: begin,
            hi: self.prev_token().span.hi,
        }
    }

    /// Number of tokens forming `Ident (. Ident)*` at the cursor, if any.
    /// Used to look one token past a dotted name without consuming it.
    fn peek_qualified_len(&self) -> Option<usize> {
        if self.current_token().tag() != TokenTag::Ident {
            return None;
        }
        let mut n = 1;
        while self.peek_token(n).tag() == TokenTag::Dot
            && self.peek_token(n + 1).tag() == TokenTag::Ident
        {
            n += 2;
        }
        Some(n)
    }

    /// Consume any run of access/storage modifiers. Only `abstract` matters
    /// to the analysis; the rest are accepted and dropped.
    fn parse_modifiers(&mut self) -> bool {
        let mut is_abstract = false;
        loop {
            match self.current_token().tag() {
                TokenTag::Public
                | TokenTag::Private
                | TokenTag::Protected
                | TokenTag::Internal
                | TokenTag::Static
                | TokenTag::Sealed => self.consume_token(),
                TokenTag::Abstract => {
                    is_abstract = true;
                    self.consume_token();
                }
                _ => break,
            }
        }
        is_abstract
    }

    fn parse_item(&mut self) -> Result<Rc<Item>, Box<Error>> {
        let lo = self.current_token().span.lo;
        Ok(Rc::new(match self.current_token().tag() {
            TokenTag::Using => {
                self.consume_token();
                let mut segments = vec![self.expect_ident()?];
                while self.current_token().tag() == TokenTag::Dot {
                    self.consume_token();
                    segments.push(self.expect_ident()?);
                }
                self.expect_token(TokenTag::Semicolon)?;
                Item {
                    kind: ItemKind::Using(segments).into(),
                    loc: self.location(lo),
                    id: NodeId::new(),
                }
            }
            TokenTag::Namespace => {
                self.consume_token();
                let name = self.expect_ident()?;
                self.expect_token(TokenTag::OpenBrace)?;
                let mut types = vec![];
                while !matches!(
                    self.current_token().tag(),
                    TokenTag::CloseBrace | TokenTag::Eof
                ) {
                    let is_abstract = self.parse_modifiers();
                    types.push(self.parse_type_decl(is_abstract)?);
                }
                self.expect_token(TokenTag::CloseBrace)?;
                Item {
                    kind: ItemKind::Namespace(Rc::new(NamespaceDecl { name, types })).into(),
                    loc: self.location(lo),
                    id: NodeId::new(),
                }
            }
            _ => {
                let is_abstract = self.parse_modifiers();
                let decl = self.parse_type_decl(is_abstract)?;
                Item {
                    kind: ItemKind::Type(decl).into(),
                    loc: self.location(lo),
                    id: NodeId::new(),
                }
            }
        }))
    }

    fn parse_type_decl(&mut self, is_abstract: bool) -> Result<Rc<TypeDecl>, Box<Error>> {
        let lo = self.current_token().span.lo;
        let keyword = match self.current_token().tag() {
            TokenTag::Interface => TypeKeyword::Interface,
            TokenTag::Class => TypeKeyword::Class,
            TokenTag::Struct => TypeKeyword::Struct,
            other => {
                return Err(Error::UnexpectedToken(
                    "type declaration".into(),
                    other.to_string(),
                    self.current_token_location(),
                )
                .into());
            }
        };
        self.consume_token();
        let name = self.expect_ident()?;

        let mut bases = vec![];
        if self.current_token().tag() == TokenTag::Colon {
            self.consume_token();
            bases.push(self.parse_type_ref()?);
            while self.current_token().tag() == TokenTag::Comma {
                self.consume_token();
                bases.push(self.parse_type_ref()?);
            }
        }

        self.expect_token(TokenTag::OpenBrace)?;
        let mut members = vec![];
        while !matches!(
            self.current_token().tag(),
            TokenTag::CloseBrace | TokenTag::Eof
        ) {
            members.push(self.parse_member()?);
        }
        self.expect_token(TokenTag::CloseBrace)?;

        Ok(Rc::new(TypeDecl {
            keyword,
            is_abstract,
            name,
            bases,
            members,
            loc: self.location(lo),
            id: NodeId::new(),
        }))
    }

    fn parse_member(&mut self) -> Result<Rc<Member>, Box<Error>> {
        let lo = self.current_token().span.lo;
        let is_abstract = self.parse_modifiers();

        if matches!(
            self.current_token().tag(),
            TokenTag::Interface | TokenTag::Class | TokenTag::Struct
        ) {
            let decl = self.parse_type_decl(is_abstract)?;
            return Ok(Rc::new(Member {
                kind: MemberKind::Nested(decl).into(),
                loc: self.location(lo),
                id: NodeId::new(),
            }));
        }

        let ty = self.parse_type_ref()?;
        let name = self.expect_ident()?;

        let kind = if self.current_token().tag() == TokenTag::OpenParen {
            self.consume_token();
            let mut params = vec![];
            while !matches!(
                self.current_token().tag(),
                TokenTag::CloseParen | TokenTag::Eof
            ) {
                let pty = self.parse_type_ref()?;
                let pname = self.expect_ident()?;
                params.push(Param {
                    ty: pty,
                    name: pname,
                });
                if self.current_token().tag() == TokenTag::Comma {
                    self.consume_token();
                } else {
                    break;
                }
            }
            self.expect_token(TokenTag::CloseParen)?;
            let body = self.parse_block()?;
            MemberKind::Method {
                ret: ty,
                name,
                params,
                body,
            }
        } else {
            let mut init = None;
            if self.current_token().tag() == TokenTag::Eq {
                self.consume_token();
                init = Some(self.parse_expr()?);
            }
            self.expect_token(TokenTag::Semicolon)?;
            MemberKind::Field { ty, name, init }
        };

        Ok(Rc::new(Member {
            kind: kind.into(),
            loc: self.location(lo),
            id: NodeId::new(),
        }))
    }

    fn parse_type_ref(&mut self) -> Result<Rc<TypeRef>, Box<Error>> {
        let lo = self.current_token().span.lo;
        let kind = match self.current_token().tag() {
            TokenTag::Void => {
                self.consume_token();
                TypeRefKind::Void
            }
            TokenTag::Int => {
                self.consume_token();
                TypeRefKind::Int
            }
            TokenTag::Float => {
                self.consume_token();
                TypeRefKind::Float
            }
            TokenTag::Bool => {
                self.consume_token();
                TypeRefKind::Bool
            }
            TokenTag::String => {
                self.consume_token();
                TypeRefKind::Str
            }
            _ => {
                let mut segments = vec![self.expect_ident()?];
                while self.current_token().tag() == TokenTag::Dot
                    && self.peek_token(1).tag() == TokenTag::Ident
                {
                    self.consume_token();
                    segments.push(self.expect_ident()?);
                }
                TypeRefKind::Named(segments)
            }
        };
        Ok(Rc::new(TypeRef {
            kind: kind.into(),
            loc: self.location(lo),
            id: NodeId::new(),
        }))
    }

    fn parse_block(&mut self) -> Result<Vec<Rc<Stmt>>, Box<Error>> {
        self.expect_token(TokenTag::OpenBrace)?;
        let mut stmts = vec![];
        while !matches!(
            self.current_token().tag(),
            TokenTag::CloseBrace | TokenTag::Eof
        ) {
            stmts.push(self.parse_stmt()?);
        }
        self.expect_token(TokenTag::CloseBrace)?;
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Rc<Stmt>, Box<Error>> {
        let lo = self.current_token().span.lo;
        let kind = match self.current_token().tag() {
            TokenTag::OpenBrace => StmtKind::Block(self.parse_block()?),
            TokenTag::If => {
                self.consume_token();
                self.expect_token(TokenTag::OpenParen)?;
                let cond = self.parse_expr()?;
                self.expect_token(TokenTag::CloseParen)?;
                let then = self.parse_stmt()?;
                let mut els = None;
                if self.current_token().tag() == TokenTag::Else {
                    self.consume_token();
                    els = Some(self.parse_stmt()?);
                }
                StmtKind::If(cond, then, els)
            }
            TokenTag::Switch => StmtKind::Switch(self.parse_switch()?),
            TokenTag::Return => {
                self.consume_token();
                let mut value = None;
                if self.current_token().tag() != TokenTag::Semicolon {
                    value = Some(self.parse_expr()?);
                }
                self.expect_token(TokenTag::Semicolon)?;
                StmtKind::Return(value)
            }
            TokenTag::Break => {
                self.consume_token();
                self.expect_token(TokenTag::Semicolon)?;
                StmtKind::Break
            }
            TokenTag::Throw => {
                self.consume_token();
                let value = self.parse_expr()?;
                self.expect_token(TokenTag::Semicolon)?;
                StmtKind::Throw(value)
            }
            TokenTag::Var => {
                self.consume_token();
                let name = self.expect_ident()?;
                self.expect_token(TokenTag::Eq)?;
                let init = self.parse_expr()?;
                self.expect_token(TokenTag::Semicolon)?;
                StmtKind::Local {
                    ty: None,
                    name,
                    init: Some(init),
                }
            }
            TokenTag::Void | TokenTag::Int | TokenTag::Float | TokenTag::Bool | TokenTag::String => {
                self.parse_local_with_type()?
            }
            TokenTag::Ident => {
                // `A.B.C x ...` is a declaration; anything else is an
                // expression or assignment statement.
                let qualified_len = self.peek_qualified_len().unwrap();
                if self.peek_token(qualified_len).tag() == TokenTag::Ident {
                    self.parse_local_with_type()?
                } else {
                    self.parse_expr_or_assign()?
                }
            }
            _ => self.parse_expr_or_assign()?,
        };
        Ok(Rc::new(Stmt {
            kind: kind.into(),
            loc: self.location(lo),
            id: NodeId::new(),
        }))
    }

    fn parse_local_with_type(&mut self) -> Result<StmtKind, Box<Error>> {
        let ty = self.parse_type_ref()?;
        let name = self.expect_ident()?;
        let mut init = None;
        if self.current_token().tag() == TokenTag::Eq {
            self.consume_token();
            init = Some(self.parse_expr()?);
        }
        self.expect_token(TokenTag::Semicolon)?;
        Ok(StmtKind::Local {
            ty: Some(ty),
            name,
            init,
        })
    }

    fn parse_expr_or_assign(&mut self) -> Result<StmtKind, Box<Error>> {
        let lhs = self.parse_expr()?;
        let kind = if self.current_token().tag() == TokenTag::Eq {
            self.consume_token();
            let rhs = self.parse_expr()?;
            StmtKind::Assign(lhs, rhs)
        } else {
            StmtKind::Expr(lhs)
        };
        self.expect_token(TokenTag::Semicolon)?;
        Ok(kind)
    }

    fn parse_switch(&mut self) -> Result<Rc<SwitchStmt>, Box<Error>> {
        let lo = self.current_token().span.lo;
        self.expect_token(TokenTag::Switch)?;
        self.expect_token(TokenTag::OpenParen)?;
        let scrutinee = self.parse_expr()?;
        self.expect_token(TokenTag::CloseParen)?;
        self.expect_token(TokenTag::OpenBrace)?;

        let mut sections = vec![];
        while matches!(
            self.current_token().tag(),
            TokenTag::Case | TokenTag::Default
        ) {
            sections.push(self.parse_switch_section()?);
        }
        self.expect_token(TokenTag::CloseBrace)?;

        Ok(Rc::new(SwitchStmt {
            scrutinee,
            sections,
            loc: self.location(lo),
            id: NodeId::new(),
        }))
    }

    fn parse_switch_section(&mut self) -> Result<Rc<SwitchSection>, Box<Error>> {
        let lo = self.current_token().span.lo;
        let mut labels = vec![self.parse_switch_label()?];
        while matches!(
            self.current_token().tag(),
            TokenTag::Case | TokenTag::Default
        ) {
            labels.push(self.parse_switch_label()?);
        }
        let mut stmts = vec![];
        while !matches!(
            self.current_token().tag(),
            TokenTag::Case | TokenTag::Default | TokenTag::CloseBrace | TokenTag::Eof
        ) {
            stmts.push(self.parse_stmt()?);
        }
        Ok(Rc::new(SwitchSection {
            labels,
            stmts,
            loc: self.location(lo),
            id: NodeId::new(),
        }))
    }

    fn parse_switch_label(&mut self) -> Result<Rc<SwitchLabel>, Box<Error>> {
        let lo = self.current_token().span.lo;
        let kind = match self.current_token().tag() {
            TokenTag::Default => {
                self.consume_token();
                SwitchLabelKind::Default
            }
            TokenTag::Case => {
                self.consume_token();
                match self.current_token().tag() {
                    // A dotted name followed by a binder (or a discard) is a
                    // type-test pattern; a bare dotted name is a constant.
                    TokenTag::Ident => {
                        let qualified_len = self.peek_qualified_len().unwrap();
                        match self.peek_token(qualified_len).tag() {
                            TokenTag::Ident => {
                                let ty = self.parse_type_ref()?;
                                let binder = self.expect_ident()?;
                                SwitchLabelKind::Type {
                                    ty,
                                    binder: Some(binder),
                                }
                            }
                            TokenTag::Wildcard => {
                                let ty = self.parse_type_ref()?;
                                self.consume_token(); // the `_`
                                SwitchLabelKind::Type { ty, binder: None }
                            }
                            _ => SwitchLabelKind::Value(self.parse_expr()?),
                        }
                    }
                    _ => SwitchLabelKind::Value(self.parse_expr()?),
                }
            }
            other => {
                return Err(Error::UnexpectedToken(
                    "case or default".into(),
                    other.to_string(),
                    self.current_token_location(),
                )
                .into());
            }
        };
        self.expect_token(TokenTag::Colon)?;
        Ok(Rc::new(SwitchLabel {
            kind: kind.into(),
            loc: self.location(lo),
            id: NodeId::new(),
        }))
    }

    fn parse_expr(&mut self) -> Result<Rc<Expr>, Box<Error>> {
        let lo = self.current_token().span.lo;
        let mut expr = self.parse_binary(0)?;
        // `as` binds loosest; chains are permitted
        while self.current_token().tag() == TokenTag::As {
            self.consume_token();
            let ty = self.parse_type_ref()?;
            expr = Rc::new(Expr {
                kind: ExprKind::Cast(expr, ty).into(),
                loc: self.location(lo),
                id: NodeId::new(),
            });
        }
        Ok(expr)
    }

    fn parse_binary(&mut self, min_precedence: u8) -> Result<Rc<Expr>, Box<Error>> {
        let lo = self.current_token().span.lo;
        let mut lhs = self.parse_unary()?;
        loop {
            let Some(op) = self.current_binary_operator() else {
                break;
            };
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.consume_token();
            let rhs = self.parse_binary(precedence + 1)?;
            lhs = Rc::new(Expr {
                kind: ExprKind::Binary(lhs, op, rhs).into(),
                loc: self.location(lo),
                id: NodeId::new(),
            });
        }
        Ok(lhs)
    }

    fn current_binary_operator(&self) -> Option<BinaryOperator> {
        match self.current_token().tag() {
            TokenTag::EqEq => Some(BinaryOperator::Equal),
            TokenTag::NotEq => Some(BinaryOperator::NotEqual),
            TokenTag::Lt => Some(BinaryOperator::LessThan),
            TokenTag::Le => Some(BinaryOperator::LessThanOrEqual),
            TokenTag::Gt => Some(BinaryOperator::GreaterThan),
            TokenTag::Ge => Some(BinaryOperator::GreaterThanOrEqual),
            TokenTag::Plus => Some(BinaryOperator::Add),
            TokenTag::Minus => Some(BinaryOperator::Subtract),
            TokenTag::Star => Some(BinaryOperator::Multiply),
            TokenTag::Slash => Some(BinaryOperator::Divide),
            TokenTag::Percent => Some(BinaryOperator::Mod),
            TokenTag::AndAnd => Some(BinaryOperator::And),
            TokenTag::OrOr => Some(BinaryOperator::Or),
            _ => None,
        }
    }

    fn parse_unary(&mut self) -> Result<Rc<Expr>, Box<Error>> {
        let lo = self.current_token().span.lo;
        let op = match self.current_token().tag() {
            TokenTag::Minus => Some(UnaryOperator::Negate),
            TokenTag::Bang => Some(UnaryOperator::Not),
            _ => None,
        };
        if let Some(op) = op {
            self.consume_token();
            let operand = self.parse_unary()?;
            return Ok(Rc::new(Expr {
                kind: ExprKind::Unary(op, operand).into(),
                loc: self.location(lo),
                id: NodeId::new(),
            }));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Rc<Expr>, Box<Error>> {
        let lo = self.current_token().span.lo;
        let mut expr = self.parse_primary()?;
        loop {
            match self.current_token().tag() {
                TokenTag::Dot => {
                    self.consume_token();
                    let name = self.expect_ident()?;
                    expr = Rc::new(Expr {
                        kind: ExprKind::Member(expr, name).into(),
                        loc: self.location(lo),
                        id: NodeId::new(),
                    });
                }
                TokenTag::OpenParen => {
                    self.consume_token();
                    let args = self.parse_args()?;
                    expr = Rc::new(Expr {
                        kind: ExprKind::Call(expr, args).into(),
                        loc: self.location(lo),
                        id: NodeId::new(),
                    });
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// Arguments after an already-consumed `(`, up to and including the `)`.
    fn parse_args(&mut self) -> Result<Vec<Rc<Expr>>, Box<Error>> {
        let mut args = vec![];
        while !matches!(
            self.current_token().tag(),
            TokenTag::CloseParen | TokenTag::Eof
        ) {
            args.push(self.parse_expr()?);
            if self.current_token().tag() == TokenTag::Comma {
                self.consume_token();
            } else {
                break;
            }
        }
        self.expect_token(TokenTag::CloseParen)?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Rc<Expr>, Box<Error>> {
        let lo = self.current_token().span.lo;
        let current = self.current_token();
        let kind = match current.kind {
            TokenKind::IntLit(s) => {
                self.consume_token();
                ExprKind::Int(s.parse().unwrap_or_default())
            }
            TokenKind::StringLit(s) => {
                self.consume_token();
                ExprKind::Str(s)
            }
            TokenKind::True => {
                self.consume_token();
                ExprKind::Bool(true)
            }
            TokenKind::False => {
                self.consume_token();
                ExprKind::Bool(false)
            }
            TokenKind::Null => {
                self.consume_token();
                ExprKind::Null
            }
            TokenKind::New => {
                self.consume_token();
                let ty = self.parse_type_ref()?;
                self.expect_token(TokenTag::OpenParen)?;
                let args = self.parse_args()?;
                ExprKind::New(ty, args)
            }
            TokenKind::Ident(_) => {
                let name = self.expect_ident()?;
                ExprKind::Name(name)
            }
            TokenKind::OpenParen => {
                self.consume_token();
                let inner = self.parse_expr()?;
                self.expect_token(TokenTag::CloseParen)?;
                return Ok(inner);
            }
            _ => {
                return Err(Error::UnexpectedToken(
                    "expression".into(),
                    current.tag().to_string(),
                    self.current_token_location(),
                )
                .into());
            }
        };
        Ok(Rc::new(Expr {
            kind: kind.into(),
            loc: self.location(lo),
            id: NodeId::new(),
        }))
    }
}
