use crate::ast::{
    BinaryOp, Block, DeclKind, Declarator, Expr, Function, Ident, JsxAttr, JsxAttrValue, JsxChild,
    JsxElement, Lit, Program, Stmt, UnaryOp,
};

use super::lexer::{Token, TokenKind};
use super::{Dialect, ParseError};

/// Recursive-descent parser over the lexed token stream. Statements end at
/// `;`, which may be omitted immediately before `}` or end of input.
pub(super) struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    dialect: Dialect,
}

fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::OrOr => Some(BinaryOp::Or),
        TokenKind::AndAnd => Some(BinaryOp::And),
        TokenKind::EqEq => Some(BinaryOp::EqEq),
        TokenKind::NotEq => Some(BinaryOp::NotEq),
        TokenKind::EqEqEq => Some(BinaryOp::EqEqEq),
        TokenKind::NotEqEq => Some(BinaryOp::NotEqEq),
        TokenKind::Lt => Some(BinaryOp::Lt),
        TokenKind::Gt => Some(BinaryOp::Gt),
        TokenKind::Le => Some(BinaryOp::Le),
        TokenKind::Ge => Some(BinaryOp::Ge),
        TokenKind::Plus => Some(BinaryOp::Add),
        TokenKind::Minus => Some(BinaryOp::Sub),
        TokenKind::Star => Some(BinaryOp::Mul),
        TokenKind::Slash => Some(BinaryOp::Div),
        TokenKind::Percent => Some(BinaryOp::Rem),
        _ => None,
    }
}

impl<'a> Parser<'a> {
    pub(super) fn new(source: &'a str, tokens: Vec<Token>, dialect: Dialect) -> Self {
        Self { source, tokens, pos: 0, dialect }
    }

    pub(super) fn program(mut self) -> Result<Program, ParseError> {
        let start = self.peek().span;
        let mut stmts = Vec::new();
        while self.peek().kind != TokenKind::Eof {
            stmts.push(self.stmt()?);
        }
        let end = self.peek().span;
        Ok(Program { body: Block::new(stmts, start.to(end)) })
    }

    // region token plumbing
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn nth_kind(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(kind.describe()))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let found = self.peek();
        ParseError::new(
            found.span.start,
            format!("expected {}, found {}", expected, found.kind.describe()),
            self.source,
        )
    }

    fn semi(&mut self) -> Result<(), ParseError> {
        match self.peek().kind {
            TokenKind::Semi => {
                self.advance();
                Ok(())
            }
            TokenKind::RBrace | TokenKind::Eof => Ok(()),
            _ => Err(self.unexpected("`;`")),
        }
    }
    // endregion

    // region statements
    fn stmt(&mut self) -> Result<Stmt, ParseError> {
        match self.peek().kind {
            TokenKind::Function => self.function_decl(),
            TokenKind::Return => self.return_stmt(),
            TokenKind::Var | TokenKind::Let | TokenKind::Const => self.var_decl(),
            TokenKind::If => self.if_stmt(),
            TokenKind::While => self.while_stmt(),
            TokenKind::LBrace => Ok(Stmt::Block(self.block()?)),
            TokenKind::Ident if self.nth_kind(1) == TokenKind::Colon => self.labeled(),
            _ => {
                let expr = self.expr()?;
                self.semi()?;
                let span = expr.span();
                Ok(Stmt::Expr { expr, span })
            }
        }
    }

    fn labeled(&mut self) -> Result<Stmt, ParseError> {
        let label_token = self.expect(TokenKind::Ident)?;
        let label = Ident::new(label_token.text.clone(), label_token.span);
        self.expect(TokenKind::Colon)?;
        let body = self.stmt()?;
        let span = label_token.span.to(body.span());
        Ok(Stmt::Labeled { label, body: Box::new(body), span })
    }

    fn return_stmt(&mut self) -> Result<Stmt, ParseError> {
        let token = self.expect(TokenKind::Return)?;
        let arg = match self.peek().kind {
            TokenKind::Semi | TokenKind::RBrace | TokenKind::Eof => None,
            _ => Some(self.expr()?),
        };
        self.semi()?;
        let span = match &arg {
            Some(expr) => token.span.to(expr.span()),
            None => token.span,
        };
        Ok(Stmt::Return { arg, span })
    }

    fn var_decl(&mut self) -> Result<Stmt, ParseError> {
        let token = self.advance();
        let kind = match token.kind {
            TokenKind::Var => DeclKind::Var,
            TokenKind::Let => DeclKind::Let,
            _ => DeclKind::Const,
        };
        let mut decls = Vec::new();
        let mut end = token.span;
        loop {
            let name_token = self.expect(TokenKind::Ident)?;
            let name = Ident::new(name_token.text.clone(), name_token.span);
            end = name_token.span;
            if self.dialect.typed() && self.check(TokenKind::Colon) {
                self.advance();
                self.skip_type()?;
            }
            let init = if self.check(TokenKind::Eq) {
                self.advance();
                let expr = self.expr()?;
                end = expr.span();
                Some(expr)
            } else {
                None
            };
            decls.push(Declarator { name, init });
            if !self.check(TokenKind::Comma) {
                break;
            }
            self.advance();
        }
        self.semi()?;
        Ok(Stmt::VarDecl { kind, decls, span: token.span.to(end) })
    }

    /// Consume a typed-annotation extension type: a dotted name followed by
    /// any number of `[]` suffixes. The annotation doesn't survive parsing.
    fn skip_type(&mut self) -> Result<(), ParseError> {
        self.expect(TokenKind::Ident)?;
        while self.check(TokenKind::Dot) {
            self.advance();
            self.expect(TokenKind::Ident)?;
        }
        while self.check(TokenKind::LBracket) && self.nth_kind(1) == TokenKind::RBracket {
            self.advance();
            self.advance();
        }
        Ok(())
    }

    fn if_stmt(&mut self) -> Result<Stmt, ParseError> {
        let token = self.expect(TokenKind::If)?;
        self.expect(TokenKind::LParen)?;
        let cond = self.expr()?;
        self.expect(TokenKind::RParen)?;
        let then = self.block()?;
        let (else_, end) = if self.check(TokenKind::Else) {
            self.advance();
            if self.check(TokenKind::If) {
                // `else if` becomes an else block with a single if statement
                let nested = self.if_stmt()?;
                let span = nested.span();
                (Some(Block::new(vec![nested], span)), span)
            } else {
                let block = self.block()?;
                let span = block.span;
                (Some(block), span)
            }
        } else {
            (None, then.span)
        };
        Ok(Stmt::If { cond, then, else_, span: token.span.to(end) })
    }

    fn while_stmt(&mut self) -> Result<Stmt, ParseError> {
        let token = self.expect(TokenKind::While)?;
        self.expect(TokenKind::LParen)?;
        let cond = self.expr()?;
        self.expect(TokenKind::RParen)?;
        let body = self.block()?;
        let span = token.span.to(body.span);
        Ok(Stmt::While { cond, body, span })
    }

    fn function_decl(&mut self) -> Result<Stmt, ParseError> {
        let token = self.expect(TokenKind::Function)?;
        let name_token = self.expect(TokenKind::Ident)?;
        let name = Ident::new(name_token.text.clone(), name_token.span);
        let params = self.params()?;
        let body = self.block()?;
        let span = token.span.to(body.span);
        Ok(Stmt::FunctionDecl {
            func: Function { name: Some(name), params, body },
            span,
        })
    }

    fn params(&mut self) -> Result<Vec<Ident>, ParseError> {
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        while !self.check(TokenKind::RParen) {
            let token = self.expect(TokenKind::Ident)?;
            params.push(Ident::new(token.text.clone(), token.span));
            if self.dialect.typed() && self.check(TokenKind::Colon) {
                self.advance();
                self.skip_type()?;
            }
            if !self.check(TokenKind::Comma) {
                break;
            }
            self.advance();
        }
        self.expect(TokenKind::RParen)?;
        Ok(params)
    }

    fn block(&mut self) -> Result<Block, ParseError> {
        let open = self.expect(TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.check(TokenKind::Eof) {
            stmts.push(self.stmt()?);
        }
        let close = self.expect(TokenKind::RBrace)?;
        Ok(Block::new(stmts, open.span.to(close.span)))
    }
    // endregion

    // region expressions
    fn expr(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.binary(0)?;
        if self.check(TokenKind::Eq) {
            self.advance();
            let value = self.expr()?;
            let span = lhs.span().to(value.span());
            return Ok(Expr::Assign { target: Box::new(lhs), value: Box::new(value), span });
        }
        Ok(lhs)
    }

    fn binary(&mut self, min_prec: u8) -> Result<Expr, ParseError> {
        let mut lhs = self.unary()?;
        while let Some(op) = binary_op(self.peek().kind) {
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            self.advance();
            let rhs = self.binary(prec + 1)?;
            let span = lhs.span().to(rhs.span());
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs), span };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek().kind {
            TokenKind::Not => Some(UnaryOp::Not),
            TokenKind::Minus => Some(UnaryOp::Neg),
            _ => None,
        };
        let Some(op) = op else {
            return self.postfix();
        };
        let token = self.advance();
        let operand = self.unary()?;
        let span = token.span.to(operand.span());
        Ok(Expr::Unary { op, operand: Box::new(operand), span })
    }

    fn postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.primary()?;
        loop {
            match self.peek().kind {
                TokenKind::LParen => {
                    self.advance();
                    let mut args = Vec::new();
                    while !self.check(TokenKind::RParen) {
                        args.push(self.expr()?);
                        if !self.check(TokenKind::Comma) {
                            break;
                        }
                        self.advance();
                    }
                    let close = self.expect(TokenKind::RParen)?;
                    let span = expr.span().to(close.span);
                    expr = Expr::Call { callee: Box::new(expr), args, span };
                }
                TokenKind::Dot => {
                    self.advance();
                    let token = self.expect(TokenKind::Ident)?;
                    let property = Ident::new(token.text.clone(), token.span);
                    let span = expr.span().to(token.span);
                    expr = Expr::Member { object: Box::new(expr), property, span };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        match self.peek().kind {
            TokenKind::Ident if self.nth_kind(1) == TokenKind::Arrow => {
                let token = self.advance();
                let param = Ident::new(token.text.clone(), token.span);
                self.expect(TokenKind::Arrow)?;
                let body = self.block()?;
                let span = token.span.to(body.span);
                Ok(Expr::Arrow { params: vec![param], body, span })
            }
            TokenKind::Ident => {
                let token = self.advance();
                Ok(Expr::Ident(Ident::new(token.text.clone(), token.span)))
            }
            TokenKind::Str => {
                let token = self.advance();
                Ok(Expr::Lit { lit: Lit::Str(token.text.clone()), span: token.span })
            }
            TokenKind::Num => {
                let token = self.advance();
                Ok(Expr::Lit { lit: Lit::Num(token.text.clone()), span: token.span })
            }
            TokenKind::True => {
                let token = self.advance();
                Ok(Expr::Lit { lit: Lit::Bool(true), span: token.span })
            }
            TokenKind::False => {
                let token = self.advance();
                Ok(Expr::Lit { lit: Lit::Bool(false), span: token.span })
            }
            TokenKind::Null => {
                let token = self.advance();
                Ok(Expr::Lit { lit: Lit::Null, span: token.span })
            }
            TokenKind::LParen if self.arrow_ahead() => {
                let open = self.advance();
                let mut params = Vec::new();
                while !self.check(TokenKind::RParen) {
                    let token = self.expect(TokenKind::Ident)?;
                    params.push(Ident::new(token.text.clone(), token.span));
                    if self.dialect.typed() && self.check(TokenKind::Colon) {
                        self.advance();
                        self.skip_type()?;
                    }
                    if !self.check(TokenKind::Comma) {
                        break;
                    }
                    self.advance();
                }
                self.expect(TokenKind::RParen)?;
                self.expect(TokenKind::Arrow)?;
                let body = self.block()?;
                let span = open.span.to(body.span);
                Ok(Expr::Arrow { params, body, span })
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::LBracket => {
                let open = self.advance();
                let mut elems = Vec::new();
                while !self.check(TokenKind::RBracket) {
                    elems.push(self.expr()?);
                    if !self.check(TokenKind::Comma) {
                        break;
                    }
                    self.advance();
                }
                let close = self.expect(TokenKind::RBracket)?;
                Ok(Expr::Array { elems, span: open.span.to(close.span) })
            }
            TokenKind::Function => {
                let token = self.advance();
                let name = if self.check(TokenKind::Ident) {
                    let name_token = self.advance();
                    Some(Ident::new(name_token.text.clone(), name_token.span))
                } else {
                    None
                };
                let params = self.params()?;
                let body = self.block()?;
                let span = token.span.to(body.span);
                Ok(Expr::Function { func: Function { name, params, body }, span })
            }
            TokenKind::Lt if self.dialect.jsx() => {
                let (elem, span) = self.jsx_element()?;
                Ok(Expr::Jsx { elem, span })
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    /// At a `(`, look ahead past the matching `)` for a `=>`
    fn arrow_ahead(&self) -> bool {
        let mut depth = 0usize;
        let mut i = self.pos;
        loop {
            match self.tokens.get(i).map(|t| t.kind) {
                Some(TokenKind::LParen) => depth += 1,
                Some(TokenKind::RParen) => {
                    depth -= 1;
                    if depth == 0 {
                        return self
                            .tokens
                            .get(i + 1)
                            .is_some_and(|t| t.kind == TokenKind::Arrow);
                    }
                }
                Some(TokenKind::Eof) | None => return false,
                Some(_) => {}
            }
            i += 1;
        }
    }

    fn jsx_element(&mut self) -> Result<(JsxElement, crate::ast::Span), ParseError> {
        let open = self.expect(TokenKind::Lt)?;
        let tag_token = self.expect(TokenKind::Ident)?;
        let tag = Ident::new(tag_token.text.clone(), tag_token.span);
        let mut attrs = Vec::new();
        while self.check(TokenKind::Ident) {
            let name_token = self.advance();
            let name = Ident::new(name_token.text.clone(), name_token.span);
            let value = if self.check(TokenKind::Eq) {
                self.advance();
                match self.peek().kind {
                    TokenKind::Str => {
                        let token = self.advance();
                        Some(JsxAttrValue::Str(token.text.clone(), token.span))
                    }
                    TokenKind::LBrace => {
                        self.advance();
                        let expr = self.expr()?;
                        self.expect(TokenKind::RBrace)?;
                        Some(JsxAttrValue::Expr(expr))
                    }
                    _ => return Err(self.unexpected("attribute value")),
                }
            } else {
                None
            };
            attrs.push(JsxAttr { name, value });
        }
        if self.check(TokenKind::Slash) {
            self.advance();
            let close = self.expect(TokenKind::Gt)?;
            return Ok((
                JsxElement { tag, attrs, children: Vec::new() },
                open.span.to(close.span),
            ));
        }
        self.expect(TokenKind::Gt)?;
        let mut children = Vec::new();
        loop {
            match self.peek().kind {
                TokenKind::Lt if self.nth_kind(1) == TokenKind::Slash => break,
                TokenKind::Lt => {
                    let (child, _) = self.jsx_element()?;
                    children.push(JsxChild::Element(child));
                }
                TokenKind::LBrace => {
                    self.advance();
                    let expr = self.expr()?;
                    self.expect(TokenKind::RBrace)?;
                    children.push(JsxChild::Expr(expr));
                }
                _ => return Err(self.unexpected("bracket element child")),
            }
        }
        self.expect(TokenKind::Lt)?;
        self.expect(TokenKind::Slash)?;
        let close_tag = self.expect(TokenKind::Ident)?;
        if close_tag.text != tag.name {
            return Err(ParseError::new(
                close_tag.span.start,
                format!("mismatched closing tag: expected `{}`, found `{}`", tag.name, close_tag.text),
                self.source,
            ));
        }
        let close = self.expect(TokenKind::Gt)?;
        Ok((JsxElement { tag, attrs, children }, open.span.to(close.span)))
    }
    // endregion
}

#[cfg(test)]
mod tests {
    use crate::ast::{Expr, Stmt};
    use crate::syntax::{parse, Dialect};

    #[test]
    fn parses_defer_binding_as_labeled_assignment() {
        let program = parse("defer: x = F(a, b);", Dialect::Plain).unwrap();
        let [stmt] = &program.body.stmts[..] else {
            panic!("expected one statement");
        };
        let Stmt::Labeled { label, body, .. } = stmt else {
            panic!("expected labeled statement, got {:?}", stmt);
        };
        assert_eq!(label.name.as_str(), "defer");
        let Stmt::Expr { expr: Expr::Assign { target, value, .. }, .. } = &**body else {
            panic!("expected assignment body, got {:?}", body);
        };
        assert!(matches!(&**target, Expr::Ident(ident) if ident.name.as_str() == "x"));
        let Expr::Call { args, .. } = &**value else {
            panic!("expected call, got {:?}", value);
        };
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn parses_arrow_functions() {
        let program = parse("f((x) => { g(x); }, y => { h(y); });", Dialect::Plain).unwrap();
        let Stmt::Expr { expr: Expr::Call { args, .. }, .. } = &program.body.stmts[0] else {
            panic!("expected call statement");
        };
        assert!(matches!(&args[0], Expr::Arrow { params, .. } if params.len() == 1));
        assert!(matches!(&args[1], Expr::Arrow { params, .. } if params.len() == 1));
    }

    #[test]
    fn typed_dialect_discards_annotations() {
        let program = parse(
            "function f(a: Num, b: util.List[]) { let x: Num = a; return x; }",
            Dialect::Typed,
        )
        .unwrap();
        let Stmt::FunctionDecl { func, .. } = &program.body.stmts[0] else {
            panic!("expected function declaration");
        };
        assert_eq!(func.params.len(), 2);
        assert_eq!(func.body.stmts.len(), 2);
    }

    #[test]
    fn plain_dialect_rejects_annotations() {
        assert!(parse("function f(a: Num) { }", Dialect::Plain).is_err());
    }

    #[test]
    fn jsx_dialect_parses_bracket_elements() {
        let program = parse(
            "render(<panel title=\"hi\" width={12}><row>{body}</row></panel>);",
            Dialect::Jsx,
        )
        .unwrap();
        let Stmt::Expr { expr: Expr::Call { args, .. }, .. } = &program.body.stmts[0] else {
            panic!("expected call statement");
        };
        let Expr::Jsx { elem, .. } = &args[0] else {
            panic!("expected bracket element");
        };
        assert_eq!(elem.tag.name.as_str(), "panel");
        assert_eq!(elem.attrs.len(), 2);
        assert_eq!(elem.children.len(), 1);
    }

    #[test]
    fn reports_position_and_excerpt() {
        let err = parse("a();\nlet = 3;", Dialect::Plain).unwrap_err();
        assert_eq!(err.pos.line, 2);
        assert_eq!(err.excerpt, "let = 3;");
        assert!(err.message.contains("expected identifier"));
    }

    #[test]
    fn missing_semicolon_between_statements_is_an_error() {
        assert!(parse("a() b()", Dialect::Plain).is_err());
    }
}
