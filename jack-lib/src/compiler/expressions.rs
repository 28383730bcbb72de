//! Expressions, terms and subroutine calls
//!
//! The language has no operator precedence. An expression is a chain of terms joined by
//! binary operators, evaluated strictly left to right, so `a + b * c` means `(a + b) * c`.

use crate::core::*;
use crate::writer::InstructionSink;

use super::{
    compilation_error, expect_identifier, expect_symbol, grammar_error, one_of,
    CompilationEngine, CompilationError, CompilationResult, SubroutineKind,
};

/// the instruction a binary operator token compiles to, if it is one
fn binary_op(tok: &Token) -> Option<Instruction> {
    let TokenKind::Symbol(c) = tok.kind else {
        return None;
    };
    Some(match c {
        '+' => ArithmeticOp::Add.into(),
        '-' => ArithmeticOp::Sub.into(),
        '*' => Instruction::call("Math.multiply", 2),
        '/' => Instruction::call("Math.divide", 2),
        '&' => ArithmeticOp::And.into(),
        '|' => ArithmeticOp::Or.into(),
        '<' => ArithmeticOp::Lt.into(),
        '>' => ArithmeticOp::Gt.into(),
        '=' => ArithmeticOp::Eq.into(),
        _ => return None,
    })
}

impl<'src, S: InstructionSink> CompilationEngine<'src, S> {
    /// `term (op term)*`
    pub(super) fn compile_expression(&mut self, tok: Token) -> CompilationResult<Token> {
        let mut tok = self.compile_term(tok)?;
        while let Some(op) = binary_op(&tok) {
            let rhs = self.advance()?;
            tok = self.compile_term(rhs)?;
            self.emit(op)?;
        }
        Ok(tok)
    }

    fn compile_term(&mut self, tok: Token) -> CompilationResult<Token> {
        match tok.kind {
            TokenKind::IntegerLiteral(value) => {
                self.push(Segment::Constant, value.into())?;
                self.advance()
            }
            TokenKind::StringLiteral => {
                self.compile_string(&tok.text)?;
                self.advance()
            }
            TokenKind::Keyword(Keyword::True) => {
                self.push(Segment::Constant, 1)?;
                self.emit(ArithmeticOp::Neg)?;
                self.advance()
            }
            TokenKind::Keyword(Keyword::False | Keyword::Null) => {
                self.push(Segment::Constant, 0)?;
                self.advance()
            }
            TokenKind::Keyword(Keyword::This) => {
                self.push_receiver(&tok)?;
                self.advance()
            }
            TokenKind::Symbol('(') => {
                let tok = self.advance()?;
                let tok = self.compile_expression(tok)?;
                expect_symbol(&tok, ')')?;
                self.advance()
            }
            TokenKind::Symbol(c @ ('-' | '~')) => {
                let operand = self.advance()?;
                let tok = self.compile_term(operand)?;
                self.emit(if c == '-' {
                    ArithmeticOp::Neg
                } else {
                    ArithmeticOp::Not
                })?;
                Ok(tok)
            }
            TokenKind::Identifier => {
                // one token decides between variable, array element and the two call forms
                let next = self.advance()?;
                if next.is_symbol('[') {
                    let array = self.resolve(&tok)?;
                    self.push_symbol(&array)?;
                    let index = self.advance()?;
                    let after = self.compile_expression(index)?;
                    expect_symbol(&after, ']')?;
                    self.emit(ArithmeticOp::Add)?;
                    self.pop(Segment::Pointer, 1)?;
                    self.push(Segment::That, 0)?;
                    self.advance()
                } else if next.is_symbol('(') || next.is_symbol('.') {
                    self.lexer.push_back()?;
                    self.compile_subroutine_call(tok)
                } else {
                    let var = self.resolve(&tok)?;
                    self.push_symbol(&var)?;
                    Ok(next)
                }
            }
            _ => Err(grammar_error(&tok, "a term")),
        }
    }

    /// builds a string object and appends the characters one by one
    fn compile_string(&mut self, text: &str) -> CompilationResult<()> {
        self.push(Segment::Constant, text.chars().count())?;
        self.emit(Instruction::call("String.new", 1))?;
        for c in text.chars() {
            self.push(Segment::Constant, u32::from(c) as usize)?;
            self.emit(Instruction::call("String.appendChar", 2))?;
        }
        Ok(())
    }

    /// `this`: in a method the receiver is argument 0, in a constructor it is the freshly
    /// allocated object in pointer 0. Functions have no receiver.
    fn push_receiver(&mut self, tok: &Token) -> CompilationResult<()> {
        match self.subroutine.as_ref().map(|ctx| ctx.kind) {
            Some(SubroutineKind::Method) => self.push(Segment::Argument, 0),
            Some(SubroutineKind::Constructor) => self.push(Segment::Pointer, 0),
            Some(SubroutineKind::Function) => compilation_error!(Context {
                line: tok.line,
                msg: "`this` cannot be used inside a function".into(),
            }),
            None => compilation_error!(Context {
                line: tok.line,
                msg: "`this` outside of a subroutine".into(),
            }),
        }
    }

    /// Compiles `name(args)` or `qualifier.name(args)` starting at the first identifier.
    ///
    /// Calls that are bound to an object push it first and count it as an extra argument:
    /// a bare `name(args)` is a method call on the current object, and `var.name(args)` is a
    /// method call on the object in `var`, dispatched through the variable's declared class.
    /// `Class.name(args)` is a plain function or constructor call.
    pub(super) fn compile_subroutine_call(&mut self, first: Token) -> CompilationResult<Token> {
        let name = expect_identifier(&first)?;
        let tok = self.advance()?;

        let (callee, receivers) = if tok.is_symbol('.') {
            let member_tok = self.advance()?;
            let member = expect_identifier(&member_tok)?;
            self.expect_next_symbol('(')?;
            match self.symbols.lookup(&name).cloned() {
                Some(object) => {
                    self.push_symbol(&object)?;
                    (format!("{}.{member}", object.declared_type), 1)
                }
                None => (format!("{name}.{member}"), 0),
            }
        } else {
            if !tok.is_symbol('(') {
                return Err(grammar_error(&tok, one_of(&["(", "."])));
            }
            if !matches!(
                self.subroutine.as_ref().map(|ctx| ctx.kind),
                Some(SubroutineKind::Method | SubroutineKind::Constructor)
            ) {
                compilation_error!(Context {
                    line: first.line,
                    msg: format!("`{name}` needs an object, but there is none inside a function"),
                });
            }
            self.push(Segment::Pointer, 0)?;
            (format!("{}.{name}", self.class_name), 1)
        };

        let (n_args, tok) = self.compile_expression_list()?;
        expect_symbol(&tok, ')')?;
        self.emit(Instruction::call(callee, n_args + receivers))?;
        self.advance()
    }

    /// `(expr (, expr)*)?` right after an opening `(`, returns the number of expressions and
    /// the token that ended the list
    fn compile_expression_list(&mut self) -> CompilationResult<(usize, Token)> {
        let tok = self.advance()?;
        if tok.is_symbol(')') {
            return Ok((0, tok));
        }
        let mut tok = self.compile_expression(tok)?;
        let mut n_args = 1;
        while tok.is_symbol(',') {
            let next = self.advance()?;
            tok = self.compile_expression(next)?;
            n_args += 1;
        }
        Ok((n_args, tok))
    }
}
