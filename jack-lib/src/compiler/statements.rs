use crate::core::*;
use crate::writer::InstructionSink;

use super::{
    compilation_error, expect_identifier, expect_symbol, grammar_error, one_of,
    CompilationEngine, CompilationError, CompilationResult,
};

impl<'src, S: InstructionSink> CompilationEngine<'src, S> {
    /// Compiles statements as long as the current token starts one, returns the first token
    /// that doesn't.
    pub(super) fn compile_statements(&mut self, mut tok: Token) -> CompilationResult<Token> {
        loop {
            tok = match tok.keyword() {
                Some(Keyword::Let) => self.compile_let(tok)?,
                Some(Keyword::If) => self.compile_if(tok)?,
                Some(Keyword::While) => self.compile_while(tok)?,
                Some(Keyword::Do) => self.compile_do(tok)?,
                Some(Keyword::Return) => self.compile_return(tok)?,
                _ => return Ok(tok),
            };
        }
    }

    /// `{ statements }`, starting with the token after the current one
    fn compile_block(&mut self) -> CompilationResult<Token> {
        self.expect_next_symbol('{')?;
        let tok = self.advance()?;
        let tok = self.compile_statements(tok)?;
        if !tok.is_symbol('}') {
            return Err(grammar_error(
                &tok,
                one_of(&["let", "if", "while", "do", "return", "}"]),
            ));
        }
        self.advance()
    }

    /// `let name ([ expr ])? = expr ;`
    fn compile_let(&mut self, _let: Token) -> CompilationResult<Token> {
        let name_tok = self.advance()?;
        let target = self.resolve(&name_tok)?;

        let tok = self.advance()?;
        let tok = if tok.is_symbol('[') {
            self.push_symbol(&target)?;
            let tok = self.advance()?;
            let tok = self.compile_expression(tok)?;
            expect_symbol(&tok, ']')?;
            self.emit(ArithmeticOp::Add)?;

            self.expect_next_symbol('=')?;
            let tok = self.advance()?;
            let tok = self.compile_expression(tok)?;
            // the right hand side may itself use `that`, so the address is only
            // moved into pointer 1 once the value is known
            self.pop(Segment::Temp, 0)?;
            self.pop(Segment::Pointer, 1)?;
            self.push(Segment::Temp, 0)?;
            self.pop(Segment::That, 0)?;
            tok
        } else {
            if !tok.is_symbol('=') {
                return Err(grammar_error(&tok, one_of(&["[", "="])));
            }
            let tok = self.advance()?;
            let tok = self.compile_expression(tok)?;
            self.pop_symbol(&target)?;
            tok
        };
        expect_symbol(&tok, ';')?;
        self.advance()
    }

    /// `if ( expr ) { statements } (else { statements })?`
    fn compile_if(&mut self, _if: Token) -> CompilationResult<Token> {
        self.expect_next_symbol('(')?;
        let tok = self.advance()?;
        let tok = self.compile_expression(tok)?;
        expect_symbol(&tok, ')')?;

        self.emit(ArithmeticOp::Not)?;
        let false_label = self.allocate_label("IF_FALSE");
        self.emit(Instruction::IfGoto(false_label.clone()))?;
        let tok = self.compile_block()?;

        if !tok.is_keyword(Keyword::Else) {
            self.emit(Instruction::Label(false_label))?;
            return Ok(tok);
        }
        let end_label = self.allocate_label("IF_END");
        self.emit(Instruction::Goto(end_label.clone()))?;
        self.emit(Instruction::Label(false_label))?;
        let tok = self.compile_block()?;
        self.emit(Instruction::Label(end_label))?;
        Ok(tok)
    }

    /// `while ( expr ) { statements }`
    fn compile_while(&mut self, _while: Token) -> CompilationResult<Token> {
        let top_label = self.allocate_label("WHILE_TOP");
        let end_label = self.allocate_label("WHILE_END");
        self.emit(Instruction::Label(top_label.clone()))?;

        self.expect_next_symbol('(')?;
        let tok = self.advance()?;
        let tok = self.compile_expression(tok)?;
        expect_symbol(&tok, ')')?;

        self.emit(ArithmeticOp::Not)?;
        self.emit(Instruction::IfGoto(end_label.clone()))?;
        let tok = self.compile_block()?;
        self.emit(Instruction::Goto(top_label))?;
        self.emit(Instruction::Label(end_label))?;
        Ok(tok)
    }

    /// `do call ;`, the returned value is thrown away
    fn compile_do(&mut self, _do: Token) -> CompilationResult<Token> {
        let callee = self.advance()?;
        expect_identifier(&callee)?;
        let tok = self.compile_subroutine_call(callee)?;
        expect_symbol(&tok, ';')?;
        self.pop(Segment::Temp, 0)?;
        self.advance()
    }

    /// `return expr? ;`
    ///
    /// Void subroutines return a dummy 0, everything else has to return a value.
    fn compile_return(&mut self, ret: Token) -> CompilationResult<Token> {
        let Some(returns_void) = self.subroutine.as_ref().map(|ctx| ctx.returns_void) else {
            compilation_error!(Context {
                line: ret.line,
                msg: "`return` outside of a subroutine".into(),
            });
        };
        let tok = self.advance()?;
        let tok = if returns_void {
            if !tok.is_symbol(';') {
                return Err(grammar_error(&tok, "\";\" (the subroutine is void)"));
            }
            self.push(Segment::Constant, 0)?;
            tok
        } else {
            let tok = self.compile_expression(tok)?;
            expect_symbol(&tok, ';')?;
            tok
        };
        self.emit(Instruction::Return)?;
        self.advance()
    }
}

#[cfg(test)]
mod tests {
    use crate::core::*;
    use crate::compiler::{CompilationEngine, CompilationError};

    /// compiles `body` as the statements of `function void f()` in class `T`, with the given
    /// local declarations, and returns the text of the body (without the function header)
    fn body(locals: &str, body: &str) -> Result<Vec<String>, CompilationError> {
        let src = format!("class T {{ static Array s; function void f() {{ {locals} {body} return; }} }}");
        let mut engine = CompilationEngine::new(&src, Vec::<Instruction>::new());
        engine.compile()?;
        let code: Vec<Instruction> = engine.into_sink();
        let lines: Vec<String> = code.iter().map(ToString::to_string).collect();
        // drop the header and the implicit `push constant 0; return`
        Ok(lines[1..lines.len() - 2].to_vec())
    }

    #[test]
    fn let_pops_into_variable_segment() {
        assert_eq!(
            body("var int x;", "let x = 3; let s = x;").unwrap(),
            vec!["push constant 3", "pop local 0", "push local 0", "pop static 0"]
        );
    }

    #[test]
    fn let_array_element() {
        assert_eq!(
            body("var Array a; var int i;", "let a[i] = a[1];").unwrap(),
            vec![
                "push local 0",
                "push local 1",
                "add",
                "push local 0",
                "push constant 1",
                "add",
                "pop pointer 1",
                "push that 0",
                "pop temp 0",
                "pop pointer 1",
                "push temp 0",
                "pop that 0",
            ]
        );
    }

    #[test]
    fn if_without_else() {
        assert_eq!(
            body("var int x;", "if (x) { let x = 1; }").unwrap(),
            vec![
                "push local 0",
                "not",
                "if-goto T.f$IF_FALSE$0",
                "push constant 1",
                "pop local 0",
                "label T.f$IF_FALSE$0",
            ]
        );
    }

    #[test]
    fn if_with_else() {
        assert_eq!(
            body("var int x;", "if (x) { let x = 1; } else { let x = 2; }").unwrap(),
            vec![
                "push local 0",
                "not",
                "if-goto T.f$IF_FALSE$0",
                "push constant 1",
                "pop local 0",
                "goto T.f$IF_END$1",
                "label T.f$IF_FALSE$0",
                "push constant 2",
                "pop local 0",
                "label T.f$IF_END$1",
            ]
        );
    }

    #[test]
    fn while_loop() {
        assert_eq!(
            body("var int i;", "while (i < 10) { let i = i + 1; }").unwrap(),
            vec![
                "label T.f$WHILE_TOP$0",
                "push local 0",
                "push constant 10",
                "lt",
                "not",
                "if-goto T.f$WHILE_END$1",
                "push local 0",
                "push constant 1",
                "add",
                "pop local 0",
                "goto T.f$WHILE_TOP$0",
                "label T.f$WHILE_END$1",
            ]
        );
    }

    #[test]
    fn do_discards_result() {
        assert_eq!(
            body("", "do Output.printInt(7);").unwrap(),
            vec!["push constant 7", "call Output.printInt 1", "pop temp 0"]
        );
    }

    #[test]
    fn let_to_undeclared_variable() {
        let err = body("", "let y = 1;").unwrap_err();
        assert!(
            matches!(&err, CompilationError::UndefinedSymbol { name, .. } if name == "y"),
            "{err}"
        );
    }

    #[test]
    fn void_return_with_value_is_rejected() {
        let src = "class T { function void f() { return 1; } }";
        let err = CompilationEngine::new(src, Vec::<Instruction>::new()).compile().unwrap_err();
        assert!(matches!(err, CompilationError::Grammar { .. }), "{err}");
    }

    #[test]
    fn non_void_return_needs_value() {
        let src = "class T { function int f() { return; } }";
        let err = CompilationEngine::new(src, Vec::<Instruction>::new()).compile().unwrap_err();
        assert!(
            matches!(&err, CompilationError::Grammar { expected, .. } if expected == "a term"),
            "{err}"
        );
    }

    #[test]
    fn return_without_subroutine_context() {
        let mut engine = CompilationEngine::new("return;", Vec::<Instruction>::new());
        let ret = engine.advance().unwrap();
        let err = engine.compile_return(ret).unwrap_err();
        assert!(matches!(err, CompilationError::Context { line: 1, .. }), "{err}");
        assert!(engine.into_sink().is_empty());
    }
}
