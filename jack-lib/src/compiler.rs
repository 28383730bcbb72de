//! The compilation engine: parser and code generator in one pass
//!
//! Every grammar production is a method that receives the first token of the construct it
//! compiles and returns the first token after it. Instructions are pushed into the sink as
//! soon as they are known, no syntax tree is built. Statements live in
//! [`statements`](self::statements), expressions and calls in [`expressions`](self::expressions).

use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;

use crate::core::*;
use crate::lexer::{LexError, Lexer};
use crate::writer::InstructionSink;

mod expressions;
mod statements;

pub type CompilationResult<T> = Result<T, CompilationError>;

#[derive(Error, Debug)]
pub enum CompilationError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("line {line}: expected {expected}, found {found}")]
    Grammar {
        line: usize,
        expected: String,
        found: String,
    },

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("line {line}: undefined identifier `{name}`")]
    UndefinedSymbol { line: usize, name: String },

    #[error("line {line}: {source}")]
    Redefinition { line: usize, source: ScopeError },

    #[error("line {line}: {msg}")]
    Context { line: usize, msg: String },

    #[error("failed to emit instruction")]
    Emit(#[from] std::fmt::Error),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{}: not a .jack file", .path.display())]
    NotASource { path: PathBuf },

    #[error("{}: directory contains no .jack files", .path.display())]
    NoSources { path: PathBuf },
}

macro_rules! compilation_error {
    ($($err:tt)+) => {
        return Err(CompilationError::$($err)*)
    };
}

pub(crate) use compilation_error;

/// formats a set of alternatives for a grammar error
fn one_of(options: &[&str]) -> String {
    let quoted: Vec<_> = options.iter().map(|o| format!("\"{o}\"")).collect();
    match quoted.as_slice() {
        [single] => single.clone(),
        _ => format!("one of {}", quoted.join(", ")),
    }
}

fn grammar_error(found: &Token, expected: impl Into<String>) -> CompilationError {
    CompilationError::Grammar {
        line: found.line,
        expected: expected.into(),
        found: found.describe(),
    }
}

fn expect_symbol(tok: &Token, c: char) -> CompilationResult<()> {
    if tok.is_symbol(c) {
        Ok(())
    } else {
        Err(grammar_error(tok, format!("\"{c}\"")))
    }
}

fn expect_identifier(tok: &Token) -> CompilationResult<String> {
    if tok.is_identifier() {
        Ok(tok.text.clone())
    } else {
        Err(grammar_error(tok, "an identifier"))
    }
}

/// `int`, `char`, `boolean` or a class name, plus `void` where a return type is expected
fn expect_type(tok: &Token, allow_void: bool) -> CompilationResult<String> {
    match tok.keyword() {
        Some(Keyword::Int | Keyword::Char | Keyword::Boolean) => Ok(tok.text.clone()),
        Some(Keyword::Void) if allow_void => Ok(tok.text.clone()),
        None if tok.is_identifier() => Ok(tok.text.clone()),
        _ if allow_void => Err(grammar_error(tok, "a type or \"void\"")),
        _ => Err(grammar_error(tok, "a type")),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubroutineKind {
    Constructor,
    Function,
    Method,
}

/// what the engine knows about the subroutine it is inside of
#[derive(Debug, Clone)]
struct SubroutineContext {
    name: String,
    kind: SubroutineKind,
    returns_void: bool,
}

/// Compiles one class from `src` into `sink`.
///
/// An engine is good for a single source file. It owns the lexer, the symbol table and the
/// label counter, so engines for different files share nothing and can run on different
/// threads.
pub struct CompilationEngine<'src, S: InstructionSink> {
    lexer: Lexer<'src>,
    symbols: SymbolTable,
    labels: LabelAllocator,
    sink: S,
    class_name: String,
    subroutine: Option<SubroutineContext>,
}

impl<'src, S: InstructionSink> CompilationEngine<'src, S> {
    pub fn new(src: &'src str, sink: S) -> Self {
        CompilationEngine {
            lexer: Lexer::new(src),
            symbols: SymbolTable::new(),
            labels: LabelAllocator::new(),
            sink,
            class_name: String::new(),
            subroutine: None,
        }
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Compiles the class the source consists of. Nothing but whitespace and comments may
    /// follow the class.
    pub fn compile(&mut self) -> CompilationResult<()> {
        let first = self.advance()?;
        if let Some(trailing) = self.compile_class(first)? {
            return Err(grammar_error(&trailing, "end of input"));
        }
        Ok(())
    }

    // ==============================================================================
    // Plumbing
    // ==============================================================================

    /// next token, where running out of input is an error
    fn advance(&mut self) -> CompilationResult<Token> {
        self.lexer
            .next_token()?
            .ok_or(CompilationError::UnexpectedEof)
    }

    fn expect_next_symbol(&mut self, c: char) -> CompilationResult<()> {
        let tok = self.advance()?;
        expect_symbol(&tok, c)
    }

    fn emit(&mut self, instruction: impl Into<Instruction>) -> CompilationResult<()> {
        self.sink.emit(instruction.into())?;
        Ok(())
    }

    fn push(&mut self, segment: Segment, idx: usize) -> CompilationResult<()> {
        self.emit(Instruction::Push(segment, idx))
    }

    fn pop(&mut self, segment: Segment, idx: usize) -> CompilationResult<()> {
        self.emit(Instruction::Pop(segment, idx))
    }

    fn push_symbol(&mut self, sym: &Symbol) -> CompilationResult<()> {
        self.push(sym.segment(), sym.ordinal)
    }

    fn pop_symbol(&mut self, sym: &Symbol) -> CompilationResult<()> {
        self.pop(sym.segment(), sym.ordinal)
    }

    /// looks up the identifier in `tok`, failing if it was never declared
    fn resolve(&self, tok: &Token) -> CompilationResult<Symbol> {
        let name = expect_identifier(tok)?;
        match self.symbols.lookup(&name) {
            Some(sym) => Ok(sym.clone()),
            None => compilation_error!(UndefinedSymbol {
                line: tok.line,
                name
            }),
        }
    }

    fn declare(
        &mut self,
        name_tok: &Token,
        declared_type: &str,
        category: Category,
    ) -> CompilationResult<()> {
        let name = expect_identifier(name_tok)?;
        self.symbols
            .define(&name, declared_type, category)
            .map_err(|source| CompilationError::Redefinition {
                line: name_tok.line,
                source,
            })
    }

    fn allocate_label(&mut self, purpose: &str) -> Label {
        let subroutine = self.subroutine.as_ref().map_or("", |ctx| ctx.name.as_str());
        self.labels.allocate(&self.class_name, subroutine, purpose)
    }

    // ==============================================================================
    // Class level productions
    // ==============================================================================

    /// `class Name { classVarDec* subroutineDec* }`, returns whatever follows the class
    fn compile_class(&mut self, tok: Token) -> CompilationResult<Option<Token>> {
        if !tok.is_keyword(Keyword::Class) {
            return Err(grammar_error(&tok, one_of(&["class"])));
        }
        let name_tok = self.advance()?;
        self.class_name = expect_identifier(&name_tok)?;
        self.symbols.start_class();
        debug!(class = %self.class_name, "compiling class");
        self.expect_next_symbol('{')?;

        let mut tok = self.advance()?;
        while matches!(tok.keyword(), Some(Keyword::Static | Keyword::Field)) {
            tok = self.compile_class_var_dec(tok)?;
        }
        while matches!(
            tok.keyword(),
            Some(Keyword::Constructor | Keyword::Function | Keyword::Method)
        ) {
            tok = self.compile_subroutine_dec(tok)?;
        }
        if !tok.is_symbol('}') {
            return Err(grammar_error(
                &tok,
                one_of(&["static", "field", "constructor", "function", "method", "}"]),
            ));
        }
        Ok(self.lexer.next_token()?)
    }

    /// `(static | field) type name (, name)* ;`
    fn compile_class_var_dec(&mut self, tok: Token) -> CompilationResult<Token> {
        let category = match tok.keyword() {
            Some(Keyword::Static) => Category::Static,
            Some(Keyword::Field) => Category::Field,
            _ => return Err(grammar_error(&tok, one_of(&["static", "field"]))),
        };
        let type_tok = self.advance()?;
        let declared_type = expect_type(&type_tok, false)?;
        self.compile_name_list(&declared_type, category)
    }

    /// `name (, name)* ;` all sharing one type, returns the token after the `;`
    fn compile_name_list(
        &mut self,
        declared_type: &str,
        category: Category,
    ) -> CompilationResult<Token> {
        loop {
            let name_tok = self.advance()?;
            self.declare(&name_tok, declared_type, category)?;
            let tok = self.advance()?;
            if tok.is_symbol(',') {
                continue;
            }
            if !tok.is_symbol(';') {
                return Err(grammar_error(&tok, one_of(&[",", ";"])));
            }
            return self.advance();
        }
    }

    /// `(constructor | function | method) (void | type) name ( params ) { varDec* statements }`
    fn compile_subroutine_dec(&mut self, tok: Token) -> CompilationResult<Token> {
        let kind = match tok.keyword() {
            Some(Keyword::Constructor) => SubroutineKind::Constructor,
            Some(Keyword::Function) => SubroutineKind::Function,
            Some(Keyword::Method) => SubroutineKind::Method,
            _ => {
                return Err(grammar_error(
                    &tok,
                    one_of(&["constructor", "function", "method"]),
                ))
            }
        };
        let return_tok = self.advance()?;
        let return_type = expect_type(&return_tok, true)?;
        let name_tok = self.advance()?;
        let name = expect_identifier(&name_tok)?;
        debug!(class = %self.class_name, subroutine = %name, ?kind, "compiling subroutine");

        self.symbols.start_subroutine(kind == SubroutineKind::Method);
        self.subroutine = Some(SubroutineContext {
            name: name.clone(),
            kind,
            returns_void: return_tok.is_keyword(Keyword::Void),
        });

        self.expect_next_symbol('(')?;
        let tok = self.advance()?;
        let tok = self.compile_parameter_list(tok)?;
        expect_symbol(&tok, ')')?;

        self.expect_next_symbol('{')?;
        let mut tok = self.advance()?;
        while tok.is_keyword(Keyword::Var) {
            tok = self.compile_var_dec(tok)?;
        }

        // all locals are known now, so the frame size can be written
        let n_locals = self.symbols.count_of(Category::Local);
        self.emit(Instruction::function(
            format!("{}.{}", self.class_name, name),
            n_locals,
        ))?;
        match kind {
            SubroutineKind::Constructor => {
                let n_fields = self.symbols.count_of(Category::Field);
                self.push(Segment::Constant, n_fields)?;
                self.emit(Instruction::call("Memory.alloc", 1))?;
                self.pop(Segment::Pointer, 0)?;
            }
            SubroutineKind::Method => {
                self.push(Segment::Argument, 0)?;
                self.pop(Segment::Pointer, 0)?;
            }
            SubroutineKind::Function => {}
        }

        let tok = self.compile_statements(tok)?;
        if !tok.is_symbol('}') {
            return Err(grammar_error(
                &tok,
                one_of(&["let", "if", "while", "do", "return", "}"]),
            ));
        }
        debug!(
            subroutine = %name,
            %return_type,
            n_locals,
            "finished subroutine"
        );
        self.subroutine = None;
        self.advance()
    }

    /// `((type name) (, type name)*)?`, returns the token after the list, usually `)`
    fn compile_parameter_list(&mut self, mut tok: Token) -> CompilationResult<Token> {
        if tok.is_symbol(')') {
            return Ok(tok);
        }
        loop {
            let declared_type = expect_type(&tok, false)?;
            let name_tok = self.advance()?;
            self.declare(&name_tok, &declared_type, Category::Argument)?;
            tok = self.advance()?;
            if !tok.is_symbol(',') {
                return Ok(tok);
            }
            tok = self.advance()?;
        }
    }

    /// `var type name (, name)* ;`
    fn compile_var_dec(&mut self, tok: Token) -> CompilationResult<Token> {
        if !tok.is_keyword(Keyword::Var) {
            return Err(grammar_error(&tok, one_of(&["var"])));
        }
        let type_tok = self.advance()?;
        let declared_type = expect_type(&type_tok, false)?;
        self.compile_name_list(&declared_type, Category::Local)
    }
}
