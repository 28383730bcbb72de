//! The stack machine instructions the compiler emits, and their text format

use derive_more::Display;
use strum_macros::{Display as StrumDisplay, IntoStaticStr};

/// Memory segments addressable by `push` and `pop`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Segment {
    Constant,
    Argument,
    Local,
    Static,
    This,
    That,
    Pointer,
    Temp,
}

/// Instructions that take no operands and work on the top of the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum ArithmeticOp {
    Add,
    Sub,
    Neg,
    And,
    Or,
    Not,
    Eq,
    Gt,
    Lt,
}

/// A jump target. Only the [`LabelAllocator`](crate::core::LabelAllocator) creates new ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
pub struct Label(pub(crate) String);

impl Label {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One line of output. Display renders exactly the text that ends up in the output file,
/// without the newline.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum Instruction {
    #[display(fmt = "push {} {}", _0, _1)]
    Push(Segment, usize),
    #[display(fmt = "pop {} {}", _0, _1)]
    Pop(Segment, usize),
    #[display(fmt = "{}", _0)]
    Arithmetic(ArithmeticOp),
    #[display(fmt = "label {}", _0)]
    Label(Label),
    #[display(fmt = "goto {}", _0)]
    Goto(Label),
    #[display(fmt = "if-goto {}", _0)]
    IfGoto(Label),
    #[display(fmt = "call {} {}", name, n_args)]
    Call { name: String, n_args: usize },
    #[display(fmt = "function {} {}", name, n_locals)]
    Function { name: String, n_locals: usize },
    #[display(fmt = "return")]
    Return,
}

impl Instruction {
    pub fn call(name: impl Into<String>, n_args: usize) -> Self {
        Instruction::Call {
            name: name.into(),
            n_args,
        }
    }

    pub fn function(name: impl Into<String>, n_locals: usize) -> Self {
        Instruction::Function {
            name: name.into(),
            n_locals,
        }
    }
}

impl From<ArithmeticOp> for Instruction {
    fn from(op: ArithmeticOp) -> Self {
        Instruction::Arithmetic(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_vm_text() {
        assert_eq!(Instruction::Push(Segment::Constant, 7).to_string(), "push constant 7");
        assert_eq!(Instruction::Pop(Segment::Pointer, 1).to_string(), "pop pointer 1");
        assert_eq!(Instruction::from(ArithmeticOp::Not).to_string(), "not");
        assert_eq!(
            Instruction::IfGoto(Label("Main.main$IF_FALSE$0".into())).to_string(),
            "if-goto Main.main$IF_FALSE$0"
        );
        assert_eq!(Instruction::call("Math.multiply", 2).to_string(), "call Math.multiply 2");
        assert_eq!(Instruction::function("Main.main", 3).to_string(), "function Main.main 3");
        assert_eq!(Instruction::Return.to_string(), "return");
    }
}
