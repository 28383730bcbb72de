//! Where compiled instructions go
//!
//! The compiler pushes every instruction through an [`InstructionSink`] right after it has
//! been produced. Sinks append, they never reorder and never validate: checking that an
//! instruction makes sense is the compiler's job.

use std::fmt;

use tracing::trace;

use crate::core::Instruction;

pub trait InstructionSink {
    fn emit(&mut self, instruction: Instruction) -> fmt::Result;
}

/// Collects the instructions themselves, handy when the structure matters more than the text.
impl InstructionSink for Vec<Instruction> {
    fn emit(&mut self, instruction: Instruction) -> fmt::Result {
        self.push(instruction);
        Ok(())
    }
}

/// Writes one line of VM text per instruction.
#[derive(Debug, Default)]
pub struct VmWriter<W: fmt::Write> {
    out: W,
}

impl<W: fmt::Write> VmWriter<W> {
    pub fn new(out: W) -> Self {
        VmWriter { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: fmt::Write> InstructionSink for VmWriter<W> {
    fn emit(&mut self, instruction: Instruction) -> fmt::Result {
        trace!(%instruction, "emit");
        writeln!(self.out, "{instruction}")
    }
}

impl<S: InstructionSink + ?Sized> InstructionSink for &mut S {
    fn emit(&mut self, instruction: Instruction) -> fmt::Result {
        (**self).emit(instruction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ArithmeticOp, Segment};

    #[test]
    fn writes_one_line_per_instruction() {
        let mut writer = VmWriter::new(String::new());
        writer.emit(Instruction::Push(Segment::Local, 2)).unwrap();
        writer.emit(ArithmeticOp::Neg.into()).unwrap();
        writer.emit(Instruction::Return).unwrap();
        assert_eq!(writer.into_inner(), "push local 2\nneg\nreturn\n");
    }

    #[test]
    fn vec_sink_keeps_order() {
        let mut sink: Vec<Instruction> = Vec::new();
        (&mut sink).emit(Instruction::Return).unwrap();
        sink.emit(Instruction::Pop(Segment::Temp, 0)).unwrap();
        assert_eq!(
            sink,
            vec![Instruction::Return, Instruction::Pop(Segment::Temp, 0)]
        );
    }
}
