use crate::core::Label;

/// Hands out jump labels of the form `Class.subroutine$PURPOSE$n`.
///
/// `n` comes from a counter owned by the allocator and is never reset, so labels stay unique
/// within one output file even when the same purpose shows up in many subroutines.
#[derive(Debug, Default)]
pub struct LabelAllocator {
    next: usize,
}

impl LabelAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, class: &str, subroutine: &str, purpose: &str) -> Label {
        let label = Label(format!("{class}.{subroutine}${purpose}${}", self.next));
        self.next += 1;
        label
    }
}
