//! contains all important data structures

pub mod token;
pub use token::*;

pub mod instruction;
pub use instruction::*;

pub mod scopes;
pub use scopes::*;

pub mod labels;
pub use labels::*;
