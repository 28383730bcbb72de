//! Compiles Jack classes to textual stack machine code.
//!
//! Compiling a file happens in a single pass:
//! 1. load the source file into a string (see [`utils::discover_sources`] for finding them)
//! 1. create a [`compiler::CompilationEngine`] over the source and an
//!    [`writer::InstructionSink`]. The engine pulls tokens from a [`lexer::Lexer`] as it goes
//! 1. call [`compiler::CompilationEngine::compile`]. Every instruction is handed to the sink
//!    as soon as it is known, there is no syntax tree in between
//!
//! [`compile`] and [`compile_file`] do all of that for the common cases:
//!
//! ```
//! let vm = jack_lib::compile("class Main { function void main() { return; } }").unwrap();
//! assert_eq!(vm, "function Main.main 0\npush constant 0\nreturn\n");
//! ```
pub mod compiler;
pub mod core;
pub mod lexer;
pub mod utils;
pub mod writer;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

pub use compiler::{CompilationEngine, CompilationError, CompilationResult};
use writer::{InstructionSink, VmWriter};

/// Compiles one class and returns the VM code as text, one instruction per line.
pub fn compile(source: &str) -> CompilationResult<String> {
    let mut writer = VmWriter::new(String::new());
    compile_into(source, &mut writer)?;
    Ok(writer.into_inner())
}

/// Compiles one class into an arbitrary sink. On error the sink may hold a prefix of the
/// output.
pub fn compile_into<S: InstructionSink>(source: &str, sink: S) -> CompilationResult<()> {
    CompilationEngine::new(source, sink).compile()
}

/// Compiles `X.jack` into `X.vm` next to it and returns the path of the written file.
///
/// Nothing is written unless the whole class compiled. If it did not, an `X.vm` left over
/// from an earlier run is removed as well.
pub fn compile_file(path: &Path) -> CompilationResult<PathBuf> {
    if !utils::is_source_file(path) {
        compiler::compilation_error!(NotASource { path: path.into() });
    }
    debug!(path = %path.display(), "compiling file");
    let out = utils::output_path_for(path);

    let compiled = fs::read_to_string(path)
        .map_err(|source| CompilationError::Io {
            path: path.into(),
            source,
        })
        .and_then(|source| compile(&source));
    let vm = match compiled {
        Ok(vm) => vm,
        Err(e) => {
            if let Err(rm_err) = utils::remove_output(&out) {
                warn!(%rm_err, "could not remove stale output");
            }
            return Err(e);
        }
    };

    utils::write_output(&out, &vm)?;
    debug!(output = %out.display(), "wrote file");
    Ok(out)
}
