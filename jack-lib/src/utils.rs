//! contains small utility functions that have nowhere else to go

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::compiler::{compilation_error, CompilationError, CompilationResult};

pub const SOURCE_EXT: &str = "jack";
pub const OUTPUT_EXT: &str = "vm";

pub fn is_source_file(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == SOURCE_EXT)
}

/// `dir/X.jack` -> `dir/X.vm`
pub fn output_path_for(source: &Path) -> PathBuf {
    source.with_extension(OUTPUT_EXT)
}

/// Writes `contents` to a sibling temp file first and renames it over `out`, so `out` is
/// either missing, the old file, or complete.
pub fn write_output(out: &Path, contents: &str) -> CompilationResult<()> {
    let tmp = out.with_extension(format!("{OUTPUT_EXT}.tmp"));
    let io_err = |source: io::Error| CompilationError::Io {
        path: out.into(),
        source,
    };
    if let Err(e) = fs::write(&tmp, contents) {
        let _ = fs::remove_file(&tmp);
        return Err(io_err(e));
    }
    fs::rename(&tmp, out).map_err(io_err)
}

/// Deletes a previous output file, a missing one is fine.
pub fn remove_output(out: &Path) -> CompilationResult<()> {
    match fs::remove_file(out) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => compilation_error!(Io {
            path: out.into(),
            source: e,
        }),
        _ => Ok(()),
    }
}

/// Lists the files to compile for `target`, which is either a single source file or a
/// directory whose direct children are searched (sorted by path).
pub fn discover_sources(target: &Path) -> CompilationResult<Vec<PathBuf>> {
    let io_err = |source: io::Error| CompilationError::Io {
        path: target.into(),
        source,
    };
    if !target.is_dir() {
        if !is_source_file(target) {
            compilation_error!(NotASource {
                path: target.into()
            });
        }
        return Ok(vec![target.into()]);
    }

    let mut sources = vec![];
    for entry in fs::read_dir(target).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && is_source_file(&path) {
            sources.push(path);
        }
    }
    if sources.is_empty() {
        compilation_error!(NoSources {
            path: target.into()
        });
    }
    sources.sort();
    Ok(sources)
}
