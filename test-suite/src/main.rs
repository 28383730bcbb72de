use anyhow::{bail, Context, Result};
use glob::glob;
use std::result::Result as StdResult;

use std::fs;
use std::path::Path;

/// Compiles every `tests/*.jack` and compares the result with `tests/<name>.vm`.
/// Expected failures live in `tests/errors/*.jack`, they must not compile.
fn main() -> Result<()> {
    let mut n_failed = 0;

    let sources: Vec<_> = glob("tests/*.jack")?.collect::<StdResult<_, _>>()?;
    for source in &sources {
        if !check_output(source)? {
            n_failed += 1;
        }
    }

    let broken: Vec<_> = glob("tests/errors/*.jack")?.collect::<StdResult<_, _>>()?;
    for source in &broken {
        if !check_rejected(source)? {
            n_failed += 1;
        }
    }

    let total = sources.len() + broken.len();
    println!("{} of {} passed", total - n_failed, total);
    if n_failed > 0 {
        bail!("{} test(s) failed", n_failed);
    }
    Ok(())
}

fn check_output(source: &Path) -> Result<bool> {
    let expected_path = source.with_extension("vm");
    let expected = fs::read_to_string(&expected_path)
        .context(format!("loading expected output: {}", expected_path.display()))?;
    let src = fs::read_to_string(source).context(format!("loading {}", source.display()))?;

    match jack_lib::compile(&src) {
        Ok(output) if output == expected => {
            println!("{}: passed", source.display());
            Ok(true)
        }
        Ok(output) => {
            println!("{}: failed\nactual output:\n{}", source.display(), output);
            Ok(false)
        }
        Err(e) => {
            println!("{}: failed\nerror: {}", source.display(), e);
            Ok(false)
        }
    }
}

fn check_rejected(source: &Path) -> Result<bool> {
    let src = fs::read_to_string(source).context(format!("loading {}", source.display()))?;
    match jack_lib::compile(&src) {
        Err(e) => {
            println!("{}: passed ({})", source.display(), e);
            Ok(true)
        }
        Ok(_) => {
            println!("{}: failed, compiled without error", source.display());
            Ok(false)
        }
    }
}
