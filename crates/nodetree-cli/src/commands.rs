//! Subcommand implementations, writing to any output stream

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use nodetree::{IncludePolicy, ReadOptions, Tree, TreeError};
use tracing::debug;

/// Read `file`, searching `loadpaths` for included files. The directories
/// are not added to the tree.
pub fn load(file: &Path, loadpaths: &[PathBuf]) -> Result<Tree> {
    debug!(file = %file.display(), loadpaths = loadpaths.len(), "loading");
    let options = ReadOptions::new().with_load_paths(loadpaths.to_vec());
    let mut tree = Tree::new();
    tree.read_file_with(file, &options)
        .with_context(|| format!("failed to read {}", file.display()))?;
    Ok(tree)
}

pub fn dump(tree: &Tree, prefix: &str, out: &mut impl Write) -> Result<()> {
    tree.dump_to(out, prefix)?;
    Ok(())
}

pub fn get(tree: &Tree, path: &str, default: Option<&str>, out: &mut impl Write) -> Result<()> {
    match tree.find_value(path).or(default) {
        Some(value) => writeln!(out, "{}", value)?,
        None => bail!("no value at {}", path),
    }
    Ok(())
}

/// Set one value and rewrite `file`, creating it if needed.
///
/// Files that use `#include` are refused: rewriting them would inline the
/// included files and drop the directives.
pub fn set(file: &Path, path: &str, value: &str) -> Result<()> {
    let mut tree = Tree::new();
    if file.exists() {
        let options = ReadOptions::new().with_include(IncludePolicy::Reject);
        if let Err(e) = tree.read_file_with(file, &options) {
            if rejected_include(&e) {
                bail!(
                    "refusing to rewrite {}: it uses #include, and included files would be inlined",
                    file.display()
                );
            }
            return Err(e).with_context(|| format!("failed to read {}", file.display()));
        }
    }
    tree.set_value(path, value)?;
    tree.write_file_atomic(file)
        .with_context(|| format!("failed to write {}", file.display()))?;
    Ok(())
}

fn rejected_include(err: &TreeError) -> bool {
    matches!(err.root_cause(), TreeError::Parse { message, .. } if message.starts_with("#include"))
}

pub fn fmt(tree: &Tree, out: &mut impl Write) -> Result<()> {
    out.write_all(tree.write_string().as_bytes())?;
    Ok(())
}

pub fn json(tree: &Tree, out: &mut impl Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, &tree.root_node())?;
    writeln!(out)?;
    Ok(())
}
