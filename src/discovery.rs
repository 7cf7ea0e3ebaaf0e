//! Source discovery and batch parsing.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::errors::{read_source, KtError};
use crate::parser;
use crate::schema::Schema;
use crate::tree::SyntaxTree;

/// The outcome of parsing one discovered file.
#[derive(Debug)]
pub struct ParsedSource {
    pub path: PathBuf,
    pub result: Result<SyntaxTree, KtError>,
}

/// Recursively finds files under `root` whose extension is in `extensions`.
///
/// A file given as `root` is returned as is. The list is sorted so batch
/// output is deterministic.
pub fn discover_sources(root: &Path, extensions: &[String]) -> Result<Vec<PathBuf>, KtError> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| KtError::Walk {
            root: root.to_path_buf(),
            message: e.to_string(),
        })?;

        if !entry.file_type().is_file() {
            continue;
        }
        if !has_extension(entry.path(), extensions) {
            continue;
        }
        files.push(entry.path().to_path_buf());
    }
    files.sort();
    Ok(files)
}

/// Parses every path against `schema`, spreading files over `threads` scoped
/// threads (0 picks the available parallelism). Results keep input order.
pub fn parse_all(schema: &Schema, paths: &[PathBuf], threads: usize) -> Vec<ParsedSource> {
    if paths.is_empty() {
        return Vec::new();
    }

    let threads = match threads {
        0 => std::thread::available_parallelism().map_or(1, NonZeroUsize::get),
        n => n,
    }
    .min(paths.len());

    if threads <= 1 {
        return paths.iter().map(|path| parse_one(schema, path)).collect();
    }

    let chunk_size = paths.len().div_ceil(threads);
    std::thread::scope(|scope| {
        let handles: Vec<_> = paths
            .chunks(chunk_size)
            .map(|chunk| {
                scope.spawn(move || {
                    chunk
                        .iter()
                        .map(|path| parse_one(schema, path))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        // a worker only panics if the parser does; surface that on the caller
        handles
            .into_iter()
            .flat_map(|handle| match handle.join() {
                Ok(results) => results,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    })
}

fn parse_one(schema: &Schema, path: &Path) -> ParsedSource {
    let result = read_source(path)
        .and_then(|source| parser::parse_with(schema, &source, &path.display().to_string()));
    ParsedSource {
        path: path.to_path_buf(),
        result,
    }
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e.trim_start_matches('.') == ext))
}
