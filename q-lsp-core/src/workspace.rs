use crate::analyzer::Analyzer;
use globset::{GlobBuilder, GlobMatcher};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;
use walkdir::WalkDir;

/// Files indexed at startup unless configured otherwise.
pub const DEFAULT_GLOB_PATTERN: &str = "**/*.q";

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("invalid glob pattern {pattern:?}: {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

impl Analyzer {
    /// Build an analyzer holding every file under `root` whose path,
    /// relative to `root`, matches `glob`.
    ///
    /// Files are analyzed one after another. A file that cannot be read is
    /// logged and left out; the rest of the workspace is still indexed.
    pub fn from_root(root: &Path, glob: &str) -> Result<Self, IndexError> {
        let matcher = compile_glob(glob)?;
        let mut analyzer = Analyzer::new();

        info!(
            "Analyzing files matching glob \"{}\" inside {}",
            glob,
            root.display()
        );
        let lookup_start = Instant::now();

        let files = discover_files(root, &matcher);
        if files.is_empty() {
            warn!(
                "Failed to find any q source files using the glob \"{}\". Some features will not be available.",
                glob
            );
        }
        info!(
            "Glob found {} files after {:.3} seconds",
            files.len(),
            lookup_start.elapsed().as_secs_f64()
        );

        for path in files {
            let uri = file_uri(&path);
            debug!("Analyzing {}", uri);
            match fs::read_to_string(&path) {
                Ok(text) => {
                    analyzer.analyze(&uri, &text);
                }
                Err(e) => warn!("Failed analyzing {}. Error: {}", uri, e),
            }
        }

        info!(
            "Analyzing took {:.3} seconds ({} files indexed)",
            lookup_start.elapsed().as_secs_f64(),
            analyzer.len()
        );
        Ok(analyzer)
    }
}

/// `*` stops at path separators; `**` crosses them.
pub fn compile_glob(pattern: &str) -> Result<GlobMatcher, IndexError> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|source| IndexError::InvalidGlob {
            pattern: pattern.to_string(),
            source,
        })
}

/// Regular files under `root` whose relative path matches, in a stable order.
pub fn discover_files(root: &Path, matcher: &GlobMatcher) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable workspace entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if matcher.is_match(relative) {
            files.push(entry.into_path());
        }
    }
    files
}

/// The `file://` uri an editor would use for `path`.
pub fn file_uri(path: &Path) -> String {
    Url::from_file_path(path)
        .map(|url| url.to_string())
        .unwrap_or_else(|_| format!("file://{}", path.display()))
}
