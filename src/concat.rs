use std::ffi::{OsStr, OsString};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{CatsError, FileReadError, Result};

/// Name of the bundle written into the target directory.
pub const OUTPUT_FILENAME: &str = "cats.txt";

const SEPARATOR_WIDTH: usize = 80;

/// Order in which directory entries become blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EntryOrder {
    /// Lexicographic by file name, so repeated runs are reproducible.
    #[default]
    Sorted,
    /// Whatever order the filesystem listing yields.
    Filesystem,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub directory: PathBuf,
    /// File names the running program is known by, never bundled.
    pub self_names: Vec<OsString>,
    pub order: EntryOrder,
}

impl Config {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            self_names: Vec::new(),
            order: EntryOrder::default(),
        }
    }

    /// Adds a name to exclude as the program's own file. May be called more
    /// than once, e.g. for the invoked name and the resolved executable.
    pub fn with_self_name(mut self, name: impl Into<OsString>) -> Self {
        let name = name.into();
        if !self.self_names.contains(&name) {
            self.self_names.push(name);
        }
        self
    }

    pub fn with_order(mut self, order: EntryOrder) -> Self {
        self.order = order;
        self
    }

    pub fn output_path(&self) -> PathBuf {
        self.directory.join(OUTPUT_FILENAME)
    }

    fn is_excluded(&self, name: &OsStr) -> bool {
        name == OsStr::new(OUTPUT_FILENAME) || self.self_names.iter().any(|own| own.as_os_str() == name)
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub output: PathBuf,
    /// Blocks written, including those carrying an error line.
    pub files: usize,
    pub read_errors: usize,
}

/// Bundles every regular file of `config.directory` into `cats.txt`.
///
/// The output is created (or truncated) before the directory is listed; it is
/// excluded by name, so a previous bundle is never fed back in. Per-file read
/// failures are written into the output and do not stop the run.
pub fn concatenate(config: &Config) -> Result<Summary> {
    let output = config.output_path();
    let file = File::create(&output).map_err(|source| CatsError::OutputCreation {
        path: output.clone(),
        source,
    })?;
    let mut out = BufWriter::new(file);

    let mut summary = Summary {
        output,
        files: 0,
        read_errors: 0,
    };

    for name in list_candidates(config)? {
        let label = name.to_string_lossy();
        let body = read_body(&config.directory.join(&name), &label);

        match &body {
            Ok(content) => debug!(file = %label, bytes = content.len(), "bundling file"),
            Err(err) => {
                warn!(file = %label, error = %err.source, "could not read file");
                summary.read_errors += 1;
            }
        }

        write_block(&mut out, &label, &body).map_err(|source| write_error(&summary.output, source))?;
        summary.files += 1;
    }

    out.flush()
        .map_err(|source| write_error(&summary.output, source))?;

    debug!(
        output = %summary.output.display(),
        files = summary.files,
        read_errors = summary.read_errors,
        "concatenation finished"
    );
    Ok(summary)
}

/// Names of the entries that will become blocks, in the configured order.
pub fn list_candidates(config: &Config) -> Result<Vec<OsString>> {
    let read_dir_error = |source| CatsError::ReadDir {
        path: config.directory.clone(),
        source,
    };

    let mut names = Vec::new();
    for entry in fs::read_dir(&config.directory).map_err(read_dir_error)? {
        let entry = entry.map_err(read_dir_error)?;
        let name = entry.file_name();

        if config.is_excluded(&name) {
            debug!(entry = %name.to_string_lossy(), "skipping excluded name");
            continue;
        }

        // Follows symlinks: a link to a regular file counts, a link to a directory does not.
        if !entry.path().is_file() {
            debug!(entry = %name.to_string_lossy(), "skipping non-file entry");
            continue;
        }

        names.push(name);
    }

    if config.order == EntryOrder::Sorted {
        names.sort();
    }

    Ok(names)
}

fn read_body(path: &Path, name: &str) -> std::result::Result<String, FileReadError> {
    fs::read_to_string(path).map_err(|source| FileReadError {
        name: name.to_string(),
        source,
    })
}

/// Writes one block: separator, header, then the verbatim content or a single
/// error line.
pub fn write_block<W: Write>(
    out: &mut W,
    name: &str,
    body: &std::result::Result<String, FileReadError>,
) -> io::Result<()> {
    writeln!(out, "{}", "-".repeat(SEPARATOR_WIDTH))?;
    writeln!(out, "# File: {}", name)?;
    match body {
        Ok(content) => out.write_all(content.as_bytes()),
        Err(err) => writeln!(out, "# Error reading file: {}", err),
    }
}

fn write_error(path: &Path, source: io::Error) -> CatsError {
    CatsError::Write {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn block(body: &std::result::Result<String, FileReadError>) -> String {
        let mut out = Vec::new();
        write_block(&mut out, "note.txt", body).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn block_copies_content_verbatim() {
        let actual = block(&Ok("hello\n".to_string()));
        let expected = format!("{}\n# File: note.txt\nhello\n", "-".repeat(80));
        assert_eq!(actual, expected);
    }

    #[test]
    fn block_does_not_add_trailing_newline() {
        let actual = block(&Ok("1,2,3".to_string()));
        assert!(actual.ends_with("# File: note.txt\n1,2,3"));
    }

    #[test]
    fn block_replaces_content_with_error_line() {
        let err = FileReadError {
            name: "note.txt".to_string(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "Permission denied"),
        };
        let actual = block(&Err(err));
        let expected = format!(
            "{}\n# File: note.txt\n# Error reading file: note.txt - Permission denied\n",
            "-".repeat(80)
        );
        assert_eq!(actual, expected);
    }

    #[test]
    fn excludes_output_and_own_name() {
        let config = Config::new(".").with_self_name("cats");
        assert!(config.is_excluded(OsStr::new("cats.txt")));
        assert!(config.is_excluded(OsStr::new("cats")));
        assert!(!config.is_excluded(OsStr::new("cats.rs")));

        let linked = Config::new(".").with_self_name("bundle").with_self_name("cats");
        assert!(linked.is_excluded(OsStr::new("bundle")));
        assert!(linked.is_excluded(OsStr::new("cats")));

        let anonymous = Config::new(".");
        assert!(anonymous.is_excluded(OsStr::new("cats.txt")));
        assert!(!anonymous.is_excluded(OsStr::new("cats")));
    }

    #[test]
    fn candidates_are_sorted_files_only() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("b.txt"), "b").unwrap();
        fs::write(dir.join("a.txt"), "a").unwrap();
        fs::write(dir.join("cats.txt"), "old").unwrap();
        fs::write(dir.join("bundler"), "self").unwrap();
        fs::create_dir(dir.join("nested")).unwrap();
        fs::write(dir.join("nested/inner.txt"), "inner").unwrap();

        let config = Config::new(dir).with_self_name("bundler");
        let names = list_candidates(&config).unwrap();
        assert_eq!(names, vec![OsString::from("a.txt"), OsString::from("b.txt")]);
    }

    #[test]
    fn filesystem_order_keeps_the_same_set() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["z", "m", "a"] {
            fs::write(temp_dir.path().join(name), name).unwrap();
        }

        let config = Config::new(temp_dir.path()).with_order(EntryOrder::Filesystem);
        let mut names = list_candidates(&config).unwrap();
        names.sort();
        assert_eq!(names, vec!["a", "m", "z"]);
    }

    #[test]
    fn summary_counts_blocks_and_read_errors() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("good.txt"), "fine\n").unwrap();
        fs::write(temp_dir.path().join("bad.bin"), b"\xff\xfe").unwrap();

        let summary = concatenate(&Config::new(temp_dir.path())).unwrap();
        assert_eq!(summary.output, temp_dir.path().join(OUTPUT_FILENAME));
        assert_eq!(summary.files, 2);
        assert_eq!(summary.read_errors, 1);
    }

    #[test]
    fn missing_directory_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::new(temp_dir.path().join("missing"));
        let err = concatenate(&config).unwrap_err();
        assert!(matches!(err, CatsError::OutputCreation { .. }));
    }
}
