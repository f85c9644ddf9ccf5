//! Source previews for entity-backed nodes.

use std::path::Path;

use serde::Serialize;

use crate::error::{EngineError, Result};
use crate::graph::SourceLocation;
use crate::ports::FileSystem;

/// The source text of a location and where it starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodePreview {
    /// Lines `start_line..=end_line`, newline-joined.
    pub content: String,
    /// Zero-based line of the first returned line.
    pub start_line: u32,
}

/// Reads `location` from `root` through the filesystem port.
///
/// Ranges running past the end of the file are clipped.
///
/// # Errors
///
/// Returns [`EngineError::Collaborator`] when the file cannot be read.
pub fn fetch_code(fs: &dyn FileSystem, root: &Path, location: &SourceLocation) -> Result<CodePreview> {
    let path = root.join(&location.file);
    let text = fs.read_to_string(&path).map_err(|e| EngineError::Collaborator {
        collaborator: "filesystem",
        message: format!("{}: {e}", path.display()),
    })?;

    let first = location.start_line as usize;
    let count = (location.end_line.saturating_sub(location.start_line) as usize) + 1;
    let content: Vec<&str> = text.lines().skip(first).take(count).collect();
    Ok(CodePreview { content: content.join("\n"), start_line: location.start_line })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::PortError;

    struct OneFile(&'static str);

    impl FileSystem for OneFile {
        fn read_to_string(&self, path: &Path) -> std::result::Result<String, PortError> {
            if path == Path::new("/repo/src/lib.rs") {
                Ok(self.0.to_string())
            } else {
                Err(format!("not found: {}", path.display()).into())
            }
        }

        fn exists(&self, path: &Path) -> bool {
            path == Path::new("/repo/src/lib.rs")
        }
    }

    fn location(start_line: u32, end_line: u32) -> SourceLocation {
        SourceLocation { file: "src/lib.rs".into(), start_line, end_line }
    }

    #[test]
    fn returns_the_requested_range() {
        let fs = OneFile("a\nfn run() {\n    go();\n}\nz\n");
        let preview = fetch_code(&fs, Path::new("/repo"), &location(1, 3)).unwrap();
        assert_eq!(preview.content, "fn run() {\n    go();\n}");
        assert_eq!(preview.start_line, 1);
    }

    #[test]
    fn clips_ranges_past_the_end() {
        let fs = OneFile("one\ntwo");
        let preview = fetch_code(&fs, Path::new("/repo"), &location(1, 40)).unwrap();
        assert_eq!(preview.content, "two");
    }

    #[test]
    fn missing_files_are_collaborator_errors() {
        let fs = OneFile("");
        let err = fetch_code(&fs, Path::new("/elsewhere"), &location(0, 1)).unwrap_err();
        assert!(matches!(err, EngineError::Collaborator { collaborator: "filesystem", .. }));
    }
}
