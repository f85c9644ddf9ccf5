//! Source languages the live entity parser understands.

/// A supported source language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    /// Rust.
    Rust,
    /// Python.
    Python,
    /// TypeScript.
    TypeScript,
    /// TSX, JSX and plain JavaScript, parsed with the TSX grammar.
    Tsx,
    /// Go.
    Go,
    /// Java.
    Java,
}

impl Language {
    /// Every supported language.
    pub const ALL: [Self; 6] = [Self::Rust, Self::Python, Self::TypeScript, Self::Tsx, Self::Go, Self::Java];

    /// Detects the language of `path` from its extension.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let ext = path.rsplit_once('.').map(|(_, ext)| ext)?;
        match ext {
            "rs" => Some(Self::Rust),
            "py" | "pyi" => Some(Self::Python),
            "ts" | "mts" | "cts" => Some(Self::TypeScript),
            "tsx" | "js" | "jsx" | "mjs" | "cjs" => Some(Self::Tsx),
            "go" => Some(Self::Go),
            "java" => Some(Self::Java),
            _ => None,
        }
    }
}

/// Whether `path` is a file the entity parser can read entities from.
#[must_use]
pub fn is_supported(path: &str) -> bool {
    Language::from_path(path).is_some()
}
