use std::path::PathBuf;

use thiserror::Error;

/// Failures at the edges of the simulation: tuning files, level maps and
/// saved snapshots. Nothing that happens during a turn is reported here.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("could not read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid tuning file '{path}': {source}")]
    Tuning {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("level map is empty")]
    EmptyLevel,

    #[error("level map row {row} is {found} cells wide, expected {expected}")]
    RaggedLevel {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("unknown glyph '{glyph}' at {x},{y} in level map")]
    UnknownGlyph { glyph: char, x: i32, y: i32 },

    #[error("level map has no player start marker")]
    NoPlayerStart,

    #[error("snapshot is inconsistent: {0}")]
    BadSnapshot(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
