use std::fmt;
use std::path::PathBuf;

/// pipeline stage that raised an error, attached by the pipeline so a failure
/// report always says where the run stopped
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Load,
    Greedy,
    Tabu,
    Save,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Greedy => "greedy",
            Stage::Tabu => "tabu",
            Stage::Save => "save",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// target canvas has zero area
    #[error("invalid problem: target canvas is {width}x{height}")]
    InvalidProblem { width: u32, height: u32 },

    #[error("canvas dimensions differ: rendered {rendered:?}, target {target:?}")]
    DimensionMismatch {
        rendered: (u32, u32),
        target: (u32, u32),
    },

    #[error("brush catalog is empty")]
    EmptyCatalog,

    #[error("brush index {index} out of range for a catalog of {len} brushes")]
    UnknownBrush { index: usize, len: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("initial solution has no strokes")]
    EmptySolution,

    #[error("image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{stage} stage failed: {source}")]
    Staged {
        stage: Stage,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// wrap this error with the stage it surfaced in. already-staged errors keep their original stage
    pub fn in_stage(self, stage: Stage) -> Self {
        match self {
            Error::Staged { .. } => self,
            other => Error::Staged { stage, source: Box::new(other) },
        }
    }

    /// stage recorded on this error, if any
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::Staged { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// attach a stage to the error side of a result
pub trait StageExt<T> {
    fn stage(self, stage: Stage) -> Result<T>;
}

impl<T> StageExt<T> for Result<T> {
    fn stage(self, stage: Stage) -> Result<T> {
        self.map_err(|e| e.in_stage(stage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_is_attached_once() {
        let err = Error::EmptyCatalog.in_stage(Stage::Greedy).in_stage(Stage::Tabu);
        assert_eq!(err.stage(), Some(Stage::Greedy));
        assert_eq!(err.to_string(), "greedy stage failed: brush catalog is empty");
    }

    #[test]
    fn test_stage_ext_on_result() {
        let res: Result<()> = Err(Error::EmptySolution);
        let err = res.stage(Stage::Tabu).unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Tabu));
    }
}
