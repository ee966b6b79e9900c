use thiserror::Error;

pub mod normalize;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Input directory does not exist: {0}")]
    InputDirNotFound(String),
    #[error("Input path is not a valid directory: {0}")]
    NotADirectory(String),
    #[error("Output path must be a directory: {0}")]
    OutputNotADirectory(String),
    #[error("Param file not found: {0}")]
    ParamFileNotFound(String),
}
