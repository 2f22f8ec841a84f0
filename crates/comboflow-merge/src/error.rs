use thiserror::Error;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("multi-stage recipes are not supported: {image} has more than one FROM instruction")]
    MultiStageUnsupported { image: String },

    #[error("multi-line COPY instructions are not supported: {line}")]
    MultiLineCopyUnsupported { line: String },

    #[error("unable to parse COPY instruction: {line}")]
    UnparsableCopyInstruction { line: String },

    #[error("failed to extract {path} from {image}: {message}")]
    ExtractionFailed {
        image: String,
        path: String,
        message: String,
    },
}

pub type MergeResult<T> = std::result::Result<T, MergeError>;
