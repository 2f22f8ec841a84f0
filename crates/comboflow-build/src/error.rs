use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Docker connection error: {0}")]
    DockerConnection(#[from] bollard::errors::Error),

    #[error("build failed: {0}")]
    BuildFailed(String),

    #[error("smoke test `{command}` failed in {image}:\n{output}")]
    TestFailed {
        image: String,
        command: String,
        output: String,
    },

    #[error("push failed: {message}")]
    PushFailed { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BuildError {
    /// push先にイメージが存在しなかった失敗かどうか
    ///
    /// ビルドが要求プラットフォームのイメージを実際には作らなかった
    /// ケースで、オーケストレータはこれだけを非致命として扱う。
    pub fn is_missing_image(&self) -> bool {
        match self {
            BuildError::PushFailed { message } => {
                let message = message.to_lowercase();
                message.contains("no such image") || message.contains("does not exist")
            }
            _ => false,
        }
    }
}

pub type BuildResult<T> = std::result::Result<T, BuildError>;
