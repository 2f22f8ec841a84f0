use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("不正なイメージ参照です: {0}\nヒント: user/repo:tag または repo:tag の形式で指定してください")]
    InvalidReference(String),

    #[error("ベースイメージのFROM行が一致しません: {0}")]
    IncompatibleBaseImages(String),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
