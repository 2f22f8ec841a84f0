//! レシピ解決のエラー型

/// レシピ解決のエラー
///
/// いずれのバリアントもパイプライン上は「解決失敗」として扱われる。
/// combo自身のビルド時刻の解決失敗だけは呼び出し側で「未ビルド」に
/// 読み替えられ、外に出ない。
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Docker Hubへの接続に失敗しました: {url}\n理由: {message}")]
    HubApi { url: String, message: String },

    #[error("Dockerfileのダウンロードに失敗しました: {url}\n理由: {message}")]
    DockerfileDownload { url: String, message: String },

    #[error("{image} のDockerfileがHubの説明文から見つかりません ({url})")]
    DockerfileNotFound { image: String, url: String },

    #[error("{image} はHub上で探索できません。@<url> でDockerfileを直接指定してください")]
    DiscoveryUnsupported { image: String },

    #[error("{image} のビルド時刻を取得できません: {message}")]
    BuildTimeUnavailable { image: String, message: String },

    #[error("Docker接続エラー: {0}")]
    Docker(#[from] bollard::errors::Error),
}

pub type ResolveResult<T> = std::result::Result<T, ResolveError>;
