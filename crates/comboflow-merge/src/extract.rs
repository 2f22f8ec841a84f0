//! ファイル抽出の抽象
//!
//! extract戦略のCOPY解決では、構成イメージの実体からファイルの中身を
//! 取り出してビルドコンテキストに埋め込みます。取り出し方（コンテナを
//! 作ってファイルシステムを覗く等）はエンジン側の実装に任せます。

use crate::error::MergeResult;
use comboflow_core::ImageReference;

/// 構成イメージからファイルの中身を取り出す
#[allow(async_fn_in_trait)]
pub trait FileExtractor {
    /// `image` 内の `path` のバイト列を返す
    ///
    /// パスが存在しない場合は `ExtractionFailed`。
    async fn extract(&self, image: &ImageReference, path: &str) -> MergeResult<Vec<u8>>;
}
