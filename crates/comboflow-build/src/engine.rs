//! ビルドエンジンの抽象
//!
//! パイプラインはこのトレイトのハンドル越しにだけビルドデーモンに
//! 触れます。プロセス全体で共有するシングルトンクライアントは持たず、
//! テストでは偽エンジンに差し替えられます。

use crate::error::BuildResult;
use comboflow_merge::BuildContext;

/// イメージのビルド・実行・公開を担うエンジン
#[allow(async_fn_in_trait)]
pub trait BuildEngine {
    /// 確定済みコンテキストからイメージをビルドして `tag` を付ける
    ///
    /// `platforms` は1回のビルド呼び出しにまとめて渡す。空なら
    /// デーモンのデフォルトプラットフォーム。
    async fn build(
        &self,
        context: &BuildContext,
        tag: &str,
        platforms: &[String],
    ) -> BuildResult<()>;

    /// イメージ内でコマンドを実行し、出力を返す
    async fn run_command(&self, image: &str, command: &[String]) -> BuildResult<String>;

    /// タグ付きイメージをレジストリへpushする
    async fn push(&self, repository: &str, tag: &str) -> BuildResult<()>;
}
