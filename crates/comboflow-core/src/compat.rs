//! ベースイメージ互換性チェック
//!
//! 解決済みレシピのFROM行を比較し、マージ可能かどうかを判定します。
//! FROMオーバーライドが設定されている場合、このチェックは呼び出し側で
//! 丸ごとバイパスされます（互換性はユーザーの責任になる）。

use crate::error::{CoreError, CoreResult};
use crate::model::Recipe;

/// バージョン違いでも互換とみなす共有ベースファミリ
///
/// 多くの言語ランタイムイメージが共通の中間ベースとして使う
/// buildpack-deps だけの狭い例外で、一般的なsemver互換ルールではない。
pub const SHARED_BASE_FAMILY: &str = "buildpack-deps";

/// 全レシピのFROM行が互換かどうかを判定
///
/// 全行が文字単位で一致すれば互換。そうでない場合、各行の参照先
/// リポジトリ名がすべて [`SHARED_BASE_FAMILY`] なら互換、それ以外は
/// `IncompatibleBaseImages`。
pub fn check_from_compatibility(recipes: &[Recipe]) -> CoreResult<()> {
    let from_lines: Vec<&str> = recipes
        .iter()
        .map(|r| r.from_line().unwrap_or(""))
        .collect();

    let Some(first) = from_lines.first() else {
        return Ok(());
    };

    if from_lines.iter().all(|l| l == first) {
        return Ok(());
    }

    if from_lines.iter().all(|l| base_repo(l) == SHARED_BASE_FAMILY) {
        tracing::info!(
            "Images using FROM {} ({}) which are different versions but still compatible",
            SHARED_BASE_FAMILY,
            from_lines.join(", ")
        );
        return Ok(());
    }

    Err(CoreError::IncompatibleBaseImages(from_lines.join(" / ")))
}

/// FROM行から参照先ベースのリポジトリ名を取り出す
///
/// 最後の空白区切りトークンをイメージ参照とみなし、タグを落として
/// 最後のパス区切り以降を返す。
fn base_repo(from_line: &str) -> &str {
    let image = from_line.split_whitespace().last().unwrap_or("");
    let name = image.split(':').next().unwrap_or(image);
    name.rsplit('/').next().unwrap_or(name)
}
