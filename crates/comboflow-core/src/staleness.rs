//! リビルド要否の判定
//!
//! comboイメージの最終ビルド時刻と各構成イメージの最終ビルド時刻を
//! 比較します。comboのビルド時刻が未解決（まだ一度もビルドされて
//! いない）場合は常にリビルドが必要です。

use crate::model::{BuildDecision, ImageReference};
use chrono::{DateTime, Utc};

/// comboイメージのリビルド要否を判定
///
/// forceフラグはタイムスタンプを見ずに `Forced` へ短絡します。
pub fn decide_rebuild(
    combo_time: Option<DateTime<Utc>>,
    constituents: &[(ImageReference, DateTime<Utc>)],
    force: bool,
) -> BuildDecision {
    if force {
        return BuildDecision::Forced;
    }

    let Some(combo_time) = combo_time else {
        return BuildDecision::NeedsRebuild("combo image not built yet".to_string());
    };

    for (image, built_at) in constituents {
        if *built_at > combo_time {
            return BuildDecision::NeedsRebuild(format!(
                "{} was built on {}, after the combo ({})",
                image, built_at, combo_time
            ));
        }
    }

    BuildDecision::UpToDate
}
