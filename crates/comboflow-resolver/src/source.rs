//! レシピ解決の抽象

use crate::error::ResolveResult;
use chrono::{DateTime, Utc};
use comboflow_core::{ImageReference, Recipe};

/// レシピと最終ビルド時刻の取得元
///
/// オーケストレータはこのトレイト越しにのみ解決を行うため、テストでは
/// 固定データを返す実装に差し替えられる。
#[allow(async_fn_in_trait)]
pub trait RecipeSource {
    /// イメージのビルドレシピ（Dockerfile）を取得
    async fn fetch_recipe(&self, image: &ImageReference) -> ResolveResult<Recipe>;

    /// イメージの最終ビルド時刻を取得
    async fn last_build_time(&self, image: &ImageReference) -> ResolveResult<DateTime<Utc>>;
}
