//! 呼び出し1回分の解決キャッシュ
//!
//! レシピ取得もビルド時刻取得もネットワーク越しで高コストだが、
//! 1回の実行の中では参照透過なので、参照ごとに一度だけ解決して
//! 明示的なマップに記憶します。実行をまたぐキャッシュは持ちません。

use crate::error::ResolveResult;
use crate::source::RecipeSource;
use chrono::{DateTime, Utc};
use comboflow_core::{ImageReference, Recipe};
use std::collections::HashMap;
use tokio::sync::Mutex;

/// [`RecipeSource`] にメモ化を重ねるラッパ
pub struct CachedSource<S> {
    inner: S,
    recipes: Mutex<HashMap<String, Recipe>>,
    build_times: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl<S> CachedSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            recipes: Mutex::new(HashMap::new()),
            build_times: Mutex::new(HashMap::new()),
        }
    }
}

/// 同名でも `@url` が違えば別レシピなので、キーにはURLまで含める
fn cache_key(image: &ImageReference) -> String {
    match image.dockerfile_url() {
        Some(url) => format!("{}@{}", image.image(), url),
        None => image.image().to_string(),
    }
}

impl<S: RecipeSource> RecipeSource for CachedSource<S> {
    async fn fetch_recipe(&self, image: &ImageReference) -> ResolveResult<Recipe> {
        let key = cache_key(image);

        if let Some(recipe) = self.recipes.lock().await.get(&key) {
            return Ok(recipe.clone());
        }

        let recipe = self.inner.fetch_recipe(image).await?;
        self.recipes.lock().await.insert(key, recipe.clone());
        Ok(recipe)
    }

    async fn last_build_time(&self, image: &ImageReference) -> ResolveResult<DateTime<Utc>> {
        let key = cache_key(image);

        if let Some(built_at) = self.build_times.lock().await.get(&key) {
            return Ok(*built_at);
        }

        let built_at = self.inner.last_build_time(image).await?;
        self.build_times.lock().await.insert(key, built_at);
        Ok(built_at)
    }
}
