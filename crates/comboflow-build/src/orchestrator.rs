//! ビルドパイプライン
//!
//! 1回の呼び出し分のシーケンス（解決 → 互換性 → 鮮度 → マージ →
//! ビルド → スモークテスト → push）を直列に進めます。各ステップは
//! 外部I/Oをブロッキングで待ち、内部並列性はありません。リトライも
//! しません。再実行したい呼び出し側がパイプラインごとやり直します。

use crate::engine::BuildEngine;
use crate::error::BuildError;
use colored::Colorize;
use comboflow_core::{
    BuildDecision, ComboReference, CoreError, ImageReference, Recipe, check_from_compatibility,
    decide_rebuild,
};
use comboflow_merge::{FileExtractor, MergeError, MergeOptions, RecipeMerger};
use comboflow_resolver::{RecipeSource, ResolveError};
use thiserror::Error;

/// 1回の呼び出しの入力
#[derive(Debug, Default)]
pub struct PipelineRequest {
    /// 構成イメージの順序付きリスト（2個以上）
    pub constituents: Vec<ImageReference>,
    pub merge: MergeOptions,
    /// ビルド対象プラットフォーム。空ならデーモンのデフォルト
    pub platforms: Vec<String>,
    pub push: bool,
    pub force: bool,
}

/// パイプラインの結果
#[derive(Debug, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// comboは全構成イメージより新しく、何もしなかった
    UpToDate,
    Built { image: String, pushed: bool },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Merge(#[from] MergeError),
    #[error(transparent)]
    Build(#[from] BuildError),
}

/// マージ → ビルド → テスト → push を駆動するオーケストレータ
///
/// 解決元とエンジンはハンドルで受け取るので、テストでは両方とも
/// 偽実装に差し替えられる。
pub struct Pipeline<'a, S, E> {
    source: &'a S,
    engine: &'a E,
}

impl<'a, S, E> Pipeline<'a, S, E>
where
    S: RecipeSource,
    E: BuildEngine + FileExtractor,
{
    pub fn new(source: &'a S, engine: &'a E) -> Self {
        Self { source, engine }
    }

    pub async fn run(&self, request: &PipelineRequest) -> Result<PipelineOutcome, PipelineError> {
        // 1. 全構成イメージのレシピを解決
        let mut resolved: Vec<(ImageReference, Recipe)> = Vec::new();
        for image in &request.constituents {
            let recipe = self.source.fetch_recipe(image).await?;
            resolved.push((image.clone(), recipe));
        }

        // 2. 互換性チェック。FROMオーバーライド時はユーザーが互換性に
        //    責任を持つのでチェックごと省略
        if request.merge.from_override.is_none() {
            let recipes: Vec<Recipe> = resolved.iter().map(|(_, r)| r.clone()).collect();
            check_from_compatibility(&recipes)?;
        }

        let combo = ComboReference::new(&request.constituents);

        // 3. タイムスタンプ解決。構成イメージ側はforceでも解決する
        //    （イメージのpullを兼ねており、ビルドにも必要）
        let mut constituent_times = Vec::new();
        for image in &request.constituents {
            let built_at = self.source.last_build_time(image).await?;
            constituent_times.push((image.clone(), built_at));
        }

        let combo_time = if request.force {
            None
        } else {
            // combo自身の解決失敗は「まだビルドされていない」
            match self.source.last_build_time(combo.reference()).await {
                Ok(built_at) => Some(built_at),
                Err(e) => {
                    tracing::info!("combo image not built yet ({})", e);
                    None
                }
            }
        };

        // 4. リビルド判定
        match decide_rebuild(combo_time, &constituent_times, request.force) {
            BuildDecision::UpToDate => {
                println!("{}", "✓ 最新です".green());
                return Ok(PipelineOutcome::UpToDate);
            }
            BuildDecision::NeedsRebuild(reason) => tracing::info!("rebuilding: {}", reason),
            BuildDecision::Forced => tracing::info!("forced rebuild of {}", combo),
        }

        // 5. マージ
        println!("{}", "Dockerfileを生成中...".blue());
        let merger = RecipeMerger::new(&request.merge, self.engine);
        let context = merger.merge(&resolved).await?;

        // 6. ビルド
        println!("{}", "イメージをビルド中...".blue());
        self.engine
            .build(&context, combo.image(), &request.platforms)
            .await?;

        // 7. 構成イメージごとのスモークテスト
        println!("{}", "イメージをテスト中...".blue());
        for image in &request.constituents {
            let command = smoke_command(image);
            let output = self.engine.run_command(combo.image(), &command).await?;
            tracing::info!("{}: {}", command.join(" "), output.trim());
        }

        // 8. push（要求時のみ）
        let mut pushed = false;
        if request.push {
            println!("{}", "イメージをpush中...".blue());
            match self.engine.push(combo.repository(), combo.tag()).await {
                Ok(()) => pushed = true,
                Err(e) if e.is_missing_image() => {
                    // 要求プラットフォームのイメージが作られなかった場合。
                    // 非致命として記録だけ残す
                    tracing::warn!("push skipped: {}", e);
                }
                Err(e) => return Err(e.into()),
            }
        }

        println!("{}", format!("✓ {} 完了", combo).green());
        Ok(PipelineOutcome::Built {
            image: combo.image().to_string(),
            pushed,
        })
    }
}

/// 構成イメージごとのスモークテストコマンド
///
/// 原則 `<repo> --version`。Javaランタイムだけはバージョンフラグの
/// 綴りが違う。
fn smoke_command(image: &ImageReference) -> Vec<String> {
    match image.repo() {
        "java" | "openjdk" => vec!["java".to_string(), "-version".to_string()],
        repo => vec![repo.to_string(), "--version".to_string()],
    }
}
