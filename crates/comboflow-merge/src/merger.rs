//! レシピのマージ
//!
//! 構成イメージのレシピを順番に処理して1本のDockerfileに束ねます。
//! FROMは先頭構成（またはオーバーライド）の1回だけ、CMD/ENTRYPOINTは
//! 常に落とし、ENVはオーバーライド表を通し、COPYは選択された戦略で
//! 解決します。

use crate::error::{MergeError, MergeResult};
use crate::extract::FileExtractor;
use crate::instruction::{Classified, classify, resolve_copy_dest};
use crate::plan::{BuildContext, MergePlan};
use comboflow_core::{ImageReference, Recipe};
use std::collections::HashMap;

/// apt環境でgnupg-curlを入れる互換パッチ
const GNUPG_CURL_RUN: &str = "RUN apt-get update && \
apt-get install -y --no-install-recommends gnupg-curl && \
rm -rf /var/lib/apt/lists/*";

/// 失効したDST Root CA X3を信頼ストアから外す互換パッチ
const LETS_ENCRYPT_FIX_RUN: &str = "RUN sed -ie \
's#mozilla/DST_Root_CA_X3.crt#!mozilla/DST_Root_CA_X3.crt#' \
/etc/ca-certificates.conf && update-ca-certificates";

/// 構成イメージをまたぐCOPYの解決戦略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CopyStrategy {
    /// 構成イメージ自身を `--from=` の外部ステージとして参照する。
    /// ビルド時に全構成イメージがアドレス可能であること。
    #[default]
    CrossImage,
    /// 構成イメージの実体からファイルを取り出してコンテキストに同梱する
    Extract,
}

/// マージの設定
#[derive(Debug, Default)]
pub struct MergeOptions {
    /// ベースステージの明示オーバーライド（イメージ参照文字列）
    pub from_override: Option<String>,
    /// 環境変数のオーバーライド（名前 → 置換値）
    pub env_overrides: HashMap<String, String>,
    pub copy_strategy: CopyStrategy,
    pub add_gnupg_curl: bool,
    pub fix_lets_encrypt: bool,
}

/// N個の解決済みレシピを1つのビルドコンテキストへマージする
pub struct RecipeMerger<'a, X> {
    options: &'a MergeOptions,
    extractor: &'a X,
}

impl<'a, X: FileExtractor> RecipeMerger<'a, X> {
    pub fn new(options: &'a MergeOptions, extractor: &'a X) -> Self {
        Self { options, extractor }
    }

    pub async fn merge(
        &self,
        constituents: &[(ImageReference, Recipe)],
    ) -> MergeResult<BuildContext> {
        let mut plan = MergePlan::default();

        // オーバーライドがあればFROMはここで確定し、構成側のFROMは全部落とす
        let mut use_from = match &self.options.from_override {
            Some(base) => {
                plan.push_instruction(format!("FROM {}", base));
                false
            }
            None => true,
        };

        if self.options.add_gnupg_curl {
            plan.push_instruction(GNUPG_CURL_RUN.to_string());
        }
        if self.options.fix_lets_encrypt {
            plan.push_instruction(LETS_ENCRYPT_FIX_RUN.to_string());
        }

        for (image, recipe) in constituents {
            tracing::debug!("merging {}", image);
            self.merge_one(&mut plan, image, recipe, &mut use_from)
                .await?;
        }

        Ok(plan.finalize())
    }

    async fn merge_one(
        &self,
        plan: &mut MergePlan,
        image: &ImageReference,
        recipe: &Recipe,
        use_from: &mut bool,
    ) -> MergeResult<()> {
        let mut saw_from = false;

        for raw in recipe.lines() {
            let line = raw.trim();

            match classify(line)? {
                Classified::From(from_line) => {
                    if saw_from {
                        return Err(MergeError::MultiStageUnsupported {
                            image: image.image().to_string(),
                        });
                    }
                    saw_from = true;

                    if *use_from {
                        plan.push_instruction(from_line.to_string());
                    }
                }

                Classified::Copy { source, dest } => {
                    let path = resolve_copy_dest(source, dest);
                    self.merge_copy(plan, image, source, &path).await?;
                }

                Classified::Lifecycle => {
                    // 最終イメージのCMD/ENTRYPOINTは構成イメージから引き継がない
                }

                Classified::Env { name, value: _ } => {
                    match self.options.env_overrides.get(name) {
                        Some(replacement) => {
                            plan.push_instruction(format!("ENV {} {}", name, replacement));
                        }
                        None => plan.push_instruction(line.to_string()),
                    }
                }

                Classified::Other(other) => plan.push_instruction(other.to_string()),
            }
        }

        // FROMを出すのは最初の構成だけ
        *use_from = false;
        Ok(())
    }

    async fn merge_copy(
        &self,
        plan: &mut MergePlan,
        image: &ImageReference,
        source: &str,
        path: &str,
    ) -> MergeResult<()> {
        match self.options.copy_strategy {
            CopyStrategy::CrossImage => {
                plan.push_instruction(format!(
                    "COPY --from={} {} {}",
                    image.image(),
                    path,
                    path
                ));
            }
            CopyStrategy::Extract => {
                let data = self.extractor.extract(image, source).await?;
                let name = plan.next_file_name();
                plan.push_instruction(format!("COPY {} {}", name, path));
                plan.push_file(name, data);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::ExtractedFile;

    /// 固定の内容を返す抽出器。存在しないパスは失敗させる。
    struct FakeExtractor;

    impl FileExtractor for FakeExtractor {
        async fn extract(&self, image: &ImageReference, path: &str) -> MergeResult<Vec<u8>> {
            if path.ends_with("missing") {
                return Err(MergeError::ExtractionFailed {
                    image: image.image().to_string(),
                    path: path.to_string(),
                    message: "no such file".to_string(),
                });
            }
            Ok(format!("{}:{}", image.image(), path).into_bytes())
        }
    }

    fn image(name: &str) -> ImageReference {
        ImageReference::parse(name).unwrap()
    }

    fn lines(context: &BuildContext) -> Vec<&str> {
        context.dockerfile.lines().collect()
    }

    async fn merge_with(
        options: &MergeOptions,
        constituents: &[(ImageReference, Recipe)],
    ) -> MergeResult<BuildContext> {
        RecipeMerger::new(options, &FakeExtractor)
            .merge(constituents)
            .await
    }

    #[tokio::test]
    async fn test_merge_emits_single_from() {
        let constituents = vec![
            (
                image("python:3.9"),
                Recipe::from_text("FROM debian:buster\nRUN install-python\nCMD [\"python\"]\n"),
            ),
            (
                image("node:18"),
                Recipe::from_text("FROM debian:buster\nRUN install-node\nCMD [\"node\"]\n"),
            ),
        ];

        let context = merge_with(&MergeOptions::default(), &constituents)
            .await
            .unwrap();

        assert_eq!(
            lines(&context),
            vec!["FROM debian:buster", "RUN install-python", "RUN install-node"]
        );
    }

    #[tokio::test]
    async fn test_merge_preserves_constituent_order() {
        let constituents = vec![
            (
                image("a:1"),
                Recipe::from_text("FROM base:1\nRUN a1\nRUN a2\n"),
            ),
            (
                image("b:1"),
                Recipe::from_text("FROM base:1\nRUN b1\nRUN b2\n"),
            ),
        ];

        let context = merge_with(&MergeOptions::default(), &constituents)
            .await
            .unwrap();

        assert_eq!(
            lines(&context),
            vec!["FROM base:1", "RUN a1", "RUN a2", "RUN b1", "RUN b2"]
        );
    }

    #[tokio::test]
    async fn test_merge_from_override_replaces_base() {
        let options = MergeOptions {
            from_override: Some("ubuntu:22.04".to_string()),
            ..Default::default()
        };
        let constituents = vec![
            (image("a:1"), Recipe::from_text("FROM base:1\nRUN a\n")),
            (image("b:1"), Recipe::from_text("FROM other:2\nRUN b\n")),
        ];

        let context = merge_with(&options, &constituents).await.unwrap();

        assert_eq!(
            lines(&context),
            vec!["FROM ubuntu:22.04", "RUN a", "RUN b"]
        );
    }

    #[tokio::test]
    async fn test_merge_drops_later_from_lines() {
        // 互換性チェックはマージの外の責務なので、ここでは食い違う
        // FROMでも2番目以降が落ちることだけを見る
        let constituents = vec![
            (image("a:1"), Recipe::from_text("FROM base:1\nRUN a\n")),
            (image("b:1"), Recipe::from_text("FROM other:2\nRUN b\n")),
        ];

        let context = merge_with(&MergeOptions::default(), &constituents)
            .await
            .unwrap();

        assert_eq!(lines(&context), vec!["FROM base:1", "RUN a", "RUN b"]);
        assert!(!context.dockerfile.contains("FROM other:2"));
    }

    #[tokio::test]
    async fn test_merge_rejects_multi_stage_recipe() {
        let constituents = vec![(
            image("a:1"),
            Recipe::from_text("FROM base:1\nRUN a\nFROM builder:2\nRUN b\n"),
        )];

        let result = merge_with(&MergeOptions::default(), &constituents).await;
        assert!(matches!(
            result,
            Err(MergeError::MultiStageUnsupported { image }) if image == "a:1"
        ));
    }

    #[tokio::test]
    async fn test_merge_copy_cross_image() {
        let constituents = vec![(
            image("a:1"),
            Recipe::from_text("FROM base:1\nCOPY /src/file.txt /dest/\n"),
        )];

        let context = merge_with(&MergeOptions::default(), &constituents)
            .await
            .unwrap();

        assert_eq!(
            lines(&context),
            vec!["FROM base:1", "COPY --from=a:1 /dest/file.txt /dest/file.txt"]
        );
        assert!(context.files.is_empty());
    }

    #[tokio::test]
    async fn test_merge_copy_extract() {
        let options = MergeOptions {
            copy_strategy: CopyStrategy::Extract,
            ..Default::default()
        };
        let constituents = vec![(
            image("a:1"),
            Recipe::from_text(
                "FROM base:1\nCOPY /src/file.txt /dest/\nCOPY /etc/conf /etc/conf\n",
            ),
        )];

        let context = merge_with(&options, &constituents).await.unwrap();

        assert_eq!(
            lines(&context),
            vec![
                "FROM base:1",
                "COPY combo-file-0 /dest/file.txt",
                "COPY combo-file-1 /etc/conf",
            ]
        );
        assert_eq!(
            context.files,
            vec![
                ExtractedFile {
                    name: "combo-file-0".to_string(),
                    data: b"a:1:/src/file.txt".to_vec(),
                },
                ExtractedFile {
                    name: "combo-file-1".to_string(),
                    data: b"a:1:/etc/conf".to_vec(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_merge_copy_extract_missing_file() {
        let options = MergeOptions {
            copy_strategy: CopyStrategy::Extract,
            ..Default::default()
        };
        let constituents = vec![(
            image("a:1"),
            Recipe::from_text("FROM base:1\nCOPY /src/missing /dest/\n"),
        )];

        let result = merge_with(&options, &constituents).await;
        assert!(matches!(
            result,
            Err(MergeError::ExtractionFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_merge_copy_continuation_fails_anywhere() {
        let constituents = vec![(
            image("a:1"),
            Recipe::from_text("FROM base:1\nRUN x\nCOPY /a \\\n  /b\n"),
        )];

        let result = merge_with(&MergeOptions::default(), &constituents).await;
        assert!(matches!(
            result,
            Err(MergeError::MultiLineCopyUnsupported { .. })
        ));
    }

    #[tokio::test]
    async fn test_merge_env_override() {
        let options = MergeOptions {
            env_overrides: HashMap::from([("FOO".to_string(), "baz".to_string())]),
            ..Default::default()
        };
        let constituents = vec![(
            image("a:1"),
            Recipe::from_text("FROM base:1\nENV FOO bar\nENV OTHER kept\n"),
        )];

        let context = merge_with(&options, &constituents).await.unwrap();

        assert_eq!(
            lines(&context),
            vec!["FROM base:1", "ENV FOO baz", "ENV OTHER kept"]
        );
    }

    #[tokio::test]
    async fn test_merge_drops_lifecycle_instructions() {
        let constituents = vec![(
            image("a:1"),
            Recipe::from_text(
                "FROM base:1\nCMD [\"a\"]\nENTRYPOINT [\"entry.sh\"]\nRUN kept\n",
            ),
        )];

        let context = merge_with(&MergeOptions::default(), &constituents)
            .await
            .unwrap();

        assert_eq!(lines(&context), vec!["FROM base:1", "RUN kept"]);
    }

    #[tokio::test]
    async fn test_merge_patch_flags_precede_constituents() {
        let options = MergeOptions {
            from_override: Some("debian:buster".to_string()),
            add_gnupg_curl: true,
            fix_lets_encrypt: true,
            ..Default::default()
        };
        let constituents = vec![(image("a:1"), Recipe::from_text("FROM base:1\nRUN a\n"))];

        let context = merge_with(&options, &constituents).await.unwrap();
        let rendered = lines(&context);

        assert_eq!(rendered[0], "FROM debian:buster");
        assert!(rendered[1].contains("gnupg-curl"));
        assert!(rendered[2].contains("update-ca-certificates"));
        assert_eq!(rendered[3], "RUN a");
    }
}
