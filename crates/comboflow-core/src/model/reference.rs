//! イメージ参照モデル
//!
//! `user/repo:tag` 形式のベースイメージ参照と、複数の参照から
//! 導出されるcomboイメージ参照を定義します。

use crate::error::{CoreError, CoreResult};
use std::fmt;

/// 名前空間なし（Docker Hub library）を表すセンチネル
pub const DEFAULT_USER: &str = "_";

/// comboイメージ用に予約された名前空間
pub const COMBO_NAMESPACE: &str = "combos";

/// ベースイメージへの参照
///
/// `user/repo:tag` または `repo:tag` を受け付けます。`@<url>` を後置すると
/// Dockerfileの取得元URLを明示的に指定できます（Hub上の探索をバイパス）。
/// 構築後は不変です。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageReference {
    image: String,
    dockerfile_url: Option<String>,
}

impl ImageReference {
    /// 文字列からイメージ参照をパース
    ///
    /// タグ区切り `:` がちょうど1個でない、タグが空、先頭・末尾が `:` の
    /// 場合は `InvalidReference` を返します。
    pub fn parse(input: &str) -> CoreResult<Self> {
        let (image, dockerfile_url) = match input.split_once('@') {
            Some((image, url)) => (image, Some(url.to_string())),
            None => (input, None),
        };

        if image.matches(':').count() != 1 || image.starts_with(':') || image.ends_with(':') {
            return Err(CoreError::InvalidReference(input.to_string()));
        }

        Ok(Self {
            image: image.to_string(),
            dockerfile_url,
        })
    }

    /// 検証済みの構成部品から直接組み立てる（crate内専用）
    pub(crate) fn from_parts(image: String, dockerfile_url: Option<String>) -> Self {
        Self {
            image,
            dockerfile_url,
        }
    }

    /// `user/repo:tag` 形式のイメージ名（`@url` は含まない）
    pub fn image(&self) -> &str {
        &self.image
    }

    /// レジストリの名前空間。なければ `_`
    pub fn user(&self) -> &str {
        match self.image.split_once('/') {
            Some((user, _)) => user,
            None => DEFAULT_USER,
        }
    }

    /// リポジトリ名（タグ区切りの直前、最後のパス区切り以降）
    pub fn repo(&self) -> &str {
        let name = self.image.split(':').next().unwrap_or(&self.image);
        name.rsplit('/').next().unwrap_or(name)
    }

    /// イメージタグ
    pub fn tag(&self) -> &str {
        match self.image.split_once(':') {
            Some((_, tag)) => tag,
            None => "",
        }
    }

    /// 明示的に指定されたDockerfileの取得元URL
    pub fn dockerfile_url(&self) -> Option<&str> {
        self.dockerfile_url.as_deref()
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.image)
    }
}

/// 構成イメージの順序付きリストから導出されるcomboイメージ参照
///
/// リポジトリ名とタグをそれぞれ `_` で結合し、`combos` 名前空間に
/// 固定します。同じ構成・同じ順序なら常に同じ参照になります。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComboReference {
    reference: ImageReference,
}

impl ComboReference {
    pub fn new(constituents: &[ImageReference]) -> Self {
        debug_assert!(!constituents.is_empty());

        let repo = constituents
            .iter()
            .map(|c| c.repo())
            .collect::<Vec<_>>()
            .join("_");
        let tag = constituents
            .iter()
            .map(|c| c.tag())
            .collect::<Vec<_>>()
            .join("_");

        let image = format!("{}/{}:{}", COMBO_NAMESPACE, repo, tag);
        Self {
            reference: ImageReference::from_parts(image, None),
        }
    }

    /// comboイメージ自身の参照（タイムスタンプ解決・ビルドタグに使用）
    pub fn reference(&self) -> &ImageReference {
        &self.reference
    }

    /// `combos/<repo>:<tag>` 形式の完全なイメージ名
    pub fn image(&self) -> &str {
        self.reference.image()
    }

    /// タグを除いたリポジトリ部（push先の指定に使用）
    pub fn repository(&self) -> &str {
        self.reference
            .image()
            .split(':')
            .next()
            .unwrap_or_else(|| self.reference.image())
    }

    pub fn tag(&self) -> &str {
        self.reference.tag()
    }
}

impl fmt::Display for ComboReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reference)
    }
}
