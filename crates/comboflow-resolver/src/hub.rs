//! Docker Hub経由のレシピ解決
//!
//! Dockerfileは、参照に `@url` が付いていれば直接ダウンロード、
//! なければDocker Hubのリポジトリ説明文（markdown）からタグに対応する
//! Dockerfileリンクを探して取得します。ビルド時刻はDockerデーモンに
//! pullさせたうえで inspect の created から読み取ります。

use crate::error::{ResolveError, ResolveResult};
use crate::source::RecipeSource;
use bollard::Docker;
use chrono::{DateTime, Utc};
use comboflow_core::{DEFAULT_USER, ImageReference, Recipe};
use futures_util::stream::StreamExt;
use regex::Regex;
use std::sync::LazyLock;

/// markdownのインラインリンク `[text](url)`
static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\(([^)\s]+)\)").unwrap());

/// Docker Hubを情報源とするレシピ解決
pub struct HubSource {
    docker: Docker,
    http: reqwest::Client,
}

impl HubSource {
    pub fn new(docker: Docker) -> Self {
        Self {
            docker,
            http: reqwest::Client::new(),
        }
    }

    /// URLからDockerfileをダウンロード
    async fn download_dockerfile(&self, url: &str) -> ResolveResult<Recipe> {
        let response = self
            .http
            .get(url)
            .header("User-Agent", "comboflow")
            .send()
            .await
            .map_err(|e| ResolveError::DockerfileDownload {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(ResolveError::DockerfileDownload {
                url: url.to_string(),
                message: format!("HTTP {}", response.status()),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| ResolveError::DockerfileDownload {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        Ok(Recipe::from_text(&text))
    }

    /// Hubのリポジトリ説明文からDockerfileを探して取得
    async fn discover_dockerfile(&self, image: &ImageReference) -> ResolveResult<Recipe> {
        // library（公式）イメージ以外の説明文にはDockerfileリンクの規約がない
        if image.user() != DEFAULT_USER {
            return Err(ResolveError::DiscoveryUnsupported {
                image: image.image().to_string(),
            });
        }

        let url = format!(
            "https://hub.docker.com/v2/repositories/library/{}",
            image.repo()
        );

        let response = self
            .http
            .get(&url)
            .header("User-Agent", "comboflow")
            .send()
            .await
            .map_err(|e| ResolveError::HubApi {
                url: url.clone(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(ResolveError::HubApi {
                url: url.clone(),
                message: format!("HTTP {}", response.status()),
            });
        }

        let body: serde_json::Value =
            response.json().await.map_err(|e| ResolveError::HubApi {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let description = body
            .get("full_description")
            .and_then(|d| d.as_str())
            .unwrap_or("");

        let dockerfile_url = find_dockerfile_url(description, image.tag()).ok_or_else(|| {
            ResolveError::DockerfileNotFound {
                image: image.image().to_string(),
                url: url.clone(),
            }
        })?;

        let dockerfile_url = raw_github_url(&dockerfile_url);
        tracing::debug!("Found Dockerfile for {} at {}", image, dockerfile_url);
        self.download_dockerfile(&dockerfile_url).await
    }

    /// イメージをpull（ビルド時刻の取得前に最新化する）
    async fn pull(&self, image: &ImageReference) -> ResolveResult<()> {
        let name = image.image().split(':').next().unwrap_or(image.image());

        #[allow(deprecated)]
        let options = bollard::image::CreateImageOptions {
            from_image: name,
            tag: image.tag(),
            ..Default::default()
        };

        let mut stream =
            self.docker
                .create_image(Some(options), None, None::<bollard::auth::DockerCredentials>);

        while let Some(info) = stream.next().await {
            let info = info?;
            if let Some(status) = info.status {
                tracing::debug!("pull {}: {}", image, status);
            }
        }

        Ok(())
    }
}

impl RecipeSource for HubSource {
    async fn fetch_recipe(&self, image: &ImageReference) -> ResolveResult<Recipe> {
        match image.dockerfile_url() {
            // 明示URLはHub探索をバイパスして直接取得
            Some(url) => self.download_dockerfile(url).await,
            None => self.discover_dockerfile(image).await,
        }
    }

    async fn last_build_time(&self, image: &ImageReference) -> ResolveResult<DateTime<Utc>> {
        tracing::info!("Pulling {}", image);

        if let Err(e) = self.pull(image).await {
            // ローカルにしか存在しないイメージ（未pushのcombo等）は
            // pullに失敗しても inspect で時刻が取れる
            tracing::debug!("pull of {} failed: {} (falling back to local inspect)", image, e);
        }

        let inspect = self.docker.inspect_image(image.image()).await.map_err(|e| {
            ResolveError::BuildTimeUnavailable {
                image: image.image().to_string(),
                message: e.to_string(),
            }
        })?;

        let created = inspect
            .created
            .ok_or_else(|| ResolveError::BuildTimeUnavailable {
                image: image.image().to_string(),
                message: "image has no created timestamp".to_string(),
            })?;

        let built_at = DateTime::parse_from_rfc3339(&created)
            .map_err(|e| ResolveError::BuildTimeUnavailable {
                image: image.image().to_string(),
                message: format!("invalid created timestamp '{}': {}", created, e),
            })?
            .with_timezone(&Utc);

        tracing::info!("{} was last built on {}", image, built_at);
        Ok(built_at)
    }
}

/// 説明文のmarkdownからタグに対応するDockerfileリンクを探す
///
/// 規約: タグはコードスパン（`` `tag` ``）で現れる。リンクテキスト内に
/// 直接タグを含むリンクがあればそれを採用。なければタグを含む行の
/// リンク群から windowsservercore 向けを除き、残りがちょうど1本の
/// 場合だけ採用する。
fn find_dockerfile_url(description: &str, tag: &str) -> Option<String> {
    let needle = format!("`{}`", tag);

    for line in description.lines() {
        if !line.contains(&needle) {
            continue;
        }

        // リンクテキストにタグそのものを含むリンク
        for caps in LINK_RE.captures_iter(line) {
            if caps[1].contains(&needle) {
                return Some(caps[2].to_string());
            }
        }

        // 行内のリンクが実質1本だけならそれを採用
        let candidates: Vec<String> = LINK_RE
            .captures_iter(line)
            .map(|caps| caps[2].to_string())
            .filter(|url| !url.contains("windowsservercore"))
            .collect();

        if candidates.len() == 1 {
            return Some(candidates[0].clone());
        }
    }

    None
}

/// GitHubのblob URLをrawコンテンツURLに書き換える
fn raw_github_url(url: &str) -> String {
    url.replace("github.com", "raw.githubusercontent.com")
        .replace("/blob/", "/")
}
