//! Dockerデーモンを使うビルドエンジン実装
//!
//! ビルド・スモークテスト・push・ファイル抽出をbollard経由で行います。

use crate::auth::RegistryAuth;
use crate::context::ContextBuilder;
use crate::engine::BuildEngine;
use crate::error::{BuildError, BuildResult};
use bollard::Docker;
use colored::Colorize;
use comboflow_core::ImageReference;
use comboflow_merge::{BuildContext, FileExtractor, MergeError, MergeResult};
use futures_util::stream::StreamExt;
use std::io::Read;

/// Docker接続を初期化（接続テスト込み）
pub async fn init_docker() -> BuildResult<Docker> {
    let docker = Docker::connect_with_local_defaults()?;
    docker.ping().await?;
    Ok(docker)
}

/// bollardベースのビルドエンジン
pub struct DockerEngine {
    docker: Docker,
    auth: RegistryAuth,
}

impl DockerEngine {
    /// Docker接続を初期化してエンジンを作成
    pub async fn connect(auth: RegistryAuth) -> BuildResult<Self> {
        Ok(Self {
            docker: init_docker().await?,
            auth,
        })
    }

    pub fn new(docker: Docker, auth: RegistryAuth) -> Self {
        Self { docker, auth }
    }

    /// ビルド出力の処理
    fn handle_build_output(&self, output: bollard::models::BuildInfo) -> BuildResult<()> {
        if let Some(stream) = output.stream {
            print!("{}", stream);
        }

        if let Some(error) = output.error {
            return Err(BuildError::BuildFailed(error));
        }

        if let Some(error_detail) = output.error_detail {
            let message = error_detail
                .message
                .unwrap_or_else(|| "unknown build error".to_string());
            return Err(BuildError::BuildFailed(message));
        }

        if let Some(status) = output.status {
            println!("{}", status.cyan());
        }

        Ok(())
    }

    /// コンテナのログをまとめて回収する
    async fn collect_logs(&self, container_id: &str) -> BuildResult<String> {
        #[allow(deprecated)]
        let options = bollard::container::LogsOptions::<String> {
            stdout: true,
            stderr: true,
            tail: "all".to_string(),
            ..Default::default()
        };

        #[allow(deprecated)]
        let mut stream = self.docker.logs(container_id, Some(options));
        let mut output = String::new();

        while let Some(log) = stream.next().await {
            use bollard::container::LogOutput;
            match log? {
                LogOutput::StdOut { message }
                | LogOutput::StdErr { message }
                | LogOutput::Console { message } => {
                    output.push_str(&String::from_utf8_lossy(&message));
                }
                LogOutput::StdIn { .. } => {}
            }
        }

        Ok(output)
    }

    /// コンテナを削除（後始末用、失敗はログに落とすだけ）
    async fn remove_container(&self, container_id: &str) {
        if let Err(e) = self
            .docker
            .remove_container(
                container_id,
                None::<bollard::query_parameters::RemoveContainerOptions>,
            )
            .await
        {
            tracing::debug!("failed to remove container {}: {}", container_id, e);
        }
    }

    /// イメージからファイル1個のバイト列を取り出す
    ///
    /// コンテナを作るだけでファイルシステムは読めるので起動はしない。
    async fn download_from_image(&self, image: &str, path: &str) -> BuildResult<Option<Vec<u8>>> {
        #[allow(deprecated)]
        let config = bollard::container::Config {
            image: Some(image.to_string()),
            ..Default::default()
        };

        #[allow(deprecated)]
        let container = self
            .docker
            .create_container(
                None::<bollard::container::CreateContainerOptions<String>>,
                config,
            )
            .await?;

        let result = self.download_one(&container.id, path).await;
        self.remove_container(&container.id).await;
        result
    }

    async fn download_one(&self, container_id: &str, path: &str) -> BuildResult<Option<Vec<u8>>> {
        #[allow(deprecated)]
        let options = bollard::container::DownloadFromContainerOptions {
            path: path.to_string(),
        };

        #[allow(deprecated)]
        let mut stream = self.docker.download_from_container(container_id, Some(options));

        let mut archive = Vec::new();
        while let Some(chunk) = stream.next().await {
            archive.extend_from_slice(&chunk?);
        }

        // デーモンはパスをtarで返すので、最初の通常ファイルを取り出す
        let mut tar = tar::Archive::new(std::io::Cursor::new(archive));
        for entry in tar.entries().map_err(BuildError::Io)? {
            let mut entry = entry.map_err(BuildError::Io)?;
            if entry.header().entry_type().is_file() {
                let mut data = Vec::new();
                entry.read_to_end(&mut data).map_err(BuildError::Io)?;
                return Ok(Some(data));
            }
        }

        Ok(None)
    }
}

impl BuildEngine for DockerEngine {
    async fn build(
        &self,
        context: &BuildContext,
        tag: &str,
        platforms: &[String],
    ) -> BuildResult<()> {
        tracing::info!("Building image: {}", tag);

        let archive = ContextBuilder::create_archive(context)?;
        let platform = platforms.join(",");

        #[allow(deprecated)]
        let options = bollard::image::BuildImageOptions {
            dockerfile: "Dockerfile",
            t: tag,
            platform: platform.as_str(),
            rm: true,      // 中間コンテナを削除
            forcerm: true, // ビルド失敗時も中間コンテナを削除
            ..Default::default()
        };

        use bytes::Bytes;
        use http_body_util::{Either, Full};
        let body = Full::new(Bytes::from(archive));

        #[allow(deprecated)]
        let mut stream = self
            .docker
            .build_image(options, None, Some(Either::Left(body)));

        while let Some(msg) = stream.next().await {
            match msg {
                Ok(output) => self.handle_build_output(output)?,
                Err(e) => return Err(BuildError::DockerConnection(e)),
            }
        }

        tracing::info!("Successfully built: {}", tag);
        Ok(())
    }

    async fn run_command(&self, image: &str, command: &[String]) -> BuildResult<String> {
        #[allow(deprecated)]
        let config = bollard::container::Config {
            image: Some(image.to_string()),
            cmd: Some(command.to_vec()),
            ..Default::default()
        };

        #[allow(deprecated)]
        let container = self
            .docker
            .create_container(
                None::<bollard::container::CreateContainerOptions<String>>,
                config,
            )
            .await?;

        if let Err(e) = self
            .docker
            .start_container(
                &container.id,
                None::<bollard::query_parameters::StartContainerOptions>,
            )
            .await
        {
            self.remove_container(&container.id).await;
            return Err(BuildError::DockerConnection(e));
        }

        // 終了を待つ。bollardは非ゼロ終了をエラーアイテムで返す
        let mut exit_code: i64 = 0;
        #[allow(deprecated)]
        let mut wait = self.docker.wait_container(
            &container.id,
            None::<bollard::container::WaitContainerOptions<String>>,
        );
        while let Some(result) = wait.next().await {
            match result {
                Ok(response) => exit_code = response.status_code,
                Err(bollard::errors::Error::DockerContainerWaitError { code, .. }) => {
                    exit_code = code;
                }
                Err(e) => {
                    self.remove_container(&container.id).await;
                    return Err(BuildError::DockerConnection(e));
                }
            }
        }

        let output = self.collect_logs(&container.id).await;
        self.remove_container(&container.id).await;
        let output = output?;

        if exit_code != 0 {
            return Err(BuildError::TestFailed {
                image: image.to_string(),
                command: command.join(" "),
                output,
            });
        }

        Ok(output)
    }

    async fn push(&self, repository: &str, tag: &str) -> BuildResult<()> {
        let credentials = self.auth.credentials(repository);

        #[allow(deprecated)]
        let options = bollard::image::PushImageOptions::<String> {
            tag: tag.to_string(),
        };

        println!("  → {}:{}", repository.cyan(), tag.cyan());

        #[allow(deprecated)]
        let mut stream = self.docker.push_image(repository, Some(options), credentials);

        let mut error_message: Option<String> = None;

        while let Some(result) = stream.next().await {
            match result {
                Ok(info) => {
                    if let Some(error) = info.error {
                        error_message = Some(error);
                    } else if let Some(status) = &info.status {
                        let progress = info.progress.as_deref().unwrap_or("");
                        tracing::debug!("push {}: {} {}", repository, status, progress);
                    }
                }
                Err(e) => {
                    return Err(BuildError::PushFailed {
                        message: e.to_string(),
                    });
                }
            }
        }

        if let Some(message) = error_message {
            return Err(BuildError::PushFailed { message });
        }

        Ok(())
    }
}

impl FileExtractor for DockerEngine {
    async fn extract(&self, image: &ImageReference, path: &str) -> MergeResult<Vec<u8>> {
        match self.download_from_image(image.image(), path).await {
            Ok(Some(data)) => Ok(data),
            Ok(None) => Err(MergeError::ExtractionFailed {
                image: image.image().to_string(),
                path: path.to_string(),
                message: "no regular file at that path".to_string(),
            }),
            Err(e) => Err(MergeError::ExtractionFailed {
                image: image.image().to_string(),
                path: path.to_string(),
                message: e.to_string(),
            }),
        }
    }
}
