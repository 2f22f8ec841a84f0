//! ビルドコンテキストのアーカイブ化
//!
//! マージ結果（Dockerfile本文と抽出ファイル）をtar.gzに詰めて
//! Dockerデーモンに渡せる形にします。ソースディレクトリは存在せず、
//! コンテキストは丸ごとマージ計画から合成されます。

use crate::error::{BuildError, BuildResult};
use comboflow_merge::BuildContext;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;
use tar::Builder;

pub struct ContextBuilder;

impl ContextBuilder {
    /// ビルドコンテキストをtar.gzアーカイブとして作成
    pub fn create_archive(context: &BuildContext) -> BuildResult<Vec<u8>> {
        let mut archive_data = Vec::new();
        {
            let encoder = GzEncoder::new(&mut archive_data, Compression::default());
            let mut tar = Builder::new(encoder);

            append_entry(&mut tar, "Dockerfile", context.dockerfile.as_bytes())?;

            // extract戦略の側表をコンテキスト直下に同梱
            for file in &context.files {
                append_entry(&mut tar, &file.name, &file.data)?;
            }

            tar.finish().map_err(BuildError::Io)?;
        }

        tracing::debug!("Build context created: {} bytes", archive_data.len());
        Ok(archive_data)
    }
}

fn append_entry<W: Write>(tar: &mut Builder<W>, name: &str, data: &[u8]) -> BuildResult<()> {
    let mut header = tar::Header::new_gnu();
    header.set_path(name).map_err(BuildError::Io)?;
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();

    tar.append(&header, data).map_err(BuildError::Io)?;
    Ok(())
}
