//! 命令行の分類
//!
//! マージャが扱うのはFROM・COPY・CMD/ENTRYPOINT・ENVの4種だけで、
//! それ以外の行はすべて素通しします。分類はトリム済みの1行に対して
//! 行います。

use crate::error::{MergeError, MergeResult};
use regex::Regex;
use std::sync::LazyLock;

/// `COPY <src> <dst>` の2オペランド形式
static COPY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^COPY[ \t]+([^ \t]+)[ \t]+([^ \t]+)$").unwrap());

/// 分類済みの命令行
#[derive(Debug, PartialEq, Eq)]
pub enum Classified<'a> {
    /// ベースステージ選択（FROM）
    From(&'a str),
    /// 2オペランドのファイルコピー
    Copy { source: &'a str, dest: &'a str },
    /// CMD / ENTRYPOINT（マージ結果からは常に落とす）
    Lifecycle,
    /// 環境変数設定
    Env { name: &'a str, value: &'a str },
    /// 上記以外（素通し）
    Other(&'a str),
}

/// トリム済みの1行を分類する
pub fn classify(line: &str) -> MergeResult<Classified<'_>> {
    if has_prefix(line, "FROM ") {
        return Ok(Classified::From(line));
    }

    if has_prefix(line, "COPY") {
        if line.ends_with('\\') {
            return Err(MergeError::MultiLineCopyUnsupported {
                line: line.to_string(),
            });
        }

        let caps = COPY_RE
            .captures(line)
            .ok_or_else(|| MergeError::UnparsableCopyInstruction {
                line: line.to_string(),
            })?;

        let source = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        let dest = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        return Ok(Classified::Copy { source, dest });
    }

    if has_prefix(line, "CMD ") || has_prefix(line, "ENTRYPOINT ") {
        return Ok(Classified::Lifecycle);
    }

    if has_prefix(line, "ENV ") {
        let rest = line[4..].trim_start();
        if let Some((name, value)) = rest.split_once([' ', '\t']) {
            return Ok(Classified::Env {
                name,
                value: value.trim_start(),
            });
        }
        // 値のないENVは素通し
        return Ok(Classified::Other(line));
    }

    Ok(Classified::Other(line))
}

fn has_prefix(line: &str, prefix: &str) -> bool {
    line.get(..prefix.len())
        .is_some_and(|p| p.eq_ignore_ascii_case(prefix))
}

/// COPY先のパスを解決する
///
/// ディレクトリ（`/` 終わり）宛てのコピーは、コピー元のbasenameを
/// 付けた完全なファイルパスに書き換える。
pub fn resolve_copy_dest(source: &str, dest: &str) -> String {
    if dest.ends_with('/') {
        let basename = source.rsplit('/').next().unwrap_or(source);
        format!("{}{}", dest, basename)
    } else {
        dest.to_string()
    }
}
