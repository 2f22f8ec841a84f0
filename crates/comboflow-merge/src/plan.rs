//! マージ計画とビルドコンテキスト
//!
//! マージャは命令レコードの順序付き列と抽出ファイルの側表を積み上げ、
//! 最後に [`MergePlan::finalize`] で不変の [`BuildContext`] に確定します。
//! テキスト（Dockerfile）への直列化は確定時に一度だけ行います。

/// extract戦略で構成イメージから取り出したファイル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFile {
    /// マージ内で一意な合成名（ビルドコンテキスト内のファイル名）
    pub name: String,
    pub data: Vec<u8>,
}

/// 1回のマージ操作が所有するアキュムレータ
#[derive(Debug, Default)]
pub struct MergePlan {
    instructions: Vec<String>,
    files: Vec<ExtractedFile>,
}

impl MergePlan {
    pub fn push_instruction(&mut self, line: String) {
        self.instructions.push(line);
    }

    /// 次の抽出ファイルに割り当てる合成名
    pub fn next_file_name(&self) -> String {
        format!("combo-file-{}", self.files.len())
    }

    pub fn push_file(&mut self, name: String, data: Vec<u8>) {
        self.files.push(ExtractedFile { name, data });
    }

    /// 計画を不変のビルドコンテキストに確定する
    ///
    /// 確定時にsks-keyserversの旧ホスト名を現行のサーバーへ置換する。
    /// これは狭い互換パッチであって一般的な書き換え規則ではない。
    pub fn finalize(self) -> BuildContext {
        let dockerfile: String = self
            .instructions
            .iter()
            .map(|line| substitute_keyservers(line))
            .collect::<Vec<_>>()
            .join("\n")
            + "\n";

        BuildContext {
            dockerfile,
            files: self.files,
        }
    }
}

/// sks-keyservers.net は廃止済み
fn substitute_keyservers(line: &str) -> String {
    line.replace("p80.pool.sks-keyservers.net", "keys.openpgp.org")
        .replace("ipv4.pool.sks-keyservers.net", "keyserver.ubuntu.com")
}

/// 確定済みのビルドコンテキスト
///
/// マージされたDockerfile本文と、コンテキストに同梱するファイル群。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    pub dockerfile: String,
    pub files: Vec<ExtractedFile>,
}
