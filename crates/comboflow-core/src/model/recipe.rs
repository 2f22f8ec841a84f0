//! ビルドレシピモデル

/// 1イメージ分のビルドレシピ（Dockerfile）
///
/// Resolverが取得した生の命令行の順序付き列。パースや書き換えは
/// comboflow-merge 側の責務で、ここでは行をそのまま保持します。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    lines: Vec<String>,
}

impl Recipe {
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.lines().map(|l| l.to_string()).collect(),
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|l| l.as_str())
    }

    /// 最初のFROM行（トリム済み）を返す
    pub fn from_line(&self) -> Option<&str> {
        self.lines
            .iter()
            .map(|l| l.trim())
            .find(|l| l.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("FROM")))
    }
}
