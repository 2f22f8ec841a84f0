//! リビルド判定モデル

/// comboイメージのリビルド判定結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildDecision {
    /// comboは全構成イメージより新しい
    UpToDate,
    /// リビルドが必要（理由付き）
    NeedsRebuild(String),
    /// forceフラグにより無条件でリビルド
    Forced,
}

impl BuildDecision {
    pub fn needs_build(&self) -> bool {
        !matches!(self, BuildDecision::UpToDate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_build() {
        assert!(!BuildDecision::UpToDate.needs_build());
        assert!(BuildDecision::NeedsRebuild("newer".to_string()).needs_build());
        assert!(BuildDecision::Forced.needs_build());
    }
}
