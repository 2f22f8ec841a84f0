//! モデル定義
//!
//! comboイメージ生成で使用されるデータモデルを定義します。
//! 各モデルは機能ごとにモジュールに分離されています。

mod decision;
mod recipe;
mod reference;

// Re-exports
pub use decision::*;
pub use recipe::*;
pub use reference::*;
