//! # Legato
//!
//! Legatoは、発音辞書に基づいて正書法テキストを音声転写(IPA/extIPAなど
//! 互換の記号体系)へ変換する書記素-音素変換(g2p)エンジンです。
//!
//! ## 概要
//!
//! このライブラリは、辞書駆動のスキャンエンジンと合成可能なプロセッサ
//! パイプラインを提供します。入力テキストは貪欲最長一致スキャナ
//! ([`Determinist`])によって音声フラグメントと残りの生スパンに分割され、
//! 複数のスキャナや後処理プロセッサ(リエゾン規則エンジンなど)を
//! 連結して、前段が残したフラグメントを段階的に精緻化できます。
//!
//! ## 主な機能
//!
//! - **多形式の辞書ローダ**: テキスト形式(パイプ区切り/スラッシュ区切り)
//!   とバイナリ形式の自動判別、4種のマージモード
//! - **貪欲最長一致スキャン**: 文字単位の位置付けと多バリアント出力
//! - **寛容一致**: ダイアクリティカルマークの違いを無視する第2パス
//! - **表記境界の制御**: 部分一致の許可/禁止とカスタムデリミタ
//! - **ストリーミングパイプライン**: キャンセル可能なプロセッサ連結
//!
//! ## 使用例
//!
//! ```
//! use legato::{Determinist, Dictionary};
//!
//! let mut dict = Dictionary::new();
//! dict.insert("le", vec!["lə".to_string()]);
//! dict.insert("benoit", vec!["bənwa".to_string()]);
//!
//! let determinist = Determinist::new(dict);
//! let result = determinist.scan("Le benoit");
//!
//! assert_eq!(result.fragments.len(), 2);
//! assert_eq!(result.fragments[0].phonetized, "lə");
//! assert_eq!(result.fragments[1].phonetized, "bənwa");
//! ```

/// 貪欲最長一致スキャナ
pub mod determinist;

/// 辞書モデルとローダフレームワーク
pub mod dictionary;

/// エラー型の定義
pub mod errors;

/// フランス語リエゾンの後処理プロセッサ
pub mod liaison;

/// 文字列正規化ユーティリティ
pub mod normalize;

/// バリアント選択の戦略
pub mod picker;

/// プロセッサプロトコルとストリーミング実行
pub mod processor;

/// 変換結果の表現
pub mod transcription;

/// 内部ユーティリティ関数
pub(crate) mod utils;


// Re-exports
pub use determinist::{Determinist, DeterministOptions};
pub use dictionary::{
    load_blobs, load_into, load_paths, register_loader, Dictionary, Loader, MergeMode,
    Registry, Representation,
};
pub use errors::LegatoError;
pub use liaison::FrenchLiaison;
pub use picker::{AnnotatedPhonetized, Picker};
pub use processor::{stream, stream_one, CancellationToken, Chain, Processor};
pub use transcription::{Fragment, RawText, Transcription};

/// このライブラリのバージョン番号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
