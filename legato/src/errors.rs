//! エラー型の定義
//!
//! このモジュールは、Legatoライブラリで使用されるすべてのエラー型を定義します。

use std::error::Error;
use std::fmt;
use std::path::PathBuf;

/// Legato専用のResult型
///
/// エラー型としてデフォルトで[`LegatoError`]を使用します。
pub type Result<T, E = LegatoError> = std::result::Result<T, E>;

/// Legatoのエラー型
///
/// このライブラリで発生する可能性のあるすべてのエラーを表現します。
/// 各バリアントは特定のエラー条件に対応しています。
///
/// 辞書のスキャン処理自体は失敗しません。エラーを返すのは辞書ソースの
/// 読み込みとデシリアライゼーションのみです。
#[derive(Debug, thiserror::Error)]
pub enum LegatoError {
    /// 無効なフォーマットエラー
    ///
    /// 辞書ソースの1行をローダが解釈できなかった場合に発生します。
    /// フォーマット種別と問題の行を保持します。
    #[error(transparent)]
    InvalidFormat(InvalidFormatError),

    /// 辞書ソースのオープン失敗
    ///
    /// 指定されたパスからバイト列を取得できなかった場合に発生します。
    #[error("open {path}: {source}")]
    SourceOpen {
        /// 開けなかったソースのパス
        path: PathBuf,
        /// 根本原因のI/Oエラー
        source: std::io::Error,
    },

    /// フォーマット判別用プレフィックスの読み取り失敗
    ///
    /// フォーマットのスニッフィング中に予期しないI/O条件が発生した場合に
    /// 発生します。EOFはエラーとして扱われません。
    #[error("sniff {path}: {source}")]
    Sniff {
        /// 読み取りに失敗したソースのパス
        path: PathBuf,
        /// 根本原因のI/Oエラー
        source: std::io::Error,
    },

    /// 該当するローダが存在しないエラー
    ///
    /// スニッフィングがどのローダにも一致せず、フォールバックも登録されて
    /// いない場合に発生します。組み込みレジストリでは到達しません。
    #[error("no loader matched for {0}")]
    NoLoader(String),

    /// バイナリ辞書のデコードエラー
    ///
    /// [`DecodeError`](bincode::error::DecodeError)のエラーバリアント。
    #[error(transparent)]
    Decode(#[from] bincode::error::DecodeError),

    /// バイナリ辞書のエンコードエラー
    ///
    /// [`EncodeError`](bincode::error::EncodeError)のエラーバリアント。
    #[error(transparent)]
    Encode(#[from] bincode::error::EncodeError),

    /// I/Oエラー
    ///
    /// [`std::io::Error`]のエラーバリアント。
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// UTF-8エンコーディングエラー
    ///
    /// [`std::str::Utf8Error`]のエラーバリアント。
    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),
}

impl LegatoError {
    /// 無効なフォーマットエラーを生成します
    ///
    /// # 引数
    ///
    /// * `arg` - フォーマット名
    /// * `msg` - エラーメッセージ
    pub(crate) fn invalid_format<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidFormat(InvalidFormatError {
            arg,
            msg: msg.into(),
        })
    }
}

/// 入力フォーマットが無効な場合に使用されるエラー
#[derive(Debug)]
pub struct InvalidFormatError {
    /// フォーマットの名前
    pub(crate) arg: &'static str,

    /// エラーメッセージ
    pub(crate) msg: String,
}

impl fmt::Display for InvalidFormatError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidFormatError: {}: {}", self.arg, self.msg)
    }
}

impl Error for InvalidFormatError {}
