//! 行ベースのテキストフォーマット用汎用ローダ
//!
//! 各エントリが1行に収まるテキスト形式のための[`Loader`]実装を提供
//! します。実際の解析は供給された行パーサに委譲されるため、追加の
//! テキスト形式(Lexique、Flexique、独自のタブ区切り辞書など)の
//! サポートが容易になります。

use std::io::BufRead;

use crate::dictionary::loader::{Kind, Loader, OnEntry};
use crate::dictionary::Dictionary;
use crate::errors::{LegatoError, Result};
use crate::utils::{logical_lines, strip_inline_comment_and_trim};

/// テキスト形式の1行を解析するパーサ
///
/// コメントと前後の空白を除去済みの1論理行を受け取り、表記と発音の
/// リストを返します。行を無視すべき場合は`None`を返します。
pub type LineParser = fn(&str) -> Result<Option<(String, Vec<String>)>>;

/// フォーマット判別関数
///
/// ソースの先頭バイト列(と、それが全体かどうかのフラグ)から、この
/// ローダがソースを認識するかを判定します。
pub type Sniffer = fn(&[u8], bool) -> bool;

/// 行単位のテキスト形式のための汎用ローダ
///
/// [`LineLoader::new`]にフォーマット種別、判別関数、行パーサを渡して
/// 構築します。空行とコメント行の読み飛ばし、インラインコメントの
/// 除去、およびエラーへの行情報の付与はこの型が共通に処理します。
pub struct LineLoader {
    kind: Kind,
    sniffer: Sniffer,
    parse_line: LineParser,
}

impl LineLoader {
    /// 新しい行ベースローダを構築します
    ///
    /// # 引数
    ///
    /// * `kind` - フォーマット種別の識別子
    /// * `sniffer` - フォーマット判別関数
    /// * `parse_line` - 1行を解析するパーサ
    pub fn new(kind: Kind, sniffer: Sniffer, parse_line: LineParser) -> Self {
        Self {
            kind,
            sniffer,
            parse_line,
        }
    }
}

impl Loader for LineLoader {
    fn kind(&self) -> Kind {
        self.kind
    }

    fn sniff(&self, sniff: &[u8], is_eof: bool) -> bool {
        (self.sniffer)(sniff, is_eof)
    }

    fn load(&self, rdr: &mut dyn BufRead, emit: &mut OnEntry) -> Result<()> {
        // Sources are read whole so that LF, CRLF and CR terminators can all
        // be honored; dictionaries are loaded once and held in memory anyway.
        let mut text = String::new();
        rdr.read_to_string(&mut text)?;

        for raw_line in logical_lines(&text) {
            let line = strip_inline_comment_and_trim(raw_line);
            if line.is_empty() {
                continue;
            }
            let parsed = (self.parse_line)(line).map_err(|e| {
                LegatoError::invalid_format(self.kind.0, format!("parse line {line:?}: {e}"))
            })?;
            let Some((word, prons)) = parsed else {
                continue;
            };
            if word.is_empty() || prons.is_empty() {
                continue;
            }
            emit(&word, prons)?;
        }
        Ok(())
    }

    fn load_all(&self, rdr: &mut dyn BufRead) -> Result<Dictionary> {
        let mut dict = Dictionary::new();
        self.load(rdr, &mut |word, prons| {
            dict.insert(word, prons);
            Ok(())
        })?;
        Ok(dict)
    }
}
