//! 貪欲最長一致スキャナ
//!
//! このモジュールは、辞書に基づいて入力テキストを音声フラグメントと
//! 残りの生スパンに分割するメインスキャナを提供します。
//!
//! # 主要な構造体
//!
//! - [`Determinist`]: 貪欲最長一致スキャンを実行するスキャナ本体
//! - [`DeterministOptions`]: 寛容一致と部分一致を制御するオプション
//!
//! # 例
//!
//! ```
//! use legato::{Determinist, Dictionary};
//!
//! let mut dict = Dictionary::new();
//! dict.insert("le", vec!["lə".to_string()]);
//! dict.insert("benoit", vec!["bənwa".to_string()]);
//!
//! let det = Determinist::new(dict);
//! let res = det.scan("Le GrosBenoit");
//!
//! assert_eq!(res.fragments.len(), 2);
//! assert_eq!(res.fragments[0].phonetized, "lə");
//! assert_eq!(res.raw_texts()[0].text, " Gros");
//! ```

use std::sync::mpsc::Receiver;
use std::sync::Arc;

use hashbrown::HashSet;
use log::trace;
use unicode_properties::{GeneralCategoryGroup, UnicodeGeneralCategory};

use crate::dictionary::{Dictionary, KeyMap};
use crate::normalize::{normalize, tolerant_normalize};
use crate::picker::Picker;
use crate::processor::{stream_one, CancellationToken, Processor};
use crate::transcription::{sort_fragments, Fragment, RawText, Transcription};

/// 厳密パスのパス信頼度
const STRICT_PASS_CONFIDENCE: f64 = 1.0;

/// 寛容パスのパス信頼度
const TOLERANT_PASS_CONFIDENCE: f64 = 0.9;

/// スキャナの動作を制御するオプション
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeterministOptions {
    /// 厳密パスで生スパンとして残った領域に対して、寛容キーマップを
    /// 使用する第2パスを有効にします
    pub diacritic_insensitive: bool,

    /// `false`の場合、候補部分文字列は表記境界(テキストの先頭/末尾
    /// または両側のデリミタ文字)と一致する場合にのみ受理されます。
    /// デフォルトは`true`です
    pub allow_partial_match: bool,
}

impl Default for DeterministOptions {
    fn default() -> Self {
        Self {
            diacritic_insensitive: false,
            allow_partial_match: true,
        }
    }
}

/// スキャンパスの種別
#[derive(Clone, Copy)]
enum Pass {
    Strict,
    Tolerant,
}

/// 辞書に基づく貪欲最長一致スキャナ
///
/// 各位置で最長の候補から試行し、辞書にヒットした最初の候補を
/// 受理します。複数の候補長にエントリがある場合、より短い一致の方が
/// 信頼度の高いバリアントを持っていても、無条件に最長の一致が
/// 勝ちます。
///
/// 派生インデックス(正規化キーマップ、寛容キーマップ、キーの最大
/// 文字数)は構築時に一度だけ計算され、以後変更されません。構築後の
/// スキャナはタスク間でロックなしに共有できます。オプションと
/// デリミタはパイプラインに組み込む前に設定してください。並行した
/// 変更はサポートされません。
///
/// スキャン操作は失敗しません。空のテキストや空の辞書は空の結果
/// または変更されない結果を生みます。
pub struct Determinist {
    dictionary: Dictionary,
    normalized: KeyMap,
    tolerant: KeyMap,
    max_key_len: usize,
    options: DeterministOptions,
    delimiters: Option<HashSet<char>>,
    picker: Picker,
}

impl Determinist {
    /// デフォルトのオプションでスキャナを構築します
    ///
    /// # 引数
    ///
    /// * `dictionary` - スキャンに使用する辞書
    pub fn new(dictionary: Dictionary) -> Self {
        Self::with_options(dictionary, DeterministOptions::default())
    }

    /// 指定されたオプションでスキャナを構築します
    ///
    /// 派生インデックスはここで一度だけ計算されます。
    ///
    /// # 引数
    ///
    /// * `dictionary` - スキャンに使用する辞書
    /// * `options` - スキャンの動作を制御するオプション
    pub fn with_options(dictionary: Dictionary, options: DeterministOptions) -> Self {
        let normalized = dictionary.normalized_keys();
        let tolerant = dictionary.tolerant_keys(&normalized);
        let max_key_len = dictionary.max_key_len();
        trace!(
            "determinist indexes built: {} normalized keys, max key len {}",
            normalized.len(),
            max_key_len
        );
        Self {
            dictionary,
            normalized,
            tolerant,
            max_key_len,
            options,
            delimiters: None,
            picker: Picker,
        }
    }

    /// 現在のオプションを返します
    #[inline(always)]
    pub fn options(&self) -> DeterministOptions {
        self.options
    }

    /// オプションを設定します
    ///
    /// パイプラインに組み込む前に呼び出してください。
    pub fn set_options(&mut self, options: DeterministOptions) {
        self.options = options;
    }

    /// カスタムのデリミタ文字集合を設定します
    ///
    /// `allow_partial_match`が`false`の場合に何が「表記境界」と
    /// みなされるかに影響します。Unicode空白は設定にかかわらず常に
    /// 暗黙のデリミタです。デフォルト(未設定)では、任意のUnicode
    /// 空白または句読点がデリミタとして機能します。
    ///
    /// # 引数
    ///
    /// * `delimiters` - デリミタとして扱う文字の集合
    pub fn set_delimiters<I>(&mut self, delimiters: I)
    where
        I: IntoIterator<Item = char>,
    {
        self.delimiters = Some(delimiters.into_iter().collect());
    }

    /// 文字がデリミタかどうかを判定します
    ///
    /// Unicode空白は常にデリミタです。
    #[inline]
    fn is_delimiter(&self, c: char) -> bool {
        if c.is_whitespace() {
            return true;
        }
        match &self.delimiters {
            Some(set) => set.contains(&c),
            None => c.general_category_group() == GeneralCategoryGroup::Punctuation,
        }
    }

    /// テキストをスキャンして新しい結果を返します
    ///
    /// `text`を空の[`Transcription`]に包んで[`Determinist::apply`]を
    /// 呼び出す簡易メソッドです。
    pub fn scan(&self, text: &str) -> Transcription {
        self.apply_to(&Transcription::input(text))
    }

    /// 既存の結果の生スパンをスキャンし、新しい結果を返します
    ///
    /// 入力の各生スパンを現在のオプションでスキャンし、新しい
    /// フラグメントを既存のものとマージします。既存のフラグメントは
    /// そのまま保持されるため、辞書ごとに1つのDeterministを構築して
    /// 順に適用することで多段辞書パイプライン(大きな語彙 →
    /// フォールバックの書記素)を実現できます。後段は前段が残した
    /// 生スパンのみを処理します。
    ///
    /// 適用後のフラグメントは`(pos昇順, len降順, confidence降順,
    /// variant昇順)`で大域的に整列されています。
    pub fn apply_to(&self, input: &Transcription) -> Transcription {
        let mut out = input.clone();

        // Strict pass over the current raw spans.
        let mut found = Vec::new();
        for span in out.raw_texts() {
            self.scan_span(&span, Pass::Strict, &mut found);
        }
        out.fragments.extend(found);

        // Tolerant pass over whatever the strict pass left raw.
        if self.options.diacritic_insensitive && !self.tolerant.is_empty() {
            let mut found = Vec::new();
            for span in out.raw_texts() {
                self.scan_span(&span, Pass::Tolerant, &mut found);
            }
            out.fragments.extend(found);
        }

        sort_fragments(&mut out.fragments);
        out
    }

    /// キャンセル可能なストリーミング版の適用です
    ///
    /// ちょうど1つの結果をチャネルに送出した後、チャネルをクローズ
    /// します。キャンセルは計算の前と送出の前に観測されます。
    /// 同期の[`Determinist::apply_to`]は中断できないため、キャンセルが
    /// 必要な呼び出し側はこちらを使用してください。
    ///
    /// # 引数
    ///
    /// * `token` - キャンセル通知用のトークン
    /// * `input` - 処理対象の結果
    pub fn stream_apply(
        self: Arc<Self>,
        token: CancellationToken,
        input: Transcription,
    ) -> Receiver<Transcription> {
        stream_one(self, token, input)
    }

    /// 1つの生スパンを貪欲最長一致でスキャンします
    ///
    /// 一致が空白文字で始まること、終わることはありません。一致の
    /// 間の空白は寛容モードでも常に生テキストのままです。
    fn scan_span(&self, span: &RawText, pass: Pass, out: &mut Vec<Fragment>) {
        let chars: Vec<char> = span.text.chars().collect();
        let n = chars.len();
        if n == 0 || self.max_key_len == 0 {
            return;
        }

        let (key_map, pass_confidence) = match pass {
            Pass::Strict => (&self.normalized, STRICT_PASS_CONFIDENCE),
            Pass::Tolerant => (&self.tolerant, TOLERANT_PASS_CONFIDENCE),
        };

        let mut i = 0;
        while i < n {
            if chars[i].is_whitespace() {
                i += 1;
                continue;
            }

            let mut matched = false;
            let max_len = self.max_key_len.min(n - i);
            for l in (1..=max_len).rev() {
                // Matches never end on whitespace.
                if chars[i + l - 1].is_whitespace() {
                    continue;
                }
                if !self.options.allow_partial_match {
                    // The candidate must coincide with expression boundaries.
                    if i > 0 && !self.is_delimiter(chars[i - 1]) {
                        continue;
                    }
                    if i + l < n && !self.is_delimiter(chars[i + l]) {
                        continue;
                    }
                }

                let candidate: String = chars[i..i + l].iter().collect();
                let normalized_candidate = match pass {
                    Pass::Strict => normalize(&candidate),
                    Pass::Tolerant => tolerant_normalize(&candidate),
                };
                let Some(keys) = key_map.get(&normalized_candidate) else {
                    continue;
                };
                let variants = self
                    .picker
                    .pick_all(&self.dictionary, keys, &candidate, &span.text);
                if variants.is_empty() {
                    continue;
                }

                for (variant, v) in variants.into_iter().enumerate() {
                    out.push(Fragment {
                        phonetized: v.phonetized,
                        pos: span.pos + i,
                        len: l,
                        confidence: pass_confidence * v.confidence,
                        variant,
                    });
                }
                i += l;
                matched = true;
                break;
            }

            if !matched {
                i += 1;
            }
        }
    }
}

impl Processor for Determinist {
    fn apply(&self, input: Transcription) -> Transcription {
        self.apply_to(&input)
    }
}
