//! 変換結果の表現
//!
//! このモジュールは、スキャン結果を表す値型を提供します:
//!
//! - [`Transcription`]: 元テキストとフラグメントのリスト
//! - [`Fragment`]: 一致したスパンと1つの発音バリアント
//! - [`RawText`]: どのフラグメントにも覆われていない連続領域
//!
//! すべての位置と長さは、バイトではなく文字(rune)単位で表現されます。
//! これにより、マルチバイト列や結合記号をまたいでも位置が安定します。
//! 生スパンはテキストとフラグメントから必要に応じて導出されます。

/// 入力テキスト中の一致スパンと1つの発音バリアントの組
///
/// 同じ`(pos, len)`を共有する複数のフラグメントはバリアントであり、
/// `variant`はピッカーの出力順に対応する0始まりの添字です。
/// `confidence`は`[0, 1]`の範囲です。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fragment {
    /// 対象表記法による発音文字列
    pub phonetized: String,
    /// 元テキスト中の先頭文字位置(文字単位)
    pub pos: usize,
    /// 元テキスト中の表記の長さ(文字数)
    pub len: usize,
    /// 結果の信頼度
    pub confidence: f64,
    /// 同一スパンを共有するバリアント内での添字(0始まり)
    pub variant: usize,
}

/// どのフラグメントにも覆われていない入力の連続領域
#[derive(Debug, Clone, PartialEq)]
pub struct RawText {
    /// 領域のテキスト
    pub text: String,
    /// 元テキスト中の先頭文字位置(文字単位)
    pub pos: usize,
    /// 領域の長さ(文字数)
    pub len: usize,
}

/// 1回の変換の結果
///
/// 元テキストとフラグメントのリストを保持する不変の値です。
/// 各プロセッサは新しい`Transcription`を返し、既存の値を変更しません。
///
/// # 例
///
/// ```
/// use legato::Transcription;
///
/// let t = Transcription::input("Le GrosBenoit");
/// let raw = t.raw_texts();
/// assert_eq!(raw.len(), 1);
/// assert_eq!(raw[0].text, "Le GrosBenoit");
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Transcription {
    /// 元の入力テキスト
    pub text: String,
    /// 一致したフラグメントのリスト
    pub fragments: Vec<Fragment>,
}

impl Transcription {
    /// フラグメントを持たない初期のTranscriptionを生成します
    ///
    /// パイプラインの最初の入力として使用します。
    pub fn input<S>(text: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            text: text.into(),
            fragments: Vec::new(),
        }
    }

    /// テキストの文字数を返します
    #[inline(always)]
    pub fn len_char(&self) -> usize {
        self.text.chars().count()
    }

    /// フラグメントスパンの補集合として極大の生スパンを導出します
    ///
    /// 同一の`(pos, len)`を共有するバリアントは1つの被覆領域として
    /// 数えられます。スパンの重なりは実行時には黙って合併されます。
    /// 隣接する未一致領域は1つに統合され、フラグメントが1つもない
    /// 場合はテキスト全体が単一の生スパンになります(空テキストでは
    /// 空の結果)。
    pub fn raw_texts(&self) -> Vec<RawText> {
        let chars: Vec<char> = self.text.chars().collect();
        let n = chars.len();

        let mut spans: Vec<(usize, usize)> = self.fragments.iter().map(|f| (f.pos, f.len)).collect();
        spans.sort_unstable();
        spans.dedup();

        let mut raw = Vec::new();
        let mut cursor = 0usize;
        for (pos, len) in spans {
            if pos > cursor {
                raw.push(Self::raw_span(&chars, cursor, pos));
            }
            cursor = cursor.max(pos + len);
        }
        if cursor < n {
            raw.push(Self::raw_span(&chars, cursor, n));
        }
        raw
    }

    fn raw_span(chars: &[char], start: usize, end: usize) -> RawText {
        RawText {
            text: chars[start..end].iter().collect(),
            pos: start,
            len: end - start,
        }
    }
}

/// フラグメントを大域的な順序に整列します
///
/// 順序は`(pos昇順, len降順, confidence降順, variant昇順)`です。
pub(crate) fn sort_fragments(fragments: &mut [Fragment]) {
    fragments.sort_by(|a, b| {
        a.pos
            .cmp(&b.pos)
            .then_with(|| b.len.cmp(&a.len))
            .then_with(|| b.confidence.total_cmp(&a.confidence))
            .then_with(|| a.variant.cmp(&b.variant))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frag(pos: usize, len: usize) -> Fragment {
        Fragment {
            phonetized: "x".to_string(),
            pos,
            len,
            confidence: 1.0,
            variant: 0,
        }
    }

    #[test]
    fn test_raw_texts_without_fragments_covers_whole_text() {
        let t = Transcription::input("abc");
        assert_eq!(
            t.raw_texts(),
            [RawText {
                text: "abc".to_string(),
                pos: 0,
                len: 3
            }]
        );
        assert!(Transcription::input("").raw_texts().is_empty());
    }

    #[test]
    fn test_raw_texts_derives_gaps() {
        let mut t = Transcription::input("Le GrosBenoit");
        t.fragments = vec![frag(0, 2), frag(7, 6)];
        assert_eq!(
            t.raw_texts(),
            [RawText {
                text: " Gros".to_string(),
                pos: 2,
                len: 5
            }]
        );
    }

    #[test]
    fn test_raw_texts_collapses_variants() {
        let mut t = Transcription::input("abcd");
        // Two variants on the same span count as one covered region.
        t.fragments = vec![frag(1, 2), frag(1, 2)];
        let raw = t.raw_texts();
        assert_eq!(raw.len(), 2);
        assert_eq!((raw[0].pos, raw[0].len), (0, 1));
        assert_eq!((raw[1].pos, raw[1].len), (3, 1));
    }

    #[test]
    fn test_raw_texts_unions_overlaps() {
        let mut t = Transcription::input("abcdef");
        t.fragments = vec![frag(0, 4), frag(2, 2)];
        let raw = t.raw_texts();
        assert_eq!(raw.len(), 1);
        assert_eq!((raw[0].pos, raw[0].len), (4, 2));
    }

    #[test]
    fn test_raw_texts_uses_rune_positions() {
        let mut t = Transcription::input("東京大学");
        t.fragments = vec![frag(0, 2)];
        let raw = t.raw_texts();
        assert_eq!(raw, [RawText { text: "大学".to_string(), pos: 2, len: 2 }]);
    }

    #[test]
    fn test_sort_fragments_global_order() {
        let mut frags = vec![
            Fragment { pos: 4, len: 1, confidence: 1.0, variant: 0, ..Default::default() },
            Fragment { pos: 0, len: 2, confidence: 0.9, variant: 1, ..Default::default() },
            Fragment { pos: 0, len: 2, confidence: 1.0, variant: 0, ..Default::default() },
            Fragment { pos: 0, len: 3, confidence: 0.5, variant: 0, ..Default::default() },
        ];
        sort_fragments(&mut frags);
        let order: Vec<(usize, usize, usize)> =
            frags.iter().map(|f| (f.pos, f.len, f.variant)).collect();
        assert_eq!(order, [(0, 3, 0), (0, 2, 0), (0, 2, 1), (4, 1, 0)]);
    }
}
