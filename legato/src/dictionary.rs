//! 発音辞書モジュール
//!
//! このモジュールは、表記(Expression)から発音(Phonetized)のリストへの
//! マッピングと、スキャナが利用する派生インデックスを提供します。
//! 主な機能として以下を提供します:
//!
//! - 完全一致による発音の検索
//! - 正規化キーマップと寛容キーマップの構築
//! - キーの最大文字数の報告(スキャナの候補長の上限)
//! - 音声シンボルのインベントリとサンプル表記の列挙
//! - 複数ソースのマージ用アキュムレータ([`Representation`])
//!
//! 辞書はローダフレームワーク([`loader`])経由で一度構築された後は
//! 不変として扱われます。派生インデックスの計算は大きな語彙では
//! 支配的なコストになるため、スキャナが構築時に一度だけ行います。

pub mod binary;
pub mod line_loader;
pub mod loader;
pub mod piped;
pub mod slashed;

use hashbrown::{HashMap, HashSet};

use crate::normalize::{normalize, split_symbols, tolerant_normalize};

pub use crate::dictionary::binary::BinaryLoader;
pub use crate::dictionary::line_loader::LineLoader;
pub use crate::dictionary::loader::{
    load_blobs, load_into, load_paths, register_loader, Kind, Loader, Registry,
};

/// 書記素の並びをUTF-8文字列としてエンコードした辞書キー
pub type Expression = String;

/// 対象表記法(IPA/extIPA、SAMPAなど)による発音文字列
///
/// コアはこの文字列を解釈しません。
pub type Phonetized = String;

/// 正規化形から、その正規化形を共有する元のキーのリストへのマップ
pub type KeyMap = HashMap<String, Vec<Expression>>;

/// 表記から発音リストへのマッピングを保持する発音辞書
///
/// リスト内の順序は優先度を表し、先頭が第一発音です。キーは一意です。
/// 大文字小文字と前後の空白は[`normalize`]を通してのみ意味を持ちます。
///
/// # 例
///
/// ```
/// use legato::Dictionary;
///
/// let mut dict = Dictionary::new();
/// dict.insert("benoit", vec!["bənwa".to_string()]);
/// assert_eq!(dict.lookup("benoit"), Some(&["bənwa".to_string()][..]));
/// assert_eq!(dict.lookup("Benoit"), None);
/// ```
#[derive(Default, Clone, Debug, PartialEq)]
pub struct Dictionary {
    entries: HashMap<Expression, Vec<Phonetized>>,
}

impl Dictionary {
    /// 新しい空の辞書を生成します
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定された容量で空の辞書を生成します
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
        }
    }

    /// 表記に対する発音リストを設定します
    ///
    /// 既存のエントリは置き換えられます。
    pub fn insert<S>(&mut self, expression: S, phonetizations: Vec<Phonetized>)
    where
        S: Into<Expression>,
    {
        self.entries.insert(expression.into(), phonetizations);
    }

    /// 表記に対する発音リストを完全一致で検索します
    ///
    /// # 引数
    ///
    /// * `expression` - 検索する表記
    ///
    /// # 戻り値
    ///
    /// 発音リストへの参照。エントリが存在しない場合は`None`
    #[inline(always)]
    pub fn lookup(&self, expression: &str) -> Option<&[Phonetized]> {
        self.entries.get(expression).map(Vec::as_slice)
    }

    /// エントリ数を返します
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 辞書が空かどうかを返します
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// すべての(表記, 発音リスト)ペアのイテレータを返します
    ///
    /// 順序は不定です。
    pub fn iter(&self) -> impl Iterator<Item = (&Expression, &Vec<Phonetized>)> {
        self.entries.iter()
    }

    /// 正規化キーマップを構築します
    ///
    /// 各正規化形([`normalize`]による)に対して、その正規化形を共有する
    /// 元のキーのリストを返します。
    pub fn normalized_keys(&self) -> KeyMap {
        let mut keys = KeyMap::new();
        for k in self.entries.keys() {
            keys.entry(normalize(k)).or_default().push(k.clone());
        }
        keys
    }

    /// 寛容キーマップを構築します
    ///
    /// 正規化キーマップを[`tolerant_normalize`]で再インデックスし、
    /// ダイアクリティカルマークを除去した形から元のキーへのマップを
    /// 返します。
    ///
    /// # 引数
    ///
    /// * `normalized` - [`Self::normalized_keys`]で構築したキーマップ
    pub fn tolerant_keys(&self, normalized: &KeyMap) -> KeyMap {
        let mut keys = KeyMap::new();
        for (nk, originals) in normalized {
            keys.entry(tolerant_normalize(nk))
                .or_default()
                .extend(originals.iter().cloned());
        }
        keys
    }

    /// キーの最大長(文字数)を返します
    ///
    /// 貪欲最長一致スキャンにおける候補部分文字列の長さの上限として
    /// スキャナが使用します。
    pub fn max_key_len(&self) -> usize {
        self.entries
            .keys()
            .map(|k| k.chars().count())
            .max()
            .unwrap_or(0)
    }

    /// 辞書に出現するすべての音声シンボルを返します
    ///
    /// シンボルは基底文字とそれに続く結合記号の並びです。
    /// 返されるリストはソートされていません。
    pub fn symbols(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        for prons in self.entries.values() {
            for p in prons {
                for sym in split_symbols(p) {
                    seen.insert(sym);
                }
            }
        }
        seen.into_iter().collect()
    }

    /// 各音声シンボルについて、それを使用するキーを1つ返します
    ///
    /// 複数のキーが同じシンボルを含む場合、(バイト長で)最短のキーが
    /// 選ばれます。長さが等しい場合は先に観測されたキーが保持されます。
    /// 発音ではなくキー(正書法の表記)の長さで比較する点に注意してください。
    pub fn symbols_with_sample(&self) -> HashMap<String, Expression> {
        let mut res: HashMap<String, Expression> = HashMap::new();
        for (key, prons) in &self.entries {
            for p in prons {
                for sym in split_symbols(p) {
                    match res.get(&sym) {
                        None => {
                            res.insert(sym, key.clone());
                        }
                        Some(existing) if key.len() < existing.len() => {
                            res.insert(sym, key.clone());
                        }
                        Some(_) => {}
                    }
                }
            }
        }
        res
    }

    /// 発音を末尾に追加します(マージエンジン用)
    pub(crate) fn push_phonetization(&mut self, expression: &str, p: Phonetized) {
        self.entries
            .entry_ref(expression)
            .or_default()
            .push(p);
    }

    /// 発音を先頭に挿入します(マージエンジン用)
    pub(crate) fn prepend_phonetization(&mut self, expression: &str, p: Phonetized) {
        self.entries
            .entry_ref(expression)
            .or_default()
            .insert(0, p);
    }

    /// 既存の発音リストを破棄して空にします(Replaceマージ用)
    ///
    /// 破棄された発音を返します。
    pub(crate) fn discard_phonetizations(&mut self, expression: &str) -> Vec<Phonetized> {
        match self.entries.get_mut(expression) {
            Some(prons) => std::mem::take(prons),
            None => Vec::new(),
        }
    }
}

impl FromIterator<(Expression, Vec<Phonetized>)> for Dictionary {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (Expression, Vec<Phonetized>)>,
    {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// 複数ソースのマージ時に同じ表記が現れた場合の結合規則
///
/// ロード呼び出しごとに選択され、構築中のアキュムレータと新しい各
/// ソースの間でペアワイズに適用されます。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// 新しい発音を既存の発音の後に追加します
    #[default]
    Append,

    /// 新しい発音を既存の発音の前に挿入します
    Prepend,

    /// 既にロード済みの表記のエントリは変更しません。新しい発音は
    /// まだ存在しない表記に対してのみ追加されます
    NoOverride,

    /// ロード済みの表記が新しいソースに初めて現れた時点で、既存の
    /// 発音を破棄してから新しい発音をAppendとして追加します
    Replace,
}

/// スキャナとローダが使用する内部辞書表現
///
/// 成長中の辞書に加えて、全ソースにわたる(表記, 発音)ペアの重複排除
/// 集合と、ロード済みソース由来の表記の集合を保持します。後者は
/// [`MergeMode`]の判定に使用されます。
///
/// ロード中はシングルスレッドで使用される前提であり、並行ローダ間で
/// 共有してはいけません。
#[derive(Default, Debug)]
pub struct Representation {
    entries: Dictionary,
    seen_pairs: HashSet<(Expression, Phonetized)>,
    preloaded: HashSet<Expression>,
}

impl Representation {
    /// 空のRepresentationを生成します
    pub fn new() -> Self {
        Self {
            entries: Dictionary::with_capacity(1 << 12),
            seen_pairs: HashSet::with_capacity(1 << 14),
            preloaded: HashSet::new(),
        }
    }

    /// 蓄積された辞書への参照を返します
    #[inline(always)]
    pub fn entries(&self) -> &Dictionary {
        &self.entries
    }

    /// 蓄積された辞書を取り出して消費します
    pub fn into_entries(self) -> Dictionary {
        self.entries
    }

    /// ローダを実行し、マージ規則と全ソース横断の重複排除を適用します
    ///
    /// ソースの読み込みが完了した後、そのソースが提供したすべての表記を
    /// 「ロード済み」として記録します。次のソースのマージ判定はこの
    /// 集合に基づきます。
    pub(crate) fn absorb(
        &mut self,
        loader: &dyn Loader,
        mode: MergeMode,
        rdr: &mut dyn std::io::BufRead,
    ) -> crate::errors::Result<()> {
        let mut dataset_expressions: HashSet<Expression> = HashSet::new();
        // Used only in MergeMode::Replace.
        let mut replaced: HashSet<Expression> = HashSet::new();

        let entries = &mut self.entries;
        let seen_pairs = &mut self.seen_pairs;
        let preloaded = &self.preloaded;

        let mut emit = |expression: &str, phones: Vec<String>| -> crate::errors::Result<()> {
            let expression = expression.trim();
            if expression.is_empty() || phones.is_empty() {
                return Ok(());
            }
            dataset_expressions.insert(expression.to_string());

            // In NoOverride mode, expressions that already exist in the
            // preloaded dictionary are left untouched.
            if mode == MergeMode::NoOverride && preloaded.contains(expression) {
                return Ok(());
            }

            // In Replace mode, the first time we see an expression that comes
            // from the existing preloaded dictionary, discard its current
            // pronunciations and start fresh.
            if mode == MergeMode::Replace
                && preloaded.contains(expression)
                && !replaced.contains(expression)
            {
                for old in entries.discard_phonetizations(expression) {
                    seen_pairs.remove(&(expression.to_string(), old));
                }
                replaced.insert(expression.to_string());
            }

            for p in phones {
                let p = p.trim();
                if p.is_empty() {
                    continue;
                }
                let pair = (expression.to_string(), p.to_string());
                if seen_pairs.contains(&pair) {
                    continue;
                }
                seen_pairs.insert(pair);

                match mode {
                    MergeMode::Prepend => entries.prepend_phonetization(expression, p.to_string()),
                    // Append mode, including NoOverride and Replace.
                    _ => entries.push_phonetization(expression, p.to_string()),
                }
            }
            Ok(())
        };

        loader.load(rdr, &mut emit)?;

        self.preloaded.extend(dataset_expressions);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::dict;

    #[test]
    fn test_lookup_is_exact() {
        let d = dict! { "Font" => ["F"] };
        assert_eq!(d.lookup("Font"), Some(&["F".to_string()][..]));
        assert_eq!(d.lookup("font"), None);
    }

    #[test]
    fn test_normalized_keys_groups_case_variants() {
        let d = dict! {
            "Benoit" => ["bənwa"],
            "benoit" => ["benwa"],
            "le" => ["lə"],
        };
        let keys = d.normalized_keys();
        let mut group = keys["benoit"].clone();
        group.sort();
        assert_eq!(group, ["Benoit", "benoit"]);
        assert_eq!(keys["le"], ["le"]);
    }

    #[test]
    fn test_tolerant_keys_reindexes_normalized() {
        let d = dict! {
            "garçon" => ["garsɔ̃"],
            "garcon" => ["garso"],
        };
        let normalized = d.normalized_keys();
        let tolerant = d.tolerant_keys(&normalized);
        let mut group = tolerant["garcon"].clone();
        group.sort();
        assert_eq!(group, ["garcon", "garçon"]);
    }

    #[test]
    fn test_max_key_len_counts_runes() {
        let d = dict! {
            "東京" => ["T1"],
            "a" => ["A"],
        };
        assert_eq!(d.max_key_len(), 2);
        assert_eq!(Dictionary::new().max_key_len(), 0);
    }

    #[test]
    fn test_symbols_with_sample_prefers_shortest_key() {
        let d = dict! {
            "à aucun prix" => ["aokœ̃pʁi"],
            "à" => ["a"],
        };
        let samples = d.symbols_with_sample();
        // Both entries contain the symbol "a"; the shortest key wins.
        assert_eq!(samples["a"], "à");
        // "œ̃" is a single symbol (base + combining mark).
        assert_eq!(samples["œ̃"], "à aucun prix");
    }

    #[test]
    fn test_symbols_unique() {
        let d = dict! { "aa" => ["aaa"], "b" => ["ab"] };
        let mut syms = d.symbols();
        syms.sort();
        assert_eq!(syms, ["a", "b"]);
    }
}
