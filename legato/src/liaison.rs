//! フランス語リエゾンの後処理プロセッサ
//!
//! 辞書ベースではない処理段がパイプラインにどう組み込まれるかを示す
//! 見本です。隣接する単語ペアの発音に、制御された条件の下でリエゾン
//! 子音を挿入します。
//!
//! 単語の分類(z/n/t/pの各クラス)、リエゾンを禁止する語、有音のh
//! (h aspiré)の例外は、キュレートされた集合として保持されます。
//! これらの集合は不変条件ではなく設定であり、ミュータで拡張できます。

use hashbrown::HashSet;

use crate::normalize::tolerant_normalize;
use crate::processor::Processor;
use crate::transcription::{Fragment, Transcription};

/// フランス語リエゾンのヒューリスティックを適用するプロセッサ
///
/// 正書法の単語列を解析し、適切な場合に`Fragment::phonetized`へ
/// リエゾン子音を挿入します。元のテキストとフラグメント座標は保存
/// されます。
///
/// # 例
///
/// ```
/// use legato::{Determinist, Dictionary, FrenchLiaison, Processor};
///
/// let mut dict = Dictionary::new();
/// dict.insert("les", vec!["le".to_string()]);
/// dict.insert("amis", vec!["ami".to_string()]);
///
/// let res = Determinist::new(dict).scan("les amis");
/// let res = FrenchLiaison::new().apply(res);
/// // The /z/ liaison is prepended to the vowel-initial right word.
/// assert_eq!(res.fragments[1].phonetized, "zami");
/// ```
pub struct FrenchLiaison {
    /// キュレートされた限定詞/代名詞/動詞/副詞の集合を超えて、より
    /// 広い語に対してリエゾン子音を推測するヒューリスティックを
    /// 有効にします
    allow_loose_liaison: bool,

    determiners_z: HashSet<String>,
    determiners_n: HashSet<String>,
    adjectives_t: HashSet<String>,
    pronouns_z: HashSet<String>,
    pronouns_n: HashSet<String>,
    verbs_t: HashSet<String>,
    adverbs_z: HashSet<String>,
    adverbs_p: HashSet<String>,

    forbid_after: HashSet<String>,
    h_aspire: HashSet<String>,
}

/// 正書法のトークン
///
/// 文字とアポストロフィの極大の並びを、文字オフセットとともに
/// 保持します。
struct OrthToken {
    text: String,
    norm: String,
    rune_start: usize,
    rune_len: usize,
    frag_index: Option<usize>,
}

impl FrenchLiaison {
    /// 保守的なリエゾンプロセッサを構築します
    ///
    /// キュレートされた文法的文脈(限定詞、代名詞、動詞など)に
    /// 対してのみリエゾン子音を挿入します。
    pub fn new() -> Self {
        Self::with_loose(false)
    }

    /// ゆるいフォールバック付きのリエゾンプロセッサを構築します
    ///
    /// 明示的にリストされていない、より広い範囲の文脈でもリエゾン
    /// 子音を推測するヒューリスティックを有効にします。
    pub fn with_loose_fallback() -> Self {
        Self::with_loose(true)
    }

    /// 内部の語彙集合を初期化します
    fn with_loose(allow_loose: bool) -> Self {
        Self {
            allow_loose_liaison: allow_loose,
            determiners_z: normalized_set(&[
                "les", "des", "mes", "tes", "ses", "nos", "vos", "leurs", "aux", "ces",
                "quelques", "toutes", "tous",
            ]),
            determiners_n: normalized_set(&["un", "une", "aucun", "plein", "mon", "ton", "son"]),
            adjectives_t: normalized_set(&["grand", "petit", "tout"]),
            pronouns_z: normalized_set(&["nous", "vous", "elles", "ils"]),
            pronouns_n: normalized_set(&["en", "on"]),
            verbs_t: normalized_set(&["est", "sont", "ait", "était", "étaient"]),
            adverbs_z: normalized_set(&["très", "tres"]),
            adverbs_p: normalized_set(&["trop"]),
            forbid_after: normalized_set(&["et"]),
            h_aspire: normalized_set(&["haricot", "honte", "héros", "heros", "huitre"]),
        }
    }

    /// 指定した語の後のリエゾンを禁止します
    pub fn forbid_liaison_after(&mut self, word: &str) {
        let norm = tolerant_normalize(word);
        if !norm.is_empty() {
            self.forbid_after.insert(norm);
        }
    }

    /// 有音のh(h aspiré)の例外語を追加します
    pub fn add_aspirated_h(&mut self, word: &str) {
        let norm = tolerant_normalize(word);
        if !norm.is_empty() {
            self.h_aspire.insert(norm);
        }
    }

    /// 1つの結果にリエゾン規則を適用します
    fn process(&self, res: Transcription) -> Transcription {
        if res.text.is_empty() || res.fragments.is_empty() {
            return res;
        }

        let mut out = res;
        let chars: Vec<char> = out.text.chars().collect();
        let mut tokens = tokenize_french_words(&chars);
        if tokens.len() < 2 {
            return out;
        }

        attach_fragments_to_tokens(&mut tokens, &out.fragments);

        for i in 0..tokens.len() - 1 {
            let (left, right) = (&tokens[i], &tokens[i + 1]);

            let (Some(left_frag), Some(right_frag)) = (left.frag_index, right.frag_index) else {
                continue;
            };
            if has_strong_boundary(&chars, left, right) {
                continue;
            }
            if self.forbid_after.contains(&left.norm) {
                continue;
            }
            if !self.starts_with_vowel_or_mute_h(&right.text) {
                continue;
            }
            let Some(phone) = self.liaison_phone_for(left) else {
                continue;
            };
            insert_liaison_consonant(&mut out.fragments, left_frag, right_frag, phone);
        }

        out
    }

    /// 右の語が母音または無音のhで始まるかを判定します
    fn starts_with_vowel_or_mute_h(&self, right: &str) -> bool {
        let norm = tolerant_normalize(right);
        if norm.is_empty() {
            return false;
        }
        for r in norm.chars() {
            if !r.is_alphabetic() {
                continue;
            }
            if r == 'h' {
                // Aspirated h blocks the liaison.
                return !self.h_aspire.contains(&norm);
            }
            return matches!(r, 'a' | 'e' | 'i' | 'o' | 'u' | 'y' | 'œ');
        }
        false
    }

    /// 左の語からリエゾン音を決定します
    fn liaison_phone_for(&self, tok: &OrthToken) -> Option<&'static str> {
        if self.forbid_after.contains(&tok.norm) {
            return None;
        }
        if self.is_liaison_giver(&tok.norm) {
            return self.guess_liaison_phone(&tok.text);
        }
        if self.allow_loose_liaison && !is_probably_proper_name(&tok.text) {
            return self.guess_liaison_phone(&tok.text);
        }
        None
    }

    /// 語がキュレートされたリエゾン供与クラスに属するかを判定します
    fn is_liaison_giver(&self, norm: &str) -> bool {
        self.determiners_z.contains(norm)
            || self.determiners_n.contains(norm)
            || self.adjectives_t.contains(norm)
            || self.pronouns_z.contains(norm)
            || self.pronouns_n.contains(norm)
            || self.verbs_t.contains(norm)
            || self.adverbs_z.contains(norm)
            || self.adverbs_p.contains(norm)
    }

    /// 語からリエゾン音を推測します
    ///
    /// まずキュレートされた集合を参照し、ゆるいフォールバックでは
    /// 最後の子音字から推測します。
    fn guess_liaison_phone(&self, word: &str) -> Option<&'static str> {
        let lower = tolerant_normalize(word);

        if self.determiners_z.contains(&lower)
            || self.pronouns_z.contains(&lower)
            || self.adverbs_z.contains(&lower)
        {
            return Some("z");
        }
        if self.determiners_n.contains(&lower) || self.pronouns_n.contains(&lower) {
            return Some("n");
        }
        if self.adjectives_t.contains(&lower) || self.verbs_t.contains(&lower) {
            return Some("t");
        }
        if self.adverbs_p.contains(&lower) {
            return Some("p");
        }

        match last_letter(&lower) {
            Some('s') | Some('x') | Some('z') => Some("z"),
            Some('n') => Some("n"),
            Some('d') | Some('t') => Some("t"),
            Some('p') => Some("p"),
            _ => None,
        }
    }
}

impl Default for FrenchLiaison {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for FrenchLiaison {
    fn apply(&self, input: Transcription) -> Transcription {
        self.process(input)
    }
}

/// テキストから正書法のトークンを抽出します
///
/// トークンは文字とアポストロフィ(`'`、`'`)の極大の並びです。
fn tokenize_french_words(chars: &[char]) -> Vec<OrthToken> {
    let n = chars.len();
    let mut tokens = Vec::with_capacity(n / 2);

    let mut in_word = false;
    let mut word_start = 0;

    for (i, &r) in chars.iter().enumerate() {
        if is_word_rune(r) {
            if !in_word {
                in_word = true;
                word_start = i;
            }
            continue;
        }
        if in_word {
            tokens.push(new_orth_token(chars, word_start, i));
            in_word = false;
        }
    }
    if in_word {
        tokens.push(new_orth_token(chars, word_start, n));
    }
    tokens
}

fn new_orth_token(chars: &[char], start: usize, end: usize) -> OrthToken {
    let text: String = chars[start..end].iter().collect();
    let norm = tolerant_normalize(&text);
    OrthToken {
        text,
        norm,
        rune_start: start,
        rune_len: end - start,
        frag_index: None,
    }
}

fn is_word_rune(r: char) -> bool {
    r.is_alphabetic() || matches!(r, '\'' | '’')
}

/// 各トークンに、スパンが正確に一致するフラグメントを関連付けます
///
/// フラグメントは位置順に整列済みであることを前提とします。一致する
/// フラグメントのないトークンはスキップされます。
fn attach_fragments_to_tokens(tokens: &mut [OrthToken], fragments: &[Fragment]) {
    if tokens.is_empty() || fragments.is_empty() {
        return;
    }

    let mut i_frag = 0;
    for tok in tokens.iter_mut() {
        while i_frag < fragments.len()
            && fragments[i_frag].pos + fragments[i_frag].len <= tok.rune_start
        {
            i_frag += 1;
        }
        if i_frag >= fragments.len() {
            return;
        }
        let frag = &fragments[i_frag];
        if frag.pos == tok.rune_start && frag.len == tok.rune_len {
            tok.frag_index = Some(i_frag);
        }
    }
}

/// 2つのトークンの間に強い境界があるかを判定します
///
/// 介在する文字に`. ? ! ; :`または改行が含まれる場合、リエゾンは
/// 成立しません。
fn has_strong_boundary(chars: &[char], left: &OrthToken, right: &OrthToken) -> bool {
    let start = left.rune_start + left.rune_len;
    let end = right.rune_start;
    if start >= end {
        return false;
    }
    chars[start..end]
        .iter()
        .any(|r| matches!(r, '.' | '?' | '!' | ';' | ':' | '\n' | '\r'))
}

/// リエゾン子音をフラグメントの発音に挿入します
///
/// 原則として右のフラグメントの発音の先頭に付加し、右の発音が空の
/// 場合のフォールバックとして左の発音の末尾に空白区切りで付加します。
fn insert_liaison_consonant(
    fragments: &mut [Fragment],
    left_frag: usize,
    right_frag: usize,
    phone: &str,
) {
    let phone = phone.trim();
    if phone.is_empty() {
        return;
    }

    let base = fragments[right_frag].phonetized.trim();
    if !base.is_empty() {
        fragments[right_frag].phonetized = format!("{phone}{base}");
        return;
    }

    let base = fragments[left_frag].phonetized.trim();
    fragments[left_frag].phonetized = if base.is_empty() {
        phone.to_string()
    } else {
        format!("{base} {phone}")
    };
}

fn last_letter(s: &str) -> Option<char> {
    s.chars().rev().find(|r| r.is_alphabetic())
}

fn is_probably_proper_name(word: &str) -> bool {
    word.chars()
        .find(|r| r.is_alphabetic())
        .is_some_and(|r| r.is_uppercase())
}

/// 語のリストを寛容正規化して集合にします
fn normalized_set(words: &[&str]) -> HashSet<String> {
    words
        .iter()
        .map(|w| tolerant_normalize(w))
        .filter(|w| !w.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::determinist::Determinist;
    use crate::utils::dict;

    fn scan(text: &str) -> Transcription {
        let d = Determinist::new(dict! {
            "les" => ["le"],
            "amis" => ["ami"],
            "et" => ["e"],
            "un" => ["œ̃"],
            "ami" => ["ami"],
            "grand" => ["gʁɑ̃"],
            "homme" => ["ɔm"],
            "haricot" => ["aʁiko"],
            "est" => ["ɛ"],
            "ici" => ["isi"],
            "chien" => ["ʃjɛ̃"],
        });
        d.scan(text)
    }

    #[test]
    fn test_z_liaison_prepended_to_right_word() {
        let res = FrenchLiaison::new().apply(scan("les amis"));
        assert_eq!(res.fragments[0].phonetized, "le");
        assert_eq!(res.fragments[1].phonetized, "zami");
        // Text and spans are preserved.
        assert_eq!(res.text, "les amis");
        assert_eq!((res.fragments[1].pos, res.fragments[1].len), (4, 4));
    }

    #[test]
    fn test_n_liaison_after_determiner() {
        let res = FrenchLiaison::new().apply(scan("un ami"));
        assert_eq!(res.fragments[1].phonetized, "nami");
    }

    #[test]
    fn test_t_liaison_after_adjective() {
        let res = FrenchLiaison::new().apply(scan("grand homme"));
        assert_eq!(res.fragments[1].phonetized, "tɔm");
    }

    #[test]
    fn test_no_liaison_after_et() {
        let res = FrenchLiaison::new().apply(scan("et ami"));
        assert_eq!(res.fragments[1].phonetized, "ami");
    }

    #[test]
    fn test_no_liaison_before_consonant() {
        let res = FrenchLiaison::new().apply(scan("les chien"));
        assert_eq!(res.fragments[1].phonetized, "ʃjɛ̃");
    }

    #[test]
    fn test_aspirated_h_blocks_liaison() {
        let res = FrenchLiaison::new().apply(scan("les haricot"));
        assert_eq!(res.fragments[1].phonetized, "aʁiko");

        // "homme" carries a mute h, so the liaison applies.
        let res = FrenchLiaison::new().apply(scan("les homme"));
        assert_eq!(res.fragments[1].phonetized, "zɔm");
    }

    #[test]
    fn test_strong_boundary_aborts_liaison() {
        let res = FrenchLiaison::new().apply(scan("les. amis"));
        // "les" followed by a period: no liaison even though "amis" starts
        // with a vowel.
        let ami = res
            .fragments
            .iter()
            .find(|f| f.phonetized.contains("ami"))
            .unwrap();
        assert_eq!(ami.phonetized, "ami");
    }

    #[test]
    fn test_verb_t_liaison() {
        let res = FrenchLiaison::new().apply(scan("est ici"));
        assert_eq!(res.fragments[1].phonetized, "tisi");
    }

    #[test]
    fn test_tokens_without_fragments_are_skipped() {
        // "inconnu" is not in the dictionary: no fragment, no liaison.
        let res = FrenchLiaison::new().apply(scan("les inconnu"));
        assert_eq!(res.fragments.len(), 1);
        assert_eq!(res.fragments[0].phonetized, "le");
    }

    #[test]
    fn test_loose_fallback_guesses_from_last_consonant() {
        // "chiens" ends with 's' and is not in the curated sets.
        let d = Determinist::new(dict! {
            "chiens" => ["ʃjɛ̃"],
            "aussi" => ["osi"],
        });
        let scanned = d.scan("chiens aussi");

        // The conservative processor does nothing.
        let res = FrenchLiaison::new().apply(scanned.clone());
        assert_eq!(res.fragments[1].phonetized, "osi");

        // The loose fallback guesses /z/ from the final 's'.
        let res = FrenchLiaison::with_loose_fallback().apply(scanned);
        assert_eq!(res.fragments[1].phonetized, "zosi");
    }

    #[test]
    fn test_loose_fallback_skips_proper_names() {
        let d = Determinist::new(dict! {
            "Benoit" => ["bənwa"],
            "aussi" => ["osi"],
        });
        let res = FrenchLiaison::with_loose_fallback().apply(d.scan("Benoit aussi"));
        assert_eq!(res.fragments[1].phonetized, "osi");
    }

    #[test]
    fn test_configured_sets_are_mutable() {
        let mut liaison = FrenchLiaison::new();
        liaison.add_aspirated_h("hibou");
        let d = Determinist::new(dict! {
            "les" => ["le"],
            "hibou" => ["ibu"],
        });
        let res = liaison.apply(d.scan("les hibou"));
        assert_eq!(res.fragments[1].phonetized, "ibu");

        let mut liaison = FrenchLiaison::new();
        liaison.forbid_liaison_after("les");
        let d = Determinist::new(dict! {
            "les" => ["le"],
            "amis" => ["ami"],
        });
        let res = liaison.apply(d.scan("les amis"));
        assert_eq!(res.fragments[1].phonetized, "ami");
    }

    #[test]
    fn test_apostrophe_words_form_single_tokens() {
        // "c'est" tokenizes as one orthographic token, apostrophe included,
        // so it can attach to its fragment and give a /t/ liaison through
        // the loose fallback (final consonant 't').
        let d = Determinist::new(dict! {
            "c'est" => ["sɛ"],
            "ici" => ["isi"],
        });
        let scanned = d.scan("c'est ici");

        let res = FrenchLiaison::new().apply(scanned.clone());
        assert_eq!(res.fragments[1].phonetized, "isi");

        let res = FrenchLiaison::with_loose_fallback().apply(scanned);
        assert_eq!(res.fragments[1].phonetized, "tisi");
    }

    #[test]
    fn test_short_or_empty_inputs_pass_through() {
        let liaison = FrenchLiaison::new();
        let empty = liaison.apply(Transcription::input(""));
        assert!(empty.fragments.is_empty());

        let single = liaison.apply(scan("les"));
        assert_eq!(single.fragments[0].phonetized, "le");
    }
}
