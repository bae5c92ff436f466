//! 文字列正規化ユーティリティ
//!
//! 辞書キーの照合に使用される2種類の正規化関数を提供します:
//!
//! - [`normalize`]: 前後の空白を除去し、小文字に変換する厳密な正規化
//! - [`tolerant_normalize`]: 正準分解後に結合記号を除去する寛容な正規化
//!
//! どちらの正規化も冪等であり、厳密な等価性は寛容な等価性を含意します。

use unicode_normalization::UnicodeNormalization;
use unicode_properties::{GeneralCategory, UnicodeGeneralCategory};

/// 辞書キーの照合に使用される厳密な正規化を行います。
///
/// 前後のUnicode空白を除去し、小文字に変換します。
///
/// # 引数
///
/// * `s` - 正規化する文字列
///
/// # 戻り値
///
/// 正規化された文字列
///
/// # 例
///
/// ```
/// use legato::normalize::normalize;
///
/// assert_eq!(normalize("  Benoit "), "benoit");
/// assert_eq!(normalize("GARÇON"), "garçon");
/// ```
pub fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// ダイアクリティカルマークの違いを無視する寛容な正規化を行います。
///
/// 正準分解(NFD)を適用し、すべての非スペーシング結合記号を除去した後、
/// [`normalize`]を適用します。これにより`"garçon"`と`"garcon"`が
/// 等価になります。
///
/// # 引数
///
/// * `s` - 正規化する文字列
///
/// # 戻り値
///
/// 正規化された文字列
///
/// # 例
///
/// ```
/// use legato::normalize::tolerant_normalize;
///
/// assert_eq!(tolerant_normalize("garçon"), "garcon");
/// assert_eq!(tolerant_normalize("Déjà"), "deja");
/// ```
pub fn tolerant_normalize(s: &str) -> String {
    let stripped: String = s.nfd().filter(|&c| !is_nonspacing_mark(c)).collect();
    normalize(&stripped)
}

/// 非スペーシング結合記号(Unicodeカテゴリ Mn)かどうかを判定します。
#[inline(always)]
pub(crate) fn is_nonspacing_mark(c: char) -> bool {
    matches!(c.general_category(), GeneralCategory::NonspacingMark)
}

/// 音声文字列を「シンボル」単位に分割します。
///
/// ここでのシンボルは、基底文字とそれに続く結合記号(カテゴリ Mn)の
/// 並びとして定義されます。これにより、複数の文字にエンコードされる
/// `"œ̃"`のような列を1つの単位として扱えます。
///
/// シンボルインベントリの構築にのみ使用されます。
pub(crate) fn split_symbols(p: &str) -> Vec<String> {
    let mut symbols = Vec::new();
    let mut buf = String::new();

    for c in p.chars() {
        if buf.is_empty() {
            // start a new symbol
            buf.push(c);
            continue;
        }
        // combining marks (Mn) are attached to the current symbol
        if is_nonspacing_mark(c) {
            buf.push(c);
            continue;
        }
        // new base rune: flush the previous symbol and start a new one
        symbols.push(std::mem::take(&mut buf));
        buf.push(c);
    }

    if !buf.is_empty() {
        symbols.push(buf);
    }
    symbols
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_and_lowercases() {
        assert_eq!(normalize("  Le GrosBenoit \t"), "le grosbenoit");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \u{00a0} "), "");
    }

    #[test]
    fn test_normalize_idempotent() {
        for s in ["  Benoit ", "GARÇON", "Déjà Vu", "œuf", ""] {
            assert_eq!(normalize(&normalize(s)), normalize(s));
            assert_eq!(
                tolerant_normalize(&tolerant_normalize(s)),
                tolerant_normalize(s)
            );
        }
    }

    #[test]
    fn test_tolerant_strips_diacritics() {
        assert_eq!(tolerant_normalize("garçon"), "garcon");
        assert_eq!(tolerant_normalize("étaient"), "etaient");
        assert_eq!(tolerant_normalize("À"), "a");
    }

    #[test]
    fn test_strict_equality_implies_tolerant_equality() {
        let pairs = [("Benoit", "  benoit"), ("GARÇON", "garçon")];
        for (a, b) in pairs {
            assert_eq!(normalize(a), normalize(b));
            assert_eq!(tolerant_normalize(a), tolerant_normalize(b));
        }
    }

    #[test]
    fn test_split_symbols_groups_combining_marks() {
        // "ɔ̃" is U+0254 followed by U+0303 and must stay one symbol.
        assert_eq!(split_symbols("garsɔ̃"), ["g", "a", "r", "s", "ɔ̃"]);
        assert_eq!(split_symbols(""), Vec::<String>::new());
        assert_eq!(split_symbols("a"), ["a"]);
    }
}
