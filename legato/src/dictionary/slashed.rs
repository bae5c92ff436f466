//! スラッシュ区切りテキスト形式
//!
//! 発音をスラッシュで囲む外部のテキスト辞書形式を検出・解析します:
//!
//! ```text
//! expression\t/phon/
//! expression   /phon1/;/phon2/
//! ```
//!
//! 表記と最初の`/.../`の間の区切りはタブまたは任意の空白です。
//! 複数の発音の間には`;`や`,`、空白などスラッシュを含まない任意の
//! 内容を置けます。

use crate::dictionary::line_loader::LineLoader;
use crate::dictionary::loader::Kind;
use crate::errors::Result;
use crate::utils::{logical_lines, strip_inline_comment_and_trim};

/// スラッシュ区切りテキスト形式の種別識別子
pub const KIND_SLASHED_TEXT: Kind = Kind("slashed_txt");

/// スラッシュ区切りテキスト形式のローダを構築します
pub fn slashed_text_loader() -> LineLoader {
    LineLoader::new(KIND_SLASHED_TEXT, sniff_slashed_text, parse_slashed_text_line)
}

/// スラッシュ区切りテキスト形式を検出します
///
/// コメントと空行を読み飛ばし、最初のデータ行が「空でない表記 +
/// `/.../`」の形をしていれば認識します。1行の確認で分類には十分です。
fn sniff_slashed_text(sniff: &[u8], _is_eof: bool) -> bool {
    if sniff.is_empty() {
        return false;
    }
    let text = String::from_utf8_lossy(sniff);
    for raw_line in logical_lines(&text) {
        let line = strip_inline_comment_and_trim(raw_line);
        if line.is_empty() {
            continue;
        }

        let Some(first_slash) = line.find('/') else {
            return false;
        };
        if first_slash == 0 {
            // A slash as first char cannot be a valid "expression /phones/" line.
            return false;
        }
        if line[..first_slash].trim().is_empty() {
            return false;
        }
        // There must be at least one more slash after the first.
        return line[first_slash + 1..].contains('/');
    }
    false
}

/// スラッシュ区切りテキスト形式の1行を解析します
///
/// ```text
/// <表記> <空白またはタブ> /phon/            # 単一形
/// <表記> <空白またはタブ> /phon1/;/phon2/   # ';'区切り
/// <表記> <空白またはタブ> /phon1/ , /phon2  # ','区切り
/// ```
///
/// 2つの発音セグメントの間の内容は無視されます。たとえば
/// `"/p1/;/p2/"`と`"/p1/ , /p2"`はどちらも`p1`と`p2`の2形を
/// 生成します。表記は前後の空白を除去されます。
fn parse_slashed_text_line(line: &str) -> Result<Option<(String, Vec<String>)>> {
    let Some(first_slash) = line.find('/') else {
        return Ok(None);
    };
    if first_slash == 0 {
        return Ok(None);
    }

    let expression = line[..first_slash].trim();
    if expression.is_empty() {
        return Ok(None);
    }

    let raw = line[first_slash..].trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let mut phones = Vec::new();
    let mut rest = raw;

    // Extract segments between /.../, ignoring anything in between.
    while let Some(start) = rest.find('/') {
        let after = &rest[start + 1..];
        let segment = match after.find('/') {
            // No closing slash: treat everything after start as the last form.
            None => {
                let segment = after;
                rest = "";
                segment
            }
            Some(next) => {
                let segment = &after[..next];
                rest = &after[next + 1..];
                segment
            }
        };

        let phone = segment.trim();
        if !phone.is_empty() {
            phones.push(phone.to_string());
        }
        if rest.is_empty() {
            break;
        }
    }

    // Fallback: if nothing was extracted using /.../, treat the whole
    // right-hand side as a single phonetic string, optionally removing one
    // surrounding pair of slashes.
    if phones.is_empty() {
        let mut trimmed = raw;
        if trimmed.starts_with('/') && trimmed.ends_with('/') && trimmed.len() > 2 {
            trimmed = &trimmed[1..trimmed.len() - 1];
        }
        let trimmed = trimmed.trim();
        if !trimmed.is_empty() {
            phones.push(trimmed.to_string());
        }
    }

    if phones.is_empty() {
        return Ok(None);
    }
    Ok(Some((expression.to_string(), phones)))
}
