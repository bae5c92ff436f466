//! パイプ区切りテキスト形式
//!
//! ネイティブのタブ区切り辞書形式を検出・解析します:
//!
//! ```text
//! <表記>\t<発音1> | <発音2> | ...
//! ```
//!
//! 発音文字列の表記法は任意です。

use crate::dictionary::line_loader::LineLoader;
use crate::dictionary::loader::Kind;
use crate::errors::Result;
use crate::utils::{logical_lines, strip_inline_comment_and_trim};

/// パイプ区切りテキスト形式の種別識別子
pub const KIND_PIPED_TEXT: Kind = Kind("piped_txt");

/// パイプ区切りテキスト形式のローダを構築します
pub fn piped_text_loader() -> LineLoader {
    LineLoader::new(KIND_PIPED_TEXT, sniff_piped_text, parse_piped_text_line)
}

/// パイプ区切りテキスト形式を検出します
///
/// 先頭の2データ行がタブで2フィールドに分かれ、右辺が`/`で終わって
/// いないことを確認します。コメント行と空行は読み飛ばします。
fn sniff_piped_text(sniff: &[u8], _is_eof: bool) -> bool {
    if sniff.is_empty() {
        return false;
    }
    let text = String::from_utf8_lossy(sniff);
    let mut remaining = 2; // examine up to 2 data lines
    for raw_line in logical_lines(&text) {
        let line = strip_inline_comment_and_trim(raw_line);
        if line.is_empty() {
            continue;
        }
        let Some((_, rhs)) = line.split_once('\t') else {
            return false;
        };
        if rhs.contains('\t') || rhs.trim_end().ends_with('/') {
            return false;
        }
        remaining -= 1;
        if remaining == 0 {
            break;
        }
    }
    true
}

/// パイプ区切りテキスト形式の1行を解析します
///
/// 表記は前後の空白を除去され、発音は`|`で分割された後それぞれ
/// 除去されます。どちらかが空になる行は無視されます。
fn parse_piped_text_line(line: &str) -> Result<Option<(String, Vec<String>)>> {
    let Some((word, raw_prons)) = line.split_once('\t') else {
        return Ok(None);
    };
    let word = word.trim();
    let raw_prons = raw_prons.trim();
    if word.is_empty() || raw_prons.is_empty() {
        return Ok(None);
    }

    let prons: Vec<String> = raw_prons
        .split('|')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();
    if prons.is_empty() {
        return Ok(None);
    }
    Ok(Some((word.to_string(), prons)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_piped_line_multiple_prons() {
        let (word, prons) = parse_piped_text_line("benoit\tbənwa | benwa")
            .unwrap()
            .unwrap();
        assert_eq!(word, "benoit");
        assert_eq!(prons, ["bənwa", "benwa"]);
    }

    #[test]
    fn test_parse_piped_line_trims_fields() {
        let (word, prons) = parse_piped_text_line("  le \t l\u{0259} ").unwrap().unwrap();
        assert_eq!(word, "le");
        assert_eq!(prons, ["lə"]);
    }

    #[test]
    fn test_parse_piped_line_ignores_incomplete() {
        assert!(parse_piped_text_line("no tab here").unwrap().is_none());
        assert!(parse_piped_text_line("word\t ").unwrap().is_none());
        assert!(parse_piped_text_line("word\t | | ").unwrap().is_none());
    }

    #[test]
    fn test_sniff_piped_skips_comments() {
        let data = b"# comment line\nexpr\tphon1 | phon2\n";
        assert!(sniff_piped_text(data, true));
    }

    #[test]
    fn test_sniff_piped_rejects_slashed_rhs() {
        assert!(!sniff_piped_text(b"expr\t/p1/\n", true));
        assert!(!sniff_piped_text(b"no tab\n", true));
        assert!(!sniff_piped_text(b"", true));
    }
}
