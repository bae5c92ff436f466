//! 内部ユーティリティ関数
//!
//! テキスト形式の辞書ローダが共有するコメント除去処理と、
//! テスト用のマクロが含まれています。

/// 行からインラインコメントを除去し、前後の空白を取り除きます。
///
/// `#`で始まる行は全体がコメントであり、空文字列を返します。
/// 空白に続く`#`以降はインラインコメントとして行末まで無視されます。
/// 空行や純粋なコメント行は空文字列になります。
pub(crate) fn strip_inline_comment_and_trim(line: &str) -> &str {
    let line = line.trim();
    if line.starts_with('#') {
        return "";
    }
    let mut prev_ws = false;
    for (i, c) in line.char_indices() {
        if c == '#' && prev_ws {
            return line[..i].trim_end();
        }
        prev_ws = c.is_whitespace();
    }
    line
}

/// LF、CRLF、CRのいずれの行末でも論理行に分割します。
///
/// CRLFは2つの区切りとして扱われ、間に空行が生じますが、
/// 呼び出し側はどのみち空行を読み飛ばします。
pub(crate) fn logical_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split(['\n', '\r'])
}

#[cfg(test)]
/// 辞書リテラルを簡潔に記述するためのマクロ
///
/// キーと発音のリストを`=>`演算子で指定します。
///
/// # 例
///
/// ```ignore
/// let dict = dict! {
///     "le" => ["lə"],
///     "benoit" => ["bənwa", "benwa"],
/// };
/// ```
///
/// # 注意
///
/// このマクロはテスト時のみ利用可能です。
macro_rules! dict {
    ( $($k:expr => [$($p:expr),* $(,)?],)* ) => {
        {
            #[allow(unused_mut)]
            let mut d = $crate::dictionary::Dictionary::new();
            $(
                d.insert($k, vec![$($p.to_string()),*]);
            )*
            d
        }
    };
    ( $($k:expr => [$($p:expr),* $(,)?]),* ) => {
        $crate::utils::dict![$( $k => [$($p),*], )*]
    };
}

#[cfg(test)]
pub(crate) use dict;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_inline_comment() {
        assert_eq!(strip_inline_comment_and_trim("# full comment"), "");
        assert_eq!(strip_inline_comment_and_trim("   "), "");
        assert_eq!(strip_inline_comment_and_trim("a\tb # trailing"), "a\tb");
        // '#' not preceded by whitespace is kept as data
        assert_eq!(strip_inline_comment_and_trim("a\tb#c"), "a\tb#c");
    }

    #[test]
    fn test_logical_lines_handles_all_terminators() {
        let lines: Vec<&str> = logical_lines("a\nb\r\nc\rd")
            .filter(|l| !l.is_empty())
            .collect();
        assert_eq!(lines, ["a", "b", "c", "d"]);
    }
}
