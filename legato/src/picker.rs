//! バリアント選択の戦略
//!
//! 与えられた表層形に対して、辞書から発音と相対的な信頼度を抽出する
//! 戦略を実装します。

use hashbrown::HashSet;

use crate::dictionary::{Dictionary, Phonetized};
use crate::normalize::normalize;

/// 信頼度が付与された発音
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedPhonetized {
    /// 発音文字列
    pub phonetized: Phonetized,
    /// `[0, 1]`の範囲のヒューリスティックな信頼度
    pub confidence: f64,
}

/// 表層形に対する発音候補の抽出戦略
///
/// 現在の実装は意図的に単純で、純粋に辞書ベースです。候補キーから
/// 到達可能なすべての異なる発音を、`[0, 1]`のヒューリスティックな
/// 信頼度とともに返します。バリアントごとの信頼度は、後でスキャナが
/// 使用するパスレベルの信頼度(厳密パス/寛容パス)と乗算されます。
#[derive(Debug, Clone, Copy, Default)]
pub struct Picker;

impl Picker {
    /// 候補キーに関連付けられたすべての異なる発音を返します
    ///
    /// 返されるリストは信頼度の降順に整列されています。現在の
    /// ヒューリスティックは意図的に単純です:
    ///
    /// - 正規化形が表層形の正規化形と一致するキーは基礎スコア1.0を
    ///   受け取ります
    /// - それ以外のキー(典型的には寛容な正規化によって持ち込まれた
    ///   もの)はわずかに減点されます(0.9)
    /// - 同じキーの2番目以降の発音は、最初の発音に比べて小さな
    ///   ペナルティを受けます(0.95)
    ///
    /// IPA固有のフィルタとして、音節区切り`.`の有無だけが異なる
    /// バリアントが両方現れた場合、より表現力のある`.`付きの形のみを
    /// 保持します。
    ///
    /// `line`引数は、スキャナを変更せずに将来の実装がより広い文脈
    /// (形態統語解析など)を考慮できるようにAPIの一部になって
    /// いますが、まだ使用されていません。
    ///
    /// # 引数
    ///
    /// * `dict` - 発音を検索する辞書
    /// * `candidate_keys` - 同じ正規化形を共有する元のキーのリスト
    /// * `surface` - 入力テキスト中の表層形
    /// * `line` - 表層スパンを含む行全体(未使用)
    pub fn pick_all(
        &self,
        dict: &Dictionary,
        candidate_keys: &[String],
        surface: &str,
        _line: &str,
    ) -> Vec<AnnotatedPhonetized> {
        if candidate_keys.is_empty() || dict.is_empty() {
            return Vec::new();
        }

        let normalized_surface = normalize(surface);

        let mut options = Vec::with_capacity(candidate_keys.len());
        let mut seen: HashSet<&str> = HashSet::new();

        for key in candidate_keys {
            let Some(prons) = dict.lookup(key) else {
                continue;
            };
            if prons.is_empty() {
                continue;
            }

            let norm_key = normalize(key);
            let key_weight = if !norm_key.is_empty() && norm_key != normalized_surface {
                // The candidate key differs from the surface once normalized,
                // which is typically the case in tolerant mode (missing or
                // mismatched diacritics). Give it a slightly lower weight.
                0.9
            } else {
                1.0
            };

            for (i, pron) in prons.iter().enumerate() {
                if pron.is_empty() {
                    continue;
                }
                if !seen.insert(pron.as_str()) {
                    // Avoid returning the exact same pronunciation twice when
                    // it appears under multiple keys.
                    continue;
                }

                let pron_weight = if i > 0 {
                    // Alternative pronunciations for the same key are kept but
                    // slightly down-weighted compared to the first one.
                    0.95
                } else {
                    1.0
                };

                options.push(AnnotatedPhonetized {
                    phonetized: pron.clone(),
                    confidence: key_weight * pron_weight,
                });
            }
        }

        if options.is_empty() {
            return options;
        }

        // IPA-specific filter, for "aimable  ɛ.mabl | ɛmabl" we retain only
        // "ɛ.mabl" which is more expressive.

        // First pass: record which "base" forms have at least one dotted variant.
        let mut dotted_by_base: HashSet<String> = HashSet::with_capacity(options.len());
        for opt in &options {
            if opt.phonetized.contains('.') {
                dotted_by_base.insert(opt.phonetized.replace('.', ""));
            }
        }

        // Second pass: drop non-dotted variants when a dotted one exists.
        options.retain(|opt| {
            let has_dot = opt.phonetized.contains('.');
            let base = opt.phonetized.replace('.', "");
            !dotted_by_base.contains(&base) || has_dot
        });

        // Order by decreasing confidence while preserving the relative order
        // of options with the same score.
        options.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        options
    }
}
