//! バイナリ辞書形式
//!
//! 辞書全体の正準シリアライゼーションを読み書きします。ワイヤ
//! レイアウトは、マジック行[`DICT_MAGIC`]に続く、表記で整列された
//! `Vec<(String, Vec<String>)>`のbincodeエンコーディングです。
//! 整列によりラウンドトリップが決定的になります。
//!
//! マジックはNUL終端されており、テキストローダのスニッフィングが
//! このフォーマットを誤認することはありません。

use std::io::{BufRead, Read, Write};

use crate::dictionary::loader::{Kind, Loader, OnEntry};
use crate::dictionary::{Dictionary, Expression, Phonetized};
use crate::errors::{LegatoError, Result};

/// バイナリ辞書形式の種別識別子
pub const KIND_BINARY: Kind = Kind("dict_bin");

/// バイナリ辞書ファイルを識別するマジックバイト
///
/// この定数の"0.1"はワイヤフォーマットのバージョンを示しており、
/// クレートのセマンティックバージョンからは切り離されています。
pub const DICT_MAGIC: &[u8] = b"LegatoDict 0.1\0";

/// bincodeの標準設定
fn config() -> bincode::config::Configuration {
    bincode::config::standard()
}

/// バイナリエンコードされた辞書を扱うローダ
///
/// プレフィックスがマジックで始まるか、有効なUTF-8でないか、NUL
/// バイトを含む場合にソースを認識します。後者2つの経験則により、
/// 通常のテキスト辞書をバイナリとして誤分類することを避けつつ、
/// 外部由来のバイナリペイロードも受け付けます。
pub struct BinaryLoader;

impl Loader for BinaryLoader {
    fn kind(&self) -> Kind {
        KIND_BINARY
    }

    fn sniff(&self, sniff: &[u8], is_eof: bool) -> bool {
        if sniff.is_empty() {
            return false;
        }
        if sniff.starts_with(DICT_MAGIC) {
            return true;
        }
        if sniff.contains(&0) {
            return true;
        }
        match std::str::from_utf8(sniff) {
            Ok(_) => false,
            // A decode error at the very end of a truncated prefix only means
            // a multi-byte sequence was cut; it is not evidence of binary data.
            Err(e) => e.error_len().is_some() || is_eof,
        }
    }

    /// バイナリ辞書を読み込んですべてのエントリを生成します
    ///
    /// 可能であればこのメソッドではなく[`Loader::load_all`]を使用して
    /// ください。
    fn load(&self, rdr: &mut dyn BufRead, emit: &mut OnEntry) -> Result<()> {
        let dict = self.load_all(rdr)?;
        for (word, prons) in dict.iter() {
            if prons.is_empty() {
                continue;
            }
            emit(word, prons.clone())?;
        }
        Ok(())
    }

    fn load_all(&self, rdr: &mut dyn BufRead) -> Result<Dictionary> {
        Dictionary::read(rdr)
    }
}

impl Dictionary {
    /// バイナリ形式で辞書をシリアライズします
    ///
    /// エントリは表記で整列されるため、同じ辞書は常に同じバイト列に
    /// エンコードされます。
    ///
    /// # エラー
    ///
    /// 書き込みまたはエンコードに失敗した場合、[`LegatoError`]を
    /// 返します。
    pub fn write<W>(&self, wtr: &mut W) -> Result<()>
    where
        W: Write,
    {
        wtr.write_all(DICT_MAGIC)?;
        let mut entries: Vec<(&Expression, &Vec<Phonetized>)> = self.iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        bincode::encode_into_std_write(&entries, wtr, config())?;
        Ok(())
    }

    /// バイナリ形式から辞書をデシリアライズします
    ///
    /// # エラー
    ///
    /// マジックバイトが一致しない場合は無効フォーマットエラーを、
    /// ペイロードをデコードできない場合はデコードエラーを返します。
    pub fn read<R>(rdr: &mut R) -> Result<Self>
    where
        R: Read + ?Sized,
    {
        let mut magic = [0u8; DICT_MAGIC.len()];
        rdr.read_exact(&mut magic)?;
        if magic != DICT_MAGIC {
            return Err(LegatoError::invalid_format(
                KIND_BINARY.0,
                "missing dictionary magic bytes",
            ));
        }
        // Reborrow as a sized reader for the decoder.
        let mut src: &mut R = rdr;
        let entries: Vec<(Expression, Vec<Phonetized>)> =
            bincode::decode_from_std_read(&mut src, config())?;
        Ok(entries.into_iter().collect())
    }
}
