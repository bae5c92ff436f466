//! 辞書ローダフレームワーク
//!
//! このモジュールは、辞書ソース(ファイルまたはバイト列)を解析して
//! (表記, 発音リスト)エントリを生成する[`Loader`]抽象と、フォーマットの
//! 自動判別(スニッフィング)、およびマージ付きロードのエントリポイントを
//! 提供します。
//!
//! 組み込みローダは初期化時に[スラッシュ形式, パイプ形式, バイナリ]の
//! 順で登録され、スニッフィングが決定的でない場合はパイプ形式に
//! フォールバックします。外部コードは[`register_loader`]で追加の
//! ローダを登録できます。登録順がスニッフィングの優先順位になります
//! (先に登録されたものが優先)。
//!
//! テストではプロセス全体のレジストリを汚さないように、
//! [`Registry::builtin`]で独立したレジストリを構築できます。

use std::io::{BufRead, BufReader, Cursor, Read};
use std::path::Path;
use std::sync::{Arc, LazyLock, RwLock};

use log::debug;

use crate::dictionary::{BinaryLoader, Dictionary, MergeMode, Representation};
use crate::dictionary::{piped, slashed};
use crate::errors::{LegatoError, Result};

/// フォーマット判別に使用するブロックのサイズ
///
/// `http.DetectContentType`と同様に数キロバイトを読み取ります。
pub const SNIFF_LEN: usize = 4 * 1024;

/// ローダの「種類」を識別する短い識別子
///
/// 主に情報提供用ですが、デバッグやユーザコードで特定のローダを
/// 選択する際に利用できます。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Kind(pub &'static str);

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// エントリごとにローダから呼び出されるコールバック
///
/// 引数は表記と発音のリストです。
pub type OnEntry<'a> = dyn FnMut(&str, Vec<String>) -> Result<()> + 'a;

/// 辞書ソースを解析してエントリを生成するローダ
///
/// 1つの実装が1つのフォーマットをカプセル化します。
pub trait Loader: Send + Sync {
    /// ローダの種類識別子を返します
    fn kind(&self) -> Kind;

    /// ソースのプレフィックスを検査し、このローダが適切かどうかを
    /// 判定します
    ///
    /// # 引数
    ///
    /// * `sniff` - ソースの先頭バイト列(最大数KB)
    /// * `is_eof` - `sniff`がソース全体を含む場合は`true`
    fn sniff(&self, sniff: &[u8], is_eof: bool) -> bool;

    /// ソース全体を解析し、見つかったエントリごとに`emit`を呼び出します
    fn load(&self, rdr: &mut dyn BufRead, emit: &mut OnEntry) -> Result<()>;

    /// 辞書全体をメモリに読み込みます
    ///
    /// バイナリのような純粋なローダではこちらの方が効率的な場合が
    /// あります。
    fn load_all(&self, rdr: &mut dyn BufRead) -> Result<Dictionary> {
        let mut dict = Dictionary::new();
        self.load(rdr, &mut |word, prons| {
            dict.insert(word, prons);
            Ok(())
        })?;
        Ok(dict)
    }
}

/// ローダの明示的なレジストリ
///
/// ローダは登録順にスニッフィングで照会されます。どのローダも
/// ソースを認識しない場合はフォールバックローダが選ばれます。
pub struct Registry {
    loaders: Vec<Arc<dyn Loader>>,
    fallback: Option<Arc<dyn Loader>>,
}

impl Registry {
    /// ローダもフォールバックも持たない空のレジストリを生成します
    pub fn new() -> Self {
        Self {
            loaders: Vec::new(),
            fallback: None,
        }
    }

    /// 組み込みローダを登録済みのレジストリを生成します
    ///
    /// ローダは最も特殊なものから順に[スラッシュ形式, パイプ形式,
    /// バイナリ]と登録され、スニッフィングが決定的でない場合は
    /// パイプ形式にフォールバックします。
    pub fn builtin() -> Self {
        let text_piped: Arc<dyn Loader> = Arc::new(piped::piped_text_loader());
        let mut loaders: Vec<Arc<dyn Loader>> = Vec::with_capacity(3);
        loaders.push(Arc::new(slashed::slashed_text_loader()));
        loaders.push(Arc::clone(&text_piped));
        loaders.push(Arc::new(BinaryLoader));

        Self {
            loaders,
            fallback: Some(text_piped),
        }
    }

    /// ローダを末尾に登録します
    pub fn register(&mut self, loader: Arc<dyn Loader>) {
        self.loaders.push(loader);
    }

    /// フォールバックローダを設定します
    pub fn set_fallback(&mut self, loader: Arc<dyn Loader>) {
        self.fallback = Some(loader);
    }

    /// スニッフィングで最初に認識したローダを選択します
    ///
    /// どのローダも認識しない場合はフォールバックローダを返します。
    pub fn select(&self, sniff: &[u8], is_eof: bool) -> Option<Arc<dyn Loader>> {
        for loader in &self.loaders {
            if loader.sniff(sniff, is_eof) {
                return Some(Arc::clone(loader));
            }
        }
        self.fallback.clone()
    }

    /// ファイルパスの列から辞書をロードしてマージします
    ///
    /// パスの順序は尊重され、ソース間には[`MergeMode`]の規則が
    /// 適用されます。
    ///
    /// # エラー
    ///
    /// いずれかのソースで失敗した場合、呼び出し全体が失敗します。
    /// ソースごとの部分的な進行が必要な場合は[`Registry::load_into`]を
    /// ソース単位で呼び出してください。
    pub fn load_paths<P>(&self, mode: MergeMode, paths: impl IntoIterator<Item = P>) -> Result<Dictionary>
    where
        P: AsRef<Path>,
    {
        let mut rep = Representation::new();
        self.load_into(&mut rep, mode, paths)?;
        Ok(rep.into_entries())
    }

    /// メモリ上のバイト列から辞書をロードしてマージします
    ///
    /// 各バイト列は独立したソースとして扱われ、ファイルの場合と同じ
    /// [`MergeMode`]の規則がソース間に適用されます。
    pub fn load_blobs<B>(&self, mode: MergeMode, blobs: impl IntoIterator<Item = B>) -> Result<Dictionary>
    where
        B: AsRef<[u8]>,
    {
        let mut rep = Representation::new();
        for blob in blobs {
            let blob = blob.as_ref();
            if blob.is_empty() {
                continue;
            }
            let (sniff, is_eof) = if blob.len() > SNIFF_LEN {
                (&blob[..SNIFF_LEN], false)
            } else {
                (blob, true)
            };
            let loader = self
                .select(sniff, is_eof)
                .ok_or_else(|| LegatoError::NoLoader("in-memory blob".to_string()))?;
            debug!("selected '{}' loader for blob of {} bytes", loader.kind(), blob.len());
            rep.absorb(loader.as_ref(), mode, &mut Cursor::new(blob))?;
        }
        Ok(rep.into_entries())
    }

    /// ファイルパスの列から既存のアキュムレータへロードしてマージします
    pub fn load_into<P>(
        &self,
        rep: &mut Representation,
        mode: MergeMode,
        paths: impl IntoIterator<Item = P>,
    ) -> Result<()>
    where
        P: AsRef<Path>,
    {
        for path in paths {
            let path = path.as_ref();
            if path.as_os_str().is_empty() {
                continue;
            }
            self.load_file(rep, mode, path)?;
        }
        Ok(())
    }

    /// ファイルを開き、フォーマットを判別して対応するローダを実行します
    fn load_file(&self, rep: &mut Representation, mode: MergeMode, path: &Path) -> Result<()> {
        let file = std::fs::File::open(path).map_err(|source| LegatoError::SourceOpen {
            path: path.to_path_buf(),
            source,
        })?;
        let mut file = BufReader::new(file);

        let mut prefix = vec![0u8; SNIFF_LEN];
        let n = read_prefix(&mut file, &mut prefix).map_err(|source| LegatoError::Sniff {
            path: path.to_path_buf(),
            source,
        })?;
        prefix.truncate(n);
        let is_eof = n < SNIFF_LEN;

        let loader = self
            .select(&prefix, is_eof)
            .ok_or_else(|| LegatoError::NoLoader(path.display().to_string()))?;
        debug!("selected '{}' loader for {}", loader.kind(), path.display());

        // Re-chain the sniffed prefix in front of the remaining bytes.
        let mut rdr = Cursor::new(prefix).chain(file);
        rep.absorb(loader.as_ref(), mode, &mut rdr)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// プロセス全体で共有される既定のレジストリ
static GLOBAL_REGISTRY: LazyLock<RwLock<Registry>> =
    LazyLock::new(|| RwLock::new(Registry::builtin()));

fn global_read() -> std::sync::RwLockReadGuard<'static, Registry> {
    match GLOBAL_REGISTRY.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// 追加のローダをプロセス全体のレジストリに登録します
///
/// 登録順がスニッフィングの優先順位になります。組み込みローダは
/// 初期化時に先頭へ登録済みです。
pub fn register_loader(loader: Arc<dyn Loader>) {
    let mut registry = match GLOBAL_REGISTRY.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    registry.register(loader);
}

/// ファイルパスの列から辞書をロードしてマージします
///
/// プロセス全体のレジストリを使用します。独立したレジストリが必要な
/// 場合は[`Registry::load_paths`]を使用してください。
///
/// # 例
///
/// ```no_run
/// use legato::{load_paths, MergeMode};
///
/// let dict = load_paths(MergeMode::Append, ["lexicon.txt", "fallback.txt"])?;
/// # Ok::<(), legato::errors::LegatoError>(())
/// ```
pub fn load_paths<P>(mode: MergeMode, paths: impl IntoIterator<Item = P>) -> Result<Dictionary>
where
    P: AsRef<Path>,
{
    global_read().load_paths(mode, paths)
}

/// メモリ上のバイト列から辞書をロードしてマージします
///
/// プロセス全体のレジストリを使用します。
pub fn load_blobs<B>(mode: MergeMode, blobs: impl IntoIterator<Item = B>) -> Result<Dictionary>
where
    B: AsRef<[u8]>,
{
    global_read().load_blobs(mode, blobs)
}

/// ファイルパスの列から既存のアキュムレータへロードしてマージします
///
/// プロセス全体のレジストリを使用します。
pub fn load_into<P>(
    rep: &mut Representation,
    mode: MergeMode,
    paths: impl IntoIterator<Item = P>,
) -> Result<()>
where
    P: AsRef<Path>,
{
    global_read().load_into(rep, mode, paths)
}

/// プレフィックスバッファを可能な限り埋めます
///
/// EOFはエラーではなく、読み取れたバイト数を返します。
fn read_prefix(r: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut n = 0;
    while n < buf.len() {
        match r.read(&mut buf[n..]) {
            Ok(0) => break,
            Ok(k) => n += k,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(n)
}
