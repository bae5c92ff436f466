//! プロセッサプロトコル
//!
//! このモジュールは、g2pパイプラインの最小の構成要素を定義します。
//!
//! [`Processor`]は既存の[`Transcription`]を受け取り、新しい
//! `Transcription`を返します。実装は次のことを自由に行えます:
//!
//! - 新しいフラグメントの追加
//! - 既存のフラグメントの変更
//! - 生スパンの縮小や精緻化
//!
//! ただし`Transcription::text`を保存し、`pos`/`len`をそのテキスト中の
//! 文字オフセットとして維持しなければなりません。
//!
//! ストリーミング実行は[`stream`]が担います。各ステージは1つの
//! スレッドとして動作し、値はチャネルを流れる不変の`Transcription`
//! です。プロセッサ間に共有可変状態はありません。キャンセルは
//! [`CancellationToken`]で通知され、各入力の消費前と各出力の送出前に
//! 観測されます。タイムアウトが必要な場合は、一定時間後に
//! キャンセルを発火させるのが慣用的な方法です。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::transcription::Transcription;

/// ブロック中の受信がキャンセルを観測する周期
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// g2pパイプラインの最小の構成要素
///
/// `apply`は結果に対する純粋関数であり、中断できません。キャンセルが
/// 必要な呼び出し側は[`stream`]を使用してください。
pub trait Processor: Send + Sync {
    /// 入力に処理を適用し、新しい結果を返します
    fn apply(&self, input: Transcription) -> Transcription;
}

/// ストリーミングプロセッサへのキャンセル通知
///
/// クローンは同じ通知を共有します。[`CancellationToken::cancel`]を
/// 呼び出すと、このトークンで開始されたすべてのステージがやがて
/// 終了します。
///
/// # 例
///
/// ```
/// use legato::CancellationToken;
///
/// let token = CancellationToken::new();
/// let clone = token.clone();
/// assert!(!clone.is_cancelled());
/// token.cancel();
/// assert!(clone.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// 新しいトークンを生成します
    pub fn new() -> Self {
        Self::default()
    }

    /// キャンセルを通知します
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// キャンセルが通知済みかどうかを返します
    #[inline(always)]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// プロセッサをストリーミングステージとして起動します
///
/// 入力チャネルから結果を受け取り、処理して出力チャネルへ送る
/// スレッドを生成します。出力はランデブーチャネルであり、チャネル
/// 内ではFIFO順が保たれます。ステージは入力の順に出力を送出する
/// ため、チェーン全体でも入力ごとの順序が保存されます。
///
/// 契約:
///
/// - 出力チャネルは完了時にもキャンセル時にも必ずクローズされます
///   (送信側のドロップによって)。
/// - キャンセルは各入力の消費前と各出力の送出前に観測されます。
/// - キャンセル後は残りの入力を処理せずに排出してから終了するため、
///   上流の送信側がブロックされたままになることはありません。
/// - すでに送出された部分的な出力は下流から見えます。ロールバックは
///   ありません。
///
/// # 引数
///
/// * `processor` - 適用するプロセッサ
/// * `token` - キャンセル通知用のトークン
/// * `input` - 入力結果のストリーム
///
/// # 戻り値
///
/// 処理済み結果のストリーム
pub fn stream<P>(
    processor: Arc<P>,
    token: CancellationToken,
    input: Receiver<Transcription>,
) -> Receiver<Transcription>
where
    P: Processor + ?Sized + 'static,
{
    let (tx, rx) = mpsc::sync_channel(0);

    thread::spawn(move || loop {
        if token.is_cancelled() {
            // Stop emitting but drain upstream to avoid blocking senders.
            drain(&input);
            return;
        }
        match input.recv_timeout(CANCEL_POLL_INTERVAL) {
            Ok(parcel) => {
                let processed = processor.apply(parcel);
                if token.is_cancelled() {
                    drain(&input);
                    return;
                }
                if tx.send(processed).is_err() {
                    // Downstream hung up; nothing left to do.
                    return;
                }
            }
            Err(RecvTimeoutError::Timeout) => continue,
            // Upstream closed: no more input.
            Err(RecvTimeoutError::Disconnected) => return,
        }
    });

    rx
}

/// 単一の結果をストリーミングステージへ流します
///
/// ちょうど1つの結果を保持するチャネルでステージを駆動する簡易
/// 関数です。ステージはその結果を1つ送出した後、出力チャネルを
/// クローズします。
pub fn stream_one<P>(
    processor: Arc<P>,
    token: CancellationToken,
    input: Transcription,
) -> Receiver<Transcription>
where
    P: Processor + ?Sized + 'static,
{
    let (tx, rx) = mpsc::sync_channel(1);
    // Buffered with capacity 1: the send cannot block, and dropping the
    // sender right after closes the channel.
    let _ = tx.send(input);
    drop(tx);
    stream(processor, token, rx)
}

/// 残りの入力を処理せずに排出します
fn drain(input: &Receiver<Transcription>) {
    while input.try_recv().is_ok() {}
    // Dropping the receiver afterwards unblocks any sender still waiting
    // on the rendezvous.
}

/// プロセッサを直列に合成するチェーン
///
/// ステージ`k`の出力ストリームがステージ`k+1`の入力ストリームに
/// なります。キャンセルはすべてのステージに伝播します。
///
/// # 例
///
/// ```
/// use legato::{Chain, Determinist, Dictionary, Processor, Transcription};
///
/// let mut d1 = Dictionary::new();
/// d1.insert("foo", vec!["fu".to_string()]);
/// let mut d2 = Dictionary::new();
/// d2.insert("bar", vec!["ba".to_string()]);
///
/// let chain = Chain::new()
///     .then(Determinist::new(d1))
///     .then(Determinist::new(d2));
/// let res = chain.apply(Transcription::input("foo bar"));
/// assert_eq!(res.fragments.len(), 2);
/// ```
#[derive(Default)]
pub struct Chain {
    stages: Vec<Arc<dyn Processor>>,
}

impl Chain {
    /// 空のチェーンを生成します
    pub fn new() -> Self {
        Self::default()
    }

    /// ステージを末尾に追加します
    pub fn then<P>(mut self, stage: P) -> Self
    where
        P: Processor + 'static,
    {
        self.stages.push(Arc::new(stage));
        self
    }

    /// 共有されたステージを末尾に追加します
    pub fn then_shared(mut self, stage: Arc<dyn Processor>) -> Self {
        self.stages.push(stage);
        self
    }

    /// ステージ数を返します
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// チェーンが空かどうかを返します
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// チェーン全体をストリーミングとして起動します
    ///
    /// 最初のステージは`input`で駆動され、最後のステージの出力
    /// ストリームが返されます。
    pub fn stream(
        &self,
        token: &CancellationToken,
        input: Receiver<Transcription>,
    ) -> Receiver<Transcription> {
        let mut rx = input;
        for stage in &self.stages {
            rx = stream(Arc::clone(stage), token.clone(), rx);
        }
        rx
    }

    /// 単一の入力でチェーン全体をストリーミング実行します
    pub fn stream_one(
        &self,
        token: &CancellationToken,
        input: Transcription,
    ) -> Receiver<Transcription> {
        let (tx, rx) = mpsc::sync_channel(1);
        let _ = tx.send(input);
        drop(tx);
        self.stream(token, rx)
    }
}

impl Processor for Chain {
    /// すべてのステージを順に同期適用します
    fn apply(&self, input: Transcription) -> Transcription {
        self.stages
            .iter()
            .fold(input, |acc, stage| stage.apply(acc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::SyncSender;
    use std::time::Instant;

    /// Tags every input by appending a marker fragment-free text suffix.
    struct Tag(&'static str);

    impl Processor for Tag {
        fn apply(&self, mut input: Transcription) -> Transcription {
            input.text.push_str(self.0);
            input
        }
    }

    fn feed(values: Vec<&str>) -> (Receiver<Transcription>, usize) {
        let n = values.len();
        let (tx, rx) = mpsc::sync_channel(n);
        for v in values {
            tx.send(Transcription::input(v)).unwrap();
        }
        (rx, n)
    }

    #[test]
    fn test_stream_emits_one_result_per_input_in_order() {
        let (rx, _) = feed(vec!["a", "b", "c"]);
        let out = stream(Arc::new(Tag("!")), CancellationToken::new(), rx);
        let texts: Vec<String> = out.iter().map(|t| t.text).collect();
        assert_eq!(texts, ["a!", "b!", "c!"]);
    }

    #[test]
    fn test_stream_closes_output_when_input_closes() {
        let (rx, _) = feed(vec![]);
        let out = stream(Arc::new(Tag("!")), CancellationToken::new(), rx);
        assert!(out.recv().is_err());
    }

    #[test]
    fn test_stream_one_emits_exactly_once_then_closes() {
        let out = stream_one(
            Arc::new(Tag("!")),
            CancellationToken::new(),
            Transcription::input("x"),
        );
        assert_eq!(out.recv().unwrap().text, "x!");
        assert!(out.recv().is_err());
    }

    #[test]
    fn test_cancellation_closes_output_without_processing() {
        let token = CancellationToken::new();
        token.cancel();

        let (rx, _) = feed(vec!["a", "b"]);
        let out = stream(Arc::new(Tag("!")), token, rx);
        // Cancellation was signaled before any consumption: the output
        // closes without a single emission.
        assert!(out.recv().is_err());
    }

    #[test]
    fn test_cancellation_drains_blocked_upstream_sender() {
        let token = CancellationToken::new();
        let (tx, rx): (SyncSender<Transcription>, _) = mpsc::sync_channel(0);
        let out = stream(Arc::new(Tag("!")), token.clone(), rx);

        let sender = thread::spawn(move || {
            // The first send is accepted; the stage then blocks emitting
            // because nobody reads `out` yet.
            tx.send(Transcription::input("a")).unwrap();
            // This send must not deadlock after cancellation: the stage
            // either drains it or drops the receiver.
            let _ = tx.send(Transcription::input("b"));
        });

        token.cancel();
        // The output channel must close within a bounded delay.
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            match out.recv_timeout(Duration::from_millis(20)) {
                Ok(_) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    assert!(Instant::now() < deadline, "output not closed after cancel");
                }
            }
        }
        sender.join().unwrap();
    }

    #[test]
    fn test_chain_preserves_order_end_to_end() {
        let chain = Chain::new().then(Tag("1")).then(Tag("2"));
        let (rx, _) = feed(vec!["a", "b"]);
        let out = chain.stream(&CancellationToken::new(), rx);
        let texts: Vec<String> = out.iter().map(|t| t.text).collect();
        assert_eq!(texts, ["a12", "b12"]);
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let chain = Chain::new();
        let res = chain.apply(Transcription::input("x"));
        assert_eq!(res.text, "x");
        let out = chain.stream_one(&CancellationToken::new(), Transcription::input("y"));
        assert_eq!(out.recv().unwrap().text, "y");
    }
}
