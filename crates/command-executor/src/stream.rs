//! Streaming execution for long-running commands (logs, events)
//!
//! Each stream owns one background thread that reads stdout line by line, maps
//! every line and pushes the result into an unbounded queue. The consumer polls
//! the queue with bounded waits. There is no backpressure: a consumer that never
//! reads lets the queue grow for as long as the process keeps writing.

use crate::cancel::CancellationToken;
use crate::command::Command;
use crate::error::{Error, Result};
use crate::invoker::InvocationOptions;
use crate::process::NO_EXIT_CODE;
use crate::resolver::BinaryDescriptor;
use async_channel::{Receiver, Sender, TryRecvError};
use async_io::Timer;
use async_process::Child;
use futures::future::{self, Either};
use futures::stream::Stream;
use futures_lite::io::{AsyncBufReadExt, AsyncRead, BufReader};
use futures_lite::StreamExt;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

/// How long stderr is still drained after stdout closed
const STDERR_GRACE: Duration = Duration::from_millis(100);

/// Shared between the reader thread and the consumer
#[derive(Debug)]
struct StreamState {
    finished: AtomicBool,
    success: AtomicBool,
    cancelled: AtomicBool,
    exit_code: AtomicI32,
    stderr: Mutex<Vec<String>>,
}

impl StreamState {
    fn new() -> Self {
        Self {
            finished: AtomicBool::new(false),
            success: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            exit_code: AtomicI32::new(NO_EXIT_CODE),
            stderr: Mutex::new(Vec::new()),
        }
    }

    fn finish(&self, exit_code: i32, cancelled: bool) {
        self.exit_code.store(exit_code, Ordering::SeqCst);
        self.cancelled.store(cancelled, Ordering::SeqCst);
        self.success
            .store(!cancelled && exit_code == 0, Ordering::SeqCst);
        self.finished.store(true, Ordering::SeqCst);
    }
}

/// A live, non-restartable sequence of mapped stdout lines
///
/// The sequence is finite only for as long as the process runs. Dropping the
/// stream releases it: the reader stops and the process is killed if it is
/// still running.
pub struct ConsoleStream<T> {
    command: String,
    items: Receiver<T>,
    state: Arc<StreamState>,
    release: CancellationToken,
}

impl<T> ConsoleStream<T> {
    /// The command line being streamed
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Whether the reader has stopped (process exited or stream cancelled)
    pub fn is_finished(&self) -> bool {
        self.state.finished.load(Ordering::SeqCst)
    }

    /// Whether the process ran to completion with exit code 0
    ///
    /// `false` while running and after cancellation.
    pub fn is_success(&self) -> bool {
        self.state.success.load(Ordering::SeqCst)
    }

    /// Whether the stream was cut short by cancellation or release
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    /// The exit code once finished
    pub fn exit_code(&self) -> Option<i32> {
        self.is_finished()
            .then(|| self.state.exit_code.load(Ordering::SeqCst))
    }

    /// Lines written to stderr so far
    pub fn stderr(&self) -> Vec<String> {
        self.state
            .stderr
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    /// Return the next item, waiting at most `timeout` for one to arrive
    ///
    /// Buffered items are still returned after a natural finish. After
    /// cancellation, or once finished and drained, this returns `None` at once.
    pub async fn try_read(&self, timeout: Duration) -> Option<T> {
        if self.is_cancelled() || self.release.is_cancelled() {
            return None;
        }

        match self.items.try_recv() {
            Ok(item) => return Some(item),
            Err(TryRecvError::Closed) => return None,
            Err(TryRecvError::Empty) => {}
        }

        futures_lite::future::or(async { self.items.recv().await.ok() }, async {
            Timer::after(timeout).await;
            None
        })
        .await
    }

    /// Wait for the next item without a time limit
    pub async fn next_item(&self) -> Option<T> {
        if self.is_cancelled() || self.release.is_cancelled() {
            return None;
        }
        self.items.recv().await.ok()
    }

    /// Stop the reader and kill the process if it is still running
    pub fn cancel(&self) {
        self.release.cancel();
    }

    /// Release the stream (same as dropping it)
    pub fn close(self) {}

    /// Turn the handle into a `Stream` that ends when the process finishes
    pub fn into_stream(self) -> impl Stream<Item = T> + Send + Unpin
    where
        T: Send + 'static,
    {
        Box::pin(futures::stream::unfold(self, |stream| async move {
            let item = stream.next_item().await?;
            Some((item, stream))
        }))
    }
}

impl<T> Drop for ConsoleStream<T> {
    fn drop(&mut self) {
        self.release.cancel();
    }
}

impl<T> std::fmt::Debug for ConsoleStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleStream")
            .field("command", &self.command)
            .field("finished", &self.is_finished())
            .field("success", &self.is_success())
            .field("queued", &self.items.len())
            .finish()
    }
}

/// Starts processes whose stdout is consumed as a [`ConsoleStream`]
#[derive(Debug, Clone, Default)]
pub struct StreamingInvoker {
    base_env: HashMap<String, String>,
}

impl StreamingInvoker {
    /// Create a streaming invoker
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply environment overrides to every stream started by this invoker
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.base_env = env;
        self
    }

    /// Start a binary and stream its mapped stdout lines
    ///
    /// `mapper` runs on the reader thread; returning `None` drops the line.
    pub fn execute<T, F>(
        &self,
        descriptor: &BinaryDescriptor,
        arguments: &str,
        token: CancellationToken,
        mapper: F,
    ) -> Result<ConsoleStream<T>>
    where
        T: Send + 'static,
        F: FnMut(String) -> Option<T> + Send + 'static,
    {
        self.execute_with(descriptor, arguments, &InvocationOptions::default(), token, mapper)
    }

    /// Like [`execute`](Self::execute) with a working directory and environment
    ///
    /// `options.timeout` is ignored: a stream lives until the process exits or it
    /// is cancelled.
    pub fn execute_with<T, F>(
        &self,
        descriptor: &BinaryDescriptor,
        arguments: &str,
        options: &InvocationOptions,
        token: CancellationToken,
        mapper: F,
    ) -> Result<ConsoleStream<T>>
    where
        T: Send + 'static,
        F: FnMut(String) -> Option<T> + Send + 'static,
    {
        let mut command = Command::for_binary(descriptor, arguments)?;
        command.envs(&self.base_env);
        command.envs(&options.env);
        if let Some(dir) = &options.cwd {
            command.current_dir(dir);
        }
        self.spawn(&command, token, mapper)
    }

    /// Start a prepared command and stream its mapped stdout lines
    pub fn spawn<T, F>(
        &self,
        command: &Command,
        token: CancellationToken,
        mapper: F,
    ) -> Result<ConsoleStream<T>>
    where
        T: Send + 'static,
        F: FnMut(String) -> Option<T> + Send + 'static,
    {
        let cmd_display = command.display();
        debug!("Streaming: {}", cmd_display);

        let child = command
            .prepare()
            .spawn()
            .map_err(|e| Error::spawn_failed(&cmd_display, e.to_string()))?;

        let (tx, rx) = async_channel::unbounded();
        let state = Arc::new(StreamState::new());
        let release = CancellationToken::new();

        let reader = Reader {
            command: cmd_display.clone(),
            tx,
            state: Arc::clone(&state),
            token,
            release: release.clone(),
        };

        std::thread::Builder::new()
            .name("console-stream".to_string())
            .spawn(move || futures_lite::future::block_on(reader.run(child, mapper)))
            .map_err(|e| Error::spawn_failed(&cmd_display, format!("reader thread: {e}")))?;

        Ok(ConsoleStream {
            command: cmd_display,
            items: rx,
            state,
            release,
        })
    }
}

enum Outcome {
    Eof,
    Cancelled,
}

struct Reader<T> {
    command: String,
    tx: Sender<T>,
    state: Arc<StreamState>,
    token: CancellationToken,
    release: CancellationToken,
}

impl<T> Reader<T> {
    fn is_cancelled(&self) -> bool {
        self.token.is_cancelled() || self.release.is_cancelled()
    }

    async fn cancelled(&self) {
        futures_lite::future::or(self.token.cancelled(), self.release.cancelled()).await
    }

    async fn run<F>(self, mut child: Child, mapper: F)
    where
        F: FnMut(String) -> Option<T>,
    {
        let stdout_task = Box::pin(self.read_stdout(child.stdout.take(), mapper));
        let stderr_task = Box::pin(drain_stderr(child.stderr.take(), &self.state));

        let outcome = match future::select(stdout_task, stderr_task).await {
            Either::Left((outcome, stderr_rest)) => {
                if matches!(outcome, Outcome::Eof) {
                    futures_lite::future::or(stderr_rest, async {
                        Timer::after(STDERR_GRACE).await;
                    })
                    .await;
                }
                outcome
            }
            Either::Right(((), stdout_rest)) => stdout_rest.await,
        };

        let outcome = match outcome {
            Outcome::Eof => {
                let status = futures_lite::future::or(async { Some(child.status().await) }, async {
                    self.cancelled().await;
                    None
                })
                .await;
                match status {
                    Some(Ok(status)) => {
                        let code = status.code().unwrap_or(NO_EXIT_CODE);
                        debug!("{} exited with {}", self.command, code);
                        self.state.finish(code, false);
                        None
                    }
                    Some(Err(e)) => {
                        warn!("Failed to wait for {}: {}", self.command, e);
                        self.state.finish(NO_EXIT_CODE, false);
                        None
                    }
                    None => Some(Outcome::Cancelled),
                }
            }
            cancelled => Some(cancelled),
        };

        if outcome.is_some() {
            warn!("Stream for {} cancelled, killing process", self.command);
            if let Err(e) = child.kill() {
                debug!("Kill of {} failed (already exited?): {}", self.command, e);
            }
            let code = child
                .status()
                .await
                .ok()
                .and_then(|status| status.code())
                .unwrap_or(NO_EXIT_CODE);
            self.state.finish(code, true);
        }

        self.tx.close();
    }

    async fn read_stdout<R, F>(&self, stdout: Option<R>, mut mapper: F) -> Outcome
    where
        R: AsyncRead + Unpin,
        F: FnMut(String) -> Option<T>,
    {
        let Some(stdout) = stdout else {
            return Outcome::Eof;
        };
        let mut lines = BufReader::new(stdout).lines();

        loop {
            if self.is_cancelled() {
                return Outcome::Cancelled;
            }

            let next = futures_lite::future::or(async { Some(lines.next().await) }, async {
                self.cancelled().await;
                None
            })
            .await;

            match next {
                None => return Outcome::Cancelled,
                Some(None) => return Outcome::Eof,
                Some(Some(Ok(line))) => {
                    if let Some(item) = mapper(line) {
                        if self.tx.try_send(item).is_err() {
                            // Receiver dropped
                            return Outcome::Cancelled;
                        }
                    }
                }
                Some(Some(Err(e))) => {
                    warn!("Error reading stdout of {}: {}", self.command, e);
                    return Outcome::Eof;
                }
            }
        }
    }
}

async fn drain_stderr<R: AsyncRead + Unpin>(stderr: Option<R>, state: &StreamState) {
    let Some(stderr) = stderr else {
        return;
    };
    let mut lines = BufReader::new(stderr).lines();
    while let Some(Ok(line)) = lines.next().await {
        if let Ok(mut buffer) = state.stderr.lock() {
            buffer.push(line);
        }
    }
}
