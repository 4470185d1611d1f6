// # Confirmation
//
// Interactive push asks before running each correction. The question is
// written by the orchestrator; a `Confirmer` only supplies the answer.

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::Mutex;

/// Source of yes/no answers for interactive runs
#[async_trait]
pub trait Confirmer: Send + Sync {
    /// `true` only for an explicit yes; errors and end of input are a no
    async fn confirm(&self) -> bool;
}

/// Whether a line of input means "run it"
pub fn is_yes(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y")
}

/// Reads answers line by line from any async buffered reader
pub struct ReaderConfirmer<R> {
    reader: Mutex<R>,
}

impl<R> ReaderConfirmer<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader: Mutex::new(reader),
        }
    }
}

#[async_trait]
impl<R> Confirmer for ReaderConfirmer<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn confirm(&self) -> bool {
        let mut line = String::new();
        let mut reader = self.reader.lock().await;
        match reader.read_line(&mut line).await {
            Ok(0) => false,
            Ok(_) => is_yes(&line),
            Err(e) => {
                tracing::warn!("Failed to read confirmation: {}", e);
                false
            }
        }
    }
}

/// Reads answers from standard input
pub type StdinConfirmer = ReaderConfirmer<BufReader<Stdin>>;

impl StdinConfirmer {
    pub fn stdin() -> Self {
        ReaderConfirmer::new(BufReader::new(tokio::io::stdin()))
    }
}

/// Answers yes to everything
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

#[async_trait]
impl Confirmer for AlwaysConfirm {
    async fn confirm(&self) -> bool {
        true
    }
}

/// Answers no to everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverConfirm;

#[async_trait]
impl Confirmer for NeverConfirm {
    async fn confirm(&self) -> bool {
        false
    }
}
