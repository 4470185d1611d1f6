// # Corrections
//
// A correction pairs a human-readable description with a deferred action.
// Nothing happens until the orchestrator decides to run it, so a preview
// and a push compute exactly the same list.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::error::Result;

/// Boxed future returned by a correction action
pub type CorrectionFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;

type Action = Box<dyn FnOnce() -> CorrectionFuture + Send>;

/// One proposed change: a message plus the action that applies it
pub struct Correction {
    /// What will change, complete without running the action
    pub msg: String,
    action: Action,
}

impl Correction {
    /// Build a correction from a message and an async closure
    ///
    /// ```rust,ignore
    /// let client = client.clone();
    /// Correction::new("CREATE A www.example.com 1.2.3.4 300", move || async move {
    ///     client.create(record).await
    /// });
    /// ```
    pub fn new<F, Fut>(msg: impl Into<String>, f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            msg: msg.into(),
            action: Box::new(move || Box::pin(f())),
        }
    }

    /// Execute the action, consuming the correction
    pub async fn run(self) -> Result<()> {
        (self.action)().await
    }
}

impl fmt::Debug for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Correction").field("msg", &self.msg).finish_non_exhaustive()
    }
}
