use std::future::Future;
use std::sync::{atomic::AtomicBool, atomic::Ordering, Arc};
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use json_stream::JsonObjectDecoder;
use serde_json::Value;

use crate::error::PlaygroundApiError;

/// Optional cancellation signal shared between the caller and the stream loop.
pub type CancellationSignal = Arc<AtomicBool>;

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Receiver for decoded stream messages.
///
/// Exactly one of `on_complete` or `on_error` is called per stream, after every
/// message has been delivered. A cancelled stream calls neither.
pub trait MessageSink {
    fn on_message(&mut self, message: Value);
    fn on_error(&mut self, error: PlaygroundApiError);
    fn on_complete(&mut self);
}

/// How a driven stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed,
    Failed,
    Cancelled,
}

/// [`MessageSink`] assembled from three closures.
pub struct CallbackSink<M, E, C> {
    on_message: M,
    on_error: E,
    on_complete: C,
}

impl<M, E, C> CallbackSink<M, E, C>
where
    M: FnMut(Value),
    E: FnMut(PlaygroundApiError),
    C: FnMut(),
{
    pub fn new(on_message: M, on_error: E, on_complete: C) -> Self {
        Self {
            on_message,
            on_error,
            on_complete,
        }
    }
}

impl<M, E, C> MessageSink for CallbackSink<M, E, C>
where
    M: FnMut(Value),
    E: FnMut(PlaygroundApiError),
    C: FnMut(),
{
    fn on_message(&mut self, message: Value) {
        (self.on_message)(message);
    }

    fn on_error(&mut self, error: PlaygroundApiError) {
        (self.on_error)(error);
    }

    fn on_complete(&mut self) {
        (self.on_complete)();
    }
}

/// Pull fragments until end-of-stream, pushing decoded messages into `sink`.
///
/// The only suspension point is the fragment read at the head of the loop.
/// Decoding and dispatch of everything a fragment completes happen before the
/// next read. A fragment error ends the stream with a single `on_error`.
pub async fn drive_stream<S, B, E, K>(
    fragments: S,
    sink: &mut K,
    cancellation: Option<&CancellationSignal>,
) -> StreamOutcome
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<PlaygroundApiError>,
    K: MessageSink + ?Sized,
{
    let mut fragments = std::pin::pin!(fragments);
    let mut decoder = JsonObjectDecoder::default();
    let mut delivered = 0usize;

    loop {
        let Ok(next) = await_or_cancel(fragments.next(), cancellation).await else {
            tracing::debug!(delivered, "stream cancelled while awaiting fragment");
            return StreamOutcome::Cancelled;
        };

        match next {
            Some(Ok(fragment)) => {
                for message in decoder.feed(fragment.as_ref()) {
                    if is_cancelled(cancellation) {
                        tracing::debug!(delivered, "stream cancelled during dispatch");
                        return StreamOutcome::Cancelled;
                    }
                    delivered += 1;
                    sink.on_message(message);
                }
            }
            Some(Err(error)) => {
                let error = error.into();
                tracing::warn!(%error, delivered, "stream failed");
                sink.on_error(error);
                return StreamOutcome::Failed;
            }
            None => break,
        }
    }

    for message in decoder.finish() {
        if is_cancelled(cancellation) {
            return StreamOutcome::Cancelled;
        }
        delivered += 1;
        sink.on_message(message);
    }

    tracing::debug!(delivered, "stream completed");
    sink.on_complete();
    StreamOutcome::Completed
}

pub(crate) fn is_cancelled(cancel: Option<&CancellationSignal>) -> bool {
    cancel.is_some_and(|token| token.load(Ordering::Acquire))
}

pub(crate) async fn await_or_cancel<F>(
    future: F,
    cancellation: Option<&CancellationSignal>,
) -> Result<F::Output, PlaygroundApiError>
where
    F: Future,
{
    if cancellation.is_none() {
        return Ok(future.await);
    }

    let mut future = std::pin::pin!(future);

    loop {
        if is_cancelled(cancellation) {
            return Err(PlaygroundApiError::Cancelled);
        }

        if let Ok(output) = tokio::time::timeout(CANCEL_POLL_INTERVAL, &mut future).await {
            if is_cancelled(cancellation) {
                return Err(PlaygroundApiError::Cancelled);
            }
            return Ok(output);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{await_or_cancel, is_cancelled, CancellationSignal};
    use crate::error::PlaygroundApiError;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn missing_signal_is_never_cancelled() {
        assert!(!is_cancelled(None));
    }

    #[tokio::test]
    async fn await_or_cancel_passes_output_through() {
        let signal: CancellationSignal = Arc::new(AtomicBool::new(false));
        let output = await_or_cancel(async { 7 }, Some(&signal)).await;
        assert!(matches!(output, Ok(7)));
    }

    #[tokio::test]
    async fn await_or_cancel_stops_pending_future() {
        let signal: CancellationSignal = Arc::new(AtomicBool::new(false));
        let trigger = Arc::clone(&signal);
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(30)).await;
            trigger.store(true, Ordering::Release);
        });

        let output = await_or_cancel(std::future::pending::<()>(), Some(&signal)).await;
        assert!(matches!(output, Err(PlaygroundApiError::Cancelled)));
    }
}
