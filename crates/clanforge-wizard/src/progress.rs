//! Pipeline progress reporting

use crate::pipeline::Stage;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

/// One progress update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    /// Stage the event belongs to
    pub stage: Stage,
    /// Stages finished so far
    pub done: usize,
    /// Stage count
    pub total: usize,
    /// Human-readable update
    pub message: String,
}

/// Receiver of progress updates
///
/// Implementations must not block; the pipeline calls `report` inline.
pub trait ProgressSink: Send + Sync {
    /// Deliver one event
    fn report(&self, event: ProgressEvent);
}

impl ProgressSink for UnboundedSender<ProgressEvent> {
    fn report(&self, event: ProgressEvent) {
        // a dropped receiver only means nobody is watching
        if self.send(event).is_err() {
            tracing::trace!("progress receiver closed");
        }
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _event: ProgressEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_sink_delivers_in_order() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        for (done, stage) in [Stage::Structure, Stage::Roles].into_iter().enumerate() {
            tx.report(ProgressEvent {
                stage,
                done,
                total: 4,
                message: String::new(),
            });
        }
        assert_eq!(rx.recv().await.unwrap().stage, Stage::Structure);
        assert_eq!(rx.recv().await.unwrap().done, 1);
    }

    #[test]
    fn closed_channel_is_ignored() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        drop(rx);
        tx.report(ProgressEvent {
            stage: Stage::Features,
            done: 3,
            total: 4,
            message: "done".into(),
        });
    }
}
