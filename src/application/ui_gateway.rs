//! Single entry point for mutations of UI-owned state.
//!
//! Workers never touch the presenter directly. They submit closures through a
//! [`UiHandle`]; the [`UiLoop`] owning the presenter applies them one at a
//! time, redrawing after each, in submission order.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

use crate::domain::errors::SyncError;
use crate::domain::ports::PresentationPort;

/// A deferred mutation of UI-owned state.
pub type UiMutation = Box<dyn FnOnce(&mut dyn PresentationPort) + Send + 'static>;

struct UiRequest {
    mutation: UiMutation,
    applied: Option<oneshot::Sender<()>>,
}

/// Cloneable submission side of the gateway.
#[derive(Clone)]
pub struct UiHandle {
    sender: mpsc::UnboundedSender<UiRequest>,
}

impl UiHandle {
    /// Queues a mutation for the UI loop's next cycle without waiting.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::UiClosed` if the UI loop has stopped.
    pub fn enqueue<F>(&self, mutation: F) -> Result<(), SyncError>
    where
        F: FnOnce(&mut dyn PresentationPort) + Send + 'static,
    {
        self.sender
            .send(UiRequest {
                mutation: Box::new(mutation),
                applied: None,
            })
            .map_err(|_| SyncError::UiClosed)
    }

    /// Queues a mutation and resolves once it has been applied and redrawn.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::UiClosed` if the UI loop stops before applying it.
    pub async fn enqueue_and_wait<F>(&self, mutation: F) -> Result<(), SyncError>
    where
        F: FnOnce(&mut dyn PresentationPort) + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(UiRequest {
                mutation: Box::new(mutation),
                applied: Some(tx),
            })
            .map_err(|_| SyncError::UiClosed)?;
        rx.await.map_err(|_| SyncError::UiClosed)
    }

    /// Whether the UI loop has stopped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Owner of the presenter. Runs on the UI task.
pub struct UiLoop<P> {
    presenter: P,
    receiver: mpsc::UnboundedReceiver<UiRequest>,
}

/// Creates a connected handle and loop around `presenter`.
pub fn channel<P: PresentationPort>(presenter: P) -> (UiHandle, UiLoop<P>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (UiHandle { sender }, UiLoop { presenter, receiver })
}

impl<P: PresentationPort> UiLoop<P> {
    /// Presenter driven by this loop.
    #[must_use]
    pub const fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Applies mutations until every handle is dropped, then returns the presenter.
    pub async fn run(mut self) -> P {
        debug!("UI loop started");
        while let Some(request) = self.receiver.recv().await {
            self.apply(request);
        }
        debug!("UI loop stopped");
        self.presenter
    }

    /// Applies everything already queued without waiting. Returns the count.
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(request) = self.receiver.try_recv() {
            self.apply(request);
            applied += 1;
        }
        applied
    }

    fn apply(&mut self, request: UiRequest) {
        (request.mutation)(&mut self.presenter);
        self.presenter.redraw();
        if let Some(applied) = request.applied {
            // Waiter may have given up.
            let _ = applied.send(());
        }
        trace!("UI mutation applied");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ChannelId;
    use crate::domain::ports::ChannelIndicator;
    use crate::domain::ports::mocks::{RecordingPresenter, UiCall};
    use tokio_test::{assert_pending, assert_ready_ok, task};

    #[test]
    fn test_drain_applies_in_submission_order_and_redraws() {
        let presenter = RecordingPresenter::new();
        let (handle, mut ui) = channel(presenter.clone());

        handle.enqueue(|ui| ui.set_chat_header("first")).unwrap();
        handle
            .enqueue(|ui| ui.set_channel_indicator(ChannelId(1), ChannelIndicator::Unread))
            .unwrap();

        assert_eq!(ui.drain(), 2);
        assert_eq!(
            presenter.calls(),
            vec![
                UiCall::Header("first".to_string()),
                UiCall::ChannelIndicator(ChannelId(1), ChannelIndicator::Unread),
            ]
        );
        assert_eq!(presenter.redraws(), 2);
    }

    #[test]
    fn test_enqueue_and_wait_resolves_after_apply() {
        let presenter = RecordingPresenter::new();
        let (handle, mut ui) = channel(presenter.clone());

        let mut waiting = task::spawn(handle.enqueue_and_wait(|ui| ui.clear_chat()));
        assert_pending!(waiting.poll());
        assert!(presenter.calls().is_empty());

        ui.drain();

        assert!(waiting.is_woken());
        assert_ready_ok!(waiting.poll());
        assert_eq!(presenter.calls(), vec![UiCall::ClearChat]);
    }

    #[tokio::test]
    async fn test_closed_loop_reports_error() {
        let (handle, ui) = channel(RecordingPresenter::new());
        drop(ui);

        assert_eq!(handle.enqueue(|ui| ui.clear_chat()), Err(SyncError::UiClosed));
        assert_eq!(
            handle.enqueue_and_wait(|ui| ui.clear_chat()).await,
            Err(SyncError::UiClosed)
        );
        assert!(handle.is_closed());
    }

    #[tokio::test]
    async fn test_run_returns_presenter_when_handles_drop() {
        let (handle, ui) = channel(RecordingPresenter::new());
        let running = tokio::spawn(ui.run());

        handle.enqueue_and_wait(|ui| ui.set_input_text("hi")).await.unwrap();
        drop(handle);

        let presenter = running.await.unwrap();
        assert_eq!(presenter.calls(), vec![UiCall::InputText("hi".to_string())]);
    }
}
