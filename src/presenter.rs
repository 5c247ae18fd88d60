//! The boundary between the monitor and whatever draws the indicator.
//!
//! The monitor calls [`Presenter::on_status_changed`] from its background
//! context. A presenter must not touch UI state from there; the
//! [`ChannelPresenter`] forwards each change to the task that owns the UI.

use chrono::{DateTime, Local};
use tokio::sync::mpsc;
use tracing::debug;

use crate::status::StatusTuple;

pub trait Presenter: Send + Sync {
    fn on_status_changed(&self, status: StatusTuple);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusEvent {
    pub status: StatusTuple,
    pub changed_at: DateTime<Local>,
}

pub struct ChannelPresenter {
    tx: mpsc::UnboundedSender<StatusEvent>,
}

impl ChannelPresenter {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<StatusEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Presenter for ChannelPresenter {
    fn on_status_changed(&self, status: StatusTuple) {
        let event = StatusEvent {
            status,
            changed_at: Local::now(),
        };
        if self.tx.send(event).is_err() {
            debug!("indicator is gone, dropping status update");
        }
    }
}
