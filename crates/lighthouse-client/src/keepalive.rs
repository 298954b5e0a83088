//! Keep-alive scheduler: one cancellable resend task per connection.
//!
//! The display blanks a user's output after a couple of seconds without
//! traffic, so every connection resends its last frame whenever the caller
//! goes quiet. The task starts when the connection reaches the connected
//! state, stops on its own when the connection leaves it, and is aborted
//! outright by `close()`.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::debug;

use crate::connection::Connection;

/// How long the caller may stay silent before the last frame is resent.
pub(crate) const RESEND_INTERVAL: Duration = Duration::from_millis(2000);

/// Spawns the scheduler for `connection`.
///
/// Every tick: read and clear the sent-since-tick marker; when nothing was
/// sent since the previous tick and a last frame exists, resend it. The
/// resend itself does not set the marker, so a silent caller gets one resend
/// per tick. Writes go through the connection's single writer lock and are
/// therefore serialized with caller-initiated sends.
pub(crate) fn spawn(connection: Arc<Connection>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(RESEND_INTERVAL);
        // interval() fires immediately once; the first real tick is one
        // full period after connect.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if !connection.is_connected() {
                break;
            }
            let sent_since_last_tick = connection.take_sent_marker();
            if sent_since_last_tick {
                continue;
            }
            let Some(frame) = connection.last_frame_snapshot() else {
                continue;
            };
            connection.resend_last_frame(&frame).await;
        }
        debug!(
            "keep-alive scheduler for {} stopped",
            connection.destination()
        );
    })
}
