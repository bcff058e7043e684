//! CLI command implementations.

pub mod compare;
pub mod simulate;

use crate::services::CancelFlag;

/// Flag that flips when the user presses Ctrl-C.
pub(crate) fn cancel_on_ctrl_c() -> CancelFlag {
    let flag = CancelFlag::new();
    let handle = flag.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted; cancelling comparison");
            handle.cancel();
        }
    });
    flag
}
