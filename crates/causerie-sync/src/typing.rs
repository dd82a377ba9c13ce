//! Debounced local typing emission.
//!
//! Keystroke-driven `typing=true` and clear-driven `typing=false` signals
//! are rate-limited with a trailing-edge window so the realtime channel is
//! never flooded: only the last value observed during a burst is emitted,
//! once the input has been quiet for the window.

use std::time::Duration;

use tokio::sync::mpsc;

/// Trailing-edge debouncer for typing signals.
///
/// Inputs go in through [`input`](Self::input); the debounced values come
/// out of the receiver returned by [`spawn`](Self::spawn). The caller
/// forwards them onto the realtime channel for the open conversation.
pub struct TypingDebouncer {
    input_tx: mpsc::UnboundedSender<bool>,
}

impl TypingDebouncer {
    /// Spawn the debounce task with the given quiet window.
    pub fn spawn(window: Duration) -> (Self, mpsc::UnboundedReceiver<bool>) {
        let (input_tx, mut input_rx) = mpsc::unbounded_channel::<bool>();
        let (out_tx, out_rx) = mpsc::unbounded_channel::<bool>();

        tokio::spawn(async move {
            let mut pending: Option<bool> = None;
            loop {
                match pending {
                    None => match input_rx.recv().await {
                        Some(value) => pending = Some(value),
                        None => break,
                    },
                    Some(value) => {
                        tokio::select! {
                            next = input_rx.recv() => match next {
                                // A newer value within the window replaces
                                // the pending one and restarts the timer.
                                Some(newer) => pending = Some(newer),
                                None => {
                                    let _ = out_tx.send(value);
                                    break;
                                }
                            },
                            _ = tokio::time::sleep(window) => {
                                let _ = out_tx.send(value);
                                pending = None;
                            }
                        }
                    }
                }
            }
        });

        (Self { input_tx }, out_rx)
    }

    /// Record a local typing value. Cheap; never blocks.
    pub fn input(&self, is_typing: bool) {
        let _ = self.input_tx.send(is_typing);
    }
}
