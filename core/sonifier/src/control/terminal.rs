//! Line-oriented operator input on stdin.
//!
//! End of input is treated like closing the control window and shuts the
//! program down, so a supervising process must keep stdin open (a pipe it
//! holds, not `/dev/null`).

use std::{
    io::{self, BufRead},
    thread::{self, JoinHandle},
    time::Duration,
};

use log::{debug, warn};

use crate::control::command::{ControlEvent, ControlEventProducer};

/// Reads operator commands from `input` on a background thread and
/// queues them for the event loop. End of input queues `Shutdown`.
pub fn spawn_terminal_surface<R>(
    input: R,
    mut producer: ControlEventProducer,
) -> io::Result<JoinHandle<()>>
where
    R: BufRead + Send + 'static,
{
    thread::Builder::new()
        .name("control-surface".to_owned())
        .spawn(move || {
            for line in input.lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!("failed to read operator input: {e}");
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<ControlEvent>() {
                    Ok(event) => {
                        if !enqueue(&mut producer, event) {
                            return;
                        }
                    }
                    Err(e) => warn!("ignoring operator input: {e}"),
                }
            }
            debug!("operator input closed");
            enqueue(&mut producer, ControlEvent::Shutdown);
        })
}

/// Pushes `event`, waiting while the queue is full. Returns `false` once
/// the event loop has dropped its end.
fn enqueue(producer: &mut ControlEventProducer, mut event: ControlEvent) -> bool {
    loop {
        if producer.is_abandoned() {
            return false;
        }
        match producer.push(event) {
            Ok(()) => return true,
            Err(rtrb::PushError::Full(rejected)) => {
                event = rejected;
                thread::sleep(Duration::from_millis(5));
            }
        }
    }
}
