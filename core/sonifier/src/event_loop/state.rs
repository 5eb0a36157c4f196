/// Where the event loop is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    /// Waiting for a start command; the poll wait is a plain timer.
    Idle,
    /// A source session is running and its output is being consumed.
    Streaming,
    /// Shutdown was requested; the sink is being drained and closed.
    ShuttingDown,
    Terminated,
}
