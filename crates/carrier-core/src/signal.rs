use std::path::PathBuf;

/// Advisory cancellation signal, polled between unit dispatches.
///
/// The core only ever reads the signal; clearing it is an operator action.
pub trait CancelSignal {
    fn signalled(&self) -> bool;
}

/// Signal backed by the presence of a well-known file. Touching the file
/// stops the run before the next unit; deleting it re-arms future runs.
pub struct StopFile(pub PathBuf);

impl CancelSignal for StopFile {
    fn signalled(&self) -> bool {
        self.0.exists()
    }
}

/// A signal that never fires, for runs with no stop file configured.
pub struct Never;

impl CancelSignal for Never {
    fn signalled(&self) -> bool {
        false
    }
}
