//! Actuation queue port: where therapy commands are sent.

use looprule_domain::command::Command;

use crate::callback::Callback;

/// External queue that carries out therapy commands.
///
/// `enqueue` returns immediately. The implementation must complete the
/// callback exactly once, now or after the command resolves; dropping it
/// counts as a failure.
pub trait ActuationQueue {
    /// Submit a command.
    fn enqueue(&self, command: Command, callback: Callback);
}

impl<T: ActuationQueue + ?Sized> ActuationQueue for std::sync::Arc<T> {
    fn enqueue(&self, command: Command, callback: Callback) {
        (**self).enqueue(command, callback);
    }
}
