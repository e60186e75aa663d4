//! User interface collaborator - choice dialog + outcome notices.
//!
//! The coordinator only decides *when* to show something. Rendering the
//! dialog and the notices belongs to the host UI, which reports the user's
//! answer back through
//! [`AccessCoordinator::on_privileged_choice`](crate::AccessCoordinator::on_privileged_choice).

pub mod notice;

pub use notice::{Notice, PRIVILEGED_CHOICE_MESSAGE};

/// Host UI surface used by the coordinator.
pub trait Ui {
    /// Show the yes/no dialog asking for privileged settings access.
    /// Must return immediately; the answer is delivered later.
    ///
    /// A dialog the user dismisses (back gesture, tap outside) should be
    /// reported as `on_privileged_choice(false)` so it counts as shown. A
    /// dialog that disappears with its screen needs no report: the next
    /// `start()` restarts the activation and may present it again.
    fn present_privileged_choice(&mut self);

    /// Show a transient outcome notice.
    fn notify(&mut self, notice: Notice);
}
