//! Host environment bindings.
//!
//! The coordinator never talks to a real platform directly. Everything it
//! needs from the host - permission checks, asynchronous permission
//! requests, the privileged settings-access screen and the running-process
//! list - goes through the [`Host`] trait, so the sequence can be driven
//! by a fake in tests.
//!
//! Requests are fire-and-return: `request_grant` and
//! `launch_privileged_access_request` must not block. The host delivers the
//! outcome later by calling back into the coordinator.

use core::ops::ControlFlow;

/// Dangerous runtime capabilities the coordinator may ask for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Capability {
    Camera,
}

/// Live grant status reported by the host.
///
/// `Unsupported` replaces platform-version branching: hosts without a
/// runtime permission model hold every grant implicitly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GrantStatus {
    Granted,
    Denied,
    Unsupported,
}

impl GrantStatus {
    /// Returns `true` when the capability can be used right now.
    pub fn is_held(self) -> bool {
        matches!(self, GrantStatus::Granted | GrantStatus::Unsupported)
    }
}

/// Outcome of an asynchronous camera permission request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CameraResult {
    Granted,
    Denied,
    /// The host returned an empty result (dialog dismissed, request
    /// interrupted). Counts as a denial.
    Cancelled,
}

impl CameraResult {
    /// Build from the host's per-permission grant array.
    ///
    /// Only the first entry matters; an empty array means the request was
    /// cancelled.
    pub fn from_grant_results(results: &[bool]) -> Self {
        match results.first() {
            Some(true) => CameraResult::Granted,
            Some(false) => CameraResult::Denied,
            None => CameraResult::Cancelled,
        }
    }

    pub fn is_granted(self) -> bool {
        matches!(self, CameraResult::Granted)
    }
}

impl From<bool> for CameraResult {
    fn from(granted: bool) -> Self {
        if granted {
            CameraResult::Granted
        } else {
            CameraResult::Denied
        }
    }
}

/// Platform capability-request interface.
pub trait Host {
    /// Current grant status of a dangerous permission.
    fn check_grant(&self, capability: Capability) -> GrantStatus;

    /// Ask the user for a permission. The answer arrives later through
    /// [`AccessCoordinator::on_camera_result`](crate::AccessCoordinator::on_camera_result).
    fn request_grant(&mut self, capability: Capability);

    /// Whether the app may currently modify system settings.
    fn check_privileged_access(&self) -> GrantStatus;

    /// Open the host's privileged settings-access screen. Fire-and-forget.
    fn launch_privileged_access_request(&mut self);

    /// Walk the names of the processes/services currently running, in
    /// host order, until `visit` breaks. Every running process must be
    /// offered with its full name; the list is never capped.
    fn for_each_running_process(&self, visit: &mut dyn FnMut(&str) -> ControlFlow<()>);

    /// Stop a running process/service by name.
    fn stop_process(&mut self, name: &str);
}
