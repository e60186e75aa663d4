use crate::config::{REQUEST_CODE_CAMERA, REQUEST_CODE_PRIVILEGED};
use crate::host::CameraResult;

/// Host and UI deliveries, for hosts that queue callbacks instead of
/// calling the coordinator directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccessEvent {
    /// The settings screen became active.
    Start,
    /// Camera permission request resolved.
    CameraResult(CameraResult),
    /// User answered the privileged-access dialog.
    PrivilegedChoice(bool),
    /// User returned from the privileged settings-access screen.
    PrivilegedReturn,
}

impl AccessEvent {
    /// Map a host result keyed by request code.
    ///
    /// `grant_results` is only consulted for the camera request; an empty
    /// slice there means the request was cancelled. Unknown codes belong to
    /// someone else and map to `None`.
    pub fn from_host_result(request_code: u16, grant_results: &[bool]) -> Option<Self> {
        match request_code {
            REQUEST_CODE_CAMERA => Some(AccessEvent::CameraResult(
                CameraResult::from_grant_results(grant_results),
            )),
            REQUEST_CODE_PRIVILEGED => Some(AccessEvent::PrivilegedReturn),
            _ => None,
        }
    }
}
