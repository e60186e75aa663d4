/// Body of the yes/no dialog asking for privileged settings access.
pub const PRIVILEGED_CHOICE_MESSAGE: &str =
    "To control screen brightness this app needs permission to modify system settings. Open the settings screen now?";

/// User-visible outcome notices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Notice {
    CameraGranted,
    CameraDenied,
    PrivilegedGranted,
    PrivilegedDenied,
}

impl Notice {
    /// Default message text for hosts without their own string table.
    pub const fn message(self) -> &'static str {
        match self {
            Notice::CameraGranted => "Camera permission granted.",
            Notice::CameraDenied => "Camera permission denied, camera features are disabled.",
            Notice::PrivilegedGranted => "Permission to modify system settings granted.",
            Notice::PrivilegedDenied => {
                "Permission to modify system settings denied, screen brightness cannot be changed."
            }
        }
    }

    /// Returns `true` for notices reporting a refusal.
    pub const fn is_denial(self) -> bool {
        matches!(self, Notice::CameraDenied | Notice::PrivilegedDenied)
    }
}
