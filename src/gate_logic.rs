use crate::host::GrantStatus;

/// What to do about the camera permission on activation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraStep {
    /// Already held (or no runtime model) - go straight to the privileged step.
    Proceed,
    /// Ask the host and wait for the result callback.
    Request,
}

/// What to do about privileged settings access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrivilegedStep {
    /// Nothing to ask; leave the gate flag alone.
    Skip,
    /// Nothing to ask, but record the prompt as shown.
    SkipAndMark,
    /// Present the yes/no choice.
    Prompt,
}

/// Decide the camera step from the live grant status.
pub fn camera_step(status: GrantStatus) -> CameraStep {
    match status {
        GrantStatus::Denied => CameraStep::Request,
        GrantStatus::Granted | GrantStatus::Unsupported => CameraStep::Proceed,
    }
}

/// Decide the privileged step from the gate flag and the live grant status.
pub fn privileged_step(prompt_shown: bool, privileged: GrantStatus) -> PrivilegedStep {
    if prompt_shown {
        return PrivilegedStep::Skip;
    }

    match privileged {
        GrantStatus::Unsupported => PrivilegedStep::Skip,
        GrantStatus::Granted => PrivilegedStep::SkipAndMark,
        GrantStatus::Denied => PrivilegedStep::Prompt,
    }
}
