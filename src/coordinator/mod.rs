//! Access coordinator - camera permission, then one-time privileged
//! settings consent.
//!
//! Sequence per activation:
//!
//! ```text
//! Init ──► AwaitingCameraResult ──► AwaitingPrivilegedChoice ──► AwaitingPrivilegedResult ──► Done
//!   │               (optional)              (optional)              (fire-and-forget)          ▲
//!   └──────────────────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stages only move forward within an activation. A new activation
//! (`start()` after `Done`, or after a choice dialog that closed without an
//! answer) begins again at `Init`; the gate store is what carries memory
//! across activations and restarts, so the privileged choice is presented
//! at most once ever. If the store cannot record the choice, the
//! coordinator still remembers it for as long as it lives.
//!
//! Nothing here blocks or fails: every host callback either advances the
//! sequence or is logged and ignored.

mod event;


pub use event::AccessEvent;

use core::ops::ControlFlow;

use crate::error::Error;
use crate::gate_logic::{self, CameraStep, PrivilegedStep};
use crate::host::{CameraResult, Capability, GrantStatus, Host};
use crate::storage::{GateKey, GateStore};
use crate::ui::{Notice, Ui};

/// Position in the access sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Stage {
    Init,
    AwaitingCameraResult,
    AwaitingPrivilegedChoice,
    AwaitingPrivilegedResult,
    Done,
}

/// Transient per-activation state. Never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AccessState {
    stage: Stage,
    camera_granted: Option<bool>,
    privileged_granted: bool,
    camera_requested: bool,
    privileged_launched: bool,
    privileged_reported: bool,
}

impl AccessState {
    const fn new() -> Self {
        Self {
            stage: Stage::Init,
            camera_granted: None,
            privileged_granted: false,
            camera_requested: false,
            privileged_launched: false,
            privileged_reported: false,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Camera outcome, once known.
    pub fn camera_granted(&self) -> Option<bool> {
        self.camera_granted
    }

    /// Live privileged status as of the last check in this activation.
    pub fn privileged_granted(&self) -> bool {
        self.privileged_granted
    }

    /// Whether this activation asked the host for the camera.
    pub fn camera_requested(&self) -> bool {
        self.camera_requested
    }

    /// Whether this activation opened the privileged settings-access screen.
    pub fn privileged_launched(&self) -> bool {
        self.privileged_launched
    }
}

impl Default for AccessState {
    fn default() -> Self {
        Self::new()
    }
}

/// Drives the access sequence against an injected host, UI and gate store.
pub struct AccessCoordinator<H, U, S> {
    host: H,
    ui: U,
    store: S,
    state: AccessState,
    /// Set once the privileged choice has been answered or found moot.
    /// Survives `start()`, so a gate flag write that failed cannot lead to
    /// a second prompt from this coordinator.
    prompt_recorded: bool,
    /// Cleared when the hosting context goes away.
    live: bool,
}

impl<H: Host, U: Ui, S: GateStore> AccessCoordinator<H, U, S> {
    pub fn new(host: H, ui: U, store: S) -> Self {
        Self {
            host,
            ui,
            store,
            state: AccessState::new(),
            prompt_recorded: false,
            live: true,
        }
    }

    /// Begin an activation.
    ///
    /// Ignored while the camera request is outstanding: the host
    /// re-activates the screen when its own permission dialog closes, and
    /// that must not restart the sequence underneath the pending request.
    /// A choice dialog still unanswered at `start()` was lost with the
    /// screen; nothing was recorded for it, so the activation restarts and
    /// may present it again.
    pub fn start(&mut self) {
        if !self.live {
            debug!("Access: start() ignored, coordinator detached");
            return;
        }
        match self.state.stage {
            Stage::AwaitingCameraResult => {
                warn!("Access: start() while awaiting camera result, resuming");
                return;
            }
            Stage::AwaitingPrivilegedChoice => {
                warn!("Access: privileged choice left unanswered, restarting");
            }
            _ => {}
        }

        self.state = AccessState::new();
        info!("Access: activation started");

        let status = self.host.check_grant(Capability::Camera);
        match gate_logic::camera_step(status) {
            CameraStep::Proceed => {
                if status == GrantStatus::Unsupported {
                    debug!("Access: {:?}", Error::HostApiUnavailable(Capability::Camera));
                }
                self.state.camera_granted = Some(true);
                self.evaluate_privileged_access();
            }
            CameraStep::Request => {
                self.state.camera_requested = true;
                self.transition(Stage::AwaitingCameraResult);
                self.host.request_grant(Capability::Camera);
            }
        }
    }

    /// Host callback: the camera permission request resolved.
    ///
    /// Valid only in `AwaitingCameraResult`; duplicates and stray results
    /// are ignored. Granted and denied both move on to the privileged step.
    pub fn on_camera_result(&mut self, result: CameraResult) {
        if !self.accepts(Stage::AwaitingCameraResult) {
            return;
        }

        let granted = result.is_granted();
        self.state.camera_granted = Some(granted);
        if granted {
            self.ui.notify(Notice::CameraGranted);
        } else {
            debug!(
                "Access: {:?} ({:?})",
                Error::PermissionDenied(Capability::Camera),
                result
            );
            self.ui.notify(Notice::CameraDenied);
        }

        self.evaluate_privileged_access();
    }

    /// Boolean form of [`on_camera_result`](Self::on_camera_result).
    pub fn on_camera_granted(&mut self, granted: bool) {
        self.on_camera_result(CameraResult::from(granted));
    }

    /// UI callback: the user answered the privileged-access dialog.
    ///
    /// The gate flag is persisted before anything else, for both answers.
    pub fn on_privileged_choice(&mut self, accepted: bool) {
        if !self.accepts(Stage::AwaitingPrivilegedChoice) {
            return;
        }

        self.persist_prompt_shown();

        if accepted {
            self.transition(Stage::AwaitingPrivilegedResult);
            self.state.privileged_launched = true;
            self.host.launch_privileged_access_request();
        } else {
            debug!("Access: privileged access declined by user");
            self.ui.notify(Notice::PrivilegedDenied);
        }

        self.transition(Stage::Done);
    }

    /// Host callback: the user came back from the privileged settings
    /// screen this activation opened. Reports the live status once; the
    /// stage is not affected.
    pub fn on_privileged_return(&mut self) {
        if !self.live {
            debug!("Access: privileged return ignored, coordinator detached");
            return;
        }
        if !self.state.privileged_launched || self.state.privileged_reported {
            warn!("Access: unexpected privileged return in {:?}", self.state.stage);
            return;
        }

        self.state.privileged_reported = true;
        let status = self.host.check_privileged_access();
        self.state.privileged_granted = status.is_held();
        if self.state.privileged_granted {
            self.ui.notify(Notice::PrivilegedGranted);
        } else {
            self.ui.notify(Notice::PrivilegedDenied);
        }
    }

    /// Dispatch a queued host/UI event.
    pub fn handle(&mut self, event: AccessEvent) {
        trace!("Access: event {:?}", event);
        match event {
            AccessEvent::Start => self.start(),
            AccessEvent::CameraResult(result) => self.on_camera_result(result),
            AccessEvent::PrivilegedChoice(accepted) => self.on_privileged_choice(accepted),
            AccessEvent::PrivilegedReturn => self.on_privileged_return(),
        }
    }

    /// Is a process with exactly this name currently running on the host?
    pub fn is_host_process_active(&self, name: &str) -> bool {
        let mut found = false;
        self.host.for_each_running_process(&mut |running| {
            if running == name {
                found = true;
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        found
    }

    /// Stop the named background service if it is running, so settings can
    /// be edited safely. Returns `true` if a stop was issued.
    pub fn suspend_background_service(&mut self, name: &str) -> bool {
        if !self.is_host_process_active(name) {
            debug!("Access: {} not running", name);
            return false;
        }
        info!("Access: stopping {} before editing settings", name);
        self.host.stop_process(name);
        true
    }

    /// The hosting context is gone. Later callbacks are ignored.
    pub fn detach(&mut self) {
        if self.live {
            info!("Access: detached in {:?}", self.state.stage);
        }
        self.live = false;
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    pub fn stage(&self) -> Stage {
        self.state.stage
    }

    pub fn state(&self) -> &AccessState {
        &self.state
    }

    pub fn is_done(&self) -> bool {
        self.state.stage == Stage::Done
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Tear down, returning the collaborators (e.g. to carry the store into
    /// the next activation).
    pub fn into_parts(self) -> (H, U, S) {
        (self.host, self.ui, self.store)
    }

    /// Entered exactly once per activation: from `start()` when the camera
    /// needs no request, otherwise from `on_camera_result`.
    fn evaluate_privileged_access(&mut self) {
        let privileged = self.host.check_privileged_access();
        self.state.privileged_granted = privileged.is_held();

        // An unreadable flag is treated as set: skipping a prompt is
        // recoverable, prompting twice is not.
        let prompt_shown = self.prompt_recorded
            || match self.store.get(GateKey::PrivilegedPromptShown) {
                Ok(shown) => shown,
                Err(e) => {
                    error!("Access: gate flag unreadable: {:?}", e);
                    true
                }
            };

        match gate_logic::privileged_step(prompt_shown, privileged) {
            PrivilegedStep::Skip => {
                if privileged == GrantStatus::Unsupported {
                    debug!(
                        "Access: privileged settings access has no runtime model on this host"
                    );
                }
                self.transition(Stage::Done);
            }
            PrivilegedStep::SkipAndMark => {
                self.persist_prompt_shown();
                self.transition(Stage::Done);
            }
            PrivilegedStep::Prompt => {
                self.transition(Stage::AwaitingPrivilegedChoice);
                self.ui.present_privileged_choice();
            }
        }
    }

    fn persist_prompt_shown(&mut self) {
        self.prompt_recorded = true;
        match self.store.set(GateKey::PrivilegedPromptShown) {
            Ok(()) => debug!("Access: privileged prompt recorded as shown"),
            Err(e) => error!("Access: failed to persist gate flag: {:?}", e),
        }
    }

    fn accepts(&self, expected: Stage) -> bool {
        if !self.live {
            debug!("Access: callback for {:?} ignored, coordinator detached", expected);
            return false;
        }
        if self.state.stage != expected {
            let violation = Error::ProtocolViolation {
                expected,
                actual: self.state.stage,
            };
            warn!("Access: {:?}", violation);
            return false;
        }
        true
    }

    /// Stages only advance; anything else is refused.
    fn transition(&mut self, next: Stage) {
        if next <= self.state.stage {
            error!(
                "Access: refused transition {:?} -> {:?}",
                self.state.stage, next
            );
            return;
        }
        info!("Access: {:?} -> {:?}", self.state.stage, next);
        self.state.stage = next;
    }
}
