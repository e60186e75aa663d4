//! Settings access gate.
//!
//! Before settings can be edited safely, the settings screen must:
//!
//! 1. obtain the camera permission (asked at most once per activation), then
//! 2. offer the user - at most once, ever - the host's privileged
//!    "modify system settings" grant.
//!
//! [`AccessCoordinator`] runs that sequence as a callback-driven state
//! machine over three injected collaborators: the [`Host`] platform, the
//! [`Ui`] and a durable [`GateStore`]. It never blocks and never fails;
//! host callbacks that arrive out of order are logged and ignored.
//!
//! Usage: `cargo test` runs everything on the host; `cargo test --features
//! embedded` adds the flash-backed gate store against an in-RAM flash.
//! Device builds enable `embedded,defmt`; hosted builds can enable `log` to
//! route diagnostics through the `log` facade.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod config;
pub mod coordinator;
pub mod error;
pub mod gate_logic;
pub mod host;
pub mod storage;
pub mod ui;

pub use coordinator::{AccessCoordinator, AccessEvent, AccessState, Stage};
pub use error::{Error, Result, StorageError};
pub use host::{CameraResult, Capability, GrantStatus, Host};
#[cfg(feature = "embedded")]
pub use storage::FlashGateStore;
pub use storage::{GateKey, GateRecord, GateStore, MemoryGateStore};
pub use ui::{Notice, Ui};

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::config::{GATE_RECORD_FORMAT, GATE_RECORD_SIZE};
    use super::gate_logic::*;
    use super::*;

    // ════════════════════════════════════════════════════════════════════════
    // Gate Logic Tests
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn camera_step_requests_only_when_denied() {
        assert_eq!(camera_step(GrantStatus::Denied), CameraStep::Request);
        assert_eq!(camera_step(GrantStatus::Granted), CameraStep::Proceed);
        assert_eq!(camera_step(GrantStatus::Unsupported), CameraStep::Proceed);
    }

    #[test]
    fn privileged_step_skips_once_prompt_shown() {
        for status in [
            GrantStatus::Granted,
            GrantStatus::Denied,
            GrantStatus::Unsupported,
        ] {
            assert_eq!(privileged_step(true, status), PrivilegedStep::Skip);
        }
    }

    #[test]
    fn privileged_step_marks_when_already_granted() {
        assert_eq!(
            privileged_step(false, GrantStatus::Granted),
            PrivilegedStep::SkipAndMark
        );
    }

    #[test]
    fn privileged_step_prompts_when_unset_and_denied() {
        assert_eq!(
            privileged_step(false, GrantStatus::Denied),
            PrivilegedStep::Prompt
        );
    }

    #[test]
    fn privileged_step_leaves_flag_alone_without_runtime_model() {
        assert_eq!(
            privileged_step(false, GrantStatus::Unsupported),
            PrivilegedStep::Skip
        );
    }

    // ════════════════════════════════════════════════════════════════════════
    // Host Type Tests
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn grant_status_held() {
        assert!(GrantStatus::Granted.is_held());
        assert!(GrantStatus::Unsupported.is_held());
        assert!(!GrantStatus::Denied.is_held());
    }

    #[test]
    fn camera_result_from_grant_results() {
        assert_eq!(CameraResult::from_grant_results(&[true]), CameraResult::Granted);
        assert_eq!(CameraResult::from_grant_results(&[false]), CameraResult::Denied);
        assert_eq!(CameraResult::from_grant_results(&[]), CameraResult::Cancelled);
        assert!(!CameraResult::Cancelled.is_granted());
        assert_eq!(CameraResult::from(true), CameraResult::Granted);
        assert_eq!(CameraResult::from(false), CameraResult::Denied);
    }

    // ════════════════════════════════════════════════════════════════════════
    // Gate Record / Store Tests
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn gate_record_starts_unset() {
        let record = GateRecord::new();
        assert!(!record.get(GateKey::PrivilegedPromptShown));
        assert_eq!(record, GateRecord::default());
    }

    #[test]
    fn gate_record_mark_reports_change_once() {
        let mut record = GateRecord::new();
        assert!(record.mark(GateKey::PrivilegedPromptShown));
        assert!(!record.mark(GateKey::PrivilegedPromptShown));
        assert!(record.get(GateKey::PrivilegedPromptShown));
    }

    #[test]
    fn gate_record_serialize_layout() {
        let mut record = GateRecord::new();
        record.mark(GateKey::PrivilegedPromptShown);
        let mut buf = [0u8; 4];
        let written = record.serialize(&mut buf);
        assert_eq!(written, GATE_RECORD_SIZE);
        assert_eq!(buf[..written], [GATE_RECORD_FORMAT, 0x01]);
    }

    #[test]
    fn gate_record_serialize_buffer_too_small() {
        let mut buf = [0u8; 1];
        assert_eq!(GateRecord::new().serialize(&mut buf), 0);
    }

    #[test]
    fn gate_record_rejects_foreign_bytes() {
        assert!(GateRecord::deserialize(&[]).is_none());
        assert!(GateRecord::deserialize(&[GATE_RECORD_FORMAT]).is_none());
        assert!(GateRecord::deserialize(&[0xFF, 0x01]).is_none());
        // Extra bytes are ignored.
        let record = GateRecord::deserialize(&[GATE_RECORD_FORMAT, 0x01, 0xEE]).unwrap();
        assert!(record.get(GateKey::PrivilegedPromptShown));
    }

    #[test]
    fn memory_store_set_is_monotonic() {
        let mut store = MemoryGateStore::new();
        assert_eq!(store.get(GateKey::PrivilegedPromptShown), Ok(false));

        store.set(GateKey::PrivilegedPromptShown).unwrap();
        store.set(GateKey::PrivilegedPromptShown).unwrap();

        assert_eq!(store.get(GateKey::PrivilegedPromptShown), Ok(true));
        assert_eq!(store.writes(), 1);
        assert_eq!(store.bytes(), Some([GATE_RECORD_FORMAT, 0x01]));
    }

    #[test]
    fn memory_store_seeded_from_previous_run() {
        let mut store = MemoryGateStore::with_flag(GateKey::PrivilegedPromptShown);
        assert_eq!(store.get(GateKey::PrivilegedPromptShown), Ok(true));
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn memory_store_reports_failures() {
        let mut store = MemoryGateStore::new();
        store.set_fail_writes(true);
        assert_eq!(
            store.set(GateKey::PrivilegedPromptShown),
            Err(Error::Storage(StorageError::Write))
        );
        assert_eq!(store.bytes(), None);

        store.set_fail_reads(true);
        assert_eq!(
            store.get(GateKey::PrivilegedPromptShown),
            Err(Error::Storage(StorageError::Read))
        );

        let mut corrupt = MemoryGateStore::from_bytes([0x00, 0x01]);
        assert_eq!(
            corrupt.get(GateKey::PrivilegedPromptShown),
            Err(Error::Storage(StorageError::Corrupt))
        );
    }

    #[test]
    fn memory_store_keeps_flag_after_failed_write() {
        let mut store = MemoryGateStore::new();
        store.set_fail_writes(true);
        assert!(store.set(GateKey::PrivilegedPromptShown).is_err());
        assert!(store.set(GateKey::PrivilegedPromptShown).is_err());

        // Reads see the flag even though nothing is stored yet.
        assert_eq!(store.get(GateKey::PrivilegedPromptShown), Ok(true));
        assert_eq!(store.writes(), 0);

        // The next set writes the held-back record.
        store.set_fail_writes(false);
        store.set(GateKey::PrivilegedPromptShown).unwrap();
        assert_eq!(store.writes(), 1);
        assert_eq!(store.bytes(), Some([GATE_RECORD_FORMAT, 0x01]));

        store.set(GateKey::PrivilegedPromptShown).unwrap();
        assert_eq!(store.writes(), 1);
    }

    #[test]
    fn store_usable_through_mutable_reference() {
        fn mark<S: GateStore>(mut store: S) -> Result<()> {
            store.set(GateKey::PrivilegedPromptShown)
        }

        let mut store = MemoryGateStore::new();
        mark(&mut store).unwrap();
        assert_eq!(store.writes(), 1);
    }

    // ════════════════════════════════════════════════════════════════════════
    // Notice / Error Tests
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn notices_have_messages() {
        for notice in [
            Notice::CameraGranted,
            Notice::CameraDenied,
            Notice::PrivilegedGranted,
            Notice::PrivilegedDenied,
        ] {
            assert!(!notice.message().is_empty());
        }
        assert!(Notice::CameraDenied.is_denial());
        assert!(!Notice::PrivilegedGranted.is_denial());
        assert!(!ui::PRIVILEGED_CHOICE_MESSAGE.is_empty());
    }

    #[test]
    fn error_display_names_the_stages() {
        let e = Error::ProtocolViolation {
            expected: Stage::AwaitingCameraResult,
            actual: Stage::Done,
        };
        assert_eq!(
            e.to_string(),
            "protocol violation: expected AwaitingCameraResult, was Done"
        );
        assert_eq!(
            Error::from(StorageError::Corrupt),
            Error::Storage(StorageError::Corrupt)
        );
    }
}
