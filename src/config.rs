//! Application-wide constants and compile-time configuration.
//!
//! Storage layout, host request codes and service names live here so
//! they can be tuned in one place.

// Host request codes

/// Request code the host echoes back with the camera permission result.
pub const REQUEST_CODE_CAMERA: u16 = 201;

/// Request code the host echoes back when returning from the privileged
/// settings-access screen.
pub const REQUEST_CODE_PRIVILEGED: u16 = 200;

// Background service

/// Name of the background service that must not run while settings are
/// being edited.
pub const BACKGROUND_SERVICE_NAME: &str = "panel.service";

// Gate storage

/// Key for the gate record in the map storage.
pub const KEY_GATE_RECORD: u8 = 0x01;

/// First byte of every serialized gate record. Anything else is treated
/// as corrupt.
pub const GATE_RECORD_FORMAT: u8 = 0xA1;

/// Serialized gate record size: [format][flags].
pub const GATE_RECORD_SIZE: usize = 2;

/// Flash page size (4 KB on nRF52-class parts).
pub const FLASH_PAGE_SIZE: u32 = 4096;

/// Flash page index where gate storage starts.
pub const STORAGE_FLASH_PAGE_START: u32 = 248;

/// Number of flash pages reserved for gate storage.
/// `sequential-storage` needs at least two for its map.
pub const STORAGE_FLASH_PAGE_COUNT: u32 = 2;

/// Scratch buffer used for flash map reads and writes.
pub const STORAGE_BUFFER_SIZE: usize = 32;
