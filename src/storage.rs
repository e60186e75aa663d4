//! Persistent gate storage.
//!
//! Holds the durable, process-independent flags the access coordinator
//! consults - today a single one: whether the privileged settings-access
//! prompt has already been shown. Flags only ever go from unset to set.
//!
//! Storage layout:
//!   - One serialized `GateRecord` stored under `KEY_GATE_RECORD`.
//!   - Format: `[GATE_RECORD_FORMAT][flags]`. A record with any other
//!     format byte is reported as corrupt.
//!
//! Two backends:
//!   - [`MemoryGateStore`] - in-memory, for tests and hosts that persist
//!     the record bytes themselves.
//!   - `FlashGateStore` (feature `embedded`) - internal NOR flash via the
//!     `sequential-storage` crate, which handles wear levelling and GC.

use crate::config::{GATE_RECORD_FORMAT, GATE_RECORD_SIZE};
use crate::error::{Result, StorageError};

/// Durable flags kept by the gate store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GateKey {
    /// The privileged settings-access choice has been presented (or there
    /// was nothing to ask).
    PrivilegedPromptShown,
}

impl GateKey {
    const fn mask(self) -> u8 {
        match self {
            GateKey::PrivilegedPromptShown => 1 << 0,
        }
    }
}

/// Key/value store for gate flags.
///
/// `set` only ever writes `true`. It must not return `Ok` before the value
/// is durable: a crash between prompting and persisting would otherwise
/// re-prompt the user.
pub trait GateStore {
    /// Read a flag. Unset flags read as `false`.
    fn get(&mut self, key: GateKey) -> Result<bool>;

    /// Durably set a flag to `true`. Setting an already-set flag is a no-op.
    fn set(&mut self, key: GateKey) -> Result<()>;
}

impl<S: GateStore + ?Sized> GateStore for &mut S {
    fn get(&mut self, key: GateKey) -> Result<bool> {
        (**self).get(key)
    }

    fn set(&mut self, key: GateKey) -> Result<()> {
        (**self).set(key)
    }
}

/// All gate flags packed into one record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GateRecord {
    flags: u8,
}

impl GateRecord {
    /// A record with no flags set.
    pub const fn new() -> Self {
        Self { flags: 0 }
    }

    pub fn get(&self, key: GateKey) -> bool {
        self.flags & key.mask() != 0
    }

    /// Set a flag. Returns `true` if the record changed.
    pub fn mark(&mut self, key: GateKey) -> bool {
        if self.get(key) {
            return false;
        }
        self.flags |= key.mask();
        true
    }

    /// Serialize to bytes for storage.
    /// Returns the number of bytes written (0 if `buf` is too small).
    pub fn serialize(&self, buf: &mut [u8]) -> usize {
        if buf.len() < GATE_RECORD_SIZE {
            return 0;
        }
        buf[0] = GATE_RECORD_FORMAT;
        buf[1] = self.flags;
        GATE_RECORD_SIZE
    }

    /// Deserialize from bytes. Extra trailing bytes are ignored.
    pub fn deserialize(data: &[u8]) -> Option<Self> {
        if data.len() < GATE_RECORD_SIZE || data[0] != GATE_RECORD_FORMAT {
            return None;
        }
        Some(Self { flags: data[1] })
    }
}

/// In-memory gate store.
///
/// Keeps the serialized record bytes rather than the decoded record so
/// reads go through the same decode path as the flash backend. A record
/// whose write failed is held back and served to reads, then retried by
/// the next `set`, as the flash backend does with its cache.
#[derive(Clone, Debug, Default)]
pub struct MemoryGateStore {
    bytes: Option<[u8; GATE_RECORD_SIZE]>,
    /// Marked record not yet written (a write failed).
    unsaved: Option<GateRecord>,
    writes: usize,
    fail_reads: bool,
    fail_writes: bool,
}

impl MemoryGateStore {
    /// Create an empty store (fresh install).
    pub const fn new() -> Self {
        Self {
            bytes: None,
            unsaved: None,
            writes: 0,
            fail_reads: false,
            fail_writes: false,
        }
    }

    /// Create a store where the given flag was set by a previous run.
    pub fn with_flag(key: GateKey) -> Self {
        let mut record = GateRecord::new();
        record.mark(key);
        let mut bytes = [0u8; GATE_RECORD_SIZE];
        record.serialize(&mut bytes);
        Self {
            bytes: Some(bytes),
            ..Self::new()
        }
    }

    /// Create a store holding raw record bytes (possibly corrupt).
    pub fn from_bytes(raw: [u8; GATE_RECORD_SIZE]) -> Self {
        Self {
            bytes: Some(raw),
            ..Self::new()
        }
    }

    /// Raw stored bytes, if anything has been written. A record held back
    /// by a failed write is not included.
    pub fn bytes(&self) -> Option<[u8; GATE_RECORD_SIZE]> {
        self.bytes
    }

    /// Number of writes that actually changed the stored record.
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Make subsequent reads fail.
    pub fn set_fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Make subsequent writes fail.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    fn load(&self) -> Result<GateRecord> {
        if self.fail_reads {
            return Err(StorageError::Read.into());
        }
        if let Some(record) = self.unsaved {
            return Ok(record);
        }
        match self.bytes {
            Some(bytes) => GateRecord::deserialize(&bytes).ok_or(StorageError::Corrupt.into()),
            None => Ok(GateRecord::new()),
        }
    }
}

impl GateStore for MemoryGateStore {
    fn get(&mut self, key: GateKey) -> Result<bool> {
        Ok(self.load()?.get(key))
    }

    fn set(&mut self, key: GateKey) -> Result<()> {
        let mut record = self.load()?;
        if !record.mark(key) && self.unsaved.is_none() {
            return Ok(());
        }
        if self.fail_writes {
            self.unsaved = Some(record);
            return Err(StorageError::Write.into());
        }

        let mut bytes = [0u8; GATE_RECORD_SIZE];
        record.serialize(&mut bytes);
        self.bytes = Some(bytes);
        self.unsaved = None;
        self.writes += 1;
        debug!("Gate store: {:?} set", key);
        Ok(())
    }
}

#[cfg(feature = "embedded")]
pub use flash::FlashGateStore;

#[cfg(feature = "embedded")]
mod flash {
    use core::ops::Range;

    use embedded_storage_async::nor_flash::NorFlash;
    use sequential_storage::cache::NoCache;

    use super::{GateKey, GateRecord, GateStore};
    use crate::config::{
        FLASH_PAGE_SIZE, GATE_RECORD_SIZE, KEY_GATE_RECORD, STORAGE_BUFFER_SIZE,
        STORAGE_FLASH_PAGE_COUNT, STORAGE_FLASH_PAGE_START,
    };
    use crate::error::{Result, StorageError};

    /// Start address of our storage region.
    const STORAGE_START: u32 = STORAGE_FLASH_PAGE_START * FLASH_PAGE_SIZE;

    /// End address (exclusive) of our storage region.
    const STORAGE_END: u32 =
        (STORAGE_FLASH_PAGE_START + STORAGE_FLASH_PAGE_COUNT) * FLASH_PAGE_SIZE;

    const FLASH_RANGE: Range<u32> = STORAGE_START..STORAGE_END;

    /// Gate store on internal flash, with an in-memory copy of the record.
    ///
    /// Writes go straight through: `set` blocks until `sequential-storage`
    /// has committed the record. If the write fails the cached record stays
    /// marked, so reads keep reporting the flag and the next `set` retries.
    ///
    /// `GateStore` is synchronous, so every call drives the flash future to
    /// completion with `embassy_futures::block_on`, polling on the calling
    /// thread. Only use drivers whose operations complete on their own
    /// (e.g. the blocking NVMC driver behind an async wrapper). A driver that
    /// waits on another executor task, such as SoftDevice flash whose
    /// completion event is dispatched elsewhere, never completes here.
    pub struct FlashGateStore<F> {
        flash: F,
        /// Last record read from or written to flash.
        cached: Option<GateRecord>,
        /// True if `cached` differs from flash (a write failed).
        dirty: bool,
    }

    impl<F: NorFlash> FlashGateStore<F> {
        pub const fn new(flash: F) -> Self {
            Self {
                flash,
                cached: None,
                dirty: false,
            }
        }

        /// Release the flash peripheral.
        pub fn into_inner(self) -> F {
            self.flash
        }

        async fn load_from_flash(&mut self) -> Result<GateRecord> {
            if let Some(record) = self.cached {
                return Ok(record);
            }

            let mut buf = [0u8; STORAGE_BUFFER_SIZE];
            let record = match sequential_storage::map::fetch_item::<u8, &[u8], _>(
                &mut self.flash,
                FLASH_RANGE,
                &mut NoCache::new(),
                &mut buf,
                &KEY_GATE_RECORD,
            )
            .await
            {
                Ok(Some(data)) => match GateRecord::deserialize(data) {
                    Some(record) => record,
                    None => {
                        error!("Gate record in flash does not decode");
                        return Err(StorageError::Corrupt.into());
                    }
                },
                Ok(None) => {
                    info!("No gate record in flash");
                    GateRecord::new()
                }
                Err(e) => {
                    log_flash_error("read", &e);
                    return Err(StorageError::Read.into());
                }
            };

            self.cached = Some(record);
            self.dirty = false;
            Ok(record)
        }

        async fn save_to_flash(&mut self, record: GateRecord) -> Result<()> {
            self.cached = Some(record);
            self.dirty = true;

            let mut buf = [0u8; STORAGE_BUFFER_SIZE];
            let mut data_buf = [0u8; GATE_RECORD_SIZE];
            let len = record.serialize(&mut data_buf);
            let item = &data_buf[..len];

            match sequential_storage::map::store_item::<u8, &[u8], _>(
                &mut self.flash,
                FLASH_RANGE,
                &mut NoCache::new(),
                &mut buf,
                &KEY_GATE_RECORD,
                &item,
            )
            .await
            {
                Ok(()) => {
                    info!("Saved gate record to flash");
                    self.dirty = false;
                    Ok(())
                }
                Err(e) => {
                    log_flash_error("write", &e);
                    Err(StorageError::Write.into())
                }
            }
        }
    }

    fn log_flash_error<E: core::fmt::Debug>(op: &str, e: &E) {
        #[cfg(feature = "defmt")]
        error!("Flash {} error: {:?}", op, defmt::Debug2Format(e));
        #[cfg(not(feature = "defmt"))]
        error!("Flash {} error: {:?}", op, e);
    }

    impl<F: NorFlash> GateStore for FlashGateStore<F> {
        fn get(&mut self, key: GateKey) -> Result<bool> {
            let record = embassy_futures::block_on(self.load_from_flash())?;
            Ok(record.get(key))
        }

        fn set(&mut self, key: GateKey) -> Result<()> {
            let mut record = embassy_futures::block_on(self.load_from_flash())?;
            // A previous failed write left the cache ahead of flash; retry it.
            if !record.mark(key) && !self.dirty {
                return Ok(());
            }
            embassy_futures::block_on(self.save_to_flash(record))
        }
    }
}
