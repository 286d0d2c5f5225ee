//! Device credentials in the last sector of a writable data partition.
//!
//! Record layout (little endian, word aligned):
//!
//! | bytes | field |
//! |---|---|
//! | 0..4 | magic `NPC1` |
//! | 4 | version |
//! | 5 | client id length |
//! | 6 | client secret length |
//! | 8..10 | refresh token length |
//! | 12..60 | client id |
//! | 60..108 | client secret |
//! | 108..508 | refresh token |
//! | 508..512 | FNV-1a checksum of bytes 0..508 |

use core::ops::Range;

use embedded_storage::{ReadStorage, Storage};
use esp_bootloader_esp_idf::partitions::{
    DataPartitionSubType, PARTITION_TABLE_MAX_LEN, PartitionType, read_partition_table,
};
use esp_rom_sys::rom::spiflash::{
    ESP_ROM_SPIFLASH_RESULT_OK, esp_rom_spiflash_erase_sector, esp_rom_spiflash_read,
    esp_rom_spiflash_unlock, esp_rom_spiflash_write,
};
use log::{debug, info};
use nowplaying_core::settings::{
    CLIENT_ID_BYTES, CLIENT_SECRET_BYTES, CredentialStore, DeviceCredentials, REFRESH_TOKEN_BYTES,
};

const FLASH_SECTOR_SIZE: u32 = 4096;
const DEFAULT_FLASH_CAPACITY_BYTES: usize = 4 * 1024 * 1024;

const RECORD_MAGIC: u32 = 0x3143_504E; // "NPC1"
const RECORD_VERSION: u8 = 1;
const RECORD_LEN: usize = 512;
const CHECKSUM_AT: usize = RECORD_LEN - 4;

const CLIENT_ID_FIELD: Range<usize> = 12..12 + CLIENT_ID_BYTES;
const CLIENT_SECRET_FIELD: Range<usize> = CLIENT_ID_FIELD.end..CLIENT_ID_FIELD.end + CLIENT_SECRET_BYTES;
const REFRESH_TOKEN_FIELD: Range<usize> =
    CLIENT_SECRET_FIELD.end..CLIENT_SECRET_FIELD.end + REFRESH_TOKEN_BYTES;

const _: () = assert!(REFRESH_TOKEN_FIELD.end <= CHECKSUM_AT);

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FlashSettingsError {
    PartitionTable,
    SettingsPartitionMissing,
    PartitionTooSmall,
    FlashOpFailed(i32),
    Corrupted,
    Unsupported,
}

/// ROM flash routines, word addressed.
#[derive(Debug)]
struct RawFlash;

impl RawFlash {
    fn new() -> Result<Self, FlashSettingsError> {
        let rc = unsafe { esp_rom_spiflash_unlock() };
        check(rc)?;
        Ok(Self)
    }

    fn erase_sector(&mut self, sector_addr: u32) -> Result<(), FlashSettingsError> {
        if !sector_addr.is_multiple_of(FLASH_SECTOR_SIZE) {
            return Err(FlashSettingsError::Unsupported);
        }
        check(unsafe { esp_rom_spiflash_erase_sector(sector_addr / FLASH_SECTOR_SIZE) })
    }

    fn read_aligned(&mut self, addr: u32, out: &mut [u8]) -> Result<(), FlashSettingsError> {
        if !addr.is_multiple_of(4) {
            return Err(FlashSettingsError::Unsupported);
        }

        for (index, chunk) in out.chunks_mut(4).enumerate() {
            let mut word = 0u32;
            let word_addr = addr + index as u32 * 4;
            check(unsafe {
                esp_rom_spiflash_read(word_addr, &mut word as *mut u32 as *const u32, 4)
            })?;
            chunk.copy_from_slice(&word.to_le_bytes()[..chunk.len()]);
        }
        Ok(())
    }

    /// Writes into an erased area; a trailing partial word is padded with 0xFF.
    fn write_aligned(&mut self, addr: u32, data: &[u8]) -> Result<(), FlashSettingsError> {
        if !addr.is_multiple_of(4) {
            return Err(FlashSettingsError::Unsupported);
        }

        for (index, chunk) in data.chunks(4).enumerate() {
            let mut bytes = [0xFFu8; 4];
            bytes[..chunk.len()].copy_from_slice(chunk);
            let word = u32::from_le_bytes(bytes);
            let word_addr = addr + index as u32 * 4;
            check(unsafe { esp_rom_spiflash_write(word_addr, &word as *const u32, 4) })?;
        }
        Ok(())
    }
}

fn check(rc: i32) -> Result<(), FlashSettingsError> {
    if rc == ESP_ROM_SPIFLASH_RESULT_OK {
        Ok(())
    } else {
        Err(FlashSettingsError::FlashOpFailed(rc))
    }
}

impl ReadStorage for RawFlash {
    type Error = FlashSettingsError;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        self.read_aligned(offset, bytes)
    }

    fn capacity(&self) -> usize {
        DEFAULT_FLASH_CAPACITY_BYTES
    }
}

impl Storage for RawFlash {
    fn write(&mut self, _offset: u32, _bytes: &[u8]) -> Result<(), Self::Error> {
        Err(FlashSettingsError::Unsupported)
    }
}

#[derive(Debug)]
pub struct FlashSettingsStore {
    flash: RawFlash,
    record_addr: u32,
}

impl FlashSettingsStore {
    /// Locates the record sector: the first undefined data partition, else the
    /// first NVS partition.
    pub fn new() -> Result<Self, FlashSettingsError> {
        let mut flash = RawFlash::new()?;

        let mut table_buf = [0u8; PARTITION_TABLE_MAX_LEN];
        let table = read_partition_table(&mut flash, &mut table_buf)
            .map_err(|_| FlashSettingsError::PartitionTable)?;

        let mut undefined = None;
        let mut nvs = None;
        for entry in table.iter().filter(|entry| !entry.is_read_only()) {
            match entry.partition_type() {
                PartitionType::Data(DataPartitionSubType::Undefined) if undefined.is_none() => {
                    undefined = Some((entry.offset(), entry.len()));
                }
                PartitionType::Data(DataPartitionSubType::Nvs) if nvs.is_none() => {
                    nvs = Some((entry.offset(), entry.len()));
                }
                _ => {}
            }
        }

        let (offset, len) = undefined
            .or(nvs)
            .ok_or(FlashSettingsError::SettingsPartitionMissing)?;
        if len < FLASH_SECTOR_SIZE {
            return Err(FlashSettingsError::PartitionTooSmall);
        }

        let record_addr = offset + len - FLASH_SECTOR_SIZE;
        info!(
            "settings: credential record at 0x{:08x} (partition 0x{:08x}+{})",
            record_addr, offset, len
        );
        Ok(Self { flash, record_addr })
    }
}

impl CredentialStore for FlashSettingsStore {
    type Error = FlashSettingsError;

    fn load(&mut self) -> Result<Option<DeviceCredentials>, Self::Error> {
        let mut buf = [0u8; RECORD_LEN];
        self.flash.read_aligned(self.record_addr, &mut buf)?;

        if buf.iter().all(|byte| *byte == 0xFF) {
            return Ok(None);
        }
        if read_u32(&buf, 0) != RECORD_MAGIC || buf[4] != RECORD_VERSION {
            debug!("settings: foreign record ignored");
            return Ok(None);
        }
        if read_u32(&buf, CHECKSUM_AT) != checksum32(&buf[..CHECKSUM_AT]) {
            return Err(FlashSettingsError::Corrupted);
        }

        let token_len = u16::from_le_bytes([buf[8], buf[9]]) as usize;
        let client_id = field(&buf, CLIENT_ID_FIELD, buf[5] as usize)?;
        let client_secret = field(&buf, CLIENT_SECRET_FIELD, buf[6] as usize)?;
        let refresh_token = field(&buf, REFRESH_TOKEN_FIELD, token_len)?;

        DeviceCredentials::new(client_id, client_secret, refresh_token)
            .map(Some)
            .map_err(|_| FlashSettingsError::Corrupted)
    }

    fn save(&mut self, credentials: &DeviceCredentials) -> Result<(), Self::Error> {
        let mut buf = [0u8; RECORD_LEN];
        buf[0..4].copy_from_slice(&RECORD_MAGIC.to_le_bytes());
        buf[4] = RECORD_VERSION;
        buf[5] = credentials.client_id.len() as u8;
        buf[6] = credentials.client_secret.len() as u8;
        buf[8..10].copy_from_slice(&(credentials.refresh_token.len() as u16).to_le_bytes());
        put_field(&mut buf, CLIENT_ID_FIELD, &credentials.client_id);
        put_field(&mut buf, CLIENT_SECRET_FIELD, &credentials.client_secret);
        put_field(&mut buf, REFRESH_TOKEN_FIELD, &credentials.refresh_token);
        let checksum = checksum32(&buf[..CHECKSUM_AT]);
        buf[CHECKSUM_AT..].copy_from_slice(&checksum.to_le_bytes());

        self.flash.erase_sector(self.record_addr)?;
        self.flash.write_aligned(self.record_addr, &buf)?;
        info!(
            "settings: credentials saved refresh_token={}",
            credentials.has_refresh_token()
        );
        Ok(())
    }
}

fn read_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

fn field(buf: &[u8], range: Range<usize>, len: usize) -> Result<&str, FlashSettingsError> {
    if len > range.len() {
        return Err(FlashSettingsError::Corrupted);
    }
    core::str::from_utf8(&buf[range.start..range.start + len])
        .map_err(|_| FlashSettingsError::Corrupted)
}

fn put_field(buf: &mut [u8], range: Range<usize>, value: &str) {
    buf[range.start..range.start + value.len()].copy_from_slice(value.as_bytes());
}

fn checksum32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0x811C_9DC5u32, |hash, byte| {
        (hash ^ *byte as u32).wrapping_mul(16_777_619)
    })
}
