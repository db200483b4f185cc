//! Central directory parsing.
//!
//! An archive is read from its tail: the End of Central Directory record
//! (and, for ZIP64 archives, its 64-bit counterpart) says where the central
//! directory lives, and the central directory describes every entry. Entry
//! data is only located, through its local header, when it is about to be
//! streamed.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};
use std::sync::Arc;

use crate::io::ReadAt;
use anyhow::{Result, bail};

use super::structures::*;

/// Longest archive comment the format can express
const MAX_COMMENT_SIZE: u64 = 65535;

/// ZIP64 extended information extra field
const ZIP64_EXTRA_ID: u16 = 0x0001;

/// Placeholder for a 32-bit field whose real value sits in the ZIP64 extra field
const ZIP64_MARKER: u64 = 0xFFFF_FFFF;

/// Offset of the name length within a local file header
const LFH_NAME_LEN_OFFSET: u64 = 26;

/// Reads archive metadata from any [`ReadAt`] source.
///
/// Every offset taken from the archive is checked against its size before
/// anything is read or allocated, so a damaged table fails with an error.
pub struct ZipParser<R: ReadAt> {
    reader: Arc<R>,
    size: u64,
}

impl<R: ReadAt> ZipParser<R> {
    pub fn new(reader: Arc<R>) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    /// Locate the End of Central Directory record and return it with its offset.
    async fn find_eocd(&self) -> Result<(EndOfCentralDirectory, u64)> {
        let record = EndOfCentralDirectory::SIZE as u64;

        // Most archives carry no comment, so the record is the last 22 bytes
        if self.size >= record {
            let offset = self.size - record;
            let mut buf = vec![0u8; EndOfCentralDirectory::SIZE];
            self.reader.read_exact_at(offset, &mut buf).await?;
            if &buf[0..4] == EndOfCentralDirectory::SIGNATURE && buf[20..22] == [0, 0] {
                return Ok((EndOfCentralDirectory::from_bytes(&buf)?, offset));
            }
        }

        let window = (MAX_COMMENT_SIZE + record).min(self.size);
        let window_start = self.size - window;
        let mut buf = vec![0u8; window as usize];
        self.reader.read_exact_at(window_start, &mut buf).await?;

        // The last signature whose comment length reaches exactly to the end
        let tail = buf.len().saturating_sub(EndOfCentralDirectory::SIZE);
        for i in (0..=tail).rev() {
            let Some(candidate) = buf.get(i..i + EndOfCentralDirectory::SIZE) else {
                continue;
            };
            if &candidate[0..4] != EndOfCentralDirectory::SIGNATURE {
                continue;
            }
            let comment_len = u16::from_le_bytes([candidate[20], candidate[21]]) as usize;
            if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                let eocd = EndOfCentralDirectory::from_bytes(candidate)?;
                return Ok((eocd, window_start + i as u64));
            }
        }

        bail!("Not a valid ZIP file")
    }

    /// The ZIP64 record, found through the locator just before the EOCD
    async fn read_zip64_eocd(&self, eocd_offset: u64) -> Result<Zip64EOCD> {
        let Some(locator_offset) = eocd_offset.checked_sub(Zip64EOCDLocator::SIZE as u64) else {
            bail!("Invalid ZIP64 format");
        };
        let mut locator_buf = vec![0u8; Zip64EOCDLocator::SIZE];
        self.reader
            .read_exact_at(locator_offset, &mut locator_buf)
            .await?;
        let locator = Zip64EOCDLocator::from_bytes(&locator_buf)?;

        let mut record = vec![0u8; Zip64EOCD::MIN_SIZE];
        self.reader
            .read_exact_at(locator.eocd64_offset, &mut record)
            .await?;
        Zip64EOCD::from_bytes(&record)
    }

    /// Every entry recorded in the central directory, in table order.
    pub async fn central_directory(&self) -> Result<Vec<ZipFileEntry>> {
        let (eocd, eocd_offset) = self.find_eocd().await?;

        let (cd_offset, cd_size, total_entries) = if eocd.is_zip64() {
            let eocd64 = self.read_zip64_eocd(eocd_offset).await?;
            (eocd64.cd_offset, eocd64.cd_size, eocd64.total_entries)
        } else {
            (
                eocd.cd_offset as u64,
                eocd.cd_size as u64,
                eocd.total_entries as u64,
            )
        };

        if cd_offset.checked_add(cd_size).is_none_or(|end| end > self.size) {
            bail!("Central Directory lies outside the archive");
        }
        if total_entries > cd_size / CDFH_MIN_SIZE as u64 {
            bail!("Central Directory is too small for {} entries", total_entries);
        }

        let mut table = vec![0u8; cd_size as usize];
        self.reader.read_exact_at(cd_offset, &mut table).await?;

        let mut cursor = Cursor::new(table.as_slice());
        (0..total_entries)
            .map(|_| read_cdfh(&mut cursor))
            .collect()
    }

    /// Offset of an entry's (possibly compressed) data.
    ///
    /// The local header repeats the name and may carry a different extra
    /// field than the central directory, so its lengths are read afresh.
    pub async fn data_offset(&self, entry: &ZipFileEntry) -> Result<u64> {
        let mut lfh = vec![0u8; LFH_SIZE];
        self.reader.read_exact_at(entry.lfh_offset, &mut lfh).await?;
        if &lfh[0..4] != LFH_SIGNATURE {
            bail!("Invalid Local File Header for {}", entry.file_name);
        }

        let mut cursor = Cursor::new(lfh.as_slice());
        cursor.set_position(LFH_NAME_LEN_OFFSET);
        let name_len = cursor.read_u16::<LittleEndian>()? as u64;
        let extra_len = cursor.read_u16::<LittleEndian>()? as u64;

        let data_offset = entry
            .lfh_offset
            .checked_add(LFH_SIZE as u64 + name_len + extra_len);
        match data_offset {
            Some(offset)
                if offset
                    .checked_add(entry.compressed_size)
                    .is_some_and(|end| end <= self.size) =>
            {
                Ok(offset)
            }
            _ => bail!("Entry data for {} lies outside the archive", entry.file_name),
        }
    }

    pub fn reader(&self) -> &Arc<R> {
        &self.reader
    }
}

/// One central directory file header, cursor left at the next one
fn read_cdfh(cursor: &mut Cursor<&[u8]>) -> Result<ZipFileEntry> {
    let mut sig = [0u8; 4];
    cursor.read_exact(&mut sig)?;
    if sig != CDFH_SIGNATURE {
        bail!("Invalid Central Directory File Header");
    }

    let version_made_by = cursor.read_u16::<LittleEndian>()?;
    let _version_needed = cursor.read_u16::<LittleEndian>()?;
    let flags = cursor.read_u16::<LittleEndian>()?;
    let compression_method = cursor.read_u16::<LittleEndian>()?;
    let _dos_time = cursor.read_u16::<LittleEndian>()?;
    let _dos_date = cursor.read_u16::<LittleEndian>()?;
    let crc32 = cursor.read_u32::<LittleEndian>()?;
    let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let name_len = cursor.read_u16::<LittleEndian>()?;
    let extra_len = cursor.read_u16::<LittleEndian>()?;
    let comment_len = cursor.read_u16::<LittleEndian>()?;
    let _disk_start = cursor.read_u16::<LittleEndian>()?;
    let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
    let external_attrs = cursor.read_u32::<LittleEndian>()?;
    let mut lfh_offset = cursor.read_u32::<LittleEndian>()? as u64;

    let mut name = vec![0u8; name_len as usize];
    cursor.read_exact(&mut name)?;
    let file_name = String::from_utf8_lossy(&name).into_owned();

    let extra_end = cursor.position() + extra_len as u64;
    while cursor.position() + 4 <= extra_end {
        let id = cursor.read_u16::<LittleEndian>()?;
        let len = cursor.read_u16::<LittleEndian>()? as u64;
        let field_end = (cursor.position() + len).min(extra_end);

        if id == ZIP64_EXTRA_ID {
            // Only fields whose 32-bit slot holds the marker are present, in this order
            for value in [&mut uncompressed_size, &mut compressed_size, &mut lfh_offset] {
                if *value == ZIP64_MARKER && cursor.position() + 8 <= field_end {
                    *value = cursor.read_u64::<LittleEndian>()?;
                }
            }
        }
        cursor.set_position(field_end);
    }
    cursor.set_position(extra_end + comment_len as u64);

    Ok(ZipFileEntry {
        is_directory: file_name.ends_with('/'),
        file_name,
        version_made_by,
        flags,
        compression_method: CompressionMethod::from_u16(compression_method),
        compressed_size,
        uncompressed_size,
        crc32,
        external_attrs,
        lfh_offset,
    })
}
