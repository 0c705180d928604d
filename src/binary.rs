// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Binary dataset file format: varint codec, header, footer, record encoding.
//!
//! The header is 24 bytes of fixed-size fields, parsed in one read before
//! anything else. It tells you exactly where the string table and the record
//! table live. The footer is 8 bytes: a CRC32 checksum over everything before
//! it, plus a magic number ("XDRG", the header magic reversed). If the footer
//! is wrong, something got corrupted or truncated. Don't trust the data.
//!
//! # Wire Format
//!
//! ```text
//! header  : magic "GRDX" + version + flags + 4x u32 (LE) + 2 reserved
//! strings : varint count, then per entry varint len + UTF-8 bytes
//! records : per record 4 varint ids, 6 nullable ids (id+1, 0 = null),
//!           19 varint counts
//! footer  : CRC32 (LE) + magic "XDRG"
//! ```
//!
//! # References
//!
//! - **Varint (LEB128)**: Little-endian base-128 variable-length integer
//!   encoding. Originally from the DWARF debugging format, popularized by
//!   Protocol Buffers: <https://protobuf.dev/programming-guides/encoding/>

use std::io::{self, Read, Write};

use crc32fast::Hasher as Crc32Hasher;

use crate::types::{GradeCounts, GradeRecord, StringId, MAX_INSTRUCTORS};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Magic bytes: "GRDX" in ASCII (header)
pub const MAGIC: [u8; 4] = *b"GRDX";

/// Footer magic: "XDRG" (reversed, marks valid file end)
pub const FOOTER_MAGIC: [u8; 4] = *b"XDRG";

/// Current format version
pub const VERSION: u8 = 1;

// ============================================================================
// SECURITY LIMITS (prevent resource exhaustion from malicious input)
// ============================================================================

/// Maximum file size: 256 MB
pub const MAX_FILE_SIZE: usize = 256 * 1024 * 1024;

/// Maximum number of interned strings
pub const MAX_STRING_COUNT: u32 = 10_000_000;

/// Maximum number of grade records
pub const MAX_RECORD_COUNT: u32 = 10_000_000;

/// Maximum varint bytes (u64 needs at most 10 bytes)
pub const MAX_VARINT_BYTES: usize = 10;

// ============================================================================
// VARINT ENCODING
// ============================================================================

/// Encode a varint to bytes
pub fn encode_varint(mut value: u64, buf: &mut Vec<u8>) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            break;
        } else {
            buf.push(byte | 0x80);
        }
    }
}

/// Decode a varint from bytes, returning (value, bytes_consumed)
///
/// Returns an error if:
/// - Buffer is empty
/// - Varint exceeds MAX_VARINT_BYTES (malformed/malicious input)
pub fn decode_varint(bytes: &[u8]) -> io::Result<(u64, usize)> {
    if bytes.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "Empty buffer for varint",
        ));
    }

    let mut result: u64 = 0;
    let mut shift = 0;
    let mut i = 0;

    while i < bytes.len() && i < MAX_VARINT_BYTES {
        let byte = bytes[i];
        result |= ((byte & 0x7F) as u64) << shift;
        i += 1;
        if byte & 0x80 == 0 {
            return Ok((result, i));
        }
        shift += 7;
    }

    if i >= MAX_VARINT_BYTES {
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "Varint exceeds maximum length (possible corruption)",
        ))
    } else {
        Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "Incomplete varint",
        ))
    }
}

// ============================================================================
// HEADER (24 bytes)
// ============================================================================

/// Binary format header (24 bytes fixed size)
#[derive(Debug, Clone)]
pub struct DatasetHeader {
    pub version: u8,
    pub flags: u8,
    pub string_count: u32,
    pub record_count: u32,
    /// String table section length in bytes
    pub strings_len: u32,
    /// Record table section length in bytes
    pub records_len: u32,
}

impl DatasetHeader {
    // 4 (magic) + 1 (version) + 1 (flags) + 4*4 (u32s) + 2 (reserved) = 24
    pub const SIZE: usize = 24;

    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&MAGIC)?;
        w.write_all(&[self.version])?;
        w.write_all(&[self.flags])?;
        w.write_all(&self.string_count.to_le_bytes())?;
        w.write_all(&self.record_count.to_le_bytes())?;
        w.write_all(&self.strings_len.to_le_bytes())?;
        w.write_all(&self.records_len.to_le_bytes())?;
        w.write_all(&[0u8; 2])?; // reserved (2 bytes for alignment)
        Ok(())
    }

    pub fn read<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid magic: expected GRDX, got {:?}", magic),
            ));
        }

        let mut buf = [0u8; 20]; // 24 - 4 (magic) = 20
        r.read_exact(&mut buf)?;

        let header = Self {
            version: buf[0],
            flags: buf[1],
            string_count: u32::from_le_bytes([buf[2], buf[3], buf[4], buf[5]]),
            record_count: u32::from_le_bytes([buf[6], buf[7], buf[8], buf[9]]),
            strings_len: u32::from_le_bytes([buf[10], buf[11], buf[12], buf[13]]),
            records_len: u32::from_le_bytes([buf[14], buf[15], buf[16], buf[17]]),
            // buf[18..20] is reserved
        };

        if header.version != VERSION {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Unsupported format version {} (expected {})",
                    header.version, VERSION
                ),
            ));
        }
        if header.string_count > MAX_STRING_COUNT {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("String count {} exceeds limit", header.string_count),
            ));
        }
        if header.record_count > MAX_RECORD_COUNT {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Record count {} exceeds limit", header.record_count),
            ));
        }

        Ok(header)
    }

    /// Expected content size (header + sections, everything before footer)
    pub fn content_size(&self) -> usize {
        Self::SIZE + self.strings_len as usize + self.records_len as usize
    }
}

// ============================================================================
// FOOTER (8 bytes)
// ============================================================================

/// Footer with CRC32 checksum and magic number
#[derive(Debug, Clone)]
pub struct DatasetFooter {
    /// CRC32 checksum of header + all sections (everything before footer)
    pub crc32: u32,
}

impl DatasetFooter {
    pub const SIZE: usize = 8; // 4 bytes CRC32 + 4 bytes magic

    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.crc32.to_le_bytes())?;
        w.write_all(&FOOTER_MAGIC)?;
        Ok(())
    }

    pub fn read(bytes: &[u8]) -> io::Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "File too short for footer",
            ));
        }

        let footer_start = bytes.len() - Self::SIZE;

        let magic = &bytes[footer_start + 4..];
        if magic != FOOTER_MAGIC {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid footer magic: expected XDRG, got {:?}", magic),
            ));
        }

        let crc32 = u32::from_le_bytes([
            bytes[footer_start],
            bytes[footer_start + 1],
            bytes[footer_start + 2],
            bytes[footer_start + 3],
        ]);

        Ok(Self { crc32 })
    }

    /// Compute CRC32 over the given bytes
    pub fn compute_crc32(data: &[u8]) -> u32 {
        let mut hasher = Crc32Hasher::new();
        hasher.update(data);
        hasher.finalize()
    }
}

// ============================================================================
// RECORD ENCODING
// ============================================================================

/// Encode one grade record.
///
/// Layout: 4 varint categorical ids, 6 nullable instructor ids encoded as
/// `id + 1` with 0 meaning null, then 19 varint counts in label order.
pub fn encode_record(record: &GradeRecord, buf: &mut Vec<u8>) {
    encode_varint(u64::from(record.semester), buf);
    encode_varint(u64::from(record.subject), buf);
    encode_varint(u64::from(record.catalog_number), buf);
    encode_varint(u64::from(record.section), buf);
    for slot in &record.instructors {
        match slot {
            Some(id) => encode_varint(u64::from(id + 1), buf),
            None => encode_varint(0, buf),
        }
    }
    for count in record.counts.as_array() {
        encode_varint(u64::from(count), buf);
    }
}

/// Decode one grade record, returning (record, bytes_consumed).
///
/// `string_count` bounds every id; an out-of-range id means the file is
/// internally inconsistent and the decode fails.
pub fn decode_record(data: &[u8], string_count: u32) -> io::Result<(GradeRecord, usize)> {
    let mut pos = 0;

    let next_id = |data: &[u8], pos: &mut usize| -> io::Result<StringId> {
        let (value, consumed) = decode_varint(&data[*pos..])?;
        *pos += consumed;
        let id = u32::try_from(value).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidData, "Interned id exceeds u32 range")
        })?;
        if id >= string_count {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Interned id {} out of range (table has {})", id, string_count),
            ));
        }
        Ok(id)
    };

    let semester = next_id(data, &mut pos)?;
    let subject = next_id(data, &mut pos)?;
    let catalog_number = next_id(data, &mut pos)?;
    let section = next_id(data, &mut pos)?;

    let mut instructors = [None; MAX_INSTRUCTORS];
    for slot in &mut instructors {
        let (value, consumed) = decode_varint(&data[pos..])?;
        pos += consumed;
        if value > 0 {
            let id = u32::try_from(value - 1).map_err(|_| {
                io::Error::new(io::ErrorKind::InvalidData, "Instructor id exceeds u32 range")
            })?;
            if id >= string_count {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Instructor id {} out of range (table has {})", id, string_count),
                ));
            }
            *slot = Some(id);
        }
    }

    let mut counts = [0u32; 19];
    for count in &mut counts {
        let (value, consumed) = decode_varint(&data[pos..])?;
        pos += consumed;
        *count = u32::try_from(value).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidData, "Grade count exceeds u32 range")
        })?;
    }

    Ok((
        GradeRecord {
            semester,
            subject,
            catalog_number,
            section,
            instructors,
            counts: GradeCounts::from_array(counts),
        },
        pos,
    ))
}
