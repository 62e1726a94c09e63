//! records/stream.rs
//! Walk a `.rdat` file record by record.
//!
//! Design notes:
//! - Records are laid out back to back from the end of the universal
//!   header; each record's `bytes` field gives the distance to the next.
//! - Every record found is yielded, decoded or `Unrecognized`, in file
//!   order. Structural damage (a header running past the end of the file)
//!   ends the walk with a diagnostic.
//! - Password errors are never absorbed here; the caller gets them as `Err`.

use tracing::warn;

use crate::assembler::options::CrcPolicy;
use crate::constants::{RECORD_CRC_START_OFFSET, UNIVERSAL_HEADER_BYTES};
use crate::crypto::{decrypt_section, CryptoError, KeySet};
use crate::headers::UniversalHeader;
use crate::records::decode::try_decode_record;
use crate::records::header::decode_record_header;
use crate::records::types::*;
use crate::telemetry::{ReadCounters, Stage};
use crate::types::{Diagnostic, ErrorKind, MefError};
use crate::utils::{compute_crc, fmt_bytes};

/// Records of one level plus what went wrong while reading them.
#[derive(Debug, Clone, Default)]
pub struct RecordStream {
    pub records: Vec<Record>,
    pub diagnostics: Vec<Diagnostic>,
    pub counters: ReadCounters,
}

impl RecordStream {
    /// Largest stored record (header + body), 0 for an empty stream.
    pub fn maximum_record_bytes(&self) -> i64 {
        self.records
            .iter()
            .map(|r| r.header.total_bytes() as i64)
            .max()
            .unwrap_or(0)
    }

    fn note(&mut self, location: &str, kind: ErrorKind, message: String) {
        warn!(location, %message, "record stream");
        self.diagnostics.push(Diagnostic::new(location, Stage::ReadRecords, kind, message));
    }
}

/// Decode every record of a `.rdat` file.
///
/// `data` is the whole file, universal header included; `header` is its
/// already-validated universal header. When `index` is given (the decoded
/// `.ridx` body) it is cross-checked against what the walk found; the first
/// disagreement is reported as a diagnostic.
///
/// Errors:
/// - Password errors for encrypted records, always.
/// - `Checksum` / `CorruptData` under `CrcPolicy::Strict` for a bad record
///   CRC or a damaged stream.
pub fn decode_record_stream(
    data: &[u8],
    header: &UniversalHeader,
    index: Option<&[RecordIndex]>,
    keys: &KeySet,
    crc: CrcPolicy,
    location: &str,
) -> Result<RecordStream, MefError> {
    let order = header.byte_order_code;
    let mut stream = RecordStream::default();
    let mut offset = UNIVERSAL_HEADER_BYTES;

    while offset < data.len() {
        let remaining = data.len() - offset;
        if remaining < RecordHeader::LEN {
            let detail = format!("{} trailing bytes at offset {} do not hold a record header", remaining, offset);
            if crc == CrcPolicy::Strict {
                return Err(MefError::corrupt(location, detail));
            }
            stream.note(location, ErrorKind::CorruptData, detail);
            break;
        }

        let rh = decode_record_header(&data[offset..], order);
        let end = match offset.checked_add(rh.total_bytes()) {
            Some(end) if end <= data.len() => end,
            _ => {
                let e = RecordError::Overrun {
                    file_offset: offset as i64,
                    record_bytes: rh.total_bytes(),
                    file_bytes: data.len(),
                };
                if crc == CrcPolicy::Strict {
                    return Err(MefError::from(e).at(location));
                }
                stream.note(location, ErrorKind::Record, e.to_string());
                break;
            }
        };
        let stored = &data[offset + RecordHeader::LEN..end];

        if crc.checks() {
            let actual = compute_crc(&data[offset + RECORD_CRC_START_OFFSET..end]);
            if actual != rh.record_crc {
                stream.counters.crc_failures += 1;
                let e = RecordError::ChecksumMismatch { expected: rh.record_crc, actual };
                if crc == CrcPolicy::Strict {
                    return Err(MefError::from(e).at(location));
                }
                let message = format!("record at offset {}: {}", offset, e);
                stream.note(location, ErrorKind::Checksum, message.clone());
                stream.counters.add_record(false);
                stream.records.push(Record {
                    file_offset: offset as i64,
                    header: rh,
                    body: RecordBody::Unrecognized { raw: stored.to_vec(), diagnostic: message },
                });
                offset = end;
                continue;
            }
        }

        let body = match decrypt_section(stored, rh.encryption, keys) {
            Ok(plain) => {
                if rh.encryption > 0 {
                    stream.counters.sections_decrypted += 1;
                }
                try_decode_record(&rh, &plain, order).unwrap_or_else(|e| RecordBody::Unrecognized {
                    raw: plain.into_owned(),
                    diagnostic: e.to_string(),
                })
            }
            Err(e @ CryptoError::UnsupportedEncryption { .. }) => RecordBody::Unrecognized {
                raw: stored.to_vec(),
                diagnostic: e.to_string(),
            },
            Err(e) => return Err(MefError::from(e).at(location)),
        };

        if let RecordBody::Unrecognized { diagnostic, .. } = &body {
            stream.note(
                location,
                ErrorKind::Record,
                format!("record {} at offset {}: {}", rh.type_name(), offset, diagnostic),
            );
        }
        stream.counters.add_record(body.is_recognized());
        stream.records.push(Record { file_offset: offset as i64, header: rh, body });
        offset = end;
    }

    if header.number_of_entries >= 0 && header.number_of_entries as usize != stream.records.len() {
        let message = format!(
            "header declares {} records, found {}",
            header.number_of_entries,
            stream.records.len()
        );
        stream.note(location, ErrorKind::CorruptData, message);
    }

    if let Some(index) = index {
        if let Some(message) = cross_check_index(&stream.records, index) {
            stream.note(location, ErrorKind::CorruptData, message);
        }
    }

    Ok(stream)
}

/// First disagreement between walked records and index entries, if any.
pub fn cross_check_index(records: &[Record], index: &[RecordIndex]) -> Option<String> {
    if records.len() != index.len() {
        return Some(format!(
            "record index has {} entries, data file has {} records",
            index.len(),
            records.len()
        ));
    }
    records.iter().zip(index).enumerate().find_map(|(i, (r, e))| {
        if r.file_offset != e.file_offset {
            Some(format!(
                "record index entry {} points at offset {}, record is at {}",
                i, e.file_offset, r.file_offset
            ))
        } else if r.header.type_string != e.type_string {
            Some(format!(
                "record index entry {} names type {}, record is {}",
                i,
                fmt_bytes(&e.type_string[..4]),
                r.header.type_name()
            ))
        } else {
            None
        }
    })
}
