//! records/encode.rs
//! Record body and record stream encoding.
//!
//! Used to produce `.rdat` / `.ridx` bodies for fixtures and tooling.
//! Bodies are zero padded to a multiple of 16 bytes so that every byte
//! of an encrypted body falls inside a full AES block.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::constants::{ENCRYPTION_BLOCK_BYTES, RECORD_CRC_START_OFFSET, UNIVERSAL_HEADER_BYTES};
use crate::crypto::{encrypt_region, AccessLevel, CryptoError, KeySet};
use crate::headers::wire::FieldWriter;
use crate::headers::ByteOrderCode;
use crate::records::header::write_record_header;
use crate::records::types::*;
use crate::utils::compute_crc;

impl RecordBody {
    /// Registry entry this body encodes as; `None` for `Unrecognized`.
    pub fn record_type(&self) -> Option<RecordType> {
        Some(match self {
            RecordBody::Note { .. } => RecordType::Note,
            RecordBody::Edfa { .. } => RecordType::Edfa,
            RecordBody::Lntp { .. } => RecordType::Lntp,
            RecordBody::Seizure(_) => RecordType::Seiz,
            RecordBody::CognitiveStimulation(_) => RecordType::CSti,
            RecordBody::ElectricalStimulation(_) => RecordType::ESti,
            RecordBody::SystemLog { .. } => RecordType::SyLg,
            RecordBody::Cursor(_) => RecordType::Curs,
            RecordBody::Epoch(_) => RecordType::Epoc,
            RecordBody::Unrecognized { .. } => return None,
        })
    }
}

fn padded_len(n: usize) -> usize {
    n.div_ceil(ENCRYPTION_BLOCK_BYTES) * ENCRYPTION_BLOCK_BYTES
}

/// `prefix` zero bytes, then NUL-terminated text.
fn text_body(prefix: usize, text: &str) -> Vec<u8> {
    let mut out = vec![0u8; padded_len(prefix + text.len() + 1)];
    out[prefix..prefix + text.len()].copy_from_slice(text.as_bytes());
    out
}

fn encode_with<B: ByteOrder>(body: &RecordBody) -> Vec<u8> {
    match body {
        RecordBody::Note { text } | RecordBody::SystemLog { text } => text_body(0, text),

        RecordBody::Edfa { duration, annotation } => {
            let mut out = text_body(8, annotation);
            B::write_i64(&mut out[..8], *duration);
            out
        }

        RecordBody::Lntp { length, template } => {
            let mut out = vec![0u8; padded_len(8 + template.len() * 4)];
            B::write_i64(&mut out[..8], *length);
            for (slot, v) in out[8..].chunks_exact_mut(4).zip(template) {
                B::write_i32(slot, *v);
            }
            out
        }

        RecordBody::Seizure(s) => {
            let total = SEIZURE_1_0_BYTES + s.channels.len() * SEIZURE_1_0_CHANNEL_BYTES;
            let mut out = vec![0u8; padded_len(total)];
            let mut w = FieldWriter::<B>::new(&mut out);
            w.put_i64(s.earliest_onset);
            w.put_i64(s.latest_offset);
            w.put_i64(s.duration);
            w.put_i32(s.channels.len() as i32);
            w.put_i32(s.onset_code);
            w.put_bytes(s.marker_name_1.as_bytes());
            w.put_bytes(s.marker_name_2.as_bytes());
            w.put_bytes(s.annotation.as_bytes());
            w.put_bytes(&[0u8; SEIZURE_RESERVED_BYTES]);
            for c in &s.channels {
                w.put_bytes(c.name.as_bytes());
                w.put_i64(c.onset);
                w.put_i64(c.offset);
            }
            out
        }

        RecordBody::CognitiveStimulation(c) => {
            let mut out = vec![0u8; padded_len(CSTI_1_0_BYTES)];
            let mut w = FieldWriter::<B>::new(&mut out);
            w.put_bytes(c.task_type.as_bytes());
            w.put_i64(c.stimulus_duration);
            w.put_bytes(c.stimulus_type.as_bytes());
            w.put_bytes(c.patient_response.as_bytes());
            out
        }

        RecordBody::ElectricalStimulation(e) => {
            let mut out = vec![0u8; padded_len(ESTI_1_0_BYTES)];
            let mut w = FieldWriter::<B>::new(&mut out);
            w.put_f64(e.amplitude);
            w.put_f64(e.frequency);
            w.put_i64(e.pulse_width);
            w.put_i32(e.ampunit_code);
            w.put_i32(e.mode_code);
            w.put_bytes(e.waveform.as_bytes());
            w.put_bytes(e.anode.as_bytes());
            w.put_bytes(e.catode.as_bytes());
            out
        }

        RecordBody::Cursor(c) => {
            let mut out = vec![0u8; padded_len(CURS_1_0_BYTES)];
            let mut w = FieldWriter::<B>::new(&mut out);
            w.put_i64(c.id_number);
            w.put_i64(c.trace_timestamp);
            w.put_i64(c.latency);
            w.put_f64(c.value);
            w.put_bytes(c.name.as_bytes());
            out
        }

        RecordBody::Epoch(e) => {
            let mut out = vec![0u8; padded_len(EPOC_1_0_BYTES)];
            let mut w = FieldWriter::<B>::new(&mut out);
            w.put_i64(e.id_number);
            w.put_i64(e.timestamp);
            w.put_i64(e.end_timestamp);
            w.put_i64(e.duration);
            w.put_bytes(e.epoch_type.as_bytes());
            w.put_bytes(e.text.as_bytes());
            out
        }

        RecordBody::Unrecognized { raw, .. } => raw.clone(),
    }
}

/// Plaintext body bytes of a version 1.0 record.
pub fn encode_record_body(body: &RecordBody, order: ByteOrderCode) -> Vec<u8> {
    match order {
        ByteOrderCode::LittleEndian => encode_with::<LittleEndian>(body),
        ByteOrderCode::BigEndian => encode_with::<BigEndian>(body),
    }
}

/// Complete record (header + stored body) with its CRC filled in.
///
/// `header.bytes` and `header.record_crc` are overwritten. When
/// `header.encryption` is positive the body is encrypted with that level's
/// key before the CRC is taken.
pub fn encode_record(
    header: &RecordHeader,
    plaintext_body: &[u8],
    order: ByteOrderCode,
    keys: &KeySet,
) -> Result<Vec<u8>, CryptoError> {
    let stored = match AccessLevel::required_for(header.encryption)? {
        AccessLevel::None => plaintext_body.to_vec(),
        level => encrypt_region(plaintext_body, keys.key_for(level)?)?,
    };

    let mut h = header.clone();
    h.bytes = stored.len() as u32;

    let mut out = vec![0u8; RecordHeader::LEN + stored.len()];
    match order {
        ByteOrderCode::LittleEndian => write_record_header::<LittleEndian>(&mut out, &h),
        ByteOrderCode::BigEndian => write_record_header::<BigEndian>(&mut out, &h),
    }
    out[RecordHeader::LEN..].copy_from_slice(&stored);

    let crc = compute_crc(&out[RECORD_CRC_START_OFFSET..]);
    match order {
        ByteOrderCode::LittleEndian => LittleEndian::write_u32(&mut out[..4], crc),
        ByteOrderCode::BigEndian => BigEndian::write_u32(&mut out[..4], crc),
    }
    Ok(out)
}

/// Concatenate encoded records into a `.rdat` body and build the matching
/// `.ridx` entries. Offsets count from the start of the data file, i.e.
/// the first record sits at `UNIVERSAL_HEADER_BYTES`.
pub fn encode_record_stream(
    records: &[(RecordHeader, RecordBody)],
    order: ByteOrderCode,
    keys: &KeySet,
) -> Result<(Vec<u8>, Vec<RecordIndex>), CryptoError> {
    let mut data = Vec::new();
    let mut index = Vec::with_capacity(records.len());
    for (header, body) in records {
        let offset = (UNIVERSAL_HEADER_BYTES + data.len()) as i64;
        index.push(RecordIndex::for_record(header, offset));
        data.extend_from_slice(&encode_record(header, &encode_record_body(body, order), order, keys)?);
    }
    Ok((data, index))
}
