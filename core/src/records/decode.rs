//! records/decode.rs
//! Record body decoding, dispatched on (type code, major, minor).
//!
//! Design notes:
//! - Bodies arrive decrypted. Trailing padding after a body's layout is
//!   ignored.
//! - `try_decode_record` reports why a body could not be decoded;
//!   `decode_record` turns that into `RecordBody::Unrecognized` so one bad
//!   record never stops a stream.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::headers::wire::FieldReader;
use crate::headers::ByteOrderCode;
use crate::records::types::*;
use crate::utils::fmt_bytes;

/// Text up to the first NUL, lossily decoded.
pub(crate) fn text_until_nul(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

fn checked_len(kind: RecordType, body: &[u8], need: Option<usize>) -> Result<(), RecordError> {
    let type_code = kind.code();
    match need {
        Some(need) if body.len() >= need => Ok(()),
        Some(need) => Err(RecordError::Truncated { type_code, have: body.len(), need }),
        None => Err(RecordError::Invalid(format!("{} body length overflows", fmt_bytes(&kind.code())))),
    }
}

fn count_field(kind: RecordType, name: &str, value: i64) -> Result<usize, RecordError> {
    usize::try_from(value).map_err(|_| {
        RecordError::Invalid(format!("{} {} is negative: {}", fmt_bytes(&kind.code()), name, value))
    })
}

fn decode_v1_0<B: ByteOrder>(kind: RecordType, body: &[u8]) -> Result<RecordBody, RecordError> {
    checked_len(kind, body, Some(kind.fixed_body_bytes()))?;
    let mut r = FieldReader::<B>::new(body);

    let decoded = match kind {
        RecordType::Note => RecordBody::Note { text: text_until_nul(body) },
        RecordType::SyLg => RecordBody::SystemLog { text: text_until_nul(body) },

        RecordType::Edfa => {
            let duration = r.i64();
            RecordBody::Edfa { duration, annotation: text_until_nul(&body[r.position()..]) }
        }

        RecordType::Lntp => {
            let length = r.i64();
            let n = count_field(kind, "template length", length)?;
            let start = r.position();
            checked_len(kind, body, n.checked_mul(4).and_then(|b| b.checked_add(start)))?;
            let template = body[start..start + n * 4].chunks_exact(4).map(B::read_i32).collect();
            RecordBody::Lntp { length, template }
        }

        RecordType::Seiz => {
            let earliest_onset = r.i64();
            let latest_offset = r.i64();
            let duration = r.i64();
            let number_of_channels = r.i32();
            let onset_code = r.i32();
            let marker_name_1 = r.string();
            let marker_name_2 = r.string();
            let annotation = r.string();
            let _reserved = r.array::<SEIZURE_RESERVED_BYTES>();
            debug_assert_eq!(r.position(), SEIZURE_1_0_BYTES);

            let n = count_field(kind, "number_of_channels", i64::from(number_of_channels))?;
            checked_len(
                kind,
                body,
                n.checked_mul(SEIZURE_1_0_CHANNEL_BYTES).and_then(|b| b.checked_add(SEIZURE_1_0_BYTES)),
            )?;
            let channels = body[SEIZURE_1_0_BYTES..SEIZURE_1_0_BYTES + n * SEIZURE_1_0_CHANNEL_BYTES]
                .chunks_exact(SEIZURE_1_0_CHANNEL_BYTES)
                .map(|chunk| {
                    let mut c = FieldReader::<B>::new(chunk);
                    SeizureChannel { name: c.string(), onset: c.i64(), offset: c.i64() }
                })
                .collect();

            RecordBody::Seizure(Seizure {
                earliest_onset,
                latest_offset,
                duration,
                onset_code,
                marker_name_1,
                marker_name_2,
                annotation,
                channels,
            })
        }

        RecordType::CSti => RecordBody::CognitiveStimulation(CognitiveStimulation {
            task_type: r.string(),
            stimulus_duration: r.i64(),
            stimulus_type: r.string(),
            patient_response: r.string(),
        }),

        RecordType::ESti => RecordBody::ElectricalStimulation(ElectricalStimulation {
            amplitude: r.f64(),
            frequency: r.f64(),
            pulse_width: r.i64(),
            ampunit_code: r.i32(),
            mode_code: r.i32(),
            waveform: r.string(),
            anode: r.string(),
            catode: r.string(),
        }),

        RecordType::Curs => RecordBody::Cursor(Cursor {
            id_number: r.i64(),
            trace_timestamp: r.i64(),
            latency: r.i64(),
            value: r.f64(),
            name: r.string(),
        }),

        RecordType::Epoc => RecordBody::Epoch(Epoch {
            id_number: r.i64(),
            timestamp: r.i64(),
            end_timestamp: r.i64(),
            duration: r.i64(),
            epoch_type: r.string(),
            text: r.string(),
        }),
    };
    Ok(decoded)
}

/// Decode a plaintext body, reporting why it could not be decoded.
pub fn try_decode_record(
    header: &RecordHeader,
    body: &[u8],
    order: ByteOrderCode,
) -> Result<RecordBody, RecordError> {
    let kind = RecordType::verify(header.type_code())?;
    if (header.version_major, header.version_minor) != (1, 0) {
        return Err(RecordError::UnsupportedVersion {
            type_code: kind.code(),
            major: header.version_major,
            minor: header.version_minor,
        });
    }
    match order {
        ByteOrderCode::LittleEndian => decode_v1_0::<LittleEndian>(kind, body),
        ByteOrderCode::BigEndian => decode_v1_0::<BigEndian>(kind, body),
    }
}

/// Decode a plaintext body; failures become `RecordBody::Unrecognized`
/// carrying the raw bytes and the reason.
pub fn decode_record(header: &RecordHeader, body: &[u8], order: ByteOrderCode) -> RecordBody {
    try_decode_record(header, body, order).unwrap_or_else(|e| RecordBody::Unrecognized {
        raw: body.to_vec(),
        diagnostic: e.to_string(),
    })
}
