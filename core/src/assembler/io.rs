//! assembler/io.rs
//! Whole-file reads and the per-request read context.
//!
//! Design notes:
//! - MEF3 files are small (metadata is 16 KiB, indices and records are a
//!   few MiB at most), so each file is read into memory in one call and
//!   closed before decoding starts.
//! - The universal header is validated and its CRCs checked here, so every
//!   decoder downstream works on a file of the type it expects.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Instant;

use tracing::{debug, warn};

use crate::assembler::options::{CrcPolicy, ReadOptions};
use crate::constants::UNIVERSAL_HEADER_BYTES;
use crate::crypto::{process_password, KeySet, ValidationFields};
use crate::headers::{decode_universal_header_unchecked, verify_header_crc, FileType, UniversalHeader};
use crate::telemetry::{ReadCounters, Stage, StageTimes};
use crate::types::{Diagnostic, MefError, WithLocation};
use crate::utils::compute_crc;

/// A MEF3 file held in memory with its decoded universal header.
#[derive(Debug, Clone)]
pub struct MefFile {
    pub location: String,
    pub header: UniversalHeader,
    /// Whole file, universal header included.
    pub bytes: Vec<u8>,
}

impl MefFile {
    /// Everything after the universal header.
    pub fn body(&self) -> &[u8] {
        &self.bytes[UNIVERSAL_HEADER_BYTES..]
    }
}

/// Mutable state of one read: options, counters, stage times and the
/// diagnostics collected so far. Worker threads get a `child` context and
/// are folded back with `absorb`.
#[derive(Debug)]
pub struct ReadContext<'o> {
    pub options: &'o ReadOptions,
    /// Last state entered; a failure is reported against it.
    pub stage: Stage,
    pub counters: ReadCounters,
    pub stage_times: StageTimes,
    pub diagnostics: Vec<Diagnostic>,
}

impl<'o> ReadContext<'o> {
    pub fn new(options: &'o ReadOptions) -> Self {
        Self {
            options,
            stage: Stage::Open,
            counters: ReadCounters::default(),
            stage_times: StageTimes::default(),
            diagnostics: Vec::new(),
        }
    }

    /// Empty context sharing these options.
    pub fn child(&self) -> Self {
        Self::new(self.options)
    }

    pub fn absorb(&mut self, child: ReadContext<'_>) {
        self.counters.merge(&child.counters);
        self.stage_times.merge(&child.stage_times);
        self.diagnostics.extend(child.diagnostics);
    }

    /// Enter `stage` and run `f`, charging its wall time to the stage.
    pub fn timed<T>(&mut self, stage: Stage, f: impl FnOnce(&mut Self) -> T) -> T {
        self.stage = stage;
        let t = Instant::now();
        let out = f(self);
        self.stage_times.add(stage, t.elapsed());
        out
    }

    /// Record a non-fatal problem.
    pub fn diagnose(&mut self, diagnostic: Diagnostic) {
        warn!(location = %diagnostic.location, stage = %diagnostic.stage, "{}", diagnostic.message);
        self.diagnostics.push(diagnostic);
    }

    /// Report a child (segment, channel or record stream) that was left out.
    pub fn suppress(&mut self, error: &MefError) {
        self.counters.failed_children += 1;
        self.diagnose(Diagnostic::from_error(self.stage, error));
    }

    /// Whether `error` must end the read instead of being suppressed.
    /// Password errors always do.
    pub fn is_fatal(&self, error: &MefError) -> bool {
        error.is_password() || self.options.exits_on_fail()
    }

    /// Keys unlocked by the request's password for a file carrying `header`.
    ///
    /// Files without validation fields yield an empty key set. A password
    /// that matches neither level yields a rejected key set: plaintext
    /// still decodes, and the first encrypted region raises `Password`.
    pub fn keys_for(&self, header: &UniversalHeader, location: &str) -> KeySet {
        match self.options.password.as_deref() {
            Some(password) if header.has_password_validation() => {
                process_password(password, &ValidationFields::from_header(header)).unwrap_or_else(|e| {
                    debug!(%location, "{}", e);
                    KeySet::rejected()
                })
            }
            _ => KeySet::none(),
        }
    }

    /// Read `path`, check it is a `expected` file and verify its CRCs
    /// according to the request's CRC policy.
    pub fn read_file(&mut self, path: &Path, expected: FileType) -> Result<MefFile, MefError> {
        read_mef_file(path, expected, self.options.crc_policy, &mut self.counters)
    }

    /// Universal header of `path` only; the body is not read or CRC-checked.
    pub fn read_header(&mut self, path: &Path, expected: FileType) -> Result<UniversalHeader, MefError> {
        read_universal_header(path, expected, self.options.crc_policy, &mut self.counters)
    }
}

/// Load a MEF3 file and validate its universal header.
///
/// Errors:
/// - `Io` when the file cannot be read.
/// - `Header` for a short file, a foreign file type or an unknown byte
///   order; `UnsupportedVersion` for a major version other than 3.
/// - `Checksum` when the header or body CRC fails and `crc` checks.
pub fn read_mef_file(
    path: &Path,
    expected: FileType,
    crc: CrcPolicy,
    counters: &mut ReadCounters,
) -> Result<MefFile, MefError> {
    let location = path.display().to_string();
    let bytes = std::fs::read(path).map_err(|e| MefError::io(path, e))?;
    counters.add_file(bytes.len());

    let header = decode_universal_header_unchecked(&bytes).at(&location)?;
    header.expect_file_type(expected).at(&location)?;

    if crc.checks() {
        if let Err(e) = verify_header_crc(&bytes, header.header_crc) {
            counters.crc_failures += 1;
            return Err(MefError::from(e).at(&location));
        }
        let actual = compute_crc(&bytes[UNIVERSAL_HEADER_BYTES..]);
        if actual != header.body_crc {
            counters.crc_failures += 1;
            return Err(MefError::Checksum { expected: header.body_crc, actual, location });
        }
    }

    debug!(%location, bytes = bytes.len(), ?expected, "opened");
    Ok(MefFile { location, header, bytes })
}

/// Read and validate just the universal header of `path`.
pub fn read_universal_header(
    path: &Path,
    expected: FileType,
    crc: CrcPolicy,
    counters: &mut ReadCounters,
) -> Result<UniversalHeader, MefError> {
    let location = path.display().to_string();
    let mut buf = [0u8; UNIVERSAL_HEADER_BYTES];
    File::open(path)
        .and_then(|mut f| f.read_exact(&mut buf))
        .map_err(|e| MefError::io(path, e))?;
    counters.add_file(buf.len());

    let header = decode_universal_header_unchecked(&buf).at(&location)?;
    header.expect_file_type(expected).at(&location)?;
    if crc.checks() {
        if let Err(e) = verify_header_crc(&buf, header.header_crc) {
            counters.crc_failures += 1;
            return Err(MefError::from(e).at(&location));
        }
    }
    debug!(%location, ?expected, "read header");
    Ok(header)
}
