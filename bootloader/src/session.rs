//! Phase state machine for a bootloader session. Owns the flash staging
//! buffer and both timeout windows; translates requests into responses and
//! a failure classification the transport loop uses to decide whether to
//! keep driving the session.
//!
//! ```text
//! Init -> Idle -> Handshake -> PrepareFlash -> ReceiveData -> VerifyFlash -> Complete
//!            ^        |             |              |              |
//!            |        +----- ErrorComm / ErrorTimeout / ErrorCritical --+
//!            +------------------------ Recover --------------------------+
//! ```

use cockpit_vm_core::platform::PlatformPort;

use crate::error::ProtocolError;
use crate::flash_staging::FlashStaging;
use crate::message::{
    DataPacket, FlashProgramRequest, FlashProgramResponse, Handshake, Request, RequestPayload,
    Response, ResponsePayload, ServerHandshake,
};
use crate::timeout::{Deadline, DEFAULT_FRAME_TIMEOUT_MS, DEFAULT_SESSION_TIMEOUT_MS};

pub const SERVER_VERSION: u16 = 1;
pub const FLASH_PAGE_SIZE: u32 = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Idle,
    Handshake,
    PrepareFlash,
    ReceiveData,
    VerifyFlash,
    Complete,
    ErrorComm,
    ErrorTimeout,
    ErrorCritical,
    Recover,
    Emergency,
}

/// What the transport loop should do after handling one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Complete,
    Timeout,
    RecoverableError,
    CriticalError,
    EmergencyShutdown,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SessionStats {
    pub frames_received: u64,
    pub recoverable_errors: u64,
    pub critical_errors: u64,
}

pub struct SessionConfig {
    pub session_timeout_ms: u32,
    pub frame_timeout_ms: u32,
    pub target_flash_address: u32,
    pub enable_emergency_recovery: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_timeout_ms: DEFAULT_SESSION_TIMEOUT_MS,
            frame_timeout_ms: DEFAULT_FRAME_TIMEOUT_MS,
            target_flash_address: 0x0801_F800,
            enable_emergency_recovery: true,
        }
    }
}

pub struct BootloaderSession<'p, P: PlatformPort + ?Sized> {
    platform: &'p mut P,
    config: SessionConfig,
    phase: Phase,
    staging: Option<FlashStaging>,
    verify_after_program: bool,
    session_deadline: Deadline,
    frame_deadline: Deadline,
    stats: SessionStats,
}

impl<'p, P: PlatformPort + ?Sized> BootloaderSession<'p, P> {
    pub fn new(platform: &'p mut P, config: SessionConfig) -> Self {
        let now = platform.millis();
        let session_timeout_ms = config.session_timeout_ms;
        let frame_timeout_ms = config.frame_timeout_ms;
        Self {
            platform,
            config,
            phase: Phase::Init,
            staging: None,
            verify_after_program: false,
            session_deadline: Deadline::starting_at(now, session_timeout_ms),
            frame_deadline: Deadline::starting_at(now, frame_timeout_ms),
            stats: SessionStats::default(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Marks the session ready to receive a handshake. A real transport
    /// calls this once, right after construction.
    pub fn begin(&mut self) {
        self.phase = Phase::Idle;
    }

    /// Checks both timeout windows against the platform clock, producing
    /// `Outcome::Timeout` and resetting to `Idle` (or `Emergency` if
    /// already terminal) when either has elapsed. Callers poll this
    /// between requests, since a silent client never triggers a request
    /// handler on its own.
    pub fn poll_timeouts(&mut self) -> Outcome {
        let now = self.platform.millis();
        if self.session_deadline.expired(now) {
            self.stats.recoverable_errors += 1;
            self.enter_recovery(Phase::ErrorTimeout);
            return Outcome::Timeout;
        }
        if matches!(self.phase, Phase::Handshake | Phase::PrepareFlash | Phase::ReceiveData)
            && self.frame_deadline.expired(now)
        {
            self.stats.recoverable_errors += 1;
            self.enter_recovery(Phase::ErrorTimeout);
            return Outcome::Timeout;
        }
        Outcome::Continue
    }

    pub fn handle_request(&mut self, request: Request) -> (Response, Outcome) {
        self.stats.frames_received += 1;
        let now = self.platform.millis();
        self.frame_deadline.reset(now);

        let sequence_id = request.sequence_id;
        match request.payload {
            RequestPayload::Handshake(hs) => self.handle_handshake(sequence_id, hs),
            RequestPayload::FlashProgram(req) => self.handle_prepare(sequence_id, req),
            RequestPayload::Data(packet) => self.handle_data(sequence_id, packet),
        }
    }

    /// Mismatched client capabilities (`_hs`) are not fatal: the server
    /// always replies with its own canonical set.
    fn handle_handshake(&mut self, sequence_id: u32, _hs: Handshake) -> (Response, Outcome) {
        if !matches!(self.phase, Phase::Idle | Phase::Recover) {
            return self.fail(
                sequence_id,
                ProtocolError::InvariantViolation("handshake outside Idle"),
            );
        }
        self.phase = Phase::Handshake;
        let response = Response {
            sequence_id,
            payload: ResponsePayload::Handshake(ServerHandshake {
                server_version: SERVER_VERSION,
                flash_page_size: FLASH_PAGE_SIZE,
                target_flash_address: self.config.target_flash_address,
                max_packet_size: crate::frame::MAX_PAYLOAD_LEN as u16,
            }),
        };
        (response, Outcome::Continue)
    }

    fn handle_prepare(
        &mut self,
        sequence_id: u32,
        req: FlashProgramRequest,
    ) -> (Response, Outcome) {
        if self.phase != Phase::Handshake {
            return self.fail(
                sequence_id,
                ProtocolError::InvariantViolation("prepare outside Handshake"),
            );
        }
        if req.total_data_length == 0 || req.total_data_length > FLASH_PAGE_SIZE {
            return self.fail(
                sequence_id,
                ProtocolError::LengthOverflow {
                    declared: req.total_data_length,
                },
            );
        }
        if let Err(()) = self.platform.flash_erase_page(self.config.target_flash_address) {
            return self.fail(sequence_id, ProtocolError::FlashWriteFailed);
        }
        self.staging = Some(FlashStaging::new(
            self.config.target_flash_address,
            req.total_data_length,
        ));
        self.verify_after_program = req.verify_after_program;
        self.phase = Phase::ReceiveData;
        (
            Response::ack(sequence_id, true, "flash page erased, ready for data"),
            Outcome::Continue,
        )
    }

    fn handle_data(&mut self, sequence_id: u32, packet: DataPacket) -> (Response, Outcome) {
        if self.phase != Phase::ReceiveData {
            return self.fail(
                sequence_id,
                ProtocolError::InvariantViolation("data packet outside ReceiveData"),
            );
        }
        let actual_crc = crate::crc::crc32(&packet.bytes);
        if actual_crc != packet.crc32 {
            return self.fail(
                sequence_id,
                ProtocolError::Crc32Mismatch {
                    expected: packet.crc32,
                    actual: actual_crc,
                },
            );
        }

        let platform: &mut P = &mut *self.platform;
        let staging = self.staging.as_mut().expect("ReceiveData implies staging is set");
        let result = staging.append(packet.offset, &packet.bytes, |addr, word| {
            platform.flash_program_64bit(addr, word)
        });
        if let Err(e) = result {
            return self.fail(sequence_id, e.into());
        }

        let declared_complete = staging.actual_data_length() >= staging.declared_length();
        if declared_complete {
            if let Err(()) = staging.finish(|addr, word| platform.flash_program_64bit(addr, word))
            {
                return self.fail(sequence_id, ProtocolError::FlashWriteFailed);
            }
            self.phase = Phase::VerifyFlash;
            return self.respond_verify(sequence_id);
        }

        (
            Response::ack(sequence_id, true, "packet accepted"),
            Outcome::Continue,
        )
    }

    fn respond_verify(&mut self, sequence_id: u32) -> (Response, Outcome) {
        let staging = self.staging.as_ref().expect("VerifyFlash implies staging is set");
        let actual_data_length = staging.actual_data_length();
        let bytes_programmed = staging.bytes_programmed();
        let verification_hash = crate::crc::crc32(
            &self.platform.flash_read(self.config.target_flash_address, actual_data_length as usize),
        );

        self.phase = Phase::Complete;
        let response = Response {
            sequence_id,
            payload: ResponsePayload::FlashProgramResponse(FlashProgramResponse {
                bytes_programmed,
                actual_data_length,
                verification_hash,
            }),
        };
        (response, Outcome::Complete)
    }

    /// Routes to `recoverable` or `critical` based on [`ProtocolError::is_critical`].
    fn fail(&mut self, sequence_id: u32, error: ProtocolError) -> (Response, Outcome) {
        if error.is_critical() {
            self.critical(sequence_id, error)
        } else {
            self.recoverable(sequence_id, error)
        }
    }

    fn recoverable(&mut self, sequence_id: u32, error: ProtocolError) -> (Response, Outcome) {
        log::warn!(
            "category=bootloader code=RECOVERABLE_ERROR phase={:?} {error}",
            self.phase
        );
        self.stats.recoverable_errors += 1;
        self.enter_recovery(Phase::ErrorComm);
        (
            Response::ack(sequence_id, false, error.to_string()),
            Outcome::RecoverableError,
        )
    }

    fn critical(&mut self, sequence_id: u32, error: ProtocolError) -> (Response, Outcome) {
        log::error!(
            "category=bootloader code=CRITICAL_ERROR phase={:?} {error}",
            self.phase
        );
        self.stats.critical_errors += 1;
        self.phase = Phase::ErrorCritical;
        if self.config.enable_emergency_recovery {
            self.phase = Phase::Emergency;
            return (
                Response::ack(sequence_id, false, error.to_string()),
                Outcome::EmergencyShutdown,
            );
        }
        (
            Response::ack(sequence_id, false, error.to_string()),
            Outcome::CriticalError,
        )
    }

    /// Collapses the `error_phase -> Recover -> Idle` path from the phase
    /// diagram into one atomic update: recoverable errors always land back
    /// in `Idle` with a clean staging buffer and fresh timeout windows.
    fn enter_recovery(&mut self, error_phase: Phase) {
        log::debug!(
            "category=bootloader code=ENTER_RECOVERY {:?} -> Recover -> Idle",
            error_phase
        );
        self.staging = None;
        self.phase = Phase::Idle;
        let now = self.platform.millis();
        self.session_deadline.reset(now);
        self.frame_deadline.reset(now);
    }
}
