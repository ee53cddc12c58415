//! End-to-end session lifecycle against the shared platform test double,
//! covering a transfer split across more than one data packet and a
//! frame-timeout recovery mid-transfer.

use cockpit_bootloader::crc::crc32;
use cockpit_bootloader::message::{
    DataPacket, FlashProgramRequest, Handshake, Request, RequestPayload, ResponsePayload,
};
use cockpit_bootloader::session::{BootloaderSession, Outcome, Phase, SessionConfig};
use cockpit_vm_core::test_support::RecordingPlatform;

fn handshake(seq: u32) -> Request {
    Request {
        sequence_id: seq,
        payload: RequestPayload::Handshake(Handshake {
            client_version: 1,
            max_packet_size: 256,
        }),
    }
}

fn prepare(seq: u32, total_data_length: u32) -> Request {
    Request {
        sequence_id: seq,
        payload: RequestPayload::FlashProgram(FlashProgramRequest {
            total_data_length,
            verify_after_program: true,
        }),
    }
}

fn data(seq: u32, offset: u32, bytes: Vec<u8>) -> Request {
    Request {
        sequence_id: seq,
        payload: RequestPayload::Data(DataPacket {
            offset,
            crc32: crc32(&bytes),
            bytes,
        }),
    }
}

#[test]
fn transfer_split_across_two_data_packets_completes_and_verifies() {
    let mut platform = RecordingPlatform::default();
    let mut session = BootloaderSession::new(&mut platform, SessionConfig::default());
    session.begin();

    let (_, outcome) = session.handle_request(handshake(1));
    assert_eq!(outcome, Outcome::Continue);

    let (_, outcome) = session.handle_request(prepare(2, 512));
    assert_eq!(outcome, Outcome::Continue);
    assert_eq!(session.phase(), Phase::ReceiveData);

    let first_half: Vec<u8> = (0..256u32).map(|b| b as u8).collect();
    let second_half: Vec<u8> = (0..256u32).map(|b| (b + 1) as u8).collect();

    let (_, outcome) = session.handle_request(data(3, 0, first_half.clone()));
    assert_eq!(outcome, Outcome::Continue);
    assert_eq!(session.phase(), Phase::ReceiveData);

    let (response, outcome) = session.handle_request(data(4, 256, second_half.clone()));
    assert_eq!(outcome, Outcome::Complete);
    assert_eq!(session.phase(), Phase::Complete);

    let mut expected = first_half;
    expected.extend(second_half);
    match response.payload {
        ResponsePayload::FlashProgramResponse(r) => {
            assert_eq!(r.actual_data_length, 512);
            assert_eq!(r.bytes_programmed, 512);
            assert_eq!(r.verification_hash, crc32(&expected));
        }
        other => panic!("expected FlashProgramResponse, got {other:?}"),
    }
    assert_eq!(session.stats().frames_received, 4);
    assert_eq!(session.stats().recoverable_errors, 0);
}

#[test]
fn a_corrupted_second_packet_resets_to_idle_and_a_full_retry_still_completes() {
    let mut platform = RecordingPlatform::default();
    let mut session = BootloaderSession::new(&mut platform, SessionConfig::default());
    session.begin();
    session.handle_request(handshake(1));
    session.handle_request(prepare(2, 16));
    let (_, outcome) = session.handle_request(data(3, 0, vec![0; 8]));
    assert_eq!(outcome, Outcome::Continue);
    assert_eq!(session.phase(), Phase::ReceiveData);

    let mut bad = data(4, 8, vec![1; 8]);
    if let RequestPayload::Data(packet) = &mut bad.payload {
        packet.crc32 ^= 0xFFFF_FFFF;
    }
    let (_, outcome) = session.handle_request(bad);
    assert_eq!(outcome, Outcome::RecoverableError);
    assert_eq!(session.phase(), Phase::Idle);
    assert_eq!(session.stats().recoverable_errors, 1);

    // The staging buffer from the aborted attempt must not leak into the retry.
    let (_, outcome) = session.handle_request(handshake(5));
    assert_eq!(outcome, Outcome::Continue);
    session.handle_request(prepare(6, 16));
    let (response, outcome) = session.handle_request(data(7, 0, vec![9; 16]));
    assert_eq!(outcome, Outcome::Complete);
    match response.payload {
        ResponsePayload::FlashProgramResponse(r) => {
            assert_eq!(r.actual_data_length, 16);
            assert_eq!(r.verification_hash, crc32(&vec![9; 16]));
        }
        other => panic!("expected FlashProgramResponse, got {other:?}"),
    }
}
