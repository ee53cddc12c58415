//! Thin binary driving a `ComponentVM` or a `BootloaderSession` from the
//! command line. Argument parsing and error reporting only; all real logic
//! lives in the library crates it wires together.

mod config;

use clap::{Parser, Subcommand};
use cockpit_bootloader::message::{
    DataPacket, FlashProgramRequest, Handshake, Request, RequestPayload,
};
use cockpit_bootloader::{BootloaderSession, Outcome};
use cockpit_platform_sim::SimPlatform;
use cockpit_startup::GuestHeader;
use cockpit_vm_core::ComponentVM;
use config::{CliConfig, Mode};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cockpit", about = "Host-side driver for the CockpitVM components")]
struct Cli {
    /// Path to a TOML configuration file (see the Configuration block).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a raw bytecode image to completion against a simulated board.
    Run {
        /// Path to a flat bytecode file (no header).
        program: PathBuf,
    },
    /// Write a header-wrapped guest image into the simulated flash region
    /// at the reserved page, then validate it the way startup would.
    Flash {
        /// Path to a header-wrapped image (see `cockpit-startup::header`).
        image: PathBuf,
    },
    /// Drive a bootloader session end-to-end over a raw bytecode image,
    /// chunking it into data packets the way a real host tool would send
    /// them over UART.
    BootloaderServe {
        /// Path to a flat bytecode file to deliver.
        image: PathBuf,
        /// Bytes per data packet.
        #[arg(long, default_value_t = 256)]
        chunk_size: usize,
    },
}

fn main() {
    let cli = Cli::parse();
    let config = match CliConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };
    init_logging(&config);

    let result = match cli.command {
        Command::Run { program } => run_program(&program),
        Command::Flash { image } => flash_image(&image),
        Command::BootloaderServe { image, chunk_size } => {
            bootloader_serve(&image, chunk_size, &config)
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Default log level is driven by the config, not just `RUST_LOG`: debug
/// output (BPC phase transitions, VM faults) only shows up when
/// `enable_debug_output` is set or `initial_mode` is `Debug`. `RUST_LOG`
/// still overrides this default when set, so a one-off `RUST_LOG=trace`
/// works regardless of what's in the config file.
fn init_logging(config: &CliConfig) {
    let default_level = if config.enable_debug_output || config.initial_mode == Mode::Debug {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn run_program(path: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)?;
    let mut platform = SimPlatform::new();
    let mut vm = ComponentVM::new(&mut platform);
    vm.load_bytes(&bytes)?;
    match vm.run() {
        Ok(()) => {
            println!("halted cleanly, stack top = {:?}", vm.stack_top());
            Ok(())
        }
        Err(e) => Err(format!("guest faulted: {e}").into()),
    }
}

fn flash_image(path: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    let page = std::fs::read(path)?;
    match cockpit_startup::header::validate(&page, cockpit_bootloader::crc::crc32) {
        Ok((header, stream)) => {
            print_header(&header);
            println!("instruction stream: {} bytes, validated OK", stream.len());
            Ok(())
        }
        Err(e) => Err(format!("image rejected: {e}").into()),
    }
}

fn print_header(header: &GuestHeader) {
    println!(
        "magic=0x{:08X} version={} instructions={} crc32=0x{:08X}",
        header.magic, header.version, header.instruction_count, header.crc32
    );
}

fn bootloader_serve(
    path: &std::path::Path,
    chunk_size: usize,
    config: &CliConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let image = std::fs::read(path)?;
    let mut platform = SimPlatform::new();
    let mut session = BootloaderSession::new(&mut platform, config.session_config());
    session.begin();

    let mut seq = 0u32;
    let mut next_request = |payload| {
        seq += 1;
        Request { sequence_id: seq, payload }
    };

    let (_, outcome) = session.handle_request(next_request(RequestPayload::Handshake(Handshake {
        client_version: 1,
        max_packet_size: chunk_size as u16,
    })));
    expect_continue(outcome)?;

    let (_, outcome) = session.handle_request(next_request(RequestPayload::FlashProgram(
        FlashProgramRequest {
            total_data_length: image.len() as u32,
            verify_after_program: true,
        },
    )));
    expect_continue(outcome)?;

    for (i, chunk) in image.chunks(chunk_size).enumerate() {
        let offset = (i * chunk_size) as u32;
        let crc32 = cockpit_bootloader::crc::crc32(chunk);
        let (response, outcome) = session.handle_request(next_request(RequestPayload::Data(DataPacket {
            offset,
            bytes: chunk.to_vec(),
            crc32,
        })));
        match outcome {
            Outcome::Continue => {}
            Outcome::Complete => {
                println!("flash session complete: {:?}", response.payload);
                let stats = session.stats();
                if config.enable_resource_tracking {
                    println!(
                        "frames={} recoverable_errors={} critical_errors={}",
                        stats.frames_received, stats.recoverable_errors, stats.critical_errors
                    );
                }
                return Ok(());
            }
            other => return Err(format!("bootloader session failed: {other:?}").into()),
        }
    }
    Err("image exhausted before the session reported completion".into())
}

fn expect_continue(outcome: Outcome) -> Result<(), Box<dyn std::error::Error>> {
    if outcome == Outcome::Continue {
        Ok(())
    } else {
        Err(format!("expected Continue, got {outcome:?}").into())
    }
}

