//! Startup Coordinator: runs before any guest code, deciding whether to
//! enter the bootloader protocol core, auto-execute a validated guest
//! image, or report why neither is possible.

pub mod coordinator;
pub mod header;

pub use coordinator::{run, StartupOutcome, BOOTLOADER_ENTRY_PIN, GUEST_IMAGE_BASE, GUEST_IMAGE_PAGE_LEN};
pub use header::{GuestHeader, HeaderError};
