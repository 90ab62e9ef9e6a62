//! Controlling terminal device number decoding.
//!
//! `tty_nr` in `/proc/<pid>/stat` packs a device number as
//! `minor[19:8] major[11:0] minor[7:0]`, from high bits to low:
//!
//! ```text
//! major = (tty_nr & 0xFFF00) >> 8
//! minor = (tty_nr & 0x000FF) | ((tty_nr >> 12) & 0xFFF00)
//! ```
//!
//! Only pseudo-terminal slaves are mapped to a device path. Serial lines,
//! virtual consoles and every other major come out as `DeviceClass::Other`.

use std::path::{Path, PathBuf};

/// Major number of Unix98 pseudo-terminal slaves (`/dev/pts/N`).
pub const PTS_MAJOR: u32 = 136;

/// Default directory of pseudo-terminal slave devices.
pub const DEFAULT_PTS_DIR: &str = "/dev/pts";

/// A device number split into major and minor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceNumber {
    pub major: u32,
    pub minor: u32,
}

impl DeviceNumber {
    /// Unpack a `tty_nr` value.
    pub fn decode(tty_nr: u32) -> Self {
        Self {
            major: (tty_nr & 0xFFF00) >> 8,
            minor: (tty_nr & 0x000FF) | ((tty_nr >> 12) & 0xFFF00),
        }
    }

    /// Pack back into the `tty_nr` layout.
    pub fn encode(self) -> u32 {
        ((self.minor & 0xFFF00) << 12) | ((self.major & 0xFFF) << 8) | (self.minor & 0xFF)
    }

    pub fn class(self) -> DeviceClass {
        match self.major {
            PTS_MAJOR => DeviceClass::PseudoTerminal(self.minor),
            _ => DeviceClass::Other(self),
        }
    }
}

/// Terminal device classes that topology queries know how to name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    /// `/dev/pts/<minor>`.
    PseudoTerminal(u32),
    /// Any other device, including "no terminal" (device 0:0).
    Other(DeviceNumber),
}

impl DeviceClass {
    /// Decode a raw `tty_nr` straight to a class.
    pub fn from_tty_nr(tty_nr: u32) -> Self {
        DeviceNumber::decode(tty_nr).class()
    }

    /// Device path under `pts_dir`, for classes that have one.
    pub fn device_path(&self, pts_dir: &Path) -> Option<PathBuf> {
        match self {
            DeviceClass::PseudoTerminal(minor) => Some(pts_dir.join(minor.to_string())),
            DeviceClass::Other(_) => None,
        }
    }

    pub fn is_pseudo_terminal(&self) -> bool {
        matches!(self, DeviceClass::PseudoTerminal(_))
    }
}
