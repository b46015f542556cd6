//! Drive enumeration for the file explorer's `:` listing.
//!
//! On Windows this queries the logical drive mask and, for each mounted and
//! ready drive, its volume label. Elsewhere the filesystem root stands in so
//! the explorer stays usable in tests and on non-Windows hosts.

use std::path::PathBuf;

/// One mounted, ready drive as shown by the `:` listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveEntry {
    label: String,
    root: PathBuf,
}

impl DriveEntry {
    pub(crate) fn new(label: String, root: PathBuf) -> Self {
        DriveEntry { label, root }
    }

    // Accessors

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

/// Display label for one drive: the volume label plus the letter, or
/// "Local Disk" when the volume carries no label.
pub(crate) fn drive_label(volume_label: &str, letter: char) -> String {
    if volume_label.is_empty() {
        format!("Local Disk ({letter}:)")
    } else {
        format!("{volume_label} ({letter}:)")
    }
}

/// Enumerates the mounted and ready drives, in letter order.
#[cfg(windows)]
pub fn ready_drives() -> Vec<DriveEntry> {
    use windows_sys::Win32::Storage::FileSystem::{
        DRIVE_FIXED, DRIVE_RAMDISK, DRIVE_REMOTE, DRIVE_REMOVABLE, GetDriveTypeW,
        GetLogicalDrives, GetVolumeInformationW,
    };

    let mask = unsafe { GetLogicalDrives() };
    let mut drives = Vec::new();

    for bit in 0..26u32 {
        if mask & (1 << bit) == 0 {
            continue;
        }
        let letter = (b'A' + bit as u8) as char;
        let root = format!("{letter}:\\");
        let root_w: Vec<u16> = root.encode_utf16().chain(std::iter::once(0)).collect();

        let drive_type = unsafe { GetDriveTypeW(root_w.as_ptr()) };
        if !matches!(
            drive_type,
            DRIVE_FIXED | DRIVE_REMOVABLE | DRIVE_REMOTE | DRIVE_RAMDISK
        ) {
            continue;
        }

        let mut label_buf = [0u16; 261];
        let ok = unsafe {
            GetVolumeInformationW(
                root_w.as_ptr(),
                label_buf.as_mut_ptr(),
                label_buf.len() as u32,
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                0,
            )
        };
        // A drive that fails the volume query is not ready (empty reader,
        // disconnected share); the listing skips it.
        if ok == 0 {
            continue;
        }
        let end = label_buf.iter().position(|&c| c == 0).unwrap_or(0);
        let volume_label = String::from_utf16_lossy(&label_buf[..end]);

        drives.push(DriveEntry::new(
            drive_label(&volume_label, letter),
            PathBuf::from(root),
        ));
    }
    drives
}

/// Non-Windows fallback: the filesystem root is the only "drive".
#[cfg(not(windows))]
pub fn ready_drives() -> Vec<DriveEntry> {
    vec![DriveEntry::new(
        "File System (/)".to_string(),
        PathBuf::from("/"),
    )]
}
