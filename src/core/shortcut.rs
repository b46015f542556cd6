//! Shortcut decoding for presto.
//!
//! Resolves start menu shortcut files into [CandidateEntry] values:
//! - `.lnk`: the Shell Link binary format, parsed directly from the file
//!   bytes. Each file gets its own scoped reader, so decoding holds no
//!   shared handle and releases everything on every exit path.
//! - `.url`: the `[InternetShortcut]` INI section.
//!
//! Per-file failures never propagate to the load pass: [resolve] logs them
//! at debug level and returns `None`, and the pass simply drops the file.

use crate::core::entry::{CandidateEntry, IconRef};
use crate::utils::expand_env_vars;

use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShortcutError {
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("not a shell link")]
    NotShellLink,
    #[error("truncated shell link data")]
    Truncated,
    #[error("missing URL key")]
    MissingUrl,
    #[error("empty launch target")]
    EmptyTarget,
}

// LinkFlags bits of the shell link header.
const HAS_LINK_TARGET_ID_LIST: u32 = 0x01;
const HAS_LINK_INFO: u32 = 0x02;
const HAS_NAME: u32 = 0x04;
const HAS_RELATIVE_PATH: u32 = 0x08;
const HAS_WORKING_DIR: u32 = 0x10;
const HAS_ARGUMENTS: u32 = 0x20;
const HAS_ICON_LOCATION: u32 = 0x40;
const IS_UNICODE: u32 = 0x80;

const HEADER_SIZE: u32 = 0x4C;
const SHELL_LINK_CLSID: [u8; 16] = [
    0x01, 0x14, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0xC0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x46,
];

// Extra data block signatures and the fixed field sizes of the two
// environment blocks (260 ANSI chars plus 260 UTF-16 code units).
const ENV_VAR_DATA_BLOCK: u32 = 0xA000_0001;
const ICON_ENV_DATA_BLOCK: u32 = 0xA000_0007;
const ENV_BLOCK_ANSI_LEN: usize = 260;
const ENV_BLOCK_UNICODE_LEN: usize = 520;

/// Resolves one shortcut file, dropping it on any per-file failure.
pub fn resolve(path: &Path) -> Option<CandidateEntry> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    let result = match ext.as_str() {
        "lnk" => decode_lnk(path),
        "url" => decode_url(path),
        _ => return None,
    };
    match result {
        Ok(entry) => Some(entry),
        Err(e) => {
            tracing::debug!("shortcut {} dropped: {}", path.display(), e);
            None
        }
    }
}

/// Decodes a `.lnk` file.
///
/// The entry's launch target stays the shortcut file itself (the host shell
/// resolves it again at launch time); the parsed link target only feeds the
/// subtitle and the icon fallback.
pub(crate) fn decode_lnk(path: &Path) -> Result<CandidateEntry, ShortcutError> {
    let data = fs::read(path)?;
    let parsed = parse_shell_link(&data)?;

    let resolved_target = parsed
        .link_info_path
        .or(parsed.env_target)
        .or_else(|| {
            parsed
                .relative_path
                .map(|rel| join_lexically(path.parent(), &rel))
        })
        .map(|t| expand_env_vars(&t))
        .unwrap_or_default();

    let icon = match parsed.icon_location.or(parsed.icon_env_path) {
        Some(location) => IconRef::new(expand_env_vars(&location), parsed.icon_index),
        None if !resolved_target.is_empty() => IconRef::new(resolved_target.clone(), 0),
        None => IconRef::shell_default(),
    };

    let subtitle = if resolved_target.is_empty() {
        String::new()
    } else {
        display_stem(&resolved_target)
    };

    CandidateEntry::app(
        file_stem(path),
        subtitle,
        path.to_string_lossy().into_owned(),
        icon,
    )
    .ok_or(ShortcutError::EmptyTarget)
}

/// Decodes a `.url` file. `URL` is mandatory, `IconFile` optional.
pub(crate) fn decode_url(path: &Path) -> Result<CandidateEntry, ShortcutError> {
    let content = fs::read_to_string(path)?;

    let url = ini_lookup(&content, "InternetShortcut", "URL")
        .filter(|u| !u.is_empty())
        .ok_or(ShortcutError::MissingUrl)?;

    let icon = match ini_lookup(&content, "InternetShortcut", "IconFile").filter(|p| !p.is_empty())
    {
        Some(icon_file) => {
            let index = ini_lookup(&content, "InternetShortcut", "IconIndex")
                .and_then(|v| v.parse::<i32>().ok())
                .unwrap_or(0);
            IconRef::new(icon_file, index)
        }
        None => IconRef::shell_default(),
    };

    let stem = file_stem(path);
    CandidateEntry::url(stem.clone(), stem, url, icon).ok_or(ShortcutError::EmptyTarget)
}

/// Finds `key=value` inside `[section]`, both matched case-insensitively.
///
/// Two keys in one section is all `.url` files need; an INI crate would be
/// heavier than the format.
fn ini_lookup(content: &str, section: &str, key: &str) -> Option<String> {
    let mut in_section = false;
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            in_section = name.eq_ignore_ascii_case(section);
            continue;
        }
        if !in_section {
            continue;
        }
        if let Some((k, v)) = line.split_once('=')
            && k.trim().eq_ignore_ascii_case(key)
        {
            return Some(v.trim().to_string());
        }
    }
    None
}

/// The fields of a shell link presto cares about.
struct ParsedLink {
    icon_index: i32,
    link_info_path: Option<String>,
    relative_path: Option<String>,
    icon_location: Option<String>,
    env_target: Option<String>,
    icon_env_path: Option<String>,
}

fn parse_shell_link(data: &[u8]) -> Result<ParsedLink, ShortcutError> {
    let mut r = Reader::new(data);

    if r.u32()? != HEADER_SIZE {
        return Err(ShortcutError::NotShellLink);
    }
    if r.take(16)? != SHELL_LINK_CLSID {
        return Err(ShortcutError::NotShellLink);
    }
    let flags = r.u32()?;
    // FileAttributes, the three timestamps and FileSize.
    r.skip(4 + 24 + 4)?;
    let icon_index = r.i32()?;
    // ShowCommand, HotKey and the reserved fields.
    r.skip(4 + 2 + 2 + 4 + 4)?;

    if flags & HAS_LINK_TARGET_ID_LIST != 0 {
        let id_list_size = r.u16()? as usize;
        r.skip(id_list_size)?;
    }

    let mut link_info_path = None;
    if flags & HAS_LINK_INFO != 0 {
        let start = r.pos();
        let link_info_size = r.u32()? as usize;
        if link_info_size < 4 {
            return Err(ShortcutError::Truncated);
        }
        r.seek(start);
        let block = r.take(link_info_size)?;
        link_info_path = parse_link_info(block);
    }

    let unicode = flags & IS_UNICODE != 0;
    if flags & HAS_NAME != 0 {
        read_string_data(&mut r, unicode)?;
    }
    let mut relative_path = None;
    if flags & HAS_RELATIVE_PATH != 0 {
        relative_path = non_empty(read_string_data(&mut r, unicode)?);
    }
    if flags & HAS_WORKING_DIR != 0 {
        read_string_data(&mut r, unicode)?;
    }
    if flags & HAS_ARGUMENTS != 0 {
        read_string_data(&mut r, unicode)?;
    }
    let mut icon_location = None;
    if flags & HAS_ICON_LOCATION != 0 {
        icon_location = non_empty(read_string_data(&mut r, unicode)?);
    }

    let mut env_target = None;
    let mut icon_env_path = None;
    while r.remaining() >= 4 {
        let size = r.u32()? as usize;
        if size < 4 {
            // Terminal block.
            break;
        }
        let body_len = size - 4;
        if r.remaining() < body_len {
            break;
        }
        let body = r.take(body_len)?;
        if body.len() < 4 {
            continue;
        }
        let signature = u32::from_le_bytes([body[0], body[1], body[2], body[3]]);
        let fields = &body[4..];
        match signature {
            ENV_VAR_DATA_BLOCK if fields.len() >= ENV_BLOCK_ANSI_LEN + ENV_BLOCK_UNICODE_LEN => {
                env_target = env_block_path(fields);
            }
            ICON_ENV_DATA_BLOCK if fields.len() >= ENV_BLOCK_ANSI_LEN + ENV_BLOCK_UNICODE_LEN => {
                icon_env_path = env_block_path(fields);
            }
            _ => {}
        }
    }

    Ok(ParsedLink {
        icon_index,
        link_info_path,
        relative_path,
        icon_location,
        env_target,
        icon_env_path,
    })
}

/// Extracts the local base path + common suffix of a LinkInfo block.
/// All offsets are relative to the start of the block.
fn parse_link_info(block: &[u8]) -> Option<String> {
    if block.len() < 28 {
        return None;
    }
    let flags = u32::from_le_bytes([block[8], block[9], block[10], block[11]]);
    // Bit 0: VolumeIDAndLocalBasePath.
    if flags & 0x1 == 0 {
        return None;
    }
    let base_off = u32::from_le_bytes([block[16], block[17], block[18], block[19]]) as usize;
    let suffix_off = u32::from_le_bytes([block[24], block[25], block[26], block[27]]) as usize;

    let base = read_cstr_ansi(block, base_off)?;
    let suffix = read_cstr_ansi(block, suffix_off).unwrap_or_default();
    non_empty(format!("{base}{suffix}"))
}

/// Prefers the UTF-16 field of an environment data block, falling back to
/// the ANSI one.
fn env_block_path(fields: &[u8]) -> Option<String> {
    let unicode = cstr_utf16(&fields[ENV_BLOCK_ANSI_LEN..ENV_BLOCK_ANSI_LEN + ENV_BLOCK_UNICODE_LEN]);
    if !unicode.is_empty() {
        return Some(unicode);
    }
    read_cstr_ansi(fields, 0).and_then(non_empty)
}

/// One StringData slot: a u16 character count followed by that many
/// UTF-16 code units, or bytes when the link is not unicode.
fn read_string_data(r: &mut Reader<'_>, unicode: bool) -> Result<String, ShortcutError> {
    let count = r.u16()? as usize;
    if unicode {
        let bytes = r.take(count * 2)?;
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        Ok(String::from_utf16_lossy(&units))
    } else {
        let bytes = r.take(count)?;
        Ok(latin1(bytes))
    }
}

fn read_cstr_ansi(data: &[u8], offset: usize) -> Option<String> {
    let slice = data.get(offset..)?;
    let end = slice.iter().position(|&b| b == 0).unwrap_or(slice.len());
    Some(latin1(&slice[..end]))
}

fn cstr_utf16(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .take_while(|&u| u != 0)
        .collect();
    String::from_utf16_lossy(&units)
}

/// System ANSI decoded as Latin-1. Good enough for the path bytes non
/// unicode links carry.
fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Final component stem of a path string that may use either separator.
fn display_stem(path_text: &str) -> String {
    let name = path_text
        .rsplit(['\\', '/'])
        .next()
        .unwrap_or(path_text);
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => name.to_string(),
    }
}

/// Lexical join against the shortcut's directory, used for relative link
/// targets. The result is display text, not a canonical path.
fn join_lexically(parent: Option<&Path>, relative: &str) -> String {
    match parent {
        Some(p) if !p.as_os_str().is_empty() => {
            format!(
                "{}{}{}",
                p.to_string_lossy(),
                std::path::MAIN_SEPARATOR,
                relative
            )
        }
        _ => relative.to_string(),
    }
}

/// Bounds-checked little-endian reader over the link bytes.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Reader { data, pos: 0 }
    }

    fn pos(&self) -> usize {
        self.pos
    }

    fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ShortcutError> {
        let end = self.pos.checked_add(n).ok_or(ShortcutError::Truncated)?;
        let slice = self
            .data
            .get(self.pos..end)
            .ok_or(ShortcutError::Truncated)?;
        self.pos = end;
        Ok(slice)
    }

    fn skip(&mut self, n: usize) -> Result<(), ShortcutError> {
        self.take(n).map(|_| ())
    }

    fn u16(&mut self) -> Result<u16, ShortcutError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, ShortcutError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn i32(&mut self) -> Result<i32, ShortcutError> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}
