// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Parsing of remote directory listings and `os.stat` results.

use crate::error::{Error, Result};

/// Directory bit of the `ilistdir` type field and of `st_mode`.
pub const S_IFDIR: u32 = 0x4000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

impl EntryKind {
    pub fn from_mode(mode: u32) -> Self {
        if mode & S_IFDIR != 0 {
            Self::Dir
        } else {
            Self::File
        }
    }
}

/// One entry of a remote directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
    pub size: u64,
}

impl DirEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }

    /// Same layout as the board-side `ls` snippet.
    pub fn ls_line(&self) -> String {
        format!(
            "{:>12} {}{}",
            self.size,
            self.name,
            if self.is_dir() { "/" } else { "" }
        )
    }
}

/// Parse `type\tsize\tname` rows produced by [`crate::script::listdir`].
pub fn parse_listdir(output: &str) -> Result<Vec<DirEntry>> {
    output
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .map(parse_listdir_line)
        .collect()
}

fn parse_listdir_line(line: &str) -> Result<DirEntry> {
    let malformed = || Error::MalformedListing(line.to_string());
    let mut fields = line.splitn(3, '\t');
    let mode: u32 = fields
        .next()
        .and_then(|f| f.parse().ok())
        .ok_or_else(malformed)?;
    let size: u64 = fields
        .next()
        .and_then(|f| f.parse().ok())
        .ok_or_else(malformed)?;
    let name = fields.next().filter(|n| !n.is_empty()).ok_or_else(malformed)?;

    Ok(DirEntry {
        name: name.to_string(),
        kind: EntryKind::from_mode(mode),
        size,
    })
}

/// The fields of a remote `os.stat` result the tools care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteStat {
    pub mode: u32,
    pub size: u64,
    pub mtime: u64,
}

impl RemoteStat {
    pub fn is_dir(&self) -> bool {
        self.mode & S_IFDIR != 0
    }
}

/// Parse the printed 10-tuple `(mode, ino, dev, nlink, uid, gid, size, atime, mtime, ctime)`.
pub fn parse_stat(output: &str) -> Result<RemoteStat> {
    let malformed = || Error::MalformedStat(output.to_string());
    let inner = output
        .trim()
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(malformed)?;

    let fields = inner
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(|f| f.parse::<i64>().map_err(|_| malformed()))
        .collect::<Result<Vec<_>>>()?;

    if fields.len() < 9 {
        return Err(malformed());
    }

    Ok(RemoteStat {
        mode: u32::try_from(fields[0]).map_err(|_| malformed())?,
        size: u64::try_from(fields[6]).map_err(|_| malformed())?,
        mtime: u64::try_from(fields[8]).unwrap_or(0),
    })
}
