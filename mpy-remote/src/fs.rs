// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Filesystem operations on the board.
//!
//! All operations require the session to be in raw REPL mode. Remote
//! `OSError`s about missing or existing paths are reported as
//! [`PyboardError::NotFound`] / [`PyboardError::AlreadyExists`].

use std::fs;
use std::io::Write;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use crc::{Crc, CRC_32_ISO_HDLC};
use tracing::{debug, info};

use mpy_common::listing::{parse_listdir, parse_stat};
use mpy_common::{paths, script, DirEntry, RemoteStat, TRANSFER_CHUNK};

use crate::error::{PyboardError, Result};
use crate::pyboard::Pyboard;
use crate::transport::Link;

/// Same polynomial as `binascii.crc32` on the board.
pub const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Called with (bytes done, bytes total) during transfers.
pub type Progress<'a> = &'a mut dyn FnMut(u64, u64);

impl<L: Link> Pyboard<L> {
    pub fn fs_exists(&mut self, path: &str) -> Result<bool> {
        Ok(self.exec(script::exists(path))? == b"1")
    }

    /// Write a human-readable listing of `src` into `out`.
    pub fn fs_ls(&mut self, src: &str, out: &mut dyn Write) -> Result<()> {
        self.exec_to_writer(script::ls(src), out)
            .map_err(|e| e.convert(src))
    }

    pub fn fs_listdir(&mut self, src: &str) -> Result<Vec<DirEntry>> {
        let out = self
            .exec(script::listdir(src))
            .map_err(|e| e.convert(src))?;
        Ok(parse_listdir(&String::from_utf8_lossy(&out))?)
    }

    pub fn fs_stat(&mut self, path: &str) -> Result<RemoteStat> {
        let out = self.exec(script::stat(path)).map_err(|e| e.convert(path))?;
        Ok(parse_stat(&String::from_utf8_lossy(&out))?)
    }

    /// Write the contents of a remote text file into `out`.
    pub fn fs_cat(&mut self, path: &str, out: &mut dyn Write) -> Result<()> {
        self.exec_to_writer(script::cat(path, TRANSFER_CHUNK), out)
            .map_err(|e| e.convert(path))
    }

    pub fn fs_readfile(&mut self, src: &str, mut progress: Option<Progress<'_>>) -> Result<Vec<u8>> {
        let total = match progress {
            Some(_) => self.fs_stat(src)?.size,
            None => 0,
        };

        self.exec(script::open_read(src))
            .map_err(|e| e.convert(src))?;

        let mut contents = Vec::new();
        loop {
            let out = self.exec(script::read_chunk(TRANSFER_CHUNK))?;
            let encoded = String::from_utf8_lossy(&out);
            let encoded = encoded.trim();
            if encoded.is_empty() {
                break;
            }
            let chunk = STANDARD.decode(encoded).map_err(|e| {
                PyboardError::protocol(format!("bad base64 chunk from board: {}", e))
            })?;
            contents.extend_from_slice(&chunk);
            if let Some(report) = progress.as_deref_mut() {
                report(contents.len() as u64, total);
            }
        }

        self.exec(script::CLOSE)?;
        debug!("Read {} bytes from {}", contents.len(), src);
        Ok(contents)
    }

    pub fn fs_writefile(
        &mut self,
        dest: &str,
        data: &[u8],
        mut progress: Option<Progress<'_>>,
    ) -> Result<()> {
        self.exec(script::open_write(dest))
            .map_err(|e| e.convert(dest))?;

        let total = data.len() as u64;
        let mut written = 0u64;
        for chunk in data.chunks(TRANSFER_CHUNK) {
            self.exec(script::write_chunk(&STANDARD.encode(chunk)))?;
            written += chunk.len() as u64;
            if let Some(report) = progress.as_deref_mut() {
                report(written, total);
            }
        }

        self.exec(script::CLOSE)?;
        debug!("Wrote {} bytes to {}", total, dest);
        Ok(())
    }

    /// Copy a file to another path on the board.
    pub fn fs_cp(&mut self, src: &str, dest: &str) -> Result<()> {
        self.exec(script::copy(src, dest, TRANSFER_CHUNK))
            .map_err(|e| e.convert(src))?;
        Ok(())
    }

    /// Download a remote file to the host.
    pub fn fs_get(&mut self, src: &str, dest: &Path, progress: Option<Progress<'_>>) -> Result<()> {
        let data = self.fs_readfile(src, progress)?;
        fs::write(dest, data)?;
        Ok(())
    }

    /// Upload a host file to the board, returning its CRC-32.
    pub fn fs_put(&mut self, src: &Path, dest: &str, progress: Option<Progress<'_>>) -> Result<u32> {
        let data = fs::read(src)?;
        self.fs_writefile(dest, &data, progress)?;
        Ok(CRC32.checksum(&data))
    }

    /// CRC-32 of a remote file, computed on the board.
    pub fn fs_crc32(&mut self, path: &str) -> Result<u32> {
        let out = self
            .exec(script::crc32(path, TRANSFER_CHUNK))
            .map_err(|e| e.convert(path))?;
        let text = String::from_utf8_lossy(&out);
        text.trim().parse().map_err(|_| {
            PyboardError::protocol(format!("bad crc32 from board: {:?}", text))
        })
    }

    /// Check that a remote file has the expected CRC-32.
    pub fn fs_verify(&mut self, path: &str, expected: u32) -> Result<()> {
        let actual = self.fs_crc32(path)?;
        if actual != expected {
            return Err(PyboardError::protocol(format!(
                "verification failed for {}: local crc32 0x{:08x}, board 0x{:08x}",
                path, expected, actual
            )));
        }
        debug!("Verified {} (crc32 0x{:08x})", path, actual);
        Ok(())
    }

    pub fn fs_mkdir(&mut self, path: &str) -> Result<()> {
        self.exec(script::mkdir(path)).map_err(|e| e.convert(path))?;
        Ok(())
    }

    pub fn fs_rmdir(&mut self, path: &str) -> Result<()> {
        self.exec(script::rmdir(path)).map_err(|e| e.convert(path))?;
        Ok(())
    }

    pub fn fs_rm(&mut self, path: &str) -> Result<()> {
        self.exec(script::remove(path)).map_err(|e| e.convert(path))?;
        Ok(())
    }

    pub fn fs_touch(&mut self, path: &str) -> Result<()> {
        self.exec(script::touch(path)).map_err(|e| e.convert(path))?;
        Ok(())
    }

    /// Remove a file, or a directory and everything below it.
    pub fn fs_rm_recursive(&mut self, path: &str) -> Result<()> {
        if !self.fs_stat(path)?.is_dir() {
            return self.fs_rm(path);
        }
        for entry in self.fs_listdir(path)? {
            let child = paths::join(path, &entry.name);
            if entry.is_dir() {
                self.fs_rm_recursive(&child)?;
            } else {
                self.fs_rm(&child)?;
            }
        }
        self.fs_rmdir(path)
    }

    /// Upload a host file or directory tree; directories are created as needed.
    pub fn fs_put_recursive(&mut self, src: &Path, dest: &str, verify: bool) -> Result<()> {
        if !src.is_dir() {
            info!("{} -> :{}", src.display(), dest);
            let crc = self.fs_put(src, dest, None)?;
            if verify {
                self.fs_verify(dest, crc)?;
            }
            return Ok(());
        }

        match self.fs_mkdir(dest) {
            Ok(()) | Err(PyboardError::AlreadyExists { .. }) => {}
            Err(e) => return Err(e),
        }

        let mut entries = fs::read_dir(src)?.collect::<std::io::Result<Vec<_>>>()?;
        entries.sort_by_key(|e| e.file_name());
        for entry in entries {
            let name = entry.file_name().to_string_lossy().into_owned();
            self.fs_put_recursive(&entry.path(), &paths::join(dest, &name), verify)?;
        }
        Ok(())
    }

    /// Download a remote file or directory tree into `dest`.
    pub fn fs_get_recursive(&mut self, src: &str, dest: &Path) -> Result<()> {
        if !self.fs_stat(src)?.is_dir() {
            info!(":{} -> {}", src, dest.display());
            return self.fs_get(src, dest, None);
        }

        fs::create_dir_all(dest)?;
        for entry in self.fs_listdir(src)? {
            let child = paths::join(src, &entry.name);
            self.fs_get_recursive(&child, &dest.join(&entry.name))?;
        }
        Ok(())
    }
}
