// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Remote path rules for filesystem commands.
//!
//! On the command line a leading `:` marks a path on the board. Remote paths
//! always use `/` as separator regardless of the host platform.

/// True when the argument names a path on the board.
pub fn is_remote(arg: &str) -> bool {
    arg.starts_with(':')
}

/// Strip the `:` marker and normalize separators to `/`.
pub fn remote_name(arg: &str) -> String {
    let name = arg.strip_prefix(':').unwrap_or(arg);
    if std::path::MAIN_SEPARATOR == '/' {
        name.to_string()
    } else {
        name.replace(std::path::MAIN_SEPARATOR, "/")
    }
}

fn is_separator(c: char) -> bool {
    c == '/' || c == std::path::MAIN_SEPARATOR
}

/// Last component of a path; trailing separators are ignored.
pub fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches(is_separator);
    trimmed.rsplit(is_separator).next().unwrap_or(trimmed)
}

/// Resolve the destination of copying `src` to `dest`.
///
/// An empty destination means "same name here", `.` means the current
/// directory and a trailing `/` means "into this directory".
pub fn cp_destination(src: &str, dest: &str) -> String {
    let name = basename(src);
    if dest.is_empty() {
        name.to_string()
    } else if dest == "." {
        format!("./{}", name)
    } else if dest.ends_with('/') {
        format!("{}{}", dest, name)
    } else {
        dest.to_string()
    }
}

/// Join a remote directory and an entry name.
pub fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else if dir.ends_with('/') {
        format!("{}{}", dir, name)
    } else {
        format!("{}/{}", dir, name)
    }
}
