// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! MicroPython snippets executed on the board.
//!
//! Each function returns the source of one raw REPL exec. File contents travel
//! as base64 in both directions so that arbitrary bytes survive the text
//! console.

use std::fmt::Write as _;

/// Import `binascii` under one name on both old and new firmware.
const BINASCII_IMPORT: &str = "try:\n import binascii\nexcept ImportError:\n import ubinascii as binascii";

pub const IMPORT_OS: &str = "import os";
pub const PRINT_CWD: &str = "print(os.getcwd(), end='')";

/// Quote `s` as a single-quoted Python string literal.
pub fn py_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// `os.ilistdir` argument: empty means the current directory.
fn dir_arg(src: &str) -> String {
    if src.is_empty() {
        String::new()
    } else {
        py_str(src)
    }
}

/// Human-readable listing, one `{size:12} {name}[/]` row per entry.
pub fn ls(src: &str) -> String {
    format!(
        "import os\nfor f in os.ilistdir({}):\n print('{{:12}} {{}}{{}}'.format(f[3]if len(f)>3 else 0,f[0],'/'if f[1]&0x4000 else ''))",
        dir_arg(src)
    )
}

/// Machine-readable listing, one `type\tsize\tname` row per entry.
pub fn listdir(src: &str) -> String {
    format!(
        "import os\nfor f in os.ilistdir({}):\n print('{{}}\\t{{}}\\t{{}}'.format(f[1],f[3]if len(f)>3 else 0,f[0]))",
        dir_arg(src)
    )
}

pub fn stat(path: &str) -> String {
    format!("import os\nprint(os.stat({}))", py_str(path))
}

/// Prints `1` if `path` exists, `0` otherwise.
pub fn exists(path: &str) -> String {
    format!(
        "import os\ntry:\n os.stat({})\n print(1,end='')\nexcept OSError:\n print(0,end='')",
        py_str(path)
    )
}

/// Open `path` for reading and bind `r` to its read method.
pub fn open_read(path: &str) -> String {
    format!("{}\nf=open({},'rb')\nr=f.read", BINASCII_IMPORT, py_str(path))
}

/// Read up to `size` bytes through `r` and print them base64 encoded.
pub fn read_chunk(size: usize) -> String {
    format!("print(binascii.b2a_base64(r({})).decode(),end='')", size)
}

/// Open `path` for writing and bind `w` to its write method.
pub fn open_write(path: &str) -> String {
    format!("{}\nf=open({},'wb')\nw=f.write", BINASCII_IMPORT, py_str(path))
}

/// Write one base64 encoded chunk through `w`.
pub fn write_chunk(encoded: &str) -> String {
    format!("w(binascii.a2b_base64('{}'))", encoded)
}

pub const CLOSE: &str = "f.close()";

pub fn mkdir(path: &str) -> String {
    format!("import os\nos.mkdir({})", py_str(path))
}

pub fn rmdir(path: &str) -> String {
    format!("import os\nos.rmdir({})", py_str(path))
}

pub fn remove(path: &str) -> String {
    format!("import os\nos.remove({})", py_str(path))
}

pub fn touch(path: &str) -> String {
    format!("f=open({},'a')\nf.close()", py_str(path))
}

/// Print a text file in `chunk`-sized reads.
pub fn cat(path: &str, chunk: usize) -> String {
    format!(
        "with open({}) as f:\n while 1:\n  b=f.read({})\n  if not b:break\n  print(b,end='')",
        py_str(path),
        chunk
    )
}

/// Copy a file from `src` to `dest` entirely on the board.
pub fn copy(src: &str, dest: &str, chunk: usize) -> String {
    format!(
        "fr=open({},'rb')\nfw=open({},'wb')\nwhile 1:\n d=fr.read({})\n if not d:break\n fw.write(d)\nfr.close()\nfw.close()",
        py_str(src),
        py_str(dest),
        chunk
    )
}

/// Print the CRC-32 of a remote file as an unsigned decimal.
pub fn crc32(path: &str, chunk: usize) -> String {
    format!(
        "{}\nc=0\nwith open({},'rb') as f:\n while 1:\n  b=f.read({})\n  if not b:break\n  c=binascii.crc32(b,c)\nprint(c&0xffffffff,end='')",
        BINASCII_IMPORT,
        py_str(path),
        chunk
    )
}
