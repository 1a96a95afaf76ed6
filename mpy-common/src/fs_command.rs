// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Filesystem command line parsing (`cp`, `ls`, `cat`, ...).

use crate::error::{Error, Result};

/// A parsed filesystem command. Paths keep their `:` markers; the executor
/// decides per argument whether it is local or remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsCommand {
    Cat(Vec<String>),
    Ls(Vec<String>),
    Cp {
        sources: Vec<String>,
        dest: String,
        recursive: bool,
    },
    Rm {
        paths: Vec<String>,
        recursive: bool,
    },
    Mkdir(Vec<String>),
    Rmdir(Vec<String>),
    Touch(Vec<String>),
    /// Print the CRC-32 of remote files.
    Hash(Vec<String>),
}

impl FsCommand {
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Self> {
        let (cmd, rest) = args
            .split_first()
            .ok_or_else(|| Error::usage("fs", "missing filesystem command"))?;
        let rest: Vec<&str> = rest.iter().map(AsRef::as_ref).collect();

        match cmd.as_ref() {
            "cp" => {
                let (recursive, mut operands) = take_recursive_flag(&rest);
                if operands.len() < 2 {
                    return Err(Error::usage("cp", "need at least one source and a destination"));
                }
                let dest = operands.pop().unwrap_or_default();
                Ok(Self::Cp {
                    sources: operands,
                    dest,
                    recursive,
                })
            }
            "rm" => {
                let (recursive, paths) = take_recursive_flag(&rest);
                Ok(Self::Rm {
                    paths: require_paths("rm", paths)?,
                    recursive,
                })
            }
            // No path lists the current remote directory.
            "ls" if rest.is_empty() => Ok(Self::Ls(vec![String::new()])),
            "ls" => Ok(Self::Ls(owned(&rest))),
            "cat" => Ok(Self::Cat(require_paths("cat", owned(&rest))?)),
            "mkdir" => Ok(Self::Mkdir(require_paths("mkdir", owned(&rest))?)),
            "rmdir" => Ok(Self::Rmdir(require_paths("rmdir", owned(&rest))?)),
            "touch" => Ok(Self::Touch(require_paths("touch", owned(&rest))?)),
            "hash" => Ok(Self::Hash(require_paths("hash", owned(&rest))?)),
            other => Err(Error::UnknownCommand(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Cat(_) => "cat",
            Self::Ls(_) => "ls",
            Self::Cp { .. } => "cp",
            Self::Rm { .. } => "rm",
            Self::Mkdir(_) => "mkdir",
            Self::Rmdir(_) => "rmdir",
            Self::Touch(_) => "touch",
            Self::Hash(_) => "hash",
        }
    }
}

fn owned(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

fn take_recursive_flag(args: &[&str]) -> (bool, Vec<String>) {
    let recursive = args.contains(&"-r");
    let operands = args
        .iter()
        .filter(|a| **a != "-r")
        .map(|s| s.to_string())
        .collect();
    (recursive, operands)
}

fn require_paths(command: &'static str, paths: Vec<String>) -> Result<Vec<String>> {
    if paths.is_empty() {
        Err(Error::usage(command, "missing path"))
    } else {
        Ok(paths)
    }
}
