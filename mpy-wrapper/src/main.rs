// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

use std::env;
use std::process::ExitCode;

use tracing::error;

use mpy_remote::cli::{init_logging, main_with_args};
use mpy_remote::PyboardError;

fn main() -> ExitCode {
    let result = env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|base| mpy_wrapper::run(env::args_os().collect(), &base, main_with_args));

    match result {
        Ok(code) => code,
        Err(err) => {
            init_logging(false);
            error!("{:#}", err);
            let code = err
                .downcast_ref::<PyboardError>()
                .map_or(1, PyboardError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}
