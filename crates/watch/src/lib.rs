// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Watch definition parsing and validation

mod loader;
mod parser;
mod validator;

pub use loader::{load_watch_file, load_watches_dir, LoadReport};
pub use parser::{parse_watch, parse_watch_json, parse_watch_toml, Format, ParseError};
pub use validator::{validate_watch, ValidationError, ValidationErrors};
