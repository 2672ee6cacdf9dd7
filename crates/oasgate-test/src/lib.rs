//! Test harnesses for the oasgate binary.
//!
//! The CLI tests invoke `oasgate` as a subprocess against the shared
//! fixtures in `tests/fixtures`.

#[cfg(test)]
mod cli;
