//! # scriptrs Filesystem Utilities (`common::fs`)
//!
//! File: cli/src/common/fs/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Organizational unit for filesystem helpers. Currently a single submodule:
//!
//! - **`io`**: Reading manifests (`read_file_to_string`, `read_optional_file`) and
//!   probing for marker files (`first_existing`). Used by `runner::manifest`.
//!
//! Import from the submodule directly, e.g. `crate::common::fs::io::first_existing`.
//!

/// Basic file I/O operations (e.g., `read_optional_file`, `first_existing`).
pub mod io;
