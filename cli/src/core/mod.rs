//! # scriptrs Core Infrastructure
//!
//! File: cli/src/core/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module aggregates the core infrastructure components that provide
//! foundational functionality for the scriptrs application. These components
//! handle configuration, error management, and user-facing strings.
//!
//! ## Architecture
//!
//! The core infrastructure consists of three key components:
//! - `config`: Configuration loading, merging, and validation
//! - `error`: Error types and error handling utilities
//! - `i18n`: Translated banners, notices, and status labels
//!
//! ## Usage
//!
//! ```rust
//! use crate::core::config; // For loading configuration
//! use crate::core::error::{ScriptrsError, Result}; // For error handling
//! use crate::core::i18n::{tr, Message}; // For user-facing strings
//! ```
//!
pub mod config;
pub mod error;
pub mod i18n;
