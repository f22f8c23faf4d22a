//! File access subsystem.
//!
//! # Data Flow
//! ```text
//! GET uri → access.rs [read section: open O_RDONLY + flock(SH)] → ReadLease
//! PUT uri → access.rs [write section: open O_CREAT|O_WRONLY + flock(EX) + truncate] → WriteLease
//! lease dropped → unlock + close
//! ```
//!
//! # Design Decisions
//! - Many readers per path, one writer per path, writer excludes readers
//! - Requests on different paths only contend for the brief open+lock step

pub mod access;

pub use access::{AccessError, FileAccess, ReadLease, WriteLease};
