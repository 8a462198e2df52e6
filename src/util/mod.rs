//! Shared utilities (hex dump formatting).

pub mod hex;
