//! Built-in vendor platforms.

pub mod nokia_srl;
