//! Cross-cutting helpers shared by the client crates and binaries.

pub mod utils;
pub mod env;
