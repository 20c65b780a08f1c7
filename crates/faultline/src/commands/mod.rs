//! Command implementations that go beyond a single controller call.

pub mod init;
pub mod seed;
