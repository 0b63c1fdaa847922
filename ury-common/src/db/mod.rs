//! Database bootstrap and member records

pub mod init;
pub mod members;

pub use init::*;
pub use members::*;
