//! Domain types and the ports the application layer drives.

pub mod catalog;
pub mod frame;
pub mod money;
pub mod ports;
pub mod receipt;
pub mod session;
pub mod transaction;
pub mod wallet;
