pub mod device;
pub mod error;
pub mod filter;
pub mod firmware;
pub mod ids;
pub mod registry;
pub mod silabs;
