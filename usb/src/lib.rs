pub use rusb;

pub mod descriptor;
pub mod error;
pub mod interface;
pub mod libusb;
pub mod transport;
