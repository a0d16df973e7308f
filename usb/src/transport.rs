//! Capability traits the driver layer consumes.
//!
//! These wrap USB access into plain traits so that device bring-up can be
//! written (and tested) without knowing what actually moves the bytes. The
//! shipped implementation is [`crate::libusb`]; tests substitute mocks.

use crate::error::TransportError;
use crate::interface::AlternateUsbInterface;
use std::fmt::Formatter;

/// The `(vendor, product)` pair identifying a device model on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UsbDeviceId {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl std::fmt::Display for UsbDeviceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor_id, self.product_id)
    }
}

/// An open connection to one physical device.
///
/// Ownership is exclusive: the trait offers no way to clone a transport, so
/// no two components can ever issue transfers against the same handle
/// concurrently. Dropping the transport releases any claimed interface and
/// closes the connection.
pub trait UsbTransport: Send {
    /// The active configuration descriptor tree, verbatim, for the
    /// descriptor walker to consume.
    fn raw_descriptors(&mut self) -> Result<Vec<u8>, TransportError>;

    /// Claims the interface and selects the given alternate setting.
    fn claim_interface(&mut self, setting: &AlternateUsbInterface) -> Result<(), TransportError>;

    /// Vendor control transfer, device to host.
    fn control_read(
        &mut self,
        request: u8,
        value: u16,
        index: u16,
        length: usize,
    ) -> Result<Vec<u8>, TransportError>;

    /// Vendor control transfer, host to device.
    fn control_write(
        &mut self,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
    ) -> Result<(), TransportError>;
}

/// A device seen on the bus, not yet opened.
pub trait UsbDevice: Send {
    fn id(&self) -> UsbDeviceId;

    fn open(&self) -> Result<Box<dyn UsbTransport>, TransportError>;
}

/// Enumerates whatever is currently attached.
pub trait UsbEnumerator {
    fn attached_devices(&self) -> Result<Vec<Box<dyn UsbDevice>>, TransportError>;
}
