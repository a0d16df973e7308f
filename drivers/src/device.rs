use crate::firmware::FirmwareId;
use log::info;
use opendvb_types::{DeviceFilter, DvbCapabilities};
use opendvb_usb::transport::UsbTransport;
use std::fmt::Formatter;

/// The silicon a driver resolved behind a matched USB product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipInfo {
    pub name: &'static str,
    pub firmware: FirmwareId,
}

/// An initialized frontend: identified, provisioned and ready for a tuning
/// layer to take over.
///
/// The transport is owned exclusively - there is no way to clone it out, so
/// nothing else can talk to the hardware while this handle lives. Dropping
/// the device releases the claimed interface and closes the connection.
pub struct DvbDevice {
    transport: Box<dyn UsbTransport>,
    filter: DeviceFilter,
    chip: ChipInfo,
    capabilities: &'static DvbCapabilities,
}

impl DvbDevice {
    pub(crate) fn new(
        transport: Box<dyn UsbTransport>,
        filter: DeviceFilter,
        chip: ChipInfo,
        capabilities: &'static DvbCapabilities,
    ) -> Self {
        info!("Initialized {} with chip {}", filter, chip.name);
        Self {
            transport,
            filter,
            chip,
            capabilities,
        }
    }

    pub fn device_filter(&self) -> &DeviceFilter {
        &self.filter
    }

    pub fn chip(&self) -> ChipInfo {
        self.chip
    }

    pub fn capabilities(&self) -> &'static DvbCapabilities {
        self.capabilities
    }

    /// Access for the tuning layer above this crate.
    pub fn transport_mut(&mut self) -> &mut dyn UsbTransport {
        self.transport.as_mut()
    }

    /// Releases the underlying USB connection. Equivalent to dropping the
    /// device; spelled out for call sites where that would look accidental.
    pub fn release(self) {}
}

impl std::fmt::Display for DvbDevice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.filter.name())
    }
}
