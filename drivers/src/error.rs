use crate::firmware::FirmwareId;
use opendvb_usb::error::TransportError;

/// What went wrong while bringing a device up. Each variant names the
/// bring-up step that failed so scans can log precisely and move on; none
/// of these should ever take the host process down.
#[derive(thiserror::Error, Debug)]
pub enum DvbError {
    #[error("device {vendor_id:04x}:{product_id:04x} is not supported by any driver")]
    UnsupportedDevice { vendor_id: u16, product_id: u16 },

    #[error("interface {interface} does not advertise alternate setting {alternate_setting}")]
    MissingAlternateSetting { interface: u8, alternate_setting: u8 },

    #[error("failed to claim interface {interface}: {source}")]
    InterfaceClaim {
        interface: u8,
        source: TransportError,
    },

    #[error("unsupported chip revision {code:#010x}")]
    UnsupportedChipRevision { code: u32 },

    #[error("firmware provisioning failed for {firmware}: {reason}")]
    FirmwareProvisioning { firmware: FirmwareId, reason: String },

    #[error("chip reported {0}")]
    Hardware(&'static str),

    #[error("USB transport error: {0}")]
    Transport(#[from] TransportError),
}
