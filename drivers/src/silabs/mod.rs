//! Driver family for devices built around the Silicon Labs Si2168
//! demodulator.

mod si2168;
mod si2168_data;

pub use si2168_data::{Si2168Chip, CAPABILITIES};

use crate::device::{ChipInfo, DvbDevice};
use crate::error::DvbError;
use crate::firmware::FirmwareProvider;
use crate::ids;
use crate::registry::DvbUsbDriver;
use opendvb_types::DeviceFilter;
use opendvb_usb::interface::AlternateUsbInterface;
use opendvb_usb::transport::UsbTransport;
use si2168::Si2168;

/// USB products known to carry an Si2168.
pub static SUPPORTED_DEVICES: [DeviceFilter; 4] = [
    DeviceFilter::new(ids::USB_VID_CONEXANT, ids::USB_PID_MYGICA_T230, "MyGica T230 DVB-T/T2/C"),
    DeviceFilter::new(ids::USB_VID_CONEXANT, ids::USB_PID_MYGICA_T230C, "MyGica T230C DVB-T/T2/C"),
    DeviceFilter::new(ids::USB_VID_HAUPPAUGE, ids::USB_PID_HAUPPAUGE_DUALHD, "Hauppauge WinTV-dualHD"),
    DeviceFilter::new(ids::USB_VID_PCTV, ids::USB_PID_PCTV_292E, "PCTV triplestick (292e)"),
];

// The bridge exposes its control and streaming endpoints on interface 0,
// and the device's declared default alternate setting is the one to claim.
const CONTROL_INTERFACE: u8 = 0;
const DEFAULT_ALTERNATE_INDEX: usize = 0;

pub struct SilabsDvbDriver;

impl DvbUsbDriver for SilabsDvbDriver {
    fn name(&self) -> &'static str {
        "Silicon Labs Si2168"
    }

    fn supported_devices(&self) -> &'static [DeviceFilter] {
        &SUPPORTED_DEVICES
    }

    fn create(
        &self,
        mut transport: Box<dyn UsbTransport>,
        filter: DeviceFilter,
        firmware: &dyn FirmwareProvider,
    ) -> Result<DvbDevice, DvbError> {
        // Transport configuration: resolve the advertised settings for the
        // control interface and claim the default one.
        let raw_descriptors = transport.raw_descriptors()?;
        let settings = AlternateUsbInterface::for_interface(CONTROL_INTERFACE, &raw_descriptors);
        let setting = settings
            .get(DEFAULT_ALTERNATE_INDEX)
            .copied()
            .ok_or(DvbError::MissingAlternateSetting {
                interface: CONTROL_INTERFACE,
                alternate_setting: DEFAULT_ALTERNATE_INDEX as u8,
            })?;
        transport
            .claim_interface(&setting)
            .map_err(|claim_error| DvbError::InterfaceClaim {
                interface: CONTROL_INTERFACE,
                source: claim_error,
            })?;

        // Identify the silicon, then provision it.
        let mut demod = Si2168::new(transport.as_mut());
        let chip = demod.identify()?;
        demod.provision(chip, firmware)?;

        Ok(DvbDevice::new(
            transport,
            filter,
            ChipInfo {
                name: chip.name(),
                firmware: chip.firmware(),
            },
            &CAPABILITIES,
        ))
    }
}
