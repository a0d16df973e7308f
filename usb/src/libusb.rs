//! libusb-backed implementation of the transport capabilities.

use crate::error::TransportError;
use crate::interface::AlternateUsbInterface;
use crate::transport::{UsbDevice, UsbDeviceId, UsbEnumerator, UsbTransport};
use log::{debug, info, warn};
use rusb::{request_type, Device, DeviceHandle, Direction, GlobalContext, Recipient, RequestType};
use std::time::Duration;

const CONTROL_TIMEOUT: Duration = Duration::from_secs(1);

// Tuner bridges routinely stall the control pipe while a command is still
// executing, so vendor transfers get a small bounded number of attempts
// before the stall is surfaced to the caller.
const CONTROL_ATTEMPTS: u32 = 3;

const REQUEST_GET_DESCRIPTOR: u8 = 0x06;
const DESCRIPTOR_TYPE_CONFIGURATION: u16 = 0x02;

// Largest configuration descriptor tree we are prepared to read back.
const MAX_CONFIG_DESCRIPTOR_LEN: usize = 4096;

pub struct LibUsbEnumerator;

impl LibUsbEnumerator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LibUsbEnumerator {
    fn default() -> Self {
        Self::new()
    }
}

impl UsbEnumerator for LibUsbEnumerator {
    fn attached_devices(&self) -> Result<Vec<Box<dyn UsbDevice>>, TransportError> {
        let mut attached: Vec<Box<dyn UsbDevice>> = Vec::new();
        for device in rusb::devices()?.iter() {
            let descriptor = match device.device_descriptor() {
                Ok(descriptor) => descriptor,
                Err(error) => {
                    debug!(
                        "Skipping device on bus {} address {}: {}",
                        device.bus_number(),
                        device.address(),
                        error
                    );
                    continue;
                }
            };
            attached.push(Box::new(LibUsbDevice {
                id: UsbDeviceId {
                    vendor_id: descriptor.vendor_id(),
                    product_id: descriptor.product_id(),
                },
                device,
            }));
        }
        Ok(attached)
    }
}

pub struct LibUsbDevice {
    id: UsbDeviceId,
    device: Device<GlobalContext>,
}

impl UsbDevice for LibUsbDevice {
    fn id(&self) -> UsbDeviceId {
        self.id
    }

    fn open(&self) -> Result<Box<dyn UsbTransport>, TransportError> {
        let mut handle = self.device.open()?;
        if let Err(error) = handle.set_auto_detach_kernel_driver(true) {
            // Not supported on every platform; claiming may still succeed.
            debug!("Kernel driver auto-detach unavailable for {}: {}", self.id, error);
        }
        info!("Opened USB device {} at {:?}", self.id, self.device);
        Ok(Box::new(LibUsbTransport {
            id: self.id,
            handle,
            claimed: None,
        }))
    }
}

pub struct LibUsbTransport {
    id: UsbDeviceId,
    handle: DeviceHandle<GlobalContext>,
    claimed: Option<u8>,
}

impl UsbTransport for LibUsbTransport {
    fn raw_descriptors(&mut self) -> Result<Vec<u8>, TransportError> {
        let mut buf = vec![0u8; MAX_CONFIG_DESCRIPTOR_LEN];
        let read = self.handle.read_control(
            request_type(Direction::In, RequestType::Standard, Recipient::Device),
            REQUEST_GET_DESCRIPTOR,
            DESCRIPTOR_TYPE_CONFIGURATION << 8,
            0,
            &mut buf,
            CONTROL_TIMEOUT,
        )?;
        buf.truncate(read);
        Ok(buf)
    }

    fn claim_interface(&mut self, setting: &AlternateUsbInterface) -> Result<(), TransportError> {
        self.handle.claim_interface(setting.interface())?;
        self.claimed = Some(setting.interface());
        self.handle
            .set_alternate_setting(setting.interface(), setting.alternate_setting())?;
        debug!(
            "Claimed interface {} alternate setting {} on {}",
            setting.interface(),
            setting.alternate_setting(),
            self.id
        );
        Ok(())
    }

    fn control_read(
        &mut self,
        request: u8,
        value: u16,
        index: u16,
        length: usize,
    ) -> Result<Vec<u8>, TransportError> {
        let ty = request_type(Direction::In, RequestType::Vendor, Recipient::Interface);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut buf = vec![0u8; length];
            match self
                .handle
                .read_control(ty, request, value, index, &mut buf, CONTROL_TIMEOUT)
            {
                Ok(read) => {
                    buf.truncate(read);
                    return Ok(buf);
                }
                Err(rusb::Error::Pipe) if attempt < CONTROL_ATTEMPTS => {
                    debug!(
                        "Control read {:#04x} on {} stalled, retrying (attempt {} of {})",
                        request, self.id, attempt, CONTROL_ATTEMPTS
                    );
                }
                Err(rusb::Error::NoDevice) => return Err(TransportError::Disconnected),
                Err(error) => return Err(error.into()),
            }
        }
    }

    fn control_write(
        &mut self,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
    ) -> Result<(), TransportError> {
        let ty = request_type(Direction::Out, RequestType::Vendor, Recipient::Interface);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self
                .handle
                .write_control(ty, request, value, index, data, CONTROL_TIMEOUT)
            {
                Ok(written) if written == data.len() => return Ok(()),
                Ok(written) => {
                    return Err(TransportError::ShortTransfer {
                        expected: data.len(),
                        actual: written,
                    })
                }
                Err(rusb::Error::Pipe) if attempt < CONTROL_ATTEMPTS => {
                    debug!(
                        "Control write {:#04x} on {} stalled, retrying (attempt {} of {})",
                        request, self.id, attempt, CONTROL_ATTEMPTS
                    );
                }
                Err(rusb::Error::NoDevice) => return Err(TransportError::Disconnected),
                Err(error) => return Err(error.into()),
            }
        }
    }
}

impl Drop for LibUsbTransport {
    fn drop(&mut self) {
        if let Some(interface) = self.claimed.take() {
            if let Err(error) = self.handle.release_interface(interface) {
                warn!("Failed to release interface {} on {}: {}", interface, self.id, error);
            }
        }
        debug!("Closed USB device {}", self.id);
    }
}
