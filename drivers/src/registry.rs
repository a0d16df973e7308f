//! The driver registry and the scan entry points.

use crate::device::DvbDevice;
use crate::error::DvbError;
use crate::filter::DeviceFilterMatcher;
use crate::firmware::FirmwareProvider;
use crate::silabs::SilabsDvbDriver;
use log::{error, info, warn};
use opendvb_types::DeviceFilter;
use opendvb_usb::transport::{UsbDevice, UsbEnumerator, UsbTransport};
use std::sync::Arc;

/// One driver family: the signatures it handles and the bring-up sequence
/// that turns an opened transport into an initialized device.
pub trait DvbUsbDriver: Send + Sync {
    fn name(&self) -> &'static str;

    fn supported_devices(&self) -> &'static [DeviceFilter];

    /// Runs the family's bring-up state machine. Taking the transport by
    /// value means every failure path drops it, so a claimed interface can
    /// never outlive a failed probe.
    fn create(
        &self,
        transport: Box<dyn UsbTransport>,
        filter: DeviceFilter,
        firmware: &dyn FirmwareProvider,
    ) -> Result<DvbDevice, DvbError>;
}

/// The closed set of driver families in this build.
pub fn available_drivers() -> Vec<Box<dyn DvbUsbDriver>> {
    vec![Box::new(SilabsDvbDriver)]
}

/// Probes one attached device with whichever driver family claims its
/// signature. Unmatched devices report [`DvbError::UnsupportedDevice`].
pub fn probe_device(
    device: &dyn UsbDevice,
    firmware: &dyn FirmwareProvider,
) -> Result<DvbDevice, DvbError> {
    let id = device.id();
    for driver in available_drivers() {
        let matcher = match DeviceFilterMatcher::new(driver.supported_devices().iter().copied()) {
            Ok(matcher) => matcher,
            Err(table_error) => {
                // A family shipping a duplicate signature is a defect in
                // that driver; don't let it take the whole scan down.
                error!("Driver {} has an invalid device table: {}", driver.name(), table_error);
                continue;
            }
        };

        if let Some(filter) = matcher.get_filter(id.vendor_id, id.product_id) {
            info!("Device {} matched {} ({})", id, filter, driver.name());
            let transport = device.open()?;
            return driver.create(transport, *filter, firmware);
        }
    }
    Err(DvbError::UnsupportedDevice {
        vendor_id: id.vendor_id,
        product_id: id.product_id,
    })
}

/// Brings up everything recognizable on the bus, one device at a time.
///
/// Devices nobody claims are skipped silently. A failed bring-up is logged
/// and does not stop the remaining devices from initializing; only if
/// nothing initialized and something failed is the last failure returned.
pub fn scan(
    enumerator: &dyn UsbEnumerator,
    firmware: &dyn FirmwareProvider,
) -> Result<Vec<DvbDevice>, DvbError> {
    let mut initialized = Vec::new();
    let mut last_error = None;

    for device in enumerator.attached_devices()? {
        match probe_device(device.as_ref(), firmware) {
            Ok(dvb_device) => initialized.push(dvb_device),
            Err(DvbError::UnsupportedDevice { .. }) => {}
            Err(dvb_error) => {
                warn!("Failed to bring up {}: {}", device.id(), dvb_error);
                last_error = Some(dvb_error);
            }
        }
    }

    if initialized.is_empty() {
        if let Some(dvb_error) = last_error {
            return Err(dvb_error);
        }
    }
    Ok(initialized)
}

/// Like [`scan`], but each matched device's bring-up runs on its own
/// blocking task, so several sticks come up in parallel. The tasks share
/// nothing mutable - each builds its own driver list, and the firmware
/// provider is read-only behind the `Arc`.
pub async fn scan_concurrent(
    enumerator: &dyn UsbEnumerator,
    firmware: Arc<dyn FirmwareProvider>,
) -> Result<Vec<DvbDevice>, DvbError> {
    let mut probes = Vec::new();
    for device in enumerator.attached_devices()? {
        let id = device.id();
        let firmware = Arc::clone(&firmware);
        let handle =
            tokio::task::spawn_blocking(move || probe_device(device.as_ref(), firmware.as_ref()));
        probes.push((id, handle));
    }

    let mut initialized = Vec::new();
    let mut last_error = None;
    for (id, handle) in probes {
        match handle.await {
            Ok(Ok(dvb_device)) => initialized.push(dvb_device),
            Ok(Err(DvbError::UnsupportedDevice { .. })) => {}
            Ok(Err(dvb_error)) => {
                warn!("Failed to bring up {}: {}", id, dvb_error);
                last_error = Some(dvb_error);
            }
            Err(join_error) => {
                error!("Bring-up task for {} did not finish: {}", id, join_error);
            }
        }
    }

    if initialized.is_empty() {
        if let Some(dvb_error) = last_error {
            return Err(dvb_error);
        }
    }
    Ok(initialized)
}
