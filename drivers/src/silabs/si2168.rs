//! Command protocol for the Si2168 demodulator behind its USB bridge.

use super::si2168_data::Si2168Chip;
use crate::error::DvbError;
use crate::firmware::{FirmwareId, FirmwareProvider};
use byteorder::{BigEndian, ByteOrder};
use log::{debug, info};
use opendvb_usb::transport::UsbTransport;

// Vendor requests the bridge translates into demodulator register traffic.
const REQ_DEMOD_WRITE: u8 = 0x08;
const REQ_DEMOD_READ: u8 = 0x09;

/// Bus address of the demodulator behind the bridge.
const DEMOD_ADDRESS: u16 = 0x64;

// Status bits in the first byte of every command response.
const STATUS_COMPLETE: u8 = 0x80;
const STATUS_ERROR: u8 = 0x40;

const CMD_INITIALIZE: [u8; 13] = [
    0xc0, 0x12, 0x00, 0x0c, 0x00, 0x0d, 0x16, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];
const CMD_POWER_UP: [u8; 8] = [0xc0, 0x06, 0x01, 0x0f, 0x00, 0x20, 0x20, 0x01];

const CMD_CHIP_REVISION: u8 = 0x02;
const CHIP_REVISION_RESPONSE_LEN: usize = 13;

const CMD_FIRMWARE_ACTIVATE: [u8; 2] = [0x01, 0x01];
const CMD_FIRMWARE_VERSION: u8 = 0x11;
const FIRMWARE_VERSION_RESPONSE_LEN: usize = 10;

// Firmware images come in two container layouts: 17-byte records carrying a
// length byte plus up to 16 command bytes, or bare 8-byte commands.
const FIRMWARE_RECORD_LEN: usize = 17;
const FIRMWARE_PLAIN_CHUNK_LEN: usize = 8;
const FIRMWARE_MAX_COMMAND_LEN: usize = 16;

pub(crate) struct Si2168<'a> {
    transport: &'a mut dyn UsbTransport,
}

impl<'a> Si2168<'a> {
    pub(crate) fn new(transport: &'a mut dyn UsbTransport) -> Self {
        Self { transport }
    }

    /// Sends one command and, if a response is expected, reads it back and
    /// checks the status bits.
    fn command(&mut self, args: &[u8], response_len: usize) -> Result<Vec<u8>, DvbError> {
        self.transport
            .control_write(REQ_DEMOD_WRITE, DEMOD_ADDRESS, 0, args)?;
        if response_len == 0 {
            return Ok(Vec::new());
        }

        let response = self
            .transport
            .control_read(REQ_DEMOD_READ, DEMOD_ADDRESS, 0, response_len)?;
        let status = *response
            .first()
            .ok_or(DvbError::Hardware("an empty command response"))?;
        if status & STATUS_ERROR != 0 {
            return Err(DvbError::Hardware("a command error"));
        }
        if status & STATUS_COMPLETE == 0 {
            return Err(DvbError::Hardware("a command that never completed"));
        }
        Ok(response)
    }

    /// Powers the chip up and resolves its identity word against the known
    /// revision table.
    pub(crate) fn identify(&mut self) -> Result<Si2168Chip, DvbError> {
        self.command(&CMD_INITIALIZE, 0)?;
        self.command(&CMD_POWER_UP, 1)?;

        let response = self.command(&[CMD_CHIP_REVISION], CHIP_REVISION_RESPONSE_LEN)?;
        if response.len() < 5 {
            return Err(DvbError::Hardware("a short chip revision response"));
        }
        let code = BigEndian::read_u32(&response[1..5]);
        let chip =
            Si2168Chip::from_id(code).ok_or(DvbError::UnsupportedChipRevision { code })?;
        debug!("Found chip {}", chip);
        Ok(chip)
    }

    /// Fetches, uploads and activates the firmware image for `chip`. Any
    /// failure in here is a provisioning failure; transfer retries have
    /// already been spent at the transport layer.
    pub(crate) fn provision(
        &mut self,
        chip: Si2168Chip,
        provider: &dyn FirmwareProvider,
    ) -> Result<(), DvbError> {
        let firmware = chip.firmware();
        let image = provider
            .fetch(firmware)
            .map_err(|fetch_error| provisioning(firmware, format!("{:#}", fetch_error)))?;

        info!("Uploading firmware {} to {}", firmware, chip);
        self.upload(firmware, &image)?;

        self.command(&CMD_FIRMWARE_ACTIVATE, 1)
            .map_err(|cmd_error| provisioning(firmware, format!("activation failed: {cmd_error}")))?;

        let version = self
            .command(&[CMD_FIRMWARE_VERSION], FIRMWARE_VERSION_RESPONSE_LEN)
            .map_err(|cmd_error| provisioning(firmware, format!("version query failed: {cmd_error}")))?;
        if version.len() == FIRMWARE_VERSION_RESPONSE_LEN {
            info!(
                "Firmware version {}{}.{}.{}",
                char::from(version[9].wrapping_add(b'@')),
                version[6].wrapping_sub(b'0'),
                version[7].wrapping_sub(b'0'),
                version[8]
            );
        }
        Ok(())
    }

    fn upload(&mut self, firmware: FirmwareId, image: &[u8]) -> Result<(), DvbError> {
        if image.len() % FIRMWARE_RECORD_LEN == 0 && image.first().copied().unwrap_or(0) > 5 {
            debug!("Firmware image is in the records layout");
            for record in image.chunks_exact(FIRMWARE_RECORD_LEN) {
                let len = record[0] as usize;
                if len > FIRMWARE_MAX_COMMAND_LEN {
                    return Err(provisioning(firmware, "record overruns its container".into()));
                }
                self.command(&record[1..1 + len], 1)
                    .map_err(|cmd_error| provisioning(firmware, format!("upload rejected: {cmd_error}")))?;
            }
            Ok(())
        } else if !image.is_empty() && image.len() % FIRMWARE_PLAIN_CHUNK_LEN == 0 {
            debug!("Firmware image is in the plain layout");
            for chunk in image.chunks_exact(FIRMWARE_PLAIN_CHUNK_LEN) {
                self.command(chunk, 1)
                    .map_err(|cmd_error| provisioning(firmware, format!("upload rejected: {cmd_error}")))?;
            }
            Ok(())
        } else {
            Err(provisioning(firmware, "image has an unrecognized layout".into()))
        }
    }
}

fn provisioning(firmware: FirmwareId, reason: String) -> DvbError {
    DvbError::FirmwareProvisioning { firmware, reason }
}
