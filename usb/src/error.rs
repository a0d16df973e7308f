#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("USB error: {0}")]
    Usb(#[from] rusb::Error),

    #[error("control transfer moved {actual} of {expected} bytes")]
    ShortTransfer { expected: usize, actual: usize },

    #[error("device is no longer attached")]
    Disconnected,
}
