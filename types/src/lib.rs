use enumset::{EnumSet, EnumSetType};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt::Formatter;
use std::hash::{Hash, Hasher};
use strum::{Display, EnumCount, EnumIter};

/// Broadcast standards a demodulator chip can decode.
#[derive(Debug, Display, EnumIter, EnumCount, EnumSetType)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DeliverySystem {
    DvbT,
    DvbT2,
    DvbC,
}

/// What a frontend can actually tune: the frequency window it accepts,
/// the granularity of its tuner steps and the standards it demodulates.
///
/// Instances are process-wide constants owned by the driver families,
/// shared read-only with anything that wants to tune.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DvbCapabilities {
    frequency_min: u64,
    frequency_max: u64,
    frequency_step_size: u64,
    delivery_systems: EnumSet<DeliverySystem>,
}

impl DvbCapabilities {
    /// Invariants are checked here so the family constants fail the build
    /// rather than misreport their tuning range.
    pub const fn new(
        frequency_min: u64,
        frequency_max: u64,
        frequency_step_size: u64,
        delivery_systems: EnumSet<DeliverySystem>,
    ) -> Self {
        assert!(frequency_min < frequency_max);
        assert!(frequency_step_size > 0);
        Self {
            frequency_min,
            frequency_max,
            frequency_step_size,
            delivery_systems,
        }
    }

    pub const fn frequency_min(&self) -> u64 {
        self.frequency_min
    }

    pub const fn frequency_max(&self) -> u64 {
        self.frequency_max
    }

    pub const fn frequency_step_size(&self) -> u64 {
        self.frequency_step_size
    }

    pub const fn delivery_systems(&self) -> EnumSet<DeliverySystem> {
        self.delivery_systems
    }
}

/// A known USB device signature. Identity is the `(vendor_id, product_id)`
/// pair; the name is human-readable metadata and takes no part in equality.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct DeviceFilter {
    vendor_id: u16,
    product_id: u16,
    name: &'static str,
}

impl DeviceFilter {
    pub const fn new(vendor_id: u16, product_id: u16, name: &'static str) -> Self {
        Self {
            vendor_id,
            product_id,
            name,
        }
    }

    pub const fn vendor_id(&self) -> u16 {
        self.vendor_id
    }

    pub const fn product_id(&self) -> u16 {
        self.product_id
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for DeviceFilter {
    fn eq(&self, other: &Self) -> bool {
        self.vendor_id == other.vendor_id && self.product_id == other.product_id
    }
}

impl Eq for DeviceFilter {}

impl Hash for DeviceFilter {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.vendor_id.hash(state);
        self.product_id.hash(state);
    }
}

impl std::fmt::Display for DeviceFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enumset::enum_set;

    #[test]
    fn capabilities_accessors() {
        let caps = DvbCapabilities::new(
            174_000_000,
            862_000_000,
            166_667,
            enum_set!(DeliverySystem::DvbT | DeliverySystem::DvbT2),
        );
        assert_eq!(caps.frequency_min(), 174_000_000);
        assert_eq!(caps.frequency_max(), 862_000_000);
        assert_eq!(caps.frequency_step_size(), 166_667);
        assert!(caps.delivery_systems().contains(DeliverySystem::DvbT2));
        assert!(!caps.delivery_systems().contains(DeliverySystem::DvbC));
    }

    #[test]
    #[should_panic]
    fn capabilities_reject_inverted_frequency_range() {
        DvbCapabilities::new(862_000_000, 174_000_000, 166_667, enum_set!(DeliverySystem::DvbT));
    }

    #[test]
    #[should_panic]
    fn capabilities_reject_zero_step() {
        DvbCapabilities::new(174_000_000, 862_000_000, 0, enum_set!(DeliverySystem::DvbT));
    }

    #[test]
    fn filter_identity_ignores_name() {
        let a = DeviceFilter::new(0x2040, 0x826d, "Hauppauge WinTV-dualHD");
        let b = DeviceFilter::new(0x2040, 0x826d, "some other label");
        let c = DeviceFilter::new(0x2040, 0x826e, "Hauppauge WinTV-dualHD");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.to_string(), "Hauppauge WinTV-dualHD");
    }
}
