//! Identity table and capability record for the Si2168 family.

use crate::firmware::FirmwareId;
use enumset::enum_set;
use opendvb_types::{DeliverySystem, DvbCapabilities};
use std::fmt::Formatter;

// Part-number byte the chip reports in its identity word (decimal 68, as
// in Si21-68).
const PART_SI2168: u32 = 68;

const fn chip_id(revision: u8, major: u8, minor: u8) -> u32 {
    (revision as u32) << 24 | PART_SI2168 << 16 | (major as u32) << 8 | minor as u32
}

/// The known silicon revisions. Several of these ship behind the same USB
/// product id, so which one is actually soldered in only becomes known
/// after the chip-revision query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Si2168Chip {
    A20,
    A30,
    B40,
    D60,
}

impl Si2168Chip {
    pub const ALL: [Si2168Chip; 4] = [
        Si2168Chip::A20,
        Si2168Chip::A30,
        Si2168Chip::B40,
        Si2168Chip::D60,
    ];

    /// The packed identity word this revision reports.
    pub const fn id(self) -> u32 {
        match self {
            Si2168Chip::A20 => chip_id(b'A', b'2', b'0'),
            Si2168Chip::A30 => chip_id(b'A', b'3', b'0'),
            Si2168Chip::B40 => chip_id(b'B', b'4', b'0'),
            Si2168Chip::D60 => chip_id(b'D', b'6', b'0'),
        }
    }

    /// `None` for any code outside the closed revision table; the caller
    /// reports that as an unsupported revision, not an unsupported device.
    pub fn from_id(id: u32) -> Option<Si2168Chip> {
        Self::ALL.into_iter().find(|chip| chip.id() == id)
    }

    pub const fn firmware(self) -> FirmwareId {
        match self {
            Si2168Chip::A20 => FirmwareId("dvb-demod-si2168-a20-01.fw"),
            Si2168Chip::A30 => FirmwareId("dvb-demod-si2168-a30-01.fw"),
            Si2168Chip::B40 => FirmwareId("dvb-demod-si2168-b40-01.fw"),
            Si2168Chip::D60 => FirmwareId("dvb-demod-si2168-d60-01.fw"),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Si2168Chip::A20 => "Si2168-A20",
            Si2168Chip::A30 => "Si2168-A30",
            Si2168Chip::B40 => "Si2168-B40",
            Si2168Chip::D60 => "Si2168-D60",
        }
    }
}

impl std::fmt::Display for Si2168Chip {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Every revision in the family shares one tuning envelope.
pub static CAPABILITIES: DvbCapabilities = DvbCapabilities::new(
    42_000_000,
    870_000_000,
    166_667,
    enum_set!(DeliverySystem::DvbT | DeliverySystem::DvbT2 | DeliverySystem::DvbC),
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn b40_identity_word_resolves() {
        let code = (b'B' as u32) << 24 | 68 << 16 | (b'4' as u32) << 8 | b'0' as u32;
        assert_eq!(Si2168Chip::from_id(code), Some(Si2168Chip::B40));
    }

    #[test]
    fn every_revision_round_trips() {
        for chip in Si2168Chip::ALL {
            assert_eq!(Si2168Chip::from_id(chip.id()), Some(chip));
        }
    }

    #[test]
    fn unknown_codes_resolve_to_none() {
        assert_eq!(Si2168Chip::from_id(0), None);
        assert_eq!(Si2168Chip::from_id(0xFFFF_FFFF), None);
        // Plausible but unknown revision: C10.
        let code = (b'C' as u32) << 24 | 68 << 16 | (b'1' as u32) << 8 | b'0' as u32;
        assert_eq!(Si2168Chip::from_id(code), None);
    }

    #[test]
    fn each_revision_has_its_own_firmware() {
        let mut ids: Vec<&str> = Si2168Chip::ALL.iter().map(|chip| chip.firmware().0).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), Si2168Chip::ALL.len());
    }

    #[test]
    fn family_capabilities_are_wellformed() {
        assert_eq!(CAPABILITIES.frequency_min(), 42_000_000);
        assert_eq!(CAPABILITIES.frequency_max(), 870_000_000);
        assert_eq!(CAPABILITIES.frequency_step_size(), 166_667);
        assert!(!CAPABILITIES.delivery_systems().is_empty());
        assert!(CAPABILITIES.delivery_systems().contains(DeliverySystem::DvbT));
        assert!(CAPABILITIES.delivery_systems().contains(DeliverySystem::DvbT2));
        assert!(CAPABILITIES.delivery_systems().contains(DeliverySystem::DvbC));
    }
}
