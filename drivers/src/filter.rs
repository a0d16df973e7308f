//! Matching attached devices against the known signature tables.

use opendvb_types::DeviceFilter;
use std::collections::HashMap;

#[derive(thiserror::Error, Debug)]
#[error("duplicate device filter for {vendor_id:04x}:{product_id:04x}")]
pub struct DuplicateDeviceFilter {
    pub vendor_id: u16,
    pub product_id: u16,
}

/// Immutable exact-match lookup over a set of device signatures.
///
/// There are no wildcards: an entry whose fields happen to be `0xFFFF`
/// matches only a device reporting exactly those values. Once built the
/// matcher is read-only and safe to share across threads.
pub struct DeviceFilterMatcher {
    filter_map: HashMap<u32, DeviceFilter>,
}

impl DeviceFilterMatcher {
    /// Builds the table, rejecting duplicate `(vendor, product)` pairs up
    /// front so one signature can never silently shadow another.
    pub fn new(
        filters: impl IntoIterator<Item = DeviceFilter>,
    ) -> Result<Self, DuplicateDeviceFilter> {
        let mut filter_map = HashMap::new();
        for filter in filters {
            let previous = filter_map.insert(hash(filter.vendor_id(), filter.product_id()), filter);
            if previous.is_some() {
                return Err(DuplicateDeviceFilter {
                    vendor_id: filter.vendor_id(),
                    product_id: filter.product_id(),
                });
            }
        }
        Ok(Self { filter_map })
    }

    /// `None` means "not one of ours" - the caller decides whether that
    /// matters.
    pub fn get_filter(&self, vendor_id: u16, product_id: u16) -> Option<&DeviceFilter> {
        self.filter_map.get(&hash(vendor_id, product_id))
    }
}

fn hash(vendor_id: u16, product_id: u16) -> u32 {
    (vendor_id as u32) << 16 | product_id as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::*;

    fn test_matcher() -> DeviceFilterMatcher {
        DeviceFilterMatcher::new([
            DeviceFilter::new(USB_VID_HAUPPAUGE, USB_PID_HAUPPAUGE_MYTV_T, "HAUPPAUGE"),
            DeviceFilter::new(USB_VID_REALTEK, USB_PID_REALTEK_RTL2831U, "RTL2831U"),
            DeviceFilter::new(0xFFFF, 0xFFFF, "Edge case"),
        ])
        .unwrap()
    }

    #[test]
    fn when_matches() {
        let matcher = test_matcher();
        assert_eq!(
            matcher
                .get_filter(USB_VID_HAUPPAUGE, USB_PID_HAUPPAUGE_MYTV_T)
                .unwrap()
                .name(),
            "HAUPPAUGE"
        );
        assert_eq!(
            matcher
                .get_filter(USB_VID_REALTEK, USB_PID_REALTEK_RTL2831U)
                .unwrap()
                .name(),
            "RTL2831U"
        );
        assert_eq!(matcher.get_filter(0xFFFF, 0xFFFF).unwrap().name(), "Edge case");
    }

    #[test]
    fn when_doesnt_match() {
        let matcher = test_matcher();
        assert!(matcher.get_filter(USB_VID_AVERMEDIA, USB_PID_AVERMEDIA_A835).is_none());
        assert!(matcher.get_filter(USB_VID_REALTEK, USB_PID_REALTEK_RTL2832U).is_none());
        // The 0xFFFF entry is a literal signature, not a catch-all.
        assert!(matcher.get_filter(0xFFFF, USB_PID_HAUPPAUGE_MYTV_T).is_none());
        assert!(matcher.get_filter(USB_VID_HAUPPAUGE, 0xFFFF).is_none());
    }

    #[test]
    fn duplicate_signatures_are_rejected_at_build_time() {
        let result = DeviceFilterMatcher::new([
            DeviceFilter::new(USB_VID_HAUPPAUGE, USB_PID_HAUPPAUGE_MYTV_T, "first"),
            DeviceFilter::new(USB_VID_HAUPPAUGE, USB_PID_HAUPPAUGE_MYTV_T, "second"),
        ]);
        let error = result.err().unwrap();
        assert_eq!(error.vendor_id, USB_VID_HAUPPAUGE);
        assert_eq!(error.product_id, USB_PID_HAUPPAUGE_MYTV_T);
    }

    #[test]
    fn lookups_are_idempotent() {
        let matcher = test_matcher();
        let first = matcher.get_filter(USB_VID_HAUPPAUGE, USB_PID_HAUPPAUGE_MYTV_T).copied();
        let second = matcher.get_filter(USB_VID_HAUPPAUGE, USB_PID_HAUPPAUGE_MYTV_T).copied();
        assert_eq!(first, second);
    }
}
