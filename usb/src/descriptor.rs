//! Walker over the raw configuration descriptor buffer a device advertises.
//!
//! Descriptors are length-prefixed records (`bLength`, `bDescriptorType`,
//! payload), so the buffer can be walked without understanding every record
//! type. The bytes come straight off physical hardware and are treated as
//! untrusted: a structurally broken record ends the walk instead of crashing
//! the caller.

/// Standard `bDescriptorType` value for an interface descriptor.
pub const DESCRIPTOR_TYPE_INTERFACE: u8 = 0x04;

/// One length-prefixed record out of the descriptor buffer. `payload` holds
/// the `length - 2` bytes following the two-byte header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorRecord<'a> {
    pub length: u8,
    pub descriptor_type: u8,
    pub payload: &'a [u8],
}

/// The two interface descriptor fields the alternate-setting resolver needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceDescriptor {
    pub interface_number: u8,
    pub alternate_setting: u8,
}

impl<'a> DescriptorRecord<'a> {
    /// Projects this record into an [`InterfaceDescriptor`] if it is one.
    /// Records of any other type, or interface records too short to carry
    /// both fields, yield `None`.
    pub fn interface_descriptor(&self) -> Option<InterfaceDescriptor> {
        if self.descriptor_type != DESCRIPTOR_TYPE_INTERFACE || self.payload.len() < 2 {
            return None;
        }
        Some(InterfaceDescriptor {
            interface_number: self.payload[0],
            alternate_setting: self.payload[1],
        })
    }
}

/// Lazily walks `raw` as a sequence of descriptor records. The returned
/// iterator is `Clone`, so the same buffer can be walked any number of times
/// with identical results.
pub fn descriptors(raw: &[u8]) -> Descriptors<'_> {
    Descriptors { raw, offset: 0 }
}

#[derive(Debug, Clone)]
pub struct Descriptors<'a> {
    raw: &'a [u8],
    offset: usize,
}

impl<'a> Iterator for Descriptors<'a> {
    type Item = DescriptorRecord<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset + 2 > self.raw.len() {
            return None;
        }

        let length = self.raw[self.offset];
        let end = self.offset + length as usize;

        // A length that cannot even cover its own header, or one that runs
        // past the buffer, means the remaining bytes are truncated or
        // corrupt. Drop them silently; earlier records stay valid.
        if length < 2 || end > self.raw.len() {
            self.offset = self.raw.len();
            return None;
        }

        let record = DescriptorRecord {
            length,
            descriptor_type: self.raw[self.offset + 1],
            payload: &self.raw[self.offset + 2..end],
        };
        self.offset = end;
        Some(record)
    }
}

impl<'a> std::iter::FusedIterator for Descriptors<'a> {}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    // Device descriptor, configuration descriptor, two interface descriptors
    // for interface 0, an endpoint descriptor, one interface descriptor for
    // interface 1. Captured from a real tuner stick.
    pub(crate) const RAW_DESCRIPTORS: [u8; 61] = [
        18, 1, 0, 2, 0, 0, 0, 64, 0xda, 11, 56, 40, 0, 1, 1, 2, 3, 1, // device
        9, 2, 34, 0, 2, 1, 4, 0x80, 0xfa, // configuration
        9, 4, 0, 0, 1, 0xff, 0xff, 0xff, 5, // interface 0, alt 0
        9, 4, 0, 1, 1, 0xff, 0xff, 0xff, 5, // interface 0, alt 1
        7, 5, 0x81, 2, 0, 2, 0, // endpoint
        9, 4, 1, 0, 0, 0xff, 0xff, 0xff, 5, // interface 1, alt 0
    ];

    #[test]
    fn walks_every_record_by_its_own_length() {
        let types: Vec<u8> = descriptors(&RAW_DESCRIPTORS)
            .map(|r| r.descriptor_type)
            .collect();
        assert_eq!(types, vec![1, 2, 4, 4, 5, 4]);

        let lengths: Vec<u8> = descriptors(&RAW_DESCRIPTORS).map(|r| r.length).collect();
        assert_eq!(lengths, vec![18, 9, 9, 9, 7, 9]);
    }

    #[test]
    fn payload_excludes_the_header() {
        let first = descriptors(&RAW_DESCRIPTORS).next().unwrap();
        assert_eq!(first.length, 18);
        assert_eq!(first.payload.len(), 16);
        assert_eq!(first.payload[0], 0);
    }

    #[test]
    fn projects_only_interface_records() {
        let interfaces: Vec<InterfaceDescriptor> = descriptors(&RAW_DESCRIPTORS)
            .filter_map(|r| r.interface_descriptor())
            .collect();
        assert_eq!(
            interfaces,
            vec![
                InterfaceDescriptor { interface_number: 0, alternate_setting: 0 },
                InterfaceDescriptor { interface_number: 0, alternate_setting: 1 },
                InterfaceDescriptor { interface_number: 1, alternate_setting: 0 },
            ]
        );
    }

    #[test]
    fn truncated_final_record_is_dropped() {
        // Cut into the middle of the last interface descriptor.
        let truncated = &RAW_DESCRIPTORS[..RAW_DESCRIPTORS.len() - 4];
        let records: Vec<_> = descriptors(truncated).collect();
        assert_eq!(records.len(), 5);
        assert_eq!(records.last().unwrap().descriptor_type, 5);
    }

    #[test]
    fn declared_length_past_buffer_end_stops_the_walk() {
        let raw = [9u8, 4, 0, 0, 1]; // claims 9 bytes, buffer has 5
        assert_eq!(descriptors(&raw).count(), 0);
    }

    #[test]
    fn impossible_length_stops_the_walk() {
        let raw = [7u8, 5, 0x81, 2, 0, 2, 0, 1, 0, 9, 4, 0, 0];
        let records: Vec<_> = descriptors(&raw).collect();
        // The endpoint record parses; the `bLength == 1` record and anything
        // after it does not.
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].descriptor_type, 5);
    }

    #[test]
    fn reparsing_yields_identical_records() {
        let first: Vec<_> = descriptors(&RAW_DESCRIPTORS).collect();
        let second: Vec<_> = descriptors(&RAW_DESCRIPTORS).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_buffer_yields_nothing() {
        assert_eq!(descriptors(&[]).count(), 0);
        assert_eq!(descriptors(&[9]).count(), 0);
    }
}
