//! Byte-range placeholder protocol for standalone MAC containers.
//!
//! `reserve` writes the `/AuthCode` dictionary with a zero-filled hex `/MAC`
//! string sized from a container estimate and a fixed-width `/ByteRange`.
//! `finalize` runs once the whole document is serialized: it patches the
//! byte range, digests everything outside the `/MAC` string and hex-patches
//! the real container into the reserved space.

use crate::{
    domain::{
        byte_range::ByteRange,
        constants,
        document::MacLocation,
        properties::MacProperties,
    },
    services::{container_builder::MacContainerBuilder, key_wrap},
    MacError, MacResult,
};

/// Offsets of both placeholders inside the output buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    /// Offset of the `<` opening the hex container string.
    pub mac_offset: usize,
    /// Width of the hex string including both delimiters.
    pub mac_width: usize,
    /// Offset of the byte-range array text.
    pub byte_range_offset: usize,
    pub byte_range_width: usize,
}

impl Reservation {
    /// Container bytes that fit in the hex string.
    #[must_use]
    pub fn container_capacity(&self) -> usize {
        (self.mac_width - constants::HEX_DELIMITER_BYTES) / 2
    }

    #[must_use]
    pub fn mac_end(&self) -> usize {
        self.mac_offset + self.mac_width
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderState {
    Idle,
    Reserved(Reservation),
    Finalized(ByteRange),
}

/// One placeholder session per document.
#[derive(Debug)]
pub struct MacPlaceholder {
    builder: MacContainerBuilder,
    byte_range_width: usize,
    state: PlaceholderState,
}

impl MacPlaceholder {
    #[must_use]
    pub fn new(properties: MacProperties) -> Self {
        Self::with_byte_range_width(properties, constants::BYTE_RANGE_PLACEHOLDER_WIDTH)
    }

    #[must_use]
    pub fn with_byte_range_width(properties: MacProperties, byte_range_width: usize) -> Self {
        Self {
            builder: MacContainerBuilder::new(properties),
            byte_range_width,
            state: PlaceholderState::Idle,
        }
    }

    #[must_use]
    pub fn state(&self) -> PlaceholderState {
        self.state
    }

    /// Append the `/AuthCode` dictionary with both placeholders to `out`.
    pub fn reserve(&mut self, out: &mut Vec<u8>) -> MacResult<Reservation> {
        if self.state != PlaceholderState::Idle {
            return Err(MacError::PlaceholderState(format!(
                "reserve called in state {:?}",
                self.state
            )));
        }
        let estimate = self.builder.estimate_size(false)?;
        let mac_width = 2 * estimate + constants::HEX_DELIMITER_BYTES;

        out.extend_from_slice(
            format!(
                "{} <<{} {} {} ",
                constants::AUTH_CODE_KEY,
                constants::MAC_LOCATION_KEY,
                MacLocation::Standalone.as_pdf_name(),
                constants::MAC_KEY
            )
            .as_bytes(),
        );
        let mac_offset = out.len();
        out.push(b'<');
        out.resize(mac_offset + mac_width - 1, b'0');
        out.push(b'>');

        out.extend_from_slice(format!(" {} ", constants::BYTE_RANGE_KEY).as_bytes());
        let byte_range_offset = out.len();
        let initial = ByteRange::around_placeholder(0, 0, 0)?
            .to_padded_pdf_array(self.byte_range_width)?;
        out.extend_from_slice(&initial);
        out.extend_from_slice(b">>");

        let reservation = Reservation {
            mac_offset,
            mac_width,
            byte_range_offset,
            byte_range_width: self.byte_range_width,
        };
        log::debug!(
            "Reserved MAC placeholder: container estimate {estimate} bytes, /MAC at {mac_offset} ({mac_width} bytes), /ByteRange at {byte_range_offset} ({} bytes)",
            self.byte_range_width
        );
        self.state = PlaceholderState::Reserved(reservation);
        Ok(reservation)
    }

    /// Patch both placeholders in the fully serialized document.
    ///
    /// `wrap_key` is the key-encryption key for this document; a fresh
    /// authentication key is generated here.
    pub fn finalize(&mut self, document: &mut [u8], wrap_key: &[u8]) -> MacResult<ByteRange> {
        let reservation = match self.state {
            PlaceholderState::Reserved(r) => r,
            PlaceholderState::Idle => {
                return Err(MacError::PlaceholderState(
                    "finalize called before reserve".into(),
                ))
            }
            PlaceholderState::Finalized(_) => {
                return Err(MacError::PlaceholderState(
                    "finalize called twice".into(),
                ))
            }
        };
        if reservation.byte_range_offset + reservation.byte_range_width > document.len() {
            return Err(MacError::PlaceholderState(format!(
                "document of {} bytes is shorter than the reserved placeholders",
                document.len()
            )));
        }
        if document[reservation.mac_offset] != b'<'
            || document[reservation.mac_end() - 1] != b'>'
        {
            return Err(MacError::PlaceholderState(
                "/MAC placeholder moved or overwritten".into(),
            ));
        }

        let byte_range = ByteRange::around_placeholder(
            reservation.mac_offset as u64,
            reservation.mac_end() as u64,
            document.len() as u64,
        )?;
        let range_text = byte_range.to_padded_pdf_array(reservation.byte_range_width)?;
        document[reservation.byte_range_offset..reservation.byte_range_offset + range_text.len()]
            .copy_from_slice(&range_text);

        let digest_algorithm = self.builder.properties().digest_algorithm();
        let data_digest = digest_algorithm.digest_parts(&byte_range.segments(document)?);
        let auth_key = key_wrap::generate_mac_key();
        let container = self.builder.build(&data_digest, &auth_key, None, wrap_key)?;

        if container.len() > reservation.container_capacity() {
            return Err(MacError::PlaceholderOverflow {
                what: "MAC",
                needed: container.len(),
                reserved: reservation.container_capacity(),
            });
        }
        let hex_start = reservation.mac_offset + 1;
        let hex_end = reservation.mac_end() - 1;
        let encoded = hex::encode(container.as_der());
        document[hex_start..hex_start + encoded.len()].copy_from_slice(encoded.as_bytes());
        document[hex_start + encoded.len()..hex_end].fill(b'0');

        log::info!(
            "Finalized MAC placeholder: byte range {}, container {} of {} reserved bytes",
            byte_range,
            container.len(),
            reservation.container_capacity()
        );
        self.state = PlaceholderState::Finalized(byte_range);
        Ok(byte_range)
    }
}
