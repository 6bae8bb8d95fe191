//! Ceremony metadata: the channel configuration agreed at pad exchange.
//!
//! The metadata is immutable once created and travels as the first bytes
//! of the fountain-coded payload, in a fixed big-endian wire form:
//!
//! ```text
//! version u16 || ttl_seconds u64 || disappearing_seconds u32 ||
//! notification_flags u16 || relay_url_len u16 || relay_url bytes
//! ```

use serde::{Deserialize, Serialize};

use crate::error::PadlinkError;

/// Current ceremony protocol version.
pub const PROTOCOL_VERSION: u16 = 1;

/// Fixed-width prefix of the wire form, before the relay URL bytes.
pub const METADATA_FIXED_LEN: usize = 18;

/// Longest relay URL the length-prefixed wire form can carry.
pub const MAX_RELAY_URL_LEN: usize = u16::MAX as usize;

/// Channel configuration exchanged during the ceremony.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CeremonyMetadata {
    /// Protocol version, [`PROTOCOL_VERSION`] for pads created here.
    pub version: u16,
    /// How long the relay retains undelivered messages.
    pub ttl_seconds: u64,
    /// Disappearing-message timer; 0 disables.
    pub disappearing_seconds: u32,
    /// Notification toggles and UI color, transmitted verbatim.
    pub notification_flags: NotificationFlags,
    /// Relay the two devices agree to meet on.
    pub relay_url: String,
}

impl CeremonyMetadata {
    /// Construct metadata for a new ceremony at the current protocol
    /// version.
    pub fn new(
        ttl_seconds: u64,
        disappearing_seconds: u32,
        notification_flags: NotificationFlags,
        relay_url: impl Into<String>,
    ) -> Result<Self, PadlinkError> {
        let relay_url = relay_url.into();
        if relay_url.len() > MAX_RELAY_URL_LEN {
            return Err(PadlinkError::InvalidState("relay url too long"));
        }
        Ok(Self {
            version: PROTOCOL_VERSION,
            ttl_seconds,
            disappearing_seconds,
            notification_flags,
            relay_url,
        })
    }

    /// Serialized length of this metadata on the wire.
    pub fn wire_len(&self) -> usize {
        METADATA_FIXED_LEN + self.relay_url.len()
    }

    /// Pack into the big-endian wire form.
    pub fn to_bytes(&self) -> Result<Vec<u8>, PadlinkError> {
        if self.relay_url.len() > MAX_RELAY_URL_LEN {
            return Err(PadlinkError::InvalidState("relay url too long"));
        }
        let mut out = Vec::with_capacity(self.wire_len());
        out.extend_from_slice(&self.version.to_be_bytes());
        out.extend_from_slice(&self.ttl_seconds.to_be_bytes());
        out.extend_from_slice(&self.disappearing_seconds.to_be_bytes());
        out.extend_from_slice(&self.notification_flags.bits().to_be_bytes());
        out.extend_from_slice(&(self.relay_url.len() as u16).to_be_bytes());
        out.extend_from_slice(self.relay_url.as_bytes());
        Ok(out)
    }

    /// Parse the wire form from the front of `bytes`, returning the
    /// metadata and the number of bytes it occupied. Trailing bytes are
    /// left for the caller (they are the pad).
    pub fn from_bytes(bytes: &[u8]) -> Result<(Self, usize), PadlinkError> {
        if bytes.len() < METADATA_FIXED_LEN {
            return Err(PadlinkError::InvalidFrame("metadata header truncated"));
        }
        let version = u16::from_be_bytes([bytes[0], bytes[1]]);
        let ttl_seconds = u64::from_be_bytes([
            bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7], bytes[8], bytes[9],
        ]);
        let disappearing_seconds =
            u32::from_be_bytes([bytes[10], bytes[11], bytes[12], bytes[13]]);
        let notification_flags =
            NotificationFlags::new(u16::from_be_bytes([bytes[14], bytes[15]]));
        let url_len = usize::from(u16::from_be_bytes([bytes[16], bytes[17]]));

        let total = METADATA_FIXED_LEN + url_len;
        if bytes.len() < total {
            return Err(PadlinkError::InvalidFrame("relay url truncated"));
        }
        let relay_url = std::str::from_utf8(&bytes[METADATA_FIXED_LEN..total])
            .map_err(|_| PadlinkError::InvalidFrame("relay url is not utf-8"))?
            .to_owned();

        Ok((
            Self {
                version,
                ttl_seconds,
                disappearing_seconds,
                notification_flags,
                relay_url,
            },
            total,
        ))
    }
}

/// 16-bit notification bitfield.
///
/// Bits 0–2 are boolean notification toggles; bits 12–15 carry a UI color
/// index. Not security-relevant, but the field round-trips verbatim so
/// both devices render the channel identically.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationFlags(u16);

impl NotificationFlags {
    /// Number of boolean toggle bits.
    pub const TOGGLE_BITS: u8 = 3;

    /// Wrap a raw bitfield.
    pub fn new(bits: u16) -> Self {
        Self(bits)
    }

    /// The raw bitfield.
    pub fn bits(self) -> u16 {
        self.0
    }

    /// Read toggle `bit` (0–2). Bits outside the toggle range read false.
    pub fn toggle(self, bit: u8) -> bool {
        bit < Self::TOGGLE_BITS && self.0 & (1 << bit) != 0
    }

    /// Return a copy with toggle `bit` (0–2) set or cleared. Out-of-range
    /// bits are ignored.
    pub fn with_toggle(self, bit: u8, on: bool) -> Self {
        if bit >= Self::TOGGLE_BITS {
            return self;
        }
        let mask = 1u16 << bit;
        Self(if on { self.0 | mask } else { self.0 & !mask })
    }

    /// The UI color index stored in bits 12–15.
    pub fn color_index(self) -> u8 {
        (self.0 >> 12) as u8
    }

    /// Return a copy with the UI color index replaced. Only the low four
    /// bits of `index` are used.
    pub fn with_color_index(self, index: u8) -> Self {
        Self((self.0 & 0x0fff) | (u16::from(index & 0x0f) << 12))
    }
}
