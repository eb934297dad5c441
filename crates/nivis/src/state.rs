use core::fmt;

use crate::base32::{self, ENCODED_LEN};
use crate::{BitLayout, Error, Result};

/// The fixed-width, lexically sortable string form of an ID.
///
/// Always exactly 13 uppercase Crockford base32 characters
/// (`0123456789ABCDEFGHJKMNPQRSTVWXYZ`); two friendly IDs sort identically
/// to their source integers because the encoding is big-endian over 5-bit
/// groups and the timestamp occupies the most significant bits. Decoding
/// additionally accepts lowercase input and the Crockford aliases
/// (`O`/`o` as `0`, `I`/`i`/`L`/`l` as `1`). This width and character set
/// are stable: external systems persist these strings.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FriendlyId(String);

impl FriendlyId {
    pub(crate) fn from_raw(id: u64) -> Self {
        let buf = base32::encode_u64(id);
        // the alphabet is pure ASCII
        Self(buf.iter().map(|&b| char::from(b)).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FriendlyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FriendlyId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A raw ID unpacked into its human-inspectable parts.
///
/// `timestamp` is absolute (the layout's epoch added back), so two states
/// decoded under different epochs remain comparable. Equality covers the
/// four numeric fields; `friendly` is derived from `id` and carried for
/// display and transport.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug)]
pub struct IdState {
    id: u64,
    timestamp: u64,
    machine_id: u64,
    sequence: u64,
    friendly: FriendlyId,
}

impl IdState {
    /// The packed ID.
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Absolute timestamp, in the layout's ticks since the Unix epoch.
    pub const fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub const fn machine_id(&self) -> u64 {
        self.machine_id
    }

    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Fixed-width sortable string form of the same ID.
    pub const fn friendly(&self) -> &FriendlyId {
        &self.friendly
    }
}

impl PartialEq for IdState {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.timestamp == other.timestamp
            && self.machine_id == other.machine_id
            && self.sequence == other.sequence
    }
}

impl Eq for IdState {}

impl core::hash::Hash for IdState {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for IdState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (timestamp={}, machine_id={}, sequence={})",
            self.friendly, self.timestamp, self.machine_id, self.sequence
        )
    }
}

/// Bidirectional mapping between raw IDs and [`IdState`] under one
/// [`BitLayout`].
///
/// Pure and stateless: a codec can be shared freely and reused for every
/// ID produced under its layout.
///
/// # Example
/// ```
/// use nivis::{BitLayout, IdStateCodec};
///
/// let layout = BitLayout::millis();
/// let codec = IdStateCodec::new(layout);
///
/// let id = layout.compose(123_456, 42, 7);
/// let state = codec.decode(id);
/// assert_eq!(state.machine_id(), 42);
/// assert_eq!(state.sequence(), 7);
///
/// let parsed = codec.decode_friendly(state.friendly().as_str()).unwrap();
/// assert_eq!(parsed, state);
/// assert_eq!(codec.encode(&parsed).unwrap(), id);
/// ```
#[derive(Copy, Clone, Debug)]
pub struct IdStateCodec {
    layout: BitLayout,
}

impl IdStateCodec {
    pub const fn new(layout: BitLayout) -> Self {
        Self { layout }
    }

    pub const fn layout(&self) -> &BitLayout {
        &self.layout
    }

    /// Unpacks a raw ID.
    pub fn decode(&self, id: u64) -> IdState {
        IdState {
            id,
            timestamp: self.layout.epoch() + self.layout.timestamp_of(id),
            machine_id: self.layout.machine_id_of(id),
            sequence: self.layout.sequence_of(id),
            friendly: FriendlyId::from_raw(id),
        }
    }

    /// Re-packs a state into its raw ID. `encode(decode(x)) == x` for
    /// every ID reachable under the codec's layout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the state's absolute timestamp
    /// precedes this codec's epoch (the state was decoded under a
    /// different layout).
    pub fn encode(&self, state: &IdState) -> Result<u64> {
        let diff = state
            .timestamp
            .checked_sub(self.layout.epoch())
            .ok_or_else(|| Error::Config {
                reason: format!(
                    "timestamp {} is before the codec epoch {}",
                    state.timestamp,
                    self.layout.epoch()
                ),
            })?;
        Ok(self.layout.compose(diff, state.machine_id, state.sequence))
    }

    /// Renders a raw ID as its friendly string form.
    pub fn encode_friendly(&self, id: u64) -> FriendlyId {
        FriendlyId::from_raw(id)
    }

    /// Parses a friendly string back into a full state.
    ///
    /// # Errors
    ///
    /// - [`Error::FriendlyIdLength`] / [`Error::FriendlyIdByte`] for
    ///   malformed input.
    /// - [`Error::FriendlyIdOverflow`] if the string decodes to a value
    ///   with bits set beyond the layout's total width.
    pub fn decode_friendly(&self, encoded: &str) -> Result<IdState> {
        let id = base32::decode_u64(encoded)?;
        if id & !self.layout.id_mask() != 0 {
            return Err(Error::FriendlyIdOverflow { id });
        }
        Ok(self.decode(id))
    }
}

/// Width of every friendly ID, in characters.
pub const FRIENDLY_ID_LEN: usize = ENCODED_LEN;

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> IdStateCodec {
        IdStateCodec::new(BitLayout::millis())
    }

    #[test]
    fn decode_extracts_all_fields() {
        let layout = BitLayout::millis();
        let codec = codec();
        let id = layout.compose(1_000, 2, 1);
        let state = codec.decode(id);
        assert_eq!(state.id(), id);
        assert_eq!(state.timestamp(), layout.epoch() + 1_000);
        assert_eq!(state.machine_id(), 2);
        assert_eq!(state.sequence(), 1);
    }

    #[test]
    fn raw_roundtrip_is_exact() {
        let layout = BitLayout::millis();
        let codec = codec();
        for id in [
            0,
            1,
            layout.compose(layout.max_timestamp(), layout.max_machine_id(), layout.max_sequence()),
            layout.compose(123_456_789, 512, 2_048),
        ] {
            assert_eq!(codec.encode(&codec.decode(id)).unwrap(), id);
        }
    }

    #[test]
    fn encode_rejects_a_timestamp_before_the_codec_epoch() {
        // decoded under epoch 0, re-encoded under the much later default
        // epoch: the subtraction cannot be represented
        let early = IdStateCodec::new(BitLayout::new(0, 41, 10, 12).unwrap());
        let state = early.decode(early.layout().compose(1_000, 2, 1));
        assert!(matches!(
            codec().encode(&state),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn friendly_strings_with_a_65th_bit_are_rejected() {
        let codec = codec();
        // 'G' in the first position encodes one bit beyond a u64; it must
        // not silently decode to the all-zero state
        assert!(matches!(
            codec.decode_friendly("G000000000000"),
            Err(Error::FriendlyIdByte {
                byte: b'G',
                index: 0
            })
        ));
        assert!(codec.decode_friendly("0000000000000").is_ok());
    }

    #[test]
    fn friendly_roundtrip_is_exact() {
        let layout = BitLayout::millis();
        let codec = codec();
        let id = layout.compose(987_654_321, 13, 99);
        let state = codec.decode(id);
        assert_eq!(state.friendly().as_str().len(), FRIENDLY_ID_LEN);

        let parsed = codec.decode_friendly(state.friendly().as_str()).unwrap();
        assert_eq!(parsed, state);
        assert_eq!(parsed.id(), id);

        // idempotent through a second round
        let reparsed = codec
            .decode_friendly(codec.encode_friendly(parsed.id()).as_str())
            .unwrap();
        assert_eq!(reparsed, parsed);
    }

    #[test]
    fn friendly_ids_sort_like_their_integers() {
        let layout = BitLayout::millis();
        let codec = codec();
        let ids = [
            layout.compose(1, 0, 0),
            layout.compose(1, 0, 1),
            layout.compose(1, 3, 0),
            layout.compose(2, 0, 0),
            layout.compose(500_000, 1_023, 4_095),
        ];
        let mut friendly: Vec<String> = ids
            .iter()
            .map(|id| codec.encode_friendly(*id).as_str().to_owned())
            .collect();
        let in_id_order = friendly.clone();
        friendly.sort();
        assert_eq!(friendly, in_id_order);
    }

    #[test]
    fn friendly_overflow_is_rejected_for_narrow_layouts() {
        let narrow = IdStateCodec::new(BitLayout::new(0, 20, 3, 9).unwrap());
        let wide_id = 1_u64 << 40; // beyond the 32-bit total width
        let encoded = narrow.encode_friendly(wide_id);
        assert_eq!(
            narrow.decode_friendly(encoded.as_str()).unwrap_err(),
            Error::FriendlyIdOverflow { id: wide_id }
        );
    }

    #[test]
    fn equality_ignores_friendly_casing() {
        let codec = codec();
        let state = codec.decode(1234);
        let lower = state.friendly().as_str().to_lowercase();
        assert_eq!(codec.decode_friendly(&lower).unwrap(), state);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn friendly_id_serializes_transparently() {
        let codec = codec();
        let state = codec.decode(42);
        let json = serde_json::to_string(state.friendly()).unwrap();
        assert_eq!(json, format!("\"{}\"", state.friendly()));
    }
}
