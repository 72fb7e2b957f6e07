use bevy::reflect::{Reflect, std_traits::ReflectDefault};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Visitor};

const FNV_OFFSET: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Stable identifier of an animated channel (usually a bone path).
///
/// Ids are the FNV-1a hash of the channel path, so they are identical across runs and across
/// every asset that mentions the same path. The zero id is reserved for "no channel".
#[derive(Reflect, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[reflect(Default)]
pub struct ChannelId(u32);

impl ChannelId {
    pub const NONE: ChannelId = ChannelId(0);

    pub const fn from_path(path: &str) -> Self {
        let bytes = path.as_bytes();
        let mut hash = FNV_OFFSET;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u32;
            hash = hash.wrapping_mul(FNV_PRIME);
            i += 1;
        }
        // Zero would collide with NONE
        if hash == 0 { ChannelId(1) } else { ChannelId(hash) }
    }

    pub const fn from_raw(raw: u32) -> Self {
        ChannelId(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    pub const fn is_some(self) -> bool {
        self.0 != 0
    }
}

impl From<&str> for ChannelId {
    fn from(value: &str) -> Self {
        Self::from_path(value)
    }
}

impl std::fmt::Debug for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ChannelId({:#010x})", self.0)
    }
}

impl Serialize for ChannelId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u32(self.0)
    }
}

struct ChannelIdVisitor;

impl Visitor<'_> for ChannelIdVisitor {
    type Value = ChannelId;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a channel path or a raw channel id")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(ChannelId::from_path(value))
    }

    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        u32::try_from(value)
            .map(ChannelId)
            .map_err(|_| E::custom(format!("channel id {value} does not fit in 32 bits")))
    }

    fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        u32::try_from(value)
            .map(ChannelId)
            .map_err(|_| E::custom(format!("channel id {value} does not fit in 32 bits")))
    }
}

impl<'de> Deserialize<'de> for ChannelId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ChannelIdVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_hash_is_stable() {
        assert_eq!(ChannelId::from_path("Hips"), ChannelId::from("Hips"));
        assert_ne!(ChannelId::from_path("Hips"), ChannelId::from_path("Spine"));
        // FNV-1a of the empty string is the offset basis
        assert_eq!(ChannelId::from_path("").raw(), FNV_OFFSET);
    }

    #[test]
    fn deserializes_from_path_or_raw() {
        let from_path: ChannelId = ron::de::from_str("\"Hips\"").unwrap();
        assert_eq!(from_path, ChannelId::from_path("Hips"));
        let raw = ron::to_string(&from_path).unwrap();
        assert_eq!(ron::de::from_str::<ChannelId>(&raw).unwrap(), from_path);
    }

    #[test]
    fn none_is_reserved() {
        assert!(ChannelId::NONE.is_none());
        assert!(ChannelId::from_path("Root").is_some());
        assert_eq!(ChannelId::default(), ChannelId::NONE);
    }
}
