//! Ordered registry of MCS channels the session joins

use std::fmt;

use crate::protocol::MCS_GLOBAL_CHANNEL;

/// A channel id and its human-readable name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct McsChannelInfo {
    /// MCS channel id
    pub id: u16,
    /// Channel name (`global`, `user`, or a static channel name)
    pub name: String,
}

impl McsChannelInfo {
    /// Create a channel entry
    pub fn new(id: u16, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl fmt::Display for McsChannelInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.id)
    }
}

/// Channels in join order, always starting with the global channel
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelRegistry {
    channels: Vec<McsChannelInfo>,
}

impl ChannelRegistry {
    /// Name of the global channel
    pub const GLOBAL: &'static str = "global";
    /// Name of the user channel
    pub const USER: &'static str = "user";

    /// Registry seeded with the global channel
    #[must_use]
    pub fn new() -> Self {
        Self {
            channels: vec![McsChannelInfo::new(MCS_GLOBAL_CHANNEL, Self::GLOBAL)],
        }
    }

    /// Append a channel at the end of the join order
    pub fn push(&mut self, channel: McsChannelInfo) {
        self.channels.push(channel);
    }

    /// Number of registered channels
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Always false; the global channel is never removed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Channel at `index` in join order
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&McsChannelInfo> {
        self.channels.get(index)
    }

    /// Whether a channel with `id` is registered
    #[must_use]
    pub fn contains(&self, id: u16) -> bool {
        self.channels.iter().any(|channel| channel.id == id)
    }

    /// Iterate in join order
    pub fn iter(&self) -> std::slice::Iter<'_, McsChannelInfo> {
        self.channels.iter()
    }

    /// Borrow all channels in join order
    #[must_use]
    pub fn as_slice(&self) -> &[McsChannelInfo] {
        &self.channels
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a ChannelRegistry {
    type Item = &'a McsChannelInfo;
    type IntoIter = std::slice::Iter<'a, McsChannelInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl From<ChannelRegistry> for Vec<McsChannelInfo> {
    fn from(registry: ChannelRegistry) -> Self {
        registry.channels
    }
}
