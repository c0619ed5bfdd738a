//! Client session configuration

use crate::protocol::gcc::{
    ChannelDef, ClientCoreData, ClientNetworkData, ClientSecurityData, ENCRYPTION_FLAG_40BIT,
    ENCRYPTION_FLAG_56BIT, ENCRYPTION_FLAG_128BIT,
};

/// Settings advertised to the server in the client capability blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClientConfig {
    /// Desktop width in pixels.
    pub desktop_width: u16,
    /// Desktop height in pixels.
    pub desktop_height: u16,
    /// Keyboard layout (input locale identifier).
    pub keyboard_layout: u32,
    /// Client build number.
    pub client_build: u32,
    /// Client computer name.
    pub client_name: String,
    /// Requested color depth in bits per pixel.
    pub high_color_depth: u16,
    /// Supported standard RDP encryption methods (`ENCRYPTION_FLAG_*`).
    pub encryption_methods: u32,
    /// Static virtual channels to request, joined after the user channel.
    pub static_channels: Vec<ChannelDef>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            desktop_width: 1024,
            desktop_height: 768,
            keyboard_layout: 0x0409,
            client_build: 3790,
            client_name: String::from("mcs"),
            high_color_depth: 24,
            encryption_methods: ENCRYPTION_FLAG_40BIT
                | ENCRYPTION_FLAG_56BIT
                | ENCRYPTION_FLAG_128BIT,
            static_channels: Vec::new(),
        }
    }
}

impl ClientConfig {
    /// Core data block for the negotiated X.224 protocol.
    #[must_use]
    pub fn core_data(&self, server_selected_protocol: u32) -> ClientCoreData {
        ClientCoreData {
            desktop_width: self.desktop_width,
            desktop_height: self.desktop_height,
            keyboard_layout: self.keyboard_layout,
            client_build: self.client_build,
            client_name: self.client_name.clone(),
            high_color_depth: self.high_color_depth,
            server_selected_protocol,
            ..ClientCoreData::default()
        }
    }

    /// Security data block.
    #[must_use]
    pub fn security_data(&self) -> ClientSecurityData {
        ClientSecurityData {
            encryption_methods: self.encryption_methods,
            ..ClientSecurityData::default()
        }
    }

    /// Network data block listing the static channels.
    #[must_use]
    pub fn network_data(&self) -> ClientNetworkData {
        ClientNetworkData {
            channels: self.static_channels.clone(),
        }
    }
}
