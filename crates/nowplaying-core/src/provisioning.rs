//! Provisioning screens and the credential submission hook.

use log::info;

use crate::{
    render::{BLACK, BLUE, Font, Surface, TextColors, WHITE},
    settings::{CredentialStore, DeviceCredentials},
};

pub const PORTAL_SSID: &str = "NowPlayingDIY";
pub const PORTAL_PASSWORD: &str = "thing123";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProvisioningMessage<'a> {
    /// Access point is up and waiting for network credentials.
    ConfigPortal {
        ssid: &'a str,
        password: &'a str,
        address: &'a str,
    },
    /// Joined the network but no refresh token is stored yet.
    RefreshToken { address: &'a str },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MessageLine<'a> {
    pub x: i32,
    pub y: i32,
    pub text: &'a str,
    pub highlighted: bool,
}

const fn plain(x: i32, y: i32, text: &str) -> MessageLine<'_> {
    MessageLine {
        x,
        y,
        text,
        highlighted: false,
    }
}

const fn value(x: i32, y: i32, text: &str) -> MessageLine<'_> {
    MessageLine {
        x,
        y,
        text,
        highlighted: true,
    }
}

impl<'a> ProvisioningMessage<'a> {
    pub fn lines(&self) -> [MessageLine<'a>; 7] {
        match *self {
            Self::ConfigPortal {
                ssid,
                password,
                address,
            } => [
                plain(5, 20, "Entered Conf Mode:"),
                plain(5, 45, "Connect to the following WIFI AP:"),
                value(20, 70, ssid),
                plain(5, 90, "Password:"),
                value(20, 110, password),
                plain(5, 140, "If it doesn't AutoConnect, use this IP:"),
                value(20, 165, address),
            ],
            Self::RefreshToken { address } => [
                plain(5, 20, "Refresh Token Mode:"),
                plain(5, 45, "You need to authorize this device to use"),
                plain(5, 68, "your music account."),
                plain(5, 105, "Visit the following address and follow"),
                plain(5, 128, "the instructions:"),
                value(10, 158, address),
                value(10, 180, "Port: 80"),
            ],
        }
    }

    pub fn render<S: Surface + ?Sized>(&self, surface: &mut S) {
        match self {
            Self::ConfigPortal { ssid, .. } => info!("provisioning: config portal ssid={}", ssid),
            Self::RefreshToken { address } => info!("provisioning: refresh token at {}", address),
        }

        surface.fill_screen(BLACK);
        for line in self.lines() {
            let (font, fg) = if line.highlighted {
                (Font::Large, BLUE)
            } else {
                (Font::Message, WHITE)
            };
            surface.draw_text(line.x, line.y, line.text, font, TextColors::new(fg, BLACK));
        }
    }
}

/// Persists credentials submitted through provisioning.
pub fn on_config_submitted<S: CredentialStore>(
    store: &mut S,
    credentials: &DeviceCredentials,
) -> Result<(), S::Error> {
    info!(
        "provisioning: credentials submitted client_id_len={} refresh_token={}",
        credentials.client_id.len(),
        credentials.has_refresh_token()
    );
    store.save(credentials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{DrawOp, RecordingSurface};

    #[derive(Default)]
    struct MemoryStore {
        saved: Option<DeviceCredentials>,
    }

    impl CredentialStore for MemoryStore {
        type Error = ();

        fn load(&mut self) -> Result<Option<DeviceCredentials>, Self::Error> {
            Ok(self.saved.clone())
        }

        fn save(&mut self, credentials: &DeviceCredentials) -> Result<(), Self::Error> {
            self.saved = Some(credentials.clone());
            Ok(())
        }
    }

    #[test]
    fn portal_message_highlights_the_access_details() {
        let message = ProvisioningMessage::ConfigPortal {
            ssid: PORTAL_SSID,
            password: PORTAL_PASSWORD,
            address: "192.168.4.1",
        };
        let highlighted: Vec<&str> = message
            .lines()
            .iter()
            .filter(|line| line.highlighted)
            .map(|line| line.text)
            .collect();
        assert_eq!(highlighted, [PORTAL_SSID, PORTAL_PASSWORD, "192.168.4.1"]);
    }

    #[test]
    fn rendering_clears_the_screen_first() {
        let mut surface = RecordingSurface::new(320, 240);
        ProvisioningMessage::RefreshToken {
            address: "10.0.0.7",
        }
        .render(&mut surface);

        assert!(matches!(surface.ops[0], DrawOp::FillRect { x: 0, y: 0, width: 320, height: 240, .. }));
        assert_eq!(surface.texts().len(), 7);
        assert!(surface.texts().contains(&"10.0.0.7"));
    }

    #[test]
    fn submitted_credentials_are_persisted() {
        let mut store = MemoryStore::default();
        let credentials = DeviceCredentials::new("id", "secret", "token").unwrap();

        on_config_submitted(&mut store, &credentials).unwrap();
        assert_eq!(store.load().unwrap(), Some(credentials));
    }
}
