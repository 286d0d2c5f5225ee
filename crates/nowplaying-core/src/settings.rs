//! Persisted device credentials.

use heapless::String;

pub const CLIENT_ID_BYTES: usize = 48;
pub const CLIENT_SECRET_BYTES: usize = 48;
pub const REFRESH_TOKEN_BYTES: usize = 400;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CredentialError {
    ClientIdTooLong,
    ClientSecretTooLong,
    RefreshTokenTooLong,
}

/// App registration plus the refresh token granted by the account owner.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DeviceCredentials {
    pub client_id: String<CLIENT_ID_BYTES>,
    pub client_secret: String<CLIENT_SECRET_BYTES>,
    /// Empty until the device has been authorized.
    pub refresh_token: String<REFRESH_TOKEN_BYTES>,
}

impl DeviceCredentials {
    pub fn new(
        client_id: &str,
        client_secret: &str,
        refresh_token: &str,
    ) -> Result<Self, CredentialError> {
        Ok(Self {
            client_id: String::try_from(client_id).map_err(|_| CredentialError::ClientIdTooLong)?,
            client_secret: String::try_from(client_secret)
                .map_err(|_| CredentialError::ClientSecretTooLong)?,
            refresh_token: String::try_from(refresh_token)
                .map_err(|_| CredentialError::RefreshTokenTooLong)?,
        })
    }

    pub fn has_client(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }

    pub fn has_refresh_token(&self) -> bool {
        !self.refresh_token.is_empty()
    }
}

/// Abstract credential persistence backend.
pub trait CredentialStore {
    type Error;

    fn load(&mut self) -> Result<Option<DeviceCredentials>, Self::Error>;
    fn save(&mut self, credentials: &DeviceCredentials) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlong_fields_are_rejected() {
        let long = [b'x'; CLIENT_ID_BYTES + 1];
        let long = core::str::from_utf8(&long).unwrap();
        assert_eq!(
            DeviceCredentials::new(long, "secret", ""),
            Err(CredentialError::ClientIdTooLong)
        );
        assert_eq!(
            DeviceCredentials::new("id", long, ""),
            Err(CredentialError::ClientSecretTooLong)
        );
    }

    #[test]
    fn refresh_token_presence_is_reported() {
        let pending = DeviceCredentials::new("id", "secret", "").unwrap();
        assert!(pending.has_client());
        assert!(!pending.has_refresh_token());

        let authorized = DeviceCredentials::new("id", "secret", "token").unwrap();
        assert!(authorized.has_refresh_token());
    }
}
