use log::info;
use nowplaying_core::{
    provisioning,
    settings::{CredentialStore, DeviceCredentials},
};
use nowplaying_hal_esp32::storage::flash_settings::FlashSettingsStore;

const SEED_CLIENT_ID: Option<&str> = option_env!("NOWPLAYING_CLIENT_ID");
const SEED_CLIENT_SECRET: Option<&str> = option_env!("NOWPLAYING_CLIENT_SECRET");
const SEED_REFRESH_TOKEN: Option<&str> = option_env!("NOWPLAYING_REFRESH_TOKEN");

/// Credentials from flash. When flash holds none, build-time values are
/// persisted once and used instead.
pub(super) fn load_credentials() -> Option<DeviceCredentials> {
    let mut store = match FlashSettingsStore::new() {
        Ok(store) => store,
        Err(err) => {
            info!("settings: flash store unavailable: {:?}", err);
            return seed_credentials();
        }
    };

    match store.load() {
        Ok(Some(credentials)) => return Some(credentials),
        Ok(None) => {}
        Err(err) => info!("settings: stored credentials unreadable: {:?}", err),
    }

    let credentials = seed_credentials()?;
    if let Err(err) = provisioning::on_config_submitted(&mut store, &credentials) {
        info!("settings: persisting build-time credentials failed: {:?}", err);
    }
    Some(credentials)
}

fn seed_credentials() -> Option<DeviceCredentials> {
    let (Some(client_id), Some(client_secret)) = (SEED_CLIENT_ID, SEED_CLIENT_SECRET) else {
        return None;
    };

    match DeviceCredentials::new(client_id, client_secret, SEED_REFRESH_TOKEN.unwrap_or("")) {
        Ok(credentials) => Some(credentials),
        Err(err) => {
            info!("settings: build-time credentials rejected: {:?}", err);
            None
        }
    }
}
