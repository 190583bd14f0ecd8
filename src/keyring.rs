// SPDX-License-Identifier: MPL-2.0

//! Secure credential storage using the system keyring.
//!
//! The SoundCloud OAuth token lives in the system's credential store
//! (Secret Service on Linux, macOS Keychain, Windows Credential Manager)
//! instead of in the plaintext config file.

use keyring::Entry;
use tracing::debug;

const SERVICE_NAME: &str = "soundcloud-provider";
const TOKEN_KEY: &str = "oauth_token";

/// Store the OAuth token in the system keyring
pub fn store_token(token: &str) -> Result<(), keyring::Error> {
    store_in(SERVICE_NAME, token)
}

/// Retrieve the OAuth token from the system keyring
pub fn get_token() -> Result<Option<String>, keyring::Error> {
    get_from(SERVICE_NAME)
}

/// Delete the OAuth token from the system keyring
pub fn delete_token() -> Result<(), keyring::Error> {
    delete_from(SERVICE_NAME)
}

fn store_in(service: &str, token: &str) -> Result<(), keyring::Error> {
    debug!(service, key = TOKEN_KEY, "storing token (len={})", token.len());
    Entry::new(service, TOKEN_KEY)?.set_password(token)
}

fn get_from(service: &str) -> Result<Option<String>, keyring::Error> {
    let entry = Entry::new(service, TOKEN_KEY)?;
    match entry.get_password() {
        Ok(token) => {
            debug!("keyring token found (len={})", token.len());
            Ok(Some(token))
        }
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(e),
    }
}

fn delete_from(service: &str) -> Result<(), keyring::Error> {
    let entry = Entry::new(service, TOKEN_KEY)?;
    match entry.delete_credential() {
        Ok(()) => Ok(()),
        Err(keyring::Error::NoEntry) => Ok(()), // Already deleted
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SERVICE: &str = "soundcloud-provider-test";

    #[test]
    fn token_survives_a_new_entry() {
        // headless machines have no credential store
        if let Err(e) = store_in(TEST_SERVICE, "stored-token") {
            eprintln!("skipping, no usable keyring: {e}");
            return;
        }
        let read = get_from(TEST_SERVICE);
        delete_from(TEST_SERVICE).unwrap();

        assert_eq!(read.unwrap().as_deref(), Some("stored-token"));
        assert_eq!(get_from(TEST_SERVICE).unwrap(), None);
    }

    #[test]
    fn deleting_a_missing_token_is_ok() {
        if let Err(e) = get_from("soundcloud-provider-test-missing") {
            eprintln!("skipping, no usable keyring: {e}");
            return;
        }
        assert!(delete_from("soundcloud-provider-test-missing").is_ok());
    }
}
