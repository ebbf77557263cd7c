use std::fs;

use escrow_setup_core::keys::{KeyStore, KeyStoreError};
use solana_sdk::signer::{
    Signer as _,
    keypair::{Keypair, write_keypair_file},
};

#[test]
fn public_key_file_is_preferred() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let store = KeyStore::new(dir.path());
    let alice = Keypair::new();
    fs::write(
        store.public_key_path("alice"),
        serde_json::to_string(&alice.pubkey().to_string())?,
    )?;

    assert_eq!(store.load_public_key("alice")?, alice.pubkey());
    Ok(())
}

#[test]
fn public_key_falls_back_to_keypair() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let store = KeyStore::new(dir.path());
    let operator = Keypair::new();
    write_keypair_file(&operator, store.keypair_path("id"))?;

    assert_eq!(store.load_public_key("id")?, operator.pubkey());
    assert_eq!(store.load_keypair("id")?.pubkey(), operator.pubkey());
    Ok(())
}

#[test]
fn missing_and_malformed_keys_are_errors() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let store = KeyStore::new(dir.path());

    assert!(matches!(
        store.load_keypair("bob"),
        Err(KeyStoreError::Missing { .. })
    ));

    fs::write(store.public_key_path("bob"), "not json")?;
    assert!(matches!(
        store.load_public_key("bob"),
        Err(KeyStoreError::InvalidPublicKey { .. })
    ));
    Ok(())
}
