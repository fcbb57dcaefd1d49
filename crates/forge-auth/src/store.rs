use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use forge_db::Store;
use parking_lot::Mutex;
use rand::random;
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, Nonce, UnboundKey};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::identity::Session;

const SESSION_STORAGE_KEY: &str = "currentUser";
const ENCRYPTION_KEY_ACCOUNT: &str = "session_key_v1";

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum EnvelopeMethod {
    None,
    #[serde(rename = "keyring_aes_256_gcm_v1")]
    KeyringAes256GcmV1,
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionEnvelope {
    method: EnvelopeMethod,
    payload: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nonce: Option<String>,
}

/// Durable home of the signed-in session.
pub(crate) struct CredentialStore {
    service: String,
    store: Arc<Mutex<Store>>,
}

impl CredentialStore {
    pub(crate) fn new(service: impl Into<String>, store: Arc<Mutex<Store>>) -> Self {
        Self {
            service: service.into(),
            store,
        }
    }

    pub(crate) fn load(&self) -> Result<Option<Session>, Error> {
        let raw = self.store.lock().local_storage().get(SESSION_STORAGE_KEY)?;
        match raw {
            Some(raw) => Ok(Some(self.open_envelope(&raw)?)),
            None => Ok(None),
        }
    }

    pub(crate) fn save(&self, session: &Session) -> Result<(), Error> {
        let sealed = self.seal_envelope(session)?;
        self.store
            .lock()
            .local_storage()
            .set(SESSION_STORAGE_KEY, &sealed)
            .map_err(Error::from)
    }

    pub(crate) fn clear(&self) -> Result<(), Error> {
        self.store
            .lock()
            .local_storage()
            .remove(SESSION_STORAGE_KEY)?;
        Ok(())
    }

    fn seal_envelope(&self, session: &Session) -> Result<String, Error> {
        let session_json = serde_json::to_string(session)?;

        let envelope = match default_write_method() {
            EnvelopeMethod::None => SessionEnvelope {
                method: EnvelopeMethod::None,
                payload: session_json,
                nonce: None,
            },
            EnvelopeMethod::KeyringAes256GcmV1 => {
                let key = self.load_or_create_key()?;
                let nonce: [u8; 12] = random();
                let ciphertext = seal(&key, nonce, session_json.as_bytes())?;
                SessionEnvelope {
                    method: EnvelopeMethod::KeyringAes256GcmV1,
                    payload: STANDARD_NO_PAD.encode(ciphertext),
                    nonce: Some(STANDARD_NO_PAD.encode(nonce)),
                }
            }
        };

        Ok(serde_json::to_string(&envelope)?)
    }

    fn open_envelope(&self, raw: &str) -> Result<Session, Error> {
        let envelope = match serde_json::from_str::<SessionEnvelope>(raw) {
            Ok(envelope) => envelope,
            // Bare session JSON, as written by older clients.
            Err(_) => return Ok(serde_json::from_str(raw)?),
        };

        match envelope.method {
            EnvelopeMethod::None => Ok(serde_json::from_str(&envelope.payload)?),
            EnvelopeMethod::KeyringAes256GcmV1 => {
                let nonce = envelope
                    .nonce
                    .ok_or_else(|| Error::Other("missing session nonce".to_string()))?;
                let nonce = decode_fixed::<12>(&nonce, "session nonce")?;
                let ciphertext = STANDARD_NO_PAD.decode(&envelope.payload).map_err(|err| {
                    Error::Other(format!("invalid session ciphertext encoding: {err}"))
                })?;
                let key = self.load_key()?;
                let plaintext = open(&key, nonce, ciphertext)?;
                Ok(serde_json::from_slice(&plaintext)?)
            }
        }
    }

    fn load_or_create_key(&self) -> Result<[u8; 32], Error> {
        let entry = keyring::Entry::new(&self.service, ENCRYPTION_KEY_ACCOUNT)?;

        match entry.get_password() {
            Ok(encoded) => decode_fixed::<32>(&encoded, "encryption key"),
            Err(keyring::Error::NoEntry) => {
                let key: [u8; 32] = random();
                entry.set_password(&STANDARD_NO_PAD.encode(key))?;
                Ok(key)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn load_key(&self) -> Result<[u8; 32], Error> {
        let entry = keyring::Entry::new(&self.service, ENCRYPTION_KEY_ACCOUNT)?;
        decode_fixed::<32>(&entry.get_password()?, "encryption key")
    }
}

fn default_write_method() -> EnvelopeMethod {
    #[cfg(debug_assertions)]
    {
        EnvelopeMethod::None
    }

    #[cfg(not(debug_assertions))]
    {
        EnvelopeMethod::KeyringAes256GcmV1
    }
}

fn decode_fixed<const N: usize>(encoded: &str, what: &str) -> Result<[u8; N], Error> {
    let bytes = STANDARD_NO_PAD
        .decode(encoded)
        .map_err(|err| Error::Other(format!("invalid {what} encoding: {err}")))?;
    bytes
        .try_into()
        .map_err(|_| Error::Other(format!("invalid {what} length; expected {N} bytes")))
}

fn aead_key(key: &[u8; 32]) -> Result<LessSafeKey, Error> {
    let unbound = UnboundKey::new(&AES_256_GCM, key)
        .map_err(|_| Error::Other("invalid encryption key material".to_string()))?;
    Ok(LessSafeKey::new(unbound))
}

fn seal(key: &[u8; 32], nonce: [u8; 12], plaintext: &[u8]) -> Result<Vec<u8>, Error> {
    let key = aead_key(key)?;
    let mut in_out = plaintext.to_vec();
    key.seal_in_place_append_tag(
        Nonce::assume_unique_for_key(nonce),
        Aad::from(SESSION_STORAGE_KEY.as_bytes()),
        &mut in_out,
    )
    .map_err(|_| Error::Other("failed to encrypt session".to_string()))?;
    Ok(in_out)
}

fn open(key: &[u8; 32], nonce: [u8; 12], mut ciphertext: Vec<u8>) -> Result<Vec<u8>, Error> {
    let key = aead_key(key)?;
    let plaintext = key
        .open_in_place(
            Nonce::assume_unique_for_key(nonce),
            Aad::from(SESSION_STORAGE_KEY.as_bytes()),
            &mut ciphertext,
        )
        .map_err(|_| Error::Other("failed to decrypt session".to_string()))?;
    Ok(plaintext.to_vec())
}
