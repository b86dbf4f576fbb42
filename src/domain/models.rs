use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An account in the authentication subsystem.
///
/// Created exactly once, at the first successful registration ceremony,
/// and never mutated or deleted by this subsystem afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    // ---
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    // ---
    /// `id` is fixed at registration-start so the ceremony state, the
    /// persisted row and the minted session token all agree on it.
    pub fn new(id: Uuid, username: String) -> Self {
        // ---
        Self {
            id,
            username,
            created_at: Utc::now(),
        }
    }
}

/// Whether a credential is bound to one authenticator or synced across
/// several (a "multi-device" passkey, e.g. one backed up to a cloud
/// keychain).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Single,
    Multi,
}

impl DeviceType {
    // ---
    pub fn as_str(&self) -> &'static str {
        // ---
        match self {
            DeviceType::Single => "single",
            DeviceType::Multi => "multi",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        // ---
        match s {
            "multi" => DeviceType::Multi,
            _ => DeviceType::Single,
        }
    }
}

/// A registered authenticator (passkey) belonging to a user.
///
/// `id` is the credential ID exactly as the authenticator reported it at
/// registration: raw bytes, canonicalized once at ingestion. All later
/// lookups match those bytes exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Authenticator {
    // ---
    /// Credential ID (globally unique, raw bytes)
    pub id: Vec<u8>,

    /// Owning user
    pub user_id: Uuid,

    /// Serialized public-key material used for signature verification
    pub public_key: Vec<u8>,

    /// Signature counter. Never accepted as decreasing across successful
    /// authentications; a stalled or rewound counter marks a suspected
    /// cloned authenticator.
    pub counter: u32,

    /// Single- or multi-device credential
    pub device_type: DeviceType,

    /// Whether the credential is currently backed up (synced)
    pub backed_up: bool,

    /// Transports the authenticator reported at registration (usb, nfc, ...)
    pub transports: Vec<String>,

    /// When this credential was registered
    pub created_at: DateTime<Utc>,
}

impl Authenticator {
    // ---
    pub fn new(
        id: Vec<u8>,
        user_id: Uuid,
        public_key: Vec<u8>,
        counter: u32,
        transports: Vec<String>,
    ) -> Self {
        // ---
        // Backup flags are only reported during authentication ceremonies,
        // so a fresh registration starts as a plain single-device credential.
        Self {
            id,
            user_id,
            public_key,
            counter,
            device_type: DeviceType::Single,
            backed_up: false,
            transports,
            created_at: Utc::now(),
        }
    }
}
