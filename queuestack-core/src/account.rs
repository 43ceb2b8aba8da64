//! Storage account settings

use serde::{Deserialize, Serialize};

/// Account name of the local storage emulator
pub const EMULATOR_ACCOUNT: &str = "devstoreaccount1";

/// Well-known shared key of the local storage emulator
pub const EMULATOR_ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";

/// Queue port of the local storage emulator
pub const EMULATOR_QUEUE_PORT: u16 = 10001;

/// Credentials and endpoint selection for a storage account
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageAccount {
    pub name: String,
    pub key: String,
    #[serde(default)]
    pub emulated: bool,
}

impl StorageAccount {
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            emulated: false,
        }
    }

    /// Account of the local storage emulator
    pub fn emulator() -> Self {
        Self {
            name: EMULATOR_ACCOUNT.to_string(),
            key: EMULATOR_ACCOUNT_KEY.to_string(),
            emulated: true,
        }
    }

    /// Base URL of the queue service for this account
    pub fn queue_endpoint(&self) -> String {
        if self.emulated {
            format!("http://127.0.0.1:{}/{}", EMULATOR_QUEUE_PORT, self.name)
        } else {
            format!("https://{}.queue.core.windows.net", self.name)
        }
    }
}

impl Default for StorageAccount {
    fn default() -> Self {
        Self::emulator()
    }
}

// The key never goes to logs.
impl std::fmt::Debug for StorageAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageAccount")
            .field("name", &self.name)
            .field("key", &"<redacted>")
            .field("emulated", &self.emulated)
            .finish()
    }
}
