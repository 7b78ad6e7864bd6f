// src/config/credentials.rs
use std::collections::HashMap;
use std::env;

use crate::news::providers::{usable_credential, ProviderKind};

/// Per-provider API keys. Never logged; only lengths are.
#[derive(Clone, Default)]
pub struct Credentials {
    keys: HashMap<ProviderKind, String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<&str> = self.keys.keys().map(|k| k.id()).collect();
        kinds.sort_unstable();
        f.debug_struct("Credentials").field("configured", &kinds).finish()
    }
}

impl Credentials {
    /// Read `<NAME>` and then the frontend-style `VITE_<NAME>` for each provider.
    /// The first usable value wins; placeholders fall through.
    pub fn from_env() -> Self {
        let mut creds = Self::default();
        for kind in ProviderKind::ALL {
            let Some(var) = kind.credential_env() else {
                continue;
            };
            let value = [var.to_string(), format!("VITE_{var}")]
                .iter()
                .filter_map(|name| env::var(name).ok())
                .find(|v| usable_credential(v).is_some());
            if let Some(v) = value {
                creds = creds.with(kind, &v);
            }
        }
        creds
    }

    pub fn with(mut self, kind: ProviderKind, key: &str) -> Self {
        if let Some(k) = usable_credential(key) {
            self.keys.insert(kind, k.to_string());
        }
        self
    }

    pub fn get(&self, kind: ProviderKind) -> Option<&str> {
        self.keys.get(&kind).map(String::as_str)
    }

    pub fn configured(&self) -> usize {
        self.keys.len()
    }
}
