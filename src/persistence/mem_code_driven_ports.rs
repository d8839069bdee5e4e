use crate::domain;
use std::collections::HashMap;
use std::sync::RwLock;

const STORE_NAME: &str = "verification code store";

/// Outstanding verification codes keyed by the email they were issued for. Codes stay until
/// they are used or replaced.
pub struct InMemoryCodeStore {
    codes: HashMap<String, String>,
}

impl InMemoryCodeStore {
    pub fn new() -> InMemoryCodeStore {
        InMemoryCodeStore {
            codes: HashMap::new(),
        }
    }

    pub fn new_locked() -> RwLock<InMemoryCodeStore> {
        RwLock::new(Self::new())
    }
}

impl Default for InMemoryCodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl domain::verification::driven_ports::CodeStore for RwLock<InMemoryCodeStore> {
    async fn store_code(&self, email: &str, code: &str) -> Result<(), anyhow::Error> {
        let mut store = self.write().map_err(domain::poisoned(STORE_NAME))?;
        store.codes.insert(email.to_owned(), code.to_owned());

        Ok(())
    }

    async fn take_matching_code(&self, email: &str, code: &str) -> Result<bool, anyhow::Error> {
        let mut store = self.write().map_err(domain::poisoned(STORE_NAME))?;

        let matches = store
            .codes
            .get(email)
            .is_some_and(|stored_code| stored_code == code);
        if matches {
            store.codes.remove(email);
        }

        Ok(matches)
    }
}
