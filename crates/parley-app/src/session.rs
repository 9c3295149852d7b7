use std::sync::Arc;

use parley_store::StorageBackend;
use parley_types::User;
use tracing::{error, warn};

/// Storage key for the selected identity, kept separate from the channel
/// table. Same key as the original browser build.
const SESSION_KEY: &str = "currentUser";

/// Remembers which directory user was selected, across restarts.
pub struct Session {
    backend: Arc<dyn StorageBackend>,
}

impl Session {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// The saved identity, if any. A corrupt or unreadable entry is
    /// discarded so the caller falls back to the selection screen.
    pub fn current_user(&self) -> Option<User> {
        let blob = match self.backend.get(SESSION_KEY) {
            Ok(blob) => blob?,
            Err(e) => {
                error!("Error reading saved user: {}", e);
                return None;
            }
        };

        match serde_json::from_str(&blob) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!("Discarding corrupt saved user: {}", e);
                None
            }
        }
    }

    /// Persist the selected identity. Failures are logged and swallowed,
    /// same policy as the channel store.
    pub fn remember(&self, user: &User) {
        match serde_json::to_string(user) {
            Ok(blob) => {
                if let Err(e) = self.backend.set(SESSION_KEY, &blob) {
                    error!("Error saving user: {}", e);
                }
            }
            Err(e) => error!("Error serializing user: {}", e),
        }
    }

    /// Clear the saved identity (logout).
    pub fn forget(&self) {
        if let Err(e) = self.backend.remove(SESSION_KEY) {
            error!("Error clearing saved user: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_store::MemoryBackend;

    fn sample_user() -> User {
        User {
            id: "u1".into(),
            name: "Ada Brooks".into(),
            username: "ada".into(),
            email: "ada.brooks@example.com".into(),
            avatar: "https://i.pravatar.cc/150?img=1".into(),
        }
    }

    #[test]
    fn remember_then_current_user_round_trips() {
        let backend = Arc::new(MemoryBackend::new());
        let session = Session::new(backend);

        assert!(session.current_user().is_none());

        let user = sample_user();
        session.remember(&user);
        assert_eq!(session.current_user(), Some(user));
    }

    #[test]
    fn forget_clears_the_identity() {
        let backend = Arc::new(MemoryBackend::new());
        let session = Session::new(backend);

        session.remember(&sample_user());
        session.forget();
        assert!(session.current_user().is_none());
    }

    #[test]
    fn corrupt_saved_user_is_discarded() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set(SESSION_KEY, "{broken").unwrap();

        let session = Session::new(backend);
        assert!(session.current_user().is_none());
    }
}
