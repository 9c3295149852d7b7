use parley_types::User;

/// The static user directory shipped with the application.
///
/// Read-only; the channel store never persists users.
pub struct UserDirectory {
    users: Vec<User>,
}

impl UserDirectory {
    /// Load the bundled fixture.
    pub fn bundled() -> Result<Self, serde_json::Error> {
        let users = serde_json::from_str(include_str!("../assets/users.json"))?;
        Ok(Self { users })
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn by_id(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|user| user.id == id)
    }

    pub fn by_username(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|user| user.username == username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn bundled_fixture_parses() {
        let directory = UserDirectory::bundled().unwrap();
        assert!(!directory.users().is_empty());
    }

    #[test]
    fn fixture_ids_and_usernames_are_unique() {
        let directory = UserDirectory::bundled().unwrap();

        let ids: HashSet<&str> = directory.users().iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids.len(), directory.users().len());

        let names: HashSet<&str> = directory
            .users()
            .iter()
            .map(|u| u.username.as_str())
            .collect();
        assert_eq!(names.len(), directory.users().len());
    }

    #[test]
    fn lookup_by_id_and_username() {
        let directory = UserDirectory::bundled().unwrap();
        let first = &directory.users()[0];

        assert_eq!(directory.by_id(&first.id).unwrap().id, first.id);
        assert_eq!(
            directory.by_username(&first.username).unwrap().username,
            first.username
        );
        assert!(directory.by_id("no-such-user").is_none());
        assert!(directory.by_username("no-such-user").is_none());
    }
}
