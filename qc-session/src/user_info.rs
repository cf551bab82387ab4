//! The locally-displayed and wire-exchanged identity of a chat participant.

/// A participant's username.
///
/// Thin wrapper matching the original's `UserInfo` configuration struct; no
/// other profile fields (avatar, status) are modeled here, since those never
/// leave the GUI layer in the source implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    username: String,
}

impl UserInfo {
    /// Build a `UserInfo` from a username.
    pub fn new(username: impl Into<String>) -> Self {
        Self { username: username.into() }
    }

    /// The username as a string slice.
    pub fn as_str(&self) -> &str {
        &self.username
    }

    /// Consume this `UserInfo`, returning the owned username.
    pub fn into_string(self) -> String {
        self.username
    }
}

impl std::fmt::Display for UserInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.username)
    }
}

impl From<String> for UserInfo {
    fn from(username: String) -> Self {
        Self { username }
    }
}

impl From<&str> for UserInfo {
    fn from(username: &str) -> Self {
        Self { username: username.to_owned() }
    }
}
