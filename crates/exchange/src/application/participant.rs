use dinex_core::Role;

/// A roster member who has identified to the engine
///
/// Only `MatchingEngine::identify` hands these out, so holding one proves
/// the name is on the roster and the account exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    username: String,
    role: Role,
}

impl Participant {
    pub(crate) fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn is_admin(&self) -> bool {
        self.role.can_start_offering()
    }
}

impl std::fmt::Display for Participant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.username)
    }
}
