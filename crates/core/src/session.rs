use crate::model::UserId;

/// The caller's authentication context, passed explicitly to user-scoped
/// operations rather than read from ambient state.
///
/// Anonymous sessions resolve user-scoped reads to zero/empty defaults;
/// user-scoped writes fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Session {
    #[default]
    Anonymous,
    User(UserId),
}

impl Session {
    /// Session for a signed-in user.
    #[must_use]
    pub fn user(id: UserId) -> Self {
        Self::User(id)
    }

    /// Returns the signed-in user id, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Session::Anonymous => None,
            Session::User(id) => Some(*id),
        }
    }

    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Session::Anonymous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_has_no_user() {
        assert_eq!(Session::Anonymous.user_id(), None);
        assert!(Session::Anonymous.is_anonymous());
    }

    #[test]
    fn user_session_exposes_id() {
        let id = UserId::random();
        let session = Session::user(id);
        assert_eq!(session.user_id(), Some(id));
        assert!(!session.is_anonymous());
    }
}
