//! Backend status codes

/// Non-zero envelope statuses the client reacts to.
///
/// Any other non-zero status is still a rejection, just without special
/// handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiCode {
    /// The credential is not recognised.
    TokenInvalid,
    /// The credential has expired.
    TokenExpired,
    /// The account signed in from another device.
    LoggedInElsewhere,
    /// The account has not been activated.
    NotActivated,
    /// The feature requires a VIP entitlement.
    NotVip,
}

impl ApiCode {
    /// Every known code.
    pub const ALL: [ApiCode; 5] = [
        Self::TokenInvalid,
        Self::TokenExpired,
        Self::LoggedInElsewhere,
        Self::NotActivated,
        Self::NotVip,
    ];

    /// Looks up a known code by its envelope status.
    pub fn from_status(status: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|code| code.status() == status)
    }

    /// Returns the envelope status for this code.
    pub const fn status(self) -> i64 {
        match self {
            Self::TokenInvalid => 40001,
            Self::TokenExpired => 40002,
            Self::LoggedInElsewhere => 40003,
            Self::NotActivated => 40005,
            Self::NotVip => 40008,
        }
    }

    /// Returns `true` if the user has to sign in again.
    pub fn requires_reauth(self) -> bool {
        matches!(
            self,
            Self::TokenInvalid | Self::TokenExpired | Self::LoggedInElsewhere
        )
    }

    /// Returns the page the user is sent to when this code is received.
    pub fn navigation_target(self) -> Option<&'static str> {
        match self {
            Self::NotActivated => Some("/activate"),
            Self::NotVip => Some("/purchase"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_round_trips() {
        for code in ApiCode::ALL {
            assert_eq!(ApiCode::from_status(code.status()), Some(code));
        }
        assert_eq!(ApiCode::from_status(0), None);
        assert_eq!(ApiCode::from_status(40004), None);
    }

    #[test]
    fn test_navigation_targets() {
        assert_eq!(ApiCode::NotActivated.navigation_target(), Some("/activate"));
        assert_eq!(ApiCode::NotVip.navigation_target(), Some("/purchase"));
        assert_eq!(ApiCode::TokenExpired.navigation_target(), None);
    }

    #[test]
    fn test_requires_reauth() {
        assert!(ApiCode::TokenInvalid.requires_reauth());
        assert!(ApiCode::LoggedInElsewhere.requires_reauth());
        assert!(!ApiCode::NotVip.requires_reauth());
    }
}
