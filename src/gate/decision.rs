//! Gate decision table.
//!
//! Rules are evaluated in order and the first match wins:
//!
//! 1. signed in, flagged, not on a reset route: redirect to the reset page
//! 2. on a reset route while anonymous or unflagged: redirect home
//! 3. on a public route: allow
//! 4. anything else: require authentication
//!
//! Rule 1 comes before rule 3 so a flagged user cannot browse public pages,
//! and rule 2 comes before rule 4 so an unflagged user cannot stay on the
//! reset page.

use super::routes::RouteClass;
use crate::provider::IdentitySession;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Decision {
    Allow,
    RedirectToReset,
    RedirectToHome,
    RequireAuth,
}

impl Decision {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::RedirectToReset => "redirect-to-reset",
            Self::RedirectToHome => "redirect-to-home",
            Self::RequireAuth => "require-auth",
        }
    }
}

/// Evaluate the gate for one request.
#[must_use]
pub fn decide(class: RouteClass, session: &IdentitySession) -> Decision {
    let signed_in = session.is_signed_in();
    let reset_required = session.password_reset_required();

    match class {
        _ if signed_in && reset_required && class != RouteClass::ResetPassword => {
            Decision::RedirectToReset
        }
        RouteClass::ResetPassword if !signed_in || !reset_required => Decision::RedirectToHome,
        RouteClass::Public => Decision::Allow,
        RouteClass::ResetPassword | RouteClass::Protected => Decision::RequireAuth,
    }
}
