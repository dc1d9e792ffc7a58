//! Authorization guards.
//!
//! A [`Policy`] is a pure predicate over the resolved caller and the ids named in the request path.
//! Guards compose left to right with [`Policy::and`], and the first one that refuses decides the
//! outcome, so a route declared as
//!
//! ```ignore
//! RequireAuthenticated.and(RequireCompanyAdmin)
//! ```
//!
//! reports a missing caller before a wrong company, and a wrong company before a missing role.
//! A caller from another company is always answered with `401`, never `403` or `404`.

use crate::{
    auth::identity::Identity,
    errors::Error,
    types::{CompanyId, UserId, parse_id},
};

/// Why a policy refused a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// No caller, or a caller from a different company (401)
    Unauthenticated,
    /// Right company, wrong role (403)
    Forbidden,
}

impl From<Denial> for Error {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::Unauthenticated => Error::unauthorized(),
            Denial::Forbidden => Error::Forbidden { message: None },
        }
    }
}

/// Ids taken from the request path. Segments that are not integers are kept as `None` and never
/// match a caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathScope {
    pub company_id: Option<CompanyId>,
    pub user_id: Option<UserId>,
}

impl PathScope {
    pub fn company(raw: &str) -> Self {
        Self {
            company_id: parse_id(raw),
            user_id: None,
        }
    }

    pub fn user(company: &str, user: &str) -> Self {
        Self {
            company_id: parse_id(company),
            user_id: parse_id(user),
        }
    }
}

pub trait Policy {
    fn check(&self, identity: Option<&Identity>, scope: &PathScope) -> Result<(), Denial>;

    /// Run `self`, then `other`.
    fn and<P: Policy>(self, other: P) -> Both<Self, P>
    where
        Self: Sized,
    {
        Both(self, other)
    }
}

/// Two policies in sequence.
#[derive(Debug, Clone, Copy)]
pub struct Both<A, B>(A, B);

impl<A: Policy, B: Policy> Policy for Both<A, B> {
    fn check(&self, identity: Option<&Identity>, scope: &PathScope) -> Result<(), Denial> {
        self.0.check(identity, scope)?;
        self.1.check(identity, scope)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RequireAuthenticated;

impl Policy for RequireAuthenticated {
    fn check(&self, identity: Option<&Identity>, _scope: &PathScope) -> Result<(), Denial> {
        identity.map(|_| ()).ok_or(Denial::Unauthenticated)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RequireSameCompany;

impl Policy for RequireSameCompany {
    fn check(&self, identity: Option<&Identity>, scope: &PathScope) -> Result<(), Denial> {
        match (identity, scope.company_id) {
            (Some(identity), Some(company_id)) if identity.company_id == company_id => Ok(()),
            _ => Err(Denial::Unauthenticated),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RequireCompanyAdmin;

impl Policy for RequireCompanyAdmin {
    fn check(&self, identity: Option<&Identity>, scope: &PathScope) -> Result<(), Denial> {
        RequireSameCompany.check(identity, scope)?;
        match identity {
            Some(identity) if identity.is_admin => Ok(()),
            _ => Err(Denial::Forbidden),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RequireSelfOrAdmin;

impl Policy for RequireSelfOrAdmin {
    fn check(&self, identity: Option<&Identity>, scope: &PathScope) -> Result<(), Denial> {
        RequireSameCompany.check(identity, scope)?;
        match identity {
            Some(identity) if identity.is_admin || scope.user_id == Some(identity.user_id) => Ok(()),
            _ => Err(Denial::Forbidden),
        }
    }
}

/// Logged in and belonging to the company in the path.
pub fn same_company() -> impl Policy {
    RequireAuthenticated.and(RequireSameCompany)
}

/// Logged in as an admin of the company in the path.
pub fn company_admin() -> impl Policy {
    RequireAuthenticated.and(RequireCompanyAdmin)
}

/// Logged in as the user in the path, or as an admin of their company.
pub fn self_or_admin() -> impl Policy {
    RequireAuthenticated.and(RequireSelfOrAdmin)
}
