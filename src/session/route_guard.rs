use crate::domain_model::Role;
use crate::session::{IdentityState, IdentityStatus, SessionState};
use std::sync::Arc;

pub const LOGIN_ROUTE: &str = "/auth/login";
pub const HOME_ROUTE: &str = "/";
pub const COMPANY_ROUTE: &str = "/company";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Authenticated,
    Role(Role),
    /// A recruiter already attached to a company.
    RecruiterWithCompany,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Deny { redirect_to: String },
    /// A session exists but its identity is not known yet. Callers must
    /// neither render nor redirect.
    Indeterminate,
}

pub struct RouteGuard {
    session: Arc<SessionState>,
    identity: Arc<IdentityState>,
    login_redirect: String,
    forbidden_redirect: String,
    company_redirect: String,
}

impl RouteGuard {
    pub fn new(session: Arc<SessionState>, identity: Arc<IdentityState>) -> Self {
        Self {
            session,
            identity,
            login_redirect: LOGIN_ROUTE.to_string(),
            forbidden_redirect: HOME_ROUTE.to_string(),
            company_redirect: COMPANY_ROUTE.to_string(),
        }
    }

    pub fn with_redirects(mut self, login: impl Into<String>, forbidden: impl Into<String>) -> Self {
        self.login_redirect = login.into();
        self.forbidden_redirect = forbidden.into();
        self
    }

    pub fn with_company_redirect(mut self, company: impl Into<String>) -> Self {
        self.company_redirect = company.into();
        self
    }

    pub fn evaluate(&self, requirement: Requirement) -> GuardDecision {
        if !self.session.is_authenticated() {
            return self.deny(&self.login_redirect);
        }

        match (self.identity.status(), requirement) {
            (IdentityStatus::Anonymous | IdentityStatus::Loading, _) => GuardDecision::Indeterminate,
            (_, Requirement::Authenticated) => GuardDecision::Allow,
            (IdentityStatus::Resolved(identity), Requirement::Role(role)) => {
                if identity.role == Some(role) {
                    GuardDecision::Allow
                } else {
                    self.deny(&self.forbidden_redirect)
                }
            }
            (IdentityStatus::Resolved(identity), Requirement::RecruiterWithCompany) => {
                match (identity.role, identity.company_id) {
                    (Some(Role::Recruiter), Some(_)) => GuardDecision::Allow,
                    (Some(Role::Recruiter), None) => self.deny(&self.company_redirect),
                    _ => self.deny(&self.forbidden_redirect),
                }
            }
            // Without an identity the role cannot be confirmed.
            (
                IdentityStatus::Degraded(_),
                Requirement::Role(_) | Requirement::RecruiterWithCompany,
            ) => self.deny(&self.forbidden_redirect),
        }
    }

    /// Wait until the decision for `requirement` is no longer
    /// `Indeterminate`.
    pub async fn wait_for_decision(&self, requirement: Requirement) -> GuardDecision {
        let mut identity_rx = self.identity.subscribe();
        let mut session_rx = self.session.subscribe();
        loop {
            let decision = self.evaluate(requirement);
            if decision != GuardDecision::Indeterminate {
                return decision;
            }
            tokio::select! {
                changed = identity_rx.changed() => if changed.is_err() { return decision },
                changed = session_rx.changed() => if changed.is_err() { return decision },
            }
        }
    }

    fn deny(&self, redirect_to: &str) -> GuardDecision {
        GuardDecision::Deny {
            redirect_to: redirect_to.to_string(),
        }
    }
}
