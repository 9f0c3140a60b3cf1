//! Route table and per-route access policy.

#[cfg(test)]
#[path = "routes_test.rs"]
mod routes_test;

use crate::net::types::UserType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Root,
    Login,
    Register,
    ForgotPassword,
    ResetPassword,
    ElderDashboard,
    CaretakerDashboard,
    Profile,
    Bookings,
    Emergency,
    Payment,
    PaymentSuccess,
    AdminDashboard,
    ServiceManagement,
    Appointments,
    Caretakers,
    NotFound(String),
}

/// Who may render a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    Role(UserType),
}

impl Route {
    /// Map a location path to a route. Query strings and a trailing slash are
    /// ignored.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Self::Root,
            "/login" => Self::Login,
            "/register" => Self::Register,
            "/forgot-password" => Self::ForgotPassword,
            "/resetPassword" => Self::ResetPassword,
            "/elder" => Self::ElderDashboard,
            "/caretaker" => Self::CaretakerDashboard,
            "/profile" => Self::Profile,
            "/bookings" => Self::Bookings,
            "/emergency" => Self::Emergency,
            "/payment" => Self::Payment,
            "/success-payment" => Self::PaymentSuccess,
            "/admin" => Self::AdminDashboard,
            "/service" => Self::ServiceManagement,
            "/appointments" => Self::Appointments,
            "/caretakers" => Self::Caretakers,
            _ => Self::NotFound(path.to_owned()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Root => "/",
            Self::Login => "/login",
            Self::Register => "/register",
            Self::ForgotPassword => "/forgot-password",
            Self::ResetPassword => "/resetPassword",
            Self::ElderDashboard => "/elder",
            Self::CaretakerDashboard => "/caretaker",
            Self::Profile => "/profile",
            Self::Bookings => "/bookings",
            Self::Emergency => "/emergency",
            Self::Payment => "/payment",
            Self::PaymentSuccess => "/success-payment",
            Self::AdminDashboard => "/admin",
            Self::ServiceManagement => "/service",
            Self::Appointments => "/appointments",
            Self::Caretakers => "/caretakers",
            Self::NotFound(path) => path,
        }
    }

    #[must_use]
    pub fn access(&self) -> Access {
        match self {
            Self::Root
            | Self::Login
            | Self::Register
            | Self::ForgotPassword
            | Self::ResetPassword
            | Self::NotFound(_) => Access::Public,
            Self::Profile | Self::Bookings | Self::Emergency | Self::Payment | Self::PaymentSuccess => {
                Access::Authenticated
            }
            Self::ElderDashboard => Access::Role(UserType::Elder),
            Self::CaretakerDashboard => Access::Role(UserType::Caretaker),
            Self::AdminDashboard | Self::ServiceManagement | Self::Appointments | Self::Caretakers => {
                Access::Role(UserType::Admin)
            }
        }
    }

    /// Dashboard a user of `user_type` lands on after login.
    #[must_use]
    pub fn landing_for(user_type: &UserType) -> Self {
        match user_type {
            UserType::Elder => Self::ElderDashboard,
            UserType::Caretaker => Self::CaretakerDashboard,
            UserType::Admin => Self::AdminDashboard,
            UserType::Other(_) => Self::Root,
        }
    }
}
