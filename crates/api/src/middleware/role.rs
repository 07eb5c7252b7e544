//! Path-based role gate.
//!
//! A static table maps each gated path pattern to the role/method
//! combinations allowed on it. The gate runs after [`super::authenticate`],
//! so the caller's role is known: `public` when no user is attached.
//!
//! Pattern segments match literally, except `:id` which matches one
//! non-empty segment of `[A-Za-z0-9_]`.

use axum::{
    extract::Request,
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};

use shopfront_core::Role;

use crate::error::AppError;
use crate::models::CurrentUser;

/// Role of the caller as seen by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    /// No authenticated user.
    Public,
    User,
    Admin,
}

impl From<Option<Role>> for Caller {
    fn from(role: Option<Role>) -> Self {
        match role {
            None => Self::Public,
            Some(Role::User) => Self::User,
            Some(Role::Admin) => Self::Admin,
        }
    }
}

/// Methods the gate distinguishes. `HEAD` counts as `GET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl Verb {
    fn from_method(method: &Method) -> Option<Self> {
        match *method {
            Method::GET | Method::HEAD => Some(Self::Get),
            Method::POST => Some(Self::Post),
            Method::PUT => Some(Self::Put),
            Method::DELETE => Some(Self::Delete),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Verbs {
    All,
    Only(&'static [Verb]),
}

#[derive(Debug, Clone, Copy)]
struct Grant {
    caller: Caller,
    verbs: Verbs,
}

impl Grant {
    const fn all(caller: Caller) -> Self {
        Self {
            caller,
            verbs: Verbs::All,
        }
    }

    const fn only(caller: Caller, verbs: &'static [Verb]) -> Self {
        Self {
            caller,
            verbs: Verbs::Only(verbs),
        }
    }

    fn permits(&self, caller: Caller, verb: Verb) -> bool {
        self.caller == caller
            && match self.verbs {
                Verbs::All => true,
                Verbs::Only(verbs) => verbs.contains(&verb),
            }
    }
}

struct Rule {
    pattern: &'static str,
    grants: &'static [Grant],
}

const MEMBERS: &[Grant] = &[Grant::all(Caller::User), Grant::all(Caller::Admin)];

const CATALOG: &[Grant] = &[
    Grant::only(Caller::Public, &[Verb::Get]),
    Grant::only(Caller::User, &[Verb::Get]),
    Grant::all(Caller::Admin),
];

const RULES: &[Rule] = &[
    Rule {
        pattern: "/admin",
        grants: &[Grant::only(
            Caller::Admin,
            &[Verb::Get, Verb::Post, Verb::Put, Verb::Delete],
        )],
    },
    Rule {
        pattern: "/users",
        grants: &[Grant::all(Caller::Admin)],
    },
    Rule {
        pattern: "/users/:id",
        grants: &[Grant::all(Caller::Admin)],
    },
    Rule {
        pattern: "/profile",
        grants: MEMBERS,
    },
    Rule {
        pattern: "/profile/credentials",
        grants: MEMBERS,
    },
    Rule {
        pattern: "/profile/avatar",
        grants: MEMBERS,
    },
    Rule {
        pattern: "/profile/password",
        grants: MEMBERS,
    },
    Rule {
        pattern: "/products",
        grants: CATALOG,
    },
    Rule {
        pattern: "/products/:id",
        grants: CATALOG,
    },
    Rule {
        pattern: "/cart",
        grants: MEMBERS,
    },
];

/// Why the gate refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// No rule matches the path.
    PathNotFound,
    /// The method is not one the gate knows.
    MethodNotAllowed,
    /// Anonymous caller on a route with no public access.
    TokenMissing,
    /// The caller's role may not use this method here.
    Forbidden,
}

impl From<Denial> for AppError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::PathNotFound => Self::NotFound("Path not found".to_owned()),
            Denial::MethodNotAllowed => Self::MethodNotAllowed,
            Denial::TokenMissing => Self::Unauthorized("Token missing".to_owned()),
            Denial::Forbidden => Self::Forbidden("Unauthorized access".to_owned()),
        }
    }
}

fn is_id_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

fn matches(pattern: &str, path: &str) -> bool {
    let mut pattern_segments = pattern.split('/');
    let mut path_segments = path.split('/');

    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (None, None) => return true,
            (Some(":id"), Some(segment)) if is_id_segment(segment) => {}
            (Some(expected), Some(segment)) if expected != ":id" && expected == segment => {}
            _ => return false,
        }
    }
}

/// Decide whether `caller` may send `method` to `path`.
///
/// # Errors
///
/// Returns the [`Denial`] explaining the refusal.
pub fn authorize(path: &str, method: &Method, caller: Caller) -> Result<(), Denial> {
    let rule = RULES
        .iter()
        .find(|rule| matches(rule.pattern, path))
        .ok_or(Denial::PathNotFound)?;

    let verb = Verb::from_method(method).ok_or(Denial::MethodNotAllowed)?;

    if rule.grants.iter().any(|grant| grant.permits(caller, verb)) {
        return Ok(());
    }

    let public_route = rule
        .grants
        .iter()
        .any(|grant| grant.caller == Caller::Public);

    if caller == Caller::Public && !public_route {
        Err(Denial::TokenMissing)
    } else {
        Err(Denial::Forbidden)
    }
}

/// Middleware enforcing the role table on gated routes.
pub async fn role_gate(request: Request, next: Next) -> Response {
    let caller = Caller::from(
        request
            .extensions()
            .get::<CurrentUser>()
            .map(CurrentUser::role),
    );

    match authorize(request.uri().path(), request.method(), caller) {
        Ok(()) => next.run(request).await,
        Err(denial) => {
            tracing::debug!(
                path = %request.uri().path(),
                method = %request.method(),
                ?caller,
                ?denial,
                "Request refused by role gate"
            );
            AppError::from(denial).into_response()
        }
    }
}
