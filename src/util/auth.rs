//! Route guard and post-login redirect.
//!
//! SYSTEM CONTEXT
//! ==============
//! Both consumers read the `RwSignal<SessionState>` mirror provided by the
//! app root. Decisions are pure functions over a snapshot; the components
//! only turn a decision into at most one navigation per change.
//!
//! DESIGN
//! ======
//! "Identity present, profile still loading" is treated as pending rather
//! than unauthorized, otherwise a fresh login would bounce through `/` before
//! the profile row arrives.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::{use_location, use_navigate};

use crate::net::types::Role;
use crate::state::session::{ProfileState, SessionState};

pub const HOME_PATH: &str = "/";
pub const SHOP_PATH: &str = "/shop";
pub const LOGIN_PATH: &str = "/login";
pub const SIGNUP_PATH: &str = "/signup";
pub const PROFILE_PATH: &str = "/profile";
pub const USER_HOME_PATH: &str = "/user";
pub const ADMIN_HOME_PATH: &str = "/admin";

/// Paths a signed-in user is moved away from once their role is known.
pub const PUBLIC_ONLY_PATHS: [&str; 3] = [HOME_PATH, LOGIN_PATH, SIGNUP_PATH];

/// What a guarded route should do with the current snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Navigation {
    /// Session or profile still resolving; show a neutral placeholder.
    Pending,
    Render,
    /// Leave for `path`, replacing the current history entry.
    Redirect(&'static str),
}

/// Landing route for a role.
pub fn home_for(role: Role) -> &'static str {
    match role {
        Role::Admin => ADMIN_HOME_PATH,
        Role::User => USER_HOME_PATH,
    }
}

/// Decide whether a route requiring `required` (or just a login) may render.
pub fn guard_decision(state: &SessionState, required: Option<Role>) -> Navigation {
    if !state.is_ready() {
        return Navigation::Pending;
    }
    if state.identity().is_none() {
        return Navigation::Redirect(LOGIN_PATH);
    }

    let held = match state.profile() {
        ProfileState::Pending => return Navigation::Pending,
        ProfileState::Missing => None,
        ProfileState::Loaded(profile) => Some(profile.role),
    };

    match (required, held) {
        (None, _) => Navigation::Render,
        (Some(required), Some(held)) if required == held => Navigation::Render,
        (Some(_), Some(held)) => Navigation::Redirect(home_for(held)),
        (Some(_), None) => Navigation::Redirect(HOME_PATH),
    }
}

/// Where a signed-in user on a public-only page should be sent, if anywhere.
pub fn post_login_target(state: &SessionState, path: &str) -> Option<&'static str> {
    if !state.is_ready() || state.identity().is_none() {
        return None;
    }
    let role = state.profile().role()?;
    PUBLIC_ONLY_PATHS.contains(&path).then(|| home_for(role))
}

fn replace_options() -> NavigateOptions {
    NavigateOptions { replace: true, ..NavigateOptions::default() }
}

/// Render `children` only for a signed-in user holding `role` (any role when
/// omitted).
#[component]
pub fn RouteGuard(#[prop(optional)] role: Option<Role>, children: ChildrenFn) -> impl IntoView {
    let session = expect_context::<RwSignal<SessionState>>();
    let navigate = use_navigate();

    let decision = Memo::new(move |_| session.with(|state| guard_decision(state, role)));

    Effect::new(move || {
        if let Navigation::Redirect(path) = decision.get() {
            navigate(path, replace_options());
        }
    });

    move || match decision.get() {
        Navigation::Render => children().into_any(),
        Navigation::Pending => view! { <div class="route-guard route-guard--pending">"Memeriksa akun..."</div> }.into_any(),
        Navigation::Redirect(_) => ().into_any(),
    }
}

/// Moves a signed-in user off `/`, `/login` and `/signup` to their home.
#[component]
pub fn PostLoginRedirector() -> impl IntoView {
    let session = expect_context::<RwSignal<SessionState>>();
    let location = use_location();
    let navigate = use_navigate();

    let target = Memo::new(move |_| {
        let path = location.pathname.get();
        session.with(|state| post_login_target(state, &path))
    });

    Effect::new(move || {
        if let Some(path) = target.get() {
            navigate(path, replace_options());
        }
    });
}
