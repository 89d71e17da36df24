// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Onboarding state machine.
//!
//! Decides which screen the user sees after launch and after sign-in. The
//! machine does no I/O: `Onboarding::handle` takes the current value and an
//! event and returns the next value plus the effects the caller must run.
//! Results of those effects come back as further events.
//!
//! ```text
//! Initializing ──Launched(no user)──────────────▶ Login
//! Initializing ──Launched(expired)──────────────▶ Login (sign out)
//! Initializing ──Launched(user)──FetchUser──┬───▶ RoleSelection
//!                                           └─FetchCabinet──▶ Dashboard
//! Login ──Authenticated──FetchUser──SaveUser──┬─▶ RoleSelection
//!                                             └─FetchCabinet──▶ Dashboard
//! RoleSelection ──MembershipCommitted───────────▶ Dashboard
//! ```
//!
//! A store failure while a decision is pending drops the decision and
//! leaves the current screen in place.

use crate::models::{Cabinet, User};
use crate::onboarding::session::SessionContext;
use crate::time_utils::is_session_expired;
use chrono::{DateTime, Utc};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Screens the UI shell can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Initializing,
    Login,
    RoleSelection,
    Dashboard,
}

/// Settled onboarding states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Initializing,
    Unauthenticated,
    AuthenticatedNoCabinet,
    AuthenticatedWithCabinet,
}

impl State {
    pub fn screen(self) -> Screen {
        match self {
            State::Initializing => Screen::Initializing,
            State::Unauthenticated => Screen::Login,
            State::AuthenticatedNoCabinet => Screen::RoleSelection,
            State::AuthenticatedWithCabinet => Screen::Dashboard,
        }
    }
}

/// A decision waiting on a store round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pending {
    /// Launch: waiting for the stored user record.
    LaunchUser { user_id: String },
    /// Post-authentication: waiting for the stored user record.
    PostAuthUser { user_id: String },
    /// Post-authentication: waiting for the user write to land.
    SaveUser { user_id: String, then: AfterSave },
    /// Waiting for the cabinet that hydrates the session.
    Cabinet { user_id: String, code: String },
}

/// Where a post-authentication decision goes once the user is saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AfterSave {
    RoleSelection,
    Hydrate { code: String },
}

/// Inputs to the machine: UI signals and effect results.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Process start. `user_id` is the auth provider's current user, if any;
    /// `last_login` is the locally stored sign-in time.
    Launched {
        user_id: Option<String>,
        last_login: Option<DateTime<Utc>>,
    },
    /// The auth provider completed a sign-in.
    Authenticated { user_id: String },
    /// The auth provider rejected a sign-in.
    AuthFailed { reason: String },
    UserFetched(Option<User>),
    UserSaved,
    CabinetFetched(Option<Cabinet>),
    /// An effect failed against the store.
    StoreFailed { reason: String },
    /// The membership protocol finished; carries the joined cabinet.
    MembershipCommitted(Cabinet),
    SignedOut,
}

/// Work the caller must perform, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchUser { user_id: String },
    SaveUser(User),
    FetchCabinet { code: String },
    /// Persist the sign-in time locally.
    RecordLogin(DateTime<Utc>),
    /// Remove the locally stored sign-in time.
    ClearLogin,
    /// Ask the auth provider to drop its session.
    SignOut,
    Notify(Notice),
}

/// Messages surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum Notice {
    AuthFailed(String),
    StoreFailed(String),
    SessionExpired,
    CabinetMissing(String),
    /// A sign-in arrived before launch settled; send launch again first.
    LaunchPending,
}

/// The onboarding machine: settled state, in-flight decision and session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Onboarding {
    state: State,
    pending: Option<Pending>,
    session: SessionContext,
}

impl Default for Onboarding {
    fn default() -> Self {
        Self::new()
    }
}

impl Onboarding {
    /// A fresh process: splash screen, nothing known yet.
    pub fn new() -> Self {
        Self {
            state: State::Initializing,
            pending: None,
            session: SessionContext::default(),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn screen(&self) -> Screen {
        self.state.screen()
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn pending(&self) -> Option<&Pending> {
        self.pending.as_ref()
    }

    /// Signed-in user, once a decision has settled on it.
    pub fn user_id(&self) -> Option<&str> {
        self.session.user_id.as_deref()
    }

    /// Apply one event.
    pub fn handle(self, event: Event, now: DateTime<Utc>) -> (Self, Vec<Effect>) {
        match event {
            Event::Launched {
                user_id,
                last_login,
            } => self.on_launched(user_id, last_login, now),
            Event::Authenticated { user_id } => self.on_authenticated(user_id, now),
            Event::AuthFailed { reason } => self.on_auth_failed(reason),
            Event::UserFetched(user) => self.on_user_fetched(user, now),
            Event::UserSaved => self.on_user_saved(),
            Event::CabinetFetched(cabinet) => self.on_cabinet_fetched(cabinet),
            Event::StoreFailed { reason } => self.on_store_failed(reason),
            Event::MembershipCommitted(cabinet) => self.on_membership_committed(cabinet),
            Event::SignedOut => self.on_signed_out(),
        }
    }

    fn on_launched(
        mut self,
        user_id: Option<String>,
        last_login: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> (Self, Vec<Effect>) {
        if self.state != State::Initializing || self.pending.is_some() {
            return (self, Vec::new());
        }

        let Some(user_id) = user_id else {
            self.state = State::Unauthenticated;
            self.session = SessionContext::default();
            return (self, Vec::new());
        };

        if is_session_expired(last_login, now) {
            self.state = State::Unauthenticated;
            self.session = SessionContext::default();
            return (
                self,
                vec![
                    Effect::SignOut,
                    Effect::ClearLogin,
                    Effect::Notify(Notice::SessionExpired),
                ],
            );
        }

        self.pending = Some(Pending::LaunchUser {
            user_id: user_id.clone(),
        });
        (self, vec![Effect::FetchUser { user_id }])
    }

    fn on_authenticated(mut self, user_id: String, now: DateTime<Utc>) -> (Self, Vec<Effect>) {
        if self.state == State::Initializing && self.pending.is_none() {
            return (self, vec![Effect::Notify(Notice::LaunchPending)]);
        }
        if self.state != State::Unauthenticated || self.pending.is_some() {
            return (self, Vec::new());
        }

        self.pending = Some(Pending::PostAuthUser {
            user_id: user_id.clone(),
        });
        (
            self,
            vec![Effect::RecordLogin(now), Effect::FetchUser { user_id }],
        )
    }

    fn on_auth_failed(mut self, reason: String) -> (Self, Vec<Effect>) {
        if self.state != State::Unauthenticated {
            return (self, Vec::new());
        }
        self.pending = None;
        (self, vec![Effect::Notify(Notice::AuthFailed(reason))])
    }

    fn on_user_fetched(mut self, user: Option<User>, now: DateTime<Utc>) -> (Self, Vec<Effect>) {
        match self.pending.take() {
            Some(Pending::LaunchUser { user_id }) => {
                match user.as_ref().and_then(User::cabinet) {
                    Some(code) => {
                        let code = code.to_string();
                        self.pending = Some(Pending::Cabinet {
                            user_id,
                            code: code.clone(),
                        });
                        (self, vec![Effect::FetchCabinet { code }])
                    }
                    None => (self.settle_without_cabinet(user_id), Vec::new()),
                }
            }
            Some(Pending::PostAuthUser { user_id }) => {
                let (record, then) = match user {
                    None => (User::new(user_id.clone(), now), AfterSave::RoleSelection),
                    Some(mut existing) => {
                        existing.last_login = now;
                        let then = match existing.cabinet() {
                            Some(code) => AfterSave::Hydrate {
                                code: code.to_string(),
                            },
                            None => AfterSave::RoleSelection,
                        };
                        (existing, then)
                    }
                };
                self.pending = Some(Pending::SaveUser { user_id, then });
                (self, vec![Effect::SaveUser(record)])
            }
            other => {
                self.pending = other;
                (self, Vec::new())
            }
        }
    }

    fn on_user_saved(mut self) -> (Self, Vec<Effect>) {
        match self.pending.take() {
            Some(Pending::SaveUser { user_id, then }) => match then {
                AfterSave::RoleSelection => (self.settle_without_cabinet(user_id), Vec::new()),
                AfterSave::Hydrate { code } => {
                    self.pending = Some(Pending::Cabinet {
                        user_id,
                        code: code.clone(),
                    });
                    (self, vec![Effect::FetchCabinet { code }])
                }
            },
            other => {
                self.pending = other;
                (self, Vec::new())
            }
        }
    }

    fn on_cabinet_fetched(mut self, cabinet: Option<Cabinet>) -> (Self, Vec<Effect>) {
        match self.pending.take() {
            Some(Pending::Cabinet { user_id, code }) => match cabinet {
                Some(cabinet) => {
                    let mut session = SessionContext::for_user(user_id);
                    session.hydrate(&cabinet);
                    self.session = session;
                    self.state = State::AuthenticatedWithCabinet;
                    (self, Vec::new())
                }
                None => (
                    self.settle_without_cabinet(user_id),
                    vec![Effect::Notify(Notice::CabinetMissing(code))],
                ),
            },
            None if self.state == State::AuthenticatedWithCabinet => {
                // Dashboard refresh of the shared identity
                if let Some(cabinet) = cabinet
                    .as_ref()
                    .filter(|c| c.code == self.session.generated_team_code)
                {
                    self.session.hydrate(cabinet);
                }
                (self, Vec::new())
            }
            other => {
                self.pending = other;
                (self, Vec::new())
            }
        }
    }

    fn on_store_failed(mut self, reason: String) -> (Self, Vec<Effect>) {
        self.pending = None;
        (self, vec![Effect::Notify(Notice::StoreFailed(reason))])
    }

    fn on_membership_committed(mut self, cabinet: Cabinet) -> (Self, Vec<Effect>) {
        if self.state != State::AuthenticatedNoCabinet || self.pending.is_some() {
            return (self, Vec::new());
        }
        self.session.hydrate(&cabinet);
        self.state = State::AuthenticatedWithCabinet;
        (self, Vec::new())
    }

    fn on_signed_out(mut self) -> (Self, Vec<Effect>) {
        self.state = State::Unauthenticated;
        self.pending = None;
        self.session = SessionContext::default();
        (self, vec![Effect::SignOut, Effect::ClearLogin])
    }

    fn settle_without_cabinet(mut self, user_id: String) -> Self {
        self.session = SessionContext::for_user(user_id);
        self.state = State::AuthenticatedNoCabinet;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cabinet::{BLUE, MAGENTA, TEAL};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 9, 30, 0).unwrap()
    }

    fn cabinet(code: &str, role: &str, primary: i64) -> Cabinet {
        Cabinet {
            code: code.to_string(),
            role: role.to_string(),
            primary_color: primary,
            secondary_color: BLUE,
            members: vec!["u1".to_string()],
        }
    }

    fn user_with_cabinet(id: &str, code: Option<&str>) -> User {
        let mut user = User::new(id, now() - Duration::days(3));
        user.cabinet_code = code.map(str::to_string);
        user.role = Some("Secretário".to_string());
        user
    }

    fn launched(user_id: Option<&str>) -> Event {
        Event::Launched {
            user_id: user_id.map(str::to_string),
            last_login: Some(now() - Duration::hours(2)),
        }
    }

    /// Drive the machine to Login.
    fn at_login() -> Onboarding {
        let (machine, _) = Onboarding::new().handle(launched(None), now());
        machine
    }

    /// Drive the machine to RoleSelection for `u1`.
    fn at_role_selection() -> Onboarding {
        let (machine, _) = Onboarding::new().handle(launched(Some("u1")), now());
        let (machine, _) = machine.handle(
            Event::UserFetched(Some(user_with_cabinet("u1", None))),
            now(),
        );
        machine
    }

    #[test]
    fn launch_without_session_goes_to_login() {
        let (machine, effects) = Onboarding::new().handle(launched(None), now());
        assert_eq!(machine.screen(), Screen::Login);
        assert!(effects.is_empty());
    }

    #[test]
    fn launch_with_expired_session_signs_out() {
        let event = Event::Launched {
            user_id: Some("u1".to_string()),
            last_login: Some(now() - Duration::hours(25)),
        };
        let (machine, effects) = Onboarding::new().handle(event, now());

        assert_eq!(machine.screen(), Screen::Login);
        assert_eq!(
            effects,
            vec![
                Effect::SignOut,
                Effect::ClearLogin,
                Effect::Notify(Notice::SessionExpired)
            ]
        );
    }

    #[test]
    fn launch_without_stored_timestamp_counts_as_expired() {
        let event = Event::Launched {
            user_id: Some("u1".to_string()),
            last_login: None,
        };
        let (machine, effects) = Onboarding::new().handle(event, now());
        assert_eq!(machine.screen(), Screen::Login);
        assert!(effects.contains(&Effect::SignOut));
    }

    #[test]
    fn launch_with_user_without_cabinet_goes_to_role_selection() {
        let (machine, effects) = Onboarding::new().handle(launched(Some("u1")), now());
        assert_eq!(machine.screen(), Screen::Initializing);
        assert_eq!(
            effects,
            vec![Effect::FetchUser {
                user_id: "u1".to_string()
            }]
        );

        let (machine, effects) = machine.handle(
            Event::UserFetched(Some(user_with_cabinet("u1", None))),
            now(),
        );
        assert_eq!(machine.screen(), Screen::RoleSelection);
        assert_eq!(machine.user_id(), Some("u1"));
        assert!(effects.is_empty());
    }

    #[test]
    fn launch_with_missing_user_record_goes_to_role_selection() {
        let (machine, _) = Onboarding::new().handle(launched(Some("u1")), now());
        let (machine, _) = machine.handle(Event::UserFetched(None), now());
        assert_eq!(machine.screen(), Screen::RoleSelection);
    }

    #[test]
    fn launch_with_cabinet_hydrates_from_cabinet_not_user() {
        let (machine, _) = Onboarding::new().handle(launched(Some("u1")), now());
        let (machine, effects) = machine.handle(
            Event::UserFetched(Some(user_with_cabinet("u1", Some("T1")))),
            now(),
        );
        assert_eq!(machine.screen(), Screen::Initializing);
        assert_eq!(
            effects,
            vec![Effect::FetchCabinet {
                code: "T1".to_string()
            }]
        );

        let (machine, effects) =
            machine.handle(Event::CabinetFetched(Some(cabinet("T1", "Mayor", 0xff0000))), now());

        assert!(effects.is_empty());
        assert_eq!(machine.screen(), Screen::Dashboard);
        assert_eq!(machine.session().role, "Mayor");
        assert_eq!(machine.session().primary_color, 0xff0000);
        assert_eq!(machine.session().generated_team_code, "T1");
    }

    #[test]
    fn launch_with_dangling_cabinet_code_goes_to_role_selection() {
        let (machine, _) = Onboarding::new().handle(launched(Some("u1")), now());
        let (machine, _) = machine.handle(
            Event::UserFetched(Some(user_with_cabinet("u1", Some("GONE")))),
            now(),
        );
        let (machine, effects) = machine.handle(Event::CabinetFetched(None), now());

        assert_eq!(machine.screen(), Screen::RoleSelection);
        assert_eq!(
            effects,
            vec![Effect::Notify(Notice::CabinetMissing("GONE".to_string()))]
        );
    }

    #[test]
    fn store_failure_at_launch_stays_on_splash() {
        let (machine, _) = Onboarding::new().handle(launched(Some("u1")), now());
        let (machine, effects) = machine.handle(
            Event::StoreFailed {
                reason: "unavailable".to_string(),
            },
            now(),
        );

        assert_eq!(machine.screen(), Screen::Initializing);
        assert!(machine.pending().is_none());
        assert_eq!(
            effects,
            vec![Effect::Notify(Notice::StoreFailed("unavailable".to_string()))]
        );

        // A late result of the abandoned read must not advance the machine.
        let (machine, _) = machine.handle(
            Event::CabinetFetched(Some(cabinet("T1", "Mayor", 0xff0000))),
            now(),
        );
        assert_eq!(machine.screen(), Screen::Initializing);
    }

    #[test]
    fn store_failure_while_hydrating_never_reaches_dashboard() {
        let (machine, _) = Onboarding::new().handle(launched(Some("u1")), now());
        let (machine, _) = machine.handle(
            Event::UserFetched(Some(user_with_cabinet("u1", Some("T1")))),
            now(),
        );
        let (machine, _) = machine.handle(
            Event::StoreFailed {
                reason: "permission denied".to_string(),
            },
            now(),
        );
        assert_eq!(machine.screen(), Screen::Initializing);
        assert!(!machine.session().has_cabinet());
    }

    #[test]
    fn first_sign_in_creates_user_then_role_selection() {
        let (machine, effects) = at_login().handle(
            Event::Authenticated {
                user_id: "u9".to_string(),
            },
            now(),
        );
        assert_eq!(
            effects,
            vec![
                Effect::RecordLogin(now()),
                Effect::FetchUser {
                    user_id: "u9".to_string()
                }
            ]
        );

        let (machine, effects) = machine.handle(Event::UserFetched(None), now());
        assert_eq!(machine.screen(), Screen::Login);
        assert_eq!(effects, vec![Effect::SaveUser(User::new("u9", now()))]);

        let (machine, effects) = machine.handle(Event::UserSaved, now());
        assert_eq!(machine.screen(), Screen::RoleSelection);
        assert_eq!(machine.user_id(), Some("u9"));
        assert!(effects.is_empty());
    }

    #[test]
    fn returning_sign_in_updates_last_login_and_hydrates() {
        let (machine, _) = at_login().handle(
            Event::Authenticated {
                user_id: "u1".to_string(),
            },
            now(),
        );
        let stored = user_with_cabinet("u1", Some("T1"));
        let (machine, effects) = machine.handle(Event::UserFetched(Some(stored.clone())), now());

        let mut expected = stored;
        expected.last_login = now();
        assert_eq!(effects, vec![Effect::SaveUser(expected)]);

        let (machine, effects) = machine.handle(Event::UserSaved, now());
        assert_eq!(
            effects,
            vec![Effect::FetchCabinet {
                code: "T1".to_string()
            }]
        );

        let (machine, _) =
            machine.handle(Event::CabinetFetched(Some(cabinet("T1", "Prefeito", TEAL))), now());
        assert_eq!(machine.screen(), Screen::Dashboard);
        assert_eq!(machine.session().role, "Prefeito");
    }

    #[test]
    fn failed_user_write_after_sign_in_stays_on_login() {
        let (machine, _) = at_login().handle(
            Event::Authenticated {
                user_id: "u1".to_string(),
            },
            now(),
        );
        let (machine, _) = machine.handle(Event::UserFetched(None), now());
        let (machine, _) = machine.handle(
            Event::StoreFailed {
                reason: "write rejected".to_string(),
            },
            now(),
        );
        assert_eq!(machine.screen(), Screen::Login);
        assert!(machine.user_id().is_none());
    }

    #[test]
    fn auth_failure_keeps_login_screen() {
        let (machine, effects) = at_login().handle(
            Event::AuthFailed {
                reason: "wrong password".to_string(),
            },
            now(),
        );
        assert_eq!(machine.screen(), Screen::Login);
        assert_eq!(
            effects,
            vec![Effect::Notify(Notice::AuthFailed(
                "wrong password".to_string()
            ))]
        );
    }

    #[test]
    fn membership_moves_role_selection_to_dashboard() {
        let (machine, _) = at_role_selection().handle(
            Event::MembershipCommitted(cabinet("ABC123", "Vereador", MAGENTA)),
            now(),
        );
        assert_eq!(machine.screen(), Screen::Dashboard);
        assert_eq!(machine.session().generated_team_code, "ABC123");
        assert_eq!(machine.session().primary_color, MAGENTA);
        assert_eq!(machine.user_id(), Some("u1"));
    }

    #[test]
    fn membership_is_ignored_outside_role_selection() {
        let (machine, effects) = at_login().handle(
            Event::MembershipCommitted(cabinet("ABC123", "Vereador", TEAL)),
            now(),
        );
        assert_eq!(machine.screen(), Screen::Login);
        assert!(effects.is_empty());
    }

    #[test]
    fn terminal_screens_ignore_relaunch() {
        let machine = at_role_selection();
        let (machine, effects) = machine.handle(launched(Some("u1")), now());
        assert_eq!(machine.screen(), Screen::RoleSelection);
        assert!(effects.is_empty());
    }

    #[test]
    fn dashboard_refresh_rehydrates_identity() {
        let (machine, _) = at_role_selection().handle(
            Event::MembershipCommitted(cabinet("T1", "Vereador", TEAL)),
            now(),
        );
        let (machine, _) =
            machine.handle(Event::CabinetFetched(Some(cabinet("T1", "Senador", BLUE))), now());
        assert_eq!(machine.session().role, "Senador");
        assert_eq!(machine.session().primary_color, BLUE);

        // A different cabinet never overwrites the session
        let (machine, _) =
            machine.handle(Event::CabinetFetched(Some(cabinet("T2", "Outros", TEAL))), now());
        assert_eq!(machine.session().generated_team_code, "T1");
    }

    #[test]
    fn sign_out_clears_session() {
        let (machine, _) = at_role_selection().handle(
            Event::MembershipCommitted(cabinet("T1", "Vereador", TEAL)),
            now(),
        );
        let (machine, effects) = machine.handle(Event::SignedOut, now());
        assert_eq!(machine.screen(), Screen::Login);
        assert_eq!(machine.session(), &SessionContext::default());
        assert_eq!(effects, vec![Effect::SignOut, Effect::ClearLogin]);
    }

    #[test]
    fn sign_in_before_launch_settles_asks_for_launch() {
        let (machine, effects) = Onboarding::new().handle(
            Event::Authenticated {
                user_id: "u1".to_string(),
            },
            now(),
        );
        assert_eq!(machine.screen(), Screen::Initializing);
        assert!(machine.pending().is_none());
        assert_eq!(effects, vec![Effect::Notify(Notice::LaunchPending)]);
    }
}
