//! Runs onboarding effects against the store and the login marker.

use crate::db::SharedStore;
use crate::error::{AppError, Result};
use crate::onboarding::machine::{Effect, Event, Notice, Onboarding, State};
use crate::services::login_marker::LoginMarker;
use crate::services::membership::{MembershipService, RoleSelection};
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Arc;

/// Upper bound on events fed back from effects for one UI signal. The
/// longest chain (sign-in of a cabinet member) takes four.
const MAX_EVENTS_PER_SIGNAL: usize = 16;

/// Result of feeding one UI signal through the machine.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub machine: Onboarding,
    pub notices: Vec<Notice>,
    /// The auth provider session must be dropped.
    pub sign_out: bool,
}

/// Executes the machine's effects, one at a time, in the order emitted.
#[derive(Clone)]
pub struct OnboardingDriver {
    store: SharedStore,
    marker: Arc<dyn LoginMarker>,
    membership: MembershipService,
}

impl OnboardingDriver {
    pub fn new(store: SharedStore, marker: Arc<dyn LoginMarker>) -> Self {
        Self {
            membership: MembershipService::new(store.clone()),
            store,
            marker,
        }
    }

    /// Decide the first screen for a process whose auth provider reports
    /// `user_id` as the current user.
    pub async fn launch(&self, machine: Onboarding, user_id: Option<String>) -> Outcome {
        let last_login = match self.marker.last_login().await {
            Ok(at) => at,
            Err(e) => {
                tracing::warn!(error = %e, "Login marker unreadable, treating as missing");
                None
            }
        };

        self.dispatch(
            machine,
            Event::Launched {
                user_id,
                last_login,
            },
        )
        .await
    }

    pub async fn authenticated(&self, machine: Onboarding, user_id: String) -> Outcome {
        self.dispatch(machine, Event::Authenticated { user_id }).await
    }

    pub async fn auth_failed(&self, machine: Onboarding, reason: String) -> Outcome {
        self.dispatch(machine, Event::AuthFailed { reason }).await
    }

    pub async fn sign_out(&self, machine: Onboarding) -> Outcome {
        self.dispatch(machine, Event::SignedOut).await
    }

    /// Create or join a cabinet from the role-selection screen.
    ///
    /// Protocol errors are returned as-is and leave `machine` untouched; the
    /// caller keeps its current value.
    pub async fn submit_role_selection(
        &self,
        machine: Onboarding,
        selection: &RoleSelection,
    ) -> Result<Outcome> {
        if machine.state() != State::AuthenticatedNoCabinet || machine.pending().is_some() {
            return Err(AppError::Conflict(format!(
                "role selection is not open on the {:?} screen",
                machine.screen()
            )));
        }
        let Some(user_id) = machine.user_id().map(str::to_string) else {
            return Err(AppError::Unauthorized);
        };

        let cabinet = match self.membership.commit(&user_id, selection, Utc::now()).await {
            Ok(cabinet) => cabinet,
            Err(e) => {
                if e.is_store_failure() {
                    tracing::warn!(
                        user_id = %user_id,
                        error = %e,
                        "Membership not committed, role selection stays open"
                    );
                }
                return Err(e);
            }
        };

        Ok(self
            .dispatch(machine, Event::MembershipCommitted(cabinet))
            .await)
    }

    /// Feed `event` and every follow-up event its effects produce.
    ///
    /// A failed store effect becomes `StoreFailed` and the rest of that
    /// batch is skipped.
    pub async fn dispatch(&self, mut machine: Onboarding, event: Event) -> Outcome {
        let mut notices = Vec::new();
        let mut sign_out = false;
        let mut queue = VecDeque::from([event]);
        let mut handled = 0;

        while let Some(event) = queue.pop_front() {
            handled += 1;
            if handled > MAX_EVENTS_PER_SIGNAL {
                tracing::error!(
                    screen = ?machine.screen(),
                    "Onboarding did not settle, dropping remaining events"
                );
                break;
            }

            let (next, effects) = machine.handle(event, Utc::now());
            machine = next;

            for effect in effects {
                match self.run(effect, &mut notices, &mut sign_out).await {
                    Some(follow_up @ Event::StoreFailed { .. }) => {
                        queue.push_back(follow_up);
                        break;
                    }
                    Some(follow_up) => queue.push_back(follow_up),
                    None => {}
                }
            }
        }

        tracing::debug!(
            screen = ?machine.screen(),
            user_id = machine.user_id().unwrap_or("-"),
            notices = notices.len(),
            "Onboarding settled"
        );

        Outcome {
            machine,
            notices,
            sign_out,
        }
    }

    async fn run(
        &self,
        effect: Effect,
        notices: &mut Vec<Notice>,
        sign_out: &mut bool,
    ) -> Option<Event> {
        match effect {
            Effect::FetchUser { user_id } => Some(match self.store.get_user(&user_id).await {
                Ok(user) => Event::UserFetched(user),
                Err(e) => store_failed("user lookup", e),
            }),
            Effect::SaveUser(user) => Some(match self.store.set_user(&user).await {
                Ok(()) => Event::UserSaved,
                Err(e) => store_failed("user write", e),
            }),
            Effect::FetchCabinet { code } => Some(match self.store.get_cabinet(&code).await {
                Ok(cabinet) => Event::CabinetFetched(cabinet),
                Err(e) => store_failed("cabinet lookup", e),
            }),
            Effect::RecordLogin(at) => {
                if let Err(e) = self.marker.record(at).await {
                    tracing::warn!(error = %e, "Failed to record login time");
                }
                None
            }
            Effect::ClearLogin => {
                if let Err(e) = self.marker.clear().await {
                    tracing::warn!(error = %e, "Failed to clear login time");
                }
                None
            }
            Effect::SignOut => {
                *sign_out = true;
                None
            }
            Effect::Notify(notice) => {
                notices.push(notice);
                None
            }
        }
    }
}

fn store_failed(op: &str, e: AppError) -> Event {
    tracing::warn!(op, error = %e, "Store operation failed during onboarding");
    Event::StoreFailed {
        reason: e.to_string(),
    }
}
