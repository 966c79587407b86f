//! Session gate: auth events drive local purges and pending-profile flushes.
//!
//! The gate starts in `Loading` and is re-entered on every auth event. Entering
//! `Authenticated` publishes the session to the remote adapter and tries to
//! deliver the pending profile. Leaving a session wipes the device copy.

use crate::auth::{AuthProvider, AuthSession, SignUpOutcome};
use crate::db::KeyValueStore;
use crate::error::Result;
use crate::models::{validate_credentials, SignUpForm};
use crate::remote::{CurrentSession, RemoteStore};
use crate::storage::LocalStore;
use crate::util::unix_timestamp_now;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Loading,
    Authenticated(AuthSession),
    Unauthenticated,
}

impl SessionState {
    #[must_use]
    pub const fn session(&self) -> Option<&AuthSession> {
        match self {
            Self::Authenticated(session) => Some(session),
            Self::Loading | Self::Unauthenticated => None,
        }
    }
}

/// Discrete auth notifications fed to the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// Startup lookup of a persisted session
    Restored(Option<AuthSession>),
    SignedIn(AuthSession),
    TokenRefreshed(AuthSession),
    SignedOut,
    Expired,
}

/// What happened to the pending profile on sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushOutcome {
    Flushed,
    NoPending,
    /// Pending record belongs to another email; kept as is
    EmailMismatch,
    /// Remote upsert failed; kept for the next session
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpReport {
    SignedIn(FlushOutcome),
    ConfirmationRequired,
}

#[derive(Debug, Default)]
pub struct SessionGate {
    state: SessionState,
    current: CurrentSession,
}

impl SessionGate {
    pub fn new(current: CurrentSession) -> Self {
        Self {
            state: SessionState::Loading,
            current,
        }
    }

    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    pub const fn current(&self) -> &CurrentSession {
        &self.current
    }

    pub const fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated(_))
    }

    /// Apply one auth event.
    ///
    /// Returns the pending-profile outcome when the event signs a user in.
    pub async fn handle<K, R>(
        &mut self,
        event: AuthEvent,
        local: &LocalStore<K>,
        remote: &R,
    ) -> Result<Option<FlushOutcome>>
    where
        K: KeyValueStore,
        R: RemoteStore,
    {
        match event {
            AuthEvent::Restored(Some(session))
            | AuthEvent::SignedIn(session)
            | AuthEvent::TokenRefreshed(session) => {
                // State and published session move together, even if the flush fails
                self.current.set(session.clone());
                self.state = SessionState::Authenticated(session.clone());
                let outcome = flush_pending_profile(&session, local, remote).await?;
                Ok(Some(outcome))
            }
            AuthEvent::Restored(None) => {
                // A confirmation-pending sign-up must survive until the first login
                self.enter_unauthenticated(local, false).await?;
                Ok(None)
            }
            AuthEvent::SignedOut | AuthEvent::Expired => {
                self.enter_unauthenticated(local, true).await?;
                Ok(None)
            }
        }
    }

    async fn enter_unauthenticated<K: KeyValueStore>(
        &mut self,
        local: &LocalStore<K>,
        purge_pending: bool,
    ) -> Result<()> {
        self.current.clear();
        local.reset_all().await?;
        if purge_pending {
            local.clear_pending_profile().await?;
        }
        self.state = SessionState::Unauthenticated;
        tracing::debug!("Session ended, local data purged");
        Ok(())
    }

    /// Persist the pending profile, create the account and feed the gate.
    pub async fn sign_up<A, K, R>(
        &mut self,
        auth: &A,
        form: SignUpForm,
        local: &LocalStore<K>,
        remote: &R,
    ) -> Result<SignUpReport>
    where
        A: AuthProvider,
        K: KeyValueStore,
        R: RemoteStore,
    {
        let created_at = unix_timestamp_now().saturating_mul(1000);
        let (profile, password) = form.into_pending_profile(created_at)?;
        local.save_pending_profile(&profile).await?;

        match auth.sign_up(&profile.email, &password).await? {
            SignUpOutcome::SignedIn(session) => {
                let outcome = self
                    .handle(AuthEvent::SignedIn(session), local, remote)
                    .await?
                    .unwrap_or(FlushOutcome::NoPending);
                Ok(SignUpReport::SignedIn(outcome))
            }
            SignUpOutcome::ConfirmationRequired => {
                tracing::info!("Account created for {}, email confirmation pending", profile.email);
                Ok(SignUpReport::ConfirmationRequired)
            }
        }
    }

    pub async fn sign_in<A, K, R>(
        &mut self,
        auth: &A,
        email: &str,
        password: &str,
        local: &LocalStore<K>,
        remote: &R,
    ) -> Result<FlushOutcome>
    where
        A: AuthProvider,
        K: KeyValueStore,
        R: RemoteStore,
    {
        validate_credentials(email, password)?;
        let session = auth.sign_in(email.trim(), password).await?;
        Ok(self
            .handle(AuthEvent::SignedIn(session), local, remote)
            .await?
            .unwrap_or(FlushOutcome::NoPending))
    }

    /// Revoke the session remotely, then purge the device.
    ///
    /// A failed revocation still signs the device out.
    pub async fn sign_out<A, K, R>(
        &mut self,
        auth: &A,
        local: &LocalStore<K>,
        remote: &R,
    ) -> Result<()>
    where
        A: AuthProvider,
        K: KeyValueStore,
        R: RemoteStore,
    {
        if let Some(session) = self.current.get() {
            if let Err(error) = auth.sign_out(&session.access_token).await {
                tracing::warn!("Remote sign-out failed, clearing local session anyway: {}", error);
            }
        }
        self.handle(AuthEvent::SignedOut, local, remote).await?;
        Ok(())
    }

    /// Load the persisted session and feed it to the gate.
    pub async fn restore<A, K, R>(
        &mut self,
        auth: &A,
        local: &LocalStore<K>,
        remote: &R,
    ) -> Result<Option<FlushOutcome>>
    where
        A: AuthProvider,
        K: KeyValueStore,
        R: RemoteStore,
    {
        let session = auth.restore_session().await?;
        self.handle(AuthEvent::Restored(session), local, remote).await
    }
}

/// Deliver the pending profile when it belongs to the signed-in email.
pub async fn flush_pending_profile<K, R>(
    session: &AuthSession,
    local: &LocalStore<K>,
    remote: &R,
) -> Result<FlushOutcome>
where
    K: KeyValueStore,
    R: RemoteStore,
{
    let Some(profile) = local.load_pending_profile().await? else {
        tracing::debug!("No pending profile to flush");
        return Ok(FlushOutcome::NoPending);
    };

    if !profile.matches_email(session.email()) {
        tracing::debug!("Pending profile belongs to another account, keeping it");
        return Ok(FlushOutcome::EmailMismatch);
    }

    match remote.upsert_profile(&session.user, &profile).await {
        Ok(()) => {
            local.clear_pending_profile().await?;
            tracing::info!("Pending profile saved for {}", profile.email);
            Ok(FlushOutcome::Flushed)
        }
        Err(error) => {
            tracing::warn!("Profile upsert failed, will retry next session: {}", error);
            Ok(FlushOutcome::Failed(error.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::auth::{
        AuthError, AuthResult, AuthUser, MemorySessionPersistence, SessionPersistence,
        SupabaseAuthClient,
    };
    use crate::db::MemoryKeyValueStore;
    use crate::storage::KEY_PENDING_PROFILE;
    use crate::models::{PendingProfile, Settings, WorkoutMap};
    use crate::remote::{MemoryRemoteStore, RemoteCall};
    use pretty_assertions::assert_eq;

    fn session(email: &str) -> AuthSession {
        AuthSession {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: i64::MAX,
            user: AuthUser {
                id: "user-1".to_string(),
                email: Some(email.to_string()),
            },
        }
    }

    fn pending(email: &str) -> PendingProfile {
        PendingProfile {
            email: email.to_string(),
            first_name: "Giulia".to_string(),
            last_name: "Rossi".to_string(),
            birth_date: "1994-03-12".to_string(),
            nationality: "Italian".to_string(),
            created_at: 1,
        }
    }

    fn form(email: &str) -> SignUpForm {
        SignUpForm {
            email: email.to_string(),
            password: "secret1".to_string(),
            first_name: "Giulia".to_string(),
            last_name: "Rossi".to_string(),
            birth_date: "1994-03-12".to_string(),
            nationality: "Italian".to_string(),
        }
    }

    fn fixture() -> (SessionGate, LocalStore<MemoryKeyValueStore>, MemoryRemoteStore) {
        let current = CurrentSession::new();
        let remote = MemoryRemoteStore::new(current.clone());
        (
            SessionGate::new(current),
            LocalStore::new(MemoryKeyValueStore::new()),
            remote,
        )
    }

    #[derive(Clone, Default)]
    struct StubAuth {
        confirm_email: bool,
        signed_out: Arc<Mutex<bool>>,
    }

    impl AuthProvider for StubAuth {
        async fn sign_up(&self, email: &str, _password: &str) -> AuthResult<SignUpOutcome> {
            if self.confirm_email {
                Ok(SignUpOutcome::ConfirmationRequired)
            } else {
                Ok(SignUpOutcome::SignedIn(session(email)))
            }
        }

        async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
            if password == "wrong-password" {
                return Err(AuthError::Api("Invalid login credentials".to_string()));
            }
            Ok(session(email))
        }

        async fn sign_out(&self, _access_token: &str) -> AuthResult<()> {
            *self.signed_out.lock().unwrap() = true;
            Ok(())
        }

        async fn restore_session(&self) -> AuthResult<Option<AuthSession>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn sign_out_purges_local_data() {
        let (mut gate, local, remote) = fixture();
        gate.handle(AuthEvent::SignedIn(session("a@x.com")), &local, &remote)
            .await
            .unwrap();
        local.save(&Settings::default()).await.unwrap();
        let mut workouts = WorkoutMap::new();
        workouts.set(1, "Bench");
        local.save_workouts(&workouts).await.unwrap();
        local.save_pending_profile(&pending("b@x.com")).await.unwrap();

        let auth = StubAuth::default();
        gate.sign_out(&auth, &local, &remote).await.unwrap();

        assert_eq!(gate.state(), &SessionState::Unauthenticated);
        assert!(*auth.signed_out.lock().unwrap());
        assert_eq!(local.load().await.unwrap(), None);
        assert!(!local.load_workouts().await.unwrap().has_content());
        assert_eq!(local.load_pending_profile().await.unwrap(), None);
        assert!(gate.current().get().is_none());
    }

    #[tokio::test]
    async fn restore_without_session_keeps_pending_profile() {
        let (mut gate, local, remote) = fixture();
        local.save_pending_profile(&pending("a@x.com")).await.unwrap();
        local.save(&Settings::default()).await.unwrap();

        let outcome = gate
            .restore(&StubAuth::default(), &local, &remote)
            .await
            .unwrap();
        assert_eq!(outcome, None);
        assert_eq!(gate.state(), &SessionState::Unauthenticated);
        assert_eq!(local.load().await.unwrap(), None);
        assert!(local.load_pending_profile().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn matching_pending_profile_is_flushed_once() {
        let (mut gate, local, remote) = fixture();
        local.save_pending_profile(&pending("A@X.com")).await.unwrap();

        let outcome = gate
            .handle(AuthEvent::SignedIn(session("a@x.com")), &local, &remote)
            .await
            .unwrap();
        assert_eq!(outcome, Some(FlushOutcome::Flushed));
        assert_eq!(local.load_pending_profile().await.unwrap(), None);
        assert_eq!(remote.profile_for("user-1"), Some(pending("A@X.com")));

        let again = gate
            .handle(AuthEvent::TokenRefreshed(session("a@x.com")), &local, &remote)
            .await
            .unwrap();
        assert_eq!(again, Some(FlushOutcome::NoPending));
    }

    #[tokio::test]
    async fn mismatched_pending_profile_is_retained() {
        let (mut gate, local, remote) = fixture();
        local.save_pending_profile(&pending("other@x.com")).await.unwrap();

        let outcome = gate
            .handle(AuthEvent::SignedIn(session("a@x.com")), &local, &remote)
            .await
            .unwrap();
        assert_eq!(outcome, Some(FlushOutcome::EmailMismatch));
        assert!(local.load_pending_profile().await.unwrap().is_some());
        assert_eq!(remote.writes(), Vec::<RemoteCall>::new());
    }

    #[tokio::test]
    async fn failed_upsert_keeps_pending_profile() {
        let (mut gate, local, remote) = fixture();
        local.save_pending_profile(&pending("a@x.com")).await.unwrap();
        remote.fail_with(Some("503"));

        let outcome = gate
            .handle(AuthEvent::SignedIn(session("a@x.com")), &local, &remote)
            .await
            .unwrap();
        assert!(matches!(outcome, Some(FlushOutcome::Failed(_))));
        assert!(gate.is_authenticated());
        assert!(local.load_pending_profile().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn sign_up_with_immediate_session_flushes_profile() {
        let (mut gate, local, remote) = fixture();
        let report = gate
            .sign_up(&StubAuth::default(), form("a@x.com"), &local, &remote)
            .await
            .unwrap();
        assert_eq!(report, SignUpReport::SignedIn(FlushOutcome::Flushed));
        assert_eq!(remote.profile_for("user-1").unwrap().first_name, "Giulia");
    }

    #[tokio::test]
    async fn sign_up_requiring_confirmation_stores_pending_profile() {
        let (mut gate, local, remote) = fixture();
        let auth = StubAuth {
            confirm_email: true,
            ..StubAuth::default()
        };
        let report = gate
            .sign_up(&auth, form("a@x.com"), &local, &remote)
            .await
            .unwrap();
        assert_eq!(report, SignUpReport::ConfirmationRequired);
        assert_eq!(gate.state(), &SessionState::Loading);
        let stored = local.load_pending_profile().await.unwrap().unwrap();
        assert_eq!(stored.email, "a@x.com");
    }

    #[tokio::test]
    async fn invalid_sign_up_stores_nothing() {
        let (mut gate, local, remote) = fixture();
        let mut bad = form("a@x.com");
        bad.password = "123".to_string();
        assert!(gate
            .sign_up(&StubAuth::default(), bad, &local, &remote)
            .await
            .is_err());
        assert_eq!(local.load_pending_profile().await.unwrap(), None);
    }

    #[tokio::test]
    async fn sign_in_rejects_bad_credentials() {
        let (mut gate, local, remote) = fixture();
        let auth = StubAuth::default();
        assert!(gate
            .sign_in(&auth, "no-at-sign", "secret1", &local, &remote)
            .await
            .is_err());
        assert!(gate
            .sign_in(&auth, "a@x.com", "wrong-password", &local, &remote)
            .await
            .is_err());
        assert_eq!(gate.state(), &SessionState::Loading);

        gate.sign_in(&auth, "a@x.com", "secret1", &local, &remote)
            .await
            .unwrap();
        assert!(gate.is_authenticated());
        assert_eq!(remote.session().require().unwrap().user.id, "user-1");
    }

    #[tokio::test]
    async fn offline_restore_of_expired_session_keeps_local_plan() {
        let (mut gate, local, remote) = fixture();
        local.save(&Settings::default()).await.unwrap();
        let mut workouts = WorkoutMap::new();
        workouts.set(2, "Squat 5x5");
        local.save_workouts(&workouts).await.unwrap();

        let persistence = MemorySessionPersistence::default();
        let mut expired = session("a@x.com");
        expired.expires_at = 0;
        persistence.save_session(&expired).unwrap();
        // Nothing listens on the discard port
        let auth =
            SupabaseAuthClient::new("http://127.0.0.1:9", "anon", persistence.clone()).unwrap();

        gate.restore(&auth, &local, &remote).await.unwrap();

        assert!(gate.is_authenticated());
        assert_eq!(local.load().await.unwrap(), Some(Settings::default()));
        assert_eq!(local.load_workouts().await.unwrap().get(2), "Squat 5x5");
        assert_eq!(persistence.load_session().unwrap(), Some(expired));
        assert_eq!(gate.current().get().map(|s| s.expires_at), Some(0));
    }

    #[tokio::test]
    async fn rejected_refresh_token_purges_local_plan() {
        use httpmock::prelude::*;

        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/auth/v1/token");
            then.status(400).json_body(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "Invalid Refresh Token: Already Used"
            }));
        });

        let (mut gate, local, remote) = fixture();
        local.save(&Settings::default()).await.unwrap();
        let persistence = MemorySessionPersistence::default();
        let mut expired = session("a@x.com");
        expired.expires_at = 0;
        persistence.save_session(&expired).unwrap();
        let auth =
            SupabaseAuthClient::new(server.base_url(), "anon", persistence.clone()).unwrap();

        gate.restore(&auth, &local, &remote).await.unwrap();

        assert_eq!(gate.state(), &SessionState::Unauthenticated);
        assert_eq!(local.load().await.unwrap(), None);
        assert!(persistence.load_session().unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_flush_leaves_gate_consistent() {
        let (mut gate, local, remote) = fixture();
        local.save_pending_profile(&pending("a@x.com")).await.unwrap();
        local.kv().fail_writes(Some(KEY_PENDING_PROFILE));

        let result = gate
            .handle(AuthEvent::SignedIn(session("a@x.com")), &local, &remote)
            .await;

        assert!(result.is_err());
        assert!(gate.is_authenticated());
        assert_eq!(
            gate.current().get().map(|s| s.user.id),
            gate.state().session().map(|s| s.user.id.clone())
        );
    }
}
