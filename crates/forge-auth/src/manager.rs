use std::sync::Arc;

use forge_api::{HttpBackend, LoginRequest, SignupRequest};
use forge_db::Store;
use parking_lot::Mutex;

use crate::error::Error;
use crate::identity::Session;
use crate::redirect::{Location, RedirectPayload, take_redirect_payload};
use crate::store::CredentialStore;

/// How [`SessionStore::rehydrate`] arrived at the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RehydrateOutcome {
    /// Signed in from a one-time redirect payload.
    Redirect,
    /// Restored from durable storage.
    Persisted,
    /// The redirect reported a failure; any persisted session still applies.
    RedirectFailed(String),
    Anonymous,
}

/// Owns the signed-in session and its durable copy.
///
/// The session is handed to callers explicitly ([`SessionStore::current`]);
/// nothing else reads the durable copy.
pub struct SessionStore {
    credentials: CredentialStore,
    current: Option<Session>,
}

impl SessionStore {
    pub fn new(service_name: impl Into<String>, store: Arc<Mutex<Store>>) -> Self {
        Self {
            credentials: CredentialStore::new(service_name, store),
            current: None,
        }
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    /// The credential attached to outgoing AI requests.
    pub fn bearer(&self) -> Option<&str> {
        self.current.as_ref().map(Session::bearer)
    }

    pub fn login(&mut self, session: Session) -> Result<&Session, Error> {
        self.credentials.save(&session)?;
        tracing::info!(user = %session.identity.email, "signed in");
        Ok(self.current.insert(session))
    }

    pub fn logout(&mut self) -> Result<(), Error> {
        self.credentials.clear()?;
        if let Some(previous) = self.current.take() {
            tracing::info!(user = %previous.identity.email, "signed out");
        }
        Ok(())
    }

    /// Restore the session at startup.
    ///
    /// A redirect payload on `location` wins over durable storage and is
    /// stripped from the location before anything else happens, so calling
    /// this again with the same location falls through to durable storage.
    pub fn rehydrate(&mut self, location: &dyn Location) -> Result<RehydrateOutcome, Error> {
        match take_redirect_payload(location) {
            Ok(Some(RedirectPayload::Session(session))) => {
                self.login(session)?;
                return Ok(RehydrateOutcome::Redirect);
            }
            Ok(Some(RedirectPayload::Rejected(reason))) => {
                tracing::warn!(%reason, "redirect sign-in was rejected");
                self.restore_persisted()?;
                return Ok(RehydrateOutcome::RedirectFailed(reason));
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(error = %err, "discarding malformed redirect payload");
                self.restore_persisted()?;
                return Ok(RehydrateOutcome::RedirectFailed(err.to_string()));
            }
        }

        if self.restore_persisted()? {
            Ok(RehydrateOutcome::Persisted)
        } else {
            Ok(RehydrateOutcome::Anonymous)
        }
    }

    pub async fn login_with_password(
        &mut self,
        backend: &HttpBackend,
        email: &str,
        password: &str,
    ) -> Result<&Session, Error> {
        let user = backend
            .login(&LoginRequest {
                email: email.trim().to_string(),
                password: password.to_string(),
            })
            .await?;
        self.login(user.into())
    }

    pub async fn signup(
        &mut self,
        backend: &HttpBackend,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<&Session, Error> {
        let user = backend
            .signup(&SignupRequest {
                name: name.trim().to_string(),
                email: email.trim().to_string(),
                password: password.to_string(),
            })
            .await?;
        self.login(user.into())
    }

    fn restore_persisted(&mut self) -> Result<bool, Error> {
        if self.current.is_some() {
            return Ok(true);
        }

        match self.credentials.load() {
            Ok(Some(session)) => {
                tracing::debug!(user = %session.identity.email, "restored persisted session");
                self.current = Some(session);
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(err @ (Error::SessionParse(_) | Error::Keyring(_) | Error::Other(_))) => {
                tracing::warn!(error = %err, "dropping unreadable persisted session");
                self.credentials.clear()?;
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}
