//! Account sign-in against the Firebase Auth REST API

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{Error, Result};

const IDENTITY_BASE: &str = "https://identitytoolkit.googleapis.com/v1";

/// Filename for the persisted session inside the data directory
const SESSION_FILENAME: &str = "session.json";

/// A signed-in account
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct AuthSession {
    /// Stable account id, used as the document-store namespace
    pub uid: String,
    /// Bearer token for document-store calls
    pub id_token: String,
    pub email: String,
}

#[derive(serde::Serialize)]
struct CredentialsRequest<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(rename = "returnSecureToken")]
    return_secure_token: bool,
}

#[derive(serde::Deserialize)]
struct CredentialsResponse {
    #[serde(rename = "localId")]
    local_id: String,
    #[serde(rename = "idToken")]
    id_token: String,
    email: String,
}

#[derive(serde::Deserialize)]
struct AuthErrorResponse {
    error: AuthErrorBody,
}

#[derive(serde::Deserialize)]
struct AuthErrorBody {
    message: String,
}

/// Signs accounts in and out, persisting the session between runs
pub struct AuthClient {
    client: reqwest::Client,
    api_key: String,
    data_dir: PathBuf,
}

impl AuthClient {
    /// Create an auth client persisting sessions under `data_dir`
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or the HTTP client
    /// cannot be built
    pub fn new(api_key: String, data_dir: &Path, timeout: Duration) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("Firebase API key required".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            data_dir: data_dir.to_path_buf(),
        })
    }

    /// Create a new account and persist the session
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] on rejected credentials or network failure
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession> {
        let session = self.credentials_call("accounts:signUp", email, password).await?;
        self.persist(&session)?;
        tracing::info!(email = %session.email, "account created");
        Ok(session)
    }

    /// Sign in to an existing account and persist the session
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] on rejected credentials or network failure
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        let session = self
            .credentials_call("accounts:signInWithPassword", email, password)
            .await?;
        self.persist(&session)?;
        tracing::info!(email = %session.email, "signed in");
        Ok(session)
    }

    /// Drop the persisted session, if any
    ///
    /// # Errors
    ///
    /// Returns error if the session file cannot be removed
    pub fn sign_out(&self) -> Result<()> {
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(&path)?;
            tracing::info!("signed out");
        }
        Ok(())
    }

    /// Load the persisted session from a previous run
    ///
    /// # Errors
    ///
    /// Returns error if the session file exists but cannot be parsed
    pub fn current_session(&self) -> Result<Option<AuthSession>> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&path)?;
        let session = serde_json::from_str(&raw)?;
        Ok(Some(session))
    }

    async fn credentials_call(
        &self,
        endpoint: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession> {
        let url = format!("{IDENTITY_BASE}/{endpoint}?key={}", self.api_key);
        let request = CredentialsRequest {
            email,
            password,
            return_secure_token: true,
        };

        let response = self.client.post(&url).json(&request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<AuthErrorResponse>(&body)
                .map_or(body, |e| e.error.message);
            tracing::error!(status = %status, message = %message, "auth request rejected");
            return Err(Error::Auth(message));
        }

        let result: CredentialsResponse = response.json().await?;
        Ok(AuthSession {
            uid: result.local_id,
            id_token: result.id_token,
            email: result.email,
        })
    }

    fn persist(&self, session: &AuthSession) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        let path = self.session_path();
        std::fs::write(&path, serde_json::to_string_pretty(session)?)?;
        Ok(())
    }

    fn session_path(&self) -> PathBuf {
        self.data_dir.join(SESSION_FILENAME)
    }
}
