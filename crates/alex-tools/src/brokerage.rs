//! TastyTrade brokerage client (§4.8), grounded directly on
//! `tastytrade_client.py`: sandbox/live URL toggle, session token cached on
//! disk with `0o600` permissions and reused while a probe GET succeeds, no
//! interactive 2FA handshake.

use alex_domain::{Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

const SANDBOX_API_URL: &str = "https://api.cert.tastyworks.com";
const PRODUCTION_API_URL: &str = "https://api.tastyworks.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedSession {
    session_token: String,
    remember_token: Option<String>,
    user_id: String,
    email: String,
    is_sandbox: bool,
}

impl CachedSession {
    fn api_url(&self) -> &'static str {
        if self.is_sandbox {
            SANDBOX_API_URL
        } else {
            PRODUCTION_API_URL
        }
    }
}

#[derive(Debug, Clone)]
pub struct BrokerageCredentials {
    pub use_sandbox: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    pub sandbox_username: Option<String>,
    pub sandbox_password: Option<String>,
    pub remember_token: Option<String>,
}

pub struct BrokerageClient {
    http: Client,
    credentials: BrokerageCredentials,
    cache_path: PathBuf,
    session: RwLock<Option<CachedSession>>,
}

impl BrokerageClient {
    pub fn new(credentials: BrokerageCredentials) -> Self {
        let cache_path = dirs_home().join(".alex").join("tastytrade").join("session.json");
        Self {
            http: Client::builder().timeout(REQUEST_TIMEOUT).build().expect("reqwest client builds"),
            credentials,
            cache_path,
            session: RwLock::new(None),
        }
    }

    pub fn is_sandbox(&self) -> bool {
        self.credentials.use_sandbox
    }

    /// Returns a valid session, loading the cache, probing it, and logging
    /// in fresh only if the cache is absent or stale.
    pub async fn get_session(&self) -> Result<()> {
        if self.session.read().await.is_some() {
            return Ok(());
        }

        if let Some(cached) = self.load_cached_session().await {
            if self.probe(&cached).await {
                *self.session.write().await = Some(cached);
                return Ok(());
            }
        }

        let fresh = self.login().await?;
        self.save_session(&fresh).await?;
        *self.session.write().await = Some(fresh);
        Ok(())
    }

    async fn load_cached_session(&self) -> Option<CachedSession> {
        let raw = tokio::fs::read_to_string(&self.cache_path).await.ok()?;
        let cached: CachedSession = serde_json::from_str(&raw).ok()?;
        (cached.is_sandbox == self.credentials.use_sandbox).then_some(cached)
    }

    async fn probe(&self, session: &CachedSession) -> bool {
        self.http
            .get(format!("{}/customers/me", session.api_url()))
            .header("Authorization", &session.session_token)
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    /// Writes the session token atomically (temp sibling + rename), matching
    /// the file_ops write-then-rename discipline. The temp file is opened
    /// with 0o600 already set so the token is never briefly world-readable
    /// at the umask default.
    async fn save_session(&self, session: &CachedSession) -> Result<()> {
        if let Some(parent) = self.cache_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(Error::Io)?;
        }
        let body = serde_json::to_string(session).map_err(Error::Json)?;

        let tmp_name =
            format!(".{}.{}.tmp", self.cache_path.file_name().unwrap_or_default().to_string_lossy(), uuid::Uuid::new_v4().as_simple());
        let tmp_path = self.cache_path.with_file_name(tmp_name);

        let mut open_opts = tokio::fs::OpenOptions::new();
        open_opts.write(true).create(true).truncate(true);
        #[cfg(unix)]
        open_opts.mode(0o600);
        let mut file = open_opts.open(&tmp_path).await.map_err(Error::Io)?;
        file.write_all(body.as_bytes()).await.map_err(Error::Io)?;
        file.flush().await.map_err(Error::Io)?;
        file.sync_data().await.map_err(Error::Io)?;

        tokio::fs::rename(&tmp_path, &self.cache_path).await.map_err(|e| {
            let tmp = tmp_path.clone();
            tokio::spawn(async move {
                let _ = tokio::fs::remove_file(&tmp).await;
            });
            Error::Io(e)
        })?;
        Ok(())
    }

    async fn login(&self) -> Result<CachedSession> {
        let (username, password) = if self.credentials.use_sandbox {
            (self.credentials.sandbox_username.clone(), self.credentials.sandbox_password.clone())
        } else {
            (self.credentials.username.clone(), self.credentials.password.clone())
        };
        let (username, password) = match (username, password) {
            (Some(u), Some(p)) => (u, p),
            _ => {
                return Err(Error::Config(format!(
                    "TastyTrade {} credentials not configured",
                    if self.credentials.use_sandbox { "sandbox" } else { "production" }
                )));
            }
        };

        let api_url = if self.credentials.use_sandbox { SANDBOX_API_URL } else { PRODUCTION_API_URL };
        let mut payload = serde_json::json!({ "login": username, "password": password });
        if let Some(token) = &self.credentials.remember_token {
            payload["remember-token"] = Value::String(token.clone());
        }

        let response = self.http.post(format!("{api_url}/sessions")).json(&payload).send().await.map_err(|e| Error::Http(e.to_string()))?;

        match response.status().as_u16() {
            201 => {
                let body: Value = response.json().await.map_err(|e| Error::Http(e.to_string()))?;
                let data = &body["data"];
                let user = &data["user"];
                Ok(CachedSession {
                    session_token: data["session-token"].as_str().unwrap_or_default().to_string(),
                    remember_token: data["remember-token"].as_str().map(str::to_string),
                    user_id: user["id"].as_str().unwrap_or_default().to_string(),
                    email: user["email"].as_str().unwrap_or(&username).to_string(),
                    is_sandbox: self.credentials.use_sandbox,
                })
            }
            403 => {
                let body: Value = response.json().await.unwrap_or_default();
                let message = body["error"]["message"].as_str().unwrap_or_default();
                if message.to_lowercase().contains("two factor") {
                    Err(Error::Config(
                        "two-factor authentication required; log in via the TastyTrade app to generate a remember token, or set TASTY_REMEMBER_TOKEN".into(),
                    ))
                } else {
                    Err(Error::Http(format!("authentication failed: {message}")))
                }
            }
            status => Err(Error::Http(format!("authentication failed with status {status}"))),
        }
    }

    async fn authed_get(&self, path: &str) -> Result<Value> {
        self.get_session().await?;
        let session = self.session.read().await.clone().ok_or_else(|| Error::Other("no session".into()))?;
        let response = self
            .http
            .get(format!("{}{path}", session.api_url()))
            .header("Authorization", &session.session_token)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;
        response.json().await.map_err(|e| Error::Http(e.to_string()))
    }

    async fn authed_post(&self, path: &str, body: &Value) -> Result<(u16, Value)> {
        self.get_session().await?;
        let session = self.session.read().await.clone().ok_or_else(|| Error::Other("no session".into()))?;
        let response = self
            .http
            .post(format!("{}{path}", session.api_url()))
            .header("Authorization", &session.session_token)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;
        let status = response.status().as_u16();
        let value = response.json().await.map_err(|e| Error::Http(e.to_string()))?;
        Ok((status, value))
    }

    pub async fn get_accounts(&self) -> Result<Vec<Value>> {
        let body = self.authed_get("/customers/me/accounts").await?;
        Ok(body["data"]["items"].as_array().cloned().unwrap_or_default())
    }

    pub async fn get_primary_account(&self) -> Result<String> {
        let accounts = self.get_accounts().await?;
        let first = accounts.first().ok_or_else(|| Error::Other("no trading accounts found".into()))?;
        let account = first.get("account").unwrap_or(first);
        Ok(account["account-number"].as_str().unwrap_or_default().to_string())
    }

    pub async fn get_positions(&self, account_number: &str) -> Result<Value> {
        self.authed_get(&format!("/accounts/{account_number}/positions")).await
    }

    pub async fn get_balances(&self, account_number: &str) -> Result<Value> {
        self.authed_get(&format!("/accounts/{account_number}/balances")).await
    }

    pub async fn submit_order_dry_run(&self, account_number: &str, order_payload: &Value) -> Result<(bool, Value)> {
        let (status, body) = self.authed_post(&format!("/accounts/{account_number}/orders/dry-run"), order_payload).await?;
        Ok((status == 200 || status == 201, body))
    }

    pub async fn submit_order(&self, account_number: &str, order_payload: &Value) -> Result<(bool, Value)> {
        let (status, body) = self.authed_post(&format!("/accounts/{account_number}/orders"), order_payload).await?;
        Ok((status == 200 || status == 201, body))
    }

    /// Deletes the session remotely (best-effort) and clears the cache file.
    pub async fn close_session(&self) -> Result<()> {
        if let Some(session) = self.session.write().await.take() {
            let _ = self
                .http
                .delete(format!("{}/sessions", session.api_url()))
                .header("Authorization", &session.session_token)
                .send()
                .await;
        }
        if self.cache_path.exists() {
            tokio::fs::remove_file(&self.cache_path).await.map_err(Error::Io)?;
        }
        Ok(())
    }
}

fn dirs_home() -> PathBuf {
    std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sandbox_url_selected_by_default() {
        let creds = BrokerageCredentials {
            use_sandbox: true,
            username: None,
            password: None,
            sandbox_username: None,
            sandbox_password: None,
            remember_token: None,
        };
        let client = BrokerageClient::new(creds);
        assert!(client.is_sandbox());
    }

    #[tokio::test]
    async fn login_fails_cleanly_without_credentials() {
        let creds = BrokerageCredentials {
            use_sandbox: true,
            username: None,
            password: None,
            sandbox_username: None,
            sandbox_password: None,
            remember_token: None,
        };
        let client = BrokerageClient::new(creds);
        let err = client.login().await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
