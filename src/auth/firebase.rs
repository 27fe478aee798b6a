/// Firebase Identity Toolkit REST 인증 제공자
// region:    --- Imports
use crate::auth::{spawn_auth_watch, AuthCallback, IdentityProvider, Principal};
use crate::config::FirebaseConfig;
use crate::error::MarketError;
use crate::store::Subscription;
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::watch;
use tracing::info;

// endregion: --- Imports

// region:    --- Firebase Auth

const IDENTITY_ENDPOINT: &str = "https://identitytoolkit.googleapis.com/v1";

pub struct FirebaseAuth {
    client: reqwest::Client,
    config: FirebaseConfig,
    current: watch::Sender<Option<Principal>>,
}

impl FirebaseAuth {
    pub fn new(config: FirebaseConfig) -> Self {
        let (current, _) = watch::channel(None);
        FirebaseAuth {
            client: reqwest::Client::new(),
            config,
            current,
        }
    }

    /// accounts:signUp / accounts:signInWithPassword 공통 호출
    async fn account_request(&self, action: &str, email: &str, password: &str)
        -> Result<Principal, MarketError> {
        let url = format!(
            "{}/accounts:{}?key={}",
            IDENTITY_ENDPOINT, action, self.config.api_key
        );
        let response = self
            .client
            .post(&url)
            .json(&json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }))
            .send()
            .await
            .map_err(|e| MarketError::Auth(e.to_string()))?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| MarketError::Auth(e.to_string()))?;

        if !status.is_success() {
            // 제공자의 메시지(EMAIL_EXISTS, INVALID_PASSWORD 등)를 그대로 전달
            let message = body
                .pointer("/error/message")
                .and_then(Value::as_str)
                .unwrap_or("인증 요청이 실패했습니다")
                .to_string();
            return Err(MarketError::Auth(message));
        }

        let uid = body
            .get("localId")
            .and_then(Value::as_str)
            .ok_or_else(|| MarketError::Auth("응답에 localId가 없습니다".to_string()))?;
        let principal = Principal {
            uid: uid.to_string(),
            email: email.to_string(),
        };
        self.current.send_replace(Some(principal.clone()));
        Ok(principal)
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuth {
    async fn register(&self, email: &str, password: &str) -> Result<Principal, MarketError> {
        info!("{:<12} --> 회원 가입 요청: {}", "Auth", email);
        self.account_request("signUp", email, password).await
    }

    async fn login(&self, email: &str, password: &str) -> Result<Principal, MarketError> {
        info!("{:<12} --> 로그인 요청: {}", "Auth", email);
        self.account_request("signInWithPassword", email, password)
            .await
    }

    async fn sign_out(&self) {
        info!("{:<12} --> 로그아웃", "Auth");
        self.current.send_replace(None);
    }

    fn on_auth_change(&self, callback: AuthCallback) -> Subscription {
        spawn_auth_watch(&self.current, callback)
    }
}

// endregion: --- Firebase Auth
