/// 인증 제공자 인터페이스
/// 인증 실패 메시지는 변형하지 않고 그대로 사용자에게 전달한다.
// region:    --- Imports
use crate::error::MarketError;
use crate::store::Subscription;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::info;
use uuid::Uuid;

// endregion: --- Imports

pub mod firebase;

// region:    --- Identity Provider

/// 로그인된 사용자
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Principal {
    pub uid: String,
    pub email: String,
}

/// 인증 상태 변경 콜백 (로그인 시 Some, 로그아웃 시 None)
pub type AuthCallback = Arc<dyn Fn(Option<Principal>) + Send + Sync>;

/// 인증 제공자 트레이트
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// 회원 가입. 중복 이메일이면 메시지와 함께 실패한다.
    async fn register(&self, email: &str, password: &str) -> Result<Principal, MarketError>;

    /// 로그인. 잘못된 자격 증명이면 메시지와 함께 실패한다.
    async fn login(&self, email: &str, password: &str) -> Result<Principal, MarketError>;

    /// 로그아웃
    async fn sign_out(&self);

    /// 인증 상태 구독. 구독 직후 현재 상태를 한 번 푸시한다.
    fn on_auth_change(&self, callback: AuthCallback) -> Subscription;
}

/// watch 채널 하나로 인증 상태 구독을 구현 (메모리/Firebase 공용)
pub(crate) fn spawn_auth_watch(
    sender: &watch::Sender<Option<Principal>>,
    callback: AuthCallback,
) -> Subscription {
    let mut receiver = sender.subscribe();
    let handle = tokio::spawn(async move {
        // 현재 상태를 먼저 전달
        callback(receiver.borrow().clone());
        while receiver.changed().await.is_ok() {
            callback(receiver.borrow().clone());
        }
    });
    Subscription::new(handle)
}

// endregion: --- Identity Provider

// region:    --- Memory Identity Provider

/// 인메모리 인증 제공자 (테스트 및 데모용)
pub struct MemoryIdentityProvider {
    // email -> (password, uid)
    users: RwLock<HashMap<String, (String, String)>>,
    current: watch::Sender<Option<Principal>>,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        MemoryIdentityProvider {
            users: RwLock::new(HashMap::new()),
            current,
        }
    }
}

impl Default for MemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn register(&self, email: &str, password: &str) -> Result<Principal, MarketError> {
        let mut users = self.users.write().await;
        if users.contains_key(email) {
            return Err(MarketError::Auth("이미 등록된 이메일입니다".to_string()));
        }

        let uid = Uuid::new_v4().to_string();
        users.insert(email.to_string(), (password.to_string(), uid.clone()));

        let principal = Principal {
            uid,
            email: email.to_string(),
        };
        info!("{:<12} --> 회원 가입: {}", "Auth", email);
        self.current.send_replace(Some(principal.clone()));
        Ok(principal)
    }

    async fn login(&self, email: &str, password: &str) -> Result<Principal, MarketError> {
        let users = self.users.read().await;
        let (stored_password, uid) = users
            .get(email)
            .ok_or_else(|| MarketError::Auth("이메일 또는 비밀번호가 올바르지 않습니다".to_string()))?;
        if stored_password != password {
            return Err(MarketError::Auth(
                "이메일 또는 비밀번호가 올바르지 않습니다".to_string(),
            ));
        }

        let principal = Principal {
            uid: uid.clone(),
            email: email.to_string(),
        };
        info!("{:<12} --> 로그인: {}", "Auth", email);
        self.current.send_replace(Some(principal.clone()));
        Ok(principal)
    }

    async fn sign_out(&self) {
        info!("{:<12} --> 로그아웃", "Auth");
        self.current.send_replace(None);
    }

    fn on_auth_change(&self, callback: AuthCallback) -> Subscription {
        spawn_auth_watch(&self.current, callback)
    }
}

// endregion: --- Memory Identity Provider
