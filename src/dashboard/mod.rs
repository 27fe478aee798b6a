/// 사용자 대시보드
/// 거래 기록과 표시용 통계 파생. 핵심 로직은 값을 읽고 파생만 하며,
/// 자금 지급 자체는 에스크로 협력자의 일이다.
// region:    --- Imports
use crate::auth::Principal;
use crate::checkout::{CheckoutSession, CheckoutState};
use crate::listing::model::{Listing, ListingStatus};
use crate::pricing;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// endregion: --- Imports

// region:    --- Transaction

/// 거래 상태
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Escrow,
    Completed,
}

/// 거래 방향
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TradeDirection {
    Purchase,
    Sale,
}

/// 거래 대상 아이템 참조
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ItemRef {
    pub id: String,
    pub title: String,
    pub image_url: Option<String>,
}

/// 완료되었거나 에스크로 중인 거래 기록
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Transaction {
    pub id: String,
    pub item: ItemRef,
    pub amount: f64,
    pub status: TransactionStatus,
    pub date: DateTime<Utc>,
    pub direction: TradeDirection,
}

impl Transaction {
    /// 체크아웃 세션에서 거래 기록 생성
    pub fn from_session(session: &CheckoutSession, direction: TradeDirection) -> Self {
        let status = match session.state() {
            CheckoutState::EscrowHeld => TransactionStatus::Escrow,
            CheckoutState::Completed => TransactionStatus::Completed,
            _ => TransactionStatus::Pending,
        };
        Transaction {
            id: Uuid::new_v4().to_string(),
            item: ItemRef {
                id: session.listing_id.clone(),
                title: session.listing_title.clone(),
                image_url: None,
            },
            amount: session.final_amount,
            status,
            date: Utc::now(),
            direction,
        }
    }

    /// 표시용 금액
    pub fn display_amount(&self) -> String {
        pricing::display_amount(self.amount)
    }
}

// endregion: --- Transaction

// region:    --- Profile / Stats

/// 사용자 프로필
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserProfile {
    pub uid: String,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub rating: f64,
    pub member_since: DateTime<Utc>,
}

impl UserProfile {
    /// 가입 직후의 기본 프로필 (아직 평점 없음, 가입일은 지금)
    pub fn from_principal(principal: &Principal, name: impl Into<String>) -> Self {
        UserProfile {
            uid: principal.uid.clone(),
            name: name.into(),
            email: principal.email.clone(),
            avatar_url: None,
            rating: 0.0,
            member_since: Utc::now(),
        }
    }
}

/// 대시보드 통계
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_sales: usize,
    pub total_purchases: usize,
    pub active_listings: usize,
    pub active_bids: usize,
}

impl DashboardStats {
    /// 리스팅 스냅샷과 거래 기록으로부터 통계 파생
    pub fn derive(user_uid: &str, listings: &[Listing], transactions: &[Transaction]) -> Self {
        let total_sales = transactions
            .iter()
            .filter(|t| t.direction == TradeDirection::Sale)
            .count();
        let total_purchases = transactions
            .iter()
            .filter(|t| t.direction == TradeDirection::Purchase)
            .count();
        let active_listings = listings
            .iter()
            .filter(|l| l.owner_uid == user_uid && l.status == ListingStatus::Active)
            .count();
        // 판매 중인 리스팅 중 내 입찰이 올라가 있는 것의 개수
        let active_bids = listings
            .iter()
            .filter(|l| {
                l.status == ListingStatus::Active
                    && l.bids.iter().any(|b| b.bidder_uid == user_uid)
            })
            .count();

        DashboardStats {
            total_sales,
            total_purchases,
            active_listings,
            active_bids,
        }
    }
}

// endregion: --- Profile / Stats
