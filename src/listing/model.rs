// region:    --- Imports
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// endregion: --- Imports

// region:    --- Listing

/// 리스팅 상태
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Active,
    Sold,
    Pending,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Active => "active",
            ListingStatus::Sold => "sold",
            ListingStatus::Pending => "pending",
        }
    }
}

/// 판매자 위치 (지도 뷰에서 핀으로 사용)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
    pub distance_km: f64,
    pub address: String,
}

/// 상품 리스팅 모델
///
/// 불변식: `bids`가 비어 있지 않으면 `current_bid`는 `bids` 중 최대 금액이며
/// `base_price` 이상이다.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Listing {
    pub id: String,
    pub owner_uid: String,
    pub title: String,
    pub description: String,
    pub base_price: f64,
    pub current_bid: Option<f64>,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub tags: Vec<String>,
    pub location: Option<GeoPoint>,
    pub status: ListingStatus,
    pub created_at: DateTime<Utc>,
    pub bids: Vec<Bid>,
}

impl Listing {
    /// 입찰 추가 후 `current_bid` 불변식 복원
    /// 입찰 순서(기록 순서)는 건드리지 않는다.
    pub fn recompute_current_bid(&mut self) {
        self.current_bid = self
            .bids
            .iter()
            .map(|b| b.amount)
            .fold(None, |acc: Option<f64>, amount| match acc {
                Some(max) if max >= amount => Some(max),
                _ => Some(amount),
            });
    }
}

/// 입찰 모델 (추가된 이후에는 불변)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Bid {
    pub id: String,
    pub bidder_uid: String,
    pub amount: f64,
    pub placed_at: DateTime<Utc>,
}

impl Bid {
    /// 새 입찰 생성 (신규 id, 현재 시각)
    pub fn new(bidder_uid: impl Into<String>, amount: f64) -> Self {
        Bid {
            id: Uuid::new_v4().to_string(),
            bidder_uid: bidder_uid.into(),
            amount,
            placed_at: Utc::now(),
        }
    }
}

/// 리스팅 생성 초안 (id와 생성 시각은 저장소가 부여)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewListing {
    pub owner_uid: String,
    pub title: String,
    pub description: String,
    pub base_price: f64,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub tags: Vec<String>,
    pub location: Option<GeoPoint>,
}

// endregion: --- Listing
