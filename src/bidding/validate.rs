/// 입찰 검증기
/// 상태를 직접 바꾸지 않고, 제안된 전이를 승인하거나 사유와 함께 거절만 한다.
// region:    --- Imports
use crate::listing::model::{Listing, ListingStatus};
use crate::pricing;
use serde_json::json;
use thiserror::Error;

// endregion: --- Imports

// region:    --- BidRejection

/// 입찰 거절 사유
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BidRejection {
    /// 금액이 유한한 0 이상의 수가 아님
    #[error("입찰 금액이 올바르지 않습니다")]
    InvalidAmount,

    /// 최소 입찰가 미달 (계산된 최소 금액을 함께 전달)
    #[error("입찰 금액이 최소 입찰가 {minimum}보다 낮습니다")]
    BelowMinimum { minimum: f64 },

    /// 판매 중인 리스팅이 아님
    #[error("판매 중인 리스팅이 아닙니다: {status}")]
    ListingNotActive { status: &'static str },
}

impl BidRejection {
    /// 거절 코드
    pub fn code(&self) -> &'static str {
        match self {
            BidRejection::InvalidAmount => "INVALID_AMOUNT",
            BidRejection::BelowMinimum { .. } => "BELOW_MINIMUM",
            BidRejection::ListingNotActive { .. } => "NOT_ACTIVE",
        }
    }

    /// 입찰자에게 보여줄 페이로드 (최소 입찰가 포함)
    pub fn to_payload(&self) -> serde_json::Value {
        match self {
            BidRejection::BelowMinimum { minimum } => json!({
                "error": self.to_string(),
                "code": self.code(),
                "minimum_next_bid": minimum,
            }),
            other => json!({
                "error": other.to_string(),
                "code": other.code(),
            }),
        }
    }
}

// endregion: --- BidRejection

// region:    --- Validate

/// 입찰 검증
/// 1. 금액은 유한한 0 이상의 수
/// 2. 리스팅은 active 상태
/// 3. 금액은 최소 입찰가 이상
pub fn validate_bid(listing: &Listing, proposed_amount: f64) -> Result<(), BidRejection> {
    if !proposed_amount.is_finite() || proposed_amount < 0.0 {
        return Err(BidRejection::InvalidAmount);
    }

    if listing.status != ListingStatus::Active {
        return Err(BidRejection::ListingNotActive {
            status: listing.status.as_str(),
        });
    }

    let minimum = pricing::minimum_next_bid(listing);
    if proposed_amount < minimum {
        return Err(BidRejection::BelowMinimum { minimum });
    }

    Ok(())
}

// endregion: --- Validate
