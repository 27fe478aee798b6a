/// 가격 계산 엔진
/// 수수료와 최소 입찰가 계산을 한 곳에 모아, 표시 금액과 청구 금액이
/// 호출 지점마다 달라지는 일을 막는다.
// region:    --- Imports
use crate::listing::model::Listing;

// endregion: --- Imports

// region:    --- Constants

/// 최소 입찰 증가 단위 (고정 5 통화 단위)
pub const MIN_BID_INCREMENT: f64 = 5.0;

/// 에스크로 수수료율 (3%)
pub const ESCROW_FEE_RATE: f64 = 0.03;

// endregion: --- Constants

// region:    --- Pricing

/// 현재 유효 가격
/// 최고 입찰가가 있고 시작가보다 높으면 최고 입찰가, 아니면 시작가.
pub fn current_price(listing: &Listing) -> f64 {
    match listing.current_bid {
        Some(bid) if bid > listing.base_price => bid,
        _ => listing.base_price,
    }
}

/// 다음 입찰이 만족해야 하는 최소 금액
pub fn minimum_next_bid(listing: &Listing) -> f64 {
    listing.current_bid.unwrap_or(listing.base_price) + MIN_BID_INCREMENT
}

/// 에스크로 수수료
/// 내부 계산은 전체 정밀도를 유지하고, 반올림은 표시 시점에만 한다.
pub fn escrow_fee(amount: f64) -> f64 {
    amount * ESCROW_FEE_RATE
}

/// 수수료 포함 총액
pub fn total_with_fee(amount: f64) -> f64 {
    amount + escrow_fee(amount)
}

/// 표시용 금액 (소수점 둘째 자리 반올림은 여기서만)
pub fn display_amount(amount: f64) -> String {
    format!("R{:.2}", amount)
}

// endregion: --- Pricing
