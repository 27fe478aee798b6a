/// 입찰 관련 커맨드 처리
/// 1. 입찰
/// 2. 즉시 구매
// region:    --- Imports
use crate::bidding::validate::{validate_bid, BidRejection};
use crate::checkout::CheckoutSession;
use crate::error::MarketError;
use crate::listing::model::{Bid, ListingStatus};
use crate::store::ListingStore;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Commands

/// 입찰 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaceBidCommand {
    pub listing_id: String,
    pub bidder_uid: String,
    pub amount: f64,
}

/// 즉시 구매 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BuyNowCommand {
    pub listing_id: String,
    pub buyer_uid: String,
}

/// 1. 입찰
///
/// 현재 스냅샷을 조회해 검증하고, 통과하면 새 입찰을 저장소에 추가한다.
/// `current_bid` 재계산은 저장소가 담당한다. 저장소는 last-write-wins이며
/// 동시 입찰 간 충돌 해소는 범위 밖이다.
pub async fn handle_place_bid(
    cmd: PlaceBidCommand,
    store: &impl ListingStore,
) -> Result<Bid, MarketError> {
    info!("{:<12} --> 입찰 요청 처리 시작: {:?}", "Command", cmd);

    // 현재 리스팅 스냅샷 조회
    let listing = store.get(&cmd.listing_id).await?;

    // 입찰 검증
    if let Err(rejection) = validate_bid(&listing, cmd.amount) {
        warn!(
            "{:<12} --> 입찰 거절: {} (금액: {})",
            "Command", rejection, cmd.amount
        );
        return Err(MarketError::BidRejected(rejection));
    }

    // 새 입찰 생성 및 저장
    let bid = Bid::new(cmd.bidder_uid, cmd.amount);
    let updated = store.append_bid(&cmd.listing_id, bid.clone()).await?;

    info!(
        "{:<12} --> 입찰 성공: 현재 최고가 {:?}, 총 입찰 수 {}",
        "Command",
        updated.current_bid,
        updated.bids.len()
    );
    Ok(bid)
}

/// 2. 즉시 구매
///
/// 현재 가격(최고 입찰가 또는 시작가)으로 체크아웃 세션을 연다.
/// 결제가 에스크로에 도달한 시점에 호출자가 리스팅을 sold로 전환한다.
pub async fn handle_buy_now(
    cmd: BuyNowCommand,
    store: &impl ListingStore,
) -> Result<CheckoutSession, MarketError> {
    info!("{:<12} --> 즉시 구매 요청 처리 시작: {:?}", "Command", cmd);

    let listing = store.get(&cmd.listing_id).await?;

    if listing.status != ListingStatus::Active {
        warn!(
            "{:<12} --> 즉시 구매 거절: 리스팅 상태 {}",
            "Command",
            listing.status.as_str()
        );
        return Err(MarketError::BidRejected(BidRejection::ListingNotActive {
            status: listing.status.as_str(),
        }));
    }

    // 입찰 금액 지정 없이 현재 가격으로 체크아웃
    Ok(CheckoutSession::new(&listing, None))
}

// endregion: --- Commands
