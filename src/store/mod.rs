/// 리스팅 / 블롭 저장소 인터페이스
/// 리스팅의 소유권은 저장소에 있다. 핵심 로직은 읽기 전용 스냅샷을 들고
/// 변경(새 입찰, 상태 전환)을 제안할 뿐, 공유 상태를 직접 바꾸지 않는다.
// region:    --- Imports
use crate::error::MarketError;
use crate::listing::model::{Bid, Listing, ListingStatus, NewListing};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinHandle;

// endregion: --- Imports

pub mod firestore;
pub mod memory;

// region:    --- Subscription

/// 구독 콜백: 변경이 있을 때마다 전체 컬렉션을 받는다 (생성 시각 내림차순).
pub type ListingCallback = Arc<dyn Fn(Vec<Listing>) + Send + Sync>;

/// 구독 핸들. `unsubscribe` 또는 drop으로 전달이 중단된다.
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    pub fn new(handle: JoinHandle<()>) -> Self {
        Subscription { handle }
    }

    /// 구독 해지
    pub fn unsubscribe(self) {
        self.handle.abort();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// endregion: --- Subscription

// region:    --- Listing Store

/// 리스팅 저장소 트레이트
///
/// `append_bid`는 last-write-wins이며 트랜잭션 보장이 없다. 동시 입찰이
/// 서로의 최소 입찰가 검증을 무효화할 수 있는 간극은 해결하지 않고 남겨둔다.
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// 리스팅 생성. id와 생성 시각은 저장소가 부여하고 상태는 active로 시작한다.
    async fn create(&self, draft: NewListing) -> Result<String, MarketError>;

    /// 리스팅 스냅샷 조회
    async fn get(&self, id: &str) -> Result<Listing, MarketError>;

    /// 전체 리스팅 조회 (생성 시각 내림차순, 홈/지도 뷰 피드)
    async fn list_all(&self) -> Result<Vec<Listing>, MarketError>;

    /// 입찰 추가. 기록 순서를 보존하고 `current_bid`를 재계산한 스냅샷을 돌려준다.
    async fn append_bid(&self, listing_id: &str, bid: Bid) -> Result<Listing, MarketError>;

    /// 리스팅 상태 전환 (체크아웃이 에스크로에 도달하면 sold)
    async fn set_status(&self, listing_id: &str, status: ListingStatus)
        -> Result<(), MarketError>;

    /// 소유자별 리스팅 구독. 변경마다 전체 컬렉션을 콜백으로 푸시한다.
    fn subscribe_by_owner(&self, owner_uid: &str, callback: ListingCallback) -> Subscription;
}

// endregion: --- Listing Store

// region:    --- Blob Store

/// 업로드 진행률 콜백 (0–100 정수 퍼센트)
pub type ProgressFn = Box<dyn Fn(u8) + Send + Sync>;

/// 블롭 저장소 트레이트
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// 바이트 업로드. 완료되면 공개적으로 접근 가능한 URL을 돌려준다.
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        on_progress: ProgressFn,
    ) -> Result<String, MarketError>;
}

// endregion: --- Blob Store
