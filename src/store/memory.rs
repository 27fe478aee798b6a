/// 인메모리 저장소 구현 (테스트 및 데모용)
// region:    --- Imports
use crate::error::MarketError;
use crate::listing::model::{Bid, Listing, ListingStatus, NewListing};
use crate::store::{BlobStore, ListingCallback, ListingStore, ProgressFn, Subscription};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

// endregion: --- Imports

// region:    --- Memory Listing Store

/// 인메모리 리스팅 저장소
///
/// 읽기-검증-추가를 단일 쓰기 잠금 안에서 처리하므로 같은 프로세스 안에서는
/// 입찰이 경합하지 않지만, 클라이언트 간 토큰은 없다(last-write-wins).
pub struct MemoryListingStore {
    listings: Arc<RwLock<HashMap<String, Listing>>>,
    // 변경 알림 (구독 태스크가 스냅샷을 다시 푸시)
    changes: broadcast::Sender<()>,
}

impl MemoryListingStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(64);
        MemoryListingStore {
            listings: Arc::new(RwLock::new(HashMap::new())),
            changes,
        }
    }

    fn notify(&self) {
        // 구독자가 없으면 보낼 곳이 없을 뿐, 오류가 아니다
        let _ = self.changes.send(());
    }

    /// 소유자별 스냅샷 (생성 시각 내림차순)
    async fn snapshot_by_owner(
        listings: &RwLock<HashMap<String, Listing>>,
        owner_uid: &str,
    ) -> Vec<Listing> {
        let guard = listings.read().await;
        let mut items: Vec<Listing> = guard
            .values()
            .filter(|l| l.owner_uid == owner_uid)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items
    }
}

impl Default for MemoryListingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ListingStore for MemoryListingStore {
    async fn create(&self, draft: NewListing) -> Result<String, MarketError> {
        let id = Uuid::new_v4().to_string();
        let listing = Listing {
            id: id.clone(),
            owner_uid: draft.owner_uid,
            title: draft.title,
            description: draft.description,
            base_price: draft.base_price,
            current_bid: None,
            image_url: draft.image_url,
            video_url: draft.video_url,
            tags: draft.tags,
            location: draft.location,
            status: ListingStatus::Active,
            created_at: Utc::now(),
            bids: Vec::new(),
        };

        self.listings.write().await.insert(id.clone(), listing);
        info!("{:<12} --> 리스팅 생성: {}", "Store", id);
        self.notify();
        Ok(id)
    }

    async fn get(&self, id: &str) -> Result<Listing, MarketError> {
        self.listings
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| MarketError::NotFound { id: id.to_string() })
    }

    async fn list_all(&self) -> Result<Vec<Listing>, MarketError> {
        let guard = self.listings.read().await;
        let mut items: Vec<Listing> = guard.values().cloned().collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn append_bid(&self, listing_id: &str, bid: Bid) -> Result<Listing, MarketError> {
        let updated = {
            let mut guard = self.listings.write().await;
            let listing = guard.get_mut(listing_id).ok_or_else(|| MarketError::NotFound {
                id: listing_id.to_string(),
            })?;
            // 기록 순서 보존, current_bid 불변식 복원
            listing.bids.push(bid);
            listing.recompute_current_bid();
            listing.clone()
        };
        self.notify();
        Ok(updated)
    }

    async fn set_status(
        &self,
        listing_id: &str,
        status: ListingStatus,
    ) -> Result<(), MarketError> {
        {
            let mut guard = self.listings.write().await;
            let listing = guard.get_mut(listing_id).ok_or_else(|| MarketError::NotFound {
                id: listing_id.to_string(),
            })?;
            listing.status = status;
        }
        info!(
            "{:<12} --> 리스팅 상태 전환: {} -> {}",
            "Store",
            listing_id,
            status.as_str()
        );
        self.notify();
        Ok(())
    }

    fn subscribe_by_owner(&self, owner_uid: &str, callback: ListingCallback) -> Subscription {
        let listings = Arc::clone(&self.listings);
        let owner = owner_uid.to_string();
        let mut receiver = self.changes.subscribe();

        let handle = tokio::spawn(async move {
            // 구독 직후 현재 스냅샷을 한 번 푸시
            callback(Self::snapshot_by_owner(&listings, &owner).await);

            loop {
                match receiver.recv().await {
                    Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                        callback(Self::snapshot_by_owner(&listings, &owner).await);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        debug!("{:<12} --> 소유자 구독 시작: {}", "Store", owner_uid);
        Subscription::new(handle)
    }
}

// endregion: --- Memory Listing Store

// region:    --- Memory Blob Store

/// 인메모리 블롭 저장소
pub struct MemoryBlobStore {
    blobs: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        MemoryBlobStore {
            blobs: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        on_progress: ProgressFn,
    ) -> Result<String, MarketError> {
        // 진행률 콜백 계약(0–100 정수)을 단계적으로 행사한다
        on_progress(0);
        for step in [25u8, 50, 75] {
            on_progress(step);
        }

        self.blobs.write().await.insert(path.to_string(), bytes);
        on_progress(100);

        info!("{:<12} --> 업로드 완료: {}", "Store", path);
        Ok(format!("memory://{}", path))
    }
}

// endregion: --- Memory Blob Store
