// region:    --- Imports
use marketplace_core::auth::{IdentityProvider, MemoryIdentityProvider};
use marketplace_core::bidding::commands::{handle_place_bid, PlaceBidCommand};
use marketplace_core::checkout::{
    process_payment, CardDetails, CheckoutSession, SimulatedGateway,
};
use marketplace_core::dashboard::{DashboardStats, TradeDirection, Transaction, UserProfile};
use marketplace_core::listing::model::{ListingStatus, NewListing};
use marketplace_core::pricing;
use marketplace_core::router::Router;
use marketplace_core::store::memory::{MemoryBlobStore, MemoryListingStore};
use marketplace_core::store::{BlobStore, ListingStore};
use std::sync::Arc;
use tokio::time::Duration;
use tracing::info;

// endregion: --- Imports

// region:    --- Main

/// 인메모리 협력자만으로 한 세션을 끝까지 걸어본다:
/// 가입 → 리스팅 업로드 → 입찰 → 체크아웃 → 에스크로 → 대시보드
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // 협력자 생성
    let identity = MemoryIdentityProvider::new();
    let listings = MemoryListingStore::new();
    let blobs = MemoryBlobStore::new();
    let gateway = SimulatedGateway::new(Duration::from_millis(200));

    // 사용자 등록
    let seller = identity.register("sarah@example.com", "secret-1").await?;
    let buyer = identity.register("mike@example.com", "secret-2").await?;

    // 판매자 리스팅 구독 (변경마다 전체 컬렉션 푸시)
    let _subscription = listings.subscribe_by_owner(
        &seller.uid,
        Arc::new(|items| {
            info!("{:<12} --> 판매자 리스팅 {}건 수신", "Main", items.len());
        }),
    );

    // 이미지 업로드 후 리스팅 생성
    let image_url = blobs
        .upload(
            "listings/vintage-camera.jpg",
            vec![0u8; 1024],
            Box::new(|percent| {
                info!("{:<12} --> 업로드 진행률: {}%", "Main", percent);
            }),
        )
        .await?;

    let listing_id = listings
        .create(NewListing {
            owner_uid: seller.uid.clone(),
            title: "Vintage Camera".to_string(),
            description: "Classic 35mm film camera in excellent condition.".to_string(),
            base_price: 350.0,
            image_url: Some(image_url),
            video_url: None,
            tags: vec!["Electronics".to_string(), "Vintage".to_string()],
            location: None,
        })
        .await?;

    // 구매자가 상세 뷰에서 입찰
    let mut router = Router::new();
    let listing = listings.get(&listing_id).await?;
    router.open_detail(listing.clone());
    info!(
        "{:<12} --> 최소 입찰가: {}",
        "Main",
        pricing::display_amount(pricing::minimum_next_bid(&listing))
    );

    handle_place_bid(
        PlaceBidCommand {
            listing_id: listing_id.clone(),
            bidder_uid: buyer.uid.clone(),
            amount: 380.0,
        },
        &listings,
    )
    .await?;

    // 입찰 금액 400으로 체크아웃
    router.open_detail(listings.get(&listing_id).await?);
    let selected = router.start_checkout(Some(400.0))?.clone();
    let mut session = CheckoutSession::new(&selected, router.checkout_bid());
    info!(
        "{:<12} --> 체크아웃 총액: {} (수수료 {})",
        "Main",
        pricing::display_amount(session.total_amount),
        pricing::display_amount(session.escrow_fee)
    );

    // 결제 제출 및 승인
    session.submit_payment(&CardDetails {
        card_number: "4242 4242 4242 4242".to_string(),
        expiry: "12/27".to_string(),
        cvv: "123".to_string(),
        holder_name: "Mike Wilson".to_string(),
    })?;
    let outcome = process_payment(&mut session, &gateway).await?;
    info!("{:<12} --> 결제 결과: {:?}", "Main", outcome);

    // 에스크로 도달, 리스팅은 sold로
    listings.set_status(&listing_id, ListingStatus::Sold).await?;
    let transaction = Transaction::from_session(&session, TradeDirection::Purchase);
    router.complete_checkout()?;

    // 대시보드: 프로필 헤더와 통계
    let profile = UserProfile::from_principal(&buyer, "Mike Wilson");
    info!(
        "{:<12} --> 대시보드 프로필: {} ({})",
        "Main", profile.name, profile.email
    );
    let snapshot = listings.list_all().await?;
    let stats = DashboardStats::derive(&buyer.uid, &snapshot, &[transaction]);
    info!("{:<12} --> 대시보드 통계: {:?}", "Main", stats);

    identity.sign_out().await;
    Ok(())
}

// endregion: --- Main
