use chrono::Utc;
use marketplace_core::auth::{IdentityProvider, MemoryIdentityProvider, Principal};
use marketplace_core::bidding::commands::{
    handle_buy_now, handle_place_bid, BuyNowCommand, PlaceBidCommand,
};
use marketplace_core::checkout::{
    process_payment, CardDetails, CheckoutSession, CheckoutState, PaymentGateway,
    PaymentOutcome, SimulatedGateway,
};
use marketplace_core::config::FirebaseConfig;
use marketplace_core::dashboard::{
    DashboardStats, ItemRef, TradeDirection, Transaction, TransactionStatus, UserProfile,
};
use marketplace_core::error::MarketError;
use marketplace_core::listing::model::{Bid, Listing, ListingStatus, NewListing};
use marketplace_core::router::{Router, View};
use marketplace_core::store::memory::{MemoryBlobStore, MemoryListingStore};
use marketplace_core::store::{BlobStore, ListingStore};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

/// 테스트용 리스팅 초안
fn test_draft(owner_uid: &str, title: &str, base_price: f64) -> NewListing {
    NewListing {
        owner_uid: owner_uid.to_string(),
        title: title.to_string(),
        description: "테스트용 리스팅입니다.".to_string(),
        base_price,
        image_url: None,
        video_url: None,
        tags: vec![],
        location: None,
    }
}

/// 테스트용 리스팅 스냅샷 (저장소 없이 체크아웃만 볼 때)
fn test_snapshot(base_price: f64, current_bid: Option<f64>) -> Listing {
    Listing {
        id: "listing-1".to_string(),
        owner_uid: "seller-1".to_string(),
        title: "Mountain Bike".to_string(),
        description: "Well maintained".to_string(),
        base_price,
        current_bid,
        image_url: None,
        video_url: None,
        tags: vec![],
        location: None,
        status: ListingStatus::Active,
        created_at: Utc::now(),
        bids: vec![],
    }
}

/// 유효한 카드 입력
fn valid_card() -> CardDetails {
    CardDetails {
        card_number: "4242 4242 4242 4242".to_string(),
        expiry: "12/27".to_string(),
        cvv: "123".to_string(),
        holder_name: "Mike Wilson".to_string(),
    }
}

/// 항상 승인을 거절하는 게이트웨이
struct DecliningGateway;

#[async_trait]
impl PaymentGateway for DecliningGateway {
    async fn authorize(&self, _amount: f64) -> Result<(), String> {
        Err("카드 한도 초과".to_string())
    }
}

/// 입찰 수락: 350/380 리스팅에 400 입찰 → 최고가 400, 입찰 수 +1
#[tokio::test]
async fn test_place_bid_updates_current_bid() {
    let store = MemoryListingStore::new();
    let listing_id = store.create(test_draft("seller-1", "Vintage Camera", 350.0)).await.unwrap();
    store
        .append_bid(&listing_id, Bid::new("bidder-1", 380.0))
        .await
        .unwrap();

    let before = store.get(&listing_id).await.unwrap();
    assert_eq!(before.current_bid, Some(380.0));
    let bid_count = before.bids.len();

    handle_place_bid(
        PlaceBidCommand {
            listing_id: listing_id.clone(),
            bidder_uid: "bidder-2".to_string(),
            amount: 400.0,
        },
        &store,
    )
    .await
    .unwrap();

    let after = store.get(&listing_id).await.unwrap();
    assert_eq!(after.current_bid, Some(400.0));
    assert_eq!(after.bids.len(), bid_count + 1);
    // 기록 순서 보존 (재정렬하지 않는다)
    assert_eq!(after.bids.last().unwrap().amount, 400.0);
}

/// 최소 미달 입찰은 최소 금액과 함께 거절된다
#[tokio::test]
async fn test_place_bid_below_minimum_rejected() {
    let store = MemoryListingStore::new();
    let listing_id = store.create(test_draft("seller-1", "Vintage Camera", 350.0)).await.unwrap();
    store
        .append_bid(&listing_id, Bid::new("bidder-1", 380.0))
        .await
        .unwrap();

    let result = handle_place_bid(
        PlaceBidCommand {
            listing_id: listing_id.clone(),
            bidder_uid: "bidder-2".to_string(),
            amount: 384.0,
        },
        &store,
    )
    .await;

    match result {
        Err(MarketError::BidRejected(rejection)) => {
            let payload = rejection.to_payload();
            assert_eq!(payload["code"], "BELOW_MINIMUM");
            assert_eq!(payload["minimum_next_bid"], 385.0);
        }
        other => panic!("예상과 다른 결과: {:?}", other),
    }

    // 거절된 입찰은 기록되지 않는다
    let after = store.get(&listing_id).await.unwrap();
    assert_eq!(after.current_bid, Some(380.0));
}

/// 판매 완료된 리스팅에는 입찰도 즉시 구매도 안 된다
#[tokio::test]
async fn test_sold_listing_rejects_bids_and_buy_now() {
    let store = MemoryListingStore::new();
    let listing_id = store.create(test_draft("seller-1", "Vintage Camera", 350.0)).await.unwrap();
    store.set_status(&listing_id, ListingStatus::Sold).await.unwrap();

    let bid = handle_place_bid(
        PlaceBidCommand {
            listing_id: listing_id.clone(),
            bidder_uid: "bidder-1".to_string(),
            amount: 1_000.0,
        },
        &store,
    )
    .await;
    assert!(matches!(bid, Err(MarketError::BidRejected(_))));

    let buy = handle_buy_now(
        BuyNowCommand {
            listing_id,
            buyer_uid: "buyer-1".to_string(),
        },
        &store,
    )
    .await;
    assert!(matches!(buy, Err(MarketError::BidRejected(_))));
}

/// 즉시 구매는 현재 가격으로 체크아웃 세션을 연다
#[tokio::test]
async fn test_buy_now_opens_checkout_at_current_price() {
    let store = MemoryListingStore::new();
    let listing_id = store.create(test_draft("seller-1", "Road Bike", 800.0)).await.unwrap();
    store
        .append_bid(&listing_id, Bid::new("bidder-1", 850.0))
        .await
        .unwrap();

    let session = handle_buy_now(
        BuyNowCommand {
            listing_id,
            buyer_uid: "buyer-1".to_string(),
        },
        &store,
    )
    .await
    .unwrap();

    assert_eq!(session.final_amount, 850.0);
    assert!(!session.from_bid);
    assert_eq!(session.state(), CheckoutState::AwaitingPayment);
}

/// 체크아웃 금액 파생: 명시 입찰 없음 → 850 / 25.50 / 875.50
#[test]
fn test_checkout_amounts_derived_from_current_bid() {
    let listing = test_snapshot(800.0, Some(850.0));
    let session = CheckoutSession::new(&listing, None);

    assert!((session.final_amount - 850.0).abs() < 1e-9);
    assert!((session.escrow_fee - 25.50).abs() < 1e-9);
    assert!((session.total_amount - 875.50).abs() < 1e-9);
}

/// 명시 입찰 금액은 파생 가격을 덮는다: 900 / 27.00 / 927.00
#[test]
fn test_checkout_amounts_with_explicit_bid() {
    let listing = test_snapshot(800.0, Some(850.0));
    let session = CheckoutSession::new(&listing, Some(900.0));

    assert!((session.final_amount - 900.0).abs() < 1e-9);
    assert!((session.escrow_fee - 27.00).abs() < 1e-9);
    assert!((session.total_amount - 927.00).abs() < 1e-9);
    assert!(session.from_bid);
}

/// 입찰도 최고가도 없으면 시작가로 체크아웃
#[test]
fn test_checkout_amount_falls_back_to_base_price() {
    let listing = test_snapshot(800.0, None);
    let session = CheckoutSession::new(&listing, None);
    assert!((session.final_amount - 800.0).abs() < 1e-9);
}

/// 카드 번호가 비어 있으면 상태는 바뀌지 않고 검증 에러가 난다
#[test]
fn test_submit_payment_empty_card_number() {
    let listing = test_snapshot(800.0, Some(850.0));
    let mut session = CheckoutSession::new(&listing, None);

    let mut card = valid_card();
    card.card_number = "   ".to_string();

    let result = session.submit_payment(&card);
    assert!(matches!(
        result,
        Err(MarketError::Validation { field: "card_number" })
    ));
    assert_eq!(session.state(), CheckoutState::AwaitingPayment);
}

/// 정상 제출: AwaitingPayment → Processing → EscrowHeld
#[tokio::test]
async fn test_checkout_reaches_escrow() {
    let listing = test_snapshot(800.0, Some(850.0));
    let mut session = CheckoutSession::new(&listing, None);

    session.submit_payment(&valid_card()).unwrap();
    assert_eq!(session.state(), CheckoutState::Processing);

    // Processing 중에는 재제출 불가
    assert!(matches!(
        session.submit_payment(&valid_card()),
        Err(MarketError::InvalidTransition { .. })
    ));

    let gateway = SimulatedGateway::new(Duration::from_millis(10));
    let outcome = process_payment(&mut session, &gateway).await.unwrap();
    assert_eq!(outcome, PaymentOutcome::EscrowHeld);
    assert_eq!(session.state(), CheckoutState::EscrowHeld);

    // 수취 확인으로 자금 지급
    session.confirm_receipt().unwrap();
    assert_eq!(session.state(), CheckoutState::Completed);
}

/// 승인 거절: Processing → AwaitingPayment, 재제출 가능
#[tokio::test]
async fn test_declined_payment_returns_to_awaiting() {
    let listing = test_snapshot(800.0, Some(850.0));
    let mut session = CheckoutSession::new(&listing, None);
    session.submit_payment(&valid_card()).unwrap();

    let outcome = process_payment(&mut session, &DecliningGateway).await.unwrap();
    assert_eq!(
        outcome,
        PaymentOutcome::Declined {
            reason: "카드 한도 초과".to_string()
        }
    );
    assert_eq!(session.state(), CheckoutState::AwaitingPayment);

    // 같은 세션으로 재제출할 수 있다
    session.submit_payment(&valid_card()).unwrap();
    let outcome = process_payment(
        &mut session,
        &SimulatedGateway::new(Duration::from_millis(10)),
    )
    .await
    .unwrap();
    assert_eq!(outcome, PaymentOutcome::EscrowHeld);
}

/// 순서를 벗어난 트리거는 도메인 에러다
#[test]
fn test_out_of_order_triggers_rejected() {
    let listing = test_snapshot(800.0, None);
    let mut session = CheckoutSession::new(&listing, None);

    assert!(matches!(
        session.payment_succeeded(),
        Err(MarketError::InvalidTransition { .. })
    ));
    assert!(matches!(
        session.confirm_receipt(),
        Err(MarketError::InvalidTransition { .. })
    ));
    assert!(matches!(
        session.payment_failed(),
        Err(MarketError::InvalidTransition { .. })
    ));
}

/// 에스크로 상태의 세션은 escrow 거래로 기록된다
#[tokio::test]
async fn test_transaction_from_escrow_session() {
    let listing = test_snapshot(800.0, Some(850.0));
    let mut session = CheckoutSession::new(&listing, None);
    session.submit_payment(&valid_card()).unwrap();
    process_payment(&mut session, &SimulatedGateway::new(Duration::from_millis(10)))
        .await
        .unwrap();

    let transaction = Transaction::from_session(&session, TradeDirection::Purchase);
    assert_eq!(transaction.status, TransactionStatus::Escrow);
    assert_eq!(transaction.direction, TradeDirection::Purchase);
    assert!((transaction.amount - 850.0).abs() < 1e-9);
    assert_eq!(transaction.display_amount(), "R850.00");
}

/// 소유자 구독: 변경마다 전체 컬렉션을 생성 시각 내림차순으로 받는다
#[tokio::test]
async fn test_subscribe_by_owner_pushes_collections() {
    let store = MemoryListingStore::new();
    let (sender, mut receiver) = mpsc::unbounded_channel();

    let subscription = store.subscribe_by_owner(
        "seller-1",
        Arc::new(move |items| {
            let _ = sender.send(items);
        }),
    );

    // 구독 직후 현재 스냅샷 (비어 있음)
    let initial = timeout(Duration::from_secs(1), receiver.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(initial.is_empty());

    let first = store.create(test_draft("seller-1", "Vintage Camera", 350.0)).await.unwrap();
    let push = timeout(Duration::from_secs(1), receiver.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(push.len(), 1);
    assert_eq!(push[0].id, first);

    // 다른 소유자의 리스팅은 보이지 않는다
    store.create(test_draft("seller-2", "Road Bike", 800.0)).await.unwrap();
    let push = timeout(Duration::from_secs(1), receiver.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(push.len(), 1);

    // 나중에 만든 리스팅이 앞에 온다
    let second = store.create(test_draft("seller-1", "Film Scanner", 120.0)).await.unwrap();
    let push = timeout(Duration::from_secs(1), receiver.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(push.len(), 2);
    assert_eq!(push[0].id, second);

    subscription.unsubscribe();
}

/// 인증: 중복 가입과 잘못된 자격 증명은 메시지와 함께 실패
#[tokio::test]
async fn test_identity_provider_failures() {
    let identity = MemoryIdentityProvider::new();
    identity.register("sarah@example.com", "secret-1").await.unwrap();

    let duplicate = identity.register("sarah@example.com", "secret-2").await;
    assert!(matches!(duplicate, Err(MarketError::Auth(_))));

    let wrong_password = identity.login("sarah@example.com", "wrong").await;
    assert!(matches!(wrong_password, Err(MarketError::Auth(_))));

    let unknown = identity.login("nobody@example.com", "secret").await;
    assert!(matches!(unknown, Err(MarketError::Auth(_))));
}

/// 인증 상태 구독: 로그인 시 Some, 로그아웃 시 None
#[tokio::test]
async fn test_auth_change_subscription() {
    let identity = MemoryIdentityProvider::new();
    let (sender, mut receiver) = mpsc::unbounded_channel();

    let _subscription = identity.on_auth_change(Arc::new(move |principal| {
        let _ = sender.send(principal);
    }));

    // 초기 상태는 로그아웃
    let initial = timeout(Duration::from_secs(1), receiver.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(initial.is_none());

    let principal = identity.register("mike@example.com", "secret").await.unwrap();
    let after_register = timeout(Duration::from_secs(1), receiver.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after_register, Some(principal));

    identity.sign_out().await;
    let after_sign_out = timeout(Duration::from_secs(1), receiver.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(after_sign_out.is_none());
}

/// 라우터: 전이 테이블과 전용 전이
#[test]
fn test_router_transitions() {
    let mut router = Router::new();
    assert_eq!(router.view(), View::Home);

    // 체크아웃은 단순 내비게이션으로 진입할 수 없다
    assert!(matches!(
        router.navigate(View::Checkout),
        Err(MarketError::InvalidTransition { .. })
    ));
    // 선택 없는 상세 진입도 마찬가지
    assert!(matches!(
        router.navigate(View::Detail),
        Err(MarketError::InvalidTransition { .. })
    ));
    // 선택 없이 체크아웃 시작도 불가
    assert!(matches!(
        router.start_checkout(Some(400.0)),
        Err(MarketError::InvalidTransition { .. })
    ));

    // 아이템 클릭 → 상세 → 체크아웃 → 완료 → 대시보드
    router.open_detail(test_snapshot(350.0, Some(380.0)));
    assert_eq!(router.view(), View::Detail);

    router.start_checkout(Some(400.0)).unwrap();
    assert_eq!(router.view(), View::Checkout);
    assert_eq!(router.checkout_bid(), Some(400.0));

    // 뒤로 가면 선택 입찰 금액은 버려진다
    router.back_to_detail().unwrap();
    assert_eq!(router.checkout_bid(), None);

    router.start_checkout(None).unwrap();
    router.complete_checkout().unwrap();
    assert_eq!(router.view(), View::Dashboard);
    assert!(router.selected().is_none());

    // 헤더 내비게이션은 어디서든 가능
    router.navigate(View::Map).unwrap();
    router.navigate(View::Upload).unwrap();
    router.upload_succeeded().unwrap();
    assert_eq!(router.view(), View::Dashboard);

    router.back_to_home();
    assert_eq!(router.view(), View::Home);
}

/// 업로드 진행률은 0에서 시작해 100으로 끝나는 0–100 정수이고, URL에는 경로가 담긴다
#[tokio::test]
async fn test_blob_upload_progress_and_url() {
    let blobs = MemoryBlobStore::new();
    let progress = Arc::new(Mutex::new(Vec::new()));

    let collected = Arc::clone(&progress);
    let url = blobs
        .upload(
            "listings/vintage-camera.jpg",
            vec![0u8; 1024],
            Box::new(move |percent| {
                collected.lock().unwrap().push(percent);
            }),
        )
        .await
        .unwrap();

    let reports = progress.lock().unwrap();
    assert!(!reports.is_empty());
    assert_eq!(*reports.first().unwrap(), 0);
    assert_eq!(*reports.last().unwrap(), 100);
    assert!(reports.iter().all(|&p| p <= 100));

    // 업로드 경로로 접근 가능한 URL을 돌려준다
    assert!(url.contains("listings/vintage-camera.jpg"));
}

/// 거래 기록 생성 헬퍼
fn test_transaction(direction: TradeDirection) -> Transaction {
    Transaction {
        id: "tx-1".to_string(),
        item: ItemRef {
            id: "listing-1".to_string(),
            title: "Vintage Camera".to_string(),
            image_url: None,
        },
        amount: 850.0,
        status: TransactionStatus::Completed,
        date: Utc::now(),
        direction,
    }
}

/// 대시보드 통계: 내 판매 중 리스팅, 내 입찰, 거래 방향별 집계
#[tokio::test]
async fn test_dashboard_stats_derivation() {
    let store = MemoryListingStore::new();

    // 내 리스팅: 판매 중 1건, 판매 완료 1건
    store.create(test_draft("user-1", "Vintage Camera", 350.0)).await.unwrap();
    let sold = store.create(test_draft("user-1", "Film Scanner", 120.0)).await.unwrap();
    store.set_status(&sold, ListingStatus::Sold).await.unwrap();

    // 다른 판매자의 리스팅: 하나에는 내 입찰, 하나에는 남의 입찰
    let with_my_bid = store.create(test_draft("user-2", "Road Bike", 800.0)).await.unwrap();
    store
        .append_bid(&with_my_bid, Bid::new("user-1", 850.0))
        .await
        .unwrap();
    let without_my_bid = store.create(test_draft("user-3", "Mountain Bike", 600.0)).await.unwrap();
    store
        .append_bid(&without_my_bid, Bid::new("user-2", 650.0))
        .await
        .unwrap();

    let snapshot = store.list_all().await.unwrap();
    let transactions = vec![
        test_transaction(TradeDirection::Sale),
        test_transaction(TradeDirection::Purchase),
    ];

    let stats = DashboardStats::derive("user-1", &snapshot, &transactions);
    assert_eq!(stats.total_sales, 1);
    assert_eq!(stats.total_purchases, 1);
    // 판매 완료된 리스팅은 판매 중 집계에 들어가지 않는다
    assert_eq!(stats.active_listings, 1);
    // 내 입찰이 올라가 있는 판매 중 리스팅만 센다
    assert_eq!(stats.active_bids, 1);
}

/// 가입 직후 프로필은 로그인 사용자 정보로 만들어진다
#[test]
fn test_user_profile_from_principal() {
    let principal = Principal {
        uid: "user-1".to_string(),
        email: "mike@example.com".to_string(),
    };

    let profile = UserProfile::from_principal(&principal, "Mike Wilson");
    assert_eq!(profile.uid, "user-1");
    assert_eq!(profile.email, "mike@example.com");
    assert_eq!(profile.name, "Mike Wilson");
    // 아직 평점과 아바타는 없다
    assert_eq!(profile.rating, 0.0);
    assert!(profile.avatar_url.is_none());
}

/// Firebase 설정은 생성 시점에 검증된다
#[test]
fn test_firebase_config_validation() {
    std::env::remove_var("FIREBASE_API_KEY");
    assert!(FirebaseConfig::from_env().is_err());

    // 예제 값 그대로면 실패
    std::env::set_var("FIREBASE_API_KEY", "your_api_key");
    std::env::set_var("FIREBASE_PROJECT_ID", "demo-project");
    std::env::set_var("FIREBASE_STORAGE_BUCKET", "demo-project.appspot.com");
    assert!(FirebaseConfig::from_env().is_err());

    std::env::set_var("FIREBASE_API_KEY", "AIzaTestKey");
    let config = FirebaseConfig::from_env().unwrap();
    assert!(config.firestore_root().contains("demo-project"));
}
