use chrono::Utc;
use marketplace_core::bidding::validate::{validate_bid, BidRejection};
use marketplace_core::listing::model::{Bid, Listing, ListingStatus};
use marketplace_core::pricing;

/// 테스트용 리스팅 생성
fn test_listing(base_price: f64, bid_amounts: &[f64]) -> Listing {
    let mut listing = Listing {
        id: "listing-1".to_string(),
        owner_uid: "seller-1".to_string(),
        title: "Vintage Camera".to_string(),
        description: "Classic 35mm film camera".to_string(),
        base_price,
        current_bid: None,
        image_url: None,
        video_url: None,
        tags: vec![],
        location: None,
        status: ListingStatus::Active,
        created_at: Utc::now(),
        bids: bid_amounts
            .iter()
            .map(|&amount| Bid::new("bidder-1", amount))
            .collect(),
    };
    listing.recompute_current_bid();
    listing
}

/// 최소 입찰가: (현재 최고가 ?? 시작가) + 5
#[test]
fn test_minimum_next_bid() {
    let no_bids = test_listing(350.0, &[]);
    assert_eq!(pricing::minimum_next_bid(&no_bids), 355.0);

    let with_bids = test_listing(350.0, &[365.0, 380.0]);
    assert_eq!(pricing::minimum_next_bid(&with_bids), 385.0);
}

/// 현재 가격: 최고 입찰가가 시작가보다 높을 때만 최고 입찰가
#[test]
fn test_current_price() {
    let no_bids = test_listing(350.0, &[]);
    assert_eq!(pricing::current_price(&no_bids), 350.0);

    let with_bids = test_listing(350.0, &[380.0]);
    assert_eq!(pricing::current_price(&with_bids), 380.0);

    // 시작가 이하의 최고 입찰가는 시작가로 덮인다
    let mut low_bid = test_listing(350.0, &[]);
    low_bid.current_bid = Some(300.0);
    assert_eq!(pricing::current_price(&low_bid), 350.0);
}

/// 수수료 계산: total_with_fee(a) == a + a * 0.03 (허용 오차 1e-9)
#[test]
fn test_fee_arithmetic() {
    for amount in [1.0, 350.0, 850.0, 900.0, 12345.67] {
        let expected = amount + amount * 0.03;
        assert!((pricing::total_with_fee(amount) - expected).abs() < 1e-9);
        assert!((pricing::escrow_fee(amount) - amount * 0.03).abs() < 1e-9);
    }
}

/// 반올림은 표시 시점에만
#[test]
fn test_display_amount() {
    assert_eq!(pricing::display_amount(25.5), "R25.50");
    assert_eq!(pricing::display_amount(875.504), "R875.50");
    assert_eq!(pricing::display_amount(927.0), "R927.00");
}

/// 최소 입찰가 경계에서 수락/거절
#[test]
fn test_validate_bid_boundary() {
    let listing = test_listing(350.0, &[380.0]);
    let minimum = pricing::minimum_next_bid(&listing);

    // 최소 미달은 거절 (계산된 최소 금액을 함께 돌려준다)
    assert_eq!(
        validate_bid(&listing, minimum - 0.01),
        Err(BidRejection::BelowMinimum { minimum })
    );

    // 최소 이상은 수락
    assert_eq!(validate_bid(&listing, minimum), Ok(()));
    assert_eq!(validate_bid(&listing, minimum + 100.0), Ok(()));
}

/// active가 아닌 리스팅은 금액과 무관하게 거절
#[test]
fn test_validate_bid_inactive_listing() {
    for status in [ListingStatus::Sold, ListingStatus::Pending] {
        let mut listing = test_listing(350.0, &[380.0]);
        listing.status = status;

        for amount in [0.0, 385.0, 1_000_000.0] {
            assert!(matches!(
                validate_bid(&listing, amount),
                Err(BidRejection::ListingNotActive { .. })
            ));
        }
    }
}

/// 유한하지 않거나 음수인 금액은 거절
#[test]
fn test_validate_bid_invalid_amount() {
    let listing = test_listing(350.0, &[]);
    for amount in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -1.0] {
        assert_eq!(
            validate_bid(&listing, amount),
            Err(BidRejection::InvalidAmount)
        );
    }
}

/// 거절 페이로드에는 코드와 최소 입찰가가 담긴다
#[test]
fn test_rejection_payload() {
    let payload = BidRejection::BelowMinimum { minimum: 385.0 }.to_payload();
    assert_eq!(payload["code"], "BELOW_MINIMUM");
    assert_eq!(payload["minimum_next_bid"], 385.0);
}
