/// 체크아웃 워크플로
/// 결제 제출 → 처리 중 → 에스크로 보관 → 수취 확인의 선형 상태 머신.
/// 결제 실패 시 자동 재시도 없이 AwaitingPayment로 되돌아간다(사용자 재제출).
// region:    --- Imports
use crate::error::MarketError;
use crate::listing::model::Listing;
use crate::pricing;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Duration};
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Checkout State

/// 체크아웃 상태
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    /// 결제 정보 입력 대기 (초기 상태, 실패한 결제도 여기로 복귀)
    AwaitingPayment,
    /// 외부 결제 수단에 대한 승인 진행 중 (사용자 입력 불가)
    Processing,
    /// 자금이 에스크로에 보관됨. 이 시점에 호출자가 리스팅을 sold로 전환
    EscrowHeld,
    /// 구매자 수취 확인 완료, 자금 지급
    Completed,
}

impl CheckoutState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutState::AwaitingPayment => "AwaitingPayment",
            CheckoutState::Processing => "Processing",
            CheckoutState::EscrowHeld => "EscrowHeld",
            CheckoutState::Completed => "Completed",
        }
    }
}

// endregion: --- Checkout State

// region:    --- Card Details

/// 결제 카드 입력
/// 필수 필드 존재 여부만 검증한다 (Luhn 체크나 실제 결제망 호출은 범위 밖).
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CardDetails {
    pub card_number: String,
    pub expiry: String,
    pub cvv: String,
    pub holder_name: String,
}

impl CardDetails {
    /// 필수 필드 검증
    fn validate(&self) -> Result<(), MarketError> {
        for (value, field) in [
            (&self.card_number, "card_number"),
            (&self.expiry, "expiry"),
            (&self.cvv, "cvv"),
            (&self.holder_name, "holder_name"),
        ] {
            if value.trim().is_empty() {
                return Err(MarketError::Validation { field });
            }
        }
        Ok(())
    }
}

// endregion: --- Card Details

// region:    --- Checkout Session

/// 체크아웃 세션
///
/// 리스팅과 금액 내역, 현재 상태를 묶는 일시적 워크플로 인스턴스.
/// 플로가 끝나거나 중단되면 폐기되며, 기록은 대시보드의 Transaction이 맡는다.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CheckoutSession {
    pub listing_id: String,
    pub listing_title: String,
    pub seller_uid: String,
    /// 선택한 입찰 금액, 없으면 현재 최고가, 그것도 없으면 시작가
    pub final_amount: f64,
    pub escrow_fee: f64,
    pub total_amount: f64,
    /// 명시적 입찰 금액으로 열렸는지 (주문 요약의 "Your Bid" / "Item Price" 구분)
    pub from_bid: bool,
    state: CheckoutState,
}

impl CheckoutSession {
    /// 세션 생성. 금액 계산은 전부 pricing 모듈에 위임한다.
    pub fn new(listing: &Listing, bid_amount: Option<f64>) -> Self {
        let final_amount = bid_amount
            .or(listing.current_bid)
            .unwrap_or(listing.base_price);
        CheckoutSession {
            listing_id: listing.id.clone(),
            listing_title: listing.title.clone(),
            seller_uid: listing.owner_uid.clone(),
            final_amount,
            escrow_fee: pricing::escrow_fee(final_amount),
            total_amount: pricing::total_with_fee(final_amount),
            from_bid: bid_amount.is_some(),
            state: CheckoutState::AwaitingPayment,
        }
    }

    pub fn state(&self) -> CheckoutState {
        self.state
    }

    /// 결제 제출: AwaitingPayment → Processing
    /// 카드 입력이 불완전하면 상태를 바꾸지 않고 검증 에러를 돌려준다.
    pub fn submit_payment(&mut self, card: &CardDetails) -> Result<(), MarketError> {
        if self.state != CheckoutState::AwaitingPayment {
            return Err(MarketError::InvalidTransition {
                state: self.state.as_str(),
                trigger: "submit_payment",
            });
        }
        card.validate()?;

        info!(
            "{:<12} --> 결제 제출: {} (총액 {})",
            "Checkout",
            self.listing_id,
            pricing::display_amount(self.total_amount)
        );
        self.state = CheckoutState::Processing;
        Ok(())
    }

    /// 승인 성공: Processing → EscrowHeld
    pub fn payment_succeeded(&mut self) -> Result<(), MarketError> {
        if self.state != CheckoutState::Processing {
            return Err(MarketError::InvalidTransition {
                state: self.state.as_str(),
                trigger: "payment_succeeded",
            });
        }
        info!(
            "{:<12} --> 에스크로 보관: {} ({})",
            "Checkout",
            self.listing_id,
            pricing::display_amount(self.final_amount)
        );
        self.state = CheckoutState::EscrowHeld;
        Ok(())
    }

    /// 승인 실패: Processing → AwaitingPayment
    /// 시뮬레이션 게이트웨이는 이 간선을 타지 않지만, 전이 자체는 모델에 존재한다.
    pub fn payment_failed(&mut self) -> Result<(), MarketError> {
        if self.state != CheckoutState::Processing {
            return Err(MarketError::InvalidTransition {
                state: self.state.as_str(),
                trigger: "payment_failed",
            });
        }
        warn!("{:<12} --> 결제 실패, 재입력 대기: {}", "Checkout", self.listing_id);
        self.state = CheckoutState::AwaitingPayment;
        Ok(())
    }

    /// 수취 확인: EscrowHeld → Completed (자금 지급)
    pub fn confirm_receipt(&mut self) -> Result<(), MarketError> {
        if self.state != CheckoutState::EscrowHeld {
            return Err(MarketError::InvalidTransition {
                state: self.state.as_str(),
                trigger: "confirm_receipt",
            });
        }
        info!("{:<12} --> 수취 확인, 자금 지급: {}", "Checkout", self.listing_id);
        self.state = CheckoutState::Completed;
        Ok(())
    }
}

// endregion: --- Checkout Session

// region:    --- Payment Gateway

/// 외부 결제 협력자
/// 승인은 단발성 비동기 호출이며 정확히 한 번만 성공 또는 실패로 끝난다.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn authorize(&self, amount: f64) -> Result<(), String>;
}

/// 결제 처리 결과
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentOutcome {
    /// 자금이 에스크로에 보관됨
    EscrowHeld,
    /// 승인 거절, 세션은 AwaitingPayment로 복귀
    Declined { reason: String },
}

/// Processing 상태를 게이트웨이 승인 한 번으로 통과시킨다.
/// 성공이면 EscrowHeld, 실패면 AwaitingPayment로 복귀하고 거절 사유를 돌려준다.
pub async fn process_payment(
    session: &mut CheckoutSession,
    gateway: &impl PaymentGateway,
) -> Result<PaymentOutcome, MarketError> {
    if session.state() != CheckoutState::Processing {
        return Err(MarketError::InvalidTransition {
            state: session.state().as_str(),
            trigger: "process_payment",
        });
    }

    match gateway.authorize(session.total_amount).await {
        Ok(()) => {
            session.payment_succeeded()?;
            Ok(PaymentOutcome::EscrowHeld)
        }
        Err(reason) => {
            session.payment_failed()?;
            Ok(PaymentOutcome::Declined { reason })
        }
    }
}

/// 시뮬레이션 게이트웨이
/// 고정 지연 후 항상 성공한다.
pub struct SimulatedGateway {
    delay: Duration,
}

impl SimulatedGateway {
    pub fn new(delay: Duration) -> Self {
        SimulatedGateway { delay }
    }
}

impl Default for SimulatedGateway {
    fn default() -> Self {
        SimulatedGateway::new(Duration::from_secs(2))
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn authorize(&self, amount: f64) -> Result<(), String> {
        info!(
            "{:<12} --> 결제 승인 요청: {}",
            "Gateway",
            pricing::display_amount(amount)
        );
        sleep(self.delay).await;
        Ok(())
    }
}

// endregion: --- Payment Gateway
