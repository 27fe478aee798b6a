/// 뷰 라우터
/// 전역 가변 "현재 뷰" 변수 대신, 이름 있는 뷰 상태와 전이 테이블을 가진
/// 명시적 상태 머신. URL 라우팅 없이 메모리 내 내비게이션 상태만 가진다.
// region:    --- Imports
use crate::error::MarketError;
use crate::listing::model::Listing;
use serde::{Deserialize, Serialize};
use tracing::debug;

// endregion: --- Imports

// region:    --- View

/// 화면 뷰
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Home,
    Upload,
    Detail,
    Checkout,
    Map,
    Dashboard,
}

impl View {
    pub fn as_str(&self) -> &'static str {
        match self {
            View::Home => "home",
            View::Upload => "upload",
            View::Detail => "detail",
            View::Checkout => "checkout",
            View::Map => "map",
            View::Dashboard => "dashboard",
        }
    }

    /// 전이 테이블 (단순 내비게이션용)
    ///
    /// Detail은 선택된 리스팅이, Checkout은 Detail 경유가 필요하므로
    /// `navigate`로는 진입할 수 없고 전용 전이로만 들어간다.
    fn allows(self, to: View) -> bool {
        match to {
            View::Home | View::Upload | View::Map | View::Dashboard => true,
            View::Detail | View::Checkout => false,
        }
    }
}

// endregion: --- View

// region:    --- Router

/// 내비게이션 상태 머신
#[derive(Debug, Clone)]
pub struct Router {
    view: View,
    selected: Option<Listing>,
    checkout_bid: Option<f64>,
    search_query: String,
}

impl Router {
    pub fn new() -> Self {
        Router {
            view: View::Home,
            selected: None,
            checkout_bid: None,
            search_query: String::new(),
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn selected(&self) -> Option<&Listing> {
        self.selected.as_ref()
    }

    /// 체크아웃으로 가져갈 선택 입찰 금액
    pub fn checkout_bid(&self) -> Option<f64> {
        self.checkout_bid
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    fn go(&mut self, to: View) {
        debug!(
            "{:<12} --> 뷰 전환: {} -> {}",
            "Router",
            self.view.as_str(),
            to.as_str()
        );
        self.view = to;
    }

    /// 헤더 내비게이션: Home / Upload / Map / Dashboard
    pub fn navigate(&mut self, to: View) -> Result<(), MarketError> {
        if !self.view.allows(to) {
            return Err(MarketError::InvalidTransition {
                state: self.view.as_str(),
                trigger: to.as_str(),
            });
        }
        self.go(to);
        Ok(())
    }

    /// 아이템 클릭: 어느 뷰에서든 상세로 진입
    pub fn open_detail(&mut self, listing: Listing) {
        self.selected = Some(listing);
        self.go(View::Detail);
    }

    /// 상세 → 체크아웃. 입찰 금액을 지정하면 그 금액으로, 아니면 즉시 구매.
    pub fn start_checkout(&mut self, bid_amount: Option<f64>) -> Result<&Listing, MarketError> {
        if self.view != View::Detail || self.selected.is_none() {
            return Err(MarketError::InvalidTransition {
                state: self.view.as_str(),
                trigger: "start_checkout",
            });
        }
        self.checkout_bid = bid_amount;
        self.go(View::Checkout);
        Ok(self.selected.as_ref().unwrap())
    }

    /// 체크아웃 → 상세 (뒤로 가기, 선택 입찰 금액은 버린다)
    pub fn back_to_detail(&mut self) -> Result<(), MarketError> {
        if self.view != View::Checkout {
            return Err(MarketError::InvalidTransition {
                state: self.view.as_str(),
                trigger: "back_to_detail",
            });
        }
        self.checkout_bid = None;
        self.go(View::Detail);
        Ok(())
    }

    /// 체크아웃 완료 → 대시보드
    pub fn complete_checkout(&mut self) -> Result<(), MarketError> {
        if self.view != View::Checkout {
            return Err(MarketError::InvalidTransition {
                state: self.view.as_str(),
                trigger: "complete_checkout",
            });
        }
        self.selected = None;
        self.checkout_bid = None;
        self.go(View::Dashboard);
        Ok(())
    }

    /// 업로드 성공 → 대시보드
    pub fn upload_succeeded(&mut self) -> Result<(), MarketError> {
        if self.view != View::Upload {
            return Err(MarketError::InvalidTransition {
                state: self.view.as_str(),
                trigger: "upload_succeeded",
            });
        }
        self.go(View::Dashboard);
        Ok(())
    }

    /// 홈으로 복귀 (선택과 체크아웃 금액 초기화)
    pub fn back_to_home(&mut self) {
        self.selected = None;
        self.checkout_bid = None;
        self.go(View::Home);
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

// endregion: --- Router
