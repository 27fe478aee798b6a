/// 도메인 에러 정의
/// 모든 에러는 치명적이지 않으며, 자동 재시도는 하지 않는다(사용자 재제출).
// region:    --- Imports
use crate::bidding::validate::BidRejection;
use serde_json::json;
use thiserror::Error;

// endregion: --- Imports

// region:    --- MarketError

/// 마켓플레이스 핵심 에러
#[derive(Debug, Error)]
pub enum MarketError {
    /// 폼 입력 검증 실패 (필수 필드 누락)
    #[error("필수 입력값이 비어 있습니다: {field}")]
    Validation { field: &'static str },

    /// 입찰 거절
    #[error("입찰이 거절되었습니다: {0}")]
    BidRejected(#[from] BidRejection),

    /// 인증 오류 (외부 인증 제공자 메시지를 그대로 전달)
    #[error("인증 오류: {0}")]
    Auth(String),

    /// 업로드 오류 (블롭 스토어 메시지를 그대로 전달)
    #[error("업로드 오류: {0}")]
    Upload(String),

    /// 리스팅 저장소 오류
    #[error("저장소 오류: {0}")]
    Persistence(String),

    /// 존재하지 않는 리스팅
    #[error("리스팅을 찾을 수 없습니다: {id}")]
    NotFound { id: String },

    /// 체크아웃 상태 머신에서 허용되지 않는 트리거
    #[error("{state} 상태에서는 {trigger}를 수행할 수 없습니다")]
    InvalidTransition {
        state: &'static str,
        trigger: &'static str,
    },
}

impl MarketError {
    /// 에러 코드
    pub fn code(&self) -> &'static str {
        match self {
            MarketError::Validation { .. } => "VALIDATION",
            MarketError::BidRejected(r) => r.code(),
            MarketError::Auth(_) => "AUTH",
            MarketError::Upload(_) => "UPLOAD",
            MarketError::Persistence(_) => "PERSISTENCE",
            MarketError::NotFound { .. } => "NOT_FOUND",
            MarketError::InvalidTransition { .. } => "INVALID_TRANSITION",
        }
    }

    /// 표시용 에러 페이로드
    pub fn to_payload(&self) -> serde_json::Value {
        match self {
            MarketError::BidRejected(r) => r.to_payload(),
            other => json!({
                "error": other.to_string(),
                "code": other.code(),
            }),
        }
    }
}

// endregion: --- MarketError
