/// Firebase 백엔드 설정
/// SDK의 불친절한 오류 대신, 빠진 설정은 생성 시점에 바로 잡아낸다.
// region:    --- Imports
use crate::error::MarketError;

// endregion: --- Imports

// region:    --- FirebaseConfig

#[derive(Debug, Clone)]
pub struct FirebaseConfig {
    pub api_key: String,
    pub project_id: String,
    pub storage_bucket: String,
}

impl FirebaseConfig {
    /// 환경 변수에서 설정을 읽는다.
    /// FIREBASE_API_KEY / FIREBASE_PROJECT_ID / FIREBASE_STORAGE_BUCKET
    pub fn from_env() -> Result<Self, MarketError> {
        let api_key = read_var("FIREBASE_API_KEY")?;
        // 예제 값 그대로면 설정이 안 된 것이다
        if api_key == "your_api_key" {
            return Err(MarketError::Persistence(
                "FIREBASE_API_KEY가 예제 값 그대로입니다. 실제 키를 설정하세요.".to_string(),
            ));
        }
        Ok(FirebaseConfig {
            api_key,
            project_id: read_var("FIREBASE_PROJECT_ID")?,
            storage_bucket: read_var("FIREBASE_STORAGE_BUCKET")?,
        })
    }

    /// Firestore 문서 루트 URL
    pub fn firestore_root(&self) -> String {
        format!(
            "https://firestore.googleapis.com/v1/projects/{}/databases/(default)/documents",
            self.project_id
        )
    }
}

fn read_var(name: &'static str) -> Result<String, MarketError> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(MarketError::Persistence(format!(
            "환경 변수 {}가 설정되지 않았습니다",
            name
        ))),
    }
}

// endregion: --- FirebaseConfig
