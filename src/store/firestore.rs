/// Firestore / Firebase Storage REST 구현
///
/// REST에는 실시간 listen 채널이 없으므로 구독은 주기 폴링으로 구현하고,
/// 스냅샷이 달라졌을 때만 콜백으로 푸시한다.
// region:    --- Imports
use crate::config::FirebaseConfig;
use crate::error::MarketError;
use crate::listing::model::{Bid, GeoPoint, Listing, ListingStatus, NewListing};
use crate::store::{BlobStore, ListingCallback, ListingStore, ProgressFn, Subscription};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tokio::time::{interval, Duration};
use tracing::{debug, error, info};

// endregion: --- Imports

// region:    --- Firestore Listing Store

const COLLECTION: &str = "listings";

/// Firestore 기반 리스팅 저장소
pub struct FirestoreListingStore {
    client: reqwest::Client,
    config: FirebaseConfig,
    /// 구독 폴링 주기
    poll_interval: Duration,
}

impl FirestoreListingStore {
    pub fn new(config: FirebaseConfig) -> Self {
        FirestoreListingStore {
            client: reqwest::Client::new(),
            config,
            poll_interval: Duration::from_secs(2),
        }
    }

    fn doc_url(&self, id: &str) -> String {
        format!("{}/{}/{}", self.config.firestore_root(), COLLECTION, id)
    }

    fn run_query_url(&self) -> String {
        format!("{}:runQuery", self.config.firestore_root())
    }

    /// 소유자 필터 쿼리 실행 (생성 시각 내림차순)
    async fn query_by_owner(
        client: &reqwest::Client,
        url: &str,
        owner_uid: Option<&str>,
    ) -> Result<Vec<Listing>, MarketError> {
        let mut structured = json!({
            "from": [{ "collectionId": COLLECTION }],
            "orderBy": [{
                "field": { "fieldPath": "createdAt" },
                "direction": "DESCENDING"
            }]
        });
        if let Some(owner) = owner_uid {
            structured["where"] = json!({
                "fieldFilter": {
                    "field": { "fieldPath": "ownerUid" },
                    "op": "EQUAL",
                    "value": { "stringValue": owner }
                }
            });
        }

        let response = client
            .post(url)
            .json(&json!({ "structuredQuery": structured }))
            .send()
            .await
            .map_err(|e| MarketError::Persistence(e.to_string()))?;
        let rows: Value = check_ok(response).await?.json::<Value>().await.map_err(|e| {
            MarketError::Persistence(e.to_string())
        })?;

        let mut listings = Vec::new();
        for row in rows.as_array().into_iter().flatten() {
            if let Some(doc) = row.get("document") {
                listings.push(decode_listing(doc)?);
            }
        }
        Ok(listings)
    }
}

#[async_trait]
impl ListingStore for FirestoreListingStore {
    async fn create(&self, draft: NewListing) -> Result<String, MarketError> {
        let listing = Listing {
            id: String::new(), // 문서 id는 Firestore가 부여
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

        let url = format!("{}/{}", self.config.firestore_root(), COLLECTION);
        let response = self
            .client
            .post(&url)
            .json(&json!({ "fields": encode_fields(&listing) }))
            .send()
            .await
            .map_err(|e| MarketError::Persistence(e.to_string()))?;
        let doc: Value = check_ok(response)
            .await?
            .json()
            .await
            .map_err(|e| MarketError::Persistence(e.to_string()))?;

        let id = doc_id(&doc)?;
        info!("{:<12} --> 리스팅 생성: {}", "Firestore", id);
        Ok(id)
    }

    async fn get(&self, id: &str) -> Result<Listing, MarketError> {
        let response = self
            .client
            .get(self.doc_url(id))
            .send()
            .await
            .map_err(|e| MarketError::Persistence(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(MarketError::NotFound { id: id.to_string() });
        }
        let doc: Value = check_ok(response)
            .await?
            .json()
            .await
            .map_err(|e| MarketError::Persistence(e.to_string()))?;
        decode_listing(&doc)
    }

    async fn list_all(&self) -> Result<Vec<Listing>, MarketError> {
        Self::query_by_owner(&self.client, &self.run_query_url(), None).await
    }

    async fn append_bid(&self, listing_id: &str, bid: Bid) -> Result<Listing, MarketError> {
        // 읽고-수정하고-덮어쓴다. 동시 입찰은 last-write-wins로 남는다.
        let mut listing = self.get(listing_id).await?;
        listing.bids.push(bid);
        listing.recompute_current_bid();

        let response = self
            .client
            .patch(self.doc_url(listing_id))
            .json(&json!({ "fields": encode_fields(&listing) }))
            .send()
            .await
            .map_err(|e| MarketError::Persistence(e.to_string()))?;
        check_ok(response).await?;

        Ok(listing)
    }

    async fn set_status(
        &self,
        listing_id: &str,
        status: ListingStatus,
    ) -> Result<(), MarketError> {
        let url = format!("{}?updateMask.fieldPaths=status", self.doc_url(listing_id));
        let response = self
            .client
            .patch(&url)
            .json(&json!({
                "fields": { "status": str_value(status.as_str()) }
            }))
            .send()
            .await
            .map_err(|e| MarketError::Persistence(e.to_string()))?;
        check_ok(response).await?;

        info!(
            "{:<12} --> 리스팅 상태 전환: {} -> {}",
            "Firestore",
            listing_id,
            status.as_str()
        );
        Ok(())
    }

    fn subscribe_by_owner(&self, owner_uid: &str, callback: ListingCallback) -> Subscription {
        let client = self.client.clone();
        let url = self.run_query_url();
        let owner = owner_uid.to_string();
        let poll = self.poll_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = interval(poll);
            let mut last_snapshot: Option<String> = None;

            loop {
                ticker.tick().await;
                match Self::query_by_owner(&client, &url, Some(&owner)).await {
                    Ok(listings) => {
                        // 변경이 있을 때만 푸시
                        let fingerprint =
                            serde_json::to_string(&listings).unwrap_or_default();
                        if last_snapshot.as_deref() != Some(fingerprint.as_str()) {
                            last_snapshot = Some(fingerprint);
                            callback(listings);
                        }
                    }
                    Err(e) => {
                        error!("{:<12} --> 구독 폴링 오류: {}", "Firestore", e);
                    }
                }
            }
        });

        debug!("{:<12} --> 소유자 구독 시작: {}", "Firestore", owner_uid);
        Subscription::new(handle)
    }
}

// endregion: --- Firestore Listing Store

// region:    --- Firebase Blob Store

/// Firebase Storage 기반 블롭 저장소
pub struct FirebaseBlobStore {
    client: reqwest::Client,
    config: FirebaseConfig,
}

impl FirebaseBlobStore {
    pub fn new(config: FirebaseConfig) -> Self {
        FirebaseBlobStore {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl BlobStore for FirebaseBlobStore {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        on_progress: ProgressFn,
    ) -> Result<String, MarketError> {
        // REST 업로드는 단발성이라 중간 진행률이 없다: 시작 0, 완료 100
        on_progress(0);

        let upload_url = format!(
            "https://firebasestorage.googleapis.com/v0/b/{}/o?uploadType=media&name={}",
            self.config.storage_bucket,
            encode_path(path)
        );
        let response = self
            .client
            .post(&upload_url)
            .header("Content-Type", "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .map_err(|e| MarketError::Upload(e.to_string()))?;

        if !response.status().is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MarketError::Upload(message));
        }
        on_progress(100);

        let url = format!(
            "https://firebasestorage.googleapis.com/v0/b/{}/o/{}?alt=media",
            self.config.storage_bucket,
            encode_path(path)
        );
        info!("{:<12} --> 업로드 완료: {}", "Firestore", path);
        Ok(url)
    }
}

/// 스토리지 오브젝트 경로 인코딩 (경로 구분자 포함 퍼센트 인코딩)
fn encode_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for byte in path.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

// endregion: --- Firebase Blob Store

// region:    --- Document Codec

/// 응답 상태 확인, 실패면 본문을 메시지로 전달
async fn check_ok(response: reqwest::Response) -> Result<reqwest::Response, MarketError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(MarketError::Persistence(format!("{}: {}", status, body)))
    }
}

/// 문서 name 끝 세그먼트가 id
fn doc_id(doc: &Value) -> Result<String, MarketError> {
    doc.get("name")
        .and_then(Value::as_str)
        .and_then(|name| name.rsplit('/').next())
        .map(str::to_string)
        .ok_or_else(|| MarketError::Persistence("문서에 name 필드가 없습니다".to_string()))
}

fn str_value(v: &str) -> Value {
    json!({ "stringValue": v })
}

fn num_value(v: f64) -> Value {
    json!({ "doubleValue": v })
}

fn ts_value(t: &DateTime<Utc>) -> Value {
    json!({ "timestampValue": t.to_rfc3339() })
}

/// 리스팅 → Firestore fields
pub(crate) fn encode_fields(listing: &Listing) -> Value {
    let mut fields = json!({
        "ownerUid": str_value(&listing.owner_uid),
        "title": str_value(&listing.title),
        "description": str_value(&listing.description),
        "basePrice": num_value(listing.base_price),
        "status": str_value(listing.status.as_str()),
        "createdAt": ts_value(&listing.created_at),
        "tags": json!({ "arrayValue": { "values":
            listing.tags.iter().map(|t| str_value(t)).collect::<Vec<_>>() } }),
        "bids": json!({ "arrayValue": { "values":
            listing.bids.iter().map(encode_bid).collect::<Vec<_>>() } }),
    });
    if let Some(bid) = listing.current_bid {
        fields["currentBid"] = num_value(bid);
    }
    if let Some(url) = &listing.image_url {
        fields["imageUrl"] = str_value(url);
    }
    if let Some(url) = &listing.video_url {
        fields["videoUrl"] = str_value(url);
    }
    if let Some(location) = &listing.location {
        fields["location"] = json!({ "mapValue": { "fields": {
            "lat": num_value(location.lat),
            "lng": num_value(location.lng),
            "distanceKm": num_value(location.distance_km),
            "address": str_value(&location.address),
        } } });
    }
    fields
}

fn encode_bid(bid: &Bid) -> Value {
    json!({ "mapValue": { "fields": {
        "id": str_value(&bid.id),
        "bidderUid": str_value(&bid.bidder_uid),
        "amount": num_value(bid.amount),
        "placedAt": ts_value(&bid.placed_at),
    } } })
}

/// Firestore 문서 → 리스팅
pub(crate) fn decode_listing(doc: &Value) -> Result<Listing, MarketError> {
    let fields = doc
        .get("fields")
        .ok_or_else(|| malformed("fields"))?;

    let status = match get_str(fields, "status")? {
        "active" => ListingStatus::Active,
        "sold" => ListingStatus::Sold,
        "pending" => ListingStatus::Pending,
        other => {
            return Err(MarketError::Persistence(format!(
                "알 수 없는 리스팅 상태: {}",
                other
            )))
        }
    };

    let mut bids = Vec::new();
    if let Some(values) = array_values(fields, "bids") {
        for value in values {
            bids.push(decode_bid(value)?);
        }
    }

    let location = fields
        .get("location")
        .and_then(|v| v.pointer("/mapValue/fields"))
        .map(|f| -> Result<GeoPoint, MarketError> {
            Ok(GeoPoint {
                lat: get_number(f, "lat")?,
                lng: get_number(f, "lng")?,
                distance_km: get_number(f, "distanceKm")?,
                address: get_str(f, "address")?.to_string(),
            })
        })
        .transpose()?;

    Ok(Listing {
        id: doc_id(doc)?,
        owner_uid: get_str(fields, "ownerUid")?.to_string(),
        title: get_str(fields, "title")?.to_string(),
        description: get_str(fields, "description")?.to_string(),
        base_price: get_number(fields, "basePrice")?,
        current_bid: opt_number(fields, "currentBid"),
        image_url: opt_str(fields, "imageUrl"),
        video_url: opt_str(fields, "videoUrl"),
        tags: array_values(fields, "tags")
            .map(|values| {
                values
                    .iter()
                    .filter_map(|v| v.get("stringValue").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        location,
        status,
        created_at: get_timestamp(fields, "createdAt")?,
        bids,
    })
}

fn decode_bid(value: &Value) -> Result<Bid, MarketError> {
    let fields = value
        .pointer("/mapValue/fields")
        .ok_or_else(|| malformed("bids"))?;
    Ok(Bid {
        id: get_str(fields, "id")?.to_string(),
        bidder_uid: get_str(fields, "bidderUid")?.to_string(),
        amount: get_number(fields, "amount")?,
        placed_at: get_timestamp(fields, "placedAt")?,
    })
}

fn malformed(field: &str) -> MarketError {
    MarketError::Persistence(format!("문서 필드가 올바르지 않습니다: {}", field))
}

fn get_str<'a>(fields: &'a Value, name: &str) -> Result<&'a str, MarketError> {
    fields
        .pointer(&format!("/{}/stringValue", name))
        .and_then(Value::as_str)
        .ok_or_else(|| malformed(name))
}

fn opt_str(fields: &Value, name: &str) -> Option<String> {
    fields
        .pointer(&format!("/{}/stringValue", name))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// 숫자 필드: doubleValue 또는 integerValue(문자열)로 저장될 수 있다
fn opt_number(fields: &Value, name: &str) -> Option<f64> {
    let value = fields.get(name)?;
    if let Some(n) = value.get("doubleValue").and_then(Value::as_f64) {
        return Some(n);
    }
    value
        .get("integerValue")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
}

fn get_number(fields: &Value, name: &str) -> Result<f64, MarketError> {
    opt_number(fields, name).ok_or_else(|| malformed(name))
}

fn get_timestamp(fields: &Value, name: &str) -> Result<DateTime<Utc>, MarketError> {
    fields
        .pointer(&format!("/{}/timestampValue", name))
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
        .ok_or_else(|| malformed(name))
}

fn array_values<'a>(fields: &'a Value, name: &str) -> Option<&'a Vec<Value>> {
    fields
        .pointer(&format!("/{}/arrayValue/values", name))
        .and_then(Value::as_array)
}

// endregion: --- Document Codec
