//! Kho tạm cho dữ liệu chart của khách, truy cập bằng token và có hạn dùng.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use lifechart_core::LifeChartConfig;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

/// Nguồn thời điểm hiện tại cho việc xét hết hạn.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Đồng hồ hệ thống, theo UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Đồng hồ chỉ chạy khi được chỉnh tay.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error("Liên kết chia sẻ không tồn tại")]
    NotFound,
    #[error("Liên kết chia sẻ đã hết hạn")]
    Expired,
    #[error("Không mã hoá hoặc giải mã được dữ liệu chia sẻ: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Dữ liệu đã lưu cùng khoảng thời gian hiệu lực.
#[derive(Debug, Clone, PartialEq)]
pub struct GuestShareEntry {
    pub token: String,
    pub data_json: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl GuestShareEntry {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Trạng thái của token nhìn từ bên ngoài kho.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareState {
    Active,
    Expired,
    Deleted,
}

/// Kho chia sẻ với thời gian sống cố định cho mỗi mục.
///
/// Mục hết hạn bị xoá khi `resolve` gặp nó, và hàng loạt bởi
/// [`GuestShareStore::sweep`] (chạy trước mỗi lần `create`).
#[derive(Debug)]
pub struct GuestShareStore<C: Clock = SystemClock> {
    entries: Mutex<HashMap<String, GuestShareEntry>>,
    ttl: Duration,
    clock: C,
}

impl GuestShareStore<SystemClock> {
    pub fn new(config: &LifeChartConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> GuestShareStore<C> {
    pub fn with_clock(config: &LifeChartConfig, clock: C) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: Duration::minutes(i64::from(config.share_ttl_minutes)),
            clock,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Lưu `payload` và trả về một token mới.
    pub fn create<T>(&self, payload: &T) -> Result<String, ShareError>
    where
        T: Serialize + ?Sized,
    {
        let data_json = serde_json::to_string(payload)?;
        let now = self.clock.now();

        let mut entries = self.lock();
        let swept = sweep_locked(&mut entries, now);
        if swept > 0 {
            tracing::info!(swept, "removed expired guest shares");
        }

        let mut token = Uuid::new_v4().to_string();
        while entries.contains_key(&token) {
            token = Uuid::new_v4().to_string();
        }

        let entry = GuestShareEntry {
            token: token.clone(),
            data_json,
            created_at: now,
            expires_at: now + self.ttl,
        };
        tracing::info!(expires_at = %entry.expires_at, "created guest share");
        entries.insert(token.clone(), entry);
        Ok(token)
    }

    /// Dữ liệu gắn với `token`; mục đã hết hạn bị xoá luôn.
    pub fn resolve<T>(&self, token: &str) -> Result<T, ShareError>
    where
        T: DeserializeOwned,
    {
        let now = self.clock.now();
        let data_json = {
            let mut entries = self.lock();
            let entry = entries.get(token).ok_or(ShareError::NotFound)?;
            if entry.is_expired_at(now) {
                entries.remove(token);
                tracing::info!("guest share expired on access");
                return Err(ShareError::Expired);
            }
            entry.data_json.clone()
        };
        Ok(serde_json::from_str(&data_json)?)
    }

    /// Xoá mọi mục có hạn dùng trước thời điểm hiện tại; trả về số mục đã xoá.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let swept = sweep_locked(&mut self.lock(), now);
        if swept > 0 {
            tracing::info!(swept, "removed expired guest shares");
        }
        swept
    }

    /// Trạng thái hiện tại của `token`, không xoá gì.
    pub fn state(&self, token: &str) -> ShareState {
        let now = self.clock.now();
        match self.lock().get(token) {
            None => ShareState::Deleted,
            Some(entry) if entry.is_expired_at(now) => ShareState::Expired,
            Some(_) => ShareState::Active,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, GuestShareEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn sweep_locked(entries: &mut HashMap<String, GuestShareEntry>, now: DateTime<Utc>) -> usize {
    let before = entries.len();
    entries.retain(|_, entry| entry.expires_at >= now);
    before - entries.len()
}

/// Đường dẫn URL công khai của token chia sẻ.
pub fn share_path(token: &str) -> String {
    format!("/guest/share/{token}")
}
