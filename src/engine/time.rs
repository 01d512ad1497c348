use std::sync::Mutex;
use tokio::time::Duration;

/// Wall clock used for record timestamps and for the mirror provisioning grace period.
#[async_trait::async_trait]
pub trait Clock: Send + Sync {
    /// Seconds since the unix epoch.
    fn unix_now(&self) -> u64;

    async fn sleep(&self, duration: Duration);
}

#[derive(Copy, Clone, Debug, Default)]
pub struct RealClock;

#[async_trait::async_trait]
impl Clock for RealClock {
    fn unix_now(&self) -> u64 {
        let now = chrono::Utc::now().timestamp();
        if now < 0 {
            0
        } else {
            now as u64
        }
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// A clock that only moves when told to. Sleeping returns immediately and advances the clock by
/// the requested amount, so tests can assert on waits without waiting.
#[derive(Debug)]
pub struct ManualClock {
    inner: Mutex<ManualClockState>,
}

#[derive(Debug)]
struct ManualClockState {
    unix_now: u64,
    sleeps: Vec<Duration>,
}

impl ManualClock {
    pub fn new(unix_now: u64) -> Self {
        ManualClock {
            inner: Mutex::new(ManualClockState { unix_now, sleeps: vec![] }),
        }
    }

    pub fn set(&self, unix_now: u64) {
        self.lock().unix_now = unix_now;
    }

    pub fn advance(&self, duration: Duration) {
        self.lock().unix_now += duration.as_secs();
    }

    /// Every duration `sleep()` was asked for, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.lock().sleeps.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualClockState> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait::async_trait]
impl Clock for ManualClock {
    fn unix_now(&self) -> u64 {
        self.lock().unix_now
    }

    async fn sleep(&self, duration: Duration) {
        let mut state = self.lock();
        state.sleeps.push(duration);
        state.unix_now += duration.as_secs();
    }
}
