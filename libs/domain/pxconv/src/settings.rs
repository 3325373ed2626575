use chrono::{DateTime, TimeDelta, Utc};
use pxfx::{Ccy, RateTable};
use pxstore::{decode_record, encode_record, KvBackend};

/// The single opaque key the settings blob is persisted under.
pub const SETTINGS_KEY: &str = "appData";

/// Hours after which a cached rate table counts as stale.
pub const RATE_REFRESH_HOURS: i64 = 12;

// -----------------------------------------------------------------------------
// AppSettings
// -----------------------------------------------------------------------------
/// The persisted application state: chosen target currency, the cached rate
/// table, and when it was last refreshed.
///
/// Created once through the selection prompt on first run; the rate table
/// and timestamp are replaced wholesale by a refresh, never merged.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub target_currency: Ccy,
    pub exchange_rates: RateTable,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[schemars(with = "i64")]
    pub last_update: DateTime<Utc>,
}

impl AppSettings {
    /// Whether the rate table is due for a refresh at `now`.
    ///
    /// ```
    /// use chrono::{TimeDelta, Utc};
    /// use pxconv::settings::AppSettings;
    /// use pxfx::{Ccy, RateTable};
    ///
    /// let now = Utc::now();
    /// let settings = AppSettings {
    ///     target_currency: Ccy::USD,
    ///     exchange_rates: RateTable::default(),
    ///     last_update: now - TimeDelta::hours(13),
    /// };
    /// assert!(settings.is_stale(now));
    /// ```
    #[inline]
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        now - self.last_update > TimeDelta::hours(RATE_REFRESH_HOURS)
    }
}

// -----------------------------------------------------------------------------
// SettingsRepository
// -----------------------------------------------------------------------------
/// Read-through/write-through access to the persisted settings blob.
///
/// The in-memory copy serves repeated reads within one page lifetime; every
/// write goes straight to the backend. An unreadable persisted record is
/// logged and reported as absent, which sends the caller into first-run
/// setup.
#[derive(Debug)]
pub struct SettingsRepository<S> {
    backend: S,
    cached: Option<AppSettings>,
}

impl<S: KvBackend> SettingsRepository<S> {
    pub fn new(backend: S) -> Self {
        Self {
            backend,
            cached: None,
        }
    }

    /// The settings, from cache or the backend.
    pub fn load(&mut self) -> Option<&AppSettings> {
        if self.cached.is_none() {
            self.cached = self.read_backend();
        }
        self.cached.as_ref()
    }

    /// The in-memory copy, without touching the backend.
    #[inline]
    pub fn cached(&self) -> Option<&AppSettings> {
        self.cached.as_ref()
    }

    /// Persist `settings` and make it the in-memory copy.
    ///
    /// # Errors
    /// - The record cannot be encoded.
    pub fn store(&mut self, settings: AppSettings) -> anyhow::Result<()> {
        let text = encode_record(&settings)?;
        self.backend.set(SETTINGS_KEY, text);
        self.cached = Some(settings);
        Ok(())
    }

    /// Drop the persisted record and the in-memory copy.
    pub fn clear(&mut self) {
        self.backend.delete(SETTINGS_KEY);
        self.cached = None;
    }

    fn read_backend(&self) -> Option<AppSettings> {
        let text = self.backend.get(SETTINGS_KEY)?;
        match decode_record(&text) {
            Ok(settings) => Some(settings),
            Err(err) => {
                log::warn!("persisted settings are unreadable, treating as absent: {err}");
                None
            }
        }
    }
}
