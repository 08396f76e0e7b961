use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::str::FromStr;
use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator};

use crate::domain::errors::AppResult;

/// Device-local key holding the serialized `ChartSettings`.
pub const SETTINGS_STORAGE_KEY: &str = "borsa_terminal_settings";

/// Toggleable chart element, keyed as in the persisted settings blob
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum IndicatorId {
    Rsi,
    Macd,
    Stoch,
    Atr,
    Mfi,
    Cci,
    WilliamsR,
    Cmf,
    Volume,
    Ma20,
    Ma50,
    Ma200,
    Ema9,
    Ema21,
    Bb,
    BbPct,
    Nw,
    NwEnv,
    Supertrend,
    Vwap,
    AiPatterns,
}

impl IndicatorId {
    pub fn default_visible(&self) -> bool {
        matches!(self, IndicatorId::Ma20 | IndicatorId::Ma50 | IndicatorId::Nw)
    }

    pub fn label(&self) -> &'static str {
        match self {
            IndicatorId::Rsi => "RSI",
            IndicatorId::Macd => "MACD",
            IndicatorId::Stoch => "Stochastic",
            IndicatorId::Atr => "ATR",
            IndicatorId::Mfi => "MFI",
            IndicatorId::Cci => "CCI",
            IndicatorId::WilliamsR => "Williams %R",
            IndicatorId::Cmf => "CMF",
            IndicatorId::Volume => "Volume",
            IndicatorId::Ma20 => "MA 20",
            IndicatorId::Ma50 => "MA 50",
            IndicatorId::Ma200 => "MA 200",
            IndicatorId::Ema9 => "EMA 9",
            IndicatorId::Ema21 => "EMA 21",
            IndicatorId::Bb => "Bollinger Bands",
            IndicatorId::BbPct => "Bollinger %B",
            IndicatorId::Nw => "Nadaraya-Watson",
            IndicatorId::NwEnv => "NW Envelope",
            IndicatorId::Supertrend => "SuperTrend",
            IndicatorId::Vwap => "VWAP",
            IndicatorId::AiPatterns => "AI Patterns",
        }
    }

    /// Elements that get their own pane instead of overlaying the price pane.
    pub fn secondary_pane(&self) -> Option<SecondaryPane> {
        SecondaryPane::ORDER.iter().copied().find(|pane| pane.indicator() == *self)
    }
}

/// Secondary panes in top-to-bottom order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecondaryPane {
    Volume,
    Rsi,
    Macd,
    Stoch,
    Atr,
    Mfi,
    Cci,
    WilliamsR,
    Cmf,
}

impl SecondaryPane {
    pub const ORDER: [SecondaryPane; 9] = [
        SecondaryPane::Volume,
        SecondaryPane::Rsi,
        SecondaryPane::Macd,
        SecondaryPane::Stoch,
        SecondaryPane::Atr,
        SecondaryPane::Mfi,
        SecondaryPane::Cci,
        SecondaryPane::WilliamsR,
        SecondaryPane::Cmf,
    ];

    pub fn indicator(&self) -> IndicatorId {
        match self {
            SecondaryPane::Volume => IndicatorId::Volume,
            SecondaryPane::Rsi => IndicatorId::Rsi,
            SecondaryPane::Macd => IndicatorId::Macd,
            SecondaryPane::Stoch => IndicatorId::Stoch,
            SecondaryPane::Atr => IndicatorId::Atr,
            SecondaryPane::Mfi => IndicatorId::Mfi,
            SecondaryPane::Cci => IndicatorId::Cci,
            SecondaryPane::WilliamsR => IndicatorId::WilliamsR,
            SecondaryPane::Cmf => IndicatorId::Cmf,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            SecondaryPane::Volume => "VOL",
            SecondaryPane::Rsi => "RSI",
            SecondaryPane::Macd => "MACD",
            SecondaryPane::Stoch => "STOCH",
            SecondaryPane::Atr => "ATR",
            SecondaryPane::Mfi => "MFI",
            SecondaryPane::Cci => "CCI",
            SecondaryPane::WilliamsR => "W%R",
            SecondaryPane::Cmf => "CMF",
        }
    }
}

/// Which chart elements are shown. Unknown keys in stored blobs are ignored,
/// missing keys fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, bool>", into = "BTreeMap<String, bool>")]
pub struct VisibilityConfig {
    flags: BTreeMap<IndicatorId, bool>,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self { flags: IndicatorId::iter().map(|id| (id, id.default_visible())).collect() }
    }
}

impl From<BTreeMap<String, bool>> for VisibilityConfig {
    fn from(raw: BTreeMap<String, bool>) -> Self {
        let mut config = Self::default();
        for (key, visible) in raw {
            if let Ok(id) = IndicatorId::from_str(&key) {
                config.flags.insert(id, visible);
            }
        }
        config
    }
}

impl From<VisibilityConfig> for BTreeMap<String, bool> {
    fn from(config: VisibilityConfig) -> Self {
        config.flags.into_iter().map(|(id, visible)| (id.as_ref().to_string(), visible)).collect()
    }
}

impl VisibilityConfig {
    pub fn is_visible(&self, id: IndicatorId) -> bool {
        self.flags.get(&id).copied().unwrap_or_else(|| id.default_visible())
    }

    pub fn set(&mut self, id: IndicatorId, visible: bool) {
        self.flags.insert(id, visible);
    }

    pub fn toggle(&mut self, id: IndicatorId) {
        let next = !self.is_visible(id);
        self.set(id, next);
    }

    /// Visibility of every secondary pane in display order, for the layout.
    pub fn secondary_visibility(&self) -> Vec<bool> {
        SecondaryPane::ORDER.iter().map(|p| self.is_visible(p.indicator())).collect()
    }

    pub fn active_secondary_panes(&self) -> Vec<SecondaryPane> {
        SecondaryPane::ORDER.iter().copied().filter(|p| self.is_visible(p.indicator())).collect()
    }
}

/// Persisted UI settings blob
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSettings {
    #[serde(default)]
    pub visibility: VisibilityConfig,
}

/// Device-local settings storage
pub trait SettingsStore {
    fn load(&self) -> AppResult<Option<ChartSettings>>;
    fn save(&self, settings: &ChartSettings) -> AppResult<()>;

    /// Stored settings, or defaults when absent or unreadable.
    fn load_or_default(&self) -> ChartSettings {
        match self.load() {
            Ok(Some(settings)) => settings,
            Ok(None) => ChartSettings::default(),
            Err(e) => {
                crate::log_warn!(
                    crate::domain::logging::LogComponent::Domain("Settings"),
                    "Falling back to default settings: {}",
                    e
                );
                ChartSettings::default()
            }
        }
    }
}

/// In-memory store, used headless
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    blob: RefCell<Option<String>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(blob: &str) -> Self {
        Self { blob: RefCell::new(Some(blob.to_string())) }
    }

    pub fn raw(&self) -> Option<String> {
        self.blob.borrow().clone()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> AppResult<Option<ChartSettings>> {
        match self.blob.borrow().as_deref() {
            Some(blob) => Ok(Some(serde_json::from_str(blob)?)),
            None => Ok(None),
        }
    }

    fn save(&self, settings: &ChartSettings) -> AppResult<()> {
        *self.blob.borrow_mut() = Some(serde_json::to_string(settings)?);
        Ok(())
    }
}
