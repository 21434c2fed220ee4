use std::time::Duration;

use enum_map::{EnumMap, enum_map};
use serde::{Deserialize, Serialize};

use crate::display::BoardOrientation;
use crate::error::BoardError;
use crate::force::Force;
use crate::piece::PieceKind;
use crate::theme::DEFAULT_THEME;


// Independent visibility toggles for everything drawn above the pieces.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub arrows: bool,
    pub highlights: bool,
    pub square_names: bool,
    pub premoves: bool,
    pub legal_moves: bool,
    pub last_move: bool,
    // Sound is played by the host; the board only carries the preference.
    pub sound: bool,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PremoveSettings {
    pub enabled: bool,
    // Allow more than one queued premove per force.
    pub multi: bool,
    pub colors: EnumMap<Force, bool>,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub theme: String,
    pub orientation: BoardOrientation,
    #[serde(with = "humantime_serde")]
    pub animation_duration: Duration,
    // Delay between a turn change and the attempt to execute a queued premove. Keeps the
    // premove animation from racing the opponent's move animation.
    #[serde(with = "humantime_serde")]
    pub premove_delay: Duration,
    // A press turns into a drag when the pointer travels this far or is held this long.
    pub drag_threshold_px: f64,
    #[serde(with = "humantime_serde")]
    pub drag_threshold_time: Duration,
    pub auto_promotion: PieceKind,
    pub display: DisplaySettings,
    pub premoves: PremoveSettings,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        DisplaySettings {
            arrows: true,
            highlights: true,
            square_names: false,
            premoves: true,
            legal_moves: true,
            last_move: true,
            sound: true,
        }
    }
}

impl Default for PremoveSettings {
    fn default() -> Self {
        PremoveSettings {
            enabled: true,
            multi: false,
            colors: enum_map! { _ => true },
        }
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        BoardConfig {
            theme: DEFAULT_THEME.to_owned(),
            orientation: BoardOrientation::Normal,
            animation_duration: Duration::from_millis(200),
            premove_delay: Duration::from_millis(200),
            drag_threshold_px: 4.,
            drag_threshold_time: Duration::from_millis(150),
            auto_promotion: PieceKind::Queen,
            display: DisplaySettings::default(),
            premoves: PremoveSettings::default(),
        }
    }
}

impl BoardConfig {
    // Missing fields fall back to defaults.
    pub fn from_json(s: &str) -> Result<Self, BoardError> {
        let config: BoardConfig =
            serde_json::from_str(s).map_err(|err| BoardError::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), BoardError> {
        if !self.auto_promotion.can_be_promotion_target() {
            return Err(BoardError::InvalidConfig(format!(
                "cannot promote to {:?}",
                self.auto_promotion
            )));
        }
        if self.drag_threshold_px.is_nan() || self.drag_threshold_px < 0. {
            return Err(BoardError::InvalidConfig(format!(
                "negative drag threshold: {}",
                self.drag_threshold_px
            )));
        }
        Ok(())
    }
}
