use std::str::FromStr;

use crate::foundation::error::{FivedError, FivedResult};

/// Flags and parameters for one pass of [`apply_custom_effects`](crate::RenderBackend::apply_custom_effects).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EffectSettings {
    pub enable_blur: bool,
    pub blur_radius: f32,

    pub enable_bloom: bool,
    pub bloom_threshold: f32,
    pub bloom_intensity: f32,

    pub enable_depth_of_field: bool,
    /// Focal line position inside the target rect, 0 = top, 1 = bottom.
    pub focal_distance: f32,
    pub dof_blur_amount: f32,

    pub enable_motion_blur: bool,
    pub motion_velocity_x: f32,
    pub motion_velocity_y: f32,
    pub motion_intensity: f32,

    pub enable_chromatic_aberration: bool,
    pub aberration_offset: f32,
    pub aberration_strength: f32,
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self {
            enable_blur: false,
            blur_radius: 5.0,
            enable_bloom: false,
            bloom_threshold: 0.8,
            bloom_intensity: 0.5,
            enable_depth_of_field: false,
            focal_distance: 0.5,
            dof_blur_amount: 4.0,
            enable_motion_blur: false,
            motion_velocity_x: 8.0,
            motion_velocity_y: 0.0,
            motion_intensity: 0.5,
            enable_chromatic_aberration: false,
            aberration_offset: 2.0,
            aberration_strength: 1.0,
        }
    }
}

impl EffectSettings {
    pub fn any_enabled(&self) -> bool {
        self.enable_blur
            || self.enable_bloom
            || self.enable_depth_of_field
            || self.enable_motion_blur
            || self.enable_chromatic_aberration
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectPreset {
    None,
    Cinematic,
    GameUi,
    Retro,
    Dreamy,
    Motion,
}

impl EffectPreset {
    pub const ALL: [EffectPreset; 6] = [
        EffectPreset::None,
        EffectPreset::Cinematic,
        EffectPreset::GameUi,
        EffectPreset::Retro,
        EffectPreset::Dreamy,
        EffectPreset::Motion,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EffectPreset::None => "none",
            EffectPreset::Cinematic => "cinematic",
            EffectPreset::GameUi => "game_ui",
            EffectPreset::Retro => "retro",
            EffectPreset::Dreamy => "dreamy",
            EffectPreset::Motion => "motion",
        }
    }

    pub fn settings(self) -> EffectSettings {
        let base = EffectSettings::default();
        match self {
            EffectPreset::None => base,
            EffectPreset::Cinematic => EffectSettings {
                enable_depth_of_field: true,
                focal_distance: 0.5,
                dof_blur_amount: 3.0,
                enable_bloom: true,
                bloom_threshold: 0.7,
                bloom_intensity: 0.3,
                enable_chromatic_aberration: true,
                aberration_offset: 1.0,
                aberration_strength: 0.5,
                ..base
            },
            EffectPreset::GameUi => EffectSettings {
                enable_bloom: true,
                bloom_threshold: 0.6,
                bloom_intensity: 0.8,
                enable_motion_blur: true,
                motion_velocity_x: 4.0,
                motion_velocity_y: 0.0,
                motion_intensity: 0.3,
                ..base
            },
            EffectPreset::Retro => EffectSettings {
                enable_chromatic_aberration: true,
                aberration_offset: 3.0,
                aberration_strength: 1.0,
                ..base
            },
            EffectPreset::Dreamy => EffectSettings {
                enable_blur: true,
                blur_radius: 3.0,
                enable_bloom: true,
                bloom_threshold: 0.5,
                bloom_intensity: 1.0,
                enable_depth_of_field: true,
                focal_distance: 0.3,
                dof_blur_amount: 6.0,
                ..base
            },
            EffectPreset::Motion => EffectSettings {
                enable_motion_blur: true,
                motion_velocity_x: 12.0,
                motion_velocity_y: 0.0,
                motion_intensity: 0.7,
                ..base
            },
        }
    }
}

impl FromStr for EffectPreset {
    type Err = FivedError;

    fn from_str(s: &str) -> FivedResult<Self> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|p| p.name() == key || (key == "gameui" && *p == EffectPreset::GameUi))
            .ok_or_else(|| FivedError::config(format!("unknown effect preset '{s}'")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/settings.rs"]
mod tests;
