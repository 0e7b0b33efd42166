//! Player preferences
//!
//! Held by the session and handed to each level start; never stored globally.

use serde::{Deserialize, Serialize};

/// Launcher character skins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LauncherSkin {
    #[default]
    Hero,
    Mobster,
    Crimson,
}

impl LauncherSkin {
    pub const ALL: [LauncherSkin; 3] = [LauncherSkin::Hero, LauncherSkin::Mobster, LauncherSkin::Crimson];

    pub fn as_str(&self) -> &'static str {
        match self {
            LauncherSkin::Hero => "bunny-hero",
            LauncherSkin::Mobster => "bunny-mobster",
            LauncherSkin::Crimson => "bunny-crimson",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "bunny-hero" | "hero" | "classic" => Some(LauncherSkin::Hero),
            "bunny-mobster" | "mobster" => Some(LauncherSkin::Mobster),
            "bunny-crimson" | "crimson" => Some(LauncherSkin::Crimson),
            _ => None,
        }
    }

    /// Name shown in the skin picker
    pub fn display_name(&self) -> &'static str {
        match self {
            LauncherSkin::Hero => "Classic",
            LauncherSkin::Mobster => "Mobster",
            LauncherSkin::Crimson => "Crimson",
        }
    }
}

/// Player preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerProfile {
    pub skin: LauncherSkin,
    pub sound_enabled: bool,
    pub music_enabled: bool,
}

impl Default for PlayerProfile {
    fn default() -> Self {
        Self {
            skin: LauncherSkin::Hero,
            sound_enabled: true,
            music_enabled: true,
        }
    }
}

impl PlayerProfile {
    /// Returns the new state
    pub fn toggle_sound(&mut self) -> bool {
        self.sound_enabled = !self.sound_enabled;
        self.sound_enabled
    }

    /// Returns the new state
    pub fn toggle_music(&mut self) -> bool {
        self.music_enabled = !self.music_enabled;
        self.music_enabled
    }

    /// Select a skin by id or name; unknown names are ignored
    pub fn select_skin(&mut self, name: &str) -> bool {
        match LauncherSkin::from_str(name) {
            Some(skin) => {
                self.skin = skin;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skin_names_round_trip() {
        for skin in LauncherSkin::ALL {
            assert_eq!(LauncherSkin::from_str(skin.as_str()), Some(skin));
        }
        assert_eq!(LauncherSkin::from_str("Classic"), Some(LauncherSkin::Hero));
        assert_eq!(LauncherSkin::from_str("panda"), None);
    }

    #[test]
    fn test_profile_toggles() {
        let mut profile = PlayerProfile::default();
        assert!(!profile.toggle_sound());
        assert!(profile.toggle_sound());
        assert!(!profile.toggle_music());
        assert!(profile.select_skin("crimson"));
        assert!(!profile.select_skin("nope"));
        assert_eq!(profile.skin, LauncherSkin::Crimson);
    }

    #[test]
    fn test_partial_profile_json() {
        let profile: PlayerProfile = serde_json::from_str(r#"{"skin": "Mobster"}"#).unwrap();
        assert_eq!(profile.skin, LauncherSkin::Mobster);
        assert!(profile.sound_enabled);
    }
}
