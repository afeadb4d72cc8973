use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const AGE_MIN: u32 = 18;
pub const AGE_MAX: u32 = 60;
pub const DISTANCE_MIN_KM: u32 = 1;
pub const DISTANCE_MAX_KM: u32 = 50;

pub const INTEREST_TAGS: [&str; 6] = ["Art", "Sport", "Travel", "Music", "Literature", "Business"];

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Profile {
    pub id: i64,
    pub name: String,
    pub age: u32,
    pub location: String,
    /// Kilometres from the current user.
    pub distance: f64,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub verified: bool,
}

const CDN: &str = "https://cdn.poehali.dev/projects/3dbf1073-df46-498b-8ade-7eceea983fbf/files";

pub fn seed_profiles() -> Vec<Profile> {
    vec![
        Profile {
            id: 1,
            name: "Anna".into(),
            age: 28,
            location: "Moscow".into(),
            distance: 1.2,
            bio: "Architect who loves art and travel. Looking for a serious relationship with an interesting conversationalist.".into(),
            image: format!("{CDN}/6cc367e4-631a-49af-b1e3-69bc380b3b91.jpg"),
            interests: vec!["Art".into(), "Travel".into(), "Architecture".into()],
            verified: true,
        },
        Profile {
            id: 2,
            name: "Dmitry".into(),
            age: 32,
            location: "Moscow".into(),
            distance: 2.5,
            bio: "Entrepreneur into sport and literature. I value sincerity and deep conversations.".into(),
            image: format!("{CDN}/fd4ac00d-51a2-40bc-ba76-dca7524f11a9.jpg"),
            interests: vec!["Sport".into(), "Literature".into(), "Business".into()],
            verified: true,
        },
        Profile {
            id: 3,
            name: "Ekaterina".into(),
            age: 29,
            location: "Moscow".into(),
            distance: 3.8,
            bio: "Psychologist and classical music lover. Looking for someone who shares my values.".into(),
            image: format!("{CDN}/c4e4b660-5c55-4ecc-909e-8c448a905ca3.jpg"),
            interests: vec!["Music".into(), "Psychology".into(), "Theatre".into()],
            verified: true,
        },
    ]
}

/// Read a JSON array of profiles.
pub fn load_profiles(path: &Path) -> Result<Vec<Profile>, ConfigError> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text)
        .map_err(|e| ConfigError::Invalid(format!("{}: {e}", path.display())))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Discover,
    Favorites,
    Messages,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Filters {
    pub age_min: u32,
    pub age_max: u32,
    pub max_distance_km: u32,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            age_min: 25,
            age_max: 40,
            max_distance_km: 10,
        }
    }
}

/// Session state of the discovery page. Filters are shown in the side panel
/// but do not narrow the grid.
#[derive(Debug, Clone)]
pub struct DiscoveryState {
    profiles: Vec<Profile>,
    favorites: Vec<i64>,
    mode: ViewMode,
    filters: Filters,
}

impl DiscoveryState {
    pub fn new(profiles: Vec<Profile>) -> Self {
        Self {
            profiles,
            favorites: Vec::new(),
            mode: ViewMode::default(),
            filters: Filters::default(),
        }
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    /// Add or remove `id` from favorites. Returns whether it is a favorite now.
    pub fn toggle_favorite(&mut self, id: i64) -> bool {
        if let Some(pos) = self.favorites.iter().position(|f| *f == id) {
            self.favorites.remove(pos);
            false
        } else {
            self.favorites.push(id);
            true
        }
    }

    pub fn is_favorite(&self, id: i64) -> bool {
        self.favorites.contains(&id)
    }

    pub fn favorites(&self) -> &[i64] {
        &self.favorites
    }

    pub fn favorites_count(&self) -> usize {
        self.favorites.len()
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
    }

    pub fn displayed_profiles(&self) -> Vec<&Profile> {
        match self.mode {
            ViewMode::Discover => self.profiles.iter().collect(),
            ViewMode::Favorites => self
                .profiles
                .iter()
                .filter(|p| self.is_favorite(p.id))
                .collect(),
            ViewMode::Messages => Vec::new(),
        }
    }

    pub fn heading(&self) -> &'static str {
        match self.mode {
            ViewMode::Discover => "Recommended for you",
            ViewMode::Favorites => "Favorite profiles",
            ViewMode::Messages => "Messages",
        }
    }

    pub fn subtitle(&self) -> String {
        match self.mode {
            ViewMode::Discover => format!("Found {} profiles nearby", self.profiles.len()),
            ViewMode::Favorites => format!("{} profiles in favorites", self.favorites.len()),
            ViewMode::Messages => "No messages yet".to_string(),
        }
    }

    pub fn filters(&self) -> Filters {
        self.filters
    }

    pub fn set_age_range(&mut self, min: u32, max: u32) {
        let min = min.clamp(AGE_MIN, AGE_MAX);
        let max = max.clamp(AGE_MIN, AGE_MAX);
        self.filters.age_min = min.min(max);
        self.filters.age_max = max.max(min);
    }

    pub fn set_max_distance(&mut self, km: u32) {
        self.filters.max_distance_km = km.clamp(DISTANCE_MIN_KM, DISTANCE_MAX_KM);
    }

    pub fn reset_filters(&mut self) {
        self.filters = Filters::default();
    }

    pub fn age_label(&self) -> String {
        format!("{} - {}", self.filters.age_min, self.filters.age_max)
    }

    pub fn distance_label(&self) -> String {
        format!("up to {} km", self.filters.max_distance_km)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> DiscoveryState {
        DiscoveryState::new(seed_profiles())
    }

    #[test]
    fn toggling_twice_restores_favorites() {
        let mut s = state();
        s.toggle_favorite(3);
        let before = s.favorites().to_vec();

        assert!(s.toggle_favorite(1));
        assert!(s.is_favorite(1));
        assert!(!s.toggle_favorite(1));
        assert_eq!(s.favorites(), before.as_slice());
    }

    #[test]
    fn favorites_mode_shows_only_favorites_in_profile_order() {
        let mut s = state();
        s.toggle_favorite(3);
        s.toggle_favorite(1);
        s.set_mode(ViewMode::Favorites);
        let ids: Vec<i64> = s.displayed_profiles().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(s.subtitle(), "2 profiles in favorites");
    }

    #[test]
    fn modes_switch_displayed_set_only() {
        let mut s = state();
        s.toggle_favorite(2);
        assert_eq!(s.displayed_profiles().len(), 3);
        s.set_mode(ViewMode::Messages);
        assert!(s.displayed_profiles().is_empty());
        assert_eq!(s.heading(), "Messages");
        s.set_mode(ViewMode::Discover);
        assert_eq!(s.displayed_profiles().len(), 3);
        assert!(s.is_favorite(2));
        assert_eq!(s.subtitle(), "Found 3 profiles nearby");
    }

    #[test]
    fn filters_are_clamped_and_not_applied() {
        let mut s = state();
        s.set_age_range(50, 10);
        assert_eq!(s.filters().age_min, 18);
        assert_eq!(s.filters().age_max, 50);
        s.set_age_range(30, 30);
        assert_eq!(s.age_label(), "30 - 30");
        s.set_max_distance(0);
        assert_eq!(s.filters().max_distance_km, 1);
        s.set_max_distance(500);
        assert_eq!(s.distance_label(), "up to 50 km");
        // Cosmetic: every profile is still listed.
        assert_eq!(s.displayed_profiles().len(), 3);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut s = state();
        s.set_age_range(40, 55);
        s.set_max_distance(3);
        s.reset_filters();
        assert_eq!(s.filters(), Filters::default());
    }

    #[test]
    fn profiles_parse_with_optional_fields() {
        let json = r#"[{"id": 7, "name": "Ivan", "age": 35, "location": "Kazan", "distance": 4.0}]"#;
        let profiles: Vec<Profile> = serde_json::from_str(json).unwrap();
        assert_eq!(profiles[0].name, "Ivan");
        assert!(profiles[0].interests.is_empty());
        assert!(!profiles[0].verified);
    }

    #[test]
    fn load_profiles_reports_bad_files() {
        let dir = std::env::temp_dir().join(format!("elite-profiles-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("profiles.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_profiles(&path), Err(ConfigError::Invalid(_))));
        fs::write(&path, serde_json::to_string(&seed_profiles()).unwrap()).unwrap();
        assert_eq!(load_profiles(&path).unwrap().len(), 3);
        let _ = fs::remove_dir_all(&dir);
    }
}
