use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, warn};

use cadence_core::source::{ScheduleSource, TaskSource};
use cadence_core::types::{Category, Task, TimePeriod, UserId};

use crate::error::Result;
use crate::types::UserProfile;

/// JSON-file-backed profile store.
///
/// Profiles are cached in memory; `reload` rescans the directory so edits
/// made by the admin process between ticks become visible. Interior locking
/// exists only so the service loop can reload through a shared handle — all
/// access happens on the loop thread.
pub struct UserStore {
    dir: PathBuf,
    profiles: RwLock<HashMap<String, UserProfile>>,
}

impl UserStore {
    /// Load every `*.json` profile under `dir`.
    ///
    /// A missing directory is an error (the service creates it at startup);
    /// an individual file that fails to parse is skipped with a warning so
    /// one corrupt profile never takes down the rest.
    pub fn load(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let profiles = scan_dir(&dir)?;
        Ok(Self {
            dir,
            profiles: RwLock::new(profiles),
        })
    }

    /// Rescan the users directory. Returns the number of profiles loaded.
    ///
    /// On a transient directory-read failure the previous snapshot is kept.
    pub fn reload(&self) -> usize {
        match scan_dir(&self.dir) {
            Ok(fresh) => {
                let count = fresh.len();
                *self.profiles.write().expect("profile cache poisoned") = fresh;
                count
            }
            Err(e) => {
                let cache = self.profiles.read().expect("profile cache poisoned");
                warn!(error = %e, "users directory unreadable; keeping previous profiles");
                cache.len()
            }
        }
    }

    pub fn get(&self, user: &UserId) -> Option<UserProfile> {
        self.profiles
            .read()
            .expect("profile cache poisoned")
            .get(user.as_str())
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.profiles.read().expect("profile cache poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn scan_dir(dir: &Path) -> Result<HashMap<String, UserProfile>> {
    let mut profiles = HashMap::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable profile");
                continue;
            }
        };
        match serde_json::from_str::<UserProfile>(&raw) {
            Ok(profile) => {
                debug!(user = %profile.user_id, path = %path.display(), "profile loaded");
                profiles.insert(profile.user_id.clone(), profile);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping malformed profile");
            }
        }
    }
    Ok(profiles)
}

impl ScheduleSource for UserStore {
    fn users(&self) -> Vec<UserId> {
        let cache = self.profiles.read().expect("profile cache poisoned");
        let mut users: Vec<UserId> = cache.keys().map(|k| UserId::from(k.as_str())).collect();
        users.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        users
    }

    fn contains(&self, user: &UserId) -> bool {
        self.profiles
            .read()
            .expect("profile cache poisoned")
            .contains_key(user.as_str())
    }

    fn categories(&self, user: &UserId) -> Vec<Category> {
        let cache = self.profiles.read().expect("profile cache poisoned");
        let Some(profile) = cache.get(user.as_str()) else {
            return Vec::new();
        };
        let mut categories: Vec<Category> = profile
            .schedules
            .keys()
            .map(|k| Category::from(k.as_str()))
            .collect();
        categories.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        categories
    }

    fn enabled(&self, user: &UserId, category: &Category) -> bool {
        self.profiles
            .read()
            .expect("profile cache poisoned")
            .get(user.as_str())
            .map(|p| p.enabled(category.as_str()))
            .unwrap_or(false)
    }

    fn periods(&self, user: &UserId, category: &Category) -> Vec<TimePeriod> {
        self.profiles
            .read()
            .expect("profile cache poisoned")
            .get(user.as_str())
            .and_then(|p| p.schedules.get(category.as_str()).cloned())
            .unwrap_or_default()
    }
}

impl TaskSource for UserStore {
    fn tasks(&self, user: &UserId) -> Vec<Task> {
        self.profiles
            .read()
            .expect("profile cache poisoned")
            .get(user.as_str())
            .map(|p| p.tasks.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_profile(dir: &Path, user: &str, body: &str) {
        std::fs::write(dir.join(format!("{user}.json")), body).unwrap();
    }

    #[test]
    fn loads_profiles_and_skips_malformed() {
        let dir = tempfile::tempdir().unwrap();
        write_profile(
            dir.path(),
            "u1",
            r#"{"user_id":"u1","schedules":{"health":[{"start":"08:00","end":"09:00"}]}}"#,
        );
        write_profile(dir.path(), "broken", "{not json");
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let store = UserStore::load(dir.path()).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.contains(&UserId::from("u1")));
        assert!(!store.contains(&UserId::from("broken")));
    }

    #[test]
    fn reload_picks_up_new_profiles() {
        let dir = tempfile::tempdir().unwrap();
        write_profile(dir.path(), "u1", r#"{"user_id":"u1"}"#);
        let store = UserStore::load(dir.path()).unwrap();
        assert_eq!(store.len(), 1);

        write_profile(dir.path(), "u2", r#"{"user_id":"u2"}"#);
        assert_eq!(store.reload(), 2);
        assert!(store.contains(&UserId::from("u2")));
    }

    #[test]
    fn source_views_are_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        write_profile(
            dir.path(),
            "u1",
            r#"{"user_id":"u1",
                "features":{"health":false},
                "schedules":{
                    "motivation":[{"start":"08:00","end":"09:00"}],
                    "health":[{"start":"12:00","end":"13:00"}]
                },
                "tasks":[{"id":"t1","title":"water plants"}]}"#,
        );
        let store = UserStore::load(dir.path()).unwrap();
        let user = UserId::from("u1");

        let categories = store.categories(&user);
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].as_str(), "health"); // sorted
        assert!(!store.enabled(&user, &Category::from("health")));
        assert!(store.enabled(&user, &Category::from("motivation")));
        assert_eq!(store.periods(&user, &Category::from("motivation")).len(), 1);
        assert_eq!(store.tasks(&user).len(), 1);
    }

    #[test]
    fn unknown_user_yields_empty_views() {
        let dir = tempfile::tempdir().unwrap();
        let store = UserStore::load(dir.path()).unwrap();
        let ghost = UserId::from("ghost");
        assert!(store.categories(&ghost).is_empty());
        assert!(store.tasks(&ghost).is_empty());
        assert!(!store.enabled(&ghost, &Category::from("health")));
    }
}
