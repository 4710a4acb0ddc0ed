use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::settings::UserSettings;

const SESSION_FILE: &str = "session.json";

/// The signed-in user as far as saving workouts is concerned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub display_name: Option<String>,
}

impl Identity {
    pub fn greeting_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or("User")
    }
}

pub fn session_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SESSION_FILE)
}

/// Remember a sign-in for later runs
pub fn save_identity(data_dir: &Path, identity: &Identity) -> Result<()> {
    fs::create_dir_all(data_dir)?;
    let json = serde_json::to_string_pretty(identity)?;
    fs::write(session_path(data_dir), json)?;
    log::info!("Saved sign-in for {}", identity.user_id);
    Ok(())
}

pub fn load_identity(data_dir: &Path) -> Option<Identity> {
    let json = fs::read_to_string(session_path(data_dir)).ok()?;
    match serde_json::from_str(&json) {
        Ok(identity) => Some(identity),
        Err(e) => {
            log::warn!("Ignoring unreadable sign-in file: {}", e);
            None
        }
    }
}

/// Forget the stored sign-in. Returns whether there was one.
pub fn sign_out(data_dir: &Path) -> Result<bool> {
    let path = session_path(data_dir);
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(path)?;
    Ok(true)
}

/// Configured user id wins over a stored sign-in
pub fn resolve(settings: &UserSettings) -> Option<Identity> {
    if let Some(user_id) = &settings.user_id {
        return Some(Identity {
            user_id: user_id.clone(),
            display_name: settings.user_name.clone(),
        });
    }
    load_identity(&settings.data_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(data_dir: &Path, user_id: Option<&str>) -> UserSettings {
        UserSettings {
            user_id: user_id.map(str::to_string),
            user_name: Some("Sam".to_string()),
            data_dir: data_dir.to_path_buf(),
        }
    }

    #[test]
    fn test_sign_in_round_trip_and_sign_out() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("nested");
        let identity = Identity {
            user_id: "user_2abc".to_string(),
            display_name: Some("Alex".to_string()),
        };

        assert!(load_identity(&data_dir).is_none());
        save_identity(&data_dir, &identity).unwrap();
        assert_eq!(load_identity(&data_dir), Some(identity));

        assert!(sign_out(&data_dir).unwrap());
        assert!(!sign_out(&data_dir).unwrap());
        assert!(load_identity(&data_dir).is_none());
    }

    #[test]
    fn test_corrupt_session_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(session_path(dir.path()), "{ not json").unwrap();
        assert!(load_identity(dir.path()).is_none());
    }

    #[test]
    fn test_configured_user_wins() {
        let dir = tempfile::tempdir().unwrap();
        save_identity(
            dir.path(),
            &Identity {
                user_id: "from_file".to_string(),
                display_name: None,
            },
        )
        .unwrap();

        let resolved = resolve(&settings(dir.path(), Some("from_env"))).unwrap();
        assert_eq!(resolved.user_id, "from_env");
        assert_eq!(resolved.greeting_name(), "Sam");

        let resolved = resolve(&settings(dir.path(), None)).unwrap();
        assert_eq!(resolved.user_id, "from_file");
        assert_eq!(resolved.greeting_name(), "User");
    }
}
