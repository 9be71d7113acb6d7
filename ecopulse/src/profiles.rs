//! Connection profiles: load/save a JSON mapping of profile name -> API settings.
//! Stored under XDG config dir: $XDG_CONFIG_HOME/ecopulse/profiles.json (fallback ~/.config/ecopulse/profiles.json)

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, io, path::PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProfileEntry {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_ca: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl ProfileEntry {
    /// Fill every unset field from `fallback`. The URL is always kept.
    pub fn or_from(mut self, fallback: &ProfileEntry) -> Self {
        self.tls_ca = self.tls_ca.or_else(|| fallback.tls_ca.clone());
        self.chat_url = self.chat_url.or_else(|| fallback.chat_url.clone());
        self.interval_ms = self.interval_ms.or(fallback.interval_ms);
        self.history_limit = self.history_limit.or(fallback.history_limit);
        self.timeout_secs = self.timeout_secs.or(fallback.timeout_secs);
        self
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProfilesFile {
    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileEntry>,
    #[serde(default)]
    pub version: u32,
}

pub fn config_dir() -> PathBuf {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
        PathBuf::from(xdg).join("ecopulse")
    } else {
        dirs_next::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ecopulse")
    }
}

pub fn profiles_path() -> PathBuf {
    config_dir().join("profiles.json")
}

pub fn load_profiles() -> ProfilesFile {
    let path = profiles_path();
    match fs::read_to_string(&path) {
        Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable profiles file");
            ProfilesFile::default()
        }),
        Err(_) => ProfilesFile::default(),
    }
}

pub fn save_profiles(p: &ProfilesFile) -> io::Result<()> {
    let path = profiles_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_vec_pretty(p).map_err(io::Error::other)?;
    fs::write(path, data)
}

#[derive(Debug, PartialEq, Eq)]
pub enum ResolveProfile {
    /// Use the provided runtime inputs (not persisted)
    Direct(ProfileEntry),
    /// Loaded from an existing profile entry, with runtime overrides applied
    Loaded(ProfileEntry),
    /// Should prompt user to select among profile names
    PromptSelect(Vec<String>),
    /// Should prompt user to create a new profile (name)
    PromptCreate(String),
    /// Nothing given and nothing saved: use environment/defaults
    None,
}

pub struct ProfileRequest {
    pub profile_name: Option<String>,
    /// Runtime inputs; `url` is empty when none was given on the command line.
    pub overrides: ProfileEntry,
}

impl ProfileRequest {
    pub fn resolve(self, pf: &ProfilesFile) -> ResolveProfile {
        let has_url = !self.overrides.url.is_empty();
        match (self.profile_name, has_url) {
            // Only profile name given -> try load
            (Some(name), false) => match pf.profiles.get(&name) {
                Some(entry) => {
                    let mut merged = self.overrides.or_from(entry);
                    merged.url = entry.url.clone();
                    ResolveProfile::Loaded(merged)
                }
                None => ResolveProfile::PromptCreate(name),
            },
            // URL provided -> direct (maybe later saved by caller)
            (_, true) => ResolveProfile::Direct(self.overrides),
            // Nothing provided -> maybe prompt select if profiles exist
            (None, false) => {
                if pf.profiles.is_empty() {
                    ResolveProfile::None
                } else {
                    ResolveProfile::PromptSelect(pf.profiles.keys().cloned().collect())
                }
            }
        }
    }
}
