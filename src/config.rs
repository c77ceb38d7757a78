//! Configuration constants and profile loading for movielist
//!
//! Profiles live in an INI file, one section per profile name.

use anyhow::{anyhow, Context, Result};
use ini::{Ini, Properties};
use reqwest::Url;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default profile file path for movielist
pub const DEFAULT_PROFILE_PATH: &str = "~/.movielist/profile";

/// Environment variable name for overriding the profile path
pub const PROFILE_PATH_ENV_VAR: &str = "MOVIELIST_PROFILE_PATH";

/// Environment variable holding the log filter
pub const LOG_LEVEL_ENV_VAR: &str = "MOVIELIST_LOG_LEVEL";

pub const DEFAULT_API_BASE: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";
pub const DEFAULT_LANGUAGE: &str = "en-US";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CACHE_DIR: &str = "~/.movielist/cache";

/// Get the profile file path, checking environment variable first, then falling back to default
pub fn get_profile_path() -> String {
    std::env::var_os(PROFILE_PATH_ENV_VAR)
        .and_then(|val| val.into_string().ok())
        .unwrap_or_else(|| DEFAULT_PROFILE_PATH.to_string())
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

/// Connection and cache settings for one catalog profile
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogProfile {
    name: String,
    api_base: String,
    api_key: Option<String>,
    access_token: Option<String>,
    language: String,
    region: Option<String>,
    image_base: String,
    timeout: Duration,
    cache_path: PathBuf,
    cache_enabled: bool,
    embed_posters: bool,
    probe_addr: Option<String>,
}

impl CatalogProfile {
    /// Profile with every setting at its default
    pub fn blank(name: &str) -> Self {
        Self {
            name: name.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            access_token: None,
            language: DEFAULT_LANGUAGE.to_string(),
            region: None,
            image_base: DEFAULT_IMAGE_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cache_path: expand_path(&format!("{DEFAULT_CACHE_DIR}/{name}.json")),
            cache_enabled: true,
            embed_posters: false,
            probe_addr: None,
        }
    }

    fn from_section(name: &str, section: &Properties) -> Result<Self> {
        let mut profile = Self::blank(name);
        let text = |key: &str| {
            section
                .get(key)
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };

        if let Some(api_base) = text("api_base") {
            profile.api_base = api_base.to_string();
        }
        profile.api_key = text("api_key").map(str::to_string);
        profile.access_token = text("access_token").map(str::to_string);
        if let Some(language) = text("language") {
            profile.language = language.to_string();
        }
        profile.region = text("region").map(str::to_string);
        if let Some(image_base) = text("image_base") {
            profile.image_base = image_base.to_string();
        }
        if let Some(timeout) = text("timeout") {
            let secs: u64 = timeout
                .parse()
                .with_context(|| format!("Invalid timeout '{timeout}' in profile '{name}'"))?;
            profile.timeout = Duration::from_secs(secs);
        }
        if let Some(cache_path) = text("cache_path") {
            profile.cache_path = expand_path(cache_path);
        }
        if let Some(cache) = text("cache") {
            profile.cache_enabled = parse_flag(cache)
                .with_context(|| format!("Invalid cache setting in profile '{name}'"))?;
        }
        if let Some(embed) = text("embed_posters") {
            profile.embed_posters = parse_flag(embed)
                .with_context(|| format!("Invalid embed_posters setting in profile '{name}'"))?;
        }
        profile.probe_addr = text("probe_addr").map(str::to_string);

        Ok(profile)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn image_base(&self) -> &str {
        &self.image_base
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache_enabled
    }

    pub fn embed_posters(&self) -> bool {
        self.embed_posters
    }

    /// `host:port` to probe for reachability; derived from `api_base` unless set
    pub fn probe_addr(&self) -> Option<String> {
        if let Some(addr) = &self.probe_addr {
            return Some(addr.clone());
        }
        let url = Url::parse(&self.api_base).ok()?;
        let host = url.host_str()?;
        let port = url.port_or_known_default()?;
        Some(format!("{host}:{port}"))
    }

    pub fn set_api_base(&mut self, api_base: impl Into<String>) {
        self.api_base = api_base.into();
    }

    pub fn set_image_base(&mut self, image_base: impl Into<String>) {
        self.image_base = image_base.into();
    }

    pub fn set_api_key(&mut self, api_key: impl Into<String>) {
        self.api_key = Some(api_key.into());
    }

    pub fn set_access_token(&mut self, access_token: impl Into<String>) {
        self.access_token = Some(access_token.into());
    }

    pub fn set_embed_posters(&mut self, embed_posters: bool) {
        self.embed_posters = embed_posters;
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn set_cache_path(&mut self, cache_path: impl Into<PathBuf>) {
        self.cache_path = cache_path.into();
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("expected on/off, got '{other}'")),
    }
}

/// Reads catalog profiles from an INI file
#[derive(Debug, Clone)]
pub struct IniProfileStore {
    path: PathBuf,
}

impl IniProfileStore {
    /// `path` may start with `~`
    pub fn new(path: &str) -> Self {
        Self {
            path: expand_path(path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load a profile by name; `None` when the file or section is missing
    pub fn get_profile(&self, name: &str) -> Result<Option<CatalogProfile>> {
        if !self.path.exists() {
            tracing::debug!("Profile file {} does not exist", self.path.display());
            return Ok(None);
        }

        let ini = Ini::load_from_file(&self.path)
            .with_context(|| format!("Failed to read profile file {}", self.path.display()))?;

        match ini.section(Some(name)) {
            Some(section) => CatalogProfile::from_section(name, section).map(Some),
            None => Ok(None),
        }
    }

    /// Load a profile, falling back to a blank one when it is not configured
    pub fn get_profile_or_blank(&self, name: &str) -> Result<CatalogProfile> {
        match self.get_profile(name)? {
            Some(profile) => {
                tracing::debug!("Profile '{}' loaded, api_base: {}", name, profile.api_base());
                Ok(profile)
            }
            None => {
                tracing::debug!("Profile '{}' not found, using blank profile", name);
                Ok(CatalogProfile::blank(name))
            }
        }
    }
}
