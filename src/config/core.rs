use super::AppConfig;
use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Json, Toml, Yaml},
};
use std::path::Path;

// Embed the default config at compile time
const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

pub struct CapflowConfig {
    figment: Figment,
}

impl CapflowConfig {
    pub fn load() -> Result<Self> {
        Self::load_with_custom_config(None)
    }

    pub fn load_with_custom_config(custom_config: Option<&str>) -> Result<Self> {
        let mut figment = Figment::new().merge(Toml::string(DEFAULT_CONFIG)); // Embedded defaults

        // If custom config is specified, use only that + defaults + env vars
        if let Some(custom_path) = custom_config {
            figment = merge_by_extension(figment, custom_path);
        } else {
            let user_config = Self::user_config_path();
            figment = figment
                // User config - support multiple formats
                .merge(Toml::file(&user_config))
                .merge(Json::file(user_config.replace(".toml", ".json")))
                .merge(Yaml::file(user_config.replace(".toml", ".yaml")))
                .merge(Yaml::file(user_config.replace(".toml", ".yml")))
                // Repository config - support multiple formats
                .merge(Toml::file("capflow.toml"))
                .merge(Json::file("capflow.json"))
                .merge(Yaml::file("capflow.yaml"))
                .merge(Yaml::file("capflow.yml"));
        }

        // Environment variables always have highest priority
        figment = figment.merge(Env::prefixed("CAPFLOW_").split("__"));

        Ok(CapflowConfig { figment })
    }

    /// Extract the typed configuration
    pub fn settings(&self) -> Result<AppConfig> {
        self.figment
            .extract()
            .context("Failed to parse capflow configuration")
    }

    /// Get a nested object/section as JSON
    pub fn get_section(&self, path: &str) -> Result<serde_json::Value> {
        Ok(self.figment.extract_inner(path)?)
    }

    /// Get a boolean value from config
    pub fn get_bool(&self, path: &str) -> Result<bool> {
        Ok(self.figment.extract_inner(path)?)
    }

    /// Get a string value from config
    pub fn get_string(&self, path: &str) -> Result<String> {
        Ok(self.figment.extract_inner(path)?)
    }

    /// Get a u64 value from config
    pub fn get_u64(&self, path: &str) -> Result<u64> {
        Ok(self.figment.extract_inner(path)?)
    }

    /// Get a vector of strings from config
    pub fn get_vec(&self, path: &str) -> Result<Vec<String>> {
        Ok(self.figment.extract_inner(path)?)
    }

    fn user_config_path() -> String {
        match std::env::var("HOME") {
            Ok(home) => format!("{}/.config/capflow/config.toml", home),
            Err(_) => "~/.config/capflow/config.toml".to_string(),
        }
    }
}

/// Pick the provider from the file extension; unknown extensions are read as TOML
fn merge_by_extension(figment: Figment, path: &str) -> Figment {
    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "json" => figment.merge(Json::file(path)),
        "yaml" | "yml" => figment.merge(Yaml::file(path)),
        _ => figment.merge(Toml::file(path)),
    }
}
