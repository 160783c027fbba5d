//! Configuration management

#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Guide generation settings, stored as JSON in the platform config dir
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuideConfig {
    /// Whole-word markers a channel name must carry to survive filtering
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
    /// Feed-to-local wall-clock correction, in hours
    #[serde(default = "default_offset_hours")]
    pub timezone_offset_hours: i64,
    /// How long after its corrected start a today event stays admissible, in hours
    #[serde(default = "default_grace_hours")]
    pub grace_window_hours: i64,
    /// Fixed duration of a main programme block, in hours
    #[serde(default = "default_main_hours")]
    pub main_duration_hours: i64,
    /// Path of the feed JSON document
    #[serde(default = "default_feed_path")]
    pub feed_path: String,
    /// External guide fragment URLs, appended ahead of local content
    #[serde(default)]
    pub fragment_urls: Vec<String>,
    /// Output path for the XMLTV document; the gzip copy gets ".gz" appended
    #[serde(default = "default_output_path")]
    pub output_path: String,
}

fn default_keywords() -> Vec<String> {
    [
        "italy",
        "rai",
        "italia",
        "it",
        "uk",
        "tnt",
        "usa",
        "tennis channel",
        "tennis stream",
        "la",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_offset_hours() -> i64 {
    2
}

fn default_grace_hours() -> i64 {
    2
}

fn default_main_hours() -> i64 {
    2
}

fn default_feed_path() -> String {
    "daily_schedule.json".to_string()
}

fn default_output_path() -> String {
    "epg.xml".to_string()
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            timezone_offset_hours: 2,
            grace_window_hours: 2,
            main_duration_hours: 2,
            feed_path: default_feed_path(),
            fragment_urls: Vec::new(),
            output_path: default_output_path(),
        }
    }
}

impl GuideConfig {
    fn config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("live_epg");
        fs::create_dir_all(&path).ok();
        path.push("config.json");
        path
    }

    pub fn load() -> Self {
        let path = Self::config_path();

        if path.exists() {
            if let Ok(content) = fs::read_to_string(&path) {
                if let Ok(config) = serde_json::from_str(&content) {
                    return config;
                }
            }
        }

        Self::default()
    }

    pub fn save(&self) {
        let path = Self::config_path();
        if let Ok(content) = serde_json::to_string_pretty(self) {
            let _ = fs::write(path, content);
        }
    }
}
