use anyhow::Result;
use clap::Parser;
use serde::Deserialize;
use serde_yaml;
use std::env;
use std::fs;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "artgate")]
#[command(about = "Runs the artgate feed search gateway", long_about = None)]
pub struct Cli {
    #[arg(short = 'c', long = "config", default_value = "config.yaml")]
    pub config_path: String,
}

pub const DEFAULT_FEED_URL: &str = "https://backend.deviantart.com/rss.xml?q={query}";

#[derive(Debug, Deserialize, Clone)]
pub struct App {
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default = "default_bookmarks_file")]
    pub bookmarks_file: String,
    #[serde(default = "default_feed_url")]
    pub feed_url: String,
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_seconds: u64,
    #[serde(default = "default_allowed_domains")]
    pub allowed_domains: Vec<String>,
}

fn default_port() -> u16 {
    3000
}

fn default_bookmarks_file() -> String {
    "bookmarks.json".to_string()
}

fn default_feed_url() -> String {
    DEFAULT_FEED_URL.to_string()
}

fn default_fetch_timeout() -> u64 {
    10
}

fn default_allowed_domains() -> Vec<String> {
    vec![
        "deviantart.com".to_string(),
        "www.deviantart.com".to_string(),
        "images-wixmp-ed30a86b8c4ca887773594c2.wixmp.com".to_string(),
    ]
}

impl Default for App {
    fn default() -> Self {
        App {
            port: default_port(),
            base_url: None,
            bookmarks_file: default_bookmarks_file(),
            feed_url: default_feed_url(),
            fetch_timeout_seconds: default_fetch_timeout(),
            allowed_domains: default_allowed_domains(),
        }
    }
}

impl App {
    pub fn get_port(&self) -> u16 {
        self.port
    }

    /// The self-origin used to build proxied image links. Blank counts as unset.
    pub fn get_base_url(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_seconds)
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub app: App,
}

impl Config {
    pub fn new(path: &str) -> Result<Self> {
        let cfg = Config::load_config(path)?;
        Ok(cfg)
    }

    fn load_config(path: &str) -> Result<Config> {
        let yaml_str = fs::read_to_string(path)?;
        Config::from_yaml(&yaml_str)
    }

    pub fn from_yaml(yaml_str: &str) -> Result<Config> {
        let yaml_with_env = Config::substitute_env_vars(yaml_str)?;
        let config: Config = serde_yaml::from_str(&yaml_with_env)?;
        Ok(config)
    }

    fn substitute_env_vars(yaml_str: &str) -> Result<String> {
        let mut result = yaml_str.to_string();
        let mut offset = 0;

        while let Some(start) = result[offset..].find("${") {
            let actual_start = offset + start;
            if let Some(end) = result[actual_start..].find("}") {
                let var_name = &result[actual_start + 2..actual_start + end];

                // ${VAR:-default}
                let env_value = if let Some(default_start) = var_name.find(":-") {
                    let actual_var = &var_name[..default_start];
                    let default_val = &var_name[default_start + 2..];
                    env::var(actual_var).unwrap_or_else(|_| default_val.to_string())
                } else {
                    env::var(var_name).unwrap_or_else(|_| {
                        tracing::warn!("environment variable '{}' not found", var_name);
                        String::new()
                    })
                };

                result.replace_range(actual_start..actual_start + end + 1, &env_value);
                offset = actual_start + env_value.len();
            } else {
                break;
            }
        }

        Ok(result)
    }
}
