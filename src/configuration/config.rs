#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::ArgMatches;
use clap::Command;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use tokio::fs;

use crate::domain::models::SplitLinePolicy;

static CONFIG: Lazy<DashMap<String, String>> = Lazy::new(DashMap::new);

#[derive(Clone, Copy, Debug, Eq, PartialEq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigKey {
    BackendHealthCheckTimeout,
    ConfigFile,
    Model,
    Models,
    OllamaURL,
    Stream,
    StreamLinePolicy,
    SystemPrompt,
}

pub struct Config {}

impl Config {
    pub fn get(key: ConfigKey) -> String {
        if let Some(val) = CONFIG.get(&key.to_string()) {
            return val.to_string();
        }

        return "".to_string();
    }

    pub fn set(key: ConfigKey, value: &str) {
        CONFIG.insert(key.to_string(), value.to_string());
    }

    /// Known models, as a comma separated list in `models`.
    pub fn get_list(key: ConfigKey) -> Vec<String> {
        return Config::get(key)
            .split(',')
            .map(|e| return e.trim().to_string())
            .filter(|e| return !e.is_empty())
            .collect();
    }

    pub fn get_bool(key: ConfigKey) -> bool {
        return Config::get(key) != "false";
    }

    pub fn default(key: ConfigKey) -> String {
        let config_path = dirs::config_dir()
            .unwrap_or_else(|| return path::PathBuf::from("."))
            .join("pagechat/config.toml");

        let default_policy = SplitLinePolicy::default().to_string();

        let res = match key {
            ConfigKey::BackendHealthCheckTimeout => "1000",
            ConfigKey::Model => "",
            ConfigKey::Models => "",
            ConfigKey::OllamaURL => "http://localhost:11434",
            ConfigKey::Stream => "true",
            ConfigKey::StreamLinePolicy => &default_policy,
            ConfigKey::SystemPrompt => "",

            // Special
            ConfigKey::ConfigFile => return config_path.to_string_lossy().to_string(),
        };

        return res.to_string();
    }

    fn possible_values(cmd: &Command, key: ConfigKey) -> Vec<String> {
        if let Some(arg) = cmd
            .get_arguments()
            .find(|e| return e.get_long() == Some(key.to_string().as_str()))
        {
            return arg
                .get_possible_values()
                .iter()
                .map(|e| return e.get_name().to_string())
                .collect::<Vec<String>>();
        }

        return vec![];
    }

    pub async fn load(cmd: Command, clap_arg_matches: Vec<&ArgMatches>) -> Result<()> {
        for key in ConfigKey::iter() {
            Config::set(key, &Config::default(key))
        }

        let mut config_file = Config::default(ConfigKey::ConfigFile);
        for matches in clap_arg_matches.as_slice() {
            if let Ok(Some(arg_config_file)) =
                matches.try_get_one::<String>(&ConfigKey::ConfigFile.to_string())
            {
                config_file = arg_config_file.to_string();
            }
        }

        let config_path = path::PathBuf::from(config_file);
        if config_path.exists() {
            let toml_str = fs::read_to_string(config_path).await?;
            Config::load_toml(&cmd, &toml_str)?;
        }

        for key in ConfigKey::iter() {
            for matches in clap_arg_matches.as_slice() {
                if let Ok(Some(val)) = matches.try_get_one::<String>(&key.to_string()) {
                    if val.is_empty() {
                        continue;
                    }
                    Config::set(key, val)
                }
            }
        }

        tracing::debug!(
            ollama_url = Config::get(ConfigKey::OllamaURL),
            model = Config::get(ConfigKey::Model),
            models = Config::get(ConfigKey::Models),
            stream = Config::get(ConfigKey::Stream),
            stream_line_policy = Config::get(ConfigKey::StreamLinePolicy),
            "config"
        );

        return Ok(());
    }

    fn load_toml(cmd: &Command, toml_str: &str) -> Result<()> {
        let doc = toml_str.parse::<toml_edit::Document>()?;

        for key in ConfigKey::iter() {
            let val = match doc.get(&key.to_string()) {
                Some(val) => val,
                None => continue,
            };

            if let Some(val_int) = val.as_integer() {
                Config::set(key, &val_int.to_string());
            } else if let Some(val_bool) = val.as_bool() {
                Config::set(key, &val_bool.to_string());
            } else if let Some(val_arr) = val.as_array() {
                let list = val_arr
                    .iter()
                    .filter_map(|e| return e.as_str())
                    .collect::<Vec<&str>>()
                    .join(",");
                Config::set(key, &list);
            } else if let Some(val_str) = val.as_str() {
                if val_str.is_empty() {
                    continue;
                }

                // Use clap value parsers to do validation.
                let possible_values = Config::possible_values(cmd, key);
                if !possible_values.is_empty() && !possible_values.contains(&val_str.to_string())
                {
                    bail!(format!("config.toml has an invalid value for key '{key}': {val_str}\nPossible values are: {}", possible_values.join(", ")));
                }
                Config::set(key, val_str);
            }
        }

        return Ok(());
    }

    pub fn serialize_default(cmd: Command) -> String {
        let toml_str = ConfigKey::iter()
            .filter_map(|key| {
                if key == ConfigKey::ConfigFile {
                    return None;
                }

                let arg = cmd
                    .get_arguments()
                    .find(|e| return e.get_long() == Some(key.to_string().as_str()))?;

                let mut description = arg
                    .get_help()
                    .map(|help| return help.to_string())
                    .unwrap_or_default();

                description = description
                    .split("[default:")
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string();

                let possible_values = Config::possible_values(&cmd, key);
                if !possible_values.is_empty() {
                    description = format!(
                        "{description} [possible values: {}]",
                        possible_values.join(", ")
                    );
                }

                let mut val = Config::default(key);
                if val.is_empty() {
                    val = format!("# {key} = \"\"");
                } else if val.parse::<i32>().is_ok() || val.parse::<bool>().is_ok() {
                    val = format!("{key} = {val}");
                } else {
                    val = format!("{key} = \"{val}\"");
                }

                return Some(format!("# {description}\n{val}"));
            })
            .collect::<Vec<String>>()
            .join("\n\n");

        return toml_str;
    }
}
