use dotenv::dotenv;
use log::warn;
use rustyline::EditMode;
use std::env;
use std::path::PathBuf;

use crate::shell::parser::DEFAULT_MAX_ARGS;

pub struct Config {
    pub name: String,
    pub config_dir: PathBuf,
    pub theme: String,
    pub editor_mode: String,
    pub logger_level: String,
    pub logger_dir: PathBuf,
    pub max_args: usize,
}

impl Config {
    fn get_config_dir() -> PathBuf {
        if let Ok(home) = env::var("HOME") {
            PathBuf::from(home).join(".config/pipesh")
        } else {
            PathBuf::from("/tmp/pipesh")
        }
    }

    fn default() -> Self {
        let config_dir = Self::get_config_dir();
        Config {
            name: String::from("pipesh"),
            logger_dir: config_dir.join("logs"),
            config_dir,
            theme: String::from("default"),
            editor_mode: String::from("emacs"),
            logger_level: String::from("warn"),
            max_args: DEFAULT_MAX_ARGS,
        }
    }

    pub fn new() -> Self {
        // 优先加载 .env 文件中的变量
        if cfg!(debug_assertions) {
            dotenv::from_filename(".env.development").ok();
        } else {
            dotenv().ok();
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 以默认配置为基础，用 `lookup` 查到的值覆盖
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(theme) = lookup("PIPESH_THEME") {
            config.theme = theme;
        }

        if let Some(editor) = lookup("PIPESH_EDITOR") {
            config.editor_mode = editor;
        }

        if let Some(level) = lookup("PIPESH_LOG_LEVEL") {
            config.logger_level = level;
        }

        if let Some(dir) = lookup("PIPESH_LOG_DIR") {
            config.logger_dir = PathBuf::from(dir);
        }

        if let Some(max_args) = lookup("PIPESH_MAX_ARGS") {
            match max_args.trim().parse::<usize>() {
                Ok(n) if n > 0 => config.max_args = n,
                _ => warn!(
                    "PIPESH_MAX_ARGS 无效: {:?}，使用默认值 {}",
                    max_args, DEFAULT_MAX_ARGS
                ),
            }
        }

        config
    }

    pub fn get_edit_mode(&self) -> EditMode {
        match self.editor_mode.to_lowercase().as_str() {
            "vi" => EditMode::Vi,
            _ => EditMode::Emacs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.name, "pipesh");
        assert_eq!(config.theme, "default");
        assert_eq!(config.logger_level, "warn");
        assert_eq!(config.max_args, DEFAULT_MAX_ARGS);
        assert_eq!(config.get_edit_mode(), EditMode::Emacs);
        assert!(config.logger_dir.ends_with("logs"));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PIPESH_THEME", "dark"),
            ("PIPESH_EDITOR", "VI"),
            ("PIPESH_LOG_LEVEL", "debug"),
            ("PIPESH_LOG_DIR", "/var/tmp/pipesh"),
            ("PIPESH_MAX_ARGS", "32"),
        ]);
        assert_eq!(config.theme, "dark");
        assert_eq!(config.get_edit_mode(), EditMode::Vi);
        assert_eq!(config.logger_level, "debug");
        assert_eq!(config.logger_dir, PathBuf::from("/var/tmp/pipesh"));
        assert_eq!(config.max_args, 32);
    }

    #[test]
    fn test_invalid_max_args_falls_back() {
        assert_eq!(config_from(&[("PIPESH_MAX_ARGS", "0")]).max_args, DEFAULT_MAX_ARGS);
        assert_eq!(config_from(&[("PIPESH_MAX_ARGS", "lots")]).max_args, DEFAULT_MAX_ARGS);
    }
}
