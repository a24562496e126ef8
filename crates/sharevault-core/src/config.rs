//! 客户端配置和持久化
//!
//! 提供后端地址、下载目录等设置的存储和读取。
//! 后端地址可以被环境变量 `SHAREVAULT_API_BASE` 覆盖。

use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// 默认后端地址
pub const DEFAULT_API_BASE: &str = "http://localhost:5000";

/// 覆盖后端地址的环境变量
pub const API_BASE_ENV: &str = "SHAREVAULT_API_BASE";

/// 客户端设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// 后端地址 (不含 `/api/...` 路径)
    pub api_base: String,
    /// 下载目录
    pub download_dir: PathBuf,
    /// 详细日志模式
    pub verbose: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            download_dir: dirs::download_dir().unwrap_or_else(|| PathBuf::from(".")),
            verbose: false,
        }
    }
}

impl ClientSettings {
    /// 获取配置文件路径
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sharevault");
        config_dir.join("settings.toml")
    }

    /// 加载设置（如果文件不存在则使用默认值），再应用环境变量覆盖
    pub fn load() -> Self {
        Self::load_stored().with_env_override(std::env::var(API_BASE_ENV).ok())
    }

    /// 只读取配置文件，不应用环境变量（修改并保存配置时使用）
    pub fn load_stored() -> Self {
        let path = Self::config_path();
        if path.exists() {
            match fs::read_to_string(&path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(settings) => {
                        debug!("Loaded settings from {:?}", path);
                        return settings;
                    }
                    Err(e) => {
                        log::warn!("Failed to parse settings: {}, using defaults", e);
                    }
                },
                Err(e) => {
                    log::warn!("Failed to read settings file: {}, using defaults", e);
                }
            }
        }
        Self::default()
    }

    /// 用环境变量的值覆盖后端地址，空值忽略
    pub fn with_env_override(mut self, api_base: Option<String>) -> Self {
        if let Some(value) = api_base.filter(|v| !v.trim().is_empty()) {
            debug!("{} overrides api_base: {}", API_BASE_ENV, value);
            self.api_base = value;
        }
        self
    }

    /// 保存设置
    pub fn save(&self) -> anyhow::Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        debug!("Saved settings to {:?}", path);
        Ok(())
    }

    /// 规范化后的后端地址（去掉末尾的 `/`）
    pub fn api_base(&self) -> &str {
        self.api_base.trim().trim_end_matches('/')
    }

    /// 拼接接口地址
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base(), path.trim_start_matches('/'))
    }
}
