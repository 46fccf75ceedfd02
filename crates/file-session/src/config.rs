use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::error::SessionError;

type Result<T> = anyhow::Result<T>;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    pub files_base_path: PathBuf,
    #[serde(default = "default_files_connect_path")]
    pub files_connect_path: String,
    #[serde(default = "default_echo_connect_path")]
    pub echo_connect_path: String,
    #[serde(default = "default_principal_header")]
    pub principal_header: String,
    #[serde(default = "default_outbound_buffer_size")]
    pub outbound_buffer_size: usize,
    #[serde(default = "default_event_buffer_size")]
    pub event_buffer_size: usize,
}

impl ServerConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).context("failed to deserialize server config")?;
        config.validate()?;
        Ok(config)
    }

    /// 使用默认值并指定文件根目录。
    pub fn with_base_path(files_base_path: impl Into<PathBuf>) -> Self {
        Self {
            bind_address: default_bind_address(),
            files_base_path: files_base_path.into(),
            files_connect_path: default_files_connect_path(),
            echo_connect_path: default_echo_connect_path(),
            principal_header: default_principal_header(),
            outbound_buffer_size: default_outbound_buffer_size(),
            event_buffer_size: default_event_buffer_size(),
        }
    }

    pub fn validate(&self) -> std::result::Result<(), SessionError> {
        if self.files_base_path.as_os_str().is_empty() {
            return Err(SessionError::Config("files_base_path must not be empty".into()));
        }
        for (name, route) in [
            ("files_connect_path", &self.files_connect_path),
            ("echo_connect_path", &self.echo_connect_path),
        ] {
            if !route.starts_with('/') {
                return Err(SessionError::Config(format!(
                    "{name} must start with '/': {route}"
                )));
            }
        }
        if self.files_connect_path == self.echo_connect_path {
            return Err(SessionError::Config(
                "files_connect_path and echo_connect_path must differ".into(),
            ));
        }
        if self.principal_header.trim().is_empty() {
            return Err(SessionError::Config("principal_header must not be empty".into()));
        }
        if self.outbound_buffer_size == 0 || self.event_buffer_size == 0 {
            return Err(SessionError::Config("buffer sizes must be positive".into()));
        }
        Ok(())
    }

    /// 解析并校验文件根目录，返回规范化后的绝对路径。
    pub fn acquire_root(&self) -> std::result::Result<PathBuf, SessionError> {
        let root = self
            .files_base_path
            .canonicalize()
            .map_err(|source| SessionError::RootUnavailable {
                path: self.files_base_path.display().to_string(),
                source,
            })?;
        if !root.is_dir() {
            return Err(SessionError::RootNotADirectory(root.display().to_string()));
        }
        Ok(root)
    }
}

fn default_bind_address() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_files_connect_path() -> String {
    "/files_connect".to_string()
}

fn default_echo_connect_path() -> String {
    "/echo_connect".to_string()
}

fn default_principal_header() -> String {
    "x-authenticated-user".to_string()
}

fn default_outbound_buffer_size() -> usize {
    64
}

fn default_event_buffer_size() -> usize {
    256
}
