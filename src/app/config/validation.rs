use super::{ConfigError, ServeConfig, TailConfig};

impl ServeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client_queue_capacity == 0 {
            return Err(ConfigError::InvalidConfig(
                "Client queue capacity must be greater than 0".to_string(),
            ));
        }

        if self.max_file_size_bytes == 0 {
            return Err(ConfigError::InvalidConfig(
                "Max file size must be greater than 0".to_string(),
            ));
        }

        if let (Some(min), Some(max)) = (self.level_min, self.level_max)
            && min > max
        {
            return Err(ConfigError::InvalidConfig(format!(
                "Level range is empty: minimum {min} is above maximum {max}"
            )));
        }

        if let Some(file) = &self.file
            && file.is_dir()
        {
            return Err(ConfigError::InvalidConfig(format!(
                "Log file path is a directory: {}",
                file.display()
            )));
        }

        Ok(())
    }
}

impl TailConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::InvalidConfig("Host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidConfig("Port must be greater than 0".to_string()));
        }
        Ok(())
    }
}
