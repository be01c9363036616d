use std::fs;
use std::path::{Path, PathBuf};

/// Isolated XDG config and cache homes for tests that load configuration or sessions.
pub struct TestContext {
    pub _temp_dir: tempfile::TempDir,
    pub test_root: PathBuf,
    pub config_dir: PathBuf,
    pub cache_dir: PathBuf,
}

impl TestContext {
    pub fn new() -> Self {
        let temp_dir = tempfile::Builder::new()
            .prefix("reckon-test-")
            .tempdir()
            .expect("Failed to create temp dir");
        let test_root = temp_dir.path().to_path_buf();

        let config_dir = test_root.join("config");
        let cache_dir = test_root.join("cache");
        fs::create_dir_all(config_dir.join("reckon")).expect("Failed to create config dir");
        fs::create_dir_all(&cache_dir).expect("Failed to create cache dir");

        Self {
            _temp_dir: temp_dir,
            test_root,
            config_dir,
            cache_dir,
        }
    }

    pub fn reckon_config_dir(&self) -> PathBuf {
        self.config_dir.join("reckon")
    }

    pub fn write_config(&self, content: &str) -> PathBuf {
        let path = self.reckon_config_dir().join("config.toml");
        fs::write(&path, content).expect("Failed to write temp config");
        path
    }

    pub fn session_path(&self) -> PathBuf {
        self.reckon_config_dir().join("session.json")
    }

    pub fn write_file(&self, relative: impl AsRef<Path>, content: &str) -> PathBuf {
        let path = self.test_root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(&path, content).expect("Failed to write file");
        path
    }

    /// Environment that points a child `reckon` process at this context.
    pub fn envs(&self) -> Vec<(&'static str, PathBuf)> {
        vec![
            ("XDG_CONFIG_HOME", self.config_dir.clone()),
            ("XDG_CACHE_HOME", self.cache_dir.clone()),
        ]
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
