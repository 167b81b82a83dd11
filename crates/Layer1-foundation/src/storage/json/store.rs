//! JSON 파일 저장소
//!
//! 설정 파일을 한 디렉토리 안에서 이름으로 읽고 씁니다.
//! 저장은 임시 파일에 쓴 뒤 rename 하므로 중간에 끊겨도 기존 파일이 남습니다.

use crate::{Error, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// 글로벌 설정 디렉토리 이름 (`<config_dir>/relay`)
const GLOBAL_DIR: &str = "relay";

/// 프로젝트 설정 디렉토리 이름 (`<project>/.relay`)
const PROJECT_DIR: &str = ".relay";

/// JSON 설정 저장소
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// `<config_dir>/relay`
    pub fn global() -> Result<Self> {
        dirs::config_dir()
            .map(|dir| Self::new(dir.join(GLOBAL_DIR)))
            .ok_or_else(|| Error::Config("Cannot find config directory".to_string()))
    }

    /// `<root>/.relay`
    pub fn project(root: impl AsRef<Path>) -> Self {
        Self::new(root.as_ref().join(PROJECT_DIR))
    }

    pub fn current_project() -> Result<Self> {
        Ok(Self::project(std::env::current_dir()?))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn file_path(&self, filename: &str) -> PathBuf {
        self.base_dir.join(filename)
    }

    pub fn exists(&self, filename: &str) -> bool {
        self.file_path(filename).is_file()
    }

    /// 파일이 없으면 `None`, 있는데 깨져 있으면 에러
    pub fn load_optional<T: DeserializeOwned>(&self, filename: &str) -> Result<Option<T>> {
        let path = self.file_path(filename);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::Config(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| Error::Config(format!("Invalid JSON in {}: {}", path.display(), e)))
    }

    /// 저장 (임시 파일 → rename)
    pub fn save<T: Serialize>(&self, filename: &str, data: &T) -> Result<()> {
        std::fs::create_dir_all(&self.base_dir)?;

        let path = self.file_path(filename);
        let tmp = path.with_extension("json.tmp");
        let mut content = serde_json::to_string_pretty(data)?;
        content.push('\n');

        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &path)
            .map_err(|e| Error::Config(format!("Failed to write {}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn test_save_creates_dir_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("nested"));
        let sample = Sample {
            name: "relay".to_string(),
            count: 3,
        };

        store.save("sample.json", &sample).unwrap();

        assert!(store.exists("sample.json"));
        assert!(!store.exists("sample.json.tmp"));
        let loaded: Option<Sample> = store.load_optional("sample.json").unwrap();
        assert_eq!(loaded, Some(sample));
    }

    #[test]
    fn test_missing_is_none_but_corrupt_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());

        let missing: Option<Sample> = store.load_optional("missing.json").unwrap();
        assert!(missing.is_none());

        std::fs::write(store.file_path("broken.json"), "{ not json").unwrap();
        let err = store.load_optional::<Sample>("broken.json").unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("Invalid JSON")));
    }

    #[test]
    fn test_project_dir_layout() {
        let store = JsonStore::project("/tmp/work");
        assert_eq!(store.base_dir(), Path::new("/tmp/work/.relay"));
    }
}
