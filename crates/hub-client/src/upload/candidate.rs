use std::path::{Path, PathBuf};

use hub_proto::config::UploadConfig;
use hub_proto::media;

use super::UploadError;

/// A file the user picked, before it is accepted by the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCandidate {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    /// Declared media type; `None` when the extension is unrecognised.
    pub media_type: Option<String>,
}

impl UploadCandidate {
    /// Reads size from disk metadata and guesses the type from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, UploadError> {
        let given = path.as_ref();
        let unreadable = |e: std::io::Error| UploadError::Unreadable {
            path: given.display().to_string(),
            reason: e.to_string(),
        };
        // Absolute, so the preview URL and later reads do not depend on cwd.
        let path = &tokio::fs::canonicalize(given).await.map_err(unreadable)?;
        let meta = tokio::fs::metadata(path).await.map_err(unreadable)?;
        if !meta.is_file() {
            return Err(UploadError::Unreadable {
                path: path.display().to_string(),
                reason: "not a regular file".to_string(),
            });
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            path: path.to_path_buf(),
            name,
            size: meta.len(),
            media_type: media::media_type_for(path).map(str::to_string),
        })
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }
}

/// Acceptance rules applied on selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRules {
    pub max_size_bytes: u64,
    pub allowed_types: Vec<String>,
}

impl Default for UploadRules {
    fn default() -> Self {
        Self::from(&UploadConfig::default())
    }
}

impl From<&UploadConfig> for UploadRules {
    fn from(config: &UploadConfig) -> Self {
        Self {
            max_size_bytes: config.max_size_bytes,
            allowed_types: config.allowed_types.clone(),
        }
    }
}

impl UploadRules {
    /// Type first, then size. A type passes if it is listed or is any `video/*`.
    pub fn validate(&self, candidate: &UploadCandidate) -> Result<(), UploadError> {
        let type_ok = candidate.media_type.as_deref().is_some_and(|t| {
            let t = t.to_ascii_lowercase();
            t.starts_with("video/") || self.allowed_types.iter().any(|a| a.eq_ignore_ascii_case(&t))
        });
        if !type_ok {
            return Err(UploadError::UnsupportedType);
        }
        if candidate.size > self.max_size_bytes {
            return Err(UploadError::TooLarge {
                max_mb: self.max_size_bytes / (1024 * 1024),
            });
        }
        Ok(())
    }
}

/// `"my_holiday-clip.final.mp4"` → `"My holiday clip.final"`.
pub fn title_from_filename(name: &str) -> String {
    let stem = match name.rfind('.') {
        Some(dot) if dot + 1 < name.len() && !name[dot + 1..].contains('/') => &name[..dot],
        _ => name,
    };
    let spaced = stem.replace(['_', '-'], " ");

    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(media_type: Option<&str>, size: u64) -> UploadCandidate {
        UploadCandidate {
            path: PathBuf::from("/tmp/clip.mp4"),
            name: "clip.mp4".to_string(),
            size,
            media_type: media_type.map(str::to_string),
        }
    }

    #[test]
    fn test_title_from_filename() {
        assert_eq!(title_from_filename("my_holiday-clip.mp4"), "My holiday clip");
        assert_eq!(title_from_filename("a.b.webm"), "A.b");
        assert_eq!(title_from_filename("noext"), "Noext");
        assert_eq!(title_from_filename(".mp4"), "");
        assert_eq!(title_from_filename("trailing."), "Trailing.");
        assert_eq!(title_from_filename("élan.mov"), "Élan");
    }

    #[test]
    fn test_rules_reject_non_video() {
        let rules = UploadRules::default();
        assert_eq!(
            rules.validate(&candidate(Some("image/png"), 10)),
            Err(UploadError::UnsupportedType)
        );
        assert_eq!(
            rules.validate(&candidate(None, 10)),
            Err(UploadError::UnsupportedType)
        );
        assert_eq!(rules.validate(&candidate(Some("video/x-flv"), 10)), Ok(()));
    }

    #[test]
    fn test_rules_reject_oversize() {
        let rules = UploadRules::default();
        let err = rules
            .validate(&candidate(Some("video/mp4"), 600 * 1024 * 1024))
            .unwrap_err();
        assert_eq!(err.to_string(), "File too large. Maximum size is 500MB.");
        assert_eq!(
            rules.validate(&candidate(Some("video/mp4"), 500 * 1024 * 1024)),
            Ok(())
        );
    }

    #[tokio::test]
    async fn test_from_path_reads_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Trip.MOV");
        std::fs::write(&path, b"12345").unwrap();

        let c = UploadCandidate::from_path(&path).await.unwrap();
        assert_eq!(c.name, "Trip.MOV");
        assert_eq!(c.size, 5);
        assert_eq!(c.media_type.as_deref(), Some("video/quicktime"));

        let missing = UploadCandidate::from_path(dir.path().join("nope.mp4")).await;
        assert!(matches!(missing, Err(UploadError::Unreadable { .. })));
    }

    #[tokio::test]
    async fn test_from_path_makes_relative_paths_absolute() {
        let file = tempfile::Builder::new()
            .suffix(".mp4")
            .tempfile_in(".")
            .unwrap();
        let relative = PathBuf::from(".").join(file.path().file_name().unwrap());

        let c = UploadCandidate::from_path(&relative).await.unwrap();
        assert!(c.path.is_absolute(), "{}", c.path.display());
        assert_eq!(c.path, std::fs::canonicalize(file.path()).unwrap());
        assert!(reqwest::Url::from_file_path(&c.path).is_ok());
    }
}
