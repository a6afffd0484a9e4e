//! Application configuration

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::application::dto::GeneratorOptions;
use crate::domain::value_objects::ImageFormat;

/// Vertex AI endpoint and identity settings
#[derive(Debug, Clone, PartialEq)]
pub struct VertexConfig {
    /// Checked by client validation, not at load time
    pub project: Option<String>,
    pub location: String,
    pub model: String,
    pub impersonate_service_account: Option<String>,
    /// Account the identity broker must report before any call is made
    pub required_account: Option<String>,
    pub request_timeout: Duration,
}

impl VertexConfig {
    pub fn endpoint(&self) -> Option<String> {
        let project = self.project.as_deref()?;
        Some(format!(
            "https://{location}-aiplatform.googleapis.com/v1/projects/{project}/locations/{location}/publishers/google/models/{model}:predict",
            location = self.location,
            project = project,
            model = self.model,
        ))
    }
}

/// Image parameters sent with every request
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSettings {
    pub width: u32,
    pub height: u32,
    pub guidance: f32,
    /// Fixed seed; a random one is drawn per request when unset
    pub seed: Option<u32>,
    pub format: ImageFormat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathsConfig {
    pub roster_path: PathBuf,
    /// Directory scanned by the audit
    pub images_dir: PathBuf,
    /// Directory new images are written to
    pub output_dir: PathBuf,
    pub debug_dir: PathBuf,
}

/// Application configuration loaded from environment
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub vertex: VertexConfig,
    pub image: ImageSettings,
    pub generator: GeneratorOptions,
    pub paths: PathsConfig,
}

/// Command-line values that take precedence over the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub dry_run: bool,
    pub verbose: bool,
    pub batch_size: Option<usize>,
    pub format: Option<ImageFormat>,
    pub delay_ms: Option<u64>,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let vars = Vars(&lookup);

        let (width, height) = parse_size(&vars.string("IMAGE_OUTPUT_SIZE", "512x512"))
            .context("IMAGE_OUTPUT_SIZE must look like 512x512")?;
        let format: ImageFormat = vars.parse("IMAGE_FORMAT", ImageFormat::Png)?;

        let batch_size: usize = vars.parse("BATCH_SIZE", 5)?;
        if batch_size == 0 {
            return Err(anyhow!("BATCH_SIZE must be at least 1"));
        }

        Ok(Self {
            vertex: VertexConfig {
                project: vars.optional("GOOGLE_CLOUD_PROJECT"),
                location: vars.string("VERTEX_AI_REGION", "us-central1"),
                model: vars.string("VERTEX_AI_MODEL", "imagegeneration"),
                impersonate_service_account: vars.optional("GOOGLE_IMPERSONATE_SERVICE_ACCOUNT"),
                required_account: vars.optional("REQUIRED_GCLOUD_ACCOUNT"),
                request_timeout: Duration::from_secs(vars.parse("REQUEST_TIMEOUT_SECS", 120)?),
            },
            image: ImageSettings {
                width,
                height,
                guidance: vars.parse("IMAGE_GUIDANCE", 7.0)?,
                seed: vars.optional_parse("IMAGE_SEED")?,
                format,
            },
            generator: GeneratorOptions {
                dry_run: vars.flag("DRY_RUN")?,
                batch_size,
                delay_ms: vars.parse("RATE_LIMIT_DELAY", 2000)?,
                verbose: vars.flag("VERBOSE_LOGGING")?,
                output_format: format,
                report_retention_days: vars.parse("DEBUG_RETENTION_DAYS", 7)?,
            },
            paths: PathsConfig {
                roster_path: vars.string("HEROES_JSON_PATH", "public/heroes.json").into(),
                images_dir: vars.string("HERO_IMAGES_DIR", "public/images").into(),
                output_dir: vars.string("IMAGE_OUTPUT_DIR", "public/images").into(),
                debug_dir: vars.string("DEBUG_OUTPUT_DIR", "public/debug").into(),
            },
        })
    }

    pub fn apply(&mut self, overrides: &ConfigOverrides) -> Result<()> {
        self.generator.dry_run |= overrides.dry_run;
        self.generator.verbose |= overrides.verbose;
        if let Some(batch_size) = overrides.batch_size {
            if batch_size == 0 {
                return Err(anyhow!("--batch-size must be at least 1"));
            }
            self.generator.batch_size = batch_size;
        }
        if let Some(delay_ms) = overrides.delay_ms {
            self.generator.delay_ms = delay_ms;
        }
        if let Some(format) = overrides.format {
            self.generator.output_format = format;
            self.image.format = format;
        }
        Ok(())
    }
}

struct Vars<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Vars<'_, F> {
    /// Unset and blank values both count as absent
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn optional_parse<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key)
            .map(|raw| {
                raw.parse::<T>()
                    .map_err(|e| anyhow!("{key} has invalid value '{raw}': {e}"))
            })
            .transpose()
    }

    fn parse<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        Ok(self.optional_parse(key)?.unwrap_or(default))
    }

    fn flag(&self, key: &str) -> Result<bool> {
        match self.optional(key).map(|raw| raw.to_ascii_lowercase()) {
            None => Ok(false),
            Some(raw) => match raw.as_str() {
                "true" | "1" | "yes" => Ok(true),
                "false" | "0" | "no" => Ok(false),
                _ => Err(anyhow!("{key} must be true or false, got '{raw}'")),
            },
        }
    }
}

fn parse_size(raw: &str) -> Result<(u32, u32)> {
    let (width, height) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow!("missing 'x' separator in '{raw}'"))?;
    let width: u32 = width.trim().parse().context("invalid width")?;
    let height: u32 = height.trim().parse().context("invalid height")?;
    if width == 0 || height == 0 {
        return Err(anyhow!("dimensions must be positive"));
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).expect("defaults load");
        assert_eq!(config.vertex.project, None);
        assert_eq!(config.vertex.location, "us-central1");
        assert_eq!(config.vertex.model, "imagegeneration");
        assert_eq!(config.vertex.request_timeout, Duration::from_secs(120));
        assert_eq!((config.image.width, config.image.height), (512, 512));
        assert_eq!(config.image.seed, None);
        assert_eq!(config.generator, GeneratorOptions::default());
        assert_eq!(config.paths.roster_path, PathBuf::from("public/heroes.json"));
        assert_eq!(config.paths.debug_dir, PathBuf::from("public/debug"));
        assert!(config.vertex.endpoint().is_none());
    }

    #[test]
    fn test_values_from_environment() {
        let config = load(&[
            ("GOOGLE_CLOUD_PROJECT", "duper-heroes"),
            ("VERTEX_AI_REGION", "europe-west4"),
            ("IMAGE_OUTPUT_SIZE", "1024x768"),
            ("IMAGE_SEED", "42"),
            ("IMAGE_FORMAT", "JPEG"),
            ("BATCH_SIZE", "3"),
            ("DRY_RUN", "true"),
            ("REQUIRED_GCLOUD_ACCOUNT", "  "),
        ])
        .expect("load");

        assert_eq!(
            config.vertex.endpoint().as_deref(),
            Some("https://europe-west4-aiplatform.googleapis.com/v1/projects/duper-heroes/locations/europe-west4/publishers/google/models/imagegeneration:predict")
        );
        assert_eq!((config.image.width, config.image.height), (1024, 768));
        assert_eq!(config.image.seed, Some(42));
        assert_eq!(config.image.format, ImageFormat::Jpeg);
        assert_eq!(config.generator.output_format, ImageFormat::Jpeg);
        assert_eq!(config.generator.batch_size, 3);
        assert!(config.generator.dry_run);
        assert_eq!(config.vertex.required_account, None);
    }

    #[test]
    fn test_malformed_values_are_errors() {
        assert!(load(&[("BATCH_SIZE", "five")]).is_err());
        assert!(load(&[("BATCH_SIZE", "0")]).is_err());
        assert!(load(&[("IMAGE_OUTPUT_SIZE", "512")]).is_err());
        assert!(load(&[("IMAGE_FORMAT", "bmp")]).is_err());
        assert!(load(&[("DRY_RUN", "maybe")]).is_err());
        assert!(load(&[("RATE_LIMIT_DELAY", "-1")]).is_err());
    }

    #[test]
    fn test_overrides_take_precedence() {
        let mut config = load(&[("BATCH_SIZE", "3")]).expect("load");
        config
            .apply(&ConfigOverrides {
                dry_run: true,
                batch_size: Some(8),
                format: Some(ImageFormat::Webp),
                delay_ms: Some(0),
                ..ConfigOverrides::default()
            })
            .expect("apply");

        assert!(config.generator.dry_run);
        assert_eq!(config.generator.batch_size, 8);
        assert_eq!(config.generator.delay_ms, 0);
        assert_eq!(config.image.format, ImageFormat::Webp);
        assert_eq!(config.generator.output_format, ImageFormat::Webp);

        let zero = ConfigOverrides {
            batch_size: Some(0),
            ..ConfigOverrides::default()
        };
        assert!(config.apply(&zero).is_err());
    }
}
