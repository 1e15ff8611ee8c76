//! Configuration for a financial-statement analysis.
//!
//! All behaviour is controlled through [`AnalysisConfig`], built via its
//! [`AnalysisConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs across tasks, log them, and diff two runs to
//! understand why their reports differ.
//!
//! # Design choice: builder over constructor
//! The builder lets callers set only what they care about and rely on
//! well-documented defaults for the rest.

use crate::error::CreditsheetError;
use crate::pipeline::extract::Extractor;
use std::fmt;
use std::sync::Arc;

/// Default extraction model.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Maximum accepted PDF size: 10 MiB, matching the upload contract.
pub const DEFAULT_MAX_PDF_BYTES: u64 = 10 * 1024 * 1024;

/// Maximum company-name length in characters.
pub const MAX_COMPANY_NAME_CHARS: usize = 100;

/// Configuration for one analysis run.
///
/// Built via [`AnalysisConfig::builder()`] or [`AnalysisConfig::default()`].
///
/// # Example
/// ```rust
/// use creditsheet::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .model("gemini-2.5-pro")
///     .max_retries(5)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct AnalysisConfig {
    /// Gemini model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// API key for the Gemini API. If `None`, read from `GEMINI_API_KEY`
    /// when the extractor is constructed.
    pub api_key: Option<String>,

    /// Pre-constructed extractor. Takes precedence over `model`/`api_key`.
    ///
    /// This is the test seam and the extension point: inject a canned
    /// extractor in tests, or wrap the real one with caching or
    /// rate-limiting middleware.
    pub extractor: Option<Arc<dyn Extractor>>,

    /// Sampling temperature for the extraction completion. Default: 0.1.
    ///
    /// Low temperature keeps the model faithful to the figures printed on
    /// the page — exactly what you want for extraction. Higher values
    /// introduce creativity that corrupts numbers.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 8192.
    ///
    /// Statement-heavy annual reports produce long notes arrays. Setting
    /// this too low truncates the JSON mid-object, which surfaces as a
    /// malformed-response error.
    pub max_output_tokens: usize,

    /// Maximum retry attempts on a transient API failure. Default: 3.
    ///
    /// 429s and 5xx are transient under load; auth errors (401/403) are not
    /// retried and surface immediately.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff). Default: 500.
    ///
    /// Doubles after each attempt: 500 ms → 1 s → 2 s.
    pub retry_backoff_ms: u64,

    /// Custom extraction prompt. If `None`, uses the built-in default.
    pub extraction_prompt: Option<String>,

    /// Maximum accepted PDF size in bytes. Default: [`DEFAULT_MAX_PDF_BYTES`].
    pub max_pdf_bytes: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Per-API-call timeout in seconds. Default: 120.
    ///
    /// A whole statement PDF goes up in one request, so this is generous
    /// compared to a chat call.
    pub api_timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            extractor: None,
            temperature: 0.1,
            max_output_tokens: 8192,
            max_retries: 3,
            retry_backoff_ms: 500,
            extraction_prompt: None,
            max_pdf_bytes: DEFAULT_MAX_PDF_BYTES,
            download_timeout_secs: 120,
            api_timeout_secs: 120,
        }
    }
}

impl fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("extractor", &self.extractor.as_ref().map(|_| "<dyn Extractor>"))
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("max_pdf_bytes", &self.max_pdf_bytes)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .finish()
    }
}

impl AnalysisConfig {
    /// Create a new builder for `AnalysisConfig`.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`AnalysisConfig`].
#[derive(Debug)]
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.config.extractor = Some(extractor);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_output_tokens(mut self, n: usize) -> Self {
        self.config.max_output_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn extraction_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.extraction_prompt = Some(prompt.into());
        self
    }

    pub fn max_pdf_bytes(mut self, bytes: u64) -> Self {
        self.config.max_pdf_bytes = bytes;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalysisConfig, CreditsheetError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(CreditsheetError::InvalidConfig(
                "Model identifier must be non-empty".into(),
            ));
        }
        if c.max_pdf_bytes == 0 {
            return Err(CreditsheetError::InvalidConfig(
                "max_pdf_bytes must be ≥ 1".into(),
            ));
        }
        if c.max_output_tokens == 0 {
            return Err(CreditsheetError::InvalidConfig(
                "max_output_tokens must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}
