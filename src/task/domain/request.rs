//! Validated task requests and the generation parameters derived from them.

use super::{TaskMetadata, TaskRequestError};

/// Inclusive temperature range accepted by the completion provider.
const TEMPERATURE_RANGE: std::ops::RangeInclusive<f64> = 0.0..=2.0;

/// Natural-language task submitted for execution.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRequest {
    prompt: String,
    model: Option<String>,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
    system_prompt: Option<String>,
    options: TaskMetadata,
}

impl TaskRequest {
    /// Creates a request for the given prompt.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRequestError::EmptyPrompt`] when the prompt is empty.
    pub fn new(prompt: impl Into<String>) -> Result<Self, TaskRequestError> {
        let prompt = prompt.into();
        if prompt.is_empty() {
            return Err(TaskRequestError::EmptyPrompt);
        }
        Ok(Self {
            prompt,
            model: None,
            temperature: None,
            max_tokens: None,
            system_prompt: None,
            options: TaskMetadata::new(),
        })
    }

    /// Sets the model used for every completion call.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the sampling temperature.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRequestError::InvalidTemperature`] when the value lies
    /// outside `[0.0, 2.0]`.
    pub fn with_temperature(mut self, temperature: f64) -> Result<Self, TaskRequestError> {
        if !TEMPERATURE_RANGE.contains(&temperature) {
            return Err(TaskRequestError::InvalidTemperature(temperature));
        }
        self.temperature = Some(temperature);
        Ok(self)
    }

    /// Sets the maximum number of generated tokens.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRequestError::InvalidMaxTokens`] when the value is not a
    /// positive integer that fits the provider's 32-bit limit.
    pub fn with_max_tokens(mut self, max_tokens: i64) -> Result<Self, TaskRequestError> {
        let value = u32::try_from(max_tokens)
            .ok()
            .filter(|value| *value > 0)
            .ok_or(TaskRequestError::InvalidMaxTokens(max_tokens))?;
        self.max_tokens = Some(value);
        Ok(self)
    }

    /// Sets the system prompt.
    #[must_use]
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    /// Sets free-form request options.
    #[must_use]
    pub fn with_options(mut self, options: TaskMetadata) -> Self {
        self.options = options;
        self
    }

    /// Returns the prompt text.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Returns the requested model, if any.
    #[must_use]
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Returns the requested temperature, if any.
    #[must_use]
    pub const fn temperature(&self) -> Option<f64> {
        self.temperature
    }

    /// Returns the requested token budget, if any.
    #[must_use]
    pub const fn max_tokens(&self) -> Option<u32> {
        self.max_tokens
    }

    /// Returns the system prompt, if any.
    #[must_use]
    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    /// Returns the request options.
    #[must_use]
    pub const fn options(&self) -> &TaskMetadata {
        &self.options
    }

    /// Resolves the parameters for completion calls, filling gaps from
    /// `defaults`.
    #[must_use]
    pub fn generation_parameters(&self, defaults: &GenerationDefaults) -> GenerationParameters {
        GenerationParameters {
            model: self
                .model
                .clone()
                .unwrap_or_else(|| defaults.model.clone()),
            temperature: self.temperature.unwrap_or(defaults.temperature),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            system_prompt: self.system_prompt.clone(),
        }
    }
}

/// Deployment-wide generation settings used when a request omits them.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationDefaults {
    /// Default model name.
    pub model: String,
    /// Default sampling temperature.
    pub temperature: f64,
    /// Default token budget.
    pub max_tokens: u32,
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_owned(),
            temperature: 0.7,
            max_tokens: 4000,
        }
    }
}

/// Effective parameters passed to every completion call of a pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParameters {
    /// Model name.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Token budget.
    pub max_tokens: u32,
    /// Optional system prompt.
    pub system_prompt: Option<String>,
}
