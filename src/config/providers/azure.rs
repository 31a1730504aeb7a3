use serde::{Deserialize, Serialize};
use url::Url;

use super::UpstreamOverrides;

/// Azure OpenAI deployment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AzureConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com/`.
    /// Env: `AZURE_OPENAI_ENDPOINT`.
    #[serde(default)]
    pub endpoint: Option<Url>,

    /// Env: `AZURE_OPENAI_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Env: `AZURE_OPENAI_API_VERSION`. Default: `2024-06-01`.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Deployment name; selects the model. Env: `AZURE_OPENAI_DEPLOYMENT_NAME`.
    #[serde(default)]
    pub deployment: Option<String>,

    #[serde(flatten)]
    pub upstream: UpstreamOverrides,
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            api_version: default_api_version(),
            deployment: None,
            upstream: UpstreamOverrides::default(),
        }
    }
}

fn default_api_version() -> String {
    "2024-06-01".to_string()
}
