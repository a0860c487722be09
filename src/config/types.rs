use serde::Deserialize;

/// Main configuration structure for Specimen Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    pub download: DownloadConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub species: Vec<SpeciesEntry>,
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Download behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadConfig {
    /// Directory under which one folder per species is created
    #[serde(rename = "output-root")]
    pub output_root: String,

    /// Upper bound on the progress counter for each source run
    #[serde(rename = "max-images-per-source")]
    pub max_images_per_source: usize,
}

/// Which sources to query and where their APIs live
#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "enabled")]
    pub inaturalist: bool,

    #[serde(default = "enabled")]
    pub gbif: bool,

    /// Base URL of the iNaturalist API
    #[serde(rename = "inaturalist-url", default = "default_inaturalist_url")]
    pub inaturalist_url: String,

    /// Base URL of the GBIF API
    #[serde(rename = "gbif-url", default = "default_gbif_url")]
    pub gbif_url: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            inaturalist: true,
            gbif: true,
            inaturalist_url: default_inaturalist_url(),
            gbif_url: default_gbif_url(),
        }
    }
}

/// One species to download
#[derive(Debug, Clone, Deserialize)]
pub struct SpeciesEntry {
    /// Scientific name, used as the iNaturalist query and for file naming
    pub name: String,

    /// GBIF backbone taxon key; GBIF is skipped for species without one
    #[serde(rename = "gbif-taxon-key", default)]
    pub gbif_taxon_key: Option<u64>,
}

fn default_user_agent() -> String {
    format!("specimen-harvest/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    10
}

fn enabled() -> bool {
    true
}

fn default_inaturalist_url() -> String {
    "https://api.inaturalist.org".to_string()
}

fn default_gbif_url() -> String {
    "https://api.gbif.org".to_string()
}
