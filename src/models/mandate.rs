use serde::Deserialize;

/// Validated configuration binding one container to a backup pipeline.
///
/// Produced by an out-of-scope discovery/label layer; by the time a config
/// reaches the orchestrator its fields are schema-valid, but the referenced
/// target name and provider type strings may still be unknown.
#[derive(Debug, Clone, Deserialize)]
pub struct MandateConfig {
    pub container_id: String,
    pub container_name: String,
    /// Provider type string resolved through the source registry.
    pub source_type: String,
    /// Name of a target registered with the orchestrator.
    pub target: String,
    /// Middleware type strings, applied in order between capture and persist.
    #[serde(default)]
    pub middlewares: Vec<String>,
    /// Cron expression; `None` means manual triggering only.
    pub interval: Option<String>,
    /// Number of most recent backups to keep. `None` or `Some(0)` disables
    /// pruning.
    pub retention: Option<u32>,
    /// Run name pattern; `{container}` and `{date}` are substituted.
    #[serde(default = "default_name_pattern")]
    pub name_pattern: String,
}

fn default_name_pattern() -> String {
    "{container}-{date}".to_string()
}
