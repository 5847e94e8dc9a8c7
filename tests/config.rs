use std::fs;

use completion_context::config::ConfigError;
use completion_context::snippet::EditHistory;
use completion_context::types::CodebaseId;
use completion_context::{AssemblerConfig, FailurePolicy};
use tempfile::tempdir;

#[test]
fn missing_keys_fall_back_to_v0() {
    let config = AssemblerConfig::from_toml_str("max_chars = 1200\n").unwrap();

    assert_eq!(config.max_chars, 1200);
    assert_eq!(
        AssemblerConfig {
            max_chars: 4000,
            ..config
        },
        AssemblerConfig::v0()
    );
}

#[test]
fn full_config_round_trips_through_a_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("completion-context.toml");
    fs::write(
        &path,
        r#"
max_chars = 2048
embeddings_enabled = true
jaccard_window_size = 20
max_local_matches = 4
embeddings_query_lines = 3
embeddings_max_age_secs = 60
embeddings_max_entries = 32
on_source_failure = "abort"
"#,
    )
    .unwrap();

    let config = AssemblerConfig::from_path(&path).unwrap();

    assert_eq!(config.max_chars, 2048);
    assert!(config.embeddings_enabled);
    assert_eq!(config.jaccard_window_size, 20);
    assert_eq!(config.embeddings_max_entries, 32);
    assert_eq!(config.on_source_failure, FailurePolicy::Abort);

    let rendered = toml::to_string(&config).unwrap();
    assert_eq!(AssemblerConfig::from_toml_str(&rendered).unwrap(), config);
}

#[test]
fn negative_budget_is_rejected_before_assembly() {
    let err = AssemblerConfig::from_toml_str("max_chars = -1\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn zero_window_is_rejected() {
    let err = AssemblerConfig::from_toml_str("jaccard_window_size = 0\n").unwrap_err();
    assert!(matches!(err, ConfigError::ZeroField { field: "jaccard_window_size" }));
}

#[test]
fn unbounded_embeddings_cache_is_rejected() {
    let err = AssemblerConfig::from_toml_str("embeddings_max_entries = 0\n").unwrap_err();
    assert!(matches!(err, ConfigError::ZeroField { field: "embeddings_max_entries" }));
}

#[test]
fn unreadable_path_reports_io_error() {
    let dir = tempdir().unwrap();
    let err = AssemblerConfig::from_path(&dir.path().join("missing.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn request_carries_budget_and_embeddings_switch() {
    let config = AssemblerConfig {
        max_chars: 321,
        embeddings_enabled: true,
        ..AssemblerConfig::default()
    };

    let request = config.request(
        "pre",
        "suf",
        "src/a.ts",
        EditHistory::new(),
        CodebaseId::new("repo"),
    );

    assert_eq!(request.max_chars, 321);
    assert!(request.embeddings_enabled);
    assert_eq!(request.current_file.as_str(), "src/a.ts");
    assert_eq!(request.codebase.as_str(), "repo");
}

#[tokio::test]
async fn components_built_from_config_honor_it() {
    use completion_context::retrieval::{DisabledEmbeddings, JaccardWindowSource};
    use completion_context::ContextAssembler;

    let config = AssemblerConfig::from_toml_str("max_chars = 12\nmax_local_matches = 1\n").unwrap();
    let mut history = EditHistory::new();
    history.record("src/one.ts", "total price");
    history.record("src/two.ts", "total price");

    let assembler = ContextAssembler::from_config(
        DisabledEmbeddings,
        JaccardWindowSource::from_config(&config),
        &config,
    );
    let request = config.request("total price", "", "src/main.ts", history, CodebaseId::default());
    let result = assembler.assemble_context(&request).await.unwrap();

    assert_eq!(result.stats.local_considered, 1);
    assert_eq!(result.context.len(), 1);
    assert_eq!(result.context[0].file_name.as_str(), "src/one.ts");
    assert_eq!(result.stats.budget, 12);
}
