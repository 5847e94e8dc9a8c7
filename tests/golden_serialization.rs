use completion_context::types::{AssemblyStats, InclusionSummary};
use completion_context::{AssemblyRequest, AssemblyResult, ContextAssembler, ReferenceSnippet};
use completion_context::retrieval::{DisabledEmbeddings, JaccardWindowSource};
use completion_context::snippet::EditHistory;

#[tokio::test]
async fn golden_assembly_result_serialization() {
    let mut history = EditHistory::new();
    history.record("src/math.ts", "export function add(a: number, b: number) {\n  return a + b\n}");
    let request = AssemblyRequest::new("const total = add(a, b)\n", "", 100)
        .with_current_file("src/main.ts")
        .with_history(history);

    let assembler = ContextAssembler::new(DisabledEmbeddings, JaccardWindowSource::new(3, 5));
    let result = assembler.assemble_context(&request).await.unwrap();

    let json_str = serde_json::to_string_pretty(&result).unwrap();

    // Key order: context, then summary, then stats.
    let context_pos = json_str.find("\"context\":").expect("Missing context key");
    let summary_pos = json_str.find("\"inclusion_summary\":").expect("Missing summary key");
    let stats_pos = json_str.find("\"stats\":").expect("Missing stats key");
    assert!(context_pos < summary_pos);
    assert!(summary_pos < stats_pos);

    const EXPECTED_JSON: &str = r#"{
      "context": [
        {
          "fileName": "src/math.ts",
          "content": "export function add(a: number, b: number) {\n  return a + b\n}"
        }
      ],
      "inclusion_summary": {
        "local": 1
      },
      "stats": {
        "budget": 100,
        "chars_used": 60,
        "embeddings_considered": 0,
        "local_considered": 1,
        "rejected_duplicate": 0,
        "rejected_over_budget": 0
      }
    }"#;

    let normalized_actual: String = json_str.chars().filter(|c| !c.is_whitespace()).collect();
    let normalized_expected: String =
        EXPECTED_JSON.chars().filter(|c| !c.is_whitespace()).collect();
    assert_eq!(
        normalized_actual, normalized_expected,
        "JSON structure mismatch against golden snapshot"
    );

    let deserialized: AssemblyResult =
        serde_json::from_str(&json_str).expect("Deserialization failed");
    assert_eq!(deserialized, result);
}

#[test]
fn empty_summary_serializes_as_empty_object() {
    let result = AssemblyResult {
        context: Vec::new(),
        inclusion_summary: InclusionSummary::default(),
        stats: AssemblyStats::default(),
    };

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["inclusion_summary"], serde_json::json!({}));
    assert!(value["stats"].get("degraded_sources").is_none());
}

#[test]
fn snippets_parse_from_search_result_payload() {
    let payload = r#"[
        {"fileName": "lib/parser.go", "content": "func Parse() {}"},
        {"fileName": "lib/lexer.go", "content": "func Lex() {}"}
    ]"#;

    let snippets: Vec<ReferenceSnippet> = serde_json::from_str(payload).unwrap();

    assert_eq!(snippets.len(), 2);
    assert_eq!(snippets[0].file_name.as_str(), "lib/parser.go");
    assert_eq!(snippets[1].content, "func Lex() {}");
}
