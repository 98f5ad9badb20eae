use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn memetrend_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_memetrend"))
}

/// Temp root with a config whose data lives under `<root>/data`.
/// `generation` is the body of the `[generation]` section.
fn setup_test_env(generation: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[store]
path = "{root}/data/memes.json"

[index]
path = "{root}/data/meme_index"
top_k = 5

[virality]
chart_path = "{root}/data/virality_plot.png"
chart_width = 400
chart_height = 240

[embedding]
provider = "hash"
dims = 128

[generation]
{generation}
"#,
        root = root.display(),
        generation = generation
    );

    let config_path = config_dir.join("memetrend.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_memetrend(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    run_memetrend_with_env(config_path, args, &[])
}

fn run_memetrend_with_env(config_path: &Path, args: &[&str], env: &[(&str, &str)]) -> (String, String, bool) {
    let binary = memetrend_binary();
    // relative paths in a scaffolded config resolve under the temp root
    let cwd = config_path.ancestors().nth(2).unwrap();
    let output = Command::new(&binary)
        .current_dir(cwd)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("RUST_LOG")
        .envs(env.iter().copied())
        .output()
        .unwrap_or_else(|e| panic!("Failed to run memetrend binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn add_sample_memes(config_path: &Path) {
    let (_, stderr, ok) = run_memetrend(
        config_path,
        &["add", "--text", "Pandas is slow #DataScience", "--desc", "Sad panda cartoon"],
    );
    assert!(ok, "add failed: {}", stderr);
    let (_, stderr, ok) = run_memetrend(
        config_path,
        &[
            "add",
            "--text",
            "Excel crashed again",
            "--desc",
            "Office worker screaming",
            "--likes",
            "3",
            "--retweets",
            "1",
        ],
    );
    assert!(ok, "add failed: {}", stderr);
}

#[test]
fn test_init_writes_config_once() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("config").join("memetrend.toml");

    let (stdout, stderr, ok) = run_memetrend(&config_path, &["init"]);
    assert!(ok, "init failed: {}", stderr);
    assert!(stdout.contains("Created config"));
    assert!(config_path.exists());
    assert!(tmp.path().join("data").is_dir());

    let (_, stderr, ok) = run_memetrend(&config_path, &["init"]);
    assert!(!ok);
    assert!(stderr.contains("already exists"));
}

#[test]
fn test_missing_config_hints_init() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, ok) = run_memetrend(&tmp.path().join("nope.toml"), &["list"]);
    assert!(!ok);
    assert!(stderr.contains("memetrend init"));
}

#[test]
fn test_add_list_and_trends() {
    let (tmp, config_path) = setup_test_env(r#"provider = "disabled""#);

    let (stdout, _, ok) = run_memetrend(&config_path, &["list"]);
    assert!(ok);
    assert!(stdout.contains("No memes yet"));

    add_sample_memes(&config_path);

    let (stdout, _, ok) = run_memetrend(&config_path, &["list"]);
    assert!(ok);
    assert!(stdout.contains("Pandas is slow #DataScience | Sad panda cartoon"));
    assert!(stdout.contains("Excel crashed again"));

    let (stdout, stderr, ok) = run_memetrend(&config_path, &["trends"]);
    assert!(ok, "trends failed: {}", stderr);
    assert!(stdout.contains("60.00"));
    assert!(stdout.contains("Hot Topics"));
    assert!(stdout.contains("General"));
    assert!(stdout.contains("Chart written to"));
    assert!(tmp.path().join("data").join("virality_plot.png").exists());

    let (stdout, _, ok) = run_memetrend(&config_path, &["list", "--json"]);
    assert!(ok);
    let records: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(records.as_array().unwrap().len(), 2);
    assert_eq!(records[0]["metadata"]["likes"], 50);
    assert_eq!(records[1]["metadata"]["retweets"], 1);
}

#[test]
fn test_trends_on_empty_store_writes_no_chart() {
    let (tmp, config_path) = setup_test_env(r#"provider = "disabled""#);
    let (stdout, _, ok) = run_memetrend(&config_path, &["trends"]);
    assert!(ok);
    assert!(stdout.contains("No memes yet"));
    assert!(!tmp.path().join("data").join("virality_plot.png").exists());
}

#[test]
fn test_add_rejects_blank_text() {
    let (_tmp, config_path) = setup_test_env(r#"provider = "disabled""#);
    let (_, stderr, ok) = run_memetrend(&config_path, &["add", "--text", "  ", "--desc", "d"]);
    assert!(!ok);
    assert!(stderr.contains("must not be empty"));
}

#[test]
fn test_ask_with_no_memes() {
    let (_tmp, config_path) = setup_test_env(r#"provider = "disabled""#);
    let (_, stderr, ok) = run_memetrend(&config_path, &["ask"]);
    assert!(!ok);
    assert!(stderr.contains("No memes yet"));
}

#[test]
fn test_index_build_and_status() {
    let (_tmp, config_path) = setup_test_env(r#"provider = "disabled""#);
    add_sample_memes(&config_path);

    let (stdout, _, ok) = run_memetrend(&config_path, &["index", "status"]);
    assert!(ok);
    assert!(stdout.contains("Index not built"));

    let (stdout, stderr, ok) = run_memetrend(&config_path, &["index", "build"]);
    assert!(ok, "index build failed: {}", stderr);
    assert!(stdout.contains("5 units"));

    let (stdout, _, ok) = run_memetrend(&config_path, &["index", "status"]);
    assert!(ok);
    assert!(stdout.contains("Index is current"));

    run_memetrend(&config_path, &["add", "--text", "RAG all the things", "--desc", "Robot librarian"]);
    let (stdout, _, ok) = run_memetrend(&config_path, &["index", "status"]);
    assert!(ok);
    assert!(stdout.contains("Index is stale"));
}

#[test]
fn test_ask_with_generation_disabled_reports_error() {
    let (_tmp, config_path) = setup_test_env(r#"provider = "disabled""#);
    add_sample_memes(&config_path);

    let (_, stderr, ok) = run_memetrend(&config_path, &["ask", "What is hot?"]);
    assert!(!ok);
    assert!(stderr.contains("Error generating insights"));
}

#[test]
fn test_ask_blank_query_is_rejected_before_indexing() {
    let (tmp, config_path) = setup_test_env(r#"provider = "disabled""#);
    add_sample_memes(&config_path);

    let (_, stderr, ok) = run_memetrend(&config_path, &["ask", "   "]);
    assert!(!ok);
    assert!(stderr.contains("query must not be empty"));
    assert!(!tmp.path().join("data").join("meme_index").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_ask_against_openai_compatible_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("Predict next big data tool from memes?"))
        .and(body_string_contains("Pandas is slow #DataScience | Desc: Sad panda cartoon"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "1) Pandas pain (60.0)\n2) Polars will rise\n3) Counter-meme: panda on a rocket"
                }
            }]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let generation = format!(
        "provider = \"openai\"\nmodel = \"gpt-4o-mini\"\nbase_url = \"{}\"\ntimeout_secs = 10",
        server.uri()
    );
    let (_tmp, config_path) = setup_test_env(&generation);
    add_sample_memes(&config_path);

    let env = [("OPENAI_API_KEY", "sk-test")];
    let (stdout, stderr, ok) = run_memetrend_with_env(&config_path, &["ask"], &env);
    assert!(ok, "ask failed: {}", stderr);
    assert!(stdout.contains("Polars will rise"));
    assert!(stdout.contains("Sources:"));
    assert!(stdout.contains("[meme:0]"));
    assert!(stderr.contains("Index rebuilt"));

    // second run reuses the persisted index
    let (stdout, stderr, ok) = run_memetrend_with_env(&config_path, &["ask", "--json"], &env);
    assert!(ok, "ask failed: {}", stderr);
    assert!(!stderr.contains("Index rebuilt"));
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["query"], "Predict next big data tool from memes?");
    assert_eq!(report["sources"].as_array().unwrap().len(), 5);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_ask_surfaces_upstream_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limit exceeded"))
        .expect(1)
        .mount(&server)
        .await;

    let generation = format!("provider = \"openai\"\nbase_url = \"{}\"", server.uri());
    let (_tmp, config_path) = setup_test_env(&generation);
    add_sample_memes(&config_path);

    let (_, stderr, ok) =
        run_memetrend_with_env(&config_path, &["ask", "What next?"], &[("OPENAI_API_KEY", "sk-test")]);
    assert!(!ok);
    assert!(stderr.contains("Error generating insights"));
    assert!(stderr.contains("rate limit exceeded"));
}
