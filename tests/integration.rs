use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn ccd_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("ccd");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let data_dir = root.join("data");
    fs::create_dir_all(&data_dir).unwrap();

    // Create corpus files
    let corpus_dir = root.join("corpus");
    fs::create_dir_all(&corpus_dir).unwrap();
    fs::write(
        corpus_dir.join("alpha.txt"),
        "The quick brown fox jumps over the lazy dog.\n\nThe fox returns to the den.\n",
    )
    .unwrap();
    fs::write(
        corpus_dir.join("beta.md"),
        "# Badgers\n\nThe badger digs. A fox watches the badger.\n",
    )
    .unwrap();
    fs::write(
        corpus_dir.join("gamma.txt"),
        "Nothing about animals here, just deployment notes.\n",
    )
    .unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/ccd.sqlite"

[import]
root = "{}/corpus"
include_globs = ["**/*.txt", "**/*.md"]
exclude_globs = []
follow_symlinks = false

[concordance]
context_window = 50
"#,
        root.display(),
        root.display()
    );

    let config_path = config_dir.join("ccd.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_ccd(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = ccd_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run ccd binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

/// First document id from `ccd list` output (header line skipped).
fn first_doc_id(config_path: &Path) -> String {
    let (stdout, _, success) = run_ccd(config_path, &["list"]);
    assert!(success, "list failed: {}", stdout);
    stdout
        .lines()
        .nth(1)
        .and_then(|line| line.split_whitespace().next())
        .expect("no documents listed")
        .to_string()
}

#[test]
fn test_init_creates_database() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_ccd(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_ccd(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_ccd(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_import_counts() {
    let (_tmp, config_path) = setup_test_env();

    run_ccd(&config_path, &["init"]);
    let (stdout, stderr, success) = run_ccd(&config_path, &["import"]);
    assert!(
        success,
        "import failed: stdout={}, stderr={}",
        stdout, stderr
    );
    assert!(stdout.contains("files matched: 3"));
    assert!(stdout.contains("imported: 3"));
    assert!(stdout.contains("ok"));
}

#[test]
fn test_reimport_skips_unchanged() {
    let (_tmp, config_path) = setup_test_env();

    run_ccd(&config_path, &["init"]);
    run_ccd(&config_path, &["import"]);
    let (stdout, _, success) = run_ccd(&config_path, &["import"]);
    assert!(success);
    assert!(stdout.contains("imported: 0"));
    assert!(stdout.contains("unchanged: 3"));
}

#[test]
fn test_import_dry_run_writes_nothing() {
    let (_tmp, config_path) = setup_test_env();

    run_ccd(&config_path, &["init"]);
    let (stdout, _, success) = run_ccd(&config_path, &["import", "--dry-run"]);
    assert!(success);
    assert!(stdout.contains("(dry-run)"));

    let (stdout, _, _) = run_ccd(&config_path, &["list"]);
    assert!(stdout.contains("No documents."));
}

#[test]
fn test_list_and_get_document() {
    let (_tmp, config_path) = setup_test_env();

    run_ccd(&config_path, &["init"]);
    run_ccd(&config_path, &["import"]);

    let (stdout, _, success) = run_ccd(&config_path, &["list"]);
    assert!(success);
    assert!(stdout.contains("alpha.txt"));
    assert!(stdout.contains("beta.md"));

    let id = first_doc_id(&config_path);
    let (stdout, _, success) = run_ccd(&config_path, &["get", &id]);
    assert!(success, "get failed: {}", stdout);
    assert!(stdout.contains("--- Body ---"));
    // alpha.txt sorts first
    assert!(stdout.contains("quick brown fox"));
}

#[test]
fn test_get_missing_document_fails() {
    let (_tmp, config_path) = setup_test_env();

    run_ccd(&config_path, &["init"]);
    let (_, stderr, success) = run_ccd(&config_path, &["get", "no-such-id"]);
    assert!(!success);
    assert!(stderr.contains("not found"));
}

#[test]
fn test_rm_document() {
    let (_tmp, config_path) = setup_test_env();

    run_ccd(&config_path, &["init"]);
    run_ccd(&config_path, &["import"]);
    let id = first_doc_id(&config_path);

    let (_, _, success) = run_ccd(&config_path, &["rm", &id]);
    assert!(success);

    let (stdout, _, _) = run_ccd(&config_path, &["list"]);
    assert!(!stdout.contains(&id));
}

#[test]
fn test_categories() {
    let (_tmp, config_path) = setup_test_env();

    run_ccd(&config_path, &["init"]);
    run_ccd(&config_path, &["import"]);

    let (_, _, success) = run_ccd(&config_path, &["category", "add", "fables"]);
    assert!(success);

    // Duplicate category rejected
    let (_, _, success) = run_ccd(&config_path, &["category", "add", "fables"]);
    assert!(!success);

    let id = first_doc_id(&config_path);
    let (_, _, success) = run_ccd(&config_path, &["category", "assign", &id, "fables"]);
    assert!(success);

    let (stdout, _, _) = run_ccd(&config_path, &["category", "list"]);
    assert!(stdout.contains("fables"));
    assert!(stdout.contains('1'));

    let (stdout, _, success) = run_ccd(&config_path, &["list", "--category", "fables"]);
    assert!(success);
    assert!(stdout.contains(&id));
}

#[test]
fn test_import_into_category() {
    let (_tmp, config_path) = setup_test_env();

    run_ccd(&config_path, &["init"]);
    run_ccd(&config_path, &["category", "add", "corpus"]);
    let (stdout, stderr, success) = run_ccd(&config_path, &["import", "--category", "corpus"]);
    assert!(success, "stdout={}, stderr={}", stdout, stderr);

    let (stdout, _, _) = run_ccd(&config_path, &["list", "--category", "corpus"]);
    assert!(stdout.contains("alpha.txt"));
    assert!(stdout.contains("gamma.txt"));
}

#[test]
fn test_import_missing_category_fails() {
    let (_tmp, config_path) = setup_test_env();

    run_ccd(&config_path, &["init"]);
    let (_, stderr, success) = run_ccd(&config_path, &["import", "--category", "nope"]);
    assert!(!success);
    assert!(stderr.contains("category not found"));
}

#[test]
fn test_search_finds_documents() {
    let (_tmp, config_path) = setup_test_env();

    run_ccd(&config_path, &["init"]);
    run_ccd(&config_path, &["import"]);

    let (stdout, _, success) = run_ccd(&config_path, &["search", "fox"]);
    assert!(success);
    assert!(stdout.contains("alpha.txt"));
    assert!(stdout.contains("beta.md"));
    assert!(!stdout.contains("gamma.txt"));

    let (stdout, _, success) = run_ccd(&config_path, &["search", "zeppelin"]);
    assert!(success);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_concordance_generate_and_show() {
    let (_tmp, config_path) = setup_test_env();

    run_ccd(&config_path, &["init"]);
    run_ccd(&config_path, &["import"]);

    let (stdout, stderr, success) = run_ccd(
        &config_path,
        &[
            "concordance",
            "generate",
            "animals",
            "--keyword",
            "fox",
            "--keyword",
            "badger",
        ],
    );
    assert!(
        success,
        "generate failed: stdout={}, stderr={}",
        stdout, stderr
    );
    // fox x3 (2 in alpha, 1 in beta), badger x2
    assert!(stdout.contains("entries: 5"));
    assert!(stdout.contains("fox: 3"));
    assert!(stdout.contains("badger: 2"));

    let (stdout, _, success) = run_ccd(&config_path, &["concordance", "show", "animals"]);
    assert!(success);
    assert!(stdout.contains("animals"));
    assert!(stdout.contains("fox"));

    let (stdout, _, _) = run_ccd(&config_path, &["concordance", "list"]);
    assert!(stdout.contains("animals"));

    // Duplicate name rejected
    let (_, stderr, success) = run_ccd(
        &config_path,
        &["concordance", "generate", "animals", "--keyword", "fox"],
    );
    assert!(!success);
    assert!(stderr.contains("already exists"));
}

#[test]
fn test_concordance_context_windows() {
    let (_tmp, config_path) = setup_test_env();

    run_ccd(&config_path, &["init"]);
    run_ccd(&config_path, &["import"]);

    run_ccd(
        &config_path,
        &[
            "concordance",
            "generate",
            "windows",
            "--keyword",
            "fox",
            "--window",
            "10",
        ],
    );

    let tmp_out = std::env::temp_dir().join(format!("ccd-test-{}.csv", std::process::id()));
    let (_, _, success) = run_ccd(
        &config_path,
        &[
            "concordance",
            "export",
            "windows",
            "--format",
            "csv",
            "--output",
            tmp_out.to_str().unwrap(),
        ],
    );
    assert!(success);
    let csv = fs::read_to_string(&tmp_out).unwrap();
    fs::remove_file(&tmp_out).ok();
    // "The quick brown fox jumps over..." with window 10 trims to word bounds
    assert!(csv.contains("brown"));
    assert!(csv.contains("jumps"));
}

#[test]
fn test_concordance_export_csv() {
    let (tmp, config_path) = setup_test_env();

    run_ccd(&config_path, &["init"]);
    run_ccd(&config_path, &["import"]);
    run_ccd(
        &config_path,
        &["concordance", "generate", "animals", "--keyword", "badger"],
    );

    let out = tmp.path().join("out/animals.csv");
    let (_, _, success) = run_ccd(
        &config_path,
        &[
            "concordance",
            "export",
            "animals",
            "--format",
            "csv",
            "--output",
            out.to_str().unwrap(),
        ],
    );
    assert!(success);

    let csv = fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert!(lines[0].starts_with("keyword,"));
    assert_eq!(lines.len(), 3); // header + 2 badger entries
}

#[test]
fn test_concordance_json_round_trip() {
    let (tmp, config_path) = setup_test_env();

    run_ccd(&config_path, &["init"]);
    run_ccd(&config_path, &["import"]);
    run_ccd(
        &config_path,
        &[
            "concordance",
            "generate",
            "animals",
            "--keyword",
            "fox",
            "--keyword",
            "badger",
        ],
    );

    let out = tmp.path().join("animals.json");
    let (_, _, success) = run_ccd(
        &config_path,
        &[
            "concordance",
            "export",
            "animals",
            "--format",
            "json",
            "--output",
            out.to_str().unwrap(),
        ],
    );
    assert!(success);

    // Remove the original, then restore from the export
    let (_, _, success) = run_ccd(&config_path, &["concordance", "rm", "animals"]);
    assert!(success);

    let (stdout, stderr, success) = run_ccd(
        &config_path,
        &["concordance", "import", out.to_str().unwrap()],
    );
    assert!(
        success,
        "import failed: stdout={}, stderr={}",
        stdout, stderr
    );
    assert!(stdout.contains("5 entries"));
    assert!(stdout.contains("2 keywords"));

    let (stdout, _, _) = run_ccd(&config_path, &["concordance", "list"]);
    assert!(stdout.contains("animals"));
}

#[test]
fn test_concordance_rm_missing_fails() {
    let (_tmp, config_path) = setup_test_env();

    run_ccd(&config_path, &["init"]);
    let (_, stderr, success) = run_ccd(&config_path, &["concordance", "rm", "nope"]);
    assert!(!success);
    assert!(stderr.contains("not found"));
}

#[test]
fn test_concordance_tags() {
    let (_tmp, config_path) = setup_test_env();

    run_ccd(&config_path, &["init"]);
    run_ccd(&config_path, &["import"]);
    run_ccd(
        &config_path,
        &[
            "concordance",
            "generate",
            "animals",
            "--keyword",
            "fox",
            "--tag",
            "draft",
        ],
    );

    let (stdout, _, success) = run_ccd(
        &config_path,
        &[
            "concordance",
            "tag",
            "animals",
            "--add",
            "reviewed",
            "--remove",
            "draft",
        ],
    );
    assert!(success);
    assert!(stdout.contains("reviewed"));
    assert!(!stdout.contains("draft"));
}

#[test]
fn test_stats() {
    let (_tmp, config_path) = setup_test_env();

    run_ccd(&config_path, &["init"]);
    run_ccd(&config_path, &["import"]);

    let (stdout, _, success) = run_ccd(&config_path, &["stats"]);
    assert!(success);
    assert!(stdout.contains("Documents:    3"));
}
