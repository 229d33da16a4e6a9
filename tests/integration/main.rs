//! Integration tests for ghload

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    /// Binary pointed at an isolated, possibly absent config file
    fn ghload(temp: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("ghload");
        cmd.env("GHLOAD_CONFIG", temp.path().join("config.toml"));
        cmd
    }

    #[test]
    fn help_displays() {
        let temp = TempDir::new().unwrap();
        ghload(&temp)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Stale-while-revalidate"));
    }

    #[test]
    fn version_displays() {
        let temp = TempDir::new().unwrap();
        ghload(&temp)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("ghload"));
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();
        ghload(&temp)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_defaults() {
        let temp = TempDir::new().unwrap();
        ghload(&temp)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[endpoints]"))
            .stdout(predicate::str::contains("main.js"));
    }

    #[test]
    fn config_init_writes_file() {
        let temp = TempDir::new().unwrap();
        ghload(&temp).args(["config", "init"]).assert().success();
        assert!(temp.path().join("config.toml").exists());

        ghload(&temp)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already exists"));
    }

    #[test]
    fn run_without_source_fails_before_network() {
        let temp = TempDir::new().unwrap();
        ghload(&temp)
            .args(["run", "--cache-dir"])
            .arg(temp.path().join("cache"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("owner is missing"))
            .stderr(predicate::str::contains("Hint:"));

        assert!(!temp.path().join("cache").exists());
    }

    #[test]
    fn run_rejects_target_without_repo() {
        let temp = TempDir::new().unwrap();
        ghload(&temp)
            .args(["run", "acme"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("repo is missing"));
    }

    #[test]
    fn status_on_empty_cache() {
        let temp = TempDir::new().unwrap();
        ghload(&temp)
            .args(["status", "acme/widget", "--cache-dir"])
            .arg(temp.path().join("cache"))
            .assert()
            .success()
            .stdout(predicate::str::contains("acme/widget/main.js@main"))
            .stdout(predicate::str::contains("not cached"));
    }

    #[test]
    fn status_json_uses_config_source() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("config.toml"),
            "[source]\nowner = \"acme\"\nrepo = \"widget\"\nfile = \"dist/app.js\"\n",
        )
        .unwrap();

        ghload(&temp)
            .args(["status", "--format", "json", "--cache-dir"])
            .arg(temp.path().join("cache"))
            .assert()
            .success()
            .stdout(predicate::str::contains("\"file\": \"dist/app.js\""))
            .stdout(predicate::str::contains("\"cached\": false"));
    }

    #[test]
    fn invalid_config_file_is_reported() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("config.toml"), "[source\n").unwrap();

        ghload(&temp)
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }
}

#[cfg(unix)]
mod load_cycle_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use ghload::resolver::VersionTag;
    use ghload::source::RawSource;
    use ghload::store::{write_entry, CacheKeys, CacheStore, CachedEntry, FileStore};
    use ghload::SourceIdentity;
    use predicates::prelude::*;
    use std::path::Path;
    use tempfile::TempDir;

    /// Binary whose endpoints point at a closed local port, so every
    /// network call fails fast
    fn offline_ghload(temp: &TempDir) -> Command {
        let config = temp.path().join("config.toml");
        std::fs::write(
            &config,
            "[endpoints]\napi_base = \"http://127.0.0.1:9\"\ncdn_base = \"http://127.0.0.1:9\"\n\n[http]\ntimeout_secs = 2\n",
        )
        .unwrap();

        let mut cmd = cargo_bin_cmd!("ghload");
        cmd.env("GHLOAD_CONFIG", config);
        cmd
    }

    fn identity() -> SourceIdentity {
        SourceIdentity::resolve(RawSource {
            owner: Some("acme".to_string()),
            repo: Some("widget".to_string()),
            file: Some("run.sh".to_string()),
            branch: None,
        })
        .unwrap()
    }

    fn seed(dir: &Path, code: &str, version: &str) {
        let store = FileStore::open(dir).unwrap();
        let entry = CachedEntry {
            code: code.to_string(),
            version: VersionTag::new(version),
        };
        write_entry(&store, &CacheKeys::for_source(&identity()), &entry).unwrap();
    }

    #[test]
    fn cached_script_runs_while_offline() {
        let temp = TempDir::new().unwrap();
        let cache = temp.path().join("cache");
        seed(&cache, "echo cached-run", "abc123");

        offline_ghload(&temp)
            .args(["run", "acme/widget", "--file", "run.sh", "--interpreter", "sh", "--cache-dir"])
            .arg(&cache)
            .assert()
            .success()
            .stdout(predicate::str::contains("cached-run"));

        // Failed revalidation leaves the pair untouched
        let store = FileStore::open(&cache).unwrap();
        let keys = CacheKeys::for_source(&identity());
        assert_eq!(store.get(&keys.version).as_deref(), Some("abc123"));
        assert_eq!(store.get(&keys.code).as_deref(), Some("echo cached-run"));
    }

    #[test]
    fn empty_cache_offline_fails_without_running() {
        let temp = TempDir::new().unwrap();
        let cache = temp.path().join("cache");

        offline_ghload(&temp)
            .args(["run", "acme/widget", "--file", "run.sh", "--interpreter", "sh", "--cache-dir"])
            .arg(&cache)
            .assert()
            .failure()
            .stderr(predicate::str::contains("No cached copy"));

        offline_ghload(&temp)
            .args(["status", "acme/widget", "--file", "run.sh", "--cache-dir"])
            .arg(&cache)
            .assert()
            .success()
            .stdout(predicate::str::contains("not cached"));
    }

    #[test]
    fn status_reports_cached_version() {
        let temp = TempDir::new().unwrap();
        let cache = temp.path().join("cache");
        seed(&cache, "echo hi", "def456");

        offline_ghload(&temp)
            .args(["status", "acme/widget", "--file", "run.sh", "--cache-dir"])
            .arg(&cache)
            .assert()
            .success()
            .stdout(predicate::str::contains("def456"))
            .stdout(predicate::str::contains("7 bytes"));
    }
}
