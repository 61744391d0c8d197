//! Integration tests for kiosk-cache

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const CATALOGUE: &str = r#"{
        "categories": [
            {
                "id": "mugs",
                "name": "Căni Personalizate",
                "slug": "mugs",
                "subcategories": [{ "id": "mugs-nunta", "name": "Nuntă", "slug": "nunta" }]
            },
            { "id": "ceasuri", "name": "Ceasuri", "slug": "ceasuri" }
        ],
        "designs": [
            {
                "id": "mugs-nunta-inimi-jpg",
                "categoryId": "mugs",
                "subcategoryId": "mugs-nunta",
                "name": "Inimi",
                "image": "/assets/mugs/nunta/inimi.jpg",
                "price": 45
            }
        ]
    }"#;

    /// Isolated config file and state directory
    struct Sandbox {
        dir: TempDir,
    }

    impl Sandbox {
        fn new() -> Self {
            Self {
                dir: TempDir::new().unwrap(),
            }
        }

        /// Write a config pointing at an origin nothing listens on
        fn with_config(self, extra: &str) -> Self {
            let config = format!(
                "[site]\norigin = \"http://127.0.0.1:9\"\n\n[fetch]\ntimeout_secs = 2\n{}",
                extra
            );
            std::fs::write(self.config_path(), config).unwrap();
            self
        }

        fn with_catalogue(self) -> Self {
            let path = self.dir.path().join("catalogue.json");
            std::fs::write(&path, CATALOGUE).unwrap();
            let extra = format!("\n[catalogue]\npath = {:?}\n", path.display().to_string());
            self.with_config(&extra)
        }

        fn config_path(&self) -> PathBuf {
            self.dir.path().join("config.toml")
        }

        fn state_dir(&self) -> PathBuf {
            self.dir.path().join("state")
        }

        fn path(&self) -> &Path {
            self.dir.path()
        }

        fn cmd(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("kiosk-cache");
            cmd.env("KIOSK_CACHE_PLAIN", "1")
                .arg("--config")
                .arg(self.config_path())
                .arg("--state-dir")
                .arg(self.state_dir());
            cmd
        }
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("kiosk-cache")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Usage: kiosk-cache"))
            .stdout(predicate::str::contains("catalogue"))
            .stdout(predicate::str::contains("watch"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("kiosk-cache")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("kiosk-cache"));
    }

    #[test]
    fn config_path_follows_flag() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                sandbox.config_path().display().to_string(),
            ));
    }

    #[test]
    fn config_show_defaults() {
        Sandbox::new()
            .cmd()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[site]"))
            .stdout(predicate::str::contains("logotip"));
    }

    #[test]
    fn config_init_writes_once() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration initialized"));
        assert!(sandbox.config_path().exists());

        sandbox
            .cmd()
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--force"));
    }

    #[test]
    fn invalid_config_is_reported() {
        let sandbox = Sandbox::new();
        std::fs::write(sandbox.config_path(), "[cache\nversion =").unwrap();

        sandbox
            .cmd()
            .arg("status")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn catalogue_routes() {
        Sandbox::new()
            .with_catalogue()
            .cmd()
            .args(["catalogue", "routes"])
            .assert()
            .success()
            .stdout(predicate::str::diff("/\n/mugs\n/mugs/nunta\n/ceasuri\n"));
    }

    #[test]
    fn catalogue_design_details() {
        Sandbox::new()
            .with_catalogue()
            .cmd()
            .args(["catalogue", "design", "mugs-nunta-inimi-jpg"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Inimi"))
            .stdout(predicate::str::contains("45 lei"));
    }

    #[test]
    fn catalogue_unknown_category() {
        Sandbox::new()
            .with_catalogue()
            .cmd()
            .args(["catalogue", "designs", "pahare"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Category not found: pahare"))
            .stderr(predicate::str::contains("catalogue categories"));
    }

    #[test]
    fn catalogue_requires_path() {
        Sandbox::new()
            .with_config("")
            .cmd()
            .args(["catalogue", "categories"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No catalogue configured"));
    }

    #[test]
    fn status_without_install() {
        Sandbox::new()
            .with_config("")
            .cmd()
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("No worker installed"));
    }

    #[test]
    fn cache_list_empty() {
        Sandbox::new()
            .cmd()
            .args(["cache", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No cache buckets found"));
    }

    #[test]
    fn cache_entries_unknown_bucket() {
        Sandbox::new()
            .cmd()
            .args(["cache", "entries", "logotip-static-v9"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Cache bucket not found"));
    }

    #[test]
    fn warm_requires_install() {
        Sandbox::new()
            .with_config("")
            .cmd()
            .arg("warm")
            .assert()
            .failure()
            .stderr(predicate::str::contains("No active worker"))
            .stderr(predicate::str::contains("kiosk-cache install"));
    }

    #[test]
    fn offline_fetch_without_worker_fails() {
        Sandbox::new()
            .with_config("")
            .cmd()
            .args(["fetch", "/mugs", "--navigate", "--offline"])
            .assert()
            .failure()
            .stdout(predicate::str::contains("No active worker"))
            .stderr(predicate::str::contains("network unreachable"));
    }

    #[test]
    fn install_with_unreachable_origin_then_serve_offline() {
        let sandbox = Sandbox::new().with_config("");

        // Every item fails, but the buckets open, so the version activates
        sandbox
            .cmd()
            .arg("install")
            .assert()
            .success()
            .stdout(predicate::str::contains("with failures"))
            .stdout(predicate::str::contains("Activated v1"));

        let record = std::fs::read_to_string(sandbox.state_dir().join("worker.json")).unwrap();
        assert!(record.contains("\"activated\""));

        sandbox
            .cmd()
            .args(["fetch", "/mugs", "--navigate", "--offline"])
            .assert()
            .success()
            .stdout(predicate::str::contains("503"))
            .stdout(predicate::str::contains("offline fallback"));

        sandbox
            .cmd()
            .args(["cache", "list", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("logotip-static-v1"))
            .stdout(predicate::str::contains("logotip-dynamic-v1"));

        // Second install of the same version is a no-op
        sandbox
            .cmd()
            .arg("install")
            .assert()
            .success()
            .stdout(predicate::str::contains("already active"));

        sandbox
            .cmd()
            .args(["cache", "clear", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Cleared 2 bucket(s)"));

        sandbox
            .cmd()
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("No worker installed"));

        let activity =
            std::fs::read_to_string(sandbox.state_dir().join("activity.log")).unwrap();
        assert!(activity.contains("worker.installed"));
        assert!(activity.contains("worker.activated"));
        assert!(activity.contains("cache.cleared"));
        assert!(sandbox.path().join("config.toml").exists());
    }
}
