//! Integration tests for Viento

use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write a config that keeps the cache inside `dir` and retries quickly
fn write_config(dir: &Path, base_url: &str) -> PathBuf {
    let cache = dir.join("response_cache.json");
    let config = format!(
        r#"
[cache]
path = "{}"

[lock]
retry_unit_ms = 5
wait_budget = 4

[upstream]
base_url = "{}"
api_key = "test-key"
timeout_secs = 5
"#,
        cache.display().to_string().replace('\\', "\\\\"),
        base_url
    );
    let path = dir.join("config.toml");
    std::fs::write(&path, config).unwrap();
    path
}

/// Answer exactly one HTTP request with `body`, then stop listening
fn serve_once(body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = [0u8; 4096];
        let _ = stream.read(&mut buf);
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).unwrap();
    });
    format!("http://{}", addr)
}

mod cli_tests {
    use super::*;
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use viento::lock::{LockMode, Locker};

    fn viento() -> Command {
        let mut cmd = cargo_bin_cmd!("viento");
        cmd.env_remove("WIND_API_KEY").env_remove("RUST_LOG");
        cmd
    }

    #[test]
    fn help_displays() {
        viento()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("cached weather lookups"));
    }

    #[test]
    fn version_displays() {
        viento()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("viento"));
    }

    #[test]
    fn config_path_honours_flag() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path(), "http://127.0.0.1:9");
        viento()
            .args(["config", "path", "--config"])
            .arg(&config)
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_redacts_key() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path(), "http://127.0.0.1:9");
        viento()
            .args(["config", "show"])
            .env("VIENTO_CONFIG", &config)
            .assert()
            .success()
            .stdout(predicate::str::contains("[lock]"))
            .stdout(predicate::str::contains("<redacted>"))
            .stdout(predicate::str::contains("test-key").not());
    }

    #[test]
    fn config_init_writes_defaults() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("nested").join("config.toml");
        viento()
            .args(["config", "init", "--config"])
            .arg(&config)
            .assert()
            .success();

        let written = std::fs::read_to_string(&config).unwrap();
        assert!(written.contains("ttl_secs = 600"));
    }

    #[test]
    fn cache_show_empty() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path(), "http://127.0.0.1:9");
        viento()
            .args(["cache", "show", "--config"])
            .arg(&config)
            .assert()
            .success()
            .stdout(predicate::str::contains("No cached responses"));
    }

    #[test]
    fn invalid_coordinate_fails_before_fetching() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path(), "http://127.0.0.1:9");
        viento()
            .args(["forecast", "--lat", "north", "--lon", "2", "--config"])
            .arg(&config)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid coordinate"));
    }

    #[test]
    fn unknown_lock_backend_fails() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("config.toml");
        std::fs::write(&config, "[lock]\nbackend = \"nfs\"\n").unwrap();
        viento()
            .args(["cache", "path", "--config"])
            .arg(&config)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown locker backend: nfs"));
    }

    #[test]
    fn forecast_fetches_then_serves_from_cache() {
        let temp = TempDir::new().unwrap();
        let base = serve_once(r#"{"city":"Pasadena","list":[1,2,3]}"#);
        let config = write_config(temp.path(), &base);

        viento()
            .args(["forecast", "--lat", "-34.15611", "--lon", "-118.13194", "--compact"])
            .arg("--config")
            .arg(&config)
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""city":"Pasadena""#))
            .stderr(predicate::str::contains("source: upstream"));

        // the server is gone; a nearby coordinate must come from the cache
        viento()
            .args(["forecast", "--lat", "-34.1573", "--lon", "-118.1449", "--compact"])
            .arg("--config")
            .arg(&config)
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""city":"Pasadena""#))
            .stderr(predicate::str::contains("source: cache"));

        viento()
            .args(["cache", "show", "--format", "plain", "--config"])
            .arg(&config)
            .assert()
            .success()
            .stdout(predicate::str::contains("forecast|-34.16|-118.1"));

        viento()
            .args(["cache", "show", "--format", "json", "--config"])
            .arg(&config)
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""endpoint": "forecast""#))
            .stdout(predicate::str::contains(r#""latitude": "-34.16""#))
            .stdout(predicate::str::contains(r#""longitude": "-118.1""#))
            .stdout(predicate::str::contains(r#""expired": false"#));
    }

    #[test]
    fn held_lock_blocks_another_process() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path(), "http://127.0.0.1:9");
        let cache = temp.path().join("response_cache.json");
        std::fs::write(&cache, "{}").unwrap();

        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(&cache)
            .unwrap();
        let guard = Locker::native()
            .unwrap()
            .acquire(file, LockMode::Exclusive, false)
            .unwrap();

        viento()
            .args(["cache", "clear", "--yes", "--config"])
            .arg(&config)
            .assert()
            .failure()
            .stderr(predicate::str::contains("could not be acquired"))
            .stderr(predicate::str::contains("Hint:"));

        guard.release().unwrap();

        viento()
            .args(["cache", "clear", "--yes", "--config"])
            .arg(&config)
            .assert()
            .success()
            .stdout(predicate::str::contains("Cleared 0 entries"));
    }
}

mod store_tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Barrier};
    use std::time::Duration;
    use viento::cache::{CacheKey, CacheStore};
    use viento::lock::{Locker, RetryPolicy};

    fn store(path: &Path) -> CacheStore {
        let locker = Locker::native()
            .unwrap()
            .with_policy(RetryPolicy::new(Duration::from_millis(2), 2000));
        CacheStore::new(path, locker)
    }

    #[test]
    fn concurrent_writers_lose_no_entries() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("response_cache.json");
        let writers = 8;
        let per_writer = 5;
        let barrier = Arc::new(Barrier::new(writers));

        let handles: Vec<_> = (0..writers)
            .map(|w| {
                let path = path.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    // every writer opens its own handles, like separate processes
                    let store = store(&path);
                    barrier.wait();
                    for i in 0..per_writer {
                        let key = CacheKey::derive("forecast", &w.to_string(), &i.to_string())
                            .unwrap();
                        store.put(&key, json!({ "writer": w, "i": i })).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = store(&path).snapshot().unwrap();
        assert_eq!(snapshot.len(), writers * per_writer);
        for w in 0..writers {
            for i in 0..per_writer {
                let key = CacheKey::derive("forecast", &w.to_string(), &i.to_string()).unwrap();
                let entry = snapshot.get(&key.to_string()).unwrap();
                assert_eq!(entry.data, json!({ "writer": w, "i": i }));
            }
        }
    }

    #[test]
    fn readers_never_see_a_torn_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("response_cache.json");
        let key = CacheKey::derive("forecast", "1", "2").unwrap();
        store(&path).put(&key, json!({ "n": 0 })).unwrap();

        let writer = {
            let path = path.clone();
            let key = key.clone();
            std::thread::spawn(move || {
                let store = store(&path);
                for n in 1..50 {
                    store.put(&key, json!({ "n": n, "pad": "x".repeat(n * 64) })).unwrap();
                }
            })
        };

        let reader = store(&path);
        for _ in 0..50 {
            // a torn read would parse as corrupt and surface as a miss
            assert!(reader.get(&key).unwrap().is_some());
        }
        writer.join().unwrap();
    }
}
