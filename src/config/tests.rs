use std::fs;

use pretty_assertions::assert_eq;
use rstest::rstest;
use tempfile::tempdir;

use super::*;

fn no_env() -> Environment {
    env(&[])
}

fn env(vars: &[(&str, &str)]) -> Environment {
    let vars = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    environment().source(Some(vars))
}

#[test]
fn defaults_without_sources() {
    let dir = tempdir().unwrap();
    let config = Config::load_with(dir.path(), no_env()).unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.network.base_url, "http://localhost:3001");
    assert_eq!(config.network.delay_ms, 500);
    assert_eq!(config.network.error_rate, 0.1);
    assert_eq!(config.network.timeout_ms, None);
    assert_eq!(config.cache.retention(), Duration::from_secs(60));
    assert!(config.fixtures.seed_store);
}

#[test]
fn file_overrides_defaults() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        r#"
[network]
delay_ms = 20
error_rate = 0.0
timeout_ms = 250

[fixtures]
seed = 7
"#,
    )
    .unwrap();

    let config = Config::load_with(dir.path(), no_env()).unwrap();
    assert_eq!(config.network.delay_ms, 20);
    assert_eq!(config.network.user_delay_ms, 1000);
    assert_eq!(config.network.error_rate, 0.0);
    assert_eq!(config.network.timeout(), Some(Duration::from_millis(250)));
    assert_eq!(config.fixtures.seed, Some(7));
}

#[test]
fn environment_overrides_file() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        "[network]\ndelay_ms = 20\n",
    )
    .unwrap();

    let config = Config::load_with(
        dir.path(),
        env(&[
            ("MOCKFETCH_NETWORK__DELAY_MS", "0"),
            ("MOCKFETCH_NETWORK__FALLBACK", "false"),
            ("MOCKFETCH_CACHE__RETENTION_SECS", "5"),
        ]),
    )
    .unwrap();
    assert_eq!(config.network.delay_ms, 0);
    assert!(!config.network.fallback);
    assert_eq!(config.cache.retention_secs, 5);
}

#[rstest]
#[case("[network]\nerror_rate = 1.5\n")]
#[case("[network]\nerror_rate = -0.1\n")]
#[case("[network]\nbase_url = \"ftp://localhost\"\n")]
fn invalid_values_are_rejected(#[case] content: &str) {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(CONFIG_FILE_NAME), content).unwrap();
    assert!(Config::load_with(dir.path(), no_env()).is_err());
}

#[test]
fn delays_per_endpoint() {
    let network = NetworkConfig::default();
    assert_eq!(network.delay_for(Endpoint::Users), Duration::from_millis(500));
    assert_eq!(network.delay_for(Endpoint::User), Duration::from_millis(1000));
    assert_eq!(network.delay_for(Endpoint::UserPosts), Duration::from_millis(800));

    let network = network.with_delay(3);
    assert_eq!(network.delay_for(Endpoint::User), Duration::from_millis(3));
    assert_eq!(network.delay_for(Endpoint::Posts), Duration::from_millis(3));
}

#[test]
fn immediate_has_no_latency_or_failures() {
    let network = NetworkConfig::immediate();
    assert_eq!(network.error_rate, 0.0);
    assert_eq!(network.delay_for(Endpoint::User), Duration::ZERO);
    assert!(network.fallback);
}
