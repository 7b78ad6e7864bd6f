// tests/config.rs
use std::{env, fs};

use newsfeed::config::{NewsConfig, ENV_CONFIG_PATH};
use newsfeed::news::providers::ProviderKind;

#[test]
fn parse_toml_and_json_paths() {
    let dir = tempfile::tempdir().unwrap();

    let p_toml = dir.path().join("newsfeed.toml");
    fs::write(
        &p_toml,
        r#"
default_query = "open source"
freshness_secs = 28800
providers = ["gnews", "rss"]

[[rss.feeds]]
name = "LWN"
url = "https://lwn.net/headlines/rss"
"#,
    )
    .unwrap();
    let t = NewsConfig::load_from(&p_toml).unwrap();
    assert_eq!(t.default_query, "open source");
    assert_eq!(t.freshness_secs, 28_800);
    assert_eq!(t.provider_kinds().unwrap(), vec![ProviderKind::GNews, ProviderKind::Rss]);
    assert_eq!(t.rss.feeds.len(), 1);
    assert_eq!(t.rss.feeds[0].name, "LWN");

    let p_json = dir.path().join("newsfeed.json");
    fs::write(&p_json, r#"{"default_limit": 500, "cache_dir": ""}"#).unwrap();
    let j = NewsConfig::load_from(&p_json).unwrap();
    assert_eq!(j.default_limit, 100);
    assert_eq!(j.cache_dir, "");
    assert_eq!(j.freshness_secs, 4 * 3600);

    let p_bad = dir.path().join("broken.toml");
    fs::write(&p_bad, "freshness_secs = \"soon\"").unwrap();
    assert!(NewsConfig::load_from(&p_bad).is_err());
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // Isolate CWD so the repo's own config/ is not read.
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    env::remove_var(ENV_CONFIG_PATH);
    env::remove_var("NEWSFEED_FRESHNESS_SECS");
    env::remove_var("NEWSFEED_CACHE_DIR");
    env::remove_var("NEWSFEED_BIND");

    // 1) Nothing on disk: defaults
    let d = NewsConfig::load_default().unwrap();
    assert_eq!(d, NewsConfig::default());

    // 2) ./config/newsfeed.toml
    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(cfg_dir.join("newsfeed.toml"), r#"default_query = "space""#).unwrap();
    assert_eq!(NewsConfig::load_default().unwrap().default_query, "space");

    // 3) Env path wins
    let p_env = tmp.path().join("custom.json");
    fs::write(&p_env, r#"{"default_query": "ocean"}"#).unwrap();
    env::set_var(ENV_CONFIG_PATH, p_env.display().to_string());
    assert_eq!(NewsConfig::load_default().unwrap().default_query, "ocean");

    // 4) Env overrides on top
    env::set_var("NEWSFEED_FRESHNESS_SECS", "7200");
    env::set_var("NEWSFEED_BIND", "127.0.0.1:9999");
    let o = NewsConfig::load_default().unwrap();
    assert_eq!(o.freshness_secs, 7200);
    assert_eq!(o.bind, "127.0.0.1:9999");

    env::set_var("NEWSFEED_FRESHNESS_SECS", "later");
    assert!(NewsConfig::load_default().is_err());

    // 5) Missing env path is an error
    env::set_var(ENV_CONFIG_PATH, tmp.path().join("nope.toml").display().to_string());
    assert!(NewsConfig::load_default().is_err());

    env::remove_var(ENV_CONFIG_PATH);
    env::remove_var("NEWSFEED_FRESHNESS_SECS");
    env::remove_var("NEWSFEED_BIND");
    env::set_current_dir(&old).unwrap();
}
