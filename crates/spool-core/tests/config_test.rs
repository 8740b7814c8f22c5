use std::time::Duration;

use secrecy::ExposeSecret;
use spool_core::{QueueConfig, StoreConfig};

const VARS: &[&str] = &[
    "SPOOL_QUEUE",
    "SPOOL_MAX_RETRIES",
    "SPOOL_WAIT_MS",
    "SPOOL_SINGLE_CONSUMER",
    "SPOOL_KEY_PREFIX",
    "SPOOL_REDIS_HOST",
    "SPOOL_REDIS_PORT",
    "SPOOL_REDIS_AUTH",
    "SPOOL_REDIS_DB",
];

fn clear_env() {
    for var in VARS {
        unsafe { std::env::remove_var(var) };
    }
}

// One test function: the process environment is shared across test threads.
#[test]
fn config_from_env() {
    clear_env();
    assert!(QueueConfig::from_env().is_err());
    assert!(StoreConfig::from_env().is_err());

    unsafe {
        std::env::set_var("SPOOL_QUEUE", "orders");
        std::env::set_var("SPOOL_REDIS_HOST", "127.0.0.1");
    }
    let queue = QueueConfig::from_env().unwrap();
    assert_eq!(queue.name, "orders");
    assert_eq!(queue.max_retries, QueueConfig::DEFAULT_MAX_RETRIES);
    assert!(queue.concurrent_consumers);

    let store = StoreConfig::from_env().unwrap();
    assert_eq!(store.host, "127.0.0.1");
    assert_eq!(store.port, 6379);
    assert!(store.auth.is_none());
    assert_eq!(store.database, None);

    unsafe {
        std::env::set_var("SPOOL_MAX_RETRIES", "5");
        std::env::set_var("SPOOL_WAIT_MS", "250");
        std::env::set_var("SPOOL_SINGLE_CONSUMER", "true");
        std::env::set_var("SPOOL_KEY_PREFIX", "APP");
        std::env::set_var("SPOOL_REDIS_PORT", "6380");
        std::env::set_var("SPOOL_REDIS_AUTH", "s3cret");
        std::env::set_var("SPOOL_REDIS_DB", "2");
    }
    let queue = QueueConfig::from_env().unwrap();
    assert_eq!(queue.max_retries, 5);
    assert_eq!(queue.wait, Duration::from_millis(250));
    assert!(!queue.concurrent_consumers);
    assert_eq!(queue.key_prefix, "APP");

    let store = StoreConfig::from_env().unwrap();
    assert_eq!(store.port, 6380);
    assert_eq!(store.auth.as_ref().map(|s| s.expose_secret()), Some("s3cret"));
    assert_eq!(store.database, Some(2));

    unsafe { std::env::set_var("SPOOL_MAX_RETRIES", "many") };
    assert!(QueueConfig::from_env().is_err());

    clear_env();
}
