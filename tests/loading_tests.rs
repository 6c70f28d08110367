//! Key file and proxy file loading through the public API

use std::io::Write;
use zero_bot::proxy::ProxyPool;
use zero_bot::wallet::load_accounts;
use zero_bot::BotError;

const KEY_1: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const KEY_2: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

#[test]
fn test_two_valid_keys_and_one_malformed_line() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "{}", KEY_1).unwrap();
    writeln!(file, "0xdeadbeef").unwrap();
    writeln!(file).unwrap();
    writeln!(file, "{}", KEY_2).unwrap();

    let accounts = load_accounts(file.path()).unwrap();
    assert_eq!(accounts.len(), 2);
    assert_ne!(accounts[0].address(), accounts[1].address());
}

#[test]
fn test_missing_key_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_accounts(dir.path().join("wallet.txt")).unwrap_err();
    assert!(matches!(err, BotError::Configuration(_)));
    assert!(err.is_fatal());
}

#[test]
fn test_absent_proxy_file_uses_direct_connections() {
    let dir = tempfile::tempdir().unwrap();
    let pool = ProxyPool::load(dir.path().join("proxies.txt"));

    assert!(pool.is_empty());
    assert!(pool.next_proxy().is_none());
    assert!(pool.http_client().is_ok());
}

#[test]
fn test_proxy_file_rotates_in_order() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "# residential").unwrap();
    writeln!(file, "http://10.0.0.1:8080").unwrap();
    writeln!(file, "http://user:pw@10.0.0.2:8080").unwrap();

    let pool = ProxyPool::load(file.path());
    assert_eq!(pool.len(), 2);
    assert_eq!(pool.next_proxy(), Some("http://10.0.0.1:8080"));
    assert_eq!(pool.next_proxy(), Some("http://user:pw@10.0.0.2:8080"));
    assert_eq!(pool.next_proxy(), Some("http://10.0.0.1:8080"));
}
