// tests/rules.rs

//! Rule file management and stored frontend settings.

mod common;

use common::{TestEnv, names};
use repkg::{FrontendConfig, MemoryBackend, Privilege, RebuildResolver, RuleStore, RuleTier};

#[test]
fn test_created_rule_drives_updates() {
    let env = TestEnv::new();
    let backend = MemoryBackend::new()
        .with_package("glibc", "2.39-1")
        .with_dependencies("libfoo", "1.0-1", &["glibc"]);

    let mut store = RuleStore::new(env.dirs.clone(), &backend, Privilege::User);
    let path = store.create_rule("libfoo", &[], true).unwrap();
    assert!(path.starts_with(&env.dirs.user));
    assert_eq!(store.find_rules("glibc").unwrap().len(), 1);

    let index = RuleStore::new(env.dirs.clone(), &backend, Privilege::Root).load().unwrap();
    let mut conn = env.connect();
    let mut resolver = RebuildResolver::new(&mut conn, &backend, Privilege::Root);
    resolver.update_pkgs(&names(&["glibc"]), &index).unwrap();
    assert_eq!(resolver.list_pkgs().unwrap(), vec!["libfoo"]);

    assert!(store.remove_rule("libfoo").unwrap());
    assert!(!store.remove_rule("libfoo").unwrap());
    assert!(store.find_rules("glibc").unwrap().is_empty());
}

#[test]
fn test_rule_listing_shows_every_tier() {
    let env = TestEnv::new();
    env.write_rule(RuleTier::User, "libfoo", "libbar");
    env.write_rule(RuleTier::System, "app", "libfoo=v1 glibc");
    let backend = MemoryBackend::new();

    let mut store = RuleStore::new(env.dirs.clone(), &backend, Privilege::User);
    assert_eq!(store.list_rules(true, false).unwrap(), "app libfoo");

    let table = store.list_rules(false, true).unwrap();
    assert!(table.contains("libfoo"));
    assert!(!table.contains("app"));
}

#[test]
fn test_frontend_setting_persists() {
    let env = TestEnv::new();
    let conn = env.connect();
    assert!(FrontendConfig::stored(&conn).unwrap().is_none());

    let frontend = FrontendConfig::new(names(&["paru", "-S", "--rebuild"]), true).unwrap();
    assert!(frontend.save(&conn, Privilege::User).is_err());
    frontend.save(&conn, Privilege::Root).unwrap();

    let reopened = env.connect();
    assert_eq!(FrontendConfig::load(&reopened).unwrap(), frontend);

    assert!(FrontendConfig::reset(&reopened, Privilege::Root).unwrap());
    assert!(FrontendConfig::stored(&reopened).unwrap().is_none());
}
