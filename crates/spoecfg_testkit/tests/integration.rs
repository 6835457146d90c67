//! Integration tests for the transaction engine over real files.

use proptest::prelude::*;
use spoecfg_core::{ConfError, SpoeClient, TransactionId, TransactionRef, TransactionStatus, Version};
use spoecfg_document::{ConfigDocument, DocumentError, Section, SectionKind, SpoeDocument};
use spoecfg_testkit::prelude::*;
use std::fs;

const VERSIONED: &str = "\
# _version=3
[spoe-test]
spoe-agent agent1
    messages check-client-ip
spoe-message check-client-ip
    args ip=src
";

fn staged_text(client: &SpoeClient, id: &TransactionId) -> String {
    client.manager().document(Some(id)).unwrap().to_string()
}

#[test]
fn commit_bumps_version_and_removes_transaction() {
    let config = TestConfig::sample();
    let mut client = config.client();

    let id = client.begin_transaction(Version::new(1)).unwrap();
    client
        .delete_section(
            SAMPLE_SCOPE,
            SectionKind::Group,
            "grp-ip",
            &TransactionRef::Explicit(id.clone()),
        )
        .unwrap();
    assert_eq!(client.current_version(Some(&id)).unwrap(), Version::new(1));

    assert_eq!(client.commit_transaction(&id).unwrap(), Version::new(2));
    assert_eq!(client.current_version(None).unwrap(), Version::new(2));
    assert!(config.contents().starts_with("# _version=2\n"));
    assert!(client.list_transactions().iter().all(|t| t.id != id));
    assert!(transaction_files(&config.transaction_dir()).is_empty());
    assert!(!config.contents().contains("spoe-group grp-ip"));
}

#[test]
fn second_transaction_on_committed_version_is_rejected() {
    let config = TestConfig::sample();
    let mut client = config.client();
    let first = client.begin_transaction(Version::new(1)).unwrap();
    let second = client.begin_transaction(Version::new(1)).unwrap();

    client
        .delete_section(
            SAMPLE_SCOPE,
            SectionKind::Agent,
            "iprep-agent",
            &TransactionRef::Explicit(first.clone()),
        )
        .unwrap();
    client
        .delete_section(
            SAMPLE_SCOPE,
            SectionKind::Group,
            "grp-ip",
            &TransactionRef::Explicit(second.clone()),
        )
        .unwrap();

    client.commit_transaction(&first).unwrap();
    let after_first = config.contents();

    let result = client.commit_transaction(&second);
    assert!(matches!(
        result,
        Err(ConfError::VersionMismatch {
            expected: 1,
            actual: 2
        })
    ));
    assert_eq!(config.contents(), after_first);
    assert!(config.contents().contains("spoe-group grp-ip"));
    assert!(client.has_transaction(&second));
}

#[test]
fn invalid_names_never_reach_the_file() {
    let config = TestConfig::sample();
    let before = config.contents();
    {
        let mut client = config.client();
        let result = client.create_section(
            SAMPLE_SCOPE,
            SectionKind::Agent,
            Section::new("two words"),
            &TransactionRef::implicit(1),
        );
        assert!(matches!(
            result,
            Err(ConfError::Document(DocumentError::InvalidName { .. }))
        ));
        let result = client.create_scope("[injected]", &TransactionRef::implicit(1));
        assert!(matches!(
            result,
            Err(ConfError::Document(DocumentError::InvalidName { .. }))
        ));
    }
    assert_eq!(config.contents(), before);

    let client = config.client();
    assert_eq!(client.list_scopes(None).unwrap(), vec![SAMPLE_SCOPE]);
    assert!(transaction_files(&config.transaction_dir()).is_empty());
}

#[test]
fn implicit_edit_with_stale_version_leaves_nothing() {
    let config = TestConfig::sample();
    let mut client = config.client();
    let before = config.contents();

    for stale in [0, 2, 42] {
        let result = client.delete_section(
            SAMPLE_SCOPE,
            SectionKind::Agent,
            "iprep-agent",
            &TransactionRef::implicit(stale),
        );
        assert!(matches!(result, Err(ConfError::VersionMismatch { .. })));
    }

    assert!(client.list_transactions().is_empty());
    assert!(transaction_files(&config.transaction_dir()).is_empty());
    assert_eq!(config.contents(), before);
}

#[test]
fn implicit_edit_applies_without_residue() {
    let config = TestConfig::sample();
    let mut client = config.client();

    client
        .create_section(
            SAMPLE_SCOPE,
            SectionKind::Message,
            Section::new("check-headers").with_directive("args hdrs=req.hdrs"),
            &TransactionRef::implicit(1),
        )
        .unwrap();

    assert!(client
        .list_sections(SAMPLE_SCOPE, SectionKind::Message, None)
        .unwrap()
        .contains(&"check-headers".to_string()));
    assert!(config.contents().contains("spoe-message check-headers"));
    assert!(client.list_transactions().is_empty());
    assert!(transaction_files(&config.transaction_dir()).is_empty());
}

#[test]
fn failed_implicit_edit_can_be_repeated() {
    let config = TestConfig::sample();
    let mut client = config.client();
    let before = config.contents();

    for _ in 0..3 {
        let result = client.delete_section(
            SAMPLE_SCOPE,
            SectionKind::Agent,
            "no-such-agent",
            &TransactionRef::implicit(1),
        );
        assert!(matches!(result, Err(ConfError::ObjectNotFound { .. })));
        assert!(client.list_transactions().is_empty());
    }
    assert!(transaction_files(&config.transaction_dir()).is_empty());
    assert_eq!(config.contents(), before);
}

#[test]
fn deleting_missing_section_leaves_document_unchanged() {
    let config = TestConfig::sample();
    let mut client = config.client();
    let id = client.begin_transaction(Version::new(1)).unwrap();
    let txn = TransactionRef::Explicit(id.clone());
    let before = staged_text(&client, &id);

    let result = client.delete_section(SAMPLE_SCOPE, SectionKind::Message, "ghost", &txn);
    assert!(matches!(result, Err(ConfError::ObjectNotFound { .. })));

    let result = client.delete_section("no-scope", SectionKind::Message, "ghost", &txn);
    assert!(matches!(result, Err(ConfError::ObjectNotFound { .. })));

    let result = client.delete_directive(SAMPLE_SCOPE, SectionKind::Agent, "ghost", 0, &txn);
    assert!(matches!(result, Err(ConfError::ParentNotFound { .. })));

    assert_eq!(staged_text(&client, &id), before);
    assert!(client.has_transaction(&id));
}

#[test]
fn starting_transaction_twice_fails() {
    let config = TestConfig::sample();
    let mut client = config.client();
    let id = client.begin_transaction(Version::new(1)).unwrap();

    let result = client.manager_mut().start_transaction(&id);
    assert!(matches!(result, Err(ConfError::TransactionAlreadyExists { .. })));
    assert_eq!(client.list_transactions().len(), 1);
}

#[test]
fn version_moves_on_commit_and_increment() {
    let config = TestConfig::with_content(VERSIONED);
    let mut client = config.client();

    client
        .delete_section("spoe-test", SectionKind::Agent, "agent1", &TransactionRef::implicit(3))
        .unwrap();
    assert_eq!(client.current_version(None).unwrap(), Version::new(4));
    assert!(client
        .list_sections("spoe-test", SectionKind::Agent, None)
        .unwrap()
        .is_empty());

    assert_eq!(client.increment_version().unwrap(), Version::new(5));
    assert_eq!(client.current_version(None).unwrap(), Version::new(5));
    assert!(config.contents().starts_with("# _version=5\n"));

    let result = client.create_scope("late", &TransactionRef::implicit(3));
    assert!(matches!(
        result,
        Err(ConfError::VersionMismatch {
            expected: 3,
            actual: 5
        })
    ));
}

#[test]
fn explicit_transaction_survives_save_failure() {
    let config = TestConfig::sample();
    let mut client = config.client();
    let id = client.begin_transaction(Version::new(1)).unwrap();

    fs::remove_dir_all(config.transaction_dir()).unwrap();

    let result = client.delete_section(
        SAMPLE_SCOPE,
        SectionKind::Agent,
        "iprep-agent",
        &TransactionRef::Explicit(id.clone()),
    );
    assert!(matches!(result, Err(ConfError::ConfigWrite { .. })));
    assert!(client.has_transaction(&id));
    assert!(client
        .list_sections(SAMPLE_SCOPE, SectionKind::Agent, Some(&id))
        .unwrap()
        .is_empty());
}

#[test]
fn transactions_outlive_the_client() {
    let config = TestConfig::sample();
    let id = {
        let mut client = config.client();
        let id = client.begin_transaction(Version::new(1)).unwrap();
        client
            .insert_directive(
                SAMPLE_SCOPE,
                SectionKind::Message,
                "check-client-ip",
                1,
                "args src_port=src_port",
                &TransactionRef::Explicit(id.clone()),
            )
            .unwrap();
        id
    };
    assert_eq!(
        transaction_files(&config.transaction_dir()),
        vec![format!("spoe.cfg.{id}")]
    );

    let mut client = config.client();
    let info = client.list_transactions();
    assert_eq!(info.len(), 1);
    assert_eq!(info[0].status, TransactionStatus::InProgress);
    assert_eq!(info[0].version, Some(Version::new(1)));

    client.commit_transaction(&id).unwrap();
    let section = client
        .get_section(SAMPLE_SCOPE, SectionKind::Message, "check-client-ip", None)
        .unwrap();
    assert_eq!(section.directives[1], "args src_port=src_port");
}

#[test]
fn corrupt_transactions_are_set_aside() {
    let config = TestConfig::sample();
    let tx_dir = config.transaction_dir();
    fs::create_dir_all(&tx_dir).unwrap();
    fs::write(tx_dir.join("spoe.cfg.broken"), "spoe-agent outside\n").unwrap();

    let client = config.client();
    assert!(client.list_transactions().is_empty());

    let failed = client.list_failed_transactions().unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].id, TransactionId::new("broken"));
    assert_eq!(
        serde_json::to_value(&failed[0]).unwrap(),
        serde_json::json!({ "id": "broken", "status": "failed" })
    );
}

#[test]
fn second_client_is_locked_out() {
    let config = TestConfig::sample();
    let _client = config.client();
    let result = SpoeClient::<SpoeDocument>::open(config.params());
    assert!(matches!(result, Err(ConfError::StoreLocked)));
}

#[test]
fn backups_are_rotated() {
    let config = TestConfig::sample();
    let mut client = config.client_with(config.params().backups_number(2));

    for version in 1..=3 {
        client
            .create_scope(&format!("scope-{version}"), &TransactionRef::implicit(version))
            .unwrap();
    }
    assert_eq!(client.current_version(None).unwrap(), Version::new(4));

    let dir = config.path().parent().unwrap();
    let backups: Vec<String> = transaction_files(dir)
        .into_iter()
        .filter(|name| name.starts_with("spoe.cfg."))
        .collect();
    assert_eq!(backups, vec!["spoe.cfg.2", "spoe.cfg.3"]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn save_then_load_round_trips(doc in document_strategy()) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spoe.cfg");
        doc.save(&path).unwrap();

        let loaded = SpoeDocument::load(&path).unwrap();
        prop_assert_eq!(loaded.version().unwrap(), doc.version().unwrap());
        for scope in doc.scopes() {
            for kind in SectionKind::ALL {
                let names = doc.sections(&scope, kind).unwrap();
                prop_assert_eq!(loaded.sections(&scope, kind).unwrap(), names.clone());
                for name in names {
                    prop_assert_eq!(
                        loaded.section(&scope, kind, &name).unwrap(),
                        doc.section(&scope, kind, &name).unwrap()
                    );
                }
            }
        }
    }
}
