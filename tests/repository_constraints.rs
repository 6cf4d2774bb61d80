//! Integration tests for the record repository: uniqueness enforcement,
//! byte-exact ciphertext storage, and atomic key pair inserts.

mod common;

use common::test_pool;
use sealbox::errors::Error;
use sealbox::storage::{NewRecord, RecordKind, SecretsRepository, StoredRecord};

#[tokio::test]
async fn stores_and_returns_ciphertext_verbatim() {
    let repo = SecretsRepository::new(test_pool().await);

    let ciphertext = vec![0x01, 0x02, 0xFF, 0x00, 0x7F];
    repo.create(
        NewRecord::Secret {
            key_name: "raw-bytes".to_string(),
            ciphertext: ciphertext.clone(),
        },
        1,
    )
    .await
    .unwrap();

    match repo.get_by_name(RecordKind::Secret, "raw-bytes").await.unwrap() {
        StoredRecord::Secret(row) => {
            assert_eq!(row.ciphertext, ciphertext);
            assert_eq!(row.key_name, "raw-bytes");
            assert_eq!(row.master_key_version, 1);
        }
        other => panic!("unexpected record kind: {:?}", other),
    }
}

#[tokio::test]
async fn duplicate_key_name_fails_with_conflict() {
    let repo = SecretsRepository::new(test_pool().await);

    repo.create(
        NewRecord::Secret {
            key_name: "db-password".to_string(),
            ciphertext: vec![1, 2, 3],
        },
        1,
    )
    .await
    .unwrap();

    let result = repo
        .create(
            NewRecord::Secret {
                key_name: "db-password".to_string(),
                ciphertext: vec![4, 5, 6],
            },
            1,
        )
        .await;

    assert!(matches!(result, Err(Error::Conflict { .. })));

    // The first record is unaffected by the failed create.
    match repo.get_by_name(RecordKind::Secret, "db-password").await.unwrap() {
        StoredRecord::Secret(row) => assert_eq!(row.ciphertext, vec![1, 2, 3]),
        other => panic!("unexpected record kind: {:?}", other),
    }
}

#[tokio::test]
async fn uniqueness_is_scoped_per_kind() {
    let repo = SecretsRepository::new(test_pool().await);

    // The same name may exist once per kind.
    repo.create(
        NewRecord::Secret {
            key_name: "shared-name".to_string(),
            ciphertext: vec![1],
        },
        1,
    )
    .await
    .unwrap();

    repo.create(
        NewRecord::SymmetricKey {
            key_name: "shared-name".to_string(),
            ciphertext: vec![2],
        },
        1,
    )
    .await
    .unwrap();

    repo.create(
        NewRecord::AsymmetricKeyPair {
            key_name: "shared-name".to_string(),
            public_key_pem: "-----BEGIN PUBLIC KEY-----\n-----END PUBLIC KEY-----\n".to_string(),
            private_key_ciphertext: vec![3],
        },
        1,
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn duplicate_symmetric_key_name_fails() {
    let repo = SecretsRepository::new(test_pool().await);

    repo.create(
        NewRecord::SymmetricKey {
            key_name: "svc-key".to_string(),
            ciphertext: vec![1],
        },
        1,
    )
    .await
    .unwrap();

    let result = repo
        .create(
            NewRecord::SymmetricKey {
                key_name: "svc-key".to_string(),
                ciphertext: vec![2],
            },
            1,
        )
        .await;

    assert!(matches!(result, Err(Error::Conflict { .. })));
}

#[tokio::test]
async fn key_pair_row_always_carries_both_halves() {
    let repo = SecretsRepository::new(test_pool().await);

    repo.create(
        NewRecord::AsymmetricKeyPair {
            key_name: "svc-key".to_string(),
            public_key_pem: "public-pem".to_string(),
            private_key_ciphertext: vec![9, 9, 9],
        },
        2,
    )
    .await
    .unwrap();

    match repo
        .get_by_name(RecordKind::AsymmetricKeyPair, "svc-key")
        .await
        .unwrap()
    {
        StoredRecord::AsymmetricKeyPair(row) => {
            assert_eq!(row.public_key, "public-pem");
            assert_eq!(row.private_key_ciphertext, vec![9, 9, 9]);
            assert_eq!(row.master_key_version, 2);
        }
        other => panic!("unexpected record kind: {:?}", other),
    }
}

#[tokio::test]
async fn missing_record_fails_with_not_found() {
    let repo = SecretsRepository::new(test_pool().await);

    for kind in [
        RecordKind::Secret,
        RecordKind::SymmetricKey,
        RecordKind::AsymmetricKeyPair,
    ] {
        let result = repo.get_by_name(kind, "missing").await;
        assert!(
            matches!(result, Err(Error::NotFound { .. })),
            "expected NotFound for {:?}",
            kind
        );
    }
}
