//! Tests for the safestealth CLI
//!
//! Tests cover:
//! - Signature parsing
//! - Registry persistence and permissions
//! - Publishing and loading key shares
//! - The register / add-safe / share / recover flow against a temp data dir

#[cfg(test)]
mod config_tests {
    use crate::config::{parse_signature, write_private, DataDir};
    use safe_stealth::Address;

    #[test]
    fn test_parse_signature_with_and_without_prefix() {
        let hex_sig = "ab".repeat(64) + "1b";
        let plain = parse_signature(&hex_sig).unwrap();
        let prefixed = parse_signature(&format!("0x{}", hex_sig)).unwrap();

        assert_eq!(plain.len(), 65);
        assert_eq!(plain, prefixed);
        assert_eq!(plain[64], 0x1b);
    }

    #[test]
    fn test_parse_signature_rejects_bad_input() {
        assert!(parse_signature("not hex").is_err());
        assert!(parse_signature(&"ab".repeat(64)).is_err());
    }

    #[test]
    fn test_share_file_named_after_safe() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = DataDir::resolve(Some(dir.path().to_path_buf())).unwrap();
        let safe = Address::new([0xaa; 20]);

        let path = data_dir.share_file(&safe);
        assert_eq!(path.parent().unwrap(), data_dir.shares_dir());
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            format!("{}.json", safe)
        );
        assert_eq!(data_dir.root(), dir.path());
    }

    #[cfg(unix)]
    #[test]
    fn test_write_private_sets_owner_only_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("file.json");
        write_private(&path, "{}").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}

#[cfg(test)]
mod registry_tests {
    use crate::config::{DataDir, FileRegistry};
    use safe_stealth::{Address, SafeOwnerResolver, StealthError, StealthKeyLookup};

    fn keys(fill: u8) -> safe_stealth::StealthKeyPair {
        let mut sig = [fill; 65];
        sig[64] = 28;
        safe_stealth::generate(&sig).unwrap()
    }

    #[tokio::test]
    async fn test_registry_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = DataDir::resolve(Some(dir.path().to_path_buf())).unwrap();
        let safe = Address::new([0xaa; 20]);
        let owners = vec![Address::new([1; 20]), Address::new([2; 20])];

        let mut registry = FileRegistry::load(&data_dir).unwrap();
        registry.add_safe(safe, owners.clone());
        registry.register(owners[0], keys(1).meta_keys());
        registry.save().unwrap();
        let registered_at = registry.registered_at(&owners[0]).unwrap();

        let reloaded = FileRegistry::load(&data_dir).unwrap();
        assert_eq!(reloaded.owners_of(&safe).await.unwrap(), owners);
        assert_eq!(reloaded.get(&owners[0]).await.unwrap(), keys(1).meta_keys());
        assert_eq!(reloaded.registered_at(&owners[0]), Some(registered_at));
        assert_eq!(
            reloaded.get(&owners[1]).await.unwrap_err(),
            StealthError::NotRegistered(owners[1])
        );
    }

    #[tokio::test]
    async fn test_missing_registry_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = DataDir::resolve(Some(dir.path().to_path_buf())).unwrap();

        let registry = FileRegistry::load(&data_dir).unwrap();
        assert!(registry
            .safes_of(&Address::new([1; 20]))
            .await
            .unwrap()
            .is_empty());
        assert!(!data_dir.registry_file().exists());
    }

    #[test]
    fn test_corrupt_registry_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = DataDir::resolve(Some(dir.path().to_path_buf())).unwrap();
        std::fs::write(data_dir.registry_file(), "{ not json").unwrap();

        assert!(FileRegistry::load(&data_dir).is_err());
    }
}

#[cfg(test)]
mod flow_tests {
    use crate::config::{DataDir, FileRegistry, FileSharePublisher};
    use safe_stealth::{
        Address, KeySharePublisher, MultiOwnerKeyAggregator, StealthError, StealthKeyPair,
    };

    fn keys(fill: u8) -> StealthKeyPair {
        let mut sig = [fill; 65];
        sig[64] = 27;
        safe_stealth::generate(&sig).unwrap()
    }

    fn setup(register_all: bool) -> (tempfile::TempDir, DataDir, Address, Vec<Address>) {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = DataDir::resolve(Some(dir.path().to_path_buf())).unwrap();
        let safe = Address::new([0xaa; 20]);
        let owners = vec![
            Address::new([1; 20]),
            Address::new([2; 20]),
            Address::new([3; 20]),
        ];

        let mut registry = FileRegistry::load(&data_dir).unwrap();
        registry.add_safe(safe, owners.clone());
        for (i, owner) in owners.iter().enumerate() {
            if register_all || i != 1 {
                registry.register(*owner, keys(i as u8 + 1).meta_keys());
            }
        }
        registry.save().unwrap();

        (dir, data_dir, safe, owners)
    }

    #[tokio::test]
    async fn test_share_publish_and_recover() {
        let (_dir, data_dir, safe, owners) = setup(true);
        let safe_keys = keys(0x42);

        let registry = FileRegistry::load(&data_dir).unwrap();
        let aggregator = MultiOwnerKeyAggregator::new(&registry, &registry);
        let share = aggregator.share(&safe, &safe_keys).await.unwrap();

        let publisher = FileSharePublisher::new(data_dir.clone());
        publisher.publish(&share).await.unwrap();
        assert!(data_dir.share_file(&safe).exists());

        let loaded = publisher.load(&safe).unwrap();
        assert_eq!(loaded, share);

        for (i, owner) in owners.iter().enumerate() {
            let recovered = loaded
                .recover_viewing_key(owner, keys(i as u8 + 1).viewing_key())
                .unwrap();
            assert_eq!(&recovered, safe_keys.viewing_key());
        }
    }

    #[tokio::test]
    async fn test_unregistered_owner_blocks_share() {
        let (_dir, data_dir, safe, owners) = setup(false);

        let registry = FileRegistry::load(&data_dir).unwrap();
        let aggregator = MultiOwnerKeyAggregator::new(&registry, &registry);
        let err = aggregator.share(&safe, &keys(0x42)).await.unwrap_err();

        assert_eq!(err, StealthError::UnregisteredOwner(owners[1]));
        assert!(!data_dir.share_file(&safe).exists());
    }

    #[test]
    fn test_load_missing_share() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = DataDir::resolve(Some(dir.path().to_path_buf())).unwrap();

        let err = FileSharePublisher::new(data_dir)
            .load(&Address::new([0xaa; 20]))
            .unwrap_err();
        assert!(err.to_string().contains("No key share published"));
    }
}
