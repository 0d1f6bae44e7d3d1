//! End-to-end scenarios across write, close, reopen, and load.

use std::fs::OpenOptions;
use std::io::Write;

use rand::Rng;
use tempfile::TempDir;

use walletdb::records::hdchain::HdChainState;
use walletdb::records::keys::KeyMetadata;
use walletdb::records::tx::WalletTx;
use walletdb::records::{self, KeyId, PubKey, RecordKind, TxHash, Writer};
use walletdb::{
    load_wallet, open_and_load, DbLoadStatus, WalletDb, WalletState, SUPPORTED_FORMAT_VERSION,
};

fn random_pubkey() -> PubKey {
    let mut bytes = vec![0x02u8];
    bytes.extend_from_slice(&rand::thread_rng().gen::<[u8; 32]>());
    PubKey(bytes)
}

#[test]
fn test_key_and_metadata_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("wallet.dat");
    let pk = random_pubkey();
    let secret = rand::thread_rng().gen::<[u8; 32]>();
    let meta = KeyMetadata {
        create_time: 1_700_000_000,
        hd_keypath: "m/44'/0'/0'/0/3".to_string(),
        hd_master_key_id: KeyId([9u8; 20]),
    };

    {
        let mut db = WalletDb::open(&path).unwrap();
        db.write_key(&pk, &secret, &meta).unwrap();
        db.flush().unwrap();
    }

    let mut state = WalletState::new();
    let (status, db) = open_and_load(&path, &mut state);
    assert_eq!(status, DbLoadStatus::Ok);
    assert!(db.is_some());

    let (stored_secret, stored_meta) = &state.keys[&pk];
    assert_eq!(stored_secret.as_slice(), &secret);
    assert_eq!(stored_meta, &meta);
    assert!(state.loose_key_metadata.is_empty());
}

#[test]
fn test_hd_chain_base_version_defaults_internal_counter() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("wallet.dat");
    {
        // Plant a base-version payload: external counter and master key
        // id only, written before the chain-split field existed.
        let mut kv = walletdb::kv::FileKv::open(&path).unwrap();
        let mut w = Writer::versioned(HdChainState::VERSION_HD_BASE);
        w.put_u32(42);
        w.put_key_id(&KeyId([7u8; 20]));
        kv.put(records::singleton_key(RecordKind::HdChain), w.finish())
            .unwrap();
    }

    let db = WalletDb::open(&path).unwrap();
    let chain = db.read_hd_chain().unwrap().unwrap();
    assert_eq!(chain.version, HdChainState::VERSION_HD_BASE);
    assert!(!chain.future_version);
    assert_eq!(chain.value.external_chain_counter, 42);
    assert_eq!(chain.value.internal_chain_counter, 0);
    assert_eq!(chain.value.master_key_id, KeyId([7u8; 20]));

    let mut state = WalletState::new();
    assert_eq!(load_wallet(&db, &mut state), DbLoadStatus::Ok);
    assert_eq!(state.hd_chain.unwrap().internal_chain_counter, 0);
}

#[test]
fn test_malformed_destdata_is_noncritical_but_key_is_corrupt() {
    let dir = TempDir::new().unwrap();

    let noncritical = dir.path().join("noncritical.dat");
    {
        let mut kv = walletdb::kv::FileKv::open(&noncritical).unwrap();
        kv.put(records::dest_data_key("addr", "note"), vec![0xff])
            .unwrap();
    }
    let db = WalletDb::open(&noncritical).unwrap();
    let mut state = WalletState::new();
    assert_eq!(load_wallet(&db, &mut state), DbLoadStatus::NoncriticalError);

    let corrupt = dir.path().join("corrupt.dat");
    {
        let mut kv = walletdb::kv::FileKv::open(&corrupt).unwrap();
        kv.put(records::key_key(&random_pubkey()), vec![0xff])
            .unwrap();
    }
    let db = WalletDb::open(&corrupt).unwrap();
    let mut state = WalletState::new();
    assert_eq!(load_wallet(&db, &mut state), DbLoadStatus::Corrupt);
}

#[test]
fn test_min_version_gate() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("wallet.dat");
    {
        let mut db = WalletDb::open(&path).unwrap();
        db.write_min_version(SUPPORTED_FORMAT_VERSION).unwrap();
    }
    {
        let mut state = WalletState::new();
        let (status, _db) = open_and_load(&path, &mut state);
        assert_eq!(status, DbLoadStatus::Ok);
    }
    {
        let mut db = WalletDb::open(&path).unwrap();
        db.write_min_version(SUPPORTED_FORMAT_VERSION + 1).unwrap();
    }
    let mut state = WalletState::new();
    let (status, _db) = open_and_load(&path, &mut state);
    assert_eq!(status, DbLoadStatus::TooNew);
}

#[test]
fn test_update_counter_strictly_monotonic() {
    let dir = TempDir::new().unwrap();
    let mut db = WalletDb::open(&dir.path().join("wallet.dat")).unwrap();
    let mut last = db.update_counter();

    db.write_name("a", "one").unwrap();
    assert!(db.update_counter() > last);
    last = db.update_counter();

    db.write_tx(&TxHash([1u8; 32]), &WalletTx::new(b"t".to_vec()))
        .unwrap();
    assert!(db.update_counter() > last);
    last = db.update_counter();

    // Reads and no-op erases leave the counter alone.
    db.read_tx(&TxHash([1u8; 32])).unwrap();
    assert!(!db.erase_name("missing").unwrap());
    assert_eq!(db.update_counter(), last);

    assert!(db.erase_name("a").unwrap());
    assert!(db.update_counter() > last);
}

#[test]
fn test_torn_tail_dropped_on_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("wallet.dat");
    {
        let mut db = WalletDb::open(&path).unwrap();
        db.write_name("addr", "label").unwrap();
        db.flush().unwrap();
    }
    // Simulate a crash mid-append: garbage after the last good record.
    let mut file = OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(&[0x13, 0x37, 0x00, 0xff]).unwrap();
    drop(file);

    let mut state = WalletState::new();
    let (status, _db) = open_and_load(&path, &mut state);
    assert_eq!(status, DbLoadStatus::Ok);
    assert_eq!(state.names["addr"], "label");
}
