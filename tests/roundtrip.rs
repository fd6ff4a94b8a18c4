//! Integration tests exercising the byte-exact round-trip and hashing invariants a real
//! `<hash>.hex` / `<hash>.json` fixture pair would check, built over synthetic blocks
//! since no reference fixture data ships with this crate.

use hex_literal::hex;

use zcash_block_codec::{Block, PorcelainMode, Transaction};

fn coinbase_tx() -> Transaction {
    let bytes = Transaction {
        overwintered: false,
        version: 1,
        version_group_id: 0,
        vin: vec![zcash_block_codec::transparent::TransactionIn {
            prevout: zcash_block_codec::transparent::OutPoint {
                hash: [0u8; 32],
                n: 0xFFFF_FFFF,
            },
            script_sig: hex!("03a08601").to_vec(),
            sequence: 0xFFFF_FFFF,
        }],
        vout: vec![zcash_block_codec::transparent::TransactionOut {
            value: 1_250_000_000,
            script_pub_key: {
                let mut script = vec![0x76, 0xa9, 0x14];
                script.extend_from_slice(&[0xAA; 20]);
                script.push(0x88);
                script.push(0xac);
                script
            },
        }],
        lock_time: 0,
        expiry_height: 0,
        value_balance_zat: 0,
        shielded_spends: vec![],
        shielded_outputs: vec![],
        join_splits: vec![],
        join_split_pubkey: None,
        join_split_sig: None,
        binding_sig: None,
        txid: [0u8; 32],
        raw_bytes: vec![],
    };
    Transaction::decode(&bytes.encode(), true).unwrap()
}

fn sapling_tx_with_shielded_output() -> Transaction {
    let shielded_out = zcash_block_codec::shielded::OutputDescription {
        cv: [1u8; 32],
        cmu: [2u8; 32],
        ephemeral_key: [3u8; 32],
        enc_ciphertext: [4u8; 580],
        out_ciphertext: [5u8; 80],
        proof: [6u8; 192],
    };
    let template = Transaction {
        overwintered: true,
        version: 4,
        version_group_id: zcash_block_codec::transaction::SAPLING_VERSION_GROUP_ID,
        vin: vec![zcash_block_codec::transparent::TransactionIn {
            prevout: zcash_block_codec::transparent::OutPoint {
                hash: [7u8; 32],
                n: 1,
            },
            script_sig: vec![0x51],
            sequence: 0xFFFF_FFFE,
        }],
        vout: vec![],
        lock_time: 0,
        expiry_height: 500_000,
        value_balance_zat: -250,
        shielded_spends: vec![],
        shielded_outputs: vec![shielded_out],
        join_splits: vec![],
        join_split_pubkey: None,
        join_split_sig: None,
        binding_sig: Some([9u8; 64]),
        txid: [0u8; 32],
        raw_bytes: vec![],
    };
    Transaction::decode(&template.encode(), true).unwrap()
}

fn sample_block_bytes() -> (Vec<u8>, [u8; 32], [u8; 32]) {
    let coinbase = coinbase_tx();
    let shielded = sapling_tx_with_shielded_output();
    let merkleroot =
        zcash_block_codec::merkle_root(&[coinbase.txid, shielded.txid]).unwrap();

    let block = Block {
        version: 4,
        previousblockhash: [0xAB; 32],
        merkleroot,
        finalsaplingroot: [0xCD; 32],
        time: 1_600_000_000,
        bits: 0x1c2abf3e,
        nonce: [0xEF; 32],
        solution: vec![0x11; 1344],
        hash: [0u8; 32],
        tx: Some(vec![coinbase.clone(), shielded.clone()]),
        size: None,
    };
    let bytes = block.encode();
    (bytes, coinbase.txid, shielded.txid)
}

#[test]
fn block_round_trips_byte_exact() {
    let (bytes, _, _) = sample_block_bytes();
    let decoded = Block::decode(&bytes, true).unwrap();
    assert_eq!(decoded.encode(), bytes);
}

#[test]
fn block_hash_is_dbl_sha256_of_exact_header_span() {
    let (bytes, _, _) = sample_block_bytes();
    let decoded = Block::decode(&bytes, true).unwrap();
    let header_span = &bytes[..zcash_block_codec::HEADER_BYTES];
    assert_eq!(decoded.hash, zcash_block_codec::dbl_sha256(header_span));
}

#[test]
fn each_transaction_txid_is_dbl_sha256_of_its_raw_span_and_is_a_substring() {
    let (bytes, coinbase_txid, shielded_txid) = sample_block_bytes();
    let decoded = Block::decode(&bytes, true).unwrap();
    let tx = decoded.tx.as_ref().unwrap();
    assert_eq!(tx[0].txid, coinbase_txid);
    assert_eq!(tx[1].txid, shielded_txid);
    for t in tx {
        assert_eq!(zcash_block_codec::dbl_sha256(&t.raw_bytes), t.txid);
        let pos = bytes
            .windows(t.raw_bytes.len())
            .position(|w| w == t.raw_bytes.as_slice());
        assert!(pos.is_some(), "rawBytes must be a contiguous substring of the block");
    }
}

#[test]
fn calculated_merkle_root_matches_header_field() {
    let (bytes, _, _) = sample_block_bytes();
    let decoded = Block::decode(&bytes, true).unwrap();
    assert_eq!(decoded.calculate_merkle_root().unwrap(), decoded.merkleroot);
}

#[test]
fn header_only_decode_round_trips_exact_header_span() {
    let (bytes, _, _) = sample_block_bytes();
    let header_only = &bytes[..zcash_block_codec::HEADER_BYTES];
    let decoded = Block::decode_header_only(header_only, true).unwrap();
    assert_eq!(decoded.encode(), header_only);
}

#[test]
fn min_mode_porcelain_lists_txid_hex_in_order() {
    let (bytes, coinbase_txid, shielded_txid) = sample_block_bytes();
    let decoded = Block::decode(&bytes, true).unwrap();
    let porcelain = decoded.to_porcelain(PorcelainMode::Min);
    let tx = porcelain["tx"].as_array().unwrap();
    assert_eq!(tx[0], zcash_block_codec::hash_to_hex(&coinbase_txid));
    assert_eq!(tx[1], zcash_block_codec::hash_to_hex(&shielded_txid));
}

#[test]
fn porcelain_round_trip_reencodes_to_identical_bytes() {
    let (bytes, _, _) = sample_block_bytes();
    let decoded = Block::decode(&bytes, true).unwrap();
    let porcelain = decoded.to_porcelain(PorcelainMode::Default);
    let rebuilt = Block::from_porcelain(&porcelain).unwrap();
    assert_eq!(rebuilt.encode(), bytes);
}

#[test]
fn difficulty_is_one_at_genesis_bits() {
    let (bytes, _, _) = sample_block_bytes();
    let mut decoded = Block::decode(&bytes, true).unwrap();
    decoded.bits = 0x1f07_ffff;
    assert!((decoded.difficulty() - 1.0).abs() < 1e-9);
}
