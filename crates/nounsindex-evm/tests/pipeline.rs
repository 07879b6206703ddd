//! End-to-end runs of the indexer against a mock provider and real storage
//! backends.

use std::sync::Arc;

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, U256};

use nounsindex_core::indexer::ContractAddresses;
use nounsindex_core::sink::{EventSink, RecordFilter};
use nounsindex_core::types::NormalizedEvent;
use nounsindex_evm::formatter::{AUCTION_HOUSE_V2_UPGRADE_BLOCK, NOUNS_GENESIS_BLOCK};
use nounsindex_evm::test_utils::{LogBuilder, MockRpcClient, VecSubscriber};
use nounsindex_evm::{Indexer, IndexerBuilder, RpcLog};
use nounsindex_storage::{InMemoryStorage, JsonFileStorage};

const G: u64 = NOUNS_GENESIS_BLOCK;
const V2: u64 = AUCTION_HOUSE_V2_UPGRADE_BLOCK;

const TRANSFER: &str = "Transfer(address indexed from, address indexed to, uint256 indexed tokenId)";
const RESERVE_V1: &str = "AuctionReservePriceUpdated(uint256 reservePrice)";
const RESERVE_V2: &str = "AuctionReservePriceUpdated(uint192 reservePrice)";

fn uint(v: u64, bits: usize) -> DynSolValue {
    DynSolValue::Uint(U256::from(v), bits)
}

fn transfer(token_id: u64, block: u64, log_index: u64) -> RpcLog {
    LogBuilder::new(TRANSFER)
        .address(ContractAddresses::mainnet().token)
        .block(block)
        .log_index(log_index)
        .topic(DynSolValue::Address(Address::ZERO))
        .topic(DynSolValue::Address(Address::repeat_byte(0x11)))
        .topic(uint(token_id, 256))
        .build()
}

fn reserve(signature: &str, bits: usize, price: u64, block: u64) -> RpcLog {
    LogBuilder::new(signature)
        .address(ContractAddresses::mainnet().auction_house)
        .block(block)
        .body(uint(price, bits))
        .build()
}

fn indexer<S>(client: &Arc<MockRpcClient>, storage: &Arc<S>, batch_size: u64) -> Indexer
where
    S: EventSink + nounsindex_core::checkpoint::CheckpointStore + 'static,
{
    IndexerBuilder::new()
        .batch_size(batch_size)
        .client(client.clone())
        .storage(storage.clone())
        .subscriber(Arc::new(VecSubscriber::default()))
        .build()
        .unwrap()
}

fn positions(records: &[NormalizedEvent]) -> Vec<(u64, u64)> {
    records.iter().map(|r| r.event.position()).collect()
}

#[tokio::test]
async fn index_then_update_matches_single_backfill() {
    let logs: Vec<RpcLog> = (0..40).map(|i| transfer(i, G + i * 97, i % 3)).collect();

    let split_client = Arc::new(MockRpcClient::new(G + 1800));
    split_client.push_logs(logs.clone());
    let split_store = Arc::new(InMemoryStorage::new());
    let split = indexer(&split_client, &split_store, 250);
    split.index("Transfer").await.unwrap();
    split_client.set_head(G + 40 * 97);
    split.update("Transfer").await.unwrap();

    let whole_client = Arc::new(MockRpcClient::new(G + 40 * 97));
    whole_client.push_logs(logs);
    let whole_store = Arc::new(InMemoryStorage::new());
    let whole = indexer(&whole_client, &whole_store, 250);
    whole.index("Transfer").await.unwrap();

    let a = split.query("Transfer", &RecordFilter::all()).await.unwrap();
    let b = whole.query("Transfer", &RecordFilter::all()).await.unwrap();
    assert_eq!(a.len(), 40);
    assert_eq!(a, b);
    assert_eq!(
        split.checkpoint("Transfer").await.unwrap(),
        whole.checkpoint("Transfer").await.unwrap()
    );
}

#[tokio::test]
async fn repeated_update_appends_nothing() {
    let client = Arc::new(MockRpcClient::new(G + 500));
    client.push_logs([transfer(1, G + 10, 0), transfer(2, G + 499, 0)]);
    let store = Arc::new(InMemoryStorage::new());
    let idx = indexer(&client, &store, 2_000);

    assert_eq!(idx.update("Transfer").await.unwrap().records, 2);
    for _ in 0..3 {
        assert_eq!(idx.update("Transfer").await.unwrap().records, 0);
    }
    assert_eq!(store.count("Transfer").await.unwrap(), 2);
}

#[tokio::test]
async fn chunk_boundaries_neither_drop_nor_duplicate() {
    // Logs on the first and last block of every chunk.
    let batch = 10;
    let mut logs = Vec::new();
    let mut from = G;
    while from <= G + 100 {
        let to = (from + batch).min(G + 100);
        logs.push(transfer(from, from, 0));
        if to != from {
            logs.push(transfer(to, to, 0));
        }
        from = to + 1;
    }
    let expected = logs.len();

    let client = Arc::new(MockRpcClient::new(G + 100));
    client.push_logs(logs);
    let store = Arc::new(InMemoryStorage::new());
    let idx = indexer(&client, &store, batch);
    let outcome = idx.index("Transfer").await.unwrap();

    assert_eq!(outcome.records, expected);
    let stored = idx.query("Transfer", &RecordFilter::all()).await.unwrap();
    let mut seen = positions(&stored);
    seen.dedup();
    assert_eq!(seen.len(), expected);
    assert!(seen.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn versioned_event_routes_each_window_to_its_signature() {
    let client = Arc::new(MockRpcClient::new(V2 + 100));
    client.push_logs([
        reserve(RESERVE_V1, 256, 1_000, G + 5),
        reserve(RESERVE_V1, 256, 2_000, V2 - 1),
        reserve(RESERVE_V2, 192, 3_000, V2),
        reserve(RESERVE_V2, 192, 4_000, V2 + 100),
    ]);
    let store = Arc::new(InMemoryStorage::new());
    let idx = indexer(&client, &store, 10_000_000);

    let outcome = idx.index("AuctionReservePriceUpdated").await.unwrap();
    assert_eq!(outcome.records, 4);
    assert_eq!(client.log_queries(), vec![(G, V2 - 1), (V2, V2 + 100)]);

    let stored = idx.query("AuctionReservePriceUpdated", &RecordFilter::all()).await.unwrap();
    let prices: Vec<_> = stored
        .iter()
        .map(|r| serde_json::to_value(r).unwrap()["reservePrice"].clone())
        .collect();
    assert_eq!(prices, vec!["1000", "2000", "3000", "4000"]);
}

#[tokio::test]
async fn update_all_keeps_going_after_one_event_fails() {
    let client = Arc::new(MockRpcClient::new(G + 100));
    client.push_log(transfer(1, G + 1, 0));
    client.fail_range_containing(G + 50);
    let store = Arc::new(InMemoryStorage::new());
    let idx = indexer(&client, &store, 2_000);

    let batch = idx.update_all().await;
    assert!(!batch.is_complete());
    assert_eq!(
        batch.succeeded.len() + batch.failed.len(),
        idx.supported_events().len()
    );
    assert!(batch.failed.iter().any(|(name, _)| name == "Transfer"));
    assert_eq!(idx.checkpoint("Transfer").await.unwrap(), None);

    client.clear_failures();
    let batch = idx.update_all().await;
    assert!(batch.is_complete());
    assert_eq!(store.count("Transfer").await.unwrap(), 1);
}

#[tokio::test]
async fn json_file_storage_resumes_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let client = Arc::new(MockRpcClient::new(G + 100));
    client.push_logs([transfer(1, G + 10, 0), transfer(2, G + 150, 0)]);

    {
        let store = Arc::new(JsonFileStorage::open(dir.path()).await.unwrap());
        let idx = indexer(&client, &store, 2_000);
        assert_eq!(idx.index("Transfer").await.unwrap().records, 1);
    }

    client.set_head(G + 200);
    client.clear_queries();
    let store = Arc::new(JsonFileStorage::open(dir.path()).await.unwrap());
    let idx = indexer(&client, &store, 2_000);
    let outcome = idx.update("Transfer").await.unwrap();

    assert_eq!((outcome.from_block, outcome.to_block), (G + 101, G + 200));
    assert_eq!(client.log_queries(), vec![(G + 101, G + 200)]);

    let stored = idx.query("Transfer", &RecordFilter::all()).await.unwrap();
    assert_eq!(positions(&stored), vec![(G + 10, 0), (G + 150, 0)]);
    let raw = std::fs::read_to_string(dir.path().join("Transfer.json")).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(doc["events"][1]["tokenId"], 2);
}
