//! End-to-end: build a sharded binary fuse filter over a small corpus and
//! query it back, including the "unbuilt shard" failure mode.

use hibp::error::HibpError;
use hibp::filter::{ShardFilter, ShardedFilterFile, ShardedFilterWriter};
use hibp::record::hashing::digest_to_u64;
use hibp::record::parse_line;

#[test]
fn build_query_and_missing_shard() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("filters.bin");

    // 2 shard bits => 4 shards; only populate shards 0 and 3.
    let shard0: Vec<u64> = (0..500u64).map(|i| i * 13).collect();
    let shard3: Vec<u64> = (0..500u64).map(|i| i * 17 + 5).collect();

    let mut writer = ShardedFilterWriter::create(&path, 2).unwrap();
    let f0 = ShardFilter::build(0, &shard0).unwrap().unwrap();
    writer.add_shard(0, &f0.to_bytes().unwrap()).unwrap();
    writer.skip_shard(1).unwrap();
    writer.skip_shard(2).unwrap();
    let f3 = ShardFilter::build(3, &shard3).unwrap().unwrap();
    writer.add_shard(3, &f3.to_bytes().unwrap()).unwrap();
    writer.finish().unwrap();

    let reader = ShardedFilterFile::open(&path).unwrap();
    assert!(reader.contains(0, shard0[10]).unwrap());
    assert!(reader.contains(3, shard3[10]).unwrap());
    assert!(matches!(
        reader.contains(1, 999),
        Err(HibpError::MissingShard { prefix: 1 })
    ));

    // sanity: a real parsed record's key also plumbs through digest_to_u64
    let rec = parse_line::<8>("0000000000000005:1").unwrap();
    let _ = digest_to_u64(&rec.digest);
}
