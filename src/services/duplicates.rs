use tracing::debug;

use crate::adapters::sqlite::records::{self, DuplicateRow};
use crate::adapters::sqlite::DbPool;
use crate::error::SweepError;
use crate::types::DuplicateCluster;

/// Duplicate clusters within one mailbox, or across all of them when no
/// label is given. A cluster exists only for fingerprints with two or more
/// records in scope; members are ordered newest first.
pub fn find_duplicates(
    pool: &DbPool,
    mailbox_id: Option<&str>,
) -> Result<Vec<DuplicateCluster>, SweepError> {
    let rows = records::query_duplicates(pool, mailbox_id)?;
    let clusters = cluster_rows(rows);
    debug!(clusters = clusters.len(), "Duplicate query complete");
    Ok(clusters)
}

/// Clusters for fingerprints present in BOTH mailboxes.
///
/// Each cluster contains every record from either mailbox sharing the
/// fingerprint, and `duplicate_count` is the combined total, so one copy
/// in each mailbox is already a pair. That is the point of the query:
/// "this message exists in both places", so one side can be deleted safely.
pub fn find_cross_duplicates(
    pool: &DbPool,
    mailbox_a: &str,
    mailbox_b: &str,
) -> Result<Vec<DuplicateCluster>, SweepError> {
    let rows = records::query_cross_duplicates(pool, mailbox_a, mailbox_b)?;
    let clusters = cluster_rows(rows);
    debug!(clusters = clusters.len(), "Cross-mailbox duplicate query complete");
    Ok(clusters)
}

/// Delete persisted records by database id. Clusters whose membership drops
/// below two disappear from the next query on their own.
pub fn delete_records(pool: &DbPool, ids: &[i64]) -> Result<usize, SweepError> {
    records::delete_by_ids(pool, ids)
}

pub fn delete_record(pool: &DbPool, id: i64) -> Result<usize, SweepError> {
    records::delete_by_id(pool, id)
}

// Rows arrive ordered by content_hash then date descending, so grouping is
// a single pass over consecutive runs.
fn cluster_rows(rows: Vec<DuplicateRow>) -> Vec<DuplicateCluster> {
    let mut clusters: Vec<DuplicateCluster> = Vec::new();

    for row in rows {
        match clusters.last_mut() {
            Some(cluster) if cluster.content_hash == row.message.content_hash => {
                cluster.messages.push(row.message);
            }
            _ => clusters.push(DuplicateCluster {
                content_hash: row.message.content_hash.clone(),
                duplicate_count: row.duplicate_count,
                messages: vec![row.message],
            }),
        }
    }

    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::pool::create_pool;
    use crate::adapters::sqlite::records::upsert_batch;
    use crate::types::MessageRecord;

    fn test_pool() -> (tempfile::TempDir, DbPool) {
        let dir = tempfile::tempdir().unwrap();
        let pool = create_pool(&dir.path().join("test.db"), 2).unwrap();
        (dir, pool)
    }

    fn record(message_id: &str, hash: &str, mailbox: &str, date: i64) -> MessageRecord {
        MessageRecord {
            message_id: message_id.to_string(),
            subject: "s".into(),
            from: "f".into(),
            to: "t".into(),
            date,
            folder_name: "INBOX".into(),
            mailbox_id: mailbox.to_string(),
            content_hash: hash.to_string(),
            uid: 0,
            size: 0,
        }
    }

    #[test]
    fn test_grouping_round_trip() {
        let (_dir, pool) = test_pool();
        upsert_batch(
            &pool,
            &[
                record("<a1>", "dup", "work", 3),
                record("<a2>", "dup", "work", 1),
                record("<a3>", "dup", "work", 2),
                record("<b1>", "solo", "work", 9),
            ],
        )
        .unwrap();

        let clusters = find_duplicates(&pool, None).unwrap();
        assert_eq!(clusters.len(), 1);
        let cluster = &clusters[0];
        assert_eq!(cluster.content_hash, "dup");
        assert_eq!(cluster.duplicate_count, 3);
        assert_eq!(cluster.messages.len(), 3);
        // Representative is the most recent copy.
        assert_eq!(cluster.messages[0].date, 3);
    }

    #[test]
    fn test_cross_mailbox_pair() {
        let (_dir, pool) = test_pool();
        upsert_batch(
            &pool,
            &[
                record("<w>", "shared", "work", 1),
                record("<h>", "shared", "home", 2),
                record("<x>", "other", "work", 3),
            ],
        )
        .unwrap();

        let clusters = find_cross_duplicates(&pool, "work", "home").unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].duplicate_count, 2);
        assert_eq!(clusters[0].messages.len(), 2);
        let mailboxes: Vec<&str> = clusters[0]
            .messages
            .iter()
            .map(|m| m.mailbox_id.as_str())
            .collect();
        assert!(mailboxes.contains(&"work"));
        assert!(mailboxes.contains(&"home"));
    }

    #[test]
    fn test_cross_mailbox_requires_both_sides() {
        let (_dir, pool) = test_pool();
        // Two copies, both in "work": a single-mailbox duplicate but not a
        // cross-mailbox one.
        upsert_batch(
            &pool,
            &[
                record("<w1>", "h", "work", 1),
                record("<w2>", "h", "work", 2),
            ],
        )
        .unwrap();

        assert!(find_cross_duplicates(&pool, "work", "home").unwrap().is_empty());
        assert_eq!(find_duplicates(&pool, Some("work")).unwrap().len(), 1);
    }

    #[test]
    fn test_deletion_collapses_cluster() {
        let (_dir, pool) = test_pool();
        upsert_batch(
            &pool,
            &[
                record("<a>", "h", "work", 1),
                record("<b>", "h", "work", 2),
            ],
        )
        .unwrap();

        let clusters = find_duplicates(&pool, None).unwrap();
        assert_eq!(clusters.len(), 1);
        let victim = clusters[0].messages[0].id;

        assert_eq!(delete_records(&pool, &[victim]).unwrap(), 1);
        assert!(find_duplicates(&pool, None).unwrap().is_empty());
    }

    #[test]
    fn test_multiple_clusters_stay_separate() {
        let (_dir, pool) = test_pool();
        upsert_batch(
            &pool,
            &[
                record("<a1>", "h1", "work", 1),
                record("<a2>", "h1", "work", 2),
                record("<b1>", "h2", "work", 3),
                record("<b2>", "h2", "work", 4),
            ],
        )
        .unwrap();

        let clusters = find_duplicates(&pool, None).unwrap();
        assert_eq!(clusters.len(), 2);
        assert!(clusters.iter().all(|c| c.messages.len() == 2));
        assert_ne!(clusters[0].content_hash, clusters[1].content_hash);
    }
}
