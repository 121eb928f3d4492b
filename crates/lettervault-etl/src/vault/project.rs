//! Projection of the enriched batch into the vault tables

use std::collections::HashSet;

use crate::model::{
    EnrichedRecord, HubLetterRow, HubUserRow, LinkPostRow, RawRecord, SatelliteLetterRow,
};

/// The four vault projections for one batch.
///
/// Owned by the orchestrator for the duration of the batch and discarded
/// afterwards; nothing is cached between runs.
#[derive(Debug, Default)]
pub struct TableSet {
    pub hub_users: Vec<HubUserRow>,
    pub hub_letters: Vec<HubLetterRow>,
    pub satellite_letters: Vec<SatelliteLetterRow>,
    pub link_posts: Vec<LinkPostRow>,
}

/// Derive the business-key digests for every staged record
pub fn enrich(records: Vec<RawRecord>) -> Vec<EnrichedRecord> {
    records.into_iter().map(EnrichedRecord::from_raw).collect()
}

/// Split the enriched batch into the four vault projections.
///
/// The users hub is deduplicated by exact `user_id` equality, first-seen
/// order, no normalization. The letters hub keeps one row per staged record;
/// downstream row counts depend on that, so it is not deduplicated here. An
/// empty input produces four empty projections.
pub fn project(records: &[EnrichedRecord]) -> TableSet {
    let mut tables = TableSet::default();
    let mut seen_users = HashSet::new();

    for record in records {
        if seen_users.insert(record.user_id) {
            tables.hub_users.push(HubUserRow {
                user_id: record.user_id,
                user_id_hash: record.user_id_hash.clone(),
            });
        }

        tables.hub_letters.push(HubLetterRow {
            letter_id: record.letter_id,
            letter_id_hash: record.letter_id_hash.clone(),
        });

        tables.satellite_letters.push(SatelliteLetterRow {
            letter_id_hash: record.letter_id_hash.clone(),
            title: record.title.clone(),
            body: record.body.clone(),
        });

        tables.link_posts.push(LinkPostRow {
            user_id_hash: record.user_id_hash.clone(),
            letter_id_hash: record.letter_id_hash.clone(),
        });
    }

    tables
}

#[cfg(test)]
mod tests {
    use super::*;
    use lettervault_common::hash_business_key;

    fn raw(user_id: i64, id: i64, title: &str, body: &str) -> RawRecord {
        RawRecord {
            user_id,
            id,
            title: Some(title.to_string()),
            body: Some(body.to_string()),
        }
    }

    #[test]
    fn test_two_letters_one_user() {
        let enriched = enrich(vec![raw(1, 10, "A", "x"), raw(1, 11, "B", "y")]);
        let tables = project(&enriched);

        assert_eq!(tables.hub_users.len(), 1);
        assert_eq!(tables.hub_users[0].user_id, 1);
        assert_eq!(tables.hub_letters.len(), 2);
        assert_eq!(tables.hub_letters[0].letter_id, 10);
        assert_eq!(tables.hub_letters[1].letter_id, 11);
        assert_eq!(tables.satellite_letters.len(), 2);
        assert_eq!(tables.link_posts.len(), 2);

        // Both link rows reference the same user digest
        assert_eq!(tables.link_posts[0].user_id_hash, tables.link_posts[1].user_id_hash);
    }

    #[test]
    fn test_hub_users_deduplicated_by_key() {
        let enriched = enrich(vec![
            raw(3, 30, "A", "x"),
            raw(1, 31, "B", "y"),
            raw(3, 32, "C", "z"),
            raw(2, 33, "D", "w"),
        ]);
        let tables = project(&enriched);

        let users: Vec<i64> = tables.hub_users.iter().map(|r| r.user_id).collect();
        assert_eq!(users, vec![3, 1, 2], "first-seen order preserved");
    }

    #[test]
    fn test_row_count_conservation() {
        let enriched = enrich((0..50).map(|i| raw(i % 7, 100 + i, "t", "b")).collect());
        let tables = project(&enriched);

        assert_eq!(tables.hub_users.len(), 7);
        assert_eq!(tables.hub_letters.len(), 50);
        assert_eq!(tables.satellite_letters.len(), 50);
        assert_eq!(tables.link_posts.len(), 50);
    }

    #[test]
    fn test_referential_consistency() {
        let enriched = enrich(vec![raw(5, 50, "A", "x")]);
        let tables = project(&enriched);

        assert_eq!(enriched[0].user_id_hash, hash_business_key(5));
        assert_eq!(tables.hub_users[0].user_id_hash, enriched[0].user_id_hash);
        assert_eq!(tables.hub_letters[0].letter_id_hash, hash_business_key(50));
        assert_eq!(tables.link_posts[0].user_id_hash, enriched[0].user_id_hash);
        assert_eq!(tables.satellite_letters[0].letter_id_hash, enriched[0].letter_id_hash);
    }

    #[test]
    fn test_hub_letters_not_deduplicated() {
        // The same letter staged twice stays two hub rows; downstream counts
        // rely on this.
        let enriched = enrich(vec![raw(1, 10, "A", "x"), raw(1, 10, "A", "x")]);
        let tables = project(&enriched);

        assert_eq!(tables.hub_letters.len(), 2);
        assert_eq!(tables.hub_users.len(), 1);
    }

    #[test]
    fn test_empty_batch() {
        let tables = project(&enrich(Vec::new()));

        assert!(tables.hub_users.is_empty());
        assert!(tables.hub_letters.is_empty());
        assert!(tables.satellite_letters.is_empty());
        assert!(tables.link_posts.is_empty());
    }
}
