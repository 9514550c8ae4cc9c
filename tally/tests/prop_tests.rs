use pollbox_nullables::NullStore;
use pollbox_store::{CandidateStore, ElectionStore, NewCandidate, NewElection, VoteStore};
use pollbox_tally::TallyEngine;
use pollbox_types::{CredentialDigest, ElectionId, Timestamp};
use proptest::prelude::*;

fn seed(counts: &[u64]) -> (NullStore, ElectionId) {
    let store = NullStore::new();
    let election = store
        .insert_election(&NewElection {
            name: "Board".to_string(),
            credential: CredentialDigest::new([1u8; 32]),
            created_at: Timestamp::new(100),
        })
        .unwrap();
    let mut tick = 0u64;
    for (i, &count) in counts.iter().enumerate() {
        let candidate = store
            .insert_candidate(&NewCandidate {
                election,
                name: format!("C{i}"),
                symbol: Some(format!("c{i}.png")),
                is_nota: false,
            })
            .unwrap();
        for _ in 0..count {
            tick += 1;
            store
                .insert_vote(election, candidate, Timestamp::new(1000 + tick))
                .unwrap();
        }
    }
    (store, election)
}

proptest! {
    /// Row vote counts sum to the store's total, percentages sum to 100
    /// within rounding when there are any votes (all exactly 0 otherwise),
    /// and rows come out ordered by votes descending, id ascending.
    #[test]
    fn tally_counts_and_percentages(counts in prop::collection::vec(0u64..40, 1..8)) {
        let (store, election) = seed(&counts);
        let rows = TallyEngine.tally(&store, election).unwrap();

        prop_assert_eq!(rows.len(), counts.len());

        let total: u64 = counts.iter().sum();
        let row_total: u64 = rows.iter().map(|r| r.votes).sum();
        prop_assert_eq!(row_total, total);

        let percentage_sum: f64 = rows.iter().map(|r| r.percentage).sum();
        if total == 0 {
            prop_assert_eq!(percentage_sum, 0.0);
        } else {
            // Each row is rounded to 2 decimals, so the sum may drift by
            // up to half a cent per row.
            let tolerance = 0.005 * rows.len() as f64 + 1e-9;
            prop_assert!((percentage_sum - 100.0).abs() <= tolerance);
        }

        for pair in rows.windows(2) {
            let ordered = pair[0].votes > pair[1].votes
                || (pair[0].votes == pair[1].votes && pair[0].candidate < pair[1].candidate);
            prop_assert!(ordered);
        }
    }
}
