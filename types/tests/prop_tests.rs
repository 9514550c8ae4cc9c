use proptest::prelude::*;

use pollbox_types::{CandidateId, CredentialDigest, ElectionId, Timestamp, VoteId};

proptest! {
    /// ElectionId roundtrip: new -> as_u64 produces the same raw value.
    #[test]
    fn election_id_roundtrip(raw in 0u64..u64::MAX) {
        let id = ElectionId::new(raw);
        prop_assert_eq!(id.as_u64(), raw);
    }

    /// CandidateId ordering matches raw ordering (tally tiebreak depends on it).
    #[test]
    fn candidate_id_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ca = CandidateId::new(a);
        let cb = CandidateId::new(b);
        prop_assert_eq!(ca <= cb, a <= b);
        prop_assert_eq!(ca == cb, a == b);
    }

    /// VoteId bincode serialization roundtrip.
    #[test]
    fn vote_id_bincode_roundtrip(raw in 0u64..u64::MAX) {
        let id = VoteId::new(raw);
        let encoded = bincode::serialize(&id).unwrap();
        let decoded: VoteId = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded, id);
    }

    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::new(a);
        let tb = Timestamp::new(b);
        prop_assert_eq!(ta <= tb, a <= b);
        prop_assert_eq!(ta == tb, a == b);
    }

    /// Timestamp roundtrip: new -> as_secs produces the same raw value.
    #[test]
    fn timestamp_roundtrip(secs in 0u64..u64::MAX) {
        prop_assert_eq!(Timestamp::new(secs).as_secs(), secs);
    }

    /// CredentialDigest roundtrip: new -> as_bytes produces identical bytes.
    #[test]
    fn digest_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let digest = CredentialDigest::new(bytes);
        prop_assert_eq!(digest.as_bytes(), &bytes);
    }

    /// CredentialDigest hex display parses back to the same digest.
    #[test]
    fn digest_hex_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let digest = CredentialDigest::new(bytes);
        let parsed: CredentialDigest = digest.to_string().parse().unwrap();
        prop_assert_eq!(parsed, digest);
    }

    /// CredentialDigest bincode serialization roundtrip.
    #[test]
    fn digest_bincode_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let digest = CredentialDigest::new(bytes);
        let encoded = bincode::serialize(&digest).unwrap();
        let decoded: CredentialDigest = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded, digest);
    }
}
