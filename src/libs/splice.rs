use crate::libs::cigar::{self, Operation};
use crate::libs::error::StitchError;
use crate::libs::record::AlignmentRecord;

/// Replaces the aligned interior of `original` with `replacement`, keeping
/// the original soft clips.
///
/// `replacement` must cover exactly the query and reference bases the original
/// aligned and must not contain clips. The reference start is kept; the
/// reference end follows from the new operations.
pub fn splice(
    original: &AlignmentRecord,
    replacement: &[Operation],
    query_length: u64,
) -> Result<AlignmentRecord, StitchError> {
    if let Some(op) = replacement.iter().find(|op| op.kind.is_clip()) {
        return Err(StitchError::UnexpectedClipInReplacement { op: *op });
    }

    let query = cigar::aligned_query_len(replacement);
    let reference = cigar::reference_span(replacement);
    let expected_query = original.query_end() - original.query_start();
    let expected_reference = original.reference_end() - original.reference_start();
    if query != expected_query || reference != expected_reference {
        return Err(StitchError::ReplacementLengthMismatch {
            query,
            reference,
            expected_query,
            expected_reference,
        });
    }

    let mut ops = Vec::with_capacity(replacement.len() + 2);
    if original.query_start() > 0 {
        ops.push(Operation::soft_clip(original.query_start()));
    }
    ops.extend_from_slice(replacement);
    if original.query_end() < query_length {
        ops.push(Operation::soft_clip(query_length - original.query_end()));
    }

    let before = cigar::accounted_query_len(original.ops());
    let after = cigar::accounted_query_len(&ops);
    if before != after {
        return Err(StitchError::ClipPreservationViolation {
            original: before,
            spliced: after,
        });
    }

    AlignmentRecord::new(
        original.query_name(),
        original.reference_name(),
        original.reference_start(),
        original.strand(),
        ops,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::cigar::{format_cigar, parse_cigar};
    use crate::libs::record::Strand;

    fn rec(start: u64, cigar: &str) -> AlignmentRecord {
        AlignmentRecord::new("read", "chr1", start, Strand::Forward, parse_cigar(cigar).unwrap())
            .unwrap()
    }

    #[test]
    fn test_keeps_clips() {
        let original = rec(100, "5S40M5S");
        let spliced = splice(&original, &parse_cigar("40M").unwrap(), 50).unwrap();
        assert_eq!(format_cigar(spliced.ops()), "5S40M5S");
        assert_eq!(spliced.reference_start(), 100);
        assert_eq!(spliced.reference_end(), 140);
    }

    #[test]
    fn test_replaces_interior() {
        let original = rec(100, "5S10M2I8M3D20M5S");
        let replacement = parse_cigar("12M3D8M2I18M").unwrap();
        let spliced = splice(&original, &replacement, 50).unwrap();

        assert_eq!(format_cigar(spliced.ops()), "5S12M3D8M2I18M5S");
        assert_eq!(spliced.reference_end(), original.reference_end());
        assert_eq!(spliced.query_start(), original.query_start());
        assert_eq!(spliced.query_end(), original.query_end());
        spliced.validate(1000, 50).unwrap();
    }

    #[test]
    fn test_no_clips() {
        let original = rec(0, "50M");
        let spliced = splice(&original, &parse_cigar("20M1I9M1D20M").unwrap(), 50).unwrap();
        assert_eq!(format_cigar(spliced.ops()), "20M1I9M1D20M");
        assert_eq!(spliced.strand(), Strand::Forward);
    }

    #[test]
    fn test_reverse_strand_kept() {
        let original =
            AlignmentRecord::new("read", "chr1", 7, Strand::Reverse, parse_cigar("3S45M2S").unwrap())
                .unwrap();
        let spliced = splice(&original, &parse_cigar("45M").unwrap(), 50).unwrap();
        assert_eq!(spliced.strand(), Strand::Reverse);
        assert_eq!(format_cigar(spliced.ops()), "3S45M2S");
    }

    #[test]
    fn test_soft_clip_inside_hard_clip() {
        // the leading soft clip stays in front, the hard clip is dropped
        let original = rec(100, "5H3S40M");
        let spliced = splice(&original, &parse_cigar("40M").unwrap(), 43).unwrap();
        assert_eq!(format_cigar(spliced.ops()), "3S40M");
        assert_eq!(spliced.query_start(), 3);
        spliced.validate(1000, 43).unwrap();

        let original = rec(100, "2S40M3S4H");
        let spliced = splice(&original, &parse_cigar("20M2D18M2I").unwrap(), 45).unwrap();
        assert_eq!(format_cigar(spliced.ops()), "2S20M2D18M2I3S");
    }

    #[test]
    fn test_length_mismatch() {
        let original = rec(100, "5S40M5S");

        let err = splice(&original, &parse_cigar("39M").unwrap(), 50).unwrap_err();
        assert_eq!(
            err,
            StitchError::ReplacementLengthMismatch {
                query: 39,
                reference: 39,
                expected_query: 40,
                expected_reference: 40,
            }
        );

        let err = splice(&original, &parse_cigar("20M1D20M").unwrap(), 50).unwrap_err();
        assert!(matches!(err, StitchError::ReplacementLengthMismatch { reference: 41, .. }));
    }

    #[test]
    fn test_clip_in_replacement() {
        let original = rec(100, "5S40M5S");
        let err = splice(&original, &parse_cigar("2S38M").unwrap(), 50).unwrap_err();
        assert_eq!(
            err,
            StitchError::UnexpectedClipInReplacement {
                op: Operation::soft_clip(2)
            }
        );

        let err = splice(&original, &parse_cigar("40M1H").unwrap(), 50).unwrap_err();
        assert!(matches!(err, StitchError::UnexpectedClipInReplacement { .. }));
    }

    #[test]
    fn test_clip_preservation() {
        // hard clipped bases are not stored, so the original accounts for 45
        let original = rec(100, "5H40M5S");
        let err = splice(&original, &parse_cigar("40M").unwrap(), 50).unwrap_err();
        assert_eq!(
            err,
            StitchError::ClipPreservationViolation {
                original: 45,
                spliced: 50
            }
        );

        // wrong query length
        let original = rec(100, "5S40M5S");
        let err = splice(&original, &parse_cigar("40M").unwrap(), 60).unwrap_err();
        assert!(matches!(err, StitchError::ClipPreservationViolation { .. }));
    }
}
