// LogSlice - core/plan.rs
//
// Maps the located range ends onto the segments to write and how to cut
// each one. Pure: no I/O, so every overlap case is testable without files.
//
// Range ends that fall in a gap between two segments are resolved to the
// segment on the inside of the range, so nothing outside the range is
// written and nothing inside it is lost.

use crate::core::model::{
    ExtractionPlan, ExtractionRange, OverlapCase, PlannedSegment, SegmentCut, SegmentMatch,
    SegmentMiss,
};
use crate::util::error::ExtractError;

/// Where one end of the range lands after resolving misses.
enum Side {
    /// Segment index holding this end, or the nearest segment inside the range.
    At(usize),
    /// Beyond the archive edge on this side; clamp.
    Clamped,
    /// The range cannot overlap the archive at all.
    Outside,
}

fn resolve_start(start: &SegmentMatch) -> Side {
    match start {
        SegmentMatch::Found(i) => Side::At(*i),
        SegmentMatch::Missed(SegmentMiss::Gap { later, .. }) => Side::At(*later),
        SegmentMatch::Missed(SegmentMiss::BeforeArchive) => Side::Clamped,
        SegmentMatch::Missed(SegmentMiss::AfterArchive | SegmentMiss::NoRecords) => Side::Outside,
    }
}

fn resolve_end(end: &SegmentMatch) -> Side {
    match end {
        SegmentMatch::Found(i) => Side::At(*i),
        SegmentMatch::Missed(SegmentMiss::Gap { earlier, .. }) => Side::At(*earlier),
        SegmentMatch::Missed(SegmentMiss::AfterArchive) => Side::Clamped,
        SegmentMatch::Missed(SegmentMiss::BeforeArchive | SegmentMiss::NoRecords) => Side::Outside,
    }
}

/// Build the extraction plan for an archive of `segment_count` segments.
///
/// `start` is the lowest segment containing `range.from()`, `end` the
/// highest segment containing `range.to()`.
pub fn plan_extraction(
    segment_count: usize,
    start: &SegmentMatch,
    end: &SegmentMatch,
    range: &ExtractionRange,
) -> Result<ExtractionPlan, ExtractError> {
    if segment_count == 0 {
        return Err(ExtractError::EmptyArchive);
    }
    let last = segment_count - 1;
    let (from, to) = (range.from(), range.to());

    let disjoint = ExtractionPlan {
        case: OverlapCase::Disjoint,
        segments: Vec::new(),
    };

    let (case, first, final_index) = match (resolve_start(start), resolve_end(end)) {
        (Side::Outside, _) | (_, Side::Outside) => return Ok(disjoint),
        (Side::At(s), Side::At(e)) if s < e => (OverlapCase::Distinct, s, e),
        (Side::At(s), Side::At(e)) if s == e => (OverlapCase::Single, s, e),
        (Side::At(s), Side::At(e)) => {
            // Both ends in the same gap: the range falls between two segments.
            if matches!(start, SegmentMatch::Missed(_)) && matches!(end, SegmentMatch::Missed(_)) {
                return Ok(disjoint);
            }
            return Err(ExtractError::SegmentsOutOfOrder { start: s, end: e });
        }
        (Side::Clamped, Side::At(e)) => (OverlapCase::StartClamped, 0, e),
        (Side::At(s), Side::Clamped) => (OverlapCase::EndClamped, s, last),
        (Side::Clamped, Side::Clamped) => (OverlapCase::Enclosing, 0, last),
    };

    let segments = (first..=final_index)
        .map(|index| {
            let cut = match case {
                OverlapCase::Single => SegmentCut::Between(from, to),
                OverlapCase::Distinct if index == first => SegmentCut::From(from),
                OverlapCase::Distinct if index == final_index => SegmentCut::Until(to),
                OverlapCase::StartClamped if index == final_index => SegmentCut::Until(to),
                OverlapCase::EndClamped if index == first => SegmentCut::From(from),
                _ => SegmentCut::Whole,
            };
            PlannedSegment { index, cut }
        })
        .collect();

    Ok(ExtractionPlan { case, segments })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn range(from: i64, to: i64) -> ExtractionRange {
        ExtractionRange::new(at(from), at(to)).unwrap()
    }

    fn cuts(plan: &ExtractionPlan) -> Vec<(usize, SegmentCut)> {
        plan.segments.iter().map(|p| (p.index, p.cut)).collect()
    }

    const BEFORE: SegmentMatch = SegmentMatch::Missed(SegmentMiss::BeforeArchive);
    const AFTER: SegmentMatch = SegmentMatch::Missed(SegmentMiss::AfterArchive);

    #[test]
    fn test_distinct_segments() {
        let r = range(11, 17);
        let plan =
            plan_extraction(4, &SegmentMatch::Found(0), &SegmentMatch::Found(2), &r).unwrap();
        assert_eq!(plan.case, OverlapCase::Distinct);
        assert_eq!(
            cuts(&plan),
            vec![
                (0, SegmentCut::From(at(11))),
                (1, SegmentCut::Whole),
                (2, SegmentCut::Until(at(17))),
            ]
        );
    }

    #[test]
    fn test_single_segment() {
        let r = range(11, 12);
        let plan =
            plan_extraction(3, &SegmentMatch::Found(1), &SegmentMatch::Found(1), &r).unwrap();
        assert_eq!(plan.case, OverlapCase::Single);
        assert_eq!(cuts(&plan), vec![(1, SegmentCut::Between(at(11), at(12)))]);
    }

    #[test]
    fn test_start_clamped() {
        let r = range(5, 14);
        let plan = plan_extraction(3, &BEFORE, &SegmentMatch::Found(1), &r).unwrap();
        assert_eq!(plan.case, OverlapCase::StartClamped);
        assert_eq!(
            cuts(&plan),
            vec![(0, SegmentCut::Whole), (1, SegmentCut::Until(at(14)))]
        );
    }

    #[test]
    fn test_end_clamped() {
        let r = range(11, 20);
        let plan = plan_extraction(3, &SegmentMatch::Found(0), &AFTER, &r).unwrap();
        assert_eq!(plan.case, OverlapCase::EndClamped);
        assert_eq!(
            cuts(&plan),
            vec![
                (0, SegmentCut::From(at(11))),
                (1, SegmentCut::Whole),
                (2, SegmentCut::Whole),
            ]
        );
    }

    #[test]
    fn test_enclosing() {
        let plan = plan_extraction(3, &BEFORE, &AFTER, &range(5, 20)).unwrap();
        assert_eq!(plan.case, OverlapCase::Enclosing);
        assert!(plan.segments.iter().all(|p| p.cut == SegmentCut::Whole));
        assert_eq!(plan.segments.len(), 3);
    }

    #[test]
    fn test_start_in_gap_moves_to_next_segment() {
        let gap = SegmentMatch::Missed(SegmentMiss::Gap {
            earlier: 0,
            later: 1,
        });
        let plan = plan_extraction(3, &gap, &SegmentMatch::Found(2), &range(12, 17)).unwrap();
        assert_eq!(plan.case, OverlapCase::Distinct);
        assert_eq!(plan.segments.first().map(|p| p.index), Some(1));
    }

    #[test]
    fn test_range_inside_one_gap_is_disjoint() {
        let gap = SegmentMatch::Missed(SegmentMiss::Gap {
            earlier: 0,
            later: 1,
        });
        let plan = plan_extraction(3, &gap, &gap, &range(12, 12)).unwrap();
        assert_eq!(plan.case, OverlapCase::Disjoint);
        assert!(plan.segments.is_empty());
    }

    #[test]
    fn test_range_entirely_before_or_after_is_disjoint() {
        let plan = plan_extraction(3, &BEFORE, &BEFORE, &range(1, 2)).unwrap();
        assert_eq!(plan.case, OverlapCase::Disjoint);
        let plan = plan_extraction(3, &AFTER, &AFTER, &range(30, 40)).unwrap();
        assert_eq!(plan.case, OverlapCase::Disjoint);
    }

    #[test]
    fn test_found_ends_out_of_order_fail() {
        let result = plan_extraction(
            3,
            &SegmentMatch::Found(2),
            &SegmentMatch::Found(0),
            &range(11, 12),
        );
        assert!(matches!(
            result,
            Err(ExtractError::SegmentsOutOfOrder { start: 2, end: 0 })
        ));
    }
}
