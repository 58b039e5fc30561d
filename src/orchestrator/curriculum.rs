//! Curriculum-learning gate: compares measured RL metrics against the
//! static stage catalog. Pure lookups and comparisons; callers decide what
//! to do with the verdict.

use super::types::{CurriculumCriteria, CurriculumLevel, JobMetrics};

/// Static reference catalog, one stage per level. Consulted, never mutated.
pub const CATALOG: [(CurriculumLevel, CurriculumCriteria); 3] = [
    (
        CurriculumLevel::Simple,
        CurriculumCriteria {
            win_ratio: 0.52,
            min_trades: 30,
            max_drawdown: 0.15,
            sharpe_ratio: None,
        },
    ),
    (
        CurriculumLevel::Volatile,
        CurriculumCriteria {
            win_ratio: 0.55,
            min_trades: 50,
            max_drawdown: 0.12,
            sharpe_ratio: Some(1.0),
        },
    ),
    (
        CurriculumLevel::MultiAsset,
        CurriculumCriteria {
            win_ratio: 0.58,
            min_trades: 80,
            max_drawdown: 0.10,
            sharpe_ratio: Some(1.5),
        },
    ),
];

/// Thresholds for a level.
pub fn criteria_for(level: CurriculumLevel) -> CurriculumCriteria {
    // The catalog covers every level variant.
    CATALOG
        .iter()
        .find(|(l, _)| *l == level)
        .map(|(_, c)| *c)
        .unwrap_or(CATALOG[0].1)
}

/// Gate verdict. `next_level` is only populated when the target is met;
/// MultiAsset is the final tier and never yields a successor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateDecision {
    pub target: CurriculumCriteria,
    pub target_met: bool,
    pub next_level: Option<CurriculumLevel>,
}

/// Evaluate measured metrics against the level's thresholds.
/// target_met = win_ratio >= target AND trades >= min AND drawdown <= max.
/// The optional sharpe threshold is advisory and intentionally not part of
/// the conjunction.
pub fn evaluate(level: CurriculumLevel, measured: &JobMetrics) -> GateDecision {
    let target = criteria_for(level);
    let target_met = measured.win_ratio >= target.win_ratio
        && measured.trades >= target.min_trades
        && measured.max_drawdown <= target.max_drawdown;
    GateDecision {
        target,
        target_met,
        next_level: if target_met { level.next() } else { None },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(win_ratio: f64, trades: u32, drawdown: f64) -> JobMetrics {
        JobMetrics {
            win_ratio,
            trades,
            max_drawdown: drawdown,
            sharpe_ratio: 1.2,
            total_return_pct: 5.0,
        }
    }

    #[test]
    fn test_simple_target_met() {
        let d = evaluate(CurriculumLevel::Simple, &metrics(0.55, 40, 0.10));
        assert!(d.target_met);
        assert_eq!(d.next_level, Some(CurriculumLevel::Volatile));
    }

    #[test]
    fn test_exact_thresholds_pass() {
        // Boundaries are inclusive on win/trades and on the drawdown ceiling.
        let d = evaluate(CurriculumLevel::Simple, &metrics(0.52, 30, 0.15));
        assert!(d.target_met);
    }

    #[test]
    fn test_each_criterion_gates_independently() {
        assert!(!evaluate(CurriculumLevel::Simple, &metrics(0.50, 40, 0.10)).target_met);
        assert!(!evaluate(CurriculumLevel::Simple, &metrics(0.55, 29, 0.10)).target_met);
        assert!(!evaluate(CurriculumLevel::Simple, &metrics(0.55, 40, 0.16)).target_met);
    }

    #[test]
    fn test_no_next_level_when_unmet() {
        let d = evaluate(CurriculumLevel::Volatile, &metrics(0.50, 10, 0.30));
        assert!(!d.target_met);
        assert_eq!(d.next_level, None);
    }

    #[test]
    fn test_final_tier_has_no_successor() {
        let d = evaluate(CurriculumLevel::MultiAsset, &metrics(0.70, 200, 0.05));
        assert!(d.target_met);
        assert_eq!(d.next_level, None);
    }

    #[test]
    fn test_catalog_tightens_with_level() {
        let simple = criteria_for(CurriculumLevel::Simple);
        let volatile = criteria_for(CurriculumLevel::Volatile);
        let multi = criteria_for(CurriculumLevel::MultiAsset);
        assert!(simple.win_ratio < volatile.win_ratio);
        assert!(volatile.win_ratio < multi.win_ratio);
        assert!(simple.max_drawdown > multi.max_drawdown);
    }
}
