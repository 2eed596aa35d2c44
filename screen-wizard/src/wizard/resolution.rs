// Resolution summary shown on the final step.
//
// Total width sums quantity × width over entries flagged "counts toward width"; height
// likewise. Entries with missing numbers contribute nothing.

use crate::models::draft::{NumericInput, ScreenDraft, Solution};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResolutionSummary {
    pub total_width: f64,
    pub total_height: f64,
    pub entries: usize,
}

fn span(flag: bool, quantity: &NumericInput<i64>, size: &NumericInput<f64>) -> f64 {
    match (flag, quantity.value(), size.value()) {
        (true, Some(q), Some(s)) => q as f64 * s,
        _ => 0.0,
    }
}

pub fn summarize(draft: &ScreenDraft) -> Option<ResolutionSummary> {
    let summary = match draft.solution.as_ref()? {
        Solution::Module(modules) => modules.iter().fold(
            ResolutionSummary::default(),
            |acc, m| ResolutionSummary {
                total_width: acc.total_width + span(m.is_width, &m.width_quantity, &m.width),
                total_height: acc.total_height
                    + span(m.is_height, &m.height_quantity, &m.height),
                entries: acc.entries + 1,
            },
        ),
        Solution::Cabinet(cabinets) => cabinets.iter().fold(
            ResolutionSummary::default(),
            |acc, c| ResolutionSummary {
                total_width: acc.total_width + span(c.is_width, &c.width_quantity, &c.width),
                total_height: acc.total_height
                    + span(c.is_height, &c.height_quantity, &c.height),
                entries: acc.entries + 1,
            },
        ),
    };
    Some(summary)
}
