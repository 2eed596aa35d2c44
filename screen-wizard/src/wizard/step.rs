// Wizard steps and their order per solution type.

use crate::models::draft::SolutionType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    ScreenInfo,
    Cables,
    Cabinets,
    Modules,
    Resolution,
}

const CABINET_PATH: [Step; 5] = [
    Step::ScreenInfo,
    Step::Cables,
    Step::Cabinets,
    Step::Modules,
    Step::Resolution,
];

const MODULE_PATH: [Step; 4] = [Step::ScreenInfo, Step::Cables, Step::Modules, Step::Resolution];

/// Steps visited for a solution type. Until one is chosen the short (module) path applies;
/// the screen info step cannot be left without a choice anyway.
pub fn path(solution: Option<SolutionType>) -> &'static [Step] {
    match solution {
        Some(SolutionType::CabinetSolution) => &CABINET_PATH,
        Some(SolutionType::ModuleSolution) | None => &MODULE_PATH,
    }
}

impl Step {
    pub fn title(self) -> &'static str {
        match self {
            Step::ScreenInfo => "Screen info",
            Step::Cables => "Cables",
            Step::Cabinets => "Cabinets",
            Step::Modules => "Modules",
            Step::Resolution => "Resolution",
        }
    }

    /// Parse a step by its title or a short alias (used by the smoke runner).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "info" | "screen" | "screen-info" | "screen info" => Some(Step::ScreenInfo),
            "cables" => Some(Step::Cables),
            "cabinets" => Some(Step::Cabinets),
            "modules" => Some(Step::Modules),
            "resolution" => Some(Step::Resolution),
            _ => None,
        }
    }

    /// 1-based position on the path, if the step is on it.
    pub fn position_in(self, solution: Option<SolutionType>) -> Option<usize> {
        path(solution).iter().position(|s| *s == self).map(|i| i + 1)
    }

    pub fn next_in(self, solution: Option<SolutionType>) -> Option<Step> {
        let steps = path(solution);
        let i = steps.iter().position(|s| *s == self)?;
        steps.get(i + 1).copied()
    }

    pub fn prev_in(self, solution: Option<SolutionType>) -> Option<Step> {
        let steps = path(solution);
        let i = steps.iter().position(|s| *s == self)?;
        i.checked_sub(1).and_then(|p| steps.get(p).copied())
    }

    pub fn is_terminal(self, solution: Option<SolutionType>) -> bool {
        path(solution).last() == Some(&self)
    }

    /// The closest step on the new path at or before this one.
    pub fn rebase(self, solution: Option<SolutionType>) -> Step {
        if self.position_in(solution).is_some() {
            return self;
        }
        match self {
            // The cabinets step is the only one missing from a path.
            Step::Cabinets => Step::Cables,
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk(solution: Option<SolutionType>) -> Vec<Step> {
        let mut out = vec![Step::ScreenInfo];
        let mut current = Step::ScreenInfo;
        while let Some(next) = current.next_in(solution) {
            out.push(next);
            current = next;
        }
        out
    }

    #[test]
    fn cabinet_solution_visits_five_steps() {
        assert_eq!(
            walk(Some(SolutionType::CabinetSolution)),
            vec![
                Step::ScreenInfo,
                Step::Cables,
                Step::Cabinets,
                Step::Modules,
                Step::Resolution
            ]
        );
        assert_eq!(
            Step::Modules.position_in(Some(SolutionType::CabinetSolution)),
            Some(4)
        );
    }

    #[test]
    fn module_solution_skips_cabinets() {
        let steps = walk(Some(SolutionType::ModuleSolution));
        assert_eq!(
            steps,
            vec![Step::ScreenInfo, Step::Cables, Step::Modules, Step::Resolution]
        );
        assert!(!steps.contains(&Step::Cabinets));
        assert_eq!(
            Step::Modules.position_in(Some(SolutionType::ModuleSolution)),
            Some(3)
        );
    }

    #[test]
    fn prev_stops_at_first_step() {
        assert_eq!(Step::ScreenInfo.prev_in(None), None);
        assert_eq!(
            Step::Modules.prev_in(Some(SolutionType::CabinetSolution)),
            Some(Step::Cabinets)
        );
        assert_eq!(
            Step::Modules.prev_in(Some(SolutionType::ModuleSolution)),
            Some(Step::Cables)
        );
    }

    #[test]
    fn rebase_moves_off_cabinets_for_module_path() {
        assert_eq!(
            Step::Cabinets.rebase(Some(SolutionType::ModuleSolution)),
            Step::Cables
        );
        assert_eq!(
            Step::Modules.rebase(Some(SolutionType::ModuleSolution)),
            Step::Modules
        );
    }

    #[test]
    fn resolution_is_terminal_on_both_paths() {
        for s in SolutionType::ALL {
            assert!(Step::Resolution.is_terminal(Some(s)));
            assert!(!Step::Modules.is_terminal(Some(s)));
        }
    }
}
