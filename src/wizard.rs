//! Wizard step machine: one step per analysis phase, forward motion gated.
//!
//! Gates are predicates over the live [`SessionState`], never cached
//! booleans: a gate that was satisfiable goes false again whenever upstream
//! state is invalidated, without any explicit wizard action.

use crate::session_state::SessionState;

/// The six wizard steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WizardStep {
    Upload,
    SelectRange,
    AutoPeaks,
    RefinePeaks,
    Segments,
    Download,
}

impl WizardStep {
    pub const ALL: [WizardStep; 6] = [
        WizardStep::Upload,
        WizardStep::SelectRange,
        WizardStep::AutoPeaks,
        WizardStep::RefinePeaks,
        WizardStep::Segments,
        WizardStep::Download,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            WizardStep::Upload => "Upload recording",
            WizardStep::SelectRange => "Select range",
            WizardStep::AutoPeaks => "Auto-detect peaks",
            WizardStep::RefinePeaks => "Refine peaks",
            WizardStep::Segments => "Derive segments",
            WizardStep::Download => "Download report",
        }
    }

    /// 1-based position for the step header.
    pub fn number(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).unwrap_or(0) + 1
    }

    fn next(&self) -> Option<WizardStep> {
        let i = Self::ALL.iter().position(|s| s == self)?;
        Self::ALL.get(i + 1).copied()
    }

    fn prev(&self) -> Option<WizardStep> {
        let i = Self::ALL.iter().position(|s| s == self)?;
        i.checked_sub(1).and_then(|i| Self::ALL.get(i)).copied()
    }

    /// Whether forward navigation out of this step is allowed right now.
    pub fn gate(&self, state: &SessionState, window_epsilon: f64) -> bool {
        match self {
            WizardStep::Upload => state.original().is_some_and(|d| !d.is_empty()),
            WizardStep::SelectRange => state.window_is_confirmed(window_epsilon),
            WizardStep::AutoPeaks => state.peaks_acknowledged(),
            WizardStep::RefinePeaks => !state.peaks().is_empty() && state.peaks_confirmed(),
            WizardStep::Segments => state.segments_derived(),
            WizardStep::Download => false,
        }
    }
}

/// The current position in the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WizardState {
    step: WizardStep,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            step: WizardStep::Upload,
        }
    }
}

impl WizardState {
    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn can_advance(&self, state: &SessionState, window_epsilon: f64) -> bool {
        self.step.next().is_some() && self.step.gate(state, window_epsilon)
    }

    pub fn can_go_back(&self) -> bool {
        self.step.prev().is_some()
    }

    /// Move forward one step if the current gate holds. Never skips a step.
    pub fn next(&mut self, state: &SessionState, window_epsilon: f64) -> bool {
        if !self.can_advance(state, window_epsilon) {
            return false;
        }
        if let Some(next) = self.step.next() {
            self.step = next;
            return true;
        }
        false
    }

    /// Move back one step; always permitted except from the first step.
    pub fn prev(&mut self) -> bool {
        if let Some(prev) = self.step.prev() {
            self.step = prev;
            return true;
        }
        false
    }
}
