//! Wizard step state machine.
//!
//! Drives a linear sequence of form steps, some of which are only enabled
//! when a matching service was selected earlier. The step sequence is a
//! declarative table of [`StepDescriptor`]s and all navigation goes
//! through the explicit [`WizardState::advance`] transition function —
//! there is no per-step conditional wiring.
//!
//! Invariants:
//! - forward navigation is gated on the current step's validity;
//! - a disabled step is vacuously valid and skipped in both directions;
//! - changing the service selection never leaves the cursor on a
//!   disabled step (auto-correction prefers the next enabled step, then
//!   the previous one);
//! - progress is `enabled completed steps / total enabled steps`, so it
//!   moves in both directions as services are toggled.
//!
//! All state is in-memory; discarding the value discards progress.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::WizardError;

/// Service lines a prospect can select; conditional steps key off these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceTag {
    Network,
    WebApp,
    Cloud,
    Mobile,
    SocialEngineering,
}

impl ServiceTag {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::WebApp => "web-app",
            Self::Cloud => "cloud",
            Self::Mobile => "mobile",
            Self::SocialEngineering => "social-engineering",
        }
    }
}

impl std::fmt::Display for ServiceTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A captured form value, as needed for step-validity checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Free text captured on blur.
    Text(String),
    /// A numeric count (hosts, applications, ...).
    Count(u32),
    /// A multi-select.
    Multi(Vec<String>),
    /// A checkbox.
    Flag(bool),
}

impl FieldValue {
    /// Whether the value satisfies a "required" constraint.
    #[must_use]
    pub fn is_present(&self) -> bool {
        match self {
            Self::Text(s) => !s.trim().is_empty(),
            Self::Count(n) => *n > 0,
            Self::Multi(v) => !v.is_empty(),
            Self::Flag(b) => *b,
        }
    }
}

/// One row of the declarative step table.
#[derive(Debug, Clone, Copy)]
pub struct StepDescriptor {
    /// Stable identifier, used as the field-namespace key.
    pub id: &'static str,
    /// Display title.
    pub title: &'static str,
    /// When set, the step is only enabled while this service is selected.
    pub condition: Option<ServiceTag>,
    /// Fields that must be present before forward navigation.
    pub required: &'static [&'static str],
    /// The terminal review step; edit mode returns here.
    pub summary: bool,
}

/// Step table for the needs-assessment wizard.
pub const NEEDS_ASSESSMENT_STEPS: &[StepDescriptor] = &[
    StepDescriptor {
        id: "contact",
        title: "Your details",
        condition: None,
        required: &["first_name", "last_name", "email"],
        summary: false,
    },
    StepDescriptor {
        id: "services",
        title: "Service needs",
        condition: None,
        required: &["service_types", "outcomes"],
        summary: false,
    },
    StepDescriptor {
        id: "network-scope",
        title: "Network scope",
        condition: Some(ServiceTag::Network),
        required: &["host_count"],
        summary: false,
    },
    StepDescriptor {
        id: "webapp-scope",
        title: "Web application scope",
        condition: Some(ServiceTag::WebApp),
        required: &["app_count", "environments"],
        summary: false,
    },
    StepDescriptor {
        id: "cloud-scope",
        title: "Cloud environment",
        condition: Some(ServiceTag::Cloud),
        required: &["providers"],
        summary: false,
    },
    StepDescriptor {
        id: "timeline",
        title: "Timeline and urgency",
        condition: None,
        required: &["urgency"],
        summary: false,
    },
    StepDescriptor {
        id: "summary",
        title: "Review and submit",
        condition: None,
        required: &[],
        summary: true,
    },
];

/// Step table for the client onboarding wizard.
pub const ONBOARDING_STEPS: &[StepDescriptor] = &[
    StepDescriptor {
        id: "company",
        title: "Company profile",
        condition: None,
        required: &["company_name", "company_size"],
        summary: false,
    },
    StepDescriptor {
        id: "engagement",
        title: "Engagement type",
        condition: None,
        required: &["service_types"],
        summary: false,
    },
    StepDescriptor {
        id: "cloud-access",
        title: "Cloud access",
        condition: Some(ServiceTag::Cloud),
        required: &["providers", "access_model"],
        summary: false,
    },
    StepDescriptor {
        id: "contacts",
        title: "Points of contact",
        condition: None,
        required: &["primary_contact"],
        summary: false,
    },
    StepDescriptor {
        id: "summary",
        title: "Review and confirm",
        condition: None,
        required: &[],
        summary: true,
    },
];

/// Navigation direction fed to [`WizardState::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Outcome of a navigation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Cursor moved to this step index.
    Moved(usize),
    /// The current step is invalid; forward navigation refused.
    Blocked(usize),
    /// No enabled step ahead — the caller should show the submit action.
    ShowSubmit,
    /// No enabled step behind — already at the first step.
    AtStart,
    /// Edit-mode "next": the edited section was saved and the cursor
    /// returned to the summary step.
    ReturnedToSummary(usize),
}

/// Per-session wizard state. All fields are in-memory; there is no
/// partial save.
#[derive(Debug, Clone)]
pub struct WizardState {
    steps: &'static [StepDescriptor],
    current: usize,
    selected: BTreeSet<ServiceTag>,
    completed: BTreeSet<usize>,
    values: HashMap<(usize, String), FieldValue>,
    editing: bool,
}

impl WizardState {
    /// Start a new session on the given step table, positioned at step 0.
    #[must_use]
    pub fn new(steps: &'static [StepDescriptor]) -> Self {
        Self {
            steps,
            current: 0,
            selected: BTreeSet::new(),
            completed: BTreeSet::new(),
            values: HashMap::new(),
            editing: false,
        }
    }

    /// The step table this session runs on.
    #[must_use]
    pub fn steps(&self) -> &'static [StepDescriptor] {
        self.steps
    }

    /// Current cursor position.
    #[must_use]
    pub const fn current_step(&self) -> usize {
        self.current
    }

    /// Whether the session is in summary edit mode.
    #[must_use]
    pub const fn is_editing(&self) -> bool {
        self.editing
    }

    /// Currently selected services.
    #[must_use]
    pub const fn selected_services(&self) -> &BTreeSet<ServiceTag> {
        &self.selected
    }

    /// A step is enabled when it has no condition or its condition tag is
    /// currently selected.
    #[must_use]
    pub fn is_step_enabled(&self, step: usize) -> bool {
        self.steps.get(step).is_some_and(|d| {
            d.condition.is_none_or(|tag| self.selected.contains(&tag))
        })
    }

    /// A disabled step is vacuously valid; an enabled step is valid when
    /// all its required fields are present.
    #[must_use]
    pub fn is_step_valid(&self, step: usize) -> bool {
        let Some(descriptor) = self.steps.get(step) else {
            return false;
        };
        if !self.is_step_enabled(step) {
            return true;
        }

        descriptor.required.iter().all(|field| {
            self.values
                .get(&(step, (*field).to_owned()))
                .is_some_and(FieldValue::is_present)
        })
    }

    /// First enabled step strictly after `from`, or `None` when the scan
    /// exhausts the table (the caller must treat that as "show submit").
    #[must_use]
    pub fn find_next_enabled(&self, from: usize) -> Option<usize> {
        (from.saturating_add(1)..self.steps.len()).find(|&i| self.is_step_enabled(i))
    }

    /// First enabled step strictly before `from`, or `None` at the start.
    #[must_use]
    pub fn find_previous_enabled(&self, from: usize) -> Option<usize> {
        (0..from).rev().find(|&i| self.is_step_enabled(i))
    }

    /// Record a field value for a step.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::OutOfRange`] for a step outside the table.
    pub fn set_field(
        &mut self,
        step: usize,
        field: &str,
        value: FieldValue,
    ) -> Result<(), WizardError> {
        if step >= self.steps.len() {
            return Err(WizardError::OutOfRange {
                index: step,
                len: self.steps.len(),
            });
        }
        self.values.insert((step, field.to_owned()), value);
        Ok(())
    }

    /// Read back a recorded field value.
    #[must_use]
    pub fn field(&self, step: usize, field: &str) -> Option<&FieldValue> {
        self.values.get(&(step, field.to_owned()))
    }

    /// Replace the service selection.
    ///
    /// Also mirrors the selection into the `service_types` field of the
    /// step that owns it (the first step requiring `service_types`), and
    /// re-navigates when the current step just became disabled: prefer
    /// the next enabled step, else the previous one.
    pub fn set_services(&mut self, services: impl IntoIterator<Item = ServiceTag>) {
        self.selected = services.into_iter().collect();

        if let Some(owner) = self
            .steps
            .iter()
            .position(|d| d.required.contains(&"service_types"))
        {
            let names: Vec<String> = self.selected.iter().map(|t| t.to_string()).collect();
            self.values
                .insert((owner, "service_types".to_owned()), FieldValue::Multi(names));
        }

        if !self.is_step_enabled(self.current) {
            self.current = self
                .find_next_enabled(self.current)
                .or_else(|| self.find_previous_enabled(self.current))
                .unwrap_or(0);
        }
    }

    /// Toggle a single service on or off, with the same auto-correction
    /// as [`Self::set_services`].
    pub fn toggle_service(&mut self, tag: ServiceTag) {
        let mut next = self.selected.clone();
        if !next.remove(&tag) {
            next.insert(tag);
        }
        self.set_services(next);
    }

    /// The explicit transition function.
    ///
    /// Forward: refuse while the current step is invalid; otherwise mark
    /// it completed and move to the next enabled step ([`Transition::ShowSubmit`]
    /// when none remains). In edit mode the cursor returns to the summary
    /// step instead of advancing linearly. Backward: move to the previous
    /// enabled step with no validity gate.
    pub fn advance(&mut self, direction: Direction) -> Transition {
        match direction {
            Direction::Forward => {
                if !self.is_step_valid(self.current) {
                    return Transition::Blocked(self.current);
                }
                self.completed.insert(self.current);

                if self.editing {
                    self.editing = false;
                    let summary = self.summary_index().unwrap_or(self.current);
                    self.current = summary;
                    return Transition::ReturnedToSummary(summary);
                }

                match self.find_next_enabled(self.current) {
                    Some(next) => {
                        self.current = next;
                        Transition::Moved(next)
                    }
                    None => Transition::ShowSubmit,
                }
            }
            Direction::Backward => match self.find_previous_enabled(self.current) {
                Some(prev) => {
                    self.current = prev;
                    Transition::Moved(prev)
                }
                None => Transition::AtStart,
            },
        }
    }

    /// Jump from the summary step to an already-completed section and
    /// flag edit mode. The next forward advance then returns to the
    /// summary instead of continuing linearly.
    ///
    /// # Errors
    ///
    /// Rejects the jump when not on the summary step, when the target is
    /// out of range or disabled, or when it was never completed.
    pub fn begin_edit(&mut self, step: usize) -> Result<(), WizardError> {
        if !self.steps.get(self.current).is_some_and(|d| d.summary) {
            return Err(WizardError::NotOnSummary);
        }
        if step >= self.steps.len() {
            return Err(WizardError::OutOfRange {
                index: step,
                len: self.steps.len(),
            });
        }
        if !self.is_step_enabled(step) {
            return Err(WizardError::StepDisabled { index: step });
        }
        if !self.completed.contains(&step) {
            return Err(WizardError::StepNotCompleted { index: step });
        }

        self.current = step;
        self.editing = true;
        Ok(())
    }

    /// Completion ratio in `[0, 1]`: enabled completed steps over total
    /// enabled steps. Toggling a service moves the denominator, so the
    /// value is not monotonic in step count alone.
    #[must_use]
    pub fn progress(&self) -> f32 {
        let total = (0..self.steps.len())
            .filter(|&i| self.is_step_enabled(i))
            .count();
        if total == 0 {
            return 0.0;
        }

        let done = self
            .completed
            .iter()
            .filter(|&&i| self.is_step_enabled(i))
            .count();

        #[allow(clippy::cast_precision_loss)]
        {
            done as f32 / total as f32
        }
    }

    /// Index of the summary step, if the table declares one.
    #[must_use]
    pub fn summary_index(&self) -> Option<usize> {
        self.steps.iter().position(|d| d.summary)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn filled_contact(w: &mut WizardState) {
        w.set_field(0, "first_name", FieldValue::Text("Ada".into())).unwrap();
        w.set_field(0, "last_name", FieldValue::Text("Lovelace".into())).unwrap();
        w.set_field(0, "email", FieldValue::Text("ada@example.com".into())).unwrap();
    }

    fn filled_services(w: &mut WizardState, tags: &[ServiceTag]) {
        w.set_services(tags.iter().copied());
        w.set_field(1, "outcomes", FieldValue::Multi(vec!["report".into()])).unwrap();
    }

    #[test]
    fn forward_blocked_until_step_valid() {
        let mut w = WizardState::new(NEEDS_ASSESSMENT_STEPS);
        assert_eq!(w.advance(Direction::Forward), Transition::Blocked(0));

        filled_contact(&mut w);
        assert_eq!(w.advance(Direction::Forward), Transition::Moved(1));
    }

    #[test]
    fn disabled_step_is_vacuously_valid_and_skipped() {
        let mut w = WizardState::new(NEEDS_ASSESSMENT_STEPS);
        filled_contact(&mut w);
        w.advance(Direction::Forward);
        filled_services(&mut w, &[ServiceTag::Cloud]);

        // Network (2) and web app (3) scopes are disabled: vacuously valid.
        assert!(!w.is_step_enabled(2));
        assert!(w.is_step_valid(2));
        assert!(!w.is_step_enabled(3));
        assert!(w.is_step_valid(3));

        // Forward skips straight from services (1) to cloud scope (4).
        assert_eq!(w.advance(Direction::Forward), Transition::Moved(4));
        // Backward skips them too.
        assert_eq!(w.advance(Direction::Backward), Transition::Moved(1));
    }

    #[test]
    fn exhausted_scan_means_show_submit() {
        let mut w = WizardState::new(NEEDS_ASSESSMENT_STEPS);
        filled_contact(&mut w);
        w.advance(Direction::Forward);
        filled_services(&mut w, &[ServiceTag::Network]);
        w.advance(Direction::Forward); // -> network scope
        w.set_field(2, "host_count", FieldValue::Count(250)).unwrap();
        w.advance(Direction::Forward); // -> timeline
        w.set_field(5, "urgency", FieldValue::Text("urgent".into())).unwrap();
        w.advance(Direction::Forward); // -> summary
        assert_eq!(w.current_step(), 6);

        assert_eq!(w.advance(Direction::Forward), Transition::ShowSubmit);
    }

    #[test]
    fn backward_from_first_step_reports_at_start() {
        let mut w = WizardState::new(NEEDS_ASSESSMENT_STEPS);
        assert_eq!(w.advance(Direction::Backward), Transition::AtStart);
    }

    #[test]
    fn deselecting_service_moves_cursor_off_dead_step() {
        let mut w = WizardState::new(NEEDS_ASSESSMENT_STEPS);
        filled_contact(&mut w);
        w.advance(Direction::Forward);
        filled_services(&mut w, &[ServiceTag::Network, ServiceTag::Cloud]);
        w.advance(Direction::Forward);
        assert_eq!(w.current_step(), 2); // network scope

        // Deselect network while sitting on its step.
        w.set_services([ServiceTag::Cloud]);
        assert_eq!(w.current_step(), 4); // nearest enabled: cloud scope
    }

    // Table whose final step is conditional, so auto-correction has no
    // enabled step ahead to land on.
    const TRAILING_CONDITIONAL: &[StepDescriptor] = &[
        StepDescriptor {
            id: "services",
            title: "Service needs",
            condition: None,
            required: &["service_types"],
            summary: false,
        },
        StepDescriptor {
            id: "network-scope",
            title: "Network scope",
            condition: Some(ServiceTag::Network),
            required: &["host_count"],
            summary: false,
        },
    ];

    #[test]
    fn auto_correction_falls_back_to_previous_step() {
        let mut w = WizardState::new(TRAILING_CONDITIONAL);
        w.set_services([ServiceTag::Network]);
        w.advance(Direction::Forward);
        assert_eq!(w.current_step(), 1);

        // No enabled step ahead of the dead one, so the cursor moves back.
        w.set_services([]);
        assert_eq!(w.current_step(), 0);
    }

    #[test]
    fn progress_denominator_tracks_enabled_steps() {
        let mut w = WizardState::new(NEEDS_ASSESSMENT_STEPS);
        filled_contact(&mut w);
        w.advance(Direction::Forward);

        // 4 base steps enabled, 1 completed.
        assert!((w.progress() - 1.0 / 4.0).abs() < f32::EPSILON);

        // Enabling a service grows the denominator: progress drops.
        filled_services(&mut w, &[ServiceTag::Network]);
        assert!((w.progress() - 1.0 / 5.0).abs() < f32::EPSILON);

        // Deselecting shrinks it back.
        w.set_services([]);
        assert!((w.progress() - 1.0 / 4.0).abs() < f32::EPSILON);
    }

    #[test]
    fn progress_never_exceeds_one() {
        let mut w = WizardState::new(NEEDS_ASSESSMENT_STEPS);
        filled_contact(&mut w);
        w.advance(Direction::Forward);
        filled_services(&mut w, &[ServiceTag::Network]);
        w.advance(Direction::Forward);
        w.set_field(2, "host_count", FieldValue::Count(10)).unwrap();
        w.advance(Direction::Forward);

        // The completed set contains the network step; disabling it must
        // not push the ratio past 1.
        w.set_services([]);
        assert!(w.progress() <= 1.0);
    }

    #[test]
    fn edit_mode_returns_to_summary() {
        let mut w = WizardState::new(ONBOARDING_STEPS);
        w.set_field(0, "company_name", FieldValue::Text("Example Ltd".into())).unwrap();
        w.set_field(0, "company_size", FieldValue::Text("11-50".into())).unwrap();
        w.advance(Direction::Forward);
        w.set_services([ServiceTag::Network]);
        w.advance(Direction::Forward); // cloud-access disabled -> contacts
        assert_eq!(w.current_step(), 3);
        w.set_field(3, "primary_contact", FieldValue::Text("ada@example.com".into())).unwrap();
        w.advance(Direction::Forward);
        assert_eq!(w.current_step(), 4); // summary

        w.begin_edit(0).unwrap();
        assert!(w.is_editing());
        assert_eq!(w.current_step(), 0);

        // "Next" in edit mode saves and returns to the summary.
        w.set_field(0, "company_name", FieldValue::Text("Example GmbH".into())).unwrap();
        assert_eq!(w.advance(Direction::Forward), Transition::ReturnedToSummary(4));
        assert!(!w.is_editing());
    }

    #[test]
    fn edit_mode_guards() {
        let mut w = WizardState::new(ONBOARDING_STEPS);
        // Not on summary yet.
        assert!(matches!(w.begin_edit(0), Err(WizardError::NotOnSummary)));

        w.set_field(0, "company_name", FieldValue::Text("x".into())).unwrap();
        w.set_field(0, "company_size", FieldValue::Text("1-10".into())).unwrap();
        w.advance(Direction::Forward);
        w.set_services([ServiceTag::Network]);
        w.advance(Direction::Forward);
        w.set_field(3, "primary_contact", FieldValue::Text("x@example.com".into())).unwrap();
        w.advance(Direction::Forward);

        // On summary: disabled and never-completed targets are rejected.
        assert!(matches!(w.begin_edit(2), Err(WizardError::StepDisabled { .. })));
        assert!(matches!(w.begin_edit(4), Err(WizardError::StepNotCompleted { .. })));
        assert!(matches!(w.begin_edit(99), Err(WizardError::OutOfRange { .. })));
    }

    #[test]
    fn set_services_mirrors_multi_select_field() {
        let mut w = WizardState::new(NEEDS_ASSESSMENT_STEPS);
        w.set_services([ServiceTag::WebApp, ServiceTag::Network]);

        let mirrored = w.field(1, "service_types");
        assert!(
            matches!(mirrored, Some(FieldValue::Multi(names))
                if names.contains(&"network".to_owned())
                    && names.contains(&"web-app".to_owned())
                    && names.len() == 2),
            "service_types not mirrored: {mirrored:?}"
        );
    }

    #[test]
    fn toggle_service_round_trips() {
        let mut w = WizardState::new(NEEDS_ASSESSMENT_STEPS);
        w.toggle_service(ServiceTag::Mobile);
        assert!(w.selected_services().contains(&ServiceTag::Mobile));
        w.toggle_service(ServiceTag::Mobile);
        assert!(w.selected_services().is_empty());
    }

    #[test]
    fn service_needs_step_requires_selection_and_outcome() {
        let mut w = WizardState::new(NEEDS_ASSESSMENT_STEPS);
        assert!(!w.is_step_valid(1));

        w.set_services([ServiceTag::Network]);
        assert!(!w.is_step_valid(1)); // still no outcome

        w.set_field(1, "outcomes", FieldValue::Multi(vec!["remediation-plan".into()]))
            .unwrap();
        assert!(w.is_step_valid(1));

        // Empty multi-select does not count as present.
        w.set_field(1, "outcomes", FieldValue::Multi(Vec::new())).unwrap();
        assert!(!w.is_step_valid(1));
    }
}
