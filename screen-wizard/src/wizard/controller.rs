// Wizard controller
// Owns the step pointer, the draft and the error map for one registration flow. Everything is
// synchronous except the call to the registration service, which is split into
// begin_submit / dispatch / complete_submit so a front end can run it off the UI thread.

use crate::api::registration::{RegistrationError, ScreenRegistrationService};
use crate::models::draft::{
    CabinetEntry, CabinetModule, ModuleEntry, ScreenDraft, Solution, SolutionType,
};
use crate::models::field_path::{Collection, EntryField, FieldPath, ScalarField};
use crate::models::payload::SubmissionPayload;
use crate::models::responses::ScreenRecord;
use crate::wizard::coercion::{
    coerce_decimal, coerce_file, coerce_flag, coerce_integer, coerce_screen_type,
    coerce_solution_type, coerce_text, RawValue,
};
use crate::wizard::collection::{add_entry, remove_entry, replace_entry, Rejected};
use crate::wizard::resolution::{summarize, ResolutionSummary};
use crate::wizard::step::{self, Step};
use crate::wizard::validator::{validate, ErrorMap};
use crate::wizard::assembler::assemble;

use log::{error, info, warn};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Submit is only available on the last step")]
    NotOnFinalStep,
    #[error("A submission is already in progress")]
    AlreadySubmitting,
    #[error("{count} field(s) need attention before submitting")]
    Invalid { count: usize },
    #[error(transparent)]
    Registration(#[from] RegistrationError),
    #[error("Could not prepare the submission: {0}")]
    Encoding(String),
    #[error("No submission is waiting for this result")]
    NotInFlight,
}

/// Assembled payload waiting to be handed to the registration service.
#[derive(Debug)]
pub struct PendingSubmission {
    correlation_id: Uuid,
    payload: SubmissionPayload,
}

/// Outcome of one dispatch, to be fed back into [`WizardController::complete_submit`].
#[derive(Debug)]
pub struct SubmissionResult {
    pub correlation_id: Uuid,
    pub outcome: Result<ScreenRecord, RegistrationError>,
}

impl PendingSubmission {
    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    pub fn payload(&self) -> &SubmissionPayload {
        &self.payload
    }

    pub async fn dispatch(self, service: &dyn ScreenRegistrationService) -> SubmissionResult {
        info!(
            "[PHASE: submit] [STEP: dispatch] Sending screen '{}' ({}) (correlation_id={})",
            self.payload.name,
            self.payload.solution_type.as_wire(),
            self.correlation_id
        );
        let outcome = service.create_screen(&self.payload).await;
        SubmissionResult {
            correlation_id: self.correlation_id,
            outcome,
        }
    }
}

/// Collections for the solution type that is not currently selected.
#[derive(Debug, Clone)]
struct ParkedLayouts {
    cabinets: Option<Vec<CabinetEntry>>,
    modules: Option<Vec<ModuleEntry>>,
}

impl Default for ParkedLayouts {
    fn default() -> Self {
        Self {
            cabinets: Some(vec![CabinetEntry::default()]),
            modules: Some(vec![ModuleEntry::default()]),
        }
    }
}

pub struct WizardController {
    service: Arc<dyn ScreenRegistrationService>,
    step: Step,
    draft: ScreenDraft,
    parked: ParkedLayouts,
    errors: ErrorMap,
    notice: Option<String>,
    in_flight: Option<Uuid>,
}

impl WizardController {
    pub fn new(service: Arc<dyn ScreenRegistrationService>) -> Self {
        Self {
            service,
            step: Step::ScreenInfo,
            draft: ScreenDraft::default(),
            parked: ParkedLayouts::default(),
            errors: ErrorMap::new(),
            notice: None,
            in_flight: None,
        }
    }

    // =========================
    // Read access
    // =========================

    pub fn step(&self) -> Step {
        self.step
    }

    /// 1-based position of the current step and the length of the active path.
    pub fn step_number(&self) -> (usize, usize) {
        let solution = self.draft.solution_type();
        (
            self.step.position_in(solution).unwrap_or(1),
            step::path(solution).len(),
        )
    }

    pub fn is_last_step(&self) -> bool {
        self.step.is_terminal(self.draft.solution_type())
    }

    pub fn draft(&self) -> &ScreenDraft {
        &self.draft
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    pub fn error_for(&self, path: &FieldPath) -> Option<&str> {
        self.errors.get(path).map(String::as_str)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn service(&self) -> Arc<dyn ScreenRegistrationService> {
        Arc::clone(&self.service)
    }

    /// Cabinet list, whether or not the cabinet solution is selected.
    pub fn cabinets(&self) -> &[CabinetEntry] {
        match &self.draft.solution {
            Some(Solution::Cabinet(list)) => list,
            _ => self.parked.cabinets.as_deref().unwrap_or(&[]),
        }
    }

    /// Top-level module list, whether or not the module solution is selected.
    pub fn modules(&self) -> &[ModuleEntry] {
        match &self.draft.solution {
            Some(Solution::Module(list)) => list,
            _ => self.parked.modules.as_deref().unwrap_or(&[]),
        }
    }

    pub fn resolution(&self) -> Option<ResolutionSummary> {
        summarize(&self.draft)
    }

    // =========================
    // Editing
    // =========================

    /// Store a raw value at `path` and clear that field's error. Returns false when the path
    /// does not address an existing field (out-of-range index, or a field the entry lacks).
    pub fn change(&mut self, path: FieldPath, raw: RawValue) -> bool {
        let applied = match path {
            FieldPath::Scalar(field) => self.change_scalar(field, &raw),
            FieldPath::Indexed {
                collection,
                index,
                field,
            } => self.change_entry(collection, index, field, &raw),
        };
        if applied {
            self.errors.remove(&path);
        } else {
            warn!(
                "[PHASE: wizard] [STEP: change] Ignored edit of {} (step={})",
                path,
                self.step.title()
            );
        }
        applied
    }

    fn change_scalar(&mut self, field: ScalarField, raw: &RawValue) -> bool {
        match field {
            ScalarField::Name => self.draft.info.name = coerce_text(raw),
            ScalarField::ScreenType => self.draft.info.screen_type = coerce_screen_type(raw),
            ScalarField::Location => self.draft.info.location = coerce_text(raw),
            ScalarField::PixelScreen => self.draft.info.pixel_screen = coerce_text(raw),
            ScalarField::Description => self.draft.info.description = coerce_text(raw),
            ScalarField::SolutionType => self.switch_solution(coerce_solution_type(raw)),
            ScalarField::ComponentType(kind) => {
                self.draft.components.get_mut(kind).type_name = coerce_text(raw)
            }
            ScalarField::ComponentQuantity(kind) => {
                self.draft.components.get_mut(kind).quantity = coerce_integer(raw)
            }
            ScalarField::SpareQuantity(kind) => {
                if !kind.has_spare() {
                    return false;
                }
                self.draft.components.get_mut(kind).spare_quantity = coerce_integer(raw)
            }
            ScalarField::File(slot) => self.draft.attachments.set(slot, coerce_file(raw)),
        }
        true
    }

    fn change_entry(
        &mut self,
        collection: Collection,
        index: usize,
        field: EntryField,
        raw: &RawValue,
    ) -> bool {
        let result = match collection {
            Collection::Cabinets => {
                edit_entry(self.cabinets_mut(), index, |c| set_cabinet_field(c, field, raw))
            }
            Collection::CabinetModules => edit_entry(self.cabinets_mut(), index, |c| {
                set_cabinet_module_field(&mut c.module, field, raw)
            }),
            Collection::Modules => {
                edit_entry(self.modules_mut(), index, |m| set_module_field(m, field, raw))
            }
        };
        match result {
            Ok(applied) => applied,
            Err(e) => {
                warn!("[PHASE: wizard] [STEP: change] {}", e);
                false
            }
        }
    }

    fn cabinets_mut(&mut self) -> &mut Vec<CabinetEntry> {
        match &mut self.draft.solution {
            Some(Solution::Cabinet(list)) => list,
            _ => self
                .parked
                .cabinets
                .get_or_insert_with(|| vec![CabinetEntry::default()]),
        }
    }

    fn modules_mut(&mut self) -> &mut Vec<ModuleEntry> {
        match &mut self.draft.solution {
            Some(Solution::Module(list)) => list,
            _ => self
                .parked
                .modules
                .get_or_insert_with(|| vec![ModuleEntry::default()]),
        }
    }

    /// Park the active collection, activate the one for `next`, and move the step pointer
    /// back onto the new path if needed.
    fn switch_solution(&mut self, next: Option<SolutionType>) {
        let current = self.draft.solution_type();
        if current == next {
            return;
        }

        match self.draft.solution.take() {
            Some(Solution::Cabinet(list)) => self.parked.cabinets = Some(list),
            Some(Solution::Module(list)) => self.parked.modules = Some(list),
            None => {}
        }

        self.draft.solution = next.map(|kind| match kind {
            SolutionType::CabinetSolution => Solution::Cabinet(
                self.parked
                    .cabinets
                    .take()
                    .unwrap_or_else(|| vec![CabinetEntry::default()]),
            ),
            SolutionType::ModuleSolution => Solution::Module(
                self.parked
                    .modules
                    .take()
                    .unwrap_or_else(|| vec![ModuleEntry::default()]),
            ),
        });

        // Errors on the old branch no longer describe anything on screen.
        self.errors
            .retain(|path, _| matches!(path, FieldPath::Scalar(_)));

        let rebased = self.step.rebase(next);
        info!(
            "[PHASE: wizard] [STEP: solution] Solution {} -> {} (step {} -> {})",
            current.map(|s| s.as_wire()).unwrap_or("none"),
            next.map(|s| s.as_wire()).unwrap_or("none"),
            self.step.title(),
            rebased.title()
        );
        self.step = rebased;
    }

    // =========================
    // Collections
    // =========================

    pub fn add_cabinet(&mut self) {
        let list = self.cabinets_mut();
        *list = add_entry(list, CabinetEntry::default);
        self.notice = None;
    }

    pub fn remove_cabinet(&mut self, index: usize) -> Result<(), Rejected> {
        let outcome = remove_entry(self.cabinets(), index);
        self.apply_removal(Collection::Cabinets, outcome, |c, list| *c.cabinets_mut() = list)
    }

    pub fn add_module(&mut self) {
        let list = self.modules_mut();
        *list = add_entry(list, ModuleEntry::default);
        self.notice = None;
    }

    pub fn remove_module(&mut self, index: usize) -> Result<(), Rejected> {
        let outcome = remove_entry(self.modules(), index);
        self.apply_removal(Collection::Modules, outcome, |c, list| *c.modules_mut() = list)
    }

    fn apply_removal<T>(
        &mut self,
        collection: Collection,
        outcome: Result<Vec<T>, Rejected>,
        store: impl FnOnce(&mut Self, Vec<T>),
    ) -> Result<(), Rejected> {
        match outcome {
            Ok(list) => {
                store(self, list);
                // Indices shifted; stale messages would point at the wrong entry.
                self.errors.retain(|path, _| !path.belongs_to(collection));
                self.notice = None;
                Ok(())
            }
            Err(rejected) => {
                warn!(
                    "[PHASE: wizard] [STEP: collection] Refused to remove {}: {}",
                    collection.noun(),
                    rejected
                );
                self.notice = Some(rejected.to_string());
                Err(rejected)
            }
        }
    }

    // =========================
    // Navigation
    // =========================

    /// Validate the current step and advance when it is clean. Returns whether the pointer
    /// moved.
    pub fn next(&mut self) -> bool {
        let errors = validate(self.step, &self.draft);
        if !errors.is_empty() {
            info!(
                "[PHASE: wizard] [STEP: next] {} field error(s) on {}",
                errors.len(),
                self.step.title()
            );
            self.errors = errors;
            return false;
        }

        self.errors.clear();
        match self.step.next_in(self.draft.solution_type()) {
            Some(next) => {
                info!(
                    "[PHASE: wizard] [STEP: next] {} -> {}",
                    self.step.title(),
                    next.title()
                );
                self.step = next;
                true
            }
            None => false,
        }
    }

    /// Step back without validating; errors of the step being left are dropped.
    pub fn back(&mut self) {
        if let Some(prev) = self.step.prev_in(self.draft.solution_type()) {
            self.step = prev;
        }
        self.errors.clear();
    }

    // =========================
    // Submission
    // =========================

    /// Validate every step on the active path and assemble the payload. On success the
    /// controller is marked as submitting until [`complete_submit`](Self::complete_submit).
    pub fn begin_submit(&mut self) -> Result<PendingSubmission, SubmitError> {
        if self.in_flight.is_some() {
            warn!("[PHASE: submit] [STEP: begin] Ignored submit while one is outstanding");
            return Err(SubmitError::AlreadySubmitting);
        }
        if !self.is_last_step() {
            return Err(SubmitError::NotOnFinalStep);
        }

        for &step in step::path(self.draft.solution_type()) {
            let errors = validate(step, &self.draft);
            if !errors.is_empty() {
                let count = errors.len();
                info!(
                    "[PHASE: submit] [STEP: validate] {} error(s) on {}, moving there",
                    count,
                    step.title()
                );
                self.step = step;
                self.errors = errors;
                return Err(SubmitError::Invalid { count });
            }
        }

        let payload = assemble(&self.draft).map_err(|e| {
            error!("[PHASE: submit] [STEP: assemble] {}", e);
            SubmitError::Encoding(e.to_string())
        })?;

        let correlation_id = Uuid::new_v4();
        self.in_flight = Some(correlation_id);
        self.errors.clear();
        self.notice = None;
        info!(
            "[PHASE: submit] [STEP: begin] Payload assembled (correlation_id={})",
            correlation_id
        );

        Ok(PendingSubmission {
            correlation_id,
            payload,
        })
    }

    /// Apply the outcome of a dispatch. Success resets the wizard; failure keeps the draft
    /// and surfaces the message as the notice.
    pub fn complete_submit(&mut self, result: SubmissionResult) -> Result<ScreenRecord, SubmitError> {
        if self.in_flight != Some(result.correlation_id) {
            warn!(
                "[PHASE: submit] [STEP: complete] Dropped result for unknown submission (correlation_id={})",
                result.correlation_id
            );
            return Err(SubmitError::NotInFlight);
        }
        self.in_flight = None;

        match result.outcome {
            Ok(record) => {
                info!(
                    "[PHASE: submit] [STEP: complete] Screen registered id={} (correlation_id={})",
                    record.id, result.correlation_id
                );
                self.reset();
                self.notice = Some(format!(
                    "Screen '{}' registered (id {}).",
                    record.name, record.id
                ));
                Ok(record)
            }
            Err(e) => {
                error!(
                    "[PHASE: submit] [STEP: complete] Registration failed: {} (correlation_id={})",
                    e, result.correlation_id
                );
                self.notice = Some(e.to_string());
                Err(SubmitError::Registration(e))
            }
        }
    }

    pub async fn submit(&mut self) -> Result<ScreenRecord, SubmitError> {
        let pending = self.begin_submit()?;
        let service = self.service();
        let result = pending.dispatch(service.as_ref()).await;
        self.complete_submit(result)
    }

    /// Back to an empty draft on the first step.
    pub fn reset(&mut self) {
        self.step = Step::ScreenInfo;
        self.draft = ScreenDraft::default();
        self.parked = ParkedLayouts::default();
        self.errors.clear();
        self.notice = None;
    }
}

// =========================
// Entry field setters
// =========================

fn edit_entry<T: Clone>(
    list: &mut Vec<T>,
    index: usize,
    edit: impl FnOnce(&mut T) -> bool,
) -> Result<bool, Rejected> {
    let mut entry = list.get(index).cloned().ok_or(Rejected::OutOfRange {
        index,
        len: list.len(),
    })?;
    if !edit(&mut entry) {
        return Ok(false);
    }
    *list = replace_entry(list, index, entry)?;
    Ok(true)
}

fn set_module_field(m: &mut ModuleEntry, field: EntryField, raw: &RawValue) -> bool {
    match field {
        EntryField::WidthQuantity => m.width_quantity = coerce_integer(raw),
        EntryField::HeightQuantity => m.height_quantity = coerce_integer(raw),
        EntryField::Height => m.height = coerce_decimal(raw),
        EntryField::Width => m.width = coerce_decimal(raw),
        EntryField::ModuleBatchNumber => m.module_batch_number = coerce_text(raw),
        EntryField::IsWidth => m.is_width = coerce_flag(raw),
        EntryField::IsHeight => m.is_height = coerce_flag(raw),
        EntryField::CabinetName => return false,
    }
    true
}

fn set_cabinet_module_field(m: &mut CabinetModule, field: EntryField, raw: &RawValue) -> bool {
    match field {
        EntryField::WidthQuantity => m.width_quantity = coerce_integer(raw),
        EntryField::HeightQuantity => m.height_quantity = coerce_integer(raw),
        EntryField::Height => m.height = coerce_decimal(raw),
        EntryField::Width => m.width = coerce_decimal(raw),
        EntryField::ModuleBatchNumber => m.module_batch_number = coerce_text(raw),
        EntryField::CabinetName | EntryField::IsWidth | EntryField::IsHeight => return false,
    }
    true
}

fn set_cabinet_field(c: &mut CabinetEntry, field: EntryField, raw: &RawValue) -> bool {
    match field {
        EntryField::CabinetName => c.cabinet_name = coerce_text(raw),
        EntryField::WidthQuantity => c.width_quantity = coerce_integer(raw),
        EntryField::HeightQuantity => c.height_quantity = coerce_integer(raw),
        EntryField::Height => c.height = coerce_decimal(raw),
        EntryField::Width => c.width = coerce_decimal(raw),
        EntryField::IsWidth => c.is_width = coerce_flag(raw),
        EntryField::IsHeight => c.is_height = coerce_flag(raw),
        EntryField::ModuleBatchNumber => return false,
    }
    true
}
