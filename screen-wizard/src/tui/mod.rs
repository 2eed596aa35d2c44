//! Terminal UI for the screen registration wizard.
//!
//! Layout:
//! - Centered window titled "Screen Registration"
//! - Left panel listing the steps of the active path
//! - Main panel rendering the current step as a form
//! - Bottom button row: [ Back ] [ Next ] [ Cancel ] (Next becomes Submit on the last step)
//! - Modal confirmations (Cancel, submission outcome)
//!
//! Note: Logging is file-only in TUI mode (stdout logging is disabled) to avoid corrupting the terminal UI.

use crate::api::registration::{
    HttpRegistrationService, RegistrationError, ScreenRegistrationService,
};
use crate::models::draft::{
    Attachment, ComponentKind, FileSlot, ScreenType, SolutionType,
};
use crate::models::field_path::{Collection, EntryField, FieldPath, ScalarField};
use crate::utils::settings::Settings;
use crate::wizard::coercion::RawValue;
use crate::wizard::controller::{SubmissionResult, WizardController};
use crate::wizard::step::{self, Step};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use log::{info, warn};
use ratatui::backend::{CrosstermBackend, TestBackend};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::path::Path;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const LABEL_WIDTH: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ButtonFocus {
    Back,
    Next,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Modal {
    ConfirmCancel,
    Message { title: String, body: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FocusTarget {
    Field(usize),
    Button(ButtonFocus),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    ScreenType,
    SolutionType,
}

impl Choice {
    /// Wire values in display order.
    fn options(self) -> Vec<&'static str> {
        match self {
            Choice::ScreenType => ScreenType::ALL.iter().map(|t| t.as_wire()).collect(),
            Choice::SolutionType => SolutionType::ALL.iter().map(|t| t.as_wire()).collect(),
        }
    }

    fn current(self, wizard: &WizardController) -> Option<&'static str> {
        match self {
            Choice::ScreenType => wizard.draft().info.screen_type.map(|t| t.as_wire()),
            Choice::SolutionType => wizard.draft().solution_type().map(|t| t.as_wire()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowKind {
    Text,
    Choice(Choice),
    Flag,
    File(FileSlot),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Row {
    label: String,
    path: FieldPath,
    kind: RowKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum FormItem {
    Header(String),
    Field(Row),
}

struct TextInput {
    value: String,
    cursor: usize,
}

impl TextInput {
    fn new(value: impl Into<String>) -> Self {
        let v = value.into();
        Self {
            cursor: v.len(),
            value: v,
        }
    }

    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char(c) => {
                self.value.insert(self.cursor, c);
                self.cursor += c.len_utf8();
                true
            }
            KeyCode::Backspace => {
                if let Some((idx, _)) = self.value[..self.cursor].char_indices().next_back() {
                    self.value.remove(idx);
                    self.cursor = idx;
                }
                true
            }
            KeyCode::Delete => {
                if self.cursor < self.value.len() {
                    self.value.remove(self.cursor);
                }
                true
            }
            KeyCode::Left => {
                if let Some((idx, _)) = self.value[..self.cursor].char_indices().next_back() {
                    self.cursor = idx;
                }
                true
            }
            KeyCode::Right => {
                if let Some(c) = self.value[self.cursor..].chars().next() {
                    self.cursor += c.len_utf8();
                }
                true
            }
            KeyCode::Home => {
                self.cursor = 0;
                true
            }
            KeyCode::End => {
                self.cursor = self.value.len();
                true
            }
            _ => false,
        }
    }

    fn display_with_cursor(&self) -> String {
        let mut s = self.value.clone();
        s.insert(self.cursor, '|');
        s
    }
}

enum UiMsg {
    SubmitFinished(SubmissionResult),
}

struct WizardState {
    wizard: WizardController,
    focus: FocusTarget,
    /// Text buffer of the focused text or file row.
    editor: Option<(FieldPath, TextInput)>,
    modal: Option<Modal>,
    quit: bool,
}

impl WizardState {
    fn new(wizard: WizardController) -> Self {
        let mut state = Self {
            wizard,
            focus: FocusTarget::Field(0),
            editor: None,
            modal: None,
            quit: false,
        };
        sync_editor(&mut state);
        state
    }
}

// =========================
// Form layout per step
// =========================

fn text_row(label: impl Into<String>, path: FieldPath) -> FormItem {
    FormItem::Field(Row {
        label: label.into(),
        path,
        kind: RowKind::Text,
    })
}

fn flag_row(label: impl Into<String>, path: FieldPath) -> FormItem {
    FormItem::Field(Row {
        label: label.into(),
        path,
        kind: RowKind::Flag,
    })
}

fn component_rows(items: &mut Vec<FormItem>, kinds: &[ComponentKind]) {
    for &kind in kinds {
        items.push(FormItem::Header(kind.label().to_string()));
        items.push(text_row("Type", ScalarField::ComponentType(kind).into()));
        items.push(text_row("Quantity", ScalarField::ComponentQuantity(kind).into()));
        if kind.has_spare() {
            items.push(text_row("Spare quantity", ScalarField::SpareQuantity(kind).into()));
        }
    }
}

fn dimension_rows(
    items: &mut Vec<FormItem>,
    at: fn(usize, EntryField) -> FieldPath,
    index: usize,
    fields: &[EntryField],
) {
    for &field in fields {
        let path = at(index, field);
        match field {
            EntryField::IsWidth | EntryField::IsHeight => items.push(flag_row(field.label(), path)),
            _ => items.push(text_row(field.label(), path)),
        }
    }
}

fn form_items(wizard: &WizardController) -> Vec<FormItem> {
    let mut items = Vec::new();
    match wizard.step() {
        Step::ScreenInfo => {
            items.push(text_row("Name", ScalarField::Name.into()));
            items.push(FormItem::Field(Row {
                label: "Screen type".to_string(),
                path: ScalarField::ScreenType.into(),
                kind: RowKind::Choice(Choice::ScreenType),
            }));
            items.push(text_row("Location (Google Maps link)", ScalarField::Location.into()));
            items.push(text_row("Pixel screen", ScalarField::PixelScreen.into()));
            items.push(text_row("Description", ScalarField::Description.into()));
            items.push(FormItem::Field(Row {
                label: "Solution type".to_string(),
                path: ScalarField::SolutionType.into(),
                kind: RowKind::Choice(Choice::SolutionType),
            }));
            items.push(FormItem::Header("Files (type a path, Enter to load)".to_string()));
            for slot in FileSlot::ALL {
                items.push(FormItem::Field(Row {
                    label: slot.label().to_string(),
                    path: ScalarField::File(slot).into(),
                    kind: RowKind::File(slot),
                }));
            }
            component_rows(&mut items, &ComponentKind::HARDWARE);
        }
        Step::Cables => component_rows(&mut items, &ComponentKind::CABLES),
        Step::Cabinets => {
            for i in 0..wizard.cabinets().len() {
                items.push(FormItem::Header(format!("Cabinet {}", i + 1)));
                dimension_rows(
                    &mut items,
                    FieldPath::cabinet,
                    i,
                    &[
                        EntryField::CabinetName,
                        EntryField::WidthQuantity,
                        EntryField::HeightQuantity,
                        EntryField::Width,
                        EntryField::Height,
                        EntryField::IsWidth,
                        EntryField::IsHeight,
                    ],
                );
            }
        }
        Step::Modules => match wizard.draft().solution_type() {
            Some(SolutionType::CabinetSolution) => {
                for (i, cabinet) in wizard.cabinets().iter().enumerate() {
                    let name = cabinet.cabinet_name.trim();
                    items.push(FormItem::Header(if name.is_empty() {
                        format!("Module of cabinet {}", i + 1)
                    } else {
                        format!("Module of cabinet {} ({})", i + 1, name)
                    }));
                    dimension_rows(
                        &mut items,
                        FieldPath::cabinet_module,
                        i,
                        &[
                            EntryField::WidthQuantity,
                            EntryField::HeightQuantity,
                            EntryField::Width,
                            EntryField::Height,
                            EntryField::ModuleBatchNumber,
                        ],
                    );
                }
            }
            _ => {
                for i in 0..wizard.modules().len() {
                    items.push(FormItem::Header(format!("Module {}", i + 1)));
                    dimension_rows(
                        &mut items,
                        FieldPath::module,
                        i,
                        &[
                            EntryField::WidthQuantity,
                            EntryField::HeightQuantity,
                            EntryField::Width,
                            EntryField::Height,
                            EntryField::ModuleBatchNumber,
                            EntryField::IsWidth,
                            EntryField::IsHeight,
                        ],
                    );
                }
            }
        },
        Step::Resolution => {}
    }
    items
}

fn field_rows(wizard: &WizardController) -> Vec<Row> {
    form_items(wizard)
        .into_iter()
        .filter_map(|item| match item {
            FormItem::Field(row) => Some(row),
            FormItem::Header(_) => None,
        })
        .collect()
}

fn focused_row(state: &WizardState) -> Option<Row> {
    match state.focus {
        FocusTarget::Field(i) => field_rows(&state.wizard).into_iter().nth(i),
        FocusTarget::Button(_) => None,
    }
}

// =========================
// Reading values back out of the draft
// =========================

fn check_box(on: bool) -> &'static str {
    if on {
        "[x]"
    } else {
        "[ ]"
    }
}

fn flag_value(wizard: &WizardController, path: &FieldPath) -> bool {
    let FieldPath::Indexed {
        collection,
        index,
        field,
    } = *path
    else {
        return false;
    };
    match collection {
        Collection::Modules => wizard.modules().get(index).map(|m| match field {
            EntryField::IsWidth => m.is_width,
            EntryField::IsHeight => m.is_height,
            _ => false,
        }),
        Collection::Cabinets => wizard.cabinets().get(index).map(|c| match field {
            EntryField::IsWidth => c.is_width,
            EntryField::IsHeight => c.is_height,
            _ => false,
        }),
        Collection::CabinetModules => None,
    }
    .unwrap_or(false)
}

fn entry_text(wizard: &WizardController, collection: Collection, index: usize, field: EntryField) -> String {
    let text = match collection {
        Collection::Modules => wizard.modules().get(index).map(|m| match field {
            EntryField::WidthQuantity => m.width_quantity.display(),
            EntryField::HeightQuantity => m.height_quantity.display(),
            EntryField::Height => m.height.display(),
            EntryField::Width => m.width.display(),
            EntryField::ModuleBatchNumber => m.module_batch_number.clone(),
            _ => String::new(),
        }),
        Collection::Cabinets => wizard.cabinets().get(index).map(|c| match field {
            EntryField::CabinetName => c.cabinet_name.clone(),
            EntryField::WidthQuantity => c.width_quantity.display(),
            EntryField::HeightQuantity => c.height_quantity.display(),
            EntryField::Height => c.height.display(),
            EntryField::Width => c.width.display(),
            _ => String::new(),
        }),
        Collection::CabinetModules => wizard.cabinets().get(index).map(|c| {
            let m = &c.module;
            match field {
                EntryField::WidthQuantity => m.width_quantity.display(),
                EntryField::HeightQuantity => m.height_quantity.display(),
                EntryField::Height => m.height.display(),
                EntryField::Width => m.width.display(),
                EntryField::ModuleBatchNumber => m.module_batch_number.clone(),
                _ => String::new(),
            }
        }),
    };
    text.unwrap_or_default()
}

fn field_text(wizard: &WizardController, path: &FieldPath) -> String {
    let draft = wizard.draft();
    match *path {
        FieldPath::Scalar(field) => match field {
            ScalarField::Name => draft.info.name.clone(),
            ScalarField::Location => draft.info.location.clone(),
            ScalarField::PixelScreen => draft.info.pixel_screen.clone(),
            ScalarField::Description => draft.info.description.clone(),
            ScalarField::ScreenType => draft
                .info
                .screen_type
                .map(|t| t.label().to_string())
                .unwrap_or_default(),
            ScalarField::SolutionType => draft
                .solution_type()
                .map(|t| t.label().to_string())
                .unwrap_or_default(),
            ScalarField::ComponentType(kind) => draft.components.get(kind).type_name.clone(),
            ScalarField::ComponentQuantity(kind) => draft.components.get(kind).quantity.display(),
            ScalarField::SpareQuantity(kind) => {
                draft.components.get(kind).spare_quantity.display()
            }
            ScalarField::File(slot) => draft
                .attachments
                .get(slot)
                .map(|f| format!("{} ({} bytes)", f.file_name, f.len()))
                .unwrap_or_default(),
        },
        FieldPath::Indexed {
            collection,
            index,
            field,
        } => entry_text(wizard, collection, index, field),
    }
}

// =========================
// Focus and editing
// =========================

/// Keep the text buffer in step with the focused row.
fn sync_editor(state: &mut WizardState) {
    let wanted = focused_row(state).filter(|r| matches!(r.kind, RowKind::Text | RowKind::File(_)));
    match wanted {
        Some(row) => {
            if state.editor.as_ref().map(|(p, _)| *p) != Some(row.path) {
                let initial = match row.kind {
                    RowKind::File(_) => String::new(),
                    _ => field_text(&state.wizard, &row.path),
                };
                state.editor = Some((row.path, TextInput::new(initial)));
            }
        }
        None => state.editor = None,
    }
}

fn button_order() -> [ButtonFocus; 3] {
    [ButtonFocus::Back, ButtonFocus::Next, ButtonFocus::Cancel]
}

fn move_focus(state: &mut WizardState, delta: isize) {
    let fields = field_rows(&state.wizard).len();
    let total = fields + button_order().len();
    let current = match state.focus {
        FocusTarget::Field(i) => i.min(fields.saturating_sub(1)),
        FocusTarget::Button(b) => {
            fields + button_order().iter().position(|x| *x == b).unwrap_or(1)
        }
    };
    let next = (current as isize + delta).rem_euclid(total as isize) as usize;
    state.focus = if next < fields {
        FocusTarget::Field(next)
    } else {
        FocusTarget::Button(button_order()[next - fields])
    };
    sync_editor(state);
}

/// Put focus on the first field of the current step (or Next when it has none).
fn reset_focus(state: &mut WizardState) {
    state.focus = if field_rows(&state.wizard).is_empty() {
        FocusTarget::Button(ButtonFocus::Next)
    } else {
        FocusTarget::Field(0)
    };
    state.editor = None;
    sync_editor(state);
}

fn focused_button(state: &WizardState) -> ButtonFocus {
    match state.focus {
        FocusTarget::Button(b) => b,
        _ => ButtonFocus::Next,
    }
}

fn set_focused_button(state: &mut WizardState, b: ButtonFocus) {
    state.focus = FocusTarget::Button(b);
    state.editor = None;
}

fn cycle_choice(state: &mut WizardState, row: &Row, choice: Choice, forward: bool) {
    let options = choice.options();
    if options.is_empty() {
        return;
    }
    let current = choice
        .current(&state.wizard)
        .and_then(|wire| options.iter().position(|w| *w == wire));
    let next = match (current, forward) {
        (None, _) => 0,
        (Some(i), true) => (i + 1) % options.len(),
        (Some(i), false) => (i + options.len() - 1) % options.len(),
    };
    let step_before = state.wizard.step();
    state.wizard.change(row.path, RawValue::text(options[next]));
    if state.wizard.step() != step_before {
        reset_focus(state);
    }
}

fn load_file(state: &mut WizardState, slot: FileSlot) {
    let Some((_, input)) = state.editor.as_mut() else {
        return;
    };
    let raw_path = input.value.trim().to_string();
    if raw_path.is_empty() {
        state.wizard.change(ScalarField::File(slot).into(), RawValue::text(""));
        return;
    }
    match Attachment::from_path(Path::new(&raw_path)) {
        Ok(file) => {
            info!(
                "[PHASE: tui] [STEP: file] Loaded {} for {} ({} bytes)",
                file.file_name,
                slot.wire_name(),
                file.len()
            );
            state.wizard.change(ScalarField::File(slot).into(), RawValue::File(file));
            input.value.clear();
            input.cursor = 0;
        }
        Err(e) => {
            warn!("[PHASE: tui] [STEP: file] Failed to read {}: {}", raw_path, e);
            state.modal = Some(Modal::Message {
                title: "Could not open file".to_string(),
                body: format!("{}: {}", raw_path, e),
            });
        }
    }
}

/// Collection targeted by add/remove on the current step.
fn active_collection(state: &WizardState) -> Option<Collection> {
    match (state.wizard.step(), state.wizard.draft().solution_type()) {
        (Step::Cabinets, _) => Some(Collection::Cabinets),
        (Step::Modules, Some(SolutionType::CabinetSolution)) => Some(Collection::Cabinets),
        (Step::Modules, _) => Some(Collection::Modules),
        _ => None,
    }
}

fn add_entry(state: &mut WizardState) {
    match active_collection(state) {
        Some(Collection::Modules) => state.wizard.add_module(),
        Some(_) => state.wizard.add_cabinet(),
        None => return,
    }
    sync_editor(state);
}

fn remove_entry(state: &mut WizardState) {
    let Some(collection) = active_collection(state) else {
        return;
    };
    let index = match focused_row(state).map(|r| r.path) {
        Some(FieldPath::Indexed { index, .. }) => index,
        _ => match collection {
            Collection::Modules => state.wizard.modules().len().saturating_sub(1),
            _ => state.wizard.cabinets().len().saturating_sub(1),
        },
    };
    // A rejection is kept as the wizard notice and shown in the status line.
    let _ = match collection {
        Collection::Modules => state.wizard.remove_module(index),
        _ => state.wizard.remove_cabinet(index),
    };
    let fields = field_rows(&state.wizard).len();
    if let FocusTarget::Field(i) = state.focus {
        if i >= fields {
            state.focus = FocusTarget::Field(fields.saturating_sub(1));
        }
    }
    state.editor = None;
    sync_editor(state);
}

// =========================
// Entry points
// =========================

pub fn run(settings: &Settings) -> Result<()> {
    info!("[PHASE: tui] [STEP: start] Starting TUI wizard");

    let service: Arc<dyn ScreenRegistrationService> =
        Arc::new(HttpRegistrationService::from_settings(&settings.api)?);

    let mut terminal = setup_terminal()?;
    let result = run_loop(&mut terminal, service);
    restore_terminal(&mut terminal)?;

    result
}

fn new_real_wizard_state(service: Arc<dyn ScreenRegistrationService>) -> WizardState {
    // Real interactive run: no sample values.
    WizardState::new(WizardController::new(service))
}

fn seed_sample(wizard: &mut WizardController, solution: SolutionType) {
    let text = |s: &str| RawValue::text(s);
    wizard.change(ScalarField::Name.into(), text("Lobby wall"));
    wizard.change(ScalarField::ScreenType.into(), text(ScreenType::Indoor.as_wire()));
    wizard.change(
        ScalarField::Location.into(),
        text("https://maps.app.goo.gl/lobby"),
    );
    wizard.change(ScalarField::PixelScreen.into(), text("P2.5"));
    wizard.change(ScalarField::SolutionType.into(), text(solution.as_wire()));
    for slot in FileSlot::ALL {
        wizard.change(
            ScalarField::File(slot).into(),
            RawValue::File(Attachment::new(
                format!("{}.json", slot.wire_name()),
                b"{}".to_vec(),
            )),
        );
    }
    wizard.change(
        ScalarField::ComponentType(ComponentKind::PowerSupply).into(),
        text("Meanwell 200W"),
    );
    wizard.change(
        ScalarField::ComponentQuantity(ComponentKind::PowerSupply).into(),
        text("12"),
    );

    let entries: &[(fn(usize, EntryField) -> FieldPath, EntryField, &str)] = &[
        (FieldPath::cabinet, EntryField::CabinetName, "CAB-500"),
        (FieldPath::cabinet, EntryField::WidthQuantity, "4"),
        (FieldPath::cabinet, EntryField::HeightQuantity, "2"),
        (FieldPath::cabinet, EntryField::Width, "500"),
        (FieldPath::cabinet, EntryField::Height, "500"),
        (FieldPath::cabinet, EntryField::IsWidth, "true"),
        (FieldPath::cabinet_module, EntryField::WidthQuantity, "2"),
        (FieldPath::cabinet_module, EntryField::HeightQuantity, "2"),
        (FieldPath::cabinet_module, EntryField::Width, "250"),
        (FieldPath::cabinet_module, EntryField::Height, "250"),
        (FieldPath::cabinet_module, EntryField::ModuleBatchNumber, "M-77"),
        (FieldPath::module, EntryField::WidthQuantity, "8"),
        (FieldPath::module, EntryField::HeightQuantity, "4"),
        (FieldPath::module, EntryField::Width, "320"),
        (FieldPath::module, EntryField::Height, "160"),
        (FieldPath::module, EntryField::ModuleBatchNumber, "B-12"),
        (FieldPath::module, EntryField::IsWidth, "true"),
        (FieldPath::module, EntryField::IsHeight, "true"),
    ];
    for (at, field, value) in entries {
        wizard.change(at(0, *field), text(*value));
    }
}

fn new_smoke_wizard_state(
    target: &str,
    service: Arc<dyn ScreenRegistrationService>,
) -> WizardState {
    // Only the smoke runner seeds sample values.
    let step = Step::parse(target).unwrap_or(Step::ScreenInfo);
    let solution = match step {
        Step::Cabinets => SolutionType::CabinetSolution,
        _ => SolutionType::ModuleSolution,
    };
    let mut wizard = WizardController::new(service);
    seed_sample(&mut wizard, solution);
    while wizard.step() != step && wizard.next() {}
    WizardState::new(wizard)
}

pub fn smoke(settings: &Settings, target: &str) -> Result<()> {
    info!(
        "[PHASE: tui] [STEP: smoke] Rendering single-frame TUI smoke target={}",
        target
    );

    let service: Arc<dyn ScreenRegistrationService> =
        Arc::new(HttpRegistrationService::from_settings(&settings.api)?);
    let state = new_smoke_wizard_state(target.trim(), service);

    // In-memory backend: no raw mode, no alternate screen.
    let backend = TestBackend::new(100, 30);
    let mut terminal = Terminal::new(backend)?;
    terminal.draw(|f| draw(f.size(), f, &state))?;

    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    service: Arc<dyn ScreenRegistrationService>,
) -> Result<()> {
    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();
    let mut state = new_real_wizard_state(service);
    let (tx, rx) = mpsc::channel::<UiMsg>();

    while !state.quit {
        drain_messages(&mut state, &rx);
        terminal.draw(|f| draw(f.size(), f, &state))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_millis(0));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                handle_key(&mut state, key.code, &tx);
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    }

    Ok(())
}

fn drain_messages(state: &mut WizardState, rx: &mpsc::Receiver<UiMsg>) {
    while let Ok(msg) = rx.try_recv() {
        match msg {
            UiMsg::SubmitFinished(result) => match state.wizard.complete_submit(result) {
                Ok(record) => {
                    state.modal = Some(Modal::Message {
                        title: "Screen registered".to_string(),
                        body: format!("'{}' was registered with id {}.", record.name, record.id),
                    });
                    reset_focus(state);
                }
                Err(e) => {
                    state.modal = Some(Modal::Message {
                        title: "Registration failed".to_string(),
                        body: format!("{}\n\nYour data was kept. Submit again to retry.", e),
                    });
                }
            },
        }
    }
}

/// Validate + assemble on the UI thread, then send the request from a worker thread so the
/// form stays responsive.
fn start_submit(state: &mut WizardState, tx: &mpsc::Sender<UiMsg>) {
    let pending = match state.wizard.begin_submit() {
        Ok(p) => p,
        Err(e) => {
            // Validation failures may have moved the pointer to an earlier step.
            reset_focus(state);
            state.modal = Some(Modal::Message {
                title: "Cannot submit".to_string(),
                body: e.to_string(),
            });
            return;
        }
    };

    let service = state.wizard.service();
    let tx = tx.clone();
    thread::spawn(move || {
        let correlation_id = pending.correlation_id();
        let result = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt.block_on(pending.dispatch(service.as_ref())),
            Err(e) => SubmissionResult {
                correlation_id,
                outcome: Err(RegistrationError::Transport(format!(
                    "failed to start async runtime: {}",
                    e
                ))),
            },
        };
        let _ = tx.send(UiMsg::SubmitFinished(result));
    });
}

fn activate_button(state: &mut WizardState, button: ButtonFocus, tx: &mpsc::Sender<UiMsg>) {
    match button {
        ButtonFocus::Back => {
            if state.wizard.step().prev_in(state.wizard.draft().solution_type()).is_some() {
                state.wizard.back();
                reset_focus(state);
            }
        }
        ButtonFocus::Next => {
            if state.wizard.is_last_step() {
                if !state.wizard.is_submitting() {
                    start_submit(state, tx);
                }
            } else if state.wizard.next() {
                reset_focus(state);
            } else {
                // Jump to the first field with an error.
                let rows = field_rows(&state.wizard);
                if let Some(i) = rows
                    .iter()
                    .position(|r| state.wizard.error_for(&r.path).is_some())
                {
                    state.focus = FocusTarget::Field(i);
                    state.editor = None;
                    sync_editor(state);
                }
            }
        }
        ButtonFocus::Cancel => {
            state.modal = Some(Modal::ConfirmCancel);
            set_focused_button(state, ButtonFocus::Next);
        }
    }
}

fn handle_key(state: &mut WizardState, code: KeyCode, tx: &mpsc::Sender<UiMsg>) {
    // Modal handling
    if let Some(modal) = state.modal.clone() {
        match modal {
            Modal::ConfirmCancel => match code {
                KeyCode::Left | KeyCode::Right | KeyCode::Tab => {
                    let next = match focused_button(state) {
                        ButtonFocus::Cancel => ButtonFocus::Next,
                        _ => ButtonFocus::Cancel,
                    };
                    set_focused_button(state, next);
                }
                KeyCode::Enter => {
                    let confirm = focused_button(state) == ButtonFocus::Cancel;
                    state.modal = None;
                    if confirm {
                        info!("[PHASE: tui] [STEP: cancel] User cancelled the wizard");
                        state.quit = true;
                    }
                }
                KeyCode::Esc => state.modal = None,
                _ => {}
            },
            Modal::Message { .. } => {
                if matches!(code, KeyCode::Enter | KeyCode::Esc) {
                    state.modal = None;
                }
            }
        }
        return;
    }

    match code {
        KeyCode::Esc => {
            state.modal = Some(Modal::ConfirmCancel);
            set_focused_button(state, ButtonFocus::Next);
            return;
        }
        KeyCode::Tab | KeyCode::Down => return move_focus(state, 1),
        KeyCode::BackTab | KeyCode::Up => return move_focus(state, -1),
        KeyCode::F(2) => return add_entry(state),
        KeyCode::F(3) => return remove_entry(state),
        _ => {}
    }

    match state.focus {
        FocusTarget::Button(b) => match code {
            KeyCode::Left | KeyCode::Right => {
                let order = button_order();
                let i = order.iter().position(|x| *x == b).unwrap_or(1);
                let next = if code == KeyCode::Left {
                    (i + order.len() - 1) % order.len()
                } else {
                    (i + 1) % order.len()
                };
                set_focused_button(state, order[next]);
            }
            KeyCode::Enter => activate_button(state, b, tx),
            _ => {}
        },
        FocusTarget::Field(_) => {
            let Some(row) = focused_row(state) else {
                return;
            };
            match row.kind {
                RowKind::Text => match code {
                    KeyCode::Enter => move_focus(state, 1),
                    _ => {
                        if let Some((path, input)) = state.editor.as_mut() {
                            if input.handle_key(code) {
                                let value = input.value.clone();
                                let path = *path;
                                state.wizard.change(path, RawValue::Text(value));
                            }
                        }
                    }
                },
                RowKind::File(slot) => match code {
                    KeyCode::Enter => load_file(state, slot),
                    _ => {
                        if let Some((_, input)) = state.editor.as_mut() {
                            input.handle_key(code);
                        }
                    }
                },
                RowKind::Choice(choice) => match code {
                    KeyCode::Left => cycle_choice(state, &row, choice, false),
                    KeyCode::Right | KeyCode::Char(' ') => cycle_choice(state, &row, choice, true),
                    KeyCode::Enter => move_focus(state, 1),
                    _ => {}
                },
                RowKind::Flag => match code {
                    KeyCode::Char(' ') | KeyCode::Enter => {
                        let on = flag_value(&state.wizard, &row.path);
                        state.wizard.change(row.path, RawValue::Checked(!on));
                    }
                    KeyCode::Char('+') => add_entry(state),
                    KeyCode::Char('-') => remove_entry(state),
                    _ => {}
                },
            }
        }
    }
}

// =========================
// Rendering
// =========================

fn draw(area: Rect, f: &mut ratatui::Frame<'_>, state: &WizardState) {
    let (window_area, _) = centered_window(area, 100, 30);

    let outer_block = Block::default()
        .borders(Borders::ALL)
        .title("Screen Registration");
    f.render_widget(outer_block, window_area);

    let inner = window_area.inner(&ratatui::layout::Margin {
        vertical: 1,
        horizontal: 1,
    });
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)].as_ref())
        .split(inner);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(24), Constraint::Min(0)].as_ref())
        .split(rows[0]);

    draw_step_list(f, cols[0], state);
    draw_content(f, cols[1], state);
    draw_buttons(f, rows[1], state);

    match &state.modal {
        Some(Modal::ConfirmCancel) => draw_cancel_modal(f, window_area, state),
        Some(Modal::Message { title, body }) => draw_message_modal(f, window_area, title, body),
        None => {}
    }
}

fn draw_step_list(f: &mut ratatui::Frame<'_>, area: Rect, state: &WizardState) {
    let solution = state.wizard.draft().solution_type();
    let current = state.wizard.step().position_in(solution).unwrap_or(1);
    let lines: Vec<Line> = step::path(solution)
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let n = i + 1;
            let (marker, style) = if n == current {
                (">", Style::default().add_modifier(Modifier::BOLD))
            } else if n < current {
                ("*", Style::default())
            } else {
                (" ", Style::default().fg(Color::DarkGray))
            };
            Line::from(Span::styled(format!("{} {}. {}", marker, n, s.title()), style))
        })
        .collect();

    let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL).title("Steps"));
    f.render_widget(p, area);
}

fn form_lines(state: &WizardState) -> (Vec<Line<'static>>, usize) {
    let wizard = &state.wizard;
    let focused = match state.focus {
        FocusTarget::Field(i) => Some(i),
        FocusTarget::Button(_) => None,
    };

    let mut lines = Vec::new();
    let mut focus_line = 0;
    let mut field_index = 0;
    for item in form_items(wizard) {
        match item {
            FormItem::Header(title) => {
                lines.push(Line::from(Span::styled(
                    title,
                    Style::default().add_modifier(Modifier::BOLD),
                )));
            }
            FormItem::Field(row) => {
                let is_focused = focused == Some(field_index);
                let value = match row.kind {
                    RowKind::Flag => check_box(flag_value(wizard, &row.path)).to_string(),
                    RowKind::Choice(_) => {
                        let v = field_text(wizard, &row.path);
                        format!("< {} >", if v.is_empty() { "select" } else { v.as_str() })
                    }
                    RowKind::File(_) => {
                        let loaded = field_text(wizard, &row.path);
                        let typed = match (&state.editor, is_focused) {
                            (Some((p, input)), true) if *p == row.path => input.display_with_cursor(),
                            _ => String::new(),
                        };
                        match (loaded.is_empty(), typed.is_empty()) {
                            (true, true) => "(none)".to_string(),
                            (false, true) => loaded,
                            (true, false) => typed,
                            (false, false) => format!("{} | path: {}", loaded, typed),
                        }
                    }
                    RowKind::Text => match (&state.editor, is_focused) {
                        (Some((p, input)), true) if *p == row.path => input.display_with_cursor(),
                        _ => field_text(wizard, &row.path),
                    },
                };
                let value_style = if is_focused {
                    Style::default().add_modifier(Modifier::REVERSED)
                } else {
                    Style::default()
                };
                if is_focused {
                    focus_line = lines.len();
                }
                lines.push(Line::from(vec![
                    Span::raw(format!("  {:<width$}", row.label, width = LABEL_WIDTH)),
                    Span::styled(value, value_style),
                ]));
                if let Some(msg) = wizard.error_for(&row.path) {
                    lines.push(Line::from(Span::styled(
                        format!("    ! {}", msg),
                        Style::default().fg(Color::Red),
                    )));
                }
                field_index += 1;
            }
        }
    }
    (lines, focus_line)
}

fn resolution_lines(state: &WizardState) -> Vec<Line<'static>> {
    let wizard = &state.wizard;
    let draft = wizard.draft();
    let mut lines = vec![
        Line::from(format!("Screen:    {}", draft.info.name.trim())),
        Line::from(format!(
            "Type:      {}",
            draft.info.screen_type.map(|t| t.label()).unwrap_or("-")
        )),
        Line::from(format!(
            "Solution:  {}",
            draft.solution_type().map(|t| t.label()).unwrap_or("-")
        )),
        Line::from(""),
    ];
    match wizard.resolution() {
        Some(s) => {
            lines.push(Line::from(format!("Entries:        {}", s.entries)));
            lines.push(Line::from(format!("Total width:    {}", s.total_width)));
            lines.push(Line::from(format!("Total height:   {}", s.total_height)));
        }
        None => lines.push(Line::from("No layout selected.")),
    }
    lines.push(Line::from(""));
    lines.push(Line::from("Press Submit to register the screen."));
    lines
}

fn draw_content(f: &mut ratatui::Frame<'_>, area: Rect, state: &WizardState) {
    let (n, total) = state.wizard.step_number();
    let block = Block::default().borders(Borders::ALL).title(format!(
        "Step {} of {}: {}",
        n,
        total,
        state.wizard.step().title()
    ));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(2)].as_ref())
        .split(inner);

    let lines = if state.wizard.step() == Step::Resolution {
        resolution_lines(state)
    } else {
        let (lines, focus_line) = form_lines(state);
        let height = parts[0].height as usize;
        // Keep the focused row (and its error line) on screen.
        let start = (focus_line + 2).saturating_sub(height);
        lines.into_iter().skip(start).collect()
    };
    f.render_widget(Paragraph::new(Text::from(lines)), parts[0]);

    let status = if state.wizard.is_submitting() {
        Line::from(Span::styled(
            "Submitting...",
            Style::default().fg(Color::Yellow),
        ))
    } else if let Some(notice) = state.wizard.notice() {
        Line::from(Span::styled(notice.to_string(), Style::default().fg(Color::Yellow)))
    } else {
        Line::from(Span::styled(
            "Up/Down move  Left/Right choose  Space toggle  F2 add  F3 remove  Esc cancel",
            Style::default().fg(Color::DarkGray),
        ))
    };
    let p = Paragraph::new(Text::from(status)).wrap(Wrap { trim: true });
    f.render_widget(p, parts[1]);
}

fn centered_window(area: Rect, width: u16, height: u16) -> (Rect, Rect) {
    let w = width.min(area.width.saturating_sub(2)).max(60);
    let h = height.min(area.height.saturating_sub(2)).max(20);
    let x = area.x + (area.width.saturating_sub(w)) / 2;
    let y = area.y + (area.height.saturating_sub(h)) / 2;
    let rect = Rect {
        x,
        y,
        width: w.min(area.width),
        height: h.min(area.height),
    };
    (rect, rect)
}

fn draw_buttons(f: &mut ratatui::Frame<'_>, area: Rect, state: &WizardState) {
    let solution = state.wizard.draft().solution_type();
    let back_enabled = state.wizard.step().prev_in(solution).is_some();
    let last = state.wizard.is_last_step();
    let next_enabled = !(last && state.wizard.is_submitting());

    let back = button_text(
        "Back",
        matches!(state.focus, FocusTarget::Button(ButtonFocus::Back)),
        back_enabled,
    );
    let next = button_text(
        if last { "Submit" } else { "Next" },
        matches!(state.focus, FocusTarget::Button(ButtonFocus::Next)),
        next_enabled,
    );
    let cancel = button_text(
        "Cancel",
        matches!(state.focus, FocusTarget::Button(ButtonFocus::Cancel)),
        true,
    );

    let line = Line::from(vec![back, Span::raw(" "), next, Span::raw(" "), cancel]);

    let p = Paragraph::new(Text::from(line)).alignment(Alignment::Right);
    f.render_widget(p, area);
}

fn button_text(label: &str, focused: bool, enabled: bool) -> Span<'static> {
    let mut style = Style::default();
    if !enabled {
        style = style.fg(Color::DarkGray);
    }
    if focused && enabled {
        style = style.add_modifier(Modifier::REVERSED);
    }
    Span::styled(format!("[ {} ]", label), style)
}

fn modal_area(window_area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(window_area.width.saturating_sub(4)).max(20);
    let h = height.min(window_area.height.saturating_sub(2)).max(5);
    Rect {
        x: window_area.x + (window_area.width.saturating_sub(w)) / 2,
        y: window_area.y + (window_area.height.saturating_sub(h)) / 2,
        width: w,
        height: h,
    }
}

fn draw_cancel_modal(f: &mut ratatui::Frame<'_>, window_area: Rect, state: &WizardState) {
    let area = modal_area(window_area, 56, 7);
    f.render_widget(ratatui::widgets::Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Cancel registration?");
    let body = Paragraph::new(Text::from(vec![
        Line::from("Anything entered so far will be discarded."),
        Line::from(""),
        Line::from(""),
    ]))
    .block(block)
    .wrap(Wrap { trim: false });
    f.render_widget(body, area);

    let buttons_area = Rect {
        x: area.x + 1,
        y: area.y + area.height.saturating_sub(2),
        width: area.width.saturating_sub(2),
        height: 1,
    };

    let yes = button_text("Yes, cancel", focused_button(state) == ButtonFocus::Cancel, true);
    let no = button_text("No", focused_button(state) == ButtonFocus::Next, true);
    let line = Line::from(vec![yes, Span::raw(" "), no]);
    let p = Paragraph::new(Text::from(line)).alignment(Alignment::Right);
    f.render_widget(p, buttons_area);
}

fn draw_message_modal(f: &mut ratatui::Frame<'_>, window_area: Rect, title: &str, body: &str) {
    let area = modal_area(window_area, 64, 10);
    f.render_widget(ratatui::widgets::Clear, area);

    let mut lines: Vec<Line> = body.lines().map(|l| Line::from(l.to_string())).collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "[ OK ]",
        Style::default().add_modifier(Modifier::REVERSED),
    )));
    let p = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .wrap(Wrap { trim: false });
    f.render_widget(p, area);
}
