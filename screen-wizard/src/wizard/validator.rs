// Step validator
//
// `validate(step, draft)` returns every field-level problem on that step. An empty map means
// the step may be left. Rules are declared as data (scalar rule tables built per step and
// per-entry tables for repeated records) and evaluated by one generic checker, so adding a
// component kind automatically brings its quantity/spare rules along.

use super::step::Step;
use crate::models::draft::{
    CabinetEntry, CabinetModule, ComponentKind, FileSlot, ModuleEntry, NumericInput,
    QuantityFloor, ScreenDraft, Solution,
};
use crate::models::field_path::{EntryField, FieldPath, ScalarField};
use log::error;
use regex::Regex;
use std::collections::BTreeMap;

pub type ErrorMap = BTreeMap<FieldPath, String>;

// =========================
// Rule tables
// =========================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Presence {
    Required,
    /// Checked only when a value was entered.
    WhenPresent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Constraint {
    Filled,
    Positive,
    NonNegative,
    MapsUrl,
}

#[derive(Debug, Clone, Copy)]
struct FieldRule {
    field: ScalarField,
    /// The rule applies only once this field has a value.
    depends_on: Option<ScalarField>,
    presence: Presence,
    constraint: Constraint,
}

impl FieldRule {
    const fn required(field: ScalarField, constraint: Constraint) -> Self {
        Self {
            field,
            depends_on: None,
            presence: Presence::Required,
            constraint,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct EntryRule {
    field: EntryField,
    constraint: Constraint,
}

const CABINET_RULES: [EntryRule; 5] = [
    EntryRule { field: EntryField::CabinetName, constraint: Constraint::Filled },
    EntryRule { field: EntryField::WidthQuantity, constraint: Constraint::Positive },
    EntryRule { field: EntryField::HeightQuantity, constraint: Constraint::Positive },
    EntryRule { field: EntryField::Height, constraint: Constraint::Filled },
    EntryRule { field: EntryField::Width, constraint: Constraint::Filled },
];

const MODULE_RULES: [EntryRule; 5] = [
    EntryRule { field: EntryField::WidthQuantity, constraint: Constraint::Positive },
    EntryRule { field: EntryField::HeightQuantity, constraint: Constraint::Positive },
    EntryRule { field: EntryField::Height, constraint: Constraint::Filled },
    EntryRule { field: EntryField::Width, constraint: Constraint::Filled },
    EntryRule { field: EntryField::ModuleBatchNumber, constraint: Constraint::Filled },
];

/// Quantity is required once the type is named; anything typed into a quantity must be a
/// number even without a type. A spare, when entered, must not be negative whether or not the
/// type is named.
fn component_rules(kinds: &[ComponentKind]) -> Vec<FieldRule> {
    let mut rules = Vec::new();
    for &kind in kinds {
        rules.push(FieldRule {
            field: ScalarField::ComponentQuantity(kind),
            depends_on: None,
            presence: Presence::WhenPresent,
            constraint: Constraint::Filled,
        });
        rules.push(FieldRule {
            field: ScalarField::ComponentQuantity(kind),
            depends_on: Some(ScalarField::ComponentType(kind)),
            presence: Presence::Required,
            constraint: match kind.quantity_floor() {
                QuantityFloor::Positive => Constraint::Positive,
                QuantityFloor::NonNegative => Constraint::NonNegative,
            },
        });
        if kind.has_spare() {
            rules.push(FieldRule {
                field: ScalarField::SpareQuantity(kind),
                depends_on: None,
                presence: Presence::WhenPresent,
                constraint: Constraint::NonNegative,
            });
        }
    }
    rules
}

fn screen_info_rules() -> Vec<FieldRule> {
    let mut rules = vec![
        FieldRule::required(ScalarField::Name, Constraint::Filled),
        FieldRule::required(ScalarField::ScreenType, Constraint::Filled),
        FieldRule::required(ScalarField::Location, Constraint::MapsUrl),
        FieldRule::required(ScalarField::PixelScreen, Constraint::Filled),
        FieldRule::required(ScalarField::SolutionType, Constraint::Filled),
    ];
    rules.extend(
        FileSlot::ALL
            .into_iter()
            .map(|slot| FieldRule::required(ScalarField::File(slot), Constraint::Filled)),
    );
    rules.extend(component_rules(&ComponentKind::HARDWARE));
    rules
}

// =========================
// Field values
// =========================

/// Read-only view of one field, enough to evaluate any rule.
#[derive(Debug, Clone, Copy)]
enum FieldValue<'a> {
    Text(&'a str),
    Integer(&'a NumericInput<i64>),
    Decimal(&'a NumericInput<f64>),
    Present(bool),
}

impl FieldValue<'_> {
    fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Integer(n) => n.is_empty(),
            FieldValue::Decimal(n) => n.is_empty(),
            FieldValue::Present(p) => !p,
        }
    }
}

fn scalar_value(draft: &ScreenDraft, field: ScalarField) -> FieldValue<'_> {
    match field {
        ScalarField::Name => FieldValue::Text(&draft.info.name),
        ScalarField::ScreenType => FieldValue::Present(draft.info.screen_type.is_some()),
        ScalarField::SolutionType => FieldValue::Present(draft.solution.is_some()),
        ScalarField::Location => FieldValue::Text(&draft.info.location),
        ScalarField::PixelScreen => FieldValue::Text(&draft.info.pixel_screen),
        ScalarField::Description => FieldValue::Text(&draft.info.description),
        ScalarField::ComponentType(kind) => {
            FieldValue::Text(&draft.components.get(kind).type_name)
        }
        ScalarField::ComponentQuantity(kind) => {
            FieldValue::Integer(&draft.components.get(kind).quantity)
        }
        ScalarField::SpareQuantity(kind) => {
            FieldValue::Integer(&draft.components.get(kind).spare_quantity)
        }
        ScalarField::File(slot) => FieldValue::Present(draft.attachments.get(slot).is_some()),
    }
}

trait EntryValues {
    fn entry_value(&self, field: EntryField) -> Option<FieldValue<'_>>;
}

impl EntryValues for ModuleEntry {
    fn entry_value(&self, field: EntryField) -> Option<FieldValue<'_>> {
        match field {
            EntryField::WidthQuantity => Some(FieldValue::Integer(&self.width_quantity)),
            EntryField::HeightQuantity => Some(FieldValue::Integer(&self.height_quantity)),
            EntryField::Height => Some(FieldValue::Decimal(&self.height)),
            EntryField::Width => Some(FieldValue::Decimal(&self.width)),
            EntryField::ModuleBatchNumber => Some(FieldValue::Text(&self.module_batch_number)),
            EntryField::IsWidth => Some(FieldValue::Present(self.is_width)),
            EntryField::IsHeight => Some(FieldValue::Present(self.is_height)),
            EntryField::CabinetName => None,
        }
    }
}

impl EntryValues for CabinetModule {
    fn entry_value(&self, field: EntryField) -> Option<FieldValue<'_>> {
        match field {
            EntryField::WidthQuantity => Some(FieldValue::Integer(&self.width_quantity)),
            EntryField::HeightQuantity => Some(FieldValue::Integer(&self.height_quantity)),
            EntryField::Height => Some(FieldValue::Decimal(&self.height)),
            EntryField::Width => Some(FieldValue::Decimal(&self.width)),
            EntryField::ModuleBatchNumber => Some(FieldValue::Text(&self.module_batch_number)),
            _ => None,
        }
    }
}

impl EntryValues for CabinetEntry {
    fn entry_value(&self, field: EntryField) -> Option<FieldValue<'_>> {
        match field {
            EntryField::CabinetName => Some(FieldValue::Text(&self.cabinet_name)),
            EntryField::WidthQuantity => Some(FieldValue::Integer(&self.width_quantity)),
            EntryField::HeightQuantity => Some(FieldValue::Integer(&self.height_quantity)),
            EntryField::Height => Some(FieldValue::Decimal(&self.height)),
            EntryField::Width => Some(FieldValue::Decimal(&self.width)),
            EntryField::IsWidth => Some(FieldValue::Present(self.is_width)),
            EntryField::IsHeight => Some(FieldValue::Present(self.is_height)),
            EntryField::ModuleBatchNumber => None,
        }
    }
}

// =========================
// Checking
// =========================

fn check(
    value: FieldValue<'_>,
    presence: Presence,
    constraint: Constraint,
    label: &str,
) -> Option<String> {
    if value.is_blank() {
        return match presence {
            Presence::Required => Some(format!("{} is required", label)),
            Presence::WhenPresent => None,
        };
    }

    let number = match value {
        FieldValue::Integer(NumericInput::Malformed(_)) => {
            return Some(format!("{} must be a whole number", label));
        }
        FieldValue::Decimal(NumericInput::Malformed(_)) => {
            return Some(format!("{} must be a number", label));
        }
        FieldValue::Integer(n) => n.value().map(|v| v as f64),
        FieldValue::Decimal(n) => n.value(),
        FieldValue::Text(_) | FieldValue::Present(_) => None,
    };

    match constraint {
        Constraint::Filled => None,
        Constraint::Positive => match number {
            Some(n) if n <= 0.0 => Some(format!("{} must be greater than 0", label)),
            _ => None,
        },
        Constraint::NonNegative => match number {
            Some(n) if n < 0.0 => Some(format!("{} cannot be negative", label)),
            _ => None,
        },
        Constraint::MapsUrl => match value {
            FieldValue::Text(s) if !is_maps_url(s) => {
                Some(format!("{} must be a Google Maps link", label))
            }
            _ => None,
        },
    }
}

fn apply_scalar_rules(draft: &ScreenDraft, rules: &[FieldRule], errors: &mut ErrorMap) {
    for rule in rules {
        if let Some(dep) = rule.depends_on {
            if scalar_value(draft, dep).is_blank() {
                continue;
            }
        }
        let value = scalar_value(draft, rule.field);
        if let Some(msg) = check(value, rule.presence, rule.constraint, &rule.field.label()) {
            errors.insert(FieldPath::Scalar(rule.field), msg);
        }
    }
}

fn apply_entry_rules<'a, E: EntryValues + 'a>(
    entries: impl IntoIterator<Item = (usize, &'a E)>,
    rules: &[EntryRule],
    path: fn(usize, EntryField) -> FieldPath,
    errors: &mut ErrorMap,
) {
    for (index, entry) in entries {
        for rule in rules {
            let Some(value) = entry.entry_value(rule.field) else {
                continue;
            };
            if let Some(msg) = check(value, Presence::Required, rule.constraint, rule.field.label())
            {
                errors.insert(path(index, rule.field), msg);
            }
        }
    }
}

/// Validate one step. Never mutates the draft; an empty map means "proceed".
pub fn validate(step: Step, draft: &ScreenDraft) -> ErrorMap {
    let mut errors = ErrorMap::new();
    match step {
        Step::ScreenInfo => apply_scalar_rules(draft, &screen_info_rules(), &mut errors),
        Step::Cables => {
            apply_scalar_rules(draft, &component_rules(&ComponentKind::CABLES), &mut errors)
        }
        Step::Cabinets => {
            if let Some(Solution::Cabinet(cabinets)) = &draft.solution {
                apply_entry_rules(
                    cabinets.iter().enumerate(),
                    &CABINET_RULES,
                    FieldPath::cabinet,
                    &mut errors,
                );
            }
        }
        Step::Modules => match &draft.solution {
            Some(Solution::Module(modules)) => apply_entry_rules(
                modules.iter().enumerate(),
                &MODULE_RULES,
                FieldPath::module,
                &mut errors,
            ),
            Some(Solution::Cabinet(cabinets)) => apply_entry_rules(
                cabinets.iter().map(|c| &c.module).enumerate(),
                &MODULE_RULES,
                FieldPath::cabinet_module,
                &mut errors,
            ),
            None => {}
        },
        Step::Resolution => {}
    }
    errors
}

// =========================
// Location
// =========================

/// Google Maps style link: google.<tld>/maps, maps.google.<tld>, maps.app.goo.gl or
/// goo.gl/maps over http(s).
pub fn is_maps_url(raw: &str) -> bool {
    let Ok(url) = url::Url::parse(raw.trim()) else {
        return false;
    };
    if url.scheme() != "https" && url.scheme() != "http" {
        return false;
    }
    let Some(host) = url.host_str() else {
        return false;
    };

    let re = match Regex::new(
        r"^((www\.)?google\.[a-z]{2,3}(\.[a-z]{2})?/maps|maps\.google\.[a-z]{2,3}(\.[a-z]{2})?|maps\.app\.goo\.gl|goo\.gl/maps)(/|$)",
    ) {
        Ok(re) => re,
        Err(e) => {
            error!(
                "[PHASE: validation] [STEP: location] Internal error compiling maps URL regex: {}",
                e
            );
            return false;
        }
    };

    let candidate = format!("{}{}", host.to_ascii_lowercase(), url.path());
    re.is_match(&candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::draft::{Attachment, ScreenType};
    use crate::models::field_path::Collection;

    fn valid_info_draft() -> ScreenDraft {
        let mut d = ScreenDraft::default();
        d.info.name = "Lobby wall".to_string();
        d.info.screen_type = Some(ScreenType::Indoor);
        d.info.location = "https://maps.google.com/?q=41.0,29.0".to_string();
        d.info.pixel_screen = "P2.5".to_string();
        d.solution = Some(Solution::Module(vec![ModuleEntry::default()]));
        for slot in FileSlot::ALL {
            d.attachments
                .set(slot, Some(Attachment::new(format!("{}.bin", slot.wire_name()), vec![1u8])));
        }
        d
    }

    fn qty(kind: ComponentKind) -> FieldPath {
        FieldPath::Scalar(ScalarField::ComponentQuantity(kind))
    }

    fn spare(kind: ComponentKind) -> FieldPath {
        FieldPath::Scalar(ScalarField::SpareQuantity(kind))
    }

    fn filled_module() -> ModuleEntry {
        ModuleEntry {
            width_quantity: NumericInput::Value(4),
            height_quantity: NumericInput::Value(3),
            height: NumericInput::Value(160.0),
            width: NumericInput::Value(320.0),
            module_batch_number: "B-2024-11".to_string(),
            is_width: true,
            is_height: false,
        }
    }

    // -------------------------------------------------------------------------
    // Screen info
    // -------------------------------------------------------------------------

    #[test]
    fn screen_info_valid_draft_has_no_errors() {
        let errors = validate(Step::ScreenInfo, &valid_info_draft());
        assert!(errors.is_empty(), "Unexpected errors: {:?}", errors);
    }

    #[test]
    fn screen_info_empty_draft_reports_every_required_field() {
        let errors = validate(Step::ScreenInfo, &ScreenDraft::default());
        for field in [
            ScalarField::Name,
            ScalarField::ScreenType,
            ScalarField::Location,
            ScalarField::PixelScreen,
            ScalarField::SolutionType,
            ScalarField::File(FileSlot::Connection),
            ScalarField::File(FileSlot::Config),
            ScalarField::File(FileSlot::Version),
        ] {
            assert!(
                errors.contains_key(&FieldPath::Scalar(field)),
                "missing error for {:?}: {:?}",
                field,
                errors
            );
        }
        // Description is optional and untouched component groups are fine.
        assert!(!errors.contains_key(&FieldPath::Scalar(ScalarField::Description)));
        assert!(!errors.contains_key(&qty(ComponentKind::PowerSupply)));
    }

    #[test]
    fn location_must_look_like_maps_link() {
        let mut d = valid_info_draft();
        d.info.location = "not-a-url".to_string();
        let errors = validate(Step::ScreenInfo, &d);
        let msg = errors
            .get(&FieldPath::Scalar(ScalarField::Location))
            .expect("location error");
        assert!(msg.contains("Google Maps"), "unexpected message: {}", msg);
    }

    #[test]
    fn power_supply_named_requires_quantity() {
        let mut d = valid_info_draft();
        d.components.get_mut(ComponentKind::PowerSupply).type_name = "LED-X".to_string();
        let errors = validate(Step::ScreenInfo, &d);
        assert!(
            errors.contains_key(&qty(ComponentKind::PowerSupply)),
            "quantity should be required: {:?}",
            errors
        );
    }

    #[test]
    fn power_supply_blank_pair_is_fine() {
        let d = valid_info_draft();
        let errors = validate(Step::ScreenInfo, &d);
        assert!(!errors.contains_key(&qty(ComponentKind::PowerSupply)));
    }

    #[test]
    fn malformed_quantity_is_reported_without_a_type() {
        // INTENT: text typed into a quantity must never be dropped silently, even when the
        // component type is still blank.
        let mut d = valid_info_draft();
        d.components.get_mut(ComponentKind::Hub).quantity =
            NumericInput::Malformed("abc".to_string());
        let errors = validate(Step::ScreenInfo, &d);
        let msg = errors
            .get(&qty(ComponentKind::Hub))
            .expect("malformed hub quantity must be reported");
        assert!(msg.contains("whole number"), "unexpected message: {}", msg);
        assert_eq!(errors.len(), 1, "only the hub quantity is wrong: {:?}", errors);

        let mut cables = valid_info_draft();
        cables.components.get_mut(ComponentKind::LoopDataCable).quantity =
            NumericInput::Malformed("2x".to_string());
        assert!(validate(Step::Cables, &cables).contains_key(&qty(ComponentKind::LoopDataCable)));
    }

    #[test]
    fn quantity_must_be_positive_when_type_named() {
        let mut d = valid_info_draft();
        let g = d.components.get_mut(ComponentKind::Hub);
        g.type_name = "HUB75".to_string();
        g.quantity = NumericInput::Value(0);
        let errors = validate(Step::ScreenInfo, &d);
        let msg = errors.get(&qty(ComponentKind::Hub)).expect("hub quantity error");
        assert!(msg.contains("greater than 0"), "unexpected message: {}", msg);
    }

    #[test]
    fn fan_quantity_may_be_zero_but_not_negative() {
        let mut d = valid_info_draft();
        let fan = d.components.get_mut(ComponentKind::Fan);
        fan.type_name = "AX-120".to_string();
        fan.quantity = NumericInput::Value(0);
        assert!(validate(Step::ScreenInfo, &d).is_empty());

        d.components.get_mut(ComponentKind::Fan).quantity = NumericInput::Value(-2);
        assert!(validate(Step::ScreenInfo, &d).contains_key(&qty(ComponentKind::Fan)));

        d.components.get_mut(ComponentKind::Fan).quantity = NumericInput::Empty;
        assert!(validate(Step::ScreenInfo, &d).contains_key(&qty(ComponentKind::Fan)));
    }

    #[test]
    fn negative_spare_is_rejected_even_without_type() {
        let mut d = valid_info_draft();
        d.components.get_mut(ComponentKind::PowerSupply).spare_quantity = NumericInput::Value(-1);
        let errors = validate(Step::ScreenInfo, &d);
        assert!(
            errors.contains_key(&spare(ComponentKind::PowerSupply)),
            "negative spare should be reported: {:?}",
            errors
        );
    }

    #[test]
    fn malformed_quantity_is_reported_as_not_a_number() {
        let mut d = valid_info_draft();
        let g = d.components.get_mut(ComponentKind::Media);
        g.type_name = "Novastar TB2".to_string();
        g.quantity = NumericInput::Malformed("two".to_string());
        let errors = validate(Step::ScreenInfo, &d);
        let msg = errors.get(&qty(ComponentKind::Media)).expect("media quantity error");
        assert!(msg.contains("whole number"), "unexpected message: {}", msg);
    }

    // -------------------------------------------------------------------------
    // Cables
    // -------------------------------------------------------------------------

    #[test]
    fn cables_follow_the_same_quantity_rules() {
        let mut d = ScreenDraft::default();
        d.components.get_mut(ComponentKind::LoopDataCable).type_name = "CAT6".to_string();
        d.components.get_mut(ComponentKind::MainPowerCable).spare_quantity =
            NumericInput::Value(-3);
        let errors = validate(Step::Cables, &d);
        assert_eq!(errors.len(), 2, "unexpected errors: {:?}", errors);
        assert!(errors.contains_key(&qty(ComponentKind::LoopDataCable)));
        assert!(errors.contains_key(&spare(ComponentKind::MainPowerCable)));
    }

    #[test]
    fn cables_do_not_check_screen_info_fields() {
        let errors = validate(Step::Cables, &ScreenDraft::default());
        assert!(errors.is_empty(), "Unexpected errors: {:?}", errors);
    }

    // -------------------------------------------------------------------------
    // Cabinets / modules
    // -------------------------------------------------------------------------

    #[test]
    fn cabinets_step_requires_cabinet_fields_for_every_entry() {
        let mut d = valid_info_draft();
        let filled = CabinetEntry {
            cabinet_name: "C1".to_string(),
            width_quantity: NumericInput::Value(2),
            height_quantity: NumericInput::Value(2),
            height: NumericInput::Value(500.0),
            width: NumericInput::Value(500.0),
            ..CabinetEntry::default()
        };
        d.solution = Some(Solution::Cabinet(vec![filled, CabinetEntry::default()]));
        let errors = validate(Step::Cabinets, &d);
        assert_eq!(errors.len(), 5, "only the blank cabinet should fail: {:?}", errors);
        assert!(errors.keys().all(|k| matches!(
            k,
            FieldPath::Indexed { collection: Collection::Cabinets, index: 1, .. }
        )));
    }

    #[test]
    fn cabinets_step_ignored_for_module_solution() {
        let d = valid_info_draft();
        assert!(validate(Step::Cabinets, &d).is_empty());
    }

    #[test]
    fn module_solution_blank_width_quantity_is_reported() {
        let mut d = valid_info_draft();
        let mut m = filled_module();
        m.width_quantity = NumericInput::Empty;
        d.solution = Some(Solution::Module(vec![filled_module(), m]));
        let errors = validate(Step::Modules, &d);
        assert_eq!(errors.len(), 1, "unexpected errors: {:?}", errors);
        assert!(errors.contains_key(&FieldPath::module(1, EntryField::WidthQuantity)));
    }

    #[test]
    fn cabinet_solution_checks_nested_modules_only() {
        let mut d = valid_info_draft();
        // Cabinet-level fields are blank but belong to the previous step.
        d.solution = Some(Solution::Cabinet(vec![CabinetEntry::default()]));
        let errors = validate(Step::Modules, &d);
        assert_eq!(errors.len(), 5, "unexpected errors: {:?}", errors);
        assert!(errors.contains_key(&FieldPath::cabinet_module(
            0,
            EntryField::ModuleBatchNumber
        )));
        assert!(!errors.contains_key(&FieldPath::cabinet(0, EntryField::CabinetName)));
    }

    #[test]
    fn validate_does_not_mutate_draft() {
        let d = ScreenDraft::default();
        let before = d.clone();
        for step in [
            Step::ScreenInfo,
            Step::Cables,
            Step::Cabinets,
            Step::Modules,
            Step::Resolution,
        ] {
            let _ = validate(step, &d);
        }
        assert_eq!(d, before);
    }

    // -------------------------------------------------------------------------
    // Maps URL shapes
    // -------------------------------------------------------------------------

    #[test]
    fn maps_url_accepts_known_shapes() {
        for ok in [
            "https://maps.google.com/...",
            "https://www.google.com/maps/place/Istanbul",
            "http://google.co.uk/maps?q=1,2",
            "https://maps.app.goo.gl/AbCdEf",
            "https://goo.gl/maps/xyz",
        ] {
            assert!(is_maps_url(ok), "should accept {}", ok);
        }
    }

    #[test]
    fn maps_url_rejects_other_links() {
        for bad in [
            "not-a-url",
            "",
            "https://example.com/maps",
            "ftp://maps.google.com/",
            "https://www.google.com/search?q=maps",
            "https://maps.google.com.evil.io/",
        ] {
            assert!(!is_maps_url(bad), "should reject {}", bad);
        }
    }
}
