// Payload assembler
// Maps a validated draft onto the submission payload. Numbers leave as numbers; only the
// active solution branch is looked at, so the inactive one can never reach the wire.

use crate::models::draft::{
    Attachment, CabinetEntry, ComponentKind, FileSlot, ModuleEntry, NumericInput, ScreenDraft,
    Solution,
};
use crate::models::field_path::{EntryField, FieldPath, ScalarField};
use crate::models::payload::{
    CabinetDto, CabinetModuleDto, ComponentLine, LayoutPayload, ModuleDto, PayloadFiles,
    SubmissionPayload,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssembleError {
    /// A value the validator should have required is absent.
    #[error("{0} has no usable value")]
    Missing(FieldPath),
    #[error("Failed to serialize the cabinet list: {0}")]
    Encode(#[from] serde_json::Error),
}

fn required_number<T: Copy + std::fmt::Display>(
    input: &NumericInput<T>,
    path: FieldPath,
) -> Result<T, AssembleError> {
    input.value().ok_or(AssembleError::Missing(path))
}

fn optional_text(s: &str) -> Option<String> {
    let t = s.trim();
    (!t.is_empty()).then(|| t.to_string())
}

fn required_file(draft: &ScreenDraft, slot: FileSlot) -> Result<Attachment, AssembleError> {
    draft
        .attachments
        .get(slot)
        .cloned()
        .ok_or(AssembleError::Missing(FieldPath::Scalar(ScalarField::File(slot))))
}

fn component_line(draft: &ScreenDraft, kind: ComponentKind) -> ComponentLine {
    let group = draft.components.get(kind);
    ComponentLine {
        kind,
        type_name: optional_text(&group.type_name),
        quantity: group.quantity.value(),
        spare_quantity: if kind.has_spare() {
            group.spare_quantity.value()
        } else {
            None
        },
    }
}

fn module_dto(index: usize, m: &ModuleEntry) -> Result<ModuleDto, AssembleError> {
    let at = |field| FieldPath::module(index, field);
    Ok(ModuleDto {
        width_quantity: required_number(&m.width_quantity, at(EntryField::WidthQuantity))?,
        height_quantity: required_number(&m.height_quantity, at(EntryField::HeightQuantity))?,
        height: required_number(&m.height, at(EntryField::Height))?,
        width: required_number(&m.width, at(EntryField::Width))?,
        module_batch_number: m.module_batch_number.trim().to_string(),
        is_width: m.is_width,
        is_height: m.is_height,
    })
}

fn cabinet_dto(index: usize, c: &CabinetEntry) -> Result<CabinetDto, AssembleError> {
    let at = |field| FieldPath::cabinet(index, field);
    let nested = |field| FieldPath::cabinet_module(index, field);
    let m = &c.module;
    Ok(CabinetDto {
        cabinet_name: c.cabinet_name.trim().to_string(),
        width_quantity: required_number(&c.width_quantity, at(EntryField::WidthQuantity))?,
        height_quantity: required_number(&c.height_quantity, at(EntryField::HeightQuantity))?,
        height: required_number(&c.height, at(EntryField::Height))?,
        width: required_number(&c.width, at(EntryField::Width))?,
        is_width: c.is_width,
        is_height: c.is_height,
        module: CabinetModuleDto {
            width_quantity: required_number(&m.width_quantity, nested(EntryField::WidthQuantity))?,
            height_quantity: required_number(
                &m.height_quantity,
                nested(EntryField::HeightQuantity),
            )?,
            height: required_number(&m.height, nested(EntryField::Height))?,
            width: required_number(&m.width, nested(EntryField::Width))?,
            module_batch_number: m.module_batch_number.trim().to_string(),
        },
    })
}

/// Build the submission payload. Expects a draft that passed validation on every step of its
/// path; anything still missing comes back as [`AssembleError::Missing`].
pub fn assemble(draft: &ScreenDraft) -> Result<SubmissionPayload, AssembleError> {
    let screen_type = draft
        .info
        .screen_type
        .ok_or(AssembleError::Missing(FieldPath::Scalar(ScalarField::ScreenType)))?;
    let solution = draft
        .solution
        .as_ref()
        .ok_or(AssembleError::Missing(FieldPath::Scalar(ScalarField::SolutionType)))?;

    let layout = match solution {
        Solution::Module(modules) => LayoutPayload::Modules(
            modules
                .iter()
                .enumerate()
                .map(|(i, m)| module_dto(i, m))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Solution::Cabinet(cabinets) => {
            let dtos = cabinets
                .iter()
                .enumerate()
                .map(|(i, c)| cabinet_dto(i, c))
                .collect::<Result<Vec<_>, _>>()?;
            LayoutPayload::Cabinets(serde_json::to_string(&dtos)?)
        }
    };

    Ok(SubmissionPayload {
        name: draft.info.name.trim().to_string(),
        screen_type,
        solution_type: solution.solution_type(),
        location: draft.info.location.trim().to_string(),
        pixel_screen: draft.info.pixel_screen.trim().to_string(),
        description: optional_text(&draft.info.description),
        components: ComponentKind::ALL
            .into_iter()
            .map(|kind| component_line(draft, kind))
            .collect(),
        files: PayloadFiles {
            connection_file: required_file(draft, FileSlot::Connection)?,
            config_file: required_file(draft, FileSlot::Config)?,
            version_file: required_file(draft, FileSlot::Version)?,
        },
        layout,
    })
}
