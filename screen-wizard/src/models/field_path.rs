// Typed field addresses
//
// Every editable value of a ScreenDraft is addressed by a FieldPath: either a top-level
// scalar or (collection, index, field) for repeated entries.

use super::draft::{ComponentKind, FileSlot};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScalarField {
    Name,
    ScreenType,
    SolutionType,
    Location,
    PixelScreen,
    Description,
    ComponentType(ComponentKind),
    ComponentQuantity(ComponentKind),
    SpareQuantity(ComponentKind),
    File(FileSlot),
}

impl ScalarField {
    pub fn wire_name(self) -> &'static str {
        match self {
            ScalarField::Name => "name",
            ScalarField::ScreenType => "screenType",
            ScalarField::SolutionType => "solutionType",
            ScalarField::Location => "location",
            ScalarField::PixelScreen => "pixelScreen",
            ScalarField::Description => "description",
            ScalarField::ComponentType(kind) => kind.wire_names().0,
            ScalarField::ComponentQuantity(kind) => kind.wire_names().1,
            // Kinds without a spare never produce this variant from the rule tables.
            ScalarField::SpareQuantity(kind) => kind.wire_names().2.unwrap_or("spareQuantity"),
            ScalarField::File(slot) => slot.wire_name(),
        }
    }

    pub fn label(self) -> String {
        match self {
            ScalarField::Name => "Name".to_string(),
            ScalarField::ScreenType => "Screen type".to_string(),
            ScalarField::SolutionType => "Solution type".to_string(),
            ScalarField::Location => "Location".to_string(),
            ScalarField::PixelScreen => "Pixel screen".to_string(),
            ScalarField::Description => "Description".to_string(),
            ScalarField::ComponentType(kind) => kind.label().to_string(),
            ScalarField::ComponentQuantity(kind) => format!("{} quantity", kind.label()),
            ScalarField::SpareQuantity(kind) => format!("Spare {} quantity", kind.label().to_ascii_lowercase()),
            ScalarField::File(slot) => slot.label().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Collection {
    Cabinets,
    /// The module record nested inside each cabinet.
    CabinetModules,
    Modules,
}

impl Collection {
    pub fn noun(self) -> &'static str {
        match self {
            Collection::Cabinets => "cabinet",
            Collection::CabinetModules | Collection::Modules => "module",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntryField {
    CabinetName,
    WidthQuantity,
    HeightQuantity,
    Height,
    Width,
    ModuleBatchNumber,
    IsWidth,
    IsHeight,
}

impl EntryField {
    pub fn wire_name(self) -> &'static str {
        match self {
            EntryField::CabinetName => "cabinetName",
            EntryField::WidthQuantity => "widthQuantity",
            EntryField::HeightQuantity => "heightQuantity",
            EntryField::Height => "height",
            EntryField::Width => "width",
            EntryField::ModuleBatchNumber => "moduleBatchNumber",
            EntryField::IsWidth => "isWidth",
            EntryField::IsHeight => "isHeight",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EntryField::CabinetName => "Cabinet name",
            EntryField::WidthQuantity => "Width quantity",
            EntryField::HeightQuantity => "Height quantity",
            EntryField::Height => "Height",
            EntryField::Width => "Width",
            EntryField::ModuleBatchNumber => "Module batch number",
            EntryField::IsWidth => "Counts toward width",
            EntryField::IsHeight => "Counts toward height",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldPath {
    Scalar(ScalarField),
    Indexed {
        collection: Collection,
        index: usize,
        field: EntryField,
    },
}

impl FieldPath {
    pub fn cabinet(index: usize, field: EntryField) -> Self {
        FieldPath::Indexed {
            collection: Collection::Cabinets,
            index,
            field,
        }
    }

    pub fn cabinet_module(index: usize, field: EntryField) -> Self {
        FieldPath::Indexed {
            collection: Collection::CabinetModules,
            index,
            field,
        }
    }

    pub fn module(index: usize, field: EntryField) -> Self {
        FieldPath::Indexed {
            collection: Collection::Modules,
            index,
            field,
        }
    }

    pub fn label(&self) -> String {
        match self {
            FieldPath::Scalar(f) => f.label(),
            FieldPath::Indexed { field, .. } => field.label().to_string(),
        }
    }

    /// Whether this path addresses an entry of `collection` (either directly or through
    /// the cabinet's nested module).
    pub fn belongs_to(&self, collection: Collection) -> bool {
        match self {
            FieldPath::Scalar(_) => false,
            FieldPath::Indexed { collection: c, .. } => match collection {
                Collection::Cabinets | Collection::CabinetModules => {
                    matches!(c, Collection::Cabinets | Collection::CabinetModules)
                }
                Collection::Modules => *c == Collection::Modules,
            },
        }
    }
}

impl From<ScalarField> for FieldPath {
    fn from(f: ScalarField) -> Self {
        FieldPath::Scalar(f)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPath::Scalar(s) => write!(f, "{}", s.wire_name()),
            FieldPath::Indexed {
                collection,
                index,
                field,
            } => match collection {
                Collection::Cabinets => write!(f, "cabinets[{}].{}", index, field.wire_name()),
                Collection::CabinetModules => {
                    write!(f, "cabinets[{}].module.{}", index, field.wire_name())
                }
                Collection::Modules => write!(f, "modules[{}].{}", index, field.wire_name()),
            },
        }
    }
}
