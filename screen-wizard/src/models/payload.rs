// Submission payload models
// What the registration endpoint receives once a draft has been assembled.

use super::draft::{Attachment, ComponentKind, FileSlot, ScreenType, SolutionType};
use serde::{Deserialize, Serialize};

/// Multipart part carrying the module list (module solution).
pub const MODULES_PART: &str = "moduleDtoListJson";
/// Multipart part carrying the serialized cabinet tree (cabinet solution).
pub const CABINETS_PART: &str = "cabinets";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDto {
    pub width_quantity: i64,
    pub height_quantity: i64,
    pub height: f64,
    pub width: f64,
    pub module_batch_number: String,
    pub is_width: bool,
    pub is_height: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CabinetModuleDto {
    pub width_quantity: i64,
    pub height_quantity: i64,
    pub height: f64,
    pub width: f64,
    pub module_batch_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CabinetDto {
    pub cabinet_name: String,
    pub width_quantity: i64,
    pub height_quantity: i64,
    pub height: f64,
    pub width: f64,
    pub is_width: bool,
    pub is_height: bool,
    pub module: CabinetModuleDto,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComponentLine {
    pub kind: ComponentKind,
    pub type_name: Option<String>,
    pub quantity: Option<i64>,
    pub spare_quantity: Option<i64>,
}

/// Branch-specific part of the payload. Only one shape can ever be present.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutPayload {
    Modules(Vec<ModuleDto>),
    /// JSON text of `Vec<CabinetDto>`; the endpoint expects it as one opaque field.
    Cabinets(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PayloadFiles {
    pub connection_file: Attachment,
    pub config_file: Attachment,
    pub version_file: Attachment,
}

impl PayloadFiles {
    pub fn iter(&self) -> impl Iterator<Item = (FileSlot, &Attachment)> {
        [
            (FileSlot::Connection, &self.connection_file),
            (FileSlot::Config, &self.config_file),
            (FileSlot::Version, &self.version_file),
        ]
        .into_iter()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionPayload {
    pub name: String,
    pub screen_type: ScreenType,
    pub solution_type: SolutionType,
    pub location: String,
    pub pixel_screen: String,
    pub description: Option<String>,
    pub components: Vec<ComponentLine>,
    pub files: PayloadFiles,
    pub layout: LayoutPayload,
}

impl SubmissionPayload {
    /// Scalar text parts in wire order. Absent optional values produce no part.
    pub fn text_parts(&self) -> Vec<(&'static str, String)> {
        let mut parts = vec![
            ("name", self.name.clone()),
            ("screenType", self.screen_type.as_wire().to_string()),
            ("solutionType", self.solution_type.as_wire().to_string()),
            ("location", self.location.clone()),
            ("pixelScreen", self.pixel_screen.clone()),
        ];
        if let Some(description) = &self.description {
            parts.push(("description", description.clone()));
        }

        for line in &self.components {
            let (type_key, quantity_key, spare_key) = line.kind.wire_names();
            if let Some(type_name) = &line.type_name {
                parts.push((type_key, type_name.clone()));
            }
            if let Some(quantity) = line.quantity {
                parts.push((quantity_key, quantity.to_string()));
            }
            if let (Some(key), Some(spare)) = (spare_key, line.spare_quantity) {
                parts.push((key, spare.to_string()));
            }
        }

        parts
    }

    /// The branch-specific part as (name, body, content type).
    pub fn layout_part(&self) -> Result<(&'static str, String, &'static str), serde_json::Error> {
        match &self.layout {
            LayoutPayload::Modules(modules) => Ok((
                MODULES_PART,
                serde_json::to_string(modules)?,
                "application/json",
            )),
            LayoutPayload::Cabinets(serialized) => {
                Ok((CABINETS_PART, serialized.clone(), "text/plain"))
            }
        }
    }
}
