// Screen draft model
// The aggregate the registration wizard edits. Only the wizard controller mutates it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

// =========================
// Choices
// =========================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScreenType {
    Indoor,
    Outdoor,
}

impl ScreenType {
    pub const ALL: [ScreenType; 2] = [ScreenType::Indoor, ScreenType::Outdoor];

    pub fn as_wire(&self) -> &'static str {
        match self {
            ScreenType::Indoor => "INDOOR",
            ScreenType::Outdoor => "OUTDOOR",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScreenType::Indoor => "Indoor",
            ScreenType::Outdoor => "Outdoor",
        }
    }

    /// Accepts the wire name or the label, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_wire().eq_ignore_ascii_case(s) || t.label().eq_ignore_ascii_case(s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolutionType {
    CabinetSolution,
    ModuleSolution,
}

impl SolutionType {
    pub const ALL: [SolutionType; 2] = [SolutionType::CabinetSolution, SolutionType::ModuleSolution];

    pub fn as_wire(&self) -> &'static str {
        match self {
            SolutionType::CabinetSolution => "CABINET_SOLUTION",
            SolutionType::ModuleSolution => "MODULE_SOLUTION",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SolutionType::CabinetSolution => "Cabinet solution",
            SolutionType::ModuleSolution => "Module solution",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_wire().eq_ignore_ascii_case(s) || t.label().eq_ignore_ascii_case(s))
    }
}

// =========================
// Numeric input
// =========================

/// A numeric form value after coercion. Unparseable text is kept so it can be
/// shown back to the user and reported by the validator.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum NumericInput<T> {
    #[default]
    Empty,
    Value(T),
    Malformed(String),
}

impl<T: Copy + fmt::Display> NumericInput<T> {
    pub fn is_empty(&self) -> bool {
        matches!(self, NumericInput::Empty)
    }

    pub fn value(&self) -> Option<T> {
        match self {
            NumericInput::Value(v) => Some(*v),
            _ => None,
        }
    }

    pub fn display(&self) -> String {
        match self {
            NumericInput::Empty => String::new(),
            NumericInput::Value(v) => v.to_string(),
            NumericInput::Malformed(raw) => raw.clone(),
        }
    }
}

// =========================
// Component groups
// =========================

/// Hardware and cabling components recorded as (type, quantity, spare quantity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComponentKind {
    PowerSupply,
    ReceivingCard,
    Media,
    Hub,
    Fan,
    MainPowerCable,
    LoopPowerCable,
    MainDataCable,
    LoopDataCable,
}

/// Lower bound a quantity must respect once its component type is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityFloor {
    Positive,
    NonNegative,
}

impl ComponentKind {
    pub const COUNT: usize = 9;

    pub const ALL: [ComponentKind; Self::COUNT] = [
        ComponentKind::PowerSupply,
        ComponentKind::ReceivingCard,
        ComponentKind::Media,
        ComponentKind::Hub,
        ComponentKind::Fan,
        ComponentKind::MainPowerCable,
        ComponentKind::LoopPowerCable,
        ComponentKind::MainDataCable,
        ComponentKind::LoopDataCable,
    ];

    /// Components captured on the screen info step.
    pub const HARDWARE: [ComponentKind; 5] = [
        ComponentKind::PowerSupply,
        ComponentKind::ReceivingCard,
        ComponentKind::Media,
        ComponentKind::Hub,
        ComponentKind::Fan,
    ];

    /// Components captured on the cables step.
    pub const CABLES: [ComponentKind; 4] = [
        ComponentKind::MainPowerCable,
        ComponentKind::LoopPowerCable,
        ComponentKind::MainDataCable,
        ComponentKind::LoopDataCable,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Wire names for (type, quantity, spare quantity).
    pub fn wire_names(self) -> (&'static str, &'static str, Option<&'static str>) {
        match self {
            ComponentKind::PowerSupply => (
                "powerSupply",
                "powerSupplyQuantity",
                Some("sparePowerSupplyQuantity"),
            ),
            ComponentKind::ReceivingCard => (
                "receivingCard",
                "receivingCardQuantity",
                Some("spareReceivingCardQuantity"),
            ),
            ComponentKind::Media => ("media", "mediaQuantity", Some("spareMediaQuantity")),
            ComponentKind::Hub => ("hub", "hubQuantity", Some("spareHubQuantity")),
            ComponentKind::Fan => ("fan", "fanQuantity", None),
            ComponentKind::MainPowerCable => (
                "mainPowerCable",
                "mainPowerCableQuantity",
                Some("spareMainPowerCableQuantity"),
            ),
            ComponentKind::LoopPowerCable => (
                "loopPowerCable",
                "loopPowerCableQuantity",
                Some("spareLoopPowerCableQuantity"),
            ),
            ComponentKind::MainDataCable => (
                "mainDataCable",
                "mainDataCableQuantity",
                Some("spareMainDataCableQuantity"),
            ),
            ComponentKind::LoopDataCable => (
                "loopDataCable",
                "loopDataCableQuantity",
                Some("spareLoopDataCableQuantity"),
            ),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ComponentKind::PowerSupply => "Power supply",
            ComponentKind::ReceivingCard => "Receiving card",
            ComponentKind::Media => "Media player",
            ComponentKind::Hub => "Hub",
            ComponentKind::Fan => "Fan",
            ComponentKind::MainPowerCable => "Main power cable",
            ComponentKind::LoopPowerCable => "Loop power cable",
            ComponentKind::MainDataCable => "Main data cable",
            ComponentKind::LoopDataCable => "Loop data cable",
        }
    }

    pub fn has_spare(self) -> bool {
        self.wire_names().2.is_some()
    }

    // Fans may legitimately be recorded with a zero count.
    pub fn quantity_floor(self) -> QuantityFloor {
        match self {
            ComponentKind::Fan => QuantityFloor::NonNegative,
            _ => QuantityFloor::Positive,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComponentGroup {
    pub type_name: String,
    pub quantity: NumericInput<i64>,
    pub spare_quantity: NumericInput<i64>,
}

/// One group per [`ComponentKind`], addressed by kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentSet {
    groups: [ComponentGroup; ComponentKind::COUNT],
}

impl Default for ComponentSet {
    fn default() -> Self {
        Self {
            groups: std::array::from_fn(|_| ComponentGroup::default()),
        }
    }
}

impl ComponentSet {
    pub fn get(&self, kind: ComponentKind) -> &ComponentGroup {
        &self.groups[kind.index()]
    }

    pub fn get_mut(&mut self, kind: ComponentKind) -> &mut ComponentGroup {
        &mut self.groups[kind.index()]
    }
}

// =========================
// Attachments
// =========================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FileSlot {
    Connection,
    Config,
    Version,
}

impl FileSlot {
    pub const ALL: [FileSlot; 3] = [FileSlot::Connection, FileSlot::Config, FileSlot::Version];

    pub fn wire_name(self) -> &'static str {
        match self {
            FileSlot::Connection => "connectionFile",
            FileSlot::Config => "configFile",
            FileSlot::Version => "versionFile",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FileSlot::Connection => "Connection file",
            FileSlot::Config => "Config file",
            FileSlot::Version => "Version file",
        }
    }
}

/// Opaque file handle. The wizard never looks inside `bytes`.
#[derive(Clone, PartialEq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Arc<[u8]>,
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let file_name = file_name.into();
        Self {
            content_type: guess_content_type(&file_name).to_string(),
            file_name,
            bytes: bytes.into(),
        }
    }

    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());
        Ok(Self::new(file_name, bytes))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

fn guess_content_type(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, e)| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "json" => "application/json",
        "xml" => "application/xml",
        "zip" => "application/zip",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "txt" | "log" | "ini" | "cfg" => "text/plain",
        "csv" => "text/csv",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Attachments {
    pub connection_file: Option<Attachment>,
    pub config_file: Option<Attachment>,
    pub version_file: Option<Attachment>,
}

impl Attachments {
    pub fn get(&self, slot: FileSlot) -> Option<&Attachment> {
        match slot {
            FileSlot::Connection => self.connection_file.as_ref(),
            FileSlot::Config => self.config_file.as_ref(),
            FileSlot::Version => self.version_file.as_ref(),
        }
    }

    pub fn set(&mut self, slot: FileSlot, file: Option<Attachment>) {
        match slot {
            FileSlot::Connection => self.connection_file = file,
            FileSlot::Config => self.config_file = file,
            FileSlot::Version => self.version_file = file,
        }
    }
}

// =========================
// Repeated entries
// =========================

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModuleEntry {
    pub width_quantity: NumericInput<i64>,
    pub height_quantity: NumericInput<i64>,
    pub height: NumericInput<f64>,
    pub width: NumericInput<f64>,
    pub module_batch_number: String,
    pub is_width: bool,
    pub is_height: bool,
}

/// The module record nested in a cabinet (no width/height flags).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CabinetModule {
    pub width_quantity: NumericInput<i64>,
    pub height_quantity: NumericInput<i64>,
    pub height: NumericInput<f64>,
    pub width: NumericInput<f64>,
    pub module_batch_number: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CabinetEntry {
    pub cabinet_name: String,
    pub width_quantity: NumericInput<i64>,
    pub height_quantity: NumericInput<i64>,
    pub height: NumericInput<f64>,
    pub width: NumericInput<f64>,
    pub is_width: bool,
    pub is_height: bool,
    pub module: CabinetModule,
}

/// The collection that is meaningful for the chosen solution type.
#[derive(Debug, Clone, PartialEq)]
pub enum Solution {
    Cabinet(Vec<CabinetEntry>),
    Module(Vec<ModuleEntry>),
}

impl Solution {
    pub fn solution_type(&self) -> SolutionType {
        match self {
            Solution::Cabinet(_) => SolutionType::CabinetSolution,
            Solution::Module(_) => SolutionType::ModuleSolution,
        }
    }
}

// =========================
// Aggregate
// =========================

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScreenInfo {
    pub name: String,
    pub screen_type: Option<ScreenType>,
    pub location: String,
    pub pixel_screen: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScreenDraft {
    pub info: ScreenInfo,
    pub components: ComponentSet,
    pub attachments: Attachments,
    /// `None` until a solution type is chosen.
    pub solution: Option<Solution>,
}

impl ScreenDraft {
    pub fn solution_type(&self) -> Option<SolutionType> {
        self.solution.as_ref().map(Solution::solution_type)
    }
}
