//! Inventory item models and their entry/exit sub-ledgers

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AuditStamp, Location};

/// Classification of a supply item
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MaterialType {
    #[serde(rename = "oficina", alias = "office")]
    Office,
    #[serde(rename = "limpieza", alias = "cleaning")]
    Cleaning,
    #[serde(rename = "varios", alias = "misc")]
    Miscellaneous,
}

impl MaterialType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialType::Office => "oficina",
            MaterialType::Cleaning => "limpieza",
            MaterialType::Miscellaneous => "varios",
        }
    }
}

/// Unit in which an item's quantity is counted
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum UnitOfMeasure {
    #[serde(rename = "pieza", alias = "piece")]
    Piece,
    #[serde(rename = "litro", alias = "liter")]
    Liter,
    #[serde(rename = "kilogramo", alias = "kilogram")]
    Kilogram,
    #[serde(rename = "metro", alias = "meter")]
    Meter,
    #[serde(rename = "gramo", alias = "gram")]
    Gram,
    #[serde(rename = "mililitro", alias = "milliliter")]
    Milliliter,
    #[serde(rename = "unidad", alias = "unit")]
    Unit,
    #[serde(rename = "caja", alias = "box")]
    Box,
    #[serde(rename = "paquete", alias = "package")]
    Package,
    #[serde(rename = "rollo", alias = "roll")]
    Roll,
    #[serde(rename = "otro", alias = "other")]
    Other,
}

/// Organizational areas that may request supplies
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RequestingArea {
    #[serde(rename = "CONSEJERO JURÍDICO")]
    LegalCounsel,
    #[serde(rename = "SECRETARIA PARTICULAR Y DE COMUNICACIÓN SOCIAL")]
    PrivateSecretariat,
    #[serde(rename = "DIRECCIÓN DE COORDINACIÓN Y CONTROL DE GESTIÓN")]
    ManagementControl,
    #[serde(rename = "DIRECCIÓN GENERAL DE LO CONTENCIOSO")]
    Litigation,
    #[serde(rename = "DIRECCIÓN DE ASISTENCIA TÉCNICA Y COMBATE A LA CORRUPCIÓN")]
    TechnicalAssistance,
    #[serde(rename = "DIRECCIÓN DE SERVICIOS LEGALES")]
    LegalServices,
    #[serde(rename = "DIRECCIÓN GENERAL CONSULTIVA")]
    Advisory,
    #[serde(rename = "DIRECCIÓN DE ESTUDIOS LEGISLATIVOS")]
    LegislativeStudies,
    #[serde(rename = "DIRECCIÓN DE ESTUDIOS JURÍDICOS")]
    LegalStudies,
    #[serde(rename = "DIRECCIÓN DE COMPILACIÓN NORMATIVA, ARCHIVO E IGUALDAD DE GÉNERO")]
    RegulatoryCompilation,
    #[serde(rename = "DIRECCIÓN ADMINISTRATIVA")]
    Administration,
    #[serde(rename = "UNIDAD DE TRANSPARENCIA")]
    Transparency,
    #[serde(rename = "LIMPIEZA")]
    Cleaning,
}

/// Why an entry was appended to the ledger
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Stock received
    Restock,
    /// Quantity the item was created with
    OpeningBalance,
    /// The item was moved; quantity is a snapshot and moves no stock
    LocationChange,
}

impl EntryKind {
    /// Whether the entry's quantity counts towards the stock balance
    pub fn moves_stock(&self) -> bool {
        !matches!(self, EntryKind::LocationChange)
    }
}

/// A ledger record that increases stock (entrada). Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: Uuid,
    pub kind: EntryKind,
    pub date: DateTime<Utc>,
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_location: Option<Location>,
    pub recorded_by: AuditStamp,
}

/// A ledger record that decreases stock (salida). Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Exit {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    /// Time of day as `HH:MM`
    pub time: String,
    pub quantity: i64,
    pub reason: String,
    pub area: RequestingArea,
    pub requester: String,
    pub released_by: String,
    pub recorded_by: AuditStamp,
}

/// Demand statistics derived from exit history, recomputed on every exit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DemandMetrics {
    pub total_exits: u64,
    pub cumulative_removed: i64,
    pub last_exit_at: DateTime<Utc>,
    /// Mean exits per calendar month of operation
    pub monthly_frequency: f64,
    pub exits_this_month: u64,
    pub rotation_ratio: f64,
}

/// A stock item with its movement ledger
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: Uuid,
    pub material_type: MaterialType,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub quantity: i64,
    pub unit: UnitOfMeasure,
    pub unit_price: Decimal,
    pub minimum_stock: i64,
    pub location: Location,
    pub location_code: String,
    pub created_by: AuditStamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_by: Option<AuditStamp>,
    #[serde(default)]
    pub entries: Vec<Entry>,
    #[serde(default)]
    pub exits: Vec<Exit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demand_metrics: Option<DemandMetrics>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency token, bumped by the store on every write
    #[serde(default)]
    pub version: i64,
}

impl InventoryItem {
    /// Sum of stock-moving entries minus sum of exits.
    /// Summed in `i128`; the per-side totals can exceed `i64` even when the balance does not.
    pub fn ledger_balance(&self) -> i64 {
        let entered: i128 = self
            .entries
            .iter()
            .filter(|e| e.kind.moves_stock())
            .map(|e| i128::from(e.quantity))
            .sum();
        let removed: i128 = self.exits.iter().map(|e| i128::from(e.quantity)).sum();
        (entered - removed).clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
    }

    pub fn is_below_minimum(&self) -> bool {
        self.quantity <= self.minimum_stock
    }

    /// Case-insensitive substring match over name, material type and location code
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.material_type.as_str().contains(&needle)
            || self.location_code.to_lowercase().contains(&needle)
    }
}
