//! Threshold rules behind the fleet dashboard figures

use crate::model::ComplianceState;

/// Inspections on record needed for a driver or vehicle to be in good standing
pub const ACTIVITY_NORMAL_MIN: u64 = 10;
/// Inspections on record below which a driver or vehicle is critical
pub const ACTIVITY_WARNING_MIN: u64 = 5;

/// Compliance state from the number of inspections on record
pub fn activity_state(inspection_count: u64) -> ComplianceState {
    if inspection_count >= ACTIVITY_NORMAL_MIN {
        ComplianceState::Normal
    } else if inspection_count >= ACTIVITY_WARNING_MIN {
        ComplianceState::Warning
    } else {
        ComplianceState::Critical
    }
}

const MONTH_NAMES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

/// Spanish month name for 1-12
pub fn month_name(month: u8) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_NAMES.get(usize::from(i)))
        .copied()
        .unwrap_or("Mes Inválido")
}

/// Label such as "Enero 2024"
pub fn month_label(month: u8, year: i32) -> String {
    format!("{} {}", month_name(month), year)
}
