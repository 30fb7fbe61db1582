//! HQ-FO-40 pre-operational vehicle checklist

use crate::model::{ChecklistAnswer, ChecklistSummary};

/// A checklist element and whether a failure grounds the vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecklistElement {
    pub name: &'static str,
    pub critical: bool,
}

const fn element(name: &'static str, critical: bool) -> ChecklistElement {
    ChecklistElement { name, critical }
}

pub const CHECKLIST_ELEMENTS: &[ChecklistElement] = &[
    element("ALTAS Y BAJAS", false),
    element("DIRECCIONALES DERECHA E IZQUIERDA", true),
    element("LUCES DE PARQUEO", true),
    element("LUCES DE FRENO", true),
    element("LUCES DE REVERSA", true),
    element("ESPEJOS", true),
    element("VIDRIO FRONTAL", true),
    element("ORDEN Y ASEO", false),
    element("PITO", true),
    element("GPS Y MONITOREO", false),
    element("FRENOS", true),
    element("FRENOS DE EMERGENCIA", true),
    element("CINTURONES DE SEGURIDAD", true),
    element("PUERTAS", true),
    element("VIDRIOS", false),
    element("LIMPIA BRISAS", true),
    element("EXTINTOR", true),
    element("BOTIQUIN", true),
    element("TAPICERIA", false),
    element("INDICADORES DEL TABLERO", true),
    element("OBJETOS SUELTOS", false),
    element("ACEITE DEL MOTOR", true),
    element("FLUIDO DE FRENOS", true),
    element("FLUIDO DE DIRECCION", true),
    element("FLUIDO REFRIGERANTE", true),
    element("FLUIDO LIMPIA PARABRISAS", false),
    element("CORREAS", true),
    element("BATERIAS", true),
    element("LLANTAS LABRADO", true),
    element("LLANTAS CORTADURAS", true),
    element("LLANTA DE REPUESTO", true),
    element("PERNOS DE LLANTAS", true),
    element("SUSPENSION", true),
    element("DIRECCION Y TERMINALES", true),
    element("TAPA DE COMBUSTIBLE", false),
    element("EQUIPO DE CARRETERA", true),
    element("KIT AMBIENTAL", false),
    element("DOCUMENTACION DEL VEHICULO", true),
];

/// Look up an element by name, ignoring case and surrounding whitespace
pub fn checklist_element(name: &str) -> Option<&'static ChecklistElement> {
    let wanted = name.trim().to_uppercase();
    CHECKLIST_ELEMENTS.iter().find(|e| e.name == wanted)
}

/// Count failures; elements missing from the table count as minor
pub fn summarize_checklist(answers: &[ChecklistAnswer]) -> ChecklistSummary {
    let mut summary = ChecklistSummary {
        inspected: answers.len(),
        ..Default::default()
    };

    for answer in answers.iter().filter(|a| !a.compliant) {
        let critical = checklist_element(&answer.element).is_some_and(|e| e.critical);
        if critical {
            summary.critical_failures += 1;
        } else {
            summary.minor_failures += 1;
        }
        summary.failed_elements.push(answer.element.trim().to_string());
    }

    summary
}
