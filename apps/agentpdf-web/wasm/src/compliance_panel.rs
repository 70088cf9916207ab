use compliance_engine::rules::{attorney_fees, deposit, notices, prohibited};
use serde::{Deserialize, Serialize};
use shared_types::{Severity, Violation};
use wasm_bindgen::prelude::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViolationItem {
    pub id: String,
    pub violation: Violation,
    pub is_highlighted: bool,
}

#[wasm_bindgen]
pub struct CompliancePanel {
    violations: Vec<ViolationItem>,
    selected_id: Option<String>,
}

#[allow(clippy::derivable_impls)]
impl Default for CompliancePanel {
    fn default() -> Self {
        Self {
            violations: Vec::new(),
            selected_id: None,
        }
    }
}

impl CompliancePanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_violations(&mut self, violations: Vec<Violation>) {
        self.violations = violations
            .into_iter()
            .enumerate()
            .map(|(idx, violation)| ViolationItem {
                id: format!("violation-{}", idx),
                violation,
                is_highlighted: false,
            })
            .collect();
    }

    pub fn violations(&self) -> Vec<&Violation> {
        self.violations.iter().map(|item| &item.violation).collect()
    }

    pub fn filter_by_severity(&self, severity: Severity) -> Vec<&Violation> {
        self.violations
            .iter()
            .filter(|item| item.violation.severity == severity)
            .map(|item| &item.violation)
            .collect()
    }

    pub fn violations_for_page(&self, page: u32) -> Vec<&Violation> {
        self.violations
            .iter()
            .filter(|item| item.violation.page == Some(page))
            .map(|item| &item.violation)
            .collect()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.violations).unwrap_or_default()
    }

    pub fn select_violation(&mut self, id: &str) {
        // Clear previous selection
        for item in &mut self.violations {
            item.is_highlighted = false;
        }

        // Set new selection
        if let Some(item) = self.violations.iter_mut().find(|item| item.id == id) {
            item.is_highlighted = true;
            self.selected_id = Some(id.to_string());
        } else {
            self.selected_id = None;
        }
    }

    pub fn get_selected(&self) -> Option<&ViolationItem> {
        self.selected_id
            .as_ref()
            .and_then(|id| self.violations.iter().find(|item| &item.id == id))
    }

    /// Run comprehensive compliance check combining all rules
    pub fn run_compliance_check(&mut self, text: &str) {
        let mut all_violations = Vec::new();

        // Check prohibited provisions (§ 83.47)
        all_violations.extend(prohibited::check_prohibited_provisions(text));

        // Check security deposit rules (§ 83.49)
        all_violations.extend(deposit::check_security_deposit(text));

        // Check attorney fees clauses (§ 83.49)
        all_violations.extend(attorney_fees::check_attorney_fees(text));

        // Check notice requirements (§ 83.56, § 83.57)
        all_violations.extend(notices::check_notice_requirements(text));

        self.set_violations(all_violations);
    }
}

// WASM bindings
#[wasm_bindgen]
impl CompliancePanel {
    #[wasm_bindgen(constructor)]
    pub fn new_wasm() -> Self {
        Self::new()
    }

    #[wasm_bindgen(js_name = runComplianceCheck)]
    pub fn run_compliance_check_wasm(&mut self, text: &str) {
        self.run_compliance_check(text);
    }

    #[wasm_bindgen(js_name = getViolationsJson)]
    pub fn get_violations_json(&self) -> String {
        self.to_json()
    }

    #[wasm_bindgen(js_name = getCriticalCount)]
    pub fn get_critical_count(&self) -> u32 {
        self.violations
            .iter()
            .filter(|item| item.violation.severity == Severity::Critical)
            .count() as u32
    }

    #[wasm_bindgen(js_name = getWarningCount)]
    pub fn get_warning_count(&self) -> u32 {
        self.violations
            .iter()
            .filter(|item| item.violation.severity == Severity::Warning)
            .count() as u32
    }

    #[wasm_bindgen(js_name = getInfoCount)]
    pub fn get_info_count(&self) -> u32 {
        self.violations
            .iter()
            .filter(|item| item.violation.severity == Severity::Info)
            .count() as u32
    }

    #[wasm_bindgen(js_name = selectViolation)]
    pub fn select_violation_wasm(&mut self, id: &str) {
        self.select_violation(id);
    }

    #[wasm_bindgen(js_name = getSelectedJson)]
    pub fn get_selected_json(&self) -> Option<String> {
        self.get_selected()
            .and_then(|item| serde_json::to_string(item).ok())
    }

    #[wasm_bindgen(js_name = clearViolations)]
    pub fn clear_violations(&mut self) {
        self.violations.clear();
        self.selected_id = None;
    }
}
