//! Compliance Engine - Multi-Jurisdiction Lease Compliance Checking
//!
//! Implements the "Layer Cake" architecture for residential lease compliance:
//! - Federal Layer: Lead paint, Fair Housing (baseline for all)
//! - State Layer: State-specific statutory requirements
//! - Local Layer: Municipal ordinances (Chicago RLTO, NYC rent control, etc.)
//!
//! # Example
//!
//! ```rust
//! use compliance_engine::{ComplianceEngine, Jurisdiction, State};
//! use shared_types::LeaseDocument;
//!
//! let engine = ComplianceEngine::new();
//! let jurisdiction = Jurisdiction::new(State::FL);
//!
//! let document = LeaseDocument {
//!     id: "test".to_string(),
//!     filename: "lease.pdf".to_string(),
//!     pages: 1,
//!     text_content: vec!["Tenant waives all rights.".to_string()],
//!     created_at: 0,
//! };
//!
//! let report = engine.check_compliance(&jurisdiction, &document, None);
//! assert!(!report.violations.is_empty());
//! ```

pub mod calendar;
pub mod extractors;
pub mod jurisdiction;
pub mod layers;
pub mod patterns;
pub mod rules;
pub mod states;

pub use jurisdiction::{Jurisdiction, Locality, State, Tier};

use shared_types::{ComplianceReport, LeaseDocument, Violation};

/// Multi-jurisdiction compliance engine
///
/// Checks documents against federal, state, and local compliance rules
/// following the Layer Cake architecture.
pub struct ComplianceEngine;

impl ComplianceEngine {
    pub fn new() -> Self {
        Self
    }

    /// Check compliance for a specific jurisdiction
    ///
    /// # Arguments
    /// * `jurisdiction` - The state and optional locality
    /// * `document` - The lease document to check
    /// * `year_built` - Optional year the property was built (for lead paint)
    ///
    /// # Returns
    /// ComplianceReport with all violations found
    pub fn check_compliance(
        &self,
        jurisdiction: &Jurisdiction,
        document: &LeaseDocument,
        year_built: Option<u32>,
    ) -> ComplianceReport {
        let full_text = document.text_content.join("\n");
        let violations = self.check_text_with_jurisdiction(jurisdiction, &full_text, year_built);

        ComplianceReport {
            document_id: document.id.clone(),
            violations,
            checked_at: chrono::Utc::now().timestamp() as u64,
        }
    }

    /// Check compliance on raw text for a specific jurisdiction
    pub fn check_text_with_jurisdiction(
        &self,
        jurisdiction: &Jurisdiction,
        text: &str,
        year_built: Option<u32>,
    ) -> Vec<Violation> {
        let mut violations = Vec::new();

        // Layer 1: Federal (applies to all)
        violations.extend(layers::check_federal_compliance(text, year_built));

        // Layer 2: State-specific
        violations.extend(states::check_state_compliance(jurisdiction.state, text));

        // Layer 3: Local overrides (future)
        // if let Some(ref locality) = jurisdiction.locality {
        //     violations.extend(layers::local::check_local_compliance(locality, text));
        // }

        violations
    }

    /// Legacy: Check compliance using Florida rules (backwards compatibility)
    #[deprecated(note = "Use check_compliance with Jurisdiction instead")]
    pub fn check_text(&self, text: &str) -> Vec<Violation> {
        // Maintain backwards compatibility with Florida-only checks
        let mut violations = Vec::new();
        violations.extend(rules::prohibited::check_prohibited_provisions(text));
        violations.extend(rules::deposit::check_security_deposit(text));
        violations.extend(rules::attorney_fees::check_attorney_fees(text));
        violations.extend(rules::notices::check_notice_requirements(text));
        violations
    }

    /// Get list of supported states
    pub fn supported_states(&self) -> Vec<State> {
        State::implemented_states()
    }

    /// Check if a state is fully supported
    pub fn is_state_supported(&self, state: State) -> bool {
        states::has_implementation(state)
    }

    /// Get covered statutes for a state
    pub fn covered_statutes(&self, state: State) -> Vec<&'static str> {
        states::covered_statutes(state)
    }
}

impl Default for ComplianceEngine {
    fn default() -> Self {
        Self::new()
    }
}
