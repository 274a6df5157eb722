use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::constants;
use crate::ledger::StockLedger;
use crate::models::{
    ItemMaster, LineValidation, MovementDocument, MovementError, MovementLine, MovementType,
    ReasonCodePolicy, StockImpactEntry, StockSnapshot, ValidationStatus,
};
use crate::utils::business_today;

use super::direction::apply_type_switch;
use super::impact::compute_impact;
use super::line_validation::{validate_line, LineContext};
use super::resolver::{collect_balance_keys, collect_touched_locations, fetch_snapshot};

/// Combined document/line/impact findings gating draft-save and submit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GateResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Document-level findings independent of lines and stock
pub fn document_errors(document: &MovementDocument) -> Vec<String> {
    let mut errors = Vec::new();
    if document.header.reason_code.trim().is_empty() {
        errors.push(constants::MSG_REASON_REQUIRED.to_string());
    }
    if document.lines.is_empty() {
        errors.push(constants::MSG_NO_LINES.to_string());
    }
    errors
}

/// Fold document, line and impact findings into the submission gate.
///
/// Blocking findings land in `errors` (disabling both draft-save and
/// submit); warning-status line messages land in `warnings` and never
/// block anything.
pub fn evaluate_gate(
    document: &MovementDocument,
    line_validations: &[LineValidation],
    impact_errors: &[String],
) -> GateResult {
    let mut gate = GateResult {
        errors: document_errors(document),
        warnings: Vec::new(),
    };

    for (index, validation) in line_validations.iter().enumerate() {
        let line_no = index + 1;
        match validation.status {
            ValidationStatus::Error => {
                for message in &validation.messages {
                    gate.errors.push(format!("Line {line_no}: {message}"));
                }
            }
            ValidationStatus::Warning => {
                for message in &validation.messages {
                    gate.warnings.push(format!("Line {line_no}: {message}"));
                }
            }
            ValidationStatus::Valid => {}
        }
    }

    gate.errors.extend(impact_errors.iter().cloned());
    gate
}

/// One editing session over an in-memory movement document.
///
/// Owns the document, the item catalog view and the latest stock snapshot;
/// recomputes validations, impact and the submission gate after every
/// mutation. State never outlives the session: only a submitted or drafted
/// document crosses into the ledger.
pub struct MovementSession {
    ledger: Arc<dyn StockLedger>,
    config: EngineConfig,
    document: MovementDocument,
    items: HashMap<String, ItemMaster>,
    reason_policy: ReasonCodePolicy,
    snapshot: StockSnapshot,
    latest_generation: u64,
    line_validations: Vec<LineValidation>,
    stock_impact: Vec<StockImpactEntry>,
    impact_errors: Vec<String>,
    gate: GateResult,
    submission_error: Option<String>,
}

impl MovementSession {
    pub async fn open(
        ledger: Arc<dyn StockLedger>,
        movement_type: MovementType,
        config: EngineConfig,
    ) -> Self {
        let mut session = Self {
            ledger,
            config,
            document: MovementDocument::new(movement_type),
            items: HashMap::new(),
            reason_policy: ReasonCodePolicy::default(),
            snapshot: StockSnapshot::empty(),
            latest_generation: 0,
            line_validations: Vec::new(),
            stock_impact: Vec::new(),
            impact_errors: Vec::new(),
            gate: GateResult::default(),
            submission_error: None,
        };
        session.load_reason_codes().await;
        session.recompute();
        info!(
            "Opened movement session {} ({})",
            session.document.document_id,
            movement_type.as_str()
        );
        session
    }

    /// Register an item master so its industry flags drive validation
    pub fn register_item(&mut self, item: ItemMaster) {
        self.items.insert(item.item_key.clone(), item);
        self.recompute();
    }

    pub fn document(&self) -> &MovementDocument {
        &self.document
    }

    pub fn line_validations(&self) -> &[LineValidation] {
        &self.line_validations
    }

    pub fn stock_impact(&self) -> &[StockImpactEntry] {
        &self.stock_impact
    }

    pub fn impact_errors(&self) -> &[String] {
        &self.impact_errors
    }

    pub fn snapshot(&self) -> &StockSnapshot {
        &self.snapshot
    }

    pub fn reason_policy(&self) -> &ReasonCodePolicy {
        &self.reason_policy
    }

    /// Blocking errors plus any pending submission failure, for display
    pub fn errors(&self) -> Vec<String> {
        let mut errors = self.gate.errors.clone();
        if let Some(submission_error) = &self.submission_error {
            errors.push(submission_error.clone());
        }
        errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.gate.warnings
    }

    /// Submit is enabled only while no blocking validation errors remain;
    /// warnings never gate it
    pub fn can_submit(&self) -> bool {
        self.gate.errors.is_empty()
    }

    pub fn can_save_draft(&self) -> bool {
        self.gate.errors.is_empty()
    }

    /// Switch the document's movement type, clearing now-meaningless
    /// default locations and re-resolving allowed reason codes and stock
    pub async fn set_movement_type(&mut self, movement_type: MovementType) {
        apply_type_switch(&mut self.document.header, movement_type);
        self.submission_error = None;
        self.load_reason_codes().await;
        self.refresh_stock().await;
    }

    pub fn set_reason_code(&mut self, code: &str) {
        self.document.header.reason_code = code.to_string();
        self.submission_error = None;
        self.recompute();
    }

    pub fn set_requires_approval(&mut self, requires_approval: bool) {
        self.document.header.requires_approval = requires_approval;
    }

    pub async fn set_default_from_location(&mut self, location: Option<String>) {
        self.document.header.default_from_location = location;
        self.submission_error = None;
        self.refresh_stock().await;
    }

    pub async fn set_default_to_location(&mut self, location: Option<String>) {
        self.document.header.default_to_location = location;
        self.submission_error = None;
        self.refresh_stock().await;
    }

    pub async fn add_line(&mut self, line: MovementLine) -> usize {
        self.document.lines.push(line);
        self.submission_error = None;
        self.refresh_stock().await;
        self.document.lines.len() - 1
    }

    pub async fn update_line(
        &mut self,
        index: usize,
        edit: impl FnOnce(&mut MovementLine),
    ) -> Result<(), MovementError> {
        let line = self
            .document
            .lines
            .get_mut(index)
            .ok_or(MovementError::LineOutOfRange { index })?;
        edit(line);
        self.submission_error = None;
        self.refresh_stock().await;
        Ok(())
    }

    /// Feed a batch editor's reconciled total back into its owning line.
    /// Only valid grid results are applied; the line quantity becomes the
    /// derived quantity summed from the contributing rows.
    pub async fn apply_batch_total(
        &mut self,
        index: usize,
        result: &crate::models::NumberGridResult,
    ) -> Result<(), MovementError> {
        if !result.is_valid {
            return Err(MovementError::ValidationFailed(
                result
                    .validation_errors
                    .iter()
                    .map(|e| e.message.clone())
                    .collect(),
            ));
        }
        let derived = result.derived_quantity;
        self.update_line(index, |line| line.quantity = derived).await
    }

    pub async fn remove_line(&mut self, index: usize) -> Result<(), MovementError> {
        if index >= self.document.lines.len() {
            return Err(MovementError::LineOutOfRange { index });
        }
        self.document.lines.remove(index);
        self.submission_error = None;
        self.refresh_stock().await;
        Ok(())
    }

    /// Start a new fetch generation; any earlier generation still in flight
    /// becomes stale from this moment
    pub fn begin_generation(&mut self) -> u64 {
        self.latest_generation += 1;
        self.latest_generation
    }

    /// Install a resolved snapshot unless a newer generation has started
    /// since it was fetched. Superseded snapshots are dropped silently.
    pub fn apply_snapshot(&mut self, snapshot: StockSnapshot) -> bool {
        if snapshot.generation != self.latest_generation {
            debug!(
                stale = snapshot.generation,
                latest = self.latest_generation,
                "Discarding superseded stock snapshot"
            );
            return false;
        }
        self.snapshot = snapshot;
        self.recompute();
        true
    }

    /// Resolve every balance and location the current document touches and
    /// install the result under a fresh generation
    pub async fn refresh_stock(&mut self) {
        let generation = self.begin_generation();
        let keys = collect_balance_keys(&self.document.lines, &self.document.header);
        let locations = collect_touched_locations(&self.document.lines, &self.document.header);
        let snapshot =
            fetch_snapshot(self.ledger.as_ref(), generation, &keys, &locations).await;
        self.apply_snapshot(snapshot);
    }

    /// Recompute validations, impact and the gate from current state.
    /// Pure with respect to lines/header/snapshot; invoked after every
    /// mutation instead of relying on framework memoization.
    pub fn recompute(&mut self) {
        let today = business_today(self.config.business_timezone);
        let header = &self.document.header;
        let snapshot = &self.snapshot;

        let line_validations: Vec<LineValidation> = self
            .document
            .lines
            .iter()
            .map(|line| {
                let ctx = LineContext {
                    header,
                    item: self.items.get(&line.item_key),
                    snapshot,
                    today,
                };
                validate_line(line, &ctx)
            })
            .collect();

        let impact = compute_impact(&self.document.lines, header, snapshot);
        let gate = evaluate_gate(&self.document, &line_validations, &impact.errors);

        self.line_validations = line_validations;
        self.stock_impact = impact.entries;
        self.impact_errors = impact.errors;
        self.gate = gate;
    }

    /// Submit the document for execution/approval. A ledger rejection is
    /// surfaced as a top-level document error and the in-memory document is
    /// preserved so the user can correct and retry.
    pub async fn submit(&mut self) -> Result<MovementDocument, MovementError> {
        if !self.can_submit() {
            return Err(MovementError::ValidationFailed(self.errors()));
        }
        match self.ledger.create_movement_batch(&self.document).await {
            Ok(accepted) => {
                info!("Submitted movement document {}", accepted.document_id);
                self.submission_error = None;
                Ok(accepted)
            }
            Err(e) => {
                warn!("Submission rejected for {}: {e}", self.document.document_id);
                let message = format!("Submission failed: {e}");
                self.submission_error = Some(message.clone());
                Err(MovementError::SubmissionRejected { message })
            }
        }
    }

    /// Save the document as a draft. Drafts are never routed for approval,
    /// so `requires_approval` is forced off regardless of the header flag.
    pub async fn save_draft(&mut self) -> Result<MovementDocument, MovementError> {
        if !self.can_save_draft() {
            return Err(MovementError::ValidationFailed(self.errors()));
        }
        let mut draft = self.document.clone();
        draft.header.requires_approval = false;
        match self.ledger.save_draft(&draft).await {
            Ok(saved) => {
                info!("Saved draft movement document {}", saved.document_id);
                self.submission_error = None;
                Ok(saved)
            }
            Err(e) => {
                warn!("Draft save rejected for {}: {e}", self.document.document_id);
                let message = format!("Draft save failed: {e}");
                self.submission_error = Some(message.clone());
                Err(MovementError::SubmissionRejected { message })
            }
        }
    }

    async fn load_reason_codes(&mut self) {
        match self
            .ledger
            .reason_codes_for(self.document.header.movement_type)
            .await
        {
            Ok(policy) => {
                if !policy.permits(&self.document.header.reason_code) {
                    self.document.header.reason_code =
                        policy.default_code.clone().unwrap_or_default();
                }
                self.reason_policy = policy;
            }
            Err(e) => {
                warn!("Reason code lookup failed: {e}");
                self.reason_policy = ReasonCodePolicy::default();
            }
        }
    }
}
