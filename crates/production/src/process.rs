use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use millstock_core::{
    DomainError, DomainResult, InventoryLotId, MaterialId, ProcessId, QTY_EPSILON, WarehouseId,
};

/// Tolerance for conservation sums.
///
/// Looser than `QTY_EPSILON` because per-input usage totals are built by
/// summing many f64 terms.
pub const BALANCE_EPSILON: f64 = 1e-6;

/// One consumed input lot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessInput {
    pub lot_id: InventoryLotId,
    pub quantity: f64,
}

/// How much of one input lot went into a particular output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputUsage {
    pub lot_id: InventoryLotId,
    pub quantity: f64,
}

/// One produced output lot, with its share of the consumed inputs and the
/// costs filled in by propagation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessOutput {
    pub material_id: MaterialId,
    pub lot_id: InventoryLotId,
    pub quantity: f64,
    pub inputs_used: Vec<InputUsage>,
    /// Filled by [`crate::propagate_costs`]; zero until then.
    pub total_cost: f64,
    pub cost_per_unit: f64,
}

impl ProcessOutput {
    pub fn new(
        material_id: MaterialId,
        lot_id: InventoryLotId,
        quantity: f64,
        inputs_used: Vec<InputUsage>,
    ) -> Self {
        Self {
            material_id,
            lot_id,
            quantity,
            inputs_used,
            total_cost: 0.0,
            cost_per_unit: 0.0,
        }
    }
}

/// A production run: structurally immutable once created, except for the
/// explicit [`Process::add_input`] operation.
///
/// Invariants enforced at construction (and re-checked after `add_input`):
/// no duplicate lot references, every usage row names a declared input, each
/// input is fully consumed across outputs (no leakage), and no output lot
/// appears among the inputs. Transitive cycles through earlier processes are
/// caught by the cost resolver's visited set, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Process {
    pub id: ProcessId,
    /// Free-form process type, e.g. "powder_preparation".
    pub kind: String,
    inputs: Vec<ProcessInput>,
    outputs: Vec<ProcessOutput>,
    pub output_warehouse_id: WarehouseId,
    pub created_at: DateTime<Utc>,
}

impl Process {
    pub fn new(
        kind: impl Into<String>,
        inputs: Vec<ProcessInput>,
        outputs: Vec<ProcessOutput>,
        output_warehouse_id: WarehouseId,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        validate_structure(&inputs, &outputs)?;
        Ok(Self {
            id: ProcessId::new(),
            kind: kind.into(),
            inputs,
            outputs,
            output_warehouse_id,
            created_at,
        })
    }

    pub fn inputs(&self) -> &[ProcessInput] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[ProcessOutput] {
        &self.outputs
    }

    pub(crate) fn outputs_mut(&mut self) -> &mut [ProcessOutput] {
        &mut self.outputs
    }

    pub fn output_for_lot(&self, lot_id: InventoryLotId) -> Option<&ProcessOutput> {
        self.outputs.iter().find(|o| o.lot_id == lot_id)
    }

    /// Append one more consumed input after creation.
    ///
    /// The new quantity is spread across the existing outputs in proportion
    /// to each output's share of the total output quantity, so the
    /// full-consumption invariant keeps holding. The caller is responsible
    /// for re-propagating costs and appending the consuming ledger event.
    pub fn add_input(&mut self, lot_id: InventoryLotId, quantity: f64) -> DomainResult<()> {
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(DomainError::validation("input quantity must be positive"));
        }
        if self.inputs.iter().any(|i| i.lot_id == lot_id) {
            return Err(DomainError::validation(
                "lot is already an input of this process",
            ));
        }
        if self.outputs.iter().any(|o| o.lot_id == lot_id) {
            return Err(DomainError::validation(
                "a lot cannot be an input to the process that produced it",
            ));
        }

        let total_output: f64 = self.outputs.iter().map(|o| o.quantity).sum();
        let Some(last_nonzero) = self.outputs.iter().rposition(|o| o.quantity > QTY_EPSILON) else {
            return Err(DomainError::validation(
                "cannot redistribute input across outputs with zero total quantity",
            ));
        };

        // Proportional split; the last receiving output takes the float
        // remainder so the usage rows sum exactly to `quantity`.
        let mut assigned = 0.0;
        for (idx, output) in self.outputs.iter_mut().enumerate() {
            if output.quantity <= QTY_EPSILON {
                continue;
            }
            let share = if idx == last_nonzero {
                quantity - assigned
            } else {
                quantity * (output.quantity / total_output)
            };
            assigned += share;
            output.inputs_used.push(InputUsage {
                lot_id,
                quantity: share,
            });
        }

        self.inputs.push(ProcessInput { lot_id, quantity });
        validate_structure(&self.inputs, &self.outputs)
    }
}

fn validate_structure(inputs: &[ProcessInput], outputs: &[ProcessOutput]) -> DomainResult<()> {
    if outputs.is_empty() {
        return Err(DomainError::validation(
            "process must produce at least one output",
        ));
    }

    let mut input_lots = HashSet::new();
    for input in inputs {
        if !input.quantity.is_finite() || input.quantity <= 0.0 {
            return Err(DomainError::validation("input quantity must be positive"));
        }
        if !input_lots.insert(input.lot_id) {
            return Err(DomainError::validation(format!(
                "duplicate input lot {}",
                input.lot_id
            )));
        }
    }

    let mut output_lots = HashSet::new();
    let mut output_materials = HashSet::new();
    for output in outputs {
        if !output.quantity.is_finite() || output.quantity < 0.0 {
            return Err(DomainError::validation(
                "output quantity must be a non-negative number",
            ));
        }
        if !output_lots.insert(output.lot_id) {
            return Err(DomainError::validation(format!(
                "duplicate output lot {}",
                output.lot_id
            )));
        }
        if !output_materials.insert(output.material_id) {
            return Err(DomainError::validation(format!(
                "duplicate output material {}",
                output.material_id
            )));
        }
        if input_lots.contains(&output.lot_id) {
            return Err(DomainError::validation(
                "a lot cannot be an input to the process that produced it",
            ));
        }
        for usage in &output.inputs_used {
            if !usage.quantity.is_finite() || usage.quantity <= 0.0 {
                return Err(DomainError::validation("usage quantity must be positive"));
            }
            if !input_lots.contains(&usage.lot_id) {
                return Err(DomainError::validation(format!(
                    "usage references lot {} which is not a process input",
                    usage.lot_id
                )));
            }
        }
    }

    // Full consumption: every input's quantity reconciles exactly with the
    // usage rows that reference it.
    let mut consumed: HashMap<InventoryLotId, f64> = HashMap::new();
    for output in outputs {
        for usage in &output.inputs_used {
            *consumed.entry(usage.lot_id).or_insert(0.0) += usage.quantity;
        }
    }
    for input in inputs {
        let used = consumed.get(&input.lot_id).copied().unwrap_or(0.0);
        if (used - input.quantity).abs() > BALANCE_EPSILON {
            return Err(DomainError::validation(format!(
                "input lot {} declares quantity {} but outputs consume {}",
                input.lot_id, input.quantity, used
            )));
        }
    }

    Ok(())
}
