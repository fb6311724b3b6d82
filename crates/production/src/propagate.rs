//! Production cost propagation.

use std::collections::HashMap;

use millstock_core::{DomainError, DomainResult, InventoryLotId, QTY_EPSILON};

use crate::process::Process;

/// Fill every output's `total_cost` and `cost_per_unit` from the resolved
/// costs of the inputs it consumed.
///
/// Pure function of the given cost map; nothing is persisted here. The
/// caller (process creation/update) saves the returned process and writes
/// the corresponding ledger events. Because propagation is cheap and
/// re-derivable, the system recomputes on demand instead of maintaining a
/// cache that would need invalidation whenever an ancestor lot's cost moves.
pub fn propagate_costs(
    process: &Process,
    input_costs: &HashMap<InventoryLotId, f64>,
) -> DomainResult<Process> {
    let mut result = process.clone();

    for output in result.outputs_mut() {
        let mut total_cost = 0.0;
        for usage in &output.inputs_used {
            let cost = input_costs.get(&usage.lot_id).ok_or_else(|| {
                DomainError::consistency(format!(
                    "no resolved cost for input lot {}",
                    usage.lot_id
                ))
            })?;
            total_cost += usage.quantity * cost;
        }
        output.total_cost = total_cost;
        output.cost_per_unit = if output.quantity <= QTY_EPSILON {
            0.0
        } else {
            total_cost / output.quantity
        };
    }

    Ok(result)
}
