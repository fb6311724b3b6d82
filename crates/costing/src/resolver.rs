use std::collections::{HashMap, HashSet};

use millstock_core::{DomainError, DomainResult, InventoryLotId, QTY_EPSILON};
use millstock_ledger::EventOrigin;
use millstock_production::Process;

use crate::source::CostSource;

/// Resolve the weighted-average cost-per-unit of one inventory lot.
///
/// Convenience wrapper over [`CostResolver`] for single-lot queries.
pub fn resolve_cost_per_unit<S: CostSource>(
    source: &S,
    lot_id: InventoryLotId,
) -> DomainResult<f64> {
    CostResolver::new(source).resolve(lot_id)
}

/// Resolve the cost of every input lot of a process, as the map the cost
/// propagator consumes. One resolver (and thus one memo) serves all inputs.
pub fn input_cost_map<S: CostSource>(
    source: &S,
    process: &Process,
) -> DomainResult<HashMap<InventoryLotId, f64>> {
    let mut resolver = CostResolver::new(source);
    let mut costs = HashMap::with_capacity(process.inputs().len());
    for input in process.inputs() {
        let cost = resolver.resolve(input.lot_id)?;
        costs.insert(input.lot_id, cost);
    }
    Ok(costs)
}

/// Recursive cost resolution over one snapshot.
///
/// The memo lives for exactly one resolver (one logical resolution call) —
/// events can be appended between calls, so nothing is cached across them.
/// The visiting set catches production-graph cycles: the DAG invariant is
/// enforced at process construction for the direct case, but a corrupted
/// store could still produce a transitive loop, and failing fast beats
/// recursing forever.
pub struct CostResolver<'a, S: CostSource> {
    source: &'a S,
    memo: HashMap<InventoryLotId, f64>,
    visiting: HashSet<InventoryLotId>,
}

impl<'a, S: CostSource> CostResolver<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            memo: HashMap::new(),
            visiting: HashSet::new(),
        }
    }

    /// Quantity-weighted average of per-event costs across the lot's active
    /// baseline events. A lot with no such events costs zero.
    pub fn resolve(&mut self, lot_id: InventoryLotId) -> DomainResult<f64> {
        if let Some(&cost) = self.memo.get(&lot_id) {
            return Ok(cost);
        }
        if !self.visiting.insert(lot_id) {
            return Err(DomainError::consistency(format!(
                "production graph cycle through lot {lot_id}"
            )));
        }

        let result = self.resolve_uncached(lot_id);

        self.visiting.remove(&lot_id);
        if let Ok(cost) = result {
            self.memo.insert(lot_id, cost);
        }
        result
    }

    fn resolve_uncached(&mut self, lot_id: InventoryLotId) -> DomainResult<f64> {
        let events = self.source.baseline_events(lot_id)?;

        let mut quantity_sum = 0.0;
        let mut cost_sum = 0.0;
        for event in &events {
            let unit_cost = self.event_unit_cost(event)?;
            quantity_sum += event.quantity;
            cost_sum += event.quantity * unit_cost;
        }

        // Baseline quantities are positive by construction, so the sum is
        // zero only when the event set is empty.
        if quantity_sum <= QTY_EPSILON {
            Ok(0.0)
        } else {
            Ok(cost_sum / quantity_sum)
        }
    }

    fn event_unit_cost(&mut self, event: &millstock_ledger::LedgerEvent) -> DomainResult<f64> {
        if let Some(explicit) = event.explicit_cost_per_unit {
            return Ok(explicit);
        }

        match event.origin {
            EventOrigin::Purchase(item_id) => {
                let item = self.source.purchase_item(item_id)?;
                Ok(item.adjusted_price_per_unit())
            }
            EventOrigin::Process(process_id) => {
                let process = self.source.process(process_id)?;
                self.process_output_cost(&process, event.lot_id)
            }
            EventOrigin::Manual => Err(DomainError::consistency(
                "manual event without explicit cost per unit",
            )),
            _ => Err(DomainError::consistency(format!(
                "baseline event {} has a non cost-bearing origin",
                event.id
            ))),
        }
    }

    /// Cost-per-unit of one process output, from the freshly resolved costs
    /// of the inputs it consumed.
    fn process_output_cost(
        &mut self,
        process: &Process,
        lot_id: InventoryLotId,
    ) -> DomainResult<f64> {
        let output = process.output_for_lot(lot_id).ok_or_else(|| {
            DomainError::consistency(format!(
                "process {} has no output for lot {lot_id}",
                process.id
            ))
        })?;

        let mut total_cost = 0.0;
        for usage in &output.inputs_used {
            let input_cost = self.resolve(usage.lot_id)?;
            total_cost += usage.quantity * input_cost;
        }

        if output.quantity <= QTY_EPSILON {
            Ok(0.0)
        } else {
            Ok(total_cost / output.quantity)
        }
    }
}
