//! Kanban view of the deal pipeline.

use serde::Serialize;
use tracing::{debug, info};

use super::reduce::total;
use crate::error::Result;
use crate::events::{CrmEvent, EventBus};
use crate::model::{Deal, DealStage, RecordId};
use crate::repository::Repository;

/// One stage column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardColumn {
    pub stage: DealStage,
    pub deals: Vec<Deal>,
    pub total_value: f64,
}

/// Deals grouped into stage columns, in stage order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineBoard {
    pub columns: Vec<BoardColumn>,
}

impl PipelineBoard {
    pub fn from_deals(deals: &[Deal]) -> Self {
        let columns = DealStage::ALL
            .into_iter()
            .map(|stage| {
                let deals: Vec<Deal> = deals.iter().filter(|d| d.stage == stage).cloned().collect();
                let total_value = total(&deals, |d| d.value);
                BoardColumn {
                    stage,
                    deals,
                    total_value,
                }
            })
            .collect();
        Self { columns }
    }

    pub fn column(&self, stage: DealStage) -> Option<&BoardColumn> {
        self.columns.iter().find(|column| column.stage == stage)
    }

    /// Exactly the deals in `stage`.
    pub fn stage_deals(&self, stage: DealStage) -> &[Deal] {
        self.column(stage).map(|c| c.deals.as_slice()).unwrap_or(&[])
    }

    /// Sum of values in `stage`; deals without a value add 0.
    pub fn stage_total_value(&self, stage: DealStage) -> f64 {
        self.column(stage).map_or(0.0, |c| c.total_value)
    }

    pub fn deal_count(&self) -> usize {
        self.columns.iter().map(|c| c.deals.len()).sum()
    }
}

/// Move a deal to `stage`, as a drag between columns does.
///
/// Dropping a deal on its own column changes nothing and emits no event.
pub fn move_deal(
    repo: &dyn Repository<Deal>,
    id: RecordId,
    stage: DealStage,
    events: Option<&EventBus>,
) -> Result<Deal> {
    let mut deal = repo.require(id)?;
    let from = deal.stage;
    if from == stage {
        debug!(deal_id = id, stage = %stage, "Deal already in stage");
        return Ok(deal);
    }

    deal.stage = stage;
    let updated = repo.update(deal)?;
    info!(deal_id = id, from = %from, to = %stage, "Deal moved");
    if let Some(bus) = events {
        bus.emit(CrmEvent::DealStageChanged {
            deal_id: id,
            from,
            to: stage,
        });
    }
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryRepository;
    use chrono::Utc;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn sample() -> Vec<Deal> {
        let now = Utc::now();
        vec![
            Deal::new("Acme", 100.0, DealStage::Won, now),
            Deal::new("Globex", 100.0, DealStage::Won, now),
            Deal::new("Initech", 50.0, DealStage::New, now),
        ]
    }

    #[test]
    fn test_stage_totals_and_deals() {
        let board = PipelineBoard::from_deals(&sample());
        assert_eq!(board.stage_total_value(DealStage::Won), 200.0);
        let new: Vec<_> = board.stage_deals(DealStage::New).iter().map(|d| d.name.as_str()).collect();
        assert_eq!(new, vec!["Initech"]);
        assert!(board.stage_deals(DealStage::Lost).is_empty());
        assert_eq!(board.stage_total_value(DealStage::Lost), 0.0);
        assert_eq!(board.columns.len(), DealStage::ALL.len());
        assert_eq!(board.deal_count(), 3);
    }

    #[test]
    fn test_move_deal_updates_and_emits() {
        let repo: InMemoryRepository<Deal> = InMemoryRepository::new();
        let created = repo.create(sample().remove(2)).unwrap();
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        bus.subscribe(move |event| sink.lock().push(event.clone()));

        let moved = move_deal(&repo, created.id, DealStage::Qualified, Some(&bus)).unwrap();
        assert_eq!(moved.stage, DealStage::Qualified);
        assert_eq!(repo.require(created.id).unwrap().stage, DealStage::Qualified);

        move_deal(&repo, created.id, DealStage::Qualified, Some(&bus)).unwrap();
        assert_eq!(
            *seen.lock(),
            vec![CrmEvent::DealStageChanged {
                deal_id: created.id,
                from: DealStage::New,
                to: DealStage::Qualified,
            }]
        );
    }

    #[test]
    fn test_move_missing_deal() {
        let repo: InMemoryRepository<Deal> = InMemoryRepository::new();
        let err = move_deal(&repo, 9, DealStage::Won, None).unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
    }
}
