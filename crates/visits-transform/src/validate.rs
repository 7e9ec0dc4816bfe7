use visits_model::{Column, Dataset, VisitRecord};

/// Validator output. Every input row lands in exactly one side, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    pub accepted: Dataset,
    pub rejected: Dataset,
}

pub fn is_complete(record: &VisitRecord, required: &[Column]) -> bool {
    required.iter().all(|column| !record.is_missing(*column))
}

/// Reject rows missing any required column.
pub fn validate_required(dataset: Dataset, required: &[Column]) -> Partition {
    let (accepted, rejected): (Vec<_>, Vec<_>) = dataset
        .into_iter()
        .partition(|record| is_complete(record, required));
    Partition {
        accepted: Dataset::new(accepted),
        rejected: Dataset::new(rejected),
    }
}
