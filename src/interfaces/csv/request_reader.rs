use crate::application::transaction_flow::TransactionFlow;
use crate::domain::payment::PaymentCategory;
use crate::error::{PortalError, Result};
use serde::Deserialize;
use std::io::Read;

/// One row of a batch payment file: `amount, category, period, description`.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct RequestRow {
    pub amount: String,
    pub category: String,
    pub period: String,
    #[serde(default)]
    pub description: String,
}

impl RequestRow {
    /// Fills the form of `flow` with this row, as a user would.
    pub fn fill(&self, flow: &TransactionFlow) -> Result<()> {
        let category: PaymentCategory = self.category.parse()?;
        if !flow.set_amount_input(&self.amount)? {
            return Err(PortalError::ValidationError(format!(
                "Malformed amount: {}",
                self.amount
            )));
        }
        flow.set_category(category)?;
        flow.set_period(self.period.clone())?;
        flow.set_description(self.description.clone())?;
        Ok(())
    }
}

/// Reads payment rows from a CSV source.
///
/// Whitespace around fields is trimmed and a missing trailing description
/// column is tolerated.
pub struct RequestReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> RequestReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes rows; a malformed row yields an error and the
    /// iterator carries on with the next one.
    pub fn rows(self) -> impl Iterator<Item = Result<RequestRow>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(PortalError::from))
    }
}
