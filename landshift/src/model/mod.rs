//! Contract for the downstream carbon-absorption model.
//!
//! The trained regression model lives outside this crate; here we only pin
//! the interface it must satisfy: one typed inference row in, one scalar
//! prediction out. Rows follow [`INFERENCE_SCHEMA`] exactly — the model was
//! trained against that column order and typing.
//!
//! [`INFERENCE_SCHEMA`]: crate::export::INFERENCE_SCHEMA

use crate::export::{InferenceRow, InferenceTable};

/// A model that predicts carbon absorption from one inference row.
pub trait CarbonPredictor {
    /// Predicted carbon absorption for one covered cell at one timestamp.
    ///
    /// Implementations must tolerate null cells (unjoined attributes) in
    /// the row.
    fn predict(&self, row: &InferenceRow) -> f64;
}

/// Runs a model over every row of an inference table.
pub fn predict_table(model: &dyn CarbonPredictor, table: &InferenceTable) -> Vec<f64> {
    table.rows().iter().map(|row| model.predict(row)).collect()
}
