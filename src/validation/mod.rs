//! Input and solution validation.
//!
//! - [`validate_input`] checks structural integrity of the reference data and
//!   demand history before anything is estimated or built.
//! - [`check_allocation`] independently recomputes demand coverage and plant
//!   hours for a solver result. It never modifies the allocation.

mod input;
mod solution;

pub use input::{
    validate_forecast, validate_history, validate_input, validate_inventory, validate_reference_data,
    InputError, InputErrorKind, ValidationResult,
};
pub use solution::{check_allocation, CapacityCheck, DemandCheck, SolutionCheck};
