//! Solver-independent linear program.
//!
//! A minimization problem over non-negative continuous variables with
//! linear `≤`, `≥` and `=` rows. Kept as plain data so a model can be
//! inspected (variable count, coefficients, right-hand sides) without
//! running a solver.

use serde::{Deserialize, Serialize};

/// Identity of a decision variable: units of `material_id` made at `plant_id`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RouteKey {
    /// Producing plant.
    pub plant_id: String,
    /// Produced material.
    pub material_id: String,
}

/// A decision variable with lower bound 0 and no upper bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionVariable {
    /// Route the variable represents.
    pub key: RouteKey,
    /// Objective coefficient (unit cost).
    pub cost: f64,
}

/// Row sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relation {
    /// `lhs ≤ rhs`
    LessEq,
    /// `lhs ≥ rhs`
    GreaterEq,
    /// `lhs = rhs`
    Equal,
}

/// Constraint family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintKind {
    /// Production of a material must cover its forecast.
    Demand,
    /// Hours used at a plant must not exceed its capacity.
    Capacity,
}

/// A linear constraint `Σ coef·x[var] (relation) rhs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearConstraint {
    /// Unique row name (`Demand_<material>` or `Capacity_<plant>`).
    pub name: String,
    /// Constraint family.
    pub kind: ConstraintKind,
    /// Material id (demand rows) or plant id (capacity rows).
    pub entity_id: String,
    /// `(variable index, coefficient)` pairs.
    pub terms: Vec<(usize, f64)>,
    /// Row sense.
    pub relation: Relation,
    /// Right-hand side.
    pub rhs: f64,
}

/// A minimization linear program.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearProgram {
    /// Decision variables, ordered by route key.
    pub variables: Vec<DecisionVariable>,
    /// Constraint rows: demand rows (by material id) then capacity rows (by plant id).
    pub constraints: Vec<LinearConstraint>,
}

impl RouteKey {
    /// Creates a route key.
    pub fn new(plant_id: impl Into<String>, material_id: impl Into<String>) -> Self {
        Self {
            plant_id: plant_id.into(),
            material_id: material_id.into(),
        }
    }
}

impl LinearConstraint {
    /// Left-hand side evaluated at `values`.
    pub fn lhs(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|&(idx, coef)| coef * values.get(idx).copied().unwrap_or(0.0))
            .sum()
    }

    /// Signed slack at `values`: non-negative when satisfied, zero when binding.
    ///
    /// `rhs − lhs` for `≤` rows, `lhs − rhs` for `≥` rows and `−|lhs − rhs|`
    /// for equality rows.
    pub fn slack(&self, values: &[f64]) -> f64 {
        let lhs = self.lhs(values);
        match self.relation {
            Relation::LessEq => self.rhs - lhs,
            Relation::GreaterEq => lhs - self.rhs,
            Relation::Equal => -(lhs - self.rhs).abs(),
        }
    }
}

impl LinearProgram {
    /// Creates an empty program.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of decision variables.
    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    /// Number of constraint rows.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Index of the variable for a route.
    pub fn variable_index(&self, plant_id: &str, material_id: &str) -> Option<usize> {
        self.variables
            .binary_search_by(|v| {
                (v.key.plant_id.as_str(), v.key.material_id.as_str()).cmp(&(plant_id, material_id))
            })
            .ok()
    }

    /// Objective coefficients in variable order.
    pub fn objective_coefficients(&self) -> Vec<f64> {
        self.variables.iter().map(|v| v.cost).collect()
    }

    /// Objective value at `values`.
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.variables
            .iter()
            .zip(values)
            .map(|(v, x)| v.cost * x)
            .sum()
    }

    /// Constraint row by name.
    pub fn constraint(&self, name: &str) -> Option<&LinearConstraint> {
        self.constraints.iter().find(|c| c.name == name)
    }

    /// Rows of one family.
    pub fn constraints_of(&self, kind: ConstraintKind) -> impl Iterator<Item = &LinearConstraint> {
        self.constraints.iter().filter(move |c| c.kind == kind)
    }

    /// Signed slack of every row at `values`, in row order.
    pub fn slacks(&self, values: &[f64]) -> Vec<f64> {
        self.constraints.iter().map(|c| c.slack(values)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LinearProgram {
        LinearProgram {
            variables: vec![
                DecisionVariable {
                    key: RouteKey::new("P1", "M"),
                    cost: 10.0,
                },
                DecisionVariable {
                    key: RouteKey::new("P2", "M"),
                    cost: 8.0,
                },
            ],
            constraints: vec![
                LinearConstraint {
                    name: "Demand_M".into(),
                    kind: ConstraintKind::Demand,
                    entity_id: "M".into(),
                    terms: vec![(0, 1.0), (1, 1.0)],
                    relation: Relation::GreaterEq,
                    rhs: 150.0,
                },
                LinearConstraint {
                    name: "Capacity_P2".into(),
                    kind: ConstraintKind::Capacity,
                    entity_id: "P2".into(),
                    terms: vec![(1, 1.0)],
                    relation: Relation::LessEq,
                    rhs: 80.0,
                },
            ],
        }
    }

    #[test]
    fn test_lookup() {
        let lp = sample();
        assert_eq!(lp.variable_count(), 2);
        assert_eq!(lp.constraint_count(), 2);
        assert_eq!(lp.variable_index("P2", "M"), Some(1));
        assert_eq!(lp.variable_index("P3", "M"), None);
        assert_eq!(lp.objective_coefficients(), vec![10.0, 8.0]);
        assert_eq!(lp.constraints_of(ConstraintKind::Capacity).count(), 1);
    }

    #[test]
    fn test_slack_sign() {
        let lp = sample();
        let values = [70.0, 80.0];
        assert!((lp.objective_value(&values) - 1340.0).abs() < 1e-10);
        let slacks = lp.slacks(&values);
        assert!((slacks[0] - 0.0).abs() < 1e-10); // demand binding
        assert!((slacks[1] - 0.0).abs() < 1e-10); // P2 binding

        let values = [100.0, 60.0];
        let slacks = lp.slacks(&values);
        assert!((slacks[0] - 10.0).abs() < 1e-10);
        assert!((slacks[1] - 20.0).abs() < 1e-10);
    }

    #[test]
    fn test_equality_slack() {
        let row = LinearConstraint {
            name: "eq".into(),
            kind: ConstraintKind::Demand,
            entity_id: "M".into(),
            terms: vec![(0, 2.0)],
            relation: Relation::Equal,
            rhs: 4.0,
        };
        assert!((row.slack(&[2.0]) - 0.0).abs() < 1e-10);
        assert!((row.slack(&[3.0]) + 2.0).abs() < 1e-10);
    }
}
