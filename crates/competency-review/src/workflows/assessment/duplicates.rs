use std::collections::{HashMap, HashSet};

use super::domain::EmployeeKey;

/// Identity collision checks against storage and within one upload.
pub struct DuplicateDetector;

impl DuplicateDetector {
    pub fn batch_counts<'a, I>(keys: I) -> HashMap<EmployeeKey, usize>
    where
        I: IntoIterator<Item = &'a EmployeeKey>,
    {
        let mut counts = HashMap::new();
        for key in keys {
            *counts.entry(key.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Both checks may fire for the same key.
    pub fn check(
        key: &EmployeeKey,
        existing: &HashSet<EmployeeKey>,
        batch_counts: &HashMap<EmployeeKey, usize>,
    ) -> Vec<String> {
        let mut violations = Vec::new();

        if existing.contains(key) {
            violations.push(format!(
                "Employee code '{}' for year '{}' already exists in database",
                key.code(),
                key.year()
            ));
        }

        if batch_counts.get(key).copied().unwrap_or(0) > 1 {
            violations.push(format!(
                "Duplicate employee code '{}' for year '{}' in file",
                key.code(),
                key.year()
            ));
        }

        violations
    }
}
