use crate::identifier::TaskId;
use std::collections::BTreeMap;

/// The fingerprint of every declared input of a task
#[derive(Deserialize, Serialize, Debug, Clone, Eq, PartialEq)]
pub struct Input {
    task_id: TaskId,
    fingerprints: BTreeMap<String, String>,
}

impl Input {
    /// Creates a new input fingerprint from the serialized value of each input
    pub fn new(id: &TaskId, fingerprints: BTreeMap<String, String>) -> Self {
        Self {
            task_id: id.clone(),
            fingerprints,
        }
    }

    /// Check whether the input has changed since a previous run
    pub fn input_changed(&self, prev: Option<&Input>) -> bool {
        match prev {
            Some(prev) if prev.task_id == self.task_id => {
                for (key, value) in &self.fingerprints {
                    if prev.fingerprints.get(key) != Some(value) {
                        debug!("input {:?} of {} changed", key, self.task_id);
                        return true;
                    }
                }
                prev.fingerprints.len() != self.fingerprints.len()
            }
            _ => true,
        }
    }

    /// Whether any inputs have been declared for this task
    pub fn any_inputs(&self) -> bool {
        !self.fingerprints.is_empty()
    }

    /// Gets the fingerprint of a single input
    pub fn fingerprint(&self, input: &str) -> Option<&str> {
        self.fingerprints.get(input).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(values: &[(&str, &str)]) -> Input {
        Input::new(
            &TaskId::new("app:jlink").unwrap(),
            values
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn detects_changes() {
        let prev = input(&[("args", "[]"), ("add_modules", "[\"java.base\"]")]);
        assert!(!input(&[("args", "[]"), ("add_modules", "[\"java.base\"]")])
            .input_changed(Some(&prev)));
        assert!(input(&[("args", "[\"-v\"]"), ("add_modules", "[\"java.base\"]")])
            .input_changed(Some(&prev)));
        assert!(input(&[("args", "[]")]).input_changed(Some(&prev)));
        assert!(prev.input_changed(None));
    }
}
